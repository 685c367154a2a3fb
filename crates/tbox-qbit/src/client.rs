//! Session-holding HTTP client for the qBittorrent Web API.

use std::fmt;

use async_trait::async_trait;
use reqwest::header::REFERER;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tbox_config::QbitSettings;
use tbox_torrent_core::{
    InfoHash, Tag, TorrentControl, TorrentError, TorrentFile, TorrentInfo, TorrentProperties,
    TorrentResult,
};
use tracing::{debug, warn};
use url::Url;

use crate::wire::{FileEntry, InfoEntry, PropertiesBody, files_from_wire};

const LOGIN_PATH: &str = "api/v2/auth/login";
const INFO_PATH: &str = "api/v2/torrents/info";
const PROPERTIES_PATH: &str = "api/v2/torrents/properties";
const FILES_PATH: &str = "api/v2/torrents/files";
const STOP_PATH: &str = "api/v2/torrents/stop";
const PAUSE_PATH: &str = "api/v2/torrents/pause";
const ADD_TAGS_PATH: &str = "api/v2/torrents/addTags";
const REMOVE_TAGS_PATH: &str = "api/v2/torrents/removeTags";

/// qBittorrent client authenticated with a cookie session.
///
/// A `403` on any call triggers one re-login followed by a single retry.
#[derive(Clone)]
pub struct QbitClient {
    http: Client,
    base_url: Url,
    username: String,
    password: String,
}

impl fmt::Debug for QbitClient {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("QbitClient")
            .field("base_url", &self.base_url.as_str())
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl QbitClient {
    /// Build a client from connection settings.
    ///
    /// # Errors
    ///
    /// Returns `TorrentError::Transport` when the HTTP client cannot be constructed.
    pub fn new(settings: &QbitSettings) -> TorrentResult<Self> {
        let http = Client::builder()
            .cookie_store(true)
            .timeout(settings.timeout)
            .build()
            .map_err(|err| transport("client.build", &settings.base_url, err))?;

        let mut base_url = settings.base_url.clone();
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            http,
            base_url,
            username: settings.username.clone(),
            password: settings.password.clone(),
        })
    }

    fn endpoint(&self, operation: &'static str, path: &str) -> TorrentResult<Url> {
        self.base_url
            .join(path)
            .map_err(|err| transport(operation, &self.base_url, err))
    }

    async fn authenticate(&self) -> TorrentResult<()> {
        let url = self.endpoint("auth.login", LOGIN_PATH)?;
        let response = self
            .http
            .post(url.clone())
            .header(REFERER, self.base_url.as_str())
            .form(&[
                ("username", self.username.as_str()),
                ("password", self.password.as_str()),
            ])
            .send()
            .await
            .map_err(|err| transport("auth.login", &url, err))?;

        if response.status() == StatusCode::FORBIDDEN {
            return Err(TorrentError::Unauthorized {
                operation: "auth.login",
            });
        }
        let response = ensure_success("auth.login", &url, response)?;
        let body = response
            .text()
            .await
            .map_err(|err| transport("auth.login", &url, err))?;

        if body.trim().eq_ignore_ascii_case("ok.") {
            debug!(url = %self.base_url, "torrent client session established");
            Ok(())
        } else {
            Err(TorrentError::Unauthorized {
                operation: "auth.login",
            })
        }
    }

    async fn send<F>(&self, operation: &'static str, url: &Url, build: F) -> TorrentResult<Response>
    where
        F: Fn() -> RequestBuilder + Send + Sync,
    {
        let response = build()
            .send()
            .await
            .map_err(|err| transport(operation, url, err))?;
        if response.status() != StatusCode::FORBIDDEN {
            return Ok(response);
        }

        warn!(operation, "torrent client session rejected; logging in again");
        self.authenticate().await?;
        build()
            .send()
            .await
            .map_err(|err| transport(operation, url, err))
    }

    async fn post_form(
        &self,
        operation: &'static str,
        path: &str,
        form: &[(&str, &str)],
    ) -> TorrentResult<Response> {
        let url = self.endpoint(operation, path)?;
        self.send(operation, &url, || self.http.post(url.clone()).form(form))
            .await
    }

    async fn get_json<T>(
        &self,
        operation: &'static str,
        path: &str,
        query: &[(&str, &str)],
    ) -> TorrentResult<T>
    where
        T: DeserializeOwned,
    {
        let url = self.endpoint(operation, path)?;
        let response = self
            .send(operation, &url, || self.http.get(url.clone()).query(query))
            .await?;
        let response = ensure_success(operation, &url, response)?;
        let body = response
            .text()
            .await
            .map_err(|err| transport(operation, &url, err))?;
        serde_json::from_str(&body).map_err(|err| TorrentError::Decode {
            operation,
            source: Box::new(err),
        })
    }
}

#[async_trait]
impl TorrentControl for QbitClient {
    async fn login(&self) -> TorrentResult<()> {
        self.authenticate().await
    }

    async fn torrent_info(&self, hash: &InfoHash) -> TorrentResult<Option<TorrentInfo>> {
        let entries: Vec<InfoEntry> = self
            .get_json("torrents.info", INFO_PATH, &[("hashes", hash.as_str())])
            .await?;
        Ok(entries.into_iter().next().map(TorrentInfo::from))
    }

    async fn torrent_properties(&self, hash: &InfoHash) -> TorrentResult<Option<TorrentProperties>> {
        let body: PropertiesBody = self
            .get_json(
                "torrents.properties",
                PROPERTIES_PATH,
                &[("hash", hash.as_str())],
            )
            .await?;
        Ok(Some(body.into()))
    }

    async fn torrent_files(&self, hash: &InfoHash) -> TorrentResult<Vec<TorrentFile>> {
        let entries: Vec<FileEntry> = self
            .get_json("torrents.files", FILES_PATH, &[("hash", hash.as_str())])
            .await?;
        Ok(files_from_wire(entries))
    }

    async fn stop_torrent(&self, hash: &InfoHash) -> TorrentResult<()> {
        let form = [("hashes", hash.as_str())];
        let response = self.post_form("torrents.stop", STOP_PATH, &form).await?;
        if response.status() == StatusCode::NOT_FOUND {
            // Clients older than v5 only know the pause endpoint.
            debug!(info_hash = %hash, "stop endpoint unavailable; falling back to pause");
            let response = self.post_form("torrents.pause", PAUSE_PATH, &form).await?;
            let url = self.endpoint("torrents.pause", PAUSE_PATH)?;
            ensure_success("torrents.pause", &url, response)?;
            return Ok(());
        }
        let url = self.endpoint("torrents.stop", STOP_PATH)?;
        ensure_success("torrents.stop", &url, response)?;
        Ok(())
    }

    async fn add_tag(&self, hash: &InfoHash, tag: Tag) -> TorrentResult<()> {
        let response = self
            .post_form(
                "torrents.add_tags",
                ADD_TAGS_PATH,
                &[("hashes", hash.as_str()), ("tags", tag.label())],
            )
            .await?;
        let url = self.endpoint("torrents.add_tags", ADD_TAGS_PATH)?;
        ensure_success("torrents.add_tags", &url, response)?;
        Ok(())
    }

    async fn remove_all_tags(&self, hash: &InfoHash) -> TorrentResult<()> {
        let response = self
            .post_form(
                "torrents.remove_tags",
                REMOVE_TAGS_PATH,
                &[("hashes", hash.as_str()), ("tags", "")],
            )
            .await?;
        let url = self.endpoint("torrents.remove_tags", REMOVE_TAGS_PATH)?;
        ensure_success("torrents.remove_tags", &url, response)?;
        Ok(())
    }
}

fn ensure_success(
    operation: &'static str,
    url: &Url,
    response: Response,
) -> TorrentResult<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(TorrentError::Status {
            operation,
            url: url.to_string(),
            status: status.as_u16(),
        })
    }
}

fn transport<E>(operation: &'static str, url: &Url, err: E) -> TorrentError
where
    E: std::error::Error + Send + Sync + 'static,
{
    TorrentError::Transport {
        operation,
        url: url.to_string(),
        source: Box::new(err),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use httpmock::prelude::*;

    use super::*;

    const HASH: &str = "0123456789abcdef0123456789abcdef01234567";

    fn client_for(server: &MockServer) -> anyhow::Result<QbitClient> {
        let settings = QbitSettings {
            base_url: server.base_url().parse()?,
            username: "admin".into(),
            password: "secret".into(),
            timeout: Duration::from_secs(5),
        };
        Ok(QbitClient::new(&settings)?)
    }

    fn hash() -> anyhow::Result<InfoHash> {
        Ok(InfoHash::parse(HASH)?)
    }

    #[tokio::test]
    async fn login_accepts_ok_body() -> anyhow::Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST).path("/api/v2/auth/login");
            then.status(200).body("Ok.");
        });

        client_for(&server)?.login().await?;
        mock.assert();
        Ok(())
    }

    #[tokio::test]
    async fn login_rejects_fails_body() -> anyhow::Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/api/v2/auth/login");
            then.status(200).body("Fails.");
        });

        let err = client_for(&server)?.login().await.unwrap_err();
        assert!(matches!(
            err,
            TorrentError::Unauthorized {
                operation: "auth.login"
            }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn torrent_info_maps_first_entry() -> anyhow::Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v2/torrents/info")
                .query_param("hashes", HASH);
            then.status(200)
                .header("content-type", "application/json")
                .body(
                    r#"[{"name":"Show","save_path":"/data","content_path":"/data/Show",
                        "root_path":"/data/Show","category":"tv","tags":""}]"#,
                );
        });

        let info = client_for(&server)?
            .torrent_info(&hash()?)
            .await?
            .ok_or_else(|| anyhow::anyhow!("expected torrent info"))?;
        mock.assert();
        assert_eq!(info.name, "Show");
        assert_eq!(info.root_path, Some(PathBuf::from("/data/Show")));
        assert_eq!(info.category.as_deref(), Some("tv"));
        assert!(info.tags.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn torrent_info_returns_none_for_unknown_hash() -> anyhow::Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/v2/torrents/info");
            then.status(200).body("[]");
        });

        assert!(client_for(&server)?.torrent_info(&hash()?).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn malformed_file_list_is_a_decode_error() -> anyhow::Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/v2/torrents/files");
            then.status(200).body("{not json");
        });

        let err = client_for(&server)?.torrent_files(&hash()?).await.unwrap_err();
        assert!(matches!(
            err,
            TorrentError::Decode {
                operation: "torrents.files",
                ..
            }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn stop_falls_back_to_pause_on_not_found() -> anyhow::Result<()> {
        let server = MockServer::start_async().await;
        let stop = server.mock(|when, then| {
            when.method(POST).path("/api/v2/torrents/stop");
            then.status(404);
        });
        let pause = server.mock(|when, then| {
            when.method(POST).path("/api/v2/torrents/pause");
            then.status(200);
        });

        client_for(&server)?.stop_torrent(&hash()?).await?;
        stop.assert();
        pause.assert();
        Ok(())
    }

    #[tokio::test]
    async fn forbidden_call_relogs_once_then_reports_status() -> anyhow::Result<()> {
        let server = MockServer::start_async().await;
        let login = server.mock(|when, then| {
            when.method(POST).path("/api/v2/auth/login");
            then.status(200).body("Ok.");
        });
        let add = server.mock(|when, then| {
            when.method(POST).path("/api/v2/torrents/addTags");
            then.status(403);
        });

        let err = client_for(&server)?
            .add_tag(&hash()?, Tag::Ready)
            .await
            .unwrap_err();
        assert_eq!(login.calls(), 1);
        assert_eq!(add.calls(), 2);
        assert!(matches!(
            err,
            TorrentError::Status {
                operation: "torrents.add_tags",
                status: 403,
                ..
            }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn remove_all_tags_posts_to_remove_endpoint() -> anyhow::Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST).path("/api/v2/torrents/removeTags");
            then.status(200);
        });

        client_for(&server)?.remove_all_tags(&hash()?).await?;
        mock.assert();
        Ok(())
    }
}
