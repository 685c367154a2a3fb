//! `reqwest` adapter for the zip service.

use async_trait::async_trait;
use reqwest::{Client, Response};
use tbox_config::ZipSettings;
use tbox_torrent_core::InfoHash;
use url::Url;

use crate::error::{ArchiveError, ArchiveResult};
use crate::service::{ZipReply, ZipRequest, ZipService};

/// Zip service reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpZipService {
    http: Client,
    base_url: Url,
}

impl HttpZipService {
    /// Build the adapter from connection settings.
    ///
    /// # Errors
    ///
    /// Returns `ArchiveError::Transport` when the HTTP client cannot be constructed.
    pub fn new(settings: &ZipSettings) -> ArchiveResult<Self> {
        let http = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|err| ArchiveError::Transport {
                operation: "zip.client_build",
                url: settings.base_url.to_string(),
                source: Box::new(err),
            })?;

        let mut base_url = settings.base_url.clone();
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { http, base_url })
    }

    fn endpoint(&self, operation: &'static str, path: &str) -> ArchiveResult<Url> {
        self.base_url
            .join(path)
            .map_err(|err| ArchiveError::Transport {
                operation,
                url: self.base_url.to_string(),
                source: Box::new(err),
            })
    }
}

#[async_trait]
impl ZipService for HttpZipService {
    async fn start(&self, request: &ZipRequest) -> ArchiveResult<ZipReply> {
        let url = self.endpoint("zip.start", "zip")?;
        let response = self
            .http
            .post(url.clone())
            .json(request)
            .send()
            .await
            .map_err(|err| transport("zip.start", &url, err))?;
        decode("zip.start", &url, response).await
    }

    async fn progress(&self, hash: &InfoHash) -> ArchiveResult<ZipReply> {
        let url = self.endpoint("zip.progress", "progress")?;
        let response = self
            .http
            .get(url.clone())
            .query(&[("hash", hash.as_str())])
            .send()
            .await
            .map_err(|err| transport("zip.progress", &url, err))?;
        decode("zip.progress", &url, response).await
    }
}

async fn decode(operation: &'static str, url: &Url, response: Response) -> ArchiveResult<ZipReply> {
    let status = response.status();
    if !status.is_success() {
        return Err(ArchiveError::Status {
            operation,
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    let body = response
        .text()
        .await
        .map_err(|err| transport(operation, url, err))?;
    serde_json::from_str(&body).map_err(|err| ArchiveError::Decode {
        operation,
        source: Box::new(err),
    })
}

fn transport(operation: &'static str, url: &Url, err: reqwest::Error) -> ArchiveError {
    ArchiveError::Transport {
        operation,
        url: url.to_string(),
        source: Box::new(err),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use httpmock::prelude::*;
    use serde_json::json;
    use tbox_config::ZipPollPolicy;

    use super::*;
    use crate::service::ZipStatus;

    fn service_for(server: &MockServer) -> anyhow::Result<HttpZipService> {
        let settings = ZipSettings {
            base_url: server.base_url().parse()?,
            timeout: Duration::from_secs(5),
            poll: ZipPollPolicy::default(),
        };
        Ok(HttpZipService::new(&settings)?)
    }

    #[tokio::test]
    async fn start_posts_job_description() -> anyhow::Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST).path("/zip").json_body(json!({
                "hash": "abc",
                "source": "/data/Show",
                "target": "/data/Show.zip"
            }));
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({ "status": "zipping", "progress": 0 }));
        });

        let reply = service_for(&server)?
            .start(&ZipRequest {
                hash: "abc".into(),
                source: "/data/Show".into(),
                target: "/data/Show.zip".into(),
            })
            .await?;
        mock.assert();
        assert_eq!(reply, ZipReply::zipping(0.0));
        Ok(())
    }

    #[tokio::test]
    async fn progress_queries_by_hash() -> anyhow::Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET).path("/progress").query_param("hash", "abc");
            then.status(200)
                .json_body(json!({ "status": "complete", "progress": 100.0 }));
        });

        let reply = service_for(&server)?
            .progress(&InfoHash::parse("abc")?)
            .await?;
        mock.assert();
        assert_eq!(reply.status, ZipStatus::Complete);
        assert_eq!(reply.progress, Some(100.0));
        Ok(())
    }

    #[tokio::test]
    async fn server_errors_surface_as_status() -> anyhow::Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/progress");
            then.status(502);
        });

        let err = service_for(&server)?
            .progress(&InfoHash::parse("abc")?)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ArchiveError::Status {
                operation: "zip.progress",
                status: 502,
                ..
            }
        ));
        Ok(())
    }
}
