//! Scripted fakes of the pipeline's collaborator traits.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tbox_archive::{ArchiveError, ArchiveResult, ZipReply, ZipRequest, ZipService};
use tbox_fsops::{PathKind, PathProbe};
use tbox_storage::{ObjectKey, ObjectStore, StorageError, StorageResult};
use tbox_torrent_core::{
    InfoHash, Tag, TorrentControl, TorrentError, TorrentFile, TorrentInfo, TorrentProperties,
    TorrentResult,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Call recorded by [`FakeTorrentControl`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TorrentCall {
    /// `login`.
    Login,
    /// `torrent_info`.
    Info,
    /// `torrent_properties`.
    Properties,
    /// `torrent_files`.
    Files,
    /// `stop_torrent`.
    Stop,
    /// `add_tag`.
    AddTag(Tag),
    /// `remove_all_tags`.
    RemoveAllTags,
}

/// In-memory torrent client.
#[derive(Debug, Default)]
pub struct FakeTorrentControl {
    info: Option<TorrentInfo>,
    properties: Option<TorrentProperties>,
    files: Vec<TorrentFile>,
    fail_login: bool,
    fail_tags: bool,
    fail_stop: bool,
    calls: Mutex<Vec<TorrentCall>>,
}

impl FakeTorrentControl {
    /// Client that knows nothing about any torrent.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `info` for every hash.
    #[must_use]
    pub fn with_info(mut self, info: TorrentInfo) -> Self {
        self.info = Some(info);
        self
    }

    /// Report `properties` for every hash.
    #[must_use]
    pub fn with_properties(mut self, properties: TorrentProperties) -> Self {
        self.properties = Some(properties);
        self
    }

    /// Report the given relative file names.
    #[must_use]
    pub fn with_files(mut self, names: &[&str]) -> Self {
        self.files = names
            .iter()
            .zip(0_u32..)
            .map(|(name, index)| TorrentFile {
                index,
                name: (*name).to_string(),
                size: 1,
            })
            .collect();
        self
    }

    /// Reject `login`.
    #[must_use]
    pub fn failing_login(mut self) -> Self {
        self.fail_login = true;
        self
    }

    /// Fail every tag call.
    #[must_use]
    pub fn failing_tags(mut self) -> Self {
        self.fail_tags = true;
        self
    }

    /// Fail `stop_torrent`.
    #[must_use]
    pub fn failing_stop(mut self) -> Self {
        self.fail_stop = true;
        self
    }

    /// Every call in order.
    #[must_use]
    pub fn calls(&self) -> Vec<TorrentCall> {
        lock(&self.calls).clone()
    }

    /// Tags passed to `add_tag`, in order.
    #[must_use]
    pub fn published_tags(&self) -> Vec<Tag> {
        lock(&self.calls)
            .iter()
            .filter_map(|call| match call {
                TorrentCall::AddTag(tag) => Some(*tag),
                _ => None,
            })
            .collect()
    }

    /// Number of `stop_torrent` calls.
    #[must_use]
    pub fn stop_count(&self) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|call| **call == TorrentCall::Stop)
            .count()
    }

    fn record(&self, call: TorrentCall) {
        lock(&self.calls).push(call);
    }

    fn failure(operation: &'static str) -> TorrentError {
        TorrentError::Status {
            operation,
            url: String::new(),
            status: 500,
        }
    }
}

#[async_trait]
impl TorrentControl for FakeTorrentControl {
    async fn login(&self) -> TorrentResult<()> {
        self.record(TorrentCall::Login);
        if self.fail_login {
            return Err(TorrentError::Unauthorized {
                operation: "auth.login",
            });
        }
        Ok(())
    }

    async fn torrent_info(&self, _hash: &InfoHash) -> TorrentResult<Option<TorrentInfo>> {
        self.record(TorrentCall::Info);
        Ok(self.info.clone())
    }

    async fn torrent_properties(&self, _hash: &InfoHash) -> TorrentResult<Option<TorrentProperties>> {
        self.record(TorrentCall::Properties);
        Ok(self.properties.clone())
    }

    async fn torrent_files(&self, _hash: &InfoHash) -> TorrentResult<Vec<TorrentFile>> {
        self.record(TorrentCall::Files);
        Ok(self.files.clone())
    }

    async fn stop_torrent(&self, _hash: &InfoHash) -> TorrentResult<()> {
        self.record(TorrentCall::Stop);
        if self.fail_stop {
            return Err(Self::failure("torrents.stop"));
        }
        Ok(())
    }

    async fn add_tag(&self, _hash: &InfoHash, tag: Tag) -> TorrentResult<()> {
        self.record(TorrentCall::AddTag(tag));
        if self.fail_tags {
            return Err(Self::failure("torrents.add_tags"));
        }
        Ok(())
    }

    async fn remove_all_tags(&self, _hash: &InfoHash) -> TorrentResult<()> {
        self.record(TorrentCall::RemoveAllTags);
        if self.fail_tags {
            return Err(Self::failure("torrents.remove_tags"));
        }
        Ok(())
    }
}

/// Zip service that replays scripted replies.
///
/// `None` entries stand for failed calls. The last progress entry repeats
/// once the script runs out; an empty script fails every progress call.
#[derive(Debug)]
pub struct ScriptedZipService {
    start: Option<ZipReply>,
    progress: Mutex<VecDeque<Option<ZipReply>>>,
    requests: Mutex<Vec<ZipRequest>>,
    progress_calls: Mutex<usize>,
}

impl ScriptedZipService {
    /// Service whose start call answers `start`.
    #[must_use]
    pub fn new(start: Option<ZipReply>, progress: Vec<Option<ZipReply>>) -> Self {
        Self {
            start,
            progress: Mutex::new(progress.into()),
            requests: Mutex::new(Vec::new()),
            progress_calls: Mutex::new(0),
        }
    }

    /// Start requests received.
    #[must_use]
    pub fn requests(&self) -> Vec<ZipRequest> {
        lock(&self.requests).clone()
    }

    /// Progress calls received.
    #[must_use]
    pub fn progress_calls(&self) -> usize {
        *lock(&self.progress_calls)
    }

    fn unavailable(operation: &'static str) -> ArchiveError {
        ArchiveError::Status {
            operation,
            url: String::new(),
            status: 503,
        }
    }
}

#[async_trait]
impl ZipService for ScriptedZipService {
    async fn start(&self, request: &ZipRequest) -> ArchiveResult<ZipReply> {
        lock(&self.requests).push(request.clone());
        self.start
            .clone()
            .ok_or_else(|| Self::unavailable("zip.start"))
    }

    async fn progress(&self, _hash: &InfoHash) -> ArchiveResult<ZipReply> {
        *lock(&self.progress_calls) += 1;
        let mut script = lock(&self.progress);
        let next = if script.len() > 1 {
            script.pop_front().flatten()
        } else {
            script.front().cloned().flatten()
        };
        next.ok_or_else(|| Self::unavailable("zip.progress"))
    }
}

/// Object store that records uploads instead of transferring them.
#[derive(Debug, Default)]
pub struct RecordingStore {
    fail: bool,
    uploads: Mutex<Vec<(PathBuf, String)>>,
}

impl RecordingStore {
    /// Store that accepts every upload.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that rejects every upload.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// `(local path, key)` of every accepted upload.
    #[must_use]
    pub fn uploads(&self) -> Vec<(PathBuf, String)> {
        lock(&self.uploads).clone()
    }
}

#[async_trait]
impl ObjectStore for RecordingStore {
    async fn put(&self, local: &Path, key: &ObjectKey) -> StorageResult<()> {
        if self.fail {
            return Err(StorageError::CommandFailed {
                program: "recording-store".into(),
                code: Some(1),
                stderr: "scripted failure".into(),
            });
        }
        lock(&self.uploads).push((local.to_path_buf(), key.to_string()));
        Ok(())
    }
}

/// Probe answering from a fixed table; unknown paths are missing.
#[derive(Debug, Default, Clone)]
pub struct ScriptedProbe {
    entries: HashMap<PathBuf, (PathKind, Option<u64>)>,
}

impl ScriptedProbe {
    /// Probe where nothing exists.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a regular file of `size` bytes.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>, size: u64) -> Self {
        self.entries
            .insert(path.into(), (PathKind::File, Some(size)));
        self
    }

    /// Add a directory.
    #[must_use]
    pub fn with_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.entries.insert(path.into(), (PathKind::Directory, None));
        self
    }
}

impl PathProbe for ScriptedProbe {
    fn kind(&self, path: &Path) -> PathKind {
        self.entries
            .get(path)
            .map_or(PathKind::Missing, |(kind, _)| *kind)
    }

    fn file_size(&self, path: &Path) -> Option<u64> {
        self.entries.get(path).and_then(|(_, size)| *size)
    }
}

#[cfg(test)]
mod tests {
    use tbox_archive::ZipStatus;

    use super::*;

    #[tokio::test]
    async fn fake_torrent_control_records_tags_in_order() -> anyhow::Result<()> {
        let fake = FakeTorrentControl::new();
        let hash = InfoHash::parse("abc")?;
        fake.remove_all_tags(&hash).await?;
        fake.add_tag(&hash, Tag::Zipping).await?;
        fake.stop_torrent(&hash).await?;
        assert_eq!(fake.published_tags(), vec![Tag::Zipping]);
        assert_eq!(fake.stop_count(), 1);
        assert_eq!(fake.calls()[0], TorrentCall::RemoveAllTags);
        Ok(())
    }

    #[tokio::test]
    async fn scripted_zip_repeats_last_reply() -> anyhow::Result<()> {
        let service = ScriptedZipService::new(
            Some(ZipReply::zipping(0.0)),
            vec![Some(ZipReply::zipping(10.0)), Some(ZipReply::status(ZipStatus::Complete))],
        );
        let hash = InfoHash::parse("abc")?;
        assert_eq!(service.progress(&hash).await?.progress, Some(10.0));
        assert_eq!(service.progress(&hash).await?.status, ZipStatus::Complete);
        assert_eq!(service.progress(&hash).await?.status, ZipStatus::Complete);
        assert_eq!(service.progress_calls(), 3);
        Ok(())
    }

    #[test]
    fn scripted_probe_defaults_to_missing() {
        let probe = ScriptedProbe::new()
            .with_dir("/d/Show")
            .with_file("/d/Show.zip", 9);
        assert_eq!(probe.kind(Path::new("/d/Show")), PathKind::Directory);
        assert_eq!(probe.file_size(Path::new("/d/Show.zip")), Some(9));
        assert_eq!(probe.kind(Path::new("/d/other")), PathKind::Missing);
    }
}
