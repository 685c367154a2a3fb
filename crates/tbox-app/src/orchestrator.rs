//! Completion pipeline for one torrent.
//!
//! # Design
//! - `Start -> Locating -> {Uploading | Zipping -> Uploading} -> Terminal`.
//! - Every step failure is translated into a terminal tag here; nothing
//!   escapes `Pipeline::run` as an error.
//! - Exactly one terminal tag is published per run, after the last step.
//! - The save path itself is never handed to cleanup as a source directory.

use std::path::Path;
use std::sync::Arc;

use tbox_archive::{ZipCoordinator, ZipOutcome, ZipService};
use tbox_config::ReconcileConfig;
use tbox_fsops::{ContentLocator, PathProbe, archive_path_for};
use tbox_storage::{ObjectStore, UploadReceipt, UploadRequest, Uploader};
use tbox_torrent_core::{
    ContentDescriptor, InfoHash, Tag, TorrentCompletionJob, TorrentControl, TorrentResult,
    TorrentSnapshot,
};
use tracing::{info, warn};

use crate::tags::TagPublisher;

/// Position of a run in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Nothing has happened yet.
    Start,
    /// Loading the torrent snapshot and classifying its content.
    Locating,
    /// Waiting for the zip service to archive a directory.
    Zipping,
    /// Transferring the artifact to object storage.
    Uploading,
    /// Finished with the given tag.
    Terminal(Tag),
}

impl PipelineState {
    /// Stable label used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Locating => "locating",
            Self::Zipping => "zipping",
            Self::Uploading => "uploading",
            Self::Terminal(_) => "terminal",
        }
    }
}

/// Collaborators a pipeline is built from.
#[derive(Clone)]
pub struct PipelineDeps {
    /// Torrent client used for the snapshot, tags and stopping.
    pub torrents: Arc<dyn TorrentControl>,
    /// Remote zip service.
    pub zip: Arc<dyn ZipService>,
    /// Object storage backend.
    pub store: Arc<dyn ObjectStore>,
    /// Filesystem view shared by the locator and the zip coordinator.
    pub probe: Arc<dyn PathProbe>,
}

/// What a run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOutcome {
    /// Terminal tag published for the torrent.
    pub tag: Tag,
    /// Classified content; `Unknown` when locating failed.
    pub content: ContentDescriptor,
    /// Converged archive for directory content.
    pub archive: Option<ZipOutcome>,
    /// Upload receipt when the transfer succeeded.
    pub receipt: Option<UploadReceipt>,
}

impl PipelineOutcome {
    const fn pending() -> Self {
        Self {
            tag: Tag::Error,
            content: ContentDescriptor::Unknown,
            archive: None,
            receipt: None,
        }
    }
}

/// Sequences locating, zipping and uploading for one torrent.
pub struct Pipeline {
    torrents: Arc<dyn TorrentControl>,
    locator: ContentLocator<Arc<dyn PathProbe>>,
    zipper: ZipCoordinator,
    uploader: Uploader,
}

impl Pipeline {
    /// Wire a pipeline from its collaborators and the loaded configuration.
    #[must_use]
    pub fn new(deps: PipelineDeps, config: &ReconcileConfig) -> Self {
        let PipelineDeps {
            torrents,
            zip,
            store,
            probe,
        } = deps;
        Self {
            locator: ContentLocator::new(Arc::clone(&probe)),
            zipper: ZipCoordinator::new(zip, probe, config.zip.poll.clone()),
            uploader: Uploader::new(
                store,
                Arc::clone(&torrents),
                &config.storage,
                config.cleanup,
            ),
            torrents,
        }
    }

    /// Tag publisher bound to `hash`, sharing this pipeline's torrent client.
    #[must_use]
    pub fn publisher(&self, hash: &InfoHash) -> TagPublisher {
        TagPublisher::new(Arc::clone(&self.torrents), hash.clone())
    }

    /// Drive `job` to a terminal tag and publish it.
    pub async fn run(&self, job: &TorrentCompletionJob) -> PipelineOutcome {
        let publisher = self.publisher(&job.info_hash);
        let mut outcome = PipelineOutcome::pending();
        transition(&job.info_hash, PipelineState::Start);

        let tag = self.drive(job, &publisher, &mut outcome).await;
        debug_assert!(tag.is_terminal(), "pipeline ended on a non-terminal tag");

        transition(&job.info_hash, PipelineState::Terminal(tag));
        publisher.publish(tag).await;
        outcome.tag = tag;
        outcome
    }

    async fn drive(
        &self,
        job: &TorrentCompletionJob,
        publisher: &TagPublisher,
        outcome: &mut PipelineOutcome,
    ) -> Tag {
        let hash = &job.info_hash;
        transition(hash, PipelineState::Locating);
        let snapshot = match self.snapshot(job).await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(info_hash = %hash, error = %err, "failed to load torrent snapshot");
                return Tag::Error;
            }
        };

        let content = self.locator.locate(&snapshot);
        outcome.content = content.clone();
        let category = snapshot.category.as_deref();

        match content {
            ContentDescriptor::Unknown => {
                warn!(info_hash = %hash, name = %snapshot.name, "torrent content not found on disk");
                Tag::Error
            }
            ContentDescriptor::SingleFile { path } => {
                self.upload(publisher, &path, None, category, outcome).await
            }
            ContentDescriptor::SingleFileInDirectory { container, file } => {
                self.upload(publisher, &file, Some(&container), category, outcome)
                    .await
            }
            ContentDescriptor::Directory { path } => {
                transition(hash, PipelineState::Zipping);
                publisher.publish(Tag::Zipping).await;
                let target = archive_path_for(&path, hash.as_str());
                match self.zipper.ensure_archive(hash, &path, &target).await {
                    Ok(archive) => {
                        let file = archive.path.clone();
                        outcome.archive = Some(archive);
                        let shared = is_save_root(snapshot.save_path.as_deref(), &path);
                        if shared {
                            warn!(
                                info_hash = %hash,
                                path = %path.display(),
                                "content is the shared save path; keeping it after upload"
                            );
                        }
                        let source_dir = (!shared).then_some(path.as_path());
                        self.upload(publisher, &file, source_dir, category, outcome)
                            .await
                    }
                    Err(err) => {
                        warn!(
                            info_hash = %hash,
                            path = %path.display(),
                            error = %err,
                            "archive did not materialise"
                        );
                        Tag::Error
                    }
                }
            }
        }
    }

    async fn snapshot(&self, job: &TorrentCompletionJob) -> TorrentResult<TorrentSnapshot> {
        let hash = &job.info_hash;
        self.torrents.login().await?;
        let Some(info) = self.torrents.torrent_info(hash).await? else {
            warn!(info_hash = %hash, "torrent client does not know this torrent; using hook arguments");
            return Ok(TorrentSnapshot::assemble(job, None, None, Vec::new()));
        };
        let properties = self.torrents.torrent_properties(hash).await?;
        let files = self.torrents.torrent_files(hash).await?;
        Ok(TorrentSnapshot::assemble(job, Some(info), properties, files))
    }

    async fn upload(
        &self,
        publisher: &TagPublisher,
        file: &Path,
        source_dir: Option<&Path>,
        category: Option<&str>,
        outcome: &mut PipelineOutcome,
    ) -> Tag {
        let hash = publisher.info_hash();
        transition(hash, PipelineState::Uploading);
        publisher.publish(Tag::PreparingLink).await;

        let request = UploadRequest {
            info_hash: hash,
            file,
            source_dir,
            category,
        };
        match self.uploader.upload(request).await {
            Ok(receipt) => {
                outcome.receipt = Some(receipt);
                Tag::Ready
            }
            Err(err) => {
                warn!(info_hash = %hash, path = %file.display(), error = %err, "upload failed");
                Tag::UploadFailed
            }
        }
    }
}

/// Whether `dir` is the save path itself, which other torrents share.
fn is_save_root(save_path: Option<&Path>, dir: &Path) -> bool {
    let Some(save_path) = save_path else {
        return false;
    };
    if save_path == dir {
        return true;
    }
    matches!(
        (save_path.canonicalize(), dir.canonicalize()),
        (Ok(save), Ok(dir)) if save == dir
    )
}

fn transition(hash: &InfoHash, state: PipelineState) {
    match state {
        PipelineState::Terminal(tag) => {
            info!(info_hash = %hash, state = state.as_str(), tag = tag.label(), "pipeline finished");
        }
        _ => info!(info_hash = %hash, state = state.as_str(), "pipeline state changed"),
    }
}
