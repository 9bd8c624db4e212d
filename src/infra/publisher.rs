// ============================================================
// Layer 6 — Artifact Publisher
// ============================================================
// Serializes the fitted model locally, then pushes the file to
// object storage under `{prefix}/model.joblib`.
//
// Both steps are fatal on failure and surface as PublishError so
// the caller can tell a bad disk from a rejected upload. Passing
// no ObjectStore means the upload was skipped on purpose; the
// report says so instead of staying silent.

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::traits::ObjectStore;
use crate::infra::artifact::{ArtifactStore, ModelArtifact, ARTIFACT_FILE};

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("failed to serialize model to '{}': {reason}", .path.display())]
    Serialize { path: PathBuf, reason: String },

    #[error("failed to upload model to '{object}': {reason}")]
    Upload { object: String, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum UploadStatus {
    Uploaded { uri: String },
    Skipped,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PublishReport {
    pub local_path: PathBuf,
    pub upload:     UploadStatus,
}

pub struct ArtifactPublisher<'a> {
    store:  &'a ArtifactStore,
    remote: Option<&'a dyn ObjectStore>,
    prefix: String,
}

impl<'a> ArtifactPublisher<'a> {
    pub fn new(
        store:  &'a ArtifactStore,
        remote: Option<&'a dyn ObjectStore>,
        prefix: impl Into<String>,
    ) -> Self {
        Self { store, remote, prefix: prefix.into() }
    }

    /// Object name inside the bucket
    pub fn object_name(&self) -> String {
        let prefix = self.prefix.trim_matches('/');
        if prefix.is_empty() {
            ARTIFACT_FILE.to_string()
        } else {
            format!("{prefix}/{ARTIFACT_FILE}")
        }
    }

    pub fn publish(&self, artifact: &ModelArtifact) -> Result<PublishReport, PublishError> {
        let local_path = self
            .store
            .save_artifact(artifact)
            .map_err(|e| PublishError::Serialize {
                path:   self.store.artifact_path(),
                reason: format!("{e:#}"),
            })?;

        let Some(remote) = self.remote else {
            tracing::info!("Upload skipped; model kept at '{}'", local_path.display());
            return Ok(PublishReport { local_path, upload: UploadStatus::Skipped });
        };

        let object = self.object_name();
        let uri = remote
            .upload_file(&local_path, &object)
            .map_err(|e| PublishError::Upload {
                object: format!("{}/{}", remote.bucket(), object),
                reason: format!("{e:#}"),
            })?;
        tracing::info!("Model uploaded to {uri}");

        Ok(PublishReport { local_path, upload: UploadStatus::Uploaded { uri } })
    }
}
