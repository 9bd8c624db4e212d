// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Disk and network concerns shared by the use cases:
//
//   artifact.rs  - ModelArtifact (model.joblib) and the local
//                  ArtifactStore, which also keeps the run config
//
//   storage.rs   - ObjectStore clients: Google Cloud Storage and
//                  a local directory bucket
//
//   publisher.rs - save locally, then upload; typed PublishError
//
//   metrics.rs   - per-run CSV log of evaluation metrics

pub mod artifact;

/// GCS and local-directory object storage
pub mod storage;

pub mod publisher;

/// Run metrics CSV logger
pub mod metrics;
