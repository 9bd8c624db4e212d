// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The seams between the pipeline and the outside world.
//
//   TableSource  → where the raw table comes from
//                  (CsvLoader, in-memory DataFrames in tests)
//   ObjectStore  → where the model artifact is uploaded
//                  (GcsBucket, LocalBucket, fakes in tests)
//   Persistable  → things that are written to / read from disk
//                  (ModelArtifact)
//
// Use cases receive these as explicit arguments; nothing holds
// a process-wide storage client.

use anyhow::Result;
use polars::prelude::DataFrame;
use std::path::Path;

// ─── TableSource ──────────────────────────────────────────────────────────────
/// Any component that can produce the raw input table.
pub trait TableSource {
    /// Load the full table into memory.
    fn load(&self) -> Result<DataFrame>;

    /// Human-readable location, used in log lines
    fn describe(&self) -> String;
}

// ─── ObjectStore ──────────────────────────────────────────────────────────────
/// A bucket-like destination for artifacts.
pub trait ObjectStore {
    /// Name of the bucket this client writes to
    fn bucket(&self) -> &str;

    /// Upload the file at `local` as `object` and return the
    /// resulting object URI (e.g. `gs://bucket/prefix/model.joblib`).
    fn upload_file(&self, local: &Path, object: &str) -> Result<String>;
}

// ─── Persistable ──────────────────────────────────────────────────────────────
/// Any component whose state can be saved and restored from disk.
pub trait Persistable: Sized {
    fn save(&self, path: &Path) -> Result<()>;

    fn load(path: &Path) -> Result<Self>;
}
