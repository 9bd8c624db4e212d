// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain types and traits shared by every other layer:
//
//   schema.rs  - bike-share column names and groups
//   error.rs   - typed pipeline errors (thiserror)
//   traits.rs  - TableSource / ObjectStore / Persistable
//
// Nothing here performs IO.

pub mod error;

pub mod schema;

/// Abstractions implemented by the data and infra layers
pub mod traits;
