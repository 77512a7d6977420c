//! Persistent local store: best-effort cache of the resumable session
//! pointer. Remote state always wins on resume.

pub mod libsql_backend;
pub mod migrations;
pub mod traits;

pub use libsql_backend::LibSqlStore;
pub use traits::{LocalProgress, ProgressStore, keys};
