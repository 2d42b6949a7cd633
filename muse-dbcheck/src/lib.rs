//! muse-dbcheck library - schema-conformance harness for the Muse database
//!
//! Verifies that the deployed schema enforces its declared invariants
//! (check constraints, uniqueness, cascade deletes, timestamp-touching
//! triggers) and that the canonical seed dataset is consistent. The
//! check suite depends only on the `StoreAdapter` trait; the Supabase
//! REST client is the one concrete backend.

pub mod adapter;
pub mod checks;
pub mod config;
pub mod fixture;
pub mod seed;
pub mod snapshot;

pub use adapter::{AdapterExt, Filter, StoreAdapter, SupabaseAdapter};
pub use checks::{run_all, RunReport};
pub use config::Settings;
