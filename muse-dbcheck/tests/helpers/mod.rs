//! Test Helper Utilities
//!
//! Shared utilities for testing muse-dbcheck against an in-memory
//! store instead of a live Supabase deployment.

// Each test binary compiles its own copy; not every binary uses every helper
#![allow(dead_code)]

pub mod memory_store;

pub use memory_store::MemoryStore;
