//! Data-access abstraction over the remote store
//!
//! The check suite depends only on the `StoreAdapter` trait; the
//! Supabase REST client is one concrete implementation, and tests drive
//! the suite through an in-memory implementation instead.
//!
//! The adapter performs no automatic rollback and supports no
//! multi-statement transactions: every mutating call must be paired by
//! its caller with a compensating one.

use muse_common::error::Result;
use muse_common::model::Entity;
use serde_json::Value;
use uuid::Uuid;

pub mod supabase;

pub use supabase::SupabaseAdapter;

/// Exact-equality filter conjunction; the only filter shape the harness
/// uses (no range queries)
#[derive(Debug, Clone, Default)]
pub struct Filter {
    clauses: Vec<(String, Value)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an `column = value` clause
    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.clauses.push((column.to_string(), value.into()));
        self
    }

    /// Single-clause filter on an entity's declared primary key
    pub fn by_primary_key<E: Entity>(key: Value) -> Self {
        Self::new().eq(E::PRIMARY_KEY, key)
    }

    pub fn clauses(&self) -> &[(String, Value)] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// True if every clause matches the corresponding field of `row`
    pub fn matches(&self, row: &Value) -> bool {
        self.clauses
            .iter()
            .all(|(column, expected)| row.get(column) == Some(expected))
    }
}

/// Capability interface over the remote data store.
///
/// The store may narrow or empty results by principal-level row
/// filtering; access control is opaque to the harness.
#[allow(async_fn_in_trait)]
pub trait StoreAdapter {
    /// Human-readable backend name for logging
    fn name(&self) -> &str;

    /// True if the table is visible via cached introspection or a direct probe
    async fn table_exists(&self, table: &str) -> Result<bool>;

    /// Insert one row; returns the stored row including generated fields
    async fn insert(&self, table: &str, row: Value) -> Result<Value>;

    /// Apply `patch` to all rows matching `filter`; returns one updated row
    async fn update(&self, table: &str, filter: &Filter, patch: Value) -> Result<Value>;

    /// Delete rows matching `filter`; returns the number removed
    async fn delete(&self, table: &str, filter: &Filter) -> Result<u64>;

    /// Count rows matching `filter` (all rows when `None`)
    async fn count(&self, table: &str, filter: Option<&Filter>) -> Result<u64>;

    /// First row matching `filter`, if any
    async fn select_one(&self, table: &str, filter: &Filter) -> Result<Option<Value>>;

    /// All rows matching `filter`; order is backend-defined
    async fn select_all(&self, table: &str, filter: Option<&Filter>) -> Result<Vec<Value>>;

    /// Identity of the authenticated principal
    fn authenticated_user_id(&self) -> Option<Uuid>;

    /// Release held session state; called once at process exit
    async fn teardown(&self) -> Result<()>;
}

/// Typed convenience layer converting `Entity` structs at the adapter
/// boundary, so check logic never does stringly-typed field access.
#[allow(async_fn_in_trait)]
pub trait AdapterExt: StoreAdapter {
    async fn insert_row<E: Entity>(&self, row: &E) -> Result<E> {
        let stored = self.insert(E::TABLE, serde_json::to_value(row)?).await?;
        Ok(serde_json::from_value(stored)?)
    }

    async fn find_one<E: Entity>(&self, filter: &Filter) -> Result<Option<E>> {
        match self.select_one(E::TABLE, filter).await? {
            Some(row) => Ok(Some(serde_json::from_value(row)?)),
            None => Ok(None),
        }
    }

    async fn find_all<E: Entity>(&self, filter: Option<&Filter>) -> Result<Vec<E>> {
        let rows = self.select_all(E::TABLE, filter).await?;
        rows.into_iter()
            .map(|row| Ok(serde_json::from_value(row)?))
            .collect()
    }
}

impl<A: StoreAdapter> AdapterExt for A {}
