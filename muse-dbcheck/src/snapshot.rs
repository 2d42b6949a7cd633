//! Principal state snapshot and restore
//!
//! Rows are captured as raw JSON values so restore replays the exact
//! field values the store returned, generated timestamps included.
//! Restore inserts each row and, when the row is still present
//! (uniqueness violation on its primary key), falls back to an update
//! by the declared primary key, so replay is idempotent.

use muse_common::error::{Error, Result};
use muse_common::model::{
    Entity, PostInspiration, UserFollow, UserMedia, UserPost, UserProfile,
};
use serde_json::Value;
use uuid::Uuid;

use crate::adapter::{Filter, StoreAdapter};

/// Composite bag of a principal's owned rows
#[derive(Debug, Clone, Default)]
pub struct UserState {
    pub profile: Option<Value>,
    pub posts: Vec<Value>,
    pub media: Vec<Value>,
    pub inspirations: Vec<Value>,
    pub follows: Vec<Value>,
}

/// Capture the principal's profile, posts, per-post media and
/// inspirations, and follows
pub async fn snapshot_user_state<A: StoreAdapter>(adapter: &A, user_id: Uuid) -> Result<UserState> {
    let owner = Filter::new().eq("user_id", user_id.to_string());

    let profile = adapter
        .select_one(UserProfile::TABLE, &owner)
        .await?;
    let posts = adapter.select_all(UserPost::TABLE, Some(&owner)).await?;

    let mut media = Vec::new();
    let mut inspirations = Vec::new();
    for post in &posts {
        let post_id = post
            .get(UserPost::PRIMARY_KEY)
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::Assertion("snapshot found a post without post_id".into()))?;
        let by_post = Filter::new().eq("post_id", post_id);
        media.extend(adapter.select_all(UserMedia::TABLE, Some(&by_post)).await?);
        inspirations.extend(
            adapter
                .select_all(PostInspiration::TABLE, Some(&by_post))
                .await?,
        );
    }
    let follows = adapter.select_all(UserFollow::TABLE, Some(&owner)).await?;

    Ok(UserState {
        profile,
        posts,
        media,
        inspirations,
        follows,
    })
}

/// Insert a captured row; on a uniqueness violation (the row was never
/// actually removed) update it by primary key with the captured values
async fn replay_row<A: StoreAdapter>(
    adapter: &A,
    table: &str,
    pk_column: &str,
    row: &Value,
) -> Result<()> {
    match adapter.insert(table, row.clone()).await {
        Ok(_) => Ok(()),
        Err(e) if e.is_unique_violation() => {
            let key = row
                .get(pk_column)
                .cloned()
                .ok_or_else(|| Error::Assertion(format!("captured {table} row has no {pk_column}")))?;
            adapter
                .update(table, &Filter::new().eq(pk_column, key), row.clone())
                .await?;
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Replay a snapshot in dependency order; safe to call whether or not
/// the destructive check actually removed anything
pub async fn restore_user_state<A: StoreAdapter>(adapter: &A, state: &UserState) -> Result<()> {
    if let Some(profile) = &state.profile {
        replay_row(adapter, UserProfile::TABLE, UserProfile::PRIMARY_KEY, profile).await?;
    }
    for post in &state.posts {
        replay_row(adapter, UserPost::TABLE, UserPost::PRIMARY_KEY, post).await?;
    }
    for row in &state.media {
        replay_row(adapter, UserMedia::TABLE, UserMedia::PRIMARY_KEY, row).await?;
    }
    for row in &state.inspirations {
        replay_row(adapter, PostInspiration::TABLE, PostInspiration::PRIMARY_KEY, row).await?;
    }
    for row in &state.follows {
        replay_row(adapter, UserFollow::TABLE, UserFollow::PRIMARY_KEY, row).await?;
    }
    Ok(())
}
