//! Fixture builder
//!
//! Builds and tears down a minimal connected entity graph (profile →
//! creator → content → post → media → follow → inspiration) for the
//! mutation-sensitive checks. Teardown runs leaf-to-root and tolerates
//! rows that already vanished via cascade.

use muse_common::error::{Error, Result};
use muse_common::model::{
    CreatorContent, CreatorProfile, Entity, PostInspiration, SubscriptionTier, UserFollow,
    UserMedia, UserPost, UserProfile,
};
use uuid::Uuid;

use crate::adapter::{AdapterExt, Filter, StoreAdapter};

/// Generated ids of one built graph, plus what the builder found or
/// created on the principal's profile
#[derive(Debug, Clone)]
pub struct GraphRefs {
    pub user_id: Uuid,
    pub creator_id: Uuid,
    pub content_id: Uuid,
    pub post_id: Uuid,
    pub media_id: Uuid,
    pub follow_id: Uuid,
    pub inspiration_id: Uuid,
    /// True if the builder had to create the principal's profile
    pub created_profile: bool,
    /// Profile row that pre-existed the build, if any
    pub original_profile: Option<UserProfile>,
}

fn generated<T>(id: Option<T>, context: &str) -> Result<T> {
    id.ok_or_else(|| Error::Assertion(format!("{context} insert did not return its generated id")))
}

/// Build the full connected graph owned by the authenticated principal
pub async fn build_graph<A: StoreAdapter>(adapter: &A) -> Result<GraphRefs> {
    let user_id = adapter
        .authenticated_user_id()
        .ok_or_else(|| Error::Assertion("authenticated principal required to build graph".into()))?;

    let profile_filter = Filter::new().eq(UserProfile::PRIMARY_KEY, user_id.to_string());
    let original_profile: Option<UserProfile> = adapter.find_one(&profile_filter).await?;
    let created_profile = original_profile.is_none();
    if created_profile {
        adapter
            .insert_row(&UserProfile {
                user_id,
                subscription_tier: SubscriptionTier::Free,
                created_at: None,
                updated_at: None,
            })
            .await?;
    }

    let creator = adapter
        .insert_row(&CreatorProfile {
            creator_id: None,
            profile_url: format!("https://example.com/{}", Uuid::new_v4().simple()),
            platform: "linkedin".to_string(),
            created_at: None,
            updated_at: None,
        })
        .await?;
    let creator_id = generated(creator.creator_id, "creator_profiles")?;

    let content = adapter
        .insert_row(&CreatorContent {
            content_id: None,
            creator_id,
            post_url: format!("https://example.com/post/{}", Uuid::new_v4().simple()),
            post_raw: "Example content".to_string(),
            created_at: None,
            updated_at: None,
        })
        .await?;
    let content_id = generated(content.content_id, "creator_content")?;

    let post = adapter
        .insert_row(&UserPost {
            post_id: None,
            user_id,
            raw_text: "Hello world".to_string(),
            created_at: None,
            updated_at: None,
        })
        .await?;
    let post_id = generated(post.post_id, "user_posts")?;

    let media = adapter
        .insert_row(&UserMedia {
            user_media_id: None,
            post_id,
            media_url: "https://example.com/image.png".to_string(),
            media_type: "image".to_string(),
            created_at: None,
            updated_at: None,
        })
        .await?;
    let media_id = generated(media.user_media_id, "user_media")?;

    let follow = adapter
        .insert_row(&UserFollow {
            id: None,
            user_id,
            creator_id,
            created_at: None,
        })
        .await?;
    let follow_id = generated(follow.id, "user_follows")?;

    let inspiration = adapter
        .insert_row(&PostInspiration {
            id: None,
            post_id,
            content_id,
            created_at: None,
            updated_at: None,
        })
        .await?;
    let inspiration_id = generated(inspiration.id, "post_inspirations")?;

    Ok(GraphRefs {
        user_id,
        creator_id,
        content_id,
        post_id,
        media_id,
        follow_id,
        inspiration_id,
        created_profile,
        original_profile,
    })
}

/// Delete the graph leaf-to-root.
///
/// Rows already removed by a cascade delete as zero rows affected,
/// which is success here, so this is safe to call unconditionally.
pub async fn cleanup_graph<A: StoreAdapter>(adapter: &A, refs: &GraphRefs) -> Result<()> {
    adapter
        .delete(
            PostInspiration::TABLE,
            &Filter::new().eq(PostInspiration::PRIMARY_KEY, refs.inspiration_id.to_string()),
        )
        .await?;
    adapter
        .delete(
            UserMedia::TABLE,
            &Filter::new().eq(UserMedia::PRIMARY_KEY, refs.media_id.to_string()),
        )
        .await?;
    adapter
        .delete(
            UserFollow::TABLE,
            &Filter::new().eq(UserFollow::PRIMARY_KEY, refs.follow_id.to_string()),
        )
        .await?;
    adapter
        .delete(
            UserPost::TABLE,
            &Filter::new().eq(UserPost::PRIMARY_KEY, refs.post_id.to_string()),
        )
        .await?;
    adapter
        .delete(
            CreatorContent::TABLE,
            &Filter::new().eq(CreatorContent::PRIMARY_KEY, refs.content_id.to_string()),
        )
        .await?;
    adapter
        .delete(
            CreatorProfile::TABLE,
            &Filter::new().eq(CreatorProfile::PRIMARY_KEY, refs.creator_id.to_string()),
        )
        .await?;
    if refs.created_profile {
        adapter
            .delete(
                UserProfile::TABLE,
                &Filter::new().eq(UserProfile::PRIMARY_KEY, refs.user_id.to_string()),
            )
            .await?;
    }
    Ok(())
}
