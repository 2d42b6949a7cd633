//! Canonical seed dataset and idempotent reconciliation
//!
//! The literal rows mirror the deployed seed script. Reconciliation
//! inserts whatever is missing, in dependency order (creators before
//! content, profiles before posts, creators and profiles before
//! follows, posts and content before inspirations). Rows owned by a
//! seed principal other than the authenticated one are left absent:
//! the harness cannot act on their behalf.

use muse_common::error::{Error, Result};
use muse_common::model::{CreatorContent, CreatorProfile, Entity, SubscriptionTier};
use serde_json::json;

use crate::adapter::{AdapterExt, Filter, StoreAdapter};

#[derive(Debug, Clone, Copy)]
pub struct SeedUser {
    pub user_id: &'static str,
    pub tier: SubscriptionTier,
}

#[derive(Debug, Clone, Copy)]
pub struct SeedContent {
    pub profile_url: &'static str,
    pub post_url: &'static str,
    pub post_raw: &'static str,
    pub created_at: &'static str,
    pub updated_at: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct SeedPost {
    pub post_id: &'static str,
    pub user_id: &'static str,
    pub raw_text: &'static str,
    pub created_at: &'static str,
    pub updated_at: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct SeedMedia {
    pub user_media_id: &'static str,
    pub post_id: &'static str,
    pub media_url: &'static str,
    pub media_type: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct SeedFollow {
    pub id: &'static str,
    pub user_id: &'static str,
    pub creator_profile_url: &'static str,
    pub created_at: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct SeedInspiration {
    pub post_id: &'static str,
    pub content_post_url: &'static str,
    pub created_at: &'static str,
    pub updated_at: &'static str,
}

pub const SEED_USERS: [SeedUser; 3] = [
    SeedUser {
        user_id: "6d31c637-dd42-4a44-a0a4-ba9eda5dfebf",
        tier: SubscriptionTier::Free,
    },
    SeedUser {
        user_id: "71fd4d4b-ad95-4d77-8e43-5d0d666a5693",
        tier: SubscriptionTier::Pro,
    },
    SeedUser {
        user_id: "f08c2ad0-7629-4da6-ab99-44a7ad32a3e2",
        tier: SubscriptionTier::Free,
    },
];

pub const SEED_CREATOR_URLS: [&str; 3] = [
    "https://www.linkedin.com/in/josephalalou/",
    "https://www.linkedin.com/in/robin-guo/",
    "https://www.linkedin.com/in/ryan/",
];

pub const SEED_CREATOR_PLATFORM: &str = "linkedin";

pub const SEED_CREATOR_CONTENT: [SeedContent; 2] = [
    SeedContent {
        profile_url: "https://www.linkedin.com/in/robin-guo/",
        post_url: "https://www.linkedin.com/feed/update/urn:li:activity:7379926081165971456/",
        post_raw: "Whenever I speak with college students I try to instill the urgency of the market ... Go make something. Because the window is short and your time finite.",
        created_at: "2025-10-05T21:53:01.781105+00:00",
        updated_at: "2025-10-05T21:53:01.781105+00:00",
    },
    SeedContent {
        profile_url: "https://www.linkedin.com/in/robin-guo/",
        post_url: "https://www.linkedin.com/feed/update/urn:li:activity:7379527699394052096/",
        post_raw: "Being an engineer or “being technical” is, at its core, understanding deeply how something works...",
        created_at: "2025-10-05T21:56:06.719606+00:00",
        updated_at: "2025-10-05T21:56:06.719606+00:00",
    },
];

pub const SEED_POSTS: [SeedPost; 3] = [
    SeedPost {
        post_id: "0a1894aa-a4cf-47db-8fd8-dc6373e6e8e9",
        user_id: "6d31c637-dd42-4a44-a0a4-ba9eda5dfebf",
        raw_text: "If you consider yourself an engineer...",
        created_at: "2025-10-05T21:44:37.966178+00:00",
        updated_at: "2025-10-05T21:44:37.966178+00:00",
    },
    SeedPost {
        post_id: "8a845cc5-77f7-4a00-883b-e277b73a4ebb",
        user_id: "f08c2ad0-7629-4da6-ab99-44a7ad32a3e2",
        raw_text: "I don't need any inspiration for my post because it's just a cute dog!",
        created_at: "2025-10-05T21:44:52.004890+00:00",
        updated_at: "2025-10-05T21:44:52.004890+00:00",
    },
    SeedPost {
        post_id: "e037dfd2-5e20-458c-8179-2289c23a42ea",
        user_id: "71fd4d4b-ad95-4d77-8e43-5d0d666a5693",
        raw_text: "When I reflect on the positions of my peers...",
        created_at: "2025-10-05T21:45:16.451121+00:00",
        updated_at: "2025-10-05T21:45:16.451121+00:00",
    },
];

/// The dog-post media row; verified (not reconciled) because its owner
/// is a seed principal the harness usually cannot act for
pub const SEED_MEDIA: [SeedMedia; 1] = [SeedMedia {
    user_media_id: "bdd7ab64-8633-417b-8068-0830d7c97fc8",
    post_id: "8a845cc5-77f7-4a00-883b-e277b73a4ebb",
    media_url: "https://petcube.com/blog/content/images/2018/04/boo-the-dog-2.jpg",
    media_type: "image",
}];

pub const SEED_FOLLOWS: [SeedFollow; 3] = [
    SeedFollow {
        id: "4dfdadd3-104e-4472-b5c0-35b5445be233",
        user_id: "71fd4d4b-ad95-4d77-8e43-5d0d666a5693",
        creator_profile_url: "https://www.linkedin.com/in/robin-guo/",
        created_at: "2025-10-05T21:51:44.075097+00:00",
    },
    SeedFollow {
        id: "68c31ebd-9f75-466d-b062-fdbcdff50037",
        user_id: "71fd4d4b-ad95-4d77-8e43-5d0d666a5693",
        creator_profile_url: "https://www.linkedin.com/in/ryan/",
        created_at: "2025-10-05T21:51:31.144221+00:00",
    },
    SeedFollow {
        id: "f07f3fe1-9f7f-4e51-b923-d8da806c8469",
        user_id: "6d31c637-dd42-4a44-a0a4-ba9eda5dfebf",
        creator_profile_url: "https://www.linkedin.com/in/ryan/",
        created_at: "2025-10-05T21:51:20.860184+00:00",
    },
];

pub const SEED_INSPIRATIONS: [SeedInspiration; 2] = [
    SeedInspiration {
        post_id: "0a1894aa-a4cf-47db-8fd8-dc6373e6e8e9",
        content_post_url:
            "https://www.linkedin.com/feed/update/urn:li:activity:7379926081165971456/",
        created_at: "2025-10-05T21:57:41.227074+00:00",
        updated_at: "2025-10-05T21:57:41.227074+00:00",
    },
    SeedInspiration {
        post_id: "e037dfd2-5e20-458c-8179-2289c23a42ea",
        content_post_url:
            "https://www.linkedin.com/feed/update/urn:li:activity:7379527699394052096/",
        created_at: "2025-10-05T22:01:46.447934+00:00",
        updated_at: "2025-10-05T22:01:46.447934+00:00",
    },
];

/// Declared owner of a seed post, if the post is part of the dataset
pub fn seed_post_owner(post_id: &str) -> Option<&'static str> {
    SEED_POSTS
        .iter()
        .find(|p| p.post_id == post_id)
        .map(|p| p.user_id)
}

/// Insert any missing seed rows the authenticated principal is allowed
/// to own. Running this twice in a row is a no-op the second time.
pub async fn ensure_seed_data<A: StoreAdapter>(adapter: &A) -> Result<()> {
    let auth_user = adapter
        .authenticated_user_id()
        .ok_or_else(|| Error::Assertion("authentication required to reconcile seed data".into()))?
        .to_string();

    for user in &SEED_USERS {
        let filter = Filter::new().eq("user_id", user.user_id);
        let existing = adapter.select_one("user_profiles", &filter).await?;
        if existing.is_none() && user.user_id == auth_user {
            adapter
                .insert(
                    "user_profiles",
                    json!({ "user_id": user.user_id, "subscription_tier": user.tier.as_str() }),
                )
                .await?;
        }
    }

    for url in SEED_CREATOR_URLS {
        let filter = Filter::new().eq("profile_url", url);
        if adapter.select_one(CreatorProfile::TABLE, &filter).await?.is_none() {
            adapter
                .insert(
                    CreatorProfile::TABLE,
                    json!({ "profile_url": url, "platform": SEED_CREATOR_PLATFORM }),
                )
                .await?;
        }
    }

    for content in &SEED_CREATOR_CONTENT {
        let creator: Option<CreatorProfile> = adapter
            .find_one(&Filter::new().eq("profile_url", content.profile_url))
            .await?;
        let Some(creator) = creator else {
            continue;
        };
        let Some(creator_id) = creator.creator_id else {
            continue;
        };
        let existing = adapter
            .select_one(
                CreatorContent::TABLE,
                &Filter::new()
                    .eq("creator_id", creator_id.to_string())
                    .eq("post_url", content.post_url),
            )
            .await?;
        if existing.is_none() {
            adapter
                .insert(
                    CreatorContent::TABLE,
                    json!({
                        "creator_id": creator_id.to_string(),
                        "post_url": content.post_url,
                        "post_raw": content.post_raw,
                        "created_at": content.created_at,
                        "updated_at": content.updated_at,
                    }),
                )
                .await?;
        }
    }

    for post in &SEED_POSTS {
        if post.user_id != auth_user {
            continue;
        }
        let filter = Filter::new().eq("post_id", post.post_id);
        if adapter.select_one("user_posts", &filter).await?.is_none() {
            adapter
                .insert(
                    "user_posts",
                    json!({
                        "post_id": post.post_id,
                        "user_id": post.user_id,
                        "raw_text": post.raw_text,
                        "created_at": post.created_at,
                        "updated_at": post.updated_at,
                    }),
                )
                .await?;
        }
    }

    for follow in &SEED_FOLLOWS {
        if follow.user_id != auth_user {
            continue;
        }
        let filter = Filter::new().eq("id", follow.id);
        if adapter.select_one("user_follows", &filter).await?.is_some() {
            continue;
        }
        let creator: Option<CreatorProfile> = adapter
            .find_one(&Filter::new().eq("profile_url", follow.creator_profile_url))
            .await?;
        let Some(creator_id) = creator.and_then(|c| c.creator_id) else {
            continue;
        };
        adapter
            .insert(
                "user_follows",
                json!({
                    "id": follow.id,
                    "user_id": follow.user_id,
                    "creator_id": creator_id.to_string(),
                    "created_at": follow.created_at,
                }),
            )
            .await?;
    }

    for inspiration in &SEED_INSPIRATIONS {
        if seed_post_owner(inspiration.post_id) != Some(auth_user.as_str()) {
            continue;
        }
        let filter = Filter::new().eq("post_id", inspiration.post_id);
        if adapter
            .select_one("post_inspirations", &filter)
            .await?
            .is_some()
        {
            continue;
        }
        let content: Option<CreatorContent> = adapter
            .find_one(&Filter::new().eq("post_url", inspiration.content_post_url))
            .await?;
        let Some(content_id) = content.and_then(|c| c.content_id) else {
            continue;
        };
        adapter
            .insert(
                "post_inspirations",
                json!({
                    "post_id": inspiration.post_id,
                    "content_id": content_id.to_string(),
                    "created_at": inspiration.created_at,
                    "updated_at": inspiration.updated_at,
                }),
            )
            .await?;
    }

    Ok(())
}
