//! The check suite
//!
//! Six deterministic verification routines, run sequentially in a
//! fixed order. Each check is independently wrapped so one failure
//! never aborts the remaining checks, and each check's cleanup runs
//! whether or not its assertions held.

use muse_common::error::{
    Error, Result, SQLSTATE_CHECK_VIOLATION, SQLSTATE_UNIQUE_VIOLATION,
};
use muse_common::model::{
    row_timestamp, CreatorContent, CreatorProfile, Entity, SubscriptionTier, UserProfile,
    REQUIRED_TABLES,
};
use serde_json::json;
use tracing::{error, info, warn};

use crate::adapter::{AdapterExt, Filter, StoreAdapter};
use crate::fixture::{build_graph, cleanup_graph};
use crate::seed::{
    ensure_seed_data, SEED_CREATOR_PLATFORM, SEED_CREATOR_URLS, SEED_INSPIRATIONS, SEED_MEDIA,
    SEED_POSTS, SEED_USERS,
};
use crate::snapshot::{restore_user_state, snapshot_user_state};

/// Fail the current check unless `condition` holds
fn ensure(condition: bool, message: impl Into<String>) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(Error::Assertion(message.into()))
    }
}

/// Consume the error from an intentionally-provoked violation.
///
/// A matching SQLSTATE passes; a different SQLSTATE is an assertion
/// failure; anything that is not a constraint violation at all is an
/// unexpected adapter error and propagates unchanged.
fn expect_sqlstate(err: Error, expected: &str, context: &str) -> Result<()> {
    match err {
        Error::Constraint { code, .. } if code == expected => Ok(()),
        Error::Constraint { code, .. } => Err(Error::Assertion(format!(
            "{context}: expected SQLSTATE {expected}, got {code}"
        ))),
        other => Err(other),
    }
}

/// Combine a check body's result with its cleanup result: the body's
/// failure wins, and a cleanup failure after a failed body is only
/// logged so it never masks the original assertion
fn settle(body: Result<()>, cleanup: Result<()>) -> Result<()> {
    match (body, cleanup) {
        (Ok(()), cleanup) => cleanup,
        (Err(body_err), Err(cleanup_err)) => {
            warn!("Cleanup after failed check also failed: {cleanup_err}");
            Err(body_err)
        }
        (Err(body_err), Ok(())) => Err(body_err),
    }
}

fn authenticated_user<A: StoreAdapter>(adapter: &A, context: &str) -> Result<uuid::Uuid> {
    adapter
        .authenticated_user_id()
        .ok_or_else(|| Error::Assertion(format!("authenticated principal required for {context}")))
}

/// Check 1: every required table is visible
pub async fn check_tables_exist<A: StoreAdapter>(adapter: &A) -> Result<()> {
    for table in REQUIRED_TABLES {
        ensure(
            adapter.table_exists(table).await?,
            format!("Missing required table: {table}"),
        )?;
    }
    Ok(())
}

/// Check 2: subscription_tier CHECK constraint plus the updated_at
/// touch trigger
pub async fn check_subscription_tier<A: StoreAdapter>(adapter: &A) -> Result<()> {
    let user_id = authenticated_user(adapter, "subscription_tier checks")?;
    let profile_filter = Filter::new().eq(UserProfile::PRIMARY_KEY, user_id.to_string());

    let mut created_profile = false;
    let baseline: UserProfile = match adapter.find_one(&profile_filter).await? {
        Some(row) => row,
        None => {
            adapter
                .insert_row(&UserProfile {
                    user_id,
                    subscription_tier: SubscriptionTier::Free,
                    created_at: None,
                    updated_at: None,
                })
                .await?;
            created_profile = true;
            adapter.find_one(&profile_filter).await?.ok_or_else(|| {
                Error::Assertion("Failed to establish baseline user_profile row".into())
            })?
        }
    };

    let baseline_tier = baseline.subscription_tier;
    let baseline_timestamp = baseline
        .updated_at
        .ok_or_else(|| Error::Assertion("baseline user_profile row has no updated_at".into()))?;

    let body = async {
        // Outside the enumerated set: must be rejected by the CHECK
        match adapter
            .update(
                UserProfile::TABLE,
                &profile_filter,
                json!({ "subscription_tier": "enterprise" }),
            )
            .await
        {
            Ok(_) => Err(Error::Assertion(
                "subscription_tier check accepted invalid value".into(),
            )),
            Err(e) => expect_sqlstate(e, SQLSTATE_CHECK_VIOLATION, "user_profiles subscription_tier"),
        }?;

        // A valid tier flip must succeed and strictly advance updated_at
        let desired_tier = if baseline_tier == SubscriptionTier::Pro {
            SubscriptionTier::Free
        } else {
            SubscriptionTier::Pro
        };
        let updated = adapter
            .update(
                UserProfile::TABLE,
                &profile_filter,
                json!({ "subscription_tier": desired_tier.as_str() }),
            )
            .await?;
        let new_timestamp = row_timestamp(&updated, "updated_at")
            .map_err(|_| Error::Assertion("user_profiles update did not return updated_at".into()))?;
        ensure(
            new_timestamp > baseline_timestamp,
            "touch_updated_at trigger did not bump updated_at",
        )
    }
    .await;

    let cleanup = async {
        adapter
            .update(
                UserProfile::TABLE,
                &profile_filter,
                json!({ "subscription_tier": baseline_tier.as_str() }),
            )
            .await?;
        if created_profile {
            adapter.delete(UserProfile::TABLE, &profile_filter).await?;
        }
        Ok(())
    }
    .await;

    settle(body, cleanup)
}

/// Check 3: creator_profiles uniqueness and URL syntax constraints
pub async fn check_creator_profile_validations<A: StoreAdapter>(adapter: &A) -> Result<()> {
    let base_url = "https://example.com/creator";
    let baseline_filter = Filter::new()
        .eq("profile_url", base_url)
        .eq("platform", "blog");

    let body = async {
        let inserted: CreatorProfile = adapter
            .insert_row(&CreatorProfile {
                creator_id: None,
                profile_url: base_url.to_string(),
                platform: "blog".to_string(),
                created_at: None,
                updated_at: None,
            })
            .await?;
        ensure(
            inserted.creator_id.is_some(),
            "Failed to insert baseline creator_profile",
        )?;

        // Same (platform, profile_url) pair: unique violation
        match adapter
            .insert(
                CreatorProfile::TABLE,
                json!({ "profile_url": base_url, "platform": "blog" }),
            )
            .await
        {
            Ok(_) => Err(Error::Assertion(
                "creator_profiles unique(platform, profile_url) not enforced".into(),
            )),
            Err(e) => expect_sqlstate(e, SQLSTATE_UNIQUE_VIOLATION, "creator_profiles unique constraint"),
        }?;

        // Syntactically invalid URL: check violation
        match adapter
            .insert(
                CreatorProfile::TABLE,
                json!({ "profile_url": "not-a-url", "platform": "blog" }),
            )
            .await
        {
            Ok(_) => Err(Error::Assertion(
                "creator_profiles URL check accepted an invalid value".into(),
            )),
            Err(e) => expect_sqlstate(e, SQLSTATE_CHECK_VIOLATION, "creator_profiles URL check"),
        }
    }
    .await;

    let cleanup = async {
        adapter
            .delete(CreatorProfile::TABLE, &baseline_filter)
            .await?;
        Ok(())
    }
    .await;

    settle(body, cleanup)
}

/// Check 4: cascade chains from profile and creator deletion
pub async fn check_cascades<A: StoreAdapter>(adapter: &A) -> Result<()> {
    let user_id = authenticated_user(adapter, "cascade checks")?;
    let original_state = snapshot_user_state(adapter, user_id).await?;
    let refs = build_graph(adapter).await?;

    let body = async {
        adapter
            .delete(
                UserProfile::TABLE,
                &Filter::new().eq(UserProfile::PRIMARY_KEY, refs.user_id.to_string()),
            )
            .await?;

        let post_count = adapter
            .count(
                "user_posts",
                Some(&Filter::new().eq("post_id", refs.post_id.to_string())),
            )
            .await?;
        ensure(
            post_count == 0,
            "user_posts did not cascade delete when user_profile removed",
        )?;

        let media_count = adapter
            .count(
                "user_media",
                Some(&Filter::new().eq("user_media_id", refs.media_id.to_string())),
            )
            .await?;
        ensure(
            media_count == 0,
            "user_media did not cascade delete when user_profile removed",
        )?;

        let follow_count = adapter
            .count(
                "user_follows",
                Some(&Filter::new().eq("id", refs.follow_id.to_string())),
            )
            .await?;
        ensure(
            follow_count == 0,
            "user_follows did not cascade delete when user_profile removed",
        )?;

        let inspiration_count = adapter
            .count(
                "post_inspirations",
                Some(&Filter::new().eq("id", refs.inspiration_id.to_string())),
            )
            .await?;
        ensure(
            inspiration_count == 0,
            "post_inspirations did not cascade delete via user_post",
        )?;

        // Creator-side content survives the principal's deletion
        let content_filter = Filter::new().eq("content_id", refs.content_id.to_string());
        let content_count = adapter
            .count(CreatorContent::TABLE, Some(&content_filter))
            .await?;
        ensure(
            content_count == 1,
            "creator_content should remain until creator is deleted",
        )?;

        adapter
            .delete(
                CreatorProfile::TABLE,
                &Filter::new().eq(CreatorProfile::PRIMARY_KEY, refs.creator_id.to_string()),
            )
            .await?;
        let content_count = adapter
            .count(CreatorContent::TABLE, Some(&content_filter))
            .await?;
        ensure(
            content_count == 0,
            "creator_content did not cascade delete when creator removed",
        )
    }
    .await;

    let cleanup = async {
        if refs.original_profile.is_some() {
            restore_user_state(adapter, &original_state).await?;
        }
        cleanup_graph(adapter, &refs).await
    }
    .await;

    settle(body, cleanup)
}

/// Check 5: post_inspirations UNIQUE(post_id, content_id)
pub async fn check_post_inspirations_unique<A: StoreAdapter>(adapter: &A) -> Result<()> {
    let refs = build_graph(adapter).await?;

    let body = async {
        match adapter
            .insert(
                "post_inspirations",
                json!({
                    "post_id": refs.post_id.to_string(),
                    "content_id": refs.content_id.to_string(),
                }),
            )
            .await
        {
            Ok(_) => Err(Error::Assertion(
                "post_inspirations UNIQUE(post_id, content_id) did not reject duplicates".into(),
            )),
            Err(e) => expect_sqlstate(e, SQLSTATE_UNIQUE_VIOLATION, "post_inspirations unique"),
        }
    }
    .await;

    let cleanup = cleanup_graph(adapter, &refs).await;

    settle(body, cleanup)
}

/// Check 6: seed dataset reconciles and matches expectations
pub async fn check_seed_data_integrity<A: StoreAdapter>(adapter: &A) -> Result<()> {
    ensure_seed_data(adapter).await?;
    let auth_user = authenticated_user(adapter, "seed verification")?.to_string();

    let mut verified_users = 0;
    for user in &SEED_USERS {
        let row = adapter
            .select_one("user_profiles", &Filter::new().eq("user_id", user.user_id))
            .await?;
        let Some(row) = row else {
            // Other principals' rows may be invisible; our own must exist
            ensure(
                user.user_id != auth_user,
                format!("Seed user {} missing", user.user_id),
            )?;
            continue;
        };
        let tier = row.get("subscription_tier").and_then(|t| t.as_str());
        ensure(
            tier == Some(user.tier.as_str()),
            format!("Seed user {} tier mismatch", user.user_id),
        )?;
        verified_users += 1;
    }
    ensure(
        verified_users > 0,
        "No seed user rows accessible with current credentials",
    )?;

    for url in SEED_CREATOR_URLS {
        let creator: Option<CreatorProfile> = adapter
            .find_one(&Filter::new().eq("profile_url", url))
            .await?;
        let creator = creator
            .ok_or_else(|| Error::Assertion(format!("Seed creator {url} missing")))?;
        ensure(
            creator.platform.eq_ignore_ascii_case(SEED_CREATOR_PLATFORM),
            format!("Seed creator {url} platform mismatch"),
        )?;
    }

    let mut verified_posts = 0;
    for post in &SEED_POSTS {
        let row = adapter
            .select_one("user_posts", &Filter::new().eq("post_id", post.post_id))
            .await?;
        let Some(row) = row else {
            continue;
        };
        let owner = row.get("user_id").and_then(|u| u.as_str());
        ensure(
            owner == Some(post.user_id),
            format!("Seed post {} owned by wrong user", post.post_id),
        )?;
        verified_posts += 1;
    }
    ensure(verified_posts > 0, "No seed posts visible for verification")?;

    for media in &SEED_MEDIA {
        let count = adapter
            .count(
                "user_media",
                Some(&Filter::new().eq("post_id", media.post_id)),
            )
            .await?;
        ensure(
            count == 1,
            format!("Seed user_media for post {} missing", media.post_id),
        )?;
    }

    let mut verified_inspirations = 0;
    for seed in &SEED_INSPIRATIONS {
        let inspiration = adapter
            .select_one(
                "post_inspirations",
                &Filter::new().eq("post_id", seed.post_id),
            )
            .await?;
        let Some(inspiration) = inspiration else {
            continue;
        };
        let content_id = inspiration
            .get("content_id")
            .and_then(|c| c.as_str())
            .ok_or_else(|| Error::Assertion("seed inspiration row has no content_id".into()))?;
        let content = adapter
            .select_one(
                CreatorContent::TABLE,
                &Filter::new()
                    .eq("content_id", content_id)
                    .eq("post_url", seed.content_post_url),
            )
            .await?;
        ensure(
            content.is_some(),
            format!(
                "Seed post_inspiration linking {} to {} missing",
                seed.post_id, seed.content_post_url
            ),
        )?;
        verified_inspirations += 1;
    }
    ensure(
        verified_inspirations > 0,
        "Could not verify any post_inspirations seeds",
    )?;

    // The declared follow relationship, checked only when both sides
    // are visible to the current principal
    let robin: Option<CreatorProfile> = adapter
        .find_one(&Filter::new().eq("profile_url", "https://www.linkedin.com/in/robin-guo/"))
        .await?;
    if let Some(creator_id) = robin.and_then(|c| c.creator_id) {
        let follow_count = adapter
            .count(
                "user_follows",
                Some(
                    &Filter::new()
                        .eq("user_id", auth_user.as_str())
                        .eq("creator_id", creator_id.to_string()),
                ),
            )
            .await?;
        ensure(
            follow_count >= 1,
            "Seed follow for Robin Guo missing for authenticated user",
        )?;
    }

    Ok(())
}

/// Outcome of one check
pub struct CheckOutcome {
    pub name: &'static str,
    pub error: Option<Error>,
}

/// Result of a full suite run
pub struct RunReport {
    pub outcomes: Vec<CheckOutcome>,
}

impl RunReport {
    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| o.error.is_some()).count()
    }

    pub fn all_passed(&self) -> bool {
        self.failures() == 0
    }
}

fn record(outcomes: &mut Vec<CheckOutcome>, name: &'static str, result: Result<()>) {
    match result {
        Ok(()) => {
            info!("  ✓ {name}");
            outcomes.push(CheckOutcome { name, error: None });
        }
        Err(e) => {
            error!("  ✗ {name} failed: {e}");
            outcomes.push(CheckOutcome {
                name,
                error: Some(e),
            });
        }
    }
}

/// Run every check in order, capturing per-check failures so later
/// checks still execute. The caller owns adapter teardown.
pub async fn run_all<A: StoreAdapter>(adapter: &A) -> RunReport {
    let mut outcomes = Vec::new();

    info!("Verifying table existence...");
    record(
        &mut outcomes,
        "table existence",
        check_tables_exist(adapter).await,
    );

    info!("Validating subscription_tier check and updated_at trigger...");
    record(
        &mut outcomes,
        "subscription_tier + trigger",
        check_subscription_tier(adapter).await,
    );

    info!("Validating creator_profiles constraints...");
    record(
        &mut outcomes,
        "creator_profiles constraints",
        check_creator_profile_validations(adapter).await,
    );

    info!("Exercising cascade chains...");
    record(&mut outcomes, "cascade chains", check_cascades(adapter).await);

    info!("Checking post_inspirations unique constraint...");
    record(
        &mut outcomes,
        "post_inspirations uniqueness",
        check_post_inspirations_unique(adapter).await,
    );

    info!("Verifying seed data integrity...");
    record(
        &mut outcomes,
        "seed data integrity",
        check_seed_data_integrity(adapter).await,
    );

    RunReport { outcomes }
}
