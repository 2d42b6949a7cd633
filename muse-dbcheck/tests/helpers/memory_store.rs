//! In-memory `StoreAdapter` implementation
//!
//! Enforces the schema's declared invariants (subscription tier CHECK,
//! creator URL CHECK, both UNIQUE pairs, primary-key uniqueness,
//! cascade chains, updated_at touch trigger) so the check suite and
//! its components can run network-free. `seeded()` mirrors a
//! deployment where the seed script already ran.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use muse_common::error::{
    Error, Result, SQLSTATE_CHECK_VIOLATION, SQLSTATE_UNIQUE_VIOLATION,
};
use muse_common::model::REQUIRED_TABLES;
use muse_dbcheck::adapter::{Filter, StoreAdapter};
use muse_dbcheck::seed::{
    SEED_CREATOR_CONTENT, SEED_CREATOR_URLS, SEED_FOLLOWS, SEED_INSPIRATIONS, SEED_MEDIA,
    SEED_POSTS, SEED_USERS,
};
use serde_json::{json, Value};
use uuid::Uuid;

const SEED_BASELINE_TS: &str = "2025-10-05T00:00:00+00:00";

struct State {
    tables: HashMap<String, Vec<Value>>,
    clock: DateTime<Utc>,
}

impl State {
    fn empty() -> Self {
        let tables = REQUIRED_TABLES
            .iter()
            .map(|t| (t.to_string(), Vec::new()))
            .collect();
        Self {
            tables,
            clock: Utc::now(),
        }
    }

    /// Strictly monotonic timestamp source standing in for the
    /// touch_updated_at trigger
    fn tick(&mut self) -> String {
        let now = Utc::now();
        self.clock = if now > self.clock {
            now
        } else {
            self.clock + Duration::microseconds(1)
        };
        self.clock.to_rfc3339_opts(SecondsFormat::Micros, false)
    }

    fn rows(&self, table: &str) -> Result<&Vec<Value>> {
        self.tables.get(table).ok_or_else(|| Error::Api {
            status: 404,
            body: format!("relation \"{table}\" does not exist"),
        })
    }

    fn rows_mut(&mut self, table: &str) -> Result<&mut Vec<Value>> {
        self.tables.get_mut(table).ok_or_else(|| Error::Api {
            status: 404,
            body: format!("relation \"{table}\" does not exist"),
        })
    }
}

pub struct MemoryStore {
    user_id: Uuid,
    state: Mutex<State>,
}

fn pk_column(table: &str) -> &'static str {
    match table {
        "user_profiles" => "user_id",
        "creator_profiles" => "creator_id",
        "creator_content" => "content_id",
        "user_posts" => "post_id",
        "user_media" => "user_media_id",
        _ => "id",
    }
}

fn has_updated_at(table: &str) -> bool {
    table != "user_follows"
}

/// CHECK constraints declared by the schema
fn validate_checks(table: &str, row: &Value) -> Result<()> {
    match table {
        "user_profiles" => {
            if let Some(tier) = row.get("subscription_tier").and_then(|t| t.as_str()) {
                if tier != "free" && tier != "pro" {
                    return Err(Error::constraint(
                        SQLSTATE_CHECK_VIOLATION,
                        format!("subscription_tier \"{tier}\" outside enumerated set"),
                    ));
                }
            }
        }
        "creator_profiles" => {
            if let Some(url) = row.get("profile_url").and_then(|u| u.as_str()) {
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    return Err(Error::constraint(
                        SQLSTATE_CHECK_VIOLATION,
                        format!("profile_url \"{url}\" is not a URL"),
                    ));
                }
            }
        }
        _ => {}
    }
    Ok(())
}

/// UNIQUE column-pair constraints declared by the schema
fn unique_pair(table: &str) -> Option<[&'static str; 2]> {
    match table {
        "creator_profiles" => Some(["platform", "profile_url"]),
        "post_inspirations" => Some(["post_id", "content_id"]),
        _ => None,
    }
}

fn remove_matching<F: Fn(&Value) -> bool>(state: &mut State, table: &str, pred: F) -> Vec<Value> {
    let Some(rows) = state.tables.get_mut(table) else {
        return Vec::new();
    };
    let mut removed = Vec::new();
    rows.retain(|row| {
        if pred(row) {
            removed.push(row.clone());
            false
        } else {
            true
        }
    });
    removed
}

fn remove_where(state: &mut State, table: &str, column: &str, value: &Value) -> Vec<Value> {
    remove_matching(state, table, |row| row.get(column) == Some(value))
}

/// Replays the schema's ON DELETE CASCADE chains for rows just removed
/// from `table`
fn cascade(state: &mut State, table: &str, removed: &[Value]) {
    for row in removed {
        match table {
            "user_profiles" => {
                if let Some(user_id) = row.get("user_id").cloned() {
                    let posts = remove_where(state, "user_posts", "user_id", &user_id);
                    cascade(state, "user_posts", &posts);
                    remove_where(state, "user_follows", "user_id", &user_id);
                }
            }
            "user_posts" => {
                if let Some(post_id) = row.get("post_id").cloned() {
                    remove_where(state, "user_media", "post_id", &post_id);
                    remove_where(state, "post_inspirations", "post_id", &post_id);
                }
            }
            "creator_profiles" => {
                if let Some(creator_id) = row.get("creator_id").cloned() {
                    let content = remove_where(state, "creator_content", "creator_id", &creator_id);
                    cascade(state, "creator_content", &content);
                    remove_where(state, "user_follows", "creator_id", &creator_id);
                }
            }
            "creator_content" => {
                if let Some(content_id) = row.get("content_id").cloned() {
                    remove_where(state, "post_inspirations", "content_id", &content_id);
                }
            }
            _ => {}
        }
    }
}

fn insert_into(state: &mut State, table: &str, row: Value) -> Result<Value> {
    let mut row = match row {
        Value::Object(map) => map,
        other => {
            return Err(Error::Api {
                status: 400,
                body: format!("insert payload must be an object, got {other}"),
            })
        }
    };

    validate_checks(table, &Value::Object(row.clone()))?;

    let pk = pk_column(table);
    if !row.contains_key(pk) {
        row.insert(pk.to_string(), json!(Uuid::new_v4().to_string()));
    }
    let pk_value = row[pk].clone();
    if state.rows(table)?.iter().any(|r| r.get(pk) == Some(&pk_value)) {
        return Err(Error::constraint(
            SQLSTATE_UNIQUE_VIOLATION,
            format!("duplicate key value violates primary key on {table}"),
        ));
    }
    if let Some([a, b]) = unique_pair(table) {
        let duplicate = state
            .rows(table)?
            .iter()
            .any(|r| r.get(a) == row.get(a) && r.get(b) == row.get(b));
        if duplicate {
            return Err(Error::constraint(
                SQLSTATE_UNIQUE_VIOLATION,
                format!("duplicate key value violates unique ({a}, {b}) on {table}"),
            ));
        }
    }

    let now = state.tick();
    if !row.contains_key("created_at") {
        row.insert("created_at".to_string(), json!(now));
    }
    if has_updated_at(table) && !row.contains_key("updated_at") {
        row.insert("updated_at".to_string(), json!(now));
    }

    let stored = Value::Object(row);
    state.rows_mut(table)?.push(stored.clone());
    Ok(stored)
}

impl MemoryStore {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            state: Mutex::new(State::empty()),
        }
    }

    /// A store where the deployed seed script already ran: all seed
    /// principals, creators, content, posts, media, follows, and
    /// inspirations are present
    pub fn seeded(user_id: Uuid) -> Self {
        let mut state = State::empty();

        let mut creator_ids: HashMap<&str, String> = HashMap::new();
        for url in SEED_CREATOR_URLS {
            let id = Uuid::new_v4().to_string();
            state
                .tables
                .get_mut("creator_profiles")
                .expect("seed table")
                .push(json!({
                    "creator_id": id.clone(),
                    "profile_url": url,
                    "platform": "linkedin",
                    "created_at": SEED_BASELINE_TS,
                    "updated_at": SEED_BASELINE_TS,
                }));
            creator_ids.insert(url, id);
        }

        let mut content_ids: HashMap<&str, String> = HashMap::new();
        for content in &SEED_CREATOR_CONTENT {
            let id = Uuid::new_v4().to_string();
            state
                .tables
                .get_mut("creator_content")
                .expect("seed table")
                .push(json!({
                    "content_id": id.clone(),
                    "creator_id": creator_ids[content.profile_url].clone(),
                    "post_url": content.post_url,
                    "post_raw": content.post_raw,
                    "created_at": content.created_at,
                    "updated_at": content.updated_at,
                }));
            content_ids.insert(content.post_url, id);
        }

        for user in &SEED_USERS {
            state
                .tables
                .get_mut("user_profiles")
                .expect("seed table")
                .push(json!({
                    "user_id": user.user_id,
                    "subscription_tier": user.tier.as_str(),
                    "created_at": SEED_BASELINE_TS,
                    "updated_at": SEED_BASELINE_TS,
                }));
        }

        for post in &SEED_POSTS {
            state.tables.get_mut("user_posts").expect("seed table").push(json!({
                "post_id": post.post_id,
                "user_id": post.user_id,
                "raw_text": post.raw_text,
                "created_at": post.created_at,
                "updated_at": post.updated_at,
            }));
        }

        for media in &SEED_MEDIA {
            state.tables.get_mut("user_media").expect("seed table").push(json!({
                "user_media_id": media.user_media_id,
                "post_id": media.post_id,
                "media_url": media.media_url,
                "media_type": media.media_type,
                "created_at": SEED_BASELINE_TS,
                "updated_at": SEED_BASELINE_TS,
            }));
        }

        for follow in &SEED_FOLLOWS {
            state.tables.get_mut("user_follows").expect("seed table").push(json!({
                "id": follow.id,
                "user_id": follow.user_id,
                "creator_id": creator_ids[follow.creator_profile_url].clone(),
                "created_at": follow.created_at,
            }));
        }

        for inspiration in &SEED_INSPIRATIONS {
            state
                .tables
                .get_mut("post_inspirations")
                .expect("seed table")
                .push(json!({
                    "id": Uuid::new_v4().to_string(),
                    "post_id": inspiration.post_id,
                    "content_id": content_ids[inspiration.content_post_url].clone(),
                    "created_at": inspiration.created_at,
                    "updated_at": inspiration.updated_at,
                }));
        }

        Self {
            user_id,
            state: Mutex::new(state),
        }
    }

    /// Drop every row in one table, bypassing cascades; used to break
    /// seed expectations on purpose
    pub fn truncate(&self, table: &str) {
        let mut state = self.state.lock().expect("store lock");
        if let Some(rows) = state.tables.get_mut(table) {
            rows.clear();
        }
    }
}

impl StoreAdapter for MemoryStore {
    fn name(&self) -> &str {
        "in-memory store"
    }

    async fn table_exists(&self, table: &str) -> Result<bool> {
        let state = self.state.lock().expect("store lock");
        Ok(state.tables.contains_key(table))
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value> {
        let mut state = self.state.lock().expect("store lock");
        insert_into(&mut state, table, row)
    }

    async fn update(&self, table: &str, filter: &Filter, patch: Value) -> Result<Value> {
        let patch = match patch {
            Value::Object(map) => map,
            other => {
                return Err(Error::Api {
                    status: 400,
                    body: format!("update payload must be an object, got {other}"),
                })
            }
        };

        let mut state = self.state.lock().expect("store lock");
        let matches: Vec<usize> = state
            .rows(table)?
            .iter()
            .enumerate()
            .filter(|(_, row)| filter.matches(row))
            .map(|(i, _)| i)
            .collect();

        // Validate every merged row before committing any, so a
        // constraint breach changes nothing
        let mut merged_rows = Vec::with_capacity(matches.len());
        for &i in &matches {
            let mut merged = state.rows(table)?[i].clone();
            if let Some(map) = merged.as_object_mut() {
                for (k, v) in &patch {
                    map.insert(k.clone(), v.clone());
                }
            }
            validate_checks(table, &merged)?;
            merged_rows.push(merged);
        }

        let mut representative = Value::Null;
        for (&i, mut merged) in matches.iter().zip(merged_rows) {
            if has_updated_at(table) {
                let now = state.tick();
                if let Some(map) = merged.as_object_mut() {
                    map.insert("updated_at".to_string(), json!(now));
                }
            }
            state.rows_mut(table)?[i] = merged.clone();
            representative = merged;
        }
        Ok(representative)
    }

    async fn delete(&self, table: &str, filter: &Filter) -> Result<u64> {
        let mut state = self.state.lock().expect("store lock");
        state.rows(table)?;
        let removed = remove_matching(&mut state, table, |row| filter.matches(row));
        cascade(&mut state, table, &removed);
        Ok(removed.len() as u64)
    }

    async fn count(&self, table: &str, filter: Option<&Filter>) -> Result<u64> {
        let state = self.state.lock().expect("store lock");
        let rows = state.rows(table)?;
        let count = match filter {
            Some(filter) => rows.iter().filter(|row| filter.matches(row)).count(),
            None => rows.len(),
        };
        Ok(count as u64)
    }

    async fn select_one(&self, table: &str, filter: &Filter) -> Result<Option<Value>> {
        let state = self.state.lock().expect("store lock");
        Ok(state
            .rows(table)?
            .iter()
            .find(|row| filter.matches(row))
            .cloned())
    }

    async fn select_all(&self, table: &str, filter: Option<&Filter>) -> Result<Vec<Value>> {
        let state = self.state.lock().expect("store lock");
        let rows = state.rows(table)?;
        Ok(match filter {
            Some(filter) => rows.iter().filter(|row| filter.matches(row)).cloned().collect(),
            None => rows.clone(),
        })
    }

    fn authenticated_user_id(&self) -> Option<Uuid> {
        Some(self.user_id)
    }

    async fn teardown(&self) -> Result<()> {
        Ok(())
    }
}
