//! Supabase REST API adapter
//!
//! Concrete `StoreAdapter` speaking PostgREST over HTTP: sign-in via
//! the auth endpoint, one cached table-discovery pass against the
//! OpenAPI document, then plain CRUD against `/rest/v1/{table}` with
//! eq-filters in the query string.
//!
//! The adapter holds the single authenticated session for the process
//! lifetime. Constraint rejections come back as JSON bodies carrying a
//! SQLSTATE code and are classified in `muse_common::error`.

use std::collections::HashSet;
use std::time::Duration;

use muse_common::error::{classify_store_fault, Error, Result};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use super::{Filter, StoreAdapter};

const USER_AGENT: &str = concat!("muse-dbcheck/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Bounded timeout for the one-time schema discovery call only
const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Successful password-grant response from the auth endpoint
#[derive(Debug, Deserialize)]
struct SignInResponse {
    access_token: String,
    user: SignInUser,
}

#[derive(Debug, Deserialize)]
struct SignInUser {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
}

/// Supabase REST API client
pub struct SupabaseAdapter {
    base_url: String,
    api_key: String,
    access_token: String,
    user_id: Uuid,
    known_tables: HashSet<String>,
    http_client: reqwest::Client,
}

impl SupabaseAdapter {
    /// Connect and authenticate.
    ///
    /// Authentication is mandatory: a missing credential pair or a
    /// failed sign-in is a fatal setup error, not a skipped test.
    pub async fn connect(
        url: &str,
        api_key: &str,
        email: Option<&str>,
        password: Option<&str>,
    ) -> Result<Self> {
        let (email, password) = match (email, password) {
            (Some(e), Some(p)) => (e, p),
            _ => {
                return Err(Error::Auth(
                    "principal credentials required (set TEST_USER_EMAIL and TEST_USER_PASSWORD)"
                        .to_string(),
                ))
            }
        };

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let base_url = url.trim_end_matches('/').to_string();

        let response = http_client
            .post(format!("{base_url}/auth/v1/token?grant_type=password"))
            .header("apikey", api_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Auth(format!(
                "sign-in rejected (HTTP {}): {body}",
                status.as_u16()
            )));
        }

        let signin: SignInResponse = response.json().await?;
        tracing::info!(
            user_id = %signin.user.id,
            email = signin.user.email.as_deref().unwrap_or("unknown"),
            "Authenticated against Supabase"
        );

        let mut adapter = Self {
            base_url,
            api_key: api_key.to_string(),
            access_token: signin.access_token,
            user_id: signin.user.id,
            known_tables: HashSet::new(),
            http_client,
        };
        adapter.known_tables = adapter.load_table_names().await;
        Ok(adapter)
    }

    /// One-time schema discovery: harvest table names from the
    /// PostgREST OpenAPI document. Failure degrades to per-table
    /// probing in `table_exists`.
    async fn load_table_names(&self) -> HashSet<String> {
        let mut names = HashSet::new();
        let request = self
            .http_client
            .get(format!("{}/rest/v1/", self.base_url))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .timeout(DISCOVERY_TIMEOUT);

        let payload: Value = match request.send().await {
            Ok(response) => match response.json().await {
                Ok(payload) => payload,
                Err(e) => {
                    tracing::debug!("Schema discovery returned unparseable body: {e}");
                    return names;
                }
            },
            Err(e) => {
                tracing::debug!("Schema discovery call failed: {e}");
                return names;
            }
        };

        if let Some(definitions) = payload.get("definitions").and_then(|d| d.as_object()) {
            for name in definitions.keys() {
                names.insert(name.clone());
                // Qualified names also register their bare table name
                if let Some((_, bare)) = name.rsplit_once('.') {
                    names.insert(bare.to_string());
                }
            }
        }
        tracing::debug!(tables = names.len(), "Schema discovery complete");
        names
    }

    fn table_endpoint(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    /// Session + key headers applied to every data request
    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.access_token)
    }

    /// Read the body rows of a successful data response, classifying
    /// failures by SQLSTATE
    async fn read_rows(response: reqwest::Response) -> Result<Vec<Value>> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_store_fault(status.as_u16(), &body));
        }
        Ok(response.json().await?)
    }
}

/// Render a filter clause value the way PostgREST expects it in a
/// query string (strings bare, everything else via JSON display form)
fn filter_operand(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn filter_query(filter: &Filter) -> Vec<(String, String)> {
    filter
        .clauses()
        .iter()
        .map(|(column, value)| (column.clone(), format!("eq.{}", filter_operand(value))))
        .collect()
}

/// Total row count from a `Content-Range` header value, e.g. `0-0/25`
/// or `*/0`
fn content_range_total(header: &str) -> Option<u64> {
    header.rsplit_once('/')?.1.parse().ok()
}

impl StoreAdapter for SupabaseAdapter {
    fn name(&self) -> &str {
        "Supabase REST API"
    }

    async fn table_exists(&self, table: &str) -> Result<bool> {
        if self.known_tables.contains(table) {
            return Ok(true);
        }
        // Direct probe; any PostgREST rejection means "not visible"
        let response = self
            .authorized(self.http_client.get(self.table_endpoint(table)))
            .query(&[("select", "*"), ("limit", "1")])
            .send()
            .await?;
        Ok(response.status().is_success())
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value> {
        let response = self
            .authorized(self.http_client.post(self.table_endpoint(table)))
            .header("Prefer", "return=representation")
            .json(&serde_json::json!([row]))
            .send()
            .await?;
        let rows = Self::read_rows(response).await?;
        Ok(rows.into_iter().next().unwrap_or_default())
    }

    async fn update(&self, table: &str, filter: &Filter, patch: Value) -> Result<Value> {
        let response = self
            .authorized(self.http_client.patch(self.table_endpoint(table)))
            .header("Prefer", "return=representation")
            .query(&filter_query(filter))
            .json(&patch)
            .send()
            .await?;
        let rows = Self::read_rows(response).await?;
        Ok(rows.into_iter().next().unwrap_or_default())
    }

    async fn delete(&self, table: &str, filter: &Filter) -> Result<u64> {
        let response = self
            .authorized(self.http_client.delete(self.table_endpoint(table)))
            .header("Prefer", "return=representation")
            .query(&filter_query(filter))
            .send()
            .await?;
        let rows = Self::read_rows(response).await?;
        Ok(rows.len() as u64)
    }

    async fn count(&self, table: &str, filter: Option<&Filter>) -> Result<u64> {
        let mut request = self
            .authorized(self.http_client.get(self.table_endpoint(table)))
            .header("Prefer", "count=exact")
            .header("Range", "0-0")
            .query(&[("select", "*")]);
        if let Some(filter) = filter {
            request = request.query(&filter_query(filter));
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_store_fault(status.as_u16(), &body));
        }
        let total = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(content_range_total);
        total.ok_or_else(|| Error::Api {
            status: status.as_u16(),
            body: "count response missing Content-Range total".to_string(),
        })
    }

    async fn select_one(&self, table: &str, filter: &Filter) -> Result<Option<Value>> {
        let response = self
            .authorized(self.http_client.get(self.table_endpoint(table)))
            .query(&[("select", "*"), ("limit", "1")])
            .query(&filter_query(filter))
            .send()
            .await?;
        let rows = Self::read_rows(response).await?;
        Ok(rows.into_iter().next())
    }

    async fn select_all(&self, table: &str, filter: Option<&Filter>) -> Result<Vec<Value>> {
        let mut request = self
            .authorized(self.http_client.get(self.table_endpoint(table)))
            .query(&[("select", "*")]);
        if let Some(filter) = filter {
            request = request.query(&filter_query(filter));
        }
        let response = request.send().await?;
        Self::read_rows(response).await
    }

    fn authenticated_user_id(&self) -> Option<Uuid> {
        Some(self.user_id)
    }

    async fn teardown(&self) -> Result<()> {
        // Best-effort logout; a dead session at exit is not a failure
        let result = self
            .authorized(
                self.http_client
                    .post(format!("{}/auth/v1/logout", self.base_url)),
            )
            .send()
            .await;
        if let Err(e) = result {
            tracing::debug!("Logout during teardown failed: {e}");
        }
        Ok(())
    }
}
