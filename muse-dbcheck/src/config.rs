//! Harness settings
//!
//! Resolution priority follows the usual order: command-line argument
//! first, then environment variable. The environment names match the
//! project's `.env` conventions so existing deployments work unchanged.

use clap::Parser;

/// Schema-conformance checks for the Muse database
#[derive(Debug, Parser)]
#[command(name = "muse-dbcheck", version, about)]
pub struct Settings {
    /// Store endpoint URL
    #[arg(long = "url", env = "SUPABASE_URL")]
    pub store_url: String,

    /// Store API key
    #[arg(long = "api-key", env = "SUPABASE_ANON_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Principal email; required for the mutating checks
    #[arg(long, env = "TEST_USER_EMAIL")]
    pub email: Option<String>,

    /// Principal password; required for the mutating checks
    #[arg(long, env = "TEST_USER_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}
