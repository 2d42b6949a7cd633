//! muse-dbcheck - schema-conformance checks for the Muse database
//!
//! Exit contract: 0 when every check passes, 1 when any check fails or
//! when adapter construction fails. Adapter construction requires a
//! resolvable authenticated principal; its absence is a fatal setup
//! error, not a skipped test.

use clap::Parser;
use muse_dbcheck::adapter::StoreAdapter;
use muse_dbcheck::{run_all, Settings, SupabaseAdapter};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!(
        "Starting Muse schema checks (muse-dbcheck) v{}",
        env!("CARGO_PKG_VERSION")
    );

    let settings = Settings::parse();

    let adapter = match SupabaseAdapter::connect(
        &settings.store_url,
        &settings.api_key,
        settings.email.as_deref(),
        settings.password.as_deref(),
    )
    .await
    {
        Ok(adapter) => adapter,
        Err(e) => {
            error!("Failed to construct store adapter: {e}");
            std::process::exit(1);
        }
    };

    info!("Using backend: {}", adapter.name());

    let report = run_all(&adapter).await;

    // Teardown always runs, pass or fail
    if let Err(e) = adapter.teardown().await {
        error!("Adapter teardown failed: {e}");
        std::process::exit(1);
    }

    if report.all_passed() {
        info!("ALL CHECKS PASSED ({} total)", report.outcomes.len());
        std::process::exit(0);
    }

    error!(
        "{} CHECK(S) FAILED out of {}",
        report.failures(),
        report.outcomes.len()
    );
    std::process::exit(1);
}
