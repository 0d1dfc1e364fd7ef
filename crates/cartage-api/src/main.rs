//! Service binary: config from the environment, tracing init, optional
//! Postgres hydration, then serve.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use cartage_api::auth::{parse_seed_entries, seed_token_directory};
use cartage_api::config::Config;
use cartage_api::state::AppState;
use cartage_api::{app, db};
use cartage_engine::TokenDirectory;
use cartage_store::UserRecord;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();

    let identity = match &config.auth_seed {
        Some(seed) => seed_token_directory(seed),
        None => {
            tracing::warn!("CARTAGE_AUTH_SEED not set — no tokens will resolve");
            TokenDirectory::new()
        }
    };
    let state = AppState::in_memory(Arc::new(identity));

    // Seeded actors get matching directory records so engine-side account
    // checks pass in development deployments.
    if let Some(seed) = &config.auth_seed {
        for (token, actor) in parse_seed_entries(seed) {
            let mut record = UserRecord::new(format!("seed:{token}"), actor.role);
            record.id = actor.id;
            state.users.insert(record);
        }
    }

    let pool = db::init_pool(config.database_url.as_deref())
        .await
        .context("database initialization failed")?;

    // Hydrate the in-memory stores from the durable copy.
    if let Some(pool) = &pool {
        let missions = db::missions::load_all_missions(pool)
            .await
            .context("failed to load missions")?;
        let count = missions.len();
        for mission in missions {
            state.missions.insert(mission);
        }
        let acceptances = db::acceptances::load_all_acceptances(pool)
            .await
            .context("failed to load acceptances")?;
        tracing::info!(
            missions = count,
            acceptances = acceptances.len(),
            "hydrated state from database"
        );
        for acceptance in acceptances {
            state.acceptances.restore(acceptance);
        }
    }
    let state = state.with_pool(pool);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!(addr = %config.bind_addr, "cartage-api listening");

    axum::serve(listener, app(state))
        .await
        .context("server error")?;
    Ok(())
}
