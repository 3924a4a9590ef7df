//! Infrastructure wiring: pick a credential store, build the issuer, gate,
//! admin service and ticket board around it.

use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use sqlx::postgres::PgPoolOptions;

use bizops_auth::TokenCodec;
use bizops_infra::{
    AccessAdmin, AccessGate, CredentialStore, InMemoryCredentialStore, InMemoryTicketBoard,
    PostgresCredentialStore, TicketBoard, TokenIssuer,
};

use crate::config::AppConfig;

/// Everything handlers need, shared across requests.
#[derive(Clone)]
pub struct AppServices {
    pub issuer: TokenIssuer,
    pub gate: AccessGate,
    pub admin: AccessAdmin,
    pub tickets: Arc<dyn TicketBoard>,
}

impl AppServices {
    pub fn new(store: Arc<dyn CredentialStore>, config: &AppConfig) -> Self {
        let codec = TokenCodec::hs256(config.jwt_secret.as_bytes(), config.token_ttl);

        Self {
            issuer: TokenIssuer::new(store.clone(), codec.clone()).with_store_timeout(config.store_timeout),
            gate: AccessGate::new(store.clone(), codec).with_store_timeout(config.store_timeout),
            admin: AccessAdmin::new(store).with_store_timeout(config.store_timeout),
            tickets: Arc::new(InMemoryTicketBoard::new()),
        }
    }
}

/// Build services from configuration.
///
/// `DATABASE_URL` selects the Postgres store (schema applied on connect);
/// otherwise credentials live in memory for the lifetime of the process.
pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let store: Arc<dyn CredentialStore> = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .acquire_timeout(config.store_timeout)
                .connect(url)
                .await
                .context("failed to connect to postgres")?;
            let store = PostgresCredentialStore::new(pool);
            store.ensure_schema().await.context("failed to apply credential schema")?;
            tracing::info!("using postgres credential store");
            Arc::new(store)
        }
        None => {
            tracing::info!("DATABASE_URL not set; using in-memory credential store");
            Arc::new(InMemoryCredentialStore::new())
        }
    };

    let services = AppServices::new(store, config);

    if let Some(seed) = &config.bootstrap_admin {
        services
            .admin
            .bootstrap_superadmin(&seed.username, &seed.email, &seed.secret, Utc::now())
            .await
            .context("failed to bootstrap superadmin")?;
    }

    Ok(services)
}
