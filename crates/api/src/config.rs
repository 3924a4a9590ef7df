//! Process configuration, read once from the environment at startup.

use std::time::Duration;

use bizops_auth::DEFAULT_TOKEN_TTL_HOURS;

const DEV_SECRET: &str = "dev-secret";

/// Longest accepted session lifetime: one year.
const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;

/// Seed superadmin credentials. Without one nobody can approve registrations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapAdmin {
    pub username: String,
    pub email: String,
    pub secret: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub jwt_secret: String,
    pub bind_addr: String,
    pub token_ttl: chrono::Duration,
    pub store_timeout: Duration,
    pub database_url: Option<String>,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unparseable numbers fall back to
    /// their defaults with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let jwt_secret = lookup("JWT_SECRET").filter(|s| !s.is_empty()).unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            DEV_SECRET.to_string()
        });

        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string());
        let ttl_hours = parse_or("TOKEN_TTL_HOURS", lookup("TOKEN_TTL_HOURS"), DEFAULT_TOKEN_TTL_HOURS);
        let timeout_ms = parse_or("STORE_TIMEOUT_MS", lookup("STORE_TIMEOUT_MS"), 2000u64);
        let database_url = lookup("DATABASE_URL").filter(|s| !s.trim().is_empty());

        let bootstrap_admin = match (
            lookup("BOOTSTRAP_SUPERADMIN_USERNAME"),
            lookup("BOOTSTRAP_SUPERADMIN_EMAIL"),
            lookup("BOOTSTRAP_SUPERADMIN_SECRET"),
        ) {
            (Some(username), Some(email), Some(secret)) => Some(BootstrapAdmin { username, email, secret }),
            (None, None, None) => None,
            _ => {
                tracing::warn!("incomplete BOOTSTRAP_SUPERADMIN_* settings; skipping bootstrap");
                None
            }
        };

        Self {
            jwt_secret,
            bind_addr,
            token_ttl: token_ttl(ttl_hours),
            store_timeout: Duration::from_millis(timeout_ms.max(1)),
            database_url,
            bootstrap_admin,
        }
    }

    /// In-memory configuration for tests and local tooling.
    pub fn for_tests(jwt_secret: &str) -> Self {
        Self {
            jwt_secret: jwt_secret.to_string(),
            bind_addr: "127.0.0.1:0".to_string(),
            token_ttl: chrono::Duration::hours(DEFAULT_TOKEN_TTL_HOURS),
            store_timeout: Duration::from_secs(2),
            database_url: None,
            bootstrap_admin: None,
        }
    }
}

/// Lifetimes outside `1..=MAX_TOKEN_TTL_HOURS` fall back to the default.
fn token_ttl(hours: i64) -> chrono::Duration {
    let default = chrono::Duration::hours(DEFAULT_TOKEN_TTL_HOURS);
    if !(1..=MAX_TOKEN_TTL_HOURS).contains(&hours) {
        tracing::warn!(hours, max = MAX_TOKEN_TTL_HOURS, "TOKEN_TTL_HOURS out of range; using default");
        return default;
    }
    chrono::Duration::try_hours(hours).unwrap_or(default)
}

fn parse_or<T: std::str::FromStr + Copy + std::fmt::Display>(key: &str, raw: Option<String>, default: T) -> T {
    match raw {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, fallback = %default, "unparseable setting; using default");
            default
        }),
    }
}
