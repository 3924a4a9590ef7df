//! Bounded store calls that fail closed.

use std::future::Future;
use std::time::Duration;

use bizops_auth::AuthError;

use crate::credential_store::StoreError;

/// Default upper bound for a single credential-store round trip.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(2);

/// Run one store call under `limit`.
///
/// Timeouts and unreachable backends become `AuthServiceUnavailable`, so an
/// unhealthy store can never grant access. Backend faults are logged here and
/// surface only as a generic internal error.
pub async fn bounded<T, F>(operation: &'static str, limit: Duration, call: F) -> Result<T, AuthError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(StoreError::Duplicate(what))) => {
            tracing::debug!(operation, %what, "duplicate identity");
            Err(AuthError::DuplicateIdentity)
        }
        Ok(Err(StoreError::Unavailable(detail))) => {
            tracing::error!(operation, %detail, "credential store unavailable");
            Err(AuthError::AuthServiceUnavailable)
        }
        Ok(Err(err)) => {
            tracing::error!(operation, error = %err, "credential store failure");
            Err(AuthError::internal(format!("{operation}: {err}")))
        }
        Err(_elapsed) => {
            tracing::error!(operation, timeout_ms = limit.as_millis() as u64, "credential store timed out");
            Err(AuthError::AuthServiceUnavailable)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn timeout_fails_closed() {
        let slow = async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok::<_, StoreError>(())
        };
        let result = bounded("slow", Duration::from_millis(10), slow).await;
        assert_eq!(result, Err(AuthError::AuthServiceUnavailable));
    }

    #[tokio::test]
    async fn store_errors_are_classified() {
        let unavailable = bounded("x", DEFAULT_STORE_TIMEOUT, async {
            Err::<(), _>(StoreError::Unavailable("down".into()))
        })
        .await;
        assert_eq!(unavailable, Err(AuthError::AuthServiceUnavailable));

        let duplicate = bounded("x", DEFAULT_STORE_TIMEOUT, async {
            Err::<(), _>(StoreError::Duplicate("alice".into()))
        })
        .await;
        assert_eq!(duplicate, Err(AuthError::DuplicateIdentity));

        let backend = bounded("x", DEFAULT_STORE_TIMEOUT, async {
            Err::<(), _>(StoreError::Backend("boom".into()))
        })
        .await;
        assert!(matches!(backend, Err(AuthError::Internal(_))));
    }
}
