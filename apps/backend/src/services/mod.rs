pub mod ai;
pub mod evaluation;
pub mod openai;
pub mod sessions;

use std::future::Future;
use std::time::Duration;

use ai::ServiceError;

/// Bound an external call by `limit`; expiry counts as a call failure.
pub async fn with_timeout<T, F>(limit: Duration, call: F) -> Result<T, ServiceError>
where
    F: Future<Output = Result<T, ServiceError>>,
{
    tokio::time::timeout(limit, call)
        .await
        .unwrap_or(Err(ServiceError::Timeout))
}
