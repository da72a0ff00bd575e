//! HTTP status classification shared by the collaborator clients.
//!
//! The error type itself lives in `critica-core` so the engine can downcast
//! it; this module maps `reqwest` failures and responses onto it.

pub use critica_core::error::ProviderError;

/// Default wait when a 429 carries no usable `retry-after` header.
const DEFAULT_RETRY_AFTER_SECS: u64 = 5;

/// Map a transport failure onto a [`ProviderError`].
pub(crate) fn from_send_error(e: reqwest::Error, timeout_secs: u64) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout(timeout_secs)
    } else {
        ProviderError::NetworkError(e.to_string())
    }
}

/// Turn non-success statuses into errors; successful responses pass through.
pub(crate) async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status().as_u16();
    if status == 429 {
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
            * 1000;
        return Err(ProviderError::RateLimited {
            retry_after_ms: retry_after,
        });
    }
    if status == 401 || status == 403 {
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::AuthenticationFailed(body));
    }
    if status >= 400 {
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::ApiError {
            status,
            message: body,
        });
    }
    Ok(response)
}
