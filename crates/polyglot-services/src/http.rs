//! Request helpers shared by the builtin backends

use polyglot_core::{ServiceError, ServiceResult};
use reqwest::Response;

/// Accept `host`, `host/`, or a full URL and return `scheme://host` without
/// a trailing slash.
pub(crate) fn normalize_base(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

pub(crate) fn request_error(err: reqwest::Error) -> ServiceError {
    ServiceError::Http(err.to_string())
}

/// Turn a non-success status into an error carrying the response body.
pub(crate) async fn check_status(response: Response) -> ServiceResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ServiceError::Http(format!(
        "{}: {}",
        status,
        body.chars().take(200).collect::<String>()
    )))
}
