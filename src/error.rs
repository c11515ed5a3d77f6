use reqwest::StatusCode;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, CoverageError>;

#[derive(Debug, thiserror::Error)]
pub enum CoverageError {
    /// A required credential is absent from flags, environment and secrets file.
    #[error("Missing configuration: {key} ({hint})")]
    ConfigMissing { key: &'static str, hint: String },

    #[error("failed to read configuration file {}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: ini::Error,
    },

    #[error("malformed catalog: {0}")]
    MalformedCatalog(String),

    #[error("invalid batch size {0}: must be at least 1")]
    InvalidBatchSize(i64),

    #[error("invalid batch number {index}: plan has {count} batch(es)")]
    InvalidBatchNumber { index: usize, count: usize },

    /// The batch was planned over a longer layer list than the one probed.
    #[error("batch {index} covers layers {start}-{end} but only {total} are available")]
    BatchOutOfRange {
        index: usize,
        start: usize,
        end: usize,
        total: usize,
    },

    #[error("unknown coverage label `{0}`")]
    UnknownCoverageLabel(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("authentication failed: {0}")]
    AuthenticationFailure(String),

    #[error("catalog service failed: {0}")]
    CatalogServiceFailure(String),

    #[error("query service failed: {0}")]
    QueryServiceFailure(String),

    #[error("failed to export {}", path.display())]
    Export {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Error payload returned by the EI gateway and geospatial endpoints.
#[derive(Debug, serde::Deserialize)]
pub(crate) struct ApiErrorResponse {
    // The gateway sends "httpCode" as a string, the query service as a number.
    #[serde(default, alias = "httpCode")]
    pub(crate) status: Option<serde_json::Value>,
    #[serde(default, alias = "httpMessage")]
    pub(crate) title: Option<String>,
    #[serde(default, alias = "moreInformation")]
    pub(crate) detail: Option<String>,
    // Query endpoints respond with {"message":...,"error":...}
    #[serde(default)]
    pub(crate) message: Option<String>,
    #[serde(default)]
    pub(crate) error: Option<String>,
}

pub(crate) fn format_api_error(status: StatusCode, url: &str, e: &ApiErrorResponse) -> String {
    let title = e
        .title
        .as_deref()
        .or(e.message.as_deref())
        .unwrap_or("");
    let detail = e.detail.as_deref().or(e.error.as_deref()).unwrap_or("");
    let status_in_body = e
        .status
        .as_ref()
        .and_then(|v| match v {
            serde_json::Value::Number(n) => n.as_u64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
        .unwrap_or(u64::from(status.as_u16()));

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return format!(
            "EI authentication/authorization failed (HTTP {}).\n- Check api.org_id, api.tenant_id and api.api_key in the [EI] section of auth/secrets.ini\n- Ensure the API key has not been revoked and the tenant has geospatial access\n\nServer message: {}\n{}\nrequest: {}",
            status_in_body, title, detail, url
        );
    }

    if status == StatusCode::NOT_FOUND {
        return format!(
            "EI API endpoint not found (HTTP 404).\n- The configured api.url may be wrong\n- Default: https://api.ibm.com/geospatial/run/na/core/v3\n\nServer message: {}\n{}\nrequest: {}",
            title, detail, url
        );
    }

    format!(
        "API request failed: HTTP {} for url ({})\n{}\n{}",
        status_in_body, url, title, detail
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_points_at_secrets_file() {
        let body: ApiErrorResponse =
            serde_json::from_str(r#"{"httpCode":"401","httpMessage":"Unauthorized"}"#).unwrap();
        let msg = format_api_error(StatusCode::UNAUTHORIZED, "https://x/query", &body);
        assert!(msg.contains("HTTP 401"));
        assert!(msg.contains("auth/secrets.ini"));
        assert!(msg.contains("Unauthorized"));
    }

    #[test]
    fn generic_failure_keeps_status_and_url() {
        let body: ApiErrorResponse =
            serde_json::from_str(r#"{"message":"bad layer","error":"layer 1 unknown"}"#).unwrap();
        let msg = format_api_error(StatusCode::BAD_REQUEST, "https://x/query", &body);
        assert!(msg.contains("HTTP 400"));
        assert!(msg.contains("https://x/query"));
        assert!(msg.contains("layer 1 unknown"));
    }

    #[test]
    fn batch_size_message() {
        assert_eq!(
            CoverageError::InvalidBatchSize(0).to_string(),
            "invalid batch size 0: must be at least 1"
        );
    }
}
