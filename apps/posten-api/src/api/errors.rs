use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use crate::domain::delivery::UpstreamFailure;
use crate::domain::postal_code::PostalCode;

/// API error type with HTTP status code and JSON body
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiError {
    /// Creates a new API error with an `{"error": message}` body
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "error": message.into() }),
        }
    }

    /// Creates a 404 Not Found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// Creates an error describing a failed upstream lookup
    ///
    /// The status follows the failure, falling back to 502 when it is not a
    /// valid HTTP status.
    pub fn upstream(code: &PostalCode, failure: UpstreamFailure) -> Self {
        let status =
            StatusCode::from_u16(failure.response_status).unwrap_or(StatusCode::BAD_GATEWAY);

        Self {
            status,
            body: json!({
                "ok": false,
                "postcode": code.as_str(),
                "upstream": failure,
            }),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::delivery::FailureOrigin;

    #[test]
    fn upstream_error_body() {
        let code = PostalCode::from_segment("4321").unwrap();
        let failure = UpstreamFailure::scrape("delivery script not found")
            .with_origin(FailureOrigin::TokenScrape);

        let err = ApiError::upstream(&code, failure);

        assert_eq!(err.status, StatusCode::BAD_GATEWAY);
        assert_eq!(err.body["ok"], json!(false));
        assert_eq!(err.body["postcode"], json!("4321"));
        assert_eq!(err.body["upstream"]["source"], json!("token_scrape"));
        assert_eq!(err.body["upstream"]["where"], json!("scrape_token"));
        assert_eq!(err.body["upstream"]["error"], json!("delivery script not found"));
    }

    #[test]
    fn upstream_status_passes_through() {
        let code = PostalCode::from_segment("4321").unwrap();
        let err = ApiError::upstream(&code, UpstreamFailure::non_ok(429, String::new()));
        assert_eq!(err.status, StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn not_found_body() {
        let err = ApiError::not_found("Invalid postal code: abc");
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.body, json!({ "error": "Invalid postal code: abc" }));
    }
}
