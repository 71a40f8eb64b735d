use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use common::prelude::{AccessError, ErrorKind};

use crate::daemon::session::SessionError;

/// Error returned by every API handler.
///
/// The body is always `{"error": <message>, "kind": <kind>}`. Transient
/// failures carry a generic message; their detail only goes to the log.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    PayloadTooLarge(String),
    #[error("{0}")]
    Unauthenticated(String),
    #[error("session error: {0}")]
    Session(#[from] SessionError),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    /// An extractor rejection, keeping "body too large" apart from bad input.
    fn rejected(status: StatusCode, message: String) -> Self {
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge(message)
        } else {
            Self::BadRequest(message)
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Access(e) => e.kind().as_str(),
            ApiError::BadRequest(_) => ErrorKind::InvalidInput.as_str(),
            ApiError::PayloadTooLarge(_) => "payload_too_large",
            ApiError::Unauthenticated(_) => ErrorKind::Unauthenticated.as_str(),
            ApiError::Session(_) => ErrorKind::Internal.as_str(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Access(e) => match e.kind() {
                ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
                ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
                ErrorKind::Unauthorized => StatusCode::FORBIDDEN,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Conflict => StatusCode::CONFLICT,
                ErrorKind::StorageUnavailable
                | ErrorKind::PersistenceUnavailable
                | ErrorKind::Orphaned
                | ErrorKind::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
                ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> String {
        match self {
            ApiError::Access(e) => match e.kind() {
                ErrorKind::StorageUnavailable => "content storage unavailable".to_string(),
                ErrorKind::PersistenceUnavailable => "metadata storage unavailable".to_string(),
                ErrorKind::Orphaned => "upload could not be recorded, retry".to_string(),
                ErrorKind::Cancelled => "request cancelled".to_string(),
                ErrorKind::Internal => "internal server error".to_string(),
                // Don't reveal who owns what
                ErrorKind::Unauthorized => "not authorized".to_string(),
                _ => e.to_string(),
            },
            ApiError::Session(_) => "internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::rejected(err.status(), format!("invalid multipart body: {}", err.body_text()))
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::rejected(rejection.status(), rejection.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::rejected(rejection.status(), rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::rejected(rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::rejected(rejection.status(), rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, kind = self.kind(), "request failed");
        } else {
            tracing::debug!(error = %self, kind = self.kind(), "request rejected");
        }

        let body = serde_json::json!({
            "error": self.public_message(),
            "kind": self.kind(),
        });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AccessError::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (AccessError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (
                AccessError::Unauthorized {
                    op: "download",
                    caller: Uuid::new_v4(),
                    entity: "file",
                    id: Uuid::new_v4(),
                },
                StatusCode::FORBIDDEN,
            ),
            (
                AccessError::NotFound {
                    entity: "file",
                    id: "x".into(),
                },
                StatusCode::NOT_FOUND,
            ),
            (AccessError::Conflict("x".into()), StatusCode::CONFLICT),
            (
                AccessError::Cancelled { op: "upload" },
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn test_rejections_keep_payload_too_large() {
        let err = ApiError::rejected(StatusCode::PAYLOAD_TOO_LARGE, "length limit exceeded".into());
        assert_eq!(err.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(err.kind(), "payload_too_large");

        let err = ApiError::rejected(StatusCode::UNPROCESSABLE_ENTITY, "missing field".into());
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.kind(), "invalid_input");
    }

    #[tokio::test]
    async fn test_unauthorized_body_hides_ids() {
        let caller = Uuid::new_v4();
        let err = ApiError::from(AccessError::Unauthorized {
            op: "download",
            caller,
            entity: "file",
            id: Uuid::new_v4(),
        });

        let response = err.into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["kind"], "unauthorized");
        assert!(!json["error"].as_str().unwrap().contains(&caller.to_string()));
    }
}
