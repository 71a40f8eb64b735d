use axum::body::Body;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use uuid::Uuid;

use crate::daemon::http_server::api::{encode_b64, IV_HEADER, WRAPPED_KEY_HEADER};
use crate::daemon::http_server::auth::{Caller, RequestScope};
use crate::daemon::http_server::extract::Path;
use crate::daemon::http_server::ApiError;
use crate::ServiceState;

/// Streams the ciphertext to the owner or an active recipient.
///
/// Recipients also get their wrapped content key in `X-Wrapped-Key`; the
/// owner already has the key from the file's metadata.
#[tracing::instrument(skip_all, fields(caller_id = %caller.id))]
pub async fn handler(
    State(state): State<ServiceState>,
    scope: RequestScope,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let download = state.files().download(scope.token(), id, caller.id).await?;
    let file = &download.file;

    let mut headers = HeaderMap::new();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_str(&file.mime_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(CONTENT_LENGTH, HeaderValue::from(file.size));
    headers.insert(CONTENT_DISPOSITION, content_disposition(&file.filename));
    headers.insert(HeaderName::from_static(IV_HEADER), b64_header(&file.iv));
    if let Some(wrapped_key) = &download.key_material {
        headers.insert(
            HeaderName::from_static(WRAPPED_KEY_HEADER),
            b64_header(wrapped_key),
        );
    }

    tracing::debug!(file_id = %file.id, size = file.size, "streaming download");
    Ok((StatusCode::OK, headers, Body::from_stream(download.content)).into_response())
}

fn b64_header(bytes: &[u8]) -> HeaderValue {
    // base64 output is always a valid header value
    HeaderValue::from_str(&encode_b64(bytes)).unwrap_or_else(|_| HeaderValue::from_static(""))
}

fn content_disposition(filename: &str) -> HeaderValue {
    let safe: String = filename
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();

    HeaderValue::from_str(&format!("attachment; filename=\"{}\"", safe))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_escapes() {
        assert_eq!(
            content_disposition("report 2024.pdf"),
            "attachment; filename=\"report 2024.pdf\""
        );
        assert_eq!(
            content_disposition("a\"b\\c\r\n.txt"),
            "attachment; filename=\"a_b_c__.txt\""
        );
        assert_eq!(content_disposition("résumé"), "attachment; filename=\"r_sum_\"");
    }
}
