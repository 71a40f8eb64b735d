use axum::extract::State;
use axum::response::IntoResponse;
use bytes::Bytes;
use futures::StreamExt;
use http::StatusCode;

use common::ports::{ContentStream, StoreError};
use common::prelude::NewFile;

use super::FileResponse;
use crate::daemon::http_server::api::decode_b64;
use crate::daemon::http_server::auth::{Caller, RequestScope};
use crate::daemon::http_server::extract::{Json, Multipart};
use crate::daemon::http_server::ApiError;
use crate::ServiceState;

const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// Multipart upload of an already encrypted file.
///
/// Fields: `file` (ciphertext), `iv` and `encrypted_key` (base64 text), and
/// optionally `mime_type` and `filename` describing the plaintext. Without
/// them the part's filename and a guess from its extension are used.
#[tracing::instrument(skip_all, fields(caller_id = %caller.id))]
pub async fn handler(
    State(state): State<ServiceState>,
    scope: RequestScope,
    caller: Caller,
    Multipart(mut multipart): Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut content: Option<Bytes> = None;
    let mut part_filename: Option<String> = None;
    let mut part_mime_type: Option<String> = None;
    let mut iv: Option<Vec<u8>> = None;
    let mut encrypted_key: Option<Vec<u8>> = None;
    let mut filename: Option<String> = None;
    let mut mime_type: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => {
                part_filename = field.file_name().map(str::to_string);
                part_mime_type = field.content_type().map(str::to_string);
                content = Some(field.bytes().await?);
            }
            "iv" => iv = Some(decode_b64("iv", &field.text().await?)?),
            "encrypted_key" => {
                encrypted_key = Some(decode_b64("encrypted_key", &field.text().await?)?)
            }
            "filename" => filename = Some(field.text().await?),
            "mime_type" => mime_type = Some(field.text().await?),
            _ => {}
        }
    }

    let content = content.ok_or_else(|| ApiError::bad_request("file is required"))?;
    let iv = iv
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::bad_request("iv is required"))?;
    let encrypted_key = encrypted_key
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::bad_request("encrypted_key is required"))?;

    let filename = filename
        .filter(|f| !f.trim().is_empty())
        .or(part_filename)
        .unwrap_or_default();
    let mime_type = resolve_mime_type(mime_type, &filename, part_mime_type);

    let new = NewFile::new(filename, mime_type, content.len() as u64)
        .with_key_material(iv, encrypted_key);
    let stream: ContentStream =
        futures::stream::once(async move { Ok::<_, StoreError>(content) }).boxed();

    let file = state
        .files()
        .upload(scope.token(), caller.id, new, stream)
        .await?;

    Ok((StatusCode::CREATED, Json(FileResponse::from(&file))))
}

fn resolve_mime_type(explicit: Option<String>, filename: &str, part: Option<String>) -> String {
    explicit
        .filter(|m| !m.trim().is_empty())
        .or_else(|| mime_guess::from_path(filename).first().map(|m| m.to_string()))
        .or(part)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_MIME_TYPE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_mime_type() {
        assert_eq!(
            resolve_mime_type(Some("text/plain".into()), "a.pdf", None),
            "text/plain"
        );
        assert_eq!(resolve_mime_type(None, "a.pdf", None), "application/pdf");
        assert_eq!(
            resolve_mime_type(Some(" ".into()), "blob", Some("image/png".into())),
            "image/png"
        );
        assert_eq!(resolve_mime_type(None, "blob", None), FALLBACK_MIME_TYPE);
    }
}
