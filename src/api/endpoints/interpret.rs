//! `POST /api/interpret/file` and `POST /api/interpret/message`.

use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, MessageRequest, MessageResponse};
use crate::models::ExtractionResult;
use crate::pipeline::conversation::interpret_message;

/// Fallback when neither the part nor the file name says what it is.
const GENERIC_MEDIA_TYPE: &str = "application/octet-stream";

struct Upload {
    bytes: Vec<u8>,
    media_type: String,
    file_name: Option<String>,
}

/// Extract PII from the uploaded `file` field.
pub async fn file(
    State(ctx): State<ApiContext>,
    mut multipart: Multipart,
) -> Result<Json<ExtractionResult>, ApiError> {
    let upload = read_file_field(&mut multipart, ctx.max_upload_bytes)
        .await?
        .ok_or_else(|| ApiError::BadRequest("No valid file uploaded".into()))?;

    tracing::info!(
        media_type = %upload.media_type,
        size = upload.bytes.len(),
        "File received for PII extraction"
    );

    let result = ctx
        .extractor
        .extract_named(upload.bytes, &upload.media_type, upload.file_name.as_deref())
        .await?;
    Ok(Json(result))
}

/// Continue the compliance chat.
pub async fn message(
    State(ctx): State<ApiContext>,
    Json(request): Json<MessageRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let content = request
        .content
        .ok_or_else(|| ApiError::BadRequest("No valid content uploaded".into()))?;

    let text = interpret_message(ctx.conversation.as_ref(), &request.history, &content).await?;
    Ok(Json(MessageResponse { text }))
}

async fn read_file_field(
    multipart: &mut Multipart,
    limit: usize,
) -> Result<Option<Upload>, ApiError> {
    let multipart_error = |e: MultipartError| match e.status() {
        StatusCode::PAYLOAD_TOO_LARGE => ApiError::PayloadTooLarge(limit),
        status if status.is_server_error() => ApiError::Internal(e.body_text()),
        _ => ApiError::BadRequest(format!("Malformed multipart body: {}", e.body_text())),
    };

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }

        let declared = field
            .content_type()
            .filter(|ct| !ct.is_empty() && *ct != GENERIC_MEDIA_TYPE)
            .map(str::to_string);
        let file_name = field.file_name().map(str::to_string);
        let guessed = file_name
            .as_deref()
            .and_then(|name| mime_guess::from_path(name).first_raw())
            .map(str::to_string);
        let media_type = declared
            .or(guessed)
            .unwrap_or_else(|| GENERIC_MEDIA_TYPE.to_string());

        let bytes = field.bytes().await.map_err(multipart_error)?;
        if bytes.is_empty() {
            return Ok(None);
        }
        if bytes.len() > limit {
            return Err(ApiError::PayloadTooLarge(limit));
        }

        return Ok(Some(Upload {
            bytes: bytes.to_vec(),
            media_type,
            file_name,
        }));
    }
    Ok(None)
}
