//! Image intake and pass-through upload to the object store.
//!
//! The form reader buffers the single `file` part in memory, rejecting it as
//! soon as it is known to be a non-image or larger than the limit, so nothing
//! reaches the store unless the whole request is acceptable.

use axum::{
    extract::{Multipart, multipart::MultipartError},
    http::StatusCode,
};
use bytes::{Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::constants::MAX_IMAGE_UPLOAD_SIZE;
use crate::services::error::{ApiError, LogErr};
use crate::storage::ObjectStore;

/// A validated upload, owned by a single request.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    data: Bytes,
    content_type: String,
    object_name: String,
}

impl UploadRequest {
    pub fn new(data: Bytes, content_type: &str, object_name: &str) -> Result<Self, ApiError> {
        if !is_image(content_type) {
            return Err(ApiError::not_an_image());
        }
        if data.len() > MAX_IMAGE_UPLOAD_SIZE {
            return Err(ApiError::FileTooLarge);
        }
        if object_name.is_empty() {
            return Err(ApiError::MissingField);
        }
        Ok(Self {
            data,
            content_type: content_type.to_string(),
            object_name: object_name.to_string(),
        })
    }

    pub fn object_name(&self) -> &str {
        &self.object_name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub public_url: String,
}

pub fn is_image(content_type: &str) -> bool {
    content_type.starts_with("image/")
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::FileTooLarge
    } else {
        ApiError::Validation(err.body_text())
    }
}

struct FilePart {
    data: Bytes,
    content_type: String,
}

/// Read the `file` and `filename` fields out of a multipart body.
///
/// Other text fields are ignored. Any file part not named `file`, or a
/// second `file` part, is rejected.
pub async fn read_upload_form(mut multipart: Multipart) -> Result<UploadRequest, ApiError> {
    let mut file: Option<FilePart> = None;
    let mut filename: Option<String> = None;

    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        let is_file_part = name == "file" || field.file_name().is_some();

        if is_file_part {
            if name != "file" || file.is_some() {
                return Err(ApiError::Validation("Unexpected field".to_string()));
            }

            let content_type = field
                .content_type()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "application/octet-stream".to_string());
            if !is_image(&content_type) {
                return Err(ApiError::not_an_image());
            }

            let mut buf = BytesMut::new();
            while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
                if buf.len() + chunk.len() > MAX_IMAGE_UPLOAD_SIZE {
                    return Err(ApiError::FileTooLarge);
                }
                buf.extend_from_slice(&chunk);
            }

            file = Some(FilePart {
                data: buf.freeze(),
                content_type,
            });
        } else if name == "filename" {
            filename = Some(field.text().await.map_err(multipart_error)?);
        }
    }

    match (file, filename) {
        (Some(file), Some(filename)) if !filename.is_empty() => {
            UploadRequest::new(file.data, &file.content_type, &filename)
        }
        _ => Err(ApiError::MissingField),
    }
}

/// Write the image under its object name, make it public, and report where it lives.
///
/// A failed write is terminal. A failed visibility change leaves the object
/// written but private; that state is reported, not repaired.
pub async fn upload_image(
    store: &dyn ObjectStore,
    upload: UploadRequest,
) -> Result<UploadResponse, ApiError> {
    let key = upload.object_name;

    store
        .write(&key, &upload.content_type, upload.data)
        .await
        .log_as("Upload error", ApiError::StoreWrite)?;

    store.make_public(&key).await.map_err(|e| {
        error!("Make public error: {}", e);
        ApiError::MakePublic
    })?;

    let public_url = store.public_url(&key);
    info!(key = %key, url = %public_url, "Upload complete");
    Ok(UploadResponse { public_url })
}
