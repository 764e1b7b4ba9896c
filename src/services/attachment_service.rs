use std::time::Duration;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::Attachment;
use crate::storage::BlobStore;

/// Mime types accepted beyond the `image/*` family: documents a school
/// office actually exchanges.
const ALLOWED_MIMES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-powerpoint",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    "text/csv",
    "text/plain",
];

const MAX_FILENAME_CHARS: usize = 255;

pub struct AttachmentService;

impl AttachmentService {
    pub fn mime_allowed(declared: &str) -> bool {
        let Ok(parsed) = declared.parse::<mime::Mime>() else {
            return false;
        };
        if parsed.type_() == mime::IMAGE {
            return true;
        }
        ALLOWED_MIMES.contains(&parsed.essence_str())
    }

    /// Flatten path separators and drop control characters so the client
    /// supplied name cannot escape its storage prefix.
    fn sanitize_filename(name: &str) -> String {
        name.chars()
            .map(|c| match c {
                '/' | '\\' => '_',
                c if c.is_control() => '_',
                c => c,
            })
            .collect()
    }

    /// Validate and store an attachment payload, returning its stable
    /// reference. All validation happens before any byte leaves the
    /// process; the upload itself runs under a bounded timeout, and a
    /// timeout is upload failure (the caller must not append a message
    /// referencing it). A blob orphaned by a later failure is acceptable
    /// garbage for an out-of-band sweep, never corruption.
    pub async fn stage(
        store: &dyn BlobStore,
        max_bytes: i64,
        upload_timeout: Duration,
        uploader: Uuid,
        filename: &str,
        declared_mime: &str,
        bytes: Vec<u8>,
    ) -> AppResult<Attachment> {
        let size_bytes = bytes.len() as i64;
        if size_bytes == 0 {
            return Err(AppError::Validation("attachment is empty".into()));
        }
        if size_bytes > max_bytes {
            return Err(AppError::Validation(format!(
                "attachment of {size_bytes} bytes exceeds the {max_bytes} byte limit"
            )));
        }
        if !Self::mime_allowed(declared_mime) {
            return Err(AppError::Validation(format!(
                "attachment type {declared_mime} is not allowed"
            )));
        }
        let filename = Self::sanitize_filename(filename.trim());
        if filename.is_empty() || filename.chars().count() > MAX_FILENAME_CHARS {
            return Err(AppError::Validation("invalid attachment filename".into()));
        }

        // Uploader-scoped, collision-free key.
        let key = format!("chat/{}/{}/{}", uploader, Uuid::new_v4(), filename);

        let url = tokio::time::timeout(
            upload_timeout,
            store.put(&key, bytes, declared_mime),
        )
        .await
        .map_err(|_| AppError::Transient("attachment upload timed out".into()))??;

        Ok(Attachment {
            url,
            filename,
            mime: declared_mime.to_string(),
            size_bytes,
        })
    }
}
