//! Multipart form reading with per-field size limits

use std::collections::HashMap;

use axum::extract::Multipart;

use crate::error::AppError;
use crate::storage::{MediaKind, UploadedFile};

const MAX_TEXT_FIELD_BYTES: usize = 64 * 1024;

/// Text fields and files of a multipart form
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl MultipartForm {
    /// Read the whole form.
    ///
    /// Only fields named in `file_fields` are accepted as files, each
    /// bounded by its kind's size limit. Empty file parts count as absent.
    pub async fn read(
        mut multipart: Multipart,
        file_fields: &[(&str, MediaKind)],
    ) -> Result<Self, AppError> {
        let mut form = Self::default();

        while let Some(mut field) = multipart.next_field().await? {
            let name = field.name().unwrap_or("").to_string();

            if let Some((_, kind)) = file_fields.iter().find(|(field_name, _)| *field_name == name) {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let max_size = kind.max_bytes();

                let mut bytes = Vec::new();
                while let Some(chunk) = field.chunk().await? {
                    if bytes.len() + chunk.len() > max_size {
                        return Err(AppError::PayloadTooLarge(format!(
                            "{} too large: exceeds {} bytes",
                            name, max_size
                        )));
                    }
                    bytes.extend_from_slice(&chunk);
                }

                if !bytes.is_empty() {
                    form.files.insert(
                        name,
                        UploadedFile {
                            file_name,
                            content_type,
                            data: bytes,
                        },
                    );
                }
                continue;
            }

            if field.file_name().is_some() {
                tracing::debug!(field = %name, "Ignoring unexpected file field");
                continue;
            }

            let mut bytes = Vec::new();
            while let Some(chunk) = field.chunk().await? {
                if bytes.len() + chunk.len() > MAX_TEXT_FIELD_BYTES {
                    return Err(AppError::PayloadTooLarge(format!(
                        "{} too large: exceeds {} bytes",
                        name, MAX_TEXT_FIELD_BYTES
                    )));
                }
                bytes.extend_from_slice(&chunk);
            }
            let text = String::from_utf8(bytes)
                .map_err(|_| AppError::bad_request(format!("{} must be valid UTF-8", name)))?;
            form.fields.insert(name, text);
        }

        Ok(form)
    }

    /// Text field value
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields.get(name).cloned()
    }

    /// Take an uploaded file out of the form
    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name)
    }
}
