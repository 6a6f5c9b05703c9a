//! File uploads to object storage.
//!
//! Multipart bodies are read field by field. The file field is streamed in
//! chunks and rejected as soon as it passes [`MAX_UPLOAD_BYTES`]; text fields
//! are collected alongside it.

use std::collections::HashMap;

use axum::extract::Multipart;
use axum::extract::multipart::{Field, MultipartError};
use thiserror::Error;
use uuid::Uuid;

use medsupply_core::ProfileId;

use crate::supabase::{StorageClient, StoredObject, SupabaseError};

/// Largest accepted file (5 MiB).
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

const IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp", "image/gif"];

/// Errors that can occur while receiving or storing an upload.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Malformed multipart body.
    #[error("invalid multipart body: {0}")]
    Multipart(#[from] MultipartError),

    /// The expected field was not sent.
    #[error("No {0} provided")]
    MissingField(&'static str),

    /// The file field carried no bytes.
    #[error("Empty file")]
    Empty,

    /// The file is over the size limit.
    #[error("File too large (max {} MiB)", MAX_UPLOAD_BYTES / 1024 / 1024)]
    TooLarge,

    /// Content type not accepted for this kind of upload.
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    /// No service-role key, so storage cannot be written.
    #[error("storage is not configured")]
    NotConfigured,

    /// Object storage call failed.
    #[error("storage error: {0}")]
    Storage(#[from] SupabaseError),
}

/// What an upload is for; decides the accepted content types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Avatar,
    ProductImage,
    VerificationDocument,
}

impl UploadKind {
    /// Whether `content_type` may be stored for this kind.
    #[must_use]
    pub fn accepts(self, content_type: &str) -> bool {
        match self {
            Self::Avatar | Self::ProductImage => IMAGE_TYPES.contains(&content_type),
            Self::VerificationDocument => {
                IMAGE_TYPES.contains(&content_type) || content_type == "application/pdf"
            }
        }
    }
}

/// A file received in a multipart body.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub file_name: Option<String>,
}

impl UploadedFile {
    /// Check the content type and return the file extension to store under.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::UnsupportedType` if the type is not accepted.
    pub fn extension_for(&self, kind: UploadKind) -> Result<&'static str, UploadError> {
        if !kind.accepts(&self.content_type) {
            return Err(UploadError::UnsupportedType(self.content_type.clone()));
        }
        extension_for(&self.content_type)
            .ok_or_else(|| UploadError::UnsupportedType(self.content_type.clone()))
    }
}

/// A multipart form with one file field and any number of text fields.
#[derive(Debug)]
pub struct UploadForm {
    pub file: UploadedFile,
    pub fields: HashMap<String, String>,
}

impl UploadForm {
    /// Read the whole body, taking the file from `file_field`.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::MissingField` if `file_field` is absent,
    /// `UploadError::TooLarge` or `UploadError::Empty` for a bad file, and
    /// `UploadError::Multipart` if the body cannot be parsed.
    pub async fn read(
        mut multipart: Multipart,
        file_field: &'static str,
    ) -> Result<Self, UploadError> {
        let mut file = None;
        let mut fields = HashMap::new();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };
            if name == file_field {
                file = Some(read_file(field).await?);
            } else if field.file_name().is_none() {
                fields.insert(name, field.text().await?);
            }
        }

        Ok(Self {
            file: file.ok_or(UploadError::MissingField(file_field))?,
            fields,
        })
    }

    /// A trimmed, non-empty text field.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

async fn read_file(mut field: Field<'_>) -> Result<UploadedFile, UploadError> {
    let file_name = field.file_name().map(str::to_owned);
    let content_type = field
        .content_type()
        .map(str::to_ascii_lowercase)
        .or_else(|| file_name.as_deref().and_then(content_type_from_name))
        .unwrap_or_else(|| "application/octet-stream".to_owned());

    let mut bytes = Vec::new();
    while let Some(chunk) = field.chunk().await? {
        if bytes.len() + chunk.len() > MAX_UPLOAD_BYTES {
            return Err(UploadError::TooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }
    if bytes.is_empty() {
        return Err(UploadError::Empty);
    }

    Ok(UploadedFile {
        bytes,
        content_type,
        file_name,
    })
}

/// File extension for a supported content type.
#[must_use]
pub fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        "application/pdf" => Some("pdf"),
        _ => None,
    }
}

fn content_type_from_name(name: &str) -> Option<String> {
    let ext = std::path::Path::new(name)
        .extension()?
        .to_str()?
        .to_ascii_lowercase();
    let content_type = match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "pdf" => "application/pdf",
        _ => return None,
    };
    Some(content_type.to_owned())
}

/// `{folder}/{uuid}.{ext}`
#[must_use]
pub fn random_path(folder: &str, ext: &str) -> String {
    format!("{}/{}.{ext}", folder.trim_matches('/'), Uuid::new_v4())
}

/// `avatars/{user_id}.{ext}`
#[must_use]
pub fn avatar_path(user_id: ProfileId, ext: &str) -> String {
    format!("avatars/{user_id}.{ext}")
}

fn storage(storage: Option<&StorageClient>) -> Result<&StorageClient, UploadError> {
    storage.ok_or(UploadError::NotConfigured)
}

/// Store a file under a fresh random name in `folder`.
///
/// # Errors
///
/// Returns `UploadError::UnsupportedType` for a type `kind` does not accept,
/// `UploadError::NotConfigured` without storage, and `UploadError::Storage`
/// if the upload fails.
pub async fn store(
    client: Option<&StorageClient>,
    folder: &str,
    file: UploadedFile,
    kind: UploadKind,
) -> Result<StoredObject, UploadError> {
    let ext = file.extension_for(kind)?;
    let client = storage(client)?;
    let path = random_path(folder, ext);
    let stored = client
        .upload(&path, file.bytes, &file.content_type, false)
        .await?;
    tracing::info!(path = %stored.path, ?kind, "File uploaded");
    Ok(stored)
}

/// Store a user's avatar at its fixed path, replacing any previous one.
///
/// # Errors
///
/// As [`store`].
pub async fn store_avatar(
    client: Option<&StorageClient>,
    user_id: ProfileId,
    file: UploadedFile,
) -> Result<StoredObject, UploadError> {
    let ext = file.extension_for(UploadKind::Avatar)?;
    let client = storage(client)?;
    let path = avatar_path(user_id, ext);
    let stored = client
        .upload(&path, file.bytes, &file.content_type, true)
        .await?;
    tracing::info!(user_id = %user_id, path = %stored.path, "Avatar uploaded");
    Ok(stored)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn file(content_type: &str) -> UploadedFile {
        UploadedFile {
            bytes: vec![1, 2, 3],
            content_type: content_type.to_string(),
            file_name: None,
        }
    }

    #[test]
    fn test_kinds_accept_expected_types() {
        assert!(UploadKind::Avatar.accepts("image/png"));
        assert!(!UploadKind::Avatar.accepts("application/pdf"));
        assert!(!UploadKind::ProductImage.accepts("text/html"));
        assert!(UploadKind::VerificationDocument.accepts("application/pdf"));
        assert!(UploadKind::VerificationDocument.accepts("image/jpeg"));
    }

    #[test]
    fn test_extension_for_kind() {
        assert_eq!(
            file("image/jpeg").extension_for(UploadKind::ProductImage).unwrap(),
            "jpg"
        );
        assert!(matches!(
            file("application/pdf").extension_for(UploadKind::Avatar),
            Err(UploadError::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_content_type_from_name() {
        assert_eq!(
            content_type_from_name("licence.PDF").as_deref(),
            Some("application/pdf")
        );
        assert_eq!(
            content_type_from_name("photo.jpeg").as_deref(),
            Some("image/jpeg")
        );
        assert_eq!(content_type_from_name("notes.txt"), None);
        assert_eq!(content_type_from_name("noext"), None);
    }

    #[test]
    fn test_paths() {
        let path = random_path("/products/abc/", "png");
        let name = path.strip_prefix("products/abc/").unwrap();
        let (stem, ext) = name.split_once('.').unwrap();
        assert!(Uuid::parse_str(stem).is_ok());
        assert_eq!(ext, "png");

        let user = ProfileId::generate();
        assert_eq!(avatar_path(user, "webp"), format!("avatars/{user}.webp"));
    }

    #[tokio::test]
    async fn test_store_without_storage_is_not_configured() {
        let err = store(None, "products", file("image/png"), UploadKind::ProductImage)
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::NotConfigured));
    }
}
