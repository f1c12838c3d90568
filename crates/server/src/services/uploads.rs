//! Multipart form handling for admin catalog writes.
//!
//! Admin forms arrive as `multipart/form-data`: text fields plus an optional
//! `image` file part. [`read_form`] splits them, validating the image on the
//! way in, and [`ImageStore`] writes accepted images below the upload
//! directory so they can be served from `/uploads`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use axum::body::Bytes;
use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use thiserror::Error;
use uuid::Uuid;

/// Largest accepted image, in bytes.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Name of the multipart part carrying the image.
const IMAGE_FIELD: &str = "image";

/// Accepted image extensions and the content types that go with them.
const IMAGE_TYPES: &[(&str, &[&str])] = &[
    ("jpg", &["image/jpeg", "image/jpg"]),
    ("jpeg", &["image/jpeg", "image/jpg"]),
    ("png", &["image/png"]),
    ("gif", &["image/gif"]),
];

/// Errors raised while reading or storing an upload.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The request body is not valid multipart.
    #[error("malformed form data: {0}")]
    Multipart(#[from] MultipartError),

    /// The image exceeds [`MAX_IMAGE_BYTES`].
    #[error("image must be at most 5 MB")]
    TooLarge,

    /// The file is not a jpeg, png or gif.
    #[error("images only (jpeg, jpg, png, gif)")]
    UnsupportedType,

    /// A text field is missing or invalid.
    #[error(transparent)]
    Form(#[from] FormError),

    /// Writing the file failed.
    #[error("failed to store image: {0}")]
    Io(#[from] std::io::Error),
}

/// A missing or unparsable form field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{field} {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl FormError {
    pub(crate) fn invalid(field: &'static str, reason: &str) -> Self {
        Self::Invalid {
            field,
            reason: reason.to_owned(),
        }
    }
}

/// Text fields of a multipart form.
///
/// Values are trimmed; blank values count as absent.
#[derive(Debug, Clone, Default)]
pub struct FormFields(HashMap<String, String>);

impl FromIterator<(String, String)> for FormFields {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl FormFields {
    /// A non-blank field, if present.
    #[must_use]
    pub fn optional(&self, name: &str) -> Option<&str> {
        self.0
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// A non-blank field.
    ///
    /// # Errors
    ///
    /// Returns `FormError::Missing` if the field is absent or blank.
    pub fn required(&self, name: &'static str) -> Result<&str, FormError> {
        self.optional(name).ok_or(FormError::Missing(name))
    }

    /// A required field parsed with `FromStr`.
    ///
    /// # Errors
    ///
    /// Returns `FormError` if the field is missing or does not parse.
    pub fn parse<T>(&self, name: &'static str) -> Result<T, FormError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.required(name)?.parse::<T>().map_err(|e| FormError::Invalid {
            field: name,
            reason: e.to_string(),
        })
    }

    /// A required field holding one of the catalog enum names.
    ///
    /// # Errors
    ///
    /// Returns `FormError` if the field is missing or names no variant.
    pub fn wire_enum<T: serde::de::DeserializeOwned>(
        &self,
        name: &'static str,
    ) -> Result<T, FormError> {
        gallery_core::parse_wire_name(self.required(name)?).map_err(|value| FormError::Invalid {
            field: name,
            reason: format!("has unknown value {value:?}"),
        })
    }

    /// A checkbox-style boolean: `true`, `on` and `1` are set, anything else is not.
    #[must_use]
    pub fn flag(&self, name: &str) -> bool {
        self.optional(name)
            .is_some_and(|v| matches!(v.to_ascii_lowercase().as_str(), "true" | "on" | "1"))
    }
}

/// An uploaded image that passed type and size checks.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    extension: &'static str,
    bytes: Bytes,
}

impl ImageUpload {
    /// Validate an image by file name, content type and size.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::UnsupportedType` unless both the extension and
    /// the content type name an accepted image format, and
    /// `UploadError::TooLarge` if the data exceeds [`MAX_IMAGE_BYTES`].
    pub fn new(file_name: &str, content_type: &str, bytes: Bytes) -> Result<Self, UploadError> {
        let ext = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .ok_or(UploadError::UnsupportedType)?;
        let content_type = content_type.to_ascii_lowercase();

        let (extension, _) = IMAGE_TYPES
            .iter()
            .find(|(known, types)| *known == ext && types.contains(&content_type.as_str()))
            .ok_or(UploadError::UnsupportedType)?;

        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(UploadError::TooLarge);
        }

        Ok(Self { extension, bytes })
    }

    /// Size of the image in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the upload is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// A parsed admin form.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub fields: FormFields,
    pub image: Option<ImageUpload>,
}

/// Read every part of a multipart body.
///
/// A file part with an empty file name (an untouched file input) is ignored.
///
/// # Errors
///
/// Returns `UploadError` if the body is malformed or the image is rejected.
pub async fn read_form(mut multipart: Multipart) -> Result<UploadForm, UploadError> {
    let mut fields = HashMap::new();
    let mut image = None;

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };

        if name == IMAGE_FIELD {
            let file_name = field.file_name().unwrap_or_default().to_owned();
            if file_name.is_empty() {
                continue;
            }
            let content_type = field.content_type().unwrap_or_default().to_owned();
            let bytes = field.bytes().await?;
            image = Some(ImageUpload::new(&file_name, &content_type, bytes)?);
        } else {
            fields.insert(name, field.text().await?);
        }
    }

    Ok(UploadForm {
        fields: FormFields(fields),
        image,
    })
}

/// Which catalog collection an image belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Artwork,
    Exhibition,
}

impl ImageKind {
    const fn dir(self) -> &'static str {
        match self {
            Self::Artwork => "artworks",
            Self::Exhibition => "exhibitions",
        }
    }
}

/// Writes images below the upload directory.
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    /// URL prefix under which the upload directory is served.
    pub const PUBLIC_PREFIX: &'static str = "/uploads";

    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory served under [`Self::PUBLIC_PREFIX`].
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store an image under a generated name and return its public path.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::Io` if the directory or file cannot be written.
    pub async fn save(&self, kind: ImageKind, image: &ImageUpload) -> Result<String, UploadError> {
        let dir = self.root.join(kind.dir());
        tokio::fs::create_dir_all(&dir).await?;

        let file_name = format!("{}.{}", Uuid::new_v4(), image.extension);
        tokio::fs::write(dir.join(&file_name), &image.bytes).await?;

        tracing::debug!(kind = kind.dir(), file = %file_name, bytes = image.len(), "Stored image");
        Ok(format!("{}/{}/{file_name}", Self::PUBLIC_PREFIX, kind.dir()))
    }

    /// Delete a previously stored image. Failures are logged, not returned.
    pub async fn remove(&self, public_path: &str) {
        let Some(relative) = public_path
            .strip_prefix(Self::PUBLIC_PREFIX)
            .map(|p| p.trim_start_matches('/'))
        else {
            return;
        };
        // Stored names never contain parent components
        if relative.split('/').any(|part| part == ".." || part.is_empty()) {
            return;
        }

        if let Err(e) = tokio::fs::remove_file(self.root.join(relative)).await {
            tracing::warn!(error = %e, path = %public_path, "Failed to remove image");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_image_accepts_matching_extension_and_type() {
        let image = ImageUpload::new("Photo.JPG", "image/jpeg", Bytes::from_static(b"x")).unwrap();
        assert_eq!(image.extension, "jpg");
    }

    #[test]
    fn test_image_rejects_mismatched_type() {
        let err = ImageUpload::new("photo.png", "text/html", Bytes::from_static(b"x")).unwrap_err();
        assert!(matches!(err, UploadError::UnsupportedType));

        let err =
            ImageUpload::new("script.js", "image/png", Bytes::from_static(b"x")).unwrap_err();
        assert!(matches!(err, UploadError::UnsupportedType));
    }

    #[test]
    fn test_image_rejects_oversized() {
        let bytes = Bytes::from(vec![0u8; MAX_IMAGE_BYTES + 1]);
        let err = ImageUpload::new("big.gif", "image/gif", bytes).unwrap_err();
        assert!(matches!(err, UploadError::TooLarge));
    }

    #[test]
    fn test_form_fields_blank_is_missing() {
        let fields: FormFields = [("title".to_string(), "   ".to_string())]
            .into_iter()
            .collect();
        assert_eq!(fields.required("title"), Err(FormError::Missing("title")));
        assert!(!fields.flag("isFeatured"));
    }

    #[test]
    fn test_form_fields_flag() {
        let fields: FormFields = [("isFeatured".to_string(), "True".to_string())]
            .into_iter()
            .collect();
        assert!(fields.flag("isFeatured"));
    }

    #[tokio::test]
    async fn test_store_save_and_remove() {
        let root = std::env::temp_dir().join(format!("gallery-uploads-{}", Uuid::new_v4()));
        let store = ImageStore::new(&root);
        let image = ImageUpload::new("a.png", "image/png", Bytes::from_static(b"png")).unwrap();

        let path = store.save(ImageKind::Artwork, &image).await.unwrap();
        assert!(path.starts_with("/uploads/artworks/"));
        assert!(path.ends_with(".png"));

        let on_disk = root.join(path.trim_start_matches("/uploads/"));
        assert_eq!(tokio::fs::read(&on_disk).await.unwrap(), b"png");

        store.remove(&path).await;
        assert!(!on_disk.exists());

        tokio::fs::remove_dir_all(&root).await.unwrap();
    }

    #[tokio::test]
    async fn test_store_remove_ignores_traversal() {
        let store = ImageStore::new(std::env::temp_dir());
        // Must not panic or touch anything outside the root
        store.remove("/uploads/../etc/passwd").await;
        store.remove("/elsewhere/file.png").await;
    }
}
