//! Files and images pending upload.

use crate::error::{ClientError, ClientResult};
use crate::validation::{Field, FieldError};
use reqwest::multipart::Part;
use reqwest::Body;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio_util::io::ReaderStream;

pub const MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;
pub const MAX_IMAGES: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Source {
    Memory(Vec<u8>),
    Disk(PathBuf),
}

/// A file the user picked, not yet read into memory when it lives on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    file_name: String,
    mime: String,
    size: u64,
    source: Source,
}

impl Attachment {
    pub fn from_bytes(file_name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime: mime.into(),
            size: bytes.len() as u64,
            source: Source::Memory(bytes),
        }
    }

    /// Size comes from file metadata and the MIME type from the extension.
    pub fn from_path(path: impl AsRef<Path>) -> ClientResult<Self> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path).map_err(|source| ClientError::Attachment {
            path: path.to_path_buf(),
            source,
        })?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();
        let mime = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        Ok(Self {
            file_name,
            mime,
            size: metadata.len(),
            source: Source::Disk(path.to_path_buf()),
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }

    /// Wrap the content as a multipart part. Files on disk are streamed
    /// rather than read into memory.
    pub(crate) async fn to_part(&self) -> ClientResult<Part> {
        let part = match &self.source {
            Source::Memory(bytes) => Part::bytes(bytes.clone()),
            Source::Disk(path) => {
                let attachment_error = |source: std::io::Error| ClientError::Attachment {
                    path: path.clone(),
                    source,
                };
                let file = File::open(path).await.map_err(attachment_error)?;
                let length = file.metadata().await.map_err(attachment_error)?.len();
                Part::stream_with_length(Body::wrap_stream(ReaderStream::new(file)), length)
            }
        };
        Ok(part.file_name(self.file_name.clone()).mime_str(&self.mime)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Files,
    Images,
}

impl Collection {
    pub fn field(&self) -> Field {
        match self {
            Collection::Files => Field::Files,
            Collection::Images => Field::Images,
        }
    }
}

/// An ordered set of accepted attachments of one kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachments {
    kind: Collection,
    items: Vec<Attachment>,
}

impl Attachments {
    pub fn new(kind: Collection) -> Self {
        Self {
            kind,
            items: Vec::new(),
        }
    }

    pub fn kind(&self) -> Collection {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attachment> {
        self.items.iter()
    }

    /// Check one candidate against the current contents without adding it.
    pub fn check(&self, attachment: &Attachment) -> Result<(), FieldError> {
        let field = self.kind.field();
        if attachment.size > MAX_FILE_SIZE {
            return Err(FieldError::new(
                field,
                format!("File {} exceeds the maximum size of 50MB", attachment.file_name),
            ));
        }
        if self.kind == Collection::Images {
            if !attachment.is_image() {
                return Err(FieldError::new(
                    field,
                    format!("File {} is not an image", attachment.file_name),
                ));
            }
            if self.items.len() >= MAX_IMAGES {
                return Err(FieldError::new(field, "Maximum 5 images allowed"));
            }
        }
        Ok(())
    }

    pub fn push(&mut self, attachment: Attachment) -> Result<(), FieldError> {
        self.check(&attachment)?;
        self.items.push(attachment);
        Ok(())
    }

    /// Add a batch, each checked on its own. Once the image limit is hit the
    /// rest of the batch is not considered.
    pub fn extend(&mut self, batch: impl IntoIterator<Item = Attachment>) -> Vec<FieldError> {
        let mut rejected = Vec::new();
        for attachment in batch {
            if self.kind == Collection::Images && self.items.len() >= MAX_IMAGES {
                rejected.push(FieldError::new(self.kind.field(), "Maximum 5 images allowed"));
                break;
            }
            if let Err(e) = self.push(attachment) {
                tracing::warn!(field = %e.field, "attachment rejected: {}", e.message);
                rejected.push(e);
            }
        }
        rejected
    }

    /// Remove by index; the rest keep their order.
    pub fn remove(&mut self, index: usize) -> Option<Attachment> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }
}
