use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::UploadError;
use crate::matrix::SlotKey;

/// A file picked by the user, ready to be sent to the upload service.
#[derive(Clone, Debug)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        UploadFile {
            file_name: file_name.into(),
            content_type: None,
            bytes,
        }
    }

    /// Reads a file from disk, keeping its file name.
    pub fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        Ok(UploadFile::new(file_name, bytes))
    }
}

/// Response of the upload service.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UploadedImage {
    pub secure_url: String,
}

/// Image hosting collaborator. Produces a stable URL for an uploaded file.
#[async_trait]
pub trait ImageUploader: Send + Sync {
    async fn upload(&self, file: UploadFile) -> Result<UploadedImage, UploadError>;
}

/// Proof that an upload was started for one color slot.
#[derive(Debug, PartialEq, Eq)]
pub struct UploadTicket {
    pub(crate) color: SlotKey,
}

impl UploadTicket {
    pub fn color(&self) -> SlotKey {
        self.color
    }
}

/// Proof that a main image upload was started for one form generation.
#[derive(Debug, PartialEq, Eq)]
pub struct MainImageTicket {
    pub(crate) generation: Uuid,
}

impl MainImageTicket {
    pub fn generation(&self) -> Uuid {
        self.generation
    }
}

/// Uploads currently in flight. Different colors may upload at the same
/// time; one color may not upload twice at once, and there is at most one
/// main image upload.
#[derive(Clone, Debug, Default)]
pub struct UploadTracker {
    in_flight: HashSet<SlotKey>,
    main_image: Option<Uuid>,
}

impl UploadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, color: SlotKey) -> Result<UploadTicket, UploadError> {
        if !self.in_flight.insert(color) {
            return Err(UploadError::Busy);
        }
        debug!("upload started for color slot {}", color);
        Ok(UploadTicket { color })
    }

    pub fn finish(&mut self, ticket: &UploadTicket) {
        self.in_flight.remove(&ticket.color);
    }

    pub fn begin_main(&mut self, generation: Uuid) -> Result<MainImageTicket, UploadError> {
        if self.main_image.is_some() {
            return Err(UploadError::Busy);
        }
        self.main_image = Some(generation);
        debug!("main image upload started for form {}", generation);
        Ok(MainImageTicket { generation })
    }

    /// Clears the main image mark, unless it now belongs to a later form.
    pub fn finish_main(&mut self, ticket: &MainImageTicket) {
        if self.main_image == Some(ticket.generation) {
            self.main_image = None;
        }
    }

    pub fn is_uploading(&self, color: SlotKey) -> bool {
        self.in_flight.contains(&color)
    }

    pub fn is_uploading_main(&self) -> bool {
        self.main_image.is_some()
    }

    pub fn is_busy(&self) -> bool {
        !self.in_flight.is_empty() || self.main_image.is_some()
    }

    pub fn clear(&mut self) {
        self.in_flight.clear();
        self.main_image = None;
    }
}

/// Stores uploads in a local directory and hands back `file://` URLs.
pub struct DirectoryUploader {
    dir: PathBuf,
}

impl DirectoryUploader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DirectoryUploader { dir: dir.into() }
    }
}

#[async_trait]
impl ImageUploader for DirectoryUploader {
    async fn upload(&self, file: UploadFile) -> Result<UploadedImage, UploadError> {
        if file.bytes.is_empty() {
            return Err(UploadError::Failed(format!("{} is empty", file.file_name)));
        }
        fs::create_dir_all(&self.dir)?;

        let safe_name: String = file
            .file_name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
            .collect();
        let target = self.dir.join(format!("{}-{}", Uuid::new_v4().simple(), safe_name));
        fs::write(&target, &file.bytes)?;

        let absolute = fs::canonicalize(&target)?;
        Ok(UploadedImage {
            secure_url: format!("file://{}", absolute.display()),
        })
    }
}

#[cfg(feature = "web")]
pub use http::HttpUploader;

#[cfg(feature = "web")]
mod http {
    use super::*;
    use std::time::Duration;

    /// Posts files as multipart form data (field `file`) and reads back
    /// `{"secure_url": ...}`.
    pub struct HttpUploader {
        client: reqwest::Client,
        url: String,
    }

    impl HttpUploader {
        pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
            let client = reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new());
            HttpUploader {
                client,
                url: url.into(),
            }
        }
    }

    #[async_trait]
    impl ImageUploader for HttpUploader {
        async fn upload(&self, file: UploadFile) -> Result<UploadedImage, UploadError> {
            let mut part = reqwest::multipart::Part::bytes(file.bytes).file_name(file.file_name);
            if let Some(mime) = file.content_type {
                part = part
                    .mime_str(&mime)
                    .map_err(|e| UploadError::Failed(e.to_string()))?;
            }
            let form = reqwest::multipart::Form::new().part("file", part);

            let response = self
                .client
                .post(&self.url)
                .multipart(form)
                .send()
                .await
                .map_err(|e| UploadError::Failed(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(UploadError::Failed(format!("HTTP {}", status.as_u16())));
            }
            response
                .json::<UploadedImage>()
                .await
                .map_err(|e| UploadError::Failed(e.to_string()))
        }
    }
}
