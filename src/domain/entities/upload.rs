use serde::Serialize;

use crate::utils::file_name::detect_content_type;

/// A raw file as selected on the form.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    /// Builds a file, sniffing the content type from the bytes.
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let content_type = detect_content_type(&bytes, &file_name);
        ImageFile { file_name, content_type, bytes }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Output of the compressor; `compressed == false` means the original bytes were kept.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressedImage {
    pub original_name: String,
    pub file: ImageFile,
    pub dimensions: Option<(u32, u32)>,
    pub compressed: bool,
}

impl CompressedImage {
    pub fn passthrough(file: ImageFile) -> Self {
        CompressedImage {
            original_name: file.file_name.clone(),
            file,
            dimensions: None,
            compressed: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum UploadOutcome {
    Pending,
    Succeeded(String),
    Failed(String),
}

impl UploadOutcome {
    pub fn url(&self) -> Option<&str> {
        match self {
            UploadOutcome::Succeeded(url) => Some(url),
            _ => None,
        }
    }

    pub fn into_url(self) -> Option<String> {
        match self {
            UploadOutcome::Succeeded(url) => Some(url),
            _ => None,
        }
    }
}

/// One file's trip to object storage.
#[derive(Debug, Clone, Serialize)]
pub struct UploadTask {
    pub index: usize,
    pub file_name: String,
    pub key: String,
    pub outcome: UploadOutcome,
}

impl UploadTask {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, UploadOutcome::Succeeded(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSnapshot {
    pub completed: usize,
    pub total: usize,
    pub percentage: f64,
    pub status: String,
}

impl ProgressSnapshot {
    pub fn new(completed: usize, total: usize) -> Self {
        let completed = completed.min(total);
        let percentage = if completed == total {
            100.0
        } else {
            completed as f64 * 100.0 / total as f64
        };

        ProgressSnapshot {
            completed,
            total,
            percentage,
            status: format!("Uploaded {} of {} images", completed, total),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.completed == self.total
    }
}
