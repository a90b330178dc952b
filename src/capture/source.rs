//! Capture sources.
//!
//! A [`CaptureSource`] is acquired once, read once per tick, and released
//! synchronously on stop or drop. [`ImageDirSource`] cycles through the
//! JPEG stills of a directory so headless deployments can feed the loop
//! without a camera device.

use std::future::Future;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::CaptureError;

/// One captured frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// JPEG-encoded image.
    pub jpeg: Vec<u8>,
    /// When the frame was read.
    pub captured_at: DateTime<Utc>,
}

impl Frame {
    /// Wraps JPEG bytes read now.
    #[must_use]
    pub fn new(jpeg: Vec<u8>) -> Self {
        Self {
            jpeg,
            captured_at: Utc::now(),
        }
    }
}

/// Local producer of frames.
pub trait CaptureSource: Send + 'static {
    /// Opens the underlying device or resource.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::Acquire`] with a user-visible message if the
    /// source cannot be opened.
    fn acquire(&mut self) -> impl Future<Output = Result<(), CaptureError>> + Send;

    /// Reads the next frame; `Ok(None)` when none is ready yet.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::Read`] if the source failed.
    fn read_frame(&mut self) -> impl Future<Output = Result<Option<Frame>, CaptureError>> + Send;

    /// Releases the underlying resource. Must be idempotent.
    fn release(&mut self);

    /// Native frame rate, if the source reports one.
    fn frame_rate(&self) -> Option<f64> {
        None
    }
}

/// Cycles the JPEG files of a directory in name order.
#[derive(Debug, Clone)]
pub struct ImageDirSource {
    dir: PathBuf,
    files: Vec<PathBuf>,
    next: usize,
}

impl ImageDirSource {
    /// Creates an unacquired source over `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            files: Vec::new(),
            next: 0,
        }
    }

    /// Number of stills found at acquisition.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns `true` if the source is not acquired or found nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

fn is_jpeg(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg"))
}

impl CaptureSource for ImageDirSource {
    async fn acquire(&mut self) -> Result<(), CaptureError> {
        let unreadable = |e: std::io::Error| {
            CaptureError::Acquire(format!("{}: {e}", self.dir.display()))
        };
        let mut entries = tokio::fs::read_dir(&self.dir).await.map_err(unreadable)?;
        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(unreadable)? {
            let path = entry.path();
            if is_jpeg(&path) {
                files.push(path);
            }
        }
        if files.is_empty() {
            return Err(CaptureError::Acquire(format!(
                "no JPEG images in {}",
                self.dir.display()
            )));
        }
        files.sort();
        tracing::info!(dir = %self.dir.display(), images = files.len(), "capture source acquired");
        self.files = files;
        self.next = 0;
        Ok(())
    }

    async fn read_frame(&mut self) -> Result<Option<Frame>, CaptureError> {
        let Some(path) = self.files.get(self.next).cloned() else {
            return Err(CaptureError::Read("source is not acquired".to_string()));
        };
        self.next = (self.next + 1) % self.files.len();
        let jpeg = tokio::fs::read(&path)
            .await
            .map_err(|e| CaptureError::Read(format!("{}: {e}", path.display())))?;
        Ok(Some(Frame::new(jpeg)))
    }

    fn release(&mut self) {
        if !self.files.is_empty() {
            tracing::info!(dir = %self.dir.display(), "capture source released");
        }
        self.files.clear();
        self.next = 0;
    }
}
