//! On-disk scratch directory for retained frames.
//!
//! Each run writes into its own auto-numbered directory (`output0`,
//! `output1`, …) so earlier runs are never overwritten. Retained frames are
//! stored as `0.jpg`, `1.jpg`, … by their position among the retained
//! frames, and the assembled document lands next to them as `output.pdf`.

use std::{
    fs,
    path::{Path, PathBuf},
};

use image::DynamicImage;

use crate::{configuration::FrameFormat, error::SlideError, frame::Frame};

/// File name of the assembled document inside a store.
pub const DOCUMENT_FILE_NAME: &str = "output.pdf";

/// Default directory name prefix used by [`ScratchStore::next_available`].
pub const DEFAULT_PREFIX: &str = "output";

/// A directory of persisted keyframes.
///
/// The directory is not created until the first frame is persisted.
///
/// # Example
///
/// ```no_run
/// use slidegen::ScratchStore;
///
/// let store = ScratchStore::next_available(".", "output");
/// println!("this run writes to {}", store.directory().display());
/// ```
#[derive(Debug, Clone)]
pub struct ScratchStore {
    directory: PathBuf,
    format: FrameFormat,
    persisted: usize,
}

impl ScratchStore {
    /// Pick the first `{prefix}{n}` under `base`, counting up from 0, that
    /// does not exist yet.
    pub fn next_available<P: AsRef<Path>>(base: P, prefix: &str) -> Self {
        let base = base.as_ref();
        let directory = (0u64..)
            .map(|suffix| base.join(format!("{prefix}{suffix}")))
            .find(|candidate| !candidate.exists())
            .unwrap_or_else(|| base.join(prefix));
        log::debug!("Selected scratch directory {}", directory.display());
        Self::at(directory)
    }

    /// Use `directory` as is, e.g. to read back an earlier run.
    pub fn at<P: Into<PathBuf>>(directory: P) -> Self {
        Self {
            directory: directory.into(),
            format: FrameFormat::default(),
            persisted: 0,
        }
    }

    /// Write frames in `format` instead of JPEG.
    #[must_use]
    pub fn with_format(mut self, format: FrameFormat) -> Self {
        self.format = format;
        self
    }

    /// The store's directory.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Format persisted frames are written in.
    pub fn format(&self) -> FrameFormat {
        self.format
    }

    /// Number of frames persisted through this handle.
    pub fn persisted(&self) -> usize {
        self.persisted
    }

    /// Where the assembled document goes.
    pub fn document_path(&self) -> PathBuf {
        self.directory.join(DOCUMENT_FILE_NAME)
    }

    /// Path of the frame with retained-sequence number `sequence`.
    pub fn frame_path(&self, sequence: usize) -> PathBuf {
        self.directory
            .join(format!("{sequence}.{}", self.format.extension()))
    }

    /// Persist the next retained frame and return where it was written.
    ///
    /// The frame is stored under its position among retained frames, not
    /// its decode index. The directory is created on first use.
    ///
    /// # Errors
    ///
    /// Returns [`SlideError::Io`] if the directory cannot be created and
    /// [`SlideError::Image`] if the frame cannot be encoded or written.
    pub fn persist(&mut self, frame: Frame) -> Result<PathBuf, SlideError> {
        if self.persisted == 0 {
            fs::create_dir_all(&self.directory)?;
        }

        let path = self.frame_path(self.persisted);
        let index = frame.index();
        let image = frame.into_image();

        match self.format {
            // JPEG has no alpha channel.
            FrameFormat::Jpeg if image.color().has_alpha() => {
                DynamicImage::ImageRgb8(image.to_rgb8())
                    .save_with_format(&path, self.format.image_format())?;
            }
            _ => image.save_with_format(&path, self.format.image_format())?,
        }

        log::debug!("Persisted frame {} as {}", index, path.display());
        self.persisted += 1;
        Ok(path)
    }

    /// Paths of the persisted frames in ascending sequence order.
    ///
    /// Names are ordered numerically, so `10.jpg` follows `9.jpg`.
    /// Directories, the document and any file that is not `{number}.{ext}`
    /// in this store's format are ignored. A missing directory yields an
    /// empty list.
    ///
    /// # Errors
    ///
    /// Returns [`SlideError::Io`] if the directory cannot be listed.
    pub fn frame_paths(&self) -> Result<Vec<PathBuf>, SlideError> {
        if !self.directory.exists() {
            return Ok(Vec::new());
        }

        let extension = self.format.extension();
        let mut numbered: Vec<(u64, PathBuf)> = Vec::new();

        for entry in fs::read_dir(&self.directory)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|ext| ext.to_str()) != Some(extension) {
                continue;
            }
            let Some(sequence) = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| stem.parse::<u64>().ok())
            else {
                continue;
            };

            numbered.push((sequence, path));
        }

        numbered.sort_by_key(|(sequence, _)| *sequence);
        Ok(numbered.into_iter().map(|(_, path)| path).collect())
    }
}
