//! DirectoryFrameSource - plays back image files as camera frames
//!
//! Files are read in file-name order; PNG and JPEG are supported.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use contracts::{ContractError, Frame, FrameSource, PixelFormat};
use tracing::{debug, info};

use crate::error::VisionError;

const EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Frame source backed by a directory of images
pub struct DirectoryFrameSource {
    dir: PathBuf,
    name: String,
    pending: VecDeque<PathBuf>,
    next_seq: u64,
}

impl DirectoryFrameSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let name = format!("dir:{}", dir.display());
        Self {
            dir,
            name,
            pending: VecDeque::new(),
            next_seq: 0,
        }
    }

    #[cfg(test)]
    fn remaining(&self) -> usize {
        self.pending.len()
    }

    fn list_images(dir: &Path) -> crate::Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(dir).map_err(|cause| VisionError::Directory {
            path: dir.to_path_buf(),
            cause,
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|cause| VisionError::Directory {
                    path: dir.to_path_buf(),
                    cause,
                })?
                .path();
            if path.is_file() && is_image(&path) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    fn decode(&self, path: &Path, seq: u64) -> crate::Result<Frame> {
        let image = image::open(path)
            .map_err(|cause| VisionError::Decode {
                path: path.to_path_buf(),
                cause,
            })?
            .to_rgb8();
        let (width, height) = image.dimensions();
        Ok(Frame::new(
            seq,
            width,
            height,
            PixelFormat::Rgb8,
            image.into_raw(),
        )?)
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

impl FrameSource for DirectoryFrameSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&mut self) -> Result<(), ContractError> {
        let files = Self::list_images(&self.dir).map_err(|e| e.into_unavailable(&self.name))?;
        info!(dir = %self.dir.display(), files = files.len(), "frame directory opened");
        self.pending = files.into();
        self.next_seq = 0;
        Ok(())
    }

    fn acquire(&mut self) -> Result<Option<Frame>, ContractError> {
        let Some(path) = self.pending.pop_front() else {
            return Ok(None);
        };

        let seq = self.next_seq;
        self.next_seq += 1;

        let frame = self
            .decode(&path, seq)
            .map_err(|e| ContractError::frame_read(&self.name, e.to_string()))?;
        debug!(path = %path.display(), seq, "frame decoded");
        Ok(Some(frame))
    }

    fn release(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn write_png(dir: &Path, name: &str, color: [u8; 3]) {
        RgbImage::from_pixel(4, 3, Rgb(color))
            .save(dir.join(name))
            .unwrap();
    }

    #[test]
    fn test_plays_images_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "b.png", [0, 255, 0]);
        write_png(dir.path(), "a.png", [255, 0, 0]);
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut source = DirectoryFrameSource::new(dir.path());
        source.open().unwrap();
        assert_eq!(source.remaining(), 2);

        let first = source.acquire().unwrap().unwrap();
        assert_eq!(first.seq, 0);
        assert_eq!((first.width, first.height), (4, 3));
        assert_eq!(first.rgb_at(0, 0), Some([255, 0, 0]));

        let second = source.acquire().unwrap().unwrap();
        assert_eq!(second.seq, 1);
        assert_eq!(second.rgb_at(3, 2), Some([0, 255, 0]));

        assert!(source.acquire().unwrap().is_none());
    }

    #[test]
    fn test_missing_directory_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = DirectoryFrameSource::new(dir.path().join("missing"));
        let err = source.open().unwrap_err();
        assert!(matches!(err, ContractError::Unavailable { .. }));
    }

    #[test]
    fn test_corrupt_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.png"), b"not a png").unwrap();

        let mut source = DirectoryFrameSource::new(dir.path());
        source.open().unwrap();
        let err = source.acquire().unwrap_err();
        assert!(matches!(err, ContractError::FrameRead { .. }));
    }

    #[test]
    fn test_release_drops_pending_files() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "a.png", [1, 2, 3]);

        let mut source = DirectoryFrameSource::new(dir.path());
        source.open().unwrap();
        source.release();
        source.release();
        assert!(source.acquire().unwrap().is_none());
    }
}
