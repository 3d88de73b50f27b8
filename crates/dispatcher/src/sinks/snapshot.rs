//! SnapshotRenderSink - keeps the latest frame of every display on disk

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use contracts::{ContractError, DisplayKey, Frame, PixelFormat, RenderSink};
use tracing::{debug, error, info, instrument};

/// Render sink writing `<dir>/<display>.png`
///
/// Each show overwrites the display's file, so repeated calls with the same
/// key leave exactly one file per display.
pub struct SnapshotRenderSink {
    name: String,
    dir: PathBuf,
    displays: BTreeSet<DisplayKey>,
}

impl SnapshotRenderSink {
    /// Create a new SnapshotRenderSink, creating `dir` if needed
    pub fn new(name: impl Into<String>, dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        Ok(Self {
            name: name.into(),
            dir,
            displays: BTreeSet::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding the latest frame of `key`
    pub fn path_for(&self, key: &DisplayKey) -> PathBuf {
        self.dir.join(format!("{}.png", key.slug()))
    }

    fn save(&self, path: &Path, frame: &Frame) -> image::ImageResult<()> {
        let color = match frame.format {
            PixelFormat::Rgb8 => image::ExtendedColorType::Rgb8,
            PixelFormat::Gray8 => image::ExtendedColorType::L8,
        };
        image::save_buffer(path, &frame.data, frame.width, frame.height, color)
    }
}

impl RenderSink for SnapshotRenderSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn show(&mut self, key: &DisplayKey, frame: &Frame) -> Result<(), ContractError> {
        let path = self.path_for(key);
        self.save(&path, frame).map_err(|e| {
            error!(sink = %self.name, display = %key, seq = frame.seq, error = %e, "snapshot write failed");
            ContractError::render(&self.name, e.to_string())
        })?;

        if self.displays.insert(*key) {
            info!(sink = %self.name, display = %key, path = %path.display(), "display opened");
        }
        debug!(sink = %self.name, display = %key, seq = frame.seq, "snapshot written");
        Ok(())
    }

    #[instrument(name = "snapshot_render_release", skip(self), fields(sink = %self.name))]
    fn release(&mut self) -> Result<(), ContractError> {
        info!(displays = self.displays.len(), dir = %self.dir.display(), "snapshot sink released");
        self.displays.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::SourceId;
    use tempfile::tempdir;

    #[test]
    fn test_one_file_per_display() {
        let dir = tempdir().unwrap();
        let mut sink = SnapshotRenderSink::new("snap", dir.path().join("out")).unwrap();
        let key = DisplayKey::live(SourceId::new(1));

        sink.show(&key, &Frame::filled_rgb(0, 3, 2, [255, 0, 0])).unwrap();
        sink.show(&key, &Frame::filled_rgb(1, 3, 2, [0, 0, 255])).unwrap();
        sink.show(
            &DisplayKey::detected(SourceId::new(2)),
            &Frame::filled_rgb(1, 1, 1, [0, 255, 0]),
        )
        .unwrap();
        sink.release().unwrap();

        let mut files: Vec<_> = fs::read_dir(sink.dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        files.sort();
        assert_eq!(files, vec!["cam1_live.png", "cam2_detected.png"]);

        // latest frame wins
        let image = image::open(sink.path_for(&key)).unwrap().to_rgb8();
        assert_eq!(image.get_pixel(0, 0).0, [0, 0, 255]);
    }

    #[test]
    fn test_unwritable_dir_is_render_error() {
        let dir = tempdir().unwrap();
        let mut sink = SnapshotRenderSink::new("snap", dir.path()).unwrap();
        fs::remove_dir_all(dir.path()).unwrap();

        let err = sink
            .show(
                &DisplayKey::live(SourceId::new(1)),
                &Frame::filled_rgb(0, 1, 1, [0, 0, 0]),
            )
            .unwrap_err();
        assert!(matches!(err, ContractError::Render { .. }));
    }
}
