//! FrameDiffDetector - motion detection by frame differencing
//!
//! Compares each frame's luma against the previous frame. Pixels whose
//! difference exceeds `pixel_threshold` count as motion; when at least
//! `min_area` pixels moved, their padded bounding box is cropped out.

use contracts::{BoundingBox, ContractError, Frame, Region, RegionDetector};
use tracing::trace;

/// Frame-difference region detector
#[derive(Debug, Clone)]
pub struct FrameDiffDetector {
    pixel_threshold: u8,
    min_area: u32,
    padding: u32,
    previous: Option<Frame>,
}

impl FrameDiffDetector {
    pub fn new(pixel_threshold: u8, min_area: u32, padding: u32) -> Self {
        Self {
            pixel_threshold,
            min_area: min_area.max(1),
            padding,
            previous: None,
        }
    }

    /// Bounding box of changed pixels, if enough of them changed
    fn changed_bounds(&self, previous: &Frame, current: &Frame) -> Option<BoundingBox> {
        let mut changed = 0u32;
        let (mut min_x, mut min_y) = (u32::MAX, u32::MAX);
        let (mut max_x, mut max_y) = (0u32, 0u32);

        for y in 0..current.height {
            for x in 0..current.width {
                let (Some(a), Some(b)) = (previous.luma_at(x, y), current.luma_at(x, y)) else {
                    continue;
                };
                if a.abs_diff(b) > self.pixel_threshold {
                    changed += 1;
                    min_x = min_x.min(x);
                    min_y = min_y.min(y);
                    max_x = max_x.max(x);
                    max_y = max_y.max(y);
                }
            }
        }

        trace!(seq = current.seq, changed, "frame diff");
        if changed < self.min_area {
            return None;
        }

        let x = min_x.saturating_sub(self.padding);
        let y = min_y.saturating_sub(self.padding);
        let right = (max_x + 1).saturating_add(self.padding).min(current.width);
        let bottom = (max_y + 1).saturating_add(self.padding).min(current.height);

        Some(BoundingBox {
            x,
            y,
            width: right - x,
            height: bottom - y,
        })
    }
}

impl Default for FrameDiffDetector {
    fn default() -> Self {
        Self::new(25, 64, 4)
    }
}

impl RegionDetector for FrameDiffDetector {
    fn prepare(&mut self) -> Result<(), ContractError> {
        self.previous = None;
        Ok(())
    }

    fn detect(&mut self, frame: &Frame) -> Result<Option<Region>, ContractError> {
        let previous = self.previous.replace(frame.clone());
        let Some(previous) = previous else {
            return Ok(None);
        };
        if previous.width != frame.width || previous.height != frame.height {
            return Ok(None);
        }

        match self.changed_bounds(&previous, frame) {
            Some(bounds) => Region::from_parent(frame, bounds).map(Some),
            None => Ok(None),
        }
    }
}
