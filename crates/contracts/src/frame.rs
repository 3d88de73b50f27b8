//! Frame - frame source output
//!
//! Raw image frames, detected regions and display identities.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{ContractError, SourceId};

/// Pixel layout of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 3 bytes per pixel, R G B
    Rgb8,
    /// 1 byte per pixel
    Gray8,
}

impl PixelFormat {
    /// Bytes per pixel
    pub const fn channels(self) -> usize {
        match self {
            Self::Rgb8 => 3,
            Self::Gray8 => 1,
        }
    }
}

/// A captured image frame
///
/// `data` is reference counted, so cloning a frame into several events is cheap.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Sequence number within its source (0-based)
    pub seq: u64,

    /// Width in pixels
    pub width: u32,

    /// Height in pixels
    pub height: u32,

    /// Pixel layout
    pub format: PixelFormat,

    /// Row-major pixel data
    pub data: Bytes,
}

impl Frame {
    /// Create a frame, checking that the buffer matches the dimensions
    pub fn new(
        seq: u64,
        width: u32,
        height: u32,
        format: PixelFormat,
        data: impl Into<Bytes>,
    ) -> Result<Self, ContractError> {
        let data = data.into();
        let expected = width as usize * height as usize * format.channels();
        if data.len() != expected {
            return Err(ContractError::invalid_frame(format!(
                "{width}x{height} {format:?} needs {expected} bytes, got {}",
                data.len()
            )));
        }
        Ok(Self {
            seq,
            width,
            height,
            format,
            data,
        })
    }

    /// Solid-color RGB frame
    pub fn filled_rgb(seq: u64, width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let data: Vec<u8> = rgb
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 3)
            .collect();
        Self {
            seq,
            width,
            height,
            format: PixelFormat::Rgb8,
            data: Bytes::from(data),
        }
    }

    /// Number of pixels
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Pixel at (x, y) as RGB (gray frames are expanded)
    pub fn rgb_at(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let ch = self.format.channels();
        let idx = (y as usize * self.width as usize + x as usize) * ch;
        match self.format {
            PixelFormat::Rgb8 => Some([self.data[idx], self.data[idx + 1], self.data[idx + 2]]),
            PixelFormat::Gray8 => Some([self.data[idx]; 3]),
        }
    }

    /// Luma of the pixel at (x, y)
    pub fn luma_at(&self, x: u32, y: u32) -> Option<u8> {
        let [r, g, b] = self.rgb_at(x, y)?;
        // ITU-R BT.601 integer approximation
        Some(((r as u32 * 299 + g as u32 * 587 + b as u32 * 114) / 1000) as u8)
    }

    /// Copy out the sub-frame covered by `bounds`
    ///
    /// The crop keeps the parent's `seq`.
    pub fn crop(&self, bounds: BoundingBox) -> Result<Frame, ContractError> {
        if bounds.width == 0
            || bounds.height == 0
            || bounds.x.saturating_add(bounds.width) > self.width
            || bounds.y.saturating_add(bounds.height) > self.height
        {
            return Err(ContractError::invalid_frame(format!(
                "crop {bounds} outside {}x{} frame",
                self.width, self.height
            )));
        }

        let ch = self.format.channels();
        let row_bytes = bounds.width as usize * ch;
        let mut out = Vec::with_capacity(row_bytes * bounds.height as usize);
        for row in bounds.y..bounds.y + bounds.height {
            let start = (row as usize * self.width as usize + bounds.x as usize) * ch;
            out.extend_from_slice(&self.data[start..start + row_bytes]);
        }

        Ok(Frame {
            seq: self.seq,
            width: bounds.width,
            height: bounds.height,
            format: self.format,
            data: Bytes::from(out),
        })
    }
}

/// Axis-aligned rectangle in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    /// Area in pixels
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

/// Region of interest isolated by a detector
#[derive(Debug, Clone)]
pub struct Region {
    /// Location in the parent frame
    pub bounds: BoundingBox,

    /// Cropped sub-frame
    pub frame: Frame,
}

impl Region {
    /// Crop `bounds` out of `parent`
    pub fn from_parent(parent: &Frame, bounds: BoundingBox) -> Result<Self, ContractError> {
        Ok(Self {
            bounds,
            frame: parent.crop(bounds)?,
        })
    }

    /// Region covering the whole frame
    pub fn whole(frame: Frame) -> Self {
        Self {
            bounds: BoundingBox {
                x: 0,
                y: 0,
                width: frame.width,
                height: frame.height,
            },
            frame,
        }
    }
}

/// Which view of a source a frame belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    /// Every captured frame
    Live,
    /// Detected region of interest
    Detected,
}

/// Display identity: one window per (source, view)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DisplayKey {
    pub source: SourceId,
    pub view: View,
}

impl DisplayKey {
    pub const fn live(source: SourceId) -> Self {
        Self {
            source,
            view: View::Live,
        }
    }

    pub const fn detected(source: SourceId) -> Self {
        Self {
            source,
            view: View::Detected,
        }
    }

    /// Filesystem-friendly form ("cam1_live")
    pub fn slug(&self) -> String {
        match self.view {
            View::Live => format!("{}_live", self.source),
            View::Detected => format!("{}_detected", self.source),
        }
    }
}

impl fmt::Display for DisplayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.view {
            View::Live => write!(f, "{} live", self.source.title()),
            View::Detected => write!(f, "{} detected", self.source.title()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> Frame {
        let data: Vec<u8> = (0..width * height).map(|i| i as u8).collect();
        Frame::new(7, width, height, PixelFormat::Gray8, data).unwrap()
    }

    #[test]
    fn test_new_rejects_wrong_length() {
        let result = Frame::new(0, 4, 4, PixelFormat::Rgb8, vec![0u8; 10]);
        assert!(matches!(result, Err(ContractError::InvalidFrame { .. })));

        // one byte short of 4x4 Gray8, and an RGB-sized buffer labelled Gray8
        let short = Frame::new(0, 4, 4, PixelFormat::Gray8, vec![0u8; 15]);
        assert!(matches!(short, Err(ContractError::InvalidFrame { .. })));
        let mislabelled = Frame::new(0, 4, 4, PixelFormat::Gray8, vec![0u8; 48]);
        assert!(matches!(mislabelled, Err(ContractError::InvalidFrame { .. })));
    }

    #[test]
    fn test_crop_copies_rows() {
        let frame = gradient(4, 3);
        let crop = frame
            .crop(BoundingBox {
                x: 1,
                y: 1,
                width: 2,
                height: 2,
            })
            .unwrap();

        assert_eq!(crop.seq, 7);
        assert_eq!((crop.width, crop.height), (2, 2));
        assert_eq!(crop.data.as_ref(), &[5, 6, 9, 10]);
    }

    #[test]
    fn test_crop_out_of_bounds() {
        let frame = gradient(4, 3);
        let result = frame.crop(BoundingBox {
            x: 3,
            y: 0,
            width: 2,
            height: 1,
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_rgb_at_and_luma() {
        let frame = Frame::filled_rgb(0, 2, 2, [255, 0, 0]);
        assert_eq!(frame.rgb_at(1, 1), Some([255, 0, 0]));
        assert_eq!(frame.rgb_at(2, 0), None);
        assert_eq!(frame.luma_at(0, 0), Some(76));
    }

    #[test]
    fn test_display_key_format() {
        let source = SourceId::new(1);
        assert_eq!(DisplayKey::live(source).to_string(), "Cam1 live");
        assert_eq!(DisplayKey::detected(source).to_string(), "Cam1 detected");
        assert_eq!(DisplayKey::detected(source).slug(), "cam1_detected");
        assert_ne!(DisplayKey::live(source), DisplayKey::detected(source));
    }
}
