//! HueColorClassifier - dominant palette color of a region

use contracts::{ColorClassifier, ColorMatch, ContractError, PaletteEntry, Region};
use tracing::debug;

/// Label reported when no pixel matches the palette
pub const UNKNOWN_LABEL: &str = "unknown";

/// RGB (0-255) to HSV: hue in degrees [0, 360), saturation and value in [0, 1]
pub fn rgb_to_hsv([r, g, b]: [u8; 3]) -> (f32, f32, f32) {
    let r = r as f32 / 255.0;
    let g = g as f32 / 255.0;
    let b = b as f32 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let hue = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * ((g - b) / delta).rem_euclid(6.0)
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    let saturation = if max == 0.0 { 0.0 } else { delta / max };

    (hue, saturation, max)
}

/// Palette-based color classifier
///
/// Pixels below `min_saturation` (belt, background, glare) are ignored. The
/// label with the most matching pixels wins; confidence is its share of the
/// region's pixels.
#[derive(Debug, Clone)]
pub struct HueColorClassifier {
    palette: Vec<PaletteEntry>,
    min_saturation: f32,
}

impl HueColorClassifier {
    pub fn new(palette: Vec<PaletteEntry>, min_saturation: f32) -> Self {
        Self {
            palette,
            min_saturation,
        }
    }
}

impl Default for HueColorClassifier {
    fn default() -> Self {
        Self::new(contracts::default_palette(), 0.35)
    }
}

impl ColorClassifier for HueColorClassifier {
    fn prepare(&mut self) -> Result<(), ContractError> {
        if self.palette.is_empty() {
            return Err(ContractError::unavailable("hue classifier", "empty palette"));
        }
        Ok(())
    }

    fn classify(&mut self, region: &Region) -> Result<ColorMatch, ContractError> {
        let frame = &region.frame;
        let total = frame.pixel_count();
        if total == 0 {
            return Err(ContractError::detection("empty region"));
        }

        let mut counts = vec![0usize; self.palette.len()];
        for y in 0..frame.height {
            for x in 0..frame.width {
                let Some(px) = frame.rgb_at(x, y) else {
                    continue;
                };
                let (hue, saturation, _) = rgb_to_hsv(px);
                if saturation < self.min_saturation {
                    continue;
                }
                if let Some(i) = self.palette.iter().position(|e| e.contains(hue)) {
                    counts[i] += 1;
                }
            }
        }

        // first entry wins ties
        let best = counts
            .iter()
            .enumerate()
            .filter(|&(_, &n)| n > 0)
            .fold(None, |best: Option<(usize, usize)>, (i, &n)| match best {
                Some((_, m)) if m >= n => best,
                _ => Some((i, n)),
            });

        let color = match best {
            Some((i, n)) => ColorMatch {
                label: self.palette[i].label.clone(),
                confidence: n as f32 / total as f32,
            },
            None => ColorMatch {
                label: UNKNOWN_LABEL.to_string(),
                confidence: 0.0,
            },
        };
        debug!(seq = frame.seq, label = %color.label, confidence = color.confidence, "color classified");
        Ok(color)
    }
}
