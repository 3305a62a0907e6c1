/// Smart-resize: the per-image grid V1_5 models emit coordinates in.
///
/// The model sees the screenshot resized so that both sides are multiples of
/// `factor` and the pixel area lies within `[min_pixels, max_pixels]`, keeping
/// the aspect ratio. Coordinates it predicts are pixels of that resized image.
use serde::{Deserialize, Serialize};

use crate::errors::{ParserError, ParserResult};
use crate::geometry::factor::{ceil_by_factor, floor_by_factor, round_by_factor};

pub const IMAGE_FACTOR: u32 = 28;
pub const MIN_PIXELS: u64 = 100 * 28 * 28;
pub const MAX_PIXELS_V1_5: u64 = 16384 * 28 * 28;
pub const MAX_RATIO: f64 = 200.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmartResizeParams {
    #[serde(default = "default_factor")]
    pub factor: u32,
    #[serde(default = "default_min_pixels")]
    pub min_pixels: u64,
    #[serde(default = "default_max_pixels")]
    pub max_pixels: u64,
    #[serde(default = "default_max_ratio")]
    pub max_ratio: f64,
}

fn default_factor() -> u32 {
    IMAGE_FACTOR
}

fn default_min_pixels() -> u64 {
    MIN_PIXELS
}

fn default_max_pixels() -> u64 {
    MAX_PIXELS_V1_5
}

fn default_max_ratio() -> f64 {
    MAX_RATIO
}

impl Default for SmartResizeParams {
    fn default() -> Self {
        Self {
            factor: IMAGE_FACTOR,
            min_pixels: MIN_PIXELS,
            max_pixels: MAX_PIXELS_V1_5,
            max_ratio: MAX_RATIO,
        }
    }
}

impl SmartResizeParams {
    pub fn validate(&self) -> ParserResult<()> {
        if self.factor == 0 {
            return Err(ParserError::InvalidConfig("smart-resize factor must be positive".into()));
        }
        let cell = u64::from(self.factor) * u64::from(self.factor);
        if self.max_pixels < cell {
            return Err(ParserError::InvalidConfig(format!(
                "max_pixels ({}) is smaller than one {}x{} cell",
                self.max_pixels, self.factor, self.factor
            )));
        }
        if self.min_pixels > self.max_pixels {
            return Err(ParserError::InvalidConfig(format!(
                "min_pixels ({}) exceeds max_pixels ({})",
                self.min_pixels, self.max_pixels
            )));
        }
        if !(self.max_ratio.is_finite() && self.max_ratio >= 1.0) {
            return Err(ParserError::InvalidConfig(format!(
                "max_ratio must be a finite number >= 1, got {}",
                self.max_ratio
            )));
        }
        Ok(())
    }
}

/// Compute the resized `(width, height)`. Note the order: width first.
///
/// Returns `None` when the aspect ratio exceeds `max_ratio` (or a side is
/// zero); callers then fall back to the fixed factors. Each side is at least
/// one `factor`.
pub fn smart_resize(height: f64, width: f64, params: &SmartResizeParams) -> Option<(u32, u32)> {
    let (h, w) = (height, width);
    let factor = params.factor as f64;
    let min_pixels = params.min_pixels as f64;
    let max_pixels = params.max_pixels as f64;

    let ratio = h.max(w) / h.min(w);
    if !(ratio <= params.max_ratio) {
        tracing::warn!(
            height,
            width,
            max_ratio = params.max_ratio,
            "aspect ratio out of bounds, smart resize rejected"
        );
        return None;
    }

    let mut w_bar = factor.max(round_by_factor(w, factor));
    let mut h_bar = factor.max(round_by_factor(h, factor));

    if h_bar * w_bar > max_pixels {
        let beta = ((h * w) / max_pixels).sqrt();
        h_bar = factor.max(floor_by_factor(h / beta, factor));
        w_bar = factor.max(floor_by_factor(w / beta, factor));
    } else if h_bar * w_bar < min_pixels {
        let beta = (min_pixels / (h * w)).sqrt();
        h_bar = factor.max(ceil_by_factor(h * beta, factor));
        w_bar = factor.max(ceil_by_factor(w * beta, factor));
    }

    tracing::debug!(height, width, w_bar, h_bar, "smart resize");
    Some((w_bar as u32, h_bar as u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_rounded_size_within_budget() {
        let p = SmartResizeParams::default();
        assert_eq!(smart_resize(1080.0, 1920.0, &p), Some((1932, 1092)));
        assert_eq!(smart_resize(800.0, 1000.0, &p), Some((1008, 812)));
    }

    #[test]
    fn shrinks_oversized_images() {
        let p = SmartResizeParams::default();
        let (w, h) = smart_resize(8000.0, 12000.0, &p).unwrap();
        assert_eq!((w, h), (4368, 2912));
        assert!((w as u64) * (h as u64) <= p.max_pixels);
        assert_eq!(w % 28, 0);
        assert_eq!(h % 28, 0);
    }

    #[test]
    fn grows_undersized_images() {
        let p = SmartResizeParams::default();
        let (w, h) = smart_resize(50.0, 100.0, &p).unwrap();
        assert_eq!((w, h), (420, 224));
        assert!((w as u64) * (h as u64) >= p.min_pixels);
    }

    #[test]
    fn rejects_extreme_aspect_ratio() {
        let p = SmartResizeParams::default();
        assert_eq!(smart_resize(10.0, 3000.0, &p), None);
        assert_eq!(smart_resize(3000.0, 10.0, &p), None);
        // 1:100 is inside the default bound of 200.
        assert!(smart_resize(10.0, 1000.0, &p).is_some());
    }

    #[test]
    fn tighter_ratio_bound_rejects_earlier() {
        let p = SmartResizeParams {
            max_ratio: 50.0,
            ..Default::default()
        };
        assert_eq!(smart_resize(10.0, 1000.0, &p), None);
    }

    #[test]
    fn zero_side_is_rejected() {
        assert_eq!(smart_resize(0.0, 1000.0, &SmartResizeParams::default()), None);
    }

    #[test]
    fn validate_rejects_bad_params() {
        let zero = SmartResizeParams {
            factor: 0,
            ..Default::default()
        };
        assert!(zero.validate().is_err());

        let inverted = SmartResizeParams {
            min_pixels: 10,
            max_pixels: 5,
            ..Default::default()
        };
        assert!(inverted.validate().is_err());
        assert!(SmartResizeParams::default().validate().is_ok());

        let below_one_cell = SmartResizeParams {
            min_pixels: 0,
            max_pixels: 28 * 28 - 1,
            ..Default::default()
        };
        assert!(matches!(below_one_cell.validate(), Err(ParserError::InvalidConfig(_))));
    }

    #[test]
    fn one_cell_budget_never_collapses_a_side() {
        let p = SmartResizeParams {
            min_pixels: 0,
            max_pixels: 28 * 28,
            ..Default::default()
        };
        assert!(p.validate().is_ok());
        assert_eq!(smart_resize(1080.0, 1920.0, &p), Some((28, 28)));
        assert_eq!(smart_resize(100.0, 10000.0, &p), Some((280, 28)));
    }

    #[test]
    fn fractional_screen_sizes() {
        let p = SmartResizeParams::default();
        assert_eq!(smart_resize(1080.4, 1919.6, &p), Some((1932, 1092)));
    }
}
