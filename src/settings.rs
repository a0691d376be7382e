//! View settings that feed straight into the assembled scene.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;
use crate::palette::PaletteScheme;
use crate::viewport::OverlayPlacement;

pub const POINT_SIZE_RANGE: (f32, f32) = (2.0, 20.0);
pub const IMAGE_SCALE_RANGE: (f64, f64) = (0.05, 4.0);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewSettings {
    pub palette_scheme: PaletteScheme,
    /// Row index to activate when the settings are applied.
    pub active_group_row: Option<usize>,
    pub point_size: f32,
    pub image_x_percent: f64,
    pub image_y_percent: f64,
    pub image_scale: f64,
    pub image_opacity: f64,
}

impl Default for ViewSettings {
    fn default() -> Self {
        let placement = OverlayPlacement::default();
        Self {
            palette_scheme: PaletteScheme::default(),
            active_group_row: None,
            point_size: 6.0,
            image_x_percent: placement.x_percent,
            image_y_percent: placement.y_percent,
            image_scale: placement.scale,
            image_opacity: placement.opacity,
        }
    }
}

impl ViewSettings {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str::<Self>(&text)?.sanitized())
    }

    /// Clamp every field into the range the UI offers.
    pub fn sanitized(mut self) -> Self {
        let finite_or = |v: f64, fallback: f64| if v.is_finite() { v } else { fallback };
        let defaults = Self::default();
        self.point_size = if self.point_size.is_finite() {
            self.point_size.clamp(POINT_SIZE_RANGE.0, POINT_SIZE_RANGE.1)
        } else {
            defaults.point_size
        };
        self.image_x_percent =
            finite_or(self.image_x_percent, defaults.image_x_percent).clamp(0.0, 100.0);
        self.image_y_percent =
            finite_or(self.image_y_percent, defaults.image_y_percent).clamp(0.0, 100.0);
        // A non-positive scale is kept: it hides the overlay.
        self.image_scale =
            finite_or(self.image_scale, defaults.image_scale).min(IMAGE_SCALE_RANGE.1);
        self.image_opacity = finite_or(self.image_opacity, defaults.image_opacity).clamp(0.0, 1.0);
        self
    }

    pub fn placement(&self) -> OverlayPlacement {
        OverlayPlacement {
            x_percent: self.image_x_percent,
            y_percent: self.image_y_percent,
            scale: self.image_scale,
            opacity: self.image_opacity,
        }
    }
}
