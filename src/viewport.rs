//! Auto-fitted data-space frame and overlay image placement inside it.

use serde::Serialize;
use std::io::Cursor;

use crate::error::Result;
use crate::points::PointSet;

/// Fraction of each axis span added on both sides of the point extents.
pub const PADDING: f64 = 0.05;

/// Frame used when nothing is loaded, before padding.
const EMPTY_EXTENT: (f64, f64) = (0.0, 100.0);

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ViewportBox {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl ViewportBox {
    /// Padded bounding box of `points`. An axis with zero span is widened to a
    /// unit span centred on its value so the box never collapses.
    pub fn fit(points: &PointSet) -> Self {
        let mut pts = points.points().iter();
        let Some(first) = pts.next() else {
            let (lo, hi) = EMPTY_EXTENT;
            return Self::padded((lo, hi), (lo, hi));
        };

        let init = ((first.x, first.x), (first.y, first.y));
        let ((x_lo, x_hi), (y_lo, y_hi)) = pts.fold(init, |((xl, xh), (yl, yh)), p| {
            ((xl.min(p.x), xh.max(p.x)), (yl.min(p.y), yh.max(p.y)))
        });
        Self::padded(non_degenerate(x_lo, x_hi), non_degenerate(y_lo, y_hi))
    }

    fn padded((x_lo, x_hi): (f64, f64), (y_lo, y_hi): (f64, f64)) -> Self {
        let dx = x_hi - x_lo;
        let dy = y_hi - y_lo;
        Self {
            x_min: x_lo - PADDING * dx,
            x_max: x_hi + PADDING * dx,
            y_min: y_lo - PADDING * dy,
            y_max: y_hi + PADDING * dy,
        }
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        (self.x_min..=self.x_max).contains(&x) && (self.y_min..=self.y_max).contains(&y)
    }
}

fn non_degenerate(lo: f64, hi: f64) -> (f64, f64) {
    if hi > lo {
        return (lo, hi);
    }
    // Half a unit, or a few ulps where half a unit would be absorbed.
    let half = (lo.abs() * f64::EPSILON * 4.0).max(0.5);
    (lo - half, hi + half)
}

/// A decoded overlay raster. Only its natural size is interpreted; the bytes
/// are handed to the renderer untouched.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OverlayImage {
    pub source_ref: String,
    pub natural_width: u32,
    pub natural_height: u32,
}

impl OverlayImage {
    pub fn decode(source_ref: impl Into<String>, bytes: &[u8]) -> Result<Self> {
        let (natural_width, natural_height) = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()?
            .into_dimensions()?;
        Ok(Self {
            source_ref: source_ref.into(),
            natural_width,
            natural_height,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverlayPlacement {
    /// Horizontal anchor, percent of the viewport width.
    pub x_percent: f64,
    /// Vertical anchor, percent of the viewport height.
    pub y_percent: f64,
    /// Image width as a multiple of the viewport width.
    pub scale: f64,
    pub opacity: f64,
}

impl Default for OverlayPlacement {
    fn default() -> Self {
        Self {
            x_percent: 50.0,
            y_percent: 50.0,
            scale: 0.5,
            opacity: 0.6,
        }
    }
}

/// Where the overlay lands in data space. Always drawn beneath the points.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ImageLayer {
    pub source_ref: String,
    pub center_x: f64,
    pub center_y: f64,
    pub size_x: f64,
    pub size_y: f64,
    pub opacity: f64,
}

impl ImageLayer {
    /// Place `image` in `frame`; `None` when it cannot be drawn.
    pub fn place(
        frame: &ViewportBox,
        image: &OverlayImage,
        placement: &OverlayPlacement,
    ) -> Option<Self> {
        let drawable = placement.scale > 0.0 && image.natural_width > 0 && image.natural_height > 0;
        if !drawable {
            return None;
        }
        let x_pct = placement.x_percent.clamp(0.0, 100.0);
        let y_pct = placement.y_percent.clamp(0.0, 100.0);
        let size_x = frame.width() * placement.scale;
        Some(Self {
            source_ref: image.source_ref.clone(),
            center_x: frame.x_min + frame.width() * x_pct / 100.0,
            center_y: frame.y_min + frame.height() * y_pct / 100.0,
            size_x,
            size_y: size_x * f64::from(image.natural_height) / f64::from(image.natural_width),
            opacity: placement.opacity.clamp(0.0, 1.0),
        })
    }

    pub fn x_min(&self) -> f64 {
        self.center_x - self.size_x / 2.0
    }

    pub fn x_max(&self) -> f64 {
        self.center_x + self.size_x / 2.0
    }

    pub fn y_min(&self) -> f64 {
        self.center_y - self.size_y / 2.0
    }

    pub fn y_max(&self) -> f64 {
        self.center_y + self.size_y / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::points::Point;

    fn set(coords: &[(f64, f64)]) -> PointSet {
        let points = coords
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| Point { id: i.to_string(), x, y })
            .collect();
        PointSet::from_points(points).unwrap()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn fit_pads_five_percent() {
        let frame = ViewportBox::fit(&set(&[(0.0, 0.0), (10.0, 0.0), (10.0, 20.0)]));
        assert!(close(frame.x_min, -0.5));
        assert!(close(frame.x_max, 10.5));
        assert!(close(frame.y_min, -1.0));
        assert!(close(frame.y_max, 21.0));
    }

    #[test]
    fn single_point_gives_non_degenerate_box() {
        let frame = ViewportBox::fit(&set(&[(5.0, 5.0)]));
        assert!(frame.width() > 0.0);
        assert!(frame.height() > 0.0);
        assert!(frame.contains(5.0, 5.0));
    }

    #[test]
    fn collinear_points_widen_only_the_flat_axis() {
        let frame = ViewportBox::fit(&set(&[(0.0, 3.0), (10.0, 3.0)]));
        assert!(close(frame.width(), 11.0));
        assert!(close(frame.height(), 1.1));
    }

    #[test]
    fn huge_coordinates_still_give_a_non_degenerate_box() {
        let v = 2f64.powi(60);
        let frame = ViewportBox::fit(&set(&[(v, -v)]));
        assert!(frame.width() > 0.0);
        assert!(frame.height() > 0.0);
        assert!(frame.contains(v, -v));
    }

    #[test]
    fn empty_set_uses_default_frame() {
        let frame = ViewportBox::fit(&PointSet::default());
        assert!(close(frame.x_min, -5.0));
        assert!(close(frame.y_max, 105.0));
    }

    #[test]
    fn image_is_centred_on_percent_anchor_and_aspect_locked() {
        let frame = ViewportBox { x_min: 0.0, x_max: 100.0, y_min: 0.0, y_max: 50.0 };
        let image = OverlayImage {
            source_ref: "tissue.png".into(),
            natural_width: 400,
            natural_height: 200,
        };
        let placement = OverlayPlacement { x_percent: 25.0, y_percent: 50.0, scale: 0.5, opacity: 0.6 };
        let layer = ImageLayer::place(&frame, &image, &placement).unwrap();
        assert!(close(layer.center_x, 25.0));
        assert!(close(layer.center_y, 25.0));
        assert!(close(layer.size_x, 50.0));
        assert!(close(layer.size_y, 25.0));
        assert!(close(layer.x_min(), 0.0));
        assert!(close(layer.y_max(), 37.5));
    }

    #[test]
    fn non_positive_scale_hides_the_image() {
        let frame = ViewportBox::fit(&PointSet::default());
        let image = OverlayImage { source_ref: "x".into(), natural_width: 1, natural_height: 1 };
        let placement = OverlayPlacement { scale: 0.0, ..OverlayPlacement::default() };
        assert!(ImageLayer::place(&frame, &image, &placement).is_none());
    }

    #[test]
    fn decode_reads_natural_size() {
        let mut bytes = Vec::new();
        image::RgbaImage::new(3, 2)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        let image = OverlayImage::decode("mem.png", &bytes).unwrap();
        assert_eq!((image.natural_width, image.natural_height), (3, 2));
        assert!(OverlayImage::decode("junk", b"not an image").is_err());
    }
}
