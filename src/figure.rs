//! Renderable scene: colored points over an optional positioned image.

use serde::Serialize;

use crate::assignments::AssignmentStore;
use crate::color::ColorHex;
use crate::points::PointSet;
use crate::settings::ViewSettings;
use crate::viewport::{ImageLayer, OverlayImage, ViewportBox};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScenePoint {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub color: ColorHex,
    pub hover: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Scene {
    pub frame: ViewportBox,
    /// One data unit on X spans the same screen length as one on Y.
    pub equal_aspect: bool,
    pub point_size: f32,
    /// Drawn before `points`.
    pub image: Option<ImageLayer>,
    pub points: Vec<ScenePoint>,
}

pub fn assemble(
    points: &PointSet,
    assignments: &AssignmentStore,
    overlay: Option<&OverlayImage>,
    settings: &ViewSettings,
) -> Scene {
    let frame = ViewportBox::fit(points);
    let image = overlay.and_then(|img| ImageLayer::place(&frame, img, &settings.placement()));

    let points = points
        .points()
        .iter()
        .map(|p| {
            let (color, hover) = match assignments.get(&p.id) {
                Some(a) if a.custom_label.is_empty() => {
                    (a.color.clone(), format!("Cell: {}\nGroup: {}", p.id, a.group))
                }
                Some(a) => (
                    a.color.clone(),
                    format!("Cell: {}\nGroup: {}\nCustom: {}", p.id, a.group, a.custom_label),
                ),
                None => (ColorHex::unassigned(), format!("Cell: {}\nGroup: ", p.id)),
            };
            ScenePoint {
                id: p.id.clone(),
                x: p.x,
                y: p.y,
                color,
                hover,
            }
        })
        .collect();

    Scene {
        frame,
        equal_aspect: true,
        point_size: settings.point_size,
        image,
        points,
    }
}
