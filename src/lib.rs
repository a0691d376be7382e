//! Paint spatial spots into named, colored groups.
//!
//! A [`Session`] owns the loaded [`PointSet`], the [`PaletteTable`] of
//! groups, the [`AssignmentStore`] and an optional [`OverlayImage`]. Gestures,
//! table edits and uploads go through its `on_*` handlers; [`Session::scene`]
//! and [`Session::export_csv`] read the joined result back out.

pub mod assignments;
pub mod color;
pub mod error;
pub mod export;
pub mod figure;
pub mod palette;
pub mod points;
pub mod selection;
pub mod session;
pub mod settings;
pub mod viewport;

pub use assignments::{Assignment, AssignmentStore};
pub use color::{ColorHex, UNASSIGNED_COLOR};
pub use error::{Error, Result};
pub use export::ExportRow;
pub use figure::{Scene, ScenePoint};
pub use palette::{GroupRow, PaletteEdit, PaletteScheme, PaletteTable, RowId};
pub use points::{Point, PointSet};
pub use selection::Gesture;
pub use session::Session;
pub use settings::ViewSettings;
pub use viewport::{ImageLayer, OverlayImage, OverlayPlacement, ViewportBox};
