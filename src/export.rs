//! Flat `Cell_ID,Group,Custom Name,Color` table built from the session state.

use serde::Serialize;
use std::io::Write;

use crate::assignments::AssignmentStore;
use crate::color::UNASSIGNED_COLOR;
use crate::error::{Error, Result};
use crate::palette::PaletteTable;
use crate::points::PointSet;

pub const EXPORT_FILE_NAME: &str = "spots_assignments.csv";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExportRow {
    #[serde(rename = "Cell_ID")]
    pub id: String,
    #[serde(rename = "Group")]
    pub group: String,
    #[serde(rename = "Custom Name")]
    pub custom_label: String,
    #[serde(rename = "Color")]
    pub color: String,
}

/// One row per point in point-set order.
///
/// The custom label comes from the palette row as it is now, matched by the
/// assignment's row and then by group name, so relabels made after painting
/// show up.
pub fn project(
    points: &PointSet,
    assignments: &AssignmentStore,
    palette: &PaletteTable,
) -> Result<Vec<ExportRow>> {
    if points.is_empty() {
        return Err(Error::EmptyExport);
    }

    let rows = points
        .points()
        .iter()
        .map(|p| match assignments.get(&p.id) {
            Some(a) => {
                let custom_label = palette
                    .row(a.row)
                    .filter(|row| row.name == a.group)
                    .or_else(|| palette.row_by_name(&a.group))
                    .map(|row| row.custom_label.clone())
                    .unwrap_or_default();
                ExportRow {
                    id: p.id.clone(),
                    group: a.group.clone(),
                    custom_label,
                    color: a.color.to_string(),
                }
            }
            None => ExportRow {
                id: p.id.clone(),
                group: String::new(),
                custom_label: String::new(),
                color: UNASSIGNED_COLOR.to_string(),
            },
        })
        .collect();
    Ok(rows)
}

pub fn write_csv<W: Write>(rows: &[ExportRow], out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for row in rows {
        writer.serialize(row).map_err(Error::from_csv)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn to_csv_string(rows: &[ExportRow]) -> Result<String> {
    let mut buf = Vec::new();
    write_csv(rows, &mut buf)?;
    String::from_utf8(buf).map_err(|e| Error::parse(0, e.to_string()))
}
