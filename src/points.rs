//! The loaded spot table and the CSV contract it is read through.

use serde::Serialize;
use std::collections::HashMap;

use crate::error::{Error, Result};

pub const ID_COLUMN: &str = "Cell_ID";
pub const X_COLUMN: &str = "X";
pub const Y_COLUMN: &str = "Y";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Point {
    pub id: String,
    pub x: f64,
    pub y: f64,
}

/// Points in file order, with an id index for membership checks.
#[derive(Clone, Debug, Default)]
pub struct PointSet {
    points: Vec<Point>,
    index: HashMap<String, usize>,
}

impl PointSet {
    pub fn from_points(points: Vec<Point>) -> Result<Self> {
        let mut index = HashMap::with_capacity(points.len());
        for (i, p) in points.iter().enumerate() {
            if index.insert(p.id.clone(), i).is_some() {
                return Err(Error::parse(i as u64 + 1, format!("duplicate Cell_ID {:?}", p.id)));
            }
        }
        Ok(Self { points, index })
    }

    /// Parse spot CSV text.
    ///
    /// With a header row the `Cell_ID`, `X` and `Y` columns are located by
    /// case-insensitive name in any order and other columns are dropped.
    /// Without one the file must have exactly those three columns in order.
    pub fn from_csv(text: &str, has_header: bool) -> Result<Self> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(has_header)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let columns = if has_header {
            let headers = reader.headers().map_err(Error::from_csv)?;
            resolve_columns(headers)?
        } else {
            [0, 1, 2]
        };

        let mut points = Vec::new();
        for record in reader.records() {
            let record = record.map_err(Error::from_csv)?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            if !has_header && record.len() != 3 {
                return Err(Error::parse(
                    line,
                    format!("expected 3 columns (Cell_ID, X, Y), found {}", record.len()),
                ));
            }
            let field = |i: usize| record.get(i).unwrap_or("");
            let [id_col, x_col, y_col] = columns;
            points.push(Point {
                id: field(id_col).to_string(),
                x: parse_coordinate(field(x_col), X_COLUMN, line)?,
                y: parse_coordinate(field(y_col), Y_COLUMN, line)?,
            });
        }

        Self::from_points(points)
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Point> {
        self.index.get(id).map(|&i| &self.points[i])
    }
}

fn resolve_columns(headers: &csv::StringRecord) -> Result<[usize; 3]> {
    let find = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
    let wanted = [ID_COLUMN, X_COLUMN, Y_COLUMN];
    let found = wanted.map(find);

    let missing: Vec<&'static str> = wanted
        .iter()
        .zip(found.iter())
        .filter(|(_, f)| f.is_none())
        .map(|(name, _)| *name)
        .collect();
    if !missing.is_empty() {
        return Err(Error::Schema { missing });
    }
    Ok(found.map(|f| f.unwrap_or_default()))
}

fn parse_coordinate(raw: &str, column: &str, line: u64) -> Result<f64> {
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(Error::parse(line, format!("{column} value {raw:?} is not a finite number"))),
    }
}
