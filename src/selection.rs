//! Turning spatial gestures into point ids and ids into assignments.

use crate::assignments::AssignmentStore;
use crate::error::{Error, Result};
use crate::palette::PaletteTable;
use crate::points::PointSet;

/// A selection gesture in data-space coordinates.
#[derive(Clone, Debug, PartialEq)]
pub enum Gesture {
    Box { corner_a: (f64, f64), corner_b: (f64, f64) },
    Lasso(Vec<(f64, f64)>),
}

impl Gesture {
    pub fn contains(&self, x: f64, y: f64) -> bool {
        match self {
            Gesture::Box { corner_a, corner_b } => {
                let (x_lo, x_hi) = (corner_a.0.min(corner_b.0), corner_a.0.max(corner_b.0));
                let (y_lo, y_hi) = (corner_a.1.min(corner_b.1), corner_a.1.max(corner_b.1));
                x >= x_lo && x <= x_hi && y >= y_lo && y <= y_hi
            }
            Gesture::Lasso(vertices) => polygon_contains(vertices, x, y),
        }
    }

    /// Ids of the points inside the gesture, in point-set order.
    pub fn select(&self, points: &PointSet) -> Vec<String> {
        points
            .points()
            .iter()
            .filter(|p| self.contains(p.x, p.y))
            .map(|p| p.id.clone())
            .collect()
    }
}

/// Even-odd ray cast; the lasso is implicitly closed.
fn polygon_contains(vertices: &[(f64, f64)], x: f64, y: f64) -> bool {
    if vertices.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = vertices.len() - 1;
    for i in 0..vertices.len() {
        let (xi, yi) = vertices[i];
        let (xj, yj) = vertices[j];
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Paint `selected` with the palette's active group.
///
/// Fails with [`Error::NoActiveGroup`] and leaves the store untouched when no
/// row is active.
pub fn reconcile<'a, I>(
    store: &mut AssignmentStore,
    points: &PointSet,
    palette: &PaletteTable,
    selected: I,
) -> Result<usize>
where
    I: IntoIterator<Item = &'a str>,
{
    let group = palette.active_row().ok_or(Error::NoActiveGroup)?;
    Ok(store.assign(selected, points, group))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::PaletteEdit;

    fn grid() -> PointSet {
        PointSet::from_csv("Cell_ID,X,Y\nA,0,0\nB,10,0\nC,10,10\nD,5,5\n", true).unwrap()
    }

    #[test]
    fn box_selection_is_corner_order_independent() {
        let a = Gesture::Box { corner_a: (-1.0, -1.0), corner_b: (11.0, 1.0) };
        let b = Gesture::Box { corner_a: (11.0, 1.0), corner_b: (-1.0, -1.0) };
        assert_eq!(a.select(&grid()), vec!["A", "B"]);
        assert_eq!(a.select(&grid()), b.select(&grid()));
    }

    #[test]
    fn lasso_selects_points_inside_the_polygon() {
        let square = Gesture::Lasso(vec![(-1.0, -1.0), (11.0, -1.0), (11.0, 11.0), (-1.0, 11.0)]);
        assert_eq!(square.select(&grid()), vec!["A", "B", "C", "D"]);

        let small = Gesture::Lasso(vec![(4.0, 4.0), (6.0, 4.0), (6.0, 6.0), (4.0, 6.0)]);
        assert_eq!(small.select(&grid()), vec!["D"]);
    }

    #[test]
    fn degenerate_lasso_selects_nothing() {
        let line = Gesture::Lasso(vec![(0.0, 0.0), (10.0, 10.0)]);
        assert!(line.select(&grid()).is_empty());
    }

    #[test]
    fn reconcile_without_active_group_is_refused() {
        let mut store = AssignmentStore::default();
        let palette = PaletteTable::default();
        let err = reconcile(&mut store, &grid(), &palette, ["A"]).unwrap_err();
        assert!(matches!(err, Error::NoActiveGroup));
        assert!(store.is_empty());
    }

    #[test]
    fn reconcile_uses_the_active_group() {
        let mut store = AssignmentStore::default();
        let mut palette = PaletteTable::default();
        let row = palette.rows()[3].id;
        palette.apply(PaletteEdit::SetActive { row, active: true });
        let n = reconcile(&mut store, &grid(), &palette, ["A", "D"]).unwrap();
        assert_eq!(n, 2);
        assert_eq!(store.get("D").unwrap().row, row);
        assert!(store.get("B").is_none());
    }
}
