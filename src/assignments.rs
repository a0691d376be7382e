use serde::Serialize;
use std::collections::HashMap;

use crate::color::ColorHex;
use crate::palette::{GroupRow, PaletteTable, RowId};
use crate::points::PointSet;

/// Snapshot of the group a point was painted with.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Assignment {
    pub row: RowId,
    pub group: String,
    pub custom_label: String,
    pub color: ColorHex,
}

impl Assignment {
    fn snapshot(row: &GroupRow) -> Self {
        Self {
            row: row.id,
            group: row.name.clone(),
            custom_label: row.custom_label.clone(),
            color: row.color.clone(),
        }
    }
}

/// Point id → assignment. Entries for ids missing from the current point set
/// are kept but never read, since lookups always go through the point set.
#[derive(Clone, Debug, Default)]
pub struct AssignmentStore {
    entries: HashMap<String, Assignment>,
}

impl AssignmentStore {
    pub fn get(&self, id: &str) -> Option<&Assignment> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Paint every selected id that exists in `points` with `group`,
    /// replacing whatever it had before. Returns how many ids were painted.
    pub fn assign<'a, I>(&mut self, selected: I, points: &PointSet, group: &GroupRow) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut painted = 0;
        for id in selected {
            if !points.contains(id) {
                continue;
            }
            self.entries.insert(id.to_string(), Assignment::snapshot(group));
            painted += 1;
        }
        painted
    }

    /// Bring every assignment up to date with its row's current name, label
    /// and color. An assignment whose row was deleted is re-joined by group
    /// name to whichever row now carries it; with no such row it keeps its
    /// last snapshot.
    pub fn refresh_from(&mut self, palette: &PaletteTable) -> usize {
        let mut changed = 0;
        for assignment in self.entries.values_mut() {
            let Some(row) = palette
                .row(assignment.row)
                .or_else(|| palette.row_by_name(&assignment.group))
            else {
                continue;
            };
            let fresh = Assignment::snapshot(row);
            if *assignment != fresh {
                *assignment = fresh;
                changed += 1;
            }
        }
        changed
    }

    /// Number of current points painted with each row.
    pub fn counts_by_row(&self, points: &PointSet) -> HashMap<RowId, usize> {
        let mut counts = HashMap::new();
        for p in points.points() {
            if let Some(a) = self.entries.get(&p.id) {
                *counts.entry(a.row).or_default() += 1;
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::{PaletteEdit, PaletteScheme};

    fn points() -> PointSet {
        PointSet::from_csv("Cell_ID,X,Y\nA,0,0\nB,10,0\nC,10,10\n", true).unwrap()
    }

    #[test]
    fn assign_ignores_unknown_ids() {
        let palette = PaletteTable::default();
        let mut store = AssignmentStore::default();
        let n = store.assign(["A", "Z"], &points(), &palette.rows()[0]);
        assert_eq!(n, 1);
        assert!(store.get("Z").is_none());
        assert_eq!(store.get("A").unwrap().group, "Group 1");
    }

    #[test]
    fn reassigning_overwrites() {
        let palette = PaletteTable::default();
        let mut store = AssignmentStore::default();
        let pts = points();
        store.assign(["A", "B"], &pts, &palette.rows()[0]);
        store.assign(["B"], &pts, &palette.rows()[4]);
        assert_eq!(store.get("A").unwrap().group, "Group 1");
        assert_eq!(store.get("B").unwrap().group, "Group 5");
        assert_eq!(store.get("B").unwrap().color.as_str(), "#59A14F");
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn refresh_follows_row_identity_through_rename_and_scheme_swap() {
        let mut palette = PaletteTable::default();
        let mut store = AssignmentStore::default();
        let row = palette.rows()[2].id;
        store.assign(["C"], &points(), &palette.rows()[2]);

        palette.apply(PaletteEdit::Rename { row, name: "Tumor".into() });
        palette.apply(PaletteEdit::SwitchScheme(PaletteScheme::Set3));
        assert_eq!(store.refresh_from(&palette), 1);

        let a = store.get("C").unwrap();
        assert_eq!(a.group, "Tumor");
        assert_eq!(a.color.as_str(), "#BEBADA");
    }

    #[test]
    fn assignments_to_deleted_rows_keep_their_snapshot() {
        let mut palette = PaletteTable::default();
        let mut store = AssignmentStore::default();
        let row = palette.rows()[0].id;
        store.assign(["A"], &points(), &palette.rows()[0]);
        palette.apply(PaletteEdit::DeleteRow(row));
        palette.apply(PaletteEdit::SwitchScheme(PaletteScheme::Paired));
        assert_eq!(store.refresh_from(&palette), 0);
        assert_eq!(store.get("A").unwrap().color.as_str(), "#4E79A7");
    }

    #[test]
    fn orphaned_assignments_rejoin_a_row_that_takes_their_name() {
        let mut palette = PaletteTable::default();
        let mut store = AssignmentStore::default();
        let dead = palette.rows()[0].id;
        let heir = palette.rows()[3].id;
        store.assign(["A"], &points(), &palette.rows()[0]);

        palette.apply(PaletteEdit::DeleteRow(dead));
        palette.apply(PaletteEdit::Rename { row: heir, name: "Group 1".into() });
        palette.apply(PaletteEdit::SwitchScheme(PaletteScheme::Set3));
        assert_eq!(store.refresh_from(&palette), 1);

        let a = store.get("A").unwrap();
        assert_eq!(a.row, heir);
        assert_eq!(a.color, palette.row(heir).unwrap().color);
    }

    #[test]
    fn counts_only_current_points() {
        let palette = PaletteTable::default();
        let mut store = AssignmentStore::default();
        store.assign(["A", "B", "C"], &points(), &palette.rows()[1]);
        let reloaded = PointSet::from_csv("Cell_ID,X,Y\nA,0,0\n", true).unwrap();
        let counts = store.counts_by_row(&reloaded);
        assert_eq!(counts.get(&palette.rows()[1].id), Some(&1));
    }
}
