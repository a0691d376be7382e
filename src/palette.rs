//! Group table and the named color schemes it is painted from.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::color::ColorHex;

pub const DEFAULT_GROUPS: usize = 10;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaletteScheme {
    Set3,
    Paired,
    #[default]
    Tableau10,
}

impl PaletteScheme {
    pub const ALL: [PaletteScheme; 3] = [
        PaletteScheme::Set3,
        PaletteScheme::Paired,
        PaletteScheme::Tableau10,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PaletteScheme::Set3 => "Set3",
            PaletteScheme::Paired => "Paired",
            PaletteScheme::Tableau10 => "Tableau10",
        }
    }

    pub fn colors(self) -> &'static [&'static str] {
        match self {
            PaletteScheme::Set3 => &[
                "#8DD3C7", "#FFFFB3", "#BEBADA", "#FB8072", "#80B1D3", "#FDB462", "#B3DE69",
                "#FCCDE5", "#D9D9D9", "#BC80BD",
            ],
            PaletteScheme::Paired => &[
                "#A6CEE3", "#1F78B4", "#B2DF8A", "#33A02C", "#FB9A99", "#E31A1C", "#FDBF6F",
                "#FF7F00", "#CAB2D6", "#6A3D9A",
            ],
            PaletteScheme::Tableau10 => &[
                "#4E79A7", "#F28E2B", "#E15759", "#76B7B2", "#59A14F", "#EDC948", "#B07AA1",
                "#FF9DA7", "#9C755F", "#BAB0AC",
            ],
        }
    }

    /// Color for row `index`, wrapping when the table outgrows the scheme.
    pub fn color_at(self, index: usize) -> ColorHex {
        let colors = self.colors();
        ColorHex::parse(colors[index % colors.len()]).unwrap_or_else(ColorHex::unassigned)
    }
}

impl fmt::Display for PaletteScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PaletteScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaletteScheme::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown palette {s:?} (expected Set3, Paired or Tableau10)"))
    }
}

/// Identity of a row that survives renames, recolors and reordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RowId(pub u64);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroupRow {
    pub id: RowId,
    pub name: String,
    pub custom_label: String,
    pub color: ColorHex,
    pub active: bool,
}

#[derive(Clone, Debug)]
pub enum PaletteEdit {
    AddRow,
    DeleteRow(RowId),
    Rename { row: RowId, name: String },
    SetCustomLabel { row: RowId, label: String },
    SetColor { row: RowId, color: ColorHex },
    SetActive { row: RowId, active: bool },
    SwitchScheme(PaletteScheme),
    /// Whole-table replacement as produced by an editable grid. Rows carrying
    /// an id the table does not know get a fresh one.
    ReplaceRows(Vec<GroupRow>),
}

#[derive(Clone, Debug)]
pub struct PaletteTable {
    scheme: PaletteScheme,
    rows: Vec<GroupRow>,
    next_id: u64,
    last_activated: Option<RowId>,
}

impl Default for PaletteTable {
    fn default() -> Self {
        Self::new(PaletteScheme::default())
    }
}

impl PaletteTable {
    pub fn new(scheme: PaletteScheme) -> Self {
        let mut table = Self {
            scheme,
            rows: Vec::with_capacity(DEFAULT_GROUPS),
            next_id: 0,
            last_activated: None,
        };
        for _ in 0..DEFAULT_GROUPS {
            table.push_row();
        }
        table
    }

    pub fn scheme(&self) -> PaletteScheme {
        self.scheme
    }

    pub fn rows(&self) -> &[GroupRow] {
        &self.rows
    }

    pub fn row(&self, id: RowId) -> Option<&GroupRow> {
        self.rows.iter().find(|r| r.id == id)
    }

    pub fn row_by_name(&self, name: &str) -> Option<&GroupRow> {
        self.rows.iter().find(|r| r.name == name)
    }

    pub fn position(&self, id: RowId) -> Option<usize> {
        self.rows.iter().position(|r| r.id == id)
    }

    pub fn active_row(&self) -> Option<&GroupRow> {
        self.rows.iter().find(|r| r.active)
    }

    /// Apply one edit and restore the single-active invariant.
    /// Returns false when the edit referenced a row that does not exist.
    pub fn apply(&mut self, edit: PaletteEdit) -> bool {
        let applied = match edit {
            PaletteEdit::AddRow => {
                self.push_row();
                true
            }
            PaletteEdit::DeleteRow(id) => {
                let before = self.rows.len();
                self.rows.retain(|r| r.id != id);
                self.rows.len() != before
            }
            PaletteEdit::Rename { row, name } => self.with_row(row, |r| r.name = name),
            PaletteEdit::SetCustomLabel { row, label } => {
                self.with_row(row, |r| r.custom_label = label)
            }
            PaletteEdit::SetColor { row, color } => self.with_row(row, |r| r.color = color),
            PaletteEdit::SetActive { row, active } => {
                let found = self.with_row(row, |r| r.active = active);
                if found && active {
                    self.last_activated = Some(row);
                }
                found
            }
            PaletteEdit::SwitchScheme(scheme) => {
                self.scheme = scheme;
                for (i, row) in self.rows.iter_mut().enumerate() {
                    row.color = scheme.color_at(i);
                }
                true
            }
            PaletteEdit::ReplaceRows(rows) => {
                self.replace_rows(rows);
                true
            }
        };
        self.enforce_single_active();
        applied
    }

    fn with_row(&mut self, id: RowId, f: impl FnOnce(&mut GroupRow)) -> bool {
        match self.rows.iter_mut().find(|r| r.id == id) {
            Some(row) => {
                f(row);
                true
            }
            None => false,
        }
    }

    fn fresh_id(&mut self) -> RowId {
        let id = RowId(self.next_id);
        self.next_id += 1;
        id
    }

    fn push_row(&mut self) {
        let mut n = self.rows.len() + 1;
        while self.row_by_name(&format!("Group {n}")).is_some() {
            n += 1;
        }
        let id = self.fresh_id();
        let color = self.scheme.color_at(self.rows.len());
        self.rows.push(GroupRow {
            id,
            name: format!("Group {n}"),
            custom_label: String::new(),
            color,
            active: false,
        });
    }

    fn replace_rows(&mut self, rows: Vec<GroupRow>) {
        let previously_active: HashSet<RowId> =
            self.rows.iter().filter(|r| r.active).map(|r| r.id).collect();
        let known: HashSet<RowId> = self.rows.iter().map(|r| r.id).collect();

        let mut seen = HashSet::new();
        let mut new_rows = Vec::with_capacity(rows.len());
        for mut row in rows {
            if !known.contains(&row.id) || !seen.insert(row.id) {
                row.id = self.fresh_id();
            }
            new_rows.push(row);
        }

        if let Some(newest) = new_rows
            .iter()
            .filter(|r| r.active && !previously_active.contains(&r.id))
            .map(|r| r.id)
            .last()
        {
            self.last_activated = Some(newest);
        }
        self.rows = new_rows;
    }

    /// At most one row stays active; the most recently activated one wins.
    fn enforce_single_active(&mut self) {
        let active: Vec<RowId> = self.rows.iter().filter(|r| r.active).map(|r| r.id).collect();
        let keep = match active.as_slice() {
            [] => None,
            [only] => Some(*only),
            [.., last] => Some(
                self.last_activated
                    .filter(|id| active.contains(id))
                    .unwrap_or(*last),
            ),
        };
        if active.len() > 1 {
            log::debug!("palette had {} active rows, keeping {:?}", active.len(), keep);
            for row in &mut self.rows {
                row.active = Some(row.id) == keep;
            }
        }
        self.last_activated = keep;
    }
}
