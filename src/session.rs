//! One painting session: the four independent pieces of state and the
//! commands that move them forward.

use log::{info, warn};

use crate::assignments::AssignmentStore;
use crate::error::{Error, Result};
use crate::export::{self, ExportRow};
use crate::figure::{self, Scene};
use crate::palette::{PaletteEdit, PaletteTable};
use crate::points::PointSet;
use crate::selection;
use crate::settings::ViewSettings;
use crate::viewport::OverlayImage;

#[derive(Clone, Debug, Default)]
pub struct Session {
    points: PointSet,
    palette: PaletteTable,
    assignments: AssignmentStore,
    overlay: Option<OverlayImage>,
    settings: ViewSettings,
}

impl Session {
    pub fn new(settings: ViewSettings) -> Self {
        let mut session = Self {
            palette: PaletteTable::new(settings.palette_scheme),
            ..Self::default()
        };
        session.on_settings_changed(settings);
        session
    }

    pub fn points(&self) -> &PointSet {
        &self.points
    }

    pub fn palette(&self) -> &PaletteTable {
        &self.palette
    }

    pub fn assignments(&self) -> &AssignmentStore {
        &self.assignments
    }

    pub fn overlay(&self) -> Option<&OverlayImage> {
        self.overlay.as_ref()
    }

    pub fn settings(&self) -> &ViewSettings {
        &self.settings
    }

    /// Replace the point set. On failure the previous points stay loaded.
    pub fn on_csv_loaded(&mut self, text: &str, has_header: bool) -> Result<usize> {
        let points = PointSet::from_csv(text, has_header).inspect_err(|e| {
            warn!("CSV rejected: {e}");
        })?;
        info!("loaded {} points", points.len());
        self.points = points;
        Ok(self.points.len())
    }

    /// Paint the selected ids with the active group.
    pub fn on_selection_made<'a, I>(&mut self, selected: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'a str>,
    {
        match selection::reconcile(&mut self.assignments, &self.points, &self.palette, selected) {
            Ok(n) => {
                info!("painted {n} points");
                Ok(n)
            }
            Err(e) => {
                warn!("selection discarded: {e}");
                Err(e)
            }
        }
    }

    /// Apply a palette edit and carry it into existing assignments.
    pub fn on_palette_edited(&mut self, edit: PaletteEdit) -> bool {
        if let PaletteEdit::SwitchScheme(scheme) = &edit {
            self.settings.palette_scheme = *scheme;
        }
        let applied = self.palette.apply(edit);
        if !applied {
            warn!("palette edit referenced an unknown row");
            return false;
        }
        let refreshed = self.assignments.refresh_from(&self.palette);
        if refreshed > 0 {
            info!("palette edit updated {refreshed} assignments");
        }
        self.settings.active_group_row = self
            .palette
            .active_row()
            .and_then(|row| self.palette.position(row.id));
        true
    }

    /// Decode an overlay just far enough to know its size. A bad image leaves
    /// the previous overlay in place.
    pub fn on_image_loaded(&mut self, source_ref: &str, bytes: &[u8]) -> Result<()> {
        let image = OverlayImage::decode(source_ref, bytes).inspect_err(|e| {
            warn!("image {source_ref} rejected: {e}");
        })?;
        info!(
            "overlay {} is {}x{}",
            image.source_ref, image.natural_width, image.natural_height
        );
        self.overlay = Some(image);
        Ok(())
    }

    pub fn clear_image(&mut self) {
        self.overlay = None;
    }

    pub fn on_settings_changed(&mut self, settings: ViewSettings) {
        let settings = settings.sanitized();
        if settings.palette_scheme != self.palette.scheme() {
            self.on_palette_edited(PaletteEdit::SwitchScheme(settings.palette_scheme));
        }
        let current = self.palette.active_row().map(|row| row.id);
        let edit = match settings.active_group_row {
            // Indices past the end of the table are ignored.
            Some(i) => self
                .palette
                .rows()
                .get(i)
                .filter(|row| Some(row.id) != current)
                .map(|row| PaletteEdit::SetActive { row: row.id, active: true }),
            None => current.map(|row| PaletteEdit::SetActive { row, active: false }),
        };
        if let Some(edit) = edit {
            self.on_palette_edited(edit);
        }
        let active_group_row = self.settings.active_group_row;
        self.settings = ViewSettings {
            active_group_row,
            ..settings
        };
    }

    pub fn scene(&self) -> Scene {
        figure::assemble(&self.points, &self.assignments, self.overlay.as_ref(), &self.settings)
    }

    pub fn export_rows(&self) -> Result<Vec<ExportRow>> {
        export::project(&self.points, &self.assignments, &self.palette)
    }

    pub fn export_csv(&self) -> Result<String> {
        let rows = self.export_rows().inspect_err(|e| {
            if matches!(e, Error::EmptyExport) {
                info!("export withheld: no points loaded");
            }
        })?;
        export::to_csv_string(&rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::PaletteScheme;

    const CSV: &str = "Cell_ID,X,Y\nA,0,0\nB,10,0\nC,10,10\n";

    fn activate(session: &mut Session, index: usize) {
        let row = session.palette().rows()[index].id;
        session.on_palette_edited(PaletteEdit::SetActive { row, active: true });
    }

    #[test]
    fn failed_load_keeps_previous_points() {
        let mut session = Session::default();
        session.on_csv_loaded(CSV, true).unwrap();
        activate(&mut session, 1);
        session.on_selection_made(["B"]).unwrap();
        let points = session.points().points().to_vec();
        let rows = session.palette().rows().to_vec();
        let painted = session.assignments().get("B").cloned();

        assert!(matches!(
            session.on_csv_loaded("Cell_ID,X\nA,1\n", true),
            Err(Error::Schema { .. })
        ));
        assert!(matches!(
            session.on_csv_loaded("Cell_ID,X,Y\nZ,one,1\n", true),
            Err(Error::Parse { .. })
        ));
        assert_eq!(session.points().points(), points.as_slice());
        assert_eq!(session.palette().rows(), rows.as_slice());
        assert_eq!(session.assignments().get("B").cloned(), painted);
        assert_eq!(session.assignments().len(), 1);
    }

    #[test]
    fn selection_without_active_group_changes_nothing() {
        let mut session = Session::default();
        session.on_csv_loaded(CSV, true).unwrap();
        assert!(matches!(session.on_selection_made(["A"]), Err(Error::NoActiveGroup)));
        assert!(session.assignments().is_empty());
    }

    #[test]
    fn scheme_switch_recolors_existing_assignments() {
        let mut session = Session::default();
        session.on_csv_loaded(CSV, true).unwrap();
        activate(&mut session, 2);
        session.on_selection_made(["A", "B"]).unwrap();

        session.on_palette_edited(PaletteEdit::SwitchScheme(PaletteScheme::Paired));
        let a = session.assignments().get("A").unwrap();
        assert_eq!(a.group, "Group 3");
        assert_eq!(a.color.as_str(), "#B2DF8A");
        assert_eq!(session.settings().palette_scheme, PaletteScheme::Paired);
    }

    #[test]
    fn reloading_points_keeps_matching_assignments() {
        let mut session = Session::default();
        session.on_csv_loaded(CSV, true).unwrap();
        activate(&mut session, 0);
        session.on_selection_made(["A", "C"]).unwrap();

        session.on_csv_loaded("Cell_ID,X,Y\nA,1,1\nD,2,2\n", true).unwrap();
        let rows = session.export_rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].group, "Group 1");
        assert_eq!(rows[1].group, "");
    }

    #[test]
    fn settings_can_pick_the_active_row() {
        let settings = ViewSettings {
            palette_scheme: PaletteScheme::Set3,
            active_group_row: Some(4),
            ..ViewSettings::default()
        };
        let session = Session::new(settings);
        let active = session.palette().active_row().unwrap();
        assert_eq!(active.name, "Group 5");
        assert_eq!(active.color.as_str(), "#80B1D3");
        assert_eq!(session.settings().active_group_row, Some(4));
    }

    #[test]
    fn active_row_index_tracks_palette_edits() {
        let mut session = Session::default();
        activate(&mut session, 6);
        assert_eq!(session.settings().active_group_row, Some(6));
        let row = session.palette().rows()[0].id;
        session.on_palette_edited(PaletteEdit::DeleteRow(row));
        assert_eq!(session.settings().active_group_row, Some(5));
    }

    #[test]
    fn out_of_range_active_row_is_ignored() {
        let mut session = Session::default();
        activate(&mut session, 2);
        let settings = ViewSettings {
            active_group_row: Some(99),
            ..session.settings().clone()
        };
        session.on_settings_changed(settings);
        assert_eq!(session.palette().active_row().map(|r| r.name.as_str()), Some("Group 3"));
        assert_eq!(session.settings().active_group_row, Some(2));

        let cleared = ViewSettings {
            active_group_row: None,
            ..session.settings().clone()
        };
        session.on_settings_changed(cleared);
        assert!(session.palette().active_row().is_none());
    }

    #[test]
    fn orphaned_assignment_follows_the_row_that_takes_its_name() {
        let mut session = Session::default();
        session.on_csv_loaded(CSV, true).unwrap();
        activate(&mut session, 0);
        session.on_selection_made(["A"]).unwrap();

        let first = session.palette().rows()[0].id;
        session.on_palette_edited(PaletteEdit::DeleteRow(first));
        let heir = session.palette().rows()[4].id;
        session.on_palette_edited(PaletteEdit::Rename { row: heir, name: "Group 1".into() });
        session.on_palette_edited(PaletteEdit::SetCustomLabel { row: heir, label: "Other".into() });
        session.on_palette_edited(PaletteEdit::SwitchScheme(PaletteScheme::Set3));

        let heir_color = session.palette().row(heir).unwrap().color.as_str().to_string();
        let rows = session.export_rows().unwrap();
        assert_eq!(rows[0].group, "Group 1");
        assert_eq!(rows[0].custom_label, "Other");
        assert_eq!(rows[0].color, heir_color);
        assert_eq!(rows[0].color, "#80B1D3");
    }

    #[test]
    fn bad_image_keeps_previous_overlay() {
        let mut session = Session::default();
        assert!(session.on_image_loaded("junk.png", b"nope").is_err());
        assert!(session.overlay().is_none());
    }

    #[test]
    fn export_without_points_is_withheld() {
        assert!(matches!(Session::default().export_csv(), Err(Error::EmptyExport)));
    }
}
