use eframe::egui;
use egui_extras::{Column, TableBuilder};
use image::DynamicImage;
use log::{info, warn};
use std::collections::HashMap;
use std::path::Path;

use spot_painter::export::EXPORT_FILE_NAME;
use spot_painter::settings::{IMAGE_SCALE_RANGE, POINT_SIZE_RANGE};
use spot_painter::{
    ColorHex, Error, Gesture, PaletteEdit, PaletteScheme, RowId, Scene, Session, ViewSettings,
    ViewportBox,
};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tif", "tiff", "webp", "gif"];

fn to_color32(c: &ColorHex) -> egui::Color32 {
    let [r, g, b] = c.to_rgb();
    egui::Color32::from_rgb(r, g, b)
}

fn decode_pixels(bytes: &[u8]) -> Option<DynamicImage> {
    image::load_from_memory(bytes)
        .inspect_err(|e| warn!("overlay pixels unavailable: {e}"))
        .ok()
}

fn swatch(ui: &mut egui::Ui, color: egui::Color32) {
    let (rect, _) = ui.allocate_exact_size(egui::vec2(12.0, 12.0), egui::Sense::hover());
    ui.painter().rect_filled(rect, 1.0, color);
}

// ── Tool / Interaction State ────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq)]
enum Tool {
    Lasso,
    Box,
}

#[derive(Clone, Debug)]
enum DragState {
    None,
    Lasso { path: Vec<egui::Pos2> },
    Box { start: egui::Pos2 },
}

/// Data space ↔ screen space for one frame. Y grows upwards in data space.
#[derive(Clone, Copy, Debug)]
struct Projection {
    origin: egui::Pos2,
    center: (f64, f64),
    scale: f64,
}

impl Projection {
    fn new(canvas_rect: egui::Rect, frame: &ViewportBox, pan: egui::Vec2, zoom: f32) -> Self {
        // Same factor on both axes keeps the data undistorted.
        let fit = (f64::from(canvas_rect.width()) / frame.width())
            .min(f64::from(canvas_rect.height()) / frame.height());
        Self {
            origin: canvas_rect.center() + pan,
            center: (
                (frame.x_min + frame.x_max) / 2.0,
                (frame.y_min + frame.y_max) / 2.0,
            ),
            scale: fit * f64::from(zoom),
        }
    }

    fn to_screen(self, x: f64, y: f64) -> egui::Pos2 {
        self.origin
            + egui::vec2(
                ((x - self.center.0) * self.scale) as f32,
                (-(y - self.center.1) * self.scale) as f32,
            )
    }

    fn to_data(self, p: egui::Pos2) -> (f64, f64) {
        let rel = p - self.origin;
        (
            f64::from(rel.x) / self.scale + self.center.0,
            -f64::from(rel.y) / self.scale + self.center.1,
        )
    }
}

// ── App ─────────────────────────────────────────────────────────────────────

pub struct PainterApp {
    session: Session,
    has_header: bool,

    texture: Option<egui::TextureHandle>,
    raw_image: Option<DynamicImage>,

    tool: Tool,
    drag: DragState,
    status: String,

    // pan & zoom
    pan: egui::Vec2,
    zoom: f32,
    panning: bool,
}

impl PainterApp {
    pub fn new(session: Session, has_header: bool, overlay_bytes: Option<&[u8]>) -> Self {
        let raw_image = overlay_bytes.and_then(decode_pixels);
        Self {
            session,
            has_header,
            texture: None,
            raw_image,
            tool: Tool::Lasso,
            drag: DragState::None,
            status: String::new(),
            pan: egui::Vec2::ZERO,
            zoom: 1.0,
            panning: false,
        }
    }

    fn load_csv(&mut self, path: &Path) {
        let result = std::fs::read_to_string(path)
            .map_err(Error::from)
            .and_then(|text| self.session.on_csv_loaded(&text, self.has_header));
        match result {
            Ok(n) => {
                self.status = format!("Loaded {n} spots from {}", path.display());
                self.pan = egui::Vec2::ZERO;
                self.zoom = 1.0;
            }
            Err(e) => self.status = format!("CSV error: {e}"),
        }
    }

    fn load_image(&mut self, path: &Path) {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                self.status = format!("Image error: {e}");
                return;
            }
        };
        if let Err(e) = self.session.on_image_loaded(&path.display().to_string(), &bytes) {
            self.status = format!("Image error: {e}");
            return;
        }
        self.raw_image = decode_pixels(&bytes);
        self.texture = None;
        self.status.clear();
    }

    fn clear_image(&mut self) {
        self.session.clear_image();
        self.raw_image = None;
        self.texture = None;
    }

    fn export(&mut self) {
        let csv = match self.session.export_csv() {
            Ok(csv) => csv,
            Err(Error::EmptyExport) => return,
            Err(e) => {
                self.status = format!("Export error: {e}");
                return;
            }
        };
        let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV", &["csv"])
            .set_file_name(EXPORT_FILE_NAME)
            .save_file()
        else {
            return;
        };
        match std::fs::write(&path, csv) {
            Ok(()) => {
                info!("exported to {}", path.display());
                self.status = format!("Exported to {}", path.display());
            }
            Err(e) => self.status = format!("Export error: {e}"),
        }
    }

    fn apply_settings(&mut self, settings: ViewSettings) {
        if &settings != self.session.settings() {
            self.session.on_settings_changed(settings);
        }
    }

    fn ensure_texture(&mut self, ctx: &egui::Context) {
        if self.texture.is_some() {
            return;
        }
        if let Some(ref img) = self.raw_image {
            let rgba = img.to_rgba8();
            let size = [rgba.width() as usize, rgba.height() as usize];
            let pixels = rgba.as_flat_samples();
            let color_image = egui::ColorImage::from_rgba_unmultiplied(size, pixels.as_slice());
            self.texture = Some(ctx.load_texture(
                "overlay",
                color_image,
                egui::TextureOptions::LINEAR,
            ));
        }
    }

    fn select(&mut self, gesture: Gesture) {
        let ids = gesture.select(self.session.points());
        if ids.is_empty() {
            return;
        }
        match self.session.on_selection_made(ids.iter().map(String::as_str)) {
            Ok(_) => self.status.clear(),
            Err(Error::NoActiveGroup) => {
                self.status = "Pick an active group before selecting spots".to_string();
            }
            Err(e) => self.status = e.to_string(),
        }
    }

    // ── Side panel ──────────────────────────────────────────────────────────

    fn controls(&mut self, ui: &mut egui::Ui) {
        ui.heading("1) Spots CSV");
        ui.horizontal(|ui| {
            if ui.button("Open CSV…").clicked() {
                if let Some(path) = rfd::FileDialog::new()
                    .add_filter("CSV", &["csv"])
                    .pick_file()
                {
                    self.load_csv(&path);
                }
            }
            ui.checkbox(&mut self.has_header, "CSV has header");
        });
        ui.label(format!("{} spots loaded", self.session.points().len()));

        ui.separator();
        ui.heading("2) Palette and groups");
        let current = self.session.palette().scheme();
        for scheme in PaletteScheme::ALL {
            ui.horizontal(|ui| {
                if ui.radio(current == scheme, scheme.name()).clicked() && current != scheme {
                    self.session.on_palette_edited(PaletteEdit::SwitchScheme(scheme));
                }
                for hex in scheme.colors() {
                    if let Some(c) = ColorHex::parse(hex) {
                        swatch(ui, to_color32(&c));
                    }
                }
            });
        }

        ui.add_space(6.0);
        for edit in self.groups_table(ui) {
            self.session.on_palette_edited(edit);
        }
        if ui.button("Add group").clicked() {
            self.session.on_palette_edited(PaletteEdit::AddRow);
        }

        ui.add_space(6.0);
        let mut settings = self.session.settings().clone();
        ui.add(
            egui::Slider::new(&mut settings.point_size, POINT_SIZE_RANGE.0..=POINT_SIZE_RANGE.1)
                .step_by(1.0)
                .text("Point size"),
        );
        self.apply_settings(settings);

        ui.separator();
        ui.heading("3) Background image (optional)");
        ui.horizontal(|ui| {
            if ui.button("Open image…").clicked() {
                if let Some(path) = rfd::FileDialog::new()
                    .add_filter("Image", IMAGE_EXTENSIONS)
                    .pick_file()
                {
                    self.load_image(&path);
                }
            }
            if self.session.overlay().is_some() && ui.button("Remove").clicked() {
                self.clear_image();
            }
        });
        if let Some(overlay) = self.session.overlay() {
            ui.label(format!(
                "{} ({}×{})",
                overlay.source_ref, overlay.natural_width, overlay.natural_height
            ));
        }

        ui.separator();
        let can_export = !self.session.points().is_empty();
        if ui.add_enabled(can_export, egui::Button::new("Export CSV")).clicked() {
            self.export();
        }
        if !self.status.is_empty() {
            ui.colored_label(egui::Color32::from_rgb(220, 20, 60), &self.status);
        }
    }

    /// Draw the editable group table and collect what the user changed.
    fn groups_table(&self, ui: &mut egui::Ui) -> Vec<PaletteEdit> {
        let rows = self.session.palette().rows().to_vec();
        let counts: HashMap<RowId, usize> =
            self.session.assignments().counts_by_row(self.session.points());
        let mut edits = Vec::new();

        TableBuilder::new(ui)
            .striped(true)
            .vscroll(false)
            .column(Column::exact(24.0))
            .column(Column::initial(110.0).resizable(true))
            .column(Column::initial(120.0).resizable(true))
            .column(Column::exact(40.0))
            .column(Column::exact(40.0))
            .column(Column::remainder())
            .header(20.0, |mut header| {
                for title in ["", "Group Name", "Custom Name", "Color", "Spots", ""] {
                    header.col(|ui| {
                        ui.strong(title);
                    });
                }
            })
            .body(|mut body| {
                for row in rows {
                    body.row(22.0, |mut table_row| {
                        table_row.col(|ui| {
                            if ui.radio(row.active, "").clicked() {
                                edits.push(PaletteEdit::SetActive {
                                    row: row.id,
                                    active: !row.active,
                                });
                            }
                        });
                        table_row.col(|ui| {
                            let mut name = row.name.clone();
                            if ui.text_edit_singleline(&mut name).changed() {
                                edits.push(PaletteEdit::Rename { row: row.id, name });
                            }
                        });
                        table_row.col(|ui| {
                            let mut label = row.custom_label.clone();
                            if ui.text_edit_singleline(&mut label).changed() {
                                edits.push(PaletteEdit::SetCustomLabel { row: row.id, label });
                            }
                        });
                        table_row.col(|ui| {
                            let mut rgb = row.color.to_rgb();
                            if ui.color_edit_button_srgb(&mut rgb).changed() {
                                edits.push(PaletteEdit::SetColor {
                                    row: row.id,
                                    color: ColorHex::from_rgb(rgb),
                                });
                            }
                        });
                        table_row.col(|ui| {
                            ui.label(counts.get(&row.id).copied().unwrap_or(0).to_string());
                        });
                        table_row.col(|ui| {
                            if ui.small_button("✖").on_hover_text("Delete group").clicked() {
                                edits.push(PaletteEdit::DeleteRow(row.id));
                            }
                        });
                    });
                }
            });
        edits
    }

    fn image_sliders(&mut self, ui: &mut egui::Ui) {
        let mut settings = self.session.settings().clone();
        ui.horizontal(|ui| {
            ui.add(
                egui::Slider::new(&mut settings.image_x_percent, 0.0..=100.0)
                    .step_by(1.0)
                    .text("Image X (%)"),
            );
            ui.add(
                egui::Slider::new(&mut settings.image_y_percent, 0.0..=100.0)
                    .step_by(1.0)
                    .text("Image Y (%)"),
            );
        });
        ui.horizontal(|ui| {
            ui.add(
                egui::Slider::new(&mut settings.image_scale, IMAGE_SCALE_RANGE.0..=IMAGE_SCALE_RANGE.1)
                    // A non-positive scale from a settings file hides the
                    // overlay; dragging still stays in range.
                    .clamping(egui::SliderClamping::Edits)
                    .step_by(0.01)
                    .text("Image scale"),
            );
            ui.add(
                egui::Slider::new(&mut settings.image_opacity, 0.0..=1.0)
                    .step_by(0.05)
                    .text("Image opacity"),
            );
        });
        self.apply_settings(settings);
    }

    // ── Canvas ──────────────────────────────────────────────────────────────

    fn draw_scene(&self, painter: &egui::Painter, proj: &Projection, scene: &Scene) {
        if let (Some(layer), Some(tex)) = (&scene.image, &self.texture) {
            let rect = egui::Rect::from_two_pos(
                proj.to_screen(layer.x_min(), layer.y_max()),
                proj.to_screen(layer.x_max(), layer.y_min()),
            );
            painter.image(
                tex.id(),
                rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE.gamma_multiply(layer.opacity as f32),
            );
        }

        let radius = scene.point_size / 2.0;
        for p in &scene.points {
            painter.circle_filled(proj.to_screen(p.x, p.y), radius, to_color32(&p.color));
        }

        let frame = &scene.frame;
        let frame_rect = egui::Rect::from_two_pos(
            proj.to_screen(frame.x_min, frame.y_max),
            proj.to_screen(frame.x_max, frame.y_min),
        );
        painter.rect_stroke(
            frame_rect,
            0.0,
            egui::Stroke::new(1.0, egui::Color32::from_gray(200)),
            egui::StrokeKind::Middle,
        );
    }

    fn hovered_point<'s>(
        &self,
        proj: &Projection,
        scene: &'s Scene,
        pos: egui::Pos2,
    ) -> Option<&'s str> {
        let reach = scene.point_size / 2.0 + 3.0;
        scene
            .points
            .iter()
            .map(|p| (p, proj.to_screen(p.x, p.y).distance(pos)))
            .filter(|(_, d)| *d <= reach)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(p, _)| p.hover.as_str())
    }

    fn draw_gesture_preview(&self, painter: &egui::Painter, current: Option<egui::Pos2>) {
        let stroke = egui::Stroke::new(1.5, egui::Color32::from_rgb(0, 120, 255));
        match &self.drag {
            DragState::Lasso { path } if path.len() > 1 => {
                painter.add(egui::Shape::closed_line(path.clone(), stroke));
            }
            DragState::Box { start } => {
                if let Some(current) = current {
                    painter.rect_stroke(
                        egui::Rect::from_two_pos(*start, current),
                        0.0,
                        stroke,
                        egui::StrokeKind::Middle,
                    );
                }
            }
            _ => {}
        }
    }

    fn finish_gesture(&mut self, proj: &Projection, end: Option<egui::Pos2>) {
        let gesture = match std::mem::replace(&mut self.drag, DragState::None) {
            DragState::Lasso { path } if path.len() >= 3 => {
                Gesture::Lasso(path.into_iter().map(|p| proj.to_data(p)).collect())
            }
            DragState::Box { start } => {
                let Some(end) = end else { return };
                if (end - start).length() < 3.0 {
                    return;
                }
                Gesture::Box {
                    corner_a: proj.to_data(start),
                    corner_b: proj.to_data(end),
                }
            }
            _ => return,
        };
        self.select(gesture);
    }
}

// ── eframe App impl ────────────────────────────────────────────────────────

impl eframe::App for PainterApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ensure_texture(ctx);

        // Keyboard shortcuts
        let (export, lasso, rect) = ctx.input(|i| {
            (
                i.modifiers.command && i.key_pressed(egui::Key::S),
                i.key_pressed(egui::Key::L),
                i.key_pressed(egui::Key::B),
            )
        });
        if export {
            self.export();
        }
        if !ctx.wants_keyboard_input() {
            if lasso {
                self.tool = Tool::Lasso;
            }
            if rect {
                self.tool = Tool::Box;
            }
        }

        egui::SidePanel::left("controls")
            .default_width(460.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| self.controls(ui));
            });

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.selectable_value(&mut self.tool, Tool::Lasso, "Lasso");
                ui.selectable_value(&mut self.tool, Tool::Box, "Box");
                ui.separator();
                if ui.button("Reset view").clicked() {
                    self.pan = egui::Vec2::ZERO;
                    self.zoom = 1.0;
                }
                ui.separator();
                ui.label(format!("Zoom: {:.0}%", self.zoom * 100.0));
                if let Some(active) = self.session.palette().active_row() {
                    ui.separator();
                    swatch(ui, to_color32(&active.color));
                    ui.label(format!("Painting with {}", active.name));
                }
            });
        });

        egui::TopBottomPanel::bottom("image_placement").show(ctx, |ui| self.image_sliders(ui));

        // Canvas
        egui::CentralPanel::default().show(ctx, |ui| {
            let (response, painter) =
                ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
            let canvas_rect = response.rect;
            painter.rect_filled(canvas_rect, 0.0, egui::Color32::WHITE);

            let scene = self.session.scene();
            let proj = Projection::new(canvas_rect, &scene.frame, self.pan, self.zoom);
            self.draw_scene(&painter, &proj, &scene);
            self.draw_gesture_preview(
                &painter,
                response.interact_pointer_pos().or(response.hover_pos()),
            );

            if let Some(pos) = response.hover_pos() {
                if matches!(self.drag, DragState::None) {
                    if let Some(text) = self.hovered_point(&proj, &scene, pos) {
                        response.clone().on_hover_text_at_pointer(text);
                    }
                }
            }

            // Handle pan (middle mouse button)
            let middle_down = ctx.input(|i| i.pointer.middle_down());
            if middle_down {
                let delta = ctx.input(|i| i.pointer.delta());
                self.pan += delta;
                self.panning = true;
            } else {
                self.panning = false;
            }

            // Handle zoom (scroll wheel)
            let scroll_delta = ctx.input(|i| i.smooth_scroll_delta.y);
            if scroll_delta != 0.0 && response.hovered() {
                let zoom_factor = 1.0 + scroll_delta * 0.002;
                let new_zoom = (self.zoom * zoom_factor).clamp(0.1, 20.0);
                if let Some(cursor) = response.hover_pos() {
                    let center = canvas_rect.center();
                    let cursor_rel = cursor - center - self.pan;
                    self.pan -= cursor_rel * (new_zoom / self.zoom - 1.0);
                }
                self.zoom = new_zoom;
            }

            // Selection gestures (primary button only, not while panning)
            if !self.panning {
                let pointer = response
                    .interact_pointer_pos()
                    .or(ctx.input(|i| i.pointer.latest_pos()));

                if response.drag_started_by(egui::PointerButton::Primary) {
                    if let Some(pos) = pointer {
                        self.drag = match self.tool {
                            Tool::Lasso => DragState::Lasso { path: vec![pos] },
                            Tool::Box => DragState::Box { start: pos },
                        };
                    }
                }

                if response.dragged_by(egui::PointerButton::Primary) {
                    if let (DragState::Lasso { path }, Some(pos)) = (&mut self.drag, pointer) {
                        if path.last().map_or(true, |last| last.distance(pos) > 2.0) {
                            path.push(pos);
                        }
                    }
                }

                if response.drag_stopped_by(egui::PointerButton::Primary) {
                    self.finish_gesture(&proj, pointer);
                }
            }
        });
    }
}
