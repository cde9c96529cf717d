//! The eframe application shell.
//!
//! Wires the annotation controller to the egui canvas, toolbar, and
//! properties panel, and drives the load/save round trips through the
//! remote bridge. A failed load is terminal for the session; a failed save
//! leaves the working state untouched for a retry.

use eframe::egui;
use tokio::runtime::Handle;

use crate::api::{AnnotationRecord, ApiClient, SaveRequest};
use crate::canvas::{self, CanvasView};
use crate::config::Config;
use crate::editor::{Cursor, EditorSession};
use crate::export;
use crate::model::{BoxId, FaultType};
use crate::remote::{DecodedImage, RemoteBridge, RemoteEvent};

pub struct AnnotateApp {
    job_id: u64,
    history_limit: usize,
    bridge: RemoteBridge,

    // load state; `session` existing means the editor is interactive
    record: Option<AnnotationRecord>,
    decoded: Option<DecodedImage>,
    load_error: Option<String>,

    texture: Option<egui::TextureHandle>,
    session: Option<EditorSession>,
    view: Option<CanvasView>,
    view_fitted: bool,
    annotation_id: Option<i64>,

    saving: bool,
    status: String,
}

impl AnnotateApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        config: Config,
        job_id: u64,
        image_path: String,
        runtime: Handle,
    ) -> anyhow::Result<Self> {
        let client = ApiClient::new(&config)?;
        let mut bridge = RemoteBridge::new(runtime, client, cc.egui_ctx.clone());

        tracing::info!(job_id, image = %image_path, "opening annotation editor");
        bridge.load_annotation(job_id);
        bridge.load_image(image_path);

        Ok(Self {
            job_id,
            history_limit: config.history_limit,
            bridge,
            record: None,
            decoded: None,
            load_error: None,
            texture: None,
            session: None,
            view: None,
            view_fitted: false,
            annotation_id: None,
            saving: false,
            status: "Loading annotation data...".into(),
        })
    }

    // ── Remote events ───────────────────────────────────────────────────────

    fn process_remote_events(&mut self) {
        while let Some(event) = self.bridge.poll() {
            match event {
                RemoteEvent::AnnotationLoaded(Ok(record)) => {
                    tracing::info!(
                        annotation_id = record.id,
                        boxes = record.boxes.len(),
                        "annotation record loaded"
                    );
                    self.record = Some(record);
                }
                RemoteEvent::AnnotationLoaded(Err(err)) => {
                    self.fail_load(format!("Failed to load annotation data: {err}"));
                }
                RemoteEvent::ImageLoaded(Ok(decoded)) => {
                    tracing::info!(
                        width = decoded.width,
                        height = decoded.height,
                        "analysis image loaded"
                    );
                    self.decoded = Some(decoded);
                }
                RemoteEvent::ImageLoaded(Err(err)) => {
                    self.fail_load(format!("Failed to load image: {err}"));
                }
                RemoteEvent::SaveFinished(Ok(())) => {
                    self.saving = false;
                    self.status = "Annotations saved. The boxed image has been updated.".into();
                    tracing::info!("annotation saved");
                }
                RemoteEvent::SaveFinished(Err(err)) => {
                    // working list and history stay untouched so the user can
                    // retry or keep editing
                    self.saving = false;
                    self.status = format!("Failed to save annotations: {err}");
                    tracing::error!(error = %err, "save failed");
                }
            }
        }
        self.try_enter_ready();
    }

    fn fail_load(&mut self, message: String) {
        tracing::error!("{message}");
        if self.load_error.is_none() {
            self.load_error = Some(message);
        }
        // a half-loaded session must never become interactive
        self.bridge.shutdown();
        self.record = None;
        self.decoded = None;
    }

    /// Interaction is enabled only once both the record and the image (with
    /// its native dimensions) have arrived.
    fn try_enter_ready(&mut self) {
        if self.session.is_some() || self.load_error.is_some() || self.record.is_none() {
            return;
        }
        let Some(decoded) = &self.decoded else {
            return;
        };
        let image_size = (decoded.width as f32, decoded.height as f32);

        if let Some(record) = self.record.take() {
            self.annotation_id = Some(record.id);
            self.session = Some(EditorSession::new(
                record.boxes,
                record.overall_comments,
                image_size,
                self.history_limit,
            ));
            self.view = Some(CanvasView::new(image_size));
            self.status = format!(
                "Loaded {} boxes. Drag on the image to draw a new box.",
                self.session.as_ref().map(|s| s.boxes().len()).unwrap_or(0)
            );
        }
    }

    // ── Actions ─────────────────────────────────────────────────────────────

    fn start_save(&mut self) {
        if self.saving {
            return;
        }
        let (Some(session), Some(annotation_id)) = (self.session.as_ref(), self.annotation_id)
        else {
            return;
        };

        let request = SaveRequest::new(session.boxes(), session.overall_comments());
        tracing::info!(annotation_id, boxes = request.boxes.len(), "saving annotation");
        self.saving = true;
        self.status = "Saving annotations...".into();
        self.bridge.save(annotation_id, request);
    }

    fn export_png(&mut self) {
        let (Some(session), Some(decoded)) = (self.session.as_ref(), self.decoded.as_ref())
        else {
            return;
        };
        let Some(rendered) = export::render_annotated(decoded, session.boxes()) else {
            self.status = "Export failed: image buffer mismatch".into();
            return;
        };

        let Some(path) = rfd::FileDialog::new()
            .add_filter("PNG", &["png"])
            .set_file_name(format!("job-{}-annotated.png", self.job_id))
            .save_file()
        else {
            return;
        };

        match rendered.save(&path) {
            Ok(()) => {
                self.status = format!("Exported to {}", path.display());
                tracing::info!(path = %path.display(), "exported annotated image");
            }
            Err(err) => {
                self.status = format!("Export failed: {err}");
                tracing::error!(error = %err, "export failed");
            }
        }
    }

    // ── UI ──────────────────────────────────────────────────────────────────

    fn toolbar_ui(&mut self, ui: &mut egui::Ui) {
        let mut want_save = false;
        let mut want_export = false;
        let ready = self.session.is_some();

        ui.horizontal_wrapped(|ui| {
            if let Some(session) = self.session.as_mut() {
                if ui
                    .add_enabled(session.can_undo(), egui::Button::new("Undo"))
                    .clicked()
                {
                    session.undo();
                }
                if ui
                    .add_enabled(session.can_redo(), egui::Button::new("Redo"))
                    .clicked()
                {
                    session.redo();
                }
                ui.separator();

                egui::ComboBox::from_id_salt("default-type")
                    .selected_text(session.default_type().label())
                    .show_ui(ui, |ui| {
                        let current = session.default_type_mut();
                        for fault_type in FaultType::ALL {
                            ui.selectable_value(current, fault_type, fault_type.label());
                        }
                    });

                let has_selection = session.selected_id().is_some();
                if ui
                    .add_enabled(has_selection, egui::Button::new("Delete"))
                    .clicked()
                {
                    session.delete_selected();
                }

                ui.add_enabled_ui(has_selection, |ui| {
                    egui::ComboBox::from_id_salt("retype")
                        .selected_text("Change Type")
                        .show_ui(ui, |ui| {
                            let selected_type = session.selected_box().map(|b| b.fault_type);
                            for fault_type in FaultType::ALL {
                                if ui
                                    .selectable_label(
                                        selected_type == Some(fault_type),
                                        fault_type.label(),
                                    )
                                    .clicked()
                                {
                                    session.retype_selected(fault_type);
                                }
                            }
                        });
                });

                ui.separator();
                ui.label(format!("{} boxes", session.boxes().len()));
                ui.colored_label(
                    canvas::USER_COLOR,
                    format!("{} user-added", session.user_added_count()),
                );
                ui.colored_label(
                    canvas::AI_COLOR,
                    format!("{} AI-generated", session.detected_count()),
                );
            }

            ui.separator();
            if ui
                .add_enabled(ready && !self.saving, egui::Button::new("Save Annotations"))
                .clicked()
            {
                want_save = true;
            }
            if ui
                .add_enabled(ready, egui::Button::new("Export PNG"))
                .clicked()
            {
                want_export = true;
            }
        });

        if want_save {
            self.start_save();
        }
        if want_export {
            self.export_png();
        }
    }

    fn properties_ui(&mut self, ui: &mut egui::Ui) {
        ui.heading("Annotation Properties");
        ui.separator();

        let Some(session) = self.session.as_mut() else {
            ui.label("Waiting for annotation data...");
            return;
        };

        if let Some(b) = session.selected_box() {
            let id = b.id;
            let rect = b.rect;
            let type_label = b.fault_type.label();
            let confidence = b.provenance.confidence();
            let user_added = b.is_user_added();
            let mut comments = b.comments.clone();

            ui.label(format!("Type: {type_label}"));
            ui.label(format!("Position: ({:.0}, {:.0})", rect.x, rect.y));
            ui.label(format!("Size: {:.0} x {:.0}", rect.width, rect.height));
            if let Some(confidence) = confidence {
                ui.label(format!("Confidence: {:.1}%", confidence * 100.0));
            }
            ui.label(format!(
                "Source: {}",
                if user_added { "User Added" } else { "AI Generated" }
            ));

            ui.label("Comments:");
            if ui
                .add(
                    egui::TextEdit::multiline(&mut comments)
                        .desired_rows(2)
                        .hint_text("Add comments for this annotation..."),
                )
                .changed()
            {
                session.set_comment(id, comments);
            }
        } else {
            ui.label("Click a box to select and edit it, or draw a new box on the image.");
        }

        ui.separator();
        ui.strong("All Annotations");
        let mut clicked: Option<BoxId> = None;
        egui::ScrollArea::vertical()
            .id_salt("box-list")
            .max_height(280.0)
            .show(ui, |ui| {
                for b in session.boxes() {
                    let selected = session.selected_id() == Some(b.id);
                    let source = if b.is_user_added() { "User" } else { "AI" };
                    let row = format!("{} | {} | {}", b.label(), source, b.action.as_str());
                    if ui.selectable_label(selected, row).clicked() {
                        clicked = Some(b.id);
                    }
                }
            });
        if let Some(id) = clicked {
            session.select(id);
        }

        ui.separator();
        ui.strong("Overall Comments");
        ui.add(
            egui::TextEdit::multiline(session.overall_comments_mut())
                .desired_rows(3)
                .hint_text("General comments about this annotation session..."),
        );
    }

    fn canvas_ui(&mut self, ui: &mut egui::Ui) {
        let (response, painter) =
            ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
        let canvas_rect = response.rect;
        let ctx = ui.ctx().clone();

        painter.rect_filled(canvas_rect, 0.0, egui::Color32::from_gray(40));

        if self.texture.is_none() {
            if let Some(decoded) = &self.decoded {
                let color_image = egui::ColorImage::from_rgba_unmultiplied(
                    [decoded.width as usize, decoded.height as usize],
                    &decoded.pixels,
                );
                self.texture =
                    Some(ctx.load_texture("analysis-image", color_image, egui::TextureOptions::LINEAR));
            }
        }

        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(view) = self.view.as_mut() else {
            return;
        };

        if !self.view_fitted {
            view.fit(canvas_rect);
            self.view_fitted = true;
        }

        if let Some(texture) = &self.texture {
            painter.image(
                texture.id(),
                view.image_rect_on_screen(canvas_rect),
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
        }

        canvas::draw_boxes(
            &painter,
            view,
            canvas_rect,
            session.boxes(),
            session.selected_id(),
        );
        if let Some(rect) = session.drawing_preview() {
            canvas::draw_preview(&painter, view, canvas_rect, &rect, session.default_type());
        }

        // middle-mouse pan and wheel zoom
        if ctx.input(|i| i.pointer.middle_down()) {
            view.pan += ctx.input(|i| i.pointer.delta());
        }
        let scroll_delta = ctx.input(|i| i.smooth_scroll_delta.y);
        if scroll_delta != 0.0 && response.hovered() {
            if let Some(cursor) = response.hover_pos() {
                view.zoom_at(canvas_rect, cursor, scroll_delta);
            }
        }

        // primary-button gestures feed the controller in image coordinates
        if response.drag_started_by(egui::PointerButton::Primary) {
            if let Some(pos) = response.interact_pointer_pos() {
                session.pointer_down(view.screen_to_image(canvas_rect, pos));
            }
        }
        if response.dragged_by(egui::PointerButton::Primary) {
            if let Some(pos) = response
                .hover_pos()
                .or(ctx.input(|i| i.pointer.latest_pos()))
            {
                session.pointer_moved(view.screen_to_image(canvas_rect, pos));
            }
        }
        if response.drag_stopped_by(egui::PointerButton::Primary) {
            session.pointer_up();
        }
        if response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                session.click(view.screen_to_image(canvas_rect, pos));
            }
        }

        if let Some(pos) = response.hover_pos() {
            let icon = match session.hover_cursor(view.screen_to_image(canvas_rect, pos)) {
                Cursor::Crosshair => egui::CursorIcon::Crosshair,
                Cursor::Move => egui::CursorIcon::Move,
                Cursor::ResizeNwSe => egui::CursorIcon::ResizeNwSe,
                Cursor::ResizeNeSw => egui::CursorIcon::ResizeNeSw,
            };
            ctx.output_mut(|o| o.cursor_icon = icon);
        }
    }
}

impl eframe::App for AnnotateApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_remote_events();

        // keyboard shortcuts; skipped while a text field has focus
        if !ctx.wants_keyboard_input() {
            let (undo_pressed, redo_pressed, delete_pressed, escape_pressed) = ctx.input(|i| {
                (
                    i.modifiers.ctrl && !i.modifiers.shift && i.key_pressed(egui::Key::Z),
                    i.modifiers.ctrl
                        && (i.key_pressed(egui::Key::Y)
                            || (i.modifiers.shift && i.key_pressed(egui::Key::Z))),
                    i.key_pressed(egui::Key::Delete) || i.key_pressed(egui::Key::Backspace),
                    i.key_pressed(egui::Key::Escape),
                )
            });
            if let Some(session) = self.session.as_mut() {
                if undo_pressed {
                    session.undo();
                }
                if redo_pressed {
                    session.redo();
                }
                if delete_pressed {
                    session.delete_selected();
                }
                if escape_pressed {
                    session.deselect();
                }
            }
        }

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            self.toolbar_ui(ui);
        });

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if self.saving {
                    ui.spinner();
                }
                ui.label(&self.status);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.weak("drag to draw, click to select, corner handles resize");
                });
            });
        });

        egui::SidePanel::right("properties")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.properties_ui(ui);
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(message) = self.load_error.clone() {
                ui.vertical_centered(|ui| {
                    ui.add_space(40.0);
                    ui.colored_label(egui::Color32::RED, message);
                    ui.label("Close the editor and retry once the backend is reachable.");
                });
                return;
            }
            if self.session.is_none() {
                ui.vertical_centered(|ui| {
                    ui.add_space(40.0);
                    ui.spinner();
                    ui.label("Loading annotation data...");
                });
                return;
            }
            self.canvas_ui(ui);
        });
    }
}
