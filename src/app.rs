use std::path::{Path, PathBuf};

use eframe::egui;
use rfd::{MessageButtons, MessageDialog, MessageDialogResult, MessageLevel};

use crate::error::{ExportError, LoadError};
use crate::export::{self, ConfigDocument};
use crate::geometry::{self, DisplayPlacement};
use crate::interaction::{DragState, Gesture};
use crate::loader::{self, ImageLoader};
use crate::regions::CoordinateField;
use crate::render::{self, FilterChain};
use crate::session::{PreprocessingSettings, Session};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp", "tif", "tiff"];
const PERCENT_RANGE: std::ops::RangeInclusive<u32> = 0..=200;

// ── Collaborators ───────────────────────────────────────────────────────────

fn alert(message: &str) {
    MessageDialog::new()
        .set_level(MessageLevel::Warning)
        .set_title("Region Annotator")
        .set_description(message)
        .set_buttons(MessageButtons::Ok)
        .show();
}

fn confirm(message: &str) -> bool {
    MessageDialog::new()
        .set_level(MessageLevel::Warning)
        .set_title("Region Annotator")
        .set_description(message)
        .set_buttons(MessageButtons::YesNo)
        .show()
        == MessageDialogResult::Yes
}

fn pick_image() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .add_filter("Images", IMAGE_EXTENSIONS)
        .pick_file()
}

/// Edit requested from the region list; applied after the list is drawn.
enum RegionAction {
    Toggle(usize),
    Rename(usize, String),
    SetCoordinate(usize, CoordinateField, i64),
    Delete(usize),
}

struct Preview {
    texture: egui::TextureHandle,
    chain: FilterChain,
}

// ── App ─────────────────────────────────────────────────────────────────────

pub struct AnnotatorApp {
    session: Session,
    loader: Option<ImageLoader>,
    preview: Option<Preview>,
}

impl AnnotatorApp {
    pub fn new(initial_image: Option<PathBuf>) -> Self {
        let loader = ImageLoader::spawn()
            .map_err(|e| log::error!("Image decoder unavailable: {e}"))
            .ok();
        let mut app = Self {
            session: Session::new(),
            loader,
            preview: None,
        };
        if let Some(path) = initial_image {
            app.load_path(&path);
        }
        app
    }

    fn report_load_error(&self, err: &LoadError) {
        log::warn!("{err}");
        alert(&err.to_string());
    }

    fn load_path(&mut self, path: &Path) {
        let result = match self.loader.as_mut() {
            Some(loader) => loader.request_path(path),
            None => Err(LoadError::WorkerGone),
        };
        match result {
            Ok(()) => self.session.loading = true,
            Err(e) => self.report_load_error(&e),
        }
    }

    fn load_bytes(&mut self, name: &str, bytes: Vec<u8>) {
        let path = Path::new(name);
        let result = loader::check_image_path(path).and_then(|()| match self.loader.as_mut() {
            Some(l) => l.request_bytes(loader::image_name(path), bytes),
            None => Err(LoadError::WorkerGone),
        });
        match result {
            Ok(()) => self.session.loading = true,
            Err(e) => self.report_load_error(&e),
        }
    }

    fn open_picker(&mut self) {
        if let Some(path) = pick_image() {
            self.load_path(&path);
        }
    }

    /// Install finished decodes. Runs before anything reads the session.
    fn poll_loader(&mut self, ctx: &egui::Context) {
        let Some(loader) = self.loader.as_mut() else {
            return;
        };
        while let Some(result) = loader.poll() {
            match result {
                Ok(image) => {
                    self.preview = None;
                    self.session.install_image(image);
                }
                Err(e) => {
                    self.session.drop_image();
                    self.preview = None;
                    log::error!("{e}");
                    alert(&e.to_string());
                }
            }
        }
        if loader.is_pending() {
            self.session.loading = true;
            ctx.request_repaint();
        } else {
            self.session.loading = false;
        }
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.first().cloned());
        let Some(file) = dropped else {
            return;
        };
        if let Some(path) = &file.path {
            self.load_path(path);
        } else if let Some(bytes) = &file.bytes {
            self.load_bytes(&file.name, bytes.to_vec());
        }
    }

    /// Rebuild the preview texture when it was made for another image or chain.
    fn ensure_preview(&mut self, ctx: &egui::Context, chain: &FilterChain) {
        let Some(image) = &self.session.image else {
            self.preview = None;
            return;
        };
        if self.preview.as_ref().is_some_and(|p| p.chain == *chain) {
            return;
        }
        let color_image = render::preview_image(&image.pixels, chain);
        match &mut self.preview {
            Some(preview) => {
                preview.texture.set(color_image, egui::TextureOptions::LINEAR);
                preview.chain = *chain;
            }
            None => {
                let texture = ctx.load_texture("image", color_image, egui::TextureOptions::LINEAR);
                self.preview = Some(Preview {
                    texture,
                    chain: *chain,
                });
            }
        }
    }

    fn placement(&self, viewport: (f64, f64)) -> Option<DisplayPlacement> {
        self.session.image.as_ref().map(|img| {
            geometry::compute_display_placement(img.width(), img.height(), viewport.0, viewport.1)
        })
    }

    fn request_clear_all(&mut self) {
        if !self.session.store.is_empty()
            && !confirm("This will clear all defined regions. Continue?")
        {
            return;
        }
        self.session.clear_regions();
        log::info!("Cleared all regions");
    }

    fn export_config(&self) -> Result<Option<PathBuf>, ExportError> {
        let doc = ConfigDocument::from_session(&self.session)?;
        let text = doc.to_module(&export::timestamp_now())?;
        let name = self
            .session
            .image
            .as_ref()
            .map(|img| img.name.as_str())
            .unwrap_or("image_config");
        let Some(path) = rfd::FileDialog::new()
            .set_file_name(export::config_file_name(name))
            .add_filter("JavaScript", &["js"])
            .save_file()
        else {
            return Ok(None);
        };
        std::fs::write(&path, text)?;
        Ok(Some(path))
    }

    fn generate_config(&self) {
        match self.export_config() {
            Ok(Some(path)) => log::info!(
                "Exported {} regions to {}",
                self.session.store.len(),
                path.display()
            ),
            Ok(None) => log::debug!("Export cancelled"),
            Err(e) => {
                if e.is_validation() {
                    log::warn!("{e}");
                } else {
                    log::error!("{e}");
                }
                alert(&e.to_string());
            }
        }
    }

    // ── Panels ──────────────────────────────────────────────────────────────

    fn preprocessing_ui(&mut self, ui: &mut egui::Ui) {
        ui.heading("Global Preprocessing");
        let settings = &mut self.session.settings;
        for (label, amount) in [
            ("Brightness:", &mut settings.brightness),
            ("Contrast:", &mut settings.contrast),
            ("Saturation:", &mut settings.saturation),
        ] {
            ui.horizontal(|ui| {
                ui.label(label);
                let mut percent = PreprocessingSettings::to_percent(*amount);
                if ui
                    .add(egui::Slider::new(&mut percent, PERCENT_RANGE).suffix("%"))
                    .changed()
                {
                    *amount = PreprocessingSettings::from_percent(percent);
                }
            });
        }
        let mut grayscale = settings.grayscale == 1;
        if ui.checkbox(&mut grayscale, "Grayscale").changed() {
            settings.grayscale = u8::from(grayscale);
        }
        ui.checkbox(&mut settings.denoise, "Denoise");
        ui.checkbox(&mut settings.sharpen, "Sharpen");
        if ui.button("Reset Global Controls").clicked() {
            self.session.reset_settings();
        }
    }

    fn regions_ui(&mut self, ui: &mut egui::Ui) {
        ui.heading("Regions");
        if !self.session.has_image() {
            ui.label(egui::RichText::new("Upload an image to begin.").weak());
            return;
        }
        if self.session.store.is_empty() {
            ui.label(egui::RichText::new("No regions defined. Draw on the image.").weak());
            return;
        }

        let store = &self.session.store;
        let mut actions = Vec::new();
        egui::ScrollArea::vertical()
            .max_height((ui.available_height() - 80.0).max(120.0))
            .show(ui, |ui| {
                for (i, region) in store.regions().iter().enumerate() {
                    let expanded = store.selected() == Some(i);
                    let arrow = if expanded { "▼" } else { "►" };
                    if ui
                        .selectable_label(expanded, format!("{}  {arrow}", region.id))
                        .clicked()
                    {
                        actions.push(RegionAction::Toggle(i));
                    }
                    if !expanded {
                        continue;
                    }

                    ui.indent(("region", i), |ui| {
                        ui.horizontal(|ui| {
                            ui.label("ID:");
                            let mut id = region.id.clone();
                            if ui.text_edit_singleline(&mut id).changed() {
                                actions.push(RegionAction::Rename(i, id));
                            }
                        });
                        for field in CoordinateField::ALL {
                            let Some((min, max)) = store.coordinate_range(i, field) else {
                                continue;
                            };
                            let (min, max) = (min as i64, max as i64);
                            let current = region.coordinates.get(field) as i64;
                            let mut value = current.clamp(min, max);
                            ui.horizontal(|ui| {
                                ui.label(field.label());
                                let slider = ui.add(
                                    egui::Slider::new(&mut value, min..=max)
                                        .show_value(false),
                                );
                                let number =
                                    ui.add(egui::DragValue::new(&mut value).range(min..=max).suffix("px"));
                                if (slider.changed() || number.changed()) && value != current {
                                    actions.push(RegionAction::SetCoordinate(i, field, value));
                                }
                            });
                        }
                        if ui.button("Delete Region").clicked() {
                            actions.push(RegionAction::Delete(i));
                        }
                    });
                }
            });

        for action in actions {
            match action {
                RegionAction::Toggle(i) => {
                    let next = (self.session.store.selected() != Some(i)).then_some(i);
                    self.session.store.select(next);
                }
                RegionAction::Rename(i, id) => {
                    self.session.store.rename_region(i, id);
                }
                RegionAction::SetCoordinate(i, field, value) => {
                    let update = self.session.store.update_coordinate(i, field, value);
                    if let Some((moved, to)) = update.and_then(|u| u.cascaded) {
                        log::debug!("{moved:?} pulled back to {to}px");
                    }
                }
                RegionAction::Delete(i) => {
                    self.session.store.delete_region(i);
                }
            }
        }
    }

    fn canvas_ui(&mut self, ui: &mut egui::Ui) {
        let (response, painter) =
            ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
        let canvas = response.rect;
        let viewport = (canvas.width() as f64, canvas.height() as f64);

        let (pressed, released, latest) = ui.ctx().input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_released(),
                i.pointer.latest_pos(),
            )
        });
        let local = |p: egui::Pos2| {
            let v = p - canvas.min;
            (v.x as f64, v.y as f64)
        };

        if pressed && response.hovered() {
            match (self.placement(viewport), latest) {
                (Some(placement), Some(pos)) => {
                    let gesture = self.session.pointer_down(local(pos), &placement);
                    log::debug!("Pointer down: {gesture:?}");
                }
                (None, _) if !self.session.loading => self.open_picker(),
                _ => {}
            }
        }

        if matches!(self.session.drag, DragState::Drawing { .. }) {
            if let Some(pos) = latest {
                self.session.pointer_move(local(pos));
            }
            if released {
                if let Some(placement) = self.placement(viewport) {
                    if let Gesture::Committed(i) = self.session.pointer_up(&placement) {
                        log::debug!("Committed region {i}");
                    }
                }
            }
        }

        let frame = render::compose(&self.session, viewport);
        match &frame {
            render::Frame::Scene(scene) => self.ensure_preview(ui.ctx(), &scene.filter),
            render::Frame::Placeholder => self.preview = None,
        }
        render::paint(
            &painter,
            canvas,
            &frame,
            self.preview.as_ref().map(|p| &p.texture),
        );
    }
}

// ── eframe App impl ────────────────────────────────────────────────────────

impl eframe::App for AnnotatorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_loader(ctx);
        self.handle_dropped_files(ctx);

        if !ctx.wants_keyboard_input()
            && ctx.input(|i| i.key_pressed(egui::Key::Delete) || i.key_pressed(egui::Key::Backspace))
        {
            if let Some(i) = self.session.store.selected() {
                self.session.store.delete_region(i);
            }
        }

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Open Image…").clicked() {
                    self.open_picker();
                }
                ui.separator();
                if self.session.loading {
                    ui.spinner();
                    ui.label("Loading image…");
                } else if let Some(image) = &self.session.image {
                    ui.label(format!("{} ({}×{})", image.name, image.width(), image.height()));
                }
                ui.separator();
                ui.label(format!("Regions: {}", self.session.store.len()));
                if let Some(region) = self.session.store.selected_region() {
                    ui.separator();
                    ui.label(format!("Selected: {}", region.id));
                }
            });
        });

        egui::SidePanel::right("controls")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| {
                self.preprocessing_ui(ui);
                ui.separator();
                self.regions_ui(ui);
                ui.separator();
                ui.horizontal(|ui| {
                    if ui.button("Generate Config").clicked() {
                        self.generate_config();
                    }
                    if ui.button("Clear All Regions").clicked() {
                        self.request_clear_all();
                    }
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| self.canvas_ui(ui));
    }
}
