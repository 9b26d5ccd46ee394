use std::sync::Arc;

use eframe::egui;

use crate::data::energy::{EnergyCut, PhotonVariable};
use crate::data::export;
use crate::state::app_state::{AppState, Tab, VERSION};
use crate::ui::chart_panel;
use crate::ui::controls_panel::{self, ControlAction};
use crate::ui::energy_panel;

/// What to do when a screenshot arrives.
enum PendingScreenshot {
    SaveFile,
    Clipboard,
}

/// Distribution image uploaded to the GPU, keyed by what it shows.
struct CachedTexture {
    cut: EnergyCut,
    variable: PhotonVariable,
    handle: egui::TextureHandle,
}

/// The main StatScope application.
pub struct StatScopeApp {
    pub state: AppState,
    /// An error message shown in the footer until dismissed.
    pub error_message: Option<String>,
    /// Screen rect of the chart in the last frame, used to crop exports.
    chart_rect: Option<egui::Rect>,
    pending_screenshot: Option<PendingScreenshot>,
    texture: Option<CachedTexture>,
}

impl StatScopeApp {
    pub fn new(cc: &eframe::CreationContext<'_>, state: AppState) -> Self {
        let ctx = &cc.egui_ctx;
        let mut style = (*ctx.style()).clone();

        style.text_styles.insert(
            egui::TextStyle::Body,
            egui::FontId::proportional(15.0),
        );
        style.text_styles.insert(
            egui::TextStyle::Button,
            egui::FontId::proportional(14.5),
        );
        style.text_styles.insert(
            egui::TextStyle::Heading,
            egui::FontId::proportional(22.0),
        );
        style.text_styles.insert(
            egui::TextStyle::Monospace,
            egui::FontId::monospace(13.5),
        );
        style.spacing.button_padding = egui::vec2(10.0, 5.0);
        style.spacing.item_spacing = egui::vec2(8.0, 6.0);

        ctx.set_style(style);
        ctx.set_visuals(styled_visuals(&state));

        Self {
            state,
            error_message: None,
            chart_rect: None,
            pending_screenshot: None,
            texture: None,
        }
    }

    /// Export the current chart view to a CSV file via a save dialog.
    fn export_csv(&mut self) {
        let view = self.state.current_view();
        if view.series.is_empty() {
            self.error_message = Some("Nothing to export".to_string());
            return;
        }

        let filename = export::timestamped_file_name(view.dataset.tag(), "csv");
        if let Some(path) = rfd::FileDialog::new()
            .set_file_name(&filename)
            .add_filter("CSV Files", &["csv"])
            .save_file()
        {
            if let Err(e) = export::export_csv(view, &path) {
                tracing::error!("CSV export to {:?} failed: {e}", path);
                self.error_message = Some(format!("Failed to export CSV: {e}"));
            }
        }
    }

    fn request_screenshot(&mut self, ctx: &egui::Context, action: PendingScreenshot) {
        self.pending_screenshot = Some(action);
        ctx.send_viewport_cmd(egui::ViewportCommand::Screenshot(egui::UserData::default()));
    }

    /// Save or copy a screenshot requested in an earlier frame, once it arrives.
    fn handle_screenshot(&mut self, ctx: &egui::Context) {
        if self.pending_screenshot.is_none() {
            return;
        }
        let mut screenshot_image: Option<Arc<egui::ColorImage>> = None;
        ctx.input(|i| {
            for event in &i.raw.events {
                if let egui::Event::Screenshot { image, .. } = event {
                    screenshot_image = Some(image.clone());
                }
            }
        });
        let Some(color_image) = screenshot_image else {
            return;
        };
        let Some(action) = self.pending_screenshot.take() else {
            return;
        };

        let (rgba, width, height) =
            crop_screenshot(&color_image, self.chart_rect, ctx.pixels_per_point());

        match action {
            PendingScreenshot::SaveFile => {
                if let Some(path) = rfd::FileDialog::new()
                    .set_file_name("plot.png")
                    .add_filter("PNG Image", &["png"])
                    .save_file()
                {
                    match chart_image(rgba, width, height) {
                        Ok(img) => {
                            if let Err(e) = img.save(&path) {
                                tracing::error!("Saving {:?} failed: {e}", path);
                                self.error_message = Some(format!("Failed to save image: {e}"));
                            } else {
                                tracing::info!("Saved chart image to {:?}", path);
                            }
                        }
                        Err(e) => {
                            tracing::error!("Not saving {:?}: {e}", path);
                            self.error_message = Some(format!("Failed to save image: {e}"));
                        }
                    }
                }
            }
            PendingScreenshot::Clipboard => match arboard::Clipboard::new() {
                Ok(mut clipboard) => {
                    let img_data = arboard::ImageData {
                        width,
                        height,
                        bytes: std::borrow::Cow::Owned(rgba),
                    };
                    if let Err(e) = clipboard.set_image(img_data) {
                        self.error_message = Some(format!("Failed to copy to clipboard: {e}"));
                    } else {
                        tracing::info!("Copied chart image to clipboard");
                    }
                }
                Err(e) => {
                    self.error_message = Some(format!("Failed to access clipboard: {e}"));
                }
            },
        }
    }

    /// Texture for the selected cut and variable, uploading it on first use.
    fn distribution_texture(&mut self, ctx: &egui::Context) -> Option<egui::TextureHandle> {
        let energy = &self.state.energy;
        let snapshot = energy.snapshot()?;
        let (cut, variable) = (snapshot.cut, energy.variable());
        if energy.selected_cut() != Some(cut) {
            return None;
        }

        if let Some(cached) = &self.texture {
            if cached.cut == cut && cached.variable == variable {
                return Some(cached.handle.clone());
            }
        }

        let pixels = snapshot.images.get(&variable)?;
        let image = egui::ColorImage::from_rgba_unmultiplied(
            [pixels.width, pixels.height],
            &pixels.rgba,
        );
        let handle = ctx.load_texture(
            format!("distribution_{}_{}", cut.gev(), variable.key()),
            image,
            egui::TextureOptions::default(),
        );
        self.texture = Some(CachedTexture {
            cut,
            variable,
            handle: handle.clone(),
        });
        Some(handle)
    }
}

/// Theme visuals with the app's rounded corners.
fn styled_visuals(state: &AppState) -> egui::Visuals {
    let mut vis = state.theme.visuals();
    vis.window_corner_radius = egui::CornerRadius::same(8);
    vis.widgets.noninteractive.corner_radius = egui::CornerRadius::same(6);
    vis.widgets.inactive.corner_radius = egui::CornerRadius::same(6);
    vis.widgets.hovered.corner_radius = egui::CornerRadius::same(6);
    vis.widgets.active.corner_radius = egui::CornerRadius::same(6);
    vis
}

/// Cut the chart out of a full-window screenshot. Without a rect the whole
/// image is returned.
fn crop_screenshot(
    image: &egui::ColorImage,
    rect: Option<egui::Rect>,
    pixels_per_point: f32,
) -> (Vec<u8>, usize, usize) {
    let full_w = image.width();
    let full_h = image.height();
    let Some(rect) = rect else {
        let rgba = image
            .pixels
            .iter()
            .flat_map(|c| [c.r(), c.g(), c.b(), c.a()])
            .collect();
        return (rgba, full_w, full_h);
    };

    let x0 = ((rect.left() * pixels_per_point).max(0.0) as usize).min(full_w);
    let y0 = ((rect.top() * pixels_per_point).max(0.0) as usize).min(full_h);
    let x1 = ((rect.right() * pixels_per_point).ceil() as usize).min(full_w);
    let y1 = ((rect.bottom() * pixels_per_point).ceil() as usize).min(full_h);
    let cw = x1.saturating_sub(x0);
    let ch = y1.saturating_sub(y0);
    let mut cropped = Vec::with_capacity(cw * ch * 4);
    for row in y0..y1 {
        for col in x0..x1 {
            let c = image.pixels[row * full_w + col];
            cropped.extend_from_slice(&[c.r(), c.g(), c.b(), c.a()]);
        }
    }
    (cropped, cw, ch)
}

/// Wrap cropped RGBA bytes as an image, checking the buffer matches the size.
fn chart_image(rgba: Vec<u8>, width: usize, height: usize) -> Result<image::RgbaImage, String> {
    let len = rgba.len();
    let (Ok(w), Ok(h)) = (u32::try_from(width), u32::try_from(height)) else {
        return Err(format!("screenshot size {width}x{height} is too large"));
    };
    image::RgbaImage::from_raw(w, h, rgba).ok_or_else(|| {
        format!("screenshot buffer of {len} bytes does not fit {width}x{height} pixels")
    })
}

impl eframe::App for StatScopeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.set_visuals(styled_visuals(&self.state));

        self.handle_screenshot(ctx);

        if self.state.energy.poll() {
            ctx.request_repaint();
        }
        if self.state.energy.is_loading() || self.state.energy.insight.is_pending() {
            ctx.request_repaint_after(std::time::Duration::from_millis(50));
        }

        // --- Header panel ---
        egui::TopBottomPanel::top("header")
            .frame(egui::Frame::side_top_panel(&ctx.style()).inner_margin(egui::Margin::symmetric(16, 8)))
            .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.visuals_mut().override_text_color = Some(ui.visuals().strong_text_color());
                ui.heading("StatScope");
                ui.visuals_mut().override_text_color = None;

                ui.separator();
                ui.selectable_value(&mut self.state.tab, Tab::Chart, "Chart");
                ui.selectable_value(&mut self.state.tab, Tab::EnergyCuts, "Energy cuts");

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button(self.state.theme.toggle_label()).clicked() {
                        self.state.theme = self.state.theme.toggle();
                    }
                    ui.separator();
                    ui.small(format!("v{VERSION}"));
                });
            });
        });

        // --- Footer panel ---
        egui::TopBottomPanel::bottom("footer")
            .frame(egui::Frame::side_top_panel(&ctx.style()).inner_margin(egui::Margin::symmetric(16, 6)))
            .show(ctx, |ui| {
            ui.horizontal(|ui| {
                let view = self.state.current_view();
                ui.label(
                    egui::RichText::new(format!("{} points, {}", view.series.len(), view.dataset.tag()))
                        .weak(),
                );

                if let Some(msg) = &self.error_message {
                    ui.separator();
                    ui.colored_label(self.state.theme.error_color(), msg.as_str());
                    if ui.small_button("dismiss").clicked() {
                        self.error_message = None;
                    }
                }
            });
        });

        match self.state.tab {
            Tab::Chart => {
                let mut action = ControlAction::None;
                egui::SidePanel::left("controls")
                    .resizable(false)
                    .exact_width(230.0)
                    .show(ctx, |ui| {
                        action = controls_panel::show_controls_panel(
                            &mut self.state.controls,
                            &mut self.state.show_table,
                            ui,
                        );
                    });

                match action {
                    ControlAction::Regenerate => self.state.regenerate(),
                    ControlAction::ExportCsv => self.export_csv(),
                    ControlAction::ExportImageSave => {
                        self.request_screenshot(ctx, PendingScreenshot::SaveFile)
                    }
                    ControlAction::ExportImageClipboard => {
                        self.request_screenshot(ctx, PendingScreenshot::Clipboard)
                    }
                    ControlAction::None => {}
                }

                let theme = self.state.theme;
                let show_table = self.state.show_table;
                egui::CentralPanel::default().show(ctx, |ui| {
                    let view = self.state.chart_view();
                    self.chart_rect = Some(chart_panel::show_chart_panel(view, show_table, &theme, ui));
                });
            }
            Tab::EnergyCuts => {
                self.state.energy.ensure_loaded();
                let texture = self.distribution_texture(ctx);
                let theme = self.state.theme;
                egui::CentralPanel::default().show(ctx, |ui| {
                    egui::ScrollArea::vertical().show(ui, |ui| {
                        energy_panel::show_energy_panel(
                            &mut self.state.energy,
                            texture.as_ref(),
                            &theme,
                            ui,
                        );
                    });
                });
            }
        }
    }
}
