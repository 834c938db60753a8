//! Node Field viewer
//! Hosts the animated background in a desktop window

use eframe::egui;
use node_field::{FieldConfig, FieldEvent, FrameStats, NodeField, PainterSurface};
use std::time::{Duration, Instant};

/// Poll rate while the loop is paused, to notice the window coming back
const PAUSED_POLL: Duration = Duration::from_millis(250);

/// Main application state
struct ViewerApp {
    config: FieldConfig,
    field: Option<NodeField>,
    last_update: Instant,
    last_size: Option<egui::Vec2>,
    hidden: bool,

    // UI state
    selected_preset: String,
    show_stats: bool,
    last_dt: f32,
    last_stats: FrameStats,
    status: Option<String>,
}

impl ViewerApp {
    fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        Self {
            config: FieldConfig::default(),
            field: None,
            last_update: Instant::now(),
            last_size: None,
            hidden: false,
            selected_preset: "Landing".to_string(),
            show_stats: false,
            last_dt: 0.016,
            last_stats: FrameStats::default(),
            status: None,
        }
    }

    /// Drop the current field and mount a fresh one with the current config
    fn remount(&mut self) {
        if let Some(mut field) = self.field.take() {
            field.teardown();
        }
        self.last_size = None;
    }

    fn set_config(&mut self, config: FieldConfig) {
        self.config = config;
        self.remount();
    }
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_update);
        self.last_update = now;
        self.last_dt = dt.as_secs_f32();

        self.render_top_bar(ctx);
        self.render_canvas(ctx, dt);

        let running = self.field.as_ref().map_or(false, NodeField::wants_frame);
        if running {
            ctx.request_repaint();
        } else {
            ctx.request_repaint_after(PAUSED_POLL);
        }
    }
}

impl ViewerApp {
    fn render_top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Node Field");
                ui.separator();

                // Preset selector
                let mut chosen = None;
                egui::ComboBox::from_id_source("preset")
                    .selected_text(self.selected_preset.as_str())
                    .show_ui(ui, |ui| {
                        for name in FieldConfig::preset_names() {
                            if ui
                                .selectable_label(self.selected_preset == name, name)
                                .clicked()
                            {
                                chosen = Some(name);
                            }
                        }
                    });
                if let Some(name) = chosen {
                    let mut config = self.config.clone();
                    if config.apply_preset(name) {
                        self.selected_preset = name.to_string();
                        self.set_config(config);
                    }
                }

                ui.separator();
                ui.toggle_value(&mut self.show_stats, "Stats");
                ui.separator();

                if ui.button("Save Config").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("JSON", &["json"])
                        .save_file()
                    {
                        if let Err(e) = self.config.save(&path) {
                            log::error!("Error saving config: {:#}", e);
                            self.status = Some(format!("Save failed: {e}"));
                        }
                    }
                }
                if ui.button("Load Config").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("JSON", &["json"])
                        .pick_file()
                    {
                        match FieldConfig::load(&path) {
                            Ok(config) => {
                                self.selected_preset = "Custom".to_string();
                                self.set_config(config);
                            }
                            Err(e) => {
                                log::error!("Error loading config: {:#}", e);
                                self.status = Some(format!("Load failed: {e}"));
                            }
                        }
                    }
                }
                if ui.button("Export PNG").clicked() {
                    self.export_png();
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if let Some(status) = &self.status {
                        ui.label(status);
                    }
                });
            });
        });
    }

    fn export_png(&mut self) {
        let Some(field) = self.field.as_ref() else {
            return;
        };
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("PNG", &["png"])
            .save_file()
        {
            match node_field::snapshot::render_png(field, &path) {
                Ok(_) => self.status = Some(format!("Saved {}", path.display())),
                Err(e) => {
                    log::error!("Error exporting snapshot: {:#}", e);
                    self.status = Some(format!("Export failed: {e}"));
                }
            }
        }
    }

    /// Forward window state onto the mounted field
    fn forward_events(&mut self, ctx: &egui::Context, rect: egui::Rect) {
        let Some(field) = self.field.as_mut() else {
            return;
        };

        let minimized = ctx.input(|i| i.viewport().minimized.unwrap_or(false));
        if minimized != self.hidden {
            self.hidden = minimized;
            field.handle(if minimized {
                FieldEvent::Hidden
            } else {
                FieldEvent::Visible
            });
        }

        if self.last_size != Some(rect.size()) {
            self.last_size = Some(rect.size());
            field.handle(FieldEvent::Resized(rect.size()));
        }

        match ctx.input(|i| i.pointer.hover_pos()) {
            Some(pos) if rect.contains(pos) => {
                field.handle(FieldEvent::PointerMoved(pos - rect.min.to_vec2()))
            }
            _ => {
                if field.pointer().is_some() {
                    field.handle(FieldEvent::PointerLeft);
                }
            }
        }
    }

    fn render_canvas(&mut self, ctx: &egui::Context, dt: Duration) {
        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                let (rect, _) = ui.allocate_exact_size(ui.available_size(), egui::Sense::hover());

                if self.field.is_none() {
                    self.field = NodeField::mount(Some(rect.size()), self.config.clone());
                    self.last_size = Some(rect.size());
                }
                self.forward_events(ctx, rect);

                let painter = ui.painter_at(rect);
                let mut surface = PainterSurface::new(&painter, rect);
                if let Some(field) = self.field.as_mut() {
                    field.advance(dt);
                    // Stopped only while minimized: nothing to paint
                    if let Some(stats) = field.frame(&mut surface) {
                        self.last_stats = stats;
                    }
                }

                if self.show_stats {
                    self.draw_stats(&painter, rect);
                }
            });
    }

    fn draw_stats(&self, painter: &egui::Painter, rect: egui::Rect) {
        let fps = 1.0 / self.last_dt.max(0.001);
        let text = format!(
            "FPS: {:.0}  nodes: {}  edges: {}",
            fps, self.last_stats.nodes, self.last_stats.edges
        );
        painter.text(
            rect.left_bottom() + egui::vec2(10.0, -10.0),
            egui::Align2::LEFT_BOTTOM,
            text,
            egui::FontId::monospace(12.0),
            egui::Color32::from_rgb(75, 85, 99),
        );
    }
}

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_title("Node Field")
            .with_min_inner_size([320.0, 240.0]),
        vsync: true, // The simulation advances one tick per frame
        ..Default::default()
    };

    eframe::run_native(
        "Node Field",
        options,
        Box::new(|cc| Box::new(ViewerApp::new(cc))),
    )
}
