use super::{limits_from_bounds, point_color};
use crate::interact::ClickEvent;
use crate::pipeline::{Figure, ViewerSession};
use crate::render::{figure_html, figure_png, random_png_name, save_png, write_figure};
use eframe::egui;
use egui_plot::{Plot, PlotPoints, Points};

const POINT_RGB: [u8; 3] = [31, 119, 180];
const HIGHLIGHT: egui::Color32 = egui::Color32::from_rgb(214, 39, 40);

/// Textures of the selected figure
struct FigureTextures {
    composite: egui::TextureHandle,
    channels: Vec<(String, egui::TextureHandle)>,
}

pub struct ViewerApp {
    session: ViewerSession,
    figure: Option<Figure>,
    textures: Option<FigureTextures>,
    status: String,
}

impl ViewerApp {
    pub fn new(session: ViewerSession) -> Self {
        let status = format!(
            "{} samples, click a point to show its images",
            session.points().len()
        );
        Self {
            session,
            figure: None,
            textures: None,
            status,
        }
    }

    fn on_click(&mut self, ctx: &egui::Context, click: ClickEvent, bounds: &egui_plot::PlotBounds) {
        let limits = limits_from_bounds(bounds);
        let in_window = self.session.locate(click, &limits).len();
        match self.session.handle_click(click, &limits) {
            Ok(Some(figure)) => {
                let mut status = match &figure.title {
                    Some(title) => format!("Row {}: {}", figure.row, title),
                    None => format!("Row {}", figure.row),
                };
                if in_window > 1 {
                    status.push_str(&format!(" (nearest of {} points)", in_window));
                }
                self.status = status;
                self.textures = Some(upload(ctx, &figure));
                self.figure = Some(figure);
            }
            Ok(None) => {}
            Err(e) => {
                log::error!("Failed to load images: {}", e);
                self.status = format!("✗ {}", e);
            }
        }
    }

    fn scatter(&mut self, ui: &mut egui::Ui) {
        let ctx = ui.ctx().clone();
        let (x_name, y_name) = self.session.axis_names();
        let config = self.session.config();
        let radius = config.point_size;
        let color = point_color(POINT_RGB, config.point_alpha);
        let limits = self.session.default_limits();

        let points: Vec<[f64; 2]> = self
            .session
            .points()
            .iter()
            .copied()
            .filter(|p| p[0].is_finite() && p[1].is_finite())
            .collect();
        let selected = self
            .figure
            .as_ref()
            .and_then(|f| self.session.points().get(f.row).copied());

        let response = Plot::new("scatter")
            .x_axis_label(x_name)
            .y_axis_label(y_name)
            .show_grid(config.show_grid)
            .include_x(limits.x.0)
            .include_x(limits.x.1)
            .include_y(limits.y.0)
            .include_y(limits.y.1)
            .show(ui, |plot_ui| {
                plot_ui.points(Points::new(PlotPoints::new(points)).radius(radius).color(color));
                if let Some(p) = selected {
                    plot_ui.points(
                        Points::new(PlotPoints::new(vec![p]))
                            .radius(radius * 2.0)
                            .color(HIGHLIGHT),
                    );
                }
            });

        if response.response.clicked() {
            if let Some(pos) = response.response.interact_pointer_pos() {
                let value = response.transform.value_from_position(pos);
                let bounds = *response.transform.bounds();
                self.on_click(&ctx, ClickEvent::new(value.x, value.y), &bounds);
            }
        }
    }

    fn image_panel(&mut self, ui: &mut egui::Ui) {
        let Some(textures) = &self.textures else {
            ui.label("No sample selected");
            return;
        };

        let mut want_html = false;
        let mut want_png = false;
        ui.horizontal(|ui| {
            want_html = ui.button("Save HTML").clicked();
            want_png = ui.button("Save PNG").clicked();
        });
        ui.separator();

        egui::ScrollArea::vertical().show(ui, |ui| {
            let width = ui.available_width();
            ui.add(egui::Image::new(&textures.composite).max_width(width));
            for (label, texture) in &textures.channels {
                ui.label(label);
                ui.add(egui::Image::new(texture).max_width(width * 0.5));
            }
        });

        if want_html {
            self.save_html();
        }
        if want_png {
            self.save_png();
        }
    }

    fn save_html(&mut self) {
        let Some(figure) = &self.figure else { return };
        let config = self.session.config();
        let result = figure_html(figure, config)
            .and_then(|html| write_figure(&html, None, config.output_dir.as_deref()));
        self.report_save(result.map(|path| (path, None)));
    }

    fn save_png(&mut self) {
        let Some(figure) = &self.figure else { return };
        let config = self.session.config();
        let dir = config
            .output_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir);
        let path = dir.join(random_png_name());
        let result = save_png(&figure_png(figure, config), &path, config.png_compression)
            .map(|bytes| (path, Some(bytes)));
        self.report_save(result);
    }

    fn report_save(&mut self, result: crate::interact::Result<(std::path::PathBuf, Option<usize>)>) {
        match result {
            Ok((path, bytes)) => {
                match bytes {
                    Some(n) => println!("✓ Saved {} ({} bytes)", path.display(), n),
                    None => println!("✓ Saved {}", path.display()),
                }
                self.status = format!("Saved {}", path.display());
            }
            Err(e) => {
                log::error!("Failed to save figure: {}", e);
                self.status = format!("✗ {}", e);
            }
        }
    }
}

fn upload(ctx: &egui::Context, figure: &Figure) -> FigureTextures {
    let rgb = figure.composite.to_rgb();
    let (w, h) = rgb.dimensions();
    let composite = ctx.load_texture(
        format!("composite_{}", figure.row),
        egui::ColorImage::from_rgb([w as usize, h as usize], rgb.as_raw()),
        egui::TextureOptions::default(),
    );

    let channels = if figure.is_multichannel() {
        figure
            .channels
            .iter()
            .enumerate()
            .map(|(i, ch)| {
                let (w, h) = ch.pixels.dimensions();
                let texture = ctx.load_texture(
                    format!("channel_{}_{}", figure.row, i),
                    egui::ColorImage::from_gray([w as usize, h as usize], ch.pixels.as_raw()),
                    egui::TextureOptions::default(),
                );
                (ch.label.clone(), texture)
            })
            .collect()
    } else {
        Vec::new()
    };

    FigureTextures {
        composite,
        channels,
    }
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.label(&self.status);
        });

        egui::SidePanel::right("images")
            .min_width(320.0)
            .default_width(480.0)
            .show(ctx, |ui| self.image_panel(ui));

        egui::CentralPanel::default().show(ctx, |ui| self.scatter(ui));
    }
}
