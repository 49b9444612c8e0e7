//! Interactive scatter window
//!
//! Clicking near a point opens that row's images in the side panel.

mod app;

pub use app::ViewerApp;

use crate::interact::AxisLimits;
use crate::pipeline::ViewerSession;
use eframe::egui;
use egui_plot::PlotBounds;

/// Open the viewer window and block until it is closed
pub fn run(session: ViewerSession) -> anyhow::Result<()> {
    let (x, y) = session.axis_names();
    let title = format!("interact: {} vs {}", y, x);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_title(title.clone()),
        ..Default::default()
    };

    eframe::run_native(
        &title,
        options,
        Box::new(|_cc| Ok(Box::new(ViewerApp::new(session)))),
    )
    .map_err(|e| anyhow::anyhow!("GUI error: {}", e))
}

/// Visible plot extents as hit-test limits
pub(crate) fn limits_from_bounds(bounds: &PlotBounds) -> AxisLimits {
    let [x0, y0] = bounds.min();
    let [x1, y1] = bounds.max();
    AxisLimits::new((x0, x1), (y0, y1))
}

/// Premultiplied point colour with the configured opacity
pub(crate) fn point_color(rgb: [u8; 3], alpha: f32) -> egui::Color32 {
    let a = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
    egui::Color32::from_rgba_unmultiplied(rgb[0], rgb[1], rgb[2], a)
}
