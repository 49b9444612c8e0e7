//! HTML output
//!
//! Figures are written as standalone pages: every panel is a PNG embedded
//! as a base64 data URI, so the file can be opened or shared on its own.

use crate::config::{PngCompression, ViewerConfig};
use crate::interact::composite::gray_to_rgb;
use crate::interact::Result;
use crate::pipeline::Figure;
use crate::render::png::encode_png;
use base64::Engine;
use image::RgbImage;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

const STYLE: &str = "body { font-family: sans-serif; margin: 16px; }\n\
.split { display: flex; gap: 12px; align-items: flex-start; }\n\
.facets { display: flex; flex-direction: column; gap: 4px; }\n\
figure { margin: 0; }\n\
figcaption { font-size: 12px; color: #444; }\n\
img { object-fit: contain; image-rendering: pixelated; background: #000; }";

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// `<img>` tag with the image embedded as a PNG data URI
fn img_tag(img: &RgbImage, width: u32, height: u32, compression: PngCompression) -> Result<String> {
    let png = encode_png(img, compression)?;
    let data = base64::engine::general_purpose::STANDARD.encode(&png);
    Ok(format!(
        "<img width=\"{}\" height=\"{}\" src=\"data:image/png;base64,{}\">",
        width, height, data
    ))
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n\
         <style>\n{}\n</style>\n</head>\n<body>\n{}</body>\n</html>\n",
        escape_html(title),
        STYLE,
        body
    )
}

fn figure_title(figure: &Figure) -> String {
    figure
        .title
        .clone()
        .unwrap_or_else(|| format!("Row {}", figure.row))
}

/// One panel page for a grey or RGB image
pub fn single_figure_html(figure: &Figure, width: u32, height: u32, config: &ViewerConfig) -> Result<String> {
    let title = figure_title(figure);
    let mut body = String::new();
    let _ = writeln!(body, "<h3>{}</h3>", escape_html(&title));
    let _ = writeln!(
        body,
        "{}",
        img_tag(&figure.composite.to_rgb(), width, height, config.png_compression)?
    );
    Ok(page(&title, &body))
}

/// Composite on the left, one facet per channel on the right
///
/// Every facet shares the composite's aspect ratio; the panel sizes come
/// from the split layout of the config.
pub fn split_figure_html(figure: &Figure, config: &ViewerConfig) -> Result<String> {
    let layout = config.split_layout;
    let title = figure_title(figure);
    let compression = config.png_compression;

    let mut body = String::new();
    let _ = writeln!(body, "<h3>{}</h3>", escape_html(&title));
    let _ = writeln!(body, "<div class=\"split\">");
    let _ = writeln!(
        body,
        "<figure class=\"main\">{}</figure>",
        img_tag(
            &figure.composite.to_rgb(),
            layout.main_width,
            layout.main_height,
            compression
        )?
    );
    let _ = writeln!(body, "<div class=\"facets\">");
    for channel in &figure.channels {
        let _ = writeln!(
            body,
            "<figure>{}<figcaption>{}</figcaption></figure>",
            img_tag(
                &gray_to_rgb(&channel.pixels),
                layout.channel_width,
                layout.channel_height,
                compression
            )?,
            escape_html(&channel.label)
        );
    }
    let _ = writeln!(body, "</div>\n</div>");

    Ok(page(&title, &body))
}

/// Page for a figure: split when it has several channels
pub fn figure_html(figure: &Figure, config: &ViewerConfig) -> Result<String> {
    if figure.is_multichannel() {
        split_figure_html(figure, config)
    } else {
        let (w, h) = config.resolve_figure_size(figure.composite.dimensions());
        single_figure_html(figure, w, h, config)
    }
}

/// File name used when no location is given
pub fn random_plot_name() -> String {
    format!("interact_plot_{}.html", uuid::Uuid::new_v4().simple())
}

/// Write a page to `location`, or to a randomly named file under
/// `output_dir` (system temp directory when unset)
pub fn write_figure(html: &str, location: Option<&Path>, output_dir: Option<&Path>) -> Result<PathBuf> {
    let path = match location {
        Some(path) => path.to_path_buf(),
        None => {
            let dir = output_dir
                .map(Path::to_path_buf)
                .unwrap_or_else(std::env::temp_dir);
            dir.join(random_plot_name())
        }
    };
    std::fs::write(&path, html)?;
    log::info!("Wrote {} ({} bytes)", path.display(), html.len());
    Ok(path)
}
