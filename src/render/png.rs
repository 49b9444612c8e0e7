//! PNG output
//!
//! Single images are letterboxed into the configured figure size. Split
//! figures put the composite on the left and one greyscale facet per
//! channel stacked down the right-hand column.

use crate::config::{PngCompression, ViewerConfig};
use crate::interact::composite::gray_to_rgb;
use crate::interact::Result;
use crate::pipeline::Figure;
use image::codecs::png::{FilterType, PngEncoder};
use image::imageops::{self, FilterType as ResizeFilter};
use image::{ExtendedColorType, ImageEncoder, Rgb, RgbImage};
use std::path::Path;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

/// Encode an RGB image as PNG bytes
pub fn encode_png(img: &RgbImage, compression: PngCompression) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let encoder =
        PngEncoder::new_with_quality(&mut buf, compression.to_image(), FilterType::Adaptive);
    encoder.write_image(
        img.as_raw(),
        img.width(),
        img.height(),
        ExtendedColorType::Rgb8,
    )?;
    Ok(buf)
}

/// Encode and write a PNG, returning the number of bytes written
pub fn save_png(img: &RgbImage, path: &Path, compression: PngCompression) -> Result<usize> {
    let bytes = encode_png(img, compression)?;
    std::fs::write(path, &bytes)?;
    Ok(bytes.len())
}

/// File name for a PNG saved without an explicit location
pub fn random_png_name() -> String {
    format!("interact_plot_{}.png", uuid::Uuid::new_v4().simple())
}

/// Scale an image to fit inside `width × height`, keeping its aspect ratio
pub fn fit_within(img: &RgbImage, width: u32, height: u32) -> RgbImage {
    let (iw, ih) = img.dimensions();
    if iw == 0 || ih == 0 {
        return img.clone();
    }
    let scale = (width as f64 / iw as f64).min(height as f64 / ih as f64);
    let nw = ((iw as f64 * scale).round() as u32).max(1);
    let nh = ((ih as f64 * scale).round() as u32).max(1);
    if (nw, nh) == (iw, ih) {
        return img.clone();
    }
    imageops::resize(img, nw, nh, ResizeFilter::Triangle)
}

/// Paste `img` centred inside the panel at (x, y) of size w × h
fn place(canvas: &mut RgbImage, img: &RgbImage, x: u32, y: u32, w: u32, h: u32) {
    let fitted = fit_within(img, w, h);
    let ox = x + (w.saturating_sub(fitted.width())) / 2;
    let oy = y + (h.saturating_sub(fitted.height())) / 2;
    imageops::overlay(canvas, &fitted, ox as i64, oy as i64);
}

/// Rasterize a figure: a single panel, or composite plus channel facets
pub fn figure_png(figure: &Figure, config: &ViewerConfig) -> RgbImage {
    let composite = figure.composite.to_rgb();

    if !figure.is_multichannel() {
        let (w, h) = config.resolve_figure_size(composite.dimensions());
        let mut canvas = RgbImage::from_pixel(w, h, BACKGROUND);
        place(&mut canvas, &composite, 0, 0, w, h);
        return canvas;
    }

    let layout = config.split_layout;
    let n = figure.channels.len() as u32;
    let width = layout.main_width + layout.channel_width;
    let height = layout.main_height.max(layout.channel_height * n);

    let mut canvas = RgbImage::from_pixel(width, height, BACKGROUND);
    place(
        &mut canvas,
        &composite,
        0,
        0,
        layout.main_width,
        layout.main_height,
    );
    for (i, channel) in figure.channels.iter().enumerate() {
        place(
            &mut canvas,
            &gray_to_rgb(&channel.pixels),
            layout.main_width,
            layout.channel_height * i as u32,
            layout.channel_width,
            layout.channel_height,
        );
    }
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interact::composite::{Composite, EqualizedChannel};
    use image::{GrayImage, Luma};

    fn channel(label: &str, v: u8) -> EqualizedChannel {
        EqualizedChannel {
            label: label.to_string(),
            color: [255, 255, 255],
            pixels: GrayImage::from_pixel(40, 20, Luma([v])),
        }
    }

    #[test]
    fn test_encode_png_roundtrips_dimensions() {
        let img = RgbImage::from_pixel(7, 5, Rgb([10, 20, 30]));
        for compression in [PngCompression::Fast, PngCompression::Best] {
            let bytes = encode_png(&img, compression).unwrap();
            assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
            let decoded = image::load_from_memory(&bytes).unwrap().to_rgb8();
            assert_eq!(decoded.dimensions(), (7, 5));
            assert_eq!(decoded.get_pixel(3, 3).0, [10, 20, 30]);
        }
    }

    #[test]
    fn test_fit_within_keeps_aspect() {
        let img = RgbImage::new(400, 100);
        assert_eq!(fit_within(&img, 200, 200).dimensions(), (200, 50));
        assert_eq!(fit_within(&img, 800, 100).dimensions(), (400, 100));
    }

    #[test]
    fn test_single_figure_uses_figure_size() {
        let ch = channel("W1", 90);
        let figure = Figure {
            row: 0,
            title: None,
            composite: Composite::Gray(ch.pixels.clone()),
            channels: vec![ch],
        };
        let canvas = figure_png(&figure, &ViewerConfig::default());
        assert_eq!(canvas.dimensions(), (500, 500));
        // Letterboxed: top rows are background, centre is image
        assert_eq!(canvas.get_pixel(250, 10).0, [255, 255, 255]);
        assert_eq!(canvas.get_pixel(250, 250).0, [90, 90, 90]);
    }

    #[test]
    fn test_split_figure_layout() {
        let channels = vec![channel("a", 10), channel("b", 20), channel("c", 30)];
        let composite = Composite::Rgb(RgbImage::from_pixel(40, 20, Rgb([10, 20, 30])));
        let figure = Figure {
            row: 1,
            title: Some("s1".into()),
            composite,
            channels,
        };
        let canvas = figure_png(&figure, &ViewerConfig::default());
        // 720 + 300 wide; three 250px facets exceed the 700px main panel
        assert_eq!(canvas.dimensions(), (1020, 750));
        assert_eq!(canvas.get_pixel(360, 350).0, [10, 20, 30]);
        // Centre of the second facet
        assert_eq!(canvas.get_pixel(870, 375).0, [20, 20, 20]);
    }
}
