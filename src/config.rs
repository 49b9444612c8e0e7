//! Viewer configuration from properties
//!
//! All default values come from viewer.json via `PropertyReader`; this
//! module only turns property strings into typed settings.

use crate::interact::equalize::EqualizeParams;
use crate::interact::properties::{PlotDimension, PropertyReader};
use crate::interact::Result;
use image::codecs::png::CompressionType;
use std::path::{Path, PathBuf};

/// PNG compression level for saved figures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PngCompression {
    /// Fastest encoding, larger files
    #[default]
    Fast,
    Default,
    /// Slowest encoding, smallest files
    Best,
}

impl PngCompression {
    /// Parse from string value
    ///
    /// Validation happens in PropertyReader.get_enum()
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "default" => Self::Default,
            "best" => Self::Best,
            _ => Self::Fast,
        }
    }

    pub fn to_image(self) -> CompressionType {
        match self {
            Self::Fast => CompressionType::Fast,
            Self::Default => CompressionType::Default,
            Self::Best => CompressionType::Best,
        }
    }
}

/// Panel sizes of the split (composite + channel facets) figure
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitLayout {
    pub main_width: u32,
    pub main_height: u32,
    pub channel_width: u32,
    pub channel_height: u32,
}

impl Default for SplitLayout {
    fn default() -> Self {
        Self {
            main_width: 720,
            main_height: 700,
            channel_width: 300,
            channel_height: 250,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ViewerConfig {
    /// Click tolerance as a fraction of each axis extent
    pub fudge_factor: f64,

    /// Apply adaptive equalization (otherwise only 8-bit conversion)
    pub equalize: bool,

    /// CLAHE parameters
    pub equalize_params: EqualizeParams,

    /// Single image figure size (pixels or Auto = image size)
    pub figure_width: PlotDimension,
    pub figure_height: PlotDimension,

    /// Split figure panel sizes
    pub split_layout: SplitLayout,

    pub png_compression: PngCompression,

    /// Palette name for blended (>3 channel) composites
    pub channel_palette: String,

    /// Scatter point radius in pixels
    pub point_size: f32,

    /// Scatter point opacity
    pub point_alpha: f32,

    pub show_grid: bool,

    /// Where saved figures go (None = system temp directory)
    pub output_dir: Option<PathBuf>,
}

impl ViewerConfig {
    /// Create config from viewer properties
    pub fn from_properties(props: &PropertyReader) -> Self {
        let fudge_factor = props.get_f64_in_range("click.fudge.factor", 0.0, 0.5);

        let equalize = props.get_bool("equalize");

        // "auto" or "" → 1/8 of the image; "64" → 64×64 tiles
        let kernel_size = match PlotDimension::parse(
            &props.get_string("equalize.kernel.size"),
            PlotDimension::Auto,
        ) {
            PlotDimension::Auto => None,
            PlotDimension::Pixels(px) => Some((px as usize, px as usize)),
        };
        let equalize_params = EqualizeParams {
            kernel_size,
            clip_limit: props.get_f64_in_range("equalize.clip.limit", 0.0, 1.0),
            nbins: props.get_usize("equalize.nbins").clamp(2, 65536),
        };

        let figure_width =
            PlotDimension::parse(&props.get_string("figure.width"), PlotDimension::Pixels(500));
        let figure_height =
            PlotDimension::parse(&props.get_string("figure.height"), PlotDimension::Pixels(500));

        let defaults = SplitLayout::default();
        let dim = |name: &str, fallback: u32| {
            PlotDimension::parse(&props.get_string(name), PlotDimension::Pixels(fallback))
                .resolve(fallback)
        };
        let split_layout = SplitLayout {
            main_width: dim("split.main.width", defaults.main_width),
            main_height: dim("split.main.height", defaults.main_height),
            channel_width: dim("split.channel.width", defaults.channel_width),
            channel_height: dim("split.channel.height", defaults.channel_height),
        };

        let png_compression = PngCompression::parse(&props.get_enum("png.compression"));
        let channel_palette = props.get_enum("channel.palette");

        let point_size = props.get_f64_in_range("point.size", 0.1, 50.0) as f32;
        let point_alpha = props.get_f64_in_range("point.alpha", 0.0, 1.0) as f32;
        let show_grid = props.get_bool("plot.grid");

        let output_dir = props.get_optional_string("output.dir").map(PathBuf::from);

        Self {
            fudge_factor,
            equalize,
            equalize_params,
            figure_width,
            figure_height,
            split_layout,
            png_compression,
            channel_palette,
            point_size,
            point_alpha,
            show_grid,
            output_dir,
        }
    }

    /// Build config from an optional JSON property file plus `key=value`
    /// overrides (overrides win)
    pub fn load(config_path: Option<&Path>, overrides: &[String]) -> Result<Self> {
        let reader = match config_path {
            Some(path) => PropertyReader::from_json_file(path)?,
            None => PropertyReader::default(),
        };
        let reader = reader.with_overrides(overrides)?;
        Ok(Self::from_properties(&reader))
    }

    /// Resolve single-figure dimensions for an image of the given size
    pub fn resolve_figure_size(&self, image_dims: (u32, u32)) -> (u32, u32) {
        (
            self.figure_width.resolve(image_dims.0),
            self.figure_height.resolve(image_dims.1),
        )
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self::from_properties(&PropertyReader::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ViewerConfig::default();
        assert_eq!(config.fudge_factor, 0.025);
        assert!(config.equalize);
        assert_eq!(config.equalize_params, EqualizeParams::default());
        assert_eq!(config.split_layout, SplitLayout::default());
        assert_eq!(config.png_compression, PngCompression::Fast);
        assert_eq!(config.channel_palette, "CellPainting");
        assert_eq!(config.resolve_figure_size((64, 32)), (500, 500));
        assert!(config.output_dir.is_none());
        assert!(config.show_grid);
    }

    #[test]
    fn test_user_values() {
        let mut values = HashMap::new();
        values.insert("equalize.kernel.size".to_string(), "32".to_string());
        values.insert("figure.width".to_string(), "auto".to_string());
        values.insert("png.compression".to_string(), "best".to_string());
        values.insert("click.fudge.factor".to_string(), "0.9".to_string());
        values.insert("output.dir".to_string(), "/data/figs".to_string());
        let config = ViewerConfig::from_properties(&PropertyReader::new(values));

        assert_eq!(config.equalize_params.kernel_size, Some((32, 32)));
        assert_eq!(config.resolve_figure_size((64, 32)), (64, 500));
        assert_eq!(config.png_compression, PngCompression::Best);
        // Out of range falls back to the default
        assert_eq!(config.fudge_factor, 0.025);
        assert_eq!(config.output_dir, Some(PathBuf::from("/data/figs")));
    }

    #[test]
    fn test_load_file_and_overrides() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("viewer.json");
        std::fs::write(&path, r#"{"equalize": false, "point.size": 6, "channel.palette": "RGB"}"#)
            .unwrap();

        let config =
            ViewerConfig::load(Some(&path), &["point.size=2".to_string()]).unwrap();
        assert!(!config.equalize);
        assert_eq!(config.point_size, 2.0);
        assert_eq!(config.channel_palette, "RGB");

        assert!(ViewerConfig::load(None, &["no.such.key=1".to_string()]).is_err());
        assert!(ViewerConfig::load(None, &["equalize".to_string()]).is_err());
    }

    #[test]
    fn test_png_compression_parse() {
        assert_eq!(PngCompression::parse("BEST"), PngCompression::Best);
        assert_eq!(PngCompression::parse("default"), PngCompression::Default);
        assert_eq!(PngCompression::parse("anything"), PngCompression::Fast);
    }
}
