//! Click-to-figure pipeline
//!
//! Shared between the GUI and the `show`/`locate` commands.
//!
//! The pipeline:
//! 1. Hit-tests a click against the scatter coordinates
//! 2. Looks up the image paths of the selected row
//! 3. Opens and equalizes every channel
//! 4. Stacks the channels into a composite

use crate::config::ViewerConfig;
use crate::interact::composite::{channel_color, Composite, EqualizedChannel};
use crate::interact::equalize::open_equalize;
use crate::interact::hit_test::{locate, nearest_hit};
use crate::interact::palettes::channel_colors;
use crate::interact::{AxisLimits, ChannelSpec, ClickEvent, Result, SampleTable, ViewerError};
use std::path::Path;
use std::time::Instant;

/// Everything needed to draw one selected sample
#[derive(Debug, Clone)]
pub struct Figure {
    pub row: usize,
    pub title: Option<String>,
    pub composite: Composite,
    /// Equalized channels in display order (one for single images)
    pub channels: Vec<EqualizedChannel>,
}

impl Figure {
    /// Figures with several channels are shown split into facets
    pub fn is_multichannel(&self) -> bool {
        self.channels.len() > 1
    }
}

/// A loaded table bound to scatter axes and image columns
pub struct ViewerSession {
    table: SampleTable,
    x_col: String,
    y_col: String,
    spec: ChannelSpec,
    title_col: Option<String>,
    config: ViewerConfig,
    points: Vec<[f64; 2]>,
}

impl ViewerSession {
    /// Bind a table to its scatter and image columns
    ///
    /// Fails if any referenced column is missing or no image column is given.
    pub fn new(
        table: SampleTable,
        x_col: impl Into<String>,
        y_col: impl Into<String>,
        spec: ChannelSpec,
        title_col: Option<String>,
        config: ViewerConfig,
    ) -> Result<Self> {
        let x_col = x_col.into();
        let y_col = y_col.into();

        if spec.is_empty() {
            return Err(ViewerError::NoChannels);
        }

        let mut required = vec![x_col.clone(), y_col.clone()];
        required.extend(spec.columns());
        if let Some(title) = &title_col {
            required.push(title.clone());
        }
        table.require_columns(&required)?;

        let points = table.coords(&x_col, &y_col)?;
        log::info!(
            "Session: {} rows, x={}, y={}, channels={:?}",
            table.len(),
            x_col,
            y_col,
            spec.columns()
        );

        Ok(Self {
            table,
            x_col,
            y_col,
            spec,
            title_col,
            config,
            points,
        })
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn axis_names(&self) -> (&str, &str) {
        (&self.x_col, &self.y_col)
    }

    /// Scatter coordinates in table order
    pub fn points(&self) -> &[[f64; 2]] {
        &self.points
    }

    /// Data range with margins, or a unit box for an empty table
    pub fn default_limits(&self) -> AxisLimits {
        AxisLimits::for_points(&self.points)
    }

    /// Every row inside the click tolerance window, with its coordinates
    pub fn locate(&self, click: ClickEvent, limits: &AxisLimits) -> Vec<(usize, [f64; 2])> {
        locate(&self.points, click, limits, self.config.fudge_factor)
    }

    /// Row picked by a click, if any
    pub fn hit(&self, click: ClickEvent, limits: &AxisLimits) -> Option<usize> {
        nearest_hit(&self.points, click, limits, self.config.fudge_factor)
    }

    /// Handle a click on the scatter
    ///
    /// A miss is `Ok(None)`; a hit loads the figure for the nearest row.
    pub fn handle_click(&self, click: ClickEvent, limits: &AxisLimits) -> Result<Option<Figure>> {
        match self.hit(click, limits) {
            Some(row) => {
                log::info!("Click ({:.3}, {:.3}) → row {}", click.x, click.y, row);
                self.figure_for_row(row).map(Some)
            }
            None => {
                log::debug!("Click ({:.3}, {:.3}) hit nothing", click.x, click.y);
                Ok(None)
            }
        }
    }

    /// Load, equalize and stack the images of one row
    pub fn figure_for_row(&self, row: usize) -> Result<Figure> {
        if row >= self.table.len() {
            return Err(ViewerError::RowOutOfRange {
                row,
                len: self.table.len(),
            });
        }

        let t0 = Instant::now();
        let columns = self.spec.columns();
        let palette = channel_colors(&self.config.channel_palette, columns.len());

        let mut channels = Vec::with_capacity(columns.len());
        for (i, column) in columns.iter().enumerate() {
            let path = self.table.path_at(column, row)?;
            let pixels = open_equalize(
                Path::new(&path),
                &self.config.equalize_params,
                self.config.equalize,
            )?;
            channels.push(EqualizedChannel {
                label: self.spec.label(i),
                color: channel_color(&self.spec, i, &palette),
                pixels,
            });
        }

        let composite = Composite::from_channels(&self.spec, &channels)?;

        let title = match &self.title_col {
            Some(col) => self.table.string_at(col, row)?,
            None => None,
        };

        log::info!(
            "Row {}: {} channel(s), {:?} [{:.3}s]",
            row,
            channels.len(),
            composite.dimensions(),
            t0.elapsed().as_secs_f64()
        );

        Ok(Figure {
            row,
            title,
            composite,
            channels,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};
    use polars::prelude::*;
    use tempfile::TempDir;

    fn write_png(dir: &TempDir, name: &str, w: u32, h: u32) -> String {
        let img = GrayImage::from_fn(w, h, |x, y| Luma([((x * 16 + y * 4) % 256) as u8]));
        let path = dir.path().join(name);
        img.save(&path).unwrap();
        path.to_string_lossy().into_owned()
    }

    fn session(dir: &TempDir, spec: ChannelSpec) -> ViewerSession {
        let a = write_png(dir, "a.png", 16, 12);
        let b = write_png(dir, "b.png", 16, 12);
        let df = df! {
            "x" => [0.0, 10.0, 20.0],
            "y" => [0.0, 10.0, 20.0],
            "W1" => [a.as_str(), a.as_str(), a.as_str()],
            "W2" => [b.as_str(), b.as_str(), b.as_str()],
            "name" => ["s0", "s1", "s2"],
        }
        .unwrap();
        ViewerSession::new(
            SampleTable::from_dataframe(df),
            "x",
            "y",
            spec,
            Some("name".to_string()),
            ViewerConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_new_rejects_missing_columns() {
        let df = df! { "x" => [1.0], "y" => [2.0] }.unwrap();
        let result = ViewerSession::new(
            SampleTable::from_dataframe(df),
            "x",
            "y",
            ChannelSpec::Single("W1".into()),
            None,
            ViewerConfig::default(),
        );
        assert!(matches!(result, Err(ViewerError::MissingColumn(c)) if c == "W1"));
    }

    #[test]
    fn test_new_rejects_empty_channels() {
        for spec in [
            ChannelSpec::Prefix {
                prefix: "W".into(),
                numbers: vec![],
            },
            ChannelSpec::List(vec![]),
        ] {
            let df = df! { "x" => [1.0], "y" => [2.0] }.unwrap();
            let result = ViewerSession::new(
                SampleTable::from_dataframe(df),
                "x",
                "y",
                spec,
                None,
                ViewerConfig::default(),
            );
            assert!(matches!(result, Err(ViewerError::NoChannels)));
        }
    }

    #[test]
    fn test_default_limits_cover_points() {
        let dir = TempDir::new().unwrap();
        let s = session(&dir, ChannelSpec::Single("W1".into()));
        let limits = s.default_limits();
        assert!(limits.x.0 < 0.0 && limits.x.1 > 20.0);
        assert!(limits.y.0 < 0.0 && limits.y.1 > 20.0);
    }

    #[test]
    fn test_handle_click_hit_and_miss() {
        let dir = TempDir::new().unwrap();
        let s = session(&dir, ChannelSpec::Single("W1".into()));
        let limits = AxisLimits::new((0.0, 20.0), (0.0, 20.0));

        // Window half-width is 0.5 on both axes
        let fig = s
            .handle_click(ClickEvent::new(10.2, 9.9), &limits)
            .unwrap()
            .unwrap();
        assert_eq!(fig.row, 1);
        assert_eq!(fig.title.as_deref(), Some("s1"));
        assert!(matches!(fig.composite, Composite::Gray(_)));
        assert_eq!(fig.composite.dimensions(), (16, 12));
        assert!(!fig.is_multichannel());

        assert!(s
            .handle_click(ClickEvent::new(5.0, 5.0), &limits)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_figure_for_row_rgb() {
        let dir = TempDir::new().unwrap();
        let s = session(&dir, ChannelSpec::List(vec!["W1".into(), "W2".into()]));
        let fig = s.figure_for_row(2).unwrap();
        assert!(fig.is_multichannel());
        assert_eq!(fig.channels[0].color, [255, 0, 0]);
        assert_eq!(fig.channels[1].color, [0, 255, 0]);
        match &fig.composite {
            Composite::Rgb(img) => {
                // Blue slot is empty
                assert!(img.pixels().all(|p| p[2] == 0));
            }
            Composite::Gray(_) => panic!("expected RGB"),
        }
        assert!(matches!(
            s.figure_for_row(3),
            Err(ViewerError::RowOutOfRange { row: 3, len: 3 })
        ));
    }

    #[test]
    fn test_locate_lists_every_hit() {
        let dir = TempDir::new().unwrap();
        let s = session(&dir, ChannelSpec::Single("W1".into()));
        let limits = AxisLimits::new((0.0, 1000.0), (0.0, 1000.0));
        // Window half-width 25 covers the first two points
        let hits = s.locate(ClickEvent::new(5.0, 5.0), &limits);
        assert_eq!(hits, vec![(0, [0.0, 0.0]), (1, [10.0, 10.0])]);
    }

    #[test]
    fn test_missing_image_is_an_error() {
        let df = df! {
            "x" => [1.0],
            "y" => [1.0],
            "W1" => ["/nonexistent/image.png"],
        }
        .unwrap();
        let s = ViewerSession::new(
            SampleTable::from_dataframe(df),
            "x",
            "y",
            ChannelSpec::Single("W1".into()),
            None,
            ViewerConfig::default(),
        )
        .unwrap();
        assert!(s.figure_for_row(0).is_err());
    }
}
