//! interact - show microscope images for points of a scatter plot
//!
//! Subcommands:
//! - `view`: scatter window; clicking a point shows its images
//! - `show`: write the figure of one row as HTML or PNG
//! - `locate`: list the rows a click would select
//! - `replace-paths`: repair image path columns of a table

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use interact_viewer::config::ViewerConfig;
use interact_viewer::gui;
use interact_viewer::interact::hit_test::{locate, nearest_hit};
use interact_viewer::interact::paths::{replace_paths, replace_substring};
use interact_viewer::interact::{AxisLimits, ChannelSpec, ClickEvent, SampleTable};
use interact_viewer::pipeline::ViewerSession;
use interact_viewer::render;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "interact", version)]
#[command(about = "Display microscope images from interactive scatter plots", long_about = None)]
struct Cli {
    /// Log more (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// JSON file of viewer properties, e.g. {"equalize": false}
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Override one viewer property (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE", global = true)]
    set: Vec<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Open the interactive scatter window
    View {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Render the images of one row to a file
    Show {
        #[command(flatten)]
        source: SourceArgs,

        /// Row index (0-based)
        #[arg(long)]
        row: usize,

        #[arg(long, value_enum, default_value_t = Format::Html)]
        format: Format,

        /// Output file (default: random name in the output directory)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Print the rows inside the tolerance window of a click
    Locate {
        #[command(flatten)]
        table: TableArgs,

        #[arg(long, allow_negative_numbers = true)]
        click_x: f64,

        #[arg(long, allow_negative_numbers = true)]
        click_y: f64,

        /// Visible x range MIN,MAX (default: data range with margins)
        #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
        xlim: Vec<f64>,

        /// Visible y range MIN,MAX (default: data range with margins)
        #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
        ylim: Vec<f64>,
    },

    /// Rewrite image paths after a dataset moved
    ReplacePaths {
        /// Input CSV
        #[arg(long, value_name = "FILE")]
        table: PathBuf,

        /// Path columns to rewrite
        #[arg(long, value_delimiter = ',', required = true)]
        columns: Vec<String>,

        /// New root; the last --last-n segments of each path are kept
        #[arg(long, conflicts_with_all = ["original", "replacement"])]
        prefix: Option<String>,

        /// Trailing path segments to keep (0 keeps the whole path)
        #[arg(long, default_value_t = 4)]
        last_n: usize,

        /// Substring to replace
        #[arg(long, requires = "replacement")]
        original: Option<String>,

        #[arg(long, requires = "original")]
        replacement: Option<String>,

        /// Output CSV
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Html,
    Png,
}

#[derive(Args)]
struct TableArgs {
    /// CSV file with one row per sample
    #[arg(long, value_name = "FILE")]
    table: PathBuf,

    /// Column plotted on the x axis
    #[arg(short, long, default_value = "x")]
    x: String,

    /// Column plotted on the y axis
    #[arg(short, long, default_value = "y")]
    y: String,
}

#[derive(Args)]
struct SourceArgs {
    #[command(flatten)]
    table: TableArgs,

    /// Single greyscale image column
    #[arg(long, value_name = "COL", help_heading = "Channels")]
    image: Option<String>,

    /// Image columns in red,green,blue order (more than three are blended)
    #[arg(long, value_delimiter = ',', value_name = "COLS", help_heading = "Channels")]
    channels: Vec<String>,

    /// Slot assignment, e.g. --channel red=FullPath_W5 (repeatable)
    #[arg(long, value_name = "SLOT=COL", help_heading = "Channels")]
    channel: Vec<String>,

    /// Column name prefix, combined with --numbers
    #[arg(long, requires = "numbers", help_heading = "Channels")]
    prefix: Option<String>,

    /// Channel numbers appended to --prefix, e.g. 5,4,1
    #[arg(long, value_delimiter = ',', requires = "prefix", help_heading = "Channels")]
    numbers: Vec<u32>,

    /// Column shown as the figure title
    #[arg(long, value_name = "COL")]
    title: Option<String>,
}

impl SourceArgs {
    fn channel_spec(&self) -> Result<ChannelSpec> {
        let modes = [
            self.image.is_some(),
            !self.channels.is_empty(),
            !self.channel.is_empty(),
            self.prefix.is_some(),
        ];
        match modes.iter().filter(|m| **m).count() {
            0 => bail!("Select images with --image, --channels, --channel or --prefix/--numbers"),
            1 => {}
            _ => bail!("Use only one of --image, --channels, --channel or --prefix/--numbers"),
        }

        if let Some(col) = &self.image {
            return Ok(ChannelSpec::Single(col.clone()));
        }
        if !self.channels.is_empty() {
            return Ok(ChannelSpec::List(self.channels.clone()));
        }
        if !self.channel.is_empty() {
            return Ok(ChannelSpec::parse_map_args(&self.channel)?);
        }
        match &self.prefix {
            Some(prefix) => Ok(ChannelSpec::Prefix {
                prefix: prefix.clone(),
                numbers: self.numbers.clone(),
            }),
            None => bail!("--numbers requires --prefix"),
        }
    }

    fn session(&self, config: ViewerConfig) -> Result<ViewerSession> {
        let spec = self.channel_spec()?;
        let table = SampleTable::load(&self.table.table)
            .with_context(|| format!("Failed to load {}", self.table.table.display()))?;
        Ok(ViewerSession::new(
            table,
            self.table.x.as_str(),
            self.table.y.as_str(),
            spec,
            self.title.clone(),
            config,
        )?)
    }
}

fn range_arg(name: &str, values: &[f64]) -> Result<Option<(f64, f64)>> {
    match values {
        [] => Ok(None),
        [lo, hi] => Ok(Some((*lo, *hi))),
        _ => bail!("--{} expects MIN,MAX", name),
    }
}

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();

    if let Err(e) = run(cli) {
        eprintln!("✗ {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = ViewerConfig::load(cli.config.as_deref(), &cli.set)?;
    log::debug!("{:?}", config);

    match cli.command {
        Command::View { source } => {
            let session = source.session(config)?;
            gui::run(session)
        }
        Command::Show {
            source,
            row,
            format,
            output,
        } => {
            let session = source.session(config)?;
            let figure = session.figure_for_row(row)?;
            let config = session.config();

            match format {
                Format::Html => {
                    let html = render::figure_html(&figure, config)?;
                    let path =
                        render::write_figure(&html, output.as_deref(), config.output_dir.as_deref())?;
                    println!("✓ Saved {}", path.display());
                }
                Format::Png => {
                    let canvas = render::figure_png(&figure, config);
                    let path = match output {
                        Some(path) => path,
                        None => config
                            .output_dir
                            .clone()
                            .unwrap_or_else(std::env::temp_dir)
                            .join(render::random_png_name()),
                    };
                    let bytes = render::save_png(&canvas, &path, config.png_compression)?;
                    println!(
                        "✓ Saved {} ({} bytes, {}×{})",
                        path.display(),
                        bytes,
                        canvas.width(),
                        canvas.height()
                    );
                }
            }
            Ok(())
        }
        Command::Locate {
            table,
            click_x,
            click_y,
            xlim,
            ylim,
        } => {
            let data = SampleTable::load(&table.table)
                .with_context(|| format!("Failed to load {}", table.table.display()))?;
            let points = data.coords(&table.x, &table.y)?;
            let defaults = AxisLimits::for_points(&points);
            let limits = AxisLimits::new(
                range_arg("xlim", &xlim)?.unwrap_or(defaults.x),
                range_arg("ylim", &ylim)?.unwrap_or(defaults.y),
            );

            let click = ClickEvent::new(click_x, click_y);
            let hits = locate(&points, click, &limits, config.fudge_factor);
            let nearest = nearest_hit(&points, click, &limits, config.fudge_factor);

            if hits.is_empty() {
                println!("No rows within the click window");
            }
            for (i, [x, y]) in hits {
                let marker = if Some(i) == nearest { "*" } else { " " };
                println!("{} row {}: ({}, {})", marker, i, x, y);
            }
            Ok(())
        }
        Command::ReplacePaths {
            table,
            columns,
            prefix,
            last_n,
            original,
            replacement,
            output,
        } => {
            let data = SampleTable::load(&table)
                .with_context(|| format!("Failed to load {}", table.display()))?;
            let fixed = match (prefix, original, replacement) {
                (Some(prefix), None, None) => replace_paths(&data, &columns, &prefix, last_n)?,
                (None, Some(original), Some(replacement)) => {
                    replace_substring(&data, &columns, &original, &replacement)?
                }
                _ => bail!("Give either --prefix or --original with --replacement"),
            };
            fixed.write_csv(&output)?;
            println!("✓ Saved {} ({} rows)", output.display(), fixed.len());
            Ok(())
        }
    }
}
