//! Static figure rendering
//!
//! - `png.rs`: PNG encoding and the tiled split-figure canvas
//! - `html.rs`: standalone HTML pages with embedded PNG panels

pub mod html;
pub mod png;

pub use html::{figure_html, single_figure_html, split_figure_html, write_figure};
pub use png::{encode_png, figure_png, random_png_name, save_png};
