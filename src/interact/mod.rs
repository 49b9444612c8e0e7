//! Sample table, hit testing and image handling
//!
//! Structure:
//! - `table.rs`: CSV sample tables
//! - `hit_test.rs`: click-to-point selection
//! - `paths.rs`: path column conventions and path repair
//! - `channels.rs`: channel selection and validation
//! - `equalize.rs`: image loading and adaptive equalization
//! - `composite.rs`: RGB stacking and blending
//! - `palettes.rs`: channel colour palettes
//! - `properties.rs`: property registry backing the viewer config
//! - `error.rs`: error types

pub mod channels;
pub mod composite;
pub mod equalize;
pub mod error;
pub mod palettes;
pub mod paths;
pub mod properties;
pub mod table;

pub use channels::{ChannelSlot, ChannelSpec};
pub use composite::{Composite, EqualizedChannel};
pub use equalize::EqualizeParams;
pub use error::{Result, ViewerError};
pub use hit_test::{AxisLimits, ClickEvent};
pub use table::SampleTable;
