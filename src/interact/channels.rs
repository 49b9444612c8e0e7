//! Channel selection
//!
//! Which path columns make up a sample's image, and where each one lands
//! in the displayed composite.

use super::error::{Result, ViewerError};
use super::paths::column_names_for;
use std::fmt;

/// Slot of an RGB composite
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChannelSlot {
    Red,
    Green,
    Blue,
}

impl ChannelSlot {
    pub const ALL: [ChannelSlot; 3] = [ChannelSlot::Red, ChannelSlot::Green, ChannelSlot::Blue];

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "red" => Some(Self::Red),
            "green" => Some(Self::Green),
            "blue" => Some(Self::Blue),
            _ => None,
        }
    }

    /// Index into an RGB pixel
    pub fn index(self) -> usize {
        match self {
            Self::Red => 0,
            Self::Green => 1,
            Self::Blue => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Green => "green",
            Self::Blue => "blue",
        }
    }

    pub fn color(self) -> [u8; 3] {
        let mut c = [0u8; 3];
        c[self.index()] = 255;
        c
    }
}

impl fmt::Display for ChannelSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How the image columns of a row are chosen
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelSpec {
    /// One grayscale image column
    Single(String),
    /// Columns in red, green, blue order; more than three are blended
    List(Vec<String>),
    /// Explicit slot assignment, up to one column per slot
    Map(Vec<(ChannelSlot, String)>),
    /// Columns named `prefix + number`, in the order given
    Prefix { prefix: String, numbers: Vec<u32> },
}

impl ChannelSpec {
    /// Build a slot map from `name → column` pairs
    ///
    /// At most three entries are allowed and every name must be one of
    /// red, green or blue.
    pub fn from_map<K, V>(pairs: Vec<(K, V)>) -> Result<Self>
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        if pairs.len() > 3 {
            return Err(ViewerError::TooManyChannels(pairs.len()));
        }

        let unexpected: Vec<String> = pairs
            .iter()
            .filter(|(k, _)| ChannelSlot::parse(k.as_ref()).is_none())
            .map(|(k, _)| k.as_ref().to_string())
            .collect();
        if !unexpected.is_empty() {
            return Err(ViewerError::UnexpectedChannelName(unexpected));
        }

        let mut slots: Vec<(ChannelSlot, String)> = Vec::with_capacity(pairs.len());
        for (k, v) in pairs {
            let slot = ChannelSlot::parse(k.as_ref()).ok_or_else(|| {
                ViewerError::UnexpectedChannelName(vec![k.as_ref().to_string()])
            })?;
            if slots.iter().any(|(s, _)| *s == slot) {
                return Err(ViewerError::UnexpectedChannelName(vec![format!(
                    "{} (repeated)",
                    slot
                )]));
            }
            slots.push((slot, v.into()));
        }
        slots.sort_by_key(|(s, _)| *s);

        Ok(Self::Map(slots))
    }

    /// Parse `red=COL` style arguments
    pub fn parse_map_args(args: &[String]) -> Result<Self> {
        let mut pairs = Vec::with_capacity(args.len());
        for arg in args {
            let (k, v) = arg.split_once('=').ok_or_else(|| {
                ViewerError::Config(format!("Expected channel=column, got '{}'", arg))
            })?;
            pairs.push((k.trim().to_lowercase(), v.trim().to_string()));
        }
        Self::from_map(pairs)
    }

    /// Column names in display order
    pub fn columns(&self) -> Vec<String> {
        match self {
            Self::Single(col) => vec![col.clone()],
            Self::List(cols) => cols.clone(),
            Self::Map(slots) => slots.iter().map(|(_, c)| c.clone()).collect(),
            Self::Prefix { prefix, numbers } => column_names_for(prefix, numbers),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::List(cols) => cols.len(),
            Self::Map(slots) => slots.len(),
            Self::Prefix { numbers, .. } => numbers.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Shown as one greyscale frame: a single column that no slot map
    /// places explicitly
    pub fn is_grayscale(&self) -> bool {
        match self {
            Self::Single(_) => true,
            Self::List(_) | Self::Prefix { .. } => self.len() == 1,
            Self::Map(_) => false,
        }
    }

    /// RGB slot for each column, when the columns fit in one
    ///
    /// Ordered specs with up to three columns fill red, green, blue in
    /// turn; longer ones return None and are blended instead.
    pub fn slots(&self) -> Option<Vec<ChannelSlot>> {
        match self {
            Self::Single(_) => None,
            Self::Map(slots) => Some(slots.iter().map(|(s, _)| *s).collect()),
            Self::List(_) | Self::Prefix { .. } => {
                let n = self.len();
                if n <= 3 {
                    Some(ChannelSlot::ALL[..n].to_vec())
                } else {
                    None
                }
            }
        }
    }

    /// Facet label for the i-th column
    pub fn label(&self, i: usize) -> String {
        match self {
            Self::Map(slots) => slots
                .get(i)
                .map(|(s, c)| format!("{} ({})", c, s))
                .unwrap_or_default(),
            _ => self.columns().get(i).cloned().unwrap_or_default(),
        }
    }
}
