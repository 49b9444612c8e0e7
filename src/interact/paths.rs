//! Image path lookup and repair
//!
//! Image paths recorded on an acquisition cluster rarely resolve on the
//! machine doing the viewing. These helpers rebuild them against a local
//! prefix, keeping the trailing directory structure.

use super::error::Result;
use super::table::SampleTable;
use std::path::{Path, MAIN_SEPARATOR};

/// Column names for a prefix + channel-number convention
///
/// `("URL_W", [5, 4, 1])` → `["URL_W5", "URL_W4", "URL_W1"]`
pub fn column_names_for(prefix: &str, numbers: &[u32]) -> Vec<String> {
    numbers.iter().map(|n| format!("{}{}", prefix, n)).collect()
}

/// Paths for one row under the prefix + channel-number convention, in the
/// order of `numbers`
pub fn get_paths(
    table: &SampleTable,
    row: usize,
    prefix: &str,
    numbers: &[u32],
) -> Result<Vec<String>> {
    column_names_for(prefix, numbers)
        .iter()
        .map(|column| table.path_at(column, row))
        .collect()
}

/// The last `last_n` segments of a path, joined by the platform separator
///
/// `last_n == 0` keeps every segment.
pub fn end_path(path: &str, last_n: usize) -> String {
    let parts: Vec<&str> = path.split(MAIN_SEPARATOR).collect();
    let start = match last_n {
        0 => 0,
        n => parts.len().saturating_sub(n),
    };
    parts[start..].join(&MAIN_SEPARATOR.to_string())
}

/// Append the last `last_n` segments of a broken path to `prefix`
///
/// `fix_path("/wrong/path/exp/date/plate/date/img.tiff", "/mnt/exp", 4)`
/// → `"/mnt/exp/date/plate/date/img.tiff"`
pub fn fix_path(path: &str, prefix: &str, last_n: usize) -> String {
    let suffix = end_path(path, last_n);
    Path::new(prefix)
        .join(suffix.trim_start_matches(MAIN_SEPARATOR))
        .to_string_lossy()
        .into_owned()
}

/// Re-prefix every path in `columns`; returns only those columns
pub fn replace_paths<S: AsRef<str>>(
    table: &SampleTable,
    columns: &[S],
    prefix: &str,
    last_n: usize,
) -> Result<SampleTable> {
    let mut out = table.select(columns)?;
    for column in columns {
        out = out.map_string_column(column.as_ref(), |p| fix_path(p, prefix, last_n))?;
    }
    log::info!(
        "Re-prefixed {} column(s) with '{}' (keeping last {} segments)",
        columns.len(),
        prefix,
        last_n
    );
    Ok(out)
}

/// Literal substring replacement in every path of `columns`; returns only
/// those columns
pub fn replace_substring<S: AsRef<str>>(
    table: &SampleTable,
    columns: &[S],
    original: &str,
    replacement: &str,
) -> Result<SampleTable> {
    let mut out = table.select(columns)?;
    for column in columns {
        out = out.map_string_column(column.as_ref(), |p| p.replace(original, replacement))?;
    }
    Ok(out)
}
