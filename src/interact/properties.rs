//! Viewer property definitions with defaults from viewer.json
//!
//! viewer.json is embedded at compile time and is the single place where
//! property defaults and valid enum values live. User values come from an
//! optional JSON config file and `key=value` overrides on the command line.

use super::error::{Result, ViewerError};
use std::collections::HashMap;
use std::path::Path;

/// viewer.json embedded at compile time
const VIEWER_JSON: &str = include_str!("../../viewer.json");

/// Property definition from viewer.json
#[derive(Debug, Clone)]
pub struct PropertyDef {
    pub name: String,
    pub kind: PropertyKind,
    pub default_value: String,
    pub description: String,
    /// For EnumeratedProperty, the valid values
    pub valid_values: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKind {
    String,
    Boolean,
    Enumerated,
}

/// Registry of all viewer properties with their defaults
#[derive(Debug, Default)]
pub struct PropertyRegistry {
    properties: HashMap<String, PropertyDef>,
}

impl PropertyRegistry {
    /// Parse a viewer.json document
    pub fn from_json(json: &str) -> Result<Self> {
        let json: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| ViewerError::Config(format!("Failed to parse viewer.json: {}", e)))?;

        let properties_array = json["properties"]
            .as_array()
            .ok_or_else(|| ViewerError::Config("viewer.json missing 'properties'".into()))?;

        let mut properties = HashMap::new();

        for prop in properties_array {
            let name = prop["name"]
                .as_str()
                .ok_or_else(|| ViewerError::Config("property missing 'name'".into()))?
                .to_string();

            let kind = match prop["kind"].as_str() {
                Some("StringProperty") => PropertyKind::String,
                Some("BooleanProperty") => PropertyKind::Boolean,
                Some("EnumeratedProperty") => PropertyKind::Enumerated,
                other => {
                    return Err(ViewerError::Config(format!(
                        "Unknown property kind {:?} for '{}'",
                        other, name
                    )))
                }
            };

            let default_value = prop["defaultValue"].as_str().unwrap_or("").to_string();
            let description = prop["description"].as_str().unwrap_or("").to_string();

            let valid_values = if kind == PropertyKind::Enumerated {
                prop["values"].as_array().map(|arr| {
                    arr.iter()
                        .filter_map(|v| v.as_str().map(|s| s.to_string()))
                        .collect()
                })
            } else {
                None
            };

            properties.insert(
                name.clone(),
                PropertyDef {
                    name,
                    kind,
                    default_value,
                    description,
                    valid_values,
                },
            );
        }

        Ok(Self { properties })
    }

    /// Get the default value for a property
    pub fn get_default(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(|p| p.default_value.as_str())
    }

    /// Get the property definition
    pub fn get_property(&self, name: &str) -> Option<&PropertyDef> {
        self.properties.get(name)
    }

    /// Check if a value is valid for an enumerated property
    pub fn is_valid_enum_value(&self, name: &str, value: &str) -> bool {
        self.properties
            .get(name)
            .and_then(|p| p.valid_values.as_ref())
            .map(|values| values.iter().any(|v| v.eq_ignore_ascii_case(value)))
            .unwrap_or(true) // Non-enumerated properties accept any value
    }
}

static REGISTRY: std::sync::OnceLock<PropertyRegistry> = std::sync::OnceLock::new();

/// Get the global property registry
pub fn registry() -> &'static PropertyRegistry {
    REGISTRY.get_or_init(|| {
        PropertyRegistry::from_json(VIEWER_JSON).unwrap_or_else(|e| {
            log::error!("Failed to load viewer.json: {}", e);
            PropertyRegistry::default()
        })
    })
}

/// Typed property reader
///
/// User values take precedence; anything unset or invalid falls back to the
/// default from viewer.json.
#[derive(Debug, Clone, Default)]
pub struct PropertyReader {
    user_values: HashMap<String, String>,
}

impl PropertyReader {
    pub fn new(user_values: HashMap<String, String>) -> Self {
        let user_values = user_values
            .into_iter()
            .filter(|(_, v)| !v.is_empty()) // Empty = not set
            .collect();
        Self { user_values }
    }

    /// Read user values from a flat JSON object, e.g. `{"equalize": false}`
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let map: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&json)
            .map_err(|e| {
                ViewerError::Config(format!("Failed to parse {}: {}", path.display(), e))
            })?;

        let mut user_values = HashMap::new();
        for (key, value) in map {
            let value_str = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::Bool(b) => b.to_string(),
                other => {
                    log::warn!("Ignoring non-scalar value for '{}': {}", key, other);
                    continue;
                }
            };
            user_values.insert(key, value_str);
        }

        log::debug!(
            "Loaded {} properties from {}",
            user_values.len(),
            path.display()
        );
        Ok(Self::new(user_values))
    }

    /// Apply `key=value` overrides on top of the current values
    pub fn with_overrides(mut self, overrides: &[String]) -> Result<Self> {
        for item in overrides {
            let (key, value) = item.split_once('=').ok_or_else(|| {
                ViewerError::Config(format!("Expected key=value, got '{}'", item))
            })?;
            let key = key.trim();
            if registry().get_property(key).is_none() {
                return Err(ViewerError::Config(format!("Unknown property '{}'", key)));
            }
            self.user_values
                .insert(key.to_string(), value.trim().to_string());
        }
        Ok(self)
    }

    /// Get string property (user value or default from viewer.json)
    pub fn get_string(&self, name: &str) -> String {
        if let Some(value) = self.user_values.get(name) {
            return value.clone();
        }
        registry().get_default(name).unwrap_or("").to_string()
    }

    /// Get optional string property (None if empty)
    pub fn get_optional_string(&self, name: &str) -> Option<String> {
        let value = self.get_string(name);
        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }

    /// Get enumerated property with validation
    pub fn get_enum(&self, name: &str) -> String {
        let reg = registry();
        let default = reg.get_default(name).unwrap_or("");

        if let Some(value) = self.user_values.get(name) {
            if reg.is_valid_enum_value(name, value) {
                return value.clone();
            }
            let valid_values = reg
                .get_property(name)
                .and_then(|p| p.valid_values.as_ref())
                .map(|v| v.join(", "))
                .unwrap_or_default();
            log::warn!(
                "Invalid value '{}' for property '{}'. Valid values: [{}]. Using default: '{}'",
                value,
                name,
                valid_values,
                default
            );
        }

        default.to_string()
    }

    /// Get boolean property ("true"/"false")
    pub fn get_bool(&self, name: &str) -> bool {
        let default = registry().get_default(name) == Some("true");
        match self.user_values.get(name).map(|s| s.to_ascii_lowercase()) {
            Some(v) if v == "true" => true,
            Some(v) if v == "false" => false,
            Some(other) => {
                log::warn!(
                    "Invalid boolean value '{}' for property '{}'. Using default: {}",
                    other,
                    name,
                    default
                );
                default
            }
            None => default,
        }
    }

    /// Get f64 property
    pub fn get_f64(&self, name: &str) -> f64 {
        let default = registry()
            .get_default(name)
            .and_then(|s| s.parse::<f64>().ok())
            .unwrap_or(0.0);

        match self.user_values.get(name) {
            None => default,
            Some(value) => value.parse::<f64>().unwrap_or_else(|_| {
                log::warn!(
                    "Invalid numeric value '{}' for property '{}'. Using default: {}",
                    value,
                    name,
                    default
                );
                default
            }),
        }
    }

    /// Get f64 property with range validation
    pub fn get_f64_in_range(&self, name: &str, min: f64, max: f64) -> f64 {
        let value = self.get_f64(name);
        let default = registry()
            .get_default(name)
            .and_then(|s| s.parse::<f64>().ok())
            .unwrap_or(0.0);

        if value >= min && value <= max {
            value
        } else {
            log::warn!(
                "Value {} for property '{}' out of range [{}, {}]. Using default: {}",
                value,
                name,
                min,
                max,
                default
            );
            default
        }
    }

    /// Get usize property
    pub fn get_usize(&self, name: &str) -> usize {
        let default = registry()
            .get_default(name)
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(0);

        match self.user_values.get(name) {
            None => default,
            Some(value) => value.parse::<usize>().unwrap_or_else(|_| {
                log::warn!(
                    "Invalid integer value '{}' for property '{}'. Using default: {}",
                    value,
                    name,
                    default
                );
                default
            }),
        }
    }
}

/// Figure or tile dimension - either explicit pixels or "auto"
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PlotDimension {
    #[default]
    Auto,
    Pixels(u32),
}

impl PlotDimension {
    /// Parse from string property value
    ///
    /// Valid formats:
    /// - "auto" or "" (empty) → Auto
    /// - "500" → Pixels(500) if in valid range [8, 10000]
    pub fn parse(value: &str, default: PlotDimension) -> Self {
        let trimmed = value.trim();

        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("auto") {
            return PlotDimension::Auto;
        }

        match trimmed.parse::<u32>() {
            Ok(px) if (8..=10000).contains(&px) => PlotDimension::Pixels(px),
            Ok(px) => {
                log::warn!(
                    "Dimension {} out of valid range [8-10000], using default: {:?}",
                    px,
                    default
                );
                default
            }
            Err(_) => {
                log::warn!(
                    "Invalid dimension '{}', using default: {:?}",
                    trimmed,
                    default
                );
                default
            }
        }
    }

    /// Resolve to pixels; Auto takes `fallback`
    pub fn resolve(&self, fallback: u32) -> u32 {
        match self {
            PlotDimension::Pixels(px) => *px,
            PlotDimension::Auto => fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_registry_loads() {
        let reg = registry();
        assert!(reg.get_property("click.fudge.factor").is_some());
        assert!(reg.get_property("png.compression").is_some());
        assert!(reg.get_property("equalize").is_some());
        assert_eq!(reg.get_property("equalize").unwrap().kind, PropertyKind::Boolean);
    }

    #[test]
    fn test_registry_defaults() {
        let reg = registry();
        assert_eq!(reg.get_default("click.fudge.factor"), Some("0.025"));
        assert_eq!(reg.get_default("png.compression"), Some("fast"));
        assert_eq!(reg.get_default("equalize.nbins"), Some("256"));
    }

    #[test]
    fn test_enum_validation() {
        let reg = registry();
        assert!(reg.is_valid_enum_value("png.compression", "best"));
        assert!(reg.is_valid_enum_value("png.compression", "BEST"));
        assert!(!reg.is_valid_enum_value("png.compression", "ultra"));
        // Non-enumerated accepts anything
        assert!(reg.is_valid_enum_value("figure.width", "whatever"));
    }

    #[test]
    fn test_reader_defaults() {
        let reader = PropertyReader::default();
        assert_eq!(reader.get_enum("png.compression"), "fast");
        assert_eq!(reader.get_f64("click.fudge.factor"), 0.025);
        assert!(reader.get_bool("equalize"));
        assert_eq!(reader.get_usize("equalize.nbins"), 256);
        assert_eq!(reader.get_optional_string("output.dir"), None);
    }

    #[test]
    fn test_reader_invalid_values_fall_back() {
        let mut values = HashMap::new();
        values.insert("png.compression".to_string(), "ultra".to_string());
        values.insert("equalize".to_string(), "maybe".to_string());
        values.insert("click.fudge.factor".to_string(), "abc".to_string());
        let reader = PropertyReader::new(values);

        assert_eq!(reader.get_enum("png.compression"), "fast");
        assert!(reader.get_bool("equalize"));
        assert_eq!(reader.get_f64("click.fudge.factor"), 0.025);
    }

    #[test]
    fn test_reader_range_check() {
        let mut values = HashMap::new();
        values.insert("point.alpha".to_string(), "3.5".to_string());
        let reader = PropertyReader::new(values);
        assert_eq!(reader.get_f64_in_range("point.alpha", 0.0, 1.0), 0.5);
    }

    #[test]
    fn test_overrides() {
        let reader = PropertyReader::default()
            .with_overrides(&["equalize=false".to_string(), "png.compression = best".to_string()])
            .unwrap();
        assert!(!reader.get_bool("equalize"));
        assert_eq!(reader.get_enum("png.compression"), "best");

        assert!(PropertyReader::default()
            .with_overrides(&["no-equals".to_string()])
            .is_err());
        assert!(PropertyReader::default()
            .with_overrides(&["not.a.property=1".to_string()])
            .is_err());
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"equalize": false, "equalize.nbins": 128, "output.dir": "/tmp/figs"}}"#
        )
        .unwrap();

        let reader = PropertyReader::from_json_file(file.path()).unwrap();
        assert!(!reader.get_bool("equalize"));
        assert_eq!(reader.get_usize("equalize.nbins"), 128);
        assert_eq!(
            reader.get_optional_string("output.dir"),
            Some("/tmp/figs".to_string())
        );
    }

    #[test]
    fn test_plot_dimension() {
        assert_eq!(PlotDimension::parse("auto", PlotDimension::Auto), PlotDimension::Auto);
        assert_eq!(PlotDimension::parse("", PlotDimension::Auto), PlotDimension::Auto);
        assert_eq!(
            PlotDimension::parse("500", PlotDimension::Auto),
            PlotDimension::Pixels(500)
        );
        // Out of range / invalid fall back to the default
        assert_eq!(
            PlotDimension::parse("20000", PlotDimension::Pixels(720)),
            PlotDimension::Pixels(720)
        );
        assert_eq!(PlotDimension::parse("abc", PlotDimension::Auto), PlotDimension::Auto);

        assert_eq!(PlotDimension::Auto.resolve(64), 64);
        assert_eq!(PlotDimension::Pixels(300).resolve(64), 300);
    }
}
