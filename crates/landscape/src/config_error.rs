// ---------------------------------------------------------------------------
// ConfigError: startup configuration failures
// ---------------------------------------------------------------------------

use std::fmt;

/// Errors detected while validating a `LandscapeConfig` or assembling the
/// `WorldState` from it.
///
/// Every variant is fatal: the world is never built from a config that
/// produced one of these.
#[derive(Debug)]
pub enum ConfigError {
    /// The grid must contain at least one row and one column of patches.
    EmptyGrid { rows: usize, columns: usize },
    /// A length-like setting was zero, negative or not finite.
    NonPositive { field: &'static str, value: f32 },
    /// A setting was NaN or infinite.
    NonFinite { field: &'static str, value: f32 },
    /// Patches need at least one vertex segment per side.
    ZeroSegments,
    /// A resolution or count exceeded what the grid will allocate.
    TooLarge { field: &'static str, value: f64, max: f64 },
    /// A spawn chance was outside `[0, 1]`.
    ChanceOutOfRange { field: &'static str, value: f32 },
    /// A `[min, max]` pair was inverted.
    InvertedRange { field: &'static str, min: f32, max: f32 },
    /// A mesh template the landscape places was never registered.
    MissingTemplate(String),
    /// The config file could not be parsed.
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EmptyGrid { rows, columns } => {
                write!(f, "Empty terrain grid: {rows} rows x {columns} columns")
            }
            ConfigError::NonPositive { field, value } => {
                write!(f, "Setting `{field}` must be positive and finite, got {value}")
            }
            ConfigError::NonFinite { field, value } => {
                write!(f, "Setting `{field}` must be finite, got {value}")
            }
            ConfigError::ZeroSegments => write!(f, "Patches need at least one segment per side"),
            ConfigError::TooLarge { field, value, max } => {
                write!(f, "Setting `{field}` is too large: {value} exceeds {max}")
            }
            ConfigError::ChanceOutOfRange { field, value } => {
                write!(f, "Chance `{field}` must lie in [0, 1], got {value}")
            }
            ConfigError::InvertedRange { field, min, max } => {
                write!(f, "Range `{field}` is inverted: min {min} > max {max}")
            }
            ConfigError::MissingTemplate(name) => {
                write!(f, "Mesh template `{name}` is not registered")
            }
            ConfigError::Parse(msg) => write!(f, "Config parse error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e.to_string())
    }
}
