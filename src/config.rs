//! Face build configuration.
//!
//! Every field has a default, so an empty TOML document is a valid config:
//!
//! ```toml
//! first_code = 32
//! last_code = 126
//! subdivisions = 2
//! reference_char = "M"
//! fallback_char = "?"
//! em_size = 1.0
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::font::tessellate::MAX_POOL_CAPACITY;

/// Upper bound for [`FaceConfig::subdivisions`].
pub const MAX_SUBDIVISIONS: u32 = 256;

/// Highest character code a face table can hold.
pub const MAX_CHAR_CODE: u32 = char::MAX as u32;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Settings for building a [`Face`](crate::font::face::Face).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceConfig {
    /// First character code stored in the glyph table.
    pub first_code: u32,
    /// Last character code stored in the glyph table (inclusive).
    pub last_code: u32,
    /// Steps per quadratic arc when flattening outlines, at most [`MAX_SUBDIVISIONS`].
    /// Zero is treated as one.
    pub subdivisions: u32,
    /// Character whose advances define line height and reference width.
    pub reference_char: char,
    /// Drawn in place of characters outside the table. `None` skips them.
    pub fallback_char: Option<char>,
    /// Size of one em in output units. Outlines are scaled by `em_size / units_per_em`.
    pub em_size: f32,
    /// Vertex pool capacity per glyph (input points plus combined vertices).
    pub vertex_capacity: usize,
    /// Contours with more points than this are rejected before flattening.
    /// At most [`MAX_POOL_CAPACITY`].
    pub max_contour_points: usize,
}

impl Default for FaceConfig {
    fn default() -> Self {
        Self {
            first_code: 32,
            last_code: 126,
            subdivisions: 2,
            reference_char: 'M',
            fallback_char: Some('?'),
            em_size: 1.0,
            vertex_capacity: MAX_POOL_CAPACITY,
            max_contour_points: 4096,
        }
    }
}

impl FaceConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.first_code > self.last_code {
            return Err(ConfigError::Invalid(format!(
                "first_code {} is past last_code {}",
                self.first_code, self.last_code
            )));
        }
        if self.last_code > MAX_CHAR_CODE {
            return Err(ConfigError::Invalid(format!(
                "last_code {:#x} is past {MAX_CHAR_CODE:#x}",
                self.last_code
            )));
        }
        if self.subdivisions > MAX_SUBDIVISIONS {
            return Err(ConfigError::Invalid(format!(
                "subdivisions must be at most {MAX_SUBDIVISIONS}"
            )));
        }
        if self.max_contour_points > MAX_POOL_CAPACITY {
            return Err(ConfigError::Invalid(format!(
                "max_contour_points must be at most {MAX_POOL_CAPACITY}"
            )));
        }
        if self.vertex_capacity == 0 || self.vertex_capacity > MAX_POOL_CAPACITY {
            return Err(ConfigError::Invalid(format!(
                "vertex_capacity must be in 1..={MAX_POOL_CAPACITY}"
            )));
        }
        if self.em_size.is_nan() || self.em_size <= 0.0 {
            return Err(ConfigError::Invalid("em_size must be > 0".to_string()));
        }
        Ok(())
    }

    /// Number of glyph slots in a face built with this config.
    #[inline]
    pub fn glyph_count(&self) -> usize {
        (self.last_code - self.first_code) as usize + 1
    }
}
