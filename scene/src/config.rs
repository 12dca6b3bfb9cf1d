//! Engine tunables, with defaults from [`crate::consts`] and optional
//! overrides from `SVGSCENE_*` environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::ffi::OsString;
use std::str::FromStr;

use crate::consts::{
    DEFAULT_CANVAS_HEIGHT, DEFAULT_CANVAS_WIDTH, DUPLICATE_OFFSET, GRID_SIZE, HISTORY_LIMIT, MILESTONE_LIMIT,
    SNAP_RADIUS,
};

pub const ENV_HISTORY_LIMIT: &str = "SVGSCENE_HISTORY_LIMIT";
pub const ENV_MILESTONE_LIMIT: &str = "SVGSCENE_MILESTONE_LIMIT";
pub const ENV_SNAP_RADIUS: &str = "SVGSCENE_SNAP_RADIUS";
pub const ENV_GRID_SIZE: &str = "SVGSCENE_GRID_SIZE";
pub const ENV_DUPLICATE_OFFSET: &str = "SVGSCENE_DUPLICATE_OFFSET";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: String, value: String },
}

/// Tunables consulted by [`crate::engine::Engine`] and the gesture layer.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Maximum undo snapshots kept.
    pub history_limit: usize,
    /// Maximum milestone entries kept.
    pub milestone_limit: usize,
    /// Connector snap distance in canvas units.
    pub snap_radius: f64,
    /// Pointer grid; `0` disables grid snapping.
    pub grid_size: f64,
    /// Offset applied to duplicates on both axes.
    pub duplicate_offset: f64,
    pub canvas_width: f64,
    pub canvas_height: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_limit: HISTORY_LIMIT,
            milestone_limit: MILESTONE_LIMIT,
            snap_radius: SNAP_RADIUS,
            grid_size: GRID_SIZE,
            duplicate_offset: DUPLICATE_OFFSET,
            canvas_width: DEFAULT_CANVAS_WIDTH,
            canvas_height: DEFAULT_CANVAS_HEIGHT,
        }
    }
}

impl EngineConfig {
    /// Read overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a variable is set but does not
    /// parse, or when a distance is negative. A value that is not valid
    /// Unicode counts as set and fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env_text(std::env::var_os(var)))
    }

    /// Read overrides through `lookup`; unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Same as [`EngineConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut cfg = Self::default();
        if let Some(v) = read::<usize>(&lookup, ENV_HISTORY_LIMIT)? {
            cfg.history_limit = v;
        }
        if let Some(v) = read::<usize>(&lookup, ENV_MILESTONE_LIMIT)? {
            cfg.milestone_limit = v;
        }
        if let Some(v) = read_f64(&lookup, ENV_SNAP_RADIUS, non_negative)? {
            cfg.snap_radius = v;
        }
        if let Some(v) = read_f64(&lookup, ENV_GRID_SIZE, non_negative)? {
            cfg.grid_size = v;
        }
        if let Some(v) = read_f64(&lookup, ENV_DUPLICATE_OFFSET, f64::is_finite)? {
            cfg.duplicate_offset = v;
        }
        Ok(cfg)
    }

    /// Round `v` to the grid, or pass it through when the grid is off.
    #[must_use]
    pub fn snap_to_grid(&self, v: f64) -> f64 {
        if self.grid_size > 0.0 { (v / self.grid_size).round() * self.grid_size } else { v }
    }
}

/// Raw environment value as text, lossily for non-Unicode bytes.
fn env_text(raw: Option<OsString>) -> Option<String> {
    raw.map(|v| v.to_string_lossy().into_owned())
}

fn invalid(var: &str, value: &str) -> ConfigError {
    ConfigError::Invalid { var: var.into(), value: value.into() }
}

fn read<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, var: &str) -> Result<Option<T>, ConfigError> {
    let Some(raw) = lookup(var) else {
        return Ok(None);
    };
    match raw.trim().parse::<T>() {
        Ok(v) => Ok(Some(v)),
        Err(_) => Err(invalid(var, &raw)),
    }
}

fn read_f64(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &str,
    accept: fn(f64) -> bool,
) -> Result<Option<f64>, ConfigError> {
    let Some(raw) = lookup(var) else {
        return Ok(None);
    };
    match raw.trim().parse::<f64>() {
        Ok(v) if accept(v) => Ok(Some(v)),
        _ => Err(invalid(var, &raw)),
    }
}

fn non_negative(v: f64) -> bool {
    v.is_finite() && v >= 0.0
}
