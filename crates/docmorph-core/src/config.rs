// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Engine configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::Result;
use crate::types::{CompressionLevel, RgbColor};

/// Rasterization backend settings, injected into the rasterizer when it is
/// constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterConfig {
    /// Oversampling factor applied to page dimensions (1.0 = 72 dpi).
    pub scale: f32,
    /// JPEG quality in `[1, 100]`.
    pub jpeg_quality: u8,
    /// Directory holding the pdfium shared library. `None` tries the system
    /// library path.
    pub pdfium_library_path: Option<PathBuf>,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            scale: 2.0,
            jpeg_quality: 90,
            pdfium_library_path: None,
        }
    }
}

/// Web capture settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Width of the off-screen surface in CSS pixels (A4 at 96 dpi).
    pub surface_width: u32,
    /// Oversampling factor used when the surface is rasterized.
    pub scale: f32,
    /// Hard deadline on the initial page load, in milliseconds.
    pub load_timeout_ms: u64,
    /// Output page size in PDF points (A4 portrait).
    pub page_width_pt: f32,
    pub page_height_pt: f32,
}

impl CaptureConfig {
    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            surface_width: 794,
            scale: 2.0,
            load_timeout_ms: 30_000,
            page_width_pt: 595.28,
            page_height_pt: 841.89,
        }
    }
}

/// Defaults applied when a front end does not ask for something explicit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    pub compression_level: CompressionLevel,
    pub watermark_font_size: f32,
    pub watermark_opacity: f32,
    pub watermark_rotation: f32,
    pub watermark_color: RgbColor,
    pub pages_per_file: usize,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            compression_level: CompressionLevel::Medium,
            watermark_font_size: 50.0,
            watermark_opacity: 0.5,
            watermark_rotation: 45.0,
            watermark_color: RgbColor::watermark_grey(),
            pages_per_file: 1,
        }
    }
}

/// Complete engine settings, persisted as JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub raster: RasterConfig,
    pub capture: CaptureConfig,
    pub defaults: DefaultsConfig,
    /// Where front ends write results. `None` means the working directory.
    pub output_dir: Option<PathBuf>,
}

impl EngineConfig {
    /// Read a JSON config file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&data)?;
        info!(path = %path.display(), "loaded engine config");
        Ok(config)
    }

    /// Read `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Write the configuration as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }

    /// Conventional location: `$XDG_CONFIG_HOME/docmorph/config.json`, then
    /// `$HOME/.config/docmorph/config.json`.
    pub fn default_path() -> Option<PathBuf> {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))?;
        Some(base.join("docmorph").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = EngineConfig::default();
        assert_eq!(config.raster.scale, 2.0);
        assert_eq!(config.raster.jpeg_quality, 90);
        assert_eq!(config.capture.load_timeout(), Duration::from_secs(30));
        assert_eq!(config.defaults.compression_level, CompressionLevel::Medium);
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{ "raster": { "scale": 3.0 } }"#).unwrap();
        assert_eq!(config.raster.scale, 3.0);
        assert_eq!(config.raster.jpeg_quality, 90);
        assert_eq!(config.capture.surface_width, 794);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = EngineConfig::load_or_default("/nonexistent/docmorph/config.json").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    /// A saved config loads back equal, including non-default values.
    #[test]
    fn saved_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut config = EngineConfig::default();
        config.raster.scale = 1.5;
        config.defaults.compression_level = CompressionLevel::High;

        config.save(&path).unwrap();
        assert_eq!(EngineConfig::load(&path).unwrap(), config);
        assert_eq!(EngineConfig::load_or_default(&path).unwrap(), config);
    }
}
