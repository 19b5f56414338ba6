//! Tiler configuration.
//!
//! Settings are read from an INI file:
//!
//! ```ini
//! [raster]
//! tile_width = 512
//! tile_height = 512
//! add_alpha = true
//! reproject = true
//! bilinear = false
//!
//! [batch]
//! threads = 8
//!
//! [logging]
//! level = debug
//! directory = /var/log/geotiler
//! file_name = geotiler.log
//! ```
//!
//! Missing sections and keys keep their defaults; unknown keys are ignored.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use ini::{Ini, Properties};
use thiserror::Error;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read or written.
    #[error("Failed to access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The text is not valid INI.
    #[error("Failed to parse config: {0}")]
    Parse(String),

    /// A key holds a value of the wrong shape.
    #[error("Invalid value '{value}' for [{section}] {key}: {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Defaults for raster tile requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterConfig {
    /// Output tile width in pixels.
    pub tile_width: usize,
    /// Output tile height in pixels.
    pub tile_height: usize,
    /// Synthesize alpha for 3-band sources.
    pub add_alpha: bool,
    /// Warp non-WGS84 sources onto the tile sector.
    pub reproject: bool,
    /// Interpolate bilinearly when resampling.
    pub bilinear: bool,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            tile_width: 512,
            tile_height: 512,
            add_alpha: true,
            reproject: true,
            bilinear: false,
        }
    }
}

impl RasterConfig {
    /// Set the output tile size.
    pub fn with_tile_size(mut self, width: usize, height: usize) -> Self {
        self.tile_width = width;
        self.tile_height = height;
        self
    }

    pub fn with_add_alpha(mut self, add_alpha: bool) -> Self {
        self.add_alpha = add_alpha;
        self
    }

    pub fn with_reproject(mut self, reproject: bool) -> Self {
        self.reproject = reproject;
        self
    }

    pub fn with_bilinear(mut self, bilinear: bool) -> Self {
        self.bilinear = bilinear;
        self
    }
}

/// Parallel batch settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchConfig {
    /// Worker threads; 0 uses rayon's global pool.
    pub threads: usize,
}

impl BatchConfig {
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`.
    pub level: String,
    /// Directory for the log file; stderr when unset.
    pub directory: Option<PathBuf>,
    /// Log file name inside `directory`.
    pub file_name: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
            file_name: "geotiler.log".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Log to `file_name` inside this directory instead of stderr.
    pub fn with_directory(mut self, directory: PathBuf) -> Self {
        self.directory = Some(directory);
        self
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }
}

/// Complete tiler configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TilerConfig {
    pub raster: RasterConfig,
    pub batch: BatchConfig,
    pub logging: LoggingConfig,
}

impl TilerConfig {
    pub fn with_raster(mut self, raster: RasterConfig) -> Self {
        self.raster = raster;
        self
    }

    pub fn with_batch(mut self, batch: BatchConfig) -> Self {
        self.batch = batch;
        self
    }

    pub fn with_logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = logging;
        self
    }

    /// Load configuration from an INI file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        text.parse()
    }

    /// Load from the default location, or defaults when no file exists.
    pub fn load_default() -> ConfigResult<Self> {
        match default_config_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Write configuration as an INI file.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        std::fs::write(path, self.to_ini_string()).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Render as INI text.
    pub fn to_ini_string(&self) -> String {
        let mut ini = Ini::new();
        ini.with_section(Some("raster"))
            .set("tile_width", self.raster.tile_width.to_string())
            .set("tile_height", self.raster.tile_height.to_string())
            .set("add_alpha", self.raster.add_alpha.to_string())
            .set("reproject", self.raster.reproject.to_string())
            .set("bilinear", self.raster.bilinear.to_string());
        ini.with_section(Some("batch"))
            .set("threads", self.batch.threads.to_string());

        let mut logging = ini.with_section(Some("logging"));
        logging
            .set("level", self.logging.level.as_str())
            .set("file_name", self.logging.file_name.as_str());
        if let Some(directory) = &self.logging.directory {
            logging.set("directory", directory.to_string_lossy().into_owned());
        }

        let mut out = Vec::new();
        // Writing into a Vec cannot fail
        let _ = ini.write_to(&mut out);
        String::from_utf8_lossy(&out).into_owned()
    }
}

impl FromStr for TilerConfig {
    type Err = ConfigError;

    fn from_str(text: &str) -> ConfigResult<Self> {
        let ini = Ini::load_from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        let mut config = TilerConfig::default();

        if let Some(section) = ini.section(Some("raster")) {
            let raster = &mut config.raster;
            read_value(section, "raster", "tile_width", &mut raster.tile_width)?;
            read_value(section, "raster", "tile_height", &mut raster.tile_height)?;
            read_bool(section, "raster", "add_alpha", &mut raster.add_alpha)?;
            read_bool(section, "raster", "reproject", &mut raster.reproject)?;
            read_bool(section, "raster", "bilinear", &mut raster.bilinear)?;

            for (key, value) in [
                ("tile_width", raster.tile_width),
                ("tile_height", raster.tile_height),
            ] {
                if value == 0 {
                    return Err(invalid("raster", key, "0", "must be positive"));
                }
            }
        }

        if let Some(section) = ini.section(Some("batch")) {
            read_value(section, "batch", "threads", &mut config.batch.threads)?;
        }

        if let Some(section) = ini.section(Some("logging")) {
            if let Some(level) = section.get("level") {
                config.logging.level = level.trim().to_string();
            }
            if let Some(directory) = section.get("directory") {
                let directory = directory.trim();
                if !directory.is_empty() {
                    config.logging.directory = Some(expand_tilde(directory));
                }
            }
            if let Some(file_name) = section.get("file_name") {
                config.logging.file_name = file_name.trim().to_string();
            }
        }

        Ok(config)
    }
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn read_value<T>(section: &Properties, name: &str, key: &str, target: &mut T) -> ConfigResult<()>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    if let Some(raw) = section.get(key) {
        *target = raw
            .trim()
            .parse()
            .map_err(|e: T::Err| invalid(name, key, raw, &e.to_string()))?;
    }
    Ok(())
}

fn read_bool(section: &Properties, name: &str, key: &str, target: &mut bool) -> ConfigResult<()> {
    if let Some(raw) = section.get(key) {
        *target = match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => true,
            "false" | "no" | "off" | "0" => false,
            _ => return Err(invalid(name, key, raw, "expected a boolean")),
        };
    }
    Ok(())
}

fn expand_tilde(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}

/// `<config dir>/geotiler/config.ini`, when the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("geotiler").join("config.ini"))
}
