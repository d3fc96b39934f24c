use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use derive_more::{Deref, From, Into};
use directories::ProjectDirs;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use palette::rgb::{FromHexError, Srgb};
use palette::{Srgba, WithAlpha};
use pager::Curve;
use sector::NodePath;
use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, DisplayFromStr, SerializeDisplay, serde_as};
use strum::{Display as StrumDisplay, EnumIter, EnumString};
use thiserror::Error;

use crate::events::AppEvent;

/// Opaque color written as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Deref, From, Into, SerializeDisplay, DeserializeFromStr)]
pub struct Color(Srgba<f64>);

impl FromStr for Color {
    type Err = FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rgb: Srgb<u8> = s.trim().parse()?;
        Ok(Self(rgb.into_format::<f64>().with_alpha(1.0)))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (r, g, b) = self.0.color.into_format::<u8>().into_components();
        write!(f, "#{r:02x}{g:02x}{b:02x}")
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    DeserializeFromStr,
    EnumString,
    EnumIter,
    StrumDisplay,
)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Ring,
    Slice,
    Solid,
}

/// One sector of a page. Radii are in pixels, angles in degrees.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SectorConfig {
    pub kind: NodeKind,
    #[serde(default)]
    pub padding: f64,
    pub delta_radius: Option<f64>,
    pub delta_theta: Option<f64>,
    pub color: Option<Color>,
    #[serde(default)]
    pub children: Vec<SectorConfig>,
}

impl SectorConfig {
    fn validate(&self, page: usize, path: &NodePath) -> Result<(), ConfigError> {
        let invalid = |reason| ConfigError::InvalidScene {
            page,
            path: path.clone(),
            reason,
        };
        if self.kind == NodeKind::Solid && !self.children.is_empty() {
            return Err(invalid("solid sectors cannot have children"));
        }
        if !(self.padding >= 0.0) {
            return Err(invalid("padding must be non-negative"));
        }
        if self.delta_radius.is_some_and(|dr| !(dr >= 0.0)) {
            return Err(invalid("delta_radius must be non-negative"));
        }
        if self.delta_theta.is_some_and(|dt| !(dt >= 0.0)) {
            return Err(invalid("delta_theta must be non-negative"));
        }
        self.children
            .iter()
            .enumerate()
            .try_for_each(|(i, child)| child.validate(page, &path.child(i)))
    }
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub viewport_fraction: f64,
    pub page_duration_ms: u64,
    #[serde_as(as = "DisplayFromStr")]
    pub curve: Curve,
    pub inner_radius: f64,
    pub highlight: Color,
    pub fill: Color,
    pub pages: Vec<SectorConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            viewport_fraction: 1.0,
            page_duration_ms: 350,
            curve: Curve::default(),
            inner_radius: 40.0,
            highlight: Color(sector::solid::default_highlight()),
            fill: Color(Srgba::new(0.37, 0.51, 0.67, 1.0)),
            pages: Vec::new(),
        }
    }
}

impl Config {
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        let config: Self = config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// The configuration shipped with the binary.
    pub fn embedded() -> Result<Self, ConfigError> {
        Self::from_toml(DEFAULT_CONFIG)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.viewport_fraction > 0.0) {
            return Err(ConfigError::ViewportFraction(self.viewport_fraction));
        }
        if !(self.inner_radius >= 0.0) {
            return Err(ConfigError::InnerRadius(self.inner_radius));
        }
        self.pages
            .iter()
            .enumerate()
            .try_for_each(|(page, root)| root.validate(page, &NodePath::root()))
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to determine config directory")]
    ConfigDirNotFound,
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Notify error: {0}")]
    Notify(#[from] notify::Error),
    #[error("viewport_fraction must be positive, got {0}")]
    ViewportFraction(f64),
    #[error("inner_radius must be non-negative, got {0}")]
    InnerRadius(f64),
    #[error("Invalid sector at page {page}, {path}: {reason}")]
    InvalidScene {
        page: usize,
        path: NodePath,
        reason: &'static str,
    },
}

pub fn get_config_path() -> Result<PathBuf, ConfigError> {
    let proj_dirs =
        ProjectDirs::from("dev", "orbit", "orbit").ok_or(ConfigError::ConfigDirNotFound)?;
    Ok(proj_dirs.config_dir().join("config.toml"))
}

/// Anchors a user-supplied config path to the working directory so its
/// parent is always a real directory to watch.
pub fn resolve_config_path(path: &Path) -> std::io::Result<PathBuf> {
    std::path::absolute(path)
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let s = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(config::Environment::with_prefix("ORBIT"))
        .build()?;

    let config: Config = s.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

/// Loads `path`, falling back to the shipped configuration when the file is
/// missing or broken.
pub fn load_or_setup(path: &Path) -> Config {
    if path.exists() {
        match load_config(path) {
            Ok(config) => return config,
            Err(e) => log::error!("Failed to load {}: {}", path.display(), e),
        }
    }

    match Config::embedded() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Built-in configuration is invalid: {}", e);
            Config::default()
        }
    }
}

pub fn write_default_config(path: &Path) -> std::io::Result<PathBuf> {
    if let Some(parent) = path.parent() {
        fs_err::create_dir_all(parent)?;
    }
    if !path.exists() {
        fs_err::write(path, DEFAULT_CONFIG)?;
    }
    Ok(path.to_path_buf())
}

const DEFAULT_CONFIG: &str = include_str!("default_config.toml");

pub async fn run_async_watcher(tx: async_channel::Sender<AppEvent>, config_path: PathBuf) {
    let config_dir = match config_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => {
            log::warn!("No directory to watch for {}", config_path.display());
            return;
        }
    };

    if let Err(e) = fs_err::create_dir_all(&config_dir) {
        log::error!("Failed to create config directory for watching: {}", e);
        return;
    }

    let (bridge_tx, bridge_rx) = async_channel::unbounded();

    let mut watcher = match RecommendedWatcher::new(
        move |res| {
            let _ = bridge_tx.send_blocking(res);
        },
        notify::Config::default(),
    ) {
        Ok(w) => w,
        Err(e) => {
            log::error!("Failed to create watcher: {}", ConfigError::from(e));
            return;
        }
    };

    if let Err(e) = watcher.watch(&config_dir, RecursiveMode::NonRecursive) {
        log::error!("Failed to watch config directory: {}", ConfigError::from(e));
        return;
    }
    log::debug!("Watching {} for changes", config_path.display());

    while let Ok(res) = bridge_rx.recv().await {
        match res {
            Ok(event) => {
                let meaningful_event = matches!(
                    event.kind,
                    EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
                );

                if meaningful_event
                    && event.paths.iter().any(|p| p == &config_path)
                    && tx.send(AppEvent::ConfigReload).await.is_err()
                {
                    break;
                }
            }
            Err(e) => log::error!("Watch error: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_config_is_valid() {
        let config = Config::embedded().unwrap();
        assert!(!config.pages.is_empty());
        assert!(config.viewport_fraction > 0.0);
    }

    #[test]
    fn test_bare_config_file_name_resolves_to_watchable_directory() {
        let path = resolve_config_path(Path::new("orbit.toml")).unwrap();
        assert!(path.is_absolute());
        assert_eq!(path.file_name().unwrap(), "orbit.toml");
        let parent = path.parent().unwrap();
        assert!(!parent.as_os_str().is_empty());
        assert_eq!(parent, std::env::current_dir().unwrap());

        let nested = resolve_config_path(Path::new("conf/orbit.toml")).unwrap();
        assert!(nested.ends_with("conf/orbit.toml"));
        assert!(nested.is_absolute());
    }

    #[test]
    fn test_color_parsing() {
        let color: Color = serde_json::from_str("\"#ff8000\"").unwrap();
        assert_eq!(color.red, 1.0);
        assert!((color.green - 128.0 / 255.0).abs() < 1e-9);
        assert_eq!(color.blue, 0.0);
        assert_eq!(color.alpha, 1.0);
        assert_eq!(color.to_string(), "#ff8000");
        assert_eq!(serde_json::to_string(&color).unwrap(), "\"#ff8000\"");
        assert!(serde_json::from_str::<Color>("\"teal\"").is_err());
    }

    #[test]
    fn test_node_kind_deserialization() {
        let cases = vec![
            ("\"ring\"", NodeKind::Ring),
            ("\"Ring\"", NodeKind::Ring),
            ("\"SLICE\"", NodeKind::Slice),
            ("\"solid\"", NodeKind::Solid),
        ];

        for (json, expected) in cases {
            let deserialized: NodeKind = serde_json::from_str(json).unwrap();
            assert_eq!(deserialized, expected);
        }
    }

    #[test]
    fn test_inline_scene() {
        let config = Config::from_toml(
            r##"
            viewport_fraction = 0.8
            curve = "fast_out_slow_in"
            highlight = "#00ff00"

            [[pages]]
            kind = "ring"
            delta_radius = 120.0
            padding = 3.0

              [[pages.children]]
              kind = "solid"
              delta_theta = 45.0
              color = "#112233"
            "##,
        )
        .unwrap();

        assert_eq!(config.viewport_fraction, 0.8);
        assert_eq!(config.curve, Curve::FastOutSlowIn);
        assert_eq!(config.page_duration_ms, Config::default().page_duration_ms);
        assert_eq!(config.pages.len(), 1);
        let ring = &config.pages[0];
        assert_eq!(ring.kind, NodeKind::Ring);
        assert_eq!(ring.children[0].delta_theta, Some(45.0));
        assert_eq!(ring.children[0].color.unwrap().to_string(), "#112233");
    }

    #[test]
    fn test_solid_with_children_is_rejected() {
        let err = Config::from_toml(
            r##"
            [[pages]]
            kind = "solid"

              [[pages.children]]
              kind = "solid"
            "##,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidScene { page: 0, ref path, .. } if path.is_empty()
        ));
    }

    #[test]
    fn test_nested_error_names_the_sector() {
        let err = Config::from_toml(
            r##"
            [[pages]]
            kind = "ring"

              [[pages.children]]
              kind = "slice"

              [[pages.children]]
              kind = "slice"
              padding = -1.0
            "##,
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid sector at page 0, /1: padding must be non-negative"
        );
    }

    #[test]
    fn test_non_positive_fraction_is_rejected() {
        let err = Config::from_toml("viewport_fraction = 0.0").unwrap_err();
        assert!(matches!(err, ConfigError::ViewportFraction(f) if f == 0.0));
    }

    #[test]
    fn test_missing_file_loads_defaults() {
        let config = load_config(Path::new("/nonexistent/orbit/config.toml")).unwrap();
        assert!(config.pages.is_empty());
    }
}
