//! Color-management configuration.
//!
//! Settings come from three layers: built-in defaults, an optional YAML
//! file, and environment variables on top.
//!
//! ```yaml
//! search_paths:
//!   - /usr/share/color/icc
//! black_point_compensation: true
//! intent: relative_colorimetric
//! default_cmyk_profile: "Coated FOGRA39"
//! ```
//!
//! Environment variables:
//!
//! - `PIGMENT_PROFILE_PATH` - extra profile directories (platform path list),
//!   searched before the configured ones
//! - `PIGMENT_BLACKPOINT_COMPENSATION` - `1`/`true`/`yes`/`on` or
//!   `0`/`false`/`no`/`off`
//! - `PIGMENT_INTENT` - rendering intent name

use crate::{IccError, IccResult, Intent};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Environment variable with extra profile directories.
const ENV_PROFILE_PATH: &str = "PIGMENT_PROFILE_PATH";
/// Environment variable toggling black-point compensation.
const ENV_BPC: &str = "PIGMENT_BLACKPOINT_COMPENSATION";
/// Environment variable selecting the default rendering intent.
const ENV_INTENT: &str = "PIGMENT_INTENT";

/// Settings for profile discovery and transform construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IccConfig {
    /// Directories scanned recursively for profiles.
    pub search_paths: Vec<PathBuf>,
    /// Pass black-point compensation when building transforms.
    pub black_point_compensation: bool,
    /// Default rendering intent.
    pub intent: Intent,
    /// Product name of the default RGB profile.
    pub default_rgb_profile: Option<String>,
    /// Product name of the default gray profile.
    pub default_gray_profile: Option<String>,
    /// Product name of the default CMYK profile.
    pub default_cmyk_profile: Option<String>,
}

impl Default for IccConfig {
    fn default() -> Self {
        Self {
            search_paths: default_search_paths(),
            black_point_compensation: false,
            intent: Intent::Perceptual,
            default_rgb_profile: None,
            default_gray_profile: None,
            default_cmyk_profile: None,
        }
    }
}

impl IccConfig {
    /// Configuration with no search paths; only built-in profiles exist.
    pub fn empty() -> Self {
        Self {
            search_paths: Vec::new(),
            ..Self::default()
        }
    }

    /// Parses YAML. Missing keys keep their defaults.
    pub fn from_yaml_str(yaml: &str) -> IccResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Loads a YAML file. Relative search paths resolve against its directory.
    pub fn from_file(path: impl AsRef<Path>) -> IccResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| IccError::Config(format!("{}: {}", path.display(), e)))?;
        let mut config = Self::from_yaml_str(&content)?;
        if let Some(base) = path.parent() {
            for p in &mut config.search_paths {
                if p.is_relative() {
                    *p = base.join(&*p);
                }
            }
        }
        Ok(config)
    }

    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        Self::default().with_env()
    }

    /// Applies environment overrides from the process environment.
    pub fn with_env(self) -> Self {
        self.with_vars(|name| env::var(name).ok())
    }

    /// Applies overrides from an arbitrary variable source.
    ///
    /// Unparsable values are logged and ignored.
    pub fn with_vars(mut self, get: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(paths) = get(ENV_PROFILE_PATH) {
            let mut extra: Vec<PathBuf> = env::split_paths(&paths)
                .filter(|p| !p.as_os_str().is_empty())
                .collect();
            extra.append(&mut self.search_paths);
            self.search_paths = extra;
        }
        if let Some(v) = get(ENV_BPC) {
            match parse_bool(&v) {
                Some(b) => self.black_point_compensation = b,
                None => warn!(var = ENV_BPC, value = %v, "ignoring unparsable flag"),
            }
        }
        if let Some(v) = get(ENV_INTENT) {
            match v.parse::<Intent>() {
                Ok(intent) => self.intent = intent,
                Err(e) => warn!(var = ENV_INTENT, error = %e, "ignoring intent"),
            }
        }
        self
    }
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Platform profile directories.
pub fn default_search_paths() -> Vec<PathBuf> {
    let home = env::var_os("HOME").map(PathBuf::from);
    let mut paths = Vec::new();
    if cfg!(target_os = "macos") {
        paths.push(PathBuf::from("/Library/ColorSync/Profiles"));
        paths.push(PathBuf::from("/System/Library/ColorSync/Profiles"));
        if let Some(h) = &home {
            paths.push(h.join("Library/ColorSync/Profiles"));
        }
    } else if cfg!(windows) {
        let root = env::var_os("SystemRoot").map_or_else(|| PathBuf::from(r"C:\Windows"), PathBuf::from);
        paths.push(root.join(r"System32\spool\drivers\color"));
    } else {
        paths.push(PathBuf::from("/usr/share/color/icc"));
        paths.push(PathBuf::from("/usr/local/share/color/icc"));
        if let Some(h) = &home {
            paths.push(h.join(".local/share/color/icc"));
            paths.push(h.join(".color/icc"));
        }
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_yaml_partial() {
        let cfg = IccConfig::from_yaml_str(
            "black_point_compensation: true\nintent: relative_colorimetric\nsearch_paths: [/opt/icc]\n",
        )
        .unwrap();
        assert!(cfg.black_point_compensation);
        assert_eq!(cfg.intent, Intent::RelativeColorimetric);
        assert_eq!(cfg.search_paths, vec![PathBuf::from("/opt/icc")]);
        assert_eq!(cfg.default_cmyk_profile, None);
    }

    #[test]
    fn test_yaml_error() {
        assert!(matches!(
            IccConfig::from_yaml_str("intent: [oops"),
            Err(IccError::Yaml(_))
        ));
    }

    #[test]
    fn test_vars_override() {
        let vars: HashMap<&str, &str> = [
            ("PIGMENT_PROFILE_PATH", "/a"),
            ("PIGMENT_BLACKPOINT_COMPENSATION", "yes"),
            ("PIGMENT_INTENT", "absolute"),
        ]
        .into_iter()
        .collect();
        let cfg = IccConfig::empty().with_vars(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.search_paths, vec![PathBuf::from("/a")]);
        assert!(cfg.black_point_compensation);
        assert_eq!(cfg.intent, Intent::AbsoluteColorimetric);
    }

    #[test]
    fn test_bad_vars_ignored() {
        let cfg = IccConfig::empty().with_vars(|k| match k {
            "PIGMENT_BLACKPOINT_COMPENSATION" => Some("maybe".into()),
            "PIGMENT_INTENT" => Some("vivid".into()),
            _ => None,
        });
        assert!(!cfg.black_point_compensation);
        assert_eq!(cfg.intent, Intent::Perceptual);
    }
}
