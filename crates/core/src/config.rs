//! Persisted default settings.
//!
//! Loaded once at start and overwritten wholesale on save. Keys missing from
//! the stored document take their defaults, so older files keep loading.

use crate::partition::Method;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default settings applied to new formations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    /// Target students per group
    pub group_size: usize,

    /// Ordering method
    pub method: Method,

    /// Merge lone students into other groups
    pub redistribute_singles: bool,

    /// Let redistribution push a group past `group_size`
    pub allow_larger_groups: bool,

    /// Reveal groups one by one in interactive front ends
    pub show_animation: bool,

    pub theme: Theme,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            group_size: 3,
            method: Method::Random,
            redistribute_singles: true,
            allow_larger_groups: true,
            show_animation: true,
            theme: Theme::Default,
        }
    }
}

/// Color theme for front ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Theme {
    #[default]
    #[serde(rename = "Padrão")]
    Default,
    #[serde(rename = "Claro")]
    Light,
    #[serde(rename = "Escuro")]
    Dark,
    #[serde(rename = "Azul")]
    Blue,
    #[serde(rename = "Verde")]
    Green,
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Theme::Default => "Padrão",
            Theme::Light => "Claro",
            Theme::Dark => "Escuro",
            Theme::Blue => "Azul",
            Theme::Green => "Verde",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_keys_take_defaults() {
        let cfg: AppConfig = serde_json::from_str(r#"{"groupSize": 4, "theme": "Escuro"}"#).unwrap();
        assert_eq!(cfg.group_size, 4);
        assert_eq!(cfg.theme, Theme::Dark);
        assert_eq!(cfg.method, Method::Random);
        assert!(cfg.redistribute_singles);
        assert!(cfg.allow_larger_groups);
    }

    #[test]
    fn test_empty_document_is_default() {
        let cfg: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_serialized_keys() {
        let json = serde_json::to_value(AppConfig::default()).unwrap();
        assert_eq!(json["groupSize"], 3);
        assert_eq!(json["method"], "Aleatório");
        assert_eq!(json["redistributeSingles"], true);
        assert_eq!(json["theme"], "Padrão");
    }
}
