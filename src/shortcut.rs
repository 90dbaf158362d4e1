//! 面板切换快捷键
//!
//! 只负责解析与规范化，全局热键注册不在本 crate 内。
//! 允许 `Ctrl + <字母 | 数字 | space | enter | escape | backspace | 符号>`，
//! 大小写与空白不敏感，统一规范为 `ctrl+<key>`。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::AppError;

pub const DEFAULT_SHORTCUT: &str = "ctrl+k";

const NAMED_KEYS: &[&str] = &["space", "enter", "escape", "backspace"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortcut {
    key: String,
}

impl Shortcut {
    pub fn parse(input: &str) -> Result<Self, AppError> {
        let compact: String = input.chars().filter(|c| !c.is_whitespace()).collect();
        let lower = compact.to_lowercase();

        let Some(key) = lower.strip_prefix("ctrl+") else {
            return Err(AppError::Config(format!("快捷键必须以 Ctrl 开头: {}", input.trim())));
        };

        let valid = match key.chars().count() {
            0 => false,
            1 => key.chars().all(|c| c.is_ascii_alphanumeric() || c.is_ascii_punctuation()),
            _ => NAMED_KEYS.contains(&key),
        };

        if !valid {
            return Err(AppError::Config(format!("不支持的快捷键: {}", input.trim())));
        }

        Ok(Self { key: key.to_string() })
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Default for Shortcut {
    fn default() -> Self {
        Self { key: "k".to_string() }
    }
}

impl fmt::Display for Shortcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctrl+{}", self.key)
    }
}

impl FromStr for Shortcut {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Shortcut {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Shortcut {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_spacing() {
        assert_eq!(Shortcut::parse("Ctrl + K").expect("valid").to_string(), "ctrl+k");
        assert_eq!(Shortcut::parse("CTRL+Space").expect("valid").to_string(), "ctrl+space");
        assert_eq!(Shortcut::parse("ctrl+7").expect("valid").key(), "7");
        assert_eq!(Shortcut::parse("ctrl+/").expect("valid").key(), "/");
    }

    #[test]
    fn rejects_other_modifiers_and_keys() {
        assert!(Shortcut::parse("alt+k").is_err());
        assert!(Shortcut::parse("ctrl+").is_err());
        assert!(Shortcut::parse("ctrl+f12").is_err());
        assert!(Shortcut::parse("k").is_err());
    }

    #[test]
    fn default_matches_constant() {
        assert_eq!(Shortcut::default().to_string(), DEFAULT_SHORTCUT);
    }

    #[test]
    fn serde_uses_normalized_string() {
        let shortcut: Shortcut = serde_json::from_str("\"Ctrl + J\"").expect("parse failed");
        assert_eq!(serde_json::to_string(&shortcut).expect("serialize failed"), "\"ctrl+j\"");
        assert!(serde_json::from_str::<Shortcut>("\"shift+a\"").is_err());
    }
}
