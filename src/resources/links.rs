//! 下载地址表：资源键 → 有序地址列表。
//!
//! 兼容早期只描述一个文档包的写法 `{"urls": [...]}`，映射到默认键 `jdk8`。

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::Value;

use super::error::ResourceError;

const LEGACY_URLS_FIELD: &str = "urls";
pub const LEGACY_DEFAULT_KEY: &str = "jdk8";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadLinks {
    links: BTreeMap<String, Vec<String>>,
}

impl DownloadLinks {
    pub fn from_json_str(json: &str) -> Result<Self, ResourceError> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| ResourceError::Config(format!("下载地址表解析失败：{}", e)))?;
        let Value::Object(map) = value else {
            return Err(ResourceError::Config("下载地址表顶层必须是对象".to_string()));
        };

        let mut links = BTreeMap::new();
        let legacy = map.len() == 1 && map.contains_key(LEGACY_URLS_FIELD);

        for (key, urls) in &map {
            let key = if legacy { LEGACY_DEFAULT_KEY } else { key.as_str() };
            links.insert(key.to_string(), parse_urls(key, urls)?);
        }

        Ok(Self { links })
    }

    /// 读取下载地址表；失败时记录错误并返回空表。
    pub fn load(path: &Path) -> Self {
        let result = std::fs::read_to_string(path)
            .map_err(|e| ResourceError::Config(format!("无法读取 {}：{}", path.display(), e)))
            .and_then(|json| Self::from_json_str(&json));

        match result {
            Ok(links) => {
                log::info!("🔗 已加载下载地址表 {}（{} 项）", path.display(), links.len());
                links
            }
            Err(e) => {
                log::error!("❌ 下载地址表不可用: {}", e);
                Self::default()
            }
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, urls: Vec<String>) {
        self.links.insert(key.into(), urls);
    }

    pub fn urls(&self, key: &str) -> Option<&[String]> {
        self.links.get(key).map(Vec::as_slice).filter(|urls| !urls.is_empty())
    }

    /// 依次尝试 `分类/子分类`、`子分类`、`分类`。
    pub fn download_key_for(&self, category: &str, subcategory: &str) -> Option<String> {
        let combined = format!("{}/{}", category, subcategory);
        [combined.as_str(), subcategory, category]
            .into_iter()
            .find(|key| self.urls(key).is_some())
            .map(str::to_string)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.links.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

fn parse_urls(key: &str, value: &Value) -> Result<Vec<String>, ResourceError> {
    match value {
        Value::String(url) => Ok(vec![url.clone()]),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| ResourceError::Config(format!("{} 的地址必须是字符串", key)))
            })
            .collect(),
        _ => Err(ResourceError::Config(format!("{} 的地址列表格式错误", key))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_single_bundle_maps_to_default_key() {
        let links = DownloadLinks::from_json_str(r#"{"urls": ["https://x/a.zip", "https://x/b.zip"]}"#)
            .expect("parse failed");
        assert_eq!(links.urls("jdk8").map(<[String]>::len), Some(2));
        assert!(links.urls("urls").is_none());
    }

    #[test]
    fn key_lookup_prefers_most_specific() {
        let links = DownloadLinks::from_json_str(
            r#"{"Java/jdk8": ["https://x/full.zip"], "jdk8": "https://x/sub.zip", "MySQL": "https://x/m.zip"}"#,
        )
        .expect("parse failed");

        assert_eq!(links.download_key_for("Java", "jdk8").as_deref(), Some("Java/jdk8"));
        assert_eq!(links.download_key_for("Other", "jdk8").as_deref(), Some("jdk8"));
        assert_eq!(links.download_key_for("MySQL", "8.0").as_deref(), Some("MySQL"));
        assert_eq!(links.download_key_for("Python", "3"), None);
    }

    #[test]
    fn empty_url_list_is_not_a_source() {
        let links = DownloadLinks::from_json_str(r#"{"jdk8": []}"#).expect("parse failed");
        assert_eq!(links.download_key_for("Java", "jdk8"), None);
    }

    #[test]
    fn missing_file_yields_empty_table() {
        let dir = tempfile::tempdir().expect("tempdir failed");
        assert!(DownloadLinks::load(&dir.path().join("wd.json")).is_empty());
    }
}
