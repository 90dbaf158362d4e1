//! # 资源索引
//!
//! ## 设计思路
//!
//! 资源配置是一棵任意深度的 JSON 树：对象为分组，字符串或字符串数组为叶子（候选路径列表）。
//! 用递归枚举 `ResourceNode` 表示，查找、遍历、搜索都是递归访问。
//!
//! ```json
//! {
//!   "Java": { "jdk8": ["jdk8/index.html", "https://docs.oracle.com/javase/8/docs/api/"] },
//!   "MySQL": { "8.0": "mysql/refman-8.0/index.html" }
//! }
//! ```
//!
//! ## 实现思路
//!
//! - `serde_json` 启用 `preserve_order`，分组子节点保持文件中的顺序
//! - 候选路径在读取时归一化：HTTP(S) 为远程地址，绝对路径原样，相对路径拼到解压根目录
//! - 配置缺失或格式错误时退化为空索引并记录错误，查找结果为“未找到”

use std::fmt;
use std::path::{Path, PathBuf};

use serde_json::Value;

use super::error::ResourceError;

/// 资源树节点。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceNode {
    Group(Vec<(String, ResourceNode)>),
    Leaf(Vec<String>),
}

impl ResourceNode {
    pub fn from_json(value: &Value) -> Result<Self, ResourceError> {
        match value {
            Value::Object(map) => map
                .iter()
                .map(|(name, child)| Self::from_json(child).map(|node| (name.clone(), node)))
                .collect::<Result<Vec<_>, ResourceError>>()
                .map(ResourceNode::Group),
            Value::String(path) => Ok(ResourceNode::Leaf(vec![path.clone()])),
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| ResourceError::Config(format!("路径列表只能包含字符串：{}", item)))
                })
                .collect::<Result<Vec<_>, ResourceError>>()
                .map(ResourceNode::Leaf),
            other => Err(ResourceError::Config(format!("不支持的资源节点：{}", other))),
        }
    }

    pub fn child(&self, name: &str) -> Option<&ResourceNode> {
        match self {
            ResourceNode::Group(children) => children
                .iter()
                .find(|(child_name, _)| child_name == name)
                .map(|(_, node)| node),
            ResourceNode::Leaf(_) => None,
        }
    }

    /// 按键路径逐级查找。
    pub fn lookup<S: AsRef<str>>(&self, path: &[S]) -> Option<&ResourceNode> {
        path.iter().try_fold(self, |node, key| node.child(key.as_ref()))
    }

    /// 深度优先访问每个叶子，回调参数为（键路径，候选路径）。
    pub fn walk<F>(&self, visit: &mut F)
    where
        F: FnMut(&[String], &[String]),
    {
        let mut trail = Vec::new();
        self.walk_inner(&mut trail, visit);
    }

    fn walk_inner<F>(&self, trail: &mut Vec<String>, visit: &mut F)
    where
        F: FnMut(&[String], &[String]),
    {
        match self {
            ResourceNode::Leaf(paths) => visit(trail, paths),
            ResourceNode::Group(children) => {
                for (name, child) in children {
                    trail.push(name.clone());
                    child.walk_inner(trail, visit);
                    trail.pop();
                }
            }
        }
    }

    /// 叶子名（键路径最后一段）不区分大小写的子串搜索。
    pub fn search(&self, query: &str) -> Vec<ResourceHit> {
        let needle = query.trim().to_lowercase();
        let mut hits = Vec::new();
        if needle.is_empty() {
            return hits;
        }

        self.walk(&mut |key_path, paths| {
            let matched = key_path
                .last()
                .map(|name| name.to_lowercase().contains(&needle))
                .unwrap_or(false);
            if matched {
                hits.push(ResourceHit {
                    key_path: key_path.to_vec(),
                    paths: paths.to_vec(),
                });
            }
        });
        hits
    }

    pub fn leaf_count(&self) -> usize {
        let mut count = 0;
        self.walk(&mut |_, _| count += 1);
        count
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceHit {
    pub key_path: Vec<String>,
    pub paths: Vec<String>,
}

impl ResourceHit {
    pub fn key(&self) -> String {
        self.key_path.join("/")
    }
}

/// 解析后的资源位置，交给外部查看器。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceLocation {
    Local(PathBuf),
    Remote(String),
}

impl ResourceLocation {
    /// 远程地址视为始终存在。
    pub fn exists(&self) -> bool {
        match self {
            ResourceLocation::Local(path) => path.exists(),
            ResourceLocation::Remote(_) => true,
        }
    }

    pub fn as_local(&self) -> Option<&Path> {
        match self {
            ResourceLocation::Local(path) => Some(path),
            ResourceLocation::Remote(_) => None,
        }
    }
}

impl fmt::Display for ResourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceLocation::Local(path) => write!(f, "{}", path.display()),
            ResourceLocation::Remote(url) => write!(f, "{}", url),
        }
    }
}

fn is_remote(candidate: &str) -> bool {
    let lower = candidate.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// 只读资源索引。
#[derive(Debug, Clone)]
pub struct ResourceIndex {
    root: ResourceNode,
    extract_root: PathBuf,
}

impl ResourceIndex {
    pub fn empty(extract_root: impl Into<PathBuf>) -> Self {
        Self {
            root: ResourceNode::Group(Vec::new()),
            extract_root: extract_root.into(),
        }
    }

    pub fn from_json_str(json: &str, extract_root: impl Into<PathBuf>) -> Result<Self, ResourceError> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| ResourceError::Config(format!("资源索引解析失败：{}", e)))?;
        if !value.is_object() {
            return Err(ResourceError::Config("资源索引顶层必须是对象".to_string()));
        }

        Ok(Self {
            root: ResourceNode::from_json(&value)?,
            extract_root: extract_root.into(),
        })
    }

    /// 读取资源索引；失败时记录错误并返回空索引。
    pub fn load(path: &Path, extract_root: impl Into<PathBuf>) -> Self {
        let extract_root = extract_root.into();

        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) => {
                log::error!("❌ 无法读取资源索引 {}: {}", path.display(), e);
                return Self::empty(extract_root);
            }
        };

        match Self::from_json_str(&json, extract_root.clone()) {
            Ok(index) => {
                log::info!("📚 已加载资源索引 {}（{} 项）", path.display(), index.root.leaf_count());
                index
            }
            Err(e) => {
                log::error!("❌ 资源索引无效 {}: {}", path.display(), e);
                Self::empty(extract_root)
            }
        }
    }

    pub fn root(&self) -> &ResourceNode {
        &self.root
    }

    pub fn extract_root(&self) -> &Path {
        &self.extract_root
    }

    pub fn is_empty(&self) -> bool {
        matches!(&self.root, ResourceNode::Group(children) if children.is_empty())
    }

    /// 候选位置列表（已归一化）。`subcategory` 可用 `/` 表示更深的层级。
    pub fn candidates(&self, category: &str, subcategory: &str) -> Vec<ResourceLocation> {
        let mut path = vec![category];
        path.extend(subcategory.split('/').filter(|part| !part.is_empty()));

        match self.root.lookup(&path) {
            Some(ResourceNode::Leaf(paths)) => paths.iter().map(|p| self.normalize(p)).collect(),
            _ => Vec::new(),
        }
    }

    /// 第一个存在的候选位置。
    pub fn first_existing(&self, category: &str, subcategory: &str) -> Option<ResourceLocation> {
        self.candidates(category, subcategory)
            .into_iter()
            .find(ResourceLocation::exists)
    }

    pub fn normalize(&self, candidate: &str) -> ResourceLocation {
        let candidate = candidate.trim();
        if is_remote(candidate) {
            return ResourceLocation::Remote(candidate.to_string());
        }

        let path = Path::new(candidate);
        if path.is_absolute() {
            ResourceLocation::Local(path.to_path_buf())
        } else {
            ResourceLocation::Local(self.extract_root.join(path))
        }
    }

    pub fn search(&self, query: &str) -> Vec<ResourceHit> {
        self.root.search(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "Java": {
            "jdk8": ["jdk8/api/index.html", "https://docs.oracle.com/javase/8/docs/api/"],
            "Guides": { "Collections": "jdk8/guides/collections.html" }
        },
        "MySQL": { "8.0": "/opt/docs/mysql/index.html" }
    }"#;

    #[test]
    fn nested_groups_keep_file_order() {
        let index = ResourceIndex::from_json_str(SAMPLE, "/data/extracted").expect("parse failed");
        let ResourceNode::Group(children) = index.root() else {
            panic!("root should be a group");
        };
        let names: Vec<_> = children.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["Java", "MySQL"]);
    }

    #[test]
    fn candidates_are_normalized() {
        let index = ResourceIndex::from_json_str(SAMPLE, "/data/extracted").expect("parse failed");
        let candidates = index.candidates("Java", "jdk8");
        assert_eq!(
            candidates,
            vec![
                ResourceLocation::Local(PathBuf::from("/data/extracted/jdk8/api/index.html")),
                ResourceLocation::Remote("https://docs.oracle.com/javase/8/docs/api/".to_string()),
            ]
        );

        assert_eq!(
            index.candidates("Java", "Guides/Collections"),
            vec![ResourceLocation::Local(PathBuf::from(
                "/data/extracted/jdk8/guides/collections.html"
            ))]
        );
    }

    #[test]
    fn remote_candidate_counts_as_existing() {
        let index = ResourceIndex::from_json_str(SAMPLE, "/nonexistent-root").expect("parse failed");
        assert!(matches!(
            index.first_existing("Java", "jdk8"),
            Some(ResourceLocation::Remote(_))
        ));
    }

    #[test]
    fn group_or_unknown_key_has_no_candidates() {
        let index = ResourceIndex::from_json_str(SAMPLE, "/r").expect("parse failed");
        assert!(index.candidates("Java", "Guides").is_empty());
        assert!(index.candidates("Python", "3").is_empty());
    }

    #[test]
    fn search_matches_leaf_names_case_insensitively() {
        let index = ResourceIndex::from_json_str(SAMPLE, "/r").expect("parse failed");
        let hits = index.search("COLL");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].key(), "Java/Guides/Collections");
        assert!(index.search("   ").is_empty());
    }

    #[test]
    fn walk_visits_every_leaf_depth_first() {
        let index = ResourceIndex::from_json_str(SAMPLE, "/r").expect("parse failed");
        let mut keys = Vec::new();
        index.root().walk(&mut |key_path, _| keys.push(key_path.join("/")));
        assert_eq!(keys, vec!["Java/jdk8", "Java/Guides/Collections", "MySQL/8.0"]);
    }

    #[test]
    fn invalid_leaf_is_rejected() {
        assert!(ResourceIndex::from_json_str(r#"{"Java": {"jdk8": 8}}"#, "/r").is_err());
        assert!(ResourceIndex::from_json_str(r#"["a"]"#, "/r").is_err());
    }

    #[test]
    fn load_degrades_to_empty_index() {
        let dir = tempfile::tempdir().expect("tempdir failed");
        let missing = ResourceIndex::load(&dir.path().join("missing.json"), dir.path());
        assert!(missing.is_empty());

        let broken_path = dir.path().join("broken.json");
        std::fs::write(&broken_path, "{ not json").expect("write failed");
        let broken = ResourceIndex::load(&broken_path, dir.path());
        assert!(broken.is_empty());
        assert!(broken.first_existing("Java", "jdk8").is_none());
    }
}
