//! 目标课程配置加载
//!
//! 支持 YAML / JSON / TOML 三种文件，两种写法：
//! - 旧版平铺映射 `{课程名: 教师名}`
//! - 对象列表 `[{course, prof, code, time, name}]`（TOML 中为 `[[course]]`）

use crate::models::course_target::CourseTarget;
use anyhow::{Context, Result};
use serde::de::{IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::Path;
use tokio::fs;
use tracing::{info, warn};

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetsFormat {
    Yaml,
    Json,
    Toml,
}

impl TargetsFormat {
    /// 根据扩展名判断格式，未知扩展名按 YAML 处理
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|s| s.to_str()) {
            Some("json") => TargetsFormat::Json,
            Some("toml") => TargetsFormat::Toml,
            _ => TargetsFormat::Yaml,
        }
    }
}

/// 从文件加载目标课程，文件不存在视为致命错误
pub async fn load_course_targets(path: &Path) -> Result<Vec<CourseTarget>> {
    info!("正在加载目标课程: {}", path.display());

    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("无法读取目标课程文件: {}", path.display()))?;

    let targets = parse_course_targets(&content, TargetsFormat::from_path(path))
        .with_context(|| format!("无法解析目标课程文件: {}", path.display()))?;

    info!("✓ 共加载 {} 个目标课程", targets.len());
    Ok(targets)
}

/// 解析配置文本
pub fn parse_course_targets(content: &str, format: TargetsFormat) -> Result<Vec<CourseTarget>> {
    let document = match format {
        TargetsFormat::Yaml => serde_yaml::from_str::<TargetsDocument>(content)?,
        TargetsFormat::Json => serde_json::from_str::<TargetsDocument>(content)?,
        TargetsFormat::Toml => match toml::from_str::<TomlDocument>(content)? {
            TomlDocument::Tables { course } => TargetsDocument::List(course),
            TomlDocument::Legacy(pairs) => TargetsDocument::Legacy(pairs),
        },
    };

    Ok(document.into_targets())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TargetsDocument {
    List(Vec<TargetEntry>),
    Legacy(LegacyPairs),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TomlDocument {
    Tables { course: Vec<TargetEntry> },
    Legacy(LegacyPairs),
}

/// 列表项；不是对象的项直接忽略
#[derive(Deserialize)]
#[serde(untagged)]
enum TargetEntry {
    Target(CourseTarget),
    Other(IgnoredAny),
}

impl TargetsDocument {
    fn into_targets(self) -> Vec<CourseTarget> {
        match self {
            TargetsDocument::List(entries) => entries
                .into_iter()
                .filter_map(|entry| match entry {
                    TargetEntry::Target(target) => Some(target),
                    TargetEntry::Other(_) => {
                        warn!("忽略非对象的目标课程配置项");
                        None
                    }
                })
                .collect(),
            TargetsDocument::Legacy(LegacyPairs(pairs)) => {
                info!("检测到旧版映射格式，转换为目标课程列表");
                pairs
                    .into_iter()
                    .map(|(course, prof)| CourseTarget::by_course(course, prof))
                    .collect()
            }
        }
    }
}

/// 按文件顺序保存的 `课程名 → 教师名` 映射
struct LegacyPairs(Vec<(String, Option<String>)>);

impl<'de> Deserialize<'de> for LegacyPairs {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct PairsVisitor;

        impl<'de> Visitor<'de> for PairsVisitor {
            type Value = LegacyPairs;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a mapping of course name to professor name")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut pairs = Vec::new();
                while let Some((course, prof)) = map.next_entry::<String, Option<String>>()? {
                    pairs.push((course, prof.filter(|p| !p.is_empty())));
                }
                Ok(LegacyPairs(pairs))
            }
        }

        deserializer.deserialize_map(PairsVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_yaml_mapping_keeps_order() {
        let targets = parse_course_targets(
            "Kalkulus 1: Budi\nAljabar Linear: Putri\nStatistika: \n",
            TargetsFormat::Yaml,
        )
        .unwrap();

        assert_eq!(targets.len(), 3);
        assert_eq!(targets[0].course.as_deref(), Some("Kalkulus 1"));
        assert_eq!(targets[0].professor.as_deref(), Some("Budi"));
        assert_eq!(targets[1].course.as_deref(), Some("Aljabar Linear"));
        assert_eq!(targets[2].professor, None);
    }

    #[test]
    fn test_yaml_list_with_numeric_code() {
        let yaml = r#"
- course: Analisis 1
  prof: Putri
- code: 782396
  name: Wajib
- just a string
"#;
        let targets = parse_course_targets(yaml, TargetsFormat::Yaml).unwrap();

        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].professor.as_deref(), Some("Putri"));
        assert_eq!(targets[1].code.as_deref(), Some("782396"));
        assert_eq!(targets[1].display_name.as_deref(), Some("Wajib"));
    }

    #[test]
    fn test_json_legacy_and_list() {
        let legacy = parse_course_targets(
            r#"{"Zoologi": "Ani", "Biologi": "Budi"}"#,
            TargetsFormat::Json,
        )
        .unwrap();
        assert_eq!(legacy[0].course.as_deref(), Some("Zoologi"));
        assert_eq!(legacy[1].course.as_deref(), Some("Biologi"));

        let list = parse_course_targets(
            r#"[{"course": "AnDat Kategorik", "time": "Senin, 10.00-12.30"}, {"code": "123"}]"#,
            TargetsFormat::Json,
        )
        .unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].time.as_deref(), Some("Senin, 10.00-12.30"));
        assert_eq!(list[1].code.as_deref(), Some("123"));
    }

    #[test]
    fn test_toml_tables() {
        let toml_text = r#"
[[course]]
course = "Analisis 1"
prof = "Putri"

[[course]]
code = 782396
"#;
        let targets = parse_course_targets(toml_text, TargetsFormat::Toml).unwrap();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[1].code.as_deref(), Some("782396"));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(TargetsFormat::from_path(Path::new("courses.json")), TargetsFormat::Json);
        assert_eq!(TargetsFormat::from_path(Path::new("courses.toml")), TargetsFormat::Toml);
        assert_eq!(TargetsFormat::from_path(Path::new("courses.yml")), TargetsFormat::Yaml);
    }

    #[tokio::test]
    async fn test_missing_file_is_error() {
        let result = load_course_targets(Path::new("definitely/not/here/courses.yaml")).await;
        assert!(result.is_err());
    }
}
