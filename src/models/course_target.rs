use serde::{Deserialize, Serialize};

/// IRS 表格中的一行可选课程
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowData {
    /// 页面上显示的课程名
    #[serde(rename = "name")]
    pub display_name: String,
    #[serde(rename = "prof")]
    pub professor: String,
    pub time: String,
    /// 单选框的 value，即班级代码
    pub code: String,
}

/// 期望选上的课程
///
/// `course` 与 `code` 至少需要设置一个，否则永远不会匹配
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseTarget {
    #[serde(default)]
    pub course: Option<String>,
    #[serde(default, rename = "prof", alias = "professor")]
    pub professor: Option<String>,
    #[serde(default, deserialize_with = "deserialize_code")]
    pub code: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default, rename = "name", alias = "display_name")]
    pub display_name: Option<String>,
}

impl CourseTarget {
    /// 按课程名（和可选的教师）构造
    pub fn by_course(course: impl Into<String>, professor: Option<String>) -> Self {
        Self {
            course: Some(course.into()),
            professor,
            ..Default::default()
        }
    }

    /// 按班级代码构造
    pub fn by_code(code: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            ..Default::default()
        }
    }

    /// 判断某一行是否满足该目标
    ///
    /// 1. 设置了 `code` 时只看代码前缀，其他字段全部忽略
    /// 2. 否则必须设置 `course`，且为课程名的子串（忽略大小写）
    /// 3. `professor` / `time` 如果设置，同样需要是对应字段的子串
    pub fn matches(&self, row: &RowData) -> bool {
        if let Some(code) = non_blank(&self.code) {
            return row.code.starts_with(code);
        }

        let Some(course) = non_blank(&self.course) else {
            return false;
        };

        contains_ignore_case(&row.display_name, course)
            && non_blank(&self.professor).map_or(true, |p| contains_ignore_case(&row.professor, p))
            && non_blank(&self.time).map_or(true, |t| contains_ignore_case(&row.time, t))
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

impl std::fmt::Display for CourseTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = Vec::new();
        if let Some(name) = &self.display_name {
            parts.push(format!("[{}]", name));
        }
        if let Some(course) = &self.course {
            parts.push(format!("Course: {}", course));
        }
        if let Some(prof) = &self.professor {
            parts.push(format!("Prof: {}", prof));
        }
        if let Some(code) = &self.code {
            parts.push(format!("Code: {}", code));
        }
        if let Some(time) = &self.time {
            parts.push(format!("Time: {}", time));
        }
        write!(f, "{}", parts.join(" "))
    }
}

// YAML/JSON 中的班级代码可能被写成数字，统一转成字符串
fn deserialize_code<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Visitor;
    use std::fmt;

    struct CodeVisitor;

    impl<'de> Visitor<'de> for CodeVisitor {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or integer representing a class code")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(None)
        }

        fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
        where
            D: serde::Deserializer<'de>,
        {
            deserializer.deserialize_any(CodeVisitor)
        }
    }

    deserializer.deserialize_any(CodeVisitor)
}
