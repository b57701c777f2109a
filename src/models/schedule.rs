//! 课表数据结构
//!
//! `ScheduleSnapshot` 是值对象：追踪器同时只持有上一次与本次两份，
//! 比较时不关心课程顺序，序列化时保持插入顺序

use std::collections::BTreeSet;

/// 单个班级（一个上课时间段）
///
/// 保留原始行文本，缓存序列化时原样写回
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDetail {
    /// 班级标签（去掉 "Kelas" 前缀）
    pub section: String,
    /// 上课时间
    pub schedule: String,
    /// 教室
    pub room: String,
    /// 授课教师，缺失时为 "-"
    pub instructor: String,
    line: String,
}

impl ClassDetail {
    /// 解析以 `; ` 分隔的班级行
    ///
    /// 字段位置固定：0 = 班级，3 = 时间，4 = 教室，5 = 教师（可选）。
    /// 少于 5 段的行视为格式错误，返回 `None`
    pub fn parse(line: &str) -> Option<Self> {
        let line = single_line(line);
        let parts: Vec<&str> = line.split(';').collect();
        if parts.len() < 5 {
            return None;
        }

        Some(Self {
            section: parts[0].replace("Kelas", "").trim().to_string(),
            schedule: clean_field(parts[3]),
            room: clean_field(parts[4]),
            instructor: parts
                .get(5)
                .map(|p| clean_field(p))
                .unwrap_or_else(|| "-".to_string()),
            line,
        })
    }

    /// 原始行文本
    pub fn line(&self) -> &str {
        &self.line
    }
}

/// 压缩连续空白并把 `|` 换成 `/`，保证一条记录只占缓存中的一行
pub fn single_line(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace('|', "/")
}

/// 去掉首尾空白以及开头的 "- " 列表符号
fn clean_field(raw: &str) -> String {
    raw.trim()
        .trim_start_matches(|c| c == '-' || c == ' ')
        .to_string()
}

/// 一门课程
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseEntry {
    /// 课程代码（标题中第一个 `-` 之前的部分）
    pub code: String,
    /// 课程标题行，原样保存
    pub info_line: String,
    pub classes: Vec<ClassDetail>,
}

impl CourseEntry {
    /// 从标题行构造，课程代码由标题推导
    pub fn new(info_line: impl Into<String>, classes: Vec<ClassDetail>) -> Self {
        let info_line = single_line(&info_line.into());
        Self {
            code: course_code_of(&info_line),
            info_line,
            classes,
        }
    }

    /// 用于通知标题的课程名
    pub fn title(&self) -> &str {
        self.info_line
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
    }
}

/// 标题行中第一个 `-` 之前的部分即课程代码
pub fn course_code_of(info_line: &str) -> String {
    info_line
        .split('-')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// 课程代码 → 课程 的有序映射
#[derive(Debug, Clone, Default)]
pub struct ScheduleSnapshot {
    courses: Vec<CourseEntry>,
}

impl ScheduleSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入课程；代码已存在时原位替换
    pub fn insert(&mut self, entry: CourseEntry) {
        match self.courses.iter_mut().find(|c| c.code == entry.code) {
            Some(existing) => *existing = entry,
            None => self.courses.push(entry),
        }
    }

    pub fn get(&self, code: &str) -> Option<&CourseEntry> {
        self.courses.iter().find(|c| c.code == code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.get(code).is_some()
    }

    /// 按插入顺序遍历
    pub fn iter(&self) -> impl Iterator<Item = &CourseEntry> {
        self.courses.iter()
    }

    /// 排序后的课程代码集合
    pub fn codes(&self) -> BTreeSet<&str> {
        self.courses.iter().map(|c| c.code.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }
}

impl FromIterator<CourseEntry> for ScheduleSnapshot {
    fn from_iter<I: IntoIterator<Item = CourseEntry>>(iter: I) -> Self {
        let mut snapshot = Self::new();
        for entry in iter {
            snapshot.insert(entry);
        }
        snapshot
    }
}

// 比较时忽略课程顺序
impl PartialEq for ScheduleSnapshot {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .courses
                .iter()
                .all(|c| other.get(&c.code).is_some_and(|o| o == c))
    }
}

impl Eq for ScheduleSnapshot {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_class_detail() {
        let detail =
            ClassDetail::parse("Kelas A; Indonesia; d; Mon 08.00; Room1; - Prof X").unwrap();
        assert_eq!(detail.section, "A");
        assert_eq!(detail.schedule, "Mon 08.00");
        assert_eq!(detail.room, "Room1");
        assert_eq!(detail.instructor, "Prof X");
    }

    #[test]
    fn test_parse_class_detail_without_instructor() {
        let detail = ClassDetail::parse("Kelas B; English; Date; Time; Room").unwrap();
        assert_eq!(detail.instructor, "-");
    }

    #[test]
    fn test_malformed_class_detail_is_dropped() {
        assert!(ClassDetail::parse("Kelas A; English; Date").is_none());
        assert!(ClassDetail::parse("").is_none());
    }

    #[test]
    fn test_class_line_is_kept_on_one_line() {
        let raw = "Kelas A; Indonesia; d; Rabu, 08.00; R1; - Dr. Ani,\n    Dr. Budi | TA";
        let detail = ClassDetail::parse(raw).unwrap();
        assert_eq!(
            detail.line(),
            "Kelas A; Indonesia; d; Rabu, 08.00; R1; - Dr. Ani, Dr. Budi / TA"
        );
        assert_eq!(detail.instructor, "Dr. Ani, Dr. Budi / TA");

        let course = CourseEntry::new("CS101 -\n  Intro | Lab", vec![]);
        assert_eq!(course.info_line, "CS101 - Intro / Lab");
    }

    #[test]
    fn test_course_code_from_info_line() {
        assert_eq!(course_code_of("CS101 - Intro to CS"), "CS101");
        assert_eq!(course_code_of("NoDash"), "NoDash");
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut snapshot = ScheduleSnapshot::new();
        snapshot.insert(CourseEntry::new("CS101 - Intro", vec![]));
        snapshot.insert(CourseEntry::new("CS102 - Data", vec![]));
        snapshot.insert(CourseEntry::new("CS101 - Intro (renamed)", vec![]));

        let codes: Vec<&str> = snapshot.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, vec!["CS101", "CS102"]);
        assert_eq!(snapshot.get("CS101").unwrap().info_line, "CS101 - Intro (renamed)");
    }

    #[test]
    fn test_equality_ignores_order() {
        let a: ScheduleSnapshot = vec![
            CourseEntry::new("CS101 - Intro", vec![]),
            CourseEntry::new("CS102 - Data", vec![]),
        ]
        .into_iter()
        .collect();
        let b: ScheduleSnapshot = vec![
            CourseEntry::new("CS102 - Data", vec![]),
            CourseEntry::new("CS101 - Intro", vec![]),
        ]
        .into_iter()
        .collect();
        assert_eq!(a, b);
    }
}
