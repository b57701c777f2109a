//! 缓存文本格式
//!
//! 第一行是版本头 `# warlock-cache v{N}`，之后每门课程一行：
//! `{标题}: | {班级1} | {班级2} | ...`，没有班级时只写标题。
//! 标题与班级行在构造时已压成单行且不含 `|`，因此分隔符不会出现在字段内部。
//! 没有版本头的文件按版本 1 读取

use crate::models::{ClassDetail, CourseEntry, ScheduleSnapshot};
use tracing::warn;

/// 当前缓存格式版本，格式变化时递增
pub const CACHE_FORMAT_VERSION: u32 = 1;

const VERSION_PREFIX: &str = "# warlock-cache v";
const CLASSES_MARKER: &str = ": |";
const CLASS_SEPARATOR: &str = " | ";

/// 序列化为缓存文本，顺序与快照插入顺序一致
pub fn serialize_schedule(snapshot: &ScheduleSnapshot) -> String {
    let header = format!("{}{}", VERSION_PREFIX, CACHE_FORMAT_VERSION);
    let courses = snapshot.iter().map(|course| {
        if course.classes.is_empty() {
            course.info_line.clone()
        } else {
            let classes: Vec<&str> = course.classes.iter().map(ClassDetail::line).collect();
            format!(
                "{}{} {}",
                course.info_line,
                CLASSES_MARKER,
                classes.join(CLASS_SEPARATOR)
            )
        }
    });

    std::iter::once(header)
        .chain(courses)
        .collect::<Vec<_>>()
        .join("\n")
}

/// 缓存文本的格式版本；无法识别的版本头返回 `None`
pub fn format_version(content: &str) -> Option<u32> {
    let first = content.lines().next().unwrap_or_default();
    match first.strip_prefix(VERSION_PREFIX) {
        Some(version) => version.trim().parse().ok(),
        None => Some(1),
    }
}

/// 从缓存文本还原快照
pub fn deserialize_schedule(content: &str) -> ScheduleSnapshot {
    let mut snapshot = ScheduleSnapshot::new();

    for line in content.lines() {
        if line.trim().is_empty() || line.starts_with(VERSION_PREFIX) {
            continue;
        }

        let entry = match line.split_once(CLASSES_MARKER) {
            Some((info_line, classes_text)) => {
                let classes = classes_text
                    .split(CLASS_SEPARATOR)
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .filter_map(|c| {
                        let detail = ClassDetail::parse(c);
                        if detail.is_none() {
                            warn!("[{}] 缓存中的班级行格式错误，已跳过: {}", info_line, c);
                        }
                        detail
                    })
                    .collect();
                CourseEntry::new(info_line, classes)
            }
            None => CourseEntry::new(line.trim(), Vec::new()),
        };

        snapshot.insert(entry);
    }

    snapshot
}
