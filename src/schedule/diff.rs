//! 课表差异计算
//!
//! 输出顺序：新增课程 → 删除课程 → 修改课程，每一类内部按课程代码排序

use crate::models::{Change, ChangeField, ChangeKind, ClassDetail, CourseEntry, ScheduleSnapshot};
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

/// 新增班级字段名前缀
pub const ADDED_MARKER: &str = "[+]";
/// 修改班级字段名前缀
pub const MODIFIED_MARKER: &str = "[Δ]";
/// 删除班级字段名前缀
pub const REMOVED_MARKER: &str = "[−]";

/// 抑制选项
///
/// 只有"单独一个字段"发生变化时才会被抑制；
/// 任意两个字段同时变化一律上报
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffOptions {
    /// 抑制只有教师变化的班级
    pub suppress_professor_only: bool,
    /// 抑制只有教室变化的班级
    pub suppress_location_only: bool,
}

/// 计算两份课表之间的结构化差异，不修改输入
pub fn generate_diff(
    old: &ScheduleSnapshot,
    new: &ScheduleSnapshot,
    options: DiffOptions,
) -> Vec<Change> {
    let old_codes = old.codes();
    let new_codes = new.codes();
    let mut changes = Vec::new();

    // 新增课程
    for code in new_codes.difference(&old_codes) {
        if let Some(course) = new.get(code) {
            changes.push(new_course_change(course));
        }
    }

    // 删除课程
    for code in old_codes.difference(&new_codes) {
        if let Some(course) = old.get(code) {
            changes.push(Change {
                kind: ChangeKind::Removed,
                title: course.title().to_string(),
                fields: Vec::new(),
            });
        }
    }

    // 修改课程
    for code in old_codes.intersection(&new_codes) {
        if let (Some(old_course), Some(new_course)) = (old.get(code), new.get(code)) {
            if let Some(change) = modified_course_change(old_course, new_course, options) {
                changes.push(change);
            }
        }
    }

    changes
}

fn new_course_change(course: &CourseEntry) -> Change {
    Change {
        kind: ChangeKind::New,
        title: course.title().to_string(),
        fields: course
            .classes
            .iter()
            .map(|class| ChangeField::new(class.section.clone(), describe(class)))
            .collect(),
    }
}

fn modified_course_change(
    old_course: &CourseEntry,
    new_course: &CourseEntry,
    options: DiffOptions,
) -> Option<Change> {
    let old_classes = classes_by_section(old_course);
    let new_classes = classes_by_section(new_course);

    let old_sections: BTreeSet<&str> = old_classes.keys().copied().collect();
    let new_sections: BTreeSet<&str> = new_classes.keys().copied().collect();

    let added: Vec<&str> = new_sections.difference(&old_sections).copied().collect();
    let removed: Vec<&str> = old_sections.difference(&new_sections).copied().collect();

    let mut modified = Vec::new();
    for section in old_sections.intersection(&new_sections) {
        let (old_class, new_class) = (old_classes[section], new_classes[section]);
        let delta = FieldDelta::between(old_class, new_class);

        if !delta.any() {
            continue;
        }
        if options.suppress_professor_only && delta.only_instructor() {
            info!(
                "[{}] 已抑制教师变更 {}: {} -> {}",
                new_course.code, section, old_class.instructor, new_class.instructor
            );
            continue;
        }
        if options.suppress_location_only && delta.only_room() {
            info!(
                "[{}] 已抑制教室变更 {}: {} -> {}",
                new_course.code, section, old_class.room, new_class.room
            );
            continue;
        }
        modified.push(*section);
    }

    if added.is_empty() && removed.is_empty() && modified.is_empty() {
        return None;
    }

    let mut fields = Vec::new();

    for section in &added {
        fields.push(ChangeField::new(
            format!("{} {}", ADDED_MARKER, section),
            describe(new_classes[section]),
        ));
    }

    for section in &modified {
        let (old_class, new_class) = (old_classes[section], new_classes[section]);
        let lines: Vec<String> = [
            (&old_class.schedule, &new_class.schedule),
            (&old_class.room, &new_class.room),
            (&old_class.instructor, &new_class.instructor),
        ]
        .into_iter()
        .filter(|(before, after)| before != after)
        .map(|(before, after)| format!("- {} → {}", before, after))
        .collect();

        fields.push(ChangeField::new(
            format!("{} {}", MODIFIED_MARKER, section),
            lines.join("\n"),
        ));
    }

    for section in &removed {
        fields.push(ChangeField::new(
            format!("{} {}", REMOVED_MARKER, section),
            describe(old_classes[section]),
        ));
    }

    Some(Change {
        kind: ChangeKind::Modified,
        title: new_course.title().to_string(),
        fields,
    })
}

/// 班级标签 → 班级，同名标签以后出现的为准
fn classes_by_section(course: &CourseEntry) -> BTreeMap<&str, &ClassDetail> {
    course
        .classes
        .iter()
        .map(|class| (class.section.as_str(), class))
        .collect()
}

fn describe(class: &ClassDetail) -> String {
    format!("- {}\n- {}\n- {}", class.schedule, class.room, class.instructor)
}

/// 三个可比较字段各自是否变化
#[derive(Debug, Clone, Copy)]
struct FieldDelta {
    schedule: bool,
    room: bool,
    instructor: bool,
}

impl FieldDelta {
    fn between(old: &ClassDetail, new: &ClassDetail) -> Self {
        Self {
            schedule: old.schedule != new.schedule,
            room: old.room != new.room,
            instructor: old.instructor != new.instructor,
        }
    }

    fn any(&self) -> bool {
        self.schedule || self.room || self.instructor
    }

    fn only_instructor(&self) -> bool {
        self.instructor && !self.schedule && !self.room
    }

    fn only_room(&self) -> bool {
        self.room && !self.schedule && !self.instructor
    }
}
