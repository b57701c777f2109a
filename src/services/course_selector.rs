//! 课程匹配 - 能力层
//!
//! 把目标课程列表与 IRS 表格行对应起来，不接触页面

use crate::models::{CourseTarget, RowData};
use tracing::debug;

/// 匹配结果
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Selection {
    /// 按文档顺序排列的 (目标, 行)
    pub selected: Vec<(CourseTarget, RowData)>,
    /// 没有任何行满足的目标，保持原始顺序
    pub unmatched: Vec<CourseTarget>,
}

impl Selection {
    pub fn is_complete(&self) -> bool {
        self.unmatched.is_empty()
    }
}

/// 按文档顺序遍历行，每行交给第一个满足的待匹配目标
///
/// 一个目标最多匹配一行，一行也最多满足一个目标
pub fn select_matches(rows: &[RowData], targets: &[CourseTarget]) -> Selection {
    let mut pending: Vec<CourseTarget> = targets.to_vec();
    let mut selected = Vec::new();

    for row in rows {
        if pending.is_empty() {
            break;
        }
        if let Some(pos) = pending.iter().position(|t| t.matches(row)) {
            let target = pending.remove(pos);
            debug!("匹配: {} → {} ({})", target, row.display_name, row.code);
            selected.push((target, row.clone()));
        }
    }

    Selection {
        selected,
        unmatched: pending,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, prof: &str, time: &str, code: &str) -> RowData {
        RowData {
            display_name: name.to_string(),
            professor: prof.to_string(),
            time: time.to_string(),
            code: code.to_string(),
        }
    }

    fn rows() -> Vec<RowData> {
        vec![
            row("Aljabar Linear - A", "Dr. Budi", "Senin 08.00-09.40", "701001"),
            row("Aljabar Linear - B", "Dr. Sari", "Selasa 10.00-11.40", "701002"),
            row("Basis Data - A", "Dr. Budi", "Rabu 13.00-14.40", "702001"),
        ]
    }

    #[test]
    fn test_first_matching_row_wins() {
        let targets = vec![CourseTarget::by_course("aljabar linear", None)];
        let selection = select_matches(&rows(), &targets);

        assert_eq!(selection.selected.len(), 1);
        assert_eq!(selection.selected[0].1.code, "701001");
        assert!(selection.is_complete());
    }

    #[test]
    fn test_professor_narrows_match() {
        let targets = vec![CourseTarget::by_course("Aljabar", Some("sari".to_string()))];
        let selection = select_matches(&rows(), &targets);

        assert_eq!(selection.selected[0].1.code, "701002");
    }

    #[test]
    fn test_row_satisfies_only_one_target() {
        let targets = vec![
            CourseTarget::by_course("Aljabar", None),
            CourseTarget::by_course("Aljabar", None),
        ];
        let selection = select_matches(&rows(), &targets);

        let codes: Vec<&str> = selection.selected.iter().map(|(_, r)| r.code.as_str()).collect();
        assert_eq!(codes, vec!["701001", "701002"]);
    }

    #[test]
    fn test_code_prefix_is_exclusive() {
        let mut target = CourseTarget::by_code("702");
        target.course = Some("Aljabar".to_string());
        let selection = select_matches(&rows(), &[target]);

        assert_eq!(selection.selected.len(), 1);
        assert_eq!(selection.selected[0].1.display_name, "Basis Data - A");
    }

    #[test]
    fn test_unmatched_targets_reported() {
        let targets = vec![
            CourseTarget::by_course("Basis Data", None),
            CourseTarget::by_course("Kalkulus", None),
            CourseTarget::default(),
        ];
        let selection = select_matches(&rows(), &targets);

        assert_eq!(selection.selected.len(), 1);
        assert_eq!(selection.unmatched.len(), 2);
        assert_eq!(selection.unmatched[0].course.as_deref(), Some("Kalkulus"));
        assert!(!selection.is_complete());
    }

    #[test]
    fn test_selected_follows_document_order() {
        let targets = vec![
            CourseTarget::by_course("Basis Data", None),
            CourseTarget::by_course("Aljabar", None),
        ];
        let selection = select_matches(&rows(), &targets);

        let codes: Vec<&str> = selection.selected.iter().map(|(_, r)| r.code.as_str()).collect();
        assert_eq!(codes, vec!["701001", "702001"]);
    }
}
