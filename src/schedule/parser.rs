//! 课表页面解析
//!
//! 页面中每门课程以 `<th class="sub border2 pad2">` 标题行开始，
//! 其后的 `<tr>` 直到下一个标题行为止都是该课程的班级

use crate::models::{ClassDetail, CourseEntry, ScheduleSnapshot};
use anyhow::Result;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

const HEADER_SELECTOR: &str = "th.sub, th.border2, th.pad2";
const CELL_SELECTOR: &str = "td";

/// 解析课表 HTML
///
/// 每个班级行跳过第一列序号，其余单元格以 `; ` 连接成一行；
/// 格式错误的行会被记录并跳过，不影响其他课程
pub fn parse_schedule_html(markup: &str) -> Result<ScheduleSnapshot> {
    let document = Html::parse_document(markup);
    let header_selector = selector(HEADER_SELECTOR)?;
    let cell_selector = selector(CELL_SELECTOR)?;

    let mut snapshot = ScheduleSnapshot::new();

    for header in document.select(&header_selector) {
        let Some(header_row) = header.parent().and_then(ElementRef::wrap) else {
            continue;
        };

        let course_line = stripped_text(&header);
        let mut classes = Vec::new();

        for sibling in header_row.next_siblings().filter_map(ElementRef::wrap) {
            if sibling.value().name() != "tr" {
                continue;
            }
            // 遇到下一门课程的标题
            if sibling.select(&header_selector).next().is_some() {
                break;
            }

            let cells: Vec<String> = sibling
                .select(&cell_selector)
                .map(|td| stripped_text(&td))
                .collect();
            if cells.is_empty() {
                continue;
            }

            let class_line = cells[1..].join("; ");
            match ClassDetail::parse(&class_line) {
                Some(detail) => classes.push(detail),
                None => warn!("[{}] 跳过格式错误的班级行: {}", course_line, class_line),
            }
        }

        debug!("解析课程 {} ({} 个班级)", course_line, classes.len());
        snapshot.insert(CourseEntry::new(course_line, classes));
    }

    Ok(snapshot)
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow::anyhow!("无效的选择器 {}: {:?}", css, e))
}

/// 逐段压缩空白后拼接文本
fn stripped_text(element: &ElementRef) -> String {
    element
        .text()
        .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<String>()
}
