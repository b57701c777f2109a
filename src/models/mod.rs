pub mod change;
pub mod course_target;
pub mod loaders;
pub mod schedule;

pub use change::{Change, ChangeField, ChangeKind};
pub use course_target::{CourseTarget, RowData};
pub use loaders::{load_course_targets, parse_course_targets, TargetsFormat};
pub use schedule::{ClassDetail, CourseEntry, ScheduleSnapshot};
