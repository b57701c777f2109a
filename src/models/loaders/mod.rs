pub mod course_loader;

pub use course_loader::{load_course_targets, parse_course_targets, TargetsFormat};
