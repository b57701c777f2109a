pub mod course_selector;
pub mod irs_service;

pub use course_selector::{select_matches, Selection};
pub use irs_service::{FillOutcome, IrsService};
