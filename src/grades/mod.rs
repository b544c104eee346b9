//! Authenticated grades query and the grade-file writer.

mod persist;
mod query;

pub use persist::{GRADE_FILE_NAME, default_grade_path, save_grade_to_file};
pub use query::{APP_SHOW_PATH, GRADES_APP_ID, GRADES_QUERY_PATH, GradeReport, GradesClient};
