mod outcome;
mod result_set;
mod table;

pub use outcome::QueryOutcome;
pub use result_set::{NULL_SENTINEL, ResultSet, Row};
