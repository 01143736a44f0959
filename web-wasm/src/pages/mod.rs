pub mod dashboard;
pub mod processing;
pub mod search;
