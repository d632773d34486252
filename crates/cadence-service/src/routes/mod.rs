pub mod assignments;
pub mod completions;
pub mod health;
pub mod patients;
pub mod sweep;
