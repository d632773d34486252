pub mod assignment;
pub mod completion;
pub mod optional_id;
pub mod questionnaire;
pub mod stats;
pub mod user;
