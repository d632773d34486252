use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Role {
    Admin,
    Psychologist,
    Patient,
}

impl Role {
    /// Roles allowed to manage assignments and review answers.
    pub fn is_staff(self) -> bool {
        matches!(self, Role::Admin | Role::Psychologist)
    }
}
