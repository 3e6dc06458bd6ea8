use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A family member granted visibility through a shared access code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyMember {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    /// Six uppercase alphanumerics, fixed for the member's lifetime.
    pub access_code: String,
    pub can_edit: bool,
    pub created_at: NaiveDateTime,
}
