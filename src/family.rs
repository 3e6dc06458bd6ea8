//! Family members: shared visibility through a generated access code.

use chrono::NaiveDateTime;
use rand::Rng;
use rusqlite::Connection;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::db::{self, StorageError};
use crate::models::FamilyMember;

const ACCESS_CODE_LEN: usize = 6;
const ACCESS_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

#[derive(Error, Debug)]
pub enum FamilyError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Input from the "add family member" form.
#[derive(Debug, Clone, Deserialize)]
pub struct FamilyMemberInput {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub can_edit: bool,
}

/// Generate a 6-character uppercase alphanumeric access code.
pub fn generate_access_code() -> String {
    let mut rng = rand::thread_rng();
    (0..ACCESS_CODE_LEN)
        .map(|_| ACCESS_CODE_ALPHABET[rng.gen_range(0..ACCESS_CODE_ALPHABET.len())] as char)
        .collect()
}

pub fn is_valid_access_code(code: &str) -> bool {
    code.len() == ACCESS_CODE_LEN
        && code
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}

/// Validate, assign id + access code, persist.
pub fn add_family_member(
    conn: &Connection,
    input: &FamilyMemberInput,
    now: NaiveDateTime,
) -> Result<FamilyMember, FamilyError> {
    let name = input.name.trim();
    let email = input.email.trim();
    if name.is_empty() || email.is_empty() {
        return Err(FamilyError::Validation(
            "Por favor, preencha o nome e o email.".into(),
        ));
    }

    let member = FamilyMember {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email: email.to_string(),
        phone: input
            .phone
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string),
        access_code: generate_access_code(),
        can_edit: input.can_edit,
        created_at: now,
    };
    db::insert_family_member(conn, &member)?;

    tracing::info!(member_id = %member.id, can_edit = member.can_edit, "Family member added");
    Ok(member)
}

pub fn list_family_members(conn: &Connection) -> Result<Vec<FamilyMember>, StorageError> {
    db::get_all_family_members(conn)
}

pub fn delete_family_member(conn: &Connection, id: &Uuid) -> Result<bool, StorageError> {
    let removed = db::delete_family_member(conn, id)?;
    if removed {
        tracing::info!(member_id = %id, "Family member removed");
    }
    Ok(removed)
}

/// Invitation text shared with the member.
pub fn share_message(member: &FamilyMember) -> String {
    format!(
        "Você foi adicionado ao MedicFácil!\n\nCódigo de Acesso: {}\n\nUse este código para acompanhar os medicamentos.",
        member.access_code
    )
}
