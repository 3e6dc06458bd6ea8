use rusqlite::{params, Connection};
use uuid::Uuid;

use super::parse_uuid;
use crate::db::{format_datetime, parse_datetime, StorageError};
use crate::models::FamilyMember;

/// Add a family member. Fails if the id already exists.
pub fn insert_family_member(conn: &Connection, member: &FamilyMember) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO family_members (id, name, email, phone, access_code, can_edit, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            member.id.to_string(),
            member.name,
            member.email,
            member.phone,
            member.access_code,
            member.can_edit as i32,
            format_datetime(&member.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_all_family_members(conn: &Connection) -> Result<Vec<FamilyMember>, StorageError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, email, phone, access_code, can_edit, created_at
         FROM family_members ORDER BY rowid ASC",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, Option<String>>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, i32>(5)?,
            row.get::<_, String>(6)?,
        ))
    })?;

    let mut members = Vec::new();
    for row in rows {
        let (id, name, email, phone, access_code, can_edit, created_at) = row?;
        members.push(FamilyMember {
            id: parse_uuid("family_members.id", &id)?,
            name,
            email,
            phone,
            access_code,
            can_edit: can_edit != 0,
            created_at: parse_datetime("family_members.created_at", &created_at)?,
        });
    }
    Ok(members)
}

/// Delete a family member. Returns whether a row was removed.
pub fn delete_family_member(conn: &Connection, id: &Uuid) -> Result<bool, StorageError> {
    let removed = conn.execute(
        "DELETE FROM family_members WHERE id = ?1",
        params![id.to_string()],
    )?;
    Ok(removed > 0)
}
