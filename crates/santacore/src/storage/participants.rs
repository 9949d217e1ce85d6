use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::config::limits::{MAX_PHONE_CHARS, MAX_TEXT_CHARS};
use crate::error::{AppError, AppResult};
use crate::registration::{normalize_optional, normalize_required, CompletedRegistration, ValidationError};
use crate::types::DeliveryOption;

/// A registered Secret Santa participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Participant {
    /// Internal id
    pub id: i64,
    /// Telegram user id, unique across the table
    pub telegram_user_id: i64,
    /// Telegram @username at the last registration, empty if the user has none
    pub username: String,
    pub ifo: String,
    pub address_option: DeliveryOption,
    pub address: String,
    pub phone_number: String,
    pub comment: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

const SELECT_COLUMNS: &str = "id, telegram_user_id, username, ifo, address_option, address, \
                              phone_number, comment, created_at, updated_at";

fn participant_from_row(row: &Row<'_>) -> rusqlite::Result<Participant> {
    Ok(Participant {
        id: row.get(0)?,
        telegram_user_id: row.get(1)?,
        username: row.get(2)?,
        ifo: row.get(3)?,
        address_option: row.get(4)?,
        address: row.get(5)?,
        phone_number: row.get(6)?,
        comment: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

/// Looks up the participant registered by a Telegram user.
pub fn find_by_telegram_id(conn: &Connection, telegram_user_id: i64) -> AppResult<Option<Participant>> {
    let sql = format!("SELECT {} FROM participants WHERE telegram_user_id = ?1", SELECT_COLUMNS);
    Ok(conn
        .query_row(&sql, [telegram_user_id], participant_from_row)
        .optional()?)
}

/// Whether this Telegram user already has a participant row.
pub fn is_registered(conn: &Connection, telegram_user_id: i64) -> AppResult<bool> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM participants WHERE telegram_user_id = ?1)",
        [telegram_user_id],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// Result of committing a registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOutcome {
    pub participant_id: i64,
    /// `false` when an existing row was overwritten
    pub created: bool,
}

/// Inserts a participant or overwrites the existing row of the same Telegram user.
///
/// Meant to run inside one transaction so the lookup and the write see the same
/// snapshot. `username = None` keeps whatever username was stored before.
pub fn save_registration(
    conn: &Connection,
    telegram_user_id: i64,
    username: Option<&str>,
    registration: &CompletedRegistration,
) -> AppResult<SaveOutcome> {
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM participants WHERE telegram_user_id = ?1",
            [telegram_user_id],
            |row| row.get(0),
        )
        .optional()?;

    match existing {
        Some(participant_id) => {
            conn.execute(
                "UPDATE participants
                 SET username = COALESCE(?2, username),
                     ifo = ?3,
                     address_option = ?4,
                     address = ?5,
                     phone_number = ?6,
                     comment = ?7,
                     updated_at = CURRENT_TIMESTAMP
                 WHERE id = ?1",
                params![
                    participant_id,
                    username,
                    registration.ifo,
                    registration.delivery,
                    registration.address,
                    registration.phone_number,
                    registration.comment,
                ],
            )?;
            Ok(SaveOutcome {
                participant_id,
                created: false,
            })
        }
        None => {
            conn.execute(
                "INSERT INTO participants
                     (telegram_user_id, username, ifo, address_option, address, phone_number, comment)
                 VALUES (?1, COALESCE(?2, ''), ?3, ?4, ?5, ?6, ?7)",
                params![
                    telegram_user_id,
                    username,
                    registration.ifo,
                    registration.delivery,
                    registration.address,
                    registration.phone_number,
                    registration.comment,
                ],
            )
            .map_err(|e| AppError::from_insert(e, telegram_user_id))?;
            Ok(SaveOutcome {
                participant_id: conn.last_insert_rowid(),
                created: true,
            })
        }
    }
}

pub fn get_by_id(conn: &Connection, id: i64) -> AppResult<Participant> {
    let sql = format!("SELECT {} FROM participants WHERE id = ?1", SELECT_COLUMNS);
    conn.query_row(&sql, [id], participant_from_row)
        .optional()?
        .ok_or(AppError::NotFound(id))
}

pub fn count(conn: &Connection) -> AppResult<i64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM participants", [], |row| row.get(0))?)
}

/// One page of participants ordered by id.
pub fn list_page(conn: &Connection, offset: usize, limit: usize) -> AppResult<Vec<Participant>> {
    let sql = format!(
        "SELECT {} FROM participants ORDER BY id LIMIT ?1 OFFSET ?2",
        SELECT_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![limit as i64, offset as i64], participant_from_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn list_all(conn: &Connection) -> AppResult<Vec<Participant>> {
    let sql = format!("SELECT {} FROM participants ORDER BY id", SELECT_COLUMNS);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], participant_from_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// Text columns the admin panel may edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditableField {
    Ifo,
    Address,
    PhoneNumber,
    Comment,
}

impl EditableField {
    pub const ALL: [EditableField; 4] = [
        EditableField::Ifo,
        EditableField::Address,
        EditableField::PhoneNumber,
        EditableField::Comment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EditableField::Ifo => "ifo",
            EditableField::Address => "address",
            EditableField::PhoneNumber => "phone",
            EditableField::Comment => "comment",
        }
    }

    fn column(&self) -> &'static str {
        match self {
            EditableField::Ifo => "ifo",
            EditableField::Address => "address",
            EditableField::PhoneNumber => "phone_number",
            EditableField::Comment => "comment",
        }
    }

    /// Trims and validates a new value. Only the comment may become empty (`None`).
    pub fn normalize(&self, raw: &str) -> Result<Option<String>, ValidationError> {
        match self {
            EditableField::Ifo | EditableField::Address => normalize_required(raw, MAX_TEXT_CHARS).map(Some),
            EditableField::PhoneNumber => normalize_required(raw, MAX_PHONE_CHARS).map(Some),
            EditableField::Comment => normalize_optional(raw, MAX_TEXT_CHARS),
        }
    }
}

impl fmt::Display for EditableField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EditableField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ifo" => Ok(EditableField::Ifo),
            "address" => Ok(EditableField::Address),
            "phone" => Ok(EditableField::PhoneNumber),
            "comment" => Ok(EditableField::Comment),
            _ => Err(format!("Unknown participant field: {}", s)),
        }
    }
}

/// Validates `raw` for `field` and writes it to participant `id`.
pub fn update_field(conn: &Connection, id: i64, field: EditableField, raw: &str) -> AppResult<()> {
    let value = field.normalize(raw)?;
    let sql = format!(
        "UPDATE participants SET {} = ?2, updated_at = CURRENT_TIMESTAMP WHERE id = ?1",
        field.column()
    );
    let changed = conn.execute(&sql, params![id, value])?;
    if changed == 0 {
        return Err(AppError::NotFound(id));
    }
    Ok(())
}

pub fn set_delivery_option(conn: &Connection, id: i64, option: DeliveryOption) -> AppResult<()> {
    let changed = conn.execute(
        "UPDATE participants SET address_option = ?2, updated_at = CURRENT_TIMESTAMP WHERE id = ?1",
        params![id, option],
    )?;
    if changed == 0 {
        return Err(AppError::NotFound(id));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::migrations::run_migrations;
    use pretty_assertions::assert_eq;

    fn conn() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();
        conn
    }

    fn registration(address: &str) -> CompletedRegistration {
        CompletedRegistration {
            ifo: "Ivan".to_string(),
            delivery: DeliveryOption::Pickup,
            address: address.to_string(),
            phone_number: "+1000".to_string(),
            comment: None,
        }
    }

    #[test]
    fn test_first_save_inserts() {
        let conn = conn();
        let outcome = save_registration(&conn, 42, Some("ivan"), &registration("Main St 1")).unwrap();
        assert!(outcome.created);

        let p = find_by_telegram_id(&conn, 42).unwrap().unwrap();
        assert_eq!(p.id, outcome.participant_id);
        assert_eq!(p.username, "ivan");
        assert_eq!(p.address_option, DeliveryOption::Pickup);
        assert_eq!(p.comment, None);
        assert!(is_registered(&conn, 42).unwrap());
        assert!(!is_registered(&conn, 43).unwrap());
    }

    #[test]
    fn test_second_save_updates_same_row() {
        let conn = conn();
        let first = save_registration(&conn, 42, Some("ivan"), &registration("Main St 1")).unwrap();
        let second = save_registration(&conn, 42, None, &registration("Main St 2")).unwrap();

        assert!(!second.created);
        assert_eq!(first.participant_id, second.participant_id);
        assert_eq!(count(&conn).unwrap(), 1);

        let p = get_by_id(&conn, first.participant_id).unwrap();
        assert_eq!(p.address, "Main St 2");
        assert_eq!(p.username, "ivan", "missing username keeps the stored one");
    }

    #[test]
    fn test_missing_username_is_stored_empty() {
        let conn = conn();
        save_registration(&conn, 7, None, &registration("Main St 1")).unwrap();
        assert_eq!(find_by_telegram_id(&conn, 7).unwrap().unwrap().username, "");
    }

    #[test]
    fn test_get_by_id_unknown_is_not_found() {
        let conn = conn();
        assert!(matches!(get_by_id(&conn, 99), Err(AppError::NotFound(99))));
    }

    #[test]
    fn test_list_page_is_ordered_and_bounded() {
        let conn = conn();
        for uid in 1..=5 {
            save_registration(&conn, uid * 10, None, &registration("Main St 1")).unwrap();
        }

        let page: Vec<i64> = list_page(&conn, 2, 2)
            .unwrap()
            .into_iter()
            .map(|p| p.telegram_user_id)
            .collect();
        assert_eq!(page, vec![30, 40]);
        assert_eq!(list_page(&conn, 4, 10).unwrap().len(), 1);
        assert!(list_page(&conn, 5, 10).unwrap().is_empty());
        assert_eq!(list_all(&conn).unwrap().len(), 5);
    }

    #[test]
    fn test_update_field_validates_and_clears_comment() {
        let conn = conn();
        let id = save_registration(&conn, 1, None, &registration("Main St 1"))
            .unwrap()
            .participant_id;

        update_field(&conn, id, EditableField::Comment, " no sweets ").unwrap();
        assert_eq!(get_by_id(&conn, id).unwrap().comment.as_deref(), Some("no sweets"));

        update_field(&conn, id, EditableField::Comment, "").unwrap();
        assert_eq!(get_by_id(&conn, id).unwrap().comment, None);

        let err = update_field(&conn, id, EditableField::Ifo, "   ").unwrap_err();
        assert!(matches!(err, AppError::Validation(ValidationError::Empty)));

        update_field(&conn, id, EditableField::PhoneNumber, "+2000").unwrap();
        assert_eq!(get_by_id(&conn, id).unwrap().phone_number, "+2000");

        assert!(matches!(
            update_field(&conn, id + 1, EditableField::Address, "x"),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_set_delivery_option() {
        let conn = conn();
        let id = save_registration(&conn, 1, None, &registration("Main St 1"))
            .unwrap()
            .participant_id;

        set_delivery_option(&conn, id, DeliveryOption::Home).unwrap();
        let raw: String = conn
            .query_row("SELECT address_option FROM participants WHERE id = ?1", [id], |row| row.get(0))
            .unwrap();
        assert_eq!(raw, "home");
    }

    #[test]
    fn test_editable_field_from_str() {
        for field in EditableField::ALL {
            assert_eq!(field.as_str().parse::<EditableField>().unwrap(), field);
        }
        assert!("phone_number".parse::<EditableField>().is_err());
    }
}
