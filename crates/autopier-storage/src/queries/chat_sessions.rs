// SPDX-FileCopyrightText: 2026 AutoPier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat-session index operations.
//!
//! The unread counter and status flips run as single guarded UPDATE
//! statements on the single writer thread, so concurrent message events
//! cannot lose an increment to a read-modify-write race.

use autopier_core::{now_rfc3339, AutopierError, ConversationKind, SessionStatus};
use rusqlite::{params, OptionalExtension};

use crate::database::Database;
use crate::models::{parse_enum, ChatSession};

const SESSION_COLUMNS: &str = "id, conversation_type, reference_id, client_id, client_name, \
     client_phone, vehicle_name, vehicle_price, status, last_message_at, last_message_preview, \
     unread_count, created_at, updated_at";

fn row_to_session(row: &rusqlite::Row<'_>) -> rusqlite::Result<ChatSession> {
    Ok(ChatSession {
        id: row.get(0)?,
        conversation_type: parse_enum(1, row.get(1)?)?,
        reference_id: row.get(2)?,
        client_id: row.get(3)?,
        client_name: row.get(4)?,
        client_phone: row.get(5)?,
        vehicle_name: row.get(6)?,
        vehicle_price: row.get(7)?,
        status: parse_enum(8, row.get(8)?)?,
        last_message_at: row.get(9)?,
        last_message_preview: row.get(10)?,
        unread_count: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

/// Create a chat session, idempotently.
///
/// If a session already exists for the same (conversation_type,
/// reference_id), it is returned unchanged and the new row is discarded.
pub async fn create_session(
    db: &Database,
    session: &ChatSession,
) -> Result<ChatSession, AutopierError> {
    let session = session.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO chat_sessions (id, conversation_type, reference_id, client_id,
                     client_name, client_phone, vehicle_name, vehicle_price, status,
                     last_message_at, last_message_preview, unread_count, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
                 ON CONFLICT (conversation_type, reference_id) DO NOTHING",
                params![
                    session.id,
                    session.conversation_type.to_string(),
                    session.reference_id,
                    session.client_id,
                    session.client_name,
                    session.client_phone,
                    session.vehicle_name,
                    session.vehicle_price,
                    session.status.to_string(),
                    session.last_message_at,
                    session.last_message_preview,
                    session.unread_count,
                    session.created_at,
                    session.updated_at,
                ],
            )?;
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLUMNS} FROM chat_sessions
                 WHERE conversation_type = ?1 AND reference_id = ?2"
            ))?;
            let existing = stmt.query_row(
                params![session.conversation_type.to_string(), session.reference_id],
                row_to_session,
            )?;
            Ok(existing)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a session by its conversation reference.
pub async fn get_by_reference(
    db: &Database,
    conversation_type: ConversationKind,
    reference_id: &str,
) -> Result<Option<ChatSession>, AutopierError> {
    let reference_id = reference_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLUMNS} FROM chat_sessions
                 WHERE conversation_type = ?1 AND reference_id = ?2"
            ))?;
            let session = stmt
                .query_row(
                    params![conversation_type.to_string(), reference_id],
                    row_to_session,
                )
                .optional()?;
            Ok(session)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fold a message event into the session summary.
///
/// A client message bumps the unread counter and flips the status to
/// `waiting_response`; a staff message zeroes the counter (answering
/// implicitly clears unread) and flips the status to `active`. Both happen
/// in one statement. Returns `false` (a logged no-op at the caller) when no
/// session exists for the reference.
pub async fn record_message(
    db: &Database,
    conversation_type: ConversationKind,
    reference_id: &str,
    message_at: &str,
    preview: &str,
    from_client: bool,
) -> Result<bool, AutopierError> {
    let reference_id = reference_id.to_string();
    let message_at = message_at.to_string();
    let preview = preview.to_string();
    let now = now_rfc3339();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE chat_sessions SET
                     last_message_at = ?3,
                     last_message_preview = ?4,
                     status = CASE WHEN ?5 THEN 'waiting_response' ELSE 'active' END,
                     unread_count = CASE WHEN ?5 THEN unread_count + 1 ELSE 0 END,
                     updated_at = ?6
                 WHERE conversation_type = ?1 AND reference_id = ?2",
                params![
                    conversation_type.to_string(),
                    reference_id,
                    message_at,
                    preview,
                    from_client,
                    now,
                ],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Zero the unread counter and mark the session active (staff has seen the
/// conversation). No-op returning `false` when the session is absent.
pub async fn mark_read(
    db: &Database,
    conversation_type: ConversationKind,
    reference_id: &str,
) -> Result<bool, AutopierError> {
    let reference_id = reference_id.to_string();
    let now = now_rfc3339();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE chat_sessions SET unread_count = 0, status = 'active', updated_at = ?3
                 WHERE conversation_type = ?1 AND reference_id = ?2",
                params![conversation_type.to_string(), reference_id, now],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Set a session's status (used to close sessions when the underlying
/// record reaches a terminal status). No-op when the session is absent.
pub async fn set_status(
    db: &Database,
    conversation_type: ConversationKind,
    reference_id: &str,
    status: SessionStatus,
) -> Result<bool, AutopierError> {
    let reference_id = reference_id.to_string();
    let now = now_rfc3339();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE chat_sessions SET status = ?3, updated_at = ?4
                 WHERE conversation_type = ?1 AND reference_id = ?2",
                params![
                    conversation_type.to_string(),
                    reference_id,
                    status.to_string(),
                    now,
                ],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// A customer's non-closed sessions, most recent message first.
pub async fn list_active_for_phone(
    db: &Database,
    phone: &str,
) -> Result<Vec<ChatSession>, AutopierError> {
    let phone = phone.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLUMNS} FROM chat_sessions
                 WHERE client_phone = ?1 AND status != 'closed'
                 ORDER BY last_message_at DESC, id DESC"
            ))?;
            let rows = stmt.query_map(params![phone], row_to_session)?;
            let mut sessions = Vec::new();
            for row in rows {
                sessions.push(row?);
            }
            Ok(sessions)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Every non-closed session, most recent message first (staff dashboard).
pub async fn list_all_active(db: &Database) -> Result<Vec<ChatSession>, AutopierError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLUMNS} FROM chat_sessions
                 WHERE status != 'closed'
                 ORDER BY last_message_at DESC, id DESC"
            ))?;
            let rows = stmt.query_map([], row_to_session)?;
            let mut sessions = Vec::new();
            for row in rows {
                sessions.push(row?);
            }
            Ok(sessions)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
