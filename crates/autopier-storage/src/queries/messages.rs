// SPDX-FileCopyrightText: 2026 AutoPier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message ledger operations: append and read, nothing else.
//!
//! Messages are never updated or deleted. Reads return the full
//! conversation ordered by creation time (pollers diff on length), with the
//! id as a tiebreaker so same-millisecond writes keep a stable order.

use autopier_core::{AutopierError, ConversationRef};
use rusqlite::params;

use crate::database::Database;
use crate::models::{parse_enum, Message};

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    let kind: autopier_core::ConversationKind = parse_enum(1, row.get(1)?)?;
    let reference_id: String = row.get(2)?;
    Ok(Message {
        id: row.get(0)?,
        conversation: ConversationRef::new(kind, reference_id),
        content: row.get(3)?,
        sender: parse_enum(4, row.get(4)?)?,
        sender_name: row.get(5)?,
        created_at: row.get(6)?,
    })
}

/// Append a message to the ledger.
pub async fn insert_message(db: &Database, message: &Message) -> Result<(), AutopierError> {
    let msg = message.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO messages (id, conversation_type, reference_id, content, sender,
                     sender_name, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    msg.id,
                    msg.conversation.kind().to_string(),
                    msg.conversation.reference_id(),
                    msg.content,
                    msg.sender.to_string(),
                    msg.sender_name,
                    msg.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// All messages of a conversation, ascending by creation time.
pub async fn list_for_conversation(
    db: &Database,
    conversation: &ConversationRef,
) -> Result<Vec<Message>, AutopierError> {
    let kind = conversation.kind().to_string();
    let reference_id = conversation.reference_id().to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, conversation_type, reference_id, content, sender, sender_name,
                        created_at
                 FROM messages WHERE conversation_type = ?1 AND reference_id = ?2
                 ORDER BY created_at ASC, id ASC",
            )?;
            let rows = stmt.query_map(params![kind, reference_id], row_to_message)?;
            let mut messages = Vec::new();
            for row in rows {
                messages.push(row?);
            }
            Ok(messages)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
