// SPDX-FileCopyrightText: 2026 AutoPier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Negotiation CRUD operations.

use autopier_core::{now_rfc3339, AutopierError, NegotiationStatus};
use rusqlite::{params, OptionalExtension};

use crate::database::Database;
use crate::models::{parse_enum, Negotiation};

const NEGOTIATION_COLUMNS: &str = "id, car_id, customer_name, customer_phone, customer_email, \
     kind, status, vehicle_name, vehicle_brand, vehicle_year, vehicle_mileage, \
     vehicle_description, proposed_price, created_at, updated_at";

fn row_to_negotiation(row: &rusqlite::Row<'_>) -> rusqlite::Result<Negotiation> {
    Ok(Negotiation {
        id: row.get(0)?,
        car_id: row.get(1)?,
        customer_name: row.get(2)?,
        customer_phone: row.get(3)?,
        customer_email: row.get(4)?,
        kind: parse_enum(5, row.get(5)?)?,
        status: parse_enum(6, row.get(6)?)?,
        vehicle_name: row.get(7)?,
        vehicle_brand: row.get(8)?,
        vehicle_year: row.get(9)?,
        vehicle_mileage: row.get(10)?,
        vehicle_description: row.get(11)?,
        proposed_price: row.get(12)?,
        created_at: row.get(13)?,
        updated_at: row.get(14)?,
    })
}

/// Insert a new negotiation.
pub async fn insert_negotiation(
    db: &Database,
    negotiation: &Negotiation,
) -> Result<(), AutopierError> {
    let neg = negotiation.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO negotiations (id, car_id, customer_name, customer_phone,
                     customer_email, kind, status, vehicle_name, vehicle_brand, vehicle_year,
                     vehicle_mileage, vehicle_description, proposed_price, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
                params![
                    neg.id,
                    neg.car_id,
                    neg.customer_name,
                    neg.customer_phone,
                    neg.customer_email,
                    neg.kind.to_string(),
                    neg.status.to_string(),
                    neg.vehicle_name,
                    neg.vehicle_brand,
                    neg.vehicle_year,
                    neg.vehicle_mileage,
                    neg.vehicle_description,
                    neg.proposed_price,
                    neg.created_at,
                    neg.updated_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a negotiation by id.
pub async fn get_negotiation(
    db: &Database,
    id: &str,
) -> Result<Option<Negotiation>, AutopierError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {NEGOTIATION_COLUMNS} FROM negotiations WHERE id = ?1"
            ))?;
            let negotiation = stmt.query_row(params![id], row_to_negotiation).optional()?;
            Ok(negotiation)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List all negotiations, newest first.
pub async fn list_negotiations(db: &Database) -> Result<Vec<Negotiation>, AutopierError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {NEGOTIATION_COLUMNS} FROM negotiations
                 ORDER BY created_at DESC, id DESC"
            ))?;
            let rows = stmt.query_map([], row_to_negotiation)?;
            let mut negotiations = Vec::new();
            for row in rows {
                negotiations.push(row?);
            }
            Ok(negotiations)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List a customer's negotiations by normalized phone, most recently
/// updated first.
pub async fn list_negotiations_for_phone(
    db: &Database,
    phone: &str,
) -> Result<Vec<Negotiation>, AutopierError> {
    let phone = phone.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {NEGOTIATION_COLUMNS} FROM negotiations WHERE customer_phone = ?1
                 ORDER BY updated_at DESC, id DESC"
            ))?;
            let rows = stmt.query_map(params![phone], row_to_negotiation)?;
            let mut negotiations = Vec::new();
            for row in rows {
                negotiations.push(row?);
            }
            Ok(negotiations)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Find an open (pending or in-progress) negotiation for a car and customer,
/// used by the quick create-or-reuse flow.
pub async fn find_open_for_car(
    db: &Database,
    car_id: &str,
    phone: &str,
) -> Result<Option<Negotiation>, AutopierError> {
    let car_id = car_id.to_string();
    let phone = phone.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {NEGOTIATION_COLUMNS} FROM negotiations
                 WHERE car_id = ?1 AND customer_phone = ?2
                   AND status IN ('PENDING', 'IN_PROGRESS')
                 ORDER BY updated_at DESC LIMIT 1"
            ))?;
            let negotiation = stmt
                .query_row(params![car_id, phone], row_to_negotiation)
                .optional()?;
            Ok(negotiation)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Update a negotiation's status, returning the updated record, or `None`
/// if the negotiation does not exist.
pub async fn update_negotiation_status(
    db: &Database,
    id: &str,
    status: NegotiationStatus,
) -> Result<Option<Negotiation>, AutopierError> {
    let id = id.to_string();
    let now = now_rfc3339();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE negotiations SET status = ?1, updated_at = ?2 WHERE id = ?3",
                params![status.to_string(), now, id],
            )?;
            let mut stmt = conn.prepare(&format!(
                "SELECT {NEGOTIATION_COLUMNS} FROM negotiations WHERE id = ?1"
            ))?;
            let negotiation = stmt.query_row(params![id], row_to_negotiation).optional()?;
            Ok(negotiation)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Move a PENDING negotiation to IN_PROGRESS in one guarded statement.
///
/// Returns `true` if the transition happened, `false` if the negotiation
/// was absent or already past PENDING. Used for the first-reply
/// auto-transition, where a concurrent reply must not clobber a later
/// status.
pub async fn begin_progress_if_pending(db: &Database, id: &str) -> Result<bool, AutopierError> {
    let id = id.to_string();
    let now = now_rfc3339();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE negotiations SET status = 'IN_PROGRESS', updated_at = ?2
                 WHERE id = ?1 AND status = 'PENDING'",
                params![id, now],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
