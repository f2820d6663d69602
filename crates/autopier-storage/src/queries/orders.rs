// SPDX-FileCopyrightText: 2026 AutoPier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Order CRUD operations.

use autopier_core::{now_rfc3339, AutopierError, OrderStatus};
use rusqlite::{params, OptionalExtension};

use crate::database::Database;
use crate::models::{parse_enum, Order};

const ORDER_COLUMNS: &str = "id, car_id, customer_name, customer_rg, customer_phone, \
     payment_method, installments, selected_color, total_price, status, created_at, updated_at";

fn row_to_order(row: &rusqlite::Row<'_>) -> rusqlite::Result<Order> {
    Ok(Order {
        id: row.get(0)?,
        car_id: row.get(1)?,
        customer_name: row.get(2)?,
        customer_rg: row.get(3)?,
        customer_phone: row.get(4)?,
        payment_method: parse_enum(5, row.get(5)?)?,
        installments: row.get(6)?,
        selected_color: row.get(7)?,
        total_price: row.get(8)?,
        status: parse_enum(9, row.get(9)?)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

/// Insert a new order.
pub async fn insert_order(db: &Database, order: &Order) -> Result<(), AutopierError> {
    let order = order.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO orders (id, car_id, customer_name, customer_rg, customer_phone,
                     payment_method, installments, selected_color, total_price, status,
                     created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    order.id,
                    order.car_id,
                    order.customer_name,
                    order.customer_rg,
                    order.customer_phone,
                    order.payment_method.to_string(),
                    order.installments,
                    order.selected_color,
                    order.total_price,
                    order.status.to_string(),
                    order.created_at,
                    order.updated_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get an order by id.
pub async fn get_order(db: &Database, id: &str) -> Result<Option<Order>, AutopierError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn
                .prepare(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"))?;
            let order = stmt.query_row(params![id], row_to_order).optional()?;
            Ok(order)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List all orders, newest first.
pub async fn list_orders(db: &Database) -> Result<Vec<Order>, AutopierError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, id DESC"
            ))?;
            let rows = stmt.query_map([], row_to_order)?;
            let mut orders = Vec::new();
            for row in rows {
                orders.push(row?);
            }
            Ok(orders)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List a customer's orders by normalized phone, most recently updated first.
pub async fn list_orders_for_phone(
    db: &Database,
    phone: &str,
) -> Result<Vec<Order>, AutopierError> {
    let phone = phone.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ORDER_COLUMNS} FROM orders WHERE customer_phone = ?1
                 ORDER BY updated_at DESC, id DESC"
            ))?;
            let rows = stmt.query_map(params![phone], row_to_order)?;
            let mut orders = Vec::new();
            for row in rows {
                orders.push(row?);
            }
            Ok(orders)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Update an order's status, returning the updated record, or `None` if the
/// order does not exist.
pub async fn update_order_status(
    db: &Database,
    id: &str,
    status: OrderStatus,
) -> Result<Option<Order>, AutopierError> {
    let id = id.to_string();
    let now = now_rfc3339();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE orders SET status = ?1, updated_at = ?2 WHERE id = ?3",
                params![status.to_string(), now, id],
            )?;
            let mut stmt = conn
                .prepare(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"))?;
            let order = stmt.query_row(params![id], row_to_order).optional()?;
            Ok(order)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
