// SPDX-FileCopyrightText: 2026 AutoPier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the gateway over the real router and a temp
//! SQLite database, exercising the polling contract the way a browser
//! client does.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use autopier_chat::{ChatService, TypingPresence};
use autopier_core::VehicleCatalog;
use autopier_gateway::{router, AppState};
use autopier_storage::Database;

async fn test_app() -> (Router, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("gateway.db");
    let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
    let state = AppState {
        chat: ChatService::new(db, Arc::new(VehicleCatalog::builtin())),
        typing: Arc::new(TypingPresence::with_system_clock(5000)),
    };
    (router(state), dir)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = match body {
        Some(body) => Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let (app, _dir) = test_app().await;
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn negotiation_chat_flow_over_http() {
    let (app, _dir) = test_app().await;

    // Customer opens a BUY negotiation.
    let (status, body) = send(
        &app,
        "POST",
        "/v1/negotiations",
        Some(json!({
            "customerName": "Ana Souza",
            "customerPhone": "(11) 99999-8888",
            "message": "Is the T-Cross still available?",
            "carId": "suv-1"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "PENDING");
    let id = body["id"].as_str().unwrap().to_string();

    // The client polls: full list, one message.
    let (status, messages) = send(
        &app,
        "GET",
        &format!("/v1/negotiations/{id}/messages?phone=11999998888"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(messages.as_array().unwrap().len(), 1);
    assert_eq!(messages[0]["sender"], "cliente");
    assert_eq!(messages[0]["negotiationId"], id.as_str());

    // A stranger's phone is refused with 403, not 404.
    let (status, _) = send(
        &app,
        "GET",
        &format!("/v1/negotiations/{id}/messages?phone=69993716918"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Staff replies through the dashboard.
    let (status, reply) = send(
        &app,
        "POST",
        &format!("/v1/dashboard/negotiations/{id}/messages"),
        Some(json!({"content": "Yes! Want to schedule a visit?"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(reply["sender"], "funcionario");

    // The reply moved the negotiation to IN_PROGRESS.
    let (_, detail) = send(&app, "GET", &format!("/v1/negotiations/{id}"), None).await;
    assert_eq!(detail["status"], "IN_PROGRESS");
    assert_eq!(detail["car"]["name"], "Volkswagen T-Cross");
    assert_eq!(detail["messages"].as_array().unwrap().len(), 2);

    // The dashboard chat listing shows the session with zero unread.
    let (_, active) = send(&app, "GET", "/v1/chats/active?all=true", None).await;
    let chats = active["chats"].as_array().unwrap();
    assert_eq!(chats.len(), 1);
    assert_eq!(chats[0]["unreadCount"], 0);
    assert_eq!(chats[0]["status"], "active");
    assert_eq!(chats[0]["referenceId"], id.as_str());
}

#[tokio::test]
async fn checkout_validation_returns_field_errors() {
    let (app, _dir) = test_app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/v1/orders",
        Some(json!({
            "carId": "suv-1",
            "customerName": "Ana",
            "customerRg": "12345",
            "customerPhone": "11999998888",
            "paymentMethod": "PIX",
            "installments": 3,
            "totalPrice": 139900.0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["rg"].is_string());
    assert!(body["errors"]["installments"].is_string());

    // Nothing was created.
    let (_, orders) = send(&app, "GET", "/v1/orders", None).await;
    assert!(orders.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn order_chat_and_detail_flow() {
    let (app, _dir) = test_app().await;

    let (status, created) = send(
        &app,
        "POST",
        "/v1/orders",
        Some(json!({
            "carId": "sedan-1",
            "customerName": "Bruno Lima",
            "customerRg": "65-43-21",
            "customerPhone": "69 99371 6918",
            "paymentMethod": "CARTAO_CREDITO",
            "installments": 12,
            "selectedColor": "Azul",
            "totalPrice": 89900.0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["success"], true);
    let id = created["orderId"].as_str().unwrap().to_string();

    let (_, detail) = send(&app, "GET", &format!("/v1/orders/{id}"), None).await;
    assert_eq!(detail["paymentMethod"], "CREDIT_CARD");
    assert_eq!(detail["customerRg"], "654321");
    assert_eq!(detail["installmentValue"], 89900.0 / 12.0);
    assert_eq!(detail["car"]["name"], "Chevrolet Onix Plus");

    // Customer asks a question in the order chat.
    let (status, _) = send(
        &app,
        "POST",
        &format!("/v1/orders/{id}/messages"),
        Some(json!({"content": "When will it be ready?", "senderName": "Bruno"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // Unread badge shows up for staff, then clears on staff read.
    let (_, active) = send(&app, "GET", "/v1/chats/active?all=true", None).await;
    assert_eq!(active["chats"][0]["unreadCount"], 1);
    assert_eq!(active["chats"][0]["status"], "waiting_response");

    let (status, messages) = send(
        &app,
        "GET",
        &format!("/v1/dashboard/orders/{id}/messages"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(messages.as_array().unwrap().len(), 1);
    assert_eq!(messages[0]["orderId"], id.as_str());

    let (_, active) = send(&app, "GET", "/v1/chats/active?all=true", None).await;
    assert_eq!(active["chats"][0]["unreadCount"], 0);
}

#[tokio::test]
async fn reconnect_flow_finds_existing_chat_by_phone() {
    let (app, _dir) = test_app().await;

    let (_, quick) = send(
        &app,
        "POST",
        "/v1/negotiations/quick",
        Some(json!({"carId": "suv-2", "customerPhone": "11988887777", "customerName": "Carla"})),
    )
    .await;
    let negotiation_id = quick["negotiationId"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        "POST",
        "/v1/chats/active",
        Some(json!({"phone": "(11) 98888-7777"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["found"], true);
    assert_eq!(body["totalChats"], 1);
    assert_eq!(body["chat"]["session"]["referenceId"], negotiation_id.as_str());
    assert_eq!(body["chat"]["messages"].as_array().unwrap().len(), 1);
    assert_eq!(body["chat"]["reference"]["status"], "PENDING");

    // Unknown phone: found false, nothing else.
    let (_, body) = send(
        &app,
        "POST",
        "/v1/chats/active",
        Some(json!({"phone": "00000000"})),
    )
    .await;
    assert_eq!(body, json!({"found": false}));
}

#[tokio::test]
async fn quick_negotiation_reuses_over_http() {
    let (app, _dir) = test_app().await;

    let (status, first) = send(
        &app,
        "POST",
        "/v1/negotiations/quick",
        Some(json!({"carId": "suv-1", "customerPhone": "11999990000"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["isNew"], true);

    let (status, second) = send(
        &app,
        "POST",
        "/v1/negotiations/quick",
        Some(json!({"carId": "suv-1", "customerPhone": "(11) 99999-0000"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["isNew"], false);
    assert_eq!(second["negotiationId"], first["negotiationId"]);
}

#[tokio::test]
async fn typing_round_trip_over_http() {
    let (app, _dir) = test_app().await;

    let (status, body) = send(&app, "GET", "/v1/typing?chatId=neg-1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"typing": false}));

    let (status, _) = send(
        &app,
        "POST",
        "/v1/typing",
        Some(json!({"chatId": "neg-1", "userName": "Ana", "typing": true})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, "GET", "/v1/typing?chatId=neg-1", None).await;
    assert_eq!(body, json!({"typing": true, "userName": "Ana"}));

    let (_, _) = send(
        &app,
        "POST",
        "/v1/typing",
        Some(json!({"chatId": "neg-1", "userName": "Ana", "typing": false})),
    )
    .await;
    let (_, body) = send(&app, "GET", "/v1/typing?chatId=neg-1", None).await;
    assert_eq!(body, json!({"typing": false}));

    // Bad signal: missing userName.
    let (status, body) = send(
        &app,
        "POST",
        "/v1/typing",
        Some(json!({"chatId": "neg-1"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["userName"].is_string());
}

#[tokio::test]
async fn status_updates_validate_and_guard_terminal_states() {
    let (app, _dir) = test_app().await;

    let (_, created) = send(
        &app,
        "POST",
        "/v1/negotiations",
        Some(json!({"customerName": "Ana", "customerPhone": "11999998888"})),
    )
    .await;
    let id = created["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        "PATCH",
        &format!("/v1/negotiations/{id}"),
        Some(json!({"status": "ARCHIVED"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, updated) = send(
        &app,
        "PATCH",
        &format!("/v1/negotiations/{id}"),
        Some(json!({"status": "COMPLETED"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "COMPLETED");

    // Terminal: no way back.
    let (status, _) = send(
        &app,
        "PATCH",
        &format!("/v1/negotiations/{id}"),
        Some(json!({"status": "IN_PROGRESS"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // And the chat left the active listings.
    let (_, active) = send(&app, "GET", "/v1/chats/active?all=true", None).await;
    assert!(active["chats"].as_array().unwrap().is_empty());

    let (status, _) = send(
        &app,
        "PATCH",
        "/v1/negotiations/ghost",
        Some(json!({"status": "COMPLETED"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn client_portal_listings_are_scoped_by_phone() {
    let (app, _dir) = test_app().await;

    send(
        &app,
        "POST",
        "/v1/negotiations",
        Some(json!({"customerName": "Ana", "customerPhone": "11999998888"})),
    )
    .await;

    let (status, body) = send(
        &app,
        "GET",
        "/v1/clients/negotiations?phone=(11)99999-8888",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["unreadCount"], 1);

    let (_, body) = send(&app, "GET", "/v1/clients/negotiations?phone=0000000", None).await;
    assert!(body.as_array().unwrap().is_empty());

    let (status, _) = send(&app, "GET", "/v1/clients/negotiations", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
