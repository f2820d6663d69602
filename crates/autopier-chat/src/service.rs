// SPDX-FileCopyrightText: 2026 AutoPier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The chat/negotiation lifecycle manager.
//!
//! `ChatService` orchestrates the message ledger, the negotiation/order
//! records and the derived chat-session index so their invariants hold at
//! every boundary operation: sessions are created idempotently before any
//! message event, the unread counter and status flips fold into the index
//! atomically, and the first reply moves a PENDING negotiation to
//! IN_PROGRESS exactly once.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use autopier_core::{
    new_id, normalize_phone, now_rfc3339, phones_match, AutopierError, ConversationKind,
    ConversationRef, NegotiationKind, NegotiationStatus, OrderStatus, SenderClass, SessionStatus,
    ValidationErrors, Vehicle, VehicleCatalog,
};
use autopier_storage::queries::{chat_sessions, messages, negotiations, orders};
use autopier_storage::{ChatSession, Database, Message, Negotiation, Order};

use crate::validation::{validate_negotiation, validate_order};

/// Display name used for staff messages without an explicit sender name.
pub const STAFF_NAME: &str = "AutoPier";

/// Catalog reference for negotiations not tied to a catalog vehicle.
const GENERIC_CAR: &str = "generic";

/// Input for creating a negotiation.
#[derive(Debug, Clone, Default)]
pub struct NewNegotiation {
    pub kind: Option<NegotiationKind>,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: String,
    pub car_id: Option<String>,
    /// Free-form opening message (BUY).
    pub message: Option<String>,
    /// What the customer is looking for (BUY).
    pub vehicle_interest: Option<String>,
    // Vehicle being offered (SELL).
    pub vehicle_name: Option<String>,
    pub vehicle_brand: Option<String>,
    pub vehicle_year: Option<i64>,
    pub vehicle_mileage: Option<i64>,
    pub vehicle_description: Option<String>,
    pub proposed_price: Option<f64>,
}

impl NewNegotiation {
    /// A BUY negotiation with only the routing fields set.
    pub fn buy(
        car_id: Option<String>,
        message: Option<String>,
        vehicle_interest: Option<String>,
    ) -> Self {
        Self {
            kind: Some(NegotiationKind::Buy),
            car_id,
            message,
            vehicle_interest,
            ..Self::default()
        }
    }
}

/// Input for creating an order at checkout.
///
/// Payment method and installments arrive raw and are validated into a
/// field-keyed error map, not rejected at deserialization.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub car_id: String,
    pub customer_name: String,
    pub customer_rg: String,
    pub customer_phone: String,
    pub payment_method: String,
    pub installments: Option<i64>,
    pub selected_color: Option<String>,
    pub total_price: f64,
}

/// Result of the quick create-or-reuse negotiation flow.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickNegotiation {
    pub negotiation_id: String,
    /// The chat id clients poll; equals the negotiation id.
    pub chat_id: String,
    pub is_new: bool,
}

/// The record a chat session points at.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ConversationRecord {
    Negotiation(Negotiation),
    Order(Order),
}

/// Reconnect lookup input: a specific conversation, or the most recent
/// chat for a returning customer's phone.
#[derive(Debug, Clone)]
pub enum ReconnectQuery {
    Negotiation(String),
    Order(String),
    Phone(String),
}

/// A reconnectable chat: the session, its full message history and the
/// record it hangs off. `sibling_chats` is populated for phone lookups so
/// returning customers can switch between their open conversations.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconnectResult {
    pub session: ChatSession,
    pub messages: Vec<Message>,
    pub reference: ConversationRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sibling_chats: Option<Vec<ChatSession>>,
}

/// Client-portal negotiation summary.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientNegotiationSummary {
    pub id: String,
    pub car_id: String,
    pub car_name: String,
    pub car_brand: String,
    pub car_image: String,
    pub status: NegotiationStatus,
    pub created_at: String,
    pub updated_at: String,
    pub last_message: String,
    pub last_message_at: String,
    pub unread_count: i64,
}

/// Client-portal order summary.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientOrderSummary {
    pub id: String,
    pub car_id: String,
    pub car_name: String,
    pub car_brand: String,
    pub car_image: String,
    pub status: OrderStatus,
    pub total_price: f64,
    pub selected_color: String,
    pub payment_method: autopier_core::PaymentMethod,
    pub created_at: String,
    pub updated_at: String,
    pub last_message: String,
    pub last_message_at: String,
    pub unread_count: i64,
}

/// Staff-dashboard negotiation overview row.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NegotiationOverview {
    pub id: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: String,
    pub vehicle: Vehicle,
    #[serde(rename = "type")]
    pub kind: NegotiationKind,
    pub status: NegotiationStatus,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message: Option<String>,
    pub unread_count: i64,
}

/// Staff-dashboard order overview row: the order plus its catalog vehicle.
#[derive(Debug, Clone, Serialize)]
pub struct OrderOverview {
    #[serde(flatten)]
    pub order: Order,
    pub car: Vehicle,
}

/// Domain service for the chat/negotiation subsystem.
#[derive(Clone)]
pub struct ChatService {
    db: Database,
    catalog: Arc<VehicleCatalog>,
    preview_length: usize,
}

impl ChatService {
    pub fn new(db: Database, catalog: Arc<VehicleCatalog>) -> Self {
        Self {
            db,
            catalog,
            preview_length: 100,
        }
    }

    /// Override the preview truncation length (configured in `[chat]`).
    pub fn with_preview_length(mut self, preview_length: usize) -> Self {
        self.preview_length = preview_length.max(1);
        self
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn catalog(&self) -> &VehicleCatalog {
        &self.catalog
    }

    // --- Negotiations ---

    /// Create a negotiation with its opening customer message and chat
    /// session. The negotiation starts PENDING; the session starts
    /// `waiting_response` with one unread message.
    pub async fn create_negotiation(
        &self,
        input: NewNegotiation,
    ) -> Result<Negotiation, AutopierError> {
        let identity = validate_negotiation(&input).map_err(AutopierError::Validation)?;
        let kind = input.kind.unwrap_or(NegotiationKind::Buy);
        let is_sell = kind == NegotiationKind::Sell;
        let car_id = input
            .car_id
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(GENERIC_CAR)
            .to_string();

        let now = now_rfc3339();
        let negotiation = Negotiation {
            id: new_id("neg"),
            car_id: car_id.clone(),
            customer_name: identity.customer_name.clone(),
            customer_phone: identity.customer_phone.clone(),
            customer_email: input.customer_email.trim().to_string(),
            kind,
            status: NegotiationStatus::Pending,
            vehicle_name: input.vehicle_name.clone().filter(|_| is_sell),
            vehicle_brand: input.vehicle_brand.clone().filter(|_| is_sell),
            vehicle_year: input.vehicle_year.filter(|_| is_sell),
            vehicle_mileage: input.vehicle_mileage.filter(|_| is_sell),
            vehicle_description: input.vehicle_description.clone().filter(|_| is_sell),
            proposed_price: input.proposed_price.filter(|_| is_sell),
            created_at: now.clone(),
            updated_at: now,
        };
        negotiations::insert_negotiation(&self.db, &negotiation).await?;

        let message = Message {
            id: new_id("msg"),
            conversation: ConversationRef::Negotiation(negotiation.id.clone()),
            content: opening_message(&input, kind),
            sender: SenderClass::Customer,
            sender_name: identity.customer_name.clone(),
            created_at: now_rfc3339(),
        };
        messages::insert_message(&self.db, &message).await?;

        let (vehicle_name, vehicle_price) = if is_sell {
            (
                sell_vehicle_label(&negotiation),
                negotiation.proposed_price.unwrap_or(0.0),
            )
        } else {
            let car = self.catalog.lookup(&car_id);
            (car.name, car.price)
        };
        self.ensure_session(
            ConversationKind::Negotiation,
            &negotiation.id,
            &identity.customer_name,
            &identity.customer_phone,
            vehicle_name,
            vehicle_price,
            SessionStatus::WaitingResponse,
        )
        .await?;
        self.fold_into_session(&message, true).await?;

        info!(negotiation_id = %negotiation.id, kind = %kind, "negotiation created");
        Ok(negotiation)
    }

    /// Create-or-reuse a negotiation for a catalog vehicle and phone.
    ///
    /// An open negotiation (PENDING or IN_PROGRESS) for the same pair is
    /// reused; otherwise a fresh one is created with a default interest
    /// message.
    pub async fn quick_negotiation(
        &self,
        car_id: &str,
        customer_phone: &str,
        customer_name: Option<&str>,
    ) -> Result<QuickNegotiation, AutopierError> {
        let mut errors = ValidationErrors::new();
        if car_id.trim().is_empty() {
            errors.push("carId", "Vehicle is required");
        }
        let phone = normalize_phone(customer_phone);
        if phone.len() < 6 {
            errors.push("phone", "Phone number must have at least 6 digits");
        }
        errors.into_result()?;

        if let Some(existing) = negotiations::find_open_for_car(&self.db, car_id, &phone).await? {
            debug!(negotiation_id = %existing.id, "reusing open negotiation");
            return Ok(QuickNegotiation {
                chat_id: existing.id.clone(),
                negotiation_id: existing.id,
                is_new: false,
            });
        }

        let car = self.catalog.lookup(car_id);
        let name = customer_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or("Customer");
        let input = NewNegotiation {
            customer_name: name.to_string(),
            customer_phone: phone,
            message: Some(format!(
                "Hello! I'm interested in negotiating the vehicle {}.",
                car.name
            )),
            ..NewNegotiation::buy(Some(car_id.to_string()), None, None)
        };
        let negotiation = self.create_negotiation(input).await?;
        Ok(QuickNegotiation {
            chat_id: negotiation.id.clone(),
            negotiation_id: negotiation.id,
            is_new: true,
        })
    }

    pub async fn get_negotiation(&self, id: &str) -> Result<Option<Negotiation>, AutopierError> {
        negotiations::get_negotiation(&self.db, id).await
    }

    /// Update a negotiation's status. Terminal statuses are sticky: once
    /// COMPLETED or CANCELLED the record can no longer change, and its
    /// chat session closes.
    pub async fn update_negotiation_status(
        &self,
        id: &str,
        status: NegotiationStatus,
    ) -> Result<Negotiation, AutopierError> {
        let current = negotiations::get_negotiation(&self.db, id)
            .await?
            .ok_or_else(|| AutopierError::not_found("negotiation", id))?;
        if current.status == status {
            return Ok(current);
        }
        if current.status.is_terminal() {
            let mut errors = ValidationErrors::new();
            errors.push(
                "status",
                format!("negotiation is {} and can no longer change", current.status),
            );
            return Err(AutopierError::Validation(errors));
        }

        let updated = negotiations::update_negotiation_status(&self.db, id, status)
            .await?
            .ok_or_else(|| AutopierError::not_found("negotiation", id))?;
        if status.is_terminal() {
            chat_sessions::set_status(
                &self.db,
                ConversationKind::Negotiation,
                id,
                SessionStatus::Closed,
            )
            .await?;
        }
        info!(negotiation_id = %id, status = %status, "negotiation status updated");
        Ok(updated)
    }

    /// Staff-dashboard negotiation overviews, newest first.
    pub async fn negotiation_overviews(&self) -> Result<Vec<NegotiationOverview>, AutopierError> {
        let all = negotiations::list_negotiations(&self.db).await?;
        let mut overviews = Vec::with_capacity(all.len());
        for negotiation in all {
            let session = chat_sessions::get_by_reference(
                &self.db,
                ConversationKind::Negotiation,
                &negotiation.id,
            )
            .await?;
            let vehicle = self.vehicle_for_negotiation(&negotiation);
            overviews.push(NegotiationOverview {
                id: negotiation.id,
                customer_name: negotiation.customer_name,
                customer_phone: negotiation.customer_phone,
                customer_email: negotiation.customer_email,
                vehicle,
                kind: negotiation.kind,
                status: negotiation.status,
                created_at: negotiation.created_at,
                updated_at: negotiation.updated_at,
                last_message: session
                    .as_ref()
                    .map(|s| s.last_message_preview.clone())
                    .filter(|p| !p.is_empty()),
                unread_count: session.map(|s| s.unread_count).unwrap_or(0),
            });
        }
        Ok(overviews)
    }

    // --- Orders ---

    /// Validate and create an order, with its chat session ready for
    /// later questions about the purchase. Orders start without messages.
    pub async fn create_order(&self, input: NewOrder) -> Result<Order, AutopierError> {
        let validated = validate_order(&input).map_err(AutopierError::Validation)?;
        let now = now_rfc3339();
        let order = Order {
            id: new_id("ord"),
            car_id: input.car_id.clone(),
            customer_name: validated.customer_name,
            customer_rg: validated.customer_rg,
            customer_phone: validated.customer_phone,
            payment_method: validated.payment_method,
            installments: validated.installments,
            selected_color: validated.selected_color,
            total_price: input.total_price,
            status: OrderStatus::Pending,
            created_at: now.clone(),
            updated_at: now,
        };
        orders::insert_order(&self.db, &order).await?;

        let car = self.catalog.lookup(&order.car_id);
        self.ensure_session(
            ConversationKind::Order,
            &order.id,
            &order.customer_name,
            &order.customer_phone,
            car.name,
            order.total_price,
            SessionStatus::Active,
        )
        .await?;

        info!(order_id = %order.id, "order created");
        Ok(order)
    }

    pub async fn get_order(&self, id: &str) -> Result<Option<Order>, AutopierError> {
        orders::get_order(&self.db, id).await
    }

    /// Update an order's status with the same terminal guard as
    /// negotiations.
    pub async fn update_order_status(
        &self,
        id: &str,
        status: OrderStatus,
    ) -> Result<Order, AutopierError> {
        let current = orders::get_order(&self.db, id)
            .await?
            .ok_or_else(|| AutopierError::not_found("order", id))?;
        if current.status == status {
            return Ok(current);
        }
        if current.status.is_terminal() {
            let mut errors = ValidationErrors::new();
            errors.push(
                "status",
                format!("order is {} and can no longer change", current.status),
            );
            return Err(AutopierError::Validation(errors));
        }

        let updated = orders::update_order_status(&self.db, id, status)
            .await?
            .ok_or_else(|| AutopierError::not_found("order", id))?;
        if status.is_terminal() {
            chat_sessions::set_status(&self.db, ConversationKind::Order, id, SessionStatus::Closed)
                .await?;
        }
        info!(order_id = %id, status = %status, "order status updated");
        Ok(updated)
    }

    /// Staff-dashboard order overviews, newest first.
    pub async fn order_overviews(&self) -> Result<Vec<OrderOverview>, AutopierError> {
        let all = orders::list_orders(&self.db).await?;
        Ok(all
            .into_iter()
            .map(|order| {
                let car = self.catalog.lookup(&order.car_id);
                OrderOverview { order, car }
            })
            .collect())
    }

    // --- Messages ---

    /// Append a message to a conversation and fold it into the session
    /// index. The first reply into a PENDING negotiation (from either
    /// side) moves it to IN_PROGRESS.
    pub async fn send_message(
        &self,
        conversation: &ConversationRef,
        content: &str,
        sender: SenderClass,
        sender_name: Option<&str>,
    ) -> Result<Message, AutopierError> {
        let content = content.trim();
        if content.is_empty() {
            let mut errors = ValidationErrors::new();
            errors.push("content", "Message must not be empty");
            return Err(AutopierError::Validation(errors));
        }

        let customer_name = self.owner_of(conversation).await?.1;
        let sender_name = sender_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| match sender {
                SenderClass::Staff => STAFF_NAME.to_string(),
                SenderClass::Customer => customer_name,
            });

        let message = Message {
            id: new_id("msg"),
            conversation: conversation.clone(),
            content: content.to_string(),
            sender,
            sender_name,
            created_at: now_rfc3339(),
        };
        messages::insert_message(&self.db, &message).await?;

        if let ConversationRef::Negotiation(id) = conversation {
            if negotiations::begin_progress_if_pending(&self.db, id).await? {
                info!(negotiation_id = %id, "negotiation moved to IN_PROGRESS on first reply");
            }
        }

        self.fold_into_session(&message, sender.is_customer()).await?;
        Ok(message)
    }

    /// Full message list for polling clients, with the phone-ownership
    /// check when a phone is supplied. Ownership mismatch is `Forbidden`,
    /// distinct from `NotFound`.
    pub async fn messages_for(
        &self,
        conversation: &ConversationRef,
        requester_phone: Option<&str>,
    ) -> Result<Vec<Message>, AutopierError> {
        let (owner_phone, _) = self.owner_of(conversation).await?;
        if let Some(phone) = requester_phone {
            if !phones_match(phone, &owner_phone) {
                return Err(AutopierError::Forbidden(
                    "this conversation belongs to another customer".to_string(),
                ));
            }
        }
        messages::list_for_conversation(&self.db, conversation).await
    }

    /// Message list for the staff dashboard. Staff viewing a conversation
    /// implies it has been read, so the unread counter resets.
    pub async fn staff_messages(
        &self,
        conversation: &ConversationRef,
    ) -> Result<Vec<Message>, AutopierError> {
        self.owner_of(conversation).await?;
        self.mark_read(conversation).await?;
        messages::list_for_conversation(&self.db, conversation).await
    }

    // --- Chat sessions ---

    /// Zero the unread counter and mark the session active. Soft: absent
    /// sessions are a logged no-op, never an error.
    pub async fn mark_read(&self, conversation: &ConversationRef) -> Result<(), AutopierError> {
        let updated = chat_sessions::mark_read(
            &self.db,
            conversation.kind(),
            conversation.reference_id(),
        )
        .await?;
        if !updated {
            debug!(%conversation, "mark_read on absent session");
        }
        Ok(())
    }

    pub async fn session_for(
        &self,
        conversation: &ConversationRef,
    ) -> Result<Option<ChatSession>, AutopierError> {
        chat_sessions::get_by_reference(&self.db, conversation.kind(), conversation.reference_id())
            .await
    }

    /// A customer's non-closed sessions, most recent message first.
    pub async fn active_chats_for_phone(
        &self,
        phone: &str,
    ) -> Result<Vec<ChatSession>, AutopierError> {
        chat_sessions::list_active_for_phone(&self.db, &normalize_phone(phone)).await
    }

    /// Every non-closed session, for the staff dashboard.
    pub async fn all_active_chats(&self) -> Result<Vec<ChatSession>, AutopierError> {
        chat_sessions::list_all_active(&self.db).await
    }

    /// Session-reconnect lookup for returning customers.
    pub async fn reconnect(
        &self,
        query: ReconnectQuery,
    ) -> Result<Option<ReconnectResult>, AutopierError> {
        let (session, siblings) = match &query {
            ReconnectQuery::Negotiation(id) => (
                chat_sessions::get_by_reference(&self.db, ConversationKind::Negotiation, id)
                    .await?,
                None,
            ),
            ReconnectQuery::Order(id) => (
                chat_sessions::get_by_reference(&self.db, ConversationKind::Order, id).await?,
                None,
            ),
            ReconnectQuery::Phone(phone) => {
                let chats = self.active_chats_for_phone(phone).await?;
                (chats.first().cloned(), Some(chats))
            }
        };
        let Some(session) = session else {
            return Ok(None);
        };

        let conversation = session.conversation();
        let reference = match &conversation {
            ConversationRef::Negotiation(id) => negotiations::get_negotiation(&self.db, id)
                .await?
                .map(ConversationRecord::Negotiation),
            ConversationRef::Order(id) => orders::get_order(&self.db, id)
                .await?
                .map(ConversationRecord::Order),
        };
        let Some(reference) = reference else {
            // A session without its record means the store is inconsistent;
            // treat it as not reconnectable rather than failing the poll.
            warn!(session_id = %session.id, "chat session references a missing record");
            return Ok(None);
        };

        let messages = messages::list_for_conversation(&self.db, &conversation).await?;
        Ok(Some(ReconnectResult {
            session,
            messages,
            reference,
            sibling_chats: siblings,
        }))
    }

    // --- Client portal ---

    /// Per-customer negotiation summaries with chat badges.
    pub async fn client_negotiations(
        &self,
        phone: &str,
    ) -> Result<Vec<ClientNegotiationSummary>, AutopierError> {
        let phone = normalize_phone(phone);
        let negs = negotiations::list_negotiations_for_phone(&self.db, &phone).await?;
        let mut summaries = Vec::with_capacity(negs.len());
        for negotiation in negs {
            let session = chat_sessions::get_by_reference(
                &self.db,
                ConversationKind::Negotiation,
                &negotiation.id,
            )
            .await?;
            let car = self.vehicle_for_negotiation(&negotiation);
            summaries.push(ClientNegotiationSummary {
                id: negotiation.id,
                car_id: negotiation.car_id,
                car_name: car.name,
                car_brand: car.brand,
                car_image: car.image_url,
                status: negotiation.status,
                created_at: negotiation.created_at,
                last_message: session
                    .as_ref()
                    .map(|s| s.last_message_preview.clone())
                    .unwrap_or_default(),
                last_message_at: session
                    .as_ref()
                    .map(|s| s.last_message_at.clone())
                    .unwrap_or_else(|| negotiation.updated_at.clone()),
                unread_count: session.map(|s| s.unread_count).unwrap_or(0),
                updated_at: negotiation.updated_at,
            });
        }
        Ok(summaries)
    }

    /// Per-customer order summaries with chat badges.
    pub async fn client_orders(
        &self,
        phone: &str,
    ) -> Result<Vec<ClientOrderSummary>, AutopierError> {
        let phone = normalize_phone(phone);
        let all = orders::list_orders_for_phone(&self.db, &phone).await?;
        let mut summaries = Vec::with_capacity(all.len());
        for order in all {
            let session =
                chat_sessions::get_by_reference(&self.db, ConversationKind::Order, &order.id)
                    .await?;
            let car = self.catalog.lookup(&order.car_id);
            summaries.push(ClientOrderSummary {
                id: order.id,
                car_id: order.car_id,
                car_name: car.name,
                car_brand: car.brand,
                car_image: car.image_url,
                status: order.status,
                total_price: order.total_price,
                selected_color: order.selected_color,
                payment_method: order.payment_method,
                created_at: order.created_at,
                last_message: session
                    .as_ref()
                    .map(|s| s.last_message_preview.clone())
                    .unwrap_or_default(),
                last_message_at: session
                    .as_ref()
                    .map(|s| s.last_message_at.clone())
                    .unwrap_or_else(|| order.updated_at.clone()),
                unread_count: session.map(|s| s.unread_count).unwrap_or(0),
                updated_at: order.updated_at,
            });
        }
        Ok(summaries)
    }

    // --- Internals ---

    /// The phone and display name owning a conversation, or `NotFound`.
    async fn owner_of(
        &self,
        conversation: &ConversationRef,
    ) -> Result<(String, String), AutopierError> {
        match conversation {
            ConversationRef::Negotiation(id) => {
                let negotiation = negotiations::get_negotiation(&self.db, id)
                    .await?
                    .ok_or_else(|| AutopierError::not_found("negotiation", id.clone()))?;
                Ok((negotiation.customer_phone, negotiation.customer_name))
            }
            ConversationRef::Order(id) => {
                let order = orders::get_order(&self.db, id)
                    .await?
                    .ok_or_else(|| AutopierError::not_found("order", id.clone()))?;
                Ok((order.customer_phone, order.customer_name))
            }
        }
    }

    /// Create the chat session for a conversation, idempotently.
    #[allow(clippy::too_many_arguments)]
    async fn ensure_session(
        &self,
        conversation_type: ConversationKind,
        reference_id: &str,
        client_name: &str,
        client_phone: &str,
        vehicle_name: String,
        vehicle_price: f64,
        status: SessionStatus,
    ) -> Result<ChatSession, AutopierError> {
        let now = now_rfc3339();
        let session = ChatSession {
            id: new_id("chat"),
            conversation_type,
            reference_id: reference_id.to_string(),
            client_id: format!("client-{client_phone}"),
            client_name: client_name.to_string(),
            client_phone: client_phone.to_string(),
            vehicle_name,
            vehicle_price,
            status,
            last_message_at: now.clone(),
            last_message_preview: String::new(),
            unread_count: 0,
            created_at: now.clone(),
            updated_at: now,
        };
        chat_sessions::create_session(&self.db, &session).await
    }

    /// Fold a ledger append into the session summary: last-message fields,
    /// status flip and unread accounting, all in one guarded update.
    async fn fold_into_session(
        &self,
        message: &Message,
        from_client: bool,
    ) -> Result<(), AutopierError> {
        let preview: String = message.content.chars().take(self.preview_length).collect();
        let updated = chat_sessions::record_message(
            &self.db,
            message.conversation.kind(),
            message.conversation.reference_id(),
            &message.created_at,
            &preview,
            from_client,
        )
        .await?;
        if !updated {
            warn!(conversation = %message.conversation, "message recorded without a chat session");
        }
        Ok(())
    }

    /// The vehicle shown for a negotiation: the catalog entry, or a
    /// synthesized snapshot for SELL offers that have no catalog vehicle.
    pub fn vehicle_for_negotiation(&self, negotiation: &Negotiation) -> Vehicle {
        if negotiation.kind == NegotiationKind::Sell && negotiation.vehicle_name.is_some() {
            return Vehicle {
                id: negotiation.car_id.clone(),
                name: sell_vehicle_label(negotiation),
                brand: negotiation.vehicle_brand.clone().unwrap_or_default(),
                year: negotiation.vehicle_year.unwrap_or(0) as i32,
                price: negotiation.proposed_price.unwrap_or(0.0),
                image_url: String::new(),
            };
        }
        self.catalog.lookup(&negotiation.car_id)
    }
}

/// `"{brand} {name}"` for a SELL negotiation's offered vehicle.
fn sell_vehicle_label(negotiation: &Negotiation) -> String {
    match (&negotiation.vehicle_brand, &negotiation.vehicle_name) {
        (Some(brand), Some(name)) => format!("{brand} {name}"),
        (None, Some(name)) => name.clone(),
        (Some(brand), None) => brand.clone(),
        (None, None) => "Customer vehicle".to_string(),
    }
}

/// Compose the customer's opening message from the form fields.
fn opening_message(input: &NewNegotiation, kind: NegotiationKind) -> String {
    match kind {
        NegotiationKind::Sell => {
            let mut vehicle_parts = Vec::new();
            for part in [
                input.vehicle_brand.as_deref(),
                input.vehicle_name.as_deref(),
            ]
            .into_iter()
            .flatten()
            {
                let part = part.trim();
                if !part.is_empty() {
                    vehicle_parts.push(part.to_string());
                }
            }
            if let Some(year) = input.vehicle_year {
                vehicle_parts.push(year.to_string());
            }
            let vehicle = if vehicle_parts.is_empty() {
                "my vehicle".to_string()
            } else {
                vehicle_parts.join(" ")
            };

            let mut text = format!("Hello! I'd like to sell my vehicle: {vehicle}.");
            if let Some(km) = input.vehicle_mileage {
                text.push_str(&format!(" Mileage: {km} km."));
            }
            match input.proposed_price {
                Some(price) => text.push_str(&format!(" Asking price: {price:.0}.")),
                None => text.push_str(" Asking price: to be arranged."),
            }
            if let Some(description) = input.vehicle_description.as_deref() {
                let description = description.trim();
                if !description.is_empty() {
                    text.push(' ');
                    text.push_str(description);
                }
            }
            text
        }
        NegotiationKind::Buy => {
            if let Some(message) = input.message.as_deref() {
                let message = message.trim();
                if !message.is_empty() {
                    return message.to_string();
                }
            }
            match input.vehicle_interest.as_deref().map(str::trim) {
                Some(interest) if !interest.is_empty() => {
                    format!("Hello! I'm interested in negotiating. {interest}")
                }
                _ => "Hello! I'm interested in negotiating.".to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    async fn service() -> (ChatService, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("service.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        let service = ChatService::new(db, Arc::new(VehicleCatalog::builtin()));
        (service, dir)
    }

    fn buy_input(phone: &str) -> NewNegotiation {
        NewNegotiation {
            customer_name: "Ana Souza".to_string(),
            customer_phone: phone.to_string(),
            ..NewNegotiation::buy(None, None, None)
        }
    }

    #[tokio::test]
    async fn creating_a_negotiation_seeds_message_and_session() {
        let (service, _dir) = service().await;

        let negotiation = service
            .create_negotiation(buy_input("11999998888"))
            .await
            .unwrap();
        assert_eq!(negotiation.status, NegotiationStatus::Pending);
        assert_eq!(negotiation.car_id, "generic");
        assert_eq!(negotiation.customer_phone, "11999998888");

        let conversation = ConversationRef::Negotiation(negotiation.id.clone());
        let messages = service.messages_for(&conversation, None).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].sender, SenderClass::Customer);

        let session = service.session_for(&conversation).await.unwrap().unwrap();
        assert_eq!(session.status, SessionStatus::WaitingResponse);
        assert_eq!(session.unread_count, 1);
        assert_eq!(session.last_message_preview, messages[0].content);
    }

    #[tokio::test]
    async fn staff_reply_moves_pending_to_in_progress_and_clears_unread() {
        let (service, _dir) = service().await;
        let negotiation = service
            .create_negotiation(buy_input("11999998888"))
            .await
            .unwrap();
        let conversation = ConversationRef::Negotiation(negotiation.id.clone());

        service
            .send_message(&conversation, "We can offer a discount.", SenderClass::Staff, None)
            .await
            .unwrap();

        let negotiation = service
            .get_negotiation(&negotiation.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(negotiation.status, NegotiationStatus::InProgress);

        let session = service.session_for(&conversation).await.unwrap().unwrap();
        assert_eq!(session.status, SessionStatus::Active);
        assert_eq!(session.unread_count, 0);

        let messages = service.messages_for(&conversation, None).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].sender_name, STAFF_NAME);
    }

    #[tokio::test]
    async fn back_to_back_client_messages_accumulate_unread_and_preview() {
        let (service, _dir) = service().await;
        let negotiation = service
            .create_negotiation(buy_input("11999998888"))
            .await
            .unwrap();
        let conversation = ConversationRef::Negotiation(negotiation.id.clone());

        let long_tail = "x".repeat(150);
        service
            .send_message(&conversation, "Is it available?", SenderClass::Customer, None)
            .await
            .unwrap();
        service
            .send_message(&conversation, &long_tail, SenderClass::Customer, None)
            .await
            .unwrap();

        let session = service.session_for(&conversation).await.unwrap().unwrap();
        // Opening message + two follow-ups, no staff reply in between.
        assert_eq!(session.unread_count, 3);
        assert_eq!(session.status, SessionStatus::WaitingResponse);
        assert_eq!(session.last_message_preview.chars().count(), 100);
        assert!(long_tail.starts_with(&session.last_message_preview));
    }

    #[tokio::test]
    async fn mark_read_resets_independently_of_messages() {
        let (service, _dir) = service().await;
        let negotiation = service
            .create_negotiation(buy_input("11999998888"))
            .await
            .unwrap();
        let conversation = ConversationRef::Negotiation(negotiation.id.clone());
        for _ in 0..4 {
            service
                .send_message(&conversation, "ping", SenderClass::Customer, None)
                .await
                .unwrap();
        }

        let session = service.session_for(&conversation).await.unwrap().unwrap();
        assert_eq!(session.unread_count, 5);

        service.mark_read(&conversation).await.unwrap();
        let session = service.session_for(&conversation).await.unwrap().unwrap();
        assert_eq!(session.unread_count, 0);
        assert_eq!(session.status, SessionStatus::Active);
    }

    #[tokio::test]
    async fn staff_viewing_messages_marks_them_read() {
        let (service, _dir) = service().await;
        let negotiation = service
            .create_negotiation(buy_input("11999998888"))
            .await
            .unwrap();
        let conversation = ConversationRef::Negotiation(negotiation.id.clone());

        let messages = service.staff_messages(&conversation).await.unwrap();
        assert_eq!(messages.len(), 1);
        let session = service.session_for(&conversation).await.unwrap().unwrap();
        assert_eq!(session.unread_count, 0);
        assert_eq!(session.status, SessionStatus::Active);
    }

    #[tokio::test]
    async fn phone_scoped_reads_enforce_ownership() {
        let (service, _dir) = service().await;
        let negotiation = service
            .create_negotiation(buy_input("(69) 9 9371-6918"))
            .await
            .unwrap();
        let conversation = ConversationRef::Negotiation(negotiation.id.clone());

        // Differently formatted but identical phone passes.
        assert!(service
            .messages_for(&conversation, Some("69 99371 6918"))
            .await
            .is_ok());

        let err = service
            .messages_for(&conversation, Some("11999998888"))
            .await
            .unwrap_err();
        assert!(matches!(err, AutopierError::Forbidden(_)));

        let err = service
            .messages_for(&ConversationRef::Negotiation("ghost".to_string()), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AutopierError::NotFound { .. }));
    }

    #[tokio::test]
    async fn empty_message_content_is_rejected() {
        let (service, _dir) = service().await;
        let negotiation = service
            .create_negotiation(buy_input("11999998888"))
            .await
            .unwrap();
        let conversation = ConversationRef::Negotiation(negotiation.id.clone());

        let err = service
            .send_message(&conversation, "   \n ", SenderClass::Customer, None)
            .await
            .unwrap_err();
        let AutopierError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert!(errors.get("content").is_some());

        let messages = service.messages_for(&conversation, None).await.unwrap();
        assert_eq!(messages.len(), 1, "no message may be appended");
    }

    #[tokio::test]
    async fn quick_negotiation_reuses_open_conversations() {
        let (service, _dir) = service().await;

        let first = service
            .quick_negotiation("suv-1", "(11) 99999-8888", Some("Ana"))
            .await
            .unwrap();
        assert!(first.is_new);

        let second = service
            .quick_negotiation("suv-1", "11999998888", None)
            .await
            .unwrap();
        assert!(!second.is_new);
        assert_eq!(second.negotiation_id, first.negotiation_id);

        // A terminal negotiation is not reused.
        service
            .update_negotiation_status(&first.negotiation_id, NegotiationStatus::Cancelled)
            .await
            .unwrap();
        let third = service
            .quick_negotiation("suv-1", "11999998888", None)
            .await
            .unwrap();
        assert!(third.is_new);
        assert_ne!(third.negotiation_id, first.negotiation_id);
    }

    #[tokio::test]
    async fn sell_negotiation_persists_vehicle_snapshot() {
        let (service, _dir) = service().await;
        let input = NewNegotiation {
            kind: Some(NegotiationKind::Sell),
            customer_name: "Bruno Lima".to_string(),
            customer_phone: "69993716918".to_string(),
            vehicle_name: Some("Civic".to_string()),
            vehicle_brand: Some("Honda".to_string()),
            vehicle_year: Some(2019),
            vehicle_mileage: Some(42_000),
            proposed_price: Some(85_000.0),
            ..NewNegotiation::default()
        };
        let negotiation = service.create_negotiation(input).await.unwrap();
        assert_eq!(negotiation.vehicle_brand.as_deref(), Some("Honda"));
        assert_eq!(negotiation.proposed_price, Some(85_000.0));

        let conversation = ConversationRef::Negotiation(negotiation.id.clone());
        let session = service.session_for(&conversation).await.unwrap().unwrap();
        assert_eq!(session.vehicle_name, "Honda Civic");
        assert_eq!(session.vehicle_price, 85_000.0);

        let messages = service.messages_for(&conversation, None).await.unwrap();
        assert!(messages[0].content.contains("Honda Civic 2019"));
        assert!(messages[0].content.contains("42000 km"));
    }

    #[tokio::test]
    async fn order_creation_builds_active_session_without_messages() {
        let (service, _dir) = service().await;
        let order = service
            .create_order(NewOrder {
                car_id: "suv-1".to_string(),
                customer_name: "Ana Souza".to_string(),
                customer_rg: "12-34-56".to_string(),
                customer_phone: "(11) 99999-8888".to_string(),
                payment_method: "CREDIT_CARD".to_string(),
                installments: Some(12),
                selected_color: Some("Azul".to_string()),
                total_price: 139_900.0,
            })
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.customer_rg, "123456");
        assert_eq!(order.installments, 12);

        let conversation = ConversationRef::Order(order.id.clone());
        let session = service.session_for(&conversation).await.unwrap().unwrap();
        assert_eq!(session.status, SessionStatus::Active);
        assert_eq!(session.unread_count, 0);
        assert_eq!(session.vehicle_name, "Volkswagen T-Cross");
        assert_eq!(session.vehicle_price, 139_900.0);

        let messages = service.messages_for(&conversation, None).await.unwrap();
        assert!(messages.is_empty());
    }

    #[tokio::test]
    async fn invalid_order_leaves_no_record_behind() {
        let (service, _dir) = service().await;
        let err = service
            .create_order(NewOrder {
                car_id: "suv-1".to_string(),
                customer_name: String::new(),
                customer_rg: "12345".to_string(),
                customer_phone: "123".to_string(),
                payment_method: "PIX".to_string(),
                installments: Some(3),
                selected_color: None,
                total_price: 100.0,
            })
            .await
            .unwrap_err();
        let AutopierError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert!(errors.len() >= 3);

        assert!(service.order_overviews().await.unwrap().is_empty());
        assert!(service.all_active_chats().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn terminal_statuses_reject_further_transitions_and_close_chat() {
        let (service, _dir) = service().await;
        let negotiation = service
            .create_negotiation(buy_input("11999998888"))
            .await
            .unwrap();

        service
            .update_negotiation_status(&negotiation.id, NegotiationStatus::Completed)
            .await
            .unwrap();

        let err = service
            .update_negotiation_status(&negotiation.id, NegotiationStatus::InProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, AutopierError::Validation(_)));

        // Same-status update stays idempotent.
        let again = service
            .update_negotiation_status(&negotiation.id, NegotiationStatus::Completed)
            .await
            .unwrap();
        assert_eq!(again.status, NegotiationStatus::Completed);

        // The chat session closed with the negotiation.
        assert!(service.all_active_chats().await.unwrap().is_empty());
        let session = service
            .session_for(&ConversationRef::Negotiation(negotiation.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.status, SessionStatus::Closed);
    }

    #[tokio::test]
    async fn reconnect_finds_the_most_recent_chat_by_phone() {
        let (service, _dir) = service().await;
        let older = service
            .quick_negotiation("suv-1", "11999998888", Some("Ana"))
            .await
            .unwrap();
        let newer = service
            .quick_negotiation("suv-2", "11999998888", Some("Ana"))
            .await
            .unwrap();

        let result = service
            .reconnect(ReconnectQuery::Phone("(11) 99999-8888".to_string()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(result.session.reference_id, newer.negotiation_id);
        assert_eq!(result.messages.len(), 1);
        assert!(matches!(result.reference, ConversationRecord::Negotiation(_)));
        let siblings = result.sibling_chats.unwrap();
        assert_eq!(siblings.len(), 2);

        let by_id = service
            .reconnect(ReconnectQuery::Negotiation(older.negotiation_id))
            .await
            .unwrap()
            .unwrap();
        assert!(by_id.sibling_chats.is_none());

        let missing = service
            .reconnect(ReconnectQuery::Phone("00000000".to_string()))
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn client_summaries_carry_chat_badges() {
        let (service, _dir) = service().await;
        let negotiation = service
            .create_negotiation(buy_input("11999998888"))
            .await
            .unwrap();
        let conversation = ConversationRef::Negotiation(negotiation.id.clone());
        service
            .send_message(&conversation, "Still interested!", SenderClass::Customer, None)
            .await
            .unwrap();

        let summaries = service.client_negotiations("(11) 99999-8888").await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].unread_count, 2);
        assert_eq!(summaries[0].last_message, "Still interested!");

        // Another customer sees nothing.
        assert!(service
            .client_negotiations("69993716918")
            .await
            .unwrap()
            .is_empty());
    }
}
