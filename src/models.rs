use crate::schema::{clients, conversation_states, delivery_log, templates};
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;

pub const PAYMENT_PENDING: &str = "pending";
pub const PAYMENT_PAID: &str = "paid";

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = clients)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Client {
    pub id: i32,
    pub owner_id: i64,
    pub name: String,
    pub phone: String,
    pub package: String,
    pub price: BigDecimal,
    pub due_date: NaiveDate,
    pub server: String,
    pub extra_notes: Option<String>,
    pub payment_status: String,
    pub payment_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Client {
    pub fn is_paid(&self) -> bool {
        self.payment_status == PAYMENT_PAID
    }
}

#[derive(Insertable)]
#[diesel(table_name = clients)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewClient<'a> {
    pub owner_id: i64,
    pub name: &'a str,
    pub phone: &'a str,
    pub package: &'a str,
    pub price: BigDecimal,
    pub due_date: NaiveDate,
    pub server: &'a str,
    pub extra_notes: Option<&'a str>,
    pub payment_status: &'a str,
    pub payment_date: Option<NaiveDate>,
}

#[derive(AsChangeset, Default)]
#[diesel(table_name = clients)]
pub struct UpdateClient {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub package: Option<String>,
    pub price: Option<BigDecimal>,
    pub due_date: Option<NaiveDate>,
    pub server: Option<String>,
    pub extra_notes: Option<Option<String>>,
    pub payment_status: Option<String>,
    pub payment_date: Option<Option<NaiveDate>>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = templates)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Template {
    pub id: i32,
    pub name: String,
    pub content: String,
}

#[derive(Insertable)]
#[diesel(table_name = templates)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewTemplate<'a> {
    pub name: &'a str,
    pub content: &'a str,
}

#[derive(Debug, Queryable, Identifiable, Selectable, Associations)]
#[diesel(table_name = delivery_log)]
#[diesel(belongs_to(Client))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DeliveryLogEntry {
    pub id: i32,
    pub client_id: i32,
    pub template_name: String,
    pub recipient: String,
    pub status: String,
    pub preview: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = delivery_log)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewDeliveryLogEntry<'a> {
    pub client_id: i32,
    pub template_name: &'a str,
    pub recipient: &'a str,
    pub status: &'a str,
    pub preview: &'a str,
}

#[derive(Debug, Queryable, Identifiable, Selectable)]
#[diesel(table_name = conversation_states)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ConversationState {
    pub id: i32,
    pub operator_id: i64,
    pub state: String,
    pub state_data: Option<serde_json::Value>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = conversation_states)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewConversationState<'a> {
    pub operator_id: i64,
    pub state: &'a str,
    pub state_data: Option<serde_json::Value>,
    pub expires_at: DateTime<Utc>,
}
