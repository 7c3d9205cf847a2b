//! Records of payment-gateway transactions.
//!
//! The gateway flow itself runs in the client; this API only keeps the
//! ready/approve bookkeeping. A record is created when the gateway hands out
//! a `tid` and becomes approved once the client reports the approval id.
//! All three operations share the `/stores/payment/:key` path: creation takes
//! the paying user's id as `key`, lookup and approval take the `tid`.
use axum::extract::State;
use axum::response::Response;
use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::{is_owner_or_admin, AuthUser};
use crate::models::purchase::{
    NewPurchaseRecord, PurchaseApproval, PurchaseRecord, PurchaseStatus,
};
use crate::models::user::User;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::extract::{AppJson, AppPath};
use crate::utils::response::{created, success};

#[derive(Debug, Deserialize)]
pub struct CreatePurchaseRequest {
    pub tid: String,
    pub partner_order_id: i64,
    pub partner_user_id: String,
    pub item_name: String,
    pub quantity: i32,
    pub total_amount: i32,
    pub vat_amount: i32,
    #[serde(default)]
    pub tax_free_amount: i32,
    pub rsrvt_date: DateTime<Utc>,
    pub rsrvt_time: NaiveTime,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct ApprovePurchaseRequest {
    pub aid: String,
    pub payment_method_type: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct PurchaseView {
    #[serde(flatten)]
    pub record: PurchaseRecord,
    pub status: PurchaseStatus,
}

impl From<PurchaseRecord> for PurchaseView {
    fn from(record: PurchaseRecord) -> Self {
        Self {
            status: record.status(),
            record,
        }
    }
}

async fn owned_purchase(state: &AppState, user: &User, tid: &str) -> Result<PurchaseRecord, AppError> {
    let record = state.repo.get_purchase(tid).await?;
    if !is_owner_or_admin(user, record.user_id) {
        return Err(AppError::Forbidden(
            "You do not have access to this purchase".to_string(),
        ));
    }
    Ok(record)
}

/// Replaces the caller's unapproved records with a new pending one.
pub async fn create_purchase(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppPath(key): AppPath<String>,
    AppJson(payload): AppJson<CreatePurchaseRequest>,
) -> Result<Response, AppError> {
    let user_id: i64 = key
        .parse()
        .map_err(|_| AppError::ValidationError(format!("'{}' is not a user id", key)))?;
    if user_id != user.id {
        return Err(AppError::Forbidden(
            "You can only record your own purchases".to_string(),
        ));
    }

    let record = NewPurchaseRecord {
        user_id,
        tid: payload.tid.trim().to_string(),
        partner_order_id: payload.partner_order_id,
        partner_user_id: payload.partner_user_id,
        item_name: payload.item_name,
        quantity: payload.quantity,
        total_amount: payload.total_amount,
        vat_amount: payload.vat_amount,
        tax_free_amount: payload.tax_free_amount,
        rsrvt_date: payload.rsrvt_date,
        rsrvt_time: payload.rsrvt_time,
        created_at: payload.created_at.unwrap_or_else(Utc::now),
    };
    record.validate()?;

    let record = state.repo.replace_pending_purchase(record).await?;
    tracing::info!(user_id, tid = %record.tid, "Purchase recorded");
    Ok(created(PurchaseView::from(record), "Purchase recorded"))
}

pub async fn get_purchase(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppPath(tid): AppPath<String>,
) -> Result<Response, AppError> {
    let record = owned_purchase(&state, &user, &tid).await?;
    Ok(success(PurchaseView::from(record), "Purchase retrieved"))
}

pub async fn approve_purchase(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppPath(tid): AppPath<String>,
    AppJson(payload): AppJson<ApprovePurchaseRequest>,
) -> Result<Response, AppError> {
    let approval = PurchaseApproval {
        aid: payload.aid.trim().to_string(),
        payment_method_type: payload.payment_method_type,
        approved_at: payload.approved_at.unwrap_or_else(Utc::now),
    };
    approval.validate()?;

    let mut record = owned_purchase(&state, &user, &tid).await?;
    // Fails fast on an approved record; the repository re-checks atomically.
    record.approve(approval.clone())?;

    let record = state.repo.approve_purchase(&tid, approval).await?;
    tracing::info!(tid = %record.tid, user_id = record.user_id, "Purchase approved");
    Ok(success(PurchaseView::from(record), "Payment complete"))
}
