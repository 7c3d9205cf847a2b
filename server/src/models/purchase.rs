use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::utils::error::AppError;

/// A payment gateway transaction, pending until the gateway approval is recorded.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PurchaseRecord {
    pub id: i64,
    pub user_id: i64,
    pub tid: String,
    pub partner_order_id: i64,
    pub partner_user_id: String,
    pub item_name: String,
    pub quantity: i32,
    pub total_amount: i32,
    pub vat_amount: i32,
    pub tax_free_amount: i32,
    pub rsrvt_date: DateTime<Utc>,
    pub rsrvt_time: NaiveTime,
    pub created_at: DateTime<Utc>,
    pub payment_method_type: Option<String>,
    pub aid: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseStatus {
    Pending,
    Approved,
}

#[derive(Debug, Clone)]
pub struct NewPurchaseRecord {
    pub user_id: i64,
    pub tid: String,
    pub partner_order_id: i64,
    pub partner_user_id: String,
    pub item_name: String,
    pub quantity: i32,
    pub total_amount: i32,
    pub vat_amount: i32,
    pub tax_free_amount: i32,
    pub rsrvt_date: DateTime<Utc>,
    pub rsrvt_time: NaiveTime,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct PurchaseApproval {
    pub aid: String,
    pub payment_method_type: Option<String>,
    pub approved_at: DateTime<Utc>,
}

pub const AID_MAX_LEN: usize = 100;
pub const PAYMENT_METHOD_TYPE_MAX_LEN: usize = 50;

impl PurchaseApproval {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.aid.trim().is_empty() || self.aid.chars().count() > AID_MAX_LEN {
            return Err(AppError::ValidationError(format!(
                "aid must be 1 to {} characters",
                AID_MAX_LEN
            )));
        }
        if let Some(method) = &self.payment_method_type {
            if method.chars().count() > PAYMENT_METHOD_TYPE_MAX_LEN {
                return Err(AppError::ValidationError(format!(
                    "payment_method_type must be at most {} characters",
                    PAYMENT_METHOD_TYPE_MAX_LEN
                )));
            }
        }
        Ok(())
    }
}

impl PurchaseRecord {
    pub fn status(&self) -> PurchaseStatus {
        if self.approved_at.is_some() {
            PurchaseStatus::Approved
        } else {
            PurchaseStatus::Pending
        }
    }

    pub fn approve(&mut self, approval: PurchaseApproval) -> Result<(), AppError> {
        if self.status() == PurchaseStatus::Approved {
            return Err(AppError::Conflict(format!(
                "purchase '{}' is already approved",
                self.tid
            )));
        }
        self.aid = Some(approval.aid);
        self.payment_method_type = approval.payment_method_type;
        self.approved_at = Some(approval.approved_at);
        Ok(())
    }
}

impl NewPurchaseRecord {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.tid.trim().is_empty() || self.tid.len() > 100 {
            return Err(AppError::ValidationError(
                "tid must be 1 to 100 characters".to_string(),
            ));
        }
        if self.item_name.trim().is_empty() || self.item_name.chars().count() > 50 {
            return Err(AppError::ValidationError(
                "item_name must be 1 to 50 characters".to_string(),
            ));
        }
        if self.partner_user_id.chars().count() > 50 {
            return Err(AppError::ValidationError(
                "partner_user_id must be at most 50 characters".to_string(),
            ));
        }
        if self.quantity < 1 {
            return Err(AppError::ValidationError(
                "quantity must be at least 1".to_string(),
            ));
        }
        if self.total_amount < 0 || self.vat_amount < 0 || self.tax_free_amount < 0 {
            return Err(AppError::ValidationError(
                "amounts must not be negative".to_string(),
            ));
        }
        if i64::from(self.vat_amount) + i64::from(self.tax_free_amount)
            > i64::from(self.total_amount)
        {
            return Err(AppError::ValidationError(
                "vat_amount and tax_free_amount exceed total_amount".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_record() -> NewPurchaseRecord {
        NewPurchaseRecord {
            user_id: 1,
            tid: "T1234567890".into(),
            partner_order_id: 42,
            partner_user_id: "1".into(),
            item_name: "당의 대여".into(),
            quantity: 1,
            total_amount: 22000,
            vat_amount: 2000,
            tax_free_amount: 0,
            rsrvt_date: Utc::now(),
            rsrvt_time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            created_at: Utc::now(),
        }
    }

    fn record() -> PurchaseRecord {
        let new = new_record();
        PurchaseRecord {
            id: 1,
            user_id: new.user_id,
            tid: new.tid,
            partner_order_id: new.partner_order_id,
            partner_user_id: new.partner_user_id,
            item_name: new.item_name,
            quantity: new.quantity,
            total_amount: new.total_amount,
            vat_amount: new.vat_amount,
            tax_free_amount: new.tax_free_amount,
            rsrvt_date: new.rsrvt_date,
            rsrvt_time: new.rsrvt_time,
            created_at: new.created_at,
            payment_method_type: None,
            aid: None,
            approved_at: None,
        }
    }

    #[test]
    fn test_new_record_validation() {
        assert!(new_record().validate().is_ok());

        let mut bad = new_record();
        bad.quantity = 0;
        assert!(bad.validate().is_err());

        let mut bad = new_record();
        bad.vat_amount = 30000;
        assert!(bad.validate().is_err());

        let mut bad = new_record();
        bad.tid = "  ".into();
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_approve_moves_pending_to_approved_once() {
        let mut record = record();
        assert_eq!(record.status(), PurchaseStatus::Pending);

        let approval = PurchaseApproval {
            aid: "A1".into(),
            payment_method_type: Some("CARD".into()),
            approved_at: Utc::now(),
        };
        record.approve(approval.clone()).unwrap();
        assert_eq!(record.status(), PurchaseStatus::Approved);
        assert_eq!(record.aid.as_deref(), Some("A1"));

        let err = record.approve(approval).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn test_approval_field_lengths() {
        let approval = |aid: &str, method: Option<String>| PurchaseApproval {
            aid: aid.into(),
            payment_method_type: method,
            approved_at: Utc::now(),
        };
        assert!(approval("A1", Some("M".repeat(50))).validate().is_ok());
        assert!(approval("A1", Some("M".repeat(51))).validate().is_err());
        assert!(approval(" ", None).validate().is_err());
        assert!(approval(&"a".repeat(101), None).validate().is_err());
    }
}
