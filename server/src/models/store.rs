use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::utils::error::AppError;

pub const STORE_NAME_MAX_LEN: usize = 20;
pub const HANBOK_NAME_MAX_LEN: usize = 20;
pub const HANBOK_DESCRIPTION_MAX_LEN: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Store {
    pub id: i64,
    pub owner_id: i64,
    pub hanbok_store: String,
    pub hanbok_address: String,
    pub location_x: Decimal,
    pub location_y: Decimal,
    pub star: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewStore {
    pub owner_id: i64,
    pub hanbok_store: String,
    pub hanbok_address: String,
    pub location_x: Decimal,
    pub location_y: Decimal,
    pub star: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Hanbok {
    pub id: i64,
    pub store_id: i64,
    pub owner_id: i64,
    pub hanbok_name: String,
    pub hanbok_description: String,
    pub hanbok_price: i32,
    pub hanbok_image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewHanbok {
    pub store_id: i64,
    pub owner_id: i64,
    pub hanbok_name: String,
    pub hanbok_description: String,
    pub hanbok_price: i32,
    pub hanbok_image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StoreComment {
    pub id: i64,
    pub store_id: i64,
    pub author_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewStoreComment {
    pub store_id: i64,
    pub author_id: i64,
    pub content: String,
}

fn check_len(field: &str, value: &str, max: usize) -> Result<(), AppError> {
    if value.trim().is_empty() || value.chars().count() > max {
        return Err(AppError::ValidationError(format!(
            "{} must be 1 to {} characters",
            field, max
        )));
    }
    Ok(())
}

impl NewStore {
    pub fn validate(&self) -> Result<(), AppError> {
        check_len("hanbok_store", &self.hanbok_store, STORE_NAME_MAX_LEN)?;
        if self.hanbok_address.trim().is_empty() {
            return Err(AppError::ValidationError(
                "hanbok_address is required".to_string(),
            ));
        }
        // location_x is the longitude, location_y the latitude
        if self.location_x.abs() > Decimal::from(180) || self.location_y.abs() > Decimal::from(90) {
            return Err(AppError::ValidationError(
                "store location is out of range".to_string(),
            ));
        }
        if self.star < Decimal::ZERO || self.star > Decimal::from(5) {
            return Err(AppError::ValidationError(
                "star must be between 0 and 5".to_string(),
            ));
        }
        Ok(())
    }
}

impl NewHanbok {
    pub fn validate(&self) -> Result<(), AppError> {
        check_len("hanbok_name", &self.hanbok_name, HANBOK_NAME_MAX_LEN)?;
        check_len(
            "hanbok_description",
            &self.hanbok_description,
            HANBOK_DESCRIPTION_MAX_LEN,
        )?;
        if self.hanbok_price < 0 {
            return Err(AppError::ValidationError(
                "hanbok_price must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn validate_comment(content: &str) -> Result<(), AppError> {
    if content.trim().is_empty() {
        return Err(AppError::ValidationError(
            "comment content is required".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn store() -> NewStore {
        NewStore {
            owner_id: 1,
            hanbok_store: "청춘한복아랑".into(),
            hanbok_address: "서울 종로구 자하문로13길 5".into(),
            location_x: Decimal::from_str("126.970816").unwrap(),
            location_y: Decimal::from_str("37.5799334").unwrap(),
            star: Decimal::from(4),
        }
    }

    #[test]
    fn test_store_validation() {
        assert!(store().validate().is_ok());

        let mut bad = store();
        bad.star = Decimal::from(6);
        assert!(bad.validate().is_err());

        let mut bad = store();
        bad.location_y = Decimal::from(91);
        assert!(bad.validate().is_err());

        let mut bad = store();
        bad.hanbok_store = "가".repeat(21);
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_hanbok_validation() {
        let mut hanbok = NewHanbok {
            store_id: 1,
            owner_id: 1,
            hanbok_name: "한복".into(),
            hanbok_description: "한복 상품설명입니다.".into(),
            hanbok_price: 10000,
            hanbok_image: None,
        };
        assert!(hanbok.validate().is_ok());

        hanbok.hanbok_price = -1;
        assert!(hanbok.validate().is_err());

        hanbok.hanbok_price = 0;
        hanbok.hanbok_description = "x".repeat(101);
        assert!(hanbok.validate().is_err());
    }
}
