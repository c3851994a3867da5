use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    Percentage,
    Fixed,
}

impl DiscountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountType::Percentage => "percentage",
            DiscountType::Fixed => "fixed",
        }
    }
}

impl TryFrom<String> for DiscountType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "percentage" => Ok(DiscountType::Percentage),
            "fixed" => Ok(DiscountType::Fixed),
            other => Err(format!("unknown discount type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    pub id: Uuid,
    pub code: String, // always uppercase
    #[sqlx(try_from = "String")]
    pub discount_type: DiscountType,
    pub value: f64,
    pub min_amount: f64,
    pub expiry_date: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateCouponData {
    pub code: String,
    pub discount_type: DiscountType,
    pub value: f64,
    pub min_amount: f64,
    pub expiry_date: DateTime<Utc>,
}

/// Canonical form of a coupon code: trimmed and uppercased.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

impl Coupon {
    /// Inserts a new active coupon. `data.code` must already be normalized.
    pub async fn create(pool: &PgPool, data: &CreateCouponData) -> Result<Self, sqlx::Error> {
        let coupon = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO coupons (code, discount_type, value, min_amount, expiry_date, is_active)
            VALUES ($1, $2, $3, $4, $5, TRUE)
            RETURNING *
            "#,
        )
        .bind(&data.code)
        .bind(data.discount_type.as_str())
        .bind(data.value)
        .bind(data.min_amount)
        .bind(data.expiry_date)
        .fetch_one(pool)
        .await?;

        Ok(coupon)
    }

    /// Finds a coupon by its normalized code, active or not
    pub async fn find_by_code(pool: &PgPool, code: &str) -> Result<Option<Self>, sqlx::Error> {
        let coupon = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM coupons WHERE code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(pool)
        .await?;

        Ok(coupon)
    }

    /// Lists every coupon, latest expiry first
    pub async fn list_by_expiry_desc(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let coupons = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM coupons
            ORDER BY expiry_date DESC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(coupons)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code("save10"), "SAVE10");
        assert_eq!(normalize_code("  Welcome10 "), "WELCOME10");
        assert_eq!(normalize_code("SAVE10"), "SAVE10");
    }

    #[test]
    fn test_discount_type_parsing() {
        assert_eq!(
            DiscountType::try_from("percentage".to_string()),
            Ok(DiscountType::Percentage)
        );
        assert_eq!(DiscountType::try_from("fixed".to_string()), Ok(DiscountType::Fixed));
        assert!(DiscountType::try_from("bogo".to_string()).is_err());
    }

    #[test]
    fn test_coupon_serializes_camel_case() {
        let coupon = Coupon {
            id: Uuid::new_v4(),
            code: "WELCOME10".to_string(),
            discount_type: DiscountType::Percentage,
            value: 10.0,
            min_amount: 500.0,
            expiry_date: Utc::now(),
            is_active: true,
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&coupon).unwrap();
        assert_eq!(json["discountType"], "percentage");
        assert_eq!(json["minAmount"], 500.0);
        assert_eq!(json["isActive"], true);
        assert!(json.get("expiryDate").is_some());
    }
}
