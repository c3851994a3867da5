use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::future::Future;

use crate::db;
use crate::models::coupon::{normalize_code, Coupon, CreateCouponData, DiscountType};

#[derive(thiserror::Error, Debug)]
pub enum CouponError {
    #[error("Invalid or expired coupon code")]
    NotFoundOrInactive,

    #[error("This coupon has expired")]
    Expired,

    #[error("Minimum order amount of {min_amount} is required to use this coupon")]
    BelowMinimum { min_amount: f64 },

    #[error("Coupon code already exists")]
    Conflict,

    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Persistence used by the coupon operations.
pub trait CouponStore: Send + Sync {
    fn find_by_code(
        &self,
        code: &str,
    ) -> impl Future<Output = Result<Option<Coupon>, sqlx::Error>> + Send;

    fn insert(
        &self,
        data: &CreateCouponData,
    ) -> impl Future<Output = Result<Coupon, sqlx::Error>> + Send;

    fn list_by_expiry_desc(&self) -> impl Future<Output = Result<Vec<Coupon>, sqlx::Error>> + Send;
}

impl CouponStore for PgPool {
    async fn find_by_code(&self, code: &str) -> Result<Option<Coupon>, sqlx::Error> {
        Coupon::find_by_code(self, code).await
    }

    async fn insert(&self, data: &CreateCouponData) -> Result<Coupon, sqlx::Error> {
        Coupon::create(self, data).await
    }

    async fn list_by_expiry_desc(&self) -> Result<Vec<Coupon>, sqlx::Error> {
        Coupon::list_by_expiry_desc(self).await
    }
}

/// Decides whether `coupon` applies to a cart of `amount` at instant `now`.
///
/// Expiry wins over the active flag, so an expired coupon always reports
/// `Expired`. The minimum is inclusive.
pub fn check_applicable(
    coupon: &Coupon,
    amount: f64,
    now: DateTime<Utc>,
) -> Result<(), CouponError> {
    if now > coupon.expiry_date {
        return Err(CouponError::Expired);
    }

    if !coupon.is_active {
        return Err(CouponError::NotFoundOrInactive);
    }

    if amount < coupon.min_amount {
        return Err(CouponError::BelowMinimum {
            min_amount: coupon.min_amount,
        });
    }

    Ok(())
}

/// Looks up `code` case-insensitively and checks it against the cart amount.
///
/// Read-only; the caller derives the discount from `discount_type` and `value`.
#[tracing::instrument(skip(store))]
pub async fn validate<S: CouponStore>(
    store: &S,
    code: &str,
    amount: f64,
) -> Result<Coupon, CouponError> {
    let code = normalize_code(code);

    let coupon = store
        .find_by_code(&code)
        .await?
        .ok_or(CouponError::NotFoundOrInactive)?;

    if let Err(e) = check_applicable(&coupon, amount, Utc::now()) {
        tracing::info!(code = %coupon.code, reason = %e, "Coupon rejected");
        return Err(e);
    }

    tracing::debug!(code = %coupon.code, "Coupon accepted");

    Ok(coupon)
}

fn check_new_coupon(data: &CreateCouponData) -> Result<(), CouponError> {
    if data.code.is_empty() {
        return Err(CouponError::Validation("Coupon code is required".to_string()));
    }
    if !data.value.is_finite() || data.value <= 0.0 {
        return Err(CouponError::Validation(
            "Discount value must be greater than 0".to_string(),
        ));
    }
    if data.discount_type == DiscountType::Percentage && data.value > 100.0 {
        return Err(CouponError::Validation(
            "Percentage discount cannot exceed 100".to_string(),
        ));
    }
    if !data.min_amount.is_finite() || data.min_amount < 0.0 {
        return Err(CouponError::Validation(
            "Minimum amount cannot be negative".to_string(),
        ));
    }
    Ok(())
}

/// Creates an active coupon. The code is normalized before the uniqueness check.
#[tracing::instrument(skip(store, data), fields(code = %data.code))]
pub async fn create<S: CouponStore>(
    store: &S,
    mut data: CreateCouponData,
) -> Result<Coupon, CouponError> {
    data.code = normalize_code(&data.code);
    check_new_coupon(&data)?;

    if store.find_by_code(&data.code).await?.is_some() {
        tracing::warn!(code = %data.code, "Coupon code already exists");
        return Err(CouponError::Conflict);
    }

    let coupon = store.insert(&data).await.map_err(|e| {
        if db::is_unique_violation(&e) {
            CouponError::Conflict
        } else {
            CouponError::DatabaseError(e)
        }
    })?;

    tracing::info!(coupon_id = %coupon.id, code = %coupon.code, "Created coupon");

    Ok(coupon)
}

/// All coupons, sorted by raw expiry date descending.
pub async fn list<S: CouponStore>(store: &S) -> Result<Vec<Coupon>, CouponError> {
    Ok(store.list_by_expiry_desc().await?)
}
