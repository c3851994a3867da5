use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::api::extract::AppJson;
use crate::api::middleware::{
    auth::{require_admin, require_user, AuthenticatedUser},
    state::AppState,
};
use crate::error::Result;
use crate::models::coupon::{Coupon, CreateCouponData, DiscountType};
use crate::services::coupons;

#[derive(Deserialize)]
struct ValidateCouponRequest {
    code: String,
    amount: f64,
}

#[derive(Serialize)]
struct CouponResponse {
    success: bool,
    coupon: Coupon,
}

#[derive(Serialize)]
struct CouponListResponse {
    success: bool,
    coupons: Vec<Coupon>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateCouponRequest {
    code: String,
    discount_type: DiscountType,
    value: f64,
    #[serde(default)]
    min_amount: f64,
    #[serde(deserialize_with = "expiry_instant")]
    expiry_date: DateTime<Utc>,
}

/// Accepts an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC).
fn expiry_instant<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let raw = raw.trim();

    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Ok(instant.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
        .map_err(|_| serde::de::Error::custom(format!("invalid expiry date: {}", raw)))
}

/// Checkout-time coupon check
async fn validate_coupon(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    AppJson(body): AppJson<ValidateCouponRequest>,
) -> Result<Json<CouponResponse>> {
    tracing::debug!(user_id = %user.user_id, "Validating coupon");

    let coupon = coupons::validate(&state.pool, &body.code, body.amount).await?;

    Ok(Json(CouponResponse {
        success: true,
        coupon,
    }))
}

async fn create_coupon(
    State(state): State<AppState>,
    AppJson(body): AppJson<CreateCouponRequest>,
) -> Result<(StatusCode, Json<CouponResponse>)> {
    let coupon = coupons::create(
        &state.pool,
        CreateCouponData {
            code: body.code,
            discount_type: body.discount_type,
            value: body.value,
            min_amount: body.min_amount,
            expiry_date: body.expiry_date,
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(CouponResponse {
            success: true,
            coupon,
        }),
    ))
}

async fn list_coupons(State(state): State<AppState>) -> Result<Json<CouponListResponse>> {
    let coupons = coupons::list(&state.pool).await?;

    Ok(Json(CouponListResponse {
        success: true,
        coupons,
    }))
}

pub fn router(state: AppState) -> Router<AppState> {
    let user_routes = Router::new()
        .route("/api/coupon/validate", post(validate_coupon))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_user));

    let admin_routes = Router::new()
        .route("/api/coupon/create", post(create_coupon))
        .route("/api/coupon/list", get(list_coupons))
        .route_layer(middleware::from_fn_with_state(state, require_admin));

    user_routes.merge(admin_routes)
}
