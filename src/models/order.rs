use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::export_request::ExportRequest;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub customer_name: String,
    pub customer_email: String,
    pub total_amount: f64,
    pub status: String, // "Order Placed", "Packing", "Shipped", "Out for delivery", "Delivered"
    pub payment_method: String,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Selects the orders an export request asks for, sorted as requested.
    pub async fn list_for_export(
        pool: &PgPool,
        request: &ExportRequest,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let mut query = export_query(request, limit);

        let orders = query.build_query_as::<Self>().fetch_all(pool).await?;

        Ok(orders)
    }
}

fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn export_query(request: &ExportRequest, limit: i64) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new("SELECT * FROM orders WHERE TRUE");

    if request.filter_by.uses_date() {
        if let Some(start) = request.date_range.start {
            query.push(" AND created_at >= ").push_bind(day_start(start));
        }
        // end day is inclusive; the last representable day has no upper bound
        if let Some(next_day) = request.date_range.end.and_then(|end| end.succ_opt()) {
            query
                .push(" AND created_at < ")
                .push_bind(day_start(next_day));
        }
    }

    if request.filter_by.uses_status() && !request.statuses.is_empty() {
        let statuses: Vec<String> = request.statuses.iter().cloned().collect();
        query.push(" AND status = ANY(").push_bind(statuses).push(")");
    }

    // Column and direction come from closed enums, never from user text
    query.push(format!(
        " ORDER BY {} {}, id ASC",
        request.sort_by.column(),
        request.sort_order.keyword()
    ));
    query.push(" LIMIT ").push_bind(limit);

    query
}
