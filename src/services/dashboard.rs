use crate::{
    entities::{order, order_item, product, user, Order, OrderItem, Product, User},
    errors::ServiceError,
};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr,
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

/// Products at or below this stock level show on the restock list.
pub const LOW_STOCK_THRESHOLD: i32 = 5;

/// Aggregated figures for the admin dashboard.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_revenue_all_time: f64,
    pub today_revenue: f64,
    pub yesterday_revenue: f64,
    /// Month-over-month revenue change, e.g. `+12.50%`. `0%` when the
    /// previous month had no revenue.
    pub revenue_growth: String,
    pub total_user_counts: u64,
    /// Shopper accounts only, consistent with `total_user_counts`; admin
    /// accounts are excluded.
    pub new_user_this_month: u64,
    pub order_status_count: Vec<StatusCount>,
    pub monthly_sales: Vec<MonthlySales>,
    pub current_month_sales: f64,
    pub top_selling_products: Vec<TopSellingProduct>,
    pub low_stock_products: Vec<LowStockProduct>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StatusCount {
    pub status: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySales {
    /// Calendar month label, e.g. `Mar 2026`
    pub month: String,
    pub total_sales: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopSellingProduct {
    pub product_id: Uuid,
    pub name: String,
    pub image: Option<String>,
    pub category: String,
    pub ratings: f64,
    pub total_quantity_sold: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LowStockProduct {
    pub id: Uuid,
    pub name: String,
    pub stock: i32,
}

/// Admin dashboard aggregates.
#[derive(Clone)]
pub struct DashboardService {
    db: Arc<DatabaseConnection>,
}

impl DashboardService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn dashboard_stats(&self) -> Result<DashboardStats, ServiceError> {
        let now = Utc::now();
        let today_start = start_of_day(now);
        let yesterday_start = today_start - Duration::days(1);
        let tomorrow_start = today_start + Duration::days(1);
        let month_start = start_of_month(now);
        let previous_month_start = months_back(month_start, 1);

        let total_revenue_all_time = self.revenue(None, None).await?;
        let today_revenue = self.revenue(Some(today_start), Some(tomorrow_start)).await?;
        let yesterday_revenue = self
            .revenue(Some(yesterday_start), Some(today_start))
            .await?;
        let current_month_sales = self.revenue(Some(month_start), None).await?;
        let previous_month_revenue = self
            .revenue(Some(previous_month_start), Some(month_start))
            .await?;

        let total_user_counts = User::find()
            .filter(user::Column::Role.eq(user::ROLE_USER))
            .count(&*self.db)
            .await?;

        let new_user_this_month = User::find()
            .filter(user::Column::Role.eq(user::ROLE_USER))
            .filter(user::Column::CreatedAt.gte(month_start))
            .count(&*self.db)
            .await?;

        let order_status_count = self.order_status_counts().await?;
        let monthly_sales = self.monthly_sales().await?;
        let top_selling_products = self.top_selling_products(5).await?;
        let low_stock_products = self.low_stock_products().await?;

        Ok(DashboardStats {
            total_revenue_all_time,
            today_revenue,
            yesterday_revenue,
            revenue_growth: format_growth(current_month_sales, previous_month_revenue),
            total_user_counts,
            new_user_this_month,
            order_status_count,
            monthly_sales,
            current_month_sales,
            top_selling_products,
            low_stock_products,
        })
    }

    /// Sum of order totals in the half-open range `[from, to)`; the whole
    /// table when unbounded.
    async fn revenue(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<f64, ServiceError> {
        let mut query = Order::find()
            .select_only()
            .column_as(Expr::col(order::Column::TotalPrice).sum(), "total");

        if let Some(from) = from {
            query = query.filter(order::Column::CreatedAt.gte(from));
        }
        if let Some(to) = to {
            query = query.filter(order::Column::CreatedAt.lt(to));
        }

        let total: Option<Option<Decimal>> = query.into_tuple().one(&*self.db).await?;
        Ok(total.flatten().and_then(|d| d.to_f64()).unwrap_or(0.0))
    }

    /// Order counts per fulfilment status, zero-filled so every status
    /// appears even with no orders.
    async fn order_status_counts(&self) -> Result<Vec<StatusCount>, ServiceError> {
        let rows: Vec<(String, i64)> = Order::find()
            .select_only()
            .column(order::Column::OrderStatus)
            .column_as(Expr::col(order::Column::Id).count(), "count")
            .group_by(order::Column::OrderStatus)
            .into_tuple()
            .all(&*self.db)
            .await?;

        let counts: HashMap<String, i64> = rows.into_iter().collect();

        Ok(order::ALL_STATUSES
            .iter()
            .map(|status| StatusCount {
                status: (*status).to_string(),
                count: counts.get(*status).copied().unwrap_or(0).max(0) as u64,
            })
            .collect())
    }

    /// Order totals bucketed per calendar month, oldest first. Only months
    /// with at least one order appear.
    async fn monthly_sales(&self) -> Result<Vec<MonthlySales>, ServiceError> {
        let rows: Vec<(DateTime<Utc>, Decimal)> = Order::find()
            .select_only()
            .column(order::Column::CreatedAt)
            .column(order::Column::TotalPrice)
            .into_tuple()
            .all(&*self.db)
            .await?;

        Ok(bucket_monthly_sales(&rows))
    }

    /// Best sellers by units sold across all order line items.
    async fn top_selling_products(
        &self,
        limit: u64,
    ) -> Result<Vec<TopSellingProduct>, ServiceError> {
        let rows: Vec<(Uuid, i64)> = OrderItem::find()
            .select_only()
            .column(order_item::Column::ProductId)
            .column_as(Expr::col(order_item::Column::Quantity).sum(), "total_quantity")
            .group_by(order_item::Column::ProductId)
            .order_by_desc(Expr::col(order_item::Column::Quantity).sum())
            .limit(limit)
            .into_tuple()
            .all(&*self.db)
            .await?;

        let ids: Vec<Uuid> = rows.iter().map(|(id, _)| *id).collect();
        let products: HashMap<Uuid, product::Model> = Product::find()
            .filter(product::Column::Id.is_in(ids))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        Ok(rows
            .into_iter()
            .filter_map(|(product_id, quantity)| {
                products.get(&product_id).map(|p| TopSellingProduct {
                    product_id,
                    name: p.name.clone(),
                    image: p.first_image_url(),
                    category: p.category.clone(),
                    ratings: p.ratings,
                    total_quantity_sold: quantity,
                })
            })
            .collect())
    }

    async fn low_stock_products(&self) -> Result<Vec<LowStockProduct>, ServiceError> {
        let products = Product::find()
            .filter(product::Column::Stock.lte(LOW_STOCK_THRESHOLD))
            .order_by_asc(product::Column::Stock)
            .all(&*self.db)
            .await?;

        Ok(products
            .into_iter()
            .map(|p| LowStockProduct {
                id: p.id,
                name: p.name,
                stock: p.stock,
            })
            .collect())
    }
}

fn start_of_day(at: DateTime<Utc>) -> DateTime<Utc> {
    at.date_naive()
        .and_hms_opt(0, 0, 0)
        .unwrap_or_default()
        .and_utc()
}

fn start_of_month(at: DateTime<Utc>) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(at.year(), at.month(), 1)
        .unwrap_or_default()
        .and_hms_opt(0, 0, 0)
        .unwrap_or_default()
        .and_utc()
}

/// First day of the month `months` calendar months before `month_start`.
fn months_back(month_start: DateTime<Utc>, months: u32) -> DateTime<Utc> {
    let total = month_start.year() * 12 + month_start.month0() as i32 - months as i32;
    let year = total.div_euclid(12);
    let month = total.rem_euclid(12) as u32 + 1;
    NaiveDate::from_ymd_opt(year, month, 1)
        .unwrap_or_default()
        .and_hms_opt(0, 0, 0)
        .unwrap_or_default()
        .and_utc()
}

fn month_label(year: i32, month: u32) -> String {
    NaiveDate::from_ymd_opt(year, month, 1)
        .unwrap_or_default()
        .format("%b %Y")
        .to_string()
}

/// Bucket order totals per calendar month, ascending. Months without
/// orders do not appear.
fn bucket_monthly_sales(rows: &[(DateTime<Utc>, Decimal)]) -> Vec<MonthlySales> {
    let mut buckets: BTreeMap<(i32, u32), f64> = BTreeMap::new();

    for (created_at, total) in rows {
        *buckets
            .entry((created_at.year(), created_at.month()))
            .or_insert(0.0) += total.to_f64().unwrap_or(0.0);
    }

    buckets
        .into_iter()
        .map(|((year, month), total)| MonthlySales {
            month: month_label(year, month),
            total_sales: (total * 100.0).round() / 100.0,
        })
        .collect()
}

/// Month-over-month growth as a signed percentage string. Returns `0%`
/// when the previous month had no revenue, since the ratio is undefined.
fn format_growth(current: f64, previous: f64) -> String {
    if previous <= 0.0 {
        return "0%".to_string();
    }
    let growth = (current - previous) / previous * 100.0;
    format!("{:+.2}%", growth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 30, 0).unwrap()
    }

    #[test]
    fn growth_is_zero_without_previous_revenue() {
        assert_eq!(format_growth(150.0, 0.0), "0%");
        assert_eq!(format_growth(0.0, 0.0), "0%");
    }

    #[test]
    fn growth_carries_sign_and_two_decimals() {
        assert_eq!(format_growth(150.0, 100.0), "+50.00%");
        assert_eq!(format_growth(75.0, 100.0), "-25.00%");
        assert_eq!(format_growth(100.0, 100.0), "+0.00%");
    }

    #[test]
    fn months_back_crosses_year_boundary() {
        let feb = start_of_month(at(2026, 2, 15));
        assert_eq!(
            months_back(feb, 1),
            Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(
            months_back(feb, 5),
            Utc.with_ymd_and_hms(2025, 9, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn monthly_buckets_are_ascending_and_skip_empty_months() {
        let rows = vec![
            (at(2026, 3, 2), dec!(100)),
            (at(2026, 3, 8), dec!(50.5)),
            (at(2026, 1, 20), dec!(10)),
            (at(2025, 11, 1), dec!(7)),
        ];

        let sales = bucket_monthly_sales(&rows);
        assert_eq!(sales.len(), 3);
        assert_eq!(sales[0].month, "Nov 2025");
        assert_eq!(sales[0].total_sales, 7.0);
        assert_eq!(sales[1].month, "Jan 2026");
        assert_eq!(sales[2].month, "Mar 2026");
        assert_eq!(sales[2].total_sales, 150.5);
    }

    #[test]
    fn empty_order_history_yields_no_monthly_buckets() {
        assert!(bucket_monthly_sales(&[]).is_empty());
    }
}
