use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::product::Product;

pub const STATUS_PENDING: i32 = 0;
pub const STATUS_DELIVERED: i32 = 2;

const BEST_SELLER_LIMIT: usize = 10;
const LABEL_MAX_CHARS: usize = 20;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_id: i64,
    pub order_date: NaiveDate,
    pub amount: f64,
    pub status: i32,
}

/// Revenue of one month, as returned by the statistics endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyRevenue {
    pub month: u32,
    #[serde(default)]
    pub amount: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBestSeller {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub amount: f64,
}

/// Labels and values ready to be drawn.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSeries {
    pub title: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    pub has_data: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySeries {
    pub labels: Vec<String>,
    pub counts: Vec<u64>,
    pub amounts: Vec<f64>,
}

fn delivered(orders: &[Order]) -> impl Iterator<Item = &Order> {
    orders.iter().filter(|o| o.status == STATUS_DELIVERED)
}

pub fn revenue_for_year(orders: &[Order], year: i32) -> f64 {
    delivered(orders)
        .filter(|o| o.order_date.year() == year)
        .map(|o| o.amount)
        .sum()
}

pub fn revenue_for_month(orders: &[Order], year: i32, month: u32) -> f64 {
    delivered(orders)
        .filter(|o| o.order_date.year() == year && o.order_date.month() == month)
        .map(|o| o.amount)
        .sum()
}

/// Orders still waiting to be handled.
pub fn pending_orders(orders: &[Order]) -> usize {
    orders.iter().filter(|o| o.status == STATUS_PENDING).count()
}

/// Twelve monthly bars. Months without a row read 0.
pub fn monthly_series(year: i32, rows: &[MonthlyRevenue]) -> ChartSeries {
    let mut values = vec![0.0; 12];
    for row in rows {
        if (1..=12).contains(&row.month) {
            values[row.month as usize - 1] += row.amount;
        }
    }
    ChartSeries {
        title: format!("Revenue {}", year),
        labels: (1..=12).map(|m| format!("Month {}", m)).collect(),
        values,
        has_data: !rows.is_empty(),
    }
}

fn short_label(name: &str) -> String {
    if name.chars().count() > LABEL_MAX_CHARS {
        let head: String = name.chars().take(LABEL_MAX_CHARS - 2).collect();
        format!("{}...", head)
    } else {
        name.to_string()
    }
}

/// Top sellers by units sold.
pub fn best_seller_series(products: &[Product]) -> ChartSeries {
    let mut sold: Vec<&Product> = products.iter().filter(|p| p.sold > 0).collect();
    sold.sort_by(|a, b| b.sold.cmp(&a.sold));
    sold.truncate(BEST_SELLER_LIMIT);

    ChartSeries {
        title: "Best sellers".to_string(),
        labels: sold.iter().map(|p| short_label(&p.name)).collect(),
        values: sold.iter().map(|p| f64::from(p.sold)).collect(),
        has_data: !sold.is_empty(),
    }
}

pub fn category_series(rows: &[CategoryBestSeller]) -> CategorySeries {
    let mut series = CategorySeries::default();
    for row in rows {
        let label = if row.name.trim().is_empty() {
            "Unknown".to_string()
        } else {
            row.name.clone()
        };
        series.labels.push(label);
        series.counts.push(row.count);
        series.amounts.push(row.amount);
    }
    series
}

/// Years offered by the year selector; the current year when there are none.
pub fn years_or_current(years: Vec<i32>, today: NaiveDate) -> Vec<i32> {
    if years.is_empty() {
        vec![today.year()]
    } else {
        years
    }
}
