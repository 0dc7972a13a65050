use crate::grouping::group_by;
use crate::normalize::normalize_numeric;
use crate::schema::{FinanceStatus, RawSaleRecord};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Totals for one bucket of a dimension.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DimensionMetric {
    #[schemars(description = "Dimension key as displayed, or the fallback label")]
    pub name: String,
    pub total_sales: f64,
    pub total_units: u64,
    pub total_profit: f64,
    #[schemars(description = "Percentage of the dimension's total sales held by this bucket")]
    pub sales_share: f64,
}

impl DimensionMetric {
    fn add_sale(&mut self, record: &RawSaleRecord) {
        self.total_sales += normalize_numeric(&record.sold_price);
        self.total_units += u64::from(record.total_transaction_units);
        self.total_profit += record.net_profit;
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductMetric {
    #[serde(flatten)]
    pub metric: DimensionMetric,
    pub product_model: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FinancerMetric {
    #[serde(flatten)]
    pub metric: DimensionMetric,
    pub total_finance_amount: f64,
    pub transaction_count: u64,
    pub pending_count: u64,
    pub paid_count: u64,
}

/// Access to the shared bucket totals of any dimension row.
pub trait DimensionRow {
    fn metric(&self) -> &DimensionMetric;
    fn metric_mut(&mut self) -> &mut DimensionMetric;
}

impl DimensionRow for DimensionMetric {
    fn metric(&self) -> &DimensionMetric {
        self
    }

    fn metric_mut(&mut self) -> &mut DimensionMetric {
        self
    }
}

impl DimensionRow for ProductMetric {
    fn metric(&self) -> &DimensionMetric {
        &self.metric
    }

    fn metric_mut(&mut self) -> &mut DimensionMetric {
        &mut self.metric
    }
}

impl DimensionRow for FinancerMetric {
    fn metric(&self) -> &DimensionMetric {
        &self.metric
    }

    fn metric_mut(&mut self) -> &mut DimensionMetric {
        &mut self.metric
    }
}

/// Groups by product name. The model and category shown for a product are
/// the first ones any of its records carried.
pub fn aggregate_products(records: &[RawSaleRecord], fallback: &str) -> Vec<ProductMetric> {
    let groups = group_by(
        records,
        |r| r.product_name.clone().unwrap_or_else(|| fallback.to_string()),
        ProductMetric::default,
        |acc, r| {
            acc.metric.add_sale(r);
            if acc.product_model.is_none() {
                acc.product_model = r.product_model.clone();
            }
            if acc.category.is_none() {
                acc.category = r.category.clone();
            }
        },
    );

    finish(groups.into_entries())
}

pub fn aggregate_categories(records: &[RawSaleRecord], fallback: &str) -> Vec<DimensionMetric> {
    let groups = group_by(
        records,
        |r| r.category.clone().unwrap_or_else(|| fallback.to_string()),
        DimensionMetric::default,
        |acc, r| acc.add_sale(r),
    );

    finish(groups.into_entries())
}

/// Groups by financer. Sales without a financer, including those with no
/// finance details at all, share the fallback bucket.
pub fn aggregate_financers(records: &[RawSaleRecord], fallback: &str) -> Vec<FinancerMetric> {
    let groups = group_by(
        records,
        |r| r.financer().unwrap_or(fallback).to_string(),
        FinancerMetric::default,
        |acc, r| {
            acc.metric.add_sale(r);
            acc.total_finance_amount += r.finance_amount();
            acc.transaction_count += 1;
            match r.finance_status() {
                Some(FinanceStatus::Pending) => acc.pending_count += 1,
                Some(FinanceStatus::Paid) => acc.paid_count += 1,
                _ => {}
            }
        },
    );

    finish(groups.into_entries())
}

fn finish<M: DimensionRow>(entries: Vec<(String, M)>) -> Vec<M> {
    let mut rows: Vec<M> = entries
        .into_iter()
        .map(|(name, mut row)| {
            row.metric_mut().name = name;
            row
        })
        .collect();

    apply_sales_shares(&mut rows);
    rows
}

/// Sets each row's share of the summed sales, in percent. All shares are zero
/// when the dimension has no sales.
pub fn apply_sales_shares<M: DimensionRow>(rows: &mut [M]) {
    let total: f64 = rows.iter().map(|r| r.metric().total_sales).sum();

    for row in rows.iter_mut() {
        let metric = row.metric_mut();
        metric.sales_share = if total == 0.0 {
            0.0
        } else {
            metric.total_sales / total * 100.0
        };
    }
}

/// The `n` best-selling rows, highest sales first. Ties keep first-seen order.
pub fn top_n<M: DimensionRow + Clone>(rows: &[M], n: usize) -> Vec<M> {
    let mut sorted = rows.to_vec();
    sorted.sort_by(|a, b| {
        b.metric()
            .total_sales
            .partial_cmp(&a.metric().total_sales)
            .unwrap_or(Ordering::Equal)
    });
    sorted.truncate(n);
    sorted
}

pub fn total_sales_of<M: DimensionRow>(rows: &[M]) -> f64 {
    rows.iter().map(|r| r.metric().total_sales).sum()
}
