use crate::normalize::{normalize_numeric, normalize_optional};
use crate::schema::{RawSaleRecord, ServerTotals};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub total_sales: f64,
    pub total_units: u64,
    pub total_profit: f64,
    pub total_commission: f64,
    pub total_pending_finance_amount: f64,
    #[schemars(description = "Revenue per unit sold, zero when no units were sold")]
    pub average_ticket_size: f64,
    #[schemars(description = "Profit as a percentage of sales, zero when there were no sales")]
    pub profit_margin: f64,
}

impl BatchSummary {
    pub fn is_empty(&self) -> bool {
        self.total_units == 0 && self.total_sales == 0.0
    }
}

/// Batch-level KPIs.
///
/// Units are always counted from the records on hand. Sales prefer the
/// server's figure because it covers every page of the filtered set, and only
/// fall back to the local records when the server sent none. Profit,
/// commission and pending finance only ever come from the server; summing
/// them from one page would undercount.
pub fn compute_summary(records: &[RawSaleRecord], totals: &ServerTotals) -> BatchSummary {
    let total_units: u64 = records
        .iter()
        .map(|r| u64::from(r.total_transaction_units))
        .sum();

    let total_sales = normalize_optional(totals.total_sales.as_ref())
        .unwrap_or_else(|| records.iter().map(|r| normalize_numeric(&r.sold_price)).sum());

    let total_profit = normalize_optional(totals.total_profit.as_ref()).unwrap_or(0.0);
    let total_commission = normalize_optional(totals.total_commission.as_ref()).unwrap_or(0.0);
    let total_pending_finance_amount =
        normalize_optional(totals.total_pending_finance_amount.as_ref()).unwrap_or(0.0);

    let average_ticket_size = if total_units > 0 {
        total_sales / total_units as f64
    } else {
        0.0
    };

    let profit_margin = if total_sales != 0.0 {
        total_profit / total_sales * 100.0
    } else {
        0.0
    };

    BatchSummary {
        total_sales,
        total_units,
        total_profit,
        total_commission,
        total_pending_finance_amount,
        average_ticket_size,
        profit_margin,
    }
}
