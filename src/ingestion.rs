use crate::error::Result;
use crate::schema::{MoneyValue, Pagination, RawSaleRecord, SalesPage, ServerTotals};
use crate::source::FetchError;
use log::debug;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SalesEnvelope {
    #[serde(default)]
    sales: Vec<RawSaleRecord>,
    #[serde(default)]
    total_sales: Option<MoneyValue>,
    #[serde(default)]
    total_profit: Option<MoneyValue>,
    #[serde(default)]
    total_commission: Option<MoneyValue>,
    #[serde(default)]
    total_pending_finance_amount: Option<MoneyValue>,
    #[serde(default)]
    current_page: Option<u32>,
    #[serde(default)]
    total_pages: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Decodes the body of a successful sales response.
pub fn parse_sales_page(json: &str) -> Result<SalesPage> {
    let envelope: SalesEnvelope = serde_json::from_str(json)?;
    let defaults = Pagination::default();

    debug!("Decoded sales response with {} records", envelope.sales.len());

    Ok(SalesPage {
        records: envelope.sales,
        totals: ServerTotals {
            total_sales: envelope.total_sales,
            total_profit: envelope.total_profit,
            total_commission: envelope.total_commission,
            total_pending_finance_amount: envelope.total_pending_finance_amount,
        },
        pagination: Pagination {
            current_page: envelope.current_page.unwrap_or(defaults.current_page),
            total_pages: envelope.total_pages.unwrap_or(defaults.total_pages),
        },
    })
}

/// Turns an error response into a [`FetchError`], keeping the server's
/// message when the body carries one and the raw body otherwise.
pub fn parse_failure(body: &str, status: Option<u16>) -> FetchError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or_else(|| body.to_string());

    FetchError::new(message, status)
}
