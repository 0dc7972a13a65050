use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A monetary amount as the backend sends it: either a plain number or a
/// formatted string such as `"Ksh 12,345"`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(untagged)]
pub enum MoneyValue {
    #[schemars(description = "Amount already encoded as a JSON number")]
    Number(f64),

    #[schemars(
        description = "Amount encoded as display text; currency symbols and separators are stripped before use"
    )]
    Text(String),
}

impl Default for MoneyValue {
    fn default() -> Self {
        Self::Number(0.0)
    }
}

impl From<f64> for MoneyValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for MoneyValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for MoneyValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl MoneyValue {
    /// True for a text amount with nothing in it.
    pub fn is_blank(&self) -> bool {
        matches!(self, MoneyValue::Text(text) if text.trim().is_empty())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum FinanceStatus {
    #[schemars(description = "Finance amount not yet settled by the financer")]
    Pending,

    #[schemars(description = "Finance amount settled by the financer")]
    Paid,

    #[serde(other)]
    #[schemars(description = "Any status the engine does not count")]
    Other,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FinanceDetails {
    #[serde(default)]
    #[schemars(description = "Name of the financer backing the sale, null when paid in full")]
    pub financer: Option<String>,

    #[serde(default)]
    pub finance_status: Option<FinanceStatus>,

    #[serde(default, deserialize_with = "lenient::amount")]
    #[schemars(description = "Amount financed on this transaction line")]
    pub finance_amount: f64,
}

/// One transaction line as returned by the sales endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RawSaleRecord {
    #[serde(default, deserialize_with = "lenient::money")]
    pub sold_price: MoneyValue,

    #[serde(default, deserialize_with = "lenient::amount")]
    pub net_profit: f64,

    #[serde(default, deserialize_with = "lenient::amount")]
    pub commission: f64,

    #[serde(default, deserialize_with = "lenient::money")]
    pub product_cost: MoneyValue,

    #[serde(default)]
    pub product_name: Option<String>,

    #[serde(default)]
    pub product_model: Option<String>,

    #[serde(default)]
    pub category: Option<String>,

    #[serde(default, deserialize_with = "lenient::units")]
    #[schemars(description = "Number of units this line represents")]
    pub total_transaction_units: u32,

    #[serde(default)]
    pub finance_details: Option<FinanceDetails>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub seller_name: Option<String>,

    #[serde(default)]
    pub shop_name: Option<String>,
}

impl RawSaleRecord {
    /// Financer name, if the sale has one. A missing finance object and a
    /// null financer are the same thing.
    pub fn financer(&self) -> Option<&str> {
        self.finance_details
            .as_ref()
            .and_then(|details| details.financer.as_deref())
    }

    pub fn finance_status(&self) -> Option<FinanceStatus> {
        self.finance_details
            .as_ref()
            .and_then(|details| details.finance_status)
    }

    pub fn finance_amount(&self) -> f64 {
        self.finance_details
            .as_ref()
            .map(|details| details.finance_amount)
            .unwrap_or(0.0)
    }
}

/// Field decoders that never fail a record. A null, a value of the wrong
/// type or unreadable text becomes zero instead of rejecting the batch.
mod lenient {
    use super::MoneyValue;
    use crate::normalize::normalize_text;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn money<'de, D>(deserializer: D) -> Result<MoneyValue, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Number(n) => MoneyValue::Number(n.as_f64().unwrap_or(0.0)),
            Value::String(text) => MoneyValue::Text(text),
            _ => MoneyValue::default(),
        })
    }

    pub fn amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Number(n) => n.as_f64().unwrap_or(0.0),
            Value::String(text) => normalize_text(&text),
            _ => 0.0,
        })
    }

    pub fn units<'de, D>(deserializer: D) -> Result<u32, D::Error>
    where
        D: Deserializer<'de>,
    {
        let count = match Value::deserialize(deserializer)? {
            Value::Number(n) => n.as_f64().unwrap_or(0.0),
            Value::String(text) => normalize_text(&text),
            _ => 0.0,
        };

        // `as` saturates, so negative and NaN counts become 0
        Ok(count.trunc() as u32)
    }
}

/// Aggregates the backend computes over the full filtered set, not just the
/// page that was returned.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServerTotals {
    #[serde(default)]
    pub total_sales: Option<MoneyValue>,

    #[serde(default)]
    pub total_profit: Option<MoneyValue>,

    #[serde(default)]
    pub total_commission: Option<MoneyValue>,

    #[serde(default)]
    pub total_pending_finance_amount: Option<MoneyValue>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            current_page: 1,
            total_pages: 1,
        }
    }
}

/// A fetched batch: the records of one page plus the server's view of the
/// whole filtered set.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalesPage {
    pub records: Vec<RawSaleRecord>,
    pub totals: ServerTotals,
    pub pagination: Pagination,
}

impl SalesPage {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(SalesPage)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}
