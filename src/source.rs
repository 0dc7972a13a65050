use crate::error::{Result, SalesAnalyticsError};
use crate::filter::ResolvedFilter;
use crate::normalize::normalize_numeric;
use crate::schema::{FinanceStatus, MoneyValue, Pagination, RawSaleRecord, SalesPage, ServerTotals};
use chrono::{DateTime, Utc};
use futures::future::{self, BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One page request against the sales endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub filter: ResolvedFilter,
    pub page: u32,
    pub page_size: u32,
}

impl FetchRequest {
    pub fn new(filter: ResolvedFilter, page: u32, page_size: u32) -> Result<Self> {
        if page == 0 {
            return Err(SalesAnalyticsError::InvalidFilter(
                "pages are numbered from 1".to_string(),
            ));
        }
        if page_size == 0 {
            return Err(SalesAnalyticsError::InvalidFilter(
                "page size must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            filter,
            page,
            page_size,
        })
    }

    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = self.filter.query_params();
        params.push(("page", self.page.to_string()));
        params.push(("limit", self.page_size.to_string()));
        params
    }
}

/// How a failed fetch should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetchSeverity {
    NotFound,
    ServerError,
    Error,
}

/// A failed fetch as the backend reported it. The message and status are
/// kept exactly as received.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{message}")]
pub struct FetchError {
    pub message: String,
    pub status: Option<u16>,
}

impl FetchError {
    pub fn new(message: impl Into<String>, status: Option<u16>) -> Self {
        Self {
            message: message.into(),
            status,
        }
    }

    pub fn severity(&self) -> FetchSeverity {
        match self.status {
            Some(404) => FetchSeverity::NotFound,
            Some(status) if status >= 500 => FetchSeverity::ServerError,
            _ => FetchSeverity::Error,
        }
    }
}

/// Anything that can return a page of sales for a filter.
pub trait SalesDataSource: Send + Sync {
    fn fetch<'a>(
        &'a self,
        request: &'a FetchRequest,
    ) -> BoxFuture<'a, std::result::Result<SalesPage, FetchError>>;
}

/// A data source over records already held in memory.
///
/// Filters by creation time and financer, computes totals over the whole
/// filtered set and then cuts out the requested page, the same way the
/// backend does.
#[derive(Debug, Clone)]
pub struct InMemorySalesSource {
    records: Vec<RawSaleRecord>,
    now: DateTime<Utc>,
}

impl InMemorySalesSource {
    pub fn new(records: Vec<RawSaleRecord>) -> Self {
        Self::with_now(records, Utc::now())
    }

    pub fn with_now(records: Vec<RawSaleRecord>, now: DateTime<Utc>) -> Self {
        Self { records, now }
    }

    pub fn query(&self, request: &FetchRequest) -> std::result::Result<SalesPage, FetchError> {
        let (start, end) = request.filter.window(self.now);
        let financer = request.filter.financer_query_param.as_deref();

        let matching: Vec<&RawSaleRecord> = self
            .records
            .iter()
            .filter(|r| {
                r.created_at
                    .map(|at| at >= start && at < end)
                    .unwrap_or(false)
            })
            .filter(|r| financer.map_or(true, |name| r.financer() == Some(name)))
            .collect();

        let totals = totals_of(&matching);

        let page_size = request.page_size as usize;
        let total_pages = matching.len().div_ceil(page_size).max(1) as u32;
        if request.page > total_pages {
            return Err(FetchError::new(
                format!("Page {} not found", request.page),
                Some(404),
            ));
        }

        let offset = (request.page as usize - 1) * page_size;
        let records = matching
            .into_iter()
            .skip(offset)
            .take(page_size)
            .cloned()
            .collect();

        Ok(SalesPage {
            records,
            totals,
            pagination: Pagination {
                current_page: request.page,
                total_pages,
            },
        })
    }
}

impl SalesDataSource for InMemorySalesSource {
    fn fetch<'a>(
        &'a self,
        request: &'a FetchRequest,
    ) -> BoxFuture<'a, std::result::Result<SalesPage, FetchError>> {
        future::ready(self.query(request)).boxed()
    }
}

fn totals_of(records: &[&RawSaleRecord]) -> ServerTotals {
    let mut sales = 0.0;
    let mut profit = 0.0;
    let mut commission = 0.0;
    let mut pending = 0.0;

    for record in records {
        sales += normalize_numeric(&record.sold_price);
        profit += record.net_profit;
        commission += record.commission;
        if record.finance_status() == Some(FinanceStatus::Pending) {
            pending += record.finance_amount();
        }
    }

    ServerTotals {
        total_sales: Some(MoneyValue::Number(sales)),
        total_profit: Some(MoneyValue::Number(profit)),
        total_commission: Some(MoneyValue::Number(commission)),
        total_pending_finance_amount: Some(MoneyValue::Number(pending)),
    }
}
