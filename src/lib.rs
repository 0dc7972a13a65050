//! # Sales Analytics
//!
//! The aggregation engine behind the back-office sales dashboard. It takes a
//! batch of raw sale records as the backend returns them and turns it into
//! the figures the sales page shows.
//!
//! ## Core Concepts
//!
//! - **Normalization**: amounts may arrive as numbers or as display strings
//!   like `"Ksh 12,345"`; [`normalize_numeric`] is the only place they are coerced
//! - **Dimensions**: records are grouped by product, category and financer, each
//!   bucket keeping first-seen order and every record landing in exactly one bucket
//! - **Summary**: batch KPIs prefer the server's totals, which cover every page of
//!   the filtered set
//! - **Filters**: a [`FilterState`] resolves to data-source parameters and a label
//! - **Sessions**: [`ReportSession`] keeps only the newest fetch's report
//!
//! ## Example
//!
//! ```rust,ignore
//! use sales_analytics::*;
//!
//! let json = r#"{
//!     "sales": [
//!         {"soldPrice": "10,000", "totalTransactionUnits": 1, "category": "Phones"},
//!         {"soldPrice": 5000, "totalTransactionUnits": 2, "category": "Phones"}
//!     ],
//!     "currentPage": 1,
//!     "totalPages": 1
//! }"#;
//!
//! let report = process_sales_response(json, &AnalyticsConfig::default()).unwrap();
//! assert_eq!(report.by_category[0].total_sales, 15000.0);
//! ```

pub mod config;
pub mod error;
pub mod filter;
pub mod grouping;
pub mod ingestion;
pub mod metrics;
pub mod normalize;
pub mod report;
pub mod schema;
pub mod session;
pub mod source;
pub mod summary;

pub use config::{AnalyticsConfig, DimensionLabels};
pub use error::{Result, SalesAnalyticsError};
pub use filter::{resolve_filter, FilterState, ResolvedFilter, TimeFrame};
pub use grouping::{group_by, OrderedGroups};
pub use ingestion::{parse_failure, parse_sales_page};
pub use metrics::{
    aggregate_categories, aggregate_financers, aggregate_products, apply_sales_shares, top_n,
    DimensionMetric, DimensionRow, FinancerMetric, ProductMetric,
};
pub use normalize::normalize_numeric;
pub use report::Report;
pub use schema::*;
pub use session::{AcceptedReport, Outcome, ReportSession, RequestToken};
pub use source::{FetchError, FetchRequest, FetchSeverity, InMemorySalesSource, SalesDataSource};
pub use summary::{compute_summary, BatchSummary};

use log::info;

/// Decodes a sales response body and assembles its report.
pub fn process_sales_response(json: &str, config: &AnalyticsConfig) -> Result<Report> {
    config.validate()?;

    let page = parse_sales_page(json)?;
    let report = Report::from_page(page, config);

    info!(
        "Processed sales page {} of {}: {} records, total sales {:.2}",
        report.pagination.current_page,
        report.pagination.total_pages,
        report.records.len(),
        report.summary.total_sales
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_to_end_processing() {
        let json = r#"{
            "sales": [
                {
                    "soldPrice": "10,000",
                    "totalTransactionUnits": 1,
                    "category": "Phones",
                    "financeDetails": {"financer": "BankX", "financeStatus": "pending", "financeAmount": 7000}
                },
                {
                    "soldPrice": 5000,
                    "totalTransactionUnits": 2,
                    "category": "Phones",
                    "financeDetails": {"financer": null, "financeStatus": null, "financeAmount": 0}
                },
                {
                    "soldPrice": "2,500",
                    "totalTransactionUnits": 1,
                    "financeDetails": {"financer": "BankX", "financeStatus": "paid", "financeAmount": 2000}
                }
            ]
        }"#;

        let report = process_sales_response(json, &AnalyticsConfig::default()).unwrap();

        let categories: Vec<(&str, f64, u64)> = report
            .by_category
            .iter()
            .map(|c| (c.name.as_str(), c.total_sales, c.total_units))
            .collect();
        assert_eq!(categories, vec![("Phones", 15000.0, 3), ("Unknown", 2500.0, 1)]);

        let bank = &report.by_financer[0];
        assert_eq!(bank.metric.name, "BankX");
        assert_eq!(bank.metric.total_sales, 12500.0);
        assert_eq!(
            (bank.transaction_count, bank.pending_count, bank.paid_count),
            (2, 1, 1)
        );

        let none = &report.by_financer[1];
        assert_eq!(none.metric.name, "None");
        assert_eq!(none.metric.total_sales, 5000.0);
        assert_eq!(
            (none.transaction_count, none.pending_count, none.paid_count),
            (1, 0, 0)
        );

        assert_eq!(report.summary.average_ticket_size, 4375.0);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = AnalyticsConfig {
            page_size: 0,
            ..AnalyticsConfig::default()
        };
        let result = process_sales_response(r#"{"sales": []}"#, &config);
        assert!(matches!(result, Err(SalesAnalyticsError::InvalidConfig(_))));
    }
}
