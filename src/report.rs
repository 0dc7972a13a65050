use crate::config::{AnalyticsConfig, DimensionLabels};
use crate::metrics::{
    aggregate_categories, aggregate_financers, aggregate_products, top_n, DimensionMetric,
    FinancerMetric, ProductMetric,
};
use crate::schema::{Pagination, RawSaleRecord, SalesPage, ServerTotals};
use crate::summary::{compute_summary, BatchSummary};
use log::{debug, info};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Everything the sales page shows for one fetch.
///
/// A report is built once per successful fetch and replaced, never patched,
/// when the filter or page changes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub summary: BatchSummary,
    pub by_product: Vec<ProductMetric>,
    pub by_category: Vec<DimensionMetric>,
    pub by_financer: Vec<FinancerMetric>,
    pub records: Vec<RawSaleRecord>,
    pub pagination: Pagination,
}

impl Report {
    /// Builds a report with the default fallback labels.
    pub fn assemble(
        records: Vec<RawSaleRecord>,
        totals: &ServerTotals,
        pagination: Pagination,
    ) -> Self {
        Self::assemble_with_labels(records, totals, pagination, &DimensionLabels::default())
    }

    pub fn from_page(page: SalesPage, config: &AnalyticsConfig) -> Self {
        Self::assemble_with_labels(page.records, &page.totals, page.pagination, &config.labels)
    }

    /// Runs the three groupings and the summary over the same batch and
    /// combines them. Pagination is the server's and passes through as is.
    pub fn assemble_with_labels(
        records: Vec<RawSaleRecord>,
        totals: &ServerTotals,
        pagination: Pagination,
        labels: &DimensionLabels,
    ) -> Self {
        if records.is_empty() {
            info!(
                "Assembling report for an empty batch (page {} of {})",
                pagination.current_page, pagination.total_pages
            );
        }

        let by_product = aggregate_products(&records, &labels.product);
        let by_category = aggregate_categories(&records, &labels.category);
        let by_financer = aggregate_financers(&records, &labels.financer);
        let summary = compute_summary(&records, totals);

        debug!(
            "Report contains {} records in {} products, {} categories and {} financers",
            records.len(),
            by_product.len(),
            by_category.len(),
            by_financer.len()
        );

        Self {
            summary,
            by_product,
            by_category,
            by_financer,
            records,
            pagination,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn top_products(&self, n: usize) -> Vec<ProductMetric> {
        top_n(&self.by_product, n)
    }

    pub fn top_categories(&self, n: usize) -> Vec<DimensionMetric> {
        top_n(&self.by_category, n)
    }

    pub fn top_financers(&self, n: usize) -> Vec<FinancerMetric> {
        top_n(&self.by_financer, n)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_csv(&self) -> String {
        let mut output = String::new();
        output.push_str("Dimension,Name,Total Sales,Total Units,Total Profit,Sales Share\n");

        for product in &self.by_product {
            output.push_str(&csv_row("Product", &product.metric));
        }

        for category in &self.by_category {
            output.push_str(&csv_row("Category", category));
        }

        for financer in &self.by_financer {
            output.push_str(&csv_row("Financer", &financer.metric));
        }

        output
    }

    pub fn to_markdown(&self, period_label: &str) -> String {
        let mut output = String::new();
        let summary = &self.summary;

        output.push_str(&format!("# Sales for {}\n\n", period_label));

        output.push_str("| KPI | Value |\n|---|---|\n");
        output.push_str(&format!("| Total Sales | {:.2} |\n", summary.total_sales));
        output.push_str(&format!("| Units Sold | {} |\n", summary.total_units));
        output.push_str(&format!("| Net Profit | {:.2} |\n", summary.total_profit));
        output.push_str(&format!("| Commission | {:.2} |\n", summary.total_commission));
        output.push_str(&format!(
            "| Pending Finance | {:.2} |\n",
            summary.total_pending_finance_amount
        ));
        output.push_str(&format!(
            "| Average Ticket | {:.2} |\n\n",
            summary.average_ticket_size
        ));

        output.push_str("## By Product\n\n");
        output.push_str("| Product | Model | Sales | Units | Profit |\n|---|---|---|---|---|\n");
        for product in &self.by_product {
            output.push_str(&format!(
                "| {} | {} | {:.2} | {} | {:.2} |\n",
                product.metric.name,
                product.product_model.as_deref().unwrap_or("-"),
                product.metric.total_sales,
                product.metric.total_units,
                product.metric.total_profit
            ));
        }
        output.push('\n');

        output.push_str("## By Category\n\n");
        output.push_str("| Category | Sales | Units | Share |\n|---|---|---|---|\n");
        for category in &self.by_category {
            output.push_str(&format!(
                "| {} | {:.2} | {} | {:.1}% |\n",
                category.name, category.total_sales, category.total_units, category.sales_share
            ));
        }
        output.push('\n');

        output.push_str("## By Financer\n\n");
        output.push_str(
            "| Financer | Sales | Financed | Transactions | Pending | Paid |\n|---|---|---|---|---|---|\n",
        );
        for financer in &self.by_financer {
            output.push_str(&format!(
                "| {} | {:.2} | {:.2} | {} | {} | {} |\n",
                financer.metric.name,
                financer.metric.total_sales,
                financer.total_finance_amount,
                financer.transaction_count,
                financer.pending_count,
                financer.paid_count
            ));
        }
        output.push('\n');

        output.push_str(&format!(
            "_Page {} of {}_\n",
            self.pagination.current_page, self.pagination.total_pages
        ));

        output
    }
}

fn csv_row(dimension: &str, metric: &DimensionMetric) -> String {
    format!(
        "{},{},{:.2},{},{:.2},{:.2}\n",
        dimension,
        csv_field(&metric.name),
        metric.total_sales,
        metric.total_units,
        metric.total_profit,
        metric.sales_share
    )
}

fn csv_field(value: &str) -> String {
    if value.contains(&[',', '"', '\n'][..]) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
