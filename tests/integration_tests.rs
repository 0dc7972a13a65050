use chrono::{DateTime, Duration, TimeZone, Utc};
use futures::future::{BoxFuture, FutureExt};
use sales_analytics::*;
use std::time::Duration as StdDuration;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
}

fn financed(financer: &str, status: FinanceStatus, amount: f64) -> Option<FinanceDetails> {
    Some(FinanceDetails {
        financer: Some(financer.to_string()),
        finance_status: Some(status),
        finance_amount: amount,
    })
}

fn scenario_records() -> Vec<RawSaleRecord> {
    vec![
        RawSaleRecord {
            sold_price: MoneyValue::from("10,000"),
            total_transaction_units: 1,
            category: Some("Phones".to_string()),
            finance_details: financed("BankX", FinanceStatus::Pending, 8000.0),
            ..RawSaleRecord::default()
        },
        RawSaleRecord {
            sold_price: MoneyValue::Number(5000.0),
            total_transaction_units: 2,
            category: Some("Phones".to_string()),
            finance_details: None,
            ..RawSaleRecord::default()
        },
        RawSaleRecord {
            sold_price: MoneyValue::from("2,500"),
            total_transaction_units: 1,
            category: None,
            finance_details: financed("BankX", FinanceStatus::Paid, 2000.0),
            ..RawSaleRecord::default()
        },
    ]
}

/// A mixed batch a real shop would produce over a few days.
fn shop_records() -> Vec<RawSaleRecord> {
    let products = [
        (Some("Galaxy A15"), Some("SM-A155"), Some("Phones"), "Ksh 18,999"),
        (None, None, Some("Accessories"), "1,200"),
        (Some("Redmi 13C"), Some("23100RN82L"), Some("Phones"), "13,500"),
        (Some("Galaxy A15"), Some("SM-A155F"), Some("Phones"), "Ksh 18,999"),
        (Some("JBL Go 3"), None, None, "--"),
        (None, None, None, "450"),
    ];

    products
        .iter()
        .enumerate()
        .map(|(i, (name, model, category, price))| RawSaleRecord {
            sold_price: MoneyValue::from(*price),
            net_profit: 500.0 * i as f64,
            commission: 100.0,
            product_cost: MoneyValue::from("Ksh 1,000"),
            product_name: name.map(str::to_string),
            product_model: model.map(str::to_string),
            category: category.map(str::to_string),
            total_transaction_units: (i % 3) as u32,
            finance_details: match i % 3 {
                0 => financed("Watu", FinanceStatus::Pending, 12000.0),
                1 => financed("M-Kopa", FinanceStatus::Paid, 800.0),
                _ => None,
            },
            created_at: Some(now() - Duration::hours(20 * i as i64)),
            seller_name: Some("Amina".to_string()),
            shop_name: Some("Moi Avenue".to_string()),
        })
        .collect()
}

#[test]
fn test_normalizer_examples() {
    assert_eq!(normalize_numeric(&MoneyValue::from("Ksh 12,345")), 12345.0);
    assert_eq!(normalize_numeric(&MoneyValue::Number(12345.0)), 12345.0);
    assert_eq!(normalize_numeric(&MoneyValue::from("")), 0.0);
    assert_eq!(normalize_numeric(&MoneyValue::from("--")), 0.0);
}

#[test]
fn test_three_record_scenario() {
    let report = Report::assemble(scenario_records(), &ServerTotals::default(), Pagination::default());

    assert_eq!(report.by_category.len(), 2);
    assert_eq!(report.by_category[0].name, "Phones");
    assert_eq!(report.by_category[0].total_sales, 15000.0);
    assert_eq!(report.by_category[0].total_units, 3);
    assert_eq!(report.by_category[1].name, "Unknown");
    assert_eq!(report.by_category[1].total_sales, 2500.0);
    assert_eq!(report.by_category[1].total_units, 1);

    assert_eq!(report.by_financer.len(), 2);
    let bank = &report.by_financer[0];
    assert_eq!(bank.metric.name, "BankX");
    assert_eq!(bank.metric.total_sales, 12500.0);
    assert_eq!(bank.transaction_count, 2);
    assert_eq!(bank.pending_count, 1);
    assert_eq!(bank.paid_count, 1);
    assert_eq!(bank.total_finance_amount, 10000.0);

    let none = &report.by_financer[1];
    assert_eq!(none.metric.name, "None");
    assert_eq!(none.metric.total_sales, 5000.0);
    assert_eq!(none.transaction_count, 1);
    assert_eq!(none.pending_count, 0);
    assert_eq!(none.paid_count, 0);

    assert_eq!(report.summary.total_sales, 17500.0);
    assert_eq!(report.summary.total_units, 4);
    assert_eq!(report.summary.average_ticket_size, 4375.0);
}

#[test]
fn test_every_dimension_is_a_lossless_partition() {
    let records = shop_records();
    let expected: f64 = records.iter().map(|r| normalize_numeric(&r.sold_price)).sum();
    let expected_units: u64 = records.iter().map(|r| u64::from(r.total_transaction_units)).sum();

    let report = Report::assemble(records.clone(), &ServerTotals::default(), Pagination::default());

    let product_sales: f64 = report.by_product.iter().map(|p| p.metric.total_sales).sum();
    let category_sales: f64 = report.by_category.iter().map(|c| c.total_sales).sum();
    let financer_sales: f64 = report.by_financer.iter().map(|f| f.metric.total_sales).sum();
    assert_eq!(product_sales, expected);
    assert_eq!(category_sales, expected);
    assert_eq!(financer_sales, expected);

    let category_units: u64 = report.by_category.iter().map(|c| c.total_units).sum();
    assert_eq!(category_units, expected_units);

    let transactions: u64 = report.by_financer.iter().map(|f| f.transaction_count).sum();
    assert_eq!(transactions, records.len() as u64);

    let shares: f64 = report.by_category.iter().map(|c| c.sales_share).sum();
    assert!((shares - 100.0).abs() < 1e-9);
}

#[test]
fn test_buckets_keep_first_seen_order() {
    let report = Report::assemble(shop_records(), &ServerTotals::default(), Pagination::default());

    let products: Vec<&str> = report.by_product.iter().map(|p| p.metric.name.as_str()).collect();
    assert_eq!(products, vec!["Galaxy A15", "Accessory", "Redmi 13C", "JBL Go 3"]);
    assert_eq!(report.by_product[0].product_model.as_deref(), Some("SM-A155"));
    assert_eq!(report.by_product[0].metric.total_sales, 37998.0);

    let categories: Vec<&str> = report.by_category.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(categories, vec!["Phones", "Accessories", "Unknown"]);

    let financers: Vec<&str> = report.by_financer.iter().map(|f| f.metric.name.as_str()).collect();
    assert_eq!(financers, vec!["Watu", "M-Kopa", "None"]);

    let top = report.top_products(2);
    assert_eq!(top[0].metric.name, "Galaxy A15");
    assert_eq!(top[1].metric.name, "Redmi 13C");
}

#[test]
fn test_empty_batch() {
    let summary = compute_summary(&[], &ServerTotals::default());
    assert_eq!(summary.total_sales, 0.0);
    assert_eq!(summary.total_units, 0);
    assert_eq!(summary.average_ticket_size, 0.0);

    let report = Report::assemble(Vec::new(), &ServerTotals::default(), Pagination::default());
    assert!(report.by_product.is_empty());
    assert!(report.by_category.is_empty());
    assert!(report.by_financer.is_empty());
    assert_eq!(report.summary, BatchSummary::default());
}

#[test]
fn test_resolve_filter_contract() {
    let err = resolve_filter(&FilterState::new(TimeFrame::Custom)).unwrap_err();
    assert!(matches!(err, SalesAnalyticsError::MissingCustomDate));

    let day = resolve_filter(&FilterState::new(TimeFrame::Day)).unwrap();
    assert_eq!(day.query_time_frame, TimeFrame::Day);
    assert_eq!(day.query_date, None);
    assert_eq!(day.display_label, "today");
}

#[test]
fn test_backend_response_to_markdown() -> anyhow::Result<()> {
    let json = r#"{
        "sales": [
            {"soldPrice": "Ksh 18,999", "netProfit": 2100, "commission": 300,
             "productName": "Galaxy A15", "productModel": "SM-A155", "category": "Phones",
             "totalTransactionUnits": 1,
             "financeDetails": {"financer": "Watu", "financeStatus": "pending", "financeAmount": 15000},
             "createdAt": "2024-06-15T08:00:00Z", "sellerName": "Amina", "shopName": "Moi Avenue"}
        ],
        "totalSales": "Ksh 120,000",
        "totalProfit": 14000,
        "totalCommission": "2,400",
        "totalPendingFinanceAmount": 45000,
        "currentPage": 1,
        "totalPages": 6
    }"#;

    let report = process_sales_response(json, &AnalyticsConfig::default())?;
    assert_eq!(report.summary.total_sales, 120000.0);
    assert_eq!(report.summary.total_profit, 14000.0);
    assert_eq!(report.summary.total_commission, 2400.0);
    assert_eq!(report.summary.total_pending_finance_amount, 45000.0);
    assert_eq!(report.pagination.total_pages, 6);
    // Buckets only cover the page on hand
    assert_eq!(report.by_product[0].metric.total_sales, 18999.0);

    let markdown = report.to_markdown("the past week");
    assert!(markdown.contains("# Sales for the past week"));
    assert!(markdown.contains("| Galaxy A15 | SM-A155 | 18999.00 | 1 | 2100.00 |"));
    assert!(markdown.contains("_Page 1 of 6_"));

    Ok(())
}

#[test]
fn test_null_and_text_numbers_count_as_values() -> anyhow::Result<()> {
    let json = r#"{
        "sales": [
            {"soldPrice": 1, "netProfit": null, "productName": "Cable", "totalTransactionUnits": 1},
            {"soldPrice": null, "netProfit": "1,500", "productName": "Cable", "totalTransactionUnits": "3"},
            {"soldPrice": "Ksh 2,000", "commission": null, "productName": "Charger", "totalTransactionUnits": null,
             "financeDetails": {"financer": "Watu", "financeStatus": "paid", "financeAmount": null}}
        ]
    }"#;

    let report = process_sales_response(json, &AnalyticsConfig::default())?;
    assert_eq!(report.records.len(), 3);
    assert_eq!(report.summary.total_sales, 2001.0);
    assert_eq!(report.summary.total_units, 4);

    let cable = &report.by_product[0].metric;
    assert_eq!(cable.name, "Cable");
    assert_eq!((cable.total_sales, cable.total_units, cable.total_profit), (1.0, 4, 1500.0));

    let watu = &report.by_financer[1];
    assert_eq!(watu.metric.name, "Watu");
    assert_eq!((watu.total_finance_amount, watu.paid_count), (0.0, 1));

    Ok(())
}

#[tokio::test]
async fn test_session_refresh_with_in_memory_source() -> anyhow::Result<()> {
    let session = ReportSession::new(AnalyticsConfig {
        page_size: 4,
        ..AnalyticsConfig::default()
    });
    let source = InMemorySalesSource::with_now(shop_records(), now());

    let filter = FilterState::new(TimeFrame::Week);
    let outcome = session.refresh(&source, &filter, 1).await?;
    let accepted = match outcome {
        Outcome::Accepted(accepted) => accepted,
        other => panic!("expected an accepted report, got {:?}", other),
    };

    assert_eq!(accepted.report.records.len(), 4);
    assert_eq!(accepted.report.pagination, Pagination { current_page: 1, total_pages: 2 });
    // Server totals cover both pages
    assert_eq!(accepted.report.summary.total_sales, 18999.0 + 1200.0 + 13500.0 + 18999.0 + 450.0);
    assert_eq!(accepted.resolved.display_label, "the past week");

    let watu = filter.clone().with_financer("Watu");
    let outcome = session.refresh(&source, &watu, 1).await?;
    assert!(matches!(outcome, Outcome::Accepted(_)));

    let latest = session.latest().expect("report accepted");
    assert!(latest.is_current_for(&watu));
    assert!(!latest.is_current_for(&filter));
    assert_eq!(latest.report.by_financer.len(), 1);
    assert_eq!(latest.report.by_financer[0].metric.name, "Watu");

    Ok(())
}

#[tokio::test]
async fn test_session_failure_and_bad_filter() -> anyhow::Result<()> {
    let session = ReportSession::default();
    let source = InMemorySalesSource::with_now(shop_records(), now());

    session.refresh(&source, &FilterState::new(TimeFrame::Year), 1).await?;
    let before = session.latest().expect("report accepted");

    let outcome = session.refresh(&source, &FilterState::new(TimeFrame::Year), 9).await?;
    match outcome {
        Outcome::Failed(err) => assert_eq!(err.severity(), FetchSeverity::NotFound),
        other => panic!("expected a failure, got {:?}", other),
    }
    assert_eq!(session.latest().expect("report kept").token, before.token);

    let result = session
        .refresh(&source, &FilterState::new(TimeFrame::Custom), 1)
        .await;
    assert!(matches!(result, Err(SalesAnalyticsError::MissingCustomDate)));

    Ok(())
}

/// Answers day requests slowly and everything else at once.
struct SlowDaySource {
    inner: InMemorySalesSource,
}

impl SalesDataSource for SlowDaySource {
    fn fetch<'a>(
        &'a self,
        request: &'a FetchRequest,
    ) -> BoxFuture<'a, std::result::Result<SalesPage, FetchError>> {
        async move {
            if request.filter.query_time_frame == TimeFrame::Day {
                tokio::time::sleep(StdDuration::from_millis(100)).await;
            }
            self.inner.query(request)
        }
        .boxed()
    }
}

#[tokio::test]
async fn test_late_response_does_not_overwrite_newer_report() -> anyhow::Result<()> {
    let session = ReportSession::default();
    let source = SlowDaySource {
        inner: InMemorySalesSource::with_now(shop_records(), now()),
    };

    let day = FilterState::new(TimeFrame::Day);
    let year = FilterState::new(TimeFrame::Year);

    let (slow, fast) = tokio::join!(session.refresh(&source, &day, 1), async {
        tokio::time::sleep(StdDuration::from_millis(10)).await;
        session.refresh(&source, &year, 1).await
    });

    assert!(matches!(fast?, Outcome::Accepted(_)));
    assert!(matches!(slow?, Outcome::Stale(_)));

    let latest = session.latest().expect("report accepted");
    assert!(latest.is_current_for(&year));
    assert_eq!(latest.report.records.len(), shop_records().len());

    Ok(())
}
