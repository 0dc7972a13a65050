use crate::config::AnalyticsConfig;
use crate::error::Result;
use crate::filter::{resolve_filter, FilterState, ResolvedFilter};
use crate::report::Report;
use crate::schema::SalesPage;
use crate::source::{FetchError, FetchRequest, SalesDataSource};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Identifies one fetch. Tokens only ever grow, so the highest issued token
/// is the request whose answer the user is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// A report together with the selection it answers.
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptedReport {
    pub token: RequestToken,
    pub filter: FilterState,
    pub resolved: ResolvedFilter,
    pub report: Report,
}

impl AcceptedReport {
    /// False once the user has changed any part of the selection.
    pub fn is_current_for(&self, filter: &FilterState) -> bool {
        &self.filter == filter
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Accepted(Arc<AcceptedReport>),
    /// A newer request was issued before this one finished; its result was dropped.
    Stale(RequestToken),
    /// The fetch failed. The previously accepted report, if any, is untouched.
    Failed(FetchError),
}

/// Holds the latest accepted report and decides which fetch results may
/// replace it.
#[derive(Debug)]
pub struct ReportSession {
    config: AnalyticsConfig,
    issued: AtomicU64,
    latest: RwLock<Option<Arc<AcceptedReport>>>,
}

impl ReportSession {
    pub fn new(config: AnalyticsConfig) -> Self {
        Self {
            config,
            issued: AtomicU64::new(0),
            latest: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// The selection the sales page opens with.
    pub fn initial_filter(&self) -> FilterState {
        FilterState::new(self.config.default_time_frame)
    }

    pub fn begin(&self) -> RequestToken {
        RequestToken(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_latest(&self, token: RequestToken) -> bool {
        self.issued.load(Ordering::SeqCst) == token.0
    }

    pub fn latest(&self) -> Option<Arc<AcceptedReport>> {
        self.latest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Applies the result of the fetch issued as `token`.
    ///
    /// Only the most recently issued token may replace the stored report. The
    /// report is assembled before the lock is taken and swapped in whole, so
    /// readers see either the old report or the new one.
    pub fn complete(
        &self,
        token: RequestToken,
        filter: FilterState,
        resolved: ResolvedFilter,
        result: std::result::Result<SalesPage, FetchError>,
    ) -> Outcome {
        if !self.is_latest(token) {
            debug!("Dropping response for superseded request {}", token.0);
            return Outcome::Stale(token);
        }

        let page = match result {
            Ok(page) => page,
            Err(err) => {
                warn!(
                    "Sales fetch {} failed (status {:?}): {}",
                    token.0, err.status, err.message
                );
                return Outcome::Failed(err);
            }
        };

        let accepted = Arc::new(AcceptedReport {
            token,
            filter,
            resolved,
            report: Report::from_page(page, &self.config),
        });

        let mut slot = self.latest.write().unwrap_or_else(PoisonError::into_inner);

        let newer_stored = slot.as_ref().is_some_and(|current| current.token > token);
        if newer_stored || !self.is_latest(token) {
            debug!("Request {} was superseded while assembling", token.0);
            return Outcome::Stale(token);
        }

        *slot = Some(Arc::clone(&accepted));
        info!(
            "Accepted report {} for {} ({} records)",
            token.0,
            accepted.resolved.display_label,
            accepted.report.records.len()
        );

        Outcome::Accepted(accepted)
    }

    /// Fetches `page` for `filter` from `source` and applies the result.
    ///
    /// Fails only when the filter itself is unusable; fetch failures and
    /// superseded responses are reported through [`Outcome`].
    pub async fn refresh<S>(&self, source: &S, filter: &FilterState, page: u32) -> Result<Outcome>
    where
        S: SalesDataSource + ?Sized,
    {
        let resolved = resolve_filter(filter)?;
        let request = FetchRequest::new(resolved.clone(), page, self.config.page_size)?;
        let token = self.begin();

        debug!(
            "Issuing request {} with {:?}",
            token.0,
            request.query_params()
        );

        let result = source.fetch(&request).await;
        Ok(self.complete(token, filter.clone(), resolved, result))
    }
}

impl Default for ReportSession {
    fn default() -> Self {
        Self::new(AnalyticsConfig::default())
    }
}
