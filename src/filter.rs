use crate::error::{Result, SalesAnalyticsError};
use chrono::{DateTime, Days, Duration, NaiveDate, NaiveTime, Utc};
use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TimeFrame {
    #[default]
    #[schemars(description = "Sales made today")]
    Day,

    #[schemars(description = "Sales made in the past 7 days")]
    Week,

    #[schemars(description = "Sales made in the past 30 days")]
    Month,

    #[schemars(description = "Sales made in the past 365 days")]
    Year,

    #[schemars(description = "Sales made on one explicitly chosen calendar day")]
    Custom,
}

impl TimeFrame {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeFrame::Day => "day",
            TimeFrame::Week => "week",
            TimeFrame::Month => "month",
            TimeFrame::Year => "year",
            TimeFrame::Custom => "custom",
        }
    }

    /// Label shown next to the figures, e.g. "Sales for the past week".
    pub fn display_label(&self) -> &'static str {
        match self {
            TimeFrame::Day => "today",
            TimeFrame::Week => "the past week",
            TimeFrame::Month => "the past month",
            TimeFrame::Year => "the past year",
            TimeFrame::Custom => "selected date",
        }
    }

    fn lookback_days(&self) -> Option<i64> {
        match self {
            TimeFrame::Week => Some(7),
            TimeFrame::Month => Some(30),
            TimeFrame::Year => Some(365),
            TimeFrame::Day | TimeFrame::Custom => None,
        }
    }
}

impl fmt::Display for TimeFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the user has selected on the sales page.
///
/// `custom_date` only matters for [`TimeFrame::Custom`]; it is ignored for
/// every other time frame even when set.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    pub time_frame: TimeFrame,
    #[serde(default)]
    pub custom_date: Option<NaiveDate>,
    #[serde(default)]
    pub financer: Option<String>,
}

impl FilterState {
    pub fn new(time_frame: TimeFrame) -> Self {
        Self {
            time_frame,
            custom_date: None,
            financer: None,
        }
    }

    pub fn custom(date: NaiveDate) -> Self {
        Self {
            time_frame: TimeFrame::Custom,
            custom_date: Some(date),
            financer: None,
        }
    }

    pub fn with_financer(mut self, financer: impl Into<String>) -> Self {
        self.financer = Some(financer.into());
        self
    }
}

/// Parameters handed to the data source for one fetch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedFilter {
    pub query_time_frame: TimeFrame,
    #[schemars(description = "ISO-8601 calendar date, only set for custom time frames")]
    pub query_date: Option<NaiveDate>,
    #[schemars(description = "Financer to filter by; null means no financer filter")]
    pub financer_query_param: Option<String>,
    pub display_label: String,
}

impl ResolvedFilter {
    /// Query string pairs in the order the sales endpoint expects them.
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("timeFrame", self.query_time_frame.as_str().to_string())];

        if let Some(date) = self.query_date {
            params.push(("date", date.format("%Y-%m-%d").to_string()));
        }

        if let Some(financer) = &self.financer_query_param {
            params.push(("financer", financer.clone()));
        }

        params
    }

    /// The `[start, end)` span of creation times this filter selects, relative
    /// to `now`. Day boundaries are UTC midnights; rolling windows end at the
    /// close of `now`'s UTC day.
    pub fn window(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let today = now.date_naive();

        match (self.query_time_frame, self.query_date) {
            (TimeFrame::Custom, Some(date)) => (start_of(date), start_of_next(date)),
            (frame, _) => {
                let start = match frame.lookback_days() {
                    Some(days) => now - Duration::days(days),
                    None => start_of(today),
                };
                (start, start_of_next(today))
            }
        }
    }
}

fn start_of(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn start_of_next(date: NaiveDate) -> DateTime<Utc> {
    let next = date.checked_add_days(Days::new(1)).unwrap_or(date);
    start_of(next)
}

/// Turns the user's selection into data-source parameters and a display label.
///
/// A custom time frame without a date is a caller bug and is rejected rather
/// than defaulted. An empty financer name is never a real selection and is
/// treated as no financer filter.
pub fn resolve_filter(state: &FilterState) -> Result<ResolvedFilter> {
    let query_date = match state.time_frame {
        TimeFrame::Custom => Some(state.custom_date.ok_or(SalesAnalyticsError::MissingCustomDate)?),
        _ => None,
    };

    let financer_query_param = match state.financer.as_deref() {
        Some(name) if name.trim().is_empty() => {
            debug!("Ignoring empty financer selection");
            None
        }
        Some(name) => Some(name.to_string()),
        None => None,
    };

    Ok(ResolvedFilter {
        query_time_frame: state.time_frame,
        query_date,
        financer_query_param,
        display_label: state.time_frame.display_label().to_string(),
    })
}
