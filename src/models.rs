use crate::errors::FetchError;
use crate::fanout::FailedKey;
use crate::stats::{CtrBand, MetricSummary};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Selector value that stands for every active account.
pub const ALL_ACCOUNTS: &str = "all";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Inactive,
    Error,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub account_key: String,
    /// Publisher id, e.g. `pub-1234567890`.
    #[serde(default)]
    pub account_id: String,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    pub status: AccountStatus,
    #[serde(default)]
    pub metadata: AccountMetadata,
}

impl Account {
    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodayEarnings {
    pub date: String,
    pub account_key: String,
    #[serde(default)]
    pub account_id: String,
    #[serde(default)]
    pub earnings_idr: f64,
    pub earnings_micros: i64,
    pub clicks: i64,
    pub impressions: i64,
    pub page_views: i64,
    #[serde(default)]
    pub ctr: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_ctr: Option<f64>,
    #[serde(default)]
    pub cpm_idr: f64,
    #[serde(default)]
    pub rpm_idr: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpc_idr: Option<f64>,
    #[serde(default)]
    pub data_age_days: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEarnings {
    pub domain: String,
    #[serde(default)]
    pub earnings_idr: f64,
    pub earnings_micros: i64,
    pub clicks: i64,
    pub impressions: i64,
    pub page_views: i64,
    #[serde(default)]
    pub ctr: f64,
    #[serde(default)]
    pub cpm_idr: f64,
    #[serde(default)]
    pub rpm_idr: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DomainSummary {
    #[serde(default)]
    pub total_domains: usize,
    #[serde(default)]
    pub total_earnings_idr: f64,
    pub total_earnings_micros: i64,
    pub total_clicks: i64,
    pub total_impressions: i64,
    pub total_page_views: i64,
    #[serde(default)]
    pub overall_ctr: f64,
    #[serde(default)]
    pub overall_cpm_idr: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall_rpm_idr: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainBreakdownResponse {
    pub date: String,
    pub account_key: String,
    #[serde(default)]
    pub account_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_filter: Option<String>,
    pub domains: Vec<DomainEarnings>,
    pub summary: DomainSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSummary {
    pub account_key: String,
    #[serde(default)]
    pub account_id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub earnings_idr: f64,
    pub clicks: i64,
    pub impressions: i64,
    pub page_views: i64,
    #[serde(default)]
    pub rpm_idr: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiAccountSummary {
    pub date: String,
    pub total_accounts: usize,
    #[serde(default)]
    pub total_earnings_idr: f64,
    pub total_earnings_micros: i64,
    pub total_clicks: i64,
    pub total_impressions: i64,
    pub total_page_views: i64,
    #[serde(default)]
    pub overall_ctr: f64,
    #[serde(default)]
    pub overall_cpm_idr: f64,
    #[serde(default)]
    pub overall_rpm_idr: f64,
    #[serde(default)]
    pub accounts: Vec<AccountSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateFilter {
    #[default]
    Today,
    Yesterday,
    Custom,
    Range,
}

impl DateFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            DateFilter::Today => "today",
            DateFilter::Yesterday => "yesterday",
            DateFilter::Custom => "custom",
            DateFilter::Range => "range",
        }
    }
}

/// Reporting period forwarded to every earnings endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateQuery {
    #[serde(default)]
    pub date_filter: Option<DateFilter>,
    #[serde(default)]
    pub custom_date: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

impl DateQuery {
    pub fn range(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            date_filter: Some(DateFilter::Range),
            start_date: Some(start.into()),
            end_date: Some(end.into()),
            ..Self::default()
        }
    }

    /// Checks the parameters a filter depends on. Runs before any request is built.
    pub fn validate(&self) -> Result<(), FetchError> {
        match self.date_filter {
            Some(DateFilter::Range) => {
                let (Some(start), Some(end)) = (present(&self.start_date), present(&self.end_date))
                else {
                    return Err(FetchError::Validation(
                        "start_date and end_date are required for range filter".into(),
                    ));
                };
                let start = parse_date("start_date", start)?;
                let end = parse_date("end_date", end)?;
                if start > end {
                    return Err(FetchError::Validation(format!(
                        "start_date {start} is after end_date {end}"
                    )));
                }
                Ok(())
            }
            Some(DateFilter::Custom) => {
                let Some(date) = present(&self.custom_date) else {
                    return Err(FetchError::Validation(
                        "custom_date is required for custom filter".into(),
                    ));
                };
                parse_date("custom_date", date).map(|_| ())
            }
            _ => Ok(()),
        }
    }

    /// Query parameters for the backend. Dates irrelevant to the filter are dropped.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        let Some(filter) = self.date_filter else {
            return params;
        };
        params.push(("date_filter", filter.as_str().to_string()));
        match filter {
            DateFilter::Custom => {
                if let Some(date) = present(&self.custom_date) {
                    params.push(("custom_date", date.to_string()));
                }
            }
            DateFilter::Range => {
                if let Some(start) = present(&self.start_date) {
                    params.push(("start_date", start.to_string()));
                }
                if let Some(end) = present(&self.end_date) {
                    params.push(("end_date", end.to_string()));
                }
            }
            DateFilter::Today | DateFilter::Yesterday => {}
        }
        params
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, FetchError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| FetchError::Validation(format!("{field} must be YYYY-MM-DD, got {value:?}")))
}

/// Query string accepted by the dashboard's view endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ViewQuery {
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub date_filter: Option<DateFilter>,
    #[serde(default)]
    pub custom_date: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

impl ViewQuery {
    pub fn date_query(&self) -> DateQuery {
        DateQuery {
            date_filter: self.date_filter,
            custom_date: self.custom_date.clone(),
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
        }
    }

    pub fn domain_filter(&self) -> Option<&str> {
        present(&self.domain)
    }
}

/// Earnings merged across every active account.
#[derive(Debug, Clone, Serialize)]
pub struct CombinedEarnings {
    pub date: String,
    pub account_key: String,
    pub total: MetricSummary,
    pub accounts: Vec<MetricSummary>,
    pub included: usize,
    pub failed_accounts: Vec<FailedKey>,
    pub note: String,
}

/// Chosen by the caller from the selected account, never from the payload shape.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum EarningsSource {
    Account(TodayEarnings),
    Combined(CombinedEarnings),
}

#[derive(Debug, Clone, Serialize)]
pub struct CombinedDomains {
    pub date: String,
    pub account_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_filter: Option<String>,
    pub domains: Vec<MetricSummary>,
    pub summary: MetricSummary,
    pub total_domains: usize,
    pub included: usize,
    pub failed_accounts: Vec<FailedKey>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum DomainsSource {
    Account(DomainBreakdownResponse),
    Combined(CombinedDomains),
}

#[derive(Debug, Clone, Serialize)]
pub struct CtrView {
    pub account_key: String,
    pub date: String,
    pub ctr: f64,
    pub band: CtrBand,
    pub clicks: i64,
    pub impressions: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_ctr: Option<f64>,
    pub failed_accounts: Vec<FailedKey>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewAccount {
    pub account_key: String,
    pub display_name: String,
    pub account_id: Option<String>,
    pub description: Option<String>,
    pub website_url: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth_url: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateResponse {
    #[serde(default)]
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    #[serde(default)]
    pub message: Option<String>,
}
