//! Builds the views behind the dashboard pages.
//!
//! A single account is a plain passthrough to the backend. The `all` selector
//! fans out one request per active account, folds the successes with the
//! aggregator and reports the accounts that could not be included.

use crate::client::BackendClient;
use crate::errors::AppError;
use crate::fanout::fan_out_with_partial_tolerance;
use crate::generation::{Generation, LatestView};
use crate::models::{
    CombinedDomains, CombinedEarnings, CtrView, DateQuery, DomainEarnings, DomainsSource,
    EarningsSource, MultiAccountSummary, ALL_ACCOUNTS,
};
use crate::state::AppState;
use crate::stats::{aggregate_accounts, aggregate_domains, CtrBand, MetricRecord, MICROS_PER_UNIT};
use chrono::Local;
use tracing::info;

/// Identifies one combined view request: the effective date parameters plus
/// the domain filter. Dates the filter ignores do not take part.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ViewKey {
    params: Vec<(&'static str, String)>,
    domain: Option<String>,
}

impl ViewKey {
    pub fn new(query: &DateQuery, domain_filter: Option<&str>) -> Self {
        Self {
            params: query.to_params(),
            domain: domain_filter.map(str::to_string),
        }
    }
}

pub async fn earnings_view(
    state: &AppState,
    account: &str,
    query: &DateQuery,
) -> Result<EarningsSource, AppError> {
    if account != ALL_ACCOUNTS {
        let earnings = state.client.today_earnings(account, query).await?;
        return Ok(EarningsSource::Account(earnings));
    }

    query.validate()?;
    let key = ViewKey::new(query, None);
    let generation = state.combined_earnings.begin(key.clone()).await;
    let combined = combine_earnings(&state.client, query).await?;
    let published = publish(&state.combined_earnings, &key, generation, combined).await;
    Ok(EarningsSource::Combined(published))
}

pub async fn domains_view(
    state: &AppState,
    account: &str,
    domain_filter: Option<&str>,
    query: &DateQuery,
) -> Result<DomainsSource, AppError> {
    if account != ALL_ACCOUNTS {
        let breakdown = state
            .client
            .domain_earnings(account, domain_filter, query)
            .await?;
        return Ok(DomainsSource::Account(breakdown));
    }

    query.validate()?;
    let key = ViewKey::new(query, domain_filter);
    let generation = state.combined_domains.begin(key.clone()).await;
    let combined = combine_domains(&state.client, domain_filter, query).await?;
    let published = publish(&state.combined_domains, &key, generation, combined).await;
    Ok(DomainsSource::Combined(published))
}

pub async fn ctr_view(state: &AppState, account: &str, query: &DateQuery) -> Result<CtrView, AppError> {
    let view = match earnings_view(state, account, query).await? {
        EarningsSource::Account(e) => CtrView {
            band: CtrBand::classify(e.ctr),
            account_key: e.account_key,
            date: e.date,
            ctr: e.ctr,
            clicks: e.clicks,
            impressions: e.impressions,
            page_ctr: e.page_ctr,
            failed_accounts: Vec::new(),
        },
        EarningsSource::Combined(c) => CtrView {
            band: CtrBand::classify(c.total.ctr),
            account_key: c.account_key,
            date: c.date,
            ctr: c.total.ctr,
            clicks: saturating_i64(c.total.clicks),
            impressions: saturating_i64(c.total.impressions),
            page_ctr: None,
            failed_accounts: c.failed_accounts,
        },
    };
    Ok(view)
}

/// Backend-computed totals, with the ratios recomputed from those totals.
pub async fn summary_view(state: &AppState, query: &DateQuery) -> Result<MultiAccountSummary, AppError> {
    let mut summary = state.client.summary(query).await?;
    let totals = MetricRecord::from_counts(
        ALL_ACCOUNTS,
        summary.total_earnings_micros,
        summary.total_clicks,
        summary.total_impressions,
        summary.total_page_views,
    )?;
    let ratios = totals.ratios();
    summary.total_earnings_idr = totals.earnings_micros as f64 / MICROS_PER_UNIT;
    summary.overall_ctr = ratios.ctr;
    summary.overall_cpm_idr = ratios.cpm;
    summary.overall_rpm_idr = ratios.rpm;
    Ok(summary)
}

async fn combine_earnings(client: &BackendClient, query: &DateQuery) -> Result<CombinedEarnings, AppError> {
    let keys = client.active_account_keys().await?;
    let fetched = fan_out_with_partial_tolerance(&keys, client.timeout(), |key| async move {
        let earnings = client
            .today_earnings(&key, query)
            .await
            .map_err(|e| e.to_string())?;
        let record = MetricRecord::try_from(&earnings).map_err(|e| e.to_string())?;
        Ok::<_, String>((earnings.date, record))
    })
    .await;

    let attempted = fetched.attempted();
    let (dates, records): (Vec<String>, Vec<MetricRecord>) = fetched.successes.into_iter().unzip();
    let aggregated = aggregate_accounts(&records)?;
    info!(
        included = aggregated.included,
        failed = fetched.failures.len(),
        "combined earnings across accounts"
    );

    Ok(CombinedEarnings {
        date: report_date(dates.into_iter().next()),
        account_key: ALL_ACCOUNTS.to_string(),
        total: aggregated.summary(),
        accounts: aggregated.breakdown.into_values().collect(),
        note: format!("Combined data from {} of {} accounts", aggregated.included, attempted),
        included: aggregated.included,
        failed_accounts: fetched.failures,
    })
}

struct AccountDomains {
    date: String,
    domains: Vec<DomainEarnings>,
    summary: MetricRecord,
}

async fn combine_domains(
    client: &BackendClient,
    domain_filter: Option<&str>,
    query: &DateQuery,
) -> Result<CombinedDomains, AppError> {
    let keys = client.active_account_keys().await?;
    let fetched = fan_out_with_partial_tolerance(&keys, client.timeout(), |key| async move {
        let breakdown = client
            .domain_earnings(&key, domain_filter, query)
            .await
            .map_err(|e| e.to_string())?;
        // Reject the whole account if any row is malformed, so it shows up as failed.
        for row in &breakdown.domains {
            MetricRecord::try_from(row).map_err(|e| e.to_string())?;
        }
        let summary =
            MetricRecord::from_domain_summary(&key, &breakdown.summary).map_err(|e| e.to_string())?;
        Ok::<_, String>(AccountDomains {
            date: breakdown.date,
            domains: breakdown.domains,
            summary,
        })
    })
    .await;

    let mut date = None;
    let mut lists = Vec::with_capacity(fetched.successes.len());
    let mut summaries = Vec::with_capacity(fetched.successes.len());
    for account in fetched.successes {
        date.get_or_insert(account.date);
        lists.push(account.domains);
        summaries.push(account.summary);
    }

    let domains = aggregate_domains(&lists)?;
    let totals = aggregate_accounts(&summaries)?;
    info!(
        included = totals.included,
        domains = domains.len(),
        failed = fetched.failures.len(),
        "combined domain breakdown across accounts"
    );

    Ok(CombinedDomains {
        date: report_date(date),
        account_key: ALL_ACCOUNTS.to_string(),
        domain_filter: domain_filter.map(str::to_string),
        total_domains: domains.len(),
        summary: totals.summary(),
        domains,
        included: totals.included,
        failed_accounts: fetched.failures,
    })
}

/// Commits `value` under `generation`. A superseded refresh never replaces
/// the stored view; it answers with a newer committed result of the same
/// request, or with its own.
async fn publish<T: Clone>(
    view: &LatestView<ViewKey, T>,
    key: &ViewKey,
    generation: Generation,
    value: T,
) -> T {
    if view.commit(key, generation, value.clone()).await {
        return value;
    }
    match view.current(key).await {
        Some((stored, newer)) if stored > generation => newer,
        _ => value,
    }
}

fn report_date(first_seen: Option<String>) -> String {
    first_seen.unwrap_or_else(|| Local::now().date_naive().to_string())
}

fn saturating_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::models::DateFilter;

    fn filtered(filter: DateFilter) -> ViewKey {
        let query = DateQuery {
            date_filter: Some(filter),
            ..DateQuery::default()
        };
        ViewKey::new(&query, None)
    }

    #[tokio::test]
    async fn stale_refresh_returns_newer_view() {
        let view = LatestView::new();
        let key = filtered(DateFilter::Today);
        let g1 = view.begin(key.clone()).await;
        let g2 = view.begin(key.clone()).await;

        assert_eq!(publish(&view, &key, g2, 2).await, 2);
        assert_eq!(publish(&view, &key, g1, 1).await, 2);
        assert_eq!(view.current(&key).await, Some((g2, 2)));
    }

    #[tokio::test]
    async fn stale_refresh_before_newer_commit_keeps_view_empty() {
        let view = LatestView::new();
        let key = filtered(DateFilter::Today);
        let g1 = view.begin(key.clone()).await;
        let _g2 = view.begin(key.clone()).await;

        assert_eq!(publish(&view, &key, g1, 1).await, 1);
        assert_eq!(view.current(&key).await, None);
    }

    #[tokio::test]
    async fn slow_refresh_keeps_its_own_filter() {
        let view = LatestView::new();
        let today = filtered(DateFilter::Today);
        let yesterday = filtered(DateFilter::Yesterday);
        let slow = view.begin(today.clone()).await;
        let fast = view.begin(yesterday.clone()).await;

        assert_eq!(publish(&view, &yesterday, fast, "2025-01-14").await, "2025-01-14");
        assert_eq!(publish(&view, &today, slow, "2025-01-15").await, "2025-01-15");
    }

    #[tokio::test]
    async fn stale_refresh_ignores_older_stored_view() {
        let view = LatestView::new();
        let key = filtered(DateFilter::Today);
        let g1 = view.begin(key.clone()).await;
        assert_eq!(publish(&view, &key, g1, 1).await, 1);

        let g2 = view.begin(key.clone()).await;
        let _g3 = view.begin(key.clone()).await;
        assert_eq!(publish(&view, &key, g2, 2).await, 2);
    }

    #[test]
    fn view_key_ignores_irrelevant_dates() {
        let plain = DateQuery {
            date_filter: Some(DateFilter::Today),
            ..DateQuery::default()
        };
        let with_stray_dates = DateQuery {
            start_date: Some("2025-01-01".into()),
            custom_date: Some("2025-01-02".into()),
            ..plain.clone()
        };
        assert_eq!(ViewKey::new(&plain, None), ViewKey::new(&with_stray_dates, None));
        assert_ne!(ViewKey::new(&plain, None), ViewKey::new(&plain, Some("a.com")));
    }

    #[test]
    fn report_date_prefers_backend_date() {
        assert_eq!(report_date(Some("2025-03-01".into())), "2025-03-01");
        assert_eq!(report_date(None).len(), 10);
    }
}
