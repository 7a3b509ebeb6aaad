use crate::errors::AggregateError;
use crate::models::{DomainEarnings, DomainSummary, TodayEarnings};
use serde::Serialize;
use std::collections::BTreeMap;

/// Micros per whole currency unit.
pub const MICROS_PER_UNIT: f64 = 1_000_000.0;

pub const COMBINED_ID: &str = "all";

/// One measured entity (account or domain) over one reporting period.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricRecord {
    pub id: String,
    pub earnings_micros: i64,
    pub clicks: u64,
    pub impressions: u64,
    pub page_views: u64,
}

impl MetricRecord {
    /// Builds a record from raw backend counts, refusing negative ones.
    /// `clicks > impressions` is let through.
    pub fn from_counts(
        id: impl Into<String>,
        earnings_micros: i64,
        clicks: i64,
        impressions: i64,
        page_views: i64,
    ) -> Result<Self, AggregateError> {
        let id = id.into();
        let clicks = non_negative(&id, "clicks", clicks)?;
        let impressions = non_negative(&id, "impressions", impressions)?;
        let page_views = non_negative(&id, "page_views", page_views)?;
        Ok(Self {
            id,
            earnings_micros,
            clicks,
            impressions,
            page_views,
        })
    }

    pub fn from_domain_summary(
        id: impl Into<String>,
        s: &DomainSummary,
    ) -> Result<Self, AggregateError> {
        Self::from_counts(
            id,
            s.total_earnings_micros,
            s.total_clicks,
            s.total_impressions,
            s.total_page_views,
        )
    }

    fn zero(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    fn absorb(&mut self, other: &MetricRecord) -> Result<(), AggregateError> {
        self.earnings_micros = self
            .earnings_micros
            .checked_add(other.earnings_micros)
            .ok_or(AggregateError::Overflow { field: "earnings_micros" })?;
        self.clicks = checked(self.clicks, other.clicks, "clicks")?;
        self.impressions = checked(self.impressions, other.impressions, "impressions")?;
        self.page_views = checked(self.page_views, other.page_views, "page_views")?;
        Ok(())
    }

    pub fn ratios(&self) -> DerivedRatios {
        DerivedRatios::from_record(self)
    }

    pub fn summarize(&self) -> MetricSummary {
        let ratios = self.ratios();
        MetricSummary {
            id: self.id.clone(),
            earnings_micros: self.earnings_micros,
            earnings: self.earnings_micros as f64 / MICROS_PER_UNIT,
            clicks: self.clicks,
            impressions: self.impressions,
            page_views: self.page_views,
            ctr: ratios.ctr,
            cpm: ratios.cpm,
            rpm: ratios.rpm,
        }
    }
}

impl TryFrom<&TodayEarnings> for MetricRecord {
    type Error = AggregateError;

    fn try_from(e: &TodayEarnings) -> Result<Self, Self::Error> {
        Self::from_counts(&e.account_key, e.earnings_micros, e.clicks, e.impressions, e.page_views)
    }
}

impl TryFrom<&DomainEarnings> for MetricRecord {
    type Error = AggregateError;

    fn try_from(d: &DomainEarnings) -> Result<Self, Self::Error> {
        Self::from_counts(&d.domain, d.earnings_micros, d.clicks, d.impressions, d.page_views)
    }
}

/// CTR in percent; CPM and RPM in whole currency units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DerivedRatios {
    pub ctr: f64,
    pub cpm: f64,
    pub rpm: f64,
}

impl DerivedRatios {
    pub fn from_record(record: &MetricRecord) -> Self {
        Self::from_totals(
            record.earnings_micros,
            record.clicks,
            record.impressions,
            record.page_views,
        )
    }

    pub fn from_totals(earnings_micros: i64, clicks: u64, impressions: u64, page_views: u64) -> Self {
        let earnings = earnings_micros as f64 / MICROS_PER_UNIT;
        Self {
            ctr: per(clicks as f64, impressions, 100.0),
            cpm: per(earnings, impressions, 1000.0),
            rpm: per(earnings, page_views, 1000.0),
        }
    }
}

fn per(numerator: f64, denominator: u64, scale: f64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator / denominator as f64 * scale
    }
}

/// Flattened record plus ratios, as sent to the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSummary {
    pub id: String,
    pub earnings_micros: i64,
    pub earnings: f64,
    pub clicks: u64,
    pub impressions: u64,
    pub page_views: u64,
    pub ctr: f64,
    pub cpm: f64,
    pub rpm: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregationResult {
    pub total: MetricRecord,
    pub ratios: DerivedRatios,
    pub breakdown: BTreeMap<String, MetricSummary>,
    pub included: usize,
}

impl AggregationResult {
    pub fn summary(&self) -> MetricSummary {
        self.total.summarize()
    }
}

/// Sums every record into one `"all"` total and recomputes the ratios from it.
///
/// Records sharing an id are folded into the same breakdown entry. An empty
/// slice gives the zero result.
pub fn aggregate_accounts(records: &[MetricRecord]) -> Result<AggregationResult, AggregateError> {
    let mut total = MetricRecord::zero(COMBINED_ID);
    let mut groups: BTreeMap<String, MetricRecord> = BTreeMap::new();

    for record in records {
        total.absorb(record)?;
        groups
            .entry(record.id.clone())
            .or_insert_with(|| MetricRecord::zero(record.id.clone()))
            .absorb(record)?;
    }

    let breakdown = groups
        .into_iter()
        .map(|(id, record)| (id, record.summarize()))
        .collect();

    Ok(AggregationResult {
        ratios: total.ratios(),
        total,
        breakdown,
        included: records.len(),
    })
}

/// Groups domain rows from every account by exact domain name and sums each group.
///
/// Output is ordered by domain name, so it does not depend on which account
/// answered first.
pub fn aggregate_domains(
    per_account: &[Vec<DomainEarnings>],
) -> Result<Vec<MetricSummary>, AggregateError> {
    let groups = per_account.iter().flatten().try_fold(
        BTreeMap::<String, MetricRecord>::new(),
        |mut groups, row| {
            let record = MetricRecord::try_from(row)?;
            groups
                .entry(record.id.clone())
                .or_insert_with(|| MetricRecord::zero(record.id.clone()))
                .absorb(&record)?;
            Ok::<_, AggregateError>(groups)
        },
    )?;

    Ok(groups.values().map(MetricRecord::summarize).collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CtrBand {
    Excellent,
    Good,
    Average,
    BelowAverage,
}

impl CtrBand {
    pub fn classify(ctr: f64) -> Self {
        if ctr >= 2.0 {
            CtrBand::Excellent
        } else if ctr >= 1.0 {
            CtrBand::Good
        } else if ctr >= 0.5 {
            CtrBand::Average
        } else {
            CtrBand::BelowAverage
        }
    }
}

fn non_negative(id: &str, field: &'static str, value: i64) -> Result<u64, AggregateError> {
    u64::try_from(value).map_err(|_| AggregateError::NegativeCount {
        id: id.to_string(),
        field,
        value,
    })
}

fn checked(a: u64, b: u64, field: &'static str) -> Result<u64, AggregateError> {
    a.checked_add(b).ok_or(AggregateError::Overflow { field })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, micros: i64, clicks: u64, impressions: u64, page_views: u64) -> MetricRecord {
        MetricRecord {
            id: id.to_string(),
            earnings_micros: micros,
            clicks,
            impressions,
            page_views,
        }
    }

    fn domain(name: &str, clicks: i64, impressions: i64) -> DomainEarnings {
        DomainEarnings {
            domain: name.to_string(),
            earnings_idr: 0.0,
            earnings_micros: 0,
            clicks,
            impressions,
            page_views: 0,
            ctr: 0.0,
            cpm_idr: 0.0,
            rpm_idr: 0.0,
        }
    }

    #[test]
    fn empty_input_is_zero_result() {
        let result = aggregate_accounts(&[]).unwrap();
        assert_eq!(result.total, MetricRecord::zero(COMBINED_ID));
        assert_eq!(result.ratios, DerivedRatios::default());
        assert_eq!(result.included, 0);
        assert!(result.breakdown.is_empty());
    }

    #[test]
    fn ctr_is_recomputed_from_sums() {
        let a = record("a", 0, 1_500, 100_000, 0);
        let b = record("b", 0, 250, 50_000, 0);
        let result = aggregate_accounts(&[a, b]).unwrap();

        assert_eq!(result.total.clicks, 1_750);
        assert_eq!(result.total.impressions, 150_000);
        assert!((result.ratios.ctr - 1.166_666).abs() < 1e-4);
        assert!((result.ratios.ctr - 1.0).abs() > 0.1);
    }

    #[test]
    fn cpm_and_rpm_use_summed_earnings() {
        // 3,000 and 1,000 currency units.
        let a = record("a", 3_000_000_000, 10, 1_000, 500);
        let b = record("b", 1_000_000_000, 10, 3_000, 1_500);
        let result = aggregate_accounts(&[a, b]).unwrap();

        assert_eq!(result.total.earnings_micros, 4_000_000_000);
        assert!((result.ratios.cpm - 1_000.0).abs() < 1e-9);
        assert!((result.ratios.rpm - 2_000.0).abs() < 1e-9);
        assert_eq!(result.summary().earnings, 4_000.0);
    }

    #[test]
    fn permutation_does_not_change_result() {
        let records = vec![
            record("x", 1_234_567, 17, 9_001, 3_000),
            record("y", 98_765_432, 3, 120, 45),
            record("z", 5, 0, 0, 0),
        ];
        let forward = aggregate_accounts(&records).unwrap();
        let mut reversed = records.clone();
        reversed.reverse();
        let backward = aggregate_accounts(&reversed).unwrap();
        let rotated = aggregate_accounts(&[records[1].clone(), records[2].clone(), records[0].clone()]).unwrap();

        assert_eq!(forward, backward);
        assert_eq!(forward, rotated);
        assert_eq!(forward.ratios.ctr.to_bits(), backward.ratios.ctr.to_bits());
    }

    #[test]
    fn duplicate_ids_are_summed_in_breakdown() {
        let result = aggregate_accounts(&[record("a", 10, 1, 10, 5), record("a", 20, 2, 20, 5)]).unwrap();
        assert_eq!(result.included, 2);
        assert_eq!(result.breakdown.len(), 1);
        let a = &result.breakdown["a"];
        assert_eq!(a.earnings_micros, 30);
        assert_eq!(a.clicks, 3);
        assert_eq!(a.page_views, 10);
    }

    #[test]
    fn zero_denominators_give_zero_ratios() {
        let ratios = DerivedRatios::from_record(&record("idle", 500_000, 0, 0, 0));
        assert_eq!(ratios, DerivedRatios::default());
        assert!(!ratios.ctr.is_nan());

        let clicks_without_impressions = DerivedRatios::from_totals(0, 7, 0, 0);
        assert_eq!(clicks_without_impressions.ctr, 0.0);
    }

    #[test]
    fn clicks_above_impressions_do_not_fail() {
        let r = MetricRecord::from_counts("odd", 0, 20, 10, 0).unwrap();
        assert_eq!(r.ratios().ctr, 200.0);
    }

    #[test]
    fn negative_counts_are_rejected() {
        let err = MetricRecord::from_counts("broken", 0, 1, -5, 0).unwrap_err();
        assert_eq!(
            err,
            AggregateError::NegativeCount {
                id: "broken".into(),
                field: "impressions",
                value: -5,
            }
        );
    }

    #[test]
    fn overflow_is_reported() {
        let err = aggregate_accounts(&[record("a", i64::MAX, 0, 0, 0), record("b", 1, 0, 0, 0)]).unwrap_err();
        assert_eq!(err, AggregateError::Overflow { field: "earnings_micros" });
    }

    #[test]
    fn domains_group_across_accounts() {
        let x = vec![domain("a.com", 10, 1_000)];
        let y = vec![domain("a.com", 30, 2_000)];
        let merged = aggregate_domains(&[x, y]).unwrap();

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].id, "a.com");
        assert_eq!(merged[0].impressions, 3_000);
        assert_eq!(merged[0].clicks, 40);
        assert!((merged[0].ctr - 1.333_333).abs() < 1e-4);
    }

    #[test]
    fn domain_names_are_case_sensitive_and_sorted() {
        let x = vec![domain("b.com", 1, 10), domain("A.com", 1, 10)];
        let y = vec![domain("a.com", 1, 10), domain("b.com", 1, 10)];
        let merged = aggregate_domains(&[x.clone(), y.clone()]).unwrap();
        let ids: Vec<_> = merged.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["A.com", "a.com", "b.com"]);
        assert_eq!(merged, aggregate_domains(&[y, x]).unwrap());
    }

    #[test]
    fn duplicate_domain_in_one_account_is_kept() {
        let merged = aggregate_domains(&[vec![domain("a.com", 1, 100), domain("a.com", 2, 100)]]).unwrap();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].clicks, 3);
        assert_eq!(merged[0].impressions, 200);
    }

    #[test]
    fn ctr_bands() {
        assert_eq!(CtrBand::classify(2.0), CtrBand::Excellent);
        assert_eq!(CtrBand::classify(1.5), CtrBand::Good);
        assert_eq!(CtrBand::classify(0.5), CtrBand::Average);
        assert_eq!(CtrBand::classify(0.49), CtrBand::BelowAverage);
        assert_eq!(CtrBand::classify(0.0), CtrBand::BelowAverage);
    }
}
