use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;

use crate::models::{AggregatePoint, CategorySeries, DatasetKind, DatasetView, IndicatorSet};
use crate::schema;
use crate::synthetic;

/// Not computed from data; the source has no handling-time field.
pub const AVERAGE_TIME_PLACEHOLDER: &str = "2h 15min";

const SYNTHETIC_PATIENTS_PER_ROW: usize = 3;

pub fn compute(view: &DatasetView<'_>) -> (IndicatorSet, Vec<AggregatePoint>) {
    let series = aggregate_series(view, default_metric(view.kind));
    (indicator_set(view), series)
}

pub fn indicator_set(view: &DatasetView<'_>) -> IndicatorSet {
    let revenue: f64 = view.records.iter().filter_map(|r| r.total_value).sum();

    // Distinct ages stand in for patients: the source has no patient id.
    let unique_patients = match view.kind {
        DatasetKind::Real => view
            .records
            .iter()
            .filter_map(|r| r.age)
            .collect::<HashSet<_>>()
            .len(),
        DatasetKind::Synthetic => view.len() * SYNTHETIC_PATIENTS_PER_ROW,
    };

    IndicatorSet {
        count: view.len(),
        revenue_millions: revenue * 1e-6,
        unique_patients,
        average_time: AVERAGE_TIME_PLACEHOLDER,
    }
}

pub fn default_metric(kind: DatasetKind) -> &'static str {
    match kind {
        DatasetKind::Real => schema::TOTAL_VALUE,
        DatasetKind::Synthetic => synthetic::CATEGORIES[0].0,
    }
}

/// Per-day sum of `column`, ascending by date. Rows with an unknown date are
/// left out; a row without the column still opens its day with 0.
pub fn aggregate_series(view: &DatasetView<'_>, column: &str) -> Vec<AggregatePoint> {
    let mut days: BTreeMap<NaiveDate, f64> = BTreeMap::new();

    for record in &view.records {
        let Some(date) = record.admitted.date() else {
            continue;
        };
        *days.entry(date).or_insert(0.0) += record.numeric(column).unwrap_or(0.0);
    }

    days.into_iter()
        .map(|(date, value)| AggregatePoint { date, value })
        .collect()
}

pub fn category_series(view: &DatasetView<'_>) -> Vec<CategorySeries> {
    if view.kind != DatasetKind::Synthetic {
        return Vec::new();
    }

    synthetic::CATEGORIES
        .iter()
        .map(|(name, _)| CategorySeries {
            category: name.to_string(),
            points: aggregate_series(view, name),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorCards {
    pub count: String,
    pub revenue: String,
    pub unique_patients: String,
    pub average_time: String,
}

impl IndicatorCards {
    // count, revenue, unique patients
    pub fn slots(&self) -> [&str; 3] {
        [
            self.count.as_str(),
            self.revenue.as_str(),
            self.unique_patients.as_str(),
        ]
    }
}

impl From<&IndicatorSet> for IndicatorCards {
    fn from(set: &IndicatorSet) -> Self {
        Self {
            count: group_thousands(set.count as u64),
            revenue: format!("R$ {:.1} mi", set.revenue_millions),
            unique_patients: group_thousands(set.unique_patients as u64),
            average_time: set.average_time.to_string(),
        }
    }
}

pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Dataset;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    fn real(rows: serde_json::Value) -> Dataset {
        let rows = rows
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_object().cloned().unwrap())
            .collect();
        Dataset::from_rows(DatasetKind::Real, rows)
    }

    #[test]
    fn two_rows_same_day() {
        let dataset = real(json!([
            {"VAL_TOT": 100, "Data_Internacao": "2023-01-01"},
            {"VAL_TOT": 200, "Data_Internacao": "2023-01-01"}
        ]));
        let (set, series) = compute(&dataset.view());

        assert_eq!(set.count, 2);
        assert!((set.revenue_millions - 0.0003).abs() < 1e-12);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].date, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
        assert_eq!(series[0].value, 300.0);
    }

    #[test]
    fn series_is_sorted_and_skips_unknown_dates() {
        let dataset = real(json!([
            {"VAL_TOT": 5, "Data_Internacao": "2023-01-03"},
            {"VAL_TOT": 7, "Data_Internacao": "2023-01-01T10:30:00"},
            {"VAL_TOT": 9, "Data_Internacao": "??"}
        ]));
        let series = aggregate_series(&dataset.view(), schema::TOTAL_VALUE);
        let dates: Vec<_> = series.iter().map(|p| p.date.to_string()).collect();
        assert_eq!(dates, ["2023-01-01", "2023-01-03"]);
    }

    #[test]
    fn missing_value_column_means_zero_revenue() {
        let dataset = real(json!([{"IDADE": 30}, {"IDADE": 30}, {"IDADE": 41}]));
        let set = indicator_set(&dataset.view());
        assert_eq!(set.revenue_millions, 0.0);
        assert_eq!(set.unique_patients, 2);
    }

    #[test]
    fn empty_dataset_is_all_zero() {
        for kind in [DatasetKind::Real, DatasetKind::Synthetic] {
            let dataset = Dataset::empty(kind);
            let (set, series) = compute(&dataset.view());
            assert_eq!(set.count, 0);
            assert_eq!(set.revenue_millions, 0.0);
            assert_eq!(set.unique_patients, 0);
            assert!(series.is_empty());

            let cards = IndicatorCards::from(&set);
            assert_eq!(cards.slots(), ["0", "R$ 0.0 mi", "0"]);
            assert_eq!(cards.average_time, AVERAGE_TIME_PLACEHOLDER);
        }
    }

    #[test]
    fn synthetic_unique_patients_is_rows_times_three() {
        let today = NaiveDate::from_ymd_opt(2025, 9, 22).unwrap();
        let dataset = synthetic::generate(today, 28, &mut StdRng::seed_from_u64(5));
        let (set, series) = compute(&dataset.view());
        assert_eq!(set.unique_patients, 84);
        assert_eq!(series.len(), 28);
        assert_eq!(category_series(&dataset.view()).len(), synthetic::CATEGORIES.len());
    }

    #[test]
    fn thousands_are_grouped() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(12847), "12,847");
        assert_eq!(group_thousands(1_234_567), "1,234,567");
    }

    #[test]
    fn revenue_card_is_in_millions() {
        let set = IndicatorSet {
            count: 1,
            revenue_millions: 2.8,
            unique_patients: 8934,
            average_time: AVERAGE_TIME_PLACEHOLDER,
        };
        let cards = IndicatorCards::from(&set);
        assert_eq!(cards.slots(), ["1", "R$ 2.8 mi", "8,934"]);
    }
}
