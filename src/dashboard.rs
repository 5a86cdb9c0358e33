use std::fmt::Write;
use std::path::Path;

use crate::filter::DashboardContext;
use crate::indicators::{self, IndicatorCards};
use crate::models::{AggregatePoint, DatasetKind, FilterState, HospitalRow};
use crate::synthetic;

pub fn build_report(ctx: &DashboardContext) -> String {
    let view = ctx.view();
    let (set, series) = indicators::compute(&view);
    let cards = IndicatorCards::from(&set);
    let categories = indicators::category_series(&view);

    let mut output = String::new();
    let _ = writeln!(output, "# SUS Hospital Dashboard");

    if view.kind == DatasetKind::Synthetic {
        let _ = writeln!(
            output,
            "> Showing fictitious data: no real records were available from the data API."
        );
    }
    let _ = writeln!(output);

    let _ = writeln!(output, "## Filters");
    let _ = writeln!(output, "{}", describe_filter(ctx.filter()));
    let _ = writeln!(output);

    let _ = writeln!(output, "## Overview");
    let _ = write!(output, "{}", render_cards(&cards));
    let _ = writeln!(output);

    let metric = indicators::default_metric(view.kind);
    let _ = writeln!(output, "## Daily {metric}");
    if series.is_empty() {
        let _ = writeln!(output, "No dated records for this selection.");
    } else if categories.is_empty() {
        let _ = writeln!(output, "| Date | {metric} |");
        let _ = writeln!(output, "|---|---|");
        for point in &series {
            let _ = writeln!(output, "| {} | {:.2} |", point.date, point.value);
        }
    } else {
        let names: Vec<&str> = categories.iter().map(|c| c.category.as_str()).collect();
        let _ = writeln!(output, "| Date | {} |", names.join(" | "));
        let _ = writeln!(output, "|---|{}", "---|".repeat(names.len()));
        for (i, point) in series.iter().enumerate() {
            let values: Vec<String> = categories
                .iter()
                .map(|c| c.points.get(i).map_or(0.0, |p| p.value).to_string())
                .collect();
            let _ = writeln!(output, "| {} | {} |", point.date, values.join(" | "));
        }
    }
    let _ = writeln!(output);

    let _ = writeln!(output, "## SUS Network Hospitals");
    let _ = write!(output, "{}", render_hospitals(&synthetic::hospitals()));

    output
}

pub fn render_cards(cards: &IndicatorCards) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "- Admissions: {}", cards.count);
    let _ = writeln!(output, "- Revenue: {}", cards.revenue);
    let _ = writeln!(output, "- Unique patients: {}", cards.unique_patients);
    let _ = writeln!(output, "- Average time: {}", cards.average_time);
    output
}

fn describe_filter(filter: &FilterState) -> String {
    const DISPLAY: &str = "%d/%m/%Y";
    let period = match (filter.start, filter.end) {
        (Some(start), Some(end)) => {
            format!("{} to {}", start.format(DISPLAY), end.format(DISPLAY))
        }
        (Some(start), None) => format!(
            "from {} (ignored until an end date is set)",
            start.format(DISPLAY)
        ),
        (None, Some(end)) => format!(
            "until {} (ignored until a start date is set)",
            end.format(DISPLAY)
        ),
        (None, None) => "all dates".to_string(),
    };
    let region = filter.region.as_deref().unwrap_or("all regions");
    format!("Period: {period}; region: {region}")
}

fn render_hospitals(hospitals: &[HospitalRow]) -> String {
    let mut output = String::new();
    let _ = writeln!(
        output,
        "| Hospital | City | Region | Beds | Occupancy | Admissions | Revenue | Status |"
    );
    let _ = writeln!(output, "|---|---|---|---|---|---|---|---|");
    for h in hospitals {
        let _ = writeln!(
            output,
            "| {} | {} | {} | {} | {:.0}% | {} | {} | {} |",
            h.name,
            h.city,
            h.region,
            h.beds,
            h.occupancy * 100.0,
            indicators::group_thousands(u64::from(h.admissions)),
            h.revenue,
            h.status
        );
    }
    output
}

pub fn write_series_csv(path: &Path, series: &[AggregatePoint]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for point in series {
        writer.serialize(point)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Dataset;
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn synthetic_context() -> DashboardContext {
        let today = NaiveDate::from_ymd_opt(2025, 9, 22).unwrap();
        let dataset = synthetic::generate(today, 28, &mut StdRng::seed_from_u64(2));
        DashboardContext::new(Arc::new(dataset), FilterState::default())
    }

    #[test]
    fn synthetic_report_is_labelled() {
        let report = build_report(&synthetic_context());
        assert!(report.contains("fictitious data"));
        assert!(report.contains("| Date | Internacoes | Procedimentos | Pediatria |"));
        assert!(report.contains("- Unique patients: 84"));
        assert!(report.contains("Hospital Geral Sul"));
    }

    #[test]
    fn real_report_lists_value_series() {
        let rows = vec![json!({"VAL_TOT": 100, "Data_Internacao": "2023-01-01"})
            .as_object()
            .cloned()
            .unwrap()];
        let dataset = Dataset::from_rows(DatasetKind::Real, rows);
        let ctx = DashboardContext::new(Arc::new(dataset), FilterState::default());
        let report = build_report(&ctx);
        assert!(!report.contains("fictitious"));
        assert!(report.contains("| 2023-01-01 | 100.00 |"));
        assert!(report.contains("Period: all dates; region: all regions"));
    }

    #[test]
    fn empty_real_report_has_zero_cards() {
        let ctx = DashboardContext::new(
            Arc::new(Dataset::empty(DatasetKind::Real)),
            FilterState::default(),
        );
        let report = build_report(&ctx);
        assert!(report.contains("- Admissions: 0"));
        assert!(report.contains("No dated records for this selection."));
    }

    #[test]
    fn series_csv_has_header_and_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("series.csv");
        let series = vec![AggregatePoint {
            date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            value: 300.0,
        }];
        write_series_csv(&path, &series).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "date,value\n2023-01-01,300.0\n");
    }
}
