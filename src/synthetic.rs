use chrono::{Duration, NaiveDate, NaiveTime};
use rand::Rng;
use serde_json::{Map, Value};

use crate::models::{AdmissionDate, Dataset, DatasetKind, HospitalRow, Record};

pub const DATE_COLUMN: &str = "data";
pub const MAX_SPAN_DAYS: u32 = 366;

pub const CATEGORIES: &[(&str, std::ops::Range<i64>)] = &[
    ("Internacoes", 200..500),
    ("Procedimentos", 150..400),
    ("Pediatria", 50..200),
];

/// One row per day ending on `today`; the span is clamped to `1..=MAX_SPAN_DAYS`.
pub fn generate<R: Rng + ?Sized>(today: NaiveDate, span_days: u32, rng: &mut R) -> Dataset {
    let span = span_days.clamp(1, MAX_SPAN_DAYS);
    let first = today
        .checked_sub_signed(Duration::days(i64::from(span) - 1))
        .unwrap_or(NaiveDate::MIN);

    let records = first
        .iter_days()
        .take(span as usize)
        .take_while(|day| *day <= today)
        .map(|day| {
            let mut fields = Map::new();
            fields.insert(DATE_COLUMN.to_string(), Value::String(day.to_string()));
            for (name, range) in CATEGORIES {
                fields.insert(name.to_string(), Value::from(rng.gen_range(range.clone())));
            }
            Record {
                admitted: AdmissionDate::Known(day.and_time(NaiveTime::default())),
                total_value: None,
                age: None,
                municipality: None,
                fields,
            }
        })
        .collect();

    Dataset::from_records(DatasetKind::Synthetic, records)
}

pub fn hospitals() -> Vec<HospitalRow> {
    vec![
        HospitalRow {
            name: "Hospital Municipal São José",
            city: "São Paulo",
            region: "Sudeste",
            beds: 245,
            occupancy: 0.78,
            admissions: 1245,
            revenue: "R$ 295.000",
            status: "Ativo",
        },
        HospitalRow {
            name: "Hospital Regional Norte",
            city: "Brasília",
            region: "Centro-Oeste",
            beds: 180,
            occupancy: 0.65,
            admissions: 892,
            revenue: "R$ 198.000",
            status: "Ativo",
        },
        HospitalRow {
            name: "Hospital Geral Sul",
            city: "Porto Alegre",
            region: "Sul",
            beds: 310,
            occupancy: 0.92,
            admissions: 1550,
            revenue: "R$ 350.000",
            status: "Ativo",
        },
    ]
}
