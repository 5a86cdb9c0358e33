use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::config::ALL_REGIONS;
use crate::indicators::{self, IndicatorCards};
use crate::models::{Dataset, DatasetView, FilterState, IndicatorSet};
use crate::schema;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterChange {
    Start(Option<NaiveDate>),
    End(Option<NaiveDate>),
    /// `None` selects all regions.
    Region(Option<String>),
    Clear,
}

impl FromStr for FilterChange {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (command, arg) = match line.split_once(char::is_whitespace) {
            Some((command, arg)) => (command, arg.trim()),
            None => (line, ""),
        };

        match command {
            "start" => parse_bound(arg).map(Self::Start),
            "end" => parse_bound(arg).map(Self::End),
            "region" => Ok(Self::Region(region_selection(arg))),
            "clear" => Ok(Self::Clear),
            other => Err(format!("unknown filter command: {other}")),
        }
    }
}

fn parse_bound(arg: &str) -> Result<Option<NaiveDate>, String> {
    if arg.is_empty() || arg == "none" {
        return Ok(None);
    }
    schema::parse_date(arg)
        .map(Some)
        .ok_or_else(|| format!("invalid date: {arg}"))
}

pub fn region_selection(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() || value == ALL_REGIONS {
        None
    } else {
        Some(value.to_string())
    }
}

/// The date bound only applies when both ends are set. The region bound is
/// skipped for datasets with no region column, synthetic ones included.
pub fn filter_view<'a>(dataset: &'a Dataset, filter: &FilterState) -> DatasetView<'a> {
    let mut view = dataset.view();

    if let (Some(start), Some(end)) = (filter.start, filter.end) {
        view.records.retain(|record| {
            record
                .admitted
                .date()
                .is_some_and(|date| start <= date && date <= end)
        });
    }

    if let Some(region) = &filter.region {
        if dataset.has_region() {
            view.records
                .retain(|record| record.municipality.as_deref() == Some(region.as_str()));
        }
    }

    view
}

#[derive(Debug, Clone)]
pub struct DashboardContext {
    dataset: Arc<Dataset>,
    filter: FilterState,
}

impl DashboardContext {
    pub fn new(dataset: Arc<Dataset>, filter: FilterState) -> Self {
        Self { dataset, filter }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn view(&self) -> DatasetView<'_> {
        filter_view(&self.dataset, &self.filter)
    }

    pub fn indicators(&self) -> IndicatorSet {
        indicators::indicator_set(&self.view())
    }

    pub fn apply(&mut self, change: FilterChange) -> IndicatorCards {
        match change {
            FilterChange::Start(date) => self.filter.start = date,
            FilterChange::End(date) => self.filter.end = date,
            FilterChange::Region(region) => self.filter.region = region,
            FilterChange::Clear => self.filter = FilterState::default(),
        }
        IndicatorCards::from(&self.indicators())
    }
}
