use std::collections::BTreeSet;

use crate::error::SelectorError;
use crate::loader::Dataset;
use crate::models::SalesRecord;

pub const ALL_WEEKS: &str = "All Weeks";
pub const ALL_BRANCHES: &str = "All Branches";

/// Week selector options in display order. Selector 0 means no week filter.
#[derive(Debug, Clone)]
pub struct WeekBuckets {
    entries: Vec<(String, u32)>,
}

impl WeekBuckets {
    pub fn build(last_week_number: u32) -> Self {
        let mut entries = Vec::with_capacity(last_week_number as usize + 1);
        entries.push((ALL_WEEKS.to_string(), 0));
        entries.extend((1..=last_week_number).map(|week| (format!("Week {week}"), week)));
        Self { entries }
    }

    pub fn selector(&self, label: &str) -> Option<u32> {
        self.entries
            .iter()
            .find(|(name, _)| name == label)
            .map(|(_, week)| *week)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[derive(Debug, Clone)]
pub struct BranchCatalog {
    labels: Vec<String>,
}

impl BranchCatalog {
    pub fn build(records: &[SalesRecord]) -> Self {
        let distinct: BTreeSet<&str> = records.iter().map(|record| record.branch.as_str()).collect();
        let mut labels = Vec::with_capacity(distinct.len() + 1);
        labels.push(ALL_BRANCHES.to_string());
        labels.extend(distinct.into_iter().map(str::to_string));
        Self { labels }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchFilter {
    All,
    Only(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub week: u32,
    pub branch: BranchFilter,
}

impl Selection {
    #[cfg(test)]
    pub fn everything() -> Self {
        Self {
            week: 0,
            branch: BranchFilter::All,
        }
    }
}

/// Loaded dataset plus the selector catalogs. Built once, read-only afterwards.
#[derive(Debug, Clone)]
pub struct DashboardContext {
    dataset: Dataset,
    weeks: WeekBuckets,
    branches: BranchCatalog,
}

impl DashboardContext {
    pub fn new(dataset: Dataset) -> Self {
        let weeks = WeekBuckets::build(dataset.last_week_number);
        let branches = BranchCatalog::build(&dataset.records);
        Self {
            dataset,
            weeks,
            branches,
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn records(&self) -> &[SalesRecord] {
        &self.dataset.records
    }

    pub fn reference_year(&self) -> i32 {
        self.dataset.reference_year
    }

    pub fn weeks(&self) -> &WeekBuckets {
        &self.weeks
    }

    pub fn branches(&self) -> &BranchCatalog {
        &self.branches
    }

    pub fn resolve(&self, time_period: &str, branch: &str) -> Result<Selection, SelectorError> {
        let week = self
            .weeks
            .selector(time_period)
            .ok_or_else(|| SelectorError::UnknownTimePeriod(time_period.to_string()))?;

        // Position 0 is the sentinel; anything else names a concrete branch.
        let branch = match self.branches.labels.iter().position(|name| name == branch) {
            Some(0) => BranchFilter::All,
            Some(_) => BranchFilter::Only(branch.to_string()),
            None => return Err(SelectorError::UnknownBranch(branch.to_string())),
        };

        Ok(Selection { week, branch })
    }
}
