//! Success counts for the pie chart.
//!
//! In all-sites mode the value per site is the sum of the `class` column, which for
//! binary outcomes is the number of successful launches at that site. Sites come out
//! in ascending name order. In single-site mode the slices are `Success` then
//! `Failure`; a label with a zero count is left out.

use std::collections::BTreeMap;

use crate::error::DashError;
use crate::model::{LaunchRecord, PieSlice, SiteSelection};

pub const SUCCESS_LABEL: &str = "Success";
pub const FAILURE_LABEL: &str = "Failure";

pub fn aggregate(
    records: &[LaunchRecord],
    selection: &SiteSelection,
) -> Result<Vec<PieSlice>, DashError> {
    match selection {
        SiteSelection::All => Ok(successes_by_site(records)),
        SiteSelection::Site(site) => outcome_split(records, site),
    }
}

fn successes_by_site(records: &[LaunchRecord]) -> Vec<PieSlice> {
    let mut sums: BTreeMap<&str, u64> = BTreeMap::new();
    for rec in records {
        *sums.entry(rec.launch_site.as_str()).or_insert(0) += rec.outcome as u64;
    }
    sums.into_iter()
        .map(|(site, total)| PieSlice::new(site, total))
        .collect()
}

fn outcome_split(records: &[LaunchRecord], site: &str) -> Result<Vec<PieSlice>, DashError> {
    let mut seen = false;
    let mut success = 0u64;
    let mut failure = 0u64;
    for rec in records.iter().filter(|r| r.launch_site == site) {
        seen = true;
        if rec.is_success() {
            success += 1;
        } else {
            failure += 1;
        }
    }
    if !seen {
        return Err(DashError::UnknownSite(site.to_string()));
    }

    let mut slices = Vec::with_capacity(2);
    if success > 0 {
        slices.push(PieSlice::new(SUCCESS_LABEL, success));
    }
    if failure > 0 {
        slices.push(PieSlice::new(FAILURE_LABEL, failure));
    }
    Ok(slices)
}

pub fn title(selection: &SiteSelection) -> String {
    match selection {
        SiteSelection::All => "Total Successes by Site".to_string(),
        SiteSelection::Site(site) => format!("Success for {} site", site),
    }
}
