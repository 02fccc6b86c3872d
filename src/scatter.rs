use crate::model::{LaunchRecord, PayloadRange, ScatterPoint, SiteSelection};

pub const X_LABEL: &str = "Payload Mass (kg)";
pub const Y_LABEL: &str = "class";
pub const COLOR_LABEL: &str = "Booster Version Category";

/// Records inside `range` (inclusive) at the selected site, in dataset order.
/// A site that never occurs just produces no points.
pub fn filter(
    records: &[LaunchRecord],
    selection: &SiteSelection,
    range: PayloadRange,
) -> Vec<ScatterPoint> {
    records
        .iter()
        .filter(|r| range.contains(r.payload_mass_kg))
        .filter(|r| selection.matches(&r.launch_site))
        .map(ScatterPoint::from)
        .collect()
}

pub fn title(selection: &SiteSelection) -> String {
    match selection {
        SiteSelection::All => "Payload vs. Outcome for All Sites".to_string(),
        SiteSelection::Site(site) => format!("Payload vs. Outcome for {}", site),
    }
}
