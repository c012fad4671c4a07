use crate::app::report::Report;
use serde_derive::Serialize;

/// Summary over a set of reports. Durations are in seconds; the median is the
/// element at index `len / 2` of the sorted durations, so for an even count it is
/// the upper of the two middle values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Results {
    pub errors: usize,
    pub successes: usize,
    pub min: f64,
    pub median: f64,
    pub max: f64,
}

pub fn aggregate(reports: &[Report]) -> Results {
    let mut results = Results::default();
    let mut durations = Vec::with_capacity(reports.len());
    for report in reports {
        match report.duration_millis() {
            Some(millis) => {
                durations.push(millis);
                results.successes += 1;
            }
            None => results.errors += 1,
        }
    }
    durations.sort_unstable();
    if let (Some(first), Some(last)) = (durations.first(), durations.last()) {
        results.min = seconds(*first);
        results.max = seconds(*last);
        results.median = seconds(durations[durations.len() / 2]);
    }
    results
}

fn seconds(millis: i64) -> f64 {
    millis as f64 / 1000.0
}
