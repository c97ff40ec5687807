//! Patient search over the locally loaded list

use crate::constants::MAX_SEARCH_RESULTS;
use crate::models::Patient;

/// Patients matching `query`, in list order, at most [`MAX_SEARCH_RESULTS`].
///
/// A patient matches when "last first" contains the query (case-insensitive)
/// or when the national id starts with it. A blank query matches nothing.
pub fn search_patients<'a>(patients: &'a [Patient], query: &str) -> Vec<&'a Patient> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }

    patients
        .iter()
        .filter(|p| matches(p, &query))
        .take(MAX_SEARCH_RESULTS)
        .collect()
}

fn matches(patient: &Patient, query: &str) -> bool {
    let name = format!("{} {}", patient.last_name, patient.first_name).to_lowercase();
    name.contains(query) || patient.national_id.starts_with(query)
}
