use super::domain::{BloodGroup, Donor};
use crate::fuzzy;

/// Default edit-distance threshold for the location/name filter. Tune upward
/// for longer queries via [`DonorSearch::new`] or `FUZZY_MATCH_THRESHOLD`.
pub const DEFAULT_FUZZY_THRESHOLD: usize = 2;

/// Donor match stage: exact blood-group restriction followed by a fuzzy
/// name/location filter.
#[derive(Debug, Clone, Copy)]
pub struct DonorSearch {
    threshold: usize,
}

impl Default for DonorSearch {
    fn default() -> Self {
        Self::new(DEFAULT_FUZZY_THRESHOLD)
    }
}

impl DonorSearch {
    pub const fn new(threshold: usize) -> Self {
        Self { threshold }
    }

    pub const fn threshold(&self) -> usize {
        self.threshold
    }

    /// Rank-preserving filter over a directory scan. Blood group is matched
    /// by equality only; the location query runs through the fuzzy filter.
    /// An empty dimension constrains nothing.
    pub fn run(
        &self,
        blood_group: Option<BloodGroup>,
        location_query: &str,
        donors: Vec<Donor>,
    ) -> Vec<Donor> {
        let candidates: Vec<Donor> = match blood_group {
            Some(group) => donors
                .into_iter()
                .filter(|donor| donor.blood_group == group)
                .collect(),
            None => donors,
        };

        fuzzy::fuzzy_filter(location_query, candidates, self.threshold)
    }
}
