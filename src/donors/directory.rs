use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;

use super::domain::{Donor, DonorId, DonorPatch, DonorStatus, NewDonor};

/// Storage abstraction for the donor pool. The engine only consumes
/// `list_all`; create/update/delete exist for the surrounding application.
pub trait DonorDirectory: Send + Sync {
    fn create(&self, donor: NewDonor) -> Result<DonorId, DirectoryError>;
    fn update(&self, id: &DonorId, patch: DonorPatch) -> Result<(), DirectoryError>;
    fn delete(&self, id: &DonorId) -> Result<(), DirectoryError>;
    /// Every donor record, newest registration first.
    fn list_all(&self) -> Result<Vec<Donor>, DirectoryError>;
}

/// Error enumeration for directory failures.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("donor record not found")]
    NotFound,
    #[error("directory unavailable: {0}")]
    Unavailable(String),
}

static DONOR_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_donor_id() -> DonorId {
    let id = DONOR_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    DonorId(format!("donor-{id:06}"))
}

/// Process-local directory backing tests and standalone deployments.
#[derive(Default, Clone)]
pub struct InMemoryDonorDirectory {
    records: Arc<Mutex<HashMap<DonorId, Donor>>>,
}

impl InMemoryDonorDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DonorDirectory for InMemoryDonorDirectory {
    fn create(&self, donor: NewDonor) -> Result<DonorId, DirectoryError> {
        let id = next_donor_id();
        let record = Donor {
            id: id.clone(),
            name: donor.name,
            blood_group: donor.blood_group,
            location: donor.location,
            contact_number: donor.contact_number,
            email: donor.email,
            last_donation: donor.last_donation,
            status: DonorStatus::Active,
            created_at: Utc::now(),
        };

        let mut guard = self.records.lock().expect("directory mutex poisoned");
        guard.insert(id.clone(), record);
        Ok(id)
    }

    fn update(&self, id: &DonorId, patch: DonorPatch) -> Result<(), DirectoryError> {
        let mut guard = self.records.lock().expect("directory mutex poisoned");
        let record = guard.get_mut(id).ok_or(DirectoryError::NotFound)?;

        if let Some(name) = patch.name {
            record.name = name;
        }
        if let Some(blood_group) = patch.blood_group {
            record.blood_group = blood_group;
        }
        if let Some(location) = patch.location {
            record.location = location;
        }
        if let Some(contact_number) = patch.contact_number {
            record.contact_number = contact_number;
        }
        if let Some(email) = patch.email {
            record.email = email;
        }
        if let Some(last_donation) = patch.last_donation {
            record.last_donation = last_donation;
        }
        if let Some(status) = patch.status {
            record.status = status;
        }

        Ok(())
    }

    fn delete(&self, id: &DonorId) -> Result<(), DirectoryError> {
        let mut guard = self.records.lock().expect("directory mutex poisoned");
        guard.remove(id).map(|_| ()).ok_or(DirectoryError::NotFound)
    }

    fn list_all(&self) -> Result<Vec<Donor>, DirectoryError> {
        let guard = self.records.lock().expect("directory mutex poisoned");
        let mut donors: Vec<Donor> = guard.values().cloned().collect();
        donors.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.0.cmp(&a.id.0)));
        Ok(donors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_donor(name: &str) -> NewDonor {
        NewDonor {
            name: name.to_string(),
            blood_group: super::super::domain::BloodGroup::OPositive,
            location: "Anna Nagar".to_string(),
            contact_number: "9840012345".to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            last_donation: NaiveDate::from_ymd_opt(2026, 5, 12).expect("valid date"),
        }
    }

    #[test]
    fn create_defaults_to_active_status() {
        let directory = InMemoryDonorDirectory::new();
        directory.create(sample_donor("Arun")).expect("creates");

        let donors = directory.list_all().expect("lists");
        assert_eq!(donors.len(), 1);
        assert_eq!(donors[0].status, DonorStatus::Active);
        assert_eq!(donors[0].name, "Arun");
    }

    #[test]
    fn update_applies_only_provided_fields() {
        let directory = InMemoryDonorDirectory::new();
        let id = directory.create(sample_donor("Meena")).expect("creates");

        directory
            .update(
                &id,
                DonorPatch {
                    status: Some(DonorStatus::Inactive),
                    location: Some("T Nagar".to_string()),
                    ..DonorPatch::default()
                },
            )
            .expect("updates");

        let donors = directory.list_all().expect("lists");
        assert_eq!(donors[0].status, DonorStatus::Inactive);
        assert_eq!(donors[0].location, "T Nagar");
        assert_eq!(donors[0].name, "Meena");
    }

    #[test]
    fn delete_of_missing_record_is_not_found() {
        let directory = InMemoryDonorDirectory::new();
        let err = directory
            .delete(&DonorId("donor-999999".to_string()))
            .expect_err("missing record");
        assert!(matches!(err, DirectoryError::NotFound));
    }

    #[test]
    fn list_all_orders_newest_first() {
        let directory = InMemoryDonorDirectory::new();
        let first = directory.create(sample_donor("First")).expect("creates");
        let second = directory.create(sample_donor("Second")).expect("creates");

        let donors = directory.list_all().expect("lists");
        assert_eq!(donors.len(), 2);
        // Identical timestamps fall back to the id sequence, newest first.
        assert_eq!(donors[0].id, second);
        assert_eq!(donors[1].id, first);
    }
}
