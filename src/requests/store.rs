use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use super::domain::{BloodRequest, RequestId, RequestStage, TimelineEvent};

/// Atomic transition applied to a stored request: status and progress are
/// overwritten together and the event is appended to the timeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionPatch {
    pub status: RequestStage,
    pub progress: u8,
    pub event: TimelineEvent,
}

/// Keyed document store for requests. The engine owns all mutations; readers
/// get snapshots ordered newest first.
pub trait RequestStore: Send + Sync {
    fn create(&self, request: BloodRequest) -> Result<BloodRequest, StoreError>;
    fn fetch(&self, id: &RequestId) -> Result<Option<BloodRequest>, StoreError>;
    fn patch(&self, id: &RequestId, patch: TransitionPatch) -> Result<BloodRequest, StoreError>;
    fn list_by_org(&self, org_id: &str) -> Result<Vec<BloodRequest>, StoreError>;
    fn list_all(&self) -> Result<Vec<BloodRequest>, StoreError>;
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("request already exists")]
    Conflict,
    #[error("request not found")]
    NotFound,
    #[error("request store unavailable: {0}")]
    Unavailable(String),
}

/// Process-local store backing tests and standalone deployments.
#[derive(Default, Clone)]
pub struct InMemoryRequestStore {
    records: Arc<Mutex<HashMap<RequestId, BloodRequest>>>,
}

impl InMemoryRequestStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sorted_newest_first(mut requests: Vec<BloodRequest>) -> Vec<BloodRequest> {
    requests.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.0.cmp(&a.id.0)));
    requests
}

impl RequestStore for InMemoryRequestStore {
    fn create(&self, request: BloodRequest) -> Result<BloodRequest, StoreError> {
        let mut guard = self.records.lock().expect("request store mutex poisoned");
        if guard.contains_key(&request.id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(request.id.clone(), request.clone());
        Ok(request)
    }

    fn fetch(&self, id: &RequestId) -> Result<Option<BloodRequest>, StoreError> {
        let guard = self.records.lock().expect("request store mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn patch(&self, id: &RequestId, patch: TransitionPatch) -> Result<BloodRequest, StoreError> {
        let mut guard = self.records.lock().expect("request store mutex poisoned");
        let record = guard.get_mut(id).ok_or(StoreError::NotFound)?;

        record.status = patch.status;
        record.progress = patch.progress;
        record.timeline.push(patch.event);

        Ok(record.clone())
    }

    fn list_by_org(&self, org_id: &str) -> Result<Vec<BloodRequest>, StoreError> {
        let guard = self.records.lock().expect("request store mutex poisoned");
        let requests = guard
            .values()
            .filter(|request| request.org_id == org_id)
            .cloned()
            .collect();
        Ok(sorted_newest_first(requests))
    }

    fn list_all(&self) -> Result<Vec<BloodRequest>, StoreError> {
        let guard = self.records.lock().expect("request store mutex poisoned");
        Ok(sorted_newest_first(guard.values().cloned().collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::donors::BloodGroup;
    use crate::requests::domain::Urgency;
    use chrono::{Duration, Utc};

    fn request(id: u32, org_id: &str, minutes_ago: i64) -> BloodRequest {
        let created_at = Utc::now() - Duration::minutes(minutes_ago);
        BloodRequest {
            id: RequestId(format!("req-{id:06}")),
            patient_name: "Ravi".to_string(),
            patient_phone: "9840012345".to_string(),
            blood_group: BloodGroup::OPositive,
            location: "Anna Nagar".to_string(),
            urgency: Urgency::High,
            org_id: org_id.to_string(),
            status: RequestStage::Pending,
            progress: 0,
            timeline: vec![TimelineEvent::at(RequestStage::Pending, created_at)],
            created_at,
        }
    }

    #[test]
    fn create_rejects_duplicate_ids() {
        let store = InMemoryRequestStore::new();
        store.create(request(1, "org-a", 0)).expect("creates");
        let err = store.create(request(1, "org-a", 0)).expect_err("duplicate");
        assert!(matches!(err, StoreError::Conflict));
    }

    #[test]
    fn patch_overwrites_status_and_appends_event() {
        let store = InMemoryRequestStore::new();
        store.create(request(2, "org-a", 0)).expect("creates");

        let id = RequestId("req-000002".to_string());
        let updated = store
            .patch(
                &id,
                TransitionPatch {
                    status: RequestStage::Matching,
                    progress: RequestStage::Matching.progress(),
                    event: TimelineEvent::at(RequestStage::Matching, Utc::now()),
                },
            )
            .expect("patches");

        assert_eq!(updated.status, RequestStage::Matching);
        assert_eq!(updated.progress, 40);
        assert_eq!(updated.timeline.len(), 2);
        assert_eq!(updated.timeline.last().map(|e| e.status), Some(RequestStage::Matching));
    }

    #[test]
    fn patch_of_missing_request_is_not_found() {
        let store = InMemoryRequestStore::new();
        let err = store
            .patch(
                &RequestId("req-999999".to_string()),
                TransitionPatch {
                    status: RequestStage::Matching,
                    progress: 40,
                    event: TimelineEvent::at(RequestStage::Matching, Utc::now()),
                },
            )
            .expect_err("missing record");
        assert!(matches!(err, StoreError::NotFound));
    }

    #[test]
    fn listings_partition_by_org_and_order_newest_first() {
        let store = InMemoryRequestStore::new();
        store.create(request(3, "org-a", 30)).expect("creates");
        store.create(request(4, "org-b", 20)).expect("creates");
        store.create(request(5, "org-a", 10)).expect("creates");

        let org_a = store.list_by_org("org-a").expect("lists");
        let ids: Vec<&str> = org_a.iter().map(|r| r.id.0.as_str()).collect();
        assert_eq!(ids, vec!["req-000005", "req-000003"]);

        let all = store.list_all().expect("lists");
        let ids: Vec<&str> = all.iter().map(|r| r.id.0.as_str()).collect();
        assert_eq!(ids, vec!["req-000005", "req-000004", "req-000003"]);
    }
}
