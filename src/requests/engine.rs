use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::{info, warn};

use super::domain::{
    BloodRequest, NewRequest, RequestId, RequestStage, TimelineEvent, ValidationError,
};
use super::outreach::{OutreachOutcome, OutreachPayload, OutreachTrigger};
use super::simulator::FallbackSimulator;
use super::store::{RequestStore, StoreError, TransitionPatch};
use crate::donors::{DonorDirectory, DonorSearch};

/// Error raised by the lifecycle engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("no transition from {from} to {to}")]
    InvalidTransition {
        from: RequestStage,
        to: RequestStage,
    },
    #[error("request {0} not found")]
    NotFound(RequestId),
    #[error(transparent)]
    Store(#[from] StoreError),
}

static REQUEST_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_request_id() -> RequestId {
    let id = REQUEST_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    RequestId(format!("req-{id:06}"))
}

type SubscriberCallback = Arc<dyn Fn(Vec<BloodRequest>) + Send + Sync>;

struct Subscriber {
    org_id: String,
    callback: SubscriberCallback,
    active: Arc<AtomicBool>,
}

/// Handle returned by [`RequestLifecycleEngine::subscribe`]. Dropping the
/// handle keeps the subscription alive; call [`cancel`](Self::cancel) to end
/// it. Cancellation is immediate: no new callback starts afterwards.
pub struct SubscriptionHandle {
    id: u64,
    active: Arc<AtomicBool>,
    registry: Arc<Mutex<HashMap<u64, Subscriber>>>,
}

impl SubscriptionHandle {
    pub fn cancel(self) {
        self.active.store(false, Ordering::Release);
        self.registry
            .lock()
            .expect("subscriber registry poisoned")
            .remove(&self.id);
    }
}

struct MatchStage {
    directory: Arc<dyn DonorDirectory>,
    search: DonorSearch,
}

/// Owner of the request state machine. Creates requests, runs the donor
/// match stage, serializes stage transitions, dispatches outreach, and
/// streams per-org snapshots to subscribers.
pub struct RequestLifecycleEngine<S> {
    store: Arc<S>,
    outreach: Arc<dyn OutreachTrigger>,
    simulator: Arc<FallbackSimulator>,
    matching: Option<MatchStage>,
    subscribers: Arc<Mutex<HashMap<u64, Subscriber>>>,
    subscriber_sequence: AtomicU64,
    transition_locks: Mutex<HashMap<RequestId, Arc<Mutex<()>>>>,
}

impl<S> RequestLifecycleEngine<S>
where
    S: RequestStore + 'static,
{
    pub fn new(
        store: Arc<S>,
        outreach: Arc<dyn OutreachTrigger>,
        simulator: Arc<FallbackSimulator>,
    ) -> Self {
        Self {
            store,
            outreach,
            simulator,
            matching: None,
            subscribers: Arc::new(Mutex::new(HashMap::new())),
            subscriber_sequence: AtomicU64::new(1),
            transition_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Enable the donor match stage: each new request ranks the directory by
    /// its blood group and location before outreach is attempted.
    pub fn with_donor_matching(
        mut self,
        directory: Arc<dyn DonorDirectory>,
        search: DonorSearch,
    ) -> Self {
        self.matching = Some(MatchStage { directory, search });
        self
    }

    pub fn simulator(&self) -> &Arc<FallbackSimulator> {
        &self.simulator
    }

    /// Validate and persist a new request, then dispatch outreach in the
    /// background. The caller gets the assigned id before outreach resolves;
    /// outreach failures never roll the request back.
    pub fn create_request(self: &Arc<Self>, data: NewRequest) -> Result<RequestId, EngineError> {
        data.validate()?;

        let id = next_request_id();
        let now = Utc::now();
        let request = BloodRequest {
            id: id.clone(),
            patient_name: data.patient_name,
            patient_phone: data.patient_phone,
            blood_group: data.blood_group,
            location: data.location,
            urgency: data.urgency,
            org_id: data.org_id,
            status: RequestStage::Pending,
            progress: RequestStage::Pending.progress(),
            timeline: vec![TimelineEvent::at(RequestStage::Pending, now)],
            created_at: now,
        };

        let stored = self.store.create(request)?;
        info!(request_id = %id, org_id = %stored.org_id, "blood request created");
        self.notify(&stored.org_id);

        let engine = Arc::clone(self);
        let payload = OutreachPayload::from_request(&stored);
        tokio::spawn(async move {
            engine.dispatch_outreach(payload).await;
        });

        Ok(id)
    }

    async fn dispatch_outreach(self: Arc<Self>, payload: OutreachPayload) {
        let request_id = payload.request_id.clone();

        if let Some(stage) = &self.matching {
            match stage.directory.list_all() {
                Ok(donors) => {
                    let candidates =
                        stage
                            .search
                            .run(Some(payload.blood_group), &payload.location, donors);
                    info!(%request_id, candidates = candidates.len(), "donor match stage completed");
                }
                Err(err) => {
                    warn!(%request_id, error = %err, "donor directory scan failed");
                }
            }
        }

        match self.outreach.trigger(payload).await {
            OutreachOutcome::Confirmed => {
                // External automation owns the remaining transitions; they
                // arrive through `advance` via an out-of-scope ingress.
                info!(%request_id, "outreach confirmed, awaiting external progress");
            }
            OutreachOutcome::Unreachable(reason) => {
                warn!(%request_id, %reason, "outreach unreachable, starting fallback simulation");
                let simulator = Arc::clone(&self.simulator);
                if let Err(err) = simulator.start(Arc::clone(&self), request_id.clone()) {
                    warn!(%request_id, error = %err, "fallback simulation not started");
                }
            }
        }
    }

    /// Move a request to the immediate successor of its stored stage.
    /// Transitions for one request are serialized; out-of-order callers get
    /// `InvalidTransition` and mutate nothing. Subscribers of the owning org
    /// are notified before this returns.
    pub fn advance(
        &self,
        request_id: &RequestId,
        next: RequestStage,
    ) -> Result<BloodRequest, EngineError> {
        let updated = {
            let lock = self.transition_lock(request_id);
            let _guard = lock.lock().expect("transition lock poisoned");

            let current = self
                .store
                .fetch(request_id)?
                .ok_or_else(|| EngineError::NotFound(request_id.clone()))?;

            if current.status.successor() != Some(next) {
                return Err(EngineError::InvalidTransition {
                    from: current.status,
                    to: next,
                });
            }

            self.store.patch(
                request_id,
                TransitionPatch {
                    status: next,
                    progress: next.progress(),
                    event: TimelineEvent::at(next, Utc::now()),
                },
            )?
        };

        info!(%request_id, stage = %next, progress = updated.progress, "request advanced");
        self.notify(&updated.org_id);
        Ok(updated)
    }

    /// Register a live observer for one organization's requests. The callback
    /// receives the full snapshot, newest first, on every change to that
    /// org's set. Orgs are strictly partitioned.
    pub fn subscribe<F>(&self, org_id: &str, callback: F) -> SubscriptionHandle
    where
        F: Fn(Vec<BloodRequest>) + Send + Sync + 'static,
    {
        let id = self.subscriber_sequence.fetch_add(1, Ordering::Relaxed);
        let active = Arc::new(AtomicBool::new(true));

        self.subscribers
            .lock()
            .expect("subscriber registry poisoned")
            .insert(
                id,
                Subscriber {
                    org_id: org_id.to_string(),
                    callback: Arc::new(callback),
                    active: Arc::clone(&active),
                },
            );

        SubscriptionHandle {
            id,
            active,
            registry: Arc::clone(&self.subscribers),
        }
    }

    /// Every request across all organizations, newest first. Read-side
    /// aggregation only; the state machine never consumes this.
    pub fn list_all(&self) -> Result<Vec<BloodRequest>, EngineError> {
        Ok(self.store.list_all()?)
    }

    fn transition_lock(&self, request_id: &RequestId) -> Arc<Mutex<()>> {
        let mut locks = self
            .transition_locks
            .lock()
            .expect("transition lock table poisoned");
        Arc::clone(locks.entry(request_id.clone()).or_default())
    }

    /// Push the current snapshot to every live subscriber of `org_id`. Runs
    /// inside the mutating operation, after the write committed and the
    /// per-request guard was released (callbacks may re-enter the engine).
    fn notify(&self, org_id: &str) {
        let targets: Vec<(Arc<AtomicBool>, SubscriberCallback)> = {
            let registry = self.subscribers.lock().expect("subscriber registry poisoned");
            registry
                .values()
                .filter(|subscriber| subscriber.org_id == org_id)
                .map(|subscriber| {
                    (
                        Arc::clone(&subscriber.active),
                        Arc::clone(&subscriber.callback),
                    )
                })
                .collect()
        };

        if targets.is_empty() {
            return;
        }

        let snapshot = match self.store.list_by_org(org_id) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(%org_id, error = %err, "subscriber snapshot unavailable");
                return;
            }
        };

        for (active, callback) in targets {
            if active.load(Ordering::Acquire) {
                callback(snapshot.clone());
            }
        }
    }
}
