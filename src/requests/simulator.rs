use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, info, warn};

use super::domain::{RequestId, RequestStage};
use super::engine::{EngineError, RequestLifecycleEngine};
use super::store::RequestStore;

/// Per-stage delays for the fallback replay. Defaults mirror the automation
/// workflow's observed pacing.
#[derive(Debug, Clone, Copy)]
pub struct SimulatorConfig {
    pub matching_delay: Duration,
    pub contacting_delay: Duration,
    pub awaiting_delay: Duration,
    pub secured_delay: Duration,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            matching_delay: Duration::from_secs(2),
            contacting_delay: Duration::from_secs(4),
            awaiting_delay: Duration::from_secs(3),
            secured_delay: Duration::from_secs(2),
        }
    }
}

impl SimulatorConfig {
    fn delay_for(&self, stage: RequestStage) -> Duration {
        match stage {
            RequestStage::Matching => self.matching_delay,
            RequestStage::Contacting => self.contacting_delay,
            RequestStage::Awaiting => self.awaiting_delay,
            RequestStage::Secured => self.secured_delay,
            // Pending is never replayed.
            RequestStage::Pending => Duration::ZERO,
        }
    }

    pub fn total(&self) -> Duration {
        self.matching_delay + self.contacting_delay + self.awaiting_delay + self.secured_delay
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SimulatorError {
    #[error("fallback simulation already running for request {0}")]
    AlreadyRunning(RequestId),
}

/// Timer-driven stand-in that walks a request through the non-initial stages
/// when the outreach endpoint cannot be confirmed. At most one simulation may
/// run per request; the registry enforces it.
pub struct FallbackSimulator {
    config: SimulatorConfig,
    active: Mutex<HashSet<RequestId>>,
}

impl Default for FallbackSimulator {
    fn default() -> Self {
        Self::new(SimulatorConfig::default())
    }
}

impl FallbackSimulator {
    pub fn new(config: SimulatorConfig) -> Self {
        Self {
            config,
            active: Mutex::new(HashSet::new()),
        }
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    pub fn is_running(&self, request_id: &RequestId) -> bool {
        self.active
            .lock()
            .expect("simulator registry poisoned")
            .contains(request_id)
    }

    /// Reserve the request's simulation slot and spawn the replay task.
    /// Starting a second simulation for the same request is a programming
    /// error and is rejected.
    pub fn start<S>(
        self: &Arc<Self>,
        engine: Arc<RequestLifecycleEngine<S>>,
        request_id: RequestId,
    ) -> Result<(), SimulatorError>
    where
        S: RequestStore + 'static,
    {
        {
            let mut active = self.active.lock().expect("simulator registry poisoned");
            if !active.insert(request_id.clone()) {
                return Err(SimulatorError::AlreadyRunning(request_id));
            }
        }

        let simulator = Arc::clone(self);
        tokio::spawn(async move {
            simulator.replay(engine, &request_id).await;
            simulator
                .active
                .lock()
                .expect("simulator registry poisoned")
                .remove(&request_id);
            debug!(%request_id, "fallback simulation finished");
        });

        Ok(())
    }

    async fn replay<S>(&self, engine: Arc<RequestLifecycleEngine<S>>, request_id: &RequestId)
    where
        S: RequestStore + 'static,
    {
        for stage in RequestStage::fallback_order() {
            tokio::time::sleep(self.config.delay_for(stage)).await;

            match engine.advance(request_id, stage) {
                Ok(_) => {
                    info!(%request_id, %stage, "fallback simulation advanced request");
                }
                Err(EngineError::InvalidTransition { from, to }) => {
                    // The external authority advanced the request out of
                    // band; it wins, and the replay stops pushing stages.
                    debug!(%request_id, %from, %to, "request advanced externally, stopping simulation");
                    return;
                }
                Err(err) => {
                    warn!(%request_id, %stage, error = %err, "fallback simulation aborted");
                    return;
                }
            }
        }
    }
}
