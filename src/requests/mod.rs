//! The request lifecycle: state machine, persistence boundary, outreach
//! trigger, and the timer-driven fallback simulation.

pub mod domain;
pub mod engine;
pub mod outreach;
pub mod simulator;
pub mod store;

pub use domain::{
    BloodRequest, NewRequest, RequestId, RequestStage, TimelineEvent, Urgency, ValidationError,
};
pub use engine::{EngineError, RequestLifecycleEngine, SubscriptionHandle};
pub use outreach::{OutreachOutcome, OutreachPayload, OutreachTrigger, WebhookOutreach};
pub use simulator::{FallbackSimulator, SimulatorConfig, SimulatorError};
pub use store::{InMemoryRequestStore, RequestStore, StoreError, TransitionPatch};
