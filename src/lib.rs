//! Coordination core for urgent blood-donation requests.
//!
//! The crate owns the request lifecycle state machine
//! (`pending → matching → contacting → awaiting → secured`), the donor match
//! stage over a directory scan, the outreach webhook trigger, and the
//! timer-driven fallback simulation used when the automation endpoint cannot
//! be confirmed. The surrounding application plugs in through the
//! [`requests::RequestStore`] and [`donors::DonorDirectory`] boundaries and
//! observes changes through [`requests::RequestLifecycleEngine::subscribe`].

pub mod config;
pub mod donors;
pub mod error;
pub mod fuzzy;
pub mod requests;
pub mod telemetry;

pub use error::AppError;
