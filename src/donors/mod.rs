//! Donor records, the directory boundary, and the match stage.

pub mod directory;
pub mod domain;
pub mod search;

pub use directory::{DirectoryError, DonorDirectory, InMemoryDonorDirectory};
pub use domain::{
    BloodGroup, Donor, DonorId, DonorPatch, DonorStatus, NewDonor, ParseBloodGroupError,
};
pub use search::{DonorSearch, DEFAULT_FUZZY_THRESHOLD};
