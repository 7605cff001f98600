pub mod age;
pub mod error;
pub mod location;
pub mod models;
pub mod verification;

pub use age::{classify, is_valid_age, needs_guardian_verification, parse_age};
pub use error::{AgeInputError, LocationError, VerificationError};
pub use location::{distance_between, distance_km, lookup_city, DeviceLocator, FixedLocator, LocationResolver};
pub use models::*;
pub use verification::{
    AgeVerificationFlow, FlowStage, GuardianChoice, Step, VerificationConfig, GUARDIAN_ADVISORY,
};
