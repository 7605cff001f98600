use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AgeInputError {
    #[error("age must be an integer between 0 and 120")]
    NotAnInteger,
    #[error("age must be an integer between 0 and 120")]
    OutOfRange(i64),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    #[error(transparent)]
    InvalidAge(#[from] AgeInputError),
    #[error("a guardian status must be selected before continuing")]
    GuardianChoiceMissing,
    #[error("the flow is not collecting {expected}")]
    WrongStep { expected: &'static str },
    #[error("age is already verified; reset the flow to verify again")]
    AlreadyVerified,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("location services are not available on this device")]
    Unsupported,
    #[error("unable to get your location: {0}")]
    Denied(String),
    #[error("City not found. Please try {known}.")]
    CityNotFound { query: String, known: String },
}
