use careconnect_client::ApiError;
use careconnect_core::{LocationError, VerificationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Verification(#[from] VerificationError),
    #[error(transparent)]
    Location(#[from] LocationError),
    #[error("age must be verified first")]
    AgeNotVerified,
    #[error("age and location must both be set before choosing a category")]
    CategoryLocked,
    #[error("age, location and category are required to search")]
    SearchNotReady,
    #[error("chat is not ready until age and location are set")]
    ChatNotReady,
    #[error("message is empty")]
    EmptyMessage,
    #[error(transparent)]
    Catalog(#[from] anyhow::Error),
    #[error("Failed to send message. Please try again.")]
    SendFailed {
        #[source]
        source: ApiError,
    },
    #[error("Failed to load service details. Please try again.")]
    DetailUnavailable {
        id: String,
        #[source]
        source: ApiError,
    },
}
