use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Slot {0} is no longer available")]
    SlotUnavailable(Uuid),

    #[error("Persistence error: {0}")]
    Persistence(#[from] eyre::Report),

    #[error("Notification error: {0}")]
    Notification(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl BookingError {
    /// Short, user-facing message. The detailed error is for logs only.
    pub fn public_message(&self) -> String {
        match self {
            Self::Validation(msg) => msg.clone(),
            Self::NotFound(_) => "The requested resource was not found".to_string(),
            Self::SlotUnavailable(_) => {
                "This time slot is no longer available, please choose another one".to_string()
            }
            Self::Persistence(_) | Self::Notification(_) | Self::Internal(_) => {
                "Could not complete the action, please try again".to_string()
            }
        }
    }
}

pub type BookingResult<T> = Result<T, BookingError>;
