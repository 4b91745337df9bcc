use thiserror::Error;

use crate::form::FormError;

#[derive(Debug, Error)]
pub enum BoardError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error(transparent)]
    Form(#[from] FormError),
    #[error("A save is already in flight")]
    SaveInFlight,
}
