use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Mail API rejected message with status {status}: {body}")]
    Rejected {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("No recipients configured")]
    NoRecipients,
}
