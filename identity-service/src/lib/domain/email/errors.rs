use thiserror::Error;

/// Error for outbound email delivery.
///
/// Transport failures of any kind are reported through the single
/// `Delivery` category; callers decide whether to propagate or log.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("Email delivery failed: {0}")]
    Delivery(String),
}
