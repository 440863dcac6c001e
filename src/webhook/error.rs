//! Delivery error types.

/// Errors from the notification transport.
///
/// A failed delivery is logged and the payload dropped; the batch was
/// already cleared at flush time (at-least-once, not exactly-once).
#[derive(thiserror::Error, Debug)]
pub enum DeliveryError {
    /// The HTTP request could not be completed.
    #[error("Notification request failed: {0}")]
    Request(String),

    /// The request timed out.
    #[error("Notification request timed out")]
    Timeout,

    /// The endpoint answered with a non-success status.
    #[error("Notification endpoint returned HTTP {code}: {body}")]
    Status { code: u16, body: String },
}
