//! Outbound notification delivery.

mod discord;
mod error;
mod sink;

pub use discord::DiscordWebhook;
pub use error::DeliveryError;
pub use sink::{LogSink, NotifySink};
