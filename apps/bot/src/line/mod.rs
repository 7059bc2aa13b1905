//! LINE Messaging API adapter: webhook signature check, event payloads and
//! the reply client.

mod client;
mod event;
mod signature;

pub use client::{LineClient, Messenger};
pub use event::{Event, TextMessage, WebhookBody};
pub use signature::{SIGNATURE_HEADER, SignatureVerifier};
