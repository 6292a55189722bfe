//! Inference provider plumbing for the wardrobe assistant.
//!
//! - [`gemini`] owns the `generateContent` wire format.
//! - [`transport`] moves one JSON body over HTTP.
//! - [`gateway`] wraps both in the bounded retry loop that every
//!   inference call goes through.

pub mod gateway;
pub mod gemini;
pub mod transport;

pub use gateway::{GatewaySettings, InferenceGateway};
pub use transport::{HttpReply, InferenceTransport, ReqwestTransport, TransportError};
