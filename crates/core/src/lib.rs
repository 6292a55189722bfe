//! # Wardrobe Core
//!
//! Domain types, traits, and error definitions for the wardrobe assistant.
//! This crate has **no I/O**; it defines the value objects and seams that
//! the provider, store, weather, and agent crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator is a trait here:
//! - [`WardrobeStore`] for persistence
//! - [`WeatherSource`] for current conditions
//!
//! Inference calls never raise: they return [`InferenceResult`], whose
//! error side is a typed [`Failure`] with a stable [`FailureKind`].

pub mod cancel;
pub mod error;
pub mod inference;
pub mod store;
pub mod wardrobe;
pub mod weather;

// Re-export key types at crate root for ergonomics
pub use cancel::CancellationToken;
pub use error::{Error, Failure, FailureKind, ImageError, Result, StoreError, WeatherError};
pub use inference::{CallPhase, ChatRole, ChatTurn, ImagePayload, InferenceRequest, InferenceResult};
pub use store::WardrobeStore;
pub use wardrobe::{Category, Classification, FeedbackRecord, OutfitPick, OutfitPlan, WardrobeItem};
pub use weather::{Location, WeatherSnapshot, WeatherSource};
