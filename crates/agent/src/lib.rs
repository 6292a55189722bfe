//! The wardrobe assistant core.
//!
//! Every user action follows the same short pipeline:
//!
//! 1. **Assemble** an instruction from weather, wardrobe, and the user's goal
//! 2. **Send** it through the inference gateway (bounded retry with backoff)
//! 3. **Decode** the model text into the expected shape
//! 4. **Return** a decoded value or a typed `Failure`; never panic
//!
//! [`WardrobeService`] adds the persistence and weather collaborators on top.

pub mod assistant;
pub mod context;
pub mod decoder;
pub mod service;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use assistant::{ClassifiedImage, WardrobeAssistant};
pub use context::{ChatContext, ContextAssembler, Intent, OutfitContext};
pub use service::{Recommendation, WardrobeService};
