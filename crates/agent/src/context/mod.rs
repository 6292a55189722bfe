//! Context assembly for the three inference intents.
//!
//! | Intent | Instruction | Extras |
//! |--------|-------------|--------|
//! | ImageClassification | JSON-array template | images, in order |
//! | OutfitRecommendation | weather + wardrobe + goal + feedback template | none |
//! | FreeformChat | raw utterance | system preamble, windowed history |

pub mod assembler;

pub use assembler::{ChatContext, ContextAssembler, Intent, OutfitContext, wardrobe_summary};
