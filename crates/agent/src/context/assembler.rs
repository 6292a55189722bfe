//! Context assembly — turns caller intent into an [`InferenceRequest`].
//!
//! Three fixed templates, one per [`Intent`]:
//!
//! 1. **ImageClassification**: demands a bare JSON array with one object
//!    per attached image; images pass through in input order.
//! 2. **OutfitRecommendation**: embeds weather, the wardrobe summary,
//!    destination, activity, and the most recent feedback comments, and
//!    demands a `{outfit, tip}` JSON object.
//! 3. **FreeformChat**: the utterance is sent as-is; weather and wardrobe
//!    context ride in a system preamble rebuilt on every call.
//!
//! # Determinism
//!
//! Assembly is a pure transformation: no I/O, no clock, no randomness.
//! Missing inputs are replaced by neutral defaults so the text never
//! carries a placeholder for an absent value.

use wardrobe_config::AssistantConfig;
use wardrobe_core::inference::{ChatTurn, ImagePayload, InferenceRequest};
use wardrobe_core::wardrobe::{FeedbackRecord, WardrobeItem};
use wardrobe_core::weather::WeatherSnapshot;
use wardrobe_weather::weather_report;

// ── Types ─────────────────────────────────────────────────────────────────

/// What the caller wants from the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    ImageClassification,
    OutfitRecommendation,
    FreeformChat,
}

/// Inputs for an outfit recommendation.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutfitContext<'a> {
    /// Current conditions, if the weather fetch succeeded.
    pub weather: Option<&'a WeatherSnapshot>,
    /// Wardrobe snapshot, in store order.
    pub wardrobe: &'a [WardrobeItem],
    pub destination: &'a str,
    pub activity: &'a str,
    /// Feedback history, oldest first.
    pub feedback: &'a [FeedbackRecord],
}

/// Inputs for a freeform chat turn.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChatContext<'a> {
    pub weather: Option<&'a WeatherSnapshot>,
    pub wardrobe: &'a [WardrobeItem],
    /// Prior turns, oldest first.
    pub history: &'a [ChatTurn],
    pub message: &'a str,
}

// ── Defaults ──────────────────────────────────────────────────────────────

const UNKNOWN: &str = "unknown";
const DEFAULT_DESTINATION: &str = "anywhere";
const DEFAULT_ACTIVITY: &str = "daily activities";
const EMPTY_WARDROBE: &str = "no items yet";

// ── Assembler ─────────────────────────────────────────────────────────────

/// The context assembler. Holds only configuration; reuse freely.
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    feedback_window: usize,
    chat_history_window: usize,
    style_preference: String,
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::from_config(&AssistantConfig::default())
    }
}

impl ContextAssembler {
    pub fn new(
        feedback_window: usize,
        chat_history_window: usize,
        style_preference: impl Into<String>,
    ) -> Self {
        Self {
            feedback_window,
            chat_history_window,
            style_preference: style_preference.into(),
        }
    }

    pub fn from_config(config: &AssistantConfig) -> Self {
        Self::new(
            config.feedback_window,
            config.chat_history_window,
            config.style_preference.clone(),
        )
    }

    /// Build the classification request. Images are moved in unchanged.
    pub fn classification(&self, images: Vec<ImagePayload>) -> InferenceRequest {
        let count = images.len();
        let instruction = format!(
            "You are a wardrobe cataloguing assistant. {count} clothing photo(s) are attached. \
             Identify the single main garment in each photo.\n\
             Respond with a JSON array containing exactly {count} object(s), one per photo, \
             in the same order as the photos.\n\
             Each object has the fields:\n\
             - \"category\": one of \"top\", \"bottom\", \"shoes\", \"outerwear\", \"accessory\"\n\
             - \"color\": the dominant color\n\
             - \"style\": a short style description (e.g. \"casual\", \"formal\", \"sporty\")\n\
             - \"material\": the fabric if recognizable (optional)\n\
             - \"reason\": one short sentence explaining the classification (optional)\n\
             Return only the JSON array. Do not add any text, explanation, or Markdown \
             before or after it."
        );
        InferenceRequest::new(instruction).with_images(images)
    }

    /// Build the outfit recommendation request.
    pub fn outfit(&self, ctx: &OutfitContext<'_>) -> InferenceRequest {
        let (temperature, condition) = weather_fields(ctx.weather);
        let location = ctx
            .weather
            .map(|w| non_blank(&w.location_label, UNKNOWN))
            .unwrap_or(UNKNOWN);

        let mut instruction = format!(
            "You are a personal stylist. Choose one outfit from the user's wardrobe.\n\
             Weather: {temperature}, {condition} ({location}).\n\
             Destination: {destination}.\n\
             Activity: {activity}.\n\
             Preferred style: {style}.\n\
             Wardrobe ({count} item(s)): [{summary}].\n",
            destination = non_blank(ctx.destination, DEFAULT_DESTINATION),
            activity = non_blank(ctx.activity, DEFAULT_ACTIVITY),
            style = non_blank(&self.style_preference, UNKNOWN),
            count = ctx.wardrobe.len(),
            summary = wardrobe_summary(ctx.wardrobe),
        );

        let comments = self.recent_feedback(ctx.feedback);
        if comments.is_empty() {
            instruction.push_str("Recent feedback: none.\n");
        } else {
            instruction.push_str("Recent feedback on earlier suggestions:\n");
            for comment in comments {
                instruction.push_str("- ");
                instruction.push_str(&comment);
                instruction.push('\n');
            }
        }

        instruction.push_str(
            "Only pick items listed in the wardrobe. If it lacks something the weather needs, \
             say so in the tip.\n\
             Respond with JSON only, shaped exactly as \
             {\"outfit\": [{\"item\": \"...\", \"reason\": \"...\"}], \"tip\": \"...\"}. \
             Do not add any other text.",
        );

        InferenceRequest::new(instruction)
    }

    /// Build the chat request: raw utterance plus a fresh system preamble.
    pub fn chat(&self, ctx: &ChatContext<'_>) -> InferenceRequest {
        let history_start = ctx.history.len().saturating_sub(self.chat_history_window);
        InferenceRequest::new(ctx.message)
            .with_system_preamble(self.chat_preamble(ctx))
            .with_history(ctx.history[history_start..].to_vec())
    }

    /// Persona and context framing for chat. Rebuilt on every call.
    pub fn chat_preamble(&self, ctx: &ChatContext<'_>) -> String {
        let weather = match ctx.weather {
            Some(snapshot) => weather_report(snapshot),
            None => format!("Weather: {UNKNOWN}."),
        };
        let summary = if ctx.wardrobe.is_empty() {
            String::new()
        } else {
            format!(" Items: {}.", wardrobe_summary(ctx.wardrobe))
        };

        format!(
            "You are a friendly personal stylist helping the user decide what to wear. \
             Keep answers short and practical.\n\
             {weather}\n\
             The user's wardrobe has {count} item(s).{summary}\n\
             Preferred style: {style}.",
            count = ctx.wardrobe.len(),
            style = non_blank(&self.style_preference, UNKNOWN),
        )
    }

    /// Comments from the newest `feedback_window` records, oldest first.
    fn recent_feedback(&self, feedback: &[FeedbackRecord]) -> Vec<String> {
        let start = feedback.len().saturating_sub(self.feedback_window);
        feedback[start..]
            .iter()
            .map(|record| {
                let comment = non_blank(&record.comment, "no comment");
                format!("{}/5 on {}: {comment}", record.score, record.date)
            })
            .collect()
    }
}

/// Project items to `category(color, style)` joined with `; `.
pub fn wardrobe_summary(items: &[WardrobeItem]) -> String {
    if items.is_empty() {
        return EMPTY_WARDROBE.to_string();
    }
    items
        .iter()
        .map(WardrobeItem::summary)
        .collect::<Vec<_>>()
        .join("; ")
}

fn weather_fields(weather: Option<&WeatherSnapshot>) -> (String, &str) {
    match weather {
        Some(w) => (
            format!("{}°C", w.temperature),
            non_blank(&w.condition, UNKNOWN),
        ),
        None => (format!("{UNKNOWN} temperature"), UNKNOWN),
    }
}

fn non_blank<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value.trim()
    }
}
