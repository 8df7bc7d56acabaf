//! The hostel assistant and issue categorisation.
//!
//! Both try the configured generative model first and fall back to fixed
//! keyword rules when there is no model, or the model fails or times out.

use log::warn;
use serde::Deserialize;

use crate::{
    error::Result,
    model::db::{
        issue::{IssueCategory, IssuePrediction, IssuePriority},
        user::User,
    },
};

pub mod gemini;
pub mod keywords;

/// A text-in, text-out language model.
#[rocket::async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Managed state wrapping the optional model.
pub struct AiService {
    model: Option<Box<dyn GenerativeModel>>,
}

impl AiService {
    pub fn new(model: Box<dyn GenerativeModel>) -> Self {
        Self { model: Some(model) }
    }

    pub fn keywords_only() -> Self {
        Self { model: None }
    }

    /// Answer a user's question.
    pub async fn chat(&self, user: &User, message: &str) -> String {
        if let Some(model) = &self.model {
            match model.generate(&chat_prompt(user, message)).await {
                Ok(reply) if !reply.trim().is_empty() => return reply,
                Ok(_) => warn!("Model returned an empty chat reply, using keywords"),
                Err(e) => warn!("Model chat failed, using keywords: {e}"),
            }
        }
        keywords::chat_reply(message).to_string()
    }

    /// Predict the category and priority of an issue.
    pub async fn categorize(&self, title: &str, description: &str) -> IssuePrediction {
        if let Some(model) = &self.model {
            match model.generate(&categorize_prompt(title, description)).await {
                Ok(text) => match parse_prediction(&text) {
                    Ok(prediction) => return prediction,
                    Err(e) => warn!("Unparseable prediction {text:?}, using keywords: {e}"),
                },
                Err(e) => warn!("Model prediction failed, using keywords: {e}"),
            }
        }
        keywords::categorize(title, description)
    }
}

fn chat_prompt(user: &User, message: &str) -> String {
    format!(
        "You are a helpful Hostel AI Assistant.\n\
         Current User: {} ({})\n\
         Hostel: {}\n\n\
         Capabilities:\n\
         - Help with reporting issues (Maintenance, Electrical, etc.)\n\
         - Guide on Mess Menu and Voting\n\
         - Explain Gate Pass procedures\n\
         - Provide info on Laundry and Marketplace\n\n\
         Keep answers concise and helpful. If unsure, suggest contacting the warden.\n\n\
         User Question: {message}",
        user.name,
        user.role,
        user.hostel.as_deref().unwrap_or("N/A"),
    )
}

fn categorize_prompt(title: &str, description: &str) -> String {
    format!(
        "Analyze this hostel issue and categorize it.\n\
         Title: {title}\n\
         Description: {description}\n\n\
         Respond in JSON format with:\n\
         - category: One of [Plumbing, Electrical, Cleanliness, Internet, Furniture, Security, Others]\n\
         - priority: One of [Low, Medium, High, Emergency]\n\
         - confidence: Float 0.0-1.0\n\
         - estimated_hours: Int (hours to fix)\n"
    )
}

/// The JSON shape the model is asked for.
#[derive(Deserialize)]
struct ModelPrediction {
    category: IssueCategory,
    priority: IssuePriority,
    confidence: f64,
    estimated_hours: f64,
}

/// Remove a surrounding markdown code fence, if any.
fn strip_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(inner) = text.strip_prefix("```") else {
        return text;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

/// Parse a model's categorisation reply.
pub fn parse_prediction(text: &str) -> std::result::Result<IssuePrediction, serde_json::Error> {
    let prediction: ModelPrediction = serde_json::from_str(strip_fences(text))?;
    Ok(IssuePrediction {
        category: prediction.category,
        priority: prediction.priority,
        confidence_score: prediction.confidence.clamp(0.0, 1.0),
        estimated_resolution_hours: prediction.estimated_hours.max(0.0),
    })
}

#[cfg(test)]
mod tests {
    use rocket::tokio;

    use super::*;
    use crate::error::Error;

    struct Canned(Option<&'static str>);

    #[rocket::async_trait]
    impl GenerativeModel for Canned {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            self.0
                .map(str::to_string)
                .ok_or_else(|| Error::upstream("model unavailable"))
        }
    }

    #[test]
    fn fenced_prediction() {
        let text = "```json\n{\"category\": \"Electrical\", \"priority\": \"High\", \"confidence\": 0.92, \"estimated_hours\": 4}\n```";
        let prediction = parse_prediction(text).unwrap();
        assert_eq!(prediction.category, IssueCategory::Electrical);
        assert_eq!(prediction.priority, IssuePriority::High);
        assert_eq!(prediction.confidence_score, 0.92);
        assert_eq!(prediction.estimated_resolution_hours, 4.0);
    }

    #[test]
    fn bare_prediction() {
        let text = r#"{"category":"Internet","priority":"Low","confidence":1.7,"estimated_hours":2}"#;
        let prediction = parse_prediction(text).unwrap();
        assert_eq!(prediction.category, IssueCategory::Internet);
        assert_eq!(prediction.confidence_score, 1.0);
    }

    #[test]
    fn invalid_prediction() {
        assert!(parse_prediction("The issue looks electrical.").is_err());
        assert!(parse_prediction(r#"{"category":"Weather","priority":"Low","confidence":0.5,"estimated_hours":1}"#).is_err());
    }

    #[tokio::test]
    async fn model_reply_is_used() {
        let service = AiService::new(Box::new(Canned(Some("Dinner is at 8."))));
        let reply = service.chat(&User::example_student(), "when is dinner").await;
        assert_eq!(reply, "Dinner is at 8.");
    }

    #[tokio::test]
    async fn failing_model_falls_back() {
        let service = AiService::new(Box::new(Canned(None)));
        let reply = service.chat(&User::example_student(), "hello").await;
        assert_eq!(reply, keywords::chat_reply("hello"));

        let prediction = service.categorize("Tap leaking", "Water everywhere").await;
        assert_eq!(prediction.category, IssueCategory::Plumbing);
        assert_eq!(prediction.confidence_score, keywords::FALLBACK_CONFIDENCE);
    }

    #[tokio::test]
    async fn garbled_prediction_falls_back() {
        let service = AiService::new(Box::new(Canned(Some("no idea"))));
        let prediction = service.categorize("Broken chair", "One leg snapped").await;
        assert_eq!(prediction.category, IssueCategory::Furniture);
    }
}
