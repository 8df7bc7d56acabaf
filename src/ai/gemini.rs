//! Google Gemini `generateContent` client.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::GenerativeModel;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

pub struct Gemini {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl Gemini {
    /// Build a client whose requests give up after `timeout_secs`.
    pub fn new(api_key: String, model: String, timeout_secs: u64) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            http,
            api_key,
            model,
        })
    }

    fn url(&self) -> String {
        format!("{API_BASE}/{}:generateContent", self.model)
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateResponse {
    /// The text of the first candidate, if it has any.
    fn into_text(self) -> Option<String> {
        let parts = self.candidates.into_iter().next()?.content?.parts;
        let text: String = parts.into_iter().filter_map(|part| part.text).collect();
        (!text.is_empty()).then_some(text)
    }
}

#[rocket::async_trait]
impl GenerativeModel for Gemini {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let body = GenerateRequest {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
        };
        let response = self
            .http
            .post(self.url())
            .query(&[("key", &self.api_key)])
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::upstream(format!("Gemini returned {status}")));
        }
        response
            .json::<GenerateResponse>()
            .await?
            .into_text()
            .ok_or_else(|| Error::upstream("Gemini returned no text"))
    }
}
