//! Sketch-to-website generation through a vision model.
//!
//! The generator validates the uploaded sketch, builds the instruction prompt,
//! hands both to a [`VisionModel`] and turns the model's text back into a
//! [`SiteCode`] bundle.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::config::GeminiSettings;
use crate::error::{AppError, AppResult};
use crate::models::{GenerateRequest, SiteCode};

/// Site type used when the request does not name one.
pub const DEFAULT_SITE_TYPE: &str = "Landing Page";

const DEFAULT_IMAGE_MIME: &str = "image/png";

/// A decoded-and-checked image ready to be sent inline to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    /// Base64 payload, as received.
    pub data: String,
}

/// Multimodal model that answers a text prompt about one image.
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Return the model's raw text answer.
    async fn generate(&self, prompt: &str, image: &InlineImage) -> AppResult<String>;
}

fn missing_image() -> AppError {
    AppError::InvalidInput("Image is required".to_string())
}

/// Split a `data:<mime>;base64,<payload>` URL.
///
/// A string without the `data:` prefix is taken as raw base64 PNG.
pub fn parse_data_url(input: &str) -> AppResult<InlineImage> {
    let input = input.trim();
    if input.is_empty() {
        return Err(missing_image());
    }

    let (mime_type, payload) = match input.strip_prefix("data:") {
        Some(rest) => {
            let (header, payload) = rest.split_once(',').ok_or_else(|| {
                AppError::InvalidInput("Image data URL is malformed".to_string())
            })?;
            let mime = header.strip_suffix(";base64").ok_or_else(|| {
                AppError::InvalidInput("Image data URL must be base64 encoded".to_string())
            })?;
            // Drop parameters such as `;charset=utf-8`.
            let mime = mime.split(';').next().unwrap_or_default().trim();
            let mime = if mime.is_empty() { DEFAULT_IMAGE_MIME } else { mime };
            (mime.to_string(), payload)
        }
        None => (DEFAULT_IMAGE_MIME.to_string(), input),
    };

    if payload.is_empty() {
        return Err(missing_image());
    }

    BASE64
        .decode(payload)
        .map_err(|_| AppError::InvalidInput("Image is not valid base64".to_string()))?;

    Ok(InlineImage {
        mime_type,
        data: payload.to_string(),
    })
}

/// Instruction prompt sent alongside the sketch.
pub fn build_prompt(site_type: Option<&str>, extra: Option<&str>) -> String {
    let site_type = site_type
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_SITE_TYPE);

    let mut prompt = format!(
        "You are an expert web developer.\n\
         Analyze the attached hand-drawn sketch and convert it into a fully functional, high-quality website.\n\
         The website type is: {site_type}.\n\
         \n\
         Requirements:\n\
         1. Return a single JSON object with \"html\", \"css\", and \"js\" string fields.\n\
         2. Use semantic HTML5.\n\
         3. Use modern, premium Vanilla CSS (gradients, shadows, clean typography).\n\
         4. Ensure responsiveness.\n\
         5. The code should be self-contained and ready to be rendered in an iframe.\n"
    );

    if let Some(extra) = extra.map(str::trim).filter(|p| !p.is_empty()) {
        prompt.push_str("\nAdditional instructions: ");
        prompt.push_str(extra);
        prompt.push('\n');
    }

    prompt
}

/// Remove every markdown code-fence marker and surrounding whitespace.
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

/// Shape the model must answer with. `css` and `js` may be omitted.
#[derive(Deserialize)]
struct ModelSite {
    html: String,
    #[serde(default)]
    css: String,
    #[serde(default)]
    js: String,
}

/// Parse the model's answer into a code bundle.
///
/// Any failure keeps the unmodified text in `AppError::InvalidModelOutput`.
pub fn parse_model_output(raw: &str) -> AppResult<SiteCode> {
    let cleaned = strip_code_fences(raw);
    let parsed = serde_json::from_str::<serde_json::Value>(&cleaned)
        .map_err(|e| e.to_string())
        .and_then(|value| match value {
            // Derived struct impls also accept sequences; only an object is a site.
            value @ serde_json::Value::Object(_) => {
                serde_json::from_value::<ModelSite>(value).map_err(|e| e.to_string())
            }
            _ => Err("model answer is not a JSON object".to_string()),
        });

    match parsed {
        Ok(site) => Ok(SiteCode {
            html: site.html,
            css: site.css,
            js: site.js,
        }),
        Err(e) => {
            error!(error = %e, raw_len = raw.len(), "Failed to parse model response");
            Err(AppError::InvalidModelOutput {
                raw: raw.to_string(),
            })
        }
    }
}

/// Orchestrates one generation request.
#[derive(Clone)]
pub struct SiteGenerator {
    model: Arc<dyn VisionModel>,
}

impl SiteGenerator {
    pub fn new(model: Arc<dyn VisionModel>) -> Self {
        Self { model }
    }

    /// Validate the sketch, call the model and parse its answer.
    pub async fn generate(&self, request: &GenerateRequest) -> AppResult<SiteCode> {
        let image = parse_data_url(request.image.as_deref().unwrap_or_default())?;
        let prompt = build_prompt(request.site_type.as_deref(), request.prompt.as_deref());

        let raw = self.model.generate(&prompt, &image).await?;
        let code = parse_model_output(&raw)?;

        info!(
            html_len = code.html.len(),
            css_len = code.css.len(),
            js_len = code.js.len(),
            "Site generated"
        );
        Ok(code)
    }
}

// ============================================================================
// Gemini
// ============================================================================

/// Google Gemini `generateContent` client.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: Option<SecretString>,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(settings: &GeminiSettings) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

#[derive(Serialize)]
struct GenerateContentBody<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 2],
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text { text: &'a str },
    Image { inline_data: InlineData<'a> },
}

#[derive(Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
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

#[derive(Deserialize)]
struct GeminiErrorResponse {
    error: GeminiErrorBody,
}

#[derive(Deserialize)]
struct GeminiErrorBody {
    message: String,
}

#[async_trait]
impl VisionModel for GeminiClient {
    async fn generate(&self, prompt: &str, image: &InlineImage) -> AppResult<String> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| AppError::Configuration("Gemini API key not configured".to_string()))?;

        let body = GenerateContentBody {
            contents: [Content {
                parts: [
                    Part::Text { text: prompt },
                    Part::Image {
                        inline_data: InlineData {
                            mime_type: &image.mime_type,
                            data: &image.data,
                        },
                    },
                ],
            }],
        };

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GeminiErrorResponse>(&text)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| format!("Gemini request failed with status {}", status));
            return Err(AppError::Upstream(message));
        }

        let parsed: GenerateContentResponse = response.json().await?;
        let candidate = parsed
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Upstream("Gemini returned no candidates".to_string()))?;

        Ok(candidate
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<String>()
            })
            .unwrap_or_default())
    }
}
