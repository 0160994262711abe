use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::{AnnotationSource, AnnotatorConfig, AnnotatorError, ModelReply};
use crate::annotation::records_from_value;
use crate::modes::{AnalysisMode, RecordShape};
use crate::upload::MediaHandle;

/// Function names the model is asked to call, one per record shape.
const FN_TIMECODES: &str = "set_timecodes";
const FN_TIMECODES_WITH_OBJECTS: &str = "set_timecodes_with_objects";
const FN_TIMECODES_WITH_VALUES: &str = "set_timecodes_with_numeric_values";

/// Gemini-backed annotation source.
///
/// Sends the uploaded media handle plus the mode's prompt, declaring one
/// timecode-setting function for the expected record shape. The structured
/// function call is preferred; bare text parts are the fallback reply.
pub struct GeminiAnnotator {
    config: AnnotatorConfig,
    client: reqwest::Client,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Tool>>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum RequestPart {
    Text(String),
    #[serde(rename_all = "camelCase")]
    FileData { file_uri: String, mime_type: String },
}

#[derive(Debug, Serialize)]
struct Tool {
    #[serde(rename = "functionDeclarations")]
    function_declarations: Vec<FunctionDeclaration>,
}

#[derive(Debug, Serialize)]
struct FunctionDeclaration {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
    #[serde(rename = "functionCall")]
    function_call: Option<FunctionCall>,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    name: String,
    args: Value,
}

impl GeminiAnnotator {
    pub fn new(config: AnnotatorConfig) -> anyhow::Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("MEDIA_ANNOTATOR_API_KEY").ok())
            .ok_or_else(|| anyhow::anyhow!("Gemini API key required (config or MEDIA_ANNOTATOR_API_KEY)"))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            config,
            client,
            api_key,
        })
    }

    fn declaration_for(shape: RecordShape) -> Option<FunctionDeclaration> {
        let (name, description, item_properties) = match shape {
            RecordShape::Text => (
                FN_TIMECODES,
                "Set the timecoded captions for the media",
                serde_json::json!({
                    "time": {"type": "string"},
                    "text": {"type": "string"},
                }),
            ),
            RecordShape::Objects => (
                FN_TIMECODES_WITH_OBJECTS,
                "Set the timecoded captions and visible objects for the media",
                serde_json::json!({
                    "time": {"type": "string"},
                    "text": {"type": "string"},
                    "objects": {"type": "array", "items": {"type": "string"}},
                }),
            ),
            RecordShape::Value => (
                FN_TIMECODES_WITH_VALUES,
                "Set the timecoded numeric readings for the media",
                serde_json::json!({
                    "time": {"type": "string"},
                    "value": {"type": "number"},
                }),
            ),
            RecordShape::FreeText => return None,
        };

        Some(FunctionDeclaration {
            name: name.to_string(),
            description: description.to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "timecodes": {
                        "type": "array",
                        "items": {"type": "object", "properties": item_properties},
                    }
                },
                "required": ["timecodes"],
            }),
        })
    }

    /// Pull the record batch out of the first timecode-setting function
    /// call, or fall back to concatenated text parts.
    fn reply_from_response(response: GenerateResponse) -> Result<ModelReply, AnnotatorError> {
        let parts = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts)
            .unwrap_or_default();

        let mut texts = Vec::new();
        for part in parts {
            if let Some(call) = part.function_call {
                if let Some(batch) = Self::batch_from_call(call)? {
                    return Ok(ModelReply::Records(batch));
                }
            } else if let Some(text) = part.text {
                texts.push(text);
            }
        }

        let text = texts.concat();
        if text.trim().is_empty() {
            Ok(ModelReply::Empty)
        } else {
            Ok(ModelReply::Text(text))
        }
    }

    fn batch_from_call(
        call: FunctionCall,
    ) -> Result<Option<Vec<crate::annotation::AnnotationRecord>>, AnnotatorError> {
        if !matches!(
            call.name.as_str(),
            FN_TIMECODES | FN_TIMECODES_WITH_OBJECTS | FN_TIMECODES_WITH_VALUES
        ) {
            debug!("Ignoring unexpected function call '{}'", call.name);
            return Ok(None);
        }

        let timecodes = match call.args.get("timecodes") {
            Some(value) => value.clone(),
            // A call with no payload counts as an empty reply, not an error.
            None => return Ok(Some(Vec::new())),
        };

        records_from_value(timecodes)
            .map(Some)
            .map_err(|e| AnnotatorError::Upstream(e.to_string()))
    }
}

#[async_trait]
impl AnnotationSource for GeminiAnnotator {
    async fn annotate(
        &self,
        media: &MediaHandle,
        mode: &AnalysisMode,
    ) -> Result<ModelReply, AnnotatorError> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    RequestPart::FileData {
                        file_uri: media.uri.clone(),
                        mime_type: media.mime_type.clone(),
                    },
                    RequestPart::Text(mode.prompt()),
                ],
            }],
            tools: Self::declaration_for(mode.expects()).map(|decl| {
                vec![Tool {
                    function_declarations: vec![decl],
                }]
            }),
        };

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.config.endpoint, self.config.model, self.api_key
        );

        debug!("Sending {} analysis request to Gemini", mode.label());

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AnnotatorError::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AnnotatorError::Upstream(format!(
                "Gemini API error {}: {}",
                status, body
            )));
        }

        let decoded: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AnnotatorError::Upstream(e.to_string()))?;

        Self::reply_from_response(decoded)
    }
}
