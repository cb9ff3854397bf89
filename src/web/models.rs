// Request/response bodies for the HTTP surface.

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct SubmitActionRequest {
    #[serde(rename = "creatorAddress")]
    pub creator_address: String,
    #[serde(rename = "interactorAddress")]
    pub interactor_address: String,
    #[serde(rename = "Interaction")]
    pub interaction: InteractionBody,
    #[serde(rename = "webhookUrl")]
    pub webhook_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InteractionBody {
    #[serde(rename = "interactionType")]
    pub interaction_type: String,
    pub data: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct SubmitActionResponse {
    #[serde(rename = "aiAgentResponseApproved")]
    pub approved: bool,
    #[serde(rename = "significanceScore")]
    pub significance_score: f64,
    pub reason: String,
    #[serde(rename = "finalUserScore")]
    pub final_user_score: f64,
}

#[derive(Debug, Deserialize)]
pub struct SubmitPostRequest {
    #[serde(rename = "creatorAddress")]
    pub creator_address: String,
    #[serde(rename = "interactorAddress")]
    pub interactor_address: String,
    pub data: String,
    pub post_id: String,
    #[serde(rename = "webhookUrl")]
    pub webhook_url: Option<String>,
    /// Base64-encoded image bytes, when the post carries one.
    pub image_base64: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AcceptedResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
