// Webhook payload shape for post-submission results (C11).

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct WebhookPayload {
    #[serde(rename = "creatorAddress")]
    pub creator_address: String,
    #[serde(rename = "interactorAddress")]
    pub interactor_address: String,
    pub validation: ValidationPayload,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationPayload {
    #[serde(rename = "aiAgentResponseApproved")]
    pub approved: bool,
    #[serde(rename = "significanceScore")]
    pub significance_score: f64,
    pub reason: String,
    #[serde(rename = "finalUserScore")]
    pub final_user_score: f64,
    pub post_id: String,
}
