// Intake router (C9) — classifies a request as the synchronous fast path
// (like/comment/tip/crypto/referral) or the asynchronous validated path
// (post), driving C7 directly or handing off to C8.
//
// Points are always awarded to the interactor, never the creator; the
// creator address is carried through only so it can be echoed back in the
// webhook payload.

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use tracing::warn;

use crate::config::{Config, PointsConfig};
use crate::content_index::{ContentIndex, DeleteOutcome as IndexDeleteOutcome};
use crate::db::{ApplyOutcome, ScoreStore};
use crate::queue::{JobHandler, JobQueue, PostJob};
use crate::scoring::{engine, InteractionCategory};
use crate::validator::{ValidationOutcome, Validator};
use crate::webhook::{ValidationPayload, WebhookDispatcher, WebhookPayload};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ActionResponse {
    pub approved: bool,
    pub significance_score: f64,
    pub reason: String,
    pub final_user_score: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DeleteResponse {
    pub status: String,
    pub post_id: String,
    pub user_id: String,
}

pub struct IntakeRouter {
    store: Arc<dyn ScoreStore>,
    content_index: Arc<dyn ContentIndex>,
    queue: Arc<dyn JobQueue>,
    config: PointsConfig,
}

impl IntakeRouter {
    pub fn new(
        store: Arc<dyn ScoreStore>,
        content_index: Arc<dyn ContentIndex>,
        queue: Arc<dyn JobQueue>,
        config: PointsConfig,
    ) -> Self {
        Self {
            store,
            content_index,
            queue,
            config,
        }
    }

    /// Synchronous fast path: like, comment, tip, crypto, referral.
    pub async fn submit_action(
        &self,
        interactor_id: &str,
        category: InteractionCategory,
    ) -> Result<ActionResponse> {
        let now = Utc::now();
        let today = now.date_naive();
        let outcome = engine::apply_fixed(
            &self.store,
            interactor_id,
            category,
            today,
            now,
            self.config.clone(),
        )
        .await?;

        Ok(outcome_to_response(outcome))
    }

    /// Asynchronous path: enqueue the post for validation and scoring.
    pub async fn submit_post(
        &self,
        creator_id: &str,
        interactor_id: &str,
        post_id: &str,
        content: &str,
        image: Option<Vec<u8>>,
        webhook_url: Option<String>,
    ) -> Result<()> {
        self.queue
            .enqueue(PostJob {
                post_id: post_id.to_string(),
                creator_id: creator_id.to_string(),
                interactor_id: interactor_id.to_string(),
                content: content.to_string(),
                image,
                webhook_url,
            })
            .await
    }

    /// Delete a post: removes it from the content index, then refunds the
    /// originally-awarded delta. Absent record is `not_found`.
    pub async fn delete_post(&self, post_id: &str, user_id: &str) -> Result<DeleteResponse> {
        match self.content_index.delete(post_id, user_id).await? {
            IndexDeleteOutcome::NotFound => Ok(DeleteResponse {
                status: "not_found".to_string(),
                post_id: post_id.to_string(),
                user_id: user_id.to_string(),
            }),
            IndexDeleteOutcome::UserMismatch => Ok(DeleteResponse {
                status: "not_found".to_string(),
                post_id: post_id.to_string(),
                user_id: user_id.to_string(),
            }),
            IndexDeleteOutcome::Deleted => {
                engine::refund_post(&self.store, post_id).await?;
                Ok(DeleteResponse {
                    status: "deleted".to_string(),
                    post_id: post_id.to_string(),
                    user_id: user_id.to_string(),
                })
            }
        }
    }
}

fn outcome_to_response(outcome: ApplyOutcome) -> ActionResponse {
    match outcome {
        ApplyOutcome::Accepted {
            delta,
            normalized_score,
        } => ActionResponse {
            approved: true,
            significance_score: delta,
            reason: "accepted".to_string(),
            final_user_score: normalized_score,
        },
        ApplyOutcome::Limited { current_score } => ActionResponse {
            approved: false,
            significance_score: 0.0,
            reason: "daily limit".to_string(),
            final_user_score: current_score,
        },
        ApplyOutcome::Capped { current_score } => ActionResponse {
            approved: true,
            significance_score: 0.0,
            reason: "capped".to_string(),
            final_user_score: current_score,
        },
    }
}

/// Builds the job handler the worker pool runs for each claimed `PostJob`:
/// validate, score, record, and dispatch the webhook.
pub fn build_post_job_handler(
    store: Arc<dyn ScoreStore>,
    validator: Arc<Validator>,
    dispatcher: Arc<WebhookDispatcher>,
    config: Config,
) -> JobHandler {
    Arc::new(move |job: PostJob| {
        let store = Arc::clone(&store);
        let validator = Arc::clone(&validator);
        let dispatcher = Arc::clone(&dispatcher);
        let points = config.points.clone();

        Box::pin(async move {
            let now = Utc::now();
            let today = now.date_naive();

            let validation = validator
                .validate(
                    &job.post_id,
                    &job.interactor_id,
                    &job.content,
                    job.image.as_deref(),
                    &points,
                )
                .await?;

            let (approved, significance, reason, final_score) = match validation {
                ValidationOutcome::Rejected { reason } => (false, 0.0, reason, 0.0),
                ValidationOutcome::Accepted {
                    quality,
                    quality_degraded,
                    originality,
                    ..
                } => {
                    if quality_degraded {
                        warn!(post_id = %job.post_id, "quality scorer degraded, using neutral default");
                    }
                    let outcome = engine::apply_post(
                        &store,
                        &job.interactor_id,
                        &job.post_id,
                        quality,
                        originality,
                        today,
                        now,
                        points.clone(),
                    )
                    .await?;

                    match outcome {
                        ApplyOutcome::Accepted {
                            delta,
                            normalized_score,
                        } => (true, delta, "accepted".to_string(), normalized_score),
                        ApplyOutcome::Limited { current_score } => {
                            (false, 0.0, "daily limit".to_string(), current_score)
                        }
                        ApplyOutcome::Capped { current_score } => {
                            (true, 0.0, "capped".to_string(), current_score)
                        }
                    }
                }
            };

            if let Some(url) = &job.webhook_url {
                dispatcher
                    .dispatch(
                        url,
                        &WebhookPayload {
                            creator_address: job.creator_id.clone(),
                            interactor_address: job.interactor_id.clone(),
                            validation: ValidationPayload {
                                approved,
                                significance_score: significance,
                                reason,
                                final_user_score: final_score,
                                post_id: job.post_id.clone(),
                            },
                        },
                    )
                    .await;
            }

            Ok(())
        })
    })
}
