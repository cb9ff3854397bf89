// HTTP handlers. Thin: parse the request, call into C9/C10, shape the
// response. All ledger and cohort logic lives in the router/cohort engine.

use std::str::FromStr;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use base64::Engine;
use serde::Deserialize;

use crate::scoring::InteractionCategory;

use super::models::{
    AcceptedResponse, ErrorResponse, SubmitActionRequest, SubmitActionResponse, SubmitPostRequest,
};
use super::AppState;

pub async fn submit_action(
    State(state): State<AppState>,
    Json(request): Json<SubmitActionRequest>,
) -> Result<Json<SubmitActionResponse>, (StatusCode, Json<ErrorResponse>)> {
    let category = InteractionCategory::from_str(&request.interaction.interaction_type)
        .map_err(|err| bad_request(err))?;

    if category == InteractionCategory::Post {
        return Err(bad_request(
            "posts must go through /v1/submit_post".to_string(),
        ));
    }

    let response = state
        .router
        .submit_action(&request.interactor_address, category)
        .await
        .map_err(internal_error)?;

    Ok(Json(SubmitActionResponse {
        approved: response.approved,
        significance_score: response.significance_score,
        reason: response.reason,
        final_user_score: response.final_user_score,
    }))
}

pub async fn submit_post(
    State(state): State<AppState>,
    Json(request): Json<SubmitPostRequest>,
) -> Result<(StatusCode, Json<AcceptedResponse>), (StatusCode, Json<ErrorResponse>)> {
    let image = request
        .image_base64
        .map(|b64| base64::engine::general_purpose::STANDARD.decode(b64))
        .transpose()
        .map_err(|err| bad_request(format!("invalid image_base64: {err}")))?;

    state
        .router
        .submit_post(
            &request.creator_address,
            &request.interactor_address,
            &request.post_id,
            &request.data,
            image,
            request.webhook_url,
        )
        .await
        .map_err(internal_error)?;

    Ok((StatusCode::ACCEPTED, Json(AcceptedResponse { status: "processing" })))
}

#[derive(Deserialize)]
pub struct DeleteQuery {
    pub user_id: String,
}

pub async fn delete_post(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> Result<Json<crate::router::DeleteResponse>, (StatusCode, Json<ErrorResponse>)> {
    let response = state
        .router
        .delete_post(&post_id, &query.user_id)
        .await
        .map_err(internal_error)?;

    if response.status == "not_found" {
        return Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "post not found".to_string(),
            }),
        ));
    }

    Ok(Json(response))
}

pub async fn run_daily_analysis(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorResponse>)> {
    let summary = state.cohort_engine.run().await.map_err(|err| {
        (
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: err.to_string(),
            }),
        )
    })?;

    *state.last_cohort_summary.write().await = Some(summary.clone());

    Ok(Json(serde_json::json!(summary
        .iter()
        .map(|(category, cohort)| {
            (
                category.as_str().to_string(),
                serde_json::json!({
                    "qualified": cohort.qualified,
                    "empathy": cohort.empathy,
                }),
            )
        })
        .collect::<std::collections::BTreeMap<_, _>>())))
}

pub async fn daily_summary(
    State(state): State<AppState>,
) -> Json<Option<serde_json::Value>> {
    let summary = state.last_cohort_summary.read().await.clone();
    Json(summary.map(|summary| {
        serde_json::json!(summary
            .iter()
            .map(|(category, cohort)| {
                (
                    category.as_str().to_string(),
                    serde_json::json!({
                        "qualified": cohort.qualified,
                        "empathy": cohort.empathy,
                    }),
                )
            })
            .collect::<std::collections::BTreeMap<_, _>>())
    }))
}

pub async fn user_activity(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<crate::db::UserScoreRecord>, (StatusCode, Json<ErrorResponse>)> {
    match state.store.get(&user_id).await.map_err(internal_error)? {
        Some(record) => Ok(Json(record)),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "no record for user".to_string(),
            }),
        )),
    }
}

pub async fn rewards_for_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorResponse>)> {
    let category = InteractionCategory::from_str(&category).map_err(bad_request)?;
    let summary = state.last_cohort_summary.read().await.clone();

    match summary.and_then(|s| s.get(&category).cloned()) {
        Some(cohort) => Ok(Json(serde_json::json!({
            "qualified": cohort.qualified,
            "empathy": cohort.empathy,
        }))),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "no cohort run has completed yet".to_string(),
            }),
        )),
    }
}

fn bad_request(message: String) -> (StatusCode, Json<ErrorResponse>) {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: message }))
}

fn internal_error(err: anyhow::Error) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}
