use std::sync::Arc;

use axum::{Json, extract::State as Extract};
use quiz::{QuizResult, classify};
use tracing::info;

use crate::{
    auth::CurrentUser,
    error::AppError,
    extract::Payload,
    models::{QuizResponse, QuizSubmit},
    state::State,
    utils::{new_id, now},
};

/// Scores the answers, stores the submission, then mails the result in the
/// background.
pub async fn submit_handler(
    Extract(state): Extract<Arc<State>>,
    CurrentUser(user): CurrentUser,
    Payload(payload): Payload<QuizSubmit>,
) -> Result<Json<QuizResult>, AppError> {
    let result = classify(&payload.answers);

    let response = QuizResponse {
        id: new_id(),
        user_id: user.id.clone(),
        username: user.username.clone(),
        email: user.email.clone(),
        answers: payload.answers,
        result: result.clone(),
        submitted_at: now(),
    };

    state.database.insert_quiz_response(&response).await?;
    info!("{} classified as {}", user.username, result.profile_name);

    let notifier_state = state.clone();
    tokio::spawn(async move {
        notifier_state
            .notifier
            .send_quiz_result(&user, &response.answers, &response.result)
            .await;
    });

    Ok(Json(result))
}

pub async fn history_handler(
    Extract(state): Extract<Arc<State>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<QuizResponse>>, AppError> {
    Ok(Json(state.database.quiz_history(&user.id).await?))
}
