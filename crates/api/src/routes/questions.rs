//! Question bank routes
//!
//! Reads are public but redacted: `correctAnswer` is only serialized when the
//! soft gate attached an admin principal. Creation sits behind the hard gate.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use mr_abdallah_shared::{NewQuestion, Question};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::Viewer;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const MIN_OPTIONS: usize = 2;
const INVALID_BODY_MESSAGE: &str =
    "Request body must be JSON with question, options and optional correctAnswer";

/// Public projection of a question
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub id: Uuid,
    pub question: String,
    pub options: Vec<String>,
    /// Omitted entirely (not null) for anonymous callers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<i32>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl QuestionView {
    pub fn project(question: Question, viewer: &Viewer) -> Self {
        Self {
            id: question.id,
            question: question.question,
            options: question.options,
            correct_answer: question.correct_answer.filter(|_| viewer.is_admin()),
            created_at: question.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct QuestionListResponse {
    pub success: bool,
    pub questions: Vec<QuestionView>,
}

#[derive(Debug, Serialize)]
pub struct QuestionResponse {
    pub success: bool,
    pub question: QuestionView,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuestionRequest {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: Option<i32>,
}

impl CreateQuestionRequest {
    fn validate(self) -> Result<NewQuestion, ApiError> {
        let question = self.question.trim().to_string();
        if question.is_empty() {
            return Err(ApiError::Validation("Question text is required".to_string()));
        }
        if self.options.len() < MIN_OPTIONS || self.options.iter().any(|o| o.trim().is_empty()) {
            return Err(ApiError::Validation(format!(
                "At least {MIN_OPTIONS} non-empty options are required"
            )));
        }
        if let Some(index) = self.correct_answer {
            if index < 0 || index as usize >= self.options.len() {
                return Err(ApiError::Validation(
                    "correctAnswer must index into options".to_string(),
                ));
            }
        }

        Ok(NewQuestion {
            question,
            options: self.options,
            correct_answer: self.correct_answer,
        })
    }
}

/// GET /questions
pub async fn list_questions(
    State(state): State<AppState>,
    viewer: Viewer,
) -> ApiResult<Json<QuestionListResponse>> {
    let questions = state
        .questions
        .list()
        .await?
        .into_iter()
        .map(|q| QuestionView::project(q, &viewer))
        .collect();

    Ok(Json(QuestionListResponse {
        success: true,
        questions,
    }))
}

/// GET /questions/{id}
pub async fn get_question(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<String>,
) -> ApiResult<Json<QuestionResponse>> {
    let id = Uuid::parse_str(&id).map_err(|_| ApiError::NotFound)?;
    let question = state.questions.get(id).await?.ok_or(ApiError::NotFound)?;

    Ok(Json(QuestionResponse {
        success: true,
        question: QuestionView::project(question, &viewer),
    }))
}

/// POST /questions
pub async fn create_question(
    State(state): State<AppState>,
    payload: Result<Json<CreateQuestionRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<QuestionResponse>)> {
    let Json(req) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Rejected question body");
        ApiError::Validation(INVALID_BODY_MESSAGE.to_string())
    })?;
    let new = req.validate()?;
    let question = state
        .questions
        .create(new, OffsetDateTime::now_utc())
        .await?;

    tracing::info!(question_id = %question.id, "Question created");

    // the creator is an admin, so the full record goes back
    let view = QuestionView {
        id: question.id,
        question: question.question,
        options: question.options,
        correct_answer: question.correct_answer,
        created_at: question.created_at,
    };

    Ok((
        StatusCode::CREATED,
        Json(QuestionResponse {
            success: true,
            question: view,
        }),
    ))
}
