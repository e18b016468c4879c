//! # Axum routes for the Vigil moderation pipeline
//!
//! [`router`] exposes a [`Moderator`] as a small JSON API:
//!
//! | method | path | |
//! |---|---|---|
//! | `POST` | `/admission/check` | score a submission, returning a ticket unless blocked |
//! | `POST` | `/admission/commit` | create the item from a ticket |
//! | `POST` | `/reports` | file a report |
//! | `GET` | `/reports/{report_id}` | look up a report |
//! | `GET` | `/queue` | items awaiting review, newest flagged first |
//! | `POST` | `/queue/{content_id}/resolve` | approve, hide or delete |
//! | `GET` | `/content/{content_id}` | look up an item |
//! | `GET` | `/content/{content_id}/reports` | every report against an item |
//!
//! Errors are returned as `{"error": <kind>, "message": <text>}`. Version
//! races that survived the moderator's retries also carry `"retryable": true`.
//!
//! Authorization is left to the embedding service: mount the router behind
//! whatever middleware decides who may resolve queue entries.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use vigil::{
    AdmissionResult, FiledReport, Moderator, PendingSubmission, ReportRequest, Resolution,
    ResolveAction, ResolveRequest, Submission,
};
use vigil_common::{
    ContentId, ContentItem, ErrorKind, ModerationError, QueueEntry, Report, ReportId, UserId,
};
use vigil_store::ModerationStore;

/// Build the router over a moderator
pub fn router<S>(moderator: Moderator<S>) -> Router
where
    S: ModerationStore + Send + Sync + 'static,
{
    Router::new()
        .route("/admission/check", post(check_admission::<S>))
        .route("/admission/commit", post(commit_submission::<S>))
        .route("/reports", post(file_report::<S>))
        .route("/reports/{report_id}", get(get_report::<S>))
        .route("/queue", get(list_queue::<S>))
        .route("/queue/{content_id}/resolve", post(resolve::<S>))
        .route("/content/{content_id}", get(get_content::<S>))
        .route("/content/{content_id}/reports", get(content_reports::<S>))
        .with_state(moderator)
}

/// [`ModerationError`] rendered as a JSON response
#[derive(Debug)]
pub struct ApiError(pub ModerationError);

impl From<ModerationError> for ApiError {
    fn from(e: ModerationError) -> Self {
        Self(e)
    }
}

impl ApiError {
    /// Status code for the wrapped error
    pub fn status(&self) -> StatusCode {
        match self.0.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::InvalidState | ErrorKind::ConcurrencyConflict => StatusCode::CONFLICT,
            ErrorKind::Storage | ErrorKind::Config | ErrorKind::Serialization | ErrorKind::Io => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.0.to_string();
        if status.is_server_error() {
            tracing::error!(error = %message, "request failed");
        } else {
            tracing::warn!(error = %message, "request rejected");
        }

        let mut body = json!({
            "error": self.0.kind().as_str(),
            "message": message,
        });
        if self.0.is_retryable() {
            body["retryable"] = json!(true);
        }
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Body of `POST /admission/commit`
#[derive(Debug, Clone, Deserialize)]
pub struct CommitBody {
    /// Ticket returned by `/admission/check`
    pub ticket: PendingSubmission,
    /// Whether the submitter confirmed a post that needs review
    #[serde(default)]
    pub confirmed: bool,
}

/// Body of `POST /queue/{content_id}/resolve`
#[derive(Debug, Clone, Deserialize)]
pub struct ResolveBody {
    /// Decision
    pub action: ResolveAction,
    /// Reviewer taking the decision
    pub reviewer: UserId,
    /// Reviewer notes
    #[serde(default)]
    pub notes: Option<String>,
}

async fn check_admission<S>(
    State(moderator): State<Moderator<S>>,
    Json(submission): Json<Submission>,
) -> ApiResult<Json<AdmissionResult>>
where
    S: ModerationStore + Send + Sync + 'static,
{
    Ok(Json(moderator.check_admission(submission)?))
}

async fn commit_submission<S>(
    State(moderator): State<Moderator<S>>,
    Json(body): Json<CommitBody>,
) -> ApiResult<(StatusCode, Json<ContentItem>)>
where
    S: ModerationStore + Send + Sync + 'static,
{
    let item = moderator.commit_submission(body.ticket, body.confirmed).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn file_report<S>(
    State(moderator): State<Moderator<S>>,
    Json(request): Json<ReportRequest>,
) -> ApiResult<(StatusCode, Json<FiledReport>)>
where
    S: ModerationStore + Send + Sync + 'static,
{
    let filed = moderator.file_report(request).await?;
    Ok((StatusCode::CREATED, Json(filed)))
}

async fn get_report<S>(
    State(moderator): State<Moderator<S>>,
    Path(report_id): Path<ReportId>,
) -> ApiResult<Json<Report>>
where
    S: ModerationStore + Send + Sync + 'static,
{
    Ok(Json(moderator.report(&report_id).await?))
}

async fn list_queue<S>(State(moderator): State<Moderator<S>>) -> ApiResult<Json<Vec<QueueEntry>>>
where
    S: ModerationStore + Send + Sync + 'static,
{
    Ok(Json(moderator.queue().await?))
}

async fn resolve<S>(
    State(moderator): State<Moderator<S>>,
    Path(content_id): Path<ContentId>,
    Json(body): Json<ResolveBody>,
) -> ApiResult<Json<Resolution>>
where
    S: ModerationStore + Send + Sync + 'static,
{
    let request = ResolveRequest::new()
        .content(content_id)
        .action(body.action)
        .reviewer(body.reviewer)
        .maybe_notes(body.notes)
        .build();
    Ok(Json(moderator.resolve(request).await?))
}

async fn get_content<S>(
    State(moderator): State<Moderator<S>>,
    Path(content_id): Path<ContentId>,
) -> ApiResult<Json<ContentItem>>
where
    S: ModerationStore + Send + Sync + 'static,
{
    Ok(Json(moderator.content(&content_id).await?))
}

async fn content_reports<S>(
    State(moderator): State<Moderator<S>>,
    Path(content_id): Path<ContentId>,
) -> ApiResult<Json<Vec<Report>>>
where
    S: ModerationStore + Send + Sync + 'static,
{
    Ok(Json(moderator.reports(&content_id).await?))
}
