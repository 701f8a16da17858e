use crate::infra::AppState;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use subject_survey::error::AppError;
use subject_survey::survey::{
    AnswerSubmission, AttemptId, AttemptStore, ScoreReport, SectionView, SurveyService,
    SurveyVariant,
};

#[derive(Debug, Deserialize)]
pub(crate) struct StartAttemptRequest {
    pub(crate) variant: SurveyVariant,
}

#[derive(Debug, Serialize)]
pub(crate) struct StartAttemptResponse {
    pub(crate) attempt_id: String,
    pub(crate) variant: SurveyVariant,
    pub(crate) section: SectionView,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RecordAnswersRequest {
    pub(crate) answers: Vec<AnswerSubmission>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ResultQuery {
    pub(crate) top: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PreviewRequest {
    pub(crate) variant: SurveyVariant,
    #[serde(default)]
    pub(crate) password: Option<String>,
    #[serde(default)]
    pub(crate) top: Option<usize>,
}

/// Router builder exposing the survey REST surface.
pub(crate) fn survey_router<S>(service: Arc<SurveyService<S>>) -> Router
where
    S: AttemptStore + 'static,
{
    Router::new()
        .route("/api/v1/attempts", post(start_attempt::<S>))
        .route(
            "/api/v1/attempts/:attempt_id/section",
            get(current_section::<S>),
        )
        .route(
            "/api/v1/attempts/:attempt_id/answers",
            post(record_answers::<S>),
        )
        .route(
            "/api/v1/attempts/:attempt_id/advance",
            post(advance_attempt::<S>),
        )
        .route(
            "/api/v1/attempts/:attempt_id/result",
            get(attempt_result::<S>),
        )
        .route("/api/v1/attempts/:attempt_id", delete(abandon_attempt::<S>))
        .route("/api/v1/preview", post(preview_attempt::<S>))
        .with_state(service)
}

pub(crate) fn with_operational_routes<S>(service: Arc<SurveyService<S>>) -> Router
where
    S: AttemptStore + 'static,
{
    survey_router(service)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/advice", get(advice_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn advice_endpoint(Extension(state): Extension<AppState>) -> Json<serde_json::Value> {
    Json(json!({ "advice": state.advice.next() }))
}

pub(crate) async fn start_attempt<S>(
    State(service): State<Arc<SurveyService<S>>>,
    Json(request): Json<StartAttemptRequest>,
) -> Result<(StatusCode, Json<StartAttemptResponse>), AppError>
where
    S: AttemptStore + 'static,
{
    let (id, section) = service.start(request.variant)?;
    Ok((
        StatusCode::CREATED,
        Json(StartAttemptResponse {
            attempt_id: id.0,
            variant: request.variant,
            section,
        }),
    ))
}

pub(crate) async fn current_section<S>(
    State(service): State<Arc<SurveyService<S>>>,
    Path(attempt_id): Path<String>,
) -> Result<Json<SectionView>, AppError>
where
    S: AttemptStore + 'static,
{
    let view = service.section(&AttemptId(attempt_id))?;
    Ok(Json(view))
}

pub(crate) async fn record_answers<S>(
    State(service): State<Arc<SurveyService<S>>>,
    Path(attempt_id): Path<String>,
    Json(request): Json<RecordAnswersRequest>,
) -> Result<Json<SectionView>, AppError>
where
    S: AttemptStore + 'static,
{
    let view = service.record_answers(&AttemptId(attempt_id), &request.answers)?;
    Ok(Json(view))
}

pub(crate) async fn advance_attempt<S>(
    State(service): State<Arc<SurveyService<S>>>,
    Path(attempt_id): Path<String>,
) -> Result<Json<SectionView>, AppError>
where
    S: AttemptStore + 'static,
{
    let view = service.advance(&AttemptId(attempt_id))?;
    Ok(Json(view))
}

pub(crate) async fn attempt_result<S>(
    State(service): State<Arc<SurveyService<S>>>,
    Path(attempt_id): Path<String>,
    Query(query): Query<ResultQuery>,
) -> Result<Json<ScoreReport>, AppError>
where
    S: AttemptStore + 'static,
{
    let report = service.result(&AttemptId(attempt_id), query.top)?;
    Ok(Json(report))
}

pub(crate) async fn abandon_attempt<S>(
    State(service): State<Arc<SurveyService<S>>>,
    Path(attempt_id): Path<String>,
) -> Result<StatusCode, AppError>
where
    S: AttemptStore + 'static,
{
    service.abandon(&AttemptId(attempt_id))?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn preview_attempt<S>(
    State(service): State<Arc<SurveyService<S>>>,
    Json(request): Json<PreviewRequest>,
) -> Result<Json<ScoreReport>, AppError>
where
    S: AttemptStore + 'static,
{
    let report = service.preview(request.variant, request.password.as_deref(), request.top)?;
    Ok(Json(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::InMemoryAttemptStore;
    use subject_survey::survey::{CatalogImporter, ServiceError, StoreError, SurveyError};
    use std::io::Cursor;

    const SAMPLE_CSV: &str = "\
id,text,section,subject,scale,subject2,scale2,subject3,scale3
q1,Enjoys close reading.,basic,korean,normal,,,,
q2,Avoids word problems.,basic,math,reverse,,,,
q3,Likes motion problems.,science,physics,normal,math,normal,,
";

    fn service() -> Arc<SurveyService<InMemoryAttemptStore>> {
        let catalog =
            Arc::new(CatalogImporter::from_reader(Cursor::new(SAMPLE_CSV)).expect("catalog"));
        Arc::new(SurveyService::new(
            catalog.clone(),
            catalog,
            Arc::new(InMemoryAttemptStore::default()),
            Some("sesame".to_string()),
        ))
    }

    #[tokio::test]
    async fn survey_flow_runs_end_to_end_through_the_handlers() {
        let service = service();

        let (status, Json(started)) = start_attempt(
            State(service.clone()),
            Json(StartAttemptRequest {
                variant: SurveyVariant::Lite,
            }),
        )
        .await
        .expect("attempt starts");
        assert_eq!(status, StatusCode::CREATED);
        let attempt_id = started.attempt_id;

        let Json(view) = record_answers(
            State(service.clone()),
            Path(attempt_id.clone()),
            Json(RecordAnswersRequest {
                answers: vec![
                    AnswerSubmission {
                        question_id: "q1".into(),
                        value: 4,
                    },
                    AnswerSubmission {
                        question_id: "q2".into(),
                        value: 2,
                    },
                ],
            }),
        )
        .await
        .expect("answers record");
        match view {
            SectionView::Section { answered, .. } => assert_eq!(answered, 2),
            SectionView::Complete => panic!("section should still be active"),
        }

        advance_attempt(State(service.clone()), Path(attempt_id.clone()))
            .await
            .expect("basic section advances");

        // Result is refused until the science section is answered too.
        let error = attempt_result(
            State(service.clone()),
            Path(attempt_id.clone()),
            Query(ResultQuery::default()),
        )
        .await
        .expect_err("incomplete attempt");
        assert!(matches!(
            error,
            AppError::Survey(ServiceError::Survey(SurveyError::IncompleteSection { .. }))
        ));

        record_answers(
            State(service.clone()),
            Path(attempt_id.clone()),
            Json(RecordAnswersRequest {
                answers: vec![AnswerSubmission {
                    question_id: "q3".into(),
                    value: 5,
                }],
            }),
        )
        .await
        .expect("science answer records");
        advance_attempt(State(service.clone()), Path(attempt_id.clone()))
            .await
            .expect("survey completes");

        let Json(report) = attempt_result(
            State(service.clone()),
            Path(attempt_id),
            Query(ResultQuery::default()),
        )
        .await
        .expect("report builds");
        assert_eq!(report.ranking.len(), 3);
        assert_eq!(report.ranking[0].subject, "physics");
    }

    #[tokio::test]
    async fn unknown_attempt_maps_to_not_found() {
        let service = service();
        let error = current_section(State(service), Path("attempt-999999".to_string()))
            .await
            .expect_err("missing attempt");
        assert!(matches!(
            error,
            AppError::Survey(ServiceError::Store(StoreError::NotFound))
        ));
    }

    #[tokio::test]
    async fn preview_requires_the_shared_password() {
        let service = service();

        let error = preview_attempt(
            State(service.clone()),
            Json(PreviewRequest {
                variant: SurveyVariant::Full,
                password: Some("wrong".into()),
                top: None,
            }),
        )
        .await
        .expect_err("bad password");
        assert!(matches!(
            error,
            AppError::Survey(ServiceError::PreviewDenied)
        ));

        let Json(report) = preview_attempt(
            State(service),
            Json(PreviewRequest {
                variant: SurveyVariant::Full,
                password: Some("sesame".into()),
                top: Some(2),
            }),
        )
        .await
        .expect("preview scores");
        assert!(report.ranking.len() <= 2);
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let Json(body) = healthcheck().await;
        assert_eq!(body["status"], "ok");
    }
}
