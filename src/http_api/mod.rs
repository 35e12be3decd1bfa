use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::NaiveDate;
use log::{error, info};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::persistence::{PersistenceError, TimetableStore};
use crate::projection::{AttendanceQuery, ProjectionError, ProjectionResult, TodayStatus, project};
use crate::{SemesterCalendar, SemesterCalendarConfig, Timetable};

pub type SharedStore = Arc<dyn TimetableStore + Send + Sync>;

#[derive(Clone)]
pub struct AppState {
    calendar: Arc<SemesterCalendar>,
    store: SharedStore,
}

impl AppState {
    pub fn new(calendar: SemesterCalendar, store: SharedStore) -> Self {
        Self {
            calendar: Arc::new(calendar),
            store,
        }
    }

    fn calendar(&self) -> Arc<SemesterCalendar> {
        self.calendar.clone()
    }

    fn store(&self) -> SharedStore {
        self.store.clone()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Invalid(String),
    Inconsistent(String),
    Internal(String),
}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    fn invalid(message: impl Into<String>) -> Self {
        ApiError::Invalid(message.into())
    }
}

impl From<PersistenceError> for ApiError {
    fn from(value: PersistenceError) -> Self {
        match value {
            PersistenceError::InvalidData(message) => ApiError::Invalid(message),
            other => {
                error!("event=store_failure module=http_api error=\"{other}\"");
                ApiError::Internal(other.to_string())
            }
        }
    }
}

impl From<ProjectionError> for ApiError {
    fn from(value: ProjectionError) -> Self {
        if value.is_input_range() {
            ApiError::Invalid(value.to_string())
        } else {
            ApiError::Inconsistent(value.to_string())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
            ApiError::Invalid(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
            ApiError::Inconsistent(message) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "inconsistent_input",
                message,
            ),
            ApiError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct ProjectionRequest {
    /// Load the timetable from the store for this student...
    #[serde(default)]
    pub student_id: Option<String>,
    /// ...or use this one directly. Takes precedence over `student_id`.
    #[serde(default)]
    pub timetable: Option<Timetable>,
    /// Defaults to the server's local date.
    #[serde(default)]
    pub today: Option<NaiveDate>,
    pub reported_percent: f64,
    #[serde(default)]
    pub today_status: TodayStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TimetableResponse {
    pub student_id: String,
    pub timetable: Timetable,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/calendar", get(get_calendar))
        .route(
            "/timetables/:student_id",
            get(get_timetable).put(put_timetable),
        )
        .route("/projection", post(create_projection))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("event=http_listen module=http_api addr={addr}");
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn get_calendar(State(state): State<AppState>) -> Json<SemesterCalendarConfig> {
    Json(state.calendar().to_config())
}

async fn get_timetable(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> Result<Json<TimetableResponse>, ApiError> {
    let timetable = state.store().load_timetable(&student_id)?;
    match timetable {
        Some(timetable) => Ok(Json(TimetableResponse {
            student_id,
            timetable,
        })),
        None => Err(ApiError::not_found(format!(
            "no timetable stored for student {student_id}"
        ))),
    }
}

async fn put_timetable(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
    Json(timetable): Json<Timetable>,
) -> Result<Json<TimetableResponse>, ApiError> {
    let store = state.store();
    store.save_timetable(&student_id, &timetable)?;
    let saved = store
        .load_timetable(&student_id)?
        .ok_or_else(|| ApiError::Internal("timetable not found after save".into()))?;
    Ok(Json(TimetableResponse {
        student_id,
        timetable: saved,
    }))
}

async fn create_projection(
    State(state): State<AppState>,
    Json(request): Json<ProjectionRequest>,
) -> Result<Json<ProjectionResult>, ApiError> {
    let timetable = match (request.timetable, request.student_id.as_deref()) {
        (Some(timetable), _) => {
            timetable
                .validate()
                .map_err(|err| ApiError::invalid(err.to_string()))?;
            timetable
        }
        (None, Some(student_id)) => state
            .store()
            .load_timetable(student_id)?
            .ok_or_else(|| {
                ApiError::not_found(format!("no timetable stored for student {student_id}"))
            })?,
        (None, None) => {
            return Err(ApiError::invalid(
                "either student_id or timetable is required",
            ));
        }
    };

    let today = request
        .today
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let query = AttendanceQuery::new(request.reported_percent, request.today_status);
    let result = project(today, &state.calendar(), &timetable, &query)?;
    Ok(Json(result))
}
