use serde::Serialize;
use std::convert::Infallible;
use std::net::IpAddr;
use std::sync::Arc;

use warp::{reject, Filter, Rejection, Reply};

use crate::attendance::{AttendanceError, AttendanceService};
use crate::db::{AdminCredentials, DbPool};
use crate::geolocation::client_ip_from_headers;
use crate::photo_store::PhotoStore;

pub const ADMIN_USERNAME_HEADER: &str = "x-admin-username";
pub const ADMIN_PASSWORD_HEADER: &str = "x-admin-password";

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    pub timestamp: String,
}

#[derive(Debug)]
pub struct DatabaseError {
    pub message: String,
}

impl reject::Reject for DatabaseError {}

#[derive(Debug)]
pub struct NotFoundError {
    pub message: String,
}

impl reject::Reject for NotFoundError {}

#[derive(Debug)]
pub struct ValidationError {
    pub message: String,
}

impl reject::Reject for ValidationError {}

#[derive(Debug)]
pub struct ConflictError {
    pub message: String,
}

impl reject::Reject for ConflictError {}

#[derive(Debug)]
pub struct UnauthorizedError;
impl reject::Reject for UnauthorizedError {}

#[derive(Debug)]
pub struct InternalError {
    pub message: String,
}

impl reject::Reject for InternalError {}

pub fn database_error(action: &str, e: sqlx::Error) -> Rejection {
    log::error!("{}: {}", action, e);
    reject::custom(DatabaseError {
        message: format!("{}: {}", action, e),
    })
}

pub fn validation_error(message: impl Into<String>) -> Rejection {
    reject::custom(ValidationError {
        message: message.into(),
    })
}

impl From<AttendanceError> for Rejection {
    fn from(err: AttendanceError) -> Self {
        match err {
            AttendanceError::UnknownUser { .. } => reject::custom(NotFoundError {
                message: err.to_string(),
            }),
            AttendanceError::Image(e) => validation_error(e.to_string()),
            AttendanceError::Database(e) => database_error("Failed to record attendance", e),
            AttendanceError::Task(e) => {
                log::error!("Attendance task failed: {}", e);
                reject::custom(InternalError {
                    message: "Failed to process photo".to_string(),
                })
            }
        }
    }
}

pub fn with_db(db_pool: DbPool) -> impl Filter<Extract = (DbPool,), Error = Infallible> + Clone {
    warp::any().map(move || db_pool.clone())
}

pub fn with_attendance_service(
    service: AttendanceService,
) -> impl Filter<Extract = (AttendanceService,), Error = Infallible> + Clone {
    warp::any().map(move || service.clone())
}

pub fn with_photo_store(
    photo_store: PhotoStore,
) -> impl Filter<Extract = (PhotoStore,), Error = Infallible> + Clone {
    warp::any().map(move || photo_store.clone())
}

pub fn with_programs(
    programs: Arc<Vec<String>>,
) -> impl Filter<Extract = (Arc<Vec<String>>,), Error = Infallible> + Clone {
    warp::any().map(move || programs.clone())
}

/// Client address reported by a reverse proxy, if any
pub fn client_ip() -> impl Filter<Extract = (Option<IpAddr>,), Error = Rejection> + Clone {
    warp::header::optional::<String>("x-forwarded-for")
        .and(warp::header::optional::<String>("x-real-ip"))
        .map(|forwarded_for: Option<String>, real_ip: Option<String>| {
            client_ip_from_headers(forwarded_for.as_deref(), real_ip.as_deref())
        })
}

/// Passes only requests carrying valid admin credentials headers.
pub fn with_admin(db_pool: DbPool) -> impl Filter<Extract = (), Error = Rejection> + Clone {
    warp::header::optional::<String>(ADMIN_USERNAME_HEADER)
        .and(warp::header::optional::<String>(ADMIN_PASSWORD_HEADER))
        .and(with_db(db_pool))
        .and_then(authorize_admin)
        .untuple_one()
}

async fn authorize_admin(
    username: Option<String>,
    password: Option<String>,
    db_pool: DbPool,
) -> Result<(), Rejection> {
    let (Some(username), Some(password)) = (username, password) else {
        return Err(reject::custom(UnauthorizedError));
    };

    let valid = AdminCredentials::verify(&db_pool, &username, &password)
        .await
        .map_err(|e| database_error("Failed to verify admin credentials", e))?;

    if valid {
        Ok(())
    } else {
        log::warn!("Rejected admin request for user '{}'", username);
        Err(reject::custom(UnauthorizedError))
    }
}

pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let code;
    let message;
    let timestamp = chrono::Utc::now().to_rfc3339();

    if err.is_not_found() {
        code = warp::http::StatusCode::NOT_FOUND;
        message = "Not Found".to_string();
    } else if let Some(database_error) = err.find::<DatabaseError>() {
        code = warp::http::StatusCode::INTERNAL_SERVER_ERROR;
        message = database_error.message.clone();
    } else if let Some(not_found) = err.find::<NotFoundError>() {
        code = warp::http::StatusCode::NOT_FOUND;
        message = not_found.message.clone();
    } else if let Some(validation_error) = err.find::<ValidationError>() {
        code = warp::http::StatusCode::BAD_REQUEST;
        message = validation_error.message.clone();
    } else if let Some(conflict) = err.find::<ConflictError>() {
        code = warp::http::StatusCode::CONFLICT;
        message = conflict.message.clone();
    } else if err.find::<UnauthorizedError>().is_some() {
        code = warp::http::StatusCode::UNAUTHORIZED;
        message = "Invalid admin credentials".to_string();
    } else if let Some(internal) = err.find::<InternalError>() {
        code = warp::http::StatusCode::INTERNAL_SERVER_ERROR;
        message = internal.message.clone();
    } else if let Some(body_error) = err.find::<warp::body::BodyDeserializeError>() {
        code = warp::http::StatusCode::BAD_REQUEST;
        message = format!("Invalid request body: {}", body_error);
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        code = warp::http::StatusCode::PAYLOAD_TOO_LARGE;
        message = "Payload too large".to_string();
    } else if err.find::<warp::reject::UnsupportedMediaType>().is_some() {
        code = warp::http::StatusCode::UNSUPPORTED_MEDIA_TYPE;
        message = "Unsupported media type".to_string();
    } else if err.find::<warp::reject::InvalidQuery>().is_some() {
        code = warp::http::StatusCode::BAD_REQUEST;
        message = "Invalid query string".to_string();
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        code = warp::http::StatusCode::METHOD_NOT_ALLOWED;
        message = "Method not allowed".to_string();
    } else {
        log::error!("Unhandled rejection: {:?}", err);
        code = warp::http::StatusCode::INTERNAL_SERVER_ERROR;
        message = "Internal server error".to_string();
    }

    let error_response = ErrorResponse {
        error: message,
        code: code.as_u16(),
        timestamp,
    };

    Ok(warp::reply::with_status(
        warp::reply::json(&error_response),
        code,
    ))
}

pub fn cors() -> warp::cors::Builder {
    warp::cors()
        .allow_any_origin()
        .allow_headers(vec![
            "content-type",
            ADMIN_USERNAME_HEADER,
            ADMIN_PASSWORD_HEADER,
        ])
        .allow_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
}
