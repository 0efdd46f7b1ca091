use serde_json::json;
use std::convert::Infallible;
use warp::{reject, Filter, Rejection, Reply};

use crate::db::DbPool;
use crate::photo_store::PhotoStore;
use crate::warp_helpers::{with_db, with_photo_store, DatabaseError, InternalError};

pub async fn health_check() -> Result<impl Reply, Infallible> {
    Ok(warp::reply::json(&json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}

/// Ready once the pool hands out connections and the upload directory exists
pub async fn ready_check(db_pool: DbPool, photo_store: PhotoStore) -> Result<impl Reply, Rejection> {
    if let Err(e) = db_pool.acquire().await {
        log::error!("Database connection failed: {}", e);
        return Err(reject::custom(DatabaseError {
            message: "Database connection failed".to_string(),
        }));
    }

    if !photo_store.dir().is_dir() {
        log::error!("Upload directory {} is missing", photo_store.dir().display());
        return Err(reject::custom(InternalError {
            message: "Upload directory unavailable".to_string(),
        }));
    }

    Ok(warp::reply::json(&json!({
        "status": "ready",
        "database": "connected",
        "uploads": photo_store.dir().display().to_string(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}

pub fn build_health_routes(
    db_pool: DbPool,
    photo_store: PhotoStore,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .and_then(health_check);

    let ready = warp::path("ready")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_db(db_pool))
        .and(with_photo_store(photo_store))
        .and_then(ready_check);

    health.or(ready)
}
