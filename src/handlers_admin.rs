use serde::Deserialize;
use serde_json::json;
use warp::{reject, Filter, Rejection, Reply};

use crate::csv_export::attendance_to_csv;
use crate::db::{
    AdminCredentials, AttendanceRecord, DatabaseStats, DbPool, Group, GroupDeletion, User,
};
use crate::photo_store::PhotoStore;
use crate::warp_helpers::{
    database_error, validation_error, with_admin, with_db, with_photo_store, ConflictError,
    InternalError, NotFoundError,
};

#[derive(Debug, Deserialize)]
pub struct PasswordChange {
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct GroupCreate {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct GroupRename {
    pub name: String,
    pub new_name: String,
}

#[derive(Debug, Deserialize)]
pub struct GroupQuery {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    #[serde(default)]
    pub confirm: bool,
}

fn success() -> warp::reply::Json {
    warp::reply::json(&json!({ "success": true }))
}

pub async fn login() -> Result<impl Reply, Rejection> {
    Ok(warp::reply::json(&json!({
        "success": true,
        "message": "Admin access granted"
    })))
}

pub async fn change_password(
    change: PasswordChange,
    db_pool: DbPool,
) -> Result<impl Reply, Rejection> {
    let password = change.password.trim();
    if password.is_empty() {
        return Err(validation_error("Please enter a password"));
    }

    AdminCredentials::update_password(&db_pool, password)
        .await
        .map_err(|e| database_error("Failed to update password", e))?;

    log::info!("Admin password updated");
    Ok(success())
}

pub async fn list_groups(db_pool: DbPool) -> Result<impl Reply, Rejection> {
    let groups = Group::list(&db_pool)
        .await
        .map_err(|e| database_error("Failed to list groups", e))?;
    Ok(warp::reply::json(&groups))
}

pub async fn add_group(request: GroupCreate, db_pool: DbPool) -> Result<impl Reply, Rejection> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(validation_error("Please enter a group name"));
    }

    let created = Group::create(&db_pool, name)
        .await
        .map_err(|e| database_error("Failed to add group", e))?;
    if !created {
        return Err(reject::custom(ConflictError {
            message: format!("Group '{}' already exists", name),
        }));
    }

    log::info!("Added group '{}'", name);
    Ok(warp::reply::with_status(
        success(),
        warp::http::StatusCode::CREATED,
    ))
}

pub async fn rename_group(request: GroupRename, db_pool: DbPool) -> Result<impl Reply, Rejection> {
    let old_name = request.name.trim();
    let new_name = request.new_name.trim();

    if new_name.is_empty() {
        return Err(validation_error("Please enter a new group name"));
    }
    if new_name == old_name {
        return Err(validation_error(
            "New group name must be different from current name",
        ));
    }

    let renamed = Group::rename(&db_pool, old_name, new_name)
        .await
        .map_err(|e| database_error("Failed to rename group", e))?;
    if !renamed {
        return Err(reject::custom(NotFoundError {
            message: format!("Group '{}' not found", old_name),
        }));
    }

    log::info!("Renamed group '{}' to '{}'", old_name, new_name);
    Ok(success())
}

pub async fn delete_group(query: GroupQuery, db_pool: DbPool) -> Result<impl Reply, Rejection> {
    let name = query.name.trim();
    let outcome = Group::delete(&db_pool, name)
        .await
        .map_err(|e| database_error("Failed to delete group", e))?;

    match outcome {
        GroupDeletion::Deleted => {
            log::info!("Deleted group '{}'", name);
            Ok(success())
        }
        GroupDeletion::NotFound => Err(reject::custom(NotFoundError {
            message: format!("Group '{}' not found", name),
        })),
        GroupDeletion::HasMembers(members) => Err(reject::custom(ConflictError {
            message: format!(
                "Cannot delete group '{}' - it contains {} user(s). Remove users first.",
                name, members
            ),
        })),
    }
}

pub async fn list_users(db_pool: DbPool) -> Result<impl Reply, Rejection> {
    let users = User::list_all(&db_pool)
        .await
        .map_err(|e| database_error("Failed to list users", e))?;
    Ok(warp::reply::json(&users))
}

pub async fn delete_user(id: i64, db_pool: DbPool) -> Result<impl Reply, Rejection> {
    let deleted = User::delete(&db_pool, id)
        .await
        .map_err(|e| database_error("Failed to delete user", e))?;
    if !deleted {
        return Err(reject::custom(NotFoundError {
            message: format!("User {} does not exist", id),
        }));
    }
    Ok(success())
}

pub async fn delete_all_users(db_pool: DbPool) -> Result<impl Reply, Rejection> {
    let removed = User::delete_all(&db_pool)
        .await
        .map_err(|e| database_error("Failed to delete users", e))?;
    log::warn!("Deleted all {} registered users", removed);
    Ok(warp::reply::json(&json!({ "success": true, "removed": removed })))
}

pub async fn list_attendance(db_pool: DbPool) -> Result<impl Reply, Rejection> {
    let records = AttendanceRecord::list_all(&db_pool)
        .await
        .map_err(|e| database_error("Failed to list attendance", e))?;
    Ok(warp::reply::json(&records))
}

pub async fn delete_attendance(id: i64, db_pool: DbPool) -> Result<impl Reply, Rejection> {
    let deleted = AttendanceRecord::delete(&db_pool, id)
        .await
        .map_err(|e| database_error("Failed to delete attendance row", e))?;
    if !deleted {
        return Err(reject::custom(NotFoundError {
            message: format!("Row {} does not exist", id),
        }));
    }
    Ok(success())
}

pub async fn export_attendance(db_pool: DbPool) -> Result<impl Reply, Rejection> {
    let records = AttendanceRecord::list_all(&db_pool)
        .await
        .map_err(|e| database_error("Failed to export attendance", e))?;

    let file_name = format!(
        "attendance_{}.csv",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );

    Ok(warp::reply::with_header(
        warp::reply::with_header(
            attendance_to_csv(&records),
            "content-type",
            "text/csv; charset=utf-8",
        ),
        "content-disposition",
        format!("attachment; filename=\"{}\"", file_name),
    ))
}

pub async fn reset_all(
    request: ResetRequest,
    db_pool: DbPool,
    photo_store: PhotoStore,
) -> Result<impl Reply, Rejection> {
    if !request.confirm {
        return Err(validation_error("Reset must be confirmed"));
    }

    let removed = DatabaseStats::clear_records(&db_pool)
        .await
        .map_err(|e| database_error("Failed to reset records", e))?;

    let failure = match tokio::task::spawn_blocking(move || photo_store.clear()).await {
        Ok(Ok(())) => None,
        Ok(Err(e)) => Some(format!("Failed to clear uploads: {}", e)),
        Err(e) => Some(format!("Upload cleanup task failed: {}", e)),
    };
    if let Some(message) = failure {
        log::error!("{}", message);
        return Err(reject::custom(InternalError { message }));
    }

    log::warn!(
        "Reset removed {} users, {} groups and {} attendance rows",
        removed.total_users,
        removed.total_groups,
        removed.total_attendance_records
    );
    Ok(warp::reply::json(&json!({ "success": true, "removed": removed })))
}

pub async fn get_stats(db_pool: DbPool) -> Result<impl Reply, Rejection> {
    let stats = DatabaseStats::collect(&db_pool)
        .await
        .map_err(|e| database_error("Failed to get stats", e))?;
    Ok(warp::reply::json(&stats))
}

pub fn build_admin_routes(
    db_pool: DbPool,
    photo_store: PhotoStore,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let json_limit = warp::body::content_length_limit(16 * 1024);

    let login_route = warp::path!("api" / "admin" / "login")
        .and(warp::post())
        .and(with_admin(db_pool.clone()))
        .and_then(login);

    let password_route = warp::path!("api" / "admin" / "password")
        .and(warp::put())
        .and(with_admin(db_pool.clone()))
        .and(json_limit)
        .and(warp::body::json::<PasswordChange>())
        .and(with_db(db_pool.clone()))
        .and_then(change_password);

    let groups_list = warp::path!("api" / "admin" / "groups")
        .and(warp::get())
        .and(with_admin(db_pool.clone()))
        .and(with_db(db_pool.clone()))
        .and_then(list_groups);

    let groups_add = warp::path!("api" / "admin" / "groups")
        .and(warp::post())
        .and(with_admin(db_pool.clone()))
        .and(json_limit)
        .and(warp::body::json::<GroupCreate>())
        .and(with_db(db_pool.clone()))
        .and_then(add_group);

    let groups_rename = warp::path!("api" / "admin" / "groups")
        .and(warp::put())
        .and(with_admin(db_pool.clone()))
        .and(json_limit)
        .and(warp::body::json::<GroupRename>())
        .and(with_db(db_pool.clone()))
        .and_then(rename_group);

    let groups_delete = warp::path!("api" / "admin" / "groups")
        .and(warp::delete())
        .and(with_admin(db_pool.clone()))
        .and(warp::query::<GroupQuery>())
        .and(with_db(db_pool.clone()))
        .and_then(delete_group);

    let users_list = warp::path!("api" / "admin" / "users")
        .and(warp::get())
        .and(with_admin(db_pool.clone()))
        .and(with_db(db_pool.clone()))
        .and_then(list_users);

    let users_delete = warp::path!("api" / "admin" / "users" / i64)
        .and(warp::delete())
        .and(with_admin(db_pool.clone()))
        .and(with_db(db_pool.clone()))
        .and_then(delete_user);

    let users_clear = warp::path!("api" / "admin" / "users")
        .and(warp::delete())
        .and(with_admin(db_pool.clone()))
        .and(with_db(db_pool.clone()))
        .and_then(delete_all_users);

    let attendance_list = warp::path!("api" / "admin" / "attendance")
        .and(warp::get())
        .and(with_admin(db_pool.clone()))
        .and(with_db(db_pool.clone()))
        .and_then(list_attendance);

    let attendance_delete = warp::path!("api" / "admin" / "attendance" / i64)
        .and(warp::delete())
        .and(with_admin(db_pool.clone()))
        .and(with_db(db_pool.clone()))
        .and_then(delete_attendance);

    let attendance_export = warp::path!("api" / "admin" / "attendance" / "export")
        .and(warp::get())
        .and(with_admin(db_pool.clone()))
        .and(with_db(db_pool.clone()))
        .and_then(export_attendance);

    let reset = warp::path!("api" / "admin" / "reset")
        .and(warp::post())
        .and(with_admin(db_pool.clone()))
        .and(json_limit)
        .and(warp::body::json::<ResetRequest>())
        .and(with_db(db_pool.clone()))
        .and(with_photo_store(photo_store))
        .and_then(reset_all);

    let stats = warp::path!("api" / "admin" / "stats")
        .and(warp::get())
        .and(with_admin(db_pool.clone()))
        .and(with_db(db_pool))
        .and_then(get_stats);

    login_route
        .or(password_route)
        .or(groups_list)
        .or(groups_add)
        .or(groups_rename)
        .or(groups_delete)
        .or(users_list)
        .or(users_delete)
        .or(users_clear)
        .or(attendance_list)
        .or(attendance_delete)
        .or(attendance_export)
        .or(reset)
        .or(stats)
}
