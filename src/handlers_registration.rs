use serde::Serialize;
use std::sync::Arc;
use warp::{reject, Filter, Rejection, Reply};

use crate::db::{DbPool, Group, NewUser, User};
use crate::warp_helpers::{
    database_error, validation_error, with_db, with_programs, ConflictError,
};

#[derive(Debug, Serialize)]
pub struct RegistrationOptions {
    pub programs: Vec<String>,
    pub groups: Vec<String>,
}

/// Trims every field and checks it against the configured programs.
pub fn validate_new_user(user: NewUser, programs: &[String]) -> Result<NewUser, String> {
    let user = NewUser {
        name: user.name.trim().to_string(),
        roll_no: user.roll_no.trim().to_string(),
        organisation: user.organisation.trim().to_string(),
        group: user.group.trim().to_string(),
    };

    if user.name.is_empty() {
        return Err("Please enter a full name".to_string());
    }
    if user.roll_no.is_empty() {
        return Err("Please enter a roll number".to_string());
    }
    if user.group.is_empty() {
        return Err("Please enter a group name".to_string());
    }
    if !programs.iter().any(|program| program == &user.organisation) {
        return Err(format!("Unknown program '{}'", user.organisation));
    }

    Ok(user)
}

pub async fn registration_options(
    programs: Arc<Vec<String>>,
    db_pool: DbPool,
) -> Result<impl Reply, Rejection> {
    let groups = Group::list_names(&db_pool)
        .await
        .map_err(|e| database_error("Failed to list groups", e))?;

    Ok(warp::reply::json(&RegistrationOptions {
        programs: programs.as_ref().clone(),
        groups,
    }))
}

pub async fn register_user(
    new_user: NewUser,
    programs: Arc<Vec<String>>,
    db_pool: DbPool,
) -> Result<impl Reply, Rejection> {
    let new_user = validate_new_user(new_user, &programs).map_err(validation_error)?;

    let duplicate = User::exists(&db_pool, &new_user.name, &new_user.roll_no)
        .await
        .map_err(|e| database_error("Failed to check registration", e))?;
    if duplicate {
        return Err(reject::custom(ConflictError {
            message: "User with this name and roll number already exists".to_string(),
        }));
    }

    let user = User::create(
        &db_pool,
        &new_user.name,
        &new_user.roll_no,
        &new_user.organisation,
        &new_user.group,
    )
    .await
    .map_err(|e| {
        // lost a race against an identical registration
        if e.as_database_error().is_some_and(|db| db.is_unique_violation()) {
            reject::custom(ConflictError {
                message: "User with this name and roll number already exists".to_string(),
            })
        } else {
            database_error("Failed to register user", e)
        }
    })?;

    log::info!(
        "Registered '{}' ({}) in group '{}'",
        user.name,
        user.roll_no,
        user.group_name
    );

    Ok(warp::reply::with_status(
        warp::reply::json(&user),
        warp::http::StatusCode::CREATED,
    ))
}

pub fn build_registration_routes(
    db_pool: DbPool,
    programs: Arc<Vec<String>>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let options = warp::path!("api" / "registration" / "options")
        .and(warp::get())
        .and(with_programs(programs.clone()))
        .and(with_db(db_pool.clone()))
        .and_then(registration_options);

    let register = warp::path!("api" / "users")
        .and(warp::post())
        .and(warp::body::content_length_limit(16 * 1024))
        .and(warp::body::json::<NewUser>())
        .and(with_programs(programs))
        .and(with_db(db_pool))
        .and_then(register_user);

    options.or(register)
}
