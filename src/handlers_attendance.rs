use bytes::BufMut;
use futures_util::TryStreamExt;
use serde::Deserialize;
use std::net::IpAddr;
use warp::multipart::{FormData, Part};
use warp::{reject, Filter, Rejection, Reply};

use crate::attendance::{AttendanceService, AttendanceSubmission};
use crate::db::{DbPool, Group, User};
use crate::warp_helpers::{
    client_ip, database_error, validation_error, with_attendance_service, with_db, NotFoundError,
};

#[derive(Debug, Deserialize)]
pub struct MembersQuery {
    pub group: String,
}

/// Text fields and the photo of one attendance form
#[derive(Debug, Default)]
pub struct AttendanceForm {
    pub group: Option<String>,
    pub name: Option<String>,
    pub photo: Option<Vec<u8>>,
}

impl AttendanceForm {
    pub fn into_submission(self, client_ip: Option<IpAddr>) -> Result<AttendanceSubmission, String> {
        let group = non_empty(self.group).ok_or("Please select a group")?;
        let name = non_empty(self.name).ok_or("Please select your name")?;
        let photo = self
            .photo
            .filter(|bytes| !bytes.is_empty())
            .ok_or("Please attach a photo")?;

        Ok(AttendanceSubmission {
            group,
            name,
            photo,
            client_ip,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

async fn read_part(part: Part) -> Result<Vec<u8>, warp::Error> {
    part.stream()
        .try_fold(Vec::new(), |mut data, chunk| async move {
            data.put(chunk);
            Ok(data)
        })
        .await
}

async fn read_attendance_form(form: FormData) -> Result<AttendanceForm, Rejection> {
    let mut form = Box::pin(form);
    let mut fields = AttendanceForm::default();

    while let Some(part) = form
        .try_next()
        .await
        .map_err(|e| validation_error(format!("Invalid form data: {}", e)))?
    {
        let field = part.name().to_string();
        let data = read_part(part)
            .await
            .map_err(|e| validation_error(format!("Failed to read field '{}': {}", field, e)))?;

        match field.as_str() {
            "group" => fields.group = Some(String::from_utf8_lossy(&data).into_owned()),
            "name" => fields.name = Some(String::from_utf8_lossy(&data).into_owned()),
            "photo" => fields.photo = Some(data),
            other => log::debug!("Ignoring unknown form field '{}'", other),
        }
    }

    Ok(fields)
}

async fn submission_from_form(
    form: FormData,
    client_ip: Option<IpAddr>,
) -> Result<AttendanceSubmission, Rejection> {
    read_attendance_form(form)
        .await?
        .into_submission(client_ip)
        .map_err(validation_error)
}

pub async fn list_groups(db_pool: DbPool) -> Result<impl Reply, Rejection> {
    let groups = Group::list_with_members(&db_pool)
        .await
        .map_err(|e| database_error("Failed to list groups", e))?;
    Ok(warp::reply::json(&groups))
}

pub async fn list_members(query: MembersQuery, db_pool: DbPool) -> Result<impl Reply, Rejection> {
    let group = query.group.trim();
    let known = Group::exists(&db_pool, group)
        .await
        .map_err(|e| database_error("Failed to look up group", e))?;
    if !known {
        return Err(reject::custom(NotFoundError {
            message: format!("Group '{}' not found", group),
        }));
    }

    let names = User::names_in_group(&db_pool, group)
        .await
        .map_err(|e| database_error("Failed to list group members", e))?;
    Ok(warp::reply::json(&names))
}

pub async fn preview_attendance(
    client_ip: Option<IpAddr>,
    form: FormData,
    service: AttendanceService,
) -> Result<impl Reply, Rejection> {
    let submission = submission_from_form(form, client_ip).await?;
    let preview = service.preview(submission).await?;
    Ok(warp::reply::json(&preview))
}

pub async fn submit_attendance(
    client_ip: Option<IpAddr>,
    form: FormData,
    service: AttendanceService,
) -> Result<impl Reply, Rejection> {
    let submission = submission_from_form(form, client_ip).await?;
    let record = service.submit(submission).await?;
    Ok(warp::reply::with_status(
        warp::reply::json(&record),
        warp::http::StatusCode::CREATED,
    ))
}

pub fn build_attendance_routes(
    db_pool: DbPool,
    service: AttendanceService,
    max_upload_bytes: u64,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let groups = warp::path!("api" / "groups")
        .and(warp::get())
        .and(with_db(db_pool.clone()))
        .and_then(list_groups);

    let members = warp::path!("api" / "groups" / "members")
        .and(warp::get())
        .and(warp::query::<MembersQuery>())
        .and(with_db(db_pool))
        .and_then(list_members);

    let preview = warp::path!("api" / "attendance" / "preview")
        .and(warp::post())
        .and(client_ip())
        .and(warp::multipart::form().max_length(max_upload_bytes))
        .and(with_attendance_service(service.clone()))
        .and_then(preview_attendance);

    let submit = warp::path!("api" / "attendance")
        .and(warp::post())
        .and(client_ip())
        .and(warp::multipart::form().max_length(max_upload_bytes))
        .and(with_attendance_service(service))
        .and_then(submit_attendance);

    groups.or(members).or(preview).or(submit)
}
