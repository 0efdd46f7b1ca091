use std::net::IpAddr;
use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use log::{info, warn};
use serde::Serialize;

use crate::db::{AttendanceRecord, DbPool, NewAttendance, User};
use crate::geolocation::{Geolocator, UNKNOWN_LOCATION};
use crate::metadata_extractor::{CaptureRecord, MetadataExtractor};
use crate::photo_store::PhotoStore;
use crate::uploaded_image::{ImageUploadError, UploadedImage};

#[derive(Debug, thiserror::Error)]
pub enum AttendanceError {
    #[error("User '{name}' not found in group '{group}'")]
    UnknownUser { group: String, name: String },
    #[error(transparent)]
    Image(#[from] ImageUploadError),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// One attendance upload as received from the form
#[derive(Debug)]
pub struct AttendanceSubmission {
    pub group: String,
    pub name: String,
    pub photo: Vec<u8>,
    pub client_ip: Option<IpAddr>,
}

/// Everything the form shows before the row is written
#[derive(Debug, Clone, Serialize)]
pub struct AttendancePreview {
    pub group: String,
    pub name: String,
    pub roll_no: String,
    pub capture: CaptureRecord,
    pub capture_date: String,
    pub capture_time: String,
    pub photo_location: String,
    pub upload_location: String,
}

/// Splits an EXIF timestamp into `YYYY-MM-DD` and `HH:MM:SS`.
pub fn split_capture_timestamp(timestamp: &str) -> Option<(String, String)> {
    let cleaned = timestamp.replace('\0', "");
    let cleaned = cleaned.trim();

    // EXIF uses colons in the date part, some software writes ISO dates instead
    let parsed = NaiveDateTime::parse_from_str(cleaned, "%Y:%m:%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(cleaned, "%F %T"))
        .ok()?;

    Some((
        parsed.format("%Y-%m-%d").to_string(),
        parsed.format("%H:%M:%S").to_string(),
    ))
}

/// Capture date and time of the photo, or the current local time when the
/// photo carries no usable timestamp.
pub fn capture_date_and_time(capture: &CaptureRecord, now: NaiveDateTime) -> (String, String) {
    capture
        .capture_timestamp
        .as_deref()
        .and_then(split_capture_timestamp)
        .unwrap_or_else(|| {
            (
                now.format("%Y-%m-%d").to_string(),
                now.format("%H:%M:%S").to_string(),
            )
        })
}

#[derive(Clone)]
pub struct AttendanceService {
    db_pool: DbPool,
    photo_store: PhotoStore,
    geolocator: Arc<dyn Geolocator>,
}

impl AttendanceService {
    pub fn new(db_pool: DbPool, photo_store: PhotoStore, geolocator: Arc<dyn Geolocator>) -> Self {
        Self {
            db_pool,
            photo_store,
            geolocator,
        }
    }

    pub fn photo_store(&self) -> &PhotoStore {
        &self.photo_store
    }

    /// Extracts and resolves everything without writing a row or a file.
    pub async fn preview(
        &self,
        submission: AttendanceSubmission,
    ) -> Result<AttendancePreview, AttendanceError> {
        let user = self.find_user(&submission.group, &submission.name).await?;
        let (_, capture) = Self::decode(submission.photo).await?;
        self.describe(user, capture, submission.client_ip).await
    }

    /// Stores the photo and appends the attendance row.
    pub async fn submit(
        &self,
        submission: AttendanceSubmission,
    ) -> Result<AttendanceRecord, AttendanceError> {
        let user = self.find_user(&submission.group, &submission.name).await?;
        let (image, capture) = Self::decode(submission.photo).await?;

        let file_name = PhotoStore::file_name(&user.name, &user.roll_no, Local::now().naive_local());
        let store = self.photo_store.clone();
        let target = file_name.clone();
        let stored_path = tokio::task::spawn_blocking(move || store.save(&image, &target)).await??;

        if capture.coordinates().is_none() {
            info!(
                "No GPS data in photo from '{}' ({}), location tracking unavailable",
                user.name, user.roll_no
            );
        }

        let preview = self.describe(user, capture, submission.client_ip).await?;
        let row = NewAttendance {
            group_name: preview.group,
            name: preview.name,
            roll_no: preview.roll_no,
            capture_date: preview.capture_date,
            capture_time: preview.capture_time,
            latitude: preview.capture.latitude,
            longitude: preview.capture.longitude,
            photo_location: preview.photo_location,
            upload_location: preview.upload_location,
            image_file: file_name,
        };

        match AttendanceRecord::append(&self.db_pool, &row).await {
            Ok(record) => {
                info!(
                    "Recorded attendance #{} for '{}' in '{}'",
                    record.id, record.name, record.group_name
                );
                Ok(record)
            }
            Err(e) => {
                if let Err(remove_err) = tokio::fs::remove_file(&stored_path).await {
                    warn!(
                        "Failed to remove orphaned photo {}: {}",
                        stored_path.display(),
                        remove_err
                    );
                }
                Err(e.into())
            }
        }
    }

    async fn find_user(&self, group: &str, name: &str) -> Result<User, AttendanceError> {
        User::find_in_group(&self.db_pool, group, name)
            .await?
            .ok_or_else(|| AttendanceError::UnknownUser {
                group: group.to_string(),
                name: name.to_string(),
            })
    }

    async fn decode(photo: Vec<u8>) -> Result<(UploadedImage, CaptureRecord), AttendanceError> {
        let (image, capture) = tokio::task::spawn_blocking(move || {
            UploadedImage::decode(photo).map(|image| {
                let capture = MetadataExtractor::extract(&image);
                (image, capture)
            })
        })
        .await??;
        Ok((image, capture))
    }

    async fn describe(
        &self,
        user: User,
        capture: CaptureRecord,
        client_ip: Option<IpAddr>,
    ) -> Result<AttendancePreview, AttendanceError> {
        let (capture_date, capture_time) =
            capture_date_and_time(&capture, Local::now().naive_local());

        let photo_lookup = async {
            match capture.coordinates() {
                Some((latitude, longitude)) => {
                    self.geolocator.reverse_geocode(latitude, longitude).await
                }
                None => UNKNOWN_LOCATION.to_string(),
            }
        };
        let upload_lookup = self.geolocator.upload_location(client_ip);
        let (photo_location, upload_location) = tokio::join!(photo_lookup, upload_lookup);

        Ok(AttendancePreview {
            group: user.group_name,
            name: user.name,
            roll_no: user.roll_no,
            capture,
            capture_date,
            capture_time,
            photo_location,
            upload_location,
        })
    }
}
