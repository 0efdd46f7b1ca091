use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub roll_no: String,
    pub organisation: String,
    pub group_name: String,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Group {
    pub name: String,
    pub member_count: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub roll_no: String,
    pub organisation: String,
    pub group: String,
}

/// One row of the attendance log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AttendanceRecord {
    pub id: i64,
    pub group_name: String,
    pub name: String,
    pub roll_no: String,
    /// `YYYY-MM-DD`
    pub capture_date: String,
    /// `HH:MM:SS`
    pub capture_time: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub photo_location: String,
    pub upload_location: String,
    pub image_file: String,
    pub recorded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewAttendance {
    pub group_name: String,
    pub name: String,
    pub roll_no: String,
    pub capture_date: String,
    pub capture_time: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub photo_location: String,
    pub upload_location: String,
    pub image_file: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseStats {
    pub total_users: i64,
    pub total_attendance_records: i64,
    pub total_groups: i64,
}
