use crate::db::{AttendanceRecord, DbPool, NewAttendance};

impl AttendanceRecord {
    pub async fn append(pool: &DbPool, row: &NewAttendance) -> Result<AttendanceRecord, sqlx::Error> {
        sqlx::query_as::<_, AttendanceRecord>(
            "INSERT INTO attendance (group_name, name, roll_no, capture_date, capture_time,
             latitude, longitude, photo_location, upload_location, image_file)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *",
        )
        .bind(&row.group_name)
        .bind(&row.name)
        .bind(&row.roll_no)
        .bind(&row.capture_date)
        .bind(&row.capture_time)
        .bind(row.latitude)
        .bind(row.longitude)
        .bind(&row.photo_location)
        .bind(&row.upload_location)
        .bind(&row.image_file)
        .fetch_one(pool)
        .await
    }

    pub async fn list_all(pool: &DbPool) -> Result<Vec<AttendanceRecord>, sqlx::Error> {
        sqlx::query_as::<_, AttendanceRecord>("SELECT * FROM attendance ORDER BY id")
            .fetch_all(pool)
            .await
    }

    /// Returns false when no row had that id
    pub async fn delete(pool: &DbPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM attendance WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count(pool: &DbPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM attendance")
            .fetch_one(pool)
            .await
    }
}
