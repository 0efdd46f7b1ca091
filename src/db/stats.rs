use crate::db::{AttendanceRecord, DatabaseStats, DbPool, Group, User};

impl DatabaseStats {
    pub async fn collect(pool: &DbPool) -> Result<DatabaseStats, sqlx::Error> {
        Ok(DatabaseStats {
            total_users: User::count(pool).await?,
            total_attendance_records: AttendanceRecord::count(pool).await?,
            total_groups: Group::count(pool).await?,
        })
    }

    /// Deletes every attendance row, user and group in one transaction.
    /// Admin credentials survive. Returns what was removed.
    pub async fn clear_records(pool: &DbPool) -> Result<DatabaseStats, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let attendance = sqlx::query("DELETE FROM attendance")
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let users = sqlx::query("DELETE FROM users")
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let groups = sqlx::query("DELETE FROM groups")
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;

        Ok(DatabaseStats {
            total_users: users as i64,
            total_attendance_records: attendance as i64,
            total_groups: groups as i64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_in_memory_pool;

    #[tokio::test]
    async fn test_collect_counts_every_table() {
        let pool = create_in_memory_pool().await.unwrap();

        User::create(&pool, "Asha", "R-01", "BASM4", "Team A").await.unwrap();
        User::create(&pool, "Ravi", "R-02", "BASM4", "Team B").await.unwrap();
        Group::create(&pool, "Team C").await.unwrap();

        let stats = DatabaseStats::collect(&pool).await.unwrap();
        assert_eq!(
            stats,
            DatabaseStats {
                total_users: 2,
                total_attendance_records: 0,
                total_groups: 3,
            }
        );
    }

    #[tokio::test]
    async fn test_clear_records_keeps_admin_credentials() {
        let pool = create_in_memory_pool().await.unwrap();
        crate::db::AdminCredentials::seed(&pool, "admin", "changeme")
            .await
            .unwrap();
        User::create(&pool, "Asha", "R-01", "BASM4", "Team A").await.unwrap();

        let removed = DatabaseStats::clear_records(&pool).await.unwrap();
        assert_eq!(removed.total_users, 1);
        assert_eq!(removed.total_groups, 1);

        let stats = DatabaseStats::collect(&pool).await.unwrap();
        assert_eq!(stats.total_users + stats.total_groups, 0);
        assert!(crate::db::AdminCredentials::verify(&pool, "admin", "changeme")
            .await
            .unwrap());
    }
}
