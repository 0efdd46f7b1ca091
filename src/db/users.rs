use crate::db::{DbPool, User};

impl User {
    pub async fn create(
        pool: &DbPool,
        name: &str,
        roll_no: &str,
        organisation: &str,
        group_name: &str,
    ) -> Result<User, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("INSERT OR IGNORE INTO groups (name) VALUES (?)")
            .bind(group_name)
            .execute(&mut *tx)
            .await?;

        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (name, roll_no, organisation, group_name)
             VALUES (?, ?, ?, ?)
             RETURNING id, name, roll_no, organisation, group_name, created_at",
        )
        .bind(name)
        .bind(roll_no)
        .bind(organisation)
        .bind(group_name)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(user)
    }

    pub async fn exists(pool: &DbPool, name: &str, roll_no: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE name = ? AND roll_no = ?")
            .bind(name)
            .bind(roll_no)
            .fetch_one(pool)
            .await
            .map(|count| count > 0)
    }

    pub async fn list_all(pool: &DbPool) -> Result<Vec<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY id")
            .fetch_all(pool)
            .await
    }

    /// First registration matching the name inside the group
    pub async fn find_in_group(
        pool: &DbPool,
        group_name: &str,
        name: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE group_name = ? AND name = ? ORDER BY id LIMIT 1",
        )
        .bind(group_name)
        .bind(name)
        .fetch_optional(pool)
        .await
    }

    /// Distinct names registered in a group, in registration order
    pub async fn names_in_group(pool: &DbPool, group_name: &str) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT name FROM users WHERE group_name = ?
             GROUP BY name ORDER BY MIN(id)",
        )
        .bind(group_name)
        .fetch_all(pool)
        .await
    }

    /// Returns false when no user had that id
    pub async fn delete(pool: &DbPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_all(pool: &DbPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users").execute(pool).await?;
        Ok(result.rows_affected())
    }

    pub async fn count(pool: &DbPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_in_memory_pool, Group};

    #[tokio::test]
    async fn test_create_registers_group() {
        let pool = create_in_memory_pool().await.unwrap();

        let user = User::create(&pool, "Asha", "R-01", "BASM4", "Team A")
            .await
            .unwrap();
        assert_eq!(user.name, "Asha");
        assert_eq!(user.group_name, "Team A");

        let groups = Group::list_names(&pool).await.unwrap();
        assert_eq!(groups, vec!["Team A".to_string()]);
    }

    #[tokio::test]
    async fn test_duplicate_name_and_roll_rejected() {
        let pool = create_in_memory_pool().await.unwrap();

        User::create(&pool, "Asha", "R-01", "BASM4", "Team A")
            .await
            .unwrap();
        assert!(User::exists(&pool, "Asha", "R-01").await.unwrap());
        assert!(!User::exists(&pool, "Asha", "R-02").await.unwrap());

        let duplicate = User::create(&pool, "Asha", "R-01", "MAPA2", "Team B").await;
        assert!(duplicate.is_err());
        // Failed insert must not leave the new group behind
        assert_eq!(Group::list_names(&pool).await.unwrap(), vec!["Team A"]);
    }

    #[tokio::test]
    async fn test_names_in_group_are_distinct() {
        let pool = create_in_memory_pool().await.unwrap();

        User::create(&pool, "Asha", "R-01", "BASM4", "Team A").await.unwrap();
        User::create(&pool, "Ravi", "R-02", "BASM4", "Team A").await.unwrap();
        User::create(&pool, "Asha", "R-03", "BASM4", "Team A").await.unwrap();
        User::create(&pool, "Meera", "R-04", "BASM4", "Team B").await.unwrap();

        let names = User::names_in_group(&pool, "Team A").await.unwrap();
        assert_eq!(names, vec!["Asha", "Ravi"]);

        let first = User::find_in_group(&pool, "Team A", "Asha")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.roll_no, "R-01");
        assert!(User::find_in_group(&pool, "Team B", "Asha")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_delete_and_clear() {
        let pool = create_in_memory_pool().await.unwrap();

        let asha = User::create(&pool, "Asha", "R-01", "BASM4", "Team A").await.unwrap();
        User::create(&pool, "Ravi", "R-02", "BASM4", "Team A").await.unwrap();

        assert!(User::delete(&pool, asha.id).await.unwrap());
        assert!(!User::delete(&pool, asha.id).await.unwrap());
        assert_eq!(User::count(&pool).await.unwrap(), 1);

        assert_eq!(User::delete_all(&pool).await.unwrap(), 1);
        assert_eq!(User::count(&pool).await.unwrap(), 0);
    }
}
