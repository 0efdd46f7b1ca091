use crate::db::{DbPool, Group};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupDeletion {
    Deleted,
    NotFound,
    /// Group still has this many registered users
    HasMembers(i64),
}

impl Group {
    pub async fn list(pool: &DbPool) -> Result<Vec<Group>, sqlx::Error> {
        sqlx::query_as::<_, Group>(
            "SELECT g.name AS name, COUNT(u.id) AS member_count
             FROM groups g
             LEFT JOIN users u ON u.group_name = g.name
             GROUP BY g.name
             ORDER BY g.created_at, g.name",
        )
        .fetch_all(pool)
        .await
    }

    pub async fn list_names(pool: &DbPool) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>("SELECT name FROM groups ORDER BY created_at, name")
            .fetch_all(pool)
            .await
    }

    /// Groups someone can mark attendance for
    pub async fn list_with_members(pool: &DbPool) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT group_name FROM users
             GROUP BY group_name
             ORDER BY MIN(id)",
        )
        .fetch_all(pool)
        .await
    }

    pub async fn exists(pool: &DbPool, name: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM groups WHERE name = ?")
            .bind(name)
            .fetch_one(pool)
            .await
            .map(|count| count > 0)
    }

    /// Returns false when the group already existed
    pub async fn create(pool: &DbPool, name: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("INSERT OR IGNORE INTO groups (name) VALUES (?)")
            .bind(name)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Moves every member to `new_name`. Renaming onto an existing group
    /// merges the two. Returns false when `old_name` does not exist.
    pub async fn rename(pool: &DbPool, old_name: &str, new_name: &str) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let found = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM groups WHERE name = ?")
            .bind(old_name)
            .fetch_one(&mut *tx)
            .await?;
        if found == 0 {
            return Ok(false);
        }

        sqlx::query("INSERT OR IGNORE INTO groups (name) VALUES (?)")
            .bind(new_name)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE users SET group_name = ? WHERE group_name = ?")
            .bind(new_name)
            .bind(old_name)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM groups WHERE name = ?")
            .bind(old_name)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    pub async fn delete(pool: &DbPool, name: &str) -> Result<GroupDeletion, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let members = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE group_name = ?")
            .bind(name)
            .fetch_one(&mut *tx)
            .await?;
        if members > 0 {
            return Ok(GroupDeletion::HasMembers(members));
        }

        let result = sqlx::query("DELETE FROM groups WHERE name = ?")
            .bind(name)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        if result.rows_affected() > 0 {
            Ok(GroupDeletion::Deleted)
        } else {
            Ok(GroupDeletion::NotFound)
        }
    }

    pub async fn count(pool: &DbPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM groups")
            .fetch_one(pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_in_memory_pool, User};

    #[tokio::test]
    async fn test_create_is_idempotent() {
        let pool = create_in_memory_pool().await.unwrap();

        assert!(Group::create(&pool, "Team A").await.unwrap());
        assert!(!Group::create(&pool, "Team A").await.unwrap());
        assert!(Group::exists(&pool, "Team A").await.unwrap());
        assert_eq!(Group::count(&pool).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_counts_members() {
        let pool = create_in_memory_pool().await.unwrap();

        Group::create(&pool, "Empty").await.unwrap();
        User::create(&pool, "Asha", "R-01", "BASM4", "Team A").await.unwrap();
        User::create(&pool, "Ravi", "R-02", "BASM4", "Team A").await.unwrap();

        let groups = Group::list(&pool).await.unwrap();
        let team_a = groups.iter().find(|g| g.name == "Team A").unwrap();
        let empty = groups.iter().find(|g| g.name == "Empty").unwrap();
        assert_eq!(team_a.member_count, 2);
        assert_eq!(empty.member_count, 0);

        // Empty groups cannot be picked when marking attendance
        assert_eq!(
            Group::list_with_members(&pool).await.unwrap(),
            vec!["Team A"]
        );
    }

    #[tokio::test]
    async fn test_rename_moves_members() {
        let pool = create_in_memory_pool().await.unwrap();

        User::create(&pool, "Asha", "R-01", "BASM4", "Team A").await.unwrap();

        assert!(Group::rename(&pool, "Team A", "Team Alpha").await.unwrap());
        assert!(!Group::exists(&pool, "Team A").await.unwrap());
        assert_eq!(
            User::names_in_group(&pool, "Team Alpha").await.unwrap(),
            vec!["Asha"]
        );

        assert!(!Group::rename(&pool, "Missing", "Other").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_refuses_groups_with_members() {
        let pool = create_in_memory_pool().await.unwrap();

        User::create(&pool, "Asha", "R-01", "BASM4", "Team A").await.unwrap();
        Group::create(&pool, "Empty").await.unwrap();

        assert_eq!(
            Group::delete(&pool, "Team A").await.unwrap(),
            GroupDeletion::HasMembers(1)
        );
        assert_eq!(
            Group::delete(&pool, "Empty").await.unwrap(),
            GroupDeletion::Deleted
        );
        assert_eq!(
            Group::delete(&pool, "Empty").await.unwrap(),
            GroupDeletion::NotFound
        );
    }
}
