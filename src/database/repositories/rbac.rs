use async_trait::async_trait;
use sqlx::PgPool;

use super::RbacRepository;
use crate::database::entities::{
    NewRole, NewUser, PermissionEntity, RoleEntity, UserSummary, UserUpdate,
};

/// 后台管理存储库的 Postgres 实现
#[derive(Clone)]
pub struct PgRbacRepository {
    pool: PgPool,
}

impl PgRbacRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RbacRepository for PgRbacRepository {
    async fn list_users(
        &self,
        page: u32,
        size: u32,
        keyword: Option<&str>,
    ) -> Result<(Vec<UserSummary>, i64), sqlx::Error> {
        let pattern = keyword.map(|k| format!("%{}%", k));

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT count(*) FROM auth_user
            WHERE deleted_at IS NULL AND ($1::text IS NULL OR username LIKE $1)
            "#,
        )
        .bind(pattern.as_deref())
        .fetch_one(&self.pool)
        .await?;

        let list = sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT id, username, display_name, email, status, created_at
            FROM auth_user
            WHERE deleted_at IS NULL AND ($1::text IS NULL OR username LIKE $1)
            ORDER BY id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(pattern.as_deref())
        .bind(i64::from(size))
        .bind(i64::from(page.saturating_sub(1)) * i64::from(size))
        .fetch_all(&self.pool)
        .await?;

        Ok((list, total))
    }

    async fn live_username_exists(&self, username: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM auth_user WHERE username = $1 AND deleted_at IS NULL)",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await
    }

    async fn create_user(&self, user: NewUser) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            INSERT INTO auth_user (username, password_hash, display_name, email)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(user.username)
        .bind(user.password_hash)
        .bind(user.display_name)
        .bind(user.email)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_user(&self, id: i64, update: UserUpdate) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE auth_user
            SET display_name = COALESCE($1, display_name),
                email = COALESCE($2, email),
                status = COALESCE($3, status),
                updated_at = now()
            WHERE id = $4 AND deleted_at IS NULL
            "#,
        )
        .bind(update.display_name)
        .bind(update.email)
        .bind(update.status)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn soft_delete_user(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE auth_user SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_roles(&self) -> Result<Vec<RoleEntity>, sqlx::Error> {
        sqlx::query_as::<_, RoleEntity>(
            "SELECT id, code, name, description, status, created_at FROM auth_role ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn role_code_exists(&self, code: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM auth_role WHERE code = $1)")
            .bind(code)
            .fetch_one(&self.pool)
            .await
    }

    async fn create_role(&self, role: NewRole) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO auth_role (code, name, description) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(role.code)
        .bind(role.name)
        .bind(role.description)
        .fetch_one(&self.pool)
        .await
    }

    async fn delete_role(&self, id: i64) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM auth_role_permission WHERE role_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM auth_user_role WHERE role_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM auth_role WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await
    }

    async fn list_permissions(&self) -> Result<Vec<PermissionEntity>, sqlx::Error> {
        sqlx::query_as::<_, PermissionEntity>(
            "SELECT id, code, name, resource, action, description FROM auth_permission ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn count_live_users(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT count(*) FROM auth_user WHERE deleted_at IS NULL")
            .fetch_one(&self.pool)
            .await
    }

    async fn count_roles(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT count(*) FROM auth_role")
            .fetch_one(&self.pool)
            .await
    }
}
