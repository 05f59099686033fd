use async_trait::async_trait;
use sqlx::PgPool;

use super::UserRepository;
use crate::database::entities::{RoleEntity, UserEntity};

const USER_COLUMNS: &str = r#"
    id, username, password_hash, display_name, email, avatar, status, created_at, deleted_at
"#;

/// 用户存储库的 Postgres 实现
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserEntity>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM auth_user WHERE username = $1 ORDER BY deleted_at NULLS FIRST, id DESC LIMIT 1",
            USER_COLUMNS
        );
        sqlx::query_as::<_, UserEntity>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<UserEntity>, sqlx::Error> {
        let sql = format!("SELECT {} FROM auth_user WHERE id = $1", USER_COLUMNS);
        sqlx::query_as::<_, UserEntity>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn update_password_hash(
        &self,
        id: i64,
        password_hash: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE auth_user SET password_hash = $1, updated_at = now() WHERE id = $2")
            .bind(password_hash)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn roles_for_user(&self, user_id: i64) -> Result<Vec<RoleEntity>, sqlx::Error> {
        sqlx::query_as::<_, RoleEntity>(
            r#"
            SELECT r.id, r.code, r.name, r.description, r.status, r.created_at
            FROM auth_user_role ur
            INNER JOIN auth_role r ON r.id = ur.role_id
            WHERE ur.user_id = $1
            ORDER BY ur.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn permission_codes_for_role(&self, role_id: i64) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT p.code
            FROM auth_role_permission rp
            INNER JOIN auth_permission p ON p.id = rp.permission_id
            WHERE rp.role_id = $1
            ORDER BY p.code
            "#,
        )
        .bind(role_id)
        .fetch_all(&self.pool)
        .await
    }
}
