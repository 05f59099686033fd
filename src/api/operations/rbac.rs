use std::sync::Arc;
use std::time::Duration;

use crate::api::schema::{
    CreateRoleRequest, CreateUserRequest, DashboardStats, ListUsersQuery, PaginatedResponse,
    UpdateUserRequest,
};
use crate::cache::{SessionStore, models::session::SUPER_ADMIN_ID};
use crate::database::entities::{
    NewRole, NewUser, PermissionEntity, RoleEntity, USER_STATUS_ACTIVE, UserSummary, UserUpdate,
};
use crate::database::repositories::{RbacRepository, UserRepository};
use crate::error::AppError;
use crate::utils::{hash_password_blocking, with_deadline};

const DEFAULT_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 100;

// 与表结构的列宽一致
const MAX_DISPLAY_NAME_LEN: usize = 64;
const MAX_EMAIL_LEN: usize = 128;
const MAX_ROLE_FIELD_LEN: usize = 64;
const MAX_DESCRIPTION_LEN: usize = 255;

fn check_len(value: Option<&str>, max: usize, field: &str) -> Result<(), AppError> {
    match value {
        Some(v) if v.chars().count() > max => Err(AppError::Validation(format!(
            "{}长度不能超过{}个字符",
            field, max
        ))),
        _ => Ok(()),
    }
}

/// 唯一约束冲突（并发创建时存在性检查可能已过期）
fn is_unique_violation(err: &AppError) -> bool {
    matches!(err, AppError::Repository(sqlx::Error::Database(db)) if db.is_unique_violation())
}

/// 用户、角色、权限管理
#[derive(Clone)]
pub struct RbacService {
    repo: Arc<dyn RbacRepository>,
    users: Arc<dyn UserRepository>,
    sessions: SessionStore,
    bcrypt_cost: u32,
    timeout: Duration,
}

impl RbacService {
    pub fn new(
        repo: Arc<dyn RbacRepository>,
        users: Arc<dyn UserRepository>,
        sessions: SessionStore,
        bcrypt_cost: u32,
        timeout: Duration,
    ) -> Self {
        Self {
            repo,
            users,
            sessions,
            bcrypt_cost,
            timeout,
        }
    }

    pub async fn list_users(
        &self,
        query: ListUsersQuery,
    ) -> Result<PaginatedResponse<UserSummary>, AppError> {
        let page = query.page.unwrap_or(1);
        let size = query.size.unwrap_or(DEFAULT_PAGE_SIZE);
        if page == 0 || size == 0 || size > MAX_PAGE_SIZE {
            return Err(AppError::Validation(format!(
                "分页参数无效：page >= 1，size 取值 1..={}",
                MAX_PAGE_SIZE
            )));
        }

        let keyword = query.keyword.as_deref().map(str::trim).filter(|k| !k.is_empty());
        let (list, total) =
            with_deadline(self.timeout, self.repo.list_users(page, size, keyword)).await?;

        Ok(PaginatedResponse {
            list,
            total,
            page,
            size,
        })
    }

    pub async fn create_user(&self, req: CreateUserRequest) -> Result<i64, AppError> {
        let username = req.username.trim().to_string();
        if !(3..=64).contains(&username.chars().count()) {
            return Err(AppError::Validation("用户名长度必须在3到64个字符之间".into()));
        }
        if !(6..=128).contains(&req.password.chars().count()) {
            return Err(AppError::Validation("密码长度必须在6到128个字符之间".into()));
        }
        check_len(req.display_name.as_deref(), MAX_DISPLAY_NAME_LEN, "显示名称")?;
        check_len(req.email.as_deref(), MAX_EMAIL_LEN, "邮箱")?;

        if with_deadline(self.timeout, self.repo.live_username_exists(&username)).await? {
            return Err(AppError::UserAlreadyExists);
        }

        let password_hash = hash_password_blocking(req.password, self.bcrypt_cost).await?;
        let display_name = req
            .display_name
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| username.clone());

        let id = with_deadline(
            self.timeout,
            self.repo.create_user(NewUser {
                username,
                password_hash,
                display_name,
                email: req.email,
            }),
        )
        .await?;

        tracing::info!("Created user {}", id);
        Ok(id)
    }

    /// 更新用户资料与状态，超级管理员不可停用
    pub async fn update_user(&self, id: i64, req: UpdateUserRequest) -> Result<(), AppError> {
        if let Some(status) = req.status {
            if !matches!(status, 0 | 1) {
                return Err(AppError::Validation("状态只能为 0 或 1".into()));
            }
            if id == SUPER_ADMIN_ID && status != USER_STATUS_ACTIVE {
                return Err(AppError::Forbidden("不能停用超级管理员".into()));
            }
        }
        check_len(req.display_name.as_deref(), MAX_DISPLAY_NAME_LEN, "显示名称")?;
        check_len(req.email.as_deref(), MAX_EMAIL_LEN, "邮箱")?;

        let update = UserUpdate {
            display_name: req.display_name,
            email: req.email,
            status: req.status,
        };
        if !with_deadline(self.timeout, self.repo.update_user(id, update)).await? {
            return Err(AppError::NotFound("用户不存在".into()));
        }
        Ok(())
    }

    /// 软删除用户，超级管理员不可删除
    pub async fn delete_user(&self, id: i64) -> Result<(), AppError> {
        if id == SUPER_ADMIN_ID {
            return Err(AppError::Forbidden("不能删除超级管理员".into()));
        }

        if !with_deadline(self.timeout, self.repo.soft_delete_user(id)).await? {
            return Err(AppError::NotFound("用户不存在".into()));
        }

        self.sessions.delete_by_user_id(id).await?;
        tracing::info!("Deleted user {}", id);
        Ok(())
    }

    /// 管理员重置密码，同时清除该用户的全部会话
    pub async fn reset_password(&self, id: i64, password: String) -> Result<(), AppError> {
        if password.chars().count() < 6 {
            return Err(AppError::Validation("密码长度不能少于6个字符".into()));
        }
        let live = with_deadline(self.timeout, self.users.find_by_id(id))
            .await?
            .is_some_and(|u| u.deleted_at.is_none());
        if !live {
            return Err(AppError::NotFound("用户不存在".into()));
        }

        let password_hash = hash_password_blocking(password, self.bcrypt_cost).await?;
        with_deadline(
            self.timeout,
            self.users.update_password_hash(id, &password_hash),
        )
        .await?;

        self.sessions.delete_by_user_id(id).await?;
        Ok(())
    }

    pub async fn list_roles(&self) -> Result<Vec<RoleEntity>, AppError> {
        with_deadline(self.timeout, self.repo.list_roles()).await
    }

    pub async fn create_role(&self, req: CreateRoleRequest) -> Result<i64, AppError> {
        let code = req.code.trim().to_string();
        let name = req.name.trim().to_string();
        if code.is_empty()
            || code.chars().count() > MAX_ROLE_FIELD_LEN
            || name.is_empty()
            || name.chars().count() > MAX_ROLE_FIELD_LEN
        {
            return Err(AppError::Validation("角色编码和名称长度必须在1到64个字符之间".into()));
        }
        check_len(req.description.as_deref(), MAX_DESCRIPTION_LEN, "角色描述")?;

        if with_deadline(self.timeout, self.repo.role_code_exists(&code)).await? {
            return Err(AppError::RoleAlreadyExists);
        }

        with_deadline(
            self.timeout,
            self.repo.create_role(NewRole {
                code,
                name,
                description: req.description,
            }),
        )
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::RoleAlreadyExists
            } else {
                e
            }
        })
    }

    /// 删除角色；已登录会话的权限快照不受影响
    pub async fn delete_role(&self, id: i64) -> Result<(), AppError> {
        with_deadline(self.timeout, self.repo.delete_role(id)).await
    }

    pub async fn list_permissions(&self) -> Result<Vec<PermissionEntity>, AppError> {
        with_deadline(self.timeout, self.repo.list_permissions()).await
    }

    /// 仪表盘统计
    pub async fn dashboard(&self) -> Result<DashboardStats, AppError> {
        let user_count = with_deadline(self.timeout, self.repo.count_live_users()).await?;
        let role_count = with_deadline(self.timeout, self.repo.count_roles()).await?;
        Ok(DashboardStats {
            user_count,
            role_count,
        })
    }
}
