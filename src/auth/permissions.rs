use std::collections::HashSet;

use crate::database::repositories::UserRepository;

/// 登录时解析出的角色与权限
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grants {
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
}

/// 查询用户全部角色，合并各角色的权限（去重，保留首次出现的顺序）
///
/// 只在登录时调用一次，结果写入会话快照。
pub async fn resolve_grants(
    repo: &dyn UserRepository,
    user_id: i64,
) -> Result<Grants, sqlx::Error> {
    let roles = repo.roles_for_user(user_id).await?;

    let mut per_role = Vec::with_capacity(roles.len());
    for role in &roles {
        per_role.push(repo.permission_codes_for_role(role.id).await?);
    }

    Ok(Grants {
        roles: roles.into_iter().map(|r| r.code).collect(),
        permissions: union_permissions(per_role),
    })
}

pub fn union_permissions<I>(per_role: I) -> Vec<String>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut seen = HashSet::new();
    per_role
        .into_iter()
        .flatten()
        .filter(|code| seen.insert(code.clone()))
        .collect()
}
