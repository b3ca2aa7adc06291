use apihub_db::models::{SentenceRow, UserRow};
use apihub_db::queries;
use rusqlite::Connection;

use crate::error::ApiError;

/// What the sentence app knows about a caller's authority.
///
/// Two superuser signals exist: the account-wide flag on the user row and
/// the app-specific flag on the permission record. Either one grants
/// elevated privilege.
#[derive(Debug, Clone)]
pub struct BasicInfo {
    pub permission_is_superuser: bool,
    pub user_is_superuser: bool,
    /// Id of the caller's permission record; sentences they create point here.
    pub config_id: String,
}

impl BasicInfo {
    pub fn is_elevated(&self) -> bool {
        self.permission_is_superuser || self.user_is_superuser
    }

    pub fn owns(&self, sentence: &SentenceRow) -> bool {
        sentence.creator_id == self.config_id
    }

    pub fn can_modify(&self, sentence: &SentenceRow) -> bool {
        self.is_elevated() || self.owns(sentence)
    }

    pub fn require_elevated(&self) -> Result<(), ApiError> {
        if self.is_elevated() {
            Ok(())
        } else {
            Err(ApiError::Forbidden("Administrator privileges required"))
        }
    }
}

pub fn basic_info(conn: &Connection, user: &UserRow) -> Result<BasicInfo, ApiError> {
    let permission = queries::permission_by_user(conn, &user.id)?
        .ok_or_else(|| anyhow::anyhow!("User {} has no permission record", user.id))?;

    Ok(BasicInfo {
        permission_is_superuser: permission.is_superuser,
        user_is_superuser: user.is_superuser,
        config_id: permission.id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use apihub_db::models::CategoryRow;

    fn info(permission: bool, user: bool) -> BasicInfo {
        BasicInfo {
            permission_is_superuser: permission,
            user_is_superuser: user,
            config_id: "cfg-1".into(),
        }
    }

    fn sentence_by(creator: &str) -> SentenceRow {
        SentenceRow {
            id: "s".into(),
            content: "c".into(),
            from_source: None,
            from_who: None,
            likes: 0,
            is_disabled: false,
            category_id: "cat".into(),
            creator_id: creator.into(),
            created_at: String::new(),
            updated_at: String::new(),
            category: CategoryRow {
                id: "cat".into(),
                name: "n".into(),
                description: None,
                created_at: String::new(),
                updated_at: String::new(),
            },
        }
    }

    #[test]
    fn either_flag_elevates() {
        assert!(!info(false, false).is_elevated());
        assert!(info(true, false).is_elevated());
        assert!(info(false, true).is_elevated());
        assert!(info(false, false).require_elevated().is_err());
    }

    #[test]
    fn owner_or_elevated_may_modify() {
        let own = sentence_by("cfg-1");
        let other = sentence_by("cfg-2");
        assert!(info(false, false).can_modify(&own));
        assert!(!info(false, false).can_modify(&other));
        assert!(info(true, false).can_modify(&other));
    }
}
