//! Field-level permission resolution.
//!
//! Decides per-(module, field) view/edit/report visibility for a user by
//! layering three sources, strictly in this order:
//! 1. role-specific override rows (`field_permissions`) — a single grant from
//!    any assigned role is sufficient; there is no most-restrictive-role rule,
//! 2. the global data-dictionary default for the field,
//! 3. a permissive default when nothing is configured.
//!
//! A user with no roles at all is denied outright. The role-id set is always
//! re-queried from the store — unlike the coarse gate, this check must see
//! assignments made after the session token was issued.

use crate::errors::AppError;
use crate::store::postgres::{DataDictionaryRow, FieldPermissionRow, PgStore};

/// `special_edit` beats the dictionary: any role carrying the override grants
/// edit rights no matter what the dictionary says.
pub(crate) fn editable_decision(
    has_special_override: bool,
    dictionary: Option<&DataDictionaryRow>,
) -> bool {
    if has_special_override {
        return true;
    }
    match dictionary {
        Some(entry) => entry.editable != 0,
        None => true,
    }
}

/// Aspect decision for view/report flags: a single granting row wins; with no
/// rows configured the field is unrestricted.
pub(crate) fn aspect_decision(flags: &[i16]) -> bool {
    flags.is_empty() || flags.iter().any(|&f| f != 0)
}

/// Store-backed resolver. Cheap to construct per call site.
pub struct FieldPermissionResolver<'a> {
    db: &'a PgStore,
}

impl<'a> FieldPermissionResolver<'a> {
    pub fn new(db: &'a PgStore) -> Self {
        Self { db }
    }

    /// Can `user_id` edit `(module, field)`?
    /// Precedence: special role override > dictionary default > permissive.
    pub async fn check_field_editable(
        &self,
        user_id: i64,
        module: &str,
        field: &str,
    ) -> Result<bool, AppError> {
        let role_ids = self.db.user_role_ids(user_id).await?;
        if role_ids.is_empty() {
            return Ok(false);
        }

        if self
            .db
            .special_edit_exists(&role_ids, module, field)
            .await?
        {
            return Ok(true);
        }

        let dictionary = self.db.active_dictionary_entry(module, field).await?;
        Ok(editable_decision(false, dictionary.as_ref()))
    }

    /// Can `user_id` see `(module, field)`?
    pub async fn check_field_viewable(
        &self,
        user_id: i64,
        module: &str,
        field: &str,
    ) -> Result<bool, AppError> {
        self.check_aspect(user_id, module, field, |row| row.viewable)
            .await
    }

    /// Should `(module, field)` appear in reports generated for `user_id`?
    pub async fn check_field_report_visible(
        &self,
        user_id: i64,
        module: &str,
        field: &str,
    ) -> Result<bool, AppError> {
        self.check_aspect(user_id, module, field, |row| row.report_visible)
            .await
    }

    async fn check_aspect(
        &self,
        user_id: i64,
        module: &str,
        field: &str,
        flag: fn(&FieldPermissionRow) -> i16,
    ) -> Result<bool, AppError> {
        let role_ids = self.db.user_role_ids(user_id).await?;
        if role_ids.is_empty() {
            return Ok(false);
        }

        let rows = self
            .db
            .field_permissions_for(&role_ids, module, field)
            .await?;
        let flags: Vec<i16> = rows.iter().map(flag).collect();
        Ok(aspect_decision(&flags))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn dict_entry(editable: i16) -> DataDictionaryRow {
        DataDictionaryRow {
            id: 1,
            module: "user".into(),
            field: "password".into(),
            label: "Password".into(),
            description: String::new(),
            required: 0,
            editable,
            data_type: "string".into(),
            max_length: 0,
            options: String::new(),
            default_value: String::new(),
            status: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_special_override_beats_restrictive_dictionary() {
        // Precedence law: override wins even when the dictionary says locked.
        let dict = dict_entry(0);
        assert!(editable_decision(true, Some(&dict)));
    }

    #[test]
    fn test_dictionary_restriction_applies_without_override() {
        let dict = dict_entry(0);
        assert!(!editable_decision(false, Some(&dict)));
    }

    #[test]
    fn test_dictionary_grant_applies_without_override() {
        let dict = dict_entry(1);
        assert!(editable_decision(false, Some(&dict)));
    }

    #[test]
    fn test_unconfigured_field_defaults_to_editable() {
        assert!(editable_decision(false, None));
    }

    #[test]
    fn test_aspect_single_grant_suffices() {
        // Two roles disagree — the granting one wins.
        assert!(aspect_decision(&[0, 1]));
    }

    #[test]
    fn test_aspect_all_denying_rows_deny() {
        assert!(!aspect_decision(&[0, 0]));
    }

    #[test]
    fn test_aspect_no_rows_is_unrestricted() {
        assert!(aspect_decision(&[]));
    }
}
