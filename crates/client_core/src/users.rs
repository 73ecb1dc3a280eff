//! Editing another user's grant rows.

use shared::{
    domain::{Grant, ResourceType, RoleGrant, UserId},
    protocol::UpdateRolesRequest,
};
use tracing::{info, warn};

use crate::{access, DashboardClient, Result};

impl DashboardClient {
    /// Replaces the grant rows of `user_id`. Requires `update` on users.
    ///
    /// Editing one's own rows reloads the live session. The rows are already
    /// saved at that point, so a failed reload is logged rather than returned.
    pub async fn update_user_roles(&self, user_id: UserId, roles: Vec<RoleGrant>) -> Result<()> {
        let session = self.session().await?;
        access::require(&session, ResourceType::Users, Grant::Update)?;

        let rows = roles.len();
        self.put_json(&format!("users/{user_id}/roles"), &UpdateRolesRequest { roles })
            .await?;
        info!(
            actor_user_id = session.user_id().0,
            target_user_id = user_id.0,
            rows,
            "users: grant rows updated"
        );

        if session.user_id() == user_id {
            if let Err(err) = self.reload_session().await {
                warn!(
                    user_id = user_id.0,
                    error = %err,
                    "users: grant rows saved but session reload failed"
                );
            }
        }
        Ok(())
    }
}

/// Fills in the flags implied by the ones set, the way the grant editor
/// presents them. Stored rows are not required to follow this.
pub fn normalize_grant(mut row: RoleGrant) -> RoleGrant {
    if row.remove {
        row.update = true;
    }
    if row.update {
        row.update_self = true;
        row.view = true;
    }
    if row.update_self {
        row.view_self = true;
    }
    if row.view {
        row.view_self = true;
    }
    row
}

/// One all-false row per resource type, as for a freshly created account.
pub fn default_grants() -> Vec<RoleGrant> {
    ResourceType::ALL
        .into_iter()
        .map(RoleGrant::empty)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remove_pulls_in_every_weaker_grant() {
        let row = normalize_grant(RoleGrant::empty(ResourceType::Banks).with(Grant::Remove));
        assert!(Grant::ALL
            .into_iter()
            .filter(|grant| *grant != Grant::Create)
            .all(|grant| row.flag(grant)));
        assert!(!row.create);
    }

    #[test]
    fn update_self_only_implies_view_self() {
        let row = normalize_grant(RoleGrant::empty(ResourceType::Projects).with(Grant::UpdateSelf));
        assert!(row.view_self);
        assert!(!row.view);
        assert!(!row.update);
    }

    #[test]
    fn default_grants_cover_every_resource_type_with_nothing_set() {
        let rows = default_grants();
        assert_eq!(rows.len(), ResourceType::ALL.len());
        assert!(rows
            .iter()
            .all(|row| Grant::ALL.into_iter().all(|grant| !row.flag(grant))));
    }
}
