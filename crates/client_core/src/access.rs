//! Access control evaluation against a [`Session`].
//!
//! Evaluation never fails: a missing row, an unknown resource type or an
//! unknown grant name all resolve to `false`.

use shared::domain::{Grant, ResourceType};

use crate::{error::ClientError, session::Session};

/// String-typed evaluator for call sites that carry wire names.
pub fn can(session: &Session, resource_type: &str, grant: &str) -> bool {
    let (Ok(resource), Ok(grant)) = (
        resource_type.parse::<ResourceType>(),
        grant.parse::<Grant>(),
    ) else {
        return false;
    };
    session.can(resource, grant)
}

/// `update`, or `update_self` on something the user owns.
pub fn can_edit(session: &Session, resource: ResourceType, is_owner: bool) -> bool {
    session.can(resource, Grant::Update) || (is_owner && session.can(resource, Grant::UpdateSelf))
}

/// `view`, or `view_self` on something the user owns.
pub fn can_view(session: &Session, resource: ResourceType, is_owner: bool) -> bool {
    session.can(resource, Grant::View) || (is_owner && session.can(resource, Grant::ViewSelf))
}

pub fn can_create(session: &Session, resource: ResourceType) -> bool {
    session.can(resource, Grant::Create)
}

pub fn can_remove(session: &Session, resource: ResourceType) -> bool {
    session.can(resource, Grant::Remove)
}

/// Refuses with [`ClientError::PermissionDenied`] when the grant is missing.
pub fn require(session: &Session, resource: ResourceType, grant: Grant) -> Result<(), ClientError> {
    if session.can(resource, grant) {
        Ok(())
    } else {
        Err(ClientError::PermissionDenied { resource, grant })
    }
}

#[cfg(test)]
#[path = "tests/access_tests.rs"]
mod tests;
