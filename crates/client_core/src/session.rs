//! The authenticated session: who is logged in and what they may do.
//!
//! A [`Session`] is an immutable snapshot built once per authentication. The
//! grant rows the backend embeds in the user object are folded into a
//! `(resource, grant) -> bool` table at construction so evaluation is a single
//! lookup. [`SessionStore`] holds the one live session of a client and is only
//! written at lifecycle boundaries (login, restore, logout, grant reload).

use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use shared::domain::{AuthenticatedUser, Grant, ResourceType, UserId};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Session {
    user: AuthenticatedUser,
    grants: HashMap<(ResourceType, Grant), bool>,
    established_at: DateTime<Utc>,
}

impl Session {
    pub fn from_user(user: AuthenticatedUser) -> Self {
        let mut grants = HashMap::new();
        for row in &user.roles {
            let Some(resource) = row.resource() else {
                debug!(
                    user_id = user.id.0,
                    resource_type = %row.resource_type,
                    "session: skipping grant row for unknown resource type"
                );
                continue;
            };
            for grant in Grant::ALL {
                let slot = grants.entry((resource, grant)).or_insert(false);
                *slot |= row.flag(grant);
            }
        }

        Self {
            user,
            grants,
            established_at: Utc::now(),
        }
    }

    pub fn user(&self) -> &AuthenticatedUser {
        &self.user
    }

    pub fn user_id(&self) -> UserId {
        self.user.id
    }

    pub fn established_at(&self) -> DateTime<Utc> {
        self.established_at
    }

    /// `true` iff some grant row for `resource` has `grant` set.
    pub fn can(&self, resource: ResourceType, grant: Grant) -> bool {
        self.grants
            .get(&(resource, grant))
            .copied()
            .unwrap_or(false)
    }
}

#[derive(Debug, Default)]
pub struct SessionStore {
    current: RwLock<Option<Arc<Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn install(&self, session: Session) -> Arc<Session> {
        let session = Arc::new(session);
        *self.current.write().await = Some(Arc::clone(&session));
        session
    }

    pub async fn current(&self) -> Option<Arc<Session>> {
        self.current.read().await.clone()
    }

    /// Drops the live session, returning whether one existed.
    pub async fn clear(&self) -> bool {
        self.current.write().await.take().is_some()
    }
}
