use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::UnknownVariant;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(UserId);
id_newtype!(ItemId);
id_newtype!(ProjectId);
id_newtype!(LicensingId);
id_newtype!(ChecklistId);

/// Category of domain entity subject to permissioning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Customers,
    Institutions,
    Licensings,
    Properties,
    Projects,
    Banks,
    Users,
}

impl ResourceType {
    pub const ALL: [ResourceType; 7] = [
        ResourceType::Customers,
        ResourceType::Institutions,
        ResourceType::Licensings,
        ResourceType::Properties,
        ResourceType::Projects,
        ResourceType::Banks,
        ResourceType::Users,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceType::Customers => "customers",
            ResourceType::Institutions => "institutions",
            ResourceType::Licensings => "licensings",
            ResourceType::Properties => "properties",
            ResourceType::Projects => "projects",
            ResourceType::Banks => "banks",
            ResourceType::Users => "users",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceType::ALL
            .into_iter()
            .find(|resource| resource.as_str() == s)
            .ok_or_else(|| UnknownVariant::new("resource type", s))
    }
}

/// One named permission, scoped to a [`ResourceType`] by a [`RoleGrant`] row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grant {
    View,
    ViewSelf,
    Create,
    Update,
    UpdateSelf,
    Remove,
}

impl Grant {
    pub const ALL: [Grant; 6] = [
        Grant::View,
        Grant::ViewSelf,
        Grant::Create,
        Grant::Update,
        Grant::UpdateSelf,
        Grant::Remove,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Grant::View => "view",
            Grant::ViewSelf => "view_self",
            Grant::Create => "create",
            Grant::Update => "update",
            Grant::UpdateSelf => "update_self",
            Grant::Remove => "remove",
        }
    }
}

impl fmt::Display for Grant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Grant {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Grant::ALL
            .into_iter()
            .find(|grant| grant.as_str() == s)
            .ok_or_else(|| UnknownVariant::new("grant", s))
    }
}

/// One row per (user, resource type). The six flags are independent; no
/// combination is enforced at this level.
///
/// `resource_type` stays a plain string on the wire so a row naming a type
/// this client does not know about still deserializes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleGrant {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub resource_type: String,
    #[serde(default)]
    pub view: bool,
    #[serde(default)]
    pub view_self: bool,
    #[serde(default)]
    pub create: bool,
    #[serde(default)]
    pub update: bool,
    #[serde(default)]
    pub update_self: bool,
    #[serde(default)]
    pub remove: bool,
}

impl RoleGrant {
    /// A row for `resource_type` with every flag cleared.
    pub fn empty(resource_type: ResourceType) -> Self {
        Self {
            resource_type: resource_type.as_str().to_string(),
            ..Self::default()
        }
    }

    pub fn with(mut self, grant: Grant) -> Self {
        self.set(grant, true);
        self
    }

    pub fn resource(&self) -> Option<ResourceType> {
        self.resource_type.parse().ok()
    }

    pub fn flag(&self, grant: Grant) -> bool {
        match grant {
            Grant::View => self.view,
            Grant::ViewSelf => self.view_self,
            Grant::Create => self.create,
            Grant::Update => self.update,
            Grant::UpdateSelf => self.update_self,
            Grant::Remove => self.remove,
        }
    }

    pub fn set(&mut self, grant: Grant, value: bool) {
        let slot = match grant {
            Grant::View => &mut self.view,
            Grant::ViewSelf => &mut self.view_self,
            Grant::Create => &mut self.create,
            Grant::Update => &mut self.update,
            Grant::UpdateSelf => &mut self.update_self,
            Grant::Remove => &mut self.remove,
        };
        *slot = value;
    }
}

/// The user object returned by the backend once a token is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub id: UserId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub roles: Vec<RoleGrant>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_type_round_trips_through_its_wire_name() {
        for resource in ResourceType::ALL {
            assert_eq!(resource.as_str().parse::<ResourceType>().ok(), Some(resource));
        }
        assert!("invoices".parse::<ResourceType>().is_err());
    }

    #[test]
    fn grant_flags_are_independent() {
        let mut row = RoleGrant::empty(ResourceType::Projects).with(Grant::Remove);
        assert!(row.flag(Grant::Remove));
        assert!(!row.flag(Grant::Update));

        row.set(Grant::Remove, false);
        assert!(Grant::ALL.into_iter().all(|grant| !row.flag(grant)));
    }

    #[test]
    fn role_rows_default_missing_flags_to_false() {
        let row: RoleGrant =
            serde_json::from_str(r#"{"resource_type":"banks","view":true}"#).expect("row");
        assert_eq!(row.resource(), Some(ResourceType::Banks));
        assert!(row.view);
        assert!(!row.update);
    }
}
