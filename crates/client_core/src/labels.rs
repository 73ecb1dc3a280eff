//! Display labels for resource types and grants.

use shared::domain::{Grant, ResourceType};

pub trait DisplayLabel {
    fn label(&self) -> &'static str;
}

impl DisplayLabel for ResourceType {
    fn label(&self) -> &'static str {
        match self {
            ResourceType::Customers => "Clientes",
            ResourceType::Institutions => "Instituições",
            ResourceType::Licensings => "Licenciamentos",
            ResourceType::Properties => "Imóveis",
            ResourceType::Projects => "Projetos",
            ResourceType::Banks => "Bancos",
            ResourceType::Users => "Usuários",
        }
    }
}

impl DisplayLabel for Grant {
    fn label(&self) -> &'static str {
        match self {
            Grant::View => "Visualizar",
            Grant::ViewSelf => "Visualizar próprios",
            Grant::Create => "Criar",
            Grant::Update => "Editar",
            Grant::UpdateSelf => "Editar próprios",
            Grant::Remove => "Excluir",
        }
    }
}

/// Falls back to echoing `resource_type` when it is not a known wire name.
pub fn translate_resource_type(resource_type: &str) -> String {
    resource_type
        .parse::<ResourceType>()
        .map(|resource| resource.label().to_string())
        .unwrap_or_else(|_| resource_type.to_string())
}

/// Falls back to echoing `grant` when it is not a known wire name.
pub fn translate_grant(grant: &str) -> String {
    grant
        .parse::<Grant>()
        .map(|grant| grant.label().to_string())
        .unwrap_or_else(|_| grant.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_names_translate() {
        assert_eq!(translate_resource_type("properties"), "Imóveis");
        assert_eq!(translate_grant("update_self"), "Editar próprios");
    }

    #[test]
    fn unknown_names_are_echoed() {
        for raw in ["invoices", "", "Projects", "projects "] {
            assert_eq!(translate_resource_type(raw), raw);
        }
        for raw in ["approve", "", "VIEW"] {
            assert_eq!(translate_grant(raw), raw);
        }
    }
}
