use serde::{Deserialize, Serialize};

pub const STATE_EXPIRY_MINUTES: i64 = 30;
pub const MIN_NAME_LEN: usize = 2;
pub const MIN_PHONE_DIGITS: usize = 10;

pub fn sanitize_input(text: &str) -> String {
    text.trim()
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect::<String>()
        .trim()
        .to_string()
}

/// Digits-only phone normalization: spaces, dashes and parentheses dropped.
pub fn normalize_phone(text: &str) -> String {
    text.chars().filter(|c| c.is_ascii_digit()).collect()
}

pub mod states {
    pub const ADD_NAME: &str = "add_name";
    pub const ADD_PHONE: &str = "add_phone";
    pub const ADD_PACKAGE: &str = "add_package";
    pub const ADD_PACKAGE_CUSTOM: &str = "add_package_custom";
    pub const ADD_VALUE: &str = "add_value";
    pub const ADD_VALUE_CUSTOM: &str = "add_value_custom";
    pub const ADD_DUE: &str = "add_due";
    pub const ADD_DUE_CUSTOM: &str = "add_due_custom";
    pub const ADD_SERVER: &str = "add_server";
    pub const ADD_SERVER_CUSTOM: &str = "add_server_custom";
    pub const ADD_EXTRA: &str = "add_extra";
    pub const ADD_CONFIRM: &str = "add_confirm";
    pub const EDIT_FIELD: &str = "edit_field";
    pub const RENEW_DATE: &str = "renew_date";
    pub const TEMPLATE_NAME: &str = "template_name";
    pub const TEMPLATE_CONTENT: &str = "template_content";
    pub const TEMPLATE_EDIT_CONTENT: &str = "template_edit_content";
    pub const MESSAGE_ADHOC: &str = "message_adhoc";
}

/// In-flight client record during the intake flow. Dates are kept as ISO
/// strings and money as a plain decimal string until the final save.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ClientDraft {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub package: Option<String>,
    pub price: Option<String>,
    pub due_date: Option<String>,
    pub auto_due_date: Option<String>,
    pub server: Option<String>,
    pub extra_notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EditDraft {
    pub client_id: i32,
    pub field: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RenewDraft {
    pub client_id: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TemplateDraft {
    pub template_id: Option<i32>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MessageDraft {
    pub client_id: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_input_strips_control_chars() {
        assert_eq!(sanitize_input("  João\u{0} Silva  "), "João Silva");
        assert_eq!(sanitize_input("a\tb"), "a\tb");
    }

    #[test]
    fn test_normalize_phone() {
        assert_eq!(normalize_phone("(11) 99999-9999"), "11999999999");
        assert_eq!(normalize_phone("11 9 9999 9999"), "11999999999");
        assert_eq!(normalize_phone("abc"), "");
    }

    #[test]
    fn test_client_draft_survives_json_storage() {
        let draft = ClientDraft {
            name: Some("João".to_string()),
            phone: Some("11999999999".to_string()),
            package: Some("Monthly".to_string()),
            price: Some("45.00".to_string()),
            due_date: Some("2025-07-15".to_string()),
            auto_due_date: None,
            server: None,
            extra_notes: None,
        };

        let value = serde_json::to_value(&draft).unwrap();
        let restored: ClientDraft = serde_json::from_value(value).unwrap();
        assert_eq!(restored.name.as_deref(), Some("João"));
        assert_eq!(restored.due_date.as_deref(), Some("2025-07-15"));
        assert_eq!(restored.server, None);
    }
}
