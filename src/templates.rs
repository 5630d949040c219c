//! Placeholder substitution for customer-facing message templates.

use crate::models::Client;
use crate::normalize::{format_date, format_money};
use chrono::NaiveDate;

/// The fixed placeholder vocabulary templates may reference.
pub const PLACEHOLDERS: [&str; 7] = [
    "name",
    "phone",
    "package",
    "price",
    "due_date",
    "server",
    "days_remaining",
];

/// Template names the notification scheduler consumes, keyed by day-offset
/// from the due date (negative = overdue).
pub const RESERVED_OFFSETS: [i64; 4] = [-2, -1, 0, 1];

pub fn reminder_template_name(offset: i64) -> String {
    format!("reminder_{}", offset)
}

/// Default bodies seeded at startup for the reserved reminder names. The
/// operator can edit them afterwards; seeding never overwrites.
pub const DEFAULT_TEMPLATES: [(&str, &str); 5] = [
    (
        "reminder_1",
        "Olá {name}! 👋\n\nSeu plano {package} vence amanhã ({due_date}).\n💰 Valor: R$ {price}\n🖥️ Servidor: {server}\n\nRenove para não perder o acesso!",
    ),
    (
        "reminder_0",
        "⚠️ ATENÇÃO {name}!\n\nSeu plano {package} vence HOJE ({due_date}).\n💰 Valor: R$ {price}\n\nRenove agora para não perder o acesso!",
    ),
    (
        "reminder_-1",
        "🔴 {name}, seu plano venceu ontem!\n\n📦 Pacote: {package}\n💰 Valor para renovação: R$ {price}\n📅 Vencimento: {due_date}\n\nRenove para reativar o serviço!",
    ),
    (
        "reminder_-2",
        "🔴 PLANO VENCIDO - {name}\n\nSeu plano venceu em {due_date}.\n\n📦 Pacote: {package}\n💰 Valor para renovação: R$ {price}\n\nRenove urgentemente para reativar o serviço!",
    ),
    (
        "welcome",
        "Olá {name}! 👋\n\nSeja bem-vindo ao nosso serviço!\n\n📦 Seu pacote: {package}\n💰 Valor: R$ {price}\n📅 Vencimento: {due_date}\n\nQualquer dúvida, estamos aqui para ajudar!",
    ),
];

/// Renders `content` against a client. Substitution is all-or-nothing: if the
/// content references anything outside the placeholder vocabulary, or a brace
/// is left unclosed, the raw content comes back untouched. Rendering never
/// fails past this boundary.
pub fn render(content: &str, client: &Client, today: NaiveDate) -> String {
    try_render(content, client, today).unwrap_or_else(|| content.to_string())
}

fn try_render(content: &str, client: &Client, today: NaiveDate) -> Option<String> {
    let days_remaining = (client.due_date - today).num_days().to_string();

    let mut out = String::with_capacity(content.len());
    let mut cursor = 0;

    while cursor < content.len() {
        let Some(open) = content[cursor..].find('{') else {
            out.push_str(&content[cursor..]);
            break;
        };
        let open = cursor + open;
        out.push_str(&content[cursor..open]);

        let rest = &content[open + 1..];
        let close = rest.find('}')?;
        let token = &rest[..close];
        if token.contains('{') {
            return None;
        }

        match token {
            "name" => out.push_str(&client.name),
            "phone" => out.push_str(&client.phone),
            "package" => out.push_str(&client.package),
            "server" => out.push_str(&client.server),
            "price" => out.push_str(&format_money(&client.price)),
            "due_date" => out.push_str(&format_date(client.due_date)),
            "days_remaining" => out.push_str(&days_remaining),
            _ => return None,
        }

        cursor = open + 1 + close + 1;
    }

    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use chrono::{NaiveDate, Utc};
    use std::str::FromStr;

    fn sample_client() -> Client {
        Client {
            id: 1,
            owner_id: 10,
            name: "João Silva".to_string(),
            phone: "11999999999".to_string(),
            package: "Netflix monthly".to_string(),
            price: BigDecimal::from_str("25.90").unwrap(),
            due_date: NaiveDate::from_ymd_opt(2025, 6, 12).unwrap(),
            server: "Servidor 1".to_string(),
            extra_notes: None,
            payment_status: "pending".to_string(),
            payment_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 10).unwrap()
    }

    #[test]
    fn test_render_substitutes_vocabulary() {
        let client = sample_client();
        let rendered = render(
            "Olá {name}, plano {package} vence em {due_date} ({days_remaining} dias). R$ {price}",
            &client,
            today(),
        );
        assert_eq!(
            rendered,
            "Olá João Silva, plano Netflix monthly vence em 12/06/2025 (2 dias). R$ 25,90"
        );
    }

    #[test]
    fn test_render_negative_days_remaining() {
        let mut client = sample_client();
        client.due_date = NaiveDate::from_ymd_opt(2025, 6, 8).unwrap();
        let rendered = render("{days_remaining}", &client, today());
        assert_eq!(rendered, "-2");
    }

    #[test]
    fn test_render_unknown_placeholder_falls_back_to_raw() {
        let client = sample_client();
        let content = "Hi {unknown_field}";
        assert_eq!(render(content, &client, today()), content);
    }

    #[test]
    fn test_render_fallback_is_all_or_nothing() {
        let client = sample_client();
        let content = "Hi {name}, your {pix_key} is ready";
        // No partial substitution: {name} stays literal too.
        assert_eq!(render(content, &client, today()), content);
    }

    #[test]
    fn test_render_unclosed_brace_falls_back() {
        let client = sample_client();
        let content = "Hi {name";
        assert_eq!(render(content, &client, today()), content);
    }

    #[test]
    fn test_render_without_placeholders_is_identity() {
        let client = sample_client();
        assert_eq!(render("plain text", &client, today()), "plain text");
    }

    #[test]
    fn test_reminder_template_name() {
        assert_eq!(reminder_template_name(-2), "reminder_-2");
        assert_eq!(reminder_template_name(0), "reminder_0");
        assert_eq!(reminder_template_name(1), "reminder_1");
    }

    #[test]
    fn test_default_templates_render_cleanly() {
        let client = sample_client();
        for (name, content) in DEFAULT_TEMPLATES {
            let rendered = render(content, &client, today());
            assert_ne!(rendered, content, "default template {} fell back", name);
            assert!(!rendered.contains('{'), "unresolved token in {}", name);
        }
    }
}
