use renova::models::{Client, Template};
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

pub const PACKAGE_PRESETS: [(&str, &str); 4] = [
    ("monthly", "📅 Monthly"),
    ("quarterly", "📅 Quarterly"),
    ("semiannual", "📅 Semiannual"),
    ("annual", "📅 Annual"),
];

pub const VALUE_PRESETS: [&str; 9] = [
    "30.00", "35.00", "40.00", "45.00", "50.00", "60.00", "70.00", "90.00", "135.00",
];

pub const SERVER_PRESETS: [&str; 3] = ["Servidor 1", "Servidor 2", "Premium"];

pub fn build_cancel_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        "❌ Cancel",
        "flow:cancel",
    )]])
}

pub fn build_menu_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            InlineKeyboardButton::callback("➕ Add client", "menu:add"),
            InlineKeyboardButton::callback("👥 List clients", "menu:list"),
        ],
        vec![
            InlineKeyboardButton::callback("📊 Report", "menu:report"),
            InlineKeyboardButton::callback("📄 Templates", "menu:templates"),
        ],
    ])
}

pub fn build_package_keyboard() -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = PACKAGE_PRESETS
        .chunks(2)
        .map(|pair| {
            pair.iter()
                .map(|(key, label)| {
                    InlineKeyboardButton::callback(*label, format!("add:package:{}", key))
                })
                .collect()
        })
        .collect();

    rows.push(vec![
        InlineKeyboardButton::callback("✏️ Custom", "add:package:custom"),
        InlineKeyboardButton::callback("❌ Cancel", "flow:cancel"),
    ]);

    InlineKeyboardMarkup::new(rows)
}

pub fn build_value_keyboard() -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = VALUE_PRESETS
        .chunks(3)
        .map(|chunk| {
            chunk
                .iter()
                .map(|value| {
                    let label = format!("💰 {}", value.replace('.', ","));
                    InlineKeyboardButton::callback(label, format!("add:value:{}", value))
                })
                .collect()
        })
        .collect();

    rows.push(vec![
        InlineKeyboardButton::callback("✏️ Custom value", "add:value:custom"),
        InlineKeyboardButton::callback("❌ Cancel", "flow:cancel"),
    ]);

    InlineKeyboardMarkup::new(rows)
}

pub fn build_due_keyboard(auto_date_display: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            format!("✅ Use {}", auto_date_display),
            "add:due:auto",
        )],
        vec![
            InlineKeyboardButton::callback("📅 Custom date", "add:due:custom"),
            InlineKeyboardButton::callback("❌ Cancel", "flow:cancel"),
        ],
    ])
}

pub fn build_server_keyboard() -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = SERVER_PRESETS
        .iter()
        .map(|server| {
            vec![InlineKeyboardButton::callback(
                format!("🖥️ {}", server),
                format!("add:server:{}", server),
            )]
        })
        .collect();

    rows.push(vec![
        InlineKeyboardButton::callback("✏️ Other", "add:server:custom"),
        InlineKeyboardButton::callback("❌ Cancel", "flow:cancel"),
    ]);

    InlineKeyboardMarkup::new(rows)
}

pub fn build_extra_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback("⏭️ Skip", "add:extra:skip"),
        InlineKeyboardButton::callback("❌ Cancel", "flow:cancel"),
    ]])
}

pub fn build_confirm_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback("✅ Save", "add:confirm")],
        vec![
            InlineKeyboardButton::callback("1️⃣ Name", "add:editstep:name"),
            InlineKeyboardButton::callback("2️⃣ Phone", "add:editstep:phone"),
            InlineKeyboardButton::callback("3️⃣ Package", "add:editstep:package"),
        ],
        vec![
            InlineKeyboardButton::callback("4️⃣ Value", "add:editstep:value"),
            InlineKeyboardButton::callback("5️⃣ Due date", "add:editstep:due"),
            InlineKeyboardButton::callback("6️⃣ Server", "add:editstep:server"),
        ],
        vec![InlineKeyboardButton::callback("❌ Cancel", "flow:cancel")],
    ])
}

pub fn build_clients_list_keyboard(
    clients: &[Client],
    today: chrono::NaiveDate,
) -> InlineKeyboardMarkup {
    let rows = clients
        .iter()
        .map(|client| {
            let days_left = (client.due_date - today).num_days();
            let marker = if days_left < 0 {
                "🔴"
            } else if days_left <= 3 {
                "⚠️"
            } else {
                "✅"
            };

            vec![InlineKeyboardButton::callback(
                format!(
                    "{} {} — {}",
                    marker,
                    client.name,
                    client.due_date.format("%d/%m/%Y")
                ),
                format!("client:view:{}", client.id),
            )]
        })
        .collect::<Vec<_>>();

    InlineKeyboardMarkup::new(rows)
}

pub fn build_client_actions_keyboard(client: &Client) -> InlineKeyboardMarkup {
    let payment_button = if client.is_paid() {
        InlineKeyboardButton::callback("↩️ Mark pending", format!("client:pending:{}", client.id))
    } else {
        InlineKeyboardButton::callback("💵 Mark paid", format!("client:paid:{}", client.id))
    };

    InlineKeyboardMarkup::new(vec![
        vec![
            InlineKeyboardButton::callback("🔄 Renew", format!("client:renew:{}", client.id)),
            payment_button,
        ],
        vec![
            InlineKeyboardButton::callback("✏️ Edit", format!("client:edit:{}", client.id)),
            InlineKeyboardButton::callback("📨 Send message", format!("client:send:{}", client.id)),
        ],
        vec![
            InlineKeyboardButton::callback("📋 History", format!("client:history:{}", client.id)),
            InlineKeyboardButton::callback("🗑️ Delete", format!("client:delete:{}", client.id)),
        ],
        vec![InlineKeyboardButton::callback("⬅️ Back to list", "menu:list")],
    ])
}

pub fn build_edit_fields_keyboard(client_id: i32) -> InlineKeyboardMarkup {
    let field_button = |label: &str, field: &str| {
        InlineKeyboardButton::callback(label.to_string(), format!("editf:{}:{}", field, client_id))
    };

    InlineKeyboardMarkup::new(vec![
        vec![
            field_button("📝 Name", "name"),
            field_button("📱 Phone", "phone"),
        ],
        vec![
            field_button("📦 Package", "package"),
            field_button("💰 Value", "price"),
        ],
        vec![
            field_button("📅 Due date", "due_date"),
            field_button("🖥️ Server", "server"),
        ],
        vec![
            field_button("🗒️ Notes", "extra_notes"),
            InlineKeyboardButton::callback("⬅️ Back", format!("client:view:{}", client_id)),
        ],
    ])
}

pub fn build_delete_confirm_keyboard(client_id: i32) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback("🗑️ Yes, delete", format!("client:delete_yes:{}", client_id)),
        InlineKeyboardButton::callback("⬅️ Back", format!("client:view:{}", client_id)),
    ]])
}

pub fn build_renew_keyboard(client_id: i32) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            "🔄 Package cycle",
            format!("renew:cycle:{}", client_id),
        )],
        vec![
            InlineKeyboardButton::callback("+30 days", format!("renew:days:30:{}", client_id)),
            InlineKeyboardButton::callback("+60 days", format!("renew:days:60:{}", client_id)),
        ],
        vec![
            InlineKeyboardButton::callback("+90 days", format!("renew:days:90:{}", client_id)),
            InlineKeyboardButton::callback("+365 days", format!("renew:days:365:{}", client_id)),
        ],
        vec![
            InlineKeyboardButton::callback("📅 Pick a date", format!("renew:date:{}", client_id)),
            InlineKeyboardButton::callback("⬅️ Back", format!("client:view:{}", client_id)),
        ],
    ])
}

pub fn build_send_keyboard(templates: &[Template], client_id: i32) -> InlineKeyboardMarkup {
    let mut rows = templates
        .iter()
        .map(|template| {
            vec![InlineKeyboardButton::callback(
                format!("📄 {}", template.name),
                format!("sendtpl:{}:{}", template.id, client_id),
            )]
        })
        .collect::<Vec<_>>();

    rows.push(vec![
        InlineKeyboardButton::callback("✏️ Ad-hoc message", format!("client:adhoc:{}", client_id)),
        InlineKeyboardButton::callback("⬅️ Back", format!("client:view:{}", client_id)),
    ]);

    InlineKeyboardMarkup::new(rows)
}

pub fn build_templates_keyboard(templates: &[Template]) -> InlineKeyboardMarkup {
    let mut rows = templates
        .iter()
        .map(|template| {
            vec![
                InlineKeyboardButton::callback(
                    format!("👁️ {}", template.name),
                    format!("tpl:view:{}", template.id),
                ),
                InlineKeyboardButton::callback("✏️", format!("tpl:edit:{}", template.id)),
                InlineKeyboardButton::callback("🗑️", format!("tpl:delete:{}", template.id)),
            ]
        })
        .collect::<Vec<_>>();

    rows.push(vec![InlineKeyboardButton::callback(
        "➕ New template",
        "tpl:new",
    )]);

    InlineKeyboardMarkup::new(rows)
}

pub fn build_template_delete_confirm_keyboard(template_id: i32) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback("🗑️ Yes, delete", format!("tpl:delete_yes:{}", template_id)),
        InlineKeyboardButton::callback("⬅️ Back", "menu:templates"),
    ]])
}
