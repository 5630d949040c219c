use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bot_token: String,
    pub whatsapp_api_url: String,
    pub whatsapp_api_key: String,
    pub dispatch_hour: u32,
}

#[derive(Debug)]
pub struct ConfigError {
    pub missing_vars: Vec<String>,
    pub invalid_vars: Vec<(String, String)>,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.missing_vars.is_empty() {
            writeln!(f, "Missing required environment variables:")?;
            for var in &self.missing_vars {
                writeln!(f, "  - {}", var)?;
            }
        }
        if !self.invalid_vars.is_empty() {
            writeln!(f, "Invalid environment variables:")?;
            for (var, err) in &self.invalid_vars {
                writeln!(f, "  - {}: {}", var, err)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ConfigError {}

fn get_required(name: &str, missing: &mut Vec<String>) -> Option<String> {
    match env::var(name) {
        Ok(v) if !v.is_empty() => Some(v),
        _ => {
            missing.push(name.to_string());
            None
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut missing = Vec::new();
        let mut invalid = Vec::new();

        let database_url = get_required("DATABASE_URL", &mut missing);
        let bot_token = get_required("TELOXIDE_TOKEN", &mut missing);
        let whatsapp_api_url = get_required("WHATSAPP_API_URL", &mut missing);
        let whatsapp_api_key = get_required("WHATSAPP_API_KEY", &mut missing);

        let dispatch_hour = env::var("DISPATCH_HOUR")
            .unwrap_or_else(|_| "9".into())
            .parse::<u32>()
            .map_err(|e| {
                invalid.push(("DISPATCH_HOUR".into(), e.to_string()));
            })
            .unwrap_or(9);

        if dispatch_hour > 23 {
            invalid.push((
                "DISPATCH_HOUR".into(),
                format!("{} is not a valid hour of day", dispatch_hour),
            ));
        }

        match (database_url, bot_token, whatsapp_api_url, whatsapp_api_key) {
            (Some(database_url), Some(bot_token), Some(whatsapp_api_url), Some(whatsapp_api_key))
                if invalid.is_empty() =>
            {
                Ok(Self {
                    database_url,
                    bot_token,
                    whatsapp_api_url,
                    whatsapp_api_key,
                    dispatch_hour,
                })
            }
            _ => Err(ConfigError {
                missing_vars: missing,
                invalid_vars: invalid,
            }),
        }
    }
}
