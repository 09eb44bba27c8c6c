use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::{domain::ChatId, errors::Error, Result};

/// How new ticket ids are allocated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TicketIdStrategy {
    /// `PREFIX` + random token drawn from the ticket alphabet.
    Random,
    /// `PREFIX` + zero-padded monotonically increasing counter.
    Counter,
}

impl TicketIdStrategy {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "random" => Some(Self::Random),
            "counter" | "sequential" => Some(Self::Counter),
            _ => None,
        }
    }
}

/// Typed configuration, read from the environment (and an optional `.env`).
#[derive(Clone, Debug)]
pub struct Config {
    // Core
    pub telegram_bot_token: String,
    pub staff_chat_id: ChatId,

    // Ticket ids
    pub ticket_id_prefix: String,
    pub ticket_id_length: usize,
    pub ticket_id_strategy: TicketIdStrategy,

    // Presentation
    pub support_label: String,
    pub brand_name: String,
    pub broadcast_marker: String,

    // Telegram limits
    pub telegram_safe_limit: usize,

    // Audit
    pub audit_log_path: PathBuf,
    pub audit_log_json: bool,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let telegram_bot_token = env_str("BOT_TOKEN")
            .or_else(|| env_str("TELEGRAM_BOT_TOKEN"))
            .and_then(non_empty)
            .ok_or_else(|| {
                Error::Config("BOT_TOKEN environment variable is required".to_string())
            })?;

        let staff_chat_id = env_str("GROUP_ID")
            .and_then(non_empty)
            .ok_or_else(|| Error::Config("GROUP_ID environment variable is required".to_string()))?
            .trim()
            .parse::<i64>()
            .map(ChatId)
            .map_err(|e| Error::Config(format!("GROUP_ID must be a numeric chat id: {e}")))?;

        let ticket_id_prefix = env_str("TICKET_ID_PREFIX")
            .and_then(non_empty)
            .unwrap_or_else(|| "BV-".to_string());
        let ticket_id_length = env_usize("TICKET_ID_LENGTH").unwrap_or(8).clamp(4, 32);
        let ticket_id_strategy = match env_str("TICKET_ID_STRATEGY") {
            Some(raw) => TicketIdStrategy::parse(&raw).ok_or_else(|| {
                Error::Config(format!(
                    "TICKET_ID_STRATEGY must be `random` or `counter`, got `{raw}`"
                ))
            })?,
            None => TicketIdStrategy::Random,
        };

        let support_label = env_str("SUPPORT_LABEL")
            .and_then(non_empty)
            .unwrap_or_else(|| "Support".to_string());
        let brand_name = env_str("BRAND_NAME")
            .and_then(non_empty)
            .unwrap_or_else(|| "BlockVeil Support".to_string());
        let broadcast_marker = env_str("BROADCAST_MARKER")
            .and_then(non_empty)
            .unwrap_or_else(|| "@all".to_string());

        let telegram_safe_limit = env_usize("TELEGRAM_SAFE_LIMIT").unwrap_or(4000);

        let audit_log_path = PathBuf::from(
            env_str("AUDIT_LOG_PATH").unwrap_or_else(|| "/tmp/bvs-audit.log".to_string()),
        );
        let audit_log_json = env_bool("AUDIT_LOG_JSON").unwrap_or(false);

        Ok(Self {
            telegram_bot_token,
            staff_chat_id,
            ticket_id_prefix,
            ticket_id_length,
            ticket_id_strategy,
            support_label,
            brand_name,
            broadcast_marker,
            telegram_safe_limit,
            audit_log_path,
            audit_log_json,
        })
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim().trim_start_matches("export ").trim();
        if key.is_empty() {
            continue;
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        out.push((key.to_string(), val));
    }
    out
}

fn env_bool(key: &str) -> Option<bool> {
    env_str(key).map(|s| {
        matches!(
            s.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn env_usize(key: &str) -> Option<usize> {
    env_str(key).and_then(|s| s.trim().parse::<usize>().ok())
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dotenv_parsing_strips_quotes_and_comments() {
        let parsed = parse_dotenv(
            "# comment\nBOT_TOKEN=\"123:abc\"\n\nexport GROUP_ID = -10042\nBROKEN\nX='y'\n",
        );
        assert_eq!(
            parsed,
            vec![
                ("BOT_TOKEN".to_string(), "123:abc".to_string()),
                ("GROUP_ID".to_string(), "-10042".to_string()),
                ("X".to_string(), "y".to_string()),
            ]
        );
    }

    #[test]
    fn id_strategy_accepts_aliases() {
        assert_eq!(
            TicketIdStrategy::parse(" Random "),
            Some(TicketIdStrategy::Random)
        );
        assert_eq!(
            TicketIdStrategy::parse("sequential"),
            Some(TicketIdStrategy::Counter)
        );
        assert_eq!(TicketIdStrategy::parse("uuid"), None);
    }
}
