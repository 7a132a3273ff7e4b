//! Credential extraction from workflow run logs.
//!
//! Each field has one independent line-oriented `KEY[:=]value` pattern and
//! the first match wins. A value is either a single- or double-quoted string
//! closed on the same line, or a bare run of non-whitespace. Missing fields
//! resolve to fixed placeholders that callers must never treat as usable
//! credentials.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Placeholder reported when no address was found.
pub const ADDRESS_PLACEHOLDER: &str = "Unknown";
/// Placeholder reported when no username was found.
pub const USERNAME_PLACEHOLDER: &str = "Administrator";
/// Placeholder reported when no password was found.
pub const PASSWORD_PLACEHOLDER: &str = "Check logs";
/// Placeholder reported when no console URL was found.
pub const CONSOLE_URL_PLACEHOLDER: &str = "Unavailable";

/// Value GitHub prints in place of masked secrets.
const MASKED_VALUE: &str = "***";

fn field_pattern(keys: &str) -> Option<Regex> {
    Regex::new(&format!(
        r#"(?m)\b(?:{keys})[ \t]*[:=][ \t]*(?:"([^"\n]*)"|'([^'\n]*)'|([^\s"'][^\s]*))"#
    ))
    .ok()
}

static ADDRESS: LazyLock<Option<Regex>> =
    LazyLock::new(|| field_pattern("VPS_IP|RDP_ADDRESS|TAILSCALE_IP|NGROK_URL"));
static USERNAME: LazyLock<Option<Regex>> = LazyLock::new(|| field_pattern("VPS_USER|RDP_USER"));
static PASSWORD: LazyLock<Option<Regex>> =
    LazyLock::new(|| field_pattern("VPS_PASSWORD|RDP_PASSWORD"));
static CONSOLE_URL: LazyLock<Option<Regex>> = LazyLock::new(|| field_pattern("CONSOLE_URL"));

/// One scraped field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CredentialField {
    /// Value found in the logs.
    Extracted(String),
    /// Nothing found; carries the display placeholder.
    Placeholder(&'static str),
}

impl CredentialField {
    /// The extracted value, if any.
    pub fn extracted(&self) -> Option<&str> {
        match self {
            Self::Extracted(v) => Some(v),
            Self::Placeholder(_) => None,
        }
    }

    /// Whether a real value was found.
    pub fn is_extracted(&self) -> bool {
        matches!(self, Self::Extracted(_))
    }

    /// The value to show, placeholder included.
    pub fn display(&self) -> &str {
        match self {
            Self::Extracted(v) => v,
            Self::Placeholder(p) => p,
        }
    }
}

/// Result of scraping one log text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScrapedCredentials {
    pub address: CredentialField,
    pub username: CredentialField,
    pub password: CredentialField,
    pub console_url: CredentialField,
}

impl ScrapedCredentials {
    /// True only when address, username and password were all extracted.
    pub fn is_complete(&self) -> bool {
        self.address.is_extracted() && self.username.is_extracted() && self.password.is_extracted()
    }

    /// Names of the required fields that fell back to placeholders.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("address", &self.address),
            ("username", &self.username),
            ("password", &self.password),
        ]
        .into_iter()
        .filter(|(_, field)| !field.is_extracted())
        .map(|(name, _)| name)
        .collect()
    }
}

fn extract(pattern: &Option<Regex>, text: &str, placeholder: &'static str) -> CredentialField {
    pattern
        .as_ref()
        .and_then(|re| re.captures(text))
        .and_then(|caps| caps.iter().skip(1).flatten().next())
        .map(|m| m.as_str())
        .filter(|v| !v.trim().is_empty() && *v != MASKED_VALUE)
        .map(|v| CredentialField::Extracted(v.to_string()))
        .unwrap_or(CredentialField::Placeholder(placeholder))
}

/// Scrape connection details out of raw log text. Never fails.
pub fn scrape(log_text: &str) -> ScrapedCredentials {
    ScrapedCredentials {
        address: extract(&ADDRESS, log_text, ADDRESS_PLACEHOLDER),
        username: extract(&USERNAME, log_text, USERNAME_PLACEHOLDER),
        password: extract(&PASSWORD, log_text, PASSWORD_PLACEHOLDER),
        console_url: extract(&CONSOLE_URL, log_text, CONSOLE_URL_PLACEHOLDER),
    }
}
