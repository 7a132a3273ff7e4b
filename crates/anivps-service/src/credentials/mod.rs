//! Connection credentials: extraction from run logs and transient token
//! custody.

pub mod scraper;
pub mod vault;

pub use scraper::{CredentialField, ScrapedCredentials, scrape};
pub use vault::CredentialVault;
