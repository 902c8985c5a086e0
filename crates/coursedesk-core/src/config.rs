// ── Runtime client configuration ──
//
// These types describe *how* to talk to the admin API.
// They never touch disk: the CLI/TUI resolve a profile into a
// `ClientConfig` and hand it in.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use coursedesk_api::transport::{TlsMode, TransportConfig};
use coursedesk_api::{AdminClient, Session};

use crate::error::CoreError;

/// Default rows per page for listing screens.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed dev servers).
    DangerAcceptInvalid,
}

/// Where filtering and sorting happen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FilterDiscipline {
    /// Filters, sorters and paging travel to the server together.
    #[default]
    Server,
    /// Only paging travels; the current page is filtered and sorted locally.
    Client,
}

/// Configuration for one admin API endpoint.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API base URL (e.g., `https://api.example.com`).
    pub base_url: Url,
    pub tls: TlsVerification,
    pub timeout: Duration,
    pub page_size: u32,
    pub discipline: FilterDiscipline,
}

impl ClientConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            page_size: DEFAULT_PAGE_SIZE,
            discipline: FilterDiscipline::default(),
        }
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: match &self.tls {
                TlsVerification::SystemDefaults => TlsMode::System,
                TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
                TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
            },
            timeout: self.timeout,
        }
    }

    /// Build an [`AdminClient`] bound to `session`.
    pub fn connect(&self, session: Session) -> Result<AdminClient, CoreError> {
        let http = self.transport().build_client()?;
        Ok(AdminClient::with_client(http, self.base_url.clone(), session))
    }
}
