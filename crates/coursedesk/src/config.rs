//! CLI configuration: thin wrapper around `coursedesk_config` shared types.
//!
//! Re-exports the shared types and adds resolution that respects
//! `GlobalOpts` flag overrides (--api-url, --insecure, --timeout).

use std::time::Duration;

use coursedesk_core::{ClientConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use coursedesk_config::{
    Config, Defaults, Profile, config_path, load_config_or_default, save_config,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.profile_name(global.profile.as_deref())
}

/// Build the `ClientConfig` for this run: profile values, then flags.
///
/// Without a matching profile, `--api-url` alone is enough.
pub fn resolve_client_config(
    global: &GlobalOpts,
    config: &Config,
) -> Result<ClientConfig, CliError> {
    let profile_name = active_profile_name(global, config);

    let mut client = match (config.profiles.get(&profile_name), &global.api_url) {
        (Some(profile), _) => coursedesk_config::profile_to_client_config(profile, &config.defaults)?,
        (None, Some(url)) => {
            let bare = Profile {
                api_url: url.clone(),
                ..Profile::default()
            };
            coursedesk_config::profile_to_client_config(&bare, &config.defaults)?
        }
        (None, None) if global.profile.is_some() => {
            let mut available: Vec<_> = config.profiles.keys().cloned().collect();
            available.sort();
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: if available.is_empty() {
                    "(none)".into()
                } else {
                    available.join(", ")
                },
            });
        }
        (None, None) => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
    };

    // Flag overrides
    if let Some(ref url) = global.api_url {
        client.base_url = url.parse().map_err(|_| CliError::Validation {
            field: "api-url".into(),
            reason: format!("invalid URL: {url}"),
        })?;
    }
    if global.insecure {
        client.tls = TlsVerification::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        client.timeout = Duration::from_secs(secs);
    }

    Ok(client)
}
