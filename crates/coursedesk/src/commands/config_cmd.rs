//! Config subcommand handlers.

use dialoguer::{Input, Select};
use secrecy::SecretString;

use coursedesk_config::KeyringTokenStore;
use coursedesk_core::{DEFAULT_PAGE_SIZE, FilterDiscipline, Session};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Config as TOML-ish text. Tokens live in the keyring, never here.
fn format_config(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "page_size = {}", cfg.defaults.page_size);
    let _ = writeln!(out, "filter_mode = \"{}\"", cfg.defaults.filter_mode);
    let _ = writeln!(out, "insecure = {}", cfg.defaults.insecure);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let p = &cfg.profiles[name];
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "api_url = \"{}\"", p.api_url);
        if let Some(size) = p.page_size {
            let _ = writeln!(out, "page_size = {size}");
        }
        if let Some(mode) = p.filter_mode {
            let _ = writeln!(out, "filter_mode = \"{mode}\"");
        }
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if let Some(insecure) = p.insecure {
            let _ = writeln!(out, "insecure = {insecure}");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
    }

    out
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn sorted_names(cfg: &Config) -> Vec<&String> {
    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    names
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = config::config_path();
            eprintln!("Coursedesk admin console: configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(prompt_err)?;

            let api_url: String = Input::new()
                .with_prompt("Admin API URL")
                .default("http://localhost:8080".into())
                .interact_text()
                .map_err(prompt_err)?;

            let modes = &[
                "Server (filters and sorting sent to the API)",
                "Client (filter and sort each page locally)",
            ];
            let filter_mode = match Select::new()
                .with_prompt("Where should lists be filtered?")
                .items(modes)
                .default(0)
                .interact()
                .map_err(prompt_err)?
            {
                0 => FilterDiscipline::Server,
                _ => FilterDiscipline::Client,
            };

            let page_size: u32 = Input::new()
                .with_prompt("Rows per page")
                .default(DEFAULT_PAGE_SIZE)
                .interact_text()
                .map_err(prompt_err)?;

            let mut cfg = config::load_config_or_default();
            cfg.profiles.insert(
                profile_name.clone(),
                Profile {
                    api_url,
                    page_size: Some(page_size),
                    filter_mode: Some(filter_mode),
                    ..Profile::default()
                },
            );
            cfg.default_profile = Some(profile_name.clone());
            // Validates the URL and page size before anything is written.
            coursedesk_config::profile_to_client_config(
                &cfg.profiles[&profile_name],
                &cfg.defaults,
            )?;
            config::save_config(&cfg)?;

            let token =
                rpassword::prompt_password("Bearer token (empty to skip): ").map_err(prompt_err)?;
            if !token.trim().is_empty() {
                let session = Session::new(KeyringTokenStore::new(profile_name.clone()))
                    .map_err(coursedesk_core::CoreError::from)?;
                session
                    .login(SecretString::from(token.trim().to_owned()))
                    .map_err(coursedesk_core::CoreError::from)?;
                eprintln!("   ✓ Token stored in system keyring");
            }

            eprintln!("\n✓ Configuration written to {}", config_path.display());
            eprintln!("  Active profile: {profile_name}");
            eprintln!("\n  Test it: coursedesk users list");

            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            let out =
                output::render_single(&global.output, &cfg, format_config, |_| "config".into())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let active = config::active_profile_name(global, &cfg);
            let names = sorted_names(&cfg);
            if names.is_empty() {
                if !global.quiet {
                    eprintln!("No profiles configured. Run: coursedesk config init");
                }
                return Ok(());
            }
            for name in names {
                let marker = if *name == active { "*" } else { " " };
                println!("{marker} {name}  {}", cfg.profiles[name].api_url);
            }
            Ok(())
        }

        // ── Use <name> ──────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                let available = sorted_names(&cfg)
                    .into_iter()
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(", ");
                return Err(CliError::ProfileNotFound {
                    name,
                    available: if available.is_empty() {
                        "(none)".into()
                    } else {
                        available
                    },
                });
            }
            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            output::success(global, &format!("Default profile set to '{name}'"));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_lists_profiles_in_order() {
        let mut cfg = Config::default();
        for name in ["staging", "local"] {
            cfg.profiles.insert(
                name.into(),
                Profile {
                    api_url: format!("http://{name}"),
                    ..Profile::default()
                },
            );
        }
        let text = format_config(&cfg);
        let local = text.find("[profiles.local]").unwrap_or(usize::MAX);
        let staging = text.find("[profiles.staging]").unwrap_or(0);
        assert!(local < staging);
        assert!(text.contains("api_url = \"http://local\""));
        assert!(text.contains("default_profile = \"default\""));
    }
}
