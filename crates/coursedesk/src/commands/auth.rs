//! Login, logout and status: token handling for the active profile.

use std::io::{IsTerminal, Read};

use secrecy::SecretString;

use coursedesk_config::{KeyringTokenStore, TOKEN_ENV};
use coursedesk_core::{CoreError, EntityKind, ListQuery, Session, TokenStore};

use crate::cli::{GlobalOpts, LoginArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

fn read_token(args: &LoginArgs) -> Result<SecretString, CliError> {
    let raw = if args.token_stdin || !std::io::stdin().is_terminal() {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        rpassword::prompt_password("Bearer token: ")?
    };
    let token = raw.trim();
    if token.is_empty() {
        return Err(CliError::Validation {
            field: "token".into(),
            reason: "token cannot be empty".into(),
        });
    }
    Ok(SecretString::from(token.to_owned()))
}

/// Store a token for the active profile, checking it first unless
/// `--no-verify`.
pub async fn login(args: LoginArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load_config_or_default();
    let profile = config::active_profile_name(global, &cfg);
    let token = read_token(&args)?;

    if !args.no_verify {
        let client_config = config::resolve_client_config(global, &cfg)?;
        let client = client_config.connect(Session::with_token(token.clone()))?;
        client
            .fetch(&EntityKind::Users.endpoint(), Some(&ListQuery::paged(1, 1)))
            .await
            .map_err(CoreError::from)?;
    }

    // Straight to the keyring so storage failures surface here.
    let session =
        Session::new(KeyringTokenStore::new(profile.clone())).map_err(CoreError::from)?;
    session.login(token).map_err(CoreError::from)?;
    output::success(global, &format!("Logged in (profile '{profile}')"));
    Ok(())
}

pub fn logout(global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load_config_or_default();
    let profile = config::active_profile_name(global, &cfg);
    let session = Session::new(KeyringTokenStore::new(profile.clone())).map_err(CoreError::from)?;
    session.logout().map_err(CoreError::from)?;
    output::success(global, &format!("Logged out (profile '{profile}')"));
    Ok(())
}

pub fn status(global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load_config_or_default();
    let profile = config::active_profile_name(global, &cfg);
    let api_url = cfg
        .profiles
        .get(&profile)
        .map(|p| p.api_url.clone())
        .or_else(|| global.api_url.clone())
        .unwrap_or_else(|| "(not configured)".into());

    let env_token = std::env::var(TOKEN_ENV).is_ok_and(|t| !t.trim().is_empty());
    let token = if env_token {
        format!("present (from {TOKEN_ENV})")
    } else {
        match KeyringTokenStore::new(profile.clone()).load() {
            Ok(Some(_)) => "present (keyring)".into(),
            Ok(None) => "none -- run: coursedesk login".into(),
            Err(e) => format!("unavailable ({e})"),
        }
    };

    let out = output::detail_lines(&[
        ("Profile", profile),
        ("API", api_url),
        ("Token", token),
    ]);
    output::print_output(&out, global.quiet);
    Ok(())
}
