//! Command dispatch: bridges CLI args -> core listings/mutations -> output.

pub mod auth;
pub mod config_cmd;
pub mod entity;
pub mod subjects;
pub mod tasks;
pub mod token;
pub mod users;
pub mod util;

use coursedesk_core::{AdminClient, ClientConfig, Mutator, Session};
use tracing::warn;

use crate::cli::{Command, GlobalOpts};
use crate::config;
use crate::error::CliError;

/// Everything an API-bound command needs.
pub struct Context {
    pub config: ClientConfig,
    pub client: AdminClient,
    pub mutator: Mutator,
}

impl Context {
    /// Resolve the profile, open its session and build the client.
    ///
    /// An unusable keyring is not fatal here: the run simply has no token
    /// and any request fails as unauthenticated.
    pub fn connect(global: &GlobalOpts) -> Result<Self, CliError> {
        let cfg = config::load_config_or_default();
        let profile_name = config::active_profile_name(global, &cfg);
        let client_config = config::resolve_client_config(global, &cfg)?;

        let session = coursedesk_config::open_session(&profile_name).unwrap_or_else(|e| {
            warn!(error = %e, "token storage unavailable, continuing without a token");
            Session::ephemeral()
        });

        let client = client_config.connect(session)?;
        Ok(Self {
            mutator: Mutator::new(client.clone()),
            client,
            config: client_config,
        })
    }
}

/// Dispatch an API-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Users(args) => users::handle(ctx, args, global).await,
        Command::Subjects(args) => subjects::handle(ctx, args, global).await,
        Command::Tasks(args) => tasks::handle(ctx, args, global).await,
        // Handled in main before a connection is made
        Command::Login(_)
        | Command::Logout
        | Command::Status
        | Command::Token(_)
        | Command::Config(_)
        | Command::Completions(_) => Err(CliError::Internal(
            "command does not use an API connection".into(),
        )),
    }
}
