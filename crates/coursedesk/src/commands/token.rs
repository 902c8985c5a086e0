//! Offline id/token conversion.

use coursedesk_core::{decode, encode_str};

use crate::cli::{GlobalOpts, TokenArgs, TokenCommand};
use crate::error::CliError;
use crate::output;

pub fn handle(args: TokenArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let out = match args.command {
        TokenCommand::Encode { id } => encode_str(&id)?.to_string(),
        TokenCommand::Decode { token } => decode(&token)?.to_string(),
    };
    output::print_output(&out, global.quiet);
    Ok(())
}
