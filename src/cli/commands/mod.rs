//! CLI command implementations
//!
//! Each command follows the same pattern: a dedicated clap Args struct and
//! a Command struct that executes it against an authenticated session.

pub mod audit;
pub mod history;
pub mod positions;

use anyhow::{Context, Result};

use crate::cli::Globals;
use crate::tradier::TradierClient;

/// An authenticated client bound to one account.
pub(crate) struct Session {
    pub client: TradierClient,
    pub account_id: String,
}

/// Resolve credentials and the target account number.
pub(crate) async fn connect(globals: &Globals) -> Result<Session> {
    let token = crate::auth::resolve_token(globals.token.as_deref())?;
    let client = TradierClient::new(token, globals.sandbox);
    let account_id = match &globals.account {
        Some(id) => id.clone(),
        None => client
            .account_id()
            .await
            .context("Failed to resolve account number from profile")?,
    };
    Ok(Session { client, account_id })
}
