//! First-run credential bootstrap.

use sheetmail_batch::BatchError;
use sheetmail_sheets::{AccessToken, CredentialProvider, OAuthCredentialProvider};

use crate::prompts::{PromptSource, PromptStep};

/// Outcome of preparing credentials.
pub enum Authorization {
    /// A stored token is usable; the run can go ahead.
    Ready(AccessToken),
    /// A token was just stored. The operator re-runs to generate output.
    Bootstrapped,
}

/// Authorize with the stored token, or walk the operator through the
/// installed-app consent flow when none is stored yet.
pub fn authorize(
    provider: &OAuthCredentialProvider,
    prompts: &mut dyn PromptSource,
) -> anyhow::Result<Authorization> {
    if provider.has_token() {
        let token = provider.authorize().map_err(BatchError::Authorization)?;
        return Ok(Authorization::Ready(token));
    }

    let url = provider
        .authorization_url()
        .map_err(BatchError::Authorization)?;
    println!("Authorize this app by visiting this url: {url}");
    let code = prompts.ask(PromptStep::AuthCode)?;
    provider
        .exchange_code(&code)
        .map_err(BatchError::Authorization)?;
    tracing::debug!(path = %provider.token_path().display(), "token bootstrap complete");
    println!("Token successfully stored.");
    println!("Ready to use!");
    Ok(Authorization::Bootstrapped)
}
