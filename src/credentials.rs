//! Access token providers.
//!
//! A store asks its [`CredentialProvider`] for a token once, when it is
//! built. Transfer logic never prompts or reads the environment itself, so
//! the same code runs interactively, from CI, or against the in-memory store.

use std::io::{self, Write};

use crate::error::{Result, TransferError};

/// Environment variable read by [`EnvToken::default`].
pub const DEFAULT_TOKEN_ENV: &str = "DROPBOX_TOKEN";

/// Source of an OAuth2 access token.
pub trait CredentialProvider {
    /// Obtain an access token.
    fn access_token(&self) -> Result<String>;
}

/// A token known up front.
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl std::fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StaticToken(..)")
    }
}

impl CredentialProvider for StaticToken {
    fn access_token(&self) -> Result<String> {
        validate_token(&self.0)
    }
}

/// A token read from an environment variable.
#[derive(Debug, Clone)]
pub struct EnvToken {
    var: String,
}

impl EnvToken {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    /// Name of the variable this provider reads.
    pub fn var(&self) -> &str {
        &self.var
    }
}

impl Default for EnvToken {
    fn default() -> Self {
        Self::new(DEFAULT_TOKEN_ENV)
    }
}

impl CredentialProvider for EnvToken {
    fn access_token(&self) -> Result<String> {
        let token = std::env::var(&self.var).map_err(|_| {
            TransferError::Credentials(format!("environment variable {} is not set", self.var))
        })?;
        validate_token(&token)
    }
}

/// Prompts on the terminal without echoing the input.
#[derive(Debug, Clone)]
pub struct PromptToken {
    prompt: String,
}

impl PromptToken {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }
}

impl Default for PromptToken {
    fn default() -> Self {
        Self::new("Please enter OAuth token: ")
    }
}

impl CredentialProvider for PromptToken {
    fn access_token(&self) -> Result<String> {
        eprint!("{}", self.prompt);
        io::stderr().flush().ok();

        let token = rpassword::read_password()?;
        validate_token(&token)
    }
}

/// Tries each provider in order and returns the first token obtained.
pub struct ChainProvider {
    providers: Vec<Box<dyn CredentialProvider + Send + Sync>>,
}

impl ChainProvider {
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Append a provider to the chain.
    pub fn with(mut self, provider: impl CredentialProvider + Send + Sync + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }
}

impl Default for ChainProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialProvider for ChainProvider {
    fn access_token(&self) -> Result<String> {
        let mut last_error = None;
        for provider in &self.providers {
            match provider.access_token() {
                Ok(token) => return Ok(token),
                Err(e) => {
                    tracing::debug!(error = %e, "credential provider failed, trying next");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error
            .unwrap_or_else(|| TransferError::Credentials("no credential providers".to_string())))
    }
}

fn validate_token(token: &str) -> Result<String> {
    let token = token.trim();
    if token.is_empty() {
        return Err(TransferError::Credentials("access token is empty".to_string()));
    }
    if token.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(TransferError::Credentials(
            "access token contains whitespace".to_string(),
        ));
    }
    Ok(token.to_string())
}
