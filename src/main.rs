use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use instafeed::config::Config;
use instafeed::instagram::{AccessToken, AuthCallback, InstagramClient, InstagramError};
use std::path::PathBuf;

/// Get the default config file path (~/.config/instafeed/config.toml)
fn default_config_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("instafeed")
        .join("config.toml"))
}

#[derive(Parser, Debug)]
#[command(name = "instafeed", about = "Instagram OAuth and media feed client")]
struct Args {
    /// Config file (defaults to ~/.config/instafeed/config.toml)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the authorization URL for a CSRF state token
    AuthUrl {
        #[arg(long)]
        state: String,
    },
    /// Exchange an authorization code (or full callback query) for a long-lived token
    Token {
        /// Authorization code from the callback
        #[arg(long, conflicts_with = "callback")]
        code: Option<String>,
        /// Raw callback query string, verified against --state
        #[arg(long, requires = "state")]
        callback: Option<String>,
        #[arg(long)]
        state: Option<String>,
    },
    /// Refresh a long-lived token
    Refresh(TokenArgs),
    /// Show the account behind a token
    User(TokenArgs),
    /// Fetch media as JSON, newest first
    Media {
        #[command(flatten)]
        token: TokenArgs,
        /// Maximum number of entries (unbounded when omitted)
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[derive(clap::Args, Debug)]
struct TokenArgs {
    /// Access token (or INSTAGRAM_ACCESS_TOKEN)
    #[arg(long)]
    token: Option<String>,
    /// Instagram user id (or INSTAGRAM_USER_ID)
    #[arg(long)]
    user_id: Option<String>,
}

impl TokenArgs {
    fn resolve(&self) -> Result<AccessToken> {
        let access_code = match &self.token {
            Some(t) => t.clone(),
            None => std::env::var("INSTAGRAM_ACCESS_TOKEN")
                .context("No access token: pass --token or set INSTAGRAM_ACCESS_TOKEN")?,
        };
        let user_id = match &self.user_id {
            Some(id) => id.clone(),
            None => std::env::var("INSTAGRAM_USER_ID")
                .context("No user id: pass --user-id or set INSTAGRAM_USER_ID")?,
        };
        Ok(AccessToken::new(access_code, user_id)?)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing for debug logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_path = match args.config {
        Some(path) => path,
        None => default_config_path()?,
    };
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?
        .apply_env();

    let client = InstagramClient::new(&config, reqwest::Client::new());

    match args.command {
        Command::AuthUrl { state } => {
            println!("{}", client.auth_url(&state));
        }
        Command::Token {
            code,
            callback,
            state,
        } => {
            let code = match (code, callback, state) {
                (Some(code), _, _) => code,
                (None, Some(query), Some(state)) => AuthCallback::from_query(&query)
                    .code_for_state(&state)?
                    .to_string(),
                _ => anyhow::bail!("Pass --code, or --callback together with --state"),
            };
            let short = client
                .request_token(&code)
                .await
                .context("Authorization code exchange failed")?;
            let long = client
                .exchange_token(&short)
                .await
                .context("Long-lived token exchange failed")?;
            let expires_in = long.expires_in;
            let token = long.into_access_token(&short.user_id)?;
            println!("user_id={}", token.user_id());
            println!("access_token={}", token.access_code());
            if let Some(secs) = expires_in {
                println!("expires_in={}", secs);
            }
        }
        Command::Refresh(token_args) => {
            let token = token_args.resolve()?;
            let refreshed = client
                .refresh_token(&token)
                .await
                .context("Token refresh failed")?;
            println!("access_token={}", refreshed.access_token);
            if let Some(secs) = refreshed.expires_in {
                println!("expires_in={}", secs);
            }
        }
        Command::User(token_args) => {
            let token = token_args.resolve()?;
            let user = client
                .fetch_user_details(&token)
                .await
                .context("Failed to fetch user details")?;
            println!("{}", serde_json::to_string_pretty(&user)?);
        }
        Command::Media { token, limit } => {
            let token = token.resolve()?;
            let media = report_bad_token(client.fetch_media(&token, limit).await)?;
            println!("{}", serde_json::to_string_pretty(&media)?);
        }
    }

    Ok(())
}

/// Turns a rejected token from the media listing into an actionable message.
fn report_bad_token<T>(result: Result<T, InstagramError>) -> Result<T> {
    match result {
        Err(InstagramError::BadToken) => {
            anyhow::bail!("The access token is invalid or revoked; run `instafeed auth-url` to re-authenticate")
        }
        other => Ok(other?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use instafeed::instagram::TransportError;

    #[test]
    fn test_bad_token_becomes_reauth_hint() {
        let err = report_bad_token::<()>(Err(InstagramError::BadToken)).unwrap_err();
        assert!(err.to_string().contains("instafeed auth-url"));
    }

    #[test]
    fn test_other_errors_pass_through() {
        let err = report_bad_token::<()>(Err(InstagramError::Transport(TransportError::Timeout)))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<InstagramError>(),
            Some(InstagramError::Transport(TransportError::Timeout))
        ));

        assert_eq!(report_bad_token(Ok(7)).unwrap(), 7);
    }
}
