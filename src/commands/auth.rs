use anyhow::Result;
use daycount_provider_google::{AuthContext, GoogleAuthorizer, SessionStore};
use owo_colors::OwoColorize;

pub async fn run(logout: bool) -> Result<()> {
    let store = SessionStore::default_location()?;

    if logout {
        return run_logout(store).await;
    }

    println!("Authenticating with Google...");

    let mut auth = AuthContext::new(store.clone(), GoogleAuthorizer::from_app_config()?);
    let session = auth.acquire().await?;

    let expiry = match session.expires_at {
        Some(at) => format!("valid until {}", at.format("%Y-%m-%d %H:%M UTC")),
        None => "no expiry reported".to_string(),
    };

    println!("{}", "Authenticated with Google.".green());
    println!("  Session: {} ({})", store.path().display(), expiry);

    Ok(())
}

async fn run_logout(store: SessionStore) -> Result<()> {
    let removed = match GoogleAuthorizer::from_app_config() {
        Ok(authorizer) => AuthContext::new(store, authorizer).teardown().await?,
        Err(err) => {
            // Without credentials we can still forget the local session
            tracing::warn!("Skipping token revocation: {:#}", err);
            store.delete()?
        }
    };

    if removed {
        println!("{}", "Signed out of Google.".green());
    } else {
        println!("No Google session stored.");
    }

    Ok(())
}
