use anyhow::Context;

use freightdesk_auth::{Action, Credentials};
use freightdesk_client::{AppState, ClientConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    freightdesk_observability::init();

    let config = ClientConfig::from_env();
    tracing::info!(base_url = %config.base_url, "starting freightdesk client");

    let username = std::env::var("FREIGHTDESK_USERNAME").context("FREIGHTDESK_USERNAME not set")?;
    let password = std::env::var("FREIGHTDESK_PASSWORD").context("FREIGHTDESK_PASSWORD not set")?;

    let app = AppState::new(config).context("failed to build HTTP client")?;

    let claims = app
        .session
        .login(&Credentials::new(username, password))
        .await
        .context("login failed")?;

    let session = app.current();
    let user = session.user().context("signed in, but the current user could not be loaded")?;
    println!("signed in as {} (token expires at {:?})", user.display_name(), claims.expires_at());

    let permissions = session.permissions();
    for view in permissions.readable_views() {
        println!("  can read: {view}");
    }

    if session.check_access("cargo", Action::Read) {
        let cargo = app.cargo.fetch_all().await.context("failed to load cargo")?;
        println!("{} cargo record(s)", cargo.len());
    }

    app.session.logout();
    Ok(())
}
