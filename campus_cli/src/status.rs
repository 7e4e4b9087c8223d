use campus_pagination::{
    api_client::ApiClient,
    config::{ClientConfig, LoaderConfig},
    session::{EnvSession, SessionAccessor, USER_ID_ENV_VAR},
    status_dispatcher::StatusDispatcher,
};
use clap::Args;
use tracing::{error, info};

use crate::scope::ScopeArgs;

#[derive(Args)]
pub struct StatusArgs {
    #[command(flatten)]
    scope: ScopeArgs,

    /// Ids of the entities to update
    #[arg(required = true)]
    ids: Vec<String>,

    /// Set isActive to true (default) or false
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    active: bool,
}

pub async fn run(args: StatusArgs) -> anyhow::Result<()> {
    let session = EnvSession::default();
    if session.current_user_id().is_none() {
        anyhow::bail!("Set {} to the id of the user making the change", USER_ID_ENV_VAR);
    }

    let client = ApiClient::new(ClientConfig::from_env()?)?;
    let pacing = LoaderConfig::from_env()?.pacing;
    let dispatcher = StatusDispatcher::new(client, session, pacing);

    let scope = args.scope.into_scope();
    let report = dispatcher
        .set_status_bulk(&scope, &args.ids, args.active)
        .await?;

    for (id, err) in &report.failed {
        error!("{} {}: {}", scope.collection, id, err.user_message());
    }

    if !report.is_complete() {
        anyhow::bail!(
            "{} of {} status updates failed",
            report.failed.len(),
            args.ids.len()
        );
    }

    info!("Updated {} {}", report.updated.len(), scope.collection);
    Ok(())
}
