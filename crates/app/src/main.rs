use anyhow::Context;

use loandesk_app::seed::demo_desk;
use loandesk_app::{DeskConfig, RequestContext};
use loandesk_auth::Role;
use loandesk_core::SystemClock;

fn main() -> anyhow::Result<()> {
    let config = DeskConfig::from_env().context("loading LOANDESK_* configuration")?;
    loandesk_observability::init(config.log_format);

    let desk = demo_desk(config, SystemClock).context("seeding demo desk")?;
    tracing::info!(desk = ?desk, "demo desk ready");

    let viewer = RequestContext::for_role("Consola", Role::Admin);
    let snapshot = desk.snapshot(&viewer)?;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}
