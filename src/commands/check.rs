// ABOUTME: Check command implementation.
// ABOUTME: Validates configuration and lists deploy targets without executing.

use slipway::config::PipelineConfig;
use slipway::error::Result;
use slipway::output::Output;
use std::env;

/// Validate the discovered configuration and describe every target.
pub fn check(output: Output) -> Result<()> {
    let cwd = env::current_dir()?;
    let config = PipelineConfig::discover(&cwd)?;

    let names = config.target_names();
    for name in &names {
        let plan = config.for_target(name)?;
        output.progress(&format!(
            "  {} → deployment {} ({} secrets, {} push destinations)",
            name,
            plan.deployment,
            plan.secrets.len(),
            1 + plan.extra_tags.len()
        ));
    }

    if config.vault.token.resolve().is_err() {
        output.warning("Vault token is not resolvable in this environment");
    }
    if let Some(notify) = &config.notify {
        if notify.webhook.resolve().is_err() {
            output.warning("Notification webhook is not resolvable in this environment");
        }
    }

    output.success(&format!("Configuration valid: {} target(s)", names.len()));
    Ok(())
}
