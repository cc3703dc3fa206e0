//! Sweep command

use crate::console::CliConsole;
use interlude_core::config::parse_duration;
use interlude_core::error::InterludeResult;
use interlude_core::{
    CallbackService, ContinuationRegistry, ExpirySweeper, InterludeConfig, TracingReporter,
};
use std::sync::Arc;

/// Run a single expiry pass over the snapshot and save the result
pub async fn execute(
    mut config: InterludeConfig,
    retention: Option<&str>,
    console: CliConsole,
) -> InterludeResult<()> {
    if let Some(retention) = retention {
        config.sweep.retention = parse_duration("--retention", retention)?;
    }
    let sweep = config.sweep.clone();

    let service =
        CallbackService::open(config, ContinuationRegistry::new(), Arc::new(TracingReporter)).await;
    let removed = ExpirySweeper::new(service.store().clone(), sweep).sweep_once();
    let remaining = service.store().len();
    service.shutdown().await?;

    console.success(&format!(
        "Removed {} expired interaction(s), {} remaining",
        removed, remaining
    ));
    Ok(())
}
