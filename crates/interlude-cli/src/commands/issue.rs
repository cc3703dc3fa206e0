//! Issue command

use super::parse_option;
use interlude_core::error::InterludeResult;
use interlude_core::{
    CallbackService, ChoiceKeyboard, ContinuationRegistry, InterludeConfig, NewSession,
    ResumeAction, TracingReporter,
};
use serde_json::json;
use std::sync::Arc;

/// Create an interaction in the snapshot and print its token and keyboard
pub async fn execute(
    config: InterludeConfig,
    raw_options: &[String],
    kind: &str,
    columns: usize,
) -> InterludeResult<()> {
    let options: Vec<_> = raw_options.iter().map(|o| parse_option(o)).collect();

    let service =
        CallbackService::open(config, ContinuationRegistry::new(), Arc::new(TracingReporter)).await;
    let token = service.create(
        NewSession::new(options.clone(), ResumeAction::new(kind))
            .with_metadata(json!({ "issued_by": "interlude-cli" })),
    )?;
    let keyboard = ChoiceKeyboard::with_columns(&token, &options, columns);
    service.shutdown().await?;

    let output = json!({
        "token": token,
        "keyboard": keyboard,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
