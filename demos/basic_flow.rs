//! Start an interaction, show its buttons, deliver a press, restart.
//!
//! Run with `cargo run --example basic_flow`.

use interlude::{
    CallbackService, ChoiceKeyboard, ChoiceOption, ContinuationRegistry, InboundEvent,
    InterludeConfig, NewSession, ResumeAction, from_fn,
};
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let dir = tempfile::tempdir()?;
    let config = InterludeConfig {
        snapshot_path: dir.path().join("callback_data.json"),
        ..InterludeConfig::default()
    };

    let registry = || {
        ContinuationRegistry::new().with_handler(
            "deploy",
            from_fn(|session| {
                let choice = session
                    .selected_option()
                    .ok_or_else(|| anyhow::anyhow!("resolved without a selection"))?;
                let target = session.resume.payload["target"].as_str().unwrap_or("?");
                println!("deploy to {}: {}", target, choice.value);
                Ok(())
            }),
        )
    };

    let service = CallbackService::start(config.clone(), registry()).await;
    let options = vec![
        ChoiceOption::with_value("Ship it", "go"),
        ChoiceOption::with_value("Hold", "hold"),
    ];
    let token = service.create(NewSession::new(
        options.clone(),
        ResumeAction::new("deploy").with_payload(serde_json::json!({"target": "staging"})),
    ))?;

    let keyboard = ChoiceKeyboard::one_per_row(&token, &options);
    println!("{}", serde_json::to_string_pretty(&keyboard)?);
    service.shutdown().await?;

    // A fresh process picks the pending interaction back up
    let service = CallbackService::start(config, registry()).await;
    let press = &keyboard.rows[0][0].callback_data;
    if let Some(worker) = service.on_external_event(InboundEvent::new(press.clone())) {
        println!("outcome: {:?}", worker.await?);
    }

    // Give the continuation a moment before shutting down
    tokio::time::sleep(Duration::from_millis(50)).await;
    service.shutdown().await?;
    Ok(())
}
