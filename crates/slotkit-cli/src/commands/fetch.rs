//! `slotkit fetch`: an HTTP GET driven by an operation controller

use crate::args::FetchArgs;
use crate::console::CliConsole;
use anyhow::{Result, anyhow};
use slotkit_core::{ControllerOptions, OperationController, SlotError, SlotkitConfig};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Outcome of one attempt, reported by the controller handlers
enum Attempt {
    Succeeded,
    Failed(SlotError),
}

/// Run `args.repeat` rounds of GET through one controller
pub async fn execute(args: FetchArgs, config: &SlotkitConfig, verbose: bool) -> Result<()> {
    let console = CliConsole::new(verbose);
    let client = reqwest::Client::new();
    let invocations = Arc::new(AtomicU32::new(0));
    let (events, mut attempts) = mpsc::unbounded_channel();
    let failed = events.clone();

    let options = ControllerOptions::new()
        .with_store(config.cache.build_store())
        .with_cache(config.cache.policy(args.url.clone()))
        .with_retry(config.retry.clone())
        .on_success(move |_: &String| {
            let _ = events.send(Attempt::Succeeded);
        })
        .on_error(move |error| {
            let _ = failed.send(Attempt::Failed(error.clone()));
        });

    let counted = invocations.clone();
    let controller = OperationController::with_options(
        move |url: String| {
            let client = client.clone();
            counted.fetch_add(1, Ordering::SeqCst);
            async move {
                let response = client.get(&url).send().await?.error_for_status()?;
                Ok::<_, SlotError>(response.text().await?)
            }
        },
        options,
    );

    let max_attempts = config.retry.max_attempts;
    for round in 1..=args.repeat.max(1) {
        while attempts.try_recv().is_ok() {}
        let before = invocations.load(Ordering::SeqCst);
        let started = Instant::now();

        let body = match controller.execute(args.url.clone()).await {
            Ok(body) => body,
            Err(error) if max_attempts == 0 => return Err(anyhow!(error)),
            Err(error) => {
                console.warn(&format!("attempt failed: {}", error));
                await_retries(&controller, &mut attempts, max_attempts, &console).await?
            }
        };

        let source = if invocations.load(Ordering::SeqCst) == before {
            "cache"
        } else {
            "network"
        };
        console.success(&format!(
            "round {}: {} bytes from {} in {:?}",
            round,
            body.len(),
            source,
            started.elapsed()
        ));

        if args.body && round == args.repeat.max(1) {
            println!("{}", body);
        }
        if let Some(interval) = args.interval {
            if round < args.repeat {
                tokio::time::sleep(interval).await;
            }
        }
    }

    Ok(())
}

/// Follow scheduled retries until one succeeds or the budget runs out
async fn await_retries(
    controller: &OperationController<String, String>,
    attempts: &mut mpsc::UnboundedReceiver<Attempt>,
    max_attempts: u32,
    console: &CliConsole,
) -> Result<String> {
    let mut failures = 0;
    while let Some(attempt) = attempts.recv().await {
        match attempt {
            Attempt::Succeeded => {
                return controller
                    .state()
                    .data
                    .ok_or_else(|| anyhow!("retry succeeded without data"));
            }
            Attempt::Failed(error) => {
                failures += 1;
                if failures > max_attempts {
                    return Err(anyhow!(error).context(format!(
                        "giving up after {} retries",
                        max_attempts
                    )));
                }
                if failures > 1 {
                    console.warn(&format!("retry {} failed: {}", failures - 1, error));
                }
                console.info(&format!(
                    "retrying ({}/{})",
                    controller.retry_count(),
                    max_attempts
                ));
            }
        }
    }
    Err(anyhow!("controller closed before settling"))
}
