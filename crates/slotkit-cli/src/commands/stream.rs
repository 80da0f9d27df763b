//! `slotkit stream`: print a chunked response as it arrives

use crate::args::StreamArgs;
use crate::console::CliConsole;
use anyhow::{Context, Result, anyhow};
use slotkit_core::SlotkitConfig;
use slotkit_core::stream::{ChunkFraming, HttpChunkSource, StreamConsumer, StreamOutcome};
use std::sync::Arc;

/// Stream `args.url` until end-of-data, failure or Ctrl-C
pub async fn execute(args: StreamArgs, config: &SlotkitConfig, verbose: bool) -> Result<()> {
    let console = Arc::new(CliConsole::new(verbose));

    let mut settings = config.stream.clone();
    if args.field.is_some() {
        settings.field = args.field;
    }
    if args.lines {
        settings.framing = ChunkFraming::Lines;
    }
    if let Some(method) = args.method {
        settings.method = method;
    }
    settings.headers.extend(args.headers);

    let mut stream_config = settings.stream_config(args.url);
    if let Some(raw) = &args.body {
        let body: serde_json::Value = serde_json::from_str(raw).context("--body is not JSON")?;
        let serde_json::Value::Object(body) = body else {
            return Err(anyhow!("--body must be a JSON object"));
        };
        stream_config.request.body = Some(body);
    }

    let printer = console.clone();
    let stream_config = stream_config.on_chunk(move |piece| printer.stream_text(piece));
    console.info(&format!(
        "{} {}",
        stream_config.request.method, stream_config.request.endpoint
    ));

    let consumer = StreamConsumer::new(HttpChunkSource::new(), stream_config);
    let mut running = consumer.spawn(None);

    let outcome = tokio::select! {
        outcome = &mut running => outcome?,
        _ = tokio::signal::ctrl_c() => {
            consumer.abort();
            running.await?
        }
    };
    println!();

    match outcome {
        StreamOutcome::Completed(text) => {
            console.success(&format!("stream complete: {} chars", text.chars().count()));
            Ok(())
        }
        StreamOutcome::Aborted | StreamOutcome::Superseded => {
            let state = consumer.state();
            console.warn(&format!(
                "stream aborted after {} chars",
                state.accumulated.chars().count()
            ));
            Ok(())
        }
        StreamOutcome::Failed(error) => Err(anyhow!(error).context("stream failed")),
    }
}
