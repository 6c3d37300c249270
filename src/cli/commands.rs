//! CLI commands implementation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::anyhow;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::Settings;
use crate::export::{self, ExportFormat, SheetsPublisher};
use crate::ingest::{self, InputKind, TopicInput};
use crate::llm::LlmClient;
use crate::pipeline::progress::{self, ProgressEvent};
use crate::pipeline::{BatchScheduler, CancelToken, RunStatus};

/// Start the web server.
pub async fn cmd_serve(settings: &Settings, bind: &str) -> anyhow::Result<()> {
    let (host, port) = parse_bind_address(bind)?;

    println!(
        "{} Starting contentmill server at http://{}:{}",
        style("→").cyan(),
        host,
        port
    );
    println!("  Press Ctrl+C to stop");

    crate::server::serve(settings, &host, port).await
}

/// Run the generation pipeline locally and write the export to disk.
pub async fn cmd_generate(
    settings: &Settings,
    input: &Path,
    format: &str,
    output: Option<&Path>,
    batch_size: Option<usize>,
) -> anyhow::Result<()> {
    let format = ExportFormat::parse(format)
        .ok_or_else(|| anyhow!("unsupported export format: {}", format))?;

    let filename = input
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("input");
    let kind = InputKind::detect(filename, None)
        .ok_or_else(|| anyhow!("cannot tell input type from filename: {}", filename))?;
    let data = std::fs::read(input)?;
    let topics = ingest::parse_topics(TopicInput::RawBytes { data, kind })?;
    println!(
        "{} Loaded {} topics from {}",
        style("→").cyan(),
        topics.len(),
        input.display()
    );

    let client = LlmClient::new(settings.llm.clone())?;
    if !client.is_available().await {
        println!(
            "  {} LLM backend at {} is not responding; generation will degrade to placeholders",
            style("!").yellow(),
            settings.llm.endpoint
        );
    }

    let mut config = settings.pipeline.clone();
    if let Some(batch_size) = batch_size {
        config.batch_size = batch_size;
    }
    let scheduler = BatchScheduler::new(Arc::new(client), config);

    let bar = ProgressBar::new(topics.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let (event_tx, mut event_rx) = progress::channel();
    let printer = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match event {
                ProgressEvent::Processing { topic } => bar.set_message(topic),
                ProgressEvent::Completed { .. } => bar.inc(1),
                _ => {}
            }
        }
        bar.finish_and_clear();
    });

    // Ctrl+C cancels cooperatively: the current topic finishes, the rest
    // never start.
    let cancel = CancelToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_cancel.cancel();
        }
    });

    let outcome = scheduler.run(&topics, &event_tx, &cancel).await;
    drop(event_tx);
    printer.await?;

    if outcome.status == RunStatus::Cancelled {
        println!(
            "{} Cancelled after {} of {} posts",
            style("✗").red(),
            outcome.posts.len(),
            topics.len()
        );
    }

    match format {
        ExportFormat::GoogleSheets => {
            let publisher = SheetsPublisher::new(settings.export.sheets_webhook.clone());
            let url = publisher.publish(&outcome.posts).await?;
            println!("{} Published {} posts: {}", style("✓").green(), outcome.posts.len(), url);
        }
        _ => {
            let file = export::export_posts(&outcome.posts, format)?;
            let path = output
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(&file.filename));
            std::fs::write(&path, &file.bytes)?;
            println!(
                "{} Wrote {} posts to {}",
                style("✓").green(),
                outcome.posts.len(),
                path.display()
            );
        }
    }
    Ok(())
}

/// Write the example topic spreadsheet.
pub fn cmd_sample(output: &Path) -> anyhow::Result<()> {
    let bytes = export::sample_workbook()?;
    std::fs::write(output, bytes)?;
    println!("{} Wrote {}", style("✓").green(), output.display());
    Ok(())
}

/// Parse a bind address that can be:
/// - Just a port: "3030" -> 127.0.0.1:3030
/// - Just a host: "0.0.0.0" -> 0.0.0.0:3030
/// - Host and port: "0.0.0.0:3030" -> 0.0.0.0:3030
fn parse_bind_address(bind: &str) -> anyhow::Result<(String, u16)> {
    if let Ok(port) = bind.parse::<u16>() {
        return Ok(("127.0.0.1".to_string(), port));
    }

    if let Some((host, port_str)) = bind.rsplit_once(':') {
        if let Ok(port) = port_str.parse::<u16>() {
            return Ok((host.to_string(), port));
        }
    }

    Ok((bind.to_string(), 3030))
}
