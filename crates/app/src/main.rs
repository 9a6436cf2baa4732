use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;

use murmur_app::session::{SessionConfig, SessionController, TranscriberFactory, TranscriptCallback};
use murmur_app::shutdown::wait_for_shutdown;

#[derive(Parser, Debug)]
#[command(name = "murmur", about = "Real-time microphone speech-to-text")]
struct Args {
    /// Path to the Vosk model directory
    #[arg(long, default_value = "vosk-model-small-en-us-0.15")]
    model: String,

    /// Audio sample rate in Hz
    #[arg(long, default_value_t = 16_000)]
    sample_rate: u32,

    /// Input device name (host default if omitted)
    #[arg(long)]
    device: Option<String>,

    /// Samples per frame fed to the recognizer
    #[arg(long, default_value_t = 8_000)]
    frame_size: usize,

    /// Frame queue capacity; oldest frames are dropped beyond this
    #[arg(long, default_value_t = 64)]
    queue_capacity: usize,

    /// Print partial hypotheses as well as final transcripts
    #[arg(long)]
    partials: bool,
}

fn init_logging() {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(log_level)
        .init();
}

#[cfg(feature = "vosk")]
fn transcriber_factory() -> TranscriberFactory {
    use murmur_stt::{Transcriber, TranscriptionConfig};
    use murmur_stt_vosk::VoskTranscriber;

    Box::new(|config: &SessionConfig| {
        let tc = TranscriptionConfig {
            model_path: config.model_path.clone(),
            partial_results: config.emit_partials,
            ..Default::default()
        };
        let transcriber = VoskTranscriber::new(tc, config.sample_rate as f32)?;
        Ok(Box::new(transcriber) as Box<dyn Transcriber + Send>)
    })
}

#[cfg(not(feature = "vosk"))]
fn transcriber_factory() -> TranscriberFactory {
    use murmur_foundation::SttError;
    Box::new(|_: &SessionConfig| {
        Err(SttError::ModelLoad(
            "murmur was built without the `vosk` feature; rebuild with --features vosk".to_string(),
        ))
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let args = Args::parse();

    let config = SessionConfig {
        model_path: args.model,
        sample_rate: args.sample_rate,
        device: args.device,
        frame_size: args.frame_size,
        queue_capacity: args.queue_capacity,
        emit_partials: args.partials,
        channels: 1,
        join_timeout: Duration::from_secs(2),
    };

    let callback: TranscriptCallback = Arc::new(|text: &str| {
        if !text.trim().is_empty() {
            println!("{}", text);
        }
    });

    let mut session = SessionController::new(config, transcriber_factory(), callback);
    session
        .start()
        .context("failed to start transcription session")?;
    tracing::info!("Listening; press Ctrl-C to stop");

    wait_for_shutdown().await;

    session.stop().context("failed to stop session cleanly")?;

    let stats = session.stats();
    tracing::info!(
        "Session summary - frames: {}, finals: {}, partials: {}, decode errors: {}, dropped: {}",
        stats.stt.frames_in,
        stats.stt.final_count,
        stats.stt.partial_count,
        stats.stt.error_count,
        stats.frames_dropped
    );

    Ok(())
}
