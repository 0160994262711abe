use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use media_annotator::export::{save_plain_text, save_subtitles};
use media_annotator::{
    AnalysisMode, AnalysisOutcome, AnnotationSession, Config, GeminiAnnotator, MediaUploader,
    PlainTextMode,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("media_annotator=info,warn")
        .init();

    let matches = Command::new("Media Annotator")
        .version("0.1.0")
        .about("Timecode-synchronized media annotation via a generative model")
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .value_name("FILE")
                .help("Video or audio file to analyze")
                .required(true),
        )
        .arg(
            Arg::new("mode")
                .short('m')
                .long("mode")
                .value_name("MODE")
                .help("Analysis mode: captions, key-moments, objects, chart, summary")
                .default_value("captions"),
        )
        .arg(
            Arg::new("prompt")
                .short('p')
                .long("prompt")
                .value_name("TEXT")
                .help("Custom analysis prompt (overrides --mode)"),
        )
        .arg(
            Arg::new("duration")
                .long("duration")
                .value_name("TIMECODE")
                .help("Media duration for the final subtitle block (e.g. 12:34); defaults to the last record's time"),
        )
        .arg(
            Arg::new("output-dir")
                .short('o')
                .long("output-dir")
                .value_name("DIR")
                .help("Output directory for exports"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    if matches.get_flag("verbose") {
        info!("Verbose logging enabled");
    }

    let input = PathBuf::from(matches.get_one::<String>("input").unwrap());
    let mode = match matches.get_one::<String>("prompt") {
        Some(prompt) => AnalysisMode::Custom(prompt.clone()),
        None => matches
            .get_one::<String>("mode")
            .unwrap()
            .parse::<AnalysisMode>()
            .map_err(|e| anyhow::anyhow!(e))?,
    };

    // Load configuration
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => Config::load_from(&PathBuf::from(path))?,
        None => Config::load().unwrap_or_else(|e| {
            warn!("No config loaded, using defaults: {}", e);
            Config::default()
        }),
    };
    if let Some(dir) = matches.get_one::<String>("output-dir") {
        config.export.output_dir = PathBuf::from(dir);
    }

    if !input.exists() {
        return Err(anyhow::anyhow!("input file not found: {}", input.display()));
    }

    info!("🎬 Media Annotator starting...");
    info!("📁 Input: {}", input.display());
    info!("🔤 Mode: {}", mode);

    // Upload and wait for the transcode service to finish processing
    let uploader = MediaUploader::new(config.upload.clone())?;
    let media = uploader.upload(&input).await?;

    // Run the analysis
    let annotator = GeminiAnnotator::new(config.annotator.clone())?;
    let session = AnnotationSession::with_config(Arc::new(annotator), &config.annotator);

    let outcome = session
        .analyze(&media, &mode)
        .await?
        .ok_or_else(|| anyhow::anyhow!("analysis request was superseded"))?;

    tokio::fs::create_dir_all(&config.export.output_dir).await?;
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("analysis");

    match outcome {
        AnalysisOutcome::Records(records) => {
            info!("📋 {} records returned", records.len());
            for record in &records {
                println!("{:>10}  {}", record.time.to_string(), record.caption());
            }

            let records_path = config.export.output_dir.join(format!("{}.json", stem));
            tokio::fs::write(&records_path, serde_json::to_string_pretty(&records)?).await?;
            info!("💾 Wrote records to {}", records_path.display());

            if config.export.write_subtitles {
                let total_duration = matches
                    .get_one::<String>("duration")
                    .map(|d| media_annotator::parse_timecode_str(d))
                    .or_else(|| records.last().map(|r| r.seconds))
                    .unwrap_or(0.0);
                let srt_path = config.export.output_dir.join(format!("{}.srt", stem));
                save_subtitles(&records, total_duration, &srt_path).await?;
            }

            if config.export.write_transcript {
                let text_mode = if config.export.transcript_timestamps {
                    PlainTextMode::WithTimestamps
                } else {
                    PlainTextMode::TextOnly
                };
                let txt_path = config.export.output_dir.join(format!("{}.txt", stem));
                save_plain_text(&records, text_mode, &txt_path).await?;
            }
        }
        AnalysisOutcome::Text(text) => {
            println!("{}", text);
            let txt_path = config.export.output_dir.join(format!("{}.txt", stem));
            tokio::fs::write(&txt_path, text).await?;
            info!("💾 Wrote analysis text to {}", txt_path.display());
        }
    }

    info!("🎉 Analysis complete");
    Ok(())
}
