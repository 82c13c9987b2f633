//! CLI for Khayal - Arabic-first image and video generation.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use khayal::encode::decode_base64;
use khayal::video::generate_video_with_progress;
use khayal::{
    AspectRatio, CancellationToken, GeminiBackend, GenAiBackend, GenerationMode,
    GenerationRequest, GenerationResult, JobState, PollPolicy, SourceImage, Studio,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "khayal")]
#[command(about = "Generate images and videos from Arabic prompts with Gemini, Imagen and Veo")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an image from a text prompt
    Image(ImageArgs),

    /// Edit an existing image with an instruction
    Edit(EditArgs),

    /// Generate a video from a text prompt
    Video(VideoArgs),

    /// Rewrite a prompt as a detailed English prompt
    Enhance {
        /// The prompt to rewrite
        prompt: String,
    },

    /// Show configuration and optionally check the API key
    Status {
        /// Make a request to verify the key and text model
        #[arg(long)]
        check: bool,
    },
}

#[derive(Args)]
struct ImageArgs {
    /// The text prompt describing the image
    prompt: String,

    /// Output file path
    #[arg(short, long)]
    output: PathBuf,

    /// Aspect ratio: 1:1, 16:9, 9:16, 4:3 or 3:4
    #[arg(short, long, default_value = "1:1")]
    aspect_ratio: AspectRatio,

    /// Send the prompt as-is instead of enhancing it first
    #[arg(long)]
    no_enhance: bool,
}

#[derive(Args)]
struct EditArgs {
    /// What to change in the image
    prompt: String,

    /// Image to edit
    #[arg(short, long)]
    input: PathBuf,

    /// Output file path
    #[arg(short, long)]
    output: PathBuf,
}

#[derive(Args)]
struct VideoArgs {
    /// The text prompt describing the video
    prompt: String,

    /// Output file path
    #[arg(short, long)]
    output: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Ok(path) = dotenvy::dotenv() {
        eprintln!("Loaded .env from {}", path.display());
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "khayal=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let backend = Arc::new(GeminiBackend::builder().build()?);
    let studio = Studio::new(backend.clone()).with_poll_policy(PollPolicy::from_env());

    match cli.command {
        Commands::Image(args) => generate_image(&studio, args, cli.json).await?,
        Commands::Edit(args) => edit_image(&studio, args, cli.json).await?,
        Commands::Video(args) => generate_video(&studio, args, cli.json).await?,
        Commands::Enhance { prompt } => enhance(&*backend, &prompt, cli.json).await?,
        Commands::Status { check } => status(&backend, check, cli.json).await?,
    }

    Ok(())
}

/// Cancels the returned token on Ctrl-C.
fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Cancelling...");
            trigger.cancel();
        }
    });
    cancel
}

/// Writes a `data:` URI payload to disk and returns its size.
fn save_data_uri(result: &GenerationResult, path: &Path) -> anyhow::Result<usize> {
    let bytes = decode_base64(result.uri.as_str())?;
    std::fs::write(path, &bytes).with_context(|| format!("writing {}", path.display()))?;
    Ok(bytes.len())
}

async fn generate_image(studio: &Studio, args: ImageArgs, json_output: bool) -> anyhow::Result<()> {
    let request = GenerationRequest::new(&args.prompt, GenerationMode::Image)
        .with_aspect_ratio(args.aspect_ratio)
        .with_enhance(!args.no_enhance);

    let result = studio.run(&request, &CancellationToken::new()).await?;
    let size = save_data_uri(&result, &args.output)?;

    if json_output {
        let result = serde_json::json!({
            "type": "image",
            "success": true,
            "output": args.output.display().to_string(),
            "size_bytes": size,
            "aspect_ratio": args.aspect_ratio,
            "enhanced_prompt": result.enhanced_prompt,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        if let Some(enhanced) = &result.enhanced_prompt {
            println!("Enhanced prompt: {}", enhanced);
        }
        println!("Generated image: {} ({} bytes)", args.output.display(), size);
    }

    Ok(())
}

async fn edit_image(studio: &Studio, args: EditArgs, json_output: bool) -> anyhow::Result<()> {
    let source = SourceImage::from_path(&args.input)?;
    let request =
        GenerationRequest::new(&args.prompt, GenerationMode::FastImage).with_source_image(source);

    let result = studio.run(&request, &CancellationToken::new()).await?;
    let size = save_data_uri(&result, &args.output)?;

    if json_output {
        let result = serde_json::json!({
            "type": "image",
            "success": true,
            "input": args.input.display().to_string(),
            "output": args.output.display().to_string(),
            "size_bytes": size,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("Edited image: {} ({} bytes)", args.output.display(), size);
    }

    Ok(())
}

async fn generate_video(studio: &Studio, args: VideoArgs, json_output: bool) -> anyhow::Result<()> {
    let request = GenerationRequest::new(&args.prompt, GenerationMode::Video);
    Studio::validate(&request)?;

    let cancel = cancel_on_ctrl_c();
    let video = generate_video_with_progress(
        studio.backend(),
        studio.blobs(),
        &request.prompt,
        studio.poll_policy(),
        &cancel,
        |state| {
            if !json_output {
                match state {
                    JobState::Submitted => eprintln!("Job submitted, waiting for the video..."),
                    JobState::Polling { attempt } => eprintln!("Checking status (#{attempt})"),
                    JobState::Done | JobState::Failed => {}
                }
            }
        },
    )
    .await?;

    video.save(&args.output)?;

    if json_output {
        let result = serde_json::json!({
            "type": "video",
            "success": true,
            "output": args.output.display().to_string(),
            "size_bytes": video.size,
            "mime_type": video.mime_type,
            "model": video.metadata.model,
            "operation": video.metadata.operation,
            "poll_attempts": video.metadata.poll_attempts,
            "duration_ms": video.metadata.duration_ms,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!(
            "Generated video: {} ({} bytes)",
            args.output.display(),
            video.size
        );
        if let Some(duration) = video.metadata.duration_ms {
            println!("Generation time: {}ms", duration);
        }
    }

    Ok(())
}

async fn enhance(backend: &dyn GenAiBackend, prompt: &str, json_output: bool) -> anyhow::Result<()> {
    let request = GenerationRequest::new(prompt, GenerationMode::Image);
    Studio::validate(&request)?;

    let enhanced = khayal::enhance_prompt(backend, prompt).await?;
    if json_output {
        let result = serde_json::json!({
            "prompt": prompt,
            "enhanced_prompt": enhanced,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", enhanced);
    }
    Ok(())
}

async fn status(backend: &GeminiBackend, check: bool, json_output: bool) -> anyhow::Result<()> {
    let models = backend.models();
    let policy = PollPolicy::from_env();

    let health = if check && backend.is_configured() {
        Some(backend.health_check().await.map_err(|e| e.to_string()))
    } else {
        None
    };

    if json_output {
        let result = serde_json::json!({
            "configured": backend.is_configured(),
            "key_env_vars": khayal::API_KEY_ENV_VARS,
            "models": {
                "text": models.text,
                "image": models.image,
                "edit": models.edit,
                "video": models.video,
            },
            "aspect_ratios": AspectRatio::ALL
                .iter()
                .map(|ratio| serde_json::json!({ "ratio": ratio, "label": ratio.label() }))
                .collect::<Vec<_>>(),
            "poll": {
                "interval_secs": policy.interval.as_secs(),
                "timeout_secs": policy.timeout.as_secs(),
                "max_attempts": policy.max_attempts,
            },
            "health": health.as_ref().map(|h| match h {
                Ok(()) => "ok".to_string(),
                Err(e) => e.clone(),
            }),
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if backend.is_configured() {
        println!("API key:  configured");
    } else {
        println!(
            "API key:  missing (set one of {})",
            khayal::API_KEY_ENV_VARS.join(", ")
        );
    }
    println!("Text:     {}", models.text);
    println!("Image:    {}", models.image);
    println!("Edit:     {}", models.edit);
    println!("Video:    {}", models.video);
    println!("Ratios:");
    for ratio in AspectRatio::ALL {
        println!("  {:<5} {}", ratio.as_str(), ratio.label());
    }
    println!(
        "Polling:  every {}s, up to {}s / {} checks",
        policy.interval.as_secs(),
        policy.timeout.as_secs(),
        policy.max_attempts
    );
    match health {
        Some(Ok(())) => println!("Health:   ok"),
        Some(Err(e)) => println!("Health:   {}", e),
        None => {}
    }

    Ok(())
}
