//! Video generation example with Ctrl-C cancellation.
//!
//! Run with: `cargo run --example generate_video`
//!
//! Requires `GEMINI_API_KEY` environment variable.

use khayal::{BlobRegistry, CancellationToken, GeminiBackend, PollPolicy};

#[tokio::main]
async fn main() -> khayal::Result<()> {
    let backend = GeminiBackend::builder().build()?;
    let blobs = BlobRegistry::new();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        trigger.cancel();
    });

    println!("Generating video (this may take a few minutes)...");
    let video = khayal::generate_video(
        &backend,
        &blobs,
        "أمواج المحيط تتكسر على شاطئ صخري عند الغروب",
        &PollPolicy::from_env(),
        &cancel,
    )
    .await?;

    video.save("output.mp4")?;
    println!(
        "Generated video: {} bytes at {} after {} status checks",
        video.size,
        video.url(),
        video.metadata.poll_attempts
    );

    Ok(())
}
