use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use streamvault::{Config, Quality, Resolution, ResolutionRequest, Resolver, classify, embed_url};

#[derive(Parser)]
#[command(
    name = "streamvault",
    about = "Resolve a media page URL into a playable stream",
    long_about = "Resolve an arbitrary media page URL into a playable stream or an\n\
    embeddable preview, walking public extraction services and CORS relays\n\
    until one succeeds.\n\n\
    Examples:\n\
      streamvault https://vimeo.com/76979871               # Resolve at 720p\n\
      streamvault -q 1080 https://youtu.be/dQw4w9WgXcQ     # Prefer 1080p\n\
      streamvault --json https://x.com/user/status/123     # Machine-readable\n\
      streamvault --no-ytdlp https://example.com/page      # Skip the hosted tool"
)]
struct Args {
    /// URL to resolve
    url: String,

    /// Desired quality (1080, 720, 480, 360)
    #[arg(short = 'q', long = "quality", default_value = "720")]
    quality: String,

    /// Print the outcome as JSON
    #[arg(long = "json")]
    json: bool,

    /// Disable the secondary relay fallback
    #[arg(long = "no-secondary-relay")]
    no_secondary_relay: bool,

    /// Disable the hosted yt-dlp fallback
    #[arg(long = "no-ytdlp")]
    no_ytdlp: bool,

    /// Also fetch and print title/description metadata
    #[arg(long = "describe")]
    describe: bool,
}

fn parse_quality(value: &str) -> Quality {
    match value.trim_end_matches('p') {
        "1080" => Quality::Q1080,
        "720" => Quality::Q720,
        "480" => Quality::Q480,
        "360" => Quality::Q360,
        other => {
            eprintln!("Warning: unsupported quality '{}', using 720p", other);
            Quality::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let quality = parse_quality(&args.quality);

    let mut config = Config::default();
    config.relay.enable_secondary_relay = !args.no_secondary_relay;
    config.ytdlp.enabled = !args.no_ytdlp;

    let reference = classify(&args.url);
    if !args.json {
        eprintln!("Platform: {}", reference.platform.label());
    }

    let resolver = Resolver::new(config);

    if args.describe {
        let meta =
            streamvault::fetch_metadata(resolver.http(), resolver.relay(), &args.url).await;
        if !meta.title.is_empty() {
            eprintln!("Title: {}", meta.title);
        }
        if !meta.description.is_empty() {
            eprintln!("Description: {}", meta.description);
        }
        if let Some(thumbnail) = &meta.thumbnail {
            eprintln!("Thumbnail: {thumbnail}");
        }
    }

    let request = ResolutionRequest::new(&args.url, reference.platform, quality).with_progress(
        Arc::new(|message: &str, detail: &str| {
            if detail.is_empty() {
                eprintln!("· {message}");
            } else {
                eprintln!("· {message} — {detail}");
            }
        }),
    );
    let resolution = resolver.resolve_request(request).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&resolution)?);
        if resolution.is_failure() {
            std::process::exit(1);
        }
        return Ok(());
    }

    match &resolution {
        Resolution::Direct { url, needs_relay } => {
            println!("Stream URL: {url}");
            if *needs_relay {
                println!("(relay-wrapped for playback)");
            }
        }
        Resolution::Picker { items } => {
            println!("Multiple streams found:");
            println!();
            for (index, item) in items.iter().enumerate() {
                println!("[{}] {}", index + 1, item.url);
                if let Some(thumbnail) = &item.thumbnail {
                    println!("    Thumbnail: {thumbnail}");
                }
            }
        }
        Resolution::EmbedOnly => {
            println!("No direct stream for this platform; embed it instead.");
            if let Some(embed) = embed_url(&args.url, reference.platform) {
                println!("Embed URL: {embed}");
            }
        }
        Resolution::Failure => {
            eprintln!("No stream found. Try the embed view or open the original URL:");
            eprintln!("  {}", args.url);
            std::process::exit(1);
        }
    }

    Ok(())
}
