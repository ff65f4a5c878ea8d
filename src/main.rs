use std::sync::Arc;

use veobatch::banner;
use veobatch::client::VideoClient;
use veobatch::config::{AppConfig, GenerationSettings};
use veobatch::models::{JobStatus, compute_statistics};
use veobatch::runner::{ProgressCallback, batch_generate};

#[tokio::main]
async fn main() {
    // Print the startup banner
    banner::print_banner();

    // Load .env file - fine if it doesn't exist, API_KEY may be set directly
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("⚠️  Warning: Could not load .env file: {}", e);
        eprintln!("   Make sure API_KEY is set in your environment");
    }

    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    let Some(path) = std::env::args().nth(1) else {
        eprintln!("Usage: veobatch <prompts-file>");
        eprintln!("       one prompt per line, blank lines skipped");
        std::process::exit(2);
    };

    let prompts: Vec<String> = match std::fs::read_to_string(&path) {
        Ok(text) => text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
        Err(e) => {
            eprintln!("❌ Could not read {}: {}", path, e);
            std::process::exit(1);
        }
    };

    if prompts.is_empty() {
        eprintln!("❌ No prompts found in {}", path);
        std::process::exit(1);
    }

    println!(
        "🎬 Generating {} videos (max {} concurrent)",
        prompts.len(),
        config.max_concurrent_requests
    );

    let client = match VideoClient::new(config) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    let on_progress: ProgressCallback =
        Arc::new(|job| println!("   {} → {}", job.task_id, job.status));

    let results = batch_generate(
        &client,
        &prompts,
        &GenerationSettings::default(),
        Some(on_progress),
    )
    .await;

    println!("\n📋 Results:");
    for result in &results {
        match result.status {
            JobStatus::Completed => println!(
                "✅ {} — {}",
                result.prompt,
                result.video_url.as_deref().unwrap_or("")
            ),
            JobStatus::Failed => println!(
                "❌ {} — {}",
                result.prompt,
                result.error_message.as_deref().unwrap_or("")
            ),
            _ => println!("⏳ {} — still {}", result.prompt, result.status),
        }
    }

    let stats = compute_statistics(&results);
    println!(
        "\n📊 {} total | {} completed | {} failed | {} pending | {:.1}% success | avg {:.1}s",
        stats.total,
        stats.completed,
        stats.failed,
        stats.pending,
        stats.success_rate,
        stats.average_completion_secs
    );
}
