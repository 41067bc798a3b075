// Interactive shell: prompts for a URL, lists the resolved choices, and
// drives one download at a time. All real logic lives in the downloader core.

use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use vidfetch::downloader::tools::ToolManager;
use vidfetch::{
    ChannelSink, DownloadOrchestrator, FfmpegRemuxer, FormatResolver, Severity, YtDlpProvider,
};

fn prompt(line: &str) -> Option<String> {
    print!("{}", line);
    io::stdout().flush().ok()?;
    let mut input = String::new();
    io::stdin().lock().read_line(&mut input).ok()?;
    let trimmed = input.trim().to_string();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

#[tokio::main]
async fn main() {
    for tool in ToolManager::new().get_all_tools() {
        match (&tool.path, &tool.version) {
            (Some(path), Some(version)) => println!("{}: {} ({})", tool.name, version, path),
            (Some(path), None) => println!("{}: found at {}", tool.name, path),
            _ => println!("{}: NOT FOUND - install it before downloading", tool.name),
        }
    }
    println!();

    let provider = Arc::new(YtDlpProvider::new());
    let orchestrator = DownloadOrchestrator::new(provider.clone(), Arc::new(FfmpegRemuxer::new()));
    let cancel = CancellationToken::new();

    loop {
        let url = match prompt("Video URL (empty to quit): ") {
            Some(url) => url,
            None => break,
        };

        let session = match FormatResolver::resolve(provider.as_ref(), &url).await {
            Ok(session) => session,
            Err(e) => {
                println!("Error: {}", e.brief());
                continue;
            }
        };

        println!("\n{}", session.video().title);
        for (i, label) in session.labels().enumerate() {
            println!("  [{}] {}", i + 1, label);
        }

        let index = prompt("Pick a format [1]: ")
            .and_then(|s| s.parse::<usize>().ok())
            .and_then(|n| n.checked_sub(1))
            .unwrap_or(0);
        let label = match session.choices().get(index) {
            Some(choice) => choice.label.clone(),
            None => {
                println!("No such entry");
                continue;
            }
        };

        let (sink, mut rx) = ChannelSink::new();
        let printer = tokio::spawn(async move {
            while let Some(update) = rx.recv().await {
                let marker = match update.severity {
                    Severity::Info => " ",
                    Severity::Warning => "!",
                    Severity::Error => "✗",
                };
                println!(
                    "{} [{:3.0}%] {}",
                    marker,
                    update.fraction * 100.0,
                    update.message
                );
            }
        });

        let result = orchestrator.download(&session, &label, &sink, &cancel).await;
        drop(sink);
        let _ = printer.await;

        match result {
            Ok(path) => println!("Done: {}\n", path.display()),
            Err(e) => println!("Error: {}\n", e.brief()),
        }
    }
}
