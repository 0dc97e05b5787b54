// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Swizzle CLI - XHR Response Interception
//!
//! Fetches a URL through an intercepted transport and prints what the
//! completion listener observed.

use std::env;
use std::process::ExitCode;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::mpsc;

use swizzle::{
    Deferred, Engine, EngineConfig, EventKind, HttpClient, Listener, OverrideSet, ProgressEvent,
    Transport,
};

/// Options for the `fetch` command
#[derive(Debug, Default)]
struct FetchOptions {
    url: String,
    method: String,
    body: Option<String>,
    overrides: OverrideSet,
    filter: Option<String>,
    delay_ms: u64,
    debug: bool,
}

/// What the caller's listeners saw
#[derive(Debug)]
enum Outcome {
    Loaded {
        status: u16,
        status_text: String,
        url: String,
        content_type: Option<String>,
        body: String,
    },
    Failed(EventKind),
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("swizzle=info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return ExitCode::from(1);
    }

    match args[1].as_str() {
        "fetch" => {
            if args.len() < 3 {
                eprintln!("Usage: swizzle fetch <url> [OPTIONS]");
                return ExitCode::from(1);
            }
            match parse_fetch_args(&args[2..]) {
                Ok(options) => fetch(options).await,
                Err(e) => {
                    eprintln!("{}", e);
                    ExitCode::from(1)
                }
            }
        }
        "--help" | "-h" | "help" => {
            print_usage();
            ExitCode::SUCCESS
        }
        "--version" | "-v" | "version" => {
            println!("swizzle {}", swizzle::VERSION);
            ExitCode::SUCCESS
        }
        cmd => {
            eprintln!("Unknown command: {}", cmd);
            print_usage();
            ExitCode::from(1)
        }
    }
}

fn print_usage() {
    println!(
        r#"Swizzle - XHR Response Interception

USAGE:
    swizzle <COMMAND> [OPTIONS]

COMMANDS:
    fetch <url>     Fetch a URL through an intercepted request
    help            Show this help message
    version         Show version information

FETCH OPTIONS:
    --method <M>          Request method (default GET)
    --body <B>            Request body
    --replace-text <T>    Override responseText
    --status <N>          Override status
    --status-text <T>     Override statusText
    --filter <RE>         Only transform responses whose URL matches RE
    --delay-ms <N>        Settle the transform after N milliseconds
    --debug               Print interception trace records

EXAMPLES:
    swizzle fetch https://example.com
    swizzle fetch https://example.com/api --replace-text '{{"mocked":true}}' --status 299
    swizzle fetch https://example.com/api --replace-text hi --delay-ms 500 --debug
"#
    );
}

fn parse_fetch_args(args: &[String]) -> Result<FetchOptions, String> {
    let mut options = FetchOptions {
        url: args[0].clone(),
        method: "GET".to_string(),
        ..Default::default()
    };

    let mut rest = args[1..].iter();
    while let Some(flag) = rest.next() {
        if flag == "--debug" {
            options.debug = true;
            continue;
        }

        let value = rest
            .next()
            .ok_or_else(|| format!("Missing value for {}", flag))?
            .clone();

        match flag.as_str() {
            "--method" => options.method = value,
            "--body" => options.body = Some(value),
            "--replace-text" => {
                options.overrides = std::mem::take(&mut options.overrides).response_text(value)
            }
            "--status" => {
                let status = value
                    .parse::<u16>()
                    .ok()
                    .filter(|s| *s <= 999)
                    .ok_or_else(|| format!("Invalid status: {}", value))?;
                options.overrides = std::mem::take(&mut options.overrides).status(status);
            }
            "--status-text" => {
                options.overrides = std::mem::take(&mut options.overrides).status_text(value)
            }
            "--filter" => options.filter = Some(value),
            "--delay-ms" => {
                options.delay_ms = value
                    .parse()
                    .map_err(|_| format!("Invalid delay: {}", value))?
            }
            other => return Err(format!("Unknown option: {}", other)),
        }
    }

    Ok(options)
}

fn build_config(options: &FetchOptions) -> swizzle::Result<EngineConfig> {
    let mut config = EngineConfig::new().debug(options.debug);

    if options.debug {
        config = config.trace_sink(|record: &swizzle::TraceRecord| eprintln!("{}", record));
    }

    if !options.overrides.is_empty() {
        let payload = options.overrides.to_payload();
        let delay = Duration::from_millis(options.delay_ms);

        config = config.transform(move |_: &dyn Transport| {
            let payload = payload.clone();
            if delay.is_zero() {
                return Deferred::ready(payload);
            }
            Deferred::from_future(async move {
                tokio::time::sleep(delay).await;
                Ok::<_, swizzle::Error>(payload)
            })
        });
    }

    match options.filter {
        Some(ref pattern) => config.filter_pattern(pattern),
        None => Ok(config),
    }
}

async fn fetch(options: FetchOptions) -> ExitCode {
    println!("Fetching: {} {}", options.method, options.url);

    let config = match build_config(&options) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Invalid options: {}", e);
            return ExitCode::from(1);
        }
    };

    let client = match HttpClient::new() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to create HTTP client: {}", e);
            return ExitCode::from(1);
        }
    };

    let engine = Engine::with_http(config, client);
    let xhr = engine.new_request();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let on_load = tx.clone();
    xhr.set_handler(
        EventKind::Load,
        Some(Listener::callback(move |xhr: &dyn Transport, _: &ProgressEvent| {
            on_load.send(Outcome::Loaded {
                status: xhr.status(),
                status_text: xhr.status_text(),
                url: xhr.response_url(),
                content_type: xhr.response_header("content-type"),
                body: xhr.response_text(),
            })?;
            Ok(())
        })),
    );
    for kind in [EventKind::Error, EventKind::Timeout, EventKind::Abort] {
        let on_failure = tx.clone();
        xhr.add_event_listener(
            kind,
            Listener::callback(move |_: &dyn Transport, event: &ProgressEvent| {
                on_failure.send(Outcome::Failed(event.kind))?;
                Ok(())
            }),
        );
    }
    drop(tx);

    if let Err(e) = xhr.open(&options.method, &options.url) {
        eprintln!("Failed to open request: {}", e);
        return ExitCode::from(1);
    }
    if let Err(e) = xhr.send(options.body.map(Bytes::from)) {
        eprintln!("Failed to send request: {}", e);
        return ExitCode::from(1);
    }

    let wait = Duration::from_secs(60) + Duration::from_millis(options.delay_ms);
    match tokio::time::timeout(wait, rx.recv()).await {
        Ok(Some(Outcome::Loaded {
            status,
            status_text,
            url,
            content_type,
            body,
        })) => {
            println!("\n=== Response ===");
            println!("Status: {} {}", status, status_text);
            println!("URL: {}", url);
            println!("Content-Type: {}", content_type.as_deref().unwrap_or("-"));
            println!("Size: {} bytes", body.len());
            println!("\n=== Body ===");
            println!("{}", body);
            ExitCode::SUCCESS
        }
        Ok(Some(Outcome::Failed(kind))) => {
            eprintln!("Request failed: {} (status {})", kind, xhr.status());
            ExitCode::from(1)
        }
        Ok(None) | Err(_) => {
            eprintln!("No completion observed within {}s", wait.as_secs());
            ExitCode::from(1)
        }
    }
}
