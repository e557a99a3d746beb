use std::fs;
use std::io::{self, BufRead, Write};

use anyhow::{bail, Context};
use clap::Parser;
use domscope::{CaptureConfig, InspectEvent, Notification, Session};

/// Headless element capture: point at an element, get back its styles,
/// markup, structure and assets.
#[derive(Parser, Debug)]
#[command(name = "domscope", version, about)]
struct Args {
    /// HTML file or http(s) URL to load
    input: String,

    /// Capture the first element matching this CSS selector and print the
    /// selection payload
    #[arg(long)]
    select: Option<String>,

    /// After any --select, read JSON control messages from stdin, one per
    /// line, and answer each on stdout
    #[arg(long)]
    serve: bool,

    /// Base URL for resolving relative asset references (file inputs only)
    #[arg(long)]
    base: Option<String>,
}

fn load_session(args: &Args) -> anyhow::Result<Session> {
    let config = CaptureConfig::default();

    if args.input.starts_with("http://") || args.input.starts_with("https://") {
        #[cfg(feature = "fetch")]
        {
            return Ok(Session::load_url(&args.input, config)?);
        }
        #[cfg(not(feature = "fetch"))]
        bail!("built without the `fetch` feature; only file inputs are supported");
    }

    let html = fs::read_to_string(&args.input)
        .with_context(|| format!("reading {}", args.input))?;
    let base = args
        .base
        .as_deref()
        .map(url::Url::parse)
        .transpose()
        .context("parsing --base")?;
    Ok(Session::from_html(&html, base, config))
}

fn serve(session: &mut Session) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let reply = session.handle_message(&line);
        writeln!(out, "{}", serde_json::to_string(&reply)?)?;
        out.flush()?;
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut session = load_session(&args)?;

    if let Some(css) = &args.select {
        let target = session.find(css)?;
        session.dispatch_event(InspectEvent::Enable)?;
        match session.dispatch_event(InspectEvent::Click { target })? {
            Some(notification @ Notification::ElementSelected { .. }) => {
                println!("{}", serde_json::to_string_pretty(&notification)?);
            }
            None => bail!("capture produced no selection"),
        }
    }

    if args.serve {
        serve(&mut session)?;
    } else if args.select.is_none() {
        bail!("nothing to do: pass --select <css> and/or --serve");
    }

    Ok(())
}
