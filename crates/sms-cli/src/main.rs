//! Unveil SMS - composition preview CLI
//!
//! The `unveil-sms` command lets hosts and operators see exactly what a
//! message will look like on a guest's phone, without touching the guest
//! store or the carrier gateway.
//!
//! ## Commands
//!
//! - `preview`: compose a message for a throwaway event/recipient
//! - `tag`: print the event tag derived from a title or short tag
//! - `segments`: count carrier segments for arbitrary text
//! - `check-config`: validate the fixed brand/notice text from the environment

use std::io::Read;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use guest_state::fakes::MemoryGuestStore;
use serde::Serialize;
use tracing::{debug, Level};

use unveil_sms_core::{
    event_tag, segment_count, ComposeOptions, ComposerConfig, EnvKillSwitch, EventContext,
    EventId, FormatResult, MessageComposer, RecipientId, METRICS,
};

#[derive(Parser)]
#[command(name = "unveil-sms")]
#[command(author = "Unveil Engineering")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Preview outbound event SMS composition", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compose a message exactly as a guest would receive it
    Preview {
        /// Message body; read from stdin when omitted
        body: Option<String>,

        /// Event title (used for the tag when --tag is absent)
        #[arg(long, default_value = "Event")]
        title: String,

        /// Host-assigned short tag
        #[arg(long)]
        tag: Option<String>,

        /// Link appended to the body
        #[arg(long)]
        link: Option<String>,

        /// Treat the recipient as having already received the opt-out notice
        #[arg(long)]
        notice_sent: bool,

        /// Include the opt-out notice even if already sent
        #[arg(long)]
        force_notice: bool,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the tag derived for an event
    Tag {
        /// Event title
        title: String,

        /// Host-assigned short tag
        #[arg(long)]
        tag: Option<String>,
    },

    /// Count carrier segments for a piece of text
    Segments {
        /// Text to measure; read from stdin when omitted
        text: Option<String>,
    },

    /// Validate composer configuration from the environment
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    unveil_sms_core::init_tracing(cli.json_logs, level);

    match cli.command {
        Commands::Preview {
            body,
            title,
            tag,
            link,
            notice_sent,
            force_notice,
            json,
        } => {
            let body = body_or_stdin(body)?;
            let request = PreviewRequest {
                title,
                tag,
                link,
                notice_sent,
                force_notice,
            };
            cmd_preview(&request, &body, json).await
        }
        Commands::Tag { title, tag } => {
            println!("{}", event_tag(tag.as_deref(), &title));
            Ok(())
        }
        Commands::Segments { text } => {
            let text = body_or_stdin(text)?;
            println!("{}", segment_count(&text));
            Ok(())
        }
        Commands::CheckConfig => cmd_check_config(),
    }
}

fn body_or_stdin(arg: Option<String>) -> Result<String> {
    match arg {
        Some(body) => Ok(body),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read message body from stdin")?;
            Ok(buf.trim_end_matches(['\r', '\n']).to_string())
        }
    }
}

/// Event and recipient shape for a one-off preview.
struct PreviewRequest {
    title: String,
    tag: Option<String>,
    link: Option<String>,
    notice_sent: bool,
    force_notice: bool,
}

/// Compose `body` against a throwaway in-memory event and recipient.
async fn preview(request: &PreviewRequest, body: &str) -> Result<FormatResult> {
    let store = Arc::new(MemoryGuestStore::new());
    let event_id = EventId::new();
    let recipient_id = RecipientId::new();

    let mut event = EventContext::new(event_id.clone(), request.title.as_str());
    event.sms_tag = request.tag.clone();
    store.insert_event(event);
    store.insert_recipient(
        &event_id,
        &recipient_id,
        request.notice_sent.then(Utc::now),
    );

    let config = ComposerConfig::from_env().context("Invalid composer configuration")?;
    let composer = MessageComposer::from_store(store, config)
        .context("Composer configuration rejected")?
        .with_kill_switch(Arc::new(EnvKillSwitch::new()));

    let options = ComposeOptions {
        link: request.link.clone(),
        force_notice: request.force_notice,
    };
    debug!(event_id = %event_id, recipient_id = %recipient_id, "composing preview");
    Ok(composer
        .compose(&event_id, &recipient_id, body, &options)
        .await)
}

async fn cmd_preview(request: &PreviewRequest, body: &str, json: bool) -> Result<()> {
    let result = preview(request, body).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", render_preview(&result));
    }
    METRICS.flush();
    Ok(())
}

fn render_preview(result: &FormatResult) -> String {
    let path = match result.tier() {
        Some(tier) => tier.as_str().to_string(),
        None => format!("{:?}", result.path()),
    };
    let mut out = format!("{}\n\n---\n", result.text());
    out.push_str(&format!("length:   {}\n", result.length()));
    out.push_str(&format!("segments: {}\n", result.segments()));
    out.push_str(&format!("path:     {}\n", path));
    out.push_str(&format!(
        "notice:   {}\n",
        yes_no(result.included_compliance_notice())
    ));
    out.push_str(&format!(
        "link:     {}\n",
        if result.dropped_link() { "dropped" } else { "kept" }
    ));
    out.push_str(&format!(
        "body:     {}\n",
        if result.truncated_body() { "truncated" } else { "full" }
    ));
    out
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

#[derive(Serialize)]
struct ConfigReport {
    segment_budget: usize,
    brand_line: String,
    notice_line: String,
    worst_case_body_space: usize,
    min_body_chars: usize,
}

fn cmd_check_config() -> Result<()> {
    let config = ComposerConfig::from_env().context("Invalid composer configuration")?;
    config
        .validate()
        .context("Composer configuration would allow the emergency tier")?;

    let report = ConfigReport {
        segment_budget: config.segment_budget,
        worst_case_body_space: config.worst_case_body_space(),
        min_body_chars: config.min_body_chars,
        brand_line: config.brand_line,
        notice_line: config.notice_line,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
