//! Claude Bridge - Stream event protocol engine for Claude Code sessions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use claude_bridge::classify::{ClassifiedError, Severity};
use claude_bridge::config::ConfigLoader;
use claude_bridge::display;
use claude_bridge::protocol::{Framing, ResultSummary, StreamEvent, StreamHandler};
use claude_bridge::transport::{HttpTransport, StreamClient, StreamRequest};

#[derive(Parser)]
#[command(
    name = "claude-bridge",
    about = "Stream Claude Code sessions from a bridge server",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to a config file (skips the default search paths).
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a message and stream the session to the terminal.
    Send {
        /// The message to send.
        message: String,
        /// Bridge endpoint URL (overrides config).
        #[arg(long)]
        url: Option<String>,
        /// Session to resume.
        #[arg(long)]
        session: Option<String>,
        /// Project directory the CLI should run in.
        #[arg(long)]
        project: Option<String>,
        /// Expect SSE framing instead of bare JSON lines.
        #[arg(long)]
        sse: bool,
        /// Print thinking deltas as they stream.
        #[arg(long)]
        show_thinking: bool,
        /// Plain output without truncation.
        #[arg(long)]
        raw: bool,
        /// Dump every decoded event as JSON.
        #[arg(long)]
        events: bool,
    },
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

/// Handler that renders stream events on the terminal.
struct ConsoleHandler {
    show_thinking: bool,
    raw_mode: bool,
    dump_events: bool,
}

impl StreamHandler for ConsoleHandler {
    fn on_event(&mut self, event: &StreamEvent) {
        if !self.dump_events {
            return;
        }
        if let Ok(value) = serde_json::to_value(event) {
            let kind = value
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string();
            display::print_raw_event(&kind, &value.to_string());
        }
    }

    fn on_session_init(&mut self, session_id: &str, model: Option<&str>) {
        display::print_session_start(model, session_id, self.raw_mode);
    }

    fn on_text_delta(&mut self, text: &str, _index: usize) {
        display::print_text(text);
    }

    fn on_thinking_delta(&mut self, thinking: &str, _index: usize) {
        if self.show_thinking {
            display::print_thinking(thinking);
        }
    }

    fn on_tool_use(&mut self, _id: &str, name: &str, input: &Value) {
        display::print_tool_request(name, input, self.raw_mode);
    }

    fn on_tool_result(&mut self, tool_use_id: &str, content: &Value, is_error: bool) {
        let text = match content {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        display::print_tool_result(tool_use_id, &text, is_error, self.raw_mode);
    }

    fn on_message_stop(&mut self) {
        display::print_message_end();
    }

    fn on_result_success(&mut self, summary: &ResultSummary) {
        display::print_session_end(
            summary.cost_usd.or(summary.total_cost_usd),
            false,
            summary.session_id.as_deref(),
            None,
            self.raw_mode,
        );
    }

    fn on_result_error(&mut self, message: &str) {
        display::print_session_end(None, true, None, Some(message), self.raw_mode);
    }

    fn on_error(&mut self, error: &ClassifiedError) {
        display::print_classified_error(
            &error.message,
            error.suggestion.as_deref(),
            error.help_url.as_deref(),
            error.severity == Severity::Warning,
        );
    }

    fn on_stream_complete(&mut self, exit_code: i32) {
        display::print_stream_complete(exit_code);
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let loader = cli.config.map_or_else(ConfigLoader::new, ConfigLoader::with_path);
    let mut config = match loader.load() {
        Ok(config) => config,
        Err(e) => {
            display::print_error(&e.to_string());
            std::process::exit(1);
        }
    };

    match cli.command {
        Commands::Send {
            message,
            url,
            session,
            project,
            sse,
            show_thinking,
            raw,
            events,
        } => {
            if let Some(url) = url {
                config.transport.endpoint = url;
            }
            if sse {
                config.transport.sse = true;
            }
            if show_thinking {
                config.display.show_thinking = true;
            }
            if raw {
                config.display.raw = true;
            }

            let framing = if config.transport.sse {
                Framing::Sse
            } else {
                Framing::Lines
            };
            let transport = HttpTransport::from_config(&config.transport);
            let client = StreamClient::new(transport).with_framing(framing);

            let mut request = StreamRequest::new(message);
            if let Some(session) = session {
                request = request.with_session(session);
            }
            if let Some(project) = project {
                request = request.with_project_path(project);
            }

            tracing::info!(
                endpoint = %config.transport.endpoint,
                framing = ?framing,
                "Connecting to bridge"
            );
            let handler = ConsoleHandler {
                show_thinking: config.display.show_thinking,
                raw_mode: config.display.raw,
                dump_events: events,
            };
            let connection = client.connect(request, handler);
            let cancel = connection.cancellation_token();

            tokio::select! {
                () = connection.completion() => {}
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Interrupted; cancelling stream");
                    cancel.cancel();
                }
            }
        }
    }
}
