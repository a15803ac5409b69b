//! Cybertrap CLI — run the honeypot funnel from a terminal.
//!
//! Usage:
//!   cybertrap chat [--session <id>] [--verbose]
//!   cybertrap validate --kind <kind> <value>

use clap::{Parser, Subcommand};
use cybertrap::{
    CybertrapApi, EngineConfig, ExtractionEngine, FieldKind, Outcome, SessionStore,
    TemplateGenerator,
};
use std::io::{BufRead, Write};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "cybertrap", version, about = "Scam-engagement honeypot engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat loop against the scripted persona
    Chat {
        /// Session identifier (random when omitted)
        #[arg(long)]
        session: Option<String>,
        /// Print the intelligence snapshot and trace after each turn
        #[arg(long)]
        verbose: bool,
        /// Count pre-eligibility sightings toward consensus
        #[arg(long, default_value_t = true)]
        latent_consensus: bool,
    },
    /// Run a single value through a field validator
    Validate {
        /// Field kind: upi, bank_account, ifsc, or link
        #[arg(long)]
        kind: String,
        /// The raw value to validate
        value: String,
    },
}

async fn cmd_chat(session: Option<String>, verbose: bool, latent_consensus: bool) -> i32 {
    let session_id = session.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let config = EngineConfig::default().with_latent_consensus(latent_consensus);
    let engine = Arc::new(ExtractionEngine::new(Arc::new(SessionStore::new()), config));
    let api = CybertrapApi::new(engine, Arc::new(TemplateGenerator::new()));

    println!("Session {session_id} — type the scammer's messages; /reset, /sessions, /quit");
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    loop {
        print!("> ");
        stdout.flush().ok();
        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                eprintln!("Error: {e}");
                return 1;
            }
        }
        let message = line.trim();
        if message.is_empty() {
            continue;
        }
        match message {
            "/quit" => break,
            "/reset" => {
                let existed = api.reset(&session_id);
                println!("{}", if existed { "Session reset." } else { "Nothing to reset." });
                continue;
            }
            "/sessions" => {
                for summary in api.sessions().await {
                    println!(
                        "{:<36}  stage {}  turns {:>3}  intel: {}",
                        summary.session_id,
                        summary.stage,
                        summary.turn_count,
                        if summary.has_intel { "yes" } else { "no" }
                    );
                }
                continue;
            }
            _ => {}
        }

        match api.engage(&session_id, message, &[]).await {
            Ok(response) => {
                println!("Mrs. Shanthi: {}", response.reply);
                if verbose {
                    match serde_json::to_string_pretty(&response.intelligence) {
                        Ok(json) => println!("intelligence: {json}"),
                        Err(e) => eprintln!("Error rendering snapshot: {e}"),
                    }
                    println!(
                        "stage {} | confidence {:.2} | language {}",
                        response.current_stage, response.confidence, response.detected_language
                    );
                    for step in &response.thought_process {
                        println!("  [{}] {}", step_label(step.kind), step.content);
                    }
                }
            }
            Err(e) => {
                eprintln!("Error: {e}");
                eprintln!("Use /reset to discard the corrupted session.");
            }
        }
    }
    0
}

fn step_label(kind: cybertrap::StepKind) -> &'static str {
    match kind {
        cybertrap::StepKind::Thought => "thought",
        cybertrap::StepKind::Action => "action",
        cybertrap::StepKind::ToolCall => "tool_call",
        cybertrap::StepKind::Validation => "validation",
    }
}

fn cmd_validate(kind: &str, value: &str) -> i32 {
    let Some(kind) = FieldKind::parse(kind) else {
        eprintln!("Error: unknown field kind '{kind}' (expected upi, bank_account, ifsc, or link)");
        return 1;
    };
    let validator = cybertrap::validate::validator_for(kind);
    match validator.validate(value) {
        Outcome::Accepted { value } => {
            println!("accepted: {value}");
            println!("canonical: {}", validator.canonicalize(&value));
            0
        }
        Outcome::SoftFail { value, reason } => {
            println!("soft-fail: {value}");
            println!("reason: {reason}");
            println!("canonical: {}", validator.canonicalize(&value));
            0
        }
        Outcome::Rejected { reason } => {
            eprintln!("rejected: {reason}");
            1
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let code = match cli.command {
        Commands::Chat {
            session,
            verbose,
            latent_consensus,
        } => cmd_chat(session, verbose, latent_consensus).await,
        Commands::Validate { kind, value } => cmd_validate(&kind, &value),
    };
    std::process::exit(code);
}
