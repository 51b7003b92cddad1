//! Main Entrypoint for the HR Console
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment and the command line.
//! 2. Initializing logging.
//! 3. Wiring the interview session to the terminal speech adapters.
//! 4. Serving the interview, demo, chat, stats and directory commands.

use anyhow::Context;
use clap::{Parser, Subcommand};
use hireflow_console::{
    config::Config,
    records::{HELP, RecordsShell, employee_line},
    runtime::{ConsoleCommand, DEMO_ANSWERS, InterviewRuntime, run_demo},
    terminal::{LineRecognizer, TerminalVoice},
};
use hireflow_core::{
    assistant::ChatAssistant,
    directory::Directory,
    session::{InterviewSession, SessionOptions},
    speech::{SpeechInputPort, SpeechOutputPort, event_channel},
};
use std::{path::PathBuf, sync::Arc, time::Duration};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};
use tracing::{info, warn};

/// HR console: interview practice, an HR chat assistant and directory stats
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a voice-style interview in the terminal
    Interview {
        /// File with one question per line (overrides INTERVIEW_SCRIPT_PATH)
        #[arg(short, long)]
        script: Option<PathBuf>,

        /// Pause between an answer and the next question, in milliseconds
        #[arg(long)]
        pause_ms: Option<u64>,

        /// Show questions as text only
        #[arg(long)]
        no_voice: bool,

        /// Keep listening across lines until /done
        #[arg(long)]
        continuous: bool,
    },

    /// Play a full interview with canned answers
    Demo {
        /// File with one question per line (overrides INTERVIEW_SCRIPT_PATH)
        #[arg(short, long)]
        script: Option<PathBuf>,

        /// An answer to give; repeat for several (cycled if fewer than questions)
        #[arg(short, long = "answer")]
        answers: Vec<String>,
    },

    /// Chat with the HR assistant about the employee directory
    Chat,

    /// Print headline directory statistics as JSON
    Stats,

    /// List employees, optionally filtered by name or role
    Employees {
        /// Case-insensitive text to look for in names and roles
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Browse and edit the employee and candidate directory interactively
    Directory,
}

/// Forwards stdin lines as console commands until EOF.
fn spawn_stdin_reader() -> mpsc::Receiver<ConsoleCommand> {
    let (tx, rx) = mpsc::channel(16);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let Some(command) = ConsoleCommand::parse(&line) else {
                        continue;
                    };
                    if tx.send(command).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("Failed to read from stdin: {}", e);
                    break;
                }
            }
        }
    });
    rx
}

async fn interview(
    mut config: Config,
    script: Option<PathBuf>,
    pause_ms: Option<u64>,
    no_voice: bool,
    continuous: bool,
) -> anyhow::Result<()> {
    if script.is_some() {
        config.script_path = script;
    }
    if let Some(ms) = pause_ms {
        config.thinking_pause = Duration::from_millis(ms);
    }
    let script = config.load_script()?;

    let (tx, rx) = event_channel();
    let voice: Arc<dyn SpeechOutputPort> = if config.speech_output && !no_voice {
        Arc::new(TerminalVoice::new(tx.clone(), config.words_per_minute))
    } else {
        Arc::new(TerminalVoice::unavailable(tx.clone()))
    };
    let recognizer = Arc::new(if config.speech_input {
        LineRecognizer::new(tx.clone(), config.recognition_continuous || continuous)
    } else {
        LineRecognizer::unavailable(tx.clone())
    });
    let input: Arc<dyn SpeechInputPort> = recognizer.clone();

    let session = InterviewSession::new(script, voice, input, tx).with_options(SessionOptions {
        thinking_pause: config.thinking_pause,
    });

    println!("Commands: /done to finish an answer, /stop to end, /restart, /quit.\n");
    let runtime = InterviewRuntime::new(session, rx, recognizer, std::io::stdout());
    let summary = runtime.run(spawn_stdin_reader()).await?;

    info!(?summary, "Interview session closed.");
    Ok(())
}

async fn demo(config: Config, script: Option<PathBuf>, answers: Vec<String>) -> anyhow::Result<()> {
    let script = match script {
        Some(path) => hireflow_core::script::InterviewScript::from_file(&path)?,
        None => config.load_script()?,
    };
    let answers = if answers.is_empty() {
        DEMO_ANSWERS.iter().map(|a| a.to_string()).collect()
    } else {
        answers
    };

    let options = SessionOptions {
        thinking_pause: config.thinking_pause,
    };
    let summary = run_demo(script, answers, options, std::io::stdout()).await?;
    info!(?summary, "Demo interview finished.");
    Ok(())
}

async fn chat(config: Config) -> anyhow::Result<()> {
    let directory = Directory::seeded();
    let mut assistant = ChatAssistant::new();
    if let Some(welcome) = assistant.messages().first() {
        println!("Assistant: {}", welcome.text);
    }
    println!("(type /quit to leave)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines
        .next_line()
        .await
        .context("Failed to read from stdin")?
    {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "/quit" || line == "/exit" {
            break;
        }
        tokio::time::sleep(config.chat_reply_delay).await;
        let reply = assistant.send(line, &directory);
        println!("Assistant: {}", reply.text);
    }
    Ok(())
}

fn employees(search: Option<String>) -> anyhow::Result<()> {
    let directory = Directory::seeded();
    let term = search.unwrap_or_default();
    let mut found = 0;
    for employee in directory.search_employees(&term) {
        println!("{}", employee_line(employee));
        found += 1;
    }
    if found == 0 {
        println!("No employees match '{}'.", term);
    }
    Ok(())
}

async fn directory_shell() -> anyhow::Result<()> {
    let mut shell = RecordsShell::new(Directory::seeded());
    println!("{HELP}\n(type /quit to leave)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines
        .next_line()
        .await
        .context("Failed to read from stdin")?
    {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "/quit" || line == "/exit" {
            break;
        }
        match shell.execute(line) {
            Ok(output) => println!("{output}"),
            Err(e) => println!("Error: {e:#}"),
        }
    }
    Ok(())
}

fn stats() -> anyhow::Result<()> {
    let directory = Directory::seeded();
    let report = serde_json::json!({
        "stats": directory.stats(),
        "average_salary": directory.average_salary(),
        "departments": directory.department_distribution(),
        "top_performer": directory.top_performer().map(|e| &e.name),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Load Configuration ---
    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    // --- 2. Initialize Logging ---
    // Logs go to stderr so they never interleave with the transcript.
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .with_writer(std::io::stderr)
        .init();
    info!(command = ?cli.command, "Configuration loaded.");

    // --- 3. Dispatch ---
    match cli.command {
        Commands::Interview {
            script,
            pause_ms,
            no_voice,
            continuous,
        } => interview(config, script, pause_ms, no_voice, continuous).await,
        Commands::Demo { script, answers } => demo(config, script, answers).await,
        Commands::Chat => chat(config).await,
        Commands::Stats => stats(),
        Commands::Employees { search } => employees(search),
        Commands::Directory => directory_shell().await,
    }
}
