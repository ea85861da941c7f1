use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, ExternalPrinter, Helper};
use std::borrow::Cow::{self, Borrowed, Owned};
use tokio::sync::mpsc;

use docschat_core::document::{DocumentFile, MessageRole, filter_valid};
use docschat_core::orchestrator::SessionOrchestrator;
use docschat_interaction::{BackendConfig, HttpDocumentGateway};

/// CLI helper for rustyline that provides completion, highlighting, and hints.
#[derive(Clone)]
struct CliHelper {
    commands: Vec<String>,
}

impl CliHelper {
    fn new() -> Self {
        Self {
            commands: vec![
                "/upload".to_string(),
                "/docs".to_string(),
                "/open".to_string(),
                "/home".to_string(),
                "/remove".to_string(),
                "/summary".to_string(),
            ],
        }
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];

        if line.starts_with('/') {
            let candidates: Vec<Pair> = self
                .commands
                .iter()
                .filter(|cmd| cmd.starts_with(line))
                .map(|cmd| Pair {
                    display: cmd.clone(),
                    replacement: cmd.clone(),
                })
                .collect();
            Ok((0, candidates))
        } else {
            Ok((0, vec![]))
        }
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            self.commands
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for CliHelper {}

/// Builds a file handle from a path on disk, deriving the MIME type from
/// the extension the way a browser file input would.
fn read_file(path: &str) -> std::io::Result<DocumentFile> {
    let data = fs::read(path)?;
    let name = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string());
    let mime_type = if Path::new(path)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
    {
        "application/pdf"
    } else {
        "application/octet-stream"
    };
    Ok(DocumentFile::new(name, mime_type, data))
}

/// Parses a 1-based document number from a command argument.
fn parse_doc_number(arg: Option<&str>) -> Option<usize> {
    arg.and_then(|s| s.parse::<usize>().ok())
        .and_then(|n| n.checked_sub(1))
}

async fn print_documents(orchestrator: &SessionOrchestrator) {
    let snap = orchestrator.snapshot().await;
    if snap.documents.is_empty() {
        println!("{}", "No documents uploaded yet.".bright_black());
        return;
    }
    for (i, doc) in snap.documents.iter().enumerate() {
        let marker = if snap.active_index == Some(i) { "*" } else { " " };
        println!(
            "{}",
            format!(
                "{} {}. {} ({} messages)",
                marker,
                i + 1,
                doc.name,
                doc.messages.len()
            )
            .bright_white()
        );
    }
}

/// Handles the `/upload` command: validates the named files, reports
/// rejections, and hands the acceptable ones to the orchestrator in the
/// background. Output from the background task goes through the external
/// printer channel so it does not garble the prompt.
fn upload_files(
    orchestrator: Arc<SessionOrchestrator>,
    out: mpsc::UnboundedSender<String>,
    paths: &[&str],
) {
    let mut candidates = Vec::new();
    for path in paths {
        match read_file(path) {
            Ok(file) => candidates.push(file),
            Err(e) => eprintln!("{}", format!("Could not read '{}': {}", path, e).red()),
        }
    }

    let (accepted, rejected) = filter_valid(candidates);
    for (file, reason) in &rejected {
        eprintln!("{}", format!("Rejected '{}': {}", file.name, reason).red());
    }
    if accepted.is_empty() {
        return;
    }

    tokio::spawn(async move {
        match orchestrator.add_documents(accepted).await {
            Ok(report) => {
                for (name, err) in &report.failed {
                    let _ =
                        out.send(format!("Upload failed for '{}': {}", name, err).red().to_string());
                }
                if report.added > 0 {
                    let _ = out.send(
                        format!("Uploaded {} document(s).", report.added)
                            .green()
                            .to_string(),
                    );
                }
            }
            Err(e) => {
                let _ = out.send(format!("Upload failed: {}", e).red().to_string());
            }
        }
    });
}

/// The main entry point for the docschat REPL.
///
/// Sets up a rustyline-based REPL that:
/// 1. Builds the HTTP gateway and the session orchestrator
/// 2. Subscribes to orchestrator snapshots and renders status text,
///    summary updates, and assistant replies as they arrive
/// 3. Provides command completion for the slash commands
/// 4. Runs every network-touching operation in a background task so the
///    prompt never blocks on the backend
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = BackendConfig::load().map_err(anyhow::Error::msg)?;
    let gateway = Arc::new(HttpDocumentGateway::new(&config));
    let orchestrator = Arc::new(SessionOrchestrator::new(gateway));

    // ===== REPL Setup =====
    let helper = CliHelper::new();
    let mut rl = Editor::new()?;
    rl.set_helper(Some(helper));

    // Background tasks print through the editor's external printer so
    // their output lands above the prompt instead of tearing through it.
    let mut printer = rl.create_external_printer()?;
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();
    tokio::spawn(async move {
        while let Some(line) = out_rx.recv().await {
            let _ = printer.print(line);
        }
    });

    // Render state changes pushed by the orchestrator. Replies are
    // attributed by session id, so an answer that resolves after a
    // document switch is still printed under the right document.
    let mut rx = orchestrator.subscribe();
    let mut prev = rx.borrow().clone();
    let watcher_tx = out_tx.clone();
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let snap = rx.borrow().clone();

            if snap.status_text != prev.status_text && !snap.status_text.is_empty() {
                let _ = watcher_tx.send(snap.status_text.bright_black().to_string());
            }
            if snap.combined_summary != prev.combined_summary
                && !snap.combined_summary.is_empty()
            {
                let _ = watcher_tx.send(
                    format!("Summary: {}", snap.combined_summary)
                        .bright_yellow()
                        .to_string(),
                );
            }
            for doc in &snap.documents {
                let seen = prev
                    .documents
                    .iter()
                    .find(|d| d.session_id == doc.session_id)
                    .map(|d| d.messages.len())
                    .unwrap_or(0);
                for message in doc.messages.iter().skip(seen) {
                    if message.role == MessageRole::Assistant {
                        let _ = watcher_tx
                            .send(format!("[{}]", doc.name).bright_magenta().to_string());
                        for line in message.content.lines() {
                            let _ = watcher_tx.send(line.bright_blue().to_string());
                        }
                        if let Some(sources) = &message.sources {
                            let _ = watcher_tx.send(
                                format!("Sources: {}", sources.join(", "))
                                    .bright_black()
                                    .to_string(),
                            );
                        }
                    }
                }
            }

            prev = snap;
        }
    });

    println!("{}", "=== docschat ===".bright_magenta().bold());
    println!(
        "{}",
        "Upload PDFs with '/upload <path>...', then ask questions about them."
            .bright_black()
    );
    println!(
        "{}",
        "Commands: /upload /docs /open <n> /home /remove <n> /summary, or 'quit' to exit."
            .bright_black()
    );
    println!();

    // ===== Main REPL Loop =====
    loop {
        let readline = rl.readline(">> ");

        match readline {
            Ok(line) => {
                let trimmed = line.trim();

                if trimmed == "quit" || trimmed == "exit" {
                    println!("{}", "Goodbye!".bright_green());
                    break;
                }
                if trimmed.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(&line);

                let mut parts = trimmed.split_whitespace();
                match parts.next() {
                    Some("/upload") => {
                        let paths: Vec<&str> = parts.collect();
                        if paths.is_empty() {
                            eprintln!("{}", "Usage: /upload <path>...".yellow());
                        } else {
                            upload_files(Arc::clone(&orchestrator), out_tx.clone(), &paths);
                        }
                    }
                    Some("/docs") => print_documents(&orchestrator).await,
                    Some("/open") => match parse_doc_number(parts.next()) {
                        Some(index) => {
                            if let Err(e) = orchestrator.select_document(index).await {
                                eprintln!("{}", format!("{}", e).red());
                            }
                        }
                        None => eprintln!("{}", "Usage: /open <n>".yellow()),
                    },
                    Some("/home") => orchestrator.go_home().await,
                    Some("/remove") => match parse_doc_number(parts.next()) {
                        Some(index) => {
                            let orchestrator = Arc::clone(&orchestrator);
                            let out = out_tx.clone();
                            tokio::spawn(async move {
                                if let Err(e) = orchestrator.remove_document(index).await {
                                    let _ = out.send(format!("{}", e).red().to_string());
                                }
                            });
                        }
                        None => eprintln!("{}", "Usage: /remove <n>".yellow()),
                    },
                    Some("/summary") => {
                        let snap = orchestrator.snapshot().await;
                        if snap.combined_summary.is_empty() {
                            println!("{}", "No summary yet.".bright_black());
                        } else {
                            println!(
                                "{}",
                                format!("Summary: {}", snap.combined_summary).bright_yellow()
                            );
                        }
                    }
                    _ => {
                        // Anything else is a question for the active document.
                        let snap = orchestrator.snapshot().await;
                        if snap.is_home() {
                            eprintln!(
                                "{}",
                                "No active document. Use '/open <n>' first.".yellow()
                            );
                            continue;
                        }
                        println!("{}", format!("> {}", trimmed).green());
                        let orchestrator = Arc::clone(&orchestrator);
                        let question = trimmed.to_string();
                        let out = out_tx.clone();
                        tokio::spawn(async move {
                            if let Err(e) = orchestrator.send_question(&question).await {
                                let _ = out
                                    .send(format!("Failed to get an answer: {}", e).red().to_string());
                            }
                        });
                    }
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        }
    }

    Ok(())
}
