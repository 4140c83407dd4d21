//! Interactive chat mode.
//!
//! An explicit command loop over a line stream:
//!
//! ```text
//! read line ─▶ Command::parse ─▶ dispatch ─▶ (await model) ─▶ read line ...
//! ```
//!
//! The only suspension points are reading the next line, file I/O, and the
//! model call. The loop ends on an exit command; running out of input also
//! ends it.
//!
//! Input and output are generic so the loop can be driven from stdin/stdout
//! or from in-memory buffers in tests.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Result;
use codewhisper_core::session::SessionCoordinator;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

use crate::client::ChatModel;
use crate::commands::{Command, HELP_TEXT};
use crate::config::DiscoveryConfig;
use crate::context::{
    added_file_message, code_context_message, discovered_files_message, load_files,
};
use crate::discover::{discover_files, DiscoveryRequest};

/// Settings for a chat or single-prompt run.
#[derive(Debug, Clone)]
pub struct ChatOptions {
    /// Model identifier passed to the model call.
    pub model: String,
    /// Files attached up front.
    pub files: Vec<PathBuf>,
    /// First question, asked before the loop starts.
    pub prompt: Option<String>,
    /// Discover context files for the first prompt.
    pub auto_discover: bool,
    /// Root directory for discovery.
    pub base_path: PathBuf,
    pub discovery: DiscoveryConfig,
}

/// Run an interactive session until an exit command or end of input.
///
/// The session is closed on every exit path once it has started, including
/// when an error is propagated.
pub async fn run_chat<R, W>(
    session: &mut SessionCoordinator,
    model: &dyn ChatModel,
    options: &ChatOptions,
    input: R,
    out: &mut W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    session.initialize().await?;
    let outcome = converse(session, model, options, input, out).await;
    let closed = session.close().await;
    outcome?;
    closed?;
    Ok(())
}

async fn converse<R, W>(
    session: &mut SessionCoordinator,
    model: &dyn ChatModel,
    options: &ChatOptions,
    mut input: R,
    out: &mut W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    writeln!(out, "Session: {}", session.session_id().unwrap_or_default())?;

    let mut auto_discover = options.auto_discover;
    let mut files = options.files.clone();

    if files.is_empty() && !(options.prompt.is_some() && auto_discover) {
        write!(
            out,
            "Enter code file paths (comma separated), \"auto\" for automatic discovery, or press Enter to skip: "
        )?;
        out.flush()?;
        let answer = read_line(&mut input).await?.unwrap_or_default();
        let answer = answer.trim();
        if answer.eq_ignore_ascii_case("auto") {
            auto_discover = true;
        } else if !answer.is_empty() {
            files = split_paths(answer);
        }
    }

    if !files.is_empty() {
        attach_files(session, &files, code_context_message, out).await?;
    }

    if let Some(prompt) = &options.prompt {
        if auto_discover && files.is_empty() {
            attach_discovered(session, prompt, options, code_context_message, out).await?;
        }
        run_turn(session, model, &options.model, prompt, out).await?;
    }

    writeln!(out, "{}", HELP_TEXT)?;

    loop {
        write!(out, "> ")?;
        out.flush()?;
        let Some(line) = read_line(&mut input).await? else {
            debug!("end of input, leaving chat loop");
            return Ok(());
        };

        match Command::parse(&line) {
            Command::Empty => {}
            Command::Exit => {
                writeln!(out, "Goodbye.")?;
                return Ok(());
            }
            Command::Help => writeln!(out, "{}", HELP_TEXT)?,
            Command::AddFile(None) => writeln!(out, "Please provide a file path after \"file:\".")?,
            Command::AddFile(Some(path)) => {
                attach_files(session, &[PathBuf::from(path)], added_file_message, out).await?;
            }
            Command::Discover(None) => {
                writeln!(out, "Please provide a prompt after \"auto:\".")?
            }
            Command::Discover(Some(prompt)) => {
                attach_discovered(session, &prompt, options, discovered_files_message, out)
                    .await?;
            }
            Command::Message(question) => {
                run_turn(session, model, &options.model, &question, out).await?;
            }
        }
    }
}

/// Append a user message, send the full history, and record the reply.
///
/// A failed model call is printed and leaves the user message in place;
/// no assistant message is written for that turn.
pub async fn run_turn<W: Write>(
    session: &mut SessionCoordinator,
    model: &dyn ChatModel,
    model_name: &str,
    question: &str,
    out: &mut W,
) -> Result<Option<String>> {
    session.add_user_message(question).await?;
    writeln!(out, "You: {}", question)?;

    let history = session.chat_history().await?;
    debug!(messages = history.len(), "history loaded");

    match model.complete(&history, model_name).await {
        Ok(reply) => {
            writeln!(out, "Assistant: {}", reply)?;
            session.add_assistant_message(&reply).await?;
            Ok(Some(reply))
        }
        Err(e) => {
            warn!(error = %e, "model call failed");
            writeln!(out, "Error: {}", e)?;
            Ok(None)
        }
    }
}

/// Load files and append them to the session as one system message.
pub async fn attach_files<W: Write>(
    session: &mut SessionCoordinator,
    paths: &[PathBuf],
    wrap: fn(&str) -> String,
    out: &mut W,
) -> Result<bool> {
    let Some(content) = load_files(paths).await else {
        return Ok(false);
    };
    session.add_system_message(&wrap(&content)).await?;
    writeln!(out, "{} file(s) added to the context.", paths.len())?;
    Ok(true)
}

/// Discover files for `prompt` and attach them.
pub async fn attach_discovered<W: Write>(
    session: &mut SessionCoordinator,
    prompt: &str,
    options: &ChatOptions,
    wrap: fn(&str) -> String,
    out: &mut W,
) -> Result<bool> {
    let paths = discover_paths(prompt, &options.base_path, &options.discovery, out).await?;
    attach_files(session, &paths, wrap, out).await
}

/// Run discovery and report the selected files.
pub async fn discover_paths<W: Write>(
    prompt: &str,
    base_path: &Path,
    discovery: &DiscoveryConfig,
    out: &mut W,
) -> Result<Vec<PathBuf>> {
    let request = DiscoveryRequest::new(prompt, base_path, discovery);
    let found = discover_files(&request).await?;
    if found.is_empty() {
        writeln!(
            out,
            "No code files found under {} for \"{}\".",
            base_path.display(),
            prompt
        )?;
        return Ok(Vec::new());
    }

    writeln!(out, "Discovered {} file(s):", found.len())?;
    for file in &found {
        writeln!(out, "- {} (score {})", file.path.display(), file.score)?;
    }
    Ok(found.into_iter().map(|f| f.path).collect())
}

fn split_paths(answer: &str) -> Vec<PathBuf> {
    answer
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .collect()
}

async fn read_line<R: AsyncBufRead + Unpin>(input: &mut R) -> Result<Option<String>> {
    let mut line = String::new();
    let n = input.read_line(&mut line).await?;
    if n == 0 {
        return Ok(None);
    }
    Ok(Some(line))
}
