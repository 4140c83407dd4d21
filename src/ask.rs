//! Single-prompt mode.
//!
//! Opens a session, primes it with explicit files or auto-discovered ones,
//! asks one question, prints and stores the answer, and closes the session.

use std::io::Write;

use anyhow::{bail, Result};
use codewhisper_core::session::SessionCoordinator;

use crate::chat::{attach_discovered, attach_files, run_turn, ChatOptions};
use crate::client::ChatModel;
use crate::context::code_context_message;

/// Answer `options.prompt` once, using the files in `options` as context.
///
/// Returns the reply, or `None` if the model call failed (the error has
/// already been printed).
///
/// # Errors
///
/// Fails without touching the store if no prompt is given, or if neither
/// explicit files nor auto-discovery were requested.
pub async fn run_ask<W: Write>(
    session: &mut SessionCoordinator,
    model: &dyn ChatModel,
    options: &ChatOptions,
    out: &mut W,
) -> Result<Option<String>> {
    let prompt = match options.prompt.as_deref() {
        Some(p) if !p.trim().is_empty() => p,
        _ => bail!("A prompt is required (-P/--prompt)."),
    };
    if options.files.is_empty() && !options.auto_discover {
        bail!("Provide context files with -F/--file or enable auto-discovery with -A/--auto.");
    }

    session.initialize().await?;
    let outcome = answer(session, model, options, prompt, out).await;
    let closed = session.close().await;
    let reply = outcome?;
    closed?;
    Ok(reply)
}

async fn answer<W: Write>(
    session: &mut SessionCoordinator,
    model: &dyn ChatModel,
    options: &ChatOptions,
    prompt: &str,
    out: &mut W,
) -> Result<Option<String>> {
    writeln!(out, "Session: {}", session.session_id().unwrap_or_default())?;

    if !options.files.is_empty() {
        attach_files(session, &options.files, code_context_message, out).await?;
    } else {
        attach_discovered(session, prompt, options, code_context_message, out).await?;
    }

    run_turn(session, model, &options.model, prompt, out).await
}
