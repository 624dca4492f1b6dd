// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Failed list commands: `failed list`, `failed retry`, `failed dismiss`.

use tack_core::{Error as CoreError, FailedOperation, OpId, PendingOperation};

use super::Context;
use crate::cli::OutputFormat;
use crate::colors;
use crate::error::Result;

pub fn list(output: OutputFormat) -> Result<()> {
    let failed = Context::load()?.failed()?.list();
    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&failed)?),
        OutputFormat::Text if failed.is_empty() => println!("No failed operations."),
        OutputFormat::Text => {
            let colorize = colors::should_colorize();
            for f in &failed {
                println!("{}", format_failed(f, colorize));
            }
        }
    }
    Ok(())
}

pub(crate) fn format_failed(failed: &FailedOperation, colorize: bool) -> String {
    let op = &failed.operation;
    let when = failed.failed_at.format("%Y-%m-%d %H:%M").to_string();
    let when = if colorize {
        colors::context(&when)
    } else {
        when
    };
    format!(
        "{}  {}  {}  {}  {}",
        op.id,
        op.kind(),
        op.operation.natural_key(),
        when,
        failed.reason
    )
}

pub fn retry(id: &str) -> Result<()> {
    let requeued = retry_impl(&Context::load()?, id)?;
    println!("Requeued {}", requeued.id);
    Ok(())
}

/// Moves a failed operation to the tail of the pending queue.
///
/// The operation keeps its id, so a replay the backend already applied is
/// answered as a duplicate, and starts over with zero attempts.
pub(crate) fn retry_impl(ctx: &Context, id: &str) -> Result<PendingOperation> {
    let id = OpId::parse(id)?;
    let mut failed = ctx.failed()?;
    let entry = failed
        .list()
        .into_iter()
        .find(|f| f.id() == id)
        .ok_or_else(|| CoreError::OperationNotFound(id.to_string()))?;

    let requeued = ctx.pending()?.requeue(entry.operation)?;
    failed.dismiss(id)?;
    Ok(requeued)
}

pub fn dismiss(id: &str) -> Result<()> {
    dismiss_impl(&Context::load()?, id)?;
    println!("Dismissed {}", id);
    Ok(())
}

pub(crate) fn dismiss_impl(ctx: &Context, id: &str) -> Result<()> {
    let id = OpId::parse(id)?;
    ctx.failed()?.dismiss(id)?;
    Ok(())
}

#[cfg(test)]
#[path = "failed_tests.rs"]
mod tests;
