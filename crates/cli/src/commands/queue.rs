// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Pending queue commands: `enqueue` and `queue *`.

use std::io::Read;

use tack_core::{OpId, Operation, PendingOperation};

use super::Context;
use crate::cli::OutputFormat;
use crate::colors;
use crate::error::{Error, Result};

pub fn enqueue(kind: &str, payload: &str) -> Result<()> {
    let payload = if payload == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        payload.to_string()
    };
    let pending = enqueue_impl(&Context::load()?, kind, &payload)?;
    println!("Queued {} {}", pending.kind(), pending.id);
    Ok(())
}

pub(crate) fn enqueue_impl(ctx: &Context, kind: &str, payload: &str) -> Result<PendingOperation> {
    let payload = parse_payload(payload)?;
    let operation = Operation::from_parts(kind, payload)?;
    Ok(ctx.pending()?.enqueue(operation)?)
}

fn parse_payload(raw: &str) -> Result<serde_json::Value> {
    let value: serde_json::Value =
        serde_json::from_str(raw.trim()).map_err(|e| Error::InvalidPayload(e.to_string()))?;
    if !value.is_object() {
        return Err(Error::InvalidPayload("expected a JSON object".to_string()));
    }
    Ok(value)
}

pub fn list(output: OutputFormat) -> Result<()> {
    let ops = Context::load()?.pending()?.list();
    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&ops)?),
        OutputFormat::Text if ops.is_empty() => println!("No pending operations."),
        OutputFormat::Text => {
            let colorize = colors::should_colorize();
            for op in &ops {
                println!("{}", format_pending(op, colorize));
            }
        }
    }
    Ok(())
}

/// One line per operation: id, kind, key, then retry state if any.
pub(crate) fn format_pending(op: &PendingOperation, colorize: bool) -> String {
    let mut line = format!("{}  {}  {}", op.id, op.kind(), op.operation.natural_key());
    if op.attempts > 0 {
        let retries = match &op.last_error {
            Some(err) => format!("({} attempts, last: {})", op.attempts, err),
            None => format!("({} attempts)", op.attempts),
        };
        line.push_str("  ");
        line.push_str(&if colorize {
            colors::context(&retries)
        } else {
            retries
        });
    }
    line
}

pub fn count() -> Result<()> {
    println!("{}", Context::load()?.pending()?.count());
    Ok(())
}

pub fn drop(id: &str) -> Result<()> {
    if drop_impl(&Context::load()?, id)? {
        println!("Dropped {}", id);
    } else {
        println!("{} is not pending", id);
    }
    Ok(())
}

pub(crate) fn drop_impl(ctx: &Context, id: &str) -> Result<bool> {
    let id = OpId::parse(id)?;
    Ok(ctx.pending()?.remove(id)?)
}

pub fn clear() -> Result<()> {
    let dropped = Context::load()?.pending()?.clear()?;
    println!("Dropped {} pending {}", dropped, plural(dropped));
    Ok(())
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        "operation"
    } else {
        "operations"
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
