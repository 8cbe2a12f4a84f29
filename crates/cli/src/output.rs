// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output rendering shared across command modules: plain text by default,
//! `--output json` for scripting.

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Render `data` as JSON when requested, otherwise hand it to `text_fn`.
pub fn format_or_json<T, F>(format: OutputFormat, data: &T, text_fn: F) -> anyhow::Result<()>
where
    T: Serialize,
    F: FnOnce(&T),
{
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(data)?),
        OutputFormat::Text => text_fn(data),
    }
    Ok(())
}

/// Render a list, printing `empty_msg` in text mode when it's empty.
pub fn handle_list<T, F>(format: OutputFormat, items: &[T], empty_msg: &str, render_text: F) -> anyhow::Result<()>
where
    T: Serialize,
    F: Fn(&[T]),
{
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(items)?),
        OutputFormat::Text => {
            if items.is_empty() {
                println!("{empty_msg}");
            } else {
                render_text(items);
            }
        }
    }
    Ok(())
}

/// A rough relative-time label ("3m ago", "2h ago") for text-mode listings.
pub fn format_time_ago(at: DateTime<Utc>) -> String {
    let delta = Utc::now().signed_duration_since(at);
    if delta.num_seconds() < 0 {
        return "in the future".to_string();
    }
    if delta.num_seconds() < 60 {
        format!("{}s ago", delta.num_seconds())
    } else if delta.num_minutes() < 60 {
        format!("{}m ago", delta.num_minutes())
    } else if delta.num_hours() < 24 {
        format!("{}h ago", delta.num_hours())
    } else {
        format!("{}d ago", delta.num_days())
    }
}
