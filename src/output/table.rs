// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

use std::borrow::Cow;

use comfy_table::{Table, presets::ASCII_BORDERS_ONLY_CONDENSED};

use crate::kubernetes::ContextInfo;
use crate::operations::{Operation, Outcome};

/// Maximum width for a single output value in the summary table
const MAX_VALUE_WIDTH: usize = 80;

/// Outputs rendered below the summary table instead of inside it
const BLOCK_OUTPUTS: &[&str] = &["config", "contexts"];

/// Truncate a string to max_len chars, adding "..." if truncated
fn truncate_value(s: &str, max_len: usize) -> Cow<'_, str> {
    if s.chars().count() <= max_len {
        Cow::Borrowed(s)
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        Cow::Owned(format!("{}...", truncated))
    }
}

fn new_table() -> Table {
    let mut table = Table::new();
    table.load_preset(ASCII_BORDERS_ONLY_CONDENSED);
    table
}

pub struct TableFormatter;

impl TableFormatter {
    pub fn format(outcome: &Outcome) -> String {
        let mut sections = Vec::new();

        let status = if outcome.success { "OK" } else { "FAILED" };
        sections.push(format!("{}: {}", status, outcome.message));
        if let Some(error) = &outcome.error
            && *error != outcome.message
        {
            sections.push(format!("error: {}", error));
        }

        let scalars: Vec<_> = outcome
            .outputs
            .iter()
            .filter(|(key, _)| !BLOCK_OUTPUTS.contains(&key.as_str()))
            .collect();
        if !scalars.is_empty() {
            let mut table = new_table();
            table.set_header(["OUTPUT", "VALUE"]);
            for (key, value) in scalars {
                let value = truncate_value(value, MAX_VALUE_WIDTH);
                table.add_row([key.as_str(), value.as_ref()]);
            }
            sections.push(table.to_string());
        }

        if let Some(contexts) = outcome.output("contexts") {
            sections.push(Self::contexts(contexts));
        }

        if let Some(config) = outcome.output("config") {
            sections.push(config.trim_end().to_string());
        }

        sections.join("\n")
    }

    /// Render the JSON `contexts` output like `kubectl config get-contexts`
    fn contexts(listing: &str) -> String {
        let Ok(contexts) = serde_json::from_str::<Vec<ContextInfo>>(listing) else {
            return listing.to_string();
        };

        let mut table = new_table();
        table.set_header(["CURRENT", "NAME", "CLUSTER", "USER", "NAMESPACE"]);
        for ctx in &contexts {
            table.add_row([
                if ctx.is_current { "*" } else { "" },
                ctx.name.as_str(),
                ctx.cluster.as_str(),
                ctx.user.as_str(),
                ctx.namespace.as_str(),
            ]);
        }
        table.to_string()
    }

    pub fn catalog(operations: &[Operation]) -> String {
        let mut table = new_table();
        table.set_header(["OPERATION", "DESCRIPTION"]);
        for op in operations {
            table.add_row([op.name(), op.description()]);
        }
        table.to_string()
    }
}
