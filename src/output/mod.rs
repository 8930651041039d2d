// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Rendering an operation [`Outcome`] for the terminal

mod json;
mod table;
mod yaml;

pub use json::JsonFormatter;
pub use table::TableFormatter;
pub use yaml::YamlFormatter;

use crate::cli::OutputFormat;
use crate::operations::{Operation, Outcome};

pub fn format(outcome: &Outcome, format: &OutputFormat) -> String {
    match format {
        OutputFormat::Table => TableFormatter::format(outcome),
        OutputFormat::Json => JsonFormatter::format(outcome),
        OutputFormat::Yaml => YamlFormatter::format(outcome),
    }
}

/// The operation catalog as a table
pub fn operations_table() -> String {
    TableFormatter::catalog(&Operation::ALL)
}
