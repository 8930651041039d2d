// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

use crate::operations::Outcome;

pub struct JsonFormatter;

impl JsonFormatter {
    pub fn format(outcome: &Outcome) -> String {
        serde_json::to_string_pretty(outcome).unwrap_or_else(|_| "{}".to_string())
    }
}
