// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

use crate::operations::Outcome;

pub struct YamlFormatter;

impl YamlFormatter {
    pub fn format(outcome: &Outcome) -> String {
        serde_yaml::to_string(outcome).unwrap_or_else(|_| "{}".to_string())
    }
}
