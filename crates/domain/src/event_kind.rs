// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The enumerated kind of a telemetry event.
///
/// Kinds are wire-stable strings; anything outside this set is rejected
/// at ingest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// A tool invocation completed.
    #[serde(rename = "tool_call")]
    ToolCall,
    /// A tool invocation failed.
    #[serde(rename = "tool_error")]
    ToolError,
    /// A client session began.
    #[serde(rename = "session_start")]
    SessionStart,
    /// A client session ended.
    #[serde(rename = "session_end")]
    SessionEnd,
    /// A producer-defined event.
    #[serde(rename = "custom")]
    Custom,
    /// A generic error report.
    #[serde(rename = "error")]
    Error,
}

impl EventKind {
    /// All kinds, in wire order.
    pub const ALL: [Self; 6] = [
        Self::ToolCall,
        Self::ToolError,
        Self::SessionStart,
        Self::SessionEnd,
        Self::Custom,
        Self::Error,
    ];

    /// Converts this kind to its wire string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ToolCall => "tool_call",
            Self::ToolError => "tool_error",
            Self::SessionStart => "session_start",
            Self::SessionEnd => "session_end",
            Self::Custom => "custom",
            Self::Error => "error",
        }
    }
}

impl FromStr for EventKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tool_call" => Ok(Self::ToolCall),
            "tool_error" => Ok(Self::ToolError),
            "session_start" => Ok(Self::SessionStart),
            "session_end" => Ok(Self::SessionEnd),
            "custom" => Ok(Self::Custom),
            "error" => Ok(Self::Error),
            _ => Err(DomainError::InvalidEventKind(s.to_string())),
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
