// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Normalizes an org identifier into the lookup key used for team
/// resolution: trimmed and lowercased.
///
/// Every comparison between an event and an org or mapping goes through
/// this key; nothing else in the system compares raw identifiers.
#[must_use]
pub fn org_identifier_key(org_identifier: &str) -> String {
    org_identifier.trim().to_lowercase()
}

/// A validated team color in `#RGB` or `#RRGGBB` hex form.
///
/// The backend is the injection guard for downstream renderers: anything
/// not in this exact form is rejected, so consumers can interpolate the
/// value without sanitization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamColor(String);

impl TeamColor {
    /// Parses and validates a hex color string.
    ///
    /// # Errors
    ///
    /// Returns an error unless the value is `#` followed by exactly 3 or 6
    /// hexadecimal digits.
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        let trimmed: &str = value.trim();
        let Some(digits) = trimmed.strip_prefix('#') else {
            return Err(DomainError::InvalidColor(value.to_string()));
        };
        let valid_len: bool = digits.len() == 3 || digits.len() == 6;
        if !valid_len || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DomainError::InvalidColor(value.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the validated color string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TeamColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The MIME types accepted for team logos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogoMime {
    /// image/png
    Png,
    /// image/jpeg
    Jpeg,
    /// image/webp
    Webp,
}

impl LogoMime {
    /// Converts this MIME type to its wire string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Webp => "image/webp",
        }
    }
}

impl FromStr for LogoMime {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image/png" => Ok(Self::Png),
            "image/jpeg" | "image/jpg" => Ok(Self::Jpeg),
            "image/webp" => Ok(Self::Webp),
            _ => Err(DomainError::InvalidLogoMime(s.to_string())),
        }
    }
}

impl std::fmt::Display for LogoMime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
