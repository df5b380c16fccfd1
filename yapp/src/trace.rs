//! Bitmask-gated debug trace.
//!
//! Each trace line belongs to one category ([`TraceFlags`]); the parser only
//! formats a line when its category is enabled, and hands it to a
//! [`TraceSink`]. The default sink forwards to the `log` facade.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::str::FromStr;
use thiserror::Error;

/// Categories of trace output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TraceFlags(u8);

impl TraceFlags {
    pub const NONE: Self = Self(0);
    /// Token fetches.
    pub const TOKEN: Self = Self(0x01);
    /// State entry.
    pub const STATE: Self = Self(0x02);
    /// Shift, reduce, accept and abort.
    pub const ACTION: Self = Self(0x04);
    /// Stack contents.
    pub const STACK: Self = Self(0x08);
    /// Error-recovery phases.
    pub const RECOVERY: Self = Self(0x10);
    pub const ALL: Self = Self(0x1f);

    const NAMES: [(&'static str, TraceFlags); 5] = [
        ("token", Self::TOKEN),
        ("state", Self::STATE),
        ("action", Self::ACTION),
        ("stack", Self::STACK),
        ("recovery", Self::RECOVERY),
    ];

    /// Builds flags from raw bits, dropping unknown ones.
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & Self::ALL.0)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for TraceFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for TraceFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for TraceFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let names: Vec<&str> = Self::NAMES
            .iter()
            .filter(|(_, flag)| self.contains(*flag))
            .map(|(name, _)| *name)
            .collect();
        f.write_str(&names.join(","))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid trace flags {0:?}")]
pub struct TraceFlagsError(pub std::string::String);

impl FromStr for TraceFlags {
    type Err = TraceFlagsError;

    /// Accepts a decimal or `0x` hexadecimal bitmask, or a comma separated
    /// list of category names (`token`, `state`, `action`, `stack`,
    /// `recovery`, `all`, `none`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let err = || TraceFlagsError(s.into());
        if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            return u8::from_str_radix(hex, 16).map(Self::from_bits).map_err(|_| err());
        }
        if s.bytes().all(|b| b.is_ascii_digit()) && !s.is_empty() {
            return s.parse::<u8>().map(Self::from_bits).map_err(|_| err());
        }
        let mut flags = Self::NONE;
        for name in s.split(',').map(str::trim) {
            flags |= match name.to_ascii_lowercase().as_str() {
                "all" => Self::ALL,
                "none" => Self::NONE,
                other => Self::NAMES
                    .iter()
                    .find(|(n, _)| *n == other)
                    .map(|(_, flag)| *flag)
                    .ok_or_else(err)?,
            };
        }
        Ok(flags)
    }
}

/// Receiver of trace lines.
pub trait TraceSink {
    fn trace(&mut self, flag: TraceFlags, line: &str);
}

/// Forwards trace lines to `log::trace!` under the `yapp::trace` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl TraceSink for LogSink {
    fn trace(&mut self, flag: TraceFlags, line: &str) {
        log::trace!(target: "yapp::trace", "[{}] {}", flag, line);
    }
}

/// Collects lines, for golden-trace comparisons.
impl TraceSink for Vec<std::string::String> {
    fn trace(&mut self, _flag: TraceFlags, line: &str) {
        self.push(line.into());
    }
}
