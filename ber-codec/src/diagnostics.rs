//! Severity and the per-call diagnostic log
//!
//! Each encode or decode call starts from [`Severity::Success`] with an empty
//! log. Every logged entry upgrades the severity to [`Severity::Error`]; it
//! is never downgraded within the call. Entries are mirrored to the `log`
//! facade at `warn` level.

use crate::ber::types::{BerTag, BerTagClass, universal};
use crate::category::MemberInfo;
use ber_core::BerResult;
use std::fmt;

/// Worst diagnostic level observed during one call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    #[default]
    Success,
    Error,
}

/// One diagnostic message with the tag context it was raised in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub class: BerTagClass,
    pub number: u32,
    pub name: Option<String>,
    pub index: Option<usize>,
    pub message: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} {}]", self.class, self.number)?;
        if let Some(name) = &self.name {
            write!(f, " {}", name)?;
        }
        if let Some(index) = self.index {
            write!(f, " #{}", index)?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Severity and log of one encode or decode call
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    severity: Severity,
    entries: Vec<LogEntry>,
    fatal_logged: bool,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear the state for a new call
    pub fn reset(&mut self) {
        self.severity = Severity::Success;
        self.entries = Vec::new();
        self.fatal_logged = false;
    }

    /// Append a message and return the upgraded severity
    pub fn log_message(
        &mut self,
        text: impl Into<String>,
        class: BerTagClass,
        number: u32,
        name: Option<&str>,
        index: Option<usize>,
    ) -> Severity {
        let entry = LogEntry {
            class,
            number,
            name: name.map(str::to_owned),
            index,
            message: text.into(),
        };
        log::warn!("{}", entry);
        self.entries.push(entry);
        self.severity = self.severity.max(Severity::Error);
        self.severity
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn messages(&self) -> &[LogEntry] {
        &self.entries
    }

    /// All entries, one per line
    pub fn logged_messages(&self) -> String {
        self.entries
            .iter()
            .map(LogEntry::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn error_count(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn log_at(&mut self, location: &Location, text: impl Into<String>) -> Severity {
        self.log_message(
            text,
            location.class,
            location.number,
            location.name,
            location.index,
        )
    }

    /// Log a recoverable error and continue, or log a fatal error once and
    /// propagate it
    pub(crate) fn absorb(&mut self, location: &Location, result: BerResult<()>) -> BerResult<()> {
        match result {
            Ok(()) => Ok(()),
            Err(error) if !error.is_fatal() => {
                self.log_at(location, error.to_string());
                Ok(())
            }
            Err(error) => {
                if !self.fatal_logged {
                    self.fatal_logged = true;
                    self.log_at(location, error.to_string());
                }
                Err(error)
            }
        }
    }
}

/// Tag context of the value being processed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Location {
    pub class: BerTagClass,
    pub number: u32,
    pub name: Option<&'static str>,
    pub index: Option<usize>,
}

impl Location {
    pub fn universal(number: u32) -> Self {
        Self {
            class: BerTagClass::Universal,
            number,
            name: None,
            index: None,
        }
    }

    pub fn from_tag(tag: &BerTag) -> Self {
        Self {
            class: tag.class(),
            number: tag.number(),
            name: None,
            index: None,
        }
    }

    pub fn member(info: &MemberInfo) -> Self {
        Self {
            class: info.class,
            number: info.number,
            name: Some(info.name),
            index: None,
        }
    }

    /// Element `index` of a SEQUENCE OF
    pub fn element(index: usize) -> Self {
        Self {
            index: Some(index),
            ..Self::universal(universal::SEQUENCE)
        }
    }
}
