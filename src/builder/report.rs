//! Structured record of what assembly did.

use std::fmt;

use serde::Serialize;

use super::LayerKind;

/// Result of attempting one optional registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RegistrationStatus {
    /// Registered with the resolver.
    Registered,
    /// Skipped because a runtime capability is unavailable.
    SkippedMissingCapability {
        /// Missing capability name.
        capability: String,
    },
    /// Skipped because a configuration property is absent.
    SkippedMissingConfig {
        /// Missing property key.
        property: String,
    },
}

/// One registration attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationOutcome {
    /// Channel (`"sms"`, `"email"`).
    pub channel: &'static str,
    /// Implementation name.
    pub implementation: String,
    /// What happened.
    #[serde(flatten)]
    pub status: RegistrationStatus,
}

impl RegistrationOutcome {
    /// Returns true when the implementation was registered.
    pub fn is_registered(&self) -> bool {
        self.status == RegistrationStatus::Registered
    }
}

/// Pipeline composition of one channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChannelReport {
    /// Layers, outermost first.
    pub layers: Vec<LayerKind>,
    /// Implementations in resolution order.
    pub implementations: Vec<String>,
}

/// Everything assembly decided, for startup logs and `herald check`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AssemblyReport {
    /// Every attempted registration, in order.
    pub registrations: Vec<RegistrationOutcome>,
    /// SMS pipeline, when built.
    pub sms: Option<ChannelReport>,
    /// Email pipeline, when built.
    pub email: Option<ChannelReport>,
}

impl AssemblyReport {
    /// Registrations that were skipped.
    pub fn skipped(&self) -> impl Iterator<Item = &RegistrationOutcome> {
        self.registrations.iter().filter(|r| !r.is_registered())
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registered => f.write_str("registered"),
            Self::SkippedMissingCapability { capability } => {
                write!(f, "skipped (capability '{capability}' unavailable)")
            }
            Self::SkippedMissingConfig { property } => {
                write!(f, "skipped (property '{property}' not set)")
            }
        }
    }
}

impl fmt::Display for AssemblyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (channel, report) in [("sms", &self.sms), ("email", &self.email)] {
            match report {
                None => writeln!(f, "{channel}: disabled")?,
                Some(report) => {
                    let layers = report
                        .layers
                        .iter()
                        .map(ToString::to_string)
                        .chain(std::iter::once("resolver".to_owned()))
                        .collect::<Vec<_>>();
                    writeln!(f, "{channel}: {}", layers.join(" -> "))?;
                    if report.implementations.is_empty() {
                        writeln!(f, "  (no implementations)")?;
                    }
                    for (position, name) in (1_usize..).zip(&report.implementations) {
                        writeln!(f, "  {position}. {name}")?;
                    }
                }
            }
        }
        for outcome in &self.registrations {
            writeln!(
                f,
                "{}/{}: {}",
                outcome.channel, outcome.implementation, outcome.status
            )?;
        }
        Ok(())
    }
}
