//! # Status Registry
//!
//! Immutable catalog of booking statuses and their legal successors. Built once at
//! process start, either from the standard table or from a configured override;
//! a malformed table is a [`ConfigurationError`] raised before any transition runs.

use super::rules::AutoRule;
use super::states::{BookingStatus, StatusCategory};
use crate::config::{ConfigResult, ConfigurationError};
use std::collections::{BTreeMap, BTreeSet};

/// Standard transition table for practice bookings
fn standard_transitions() -> [(BookingStatus, &'static [BookingStatus]); 11] {
    use BookingStatus::*;
    [
        (
            Scheduled,
            &[ConfirmedClient, ReminderSent, Upcoming, Cancelled, Rescheduled],
        ),
        (
            ConfirmedClient,
            &[ReminderSent, Upcoming, Cancelled, Rescheduled],
        ),
        (ReminderSent, &[Upcoming, Cancelled, Rescheduled]),
        (
            Upcoming,
            &[ClientArrived, RunningLate, InSession, NoShow, Cancelled],
        ),
        (ClientArrived, &[InSession, RunningLate]),
        (RunningLate, &[InSession, NoShow]),
        (InSession, &[Completed]),
        (Completed, &[]),
        (NoShow, &[]),
        (Cancelled, &[]),
        (Rescheduled, &[]),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRegistry {
    successors: BTreeMap<BookingStatus, BTreeSet<BookingStatus>>,
}

impl StatusRegistry {
    /// The standard booking transition table
    pub fn standard() -> Self {
        let successors = standard_transitions()
            .iter()
            .map(|(from, to)| (*from, to.iter().copied().collect()))
            .collect();
        Self { successors }
    }

    /// Build a registry from a configured `status -> [successor]` table
    pub fn from_table(table: &BTreeMap<String, Vec<String>>) -> ConfigResult<Self> {
        let mut successors = BTreeMap::new();

        for (from, targets) in table {
            let from_status = parse_status(from)?;
            let targets = targets
                .iter()
                .map(|target| parse_status(target))
                .collect::<ConfigResult<BTreeSet<_>>>()?;
            successors.insert(from_status, targets);
        }

        let registry = Self { successors };
        registry.validate()?;
        Ok(registry)
    }

    /// Check the table is complete and consistent with the automatic rules
    pub fn validate(&self) -> ConfigResult<()> {
        for status in BookingStatus::ALL {
            let Some(targets) = self.successors.get(&status) else {
                return Err(ConfigurationError::invalid_registry(format!(
                    "status '{status}' has no successor entry"
                )));
            };

            if status.is_frozen() && !targets.is_empty() {
                return Err(ConfigurationError::invalid_registry(format!(
                    "frozen status '{status}' must not have successors"
                )));
            }

            if targets.contains(&status) {
                return Err(ConfigurationError::invalid_registry(format!(
                    "status '{status}' lists itself as a successor"
                )));
            }
        }

        for rule in AutoRule::ALL {
            for &(from, to) in rule.edges() {
                if !self.allows(from, to) {
                    return Err(ConfigurationError::invalid_registry(format!(
                        "automatic rule '{}' needs edge {from} -> {to}",
                        rule.name()
                    )));
                }
            }
        }

        Ok(())
    }

    pub fn successors_of(&self, status: BookingStatus) -> &BTreeSet<BookingStatus> {
        // validate() guarantees an entry for every status; standard() is covered by tests
        static EMPTY: BTreeSet<BookingStatus> = BTreeSet::new();
        self.successors.get(&status).unwrap_or(&EMPTY)
    }

    pub fn allows(&self, from: BookingStatus, to: BookingStatus) -> bool {
        self.successors_of(from).contains(&to)
    }

    pub fn is_terminal(&self, status: BookingStatus) -> bool {
        status.is_terminal()
    }

    /// All statuses in registry order
    pub fn all_statuses(&self) -> &'static [BookingStatus] {
        &BookingStatus::ALL
    }

    pub fn category_of(&self, status: BookingStatus) -> StatusCategory {
        status.category()
    }

    pub fn label_of(&self, status: BookingStatus) -> &'static str {
        status.label()
    }

    /// Flatten back into the configuration shape
    pub fn to_table(&self) -> BTreeMap<String, Vec<String>> {
        self.successors
            .iter()
            .map(|(from, targets)| {
                (
                    from.to_string(),
                    targets.iter().map(ToString::to_string).collect(),
                )
            })
            .collect()
    }
}

impl Default for StatusRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

fn parse_status(raw: &str) -> ConfigResult<BookingStatus> {
    raw.parse::<BookingStatus>()
        .map_err(|_| ConfigurationError::invalid_registry(format!("unknown status '{raw}'")))
}
