//! Per-run counts for generation batches

use std::fmt;

use serde::Serialize;

/// How persisting one unit went
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnitOutcome {
    Created,
    Updated,
    /// Already stored with identical notes and positions
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitFailure {
    pub unit: String,
    pub error: String,
}

/// Created / updated / skipped / error counts for one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub errors: usize,
    pub failures: Vec<UnitFailure>,
}

impl BatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: UnitOutcome) {
        match outcome {
            UnitOutcome::Created => self.created += 1,
            UnitOutcome::Updated => self.updated += 1,
            UnitOutcome::Skipped => self.skipped += 1,
        }
    }

    pub fn fail(&mut self, unit: impl Into<String>, error: &dyn fmt::Display) {
        self.errors += 1;
        self.failures.push(UnitFailure {
            unit: unit.into(),
            error: error.to_string(),
        });
    }

    pub fn merge(&mut self, other: BatchReport) {
        self.created += other.created;
        self.updated += other.updated;
        self.skipped += other.skipped;
        self.errors += other.errors;
        self.failures.extend(other.failures);
    }

    pub fn total(&self) -> usize {
        self.created + self.updated + self.skipped + self.errors
    }

    pub fn is_clean(&self) -> bool {
        self.errors == 0
    }

    /// Number of units that changed the catalog
    pub fn written(&self) -> usize {
        self.created + self.updated
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "created={} updated={} skipped={} errors={}",
            self.created, self.updated, self.skipped, self.errors
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_and_display() {
        let mut report = BatchReport::new();
        report.record(UnitOutcome::Created);
        report.record(UnitOutcome::Created);
        report.record(UnitOutcome::Skipped);
        report.fail("C Major [e - g]", &"missing template");
        assert_eq!(report.to_string(), "created=2 updated=0 skipped=1 errors=1");
        assert_eq!(report.total(), 4);
        assert!(!report.is_clean());
        assert_eq!(report.failures[0].error, "missing template");
    }

    #[test]
    fn test_merge() {
        let mut a = BatchReport::new();
        a.record(UnitOutcome::Updated);
        let mut b = BatchReport::new();
        b.record(UnitOutcome::Created);
        b.fail("x", &"boom");
        a.merge(b);
        assert_eq!((a.created, a.updated, a.skipped, a.errors), (1, 1, 0, 1));
        assert_eq!(a.written(), 2);
    }
}
