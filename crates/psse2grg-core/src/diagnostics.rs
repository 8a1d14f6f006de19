//! Diagnostics collected while translating a network.
//!
//! Data-quality problems never stop a translation pass. Each one is recorded
//! here with a [`Category`] so callers (and the CLI) can report them after
//! the output is produced.
//!
//! # Example
//!
//! ```
//! use psse2grg_core::diagnostics::{Category, Diagnostics};
//!
//! let mut diag = Diagnostics::new();
//! diag.add_warning_with_entity(
//!     Category::MultipleMembership,
//!     "component is in multiple areas, only area 1 will be used",
//!     "load_3",
//! );
//!
//! assert_eq!(diag.warning_count(), 1);
//! assert_eq!(diag.error_count(), 0);
//! ```

use serde::Serialize;

/// Severity level for diagnostic issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Translation continued with a documented fallback
    Warning,
    /// A structural defect (only produced by document validation)
    Error,
}

/// What kind of problem an issue describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// A record references an area/zone/owner that is not in its table
    Reference,
    /// A component is listed in several areas/zones, or more than four owners
    MultipleMembership,
    /// Several hierarchical buses collapsed onto one flat bus
    BusMerge,
    /// Merged buses disagree on area, zone, owner or base voltage
    InconsistentMerge,
    /// An explicit bus type annotation overrides the derived type
    BusTypeOverride,
    /// A shunt with variable admittance has no flat counterpart
    VariableShunt,
    /// A transformer has no tap position in the starting point mapping
    MissingTapPosition,
    /// An optional subtype could not be omitted
    Subtype,
    /// Structural problems found by document validation
    Structure,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Reference => "reference",
            Category::MultipleMembership => "multiple_membership",
            Category::BusMerge => "bus_merge",
            Category::InconsistentMerge => "inconsistent_merge",
            Category::BusTypeOverride => "bus_type_override",
            Category::VariableShunt => "variable_shunt",
            Category::MissingTapPosition => "missing_tap_position",
            Category::Subtype => "subtype",
            Category::Structure => "structure",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single diagnostic issue encountered during a translation
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticIssue {
    pub severity: Severity,
    pub category: Category,
    pub message: String,
    /// Optional entity reference (e.g., "bus_03", "Bus 14")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
}

impl DiagnosticIssue {
    pub fn new(severity: Severity, category: Category, message: impl Into<String>) -> Self {
        Self {
            severity,
            category,
            message: message.into(),
            entity: None,
        }
    }

    /// Add entity reference to the issue
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }
}

impl std::fmt::Display for DiagnosticIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let severity = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };

        write!(f, "[{}:{}] {}", severity, self.category, self.message)?;

        if let Some(entity) = &self.entity {
            write!(f, " ({})", entity)?;
        }

        Ok(())
    }
}

/// Collection of diagnostic issues for one translation pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<DiagnosticIssue>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_warning(&mut self, category: Category, message: impl Into<String>) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Warning, category, message));
    }

    pub fn add_warning_with_entity(
        &mut self,
        category: Category,
        message: impl Into<String>,
        entity: impl Into<String>,
    ) {
        self.issues.push(
            DiagnosticIssue::new(Severity::Warning, category, message).with_entity(entity),
        );
    }

    pub fn add_error_with_entity(
        &mut self,
        category: Category,
        message: impl Into<String>,
        entity: impl Into<String>,
    ) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Error, category, message).with_entity(entity));
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count()
    }

    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    /// Get issues filtered by category
    pub fn issues_by_category(
        &self,
        category: Category,
    ) -> impl Iterator<Item = &DiagnosticIssue> + '_ {
        self.issues.iter().filter(move |i| i.category == category)
    }

    pub fn errors(&self) -> impl Iterator<Item = &DiagnosticIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    pub fn merge(&mut self, other: Diagnostics) {
        self.issues.extend(other.issues);
    }

    pub fn summary(&self) -> String {
        let warnings = self.warning_count();
        let errors = self.error_count();

        match (warnings, errors) {
            (0, 0) => "No issues".to_string(),
            (w, 0) => format!("{} warning{}", w, if w == 1 { "" } else { "s" }),
            (0, e) => format!("{} error{}", e, if e == 1 { "" } else { "s" }),
            (w, e) => format!(
                "{} warning{}, {} error{}",
                w,
                if w == 1 { "" } else { "s" },
                e,
                if e == 1 { "" } else { "s" }
            ),
        }
    }
}

impl std::fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Diagnostics: {}", self.summary())?;
        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }
        Ok(())
    }
}

/// Output of a translation call together with the warnings it produced.
#[derive(Debug, Clone)]
pub struct Translation<T> {
    pub value: T,
    pub diagnostics: Diagnostics,
}

impl<T> Translation<T> {
    pub fn new(value: T, diagnostics: Diagnostics) -> Self {
        Self { value, diagnostics }
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostics_counts() {
        let mut diag = Diagnostics::new();
        diag.add_warning(Category::BusMerge, "merging 2 buses into 1");
        diag.add_error_with_entity(Category::Structure, "dangling link", "load_1");
        diag.add_warning(Category::VariableShunt, "skipping shunt");

        assert_eq!(diag.warning_count(), 2);
        assert_eq!(diag.error_count(), 1);
        assert!(diag.has_errors());
    }

    #[test]
    fn test_diagnostics_serialization() {
        let mut diag = Diagnostics::new();
        diag.add_warning_with_entity(Category::MultipleMembership, "two areas", "bus_1");

        let json = serde_json::to_string_pretty(&diag).unwrap();
        assert!(json.contains("\"warning\""));
        assert!(json.contains("\"multiple_membership\""));
        assert!(json.contains("\"entity\": \"bus_1\""));
    }

    #[test]
    fn test_diagnostic_issue_display() {
        let issue = DiagnosticIssue::new(Severity::Warning, Category::InconsistentMerge, "areas differ")
            .with_entity("bus 14");

        let display = format!("{}", issue);
        assert_eq!(display, "[warning:inconsistent_merge] areas differ (bus 14)");
    }

    #[test]
    fn test_diagnostics_summary() {
        let mut diag = Diagnostics::new();
        assert_eq!(diag.summary(), "No issues");

        diag.add_warning(Category::Reference, "warning");
        assert_eq!(diag.summary(), "1 warning");

        diag.add_error_with_entity(Category::Structure, "error", "x");
        assert_eq!(diag.summary(), "1 warning, 1 error");
    }

    #[test]
    fn test_issues_by_category_and_merge() {
        let mut first = Diagnostics::new();
        first.add_warning(Category::Reference, "area 9 missing");

        let mut second = Diagnostics::new();
        second.add_warning(Category::Reference, "zone 7 missing");
        second.add_warning(Category::BusMerge, "merge");

        first.merge(second);
        assert_eq!(first.issues_by_category(Category::Reference).count(), 2);
        assert_eq!(first.warning_count(), 3);
    }
}
