//! Predicate constructors and combinators.

use std::fmt;
use std::sync::Arc;

use gripe_types::{Complaint, Severity};

/// A pure boolean test over one complaint.
///
/// Cheap to clone; combinators wrap their operands, so nesting is unbounded
/// and the engine never special-cases any of them.
#[derive(Clone)]
pub struct Predicate(Arc<dyn Fn(&Complaint) -> bool + Send + Sync>);

impl Predicate {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Complaint) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Matches every complaint.
    pub fn always() -> Self {
        Self::new(|_| true)
    }

    #[inline]
    pub fn matches(&self, complaint: &Complaint) -> bool {
        (self.0)(complaint)
    }

    pub fn and(self, other: Predicate) -> Self {
        all_of(vec![self, other])
    }

    pub fn or(self, other: Predicate) -> Self {
        any_of(vec![self, other])
    }

    pub fn negate(self) -> Self {
        negate(self)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate(..)")
    }
}

pub fn severity_is(severity: Severity) -> Predicate {
    Predicate::new(move |c| c.severity == severity)
}

pub fn project_is(project: impl Into<String>) -> Predicate {
    let project = project.into();
    Predicate::new(move |c| c.project_name == project)
}

/// Unresolved means no resolution timestamp is present.
pub fn unresolved() -> Predicate {
    Predicate::new(|c| !c.is_resolved())
}

/// Case-insensitive substring match over the eight text fields
/// (`Complaint::text_fields`). Any single field containing the query is a match.
pub fn text_contains(query: impl AsRef<str>) -> Predicate {
    let needle = query.as_ref().to_lowercase();
    Predicate::new(move |c| {
        c.text_fields()
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    })
}

/// True when every operand is true. Empty input matches everything.
pub fn all_of(predicates: Vec<Predicate>) -> Predicate {
    Predicate::new(move |c| predicates.iter().all(|p| p.matches(c)))
}

/// True when any operand is true. Empty input matches nothing.
pub fn any_of(predicates: Vec<Predicate>) -> Predicate {
    Predicate::new(move |c| predicates.iter().any(|p| p.matches(c)))
}

pub fn negate(predicate: Predicate) -> Predicate {
    Predicate::new(move |c| !predicate.matches(c))
}
