//! Recognized-service detection based on process name, command line and port.

use serde::Serialize;

use super::ServiceRecord;

/// A named classifier tagging a record with a known-software identity.
///
/// Rules are plain data plus a pure predicate, so a table of them can be
/// evaluated and tested without any rendering.
#[derive(Clone, Copy, Serialize)]
pub struct RecognitionRule {
    /// Stable short identifier (e.g. "redis").
    pub id: &'static str,
    /// Human-readable name (e.g. "Redis").
    pub label: &'static str,
    /// Display accent, carried through unchanged.
    pub color: &'static str,
    #[serde(skip)]
    pub predicate: fn(&ServiceRecord) -> bool,
}

impl RecognitionRule {
    /// Evaluate this rule against a record.
    pub fn matches(&self, record: &ServiceRecord) -> bool {
        (self.predicate)(record)
    }

    /// Return the first rule in `rules` matching `record`.
    ///
    /// Declaration order decides: a record that satisfies several predicates
    /// is tagged with the earliest one.
    pub fn first_match<'a>(
        rules: &'a [RecognitionRule],
        record: &ServiceRecord,
    ) -> Option<&'a RecognitionRule> {
        rules.iter().find(|rule| rule.matches(record))
    }
}

impl PartialEq for RecognitionRule {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for RecognitionRule {}

impl std::fmt::Debug for RecognitionRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecognitionRule")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("color", &self.color)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Display for RecognitionRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label)
    }
}

/// Case-insensitive exact match on the process name. Absent never matches.
fn process_is(record: &ServiceRecord, name: &str) -> bool {
    record
        .process
        .as_deref()
        .is_some_and(|p| p.to_lowercase() == name)
}

fn process_contains(record: &ServiceRecord, needle: &str) -> bool {
    record
        .process
        .as_deref()
        .is_some_and(|p| p.to_lowercase().contains(needle))
}

fn command_contains(record: &ServiceRecord, needle: &str) -> bool {
    record
        .command_line
        .as_deref()
        .is_some_and(|c| c.to_lowercase().contains(needle))
}

/// Built-in recognition rules, in evaluation order.
pub const RECOGNIZED_SERVICES: &[RecognitionRule] = &[
    RecognitionRule {
        id: "docker",
        label: "Docker",
        color: "#2496ed",
        predicate: |r| process_is(r, "dockerd") || command_contains(r, "docker"),
    },
    RecognitionRule {
        id: "vite",
        label: "Vite",
        color: "#646cff",
        predicate: |r| command_contains(r, "vite") || process_is(r, "vite"),
    },
    RecognitionRule {
        id: "node",
        label: "Node.js",
        color: "#43853d",
        predicate: |r| process_is(r, "node") || command_contains(r, "node"),
    },
    RecognitionRule {
        id: "mongodb",
        label: "MongoDB",
        color: "#47a248",
        predicate: |r| process_is(r, "mongod") || command_contains(r, "mongod") || r.port == 27017,
    },
    RecognitionRule {
        id: "postgres",
        label: "PostgreSQL",
        color: "#336791",
        predicate: |r| {
            process_contains(r, "postgres") || command_contains(r, "postgres") || r.port == 5432
        },
    },
    RecognitionRule {
        id: "redis",
        label: "Redis",
        color: "#d82c20",
        predicate: |r| {
            process_contains(r, "redis") || command_contains(r, "redis") || r.port == 6379
        },
    },
    RecognitionRule {
        id: "ollama",
        label: "Ollama",
        color: "#222",
        predicate: |r| process_is(r, "ollama") || command_contains(r, "ollama") || r.port == 11434,
    },
];

/// Classify a record against the built-in rule table.
///
/// # Examples
/// ```
/// use servicedash_core::{classify, ServiceRecord};
///
/// let mongo = ServiceRecord::new(27017, "LISTEN").with_process("mongod");
/// assert_eq!(classify(&mongo).map(|r| r.label), Some("MongoDB"));
///
/// let unknown = ServiceRecord::new(9999, "LISTEN");
/// assert!(classify(&unknown).is_none());
/// ```
pub fn classify(record: &ServiceRecord) -> Option<&'static RecognitionRule> {
    RecognitionRule::first_match(RECOGNIZED_SERVICES, record)
}
