//! Ordering of service listings.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::ServiceRecord;

/// Field a listing can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    Port,
    Status,
    Process,
    Pid,
    User,
    CommandLine,
    StartTime,
    /// Derived: whether the record matches a recognition rule.
    Recognized,
}

impl SortField {
    /// All sortable fields, in menu order.
    pub const ALL: [SortField; 8] = [
        SortField::Port,
        SortField::Status,
        SortField::Process,
        SortField::Pid,
        SortField::User,
        SortField::CommandLine,
        SortField::StartTime,
        SortField::Recognized,
    ];

    /// Name used on the wire (`sort_by` query parameter) and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Port => "port",
            SortField::Status => "status",
            SortField::Process => "process",
            SortField::Pid => "pid",
            SortField::User => "user",
            SortField::CommandLine => "command_line",
            SortField::StartTime => "start_time",
            SortField::Recognized => "recognized",
        }
    }

    /// Get the display name for this field.
    pub fn display_name(&self) -> &'static str {
        match self {
            SortField::Port => "Port",
            SortField::Status => "Status",
            SortField::Process => "Process",
            SortField::Pid => "PID",
            SortField::User => "User",
            SortField::CommandLine => "Command",
            SortField::StartTime => "Started Time",
            SortField::Recognized => "Recognized Service",
        }
    }
}

impl std::fmt::Display for SortField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortField::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| format!("unknown sort field: {s}"))
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SortDirection {
    #[default]
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        }
    }
}

impl std::str::FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" | "ascending" => Ok(SortDirection::Ascending),
            "desc" | "descending" => Ok(SortDirection::Descending),
            other => Err(format!("unknown sort direction: {other}")),
        }
    }
}

/// A sort field together with its direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    pub fn ascending(field: SortField) -> Self {
        Self::new(field, SortDirection::Ascending)
    }

    pub fn descending(field: SortField) -> Self {
        Self::new(field, SortDirection::Descending)
    }

    /// Compare two records under this spec.
    ///
    /// `Descending` is the ascending comparison reversed, so equal keys stay
    /// equal and a stable sort keeps their original order in both directions.
    pub fn compare(&self, a: &ServiceRecord, b: &ServiceRecord) -> Ordering {
        let ord = compare_ascending(self.field, a, b);
        match self.direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    }
}

/// Absent numbers sort after every present one.
fn compare_optional_number(a: Option<u32>, b: Option<u32>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Case-folded comparison with a raw-text tie-break, so "apple" < "Banana"
/// while "B" and "b" still have a fixed order. Absent values compare as "".
fn collate(a: Option<&str>, b: Option<&str>) -> Ordering {
    let a = a.unwrap_or("");
    let b = b.unwrap_or("");
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

fn compare_ascending(field: SortField, a: &ServiceRecord, b: &ServiceRecord) -> Ordering {
    match field {
        SortField::Port => a.port.cmp(&b.port),
        SortField::Pid => compare_optional_number(a.pid, b.pid),
        SortField::Status => collate(Some(&a.status), Some(&b.status)),
        SortField::Process => collate(a.process.as_deref(), b.process.as_deref()),
        SortField::User => collate(a.user.as_deref(), b.user.as_deref()),
        SortField::CommandLine => collate(a.command_line.as_deref(), b.command_line.as_deref()),
        SortField::StartTime => collate(a.start_time.as_deref(), b.start_time.as_deref()),
        SortField::Recognized => a.recognized().is_some().cmp(&b.recognized().is_some()),
    }
}

/// Return a new, stably sorted copy of `records`.
pub fn sort_services(records: &[ServiceRecord], spec: SortSpec) -> Vec<ServiceRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| spec.compare(a, b));
    sorted
}
