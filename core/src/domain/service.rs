//! Service record domain model.

use serde::{Deserialize, Serialize};

use super::recognition::{classify, RecognitionRule};

/// One observed service binding, as reported by the services endpoint.
///
/// Only `port` and `status` are guaranteed. Every other field is `None` when
/// the backend could not determine it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceRecord {
    /// The port number; identifies the record within one snapshot.
    pub port: u16,
    /// Listening state (e.g. "LISTEN", "Open").
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_address: Option<String>,
    #[serde(default, rename = "fd", skip_serializing_if = "Option::is_none")]
    pub file_descriptor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(default, rename = "size_off", skip_serializing_if = "Option::is_none")]
    pub size_or_offset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_line: Option<String>,
    #[serde(default, rename = "exe_path", skip_serializing_if = "Option::is_none")]
    pub executable_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, rename = "ppid", skip_serializing_if = "Option::is_none")]
    pub parent_pid: Option<u32>,
}

impl ServiceRecord {
    /// Create a record with only the required fields set.
    pub fn new(port: u16, status: impl Into<String>) -> Self {
        Self {
            port,
            status: status.into(),
            process: None,
            pid: None,
            user: None,
            protocol: None,
            local_address: None,
            file_descriptor: None,
            type_field: None,
            device: None,
            size_or_offset: None,
            node: None,
            command_line: None,
            executable_path: None,
            start_time: None,
            parent_pid: None,
        }
    }

    /// Set the process name.
    pub fn with_process(mut self, process: impl Into<String>) -> Self {
        self.process = Some(process.into());
        self
    }

    /// Set the command line.
    pub fn with_command_line(mut self, command_line: impl Into<String>) -> Self {
        self.command_line = Some(command_line.into());
        self
    }

    /// Set the process ID.
    pub fn with_pid(mut self, pid: u32) -> Self {
        self.pid = Some(pid);
        self
    }

    /// Set the owning user.
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// The first recognition rule matching this record, if any.
    pub fn recognized(&self) -> Option<&'static RecognitionRule> {
        classify(self)
    }

    /// Present fields as `(wire name, rendered value)` pairs, in wire order.
    ///
    /// Used by detail views; absent fields are left out rather than shown empty.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let mut out = vec![
            ("port", self.port.to_string()),
            ("status", self.status.clone()),
        ];
        let optional: [(&'static str, Option<String>); 14] = [
            ("process", self.process.clone()),
            ("pid", self.pid.map(|p| p.to_string())),
            ("user", self.user.clone()),
            ("protocol", self.protocol.clone()),
            ("local_address", self.local_address.clone()),
            ("fd", self.file_descriptor.clone()),
            ("type_field", self.type_field.clone()),
            ("device", self.device.clone()),
            ("size_off", self.size_or_offset.clone()),
            ("node", self.node.clone()),
            ("command_line", self.command_line.clone()),
            ("exe_path", self.executable_path.clone()),
            ("start_time", self.start_time.clone()),
            ("ppid", self.parent_pid.map(|p| p.to_string())),
        ];
        out.extend(
            optional
                .into_iter()
                .filter_map(|(name, value)| value.map(|v| (name, v))),
        );
        out
    }
}

impl std::fmt::Display for ServiceRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            ":{} {} ({})",
            self.port,
            self.process.as_deref().unwrap_or("unknown"),
            self.status
        )
    }
}
