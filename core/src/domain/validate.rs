//! Boundary validation of decoded payloads into typed service records.
//!
//! Input is an already-decoded `serde_json::Value`; output is either the full
//! typed collection or a single `ShapeMismatch` naming the first offending
//! path. Nothing is partially accepted.

use serde_json::{Map, Value};

use super::page::{PageMeta, PageRequest};
use super::ServiceRecord;
use crate::error::{Error, Result};

/// A server-driven page: the records of one slice plus its metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageEnvelope {
    pub items: Vec<ServiceRecord>,
    pub meta: PageMeta,
}

/// Validate a list payload (a bare JSON array of service objects).
pub fn validate_list(raw: &Value) -> Result<Vec<ServiceRecord>> {
    let items = raw.as_array().ok_or_else(|| Error::shape("$", "array"))?;
    items
        .iter()
        .enumerate()
        .map(|(i, item)| record_at(item, &format!("$[{i}]")))
        .collect()
}

/// Validate a single-record payload (detail view).
pub fn validate_one(raw: &Value) -> Result<ServiceRecord> {
    record_at(raw, "$")
}

/// Validate a server-driven page envelope `{data, total, page, page_size}`.
///
/// `page` and `page_size` fall back to the values that were requested when
/// the server leaves them out.
pub fn validate_page(raw: &Value, requested: PageRequest) -> Result<PageEnvelope> {
    let obj = raw.as_object().ok_or_else(|| Error::shape("$", "object"))?;
    let data = obj.get("data").ok_or_else(|| Error::shape("$.data", "array"))?;
    let items = data
        .as_array()
        .ok_or_else(|| Error::shape("$.data", "array"))?
        .iter()
        .enumerate()
        .map(|(i, item)| record_at(item, &format!("$.data[{i}]")))
        .collect::<Result<Vec<_>>>()?;

    let total = obj
        .get("total")
        .and_then(Value::as_u64)
        .ok_or_else(|| Error::shape("$.total", "non-negative integer"))?;
    let page = optional_count(obj, "page", "$")?.unwrap_or(requested.page as u64);
    let page_size = optional_count(obj, "page_size", "$")?.unwrap_or(requested.page_size as u64);

    Ok(PageEnvelope {
        items,
        meta: PageMeta {
            total: total as usize,
            page: page as usize,
            page_size: page_size as usize,
        },
    })
}

fn optional_count(obj: &Map<String, Value>, key: &str, base: &str) -> Result<Option<u64>> {
    match obj.get(key) {
        None => Ok(None),
        Some(v) => v
            .as_u64()
            .map(Some)
            .ok_or_else(|| Error::shape(format!("{base}.{key}"), "non-negative integer")),
    }
}

fn record_at(raw: &Value, path: &str) -> Result<ServiceRecord> {
    let obj = raw.as_object().ok_or_else(|| Error::shape(path, "object"))?;
    let fields = Fields { obj, path };

    let port = fields
        .required("port")?
        .as_u64()
        .and_then(|p| u16::try_from(p).ok())
        .ok_or_else(|| fields.mismatch("port", "integer port (0-65535)"))?;
    let status = fields
        .required("status")?
        .as_str()
        .ok_or_else(|| fields.mismatch("status", "string"))?
        .to_string();

    Ok(ServiceRecord {
        port,
        status,
        process: fields.string("process")?,
        pid: fields.u32("pid")?,
        user: fields.string("user")?,
        protocol: fields.string("protocol")?,
        local_address: fields.string("local_address")?,
        file_descriptor: fields.string("fd")?,
        type_field: fields.string("type_field")?,
        device: fields.string("device")?,
        size_or_offset: fields.string("size_off")?,
        node: fields.string("node")?,
        command_line: fields.string("command_line")?,
        executable_path: fields.string("exe_path")?,
        start_time: fields.string("start_time")?,
        parent_pid: fields.u32("ppid")?,
    })
}

/// Typed accessors over one JSON object. Absent optional keys are `None`;
/// a present key with the wrong type (including `null`) is a mismatch.
struct Fields<'a> {
    obj: &'a Map<String, Value>,
    path: &'a str,
}

impl Fields<'_> {
    fn mismatch(&self, key: &str, expected: &'static str) -> Error {
        Error::shape(format!("{}.{}", self.path, key), expected)
    }

    fn required(&self, key: &str) -> Result<&Value> {
        self.obj.get(key).ok_or_else(|| self.mismatch(key, "required field"))
    }

    fn string(&self, key: &str) -> Result<Option<String>> {
        match self.obj.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(self.mismatch(key, "string")),
        }
    }

    fn u32(&self, key: &str) -> Result<Option<u32>> {
        match self.obj.get(key) {
            None => Ok(None),
            Some(v) => v
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .map(Some)
                .ok_or_else(|| self.mismatch(key, "non-negative integer")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn assert_shape_error(result: Result<impl std::fmt::Debug>, expected_path: &str) {
        match result {
            Err(Error::ShapeMismatch { path, .. }) => assert_eq!(path, expected_path),
            other => panic!("expected shape mismatch at {expected_path}, got {other:?}"),
        }
    }

    #[test]
    fn test_accepts_minimal_records() {
        let raw = json!([
            {"port": 27017, "status": "LISTEN", "process": "mongod"},
            {"port": 5432, "status": "LISTEN", "command_line": "/usr/bin/postgres -D /data"}
        ]);
        let records = validate_list(&raw).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].process.as_deref(), Some("mongod"));
        assert_eq!(records[1].process, None);
        assert_eq!(
            records[1].command_line.as_deref(),
            Some("/usr/bin/postgres -D /data")
        );
    }

    #[test]
    fn test_accepts_every_field() {
        let raw = json!({
            "port": 3000, "status": "Open", "process": "node", "pid": 1234,
            "user": "dev", "protocol": "TCP", "local_address": "127.0.0.1",
            "fd": "19u", "type_field": "IPv4", "device": "0xabc", "size_off": "0t0",
            "node": "TCP", "command_line": "node server.js", "exe_path": "/usr/bin/node",
            "start_time": "Mon Jan  1 00:00:00 2024", "ppid": 1
        });
        let record = validate_one(&raw).unwrap();
        assert_eq!(record.pid, Some(1234));
        assert_eq!(record.file_descriptor.as_deref(), Some("19u"));
        assert_eq!(record.size_or_offset.as_deref(), Some("0t0"));
        assert_eq!(record.executable_path.as_deref(), Some("/usr/bin/node"));
        assert_eq!(record.parent_pid, Some(1));
        // Accepted fields are passed through unchanged.
        assert_eq!(serde_json::to_value(&record).unwrap(), raw);
    }

    #[test]
    fn test_rejects_missing_required() {
        assert_shape_error(validate_list(&json!([{"status": "LISTEN"}])), "$[0].port");
        assert_shape_error(
            validate_list(&json!([{"port": 1, "status": "LISTEN"}, {"port": 2}])),
            "$[1].status",
        );
    }

    #[test]
    fn test_rejects_wrong_types() {
        assert_shape_error(validate_one(&json!({"port": "80", "status": "LISTEN"})), "$.port");
        assert_shape_error(validate_one(&json!({"port": 80.5, "status": "LISTEN"})), "$.port");
        assert_shape_error(validate_one(&json!({"port": 70000, "status": "LISTEN"})), "$.port");
        assert_shape_error(validate_one(&json!({"port": 80, "status": 1})), "$.status");
        assert_shape_error(
            validate_one(&json!({"port": 80, "status": "LISTEN", "pid": "12"})),
            "$.pid",
        );
    }

    #[test]
    fn test_rejects_null_optional() {
        assert_shape_error(
            validate_one(&json!({"port": 80, "status": "LISTEN", "process": null})),
            "$.process",
        );
    }

    #[test]
    fn test_rejects_wrong_top_level() {
        assert_shape_error(validate_list(&json!({"port": 80, "status": "LISTEN"})), "$");
        assert_shape_error(validate_one(&json!([])), "$");
        assert_shape_error(validate_list(&json!([1, 2])), "$[0]");
    }

    #[test]
    fn test_no_partial_acceptance() {
        let raw = json!([
            {"port": 80, "status": "LISTEN"},
            {"port": 81, "status": "LISTEN", "ppid": -1}
        ]);
        assert!(validate_list(&raw).is_err());
    }

    #[test]
    fn test_ignores_unknown_fields() {
        let raw = json!([{"port": 80, "status": "LISTEN", "extra": {"nested": true}}]);
        assert_eq!(validate_list(&raw).unwrap(), vec![ServiceRecord::new(80, "LISTEN")]);
    }

    #[test]
    fn test_page_envelope() {
        let raw = json!({
            "data": [{"port": 80, "status": "LISTEN"}],
            "total": 21, "page": 2, "page_size": 20
        });
        let envelope = validate_page(&raw, PageRequest::default()).unwrap();
        assert_eq!(envelope.items.len(), 1);
        assert_eq!(
            envelope.meta,
            PageMeta {
                total: 21,
                page: 2,
                page_size: 20
            }
        );
    }

    #[test]
    fn test_page_envelope_defaults_to_request() {
        let raw = json!({"data": [], "total": 0});
        let envelope = validate_page(&raw, PageRequest::new(3, 50)).unwrap();
        assert_eq!(envelope.meta.page, 3);
        assert_eq!(envelope.meta.page_size, 50);
    }

    #[test]
    fn test_page_envelope_rejects_bad_shape() {
        assert_shape_error(validate_page(&json!([]), PageRequest::default()), "$");
        assert_shape_error(
            validate_page(&json!({"total": 1}), PageRequest::default()),
            "$.data",
        );
        assert_shape_error(
            validate_page(&json!({"data": [], "total": "1"}), PageRequest::default()),
            "$.total",
        );
        assert_shape_error(
            validate_page(
                &json!({"data": [{"port": 1}], "total": 1}),
                PageRequest::default(),
            ),
            "$.data[0].status",
        );
    }
}
