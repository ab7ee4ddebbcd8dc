//! Line codec for the worker channel.

use std::path::PathBuf;

use serde_json::Value;

use super::{Input, Request, Response, WireRequest, WorkerError};

/// Encode a request as one JSON line (without the trailing newline).
///
/// Compile inputs are resolved here, so file contents reflect disk state at
/// the moment the request actually goes out.
pub fn encode_request(request: &Request) -> Result<String, WorkerError> {
    let wire = match request {
        Request::Compile { id, inputs, flags } => WireRequest::Compile {
            id: *id,
            target: &flags.target,
            inputs: resolve_inputs(inputs),
            stop_after_resolve: flags.stop_after_resolve,
        },
        Request::TooltipQuery {
            id,
            source,
            line,
            column,
        } => WireRequest::TooltipQuery {
            id: *id,
            source,
            line: *line,
            column: *column,
        },
    };
    Ok(serde_json::to_string(&wire)?)
}

/// Read each input path into a `{name, contents}` pair.
///
/// Unreadable files (deleted since the walk, not UTF-8, ...) are skipped.
pub fn resolve_inputs(paths: &[PathBuf]) -> Vec<Input> {
    paths
        .iter()
        .filter_map(|path| match std::fs::read_to_string(path) {
            Ok(contents) => Some(Input {
                name: path.to_string_lossy().into_owned(),
                contents,
            }),
            Err(e) => {
                crate::debug!("worker"; "skip unreadable input {}: {}", path.display(), e);
                None
            }
        })
        .collect()
}

/// Decode one line read from the worker.
pub fn decode_response(line: &str) -> Result<Response, WorkerError> {
    let malformed = |reason: String| WorkerError::MalformedMessage {
        line: line.to_string(),
        reason,
    };

    let value: Value = serde_json::from_str(line).map_err(|e| malformed(e.to_string()))?;
    let Some(kind) = value.get("type").and_then(Value::as_str) else {
        return Err(malformed("missing string field `type`".to_string()));
    };

    match kind {
        "compile" | "tooltip-query" => {
            serde_json::from_value(value).map_err(|e| malformed(e.to_string()))
        }
        other => Err(WorkerError::UnknownResponseKind(other.to_string())),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{CompileFlags, DiagnosticKind, Position};

    #[test]
    fn test_encode_compile_request() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("main.sk");
        std::fs::write(&file, "def main {}").unwrap();

        let request = Request::Compile {
            id: 7,
            inputs: vec![file.clone()],
            flags: CompileFlags {
                target: "js".into(),
                stop_after_resolve: true,
            },
        };
        let line = encode_request(&request).unwrap();
        assert!(!line.contains('\n'));

        let value: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "type": "compile",
                "id": 7,
                "target": "js",
                "inputs": [{ "name": file.to_string_lossy(), "contents": "def main {}" }],
                "stopAfterResolve": true,
            })
        );
    }

    #[test]
    fn test_encode_compile_skips_missing_input() {
        let dir = tempfile::TempDir::new().unwrap();
        let present = dir.path().join("a.sk");
        std::fs::write(&present, "a").unwrap();

        let request = Request::Compile {
            id: 1,
            inputs: vec![present, dir.path().join("gone.sk")],
            flags: CompileFlags::default(),
        };
        let value: Value = serde_json::from_str(&encode_request(&request).unwrap()).unwrap();
        assert_eq!(value["inputs"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_encode_tooltip_request() {
        let request = Request::TooltipQuery {
            id: 3,
            source: "src/main.sk".into(),
            line: 4,
            column: 10,
        };
        let value: Value = serde_json::from_str(&encode_request(&request).unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "type": "tooltip-query",
                "id": 3,
                "source": "src/main.sk",
                "line": 4,
                "column": 10,
            })
        );
    }

    #[test]
    fn test_decode_compile_response() {
        let line = r#"{"type":"compile","id":2,"log":{"diagnostics":[
            {"kind":"error","text":"bad","range":{"source":"a.sk","start":{"line":0,"column":1},"end":{"line":0,"column":4}}},
            {"kind":"warning","text":"meh","range":{"source":"b.sk","start":{"line":3,"column":0},"end":{"line":3,"column":2}}}
        ]}}"#
            .replace('\n', "");

        let Response::Compile(result) = decode_response(&line).unwrap() else {
            panic!("expected compile response");
        };
        assert_eq!(result.id, 2);
        assert_eq!(result.log.diagnostics.len(), 2);
        assert_eq!(result.log.errors().count(), 1);
        assert_eq!(result.log.warnings().count(), 1);
        assert_eq!(result.log.diagnostics[0].kind, DiagnosticKind::Error);
        assert_eq!(
            result.log.diagnostics[0].range.end,
            Position { line: 0, column: 4 }
        );
    }

    #[test]
    fn test_decode_tooltip_response_with_nulls() {
        let line = r#"{"type":"tooltip-query","id":9,"range":null,"tooltip":null}"#;
        let Response::TooltipQuery(result) = decode_response(line).unwrap() else {
            panic!("expected tooltip response");
        };
        assert_eq!(result.id, 9);
        assert!(result.range.is_none());
        assert!(result.tooltip.is_none());
    }

    #[test]
    fn test_decode_unknown_kind() {
        let err = decode_response(r#"{"type":"format","id":1}"#).unwrap_err();
        assert!(matches!(err, WorkerError::UnknownResponseKind(kind) if kind == "format"));
    }

    #[test]
    fn test_decode_malformed() {
        for line in [
            "not json",
            "[1,2,3]",
            r#"{"id":1}"#,
            r#"{"type":"compile","id":"one","log":{"diagnostics":[]}}"#,
            r#"{"type":"tooltip-query"}"#,
        ] {
            let err = decode_response(line).unwrap_err();
            assert!(
                matches!(err, WorkerError::MalformedMessage { .. }),
                "{line} -> {err:?}"
            );
        }
    }
}
