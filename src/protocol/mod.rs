//! Worker wire protocol.
//!
//! Line-delimited JSON in both directions, one object per line:
//!
//! ```text
//! kiln  --{"type":"compile","id":1,...}------------------> worker
//! kiln  <-{"type":"compile","id":1,"log":{...}}----------- worker
//! kiln  --{"type":"tooltip-query","id":2,...}------------> worker
//! kiln  <-{"type":"tooltip-query","id":2,"range":...}----- worker
//! ```
//!
//! - `types` - in-memory requests, wire payloads, diagnostics
//! - `codec` - line encoding/decoding
//! - `error` - fatal worker channel errors

mod codec;
mod error;
mod types;

pub use codec::{decode_response, encode_request};
pub use error::{DirectoryAccessError, WorkerError};
pub use types::{
    CompileFlags, CompileLog, CompileResult, Diagnostic, DiagnosticKind, Input, Position, Range,
    Request, RequestId, RequestKind, Response, TooltipResult, WireRequest,
};
