//! Request, response and diagnostic types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Correlates a request with its eventual response.
///
/// Monotonically increasing, unique per coordinator.
pub type RequestId = u64;

// =============================================================================
// Requests
// =============================================================================

/// Compile options carried by every compile request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileFlags {
    pub target: String,
    pub stop_after_resolve: bool,
}

impl Default for CompileFlags {
    fn default() -> Self {
        Self {
            target: "js".to_string(),
            stop_after_resolve: true,
        }
    }
}

/// A request as held by the coordinator (before input resolution).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Compile {
        id: RequestId,
        inputs: Vec<PathBuf>,
        flags: CompileFlags,
    },
    TooltipQuery {
        id: RequestId,
        source: String,
        line: u32,
        column: u32,
    },
}

impl Request {
    pub fn id(&self) -> RequestId {
        match self {
            Self::Compile { id, .. } | Self::TooltipQuery { id, .. } => *id,
        }
    }

    pub fn kind(&self) -> RequestKind {
        match self {
            Self::Compile { .. } => RequestKind::Compile,
            Self::TooltipQuery { .. } => RequestKind::TooltipQuery,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Compile,
    TooltipQuery,
}

impl RequestKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Compile => "compile",
            Self::TooltipQuery => "tooltip-query",
        }
    }
}

/// A compile input resolved to its contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Input {
    pub name: String,
    pub contents: String,
}

/// Request payload as written to the worker.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum WireRequest<'a> {
    Compile {
        id: RequestId,
        target: &'a str,
        inputs: Vec<Input>,
        #[serde(rename = "stopAfterResolve")]
        stop_after_resolve: bool,
    },
    TooltipQuery {
        id: RequestId,
        source: &'a str,
        line: u32,
        column: u32,
    },
}

// =============================================================================
// Responses
// =============================================================================

/// Response read from the worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Response {
    Compile(CompileResult),
    TooltipQuery(TooltipResult),
}

impl Response {
    pub fn id(&self) -> RequestId {
        match self {
            Self::Compile(result) => result.id,
            Self::TooltipQuery(result) => result.id,
        }
    }

    pub fn kind(&self) -> RequestKind {
        match self {
            Self::Compile(_) => RequestKind::Compile,
            Self::TooltipQuery(_) => RequestKind::TooltipQuery,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileResult {
    pub id: RequestId,
    pub log: CompileLog,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileLog {
    #[serde(default)]
    pub diagnostics: Vec<Diagnostic>,
}

impl CompileLog {
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.kind == DiagnosticKind::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.kind == DiagnosticKind::Warning)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TooltipResult {
    pub id: RequestId,
    #[serde(default)]
    pub range: Option<Range>,
    #[serde(default)]
    pub tooltip: Option<String>,
}

// =============================================================================
// Diagnostics
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticKind {
    Error,
    Warning,
}

impl DiagnosticKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub text: String,
    pub range: Range,
}

/// Source span, 0-based line/column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub source: String,
    pub start: Position,
    pub end: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}
