//! Request Coordinator - single-concurrency worker channel
//!
//! The worker services one request at a time. The coordinator keeps exactly
//! one request in flight and at most one pending request per kind:
//!
//! ```text
//! request_compile ──┐                        ┌─> on_compile
//!                   ├─> Idle? send : pending ├
//! request_tooltip ──┘        │               └─> on_tooltip_query
//!                            v
//!                      on_response:
//!                        1. pending compile -> send it, discard response
//!                        2. pending tooltip -> send it, discard response
//!                        3. idle + deliver
//! ```
//!
//! A newer request of a kind overwrites the pending slot: only the latest
//! file set / cursor position is ever worth compiling or querying. Responses
//! that arrive while something newer is queued describe stale state and
//! never reach a handler.

#[cfg(test)]
mod tests;

use std::path::PathBuf;

use crate::protocol::{
    CompileFlags, CompileResult, Request, RequestId, RequestKind, Response, TooltipResult,
    WorkerError, decode_response,
};

/// Outbound side of the worker channel.
pub trait Transport {
    fn send(&mut self, request: &Request) -> Result<(), WorkerError>;
}

/// Receives responses that survived coalescing.
pub trait ResponseHandler {
    fn on_compile(&mut self, result: CompileResult);
    fn on_tooltip_query(&mut self, result: TooltipResult);
}

/// Worker channel state. `Awaiting` whenever a request was sent and its
/// response has not been processed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Idle,
    Awaiting { id: RequestId, kind: RequestKind },
}

/// What happened to a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseOutcome {
    /// Handed to the matching handler callback; the channel is idle.
    Delivered(RequestKind),
    /// Dropped because a pending request was sent in its place.
    Superseded { discarded: RequestId, sent: RequestId },
}

pub struct RequestCoordinator<T> {
    transport: T,
    flags: CompileFlags,
    last_id: RequestId,
    state: ChannelState,
    pending_compile: Option<Request>,
    pending_tooltip: Option<Request>,
    latest_tooltip: Option<RequestId>,
}

impl<T: Transport> RequestCoordinator<T> {
    pub fn new(transport: T, flags: CompileFlags) -> Self {
        Self {
            transport,
            flags,
            last_id: 0,
            state: ChannelState::Idle,
            pending_compile: None,
            pending_tooltip: None,
            latest_tooltip: None,
        }
    }

    /// Compile `inputs`, or queue it (replacing any queued compile) when busy.
    pub fn request_compile(&mut self, inputs: Vec<PathBuf>) -> Result<RequestId, WorkerError> {
        let id = self.next_id();
        self.submit(Request::Compile {
            id,
            inputs,
            flags: self.flags.clone(),
        })?;
        Ok(id)
    }

    /// Query the tooltip at `line`/`column` (0-based) of `source`, or queue it
    /// (replacing any queued query) when busy.
    pub fn request_tooltip(
        &mut self,
        source: impl Into<String>,
        line: u32,
        column: u32,
    ) -> Result<RequestId, WorkerError> {
        let id = self.next_id();
        self.latest_tooltip = Some(id);
        self.submit(Request::TooltipQuery {
            id,
            source: source.into(),
            line,
            column,
        })?;
        Ok(id)
    }

    /// Decode a worker line and process it as a response.
    pub fn on_response_line(
        &mut self,
        line: &str,
        handler: &mut impl ResponseHandler,
    ) -> Result<ResponseOutcome, WorkerError> {
        let response = decode_response(line)?;
        self.on_response(response, handler)
    }

    /// Process the response to the request in flight.
    pub fn on_response(
        &mut self,
        response: Response,
        handler: &mut impl ResponseHandler,
    ) -> Result<ResponseOutcome, WorkerError> {
        let ChannelState::Awaiting { id, kind } = self.state else {
            return Err(WorkerError::UnsolicitedResponse { id: response.id() });
        };
        if response.id() != id || response.kind() != kind {
            return Err(WorkerError::UnsolicitedResponse { id: response.id() });
        }

        // Compiles first: diagnostics cover more surface than a tooltip.
        let next = match self.pending_compile.take() {
            Some(request) => Some(request),
            None => self.pending_tooltip.take(),
        };
        if let Some(next) = next {
            let sent = next.id();
            crate::debug!("worker"; "discard {} #{}, sending queued {} #{}",
                kind.label(), id, next.kind().label(), sent);
            self.send(next)?;
            return Ok(ResponseOutcome::Superseded { discarded: id, sent });
        }

        self.state = ChannelState::Idle;
        match response {
            Response::Compile(result) => handler.on_compile(result),
            Response::TooltipQuery(result) => handler.on_tooltip_query(result),
        }
        Ok(ResponseOutcome::Delivered(kind))
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.state, ChannelState::Awaiting { .. })
    }

    pub fn pending_compile(&self) -> Option<&Request> {
        self.pending_compile.as_ref()
    }

    pub fn pending_tooltip(&self) -> Option<&Request> {
        self.pending_tooltip.as_ref()
    }

    /// Id of the most recently issued tooltip query.
    pub fn latest_tooltip(&self) -> Option<RequestId> {
        self.latest_tooltip
    }

    pub fn is_current_tooltip(&self, id: RequestId) -> bool {
        self.latest_tooltip == Some(id)
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    fn next_id(&mut self) -> RequestId {
        self.last_id += 1;
        self.last_id
    }

    fn submit(&mut self, request: Request) -> Result<(), WorkerError> {
        if !self.is_busy() {
            return self.send(request);
        }

        let kind = request.kind();
        let id = request.id();
        let slot = match kind {
            RequestKind::Compile => &mut self.pending_compile,
            RequestKind::TooltipQuery => &mut self.pending_tooltip,
        };
        match slot.replace(request) {
            Some(stale) => {
                crate::debug!("worker"; "queued {} #{} (replaces #{})", kind.label(), id, stale.id());
            }
            None => crate::debug!("worker"; "queued {} #{}", kind.label(), id),
        }
        Ok(())
    }

    fn send(&mut self, request: Request) -> Result<(), WorkerError> {
        self.transport.send(&request)?;
        crate::debug!("worker"; "sent {} #{}", request.kind().label(), request.id());
        self.state = ChannelState::Awaiting {
            id: request.id(),
            kind: request.kind(),
        };
        Ok(())
    }
}
