use std::path::PathBuf;

use super::*;
use crate::protocol::{CompileLog, TooltipResult};

#[derive(Default)]
struct RecordingTransport {
    sent: Vec<Request>,
}

impl Transport for RecordingTransport {
    fn send(&mut self, request: &Request) -> Result<(), WorkerError> {
        self.sent.push(request.clone());
        Ok(())
    }
}

struct ClosedTransport;

impl Transport for ClosedTransport {
    fn send(&mut self, _request: &Request) -> Result<(), WorkerError> {
        Err(WorkerError::ProcessFailure("worker input closed".into()))
    }
}

#[derive(Default)]
struct RecordingHandler {
    compiles: Vec<CompileResult>,
    tooltips: Vec<TooltipResult>,
}

impl ResponseHandler for RecordingHandler {
    fn on_compile(&mut self, result: CompileResult) {
        self.compiles.push(result);
    }

    fn on_tooltip_query(&mut self, result: TooltipResult) {
        self.tooltips.push(result);
    }
}

fn coordinator() -> RequestCoordinator<RecordingTransport> {
    RequestCoordinator::new(RecordingTransport::default(), CompileFlags::default())
}

fn files(names: &[&str]) -> Vec<PathBuf> {
    names.iter().map(PathBuf::from).collect()
}

/// Response matching whatever is currently in flight.
fn respond_in_flight(c: &RequestCoordinator<RecordingTransport>) -> Response {
    let ChannelState::Awaiting { id, kind } = c.state() else {
        panic!("nothing in flight");
    };
    match kind {
        RequestKind::Compile => Response::Compile(CompileResult {
            id,
            log: CompileLog::default(),
        }),
        RequestKind::TooltipQuery => Response::TooltipQuery(TooltipResult {
            id,
            range: None,
            tooltip: Some(format!("tooltip #{id}")),
        }),
    }
}

fn sent_ids(c: &RequestCoordinator<RecordingTransport>) -> Vec<RequestId> {
    c.transport().sent.iter().map(Request::id).collect()
}

#[test]
fn test_idle_request_is_sent_immediately() {
    let mut c = coordinator();
    assert!(!c.is_busy());

    let id = c.request_compile(files(&["a.sk"])).unwrap();

    assert!(c.is_busy());
    assert_eq!(sent_ids(&c), vec![id]);
    assert!(c.pending_compile().is_none());
    assert_eq!(
        c.state(),
        ChannelState::Awaiting {
            id,
            kind: RequestKind::Compile
        }
    );
}

#[test]
fn test_ids_increase_across_kinds() {
    let mut c = coordinator();
    let a = c.request_compile(files(&["a.sk"])).unwrap();
    let b = c.request_tooltip("a.sk", 0, 0).unwrap();
    let d = c.request_compile(files(&["a.sk"])).unwrap();
    assert!(a < b && b < d);
}

#[test]
fn test_at_most_one_in_flight() {
    // C = compile, T = tooltip, R = respond (if busy)
    let script = "CTCRTTRRCRCCTRRRTRCTR";

    let mut c = coordinator();
    let mut handler = RecordingHandler::default();
    let mut responses = 0;

    for op in script.chars() {
        match op {
            'C' => {
                c.request_compile(files(&["a.sk"])).unwrap();
            }
            'T' => {
                c.request_tooltip("a.sk", 1, 2).unwrap();
            }
            'R' if c.is_busy() => {
                let response = respond_in_flight(&c);
                c.on_response(response, &mut handler).unwrap();
                responses += 1;
            }
            _ => {}
        }

        let sent = c.transport().sent.len();
        let in_flight = sent - responses;
        assert!(in_flight <= 1, "{in_flight} requests in flight after `{op}`");
        assert_eq!(c.is_busy(), in_flight == 1);
    }
}

#[test]
fn test_busy_compiles_coalesce_to_latest() {
    let mut c = coordinator();
    let mut handler = RecordingHandler::default();

    let first = c.request_compile(files(&["a.sk"])).unwrap();
    let mut last = first;
    for i in 0..5 {
        last = c
            .request_compile(files(&[format!("gen{i}.sk").as_str()]))
            .unwrap();
    }
    assert_eq!(sent_ids(&c), vec![first]);
    assert_eq!(c.pending_compile().map(Request::id), Some(last));

    let outcome = c.on_response(respond_in_flight(&c), &mut handler).unwrap();
    assert_eq!(
        outcome,
        ResponseOutcome::Superseded {
            discarded: first,
            sent: last
        }
    );
    assert_eq!(sent_ids(&c), vec![first, last]);
    assert!(c.pending_compile().is_none());

    let Request::Compile { inputs, .. } = &c.transport().sent[1] else {
        panic!("expected compile");
    };
    assert_eq!(inputs, &files(&["gen4.sk"]));

    c.on_response(respond_in_flight(&c), &mut handler).unwrap();
    assert_eq!(sent_ids(&c).len(), 2);
    assert_eq!(handler.compiles.len(), 1);
    assert_eq!(handler.compiles[0].id, last);
}

#[test]
fn test_stale_compile_response_is_discarded() {
    let mut c = coordinator();
    let mut handler = RecordingHandler::default();

    c.request_compile(files(&["a.sk"])).unwrap();
    c.request_compile(files(&["a.sk", "b.sk"])).unwrap();

    c.on_response(respond_in_flight(&c), &mut handler).unwrap();

    assert!(handler.compiles.is_empty());
    assert!(handler.tooltips.is_empty());
    assert!(c.is_busy());
}

#[test]
fn test_pending_compile_takes_priority_over_tooltip() {
    let mut c = coordinator();
    let mut handler = RecordingHandler::default();

    let first = c.request_tooltip("a.sk", 0, 0).unwrap();
    let tooltip = c.request_tooltip("a.sk", 3, 4).unwrap();
    let compile = c.request_compile(files(&["a.sk"])).unwrap();

    // Tooltip response arrives: overdue compile goes first.
    let outcome = c.on_response(respond_in_flight(&c), &mut handler).unwrap();
    assert_eq!(
        outcome,
        ResponseOutcome::Superseded {
            discarded: first,
            sent: compile
        }
    );
    assert!(handler.tooltips.is_empty());
    assert_eq!(c.pending_tooltip().map(Request::id), Some(tooltip));

    // Compile response arrives: queued tooltip goes next, compile is dropped.
    let outcome = c.on_response(respond_in_flight(&c), &mut handler).unwrap();
    assert_eq!(
        outcome,
        ResponseOutcome::Superseded {
            discarded: compile,
            sent: tooltip
        }
    );
    assert!(handler.compiles.is_empty());

    let outcome = c.on_response(respond_in_flight(&c), &mut handler).unwrap();
    assert_eq!(
        outcome,
        ResponseOutcome::Delivered(RequestKind::TooltipQuery)
    );
    assert_eq!(handler.tooltips.len(), 1);
    assert_eq!(handler.tooltips[0].id, tooltip);
    assert_eq!(sent_ids(&c), vec![first, compile, tooltip]);
    assert!(!c.is_busy());
}

#[test]
fn test_delivery_routes_by_kind_and_goes_idle() {
    let mut c = coordinator();
    let mut handler = RecordingHandler::default();

    let compile = c.request_compile(files(&["a.sk"])).unwrap();
    let outcome = c.on_response(respond_in_flight(&c), &mut handler).unwrap();
    assert_eq!(outcome, ResponseOutcome::Delivered(RequestKind::Compile));
    assert_eq!(c.state(), ChannelState::Idle);

    let tooltip = c.request_tooltip("a.sk", 1, 1).unwrap();
    c.on_response(respond_in_flight(&c), &mut handler).unwrap();

    assert_eq!(handler.compiles.iter().map(|r| r.id).collect::<Vec<_>>(), vec![compile]);
    assert_eq!(handler.tooltips.iter().map(|r| r.id).collect::<Vec<_>>(), vec![tooltip]);
    assert!(!c.is_busy());
}

#[test]
fn test_latest_tooltip_tracking() {
    let mut c = coordinator();
    assert_eq!(c.latest_tooltip(), None);

    let a = c.request_tooltip("a.sk", 0, 0).unwrap();
    let b = c.request_tooltip("a.sk", 0, 5).unwrap();
    c.request_compile(files(&["a.sk"])).unwrap();

    assert_eq!(c.latest_tooltip(), Some(b));
    assert!(c.is_current_tooltip(b));
    assert!(!c.is_current_tooltip(a));
}

#[test]
fn test_response_while_idle_is_unsolicited() {
    let mut c = coordinator();
    let mut handler = RecordingHandler::default();

    let response = Response::Compile(CompileResult {
        id: 1,
        log: CompileLog::default(),
    });
    let err = c.on_response(response, &mut handler).unwrap_err();
    assert!(matches!(err, WorkerError::UnsolicitedResponse { id: 1 }));
}

#[test]
fn test_response_for_other_request_is_unsolicited() {
    let mut c = coordinator();
    let mut handler = RecordingHandler::default();

    let id = c.request_compile(files(&["a.sk"])).unwrap();
    let wrong_id = Response::Compile(CompileResult {
        id: id + 10,
        log: CompileLog::default(),
    });
    assert!(matches!(
        c.on_response(wrong_id, &mut handler),
        Err(WorkerError::UnsolicitedResponse { .. })
    ));

    let wrong_kind = Response::TooltipQuery(TooltipResult {
        id,
        range: None,
        tooltip: None,
    });
    assert!(matches!(
        c.on_response(wrong_kind, &mut handler),
        Err(WorkerError::UnsolicitedResponse { .. })
    ));
}

#[test]
fn test_response_line_decoding() {
    let mut c = coordinator();
    let mut handler = RecordingHandler::default();

    let id = c.request_compile(files(&["a.sk"])).unwrap();
    let line = format!(r#"{{"type":"compile","id":{id},"log":{{"diagnostics":[]}}}}"#);
    let outcome = c.on_response_line(&line, &mut handler).unwrap();
    assert_eq!(outcome, ResponseOutcome::Delivered(RequestKind::Compile));

    c.request_compile(files(&["a.sk"])).unwrap();
    assert!(matches!(
        c.on_response_line(r#"{"type":"lint","id":2}"#, &mut handler),
        Err(WorkerError::UnknownResponseKind(_))
    ));
    assert!(matches!(
        c.on_response_line("{oops", &mut handler),
        Err(WorkerError::MalformedMessage { .. })
    ));
}

#[test]
fn test_transport_failure_propagates() {
    let mut c = RequestCoordinator::new(ClosedTransport, CompileFlags::default());
    assert!(matches!(
        c.request_compile(files(&["a.sk"])),
        Err(WorkerError::ProcessFailure(_))
    ));
    assert!(!c.is_busy());
}

#[test]
fn test_compile_flags_are_attached() {
    let flags = CompileFlags {
        target: "c++".into(),
        stop_after_resolve: false,
    };
    let mut c = RequestCoordinator::new(RecordingTransport::default(), flags.clone());
    c.request_compile(files(&["a.sk"])).unwrap();

    let Request::Compile { flags: sent, .. } = &c.transport().sent[0] else {
        panic!("expected compile");
    };
    assert_eq!(sent, &flags);
}
