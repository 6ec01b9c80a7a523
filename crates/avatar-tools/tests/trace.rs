use std::cell::RefCell;
use std::rc::Rc;

use avatar_core::{Blackboard, NodeId, Scope, Status};
use avatar_tools::{emit, TraceEvent, TraceLog, TraceSink, TRACE_LOG, TRACE_SINK};

#[derive(Clone, Default)]
struct RcSink(Rc<RefCell<Vec<TraceEvent>>>);

impl TraceSink for RcSink {
    fn emit(&mut self, event: TraceEvent) {
        self.0.borrow_mut().push(event);
    }
}

#[test]
fn emit_writes_to_trace_log_when_present() {
    let node = NodeId::new();
    let mut bb = Blackboard::new();
    bb.set_handle(TRACE_LOG, TraceLog::default(), Scope::Global);

    emit(
        &mut bb,
        TraceEvent::new(1, "bt.close")
            .with_node(node)
            .with_status(Status::Success),
    );

    let log = bb.handle(TRACE_LOG, Scope::Global).unwrap();
    assert_eq!(log.events.len(), 1);
    assert_eq!(log.events[0].tick, 1);
    assert_eq!(log.events[0].tag, "bt.close");
    assert_eq!(log.events[0].node, Some(node));
    assert_eq!(log.events[0].status, Some(Status::Success));
    assert_eq!(log.tagged("bt.open").count(), 0);
}

#[test]
fn emit_writes_to_both_log_and_sink_when_both_present() {
    let mut bb = Blackboard::new();
    bb.set_handle(TRACE_LOG, TraceLog::default(), Scope::Global);

    let handle = RcSink::default();
    let shared = handle.0.clone();
    bb.set_handle(TRACE_SINK, Box::new(handle) as Box<dyn TraceSink>, Scope::Global);

    emit(&mut bb, TraceEvent::new(3, "both"));

    let log = bb.handle(TRACE_LOG, Scope::Global).unwrap();
    assert_eq!(log.tagged("both").count(), 1);

    let events = shared.borrow();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].tag, "both");
}

#[test]
fn emit_without_receivers_is_a_no_op() {
    let mut bb = Blackboard::new();
    emit(&mut bb, TraceEvent::new(0, "nobody"));
    assert!(!bb.contains_handle(TRACE_LOG, Scope::Global));
}
