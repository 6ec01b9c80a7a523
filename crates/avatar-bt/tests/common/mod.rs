#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use avatar_bt::{node_meta, Category, Node, NodeMeta, Tick};
use avatar_core::Status;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Counts {
    pub open: usize,
    pub tick: usize,
    pub close: usize,
}

#[derive(Clone, Default)]
pub struct Probe(Rc<RefCell<Counts>>);

impl Probe {
    pub fn counts(&self) -> Counts {
        *self.0.borrow()
    }

    pub fn ticks(&self) -> usize {
        self.counts().tick
    }

    pub fn opens(&self) -> usize {
        self.counts().open
    }

    pub fn closes(&self) -> usize {
        self.counts().close
    }
}

/// Leaf that returns a fixed script of statuses, repeating the last one.
pub struct Scripted {
    meta: NodeMeta,
    script: Vec<Status>,
    cursor: Cell<usize>,
    probe: Probe,
}

impl Scripted {
    pub fn new(script: &[Status]) -> (Box<dyn Node>, Probe) {
        let probe = Probe::default();
        let node = Self {
            meta: NodeMeta::new(Category::Action, "Scripted"),
            script: script.to_vec(),
            cursor: Cell::new(0),
            probe: probe.clone(),
        };
        (Box::new(node), probe)
    }

    pub fn always(status: Status) -> (Box<dyn Node>, Probe) {
        Self::new(&[status])
    }
}

impl Node for Scripted {
    node_meta!();

    fn open(&self, _tick: &mut Tick<'_>) {
        self.probe.0.borrow_mut().open += 1;
    }

    fn tick(&self, _tick: &mut Tick<'_>) -> Status {
        self.probe.0.borrow_mut().tick += 1;
        let index = self.cursor.get();
        self.cursor.set(index + 1);
        self.script
            .get(index)
            .or(self.script.last())
            .copied()
            .unwrap_or(Status::Success)
    }

    fn close(&self, _tick: &mut Tick<'_>) {
        self.probe.0.borrow_mut().close += 1;
    }
}
