//! Bridge between a frame-driven tree and work that finishes on its own schedule.
//!
//! The firing tick spawns the future and returns `Running`; the result comes back through a
//! oneshot channel that later ticks poll without blocking. Every open and close bumps an
//! activation epoch and drops the pending receiver, so a late result can never be applied to a
//! newer activation.

use futures::channel::oneshot;
use futures::future::BoxFuture;
use futures::task::SpawnExt;

use avatar_core::{BbKey, NodeId, Status};

use crate::node::{Category, Node, NodeMeta};
use crate::node_meta;
use crate::tick::Tick;

pub const DEFAULT_STATUS_KEY: &str = "async_status";
pub const RESULT_STATUS_KEY: &str = "async_result_status";
pub const ERROR_KEY: &str = "async_error";
const EPOCH_KEY: &str = "async_epoch";

type Delivery<O> = (u64, anyhow::Result<O>);

struct Pending<O> {
    epoch: u64,
    receiver: oneshot::Receiver<Delivery<O>>,
}

fn pending_key<O: 'static>() -> BbKey<Pending<O>> {
    BbKey::new("asyncPending")
}

fn output_key<O: 'static>() -> BbKey<O> {
    BbKey::new("asyncOutput")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsyncState {
    Idle,
    Processing,
    Completed,
    Failed,
}

impl AsyncState {
    pub fn as_str(self) -> &'static str {
        match self {
            AsyncState::Idle => "idle",
            AsyncState::Processing => "processing",
            AsyncState::Completed => "completed",
            AsyncState::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "idle" => Some(AsyncState::Idle),
            "processing" => Some(AsyncState::Processing),
            "completed" => Some(AsyncState::Completed),
            "failed" => Some(AsyncState::Failed),
            _ => None,
        }
    }
}

/// The two halves of an asynchronous leaf.
pub trait AsyncTask: 'static {
    type Output: Send + 'static;

    /// Reads inputs and builds the operation. `None` means the preconditions are not met and the
    /// node fails without firing anything.
    fn start(
        &self,
        tick: &mut Tick<'_>,
        node: NodeId,
    ) -> Option<BoxFuture<'static, anyhow::Result<Self::Output>>>;

    /// Applies a successful result on the tick that observes it.
    fn complete(&self, tick: &mut Tick<'_>, node: NodeId, output: Self::Output) -> Status;
}

pub struct AsyncAction<T: AsyncTask> {
    meta: NodeMeta,
    task: T,
    status_key: String,
}

impl<T: AsyncTask> AsyncAction<T> {
    pub fn new(name: &'static str, task: T) -> Self {
        Self {
            meta: NodeMeta::new(Category::Action, name),
            task,
            status_key: DEFAULT_STATUS_KEY.to_string(),
        }
    }

    pub fn with_status_key(mut self, key: impl Into<String>) -> Self {
        self.status_key = key.into();
        self
    }

    pub fn status_key(&self) -> &str {
        &self.status_key
    }

    pub fn task(&self) -> &T {
        &self.task
    }

    pub fn state(&self, tick: &Tick<'_>) -> AsyncState {
        tick.node_get(self.id(), &self.status_key)
            .and_then(|v| v.as_str())
            .and_then(AsyncState::parse)
            .unwrap_or(AsyncState::Idle)
    }

    fn set_state(&self, tick: &mut Tick<'_>, state: AsyncState) {
        tick.node_set(self.id(), &self.status_key, state.as_str());
    }

    fn epoch(&self, tick: &Tick<'_>) -> u64 {
        tick.node_get(self.id(), EPOCH_KEY)
            .and_then(|v| v.as_u64())
            .unwrap_or(0)
    }

    /// Starts a new activation: later deliveries for the old one are ignored.
    fn reset(&self, tick: &mut Tick<'_>) {
        let id = self.id();
        let epoch = self.epoch(tick) + 1;
        tick.node_set(id, EPOCH_KEY, epoch);

        let scope = tick.node_scope(id);
        let in_flight = tick
            .blackboard_mut()
            .take_handle(pending_key::<T::Output>(), scope)
            .is_some();
        if in_flight {
            tracing::debug!(node = %self.meta.title, "abandoning in-flight operation");
        }
        tick.blackboard_mut()
            .take_handle(output_key::<T::Output>(), scope);
        self.set_state(tick, AsyncState::Idle);
    }

    /// Applies any out-of-band transition (processing -> completed/failed) and returns the state.
    fn poll(&self, tick: &mut Tick<'_>) -> AsyncState {
        let state = self.state(tick);
        if state != AsyncState::Processing {
            return state;
        }

        let id = self.id();
        let scope = tick.node_scope(id);
        let Some(mut pending) = tick
            .blackboard_mut()
            .take_handle(pending_key::<T::Output>(), scope)
        else {
            return AsyncState::Processing;
        };

        match pending.receiver.try_recv() {
            Ok(None) => {
                tick.blackboard_mut()
                    .set_handle(pending_key::<T::Output>(), pending, scope);
                AsyncState::Processing
            }
            Ok(Some((epoch, _))) if epoch != self.epoch(tick) || epoch != pending.epoch => {
                tracing::debug!(node = %self.meta.title, epoch, "discarding stale result");
                self.set_state(tick, AsyncState::Idle);
                AsyncState::Idle
            }
            Ok(Some((_, Ok(output)))) => {
                tick.blackboard_mut()
                    .set_handle(output_key::<T::Output>(), output, scope);
                self.set_state(tick, AsyncState::Completed);
                AsyncState::Completed
            }
            Ok(Some((_, Err(err)))) => {
                tracing::warn!(node = %self.meta.title, error = %err, "async operation failed");
                tick.node_set(id, ERROR_KEY, err.to_string());
                self.set_state(tick, AsyncState::Failed);
                AsyncState::Failed
            }
            Err(_canceled) => {
                tracing::warn!(node = %self.meta.title, "async operation dropped before completing");
                tick.node_set(id, ERROR_KEY, "operation dropped before completing");
                self.set_state(tick, AsyncState::Failed);
                AsyncState::Failed
            }
        }
    }

    fn fire(&self, tick: &mut Tick<'_>) -> Status {
        let id = self.id();
        let Some(operation) = self.task.start(tick, id) else {
            return Status::Failure;
        };

        let epoch = self.epoch(tick);
        let (sender, receiver) = oneshot::channel::<Delivery<T::Output>>();
        let job = async move {
            let result = operation.await;
            let _ = sender.send((epoch, result));
        };

        if let Err(err) = tick.spawner().spawn(job) {
            tracing::warn!(node = %self.meta.title, error = %err, "failed to spawn async operation");
            tick.node_set(id, ERROR_KEY, err.to_string());
            return Status::Failure;
        }

        let scope = tick.node_scope(id);
        tick.blackboard_mut()
            .set_handle(pending_key::<T::Output>(), Pending { epoch, receiver }, scope);
        tick.node_remove(id, ERROR_KEY);
        self.set_state(tick, AsyncState::Processing);
        Status::Running
    }
}

impl<T: AsyncTask> Node for AsyncAction<T> {
    node_meta!();

    fn open(&self, tick: &mut Tick<'_>) {
        self.reset(tick);
    }

    fn tick(&self, tick: &mut Tick<'_>) -> Status {
        match self.poll(tick) {
            AsyncState::Idle => self.fire(tick),
            AsyncState::Processing => Status::Running,
            AsyncState::Completed => {
                let id = self.id();
                let scope = tick.node_scope(id);
                let output = tick
                    .blackboard_mut()
                    .take_handle(output_key::<T::Output>(), scope);
                let status = match output {
                    Some(output) => self.task.complete(tick, id, output),
                    None => tick
                        .node_get(id, RESULT_STATUS_KEY)
                        .and_then(|v| v.as_u64())
                        .and_then(|code| Status::from_code(code as u8))
                        .unwrap_or(Status::Success),
                };
                tick.node_set(id, RESULT_STATUS_KEY, status.code());
                self.set_state(tick, AsyncState::Idle);
                status
            }
            AsyncState::Failed => {
                self.set_state(tick, AsyncState::Idle);
                Status::Failure
            }
        }
    }

    fn close(&self, tick: &mut Tick<'_>) {
        self.reset(tick);
    }
}
