//! Reference runtime: an in-memory TinkerGraph engine on a dedicated thread.
//!
//! All engine state lives on one worker thread and is never shared. Callers
//! reach it through an unbounded command channel; each invocation carries
//! its own completion callback, which the worker fires once the method has
//! run. Calls are executed strictly in the order they were issued.

mod element;
mod graph;
mod heap;
mod lambda;
mod traversal;

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::model::ObjectRef;
use crate::remote::{Args, Callback, RemoteFault, RemoteRuntime};

use super::FaultResult;

use heap::Heap;

struct Invocation {
    target: ObjectRef,
    method: String,
    args: Args,
    callback: Callback,
}

enum Command {
    Invoke(Invocation),
    Shutdown,
}

fn terminated_fault(name: &str) -> RemoteFault {
    RemoteFault::invocation("IllegalStateException", format!("runtime `{name}` has shut down"))
}

/// Handle to a running TinkerGraph engine.
pub struct TinkerRuntime {
    name: String,
    cmd_tx: mpsc::UnboundedSender<Command>,
    terminated: Arc<AtomicBool>,
    thread_id: ThreadId,
    thread_handle: Mutex<Option<JoinHandle<()>>>,
}

impl TinkerRuntime {
    /// Start the worker thread.
    pub fn spawn(name: impl Into<String>) -> crate::Result<Self> {
        let name = name.into();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<Command>();
        let terminated = Arc::new(AtomicBool::new(false));

        let thread_name = name.clone();
        let thread_handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || run_worker(&thread_name, cmd_rx))?;
        let thread_id = thread_handle.thread().id();
        debug!(runtime = %name, "tinker runtime started");

        Ok(Self {
            name,
            cmd_tx,
            terminated,
            thread_id,
            thread_handle: Mutex::new(Some(thread_handle)),
        })
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }
}

fn run_worker(name: &str, mut cmd_rx: mpsc::UnboundedReceiver<Command>) {
    let mut heap = Heap::new();
    while let Some(command) = cmd_rx.blocking_recv() {
        match command {
            Command::Invoke(Invocation { target, method, args, callback }) => {
                trace!(runtime = name, %target, method = %method, args = args.len(), "invoke");
                let result = panic::catch_unwind(AssertUnwindSafe(|| heap.dispatch(&target, &method, args)))
                    .unwrap_or_else(|_| {
                        warn!(runtime = name, %target, method = %method, "method panicked");
                        Err(RemoteFault::invocation("RuntimeException", format!("{target}.{method} panicked")))
                    });
                callback(result);
            }
            Command::Shutdown => break,
        }
    }

    // Calls that raced with shutdown still get their callback.
    cmd_rx.close();
    while let Ok(command) = cmd_rx.try_recv() {
        if let Command::Invoke(invocation) = command {
            (invocation.callback)(Err(terminated_fault(name)));
        }
    }
    let released = heap.len();
    heap.clear();
    debug!(runtime = name, released, "tinker runtime stopped");
}

impl RemoteRuntime for TinkerRuntime {
    fn invoke(&self, target: &ObjectRef, method: &str, args: Args, callback: Callback) {
        if self.is_terminated() {
            callback(Err(terminated_fault(&self.name)));
            return;
        }
        let invocation = Invocation { target: target.clone(), method: method.to_owned(), args, callback };
        if let Err(mpsc::error::SendError(command)) = self.cmd_tx.send(Command::Invoke(invocation)) {
            if let Command::Invoke(invocation) = command {
                (invocation.callback)(Err(terminated_fault(&self.name)));
            }
        }
    }

    fn shutdown(&self) {
        if self.terminated.swap(true, Ordering::SeqCst) {
            return;
        }
        let _ = self.cmd_tx.send(Command::Shutdown);
        // A callback shutting the runtime down must not join its own thread.
        if thread::current().id() == self.thread_id {
            return;
        }
        if let Some(handle) = self.thread_handle.lock().take() {
            if handle.join().is_err() {
                warn!(runtime = %self.name, "worker thread panicked");
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn on_runtime_thread(&self) -> bool {
        thread::current().id() == self.thread_id
    }
}

impl Drop for TinkerRuntime {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use crate::model::Value;
    use crate::remote::classes;
    use std::sync::mpsc as std_mpsc;
    use std::time::Duration;

    fn call(runtime: &TinkerRuntime, target: &ObjectRef, method: &str, args: Args) -> FaultResult<Value> {
        let (tx, rx) = std_mpsc::channel();
        runtime.invoke(target, method, args, Box::new(move |r| {
            let _ = tx.send(r);
        }));
        rx.recv_timeout(Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_round_trip_through_worker() {
        let runtime = TinkerRuntime::spawn("test-runtime").unwrap();
        let class = call(&runtime, &ObjectRef::runtime(), classes::IMPORT_CLASS, args![classes::TINKER_FACTORY]).unwrap();
        let graph = call(&runtime, class.as_object().unwrap(), "createClassic", args![]).unwrap();
        let text = call(&runtime, graph.as_object().unwrap(), "toString", args![]).unwrap();
        assert_eq!(text, Value::from("tinkergraph[vertices:6 edges:6]"));
    }

    #[test]
    fn test_callbacks_fire_in_issue_order() {
        let runtime = TinkerRuntime::spawn("ordering").unwrap();
        let (tx, rx) = std_mpsc::channel();
        for i in 0..50 {
            let tx = tx.clone();
            runtime.invoke(&ObjectRef::runtime(), "hashCode", args![], Box::new(move |_| {
                let _ = tx.send(i);
            }));
        }
        let order: Vec<i32> = (0..50).map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap()).collect();
        assert_eq!(order, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_invoke_after_shutdown_faults() {
        let runtime = TinkerRuntime::spawn("closed").unwrap();
        runtime.shutdown();
        runtime.shutdown();
        assert!(runtime.is_terminated());
        let err = call(&runtime, &ObjectRef::runtime(), "toString", args![]).unwrap_err();
        assert_eq!(err.class, "IllegalStateException");
    }

    #[test]
    fn test_fault_is_delivered_not_raised() {
        let runtime = TinkerRuntime::spawn("faults").unwrap();
        let err = call(&runtime, &ObjectRef::new(999, "TinkerVertex"), "id", args![]).unwrap_err();
        assert_eq!(err.class, "NoSuchObjectException");
    }
}
