//! Dual dispatch: a blocking and a deferred form of every remote call.
//!
//! The runtime exposes one primitive, `invoke(target, method, args,
//! callback)`. Both calling conventions are derived from it here, once:
//!
//! - [`invoke_blocking`] parks the calling thread on a channel until the
//!   callback fires.
//! - [`invoke_deferred`] issues the call immediately and returns a
//!   [`Deferred`] future that resolves when the callback fires.
//!
//! [`RemoteObject`] puts both on every handle for any method name, and the
//! [`remote_methods!`](crate::remote_methods) macro declares typed pairs in
//! one line each. Arity is never special-cased: arguments pass through as
//! given.

use std::future::Future;
use std::pin::Pin;
use std::sync::mpsc as std_mpsc;
use std::task::{Context, Poll};

use futures::future::{self, BoxFuture};
use tokio::sync::oneshot;
use tracing::trace;

use crate::model::{ObjectRef, Value};
use crate::remote::{Args, FaultKind, RemoteFault, RuntimeRef};
use crate::{Error, Result};

// ============================================================================
// Fault mapping
// ============================================================================

/// Lift a runtime fault into the crate error for `target.method`.
pub fn fault_to_error(target: &ObjectRef, method: &str, fault: RemoteFault) -> Error {
    match fault.kind {
        FaultKind::ScriptCompilation => Error::LambdaCompilation {
            method: method.to_owned(),
            message: fault.message,
        },
        FaultKind::Invocation => Error::RemoteInvocation {
            target: target.clone(),
            method: method.to_owned(),
            fault,
        },
    }
}

// ============================================================================
// Deferred
// ============================================================================

/// Outcome of a remote call that has already been issued.
///
/// Dropping a `Deferred` does not cancel the call; the result is discarded.
#[must_use = "the call is already issued; await the Deferred to observe its outcome"]
pub struct Deferred<T> {
    inner: BoxFuture<'static, Result<T>>,
}

impl<T: Send + 'static> Deferred<T> {
    pub fn new(future: impl Future<Output = Result<T>> + Send + 'static) -> Self {
        Self { inner: Box::pin(future) }
    }

    /// Already resolved.
    pub fn ready(value: T) -> Self {
        Self::new(future::ready(Ok(value)))
    }

    /// Already rejected.
    pub fn failed(error: Error) -> Self {
        Self::new(future::ready(Err(error)))
    }

    pub fn map<U: Send + 'static>(self, f: impl FnOnce(T) -> U + Send + 'static) -> Deferred<U> {
        Deferred::new(async move { self.inner.await.map(f) })
    }

    pub fn and_then<U: Send + 'static>(self, f: impl FnOnce(T) -> Result<U> + Send + 'static) -> Deferred<U> {
        Deferred::new(async move { self.inner.await.and_then(f) })
    }
}

impl<T> Future for Deferred<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.as_mut().poll(cx)
    }
}

impl<T> std::fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Deferred")
    }
}

// ============================================================================
// The two conventions
// ============================================================================

/// Issue the call and return its outcome as a future.
pub fn invoke_deferred(runtime: &RuntimeRef, target: &ObjectRef, method: &str, args: Args) -> Deferred<Value> {
    trace!(%target, method, args = args.len(), "deferred call");
    let (tx, rx) = oneshot::channel();
    runtime.invoke(target, method, args, Box::new(move |outcome| {
        let _ = tx.send(outcome);
    }));

    let target = target.clone();
    let method = method.to_owned();
    Deferred::new(async move {
        match rx.await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(fault)) => Err(fault_to_error(&target, &method, fault)),
            Err(_) => Err(Error::Disconnected),
        }
    })
}

/// Issue the call and park the current thread until it completes.
pub fn invoke_blocking(runtime: &RuntimeRef, target: &ObjectRef, method: &str, args: Args) -> Result<Value> {
    if runtime.on_runtime_thread() {
        return Err(Error::BlockingOnRuntimeThread { method: method.to_owned() });
    }
    trace!(%target, method, args = args.len(), "blocking call");
    let (tx, rx) = std_mpsc::sync_channel(1);
    runtime.invoke(target, method, args, Box::new(move |outcome| {
        let _ = tx.send(outcome);
    }));

    match rx.recv() {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(fault)) => Err(fault_to_error(target, method, fault)),
        Err(_) => Err(Error::Disconnected),
    }
}

// ============================================================================
// Result conversion
// ============================================================================

/// Convert a call result into a concrete type. Handle types need the
/// runtime the value came from.
pub trait FromValue: Sized {
    fn from_value(value: Value, runtime: &RuntimeRef) -> Result<Self>;
}

fn type_error(expected: &str, got: &Value) -> Error {
    Error::TypeError { expected: expected.into(), got: got.type_name().into() }
}

impl FromValue for Value {
    fn from_value(value: Value, _: &RuntimeRef) -> Result<Self> {
        Ok(value)
    }
}

impl FromValue for () {
    fn from_value(_: Value, _: &RuntimeRef) -> Result<Self> {
        Ok(())
    }
}

impl FromValue for bool {
    fn from_value(value: Value, _: &RuntimeRef) -> Result<Self> {
        value.as_bool().ok_or_else(|| type_error("Boolean", &value))
    }
}

impl FromValue for i64 {
    fn from_value(value: Value, _: &RuntimeRef) -> Result<Self> {
        value.as_int().ok_or_else(|| type_error("Integer", &value))
    }
}

impl FromValue for f64 {
    fn from_value(value: Value, _: &RuntimeRef) -> Result<Self> {
        value.as_float().ok_or_else(|| type_error("Float", &value))
    }
}

impl FromValue for String {
    fn from_value(value: Value, _: &RuntimeRef) -> Result<Self> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(type_error("String", &other)),
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value, runtime: &RuntimeRef) -> Result<Self> {
        match value {
            Value::List(items) => items.into_iter().map(|v| T::from_value(v, runtime)).collect(),
            other => Err(type_error("List", &other)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value, runtime: &RuntimeRef) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other, runtime).map(Some),
        }
    }
}

// ============================================================================
// RemoteObject
// ============================================================================

/// Anything that names an object in a runtime. Every method of the remote
/// object is reachable through [`call`](Self::call) and
/// [`call_async`](Self::call_async).
pub trait RemoteObject {
    fn object_ref(&self) -> &ObjectRef;

    fn runtime(&self) -> &RuntimeRef;

    /// Checked before every call. Handles with local state (traversal
    /// cursors) refuse calls here.
    fn check_usable(&self) -> Result<()> {
        Ok(())
    }

    fn call(&self, method: &str, args: Args) -> Result<Value> {
        self.check_usable()?;
        invoke_blocking(self.runtime(), self.object_ref(), method, args)
    }

    fn call_async(&self, method: &str, args: Args) -> Deferred<Value> {
        if let Err(e) = self.check_usable() {
            return Deferred::failed(e);
        }
        invoke_deferred(self.runtime(), self.object_ref(), method, args)
    }

    fn call_as<T: FromValue>(&self, method: &str, args: Args) -> Result<T>
    where
        Self: Sized,
    {
        let value = self.call(method, args)?;
        T::from_value(value, self.runtime())
    }

    fn call_async_as<T: FromValue + Send + 'static>(&self, method: &str, args: Args) -> Deferred<T>
    where
        Self: Sized,
    {
        let runtime = self.runtime().clone();
        self.call_async(method, args).and_then(move |value| T::from_value(value, &runtime))
    }
}

/// Declare typed blocking/deferred method pairs on a [`RemoteObject`].
///
/// ```rust,ignore
/// remote_methods! {
///     /// The element label.
///     label / label_async => "label"() -> String;
///     value / value_async => "value"(key: &str) -> Value;
/// }
/// ```
#[macro_export]
macro_rules! remote_methods {
    ($(
        $(#[$meta:meta])*
        $name:ident / $async_name:ident => $remote:literal ( $($arg:ident : $ty:ty),* $(,)? ) -> $ret:ty ;
    )*) => {
        $(
            $(#[$meta])*
            pub fn $name(&self $(, $arg: $ty)*) -> $crate::Result<$ret> {
                $crate::dispatch::RemoteObject::call_as(self, $remote, $crate::args![$($arg),*])
            }

            $(#[$meta])*
            pub fn $async_name(&self $(, $arg: $ty)*) -> $crate::dispatch::Deferred<$ret> {
                $crate::dispatch::RemoteObject::call_async_as(self, $remote, $crate::args![$($arg),*])
            }
        )*
    };
}
