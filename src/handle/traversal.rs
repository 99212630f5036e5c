//! Traversal handles and their cursor.
//!
//! A remote traversal is consumed by its terminal calls. The caller side
//! tracks that with a [`CursorState`] shared by every `Traversal` value
//! that names the same remote object. `to_list` and `iterate` exhaust the
//! cursor as they send their call. A drain holds it `Draining` until it
//! finishes or fails, then leaves it `Exhausted`. A call through a cursor
//! that is not `Active` fails with [`Error::IteratorExhaustedMisuse`].

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::dispatch::{invoke_blocking, invoke_deferred, Deferred, FromValue, RemoteObject};
use crate::model::{ObjectRef, Value};
use crate::remote::{Args, RuntimeRef};
use crate::{args, Error, Result};

use super::Handle;

/// Blocking and deferred step methods for any type with `step` and
/// `step_async`.
macro_rules! traversal_steps {
    () => {
        $crate::handle::traversal::traversal_steps! { @emit
            /// Property values under `keys`; all values when empty.
            values / values_async => "values"(keys: &[&str]);
            /// Property objects under `keys`; all when empty.
            properties / properties_async => "properties"(keys: &[&str]);
            id / id_async => "id"();
            label / label_async => "label"();
            /// Keep elements whose `key` holds a value equal to `value`.
            has / has_async => "has"(key: &str, value: impl Into<$crate::model::Value>);
            /// Keep elements that have `key` at all.
            has_key / has_key_async => "has"(key: &str);
            has_label / has_label_async => "hasLabel"(labels: &[&str]);
            has_not / has_not_async => "hasNot"(key: &str);
            has_id / has_id_async => "hasId"(ids: impl Into<$crate::model::Value>);
            /// Keep elements for which the lambda is truthy. The lambda
            /// receives a traverser; `get()` yields the element.
            filter / filter_async => "filter"(predicate: &$crate::handle::Lambda);
            /// Replace each element with the lambda's result.
            map / map_async => "map"(function: &$crate::handle::Lambda);
            /// Route each element to the `option` whose key equals the
            /// lambda's result. The lambda receives the element itself.
            choose / choose_async => "choose"(function: &$crate::handle::Lambda);
            out / out_async => "out"(labels: &[&str]);
            in_ / in_async => "in"(labels: &[&str]);
            both / both_async => "both"(labels: &[&str]);
            out_e / out_e_async => "outE"(labels: &[&str]);
            in_e / in_e_async => "inE"(labels: &[&str]);
            both_e / both_e_async => "bothE"(labels: &[&str]);
            out_v / out_v_async => "outV"();
            in_v / in_v_async => "inV"();
            both_v / both_v_async => "bothV"();
            dedup / dedup_async => "dedup"();
            limit / limit_async => "limit"(n: i64);
            count / count_async => "count"();
            fold / fold_async => "fold"();
            identity / identity_async => "identity"();
        }
    };
    (@emit $(
        $(#[$meta:meta])*
        $name:ident / $async_name:ident => $remote:literal ( $($arg:ident : $ty:ty),* ) ;
    )*) => {
        $(
            $(#[$meta])*
            pub fn $name(&self $(, $arg: $ty)*) -> $crate::Result<$crate::handle::Traversal> {
                self.step($remote, $crate::args![$($arg),*])
            }

            $(#[$meta])*
            pub fn $async_name(&self $(, $arg: $ty)*) -> $crate::dispatch::Deferred<$crate::handle::Traversal> {
                self.step_async($remote, $crate::args![$($arg),*])
            }
        )*
    };
}

pub(crate) use traversal_steps;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    Active,
    /// Owned by one drain; every other call is refused.
    Draining,
    /// Terminal. Reached on the first exhaustion signal or first error.
    Exhausted,
}

#[derive(Debug)]
struct Cursor {
    state: Mutex<CursorState>,
}

/// A stateful, consumable remote traversal.
#[derive(Clone)]
pub struct Traversal {
    handle: Handle,
    cursor: Arc<Cursor>,
}

impl Traversal {
    /// Wrap a handle with a fresh `Active` cursor.
    pub fn from_handle(handle: Handle) -> Self {
        Self { handle, cursor: Arc::new(Cursor { state: Mutex::new(CursorState::Active) }) }
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    pub fn state(&self) -> CursorState {
        *self.cursor.state.lock()
    }

    pub fn is_exhausted(&self) -> bool {
        self.state() == CursorState::Exhausted
    }

    pub(crate) fn exhaust(&self) {
        *self.cursor.state.lock() = CursorState::Exhausted;
    }

    /// Move an `Active` cursor to `next` under the lock.
    fn claim(&self, next: CursorState) -> Result<()> {
        let mut state = self.cursor.state.lock();
        match *state {
            CursorState::Active => {
                *state = next;
                Ok(())
            }
            CursorState::Draining | CursorState::Exhausted => {
                Err(Error::IteratorExhaustedMisuse(self.object_ref().clone()))
            }
        }
    }

    pub(crate) fn begin_drain(&self) -> Result<()> {
        self.claim(CursorState::Draining)
    }

    // The cursor's owner calls through these; they skip `check_usable`.

    fn owned_call<T: FromValue>(&self, method: &str) -> Result<T> {
        let value = invoke_blocking(self.runtime(), self.object_ref(), method, args![])?;
        T::from_value(value, self.runtime())
    }

    pub(crate) fn owned_call_async<T: FromValue + Send + 'static>(&self, method: &str) -> Deferred<T> {
        let runtime = self.runtime().clone();
        let pending = invoke_deferred(&runtime, self.object_ref(), method, args![]);
        pending.and_then(move |value| T::from_value(value, &runtime))
    }

    /// Steps return the traversal they were called on; keep one cursor
    /// for one remote object.
    fn derive(&self, handle: Handle) -> Traversal {
        if handle == self.handle {
            self.clone()
        } else {
            Traversal::from_handle(handle)
        }
    }

    // ========================================================================
    // Steps
    // ========================================================================

    /// Append any step by name.
    pub fn step(&self, method: &str, args: Args) -> Result<Traversal> {
        let handle: Handle = self.call_as(method, args)?;
        Ok(self.derive(handle))
    }

    pub fn step_async(&self, method: &str, args: Args) -> Deferred<Traversal> {
        let this = self.clone();
        self.call_async_as::<Handle>(method, args).map(move |handle| this.derive(handle))
    }

    traversal_steps!();

    /// Add a branch to the preceding `choose`.
    pub fn option(&self, key: impl Into<Value>, branch: &Traversal) -> Result<Traversal> {
        self.step("option", args![key, branch])
    }

    pub fn option_async(&self, key: impl Into<Value>, branch: &Traversal) -> Deferred<Traversal> {
        self.step_async("option", args![key, branch])
    }

    // ========================================================================
    // Terminals
    // ========================================================================

    pub fn has_next(&self) -> Result<bool> {
        self.call_as("hasNext", args![])
    }

    pub fn has_next_async(&self) -> Deferred<bool> {
        self.call_async_as("hasNext", args![])
    }

    pub fn next(&self) -> Result<Value> {
        self.next_as()
    }

    pub fn next_async(&self) -> Deferred<Value> {
        self.next_async_as()
    }

    pub fn next_as<T: FromValue>(&self) -> Result<T> {
        self.call_as("next", args![])
    }

    pub fn next_async_as<T: FromValue + Send + 'static>(&self) -> Deferred<T> {
        self.call_async_as("next", args![])
    }

    /// Materialize every remaining result. Exhausts the cursor.
    pub fn to_list(&self) -> Result<Vec<Value>> {
        self.to_list_as()
    }

    pub fn to_list_async(&self) -> Deferred<Vec<Value>> {
        self.to_list_async_as()
    }

    pub fn to_list_as<T: FromValue>(&self) -> Result<Vec<T>> {
        self.claim(CursorState::Exhausted)?;
        self.owned_call("toList")
    }

    /// The cursor is exhausted once this returns, awaited or not.
    pub fn to_list_async_as<T: FromValue + Send + 'static>(&self) -> Deferred<Vec<T>> {
        match self.claim(CursorState::Exhausted) {
            Ok(()) => self.owned_call_async("toList"),
            Err(e) => Deferred::failed(e),
        }
    }

    /// Run for side effects only. Exhausts the cursor.
    pub fn iterate(&self) -> Result<()> {
        self.claim(CursorState::Exhausted)?;
        self.owned_call("iterate")
    }

    pub fn iterate_async(&self) -> Deferred<()> {
        match self.claim(CursorState::Exhausted) {
            Ok(()) => self.owned_call_async("iterate"),
            Err(e) => Deferred::failed(e),
        }
    }
}

impl RemoteObject for Traversal {
    fn object_ref(&self) -> &ObjectRef {
        self.handle.object_ref()
    }

    fn runtime(&self) -> &RuntimeRef {
        self.handle.runtime()
    }

    fn check_usable(&self) -> Result<()> {
        match self.state() {
            CursorState::Active => Ok(()),
            CursorState::Draining | CursorState::Exhausted => {
                Err(Error::IteratorExhaustedMisuse(self.object_ref().clone()))
            }
        }
    }
}

impl FromValue for Traversal {
    fn from_value(value: Value, runtime: &RuntimeRef) -> Result<Self> {
        Handle::from_value(value, runtime).map(Traversal::from_handle)
    }
}

impl From<&Traversal> for Value {
    fn from(traversal: &Traversal) -> Self {
        Value::from(&traversal.handle)
    }
}

impl PartialEq for Traversal {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl fmt::Debug for Traversal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Traversal({}, {:?})", self.object_ref(), self.state())
    }
}
