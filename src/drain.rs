//! Drain protocol: consume a traversal one element at a time.
//!
//! Each round is `hasNext` then `next`, both deferred; the handler runs
//! between rounds and its completion gates the next `hasNext`. Elements
//! are therefore delivered strictly in order, never concurrently. The
//! first error from the engine or from the handler aborts the drain and
//! is returned unchanged. While the drain runs the cursor is `Draining`,
//! so a second drain or any other call through it is refused. Either way
//! the cursor ends `Exhausted`.

use async_trait::async_trait;
use std::future::Future;
use tracing::debug;

use crate::dispatch::{FromValue, RemoteObject};
use crate::handle::Traversal;
use crate::Result;

/// Receives drained elements in order.
#[async_trait]
pub trait ElementHandler<T: Send + 'static>: Send {
    async fn handle(&mut self, element: T) -> Result<()>;
}

#[async_trait]
impl<T, F, Fut> ElementHandler<T> for F
where
    T: Send + 'static,
    F: FnMut(T) -> Fut + Send,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    async fn handle(&mut self, element: T) -> Result<()> {
        (self)(element).await
    }
}

/// Drain `traversal` into `handler`. Returns the number of elements
/// delivered.
pub async fn drain<T, H>(traversal: &Traversal, handler: &mut H) -> Result<usize>
where
    T: FromValue + Send + 'static,
    H: ElementHandler<T> + ?Sized,
{
    traversal.begin_drain()?;
    let result = pump(traversal, handler).await;
    traversal.exhaust();
    match &result {
        Ok(n) => debug!(traversal = %traversal.object_ref(), delivered = n, "traversal drained"),
        Err(e) => debug!(traversal = %traversal.object_ref(), error = %e, "drain aborted"),
    }
    result
}

async fn pump<T, H>(traversal: &Traversal, handler: &mut H) -> Result<usize>
where
    T: FromValue + Send + 'static,
    H: ElementHandler<T> + ?Sized,
{
    let mut delivered = 0;
    while traversal.owned_call_async::<bool>("hasNext").await? {
        let element: T = traversal.owned_call_async("next").await?;
        handler.handle(element).await?;
        delivered += 1;
    }
    Ok(delivered)
}

/// Drain with a closure.
pub async fn for_each<T, F, Fut>(traversal: &Traversal, mut f: F) -> Result<usize>
where
    T: FromValue + Send + 'static,
    F: FnMut(T) -> Fut + Send,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    drain(traversal, &mut f).await
}

/// Blocking form of [`for_each`] with a synchronous closure.
pub fn for_each_blocking<T, F>(traversal: &Traversal, mut f: F) -> Result<usize>
where
    T: FromValue + Send + 'static,
    F: FnMut(T) -> Result<()> + Send,
{
    futures::executor::block_on(for_each(traversal, |element: T| std::future::ready(f(element))))
}

/// Drain every element into a vector.
pub async fn collect<T: FromValue + Send + 'static>(traversal: &Traversal) -> Result<Vec<T>> {
    let mut items = Vec::new();
    for_each(traversal, |element: T| {
        items.push(element);
        std::future::ready(Ok(()))
    })
    .await?;
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::Handle;
    use crate::model::{ObjectRef, Value};
    use crate::remote::{Args, Callback, RemoteFault, RemoteRuntime, RuntimeRef};
    use crate::{CursorState, Error};
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    /// Yields `items` in order from a single traversal object; records
    /// every method called.
    struct ListRuntime {
        items: Mutex<Vec<Value>>,
        calls: Mutex<Vec<String>>,
    }

    impl ListRuntime {
        fn new(items: Vec<Value>) -> Arc<Self> {
            Arc::new(Self { items: Mutex::new(items), calls: Mutex::new(Vec::new()) })
        }
    }

    impl RemoteRuntime for ListRuntime {
        fn invoke(&self, _: &ObjectRef, method: &str, _: Args, callback: Callback) {
            self.calls.lock().push(method.to_owned());
            let mut items = self.items.lock();
            let outcome = match method {
                "hasNext" => Ok(Value::Bool(!items.is_empty())),
                "next" if items.is_empty() => Err(RemoteFault::invocation("NoSuchElementException", "empty")),
                "next" => Ok(items.remove(0)),
                "toList" => Ok(Value::List(items.drain(..).collect())),
                "iterate" => {
                    items.clear();
                    Ok(Value::Null)
                }
                _ => Err(RemoteFault::invocation("NoSuchMethodException", method)),
            };
            drop(items);
            callback(outcome);
        }
    }

    fn traversal(rt: &Arc<ListRuntime>) -> Traversal {
        let runtime: RuntimeRef = rt.clone();
        Traversal::from_handle(Handle::new(ObjectRef::new(5, "DefaultTraversal"), runtime))
    }

    #[tokio::test]
    async fn test_delivers_in_order() {
        let rt = ListRuntime::new(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        let t = traversal(&rt);
        let seen: Vec<i64> = collect(&t).await.unwrap();
        assert_eq!(seen, vec![1, 2, 3]);
        assert_eq!(t.state(), CursorState::Exhausted);
        assert_eq!(
            *rt.calls.lock(),
            vec!["hasNext", "next", "hasNext", "next", "hasNext", "next", "hasNext"]
        );
    }

    #[tokio::test]
    async fn test_handler_error_aborts() {
        let rt = ListRuntime::new(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        let t = traversal(&rt);
        let mut seen = Vec::new();
        let err = for_each(&t, |n: i64| {
            seen.push(n);
            std::future::ready(if n == 2 { Err(Error::Config("stop".into())) } else { Ok(()) })
        })
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Config(ref m) if m == "stop"));
        assert_eq!(seen, vec![1, 2]);
        assert!(t.is_exhausted());
        // The third element was never requested.
        assert_eq!(rt.items.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_second_drain_is_misuse() {
        let rt = ListRuntime::new(vec![Value::Int(1)]);
        let t = traversal(&rt);
        assert_eq!(collect::<i64>(&t).await.unwrap(), vec![1]);
        let calls_before = rt.calls.lock().len();
        let err = collect::<i64>(&t).await.unwrap_err();
        assert!(matches!(err, Error::IteratorExhaustedMisuse(_)));
        assert_eq!(rt.calls.lock().len(), calls_before);
    }

    #[tokio::test]
    async fn test_unawaited_to_list_exhausts() {
        let rt = ListRuntime::new(vec![Value::Int(1), Value::Int(2)]);
        let t = traversal(&rt);
        drop(t.to_list_async());
        assert!(t.is_exhausted());
        let err = collect::<i64>(&t).await.unwrap_err();
        assert!(matches!(err, Error::IteratorExhaustedMisuse(_)));
        assert!(matches!(t.iterate_async().await, Err(Error::IteratorExhaustedMisuse(_))));
        assert_eq!(*rt.calls.lock(), vec!["toList"]);
    }

    #[tokio::test]
    async fn test_concurrent_drains_one_wins() {
        let rt = ListRuntime::new(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        let t = traversal(&rt);
        let (a, b) = futures::join!(collect::<i64>(&t), collect::<i64>(&t));
        let (won, lost) = if a.is_ok() { (a, b) } else { (b, a) };
        assert_eq!(won.unwrap(), vec![1, 2, 3]);
        assert!(matches!(lost, Err(Error::IteratorExhaustedMisuse(_))));
        assert!(t.is_exhausted());
        assert_eq!(rt.calls.lock().iter().filter(|m| *m == "next").count(), 3);
    }

    #[tokio::test]
    async fn test_calls_refused_while_draining() {
        let rt = ListRuntime::new(vec![Value::Int(1), Value::Int(2)]);
        let t = traversal(&rt);
        let other = t.clone();
        let mut observed = Vec::new();
        let n = for_each(&t, |_: i64| {
            observed.push((other.state(), other.has_next().is_err()));
            std::future::ready(Ok(()))
        })
        .await
        .unwrap();
        assert_eq!(n, 2);
        assert_eq!(observed, vec![(CursorState::Draining, true); 2]);
        assert_eq!(rt.calls.lock().len(), 5);
    }

    #[tokio::test]
    async fn test_empty_traversal_never_calls_handler() {
        let rt = ListRuntime::new(Vec::new());
        let t = traversal(&rt);
        let mut calls = 0;
        let n = for_each(&t, |_: Value| {
            calls += 1;
            std::future::ready(Ok(()))
        })
        .await
        .unwrap();
        assert_eq!((n, calls), (0, 0));
        assert!(t.is_exhausted());
    }

    #[test]
    fn test_blocking_form() {
        let rt = ListRuntime::new(vec![Value::from("a"), Value::from("b")]);
        let t = traversal(&rt);
        let mut joined = String::new();
        let n = for_each_blocking(&t, |s: String| {
            joined.push_str(&s);
            Ok(())
        })
        .unwrap();
        assert_eq!(n, 2);
        assert_eq!(joined, "ab");
    }

    struct Counter(usize);

    #[async_trait]
    impl ElementHandler<Value> for Counter {
        async fn handle(&mut self, _: Value) -> Result<()> {
            self.0 += 1;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_struct_handler() {
        let rt = ListRuntime::new(vec![Value::Null, Value::Bool(true)]);
        let t = traversal(&rt);
        let mut counter = Counter(0);
        assert_eq!(drain(&t, &mut counter).await.unwrap(), 2);
        assert_eq!(counter.0, 2);
    }
}
