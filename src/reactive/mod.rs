//! Reactive Core (C5): `Mono`/`Flux` publishers, pull-style subscribers, and
//! fan-out sinks, grounded on `include/core/reactor.hpp`'s `FluxBase`/`Mono`/
//! `Flux`/`SinkGroup` templates.

pub mod sink;
pub mod source;

use futures_util::future::LocalBoxFuture;
#[cfg(test)]
use futures_util::FutureExt as _;

pub use sink::{AsyncSink, Broadcaster, SyncGroup, SyncSink};
pub use source::{FilterSource, FromFn, Generate, Just, MapSource, Range, Source};

/// Many-value publisher: owns a [`Source`] and an optional `on_finish` hook
/// fired once the source is drained (spec §3, §4.5).
pub struct Flux<S> {
    source: S,
    on_finish: Option<Box<dyn FnOnce()>>,
}

impl<S: Source> Flux<S>
where
    S::Item: 'static,
{
    pub fn new(source: S) -> Self {
        Flux {
            source,
            on_finish: None,
        }
    }

    pub fn on_finish(mut self, f: impl FnOnce() + 'static) -> Self {
        self.on_finish = Some(Box::new(f));
        self
    }

    /// Attaches a `map` adapter. Extends the chain rooted at this publisher
    /// (spec §4.5) via ownership nesting rather than a heterogeneous vector.
    pub fn map<U: 'static>(
        self,
        f: impl FnMut(S::Item) -> U + 'static,
    ) -> Flux<MapSource<S, impl FnMut(S::Item) -> U>> {
        Flux {
            source: MapSource::new(self.source, f),
            on_finish: self.on_finish,
        }
    }

    pub fn filter(
        self,
        p: impl FnMut(&S::Item) -> bool + 'static,
    ) -> Flux<FilterSource<S, impl FnMut(&S::Item) -> bool>> {
        Flux {
            source: FilterSource::new(self.source, p),
            on_finish: self.on_finish,
        }
    }

    /// Detaches the configured chain into a deferred handle that keeps the
    /// root alive until subscribed (spec §4.5 `make_lazy`).
    pub fn into_lazy(self) -> Lazy<Flux<S>> {
        Lazy(self)
    }

    /// Sync subscriber: after each delivery the publisher automatically
    /// re-demands the next value until the source signals end (spec §4.5).
    pub async fn subscribe_sync(mut self, mut consumer: impl FnMut(S::Item)) {
        while let Some(v) = self.source.next().await {
            consumer(v);
        }
        if let Some(f) = self.on_finish.take() {
            f();
        }
    }

    /// Async subscriber: `consumer` returns whether to request the next
    /// value (`true`) or stop (`false`) — the async/await collapse of the
    /// original's `completion_token` callback (spec §3, §4.5).
    pub async fn subscribe_async<'a, F>(mut self, mut consumer: F)
    where
        F: FnMut(S::Item) -> LocalBoxFuture<'a, bool> + 'a,
    {
        while let Some(v) = self.source.next().await {
            if !consumer(v).await {
                return;
            }
        }
        if let Some(f) = self.on_finish.take() {
            f();
        }
    }
}

/// Single-value publisher. Implemented over the same [`Source`] contract as
/// [`Flux`] (the `FluxBase` common base in the original source).
pub struct Mono<S>(Flux<S>);

impl<T: 'static> Mono<Just<T>> {
    pub fn just(value: T) -> Self {
        Mono(Flux::new(Just::new(value)))
    }
}

impl<T: 'static, F: FnOnce() -> T + 'static> Mono<FromFn<F>> {
    pub fn from_fn(f: F) -> Self {
        Mono(Flux::new(FromFn::new(f)))
    }
}

impl<S: Source> Mono<S>
where
    S::Item: 'static,
{
    pub fn from_source(source: S) -> Self {
        Mono(Flux::new(source))
    }

    pub fn on_finish(self, f: impl FnOnce() + 'static) -> Self {
        Mono(self.0.on_finish(f))
    }

    pub fn map<U: 'static>(
        self,
        f: impl FnMut(S::Item) -> U + 'static,
    ) -> Mono<MapSource<S, impl FnMut(S::Item) -> U>> {
        Mono(self.0.map(f))
    }

    pub fn filter(
        self,
        p: impl FnMut(&S::Item) -> bool + 'static,
    ) -> Mono<FilterSource<S, impl FnMut(&S::Item) -> bool>> {
        Mono(self.0.filter(p))
    }

    pub async fn subscribe_sync(self, consumer: impl FnMut(S::Item)) {
        self.0.subscribe_sync(consumer).await
    }

    pub async fn subscribe_async<'a, F>(self, consumer: F)
    where
        F: FnMut(S::Item) -> LocalBoxFuture<'a, bool> + 'a,
    {
        self.0.subscribe_async(consumer).await
    }

    /// Pulls the single value directly, without a subscriber closure.
    pub async fn value(mut self) -> Option<S::Item> {
        self.0.source.next().await
    }
}

/// A deferred publisher chain (spec §4.5 `make_lazy`): the root publisher
/// stays un-subscribed, and thus un-driven, until [`Lazy::subscribe_sync`] or
/// [`Lazy::subscribe_async`] is called.
pub struct Lazy<P>(P);

impl<S: Source> Lazy<Flux<S>>
where
    S::Item: 'static,
{
    pub async fn subscribe_sync(self, consumer: impl FnMut(S::Item)) {
        self.0.subscribe_sync(consumer).await
    }

    pub async fn subscribe_async<'a, F>(self, consumer: F)
    where
        F: FnMut(S::Item) -> LocalBoxFuture<'a, bool> + 'a,
    {
        self.0.subscribe_async(consumer).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[tokio::test]
    async fn map_filter_order_and_count() {
        // S4: generate ["hi", "hello"], filter(== "hi"), map(len) -> [2]
        let values = vec!["hi".to_owned(), "hello".to_owned()];
        let flux = Flux::new(Range::new(values.into_iter()))
            .filter(|v: &String| v == "hi")
            .map(|v: String| v.len());

        let collected = Rc::new(RefCell::new(Vec::new()));
        let c = collected.clone();
        flux.subscribe_sync(move |v| c.borrow_mut().push(v)).await;

        assert_eq!(*collected.borrow(), vec![2]);
    }

    #[tokio::test]
    async fn mono_just_yields_one_value() {
        let v = Mono::just(42).value().await;
        assert_eq!(v, Some(42));
    }

    #[tokio::test]
    async fn flux_on_finish_fires_once_drained() {
        let fired = Rc::new(RefCell::new(false));
        let f = fired.clone();
        let flux = Flux::new(Range::new(std::iter::empty::<i32>())).on_finish(move || {
            *f.borrow_mut() = true;
        });
        flux.subscribe_sync(|_: i32| {}).await;
        assert!(*fired.borrow());
    }

    #[tokio::test]
    async fn async_subscriber_can_stop_early() {
        let flux = Flux::new(Range::new(1..=10));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        flux.subscribe_async(move |v: i32| {
            let s = s.clone();
            async move {
                s.borrow_mut().push(v);
                v < 3
            }
            .boxed_local()
        })
        .await;
        assert_eq!(*seen.borrow(), vec![1, 2, 3]);
    }
}
