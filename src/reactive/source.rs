//! Publisher sources (spec §3, §4.5). `Source::next` collapses the original
//! `SourceHandler::next(consumer)` / `hasNext()` pair into one
//! `async fn next(&mut self) -> Option<T>` — the same shape as
//! `futures::Stream::poll_next`, and the natural async/await translation of
//! the design note's recommendation to use futures instead of callback
//! chains (spec §9).

use futures_util::future::LocalBoxFuture;
use futures_util::FutureExt as _;

/// A finite or infinite producer of values. `None` signals exhaustion.
pub trait Source {
    type Item;
    fn next(&mut self) -> LocalBoxFuture<'_, Option<Self::Item>>;
}

/// [`Mono`](crate::reactive::Mono) source: emits `value` once, then `None`.
pub struct Just<T> {
    value: Option<T>,
}

impl<T> Just<T> {
    pub fn new(value: T) -> Self {
        Just { value: Some(value) }
    }
}

impl<T: 'static> Source for Just<T> {
    type Item = T;

    fn next(&mut self) -> LocalBoxFuture<'_, Option<T>> {
        let value = self.value.take();
        async move { value }.boxed_local()
    }
}

/// [`Mono`](crate::reactive::Mono) source: evaluates `f` once on first
/// demand, then `None`.
pub struct FromFn<F> {
    f: Option<F>,
}

impl<F> FromFn<F> {
    pub fn new(f: F) -> Self {
        FromFn { f: Some(f) }
    }
}

impl<T: 'static, F: FnOnce() -> T + 'static> Source for FromFn<F> {
    type Item = T;

    fn next(&mut self) -> LocalBoxFuture<'_, Option<T>> {
        let f = self.f.take();
        async move { f.map(|f| f()) }.boxed_local()
    }
}

/// [`Flux`](crate::reactive::Flux) source: drains a plain iterator.
pub struct Range<I> {
    iter: I,
}

impl<I> Range<I> {
    pub fn new(iter: I) -> Self {
        Range { iter }
    }
}

impl<I: Iterator + 'static> Source for Range<I> {
    type Item = I::Item;

    fn next(&mut self) -> LocalBoxFuture<'_, Option<I::Item>> {
        let v = self.iter.next();
        async move { v }.boxed_local()
    }
}

/// [`Flux`](crate::reactive::Flux) source: `f(&mut has_next) -> T`, may clear
/// `has_next` to terminate after the value it returns (spec §4.5).
pub struct Generate<T, F> {
    f: F,
    has_next: bool,
    _marker: std::marker::PhantomData<T>,
}

impl<T, F: FnMut(&mut bool) -> T> Generate<T, F> {
    pub fn new(f: F) -> Self {
        Generate {
            f,
            has_next: true,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<T: 'static, F: FnMut(&mut bool) -> T> Source for Generate<T, F> {
    type Item = T;

    fn next(&mut self) -> LocalBoxFuture<'_, Option<T>> {
        async move {
            if !self.has_next {
                return None;
            }
            Some((self.f)(&mut self.has_next))
        }
        .boxed_local()
    }
}

/// Lazily-attached `map` operator: wraps an upstream source, transforming
/// each value as it is pulled. Owning the inner source this way is the
/// idiomatic-Rust equivalent of the original's heap-allocated adapter chain
/// rooted at the publisher (spec §3, §9) — composition, not a vector of
/// type-erased nodes.
pub struct MapSource<S, F> {
    inner: S,
    f: F,
}

impl<S, F> MapSource<S, F> {
    pub fn new(inner: S, f: F) -> Self {
        MapSource { inner, f }
    }
}

impl<U: 'static, S: Source, F: FnMut(S::Item) -> U> Source for MapSource<S, F> {
    type Item = U;

    fn next(&mut self) -> LocalBoxFuture<'_, Option<U>> {
        async move {
            let v = self.inner.next().await?;
            Some((self.f)(v))
        }
        .boxed_local()
    }
}

/// Lazily-attached `filter` operator. A dropped value re-demands upstream
/// without emitting downstream and without invoking the subscriber (spec
/// §3 invariant: "a filter may drop a value but must never synthesize one").
pub struct FilterSource<S, P> {
    inner: S,
    predicate: P,
}

impl<S, P> FilterSource<S, P> {
    pub fn new(inner: S, predicate: P) -> Self {
        FilterSource { inner, predicate }
    }
}

impl<S: Source, P: FnMut(&S::Item) -> bool> Source for FilterSource<S, P>
where
    S::Item: 'static,
{
    type Item = S::Item;

    fn next(&mut self) -> LocalBoxFuture<'_, Option<S::Item>> {
        async move {
            loop {
                match self.inner.next().await {
                    Some(v) if (self.predicate)(&v) => return Some(v),
                    Some(_) => continue,
                    None => return None,
                }
            }
        }
        .boxed_local()
    }
}
