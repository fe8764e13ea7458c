//! Sink groups (spec §3, §4.5): fan a value to every child sink, grounded on
//! `reactor.hpp`'s `SinkGroup`.

use futures_util::future::{join_all, LocalBoxFuture};

/// A synchronous sink: consumes a value, does not itself gate upstream
/// demand.
pub trait SyncSink<T> {
    fn call(&mut self, value: &T);
}

impl<T, F: FnMut(&T) + 'static> SyncSink<T> for F {
    fn call(&mut self, value: &T) {
        self(value)
    }
}

/// Fans a value to every child sink in declaration order; returns only after
/// all children return (spec §4.5).
pub struct SyncGroup<T> {
    children: Vec<Box<dyn SyncSink<T>>>,
}

impl<T> SyncGroup<T> {
    pub fn new(children: Vec<Box<dyn SyncSink<T>>>) -> Self {
        SyncGroup { children }
    }

    pub fn dispatch(&mut self, value: &T) {
        for child in self.children.iter_mut() {
            child.call(value);
        }
    }
}

/// An async sink with its own completion token, collapsed into the returned
/// `bool` of an awaited call (spec §3 `completion_token`).
pub trait AsyncSink<T> {
    fn call<'a>(&'a mut self, value: &'a T) -> LocalBoxFuture<'a, bool>;
}

/// Broadcasting sink group: fans a value to every still-active child. A
/// child that returns `false` stops receiving further values but doesn't
/// end the group — the group keeps dispatching to the rest until every
/// child has dropped out (spec §4.5, §8 property 5: "waits for the
/// slowest child").
pub struct Broadcaster<T> {
    children: Vec<Box<dyn AsyncSink<T>>>,
    active: Vec<bool>,
}

impl<T> Broadcaster<T> {
    pub fn new(children: Vec<Box<dyn AsyncSink<T>>>) -> Self {
        let active = vec![true; children.len()];
        Broadcaster { children, active }
    }

    pub async fn dispatch(&mut self, value: &T) -> bool {
        let mut indices = Vec::new();
        let mut futures = Vec::new();
        for (i, child) in self.children.iter_mut().enumerate() {
            if self.active[i] {
                indices.push(i);
                futures.push(child.call(value));
            }
        }

        let results = join_all(futures).await;
        for (idx, demand_next) in indices.into_iter().zip(results) {
            if !demand_next {
                self.active[idx] = false;
            }
        }

        self.active.iter().any(|&a| a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct CountingSink {
        seen: Rc<RefCell<Vec<i32>>>,
        stop_after: usize,
    }

    impl AsyncSink<i32> for CountingSink {
        fn call<'a>(&'a mut self, value: &'a i32) -> LocalBoxFuture<'a, bool> {
            Box::pin(async move {
                self.seen.borrow_mut().push(*value);
                self.seen.borrow().len() < self.stop_after
            })
        }
    }

    #[tokio::test]
    async fn broadcaster_waits_for_slowest_child() {
        // S5: one sink stops after 1, the other after 6.
        let fast_seen = Rc::new(RefCell::new(Vec::new()));
        let slow_seen = Rc::new(RefCell::new(Vec::new()));

        let mut group = Broadcaster::new(vec![
            Box::new(CountingSink {
                seen: slow_seen.clone(),
                stop_after: 1,
            }),
            Box::new(CountingSink {
                seen: fast_seen.clone(),
                stop_after: 6,
            }),
        ]);

        let mut asked = 0;
        for v in 1..=10 {
            asked += 1;
            if !group.dispatch(&v).await {
                break;
            }
        }

        assert_eq!(asked, 6);
        assert_eq!(slow_seen.borrow().len(), 1);
        assert_eq!(fast_seen.borrow().len(), 6);
    }
}
