use super::*;
use crate::Computed;
use futures::{executor::block_on, stream};

#[test]
fn changes_yields_published_values() {
    let x = Observable::new(0);
    let s = changes(&x);
    x.set(1);
    x.set(1);
    x.set(2);
    drop(x);
    assert_eq!(block_on(s.collect::<Vec<_>>()), [1, 2]);
}

#[test]
fn drop_unsubscribes() {
    let x = Observable::new(0);
    let s = changes(&x);
    assert_eq!(x.subscriber_count(), 1);
    drop(s);
    assert_eq!(x.subscriber_count(), 0);
    x.set(1);
}

#[test]
fn changes_of_computed() {
    let x = Observable::new(1);
    let y = Computed::new({
        let x = x.clone();
        move || x.get() * 10
    });
    let s = changes(&y);
    x.set(2);
    x.set(3);
    drop((x, y));
    assert_eq!(block_on(s.collect::<Vec<_>>()), [20, 30]);
}

#[test]
fn feed_sets_each_item() {
    let x = Observable::new(0);
    let seen = changes(&x);
    let count = block_on(feed(&x, stream::iter([1, 2, 2, 3])));
    assert_eq!(count, 4);
    assert_eq!(x.get(), 3);
    drop(x);
    assert_eq!(block_on(seen.collect::<Vec<_>>()), [1, 2, 3]);
}
