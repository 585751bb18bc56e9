use super::*;
use crate::{getter_watcher_count, Observable};
use assert_call::{CallRecorder, call};
use std::{
    cell::Cell,
    panic::{catch_unwind, AssertUnwindSafe},
};

#[test]
fn y_is_2x() {
    let mut cr = CallRecorder::new();
    let x = Observable::new(1);
    let y = Computed::new({
        let x = x.clone();
        move || x.get() * 2
    });
    assert_eq!(y.get(), 2);
    x.set(2);
    assert_eq!(y.get(), 4);
    x.set(3);
    assert_eq!(y.get(), 6);

    let s = y.subscribe_fn(|v| call!("{v}"));
    x.set(4);
    assert_eq!(y.get(), 8);
    x.set(5);
    assert_eq!(y.get(), 10);
    cr.verify(["8", "10"]);

    drop(s);
    x.set(6);
    assert_eq!(y.get(), 12);
    cr.verify(());
}

#[test]
fn z_is_2y() {
    let mut cr = CallRecorder::new();
    let x = Observable::new(1);
    let y = Computed::new({
        let x = x.clone();
        move || x.get() * 2
    });
    let z = Computed::new({
        let y = y.clone();
        move || y.get() * 2
    });
    x.set(2);
    assert_eq!(z.get(), 8);
    x.set(3);
    assert_eq!(z.get(), 12);

    let s = z.subscribe_fn(|v| call!("{v}"));
    x.set(4);
    x.set(5);
    cr.verify(["16", "20"]);
    drop(s);
    x.set(6);
    assert_eq!(z.get(), 24);
    cr.verify(());
}

#[derive(Clone, Debug, PartialEq)]
enum Val {
    Num(i32),
    Zero,
}
impl Equate for Val {
    fn is(&self, other: &Self) -> bool {
        self == other
    }
    fn deep_eq(&self, other: &Self) -> bool {
        self == other
    }
}

#[test]
fn branches() {
    let a = Observable::new(true);
    let b = Observable::new(10);
    let c = Observable::new(20);
    let x = Observable::new(true);
    let y = Observable::new(100);
    let z = Observable::new(200);
    let val = Computed::new({
        let (a, b, c, x, y, z) = (
            a.clone(),
            b.clone(),
            c.clone(),
            x.clone(),
            y.clone(),
            z.clone(),
        );
        move || {
            if a.get() {
                Val::Num(b.get() + c.get())
            } else if x.get() {
                Val::Num(y.get() + z.get())
            } else {
                Val::Zero
            }
        }
    });
    assert_eq!(val.get(), Val::Num(30));
    assert_eq!(val.dependency_count(), 3);

    a.set(false);
    assert_eq!(val.get(), Val::Num(300));
    assert_eq!(val.dependency_count(), 4);
    assert!(!val.depends_on(&b));
    assert!(val.depends_on(&z));

    x.set(false);
    assert_eq!(val.get(), Val::Zero);
    assert_eq!(val.dependency_count(), 2);

    a.set(true);
    assert_eq!(val.get(), Val::Num(30));
    b.set(0);
    assert_eq!(val.get(), Val::Num(20));
    b.set(10);
    assert_eq!(val.get(), Val::Num(30));

    x.set(true);
    assert_eq!(val.get(), Val::Num(30));
    x.set(false);
    assert_eq!(val.get(), Val::Num(30));

    a.set(false);
    assert_eq!(val.get(), Val::Zero);
    x.set(true);
    assert_eq!(val.get(), Val::Num(300));
}

#[test]
fn shed_branch_no_longer_notifies() {
    let mut cr = CallRecorder::new();
    let a = Observable::new(true);
    let b = Observable::new(1);
    let y = Observable::new(100);
    let val = Computed::new({
        let (a, b, y) = (a.clone(), b.clone(), y.clone());
        move || if a.get() { b.get() } else { y.get() }
    });
    let _s = val.subscribe_fn(|v| call!("{v}"));
    a.set(false);
    cr.verify("100");
    assert!(!val.depends_on(&b));
    assert_eq!(b.subscriber_count(), 0);
    b.set(2);
    b.set(3);
    cr.verify(());
    y.set(101);
    cr.verify("101");
}

#[test]
fn bio() {
    let mut cr = CallRecorder::new();
    let name = Observable::new("John");
    let gender = Observable::new("male");
    let age = Observable::new(25);
    let bio = Computed::new({
        let (name, gender, age) = (name.clone(), gender.clone(), age.clone());
        move || format!("{}, {}, {} y/o", name.get(), gender.get(), age.get())
    });
    let _s = bio.subscribe_fn(|v| call!("{v}"));
    assert_eq!(bio.get(), "John, male, 25 y/o");

    name.set("Jane");
    gender.set("female");
    age.set(30);
    assert_eq!(bio.get(), "Jane, female, 30 y/o");
    cr.verify([
        "Jane, male, 25 y/o",
        "Jane, female, 25 y/o",
        "Jane, female, 30 y/o",
    ]);
}

#[test]
fn irrelevant_dependency_does_not_recompute() {
    let mut cr = CallRecorder::new();
    let x = Observable::new(false);
    let y = Observable::new(1);
    let z = Computed::new({
        let (x, y) = (x.clone(), y.clone());
        move || {
            call!("derive");
            if x.get() && y.get() > 0 {
                y.get() * 10
            } else {
                1000
            }
        }
    });
    let _s = z.subscribe_fn(|v| call!("{v}"));
    cr.verify("derive");

    y.set(2);
    y.set(3);
    assert_eq!(z.get(), 1000);
    cr.verify(());

    x.set(true);
    cr.verify(["derive", "30"]);
    y.set(4);
    cr.verify(["derive", "40"]);

    x.set(false);
    cr.verify(["derive", "1000"]);
    y.set(5);
    cr.verify(());
}

#[test]
fn lazy_until_read() {
    let mut cr = CallRecorder::new();
    let x = Observable::new(1);
    let y = Computed::new({
        let x = x.clone();
        move || {
            call!("derive");
            x.get() + 1
        }
    });
    assert!(!y.is_computed());
    x.set(2);
    cr.verify(());
    assert_eq!(y.get(), 3);
    assert_eq!(y.get(), 3);
    cr.verify("derive");
    assert!(y.is_computed());
}

#[test]
fn subscribe_triggers_first_computation() {
    let x = Observable::new(1);
    let y = Computed::new({
        let x = x.clone();
        move || x.get()
    });
    let _s = y.subscribe_fn(|_| {});
    assert!(y.is_computed());
    assert_eq!(x.subscriber_count(), 1);
}

#[test]
fn equal_result_does_not_notify() {
    let mut cr = CallRecorder::new();
    let x = Observable::new(1);
    let parity = Computed::new({
        let x = x.clone();
        move || x.get() % 2
    });
    let _s = parity.subscribe_fn(|v| call!("{v}"));
    x.set(3);
    x.set(5);
    cr.verify(());
    x.set(6);
    cr.verify("0");
}

#[test]
fn first_value_is_stored_even_if_equality_says_equal() {
    let x = Observable::new(1);
    let y = Computed::with_eq_fn(
        {
            let x = x.clone();
            move || x.get()
        },
        |_, _| true,
    );
    assert_eq!(y.get(), 1);
    x.set(2);
    assert_eq!(y.get(), 1);
}

#[test]
fn unit_value_is_computed_once() {
    let mut cr = CallRecorder::new();
    let x = Observable::new(1);
    let y = Computed::new({
        let x = x.clone();
        move || {
            x.get();
            call!("derive");
        }
    });
    y.get();
    y.get();
    cr.verify("derive");
}

#[test]
fn transitive_capture_is_shed() {
    let x = Observable::new(1);
    let y = Computed::new({
        let x = x.clone();
        move || x.get() * 2
    });
    let z = Computed::new({
        let y = y.clone();
        move || y.get() * 2
    });
    assert_eq!(z.get(), 4);
    assert_eq!(z.dependency_count(), 2);
    assert!(z.depends_on(&x));
    assert!(z.depends_on(&y));

    x.set(2);
    assert_eq!(z.get(), 8);
    assert_eq!(z.dependency_count(), 1);
    assert!(!z.depends_on(&x));
    assert_eq!(x.subscriber_count(), 1);
}

#[test]
fn one_notification_per_level() {
    let mut cr = CallRecorder::new();
    let x = Observable::new(1);
    let a = Computed::new({
        let x = x.clone();
        move || x.get() * 2
    });
    let b = Computed::new({
        let a = a.clone();
        move || a.get() + 1
    });
    let c = Computed::new({
        let b = b.clone();
        move || b.get() * 3
    });
    assert_eq!(c.get(), 9);
    let _sa = a.subscribe_fn(|v| call!("a {v}"));
    let _sb = b.subscribe_fn(|v| call!("b {v}"));
    let _sc = c.subscribe_fn(|v| call!("c {v}"));

    x.set(2);
    cr.verify(["c 15", "b 5", "a 4"]);
    assert_eq!(c.get(), (2 * 2 + 1) * 3);

    x.set(3);
    cr.verify(["c 21", "b 7", "a 6"]);
}

#[test]
fn panicking_first_computation_is_retried() {
    let x = Observable::new(0);
    let y = Computed::new({
        let x = x.clone();
        move || {
            let v = x.get();
            assert!(v != 0, "zero");
            10 / v
        }
    });
    assert!(catch_unwind(AssertUnwindSafe(|| y.get())).is_err());
    assert_eq!(getter_watcher_count(), 0);
    assert!(!y.is_computed());
    assert_eq!(y.dependency_count(), 0);

    x.set(2);
    assert_eq!(y.get(), 5);
}

#[test]
fn panicking_recomputation_keeps_last_good_state() {
    let x = Observable::new(1);
    let y = Computed::new({
        let x = x.clone();
        move || {
            let v = x.get();
            assert!(v != 0, "zero");
            10 / v
        }
    });
    assert_eq!(y.get(), 10);
    assert!(catch_unwind(AssertUnwindSafe(|| x.set(0))).is_err());
    assert_eq!(getter_watcher_count(), 0);
    assert_eq!(y.get(), 10);
    assert!(y.depends_on(&x));

    x.set(5);
    assert_eq!(y.get(), 2);
}

#[test]
fn drop_unsubscribes_from_dependencies() {
    let x = Observable::new(1);
    let y = Computed::new({
        let x = x.clone();
        move || x.get()
    });
    y.get();
    assert_eq!(x.subscriber_count(), 1);
    drop(y);
    assert_eq!(x.subscriber_count(), 0);
}

#[test]
fn recompute_count() {
    let count = Rc::new(Cell::new(0));
    let x = Observable::new(1);
    let y = Computed::new({
        let (x, count) = (x.clone(), count.clone());
        move || {
            count.set(count.get() + 1);
            x.get()
        }
    });
    y.get();
    x.set(1);
    x.set(2);
    x.set(2);
    assert_eq!(count.get(), 2);
}

#[test]
fn introspection() {
    let x = Observable::new(1);
    let y = Computed::new({
        let x = x.clone();
        move || x.get()
    });
    assert_eq!(Lookable::kind(&y), CellKind::Computed);
    assert_eq!(y.node().kind(), CellKind::Computed);
    assert_eq!(format!("{y:?}"), "<uncomputed>");
    y.get();
    assert_eq!(format!("{y:?}"), "1");
    assert!(same_node(&y.dependencies()[0], &x.node()));
}
