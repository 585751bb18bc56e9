//! Hooks that re-render a UI component when the cells it reads change.
//!
//! The hooks talk to the UI framework only through [`HookHost`] and
//! [`Scheduler`]. A hook subscribes during the first render, but only
//! re-renders once the component has mounted; changes seen before mount
//! cause a single render right after mount.
use std::{
    cell::{Cell, OnceCell, RefCell},
    rc::Rc,
    time::Duration,
};

use parse_display::Display;

use crate::{EqualityMode, Equate, Lookable};

mod scheduler;
mod test_host;
mod watch;

pub use scheduler::*;
pub use test_host::*;
pub use watch::*;


/// Effect run once after the component mounts. Returns its cleanup, which
/// runs on unmount.
pub type MountEffect = Box<dyn FnOnce() -> Box<dyn FnOnce()>>;

/// The services a UI framework provides to hooks.
pub trait HookHost {
    /// Returns the value created by `init` on the first render. Later renders
    /// of the same component get the same value back.
    fn use_ref<T: 'static>(&mut self, init: impl FnOnce() -> T) -> Rc<T>;

    /// Returns a function that asks the framework to render the component again.
    fn use_force_render(&mut self) -> Rc<dyn Fn()>;

    /// Registers `effect` to run once after mount.
    fn use_mount_effect(&mut self, effect: MountEffect);

    fn scheduler(&self) -> Rc<dyn Scheduler>;
}

/// Options of a hook call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HookOptions {
    /// Wait this long after the last change before re-rendering.
    pub debounce: Option<Duration>,
    /// How a re-read value is compared with the one last rendered.
    pub equality: EqualityMode,
    /// Name logged at debug level on every forced render.
    pub log_rerender: Option<String>,
}

impl HookOptions {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn debounce(mut self, delay: Duration) -> Self {
        self.debounce = Some(delay);
        self
    }
    pub fn equality(mut self, mode: EqualityMode) -> Self {
        self.equality = mode;
        self
    }
    pub fn log_rerender(mut self, name: impl Into<String>) -> Self {
        self.log_rerender = Some(name.into());
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
#[display(style = "snake_case")]
enum Phase {
    Premount,
    Mounted,
    Unmounted,
}

/// Reads `cells` and keeps the component subscribed to them.
///
/// The cells given on the first render are the ones watched for the lifetime
/// of the component. The returned values are read on every render.
pub fn use_lookables<H: HookHost, S: WatchSet>(
    host: &mut H,
    cells: S,
    options: &HookOptions,
) -> S::Values {
    use_watches(host, || cells.watches(), options);
    cells.values()
}

pub fn use_lookable<H: HookHost, L>(host: &mut H, cell: &L, options: &HookOptions) -> L::Value
where
    L: Lookable,
    L::Value: Equate,
{
    let (value,) = use_lookables(host, (cell,), options);
    value
}

pub(crate) fn use_watches<H: HookHost>(
    host: &mut H,
    watches: impl FnOnce() -> Vec<Rc<dyn Watch>>,
    options: &HookOptions,
) {
    let force = host.use_force_render();
    let scheduler = host.scheduler();
    let state = host.use_ref(|| HookState::new(watches(), force, scheduler, options));
    state.subscribe();

    let weak = Rc::downgrade(&state);
    host.use_mount_effect(Box::new(move || {
        if let Some(state) = weak.upgrade() {
            state.mount();
        }
        let cleanup: Box<dyn FnOnce()> = Box::new(move || {
            if let Some(state) = weak.upgrade() {
                state.unmount();
            }
        });
        cleanup
    }));
}

struct HookState {
    phase: Cell<Phase>,
    changed_while_premount: Cell<bool>,
    watches: Vec<Rc<dyn Watch>>,
    seen: RefCell<Vec<Box<dyn Looked>>>,
    mode: EqualityMode,
    listener: OnceCell<Rc<dyn Fn()>>,
    trigger: Rc<RenderTrigger>,
    scheduler: Rc<dyn Scheduler>,
}

impl HookState {
    fn new(
        watches: Vec<Rc<dyn Watch>>,
        force: Rc<dyn Fn()>,
        scheduler: Rc<dyn Scheduler>,
        options: &HookOptions,
    ) -> Self {
        let seen = watches.iter().map(|w| w.look()).collect();
        Self {
            phase: Cell::new(Phase::Premount),
            changed_while_premount: Cell::new(false),
            watches,
            seen: RefCell::new(seen),
            mode: options.equality,
            listener: OnceCell::new(),
            trigger: Rc::new(RenderTrigger {
                force,
                debounce: options.debounce,
                scheduler: scheduler.clone(),
                pending: Cell::new(None),
                log_name: options.log_rerender.clone(),
            }),
            scheduler,
        }
    }

    fn subscribe(self: &Rc<Self>) {
        if self.listener.get().is_some() {
            return;
        }
        let this = Rc::downgrade(self);
        let listener: Rc<dyn Fn()> = Rc::new(move || {
            if let Some(this) = this.upgrade() {
                this.on_change();
            }
        });
        for w in &self.watches {
            w.node().watch(&listener);
        }
        let _ = self.listener.set(listener);
    }

    fn unsubscribe(&self) {
        if let Some(listener) = self.listener.get() {
            for w in &self.watches {
                w.node().unwatch(listener);
            }
        }
    }

    fn on_change(self: &Rc<Self>) {
        match self.phase.get() {
            Phase::Premount => {
                tracing::trace!(phase = %Phase::Premount, "change before mount");
                self.changed_while_premount.set(true);
            }
            Phase::Mounted => {
                if self.refresh() {
                    self.trigger.fire();
                }
            }
            Phase::Unmounted => {
                tracing::debug!("change after unmount, unsubscribing on next tick");
                let this = self.clone();
                self.scheduler.defer(Box::new(move || this.unsubscribe()));
            }
        }
    }

    /// Re-reads the watched cells. Returns `true` and replaces the cache if
    /// any of them differs from the last rendered value.
    fn refresh(&self) -> bool {
        let current: Vec<Box<dyn Looked>> = self.watches.iter().map(|w| w.look()).collect();
        let changed = self
            .seen
            .borrow()
            .iter()
            .zip(&current)
            .any(|(old, new)| !old.same(new.as_ref(), self.mode));
        if changed {
            *self.seen.borrow_mut() = current;
        }
        changed
    }

    fn mount(&self) {
        self.phase.set(Phase::Mounted);
        if self.changed_while_premount.replace(false) {
            self.refresh();
            self.trigger.fire_now();
        }
    }

    fn unmount(&self) {
        self.phase.set(Phase::Unmounted);
        self.trigger.cancel();
        self.unsubscribe();
    }
}

impl Drop for HookState {
    fn drop(&mut self) {
        self.trigger.cancel();
        self.unsubscribe();
    }
}

struct RenderTrigger {
    force: Rc<dyn Fn()>,
    debounce: Option<Duration>,
    scheduler: Rc<dyn Scheduler>,
    pending: Cell<Option<TimerId>>,
    log_name: Option<String>,
}

impl RenderTrigger {
    fn fire(self: &Rc<Self>) {
        let Some(delay) = self.debounce else {
            return self.render();
        };
        self.cancel();
        let this = Rc::downgrade(self);
        let id = self.scheduler.delay(
            delay,
            Box::new(move || {
                if let Some(this) = this.upgrade() {
                    this.pending.set(None);
                    this.render();
                }
            }),
        );
        self.pending.set(Some(id));
    }

    fn fire_now(&self) {
        self.cancel();
        self.render();
    }

    fn cancel(&self) {
        if let Some(id) = self.pending.take() {
            self.scheduler.cancel(id);
        }
    }

    fn render(&self) {
        if let Some(name) = &self.log_name {
            tracing::debug!(component = %name, "re-render");
        }
        (self.force)();
    }
}
