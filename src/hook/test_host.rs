use std::{any::Any, cell::Cell, rc::Rc};

use super::{HookHost, MountEffect, Scheduler};

/// A minimal component for driving hooks without a UI framework.
///
/// Hook state lives in slots indexed by call order, so every render must call
/// the same hooks in the same order. Forced renders are only recorded; call
/// [`render`](Self::render) again to observe them.
pub struct TestHost {
    scheduler: Rc<dyn Scheduler>,
    slots: Vec<Rc<dyn Any>>,
    cursor: usize,
    effects: Vec<Option<MountEffect>>,
    effect_cursor: usize,
    cleanups: Vec<Box<dyn FnOnce()>>,
    mounted: bool,
    renders: usize,
    force_renders: Rc<Cell<usize>>,
    force: Rc<dyn Fn()>,
}

impl TestHost {
    pub fn new(scheduler: Rc<dyn Scheduler>) -> Self {
        let force_renders = Rc::new(Cell::new(0));
        let force: Rc<dyn Fn()> = {
            let force_renders = force_renders.clone();
            Rc::new(move || force_renders.set(force_renders.get() + 1))
        };
        Self {
            scheduler,
            slots: Vec::new(),
            cursor: 0,
            effects: Vec::new(),
            effect_cursor: 0,
            cleanups: Vec::new(),
            mounted: false,
            renders: 0,
            force_renders,
            force,
        }
    }

    /// Runs one render of the component body `f`.
    pub fn render<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.cursor = 0;
        self.effect_cursor = 0;
        self.renders += 1;
        self.force_renders.set(0);
        f(self)
    }

    /// Commits the first render: runs the mount effects in registration order.
    pub fn mount(&mut self) {
        if self.mounted {
            return;
        }
        self.mounted = true;
        let effects: Vec<MountEffect> = self.effects.iter_mut().filter_map(Option::take).collect();
        for effect in effects {
            self.cleanups.push(effect());
        }
    }

    /// Runs the effect cleanups in reverse registration order.
    pub fn unmount(&mut self) {
        self.mounted = false;
        while let Some(cleanup) = self.cleanups.pop() {
            cleanup();
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }
    pub fn render_count(&self) -> usize {
        self.renders
    }

    /// Number of forced renders requested since the last render.
    pub fn force_render_count(&self) -> usize {
        self.force_renders.get()
    }
    pub fn needs_render(&self) -> bool {
        self.force_render_count() != 0
    }
}

impl HookHost for TestHost {
    fn use_ref<T: 'static>(&mut self, init: impl FnOnce() -> T) -> Rc<T> {
        let index = self.cursor;
        self.cursor += 1;
        if let Some(slot) = self.slots.get(index) {
            match slot.clone().downcast::<T>() {
                Ok(value) => value,
                Err(_) => panic!("hook slot {index} changed type between renders"),
            }
        } else {
            let value = Rc::new(init());
            self.slots.push(value.clone());
            value
        }
    }

    fn use_force_render(&mut self) -> Rc<dyn Fn()> {
        self.force.clone()
    }

    fn use_mount_effect(&mut self, effect: MountEffect) {
        if self.effect_cursor == self.effects.len() {
            self.effects.push(Some(effect));
        }
        self.effect_cursor += 1;
    }

    fn scheduler(&self) -> Rc<dyn Scheduler> {
        self.scheduler.clone()
    }
}
