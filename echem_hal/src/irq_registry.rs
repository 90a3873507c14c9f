//! Interrupt registration table and dispatch.
//!
//! Handlers are registered by key, not by closure: the table maps
//! `(timer, event)` to a handler key `K` plus its priorities, and
//! [`IrqRegistry::dispatch`] acknowledges the pending flag before handing
//! the key to an [`IrqTarget`]. Handlers therefore never re-check
//! hardware flags.
//!
//! Fixed capacity, no allocation. Constructed at startup and owned by the
//! orchestrator; no global state.

use echem_common::hal::driver::TickTimer;
use echem_common::hal::types::{IrqEvent, IrqPriority, TimerId};
use thiserror::Error;

/// Maximum number of simultaneous registrations.
pub const MAX_IRQ_ROUTES: usize = 8;

/// Registration failures (startup context only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IrqError {
    /// Every slot of the table is taken.
    #[error("interrupt table full ({MAX_IRQ_ROUTES} routes), cannot register {0} {1:?}")]
    TableFull(TimerId, IrqEvent),
}

/// One row of the registration table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IrqRegistration<K> {
    /// Interrupt source.
    pub timer: TimerId,
    /// Event kind.
    pub event: IrqEvent,
    /// Handler key resolved by the target.
    pub handler: K,
    /// Priority pair.
    pub priority: IrqPriority,
}

/// Receiver of dispatched interrupts.
pub trait IrqTarget<K, H: ?Sized> {
    /// Run the handler identified by `key`. Interrupt context: must not block.
    fn on_interrupt(&mut self, key: K, hal: &mut H);
}

/// Registration table keyed by `(timer, event)`.
#[derive(Debug, Clone)]
pub struct IrqRegistry<K> {
    routes: heapless::Vec<IrqRegistration<K>, MAX_IRQ_ROUTES>,
}

impl<K: Copy> IrqRegistry<K> {
    /// Create an empty table.
    pub const fn new() -> Self {
        Self {
            routes: heapless::Vec::new(),
        }
    }

    /// Register (or replace) the handler of `(timer, event)`.
    ///
    /// # Errors
    /// `IrqError::TableFull` when a new route does not fit.
    pub fn register(
        &mut self,
        timer: TimerId,
        event: IrqEvent,
        handler: K,
        priority: IrqPriority,
    ) -> Result<(), IrqError> {
        let registration = IrqRegistration {
            timer,
            event,
            handler,
            priority,
        };

        if let Some(slot) = self
            .routes
            .iter_mut()
            .find(|r| r.timer == timer && r.event == event)
        {
            *slot = registration;
            return Ok(());
        }

        self.routes
            .push(registration)
            .map_err(|_| IrqError::TableFull(timer, event))
    }

    /// Remove the route of `(timer, event)`. Returns whether one existed.
    pub fn unregister(&mut self, timer: TimerId, event: IrqEvent) -> bool {
        let before = self.routes.len();
        self.routes.retain(|r| !(r.timer == timer && r.event == event));
        self.routes.len() != before
    }

    /// Registration of `(timer, event)`, if any.
    pub fn lookup(&self, timer: TimerId, event: IrqEvent) -> Option<&IrqRegistration<K>> {
        self.routes
            .iter()
            .find(|r| r.timer == timer && r.event == event)
    }

    /// Number of registered routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// No route registered.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Acknowledge and route one interrupt.
    ///
    /// Clears the pending flag of `(timer, event)` and invokes the target
    /// with the registered key. Returns `false` (flag left untouched) when
    /// nothing is registered for the source.
    pub fn dispatch<H, T>(&self, hal: &mut H, timer: TimerId, event: IrqEvent, target: &mut T) -> bool
    where
        H: TickTimer + ?Sized,
        T: IrqTarget<K, H> + ?Sized,
    {
        let Some(route) = self.lookup(timer, event) else {
            return false;
        };
        let key = route.handler;
        hal.timer_clear_pending(timer, event);
        target.on_interrupt(key, hal);
        true
    }
}

impl<K: Copy> Default for IrqRegistry<K> {
    fn default() -> Self {
        Self::new()
    }
}
