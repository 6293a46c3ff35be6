//! Lifecycle events over a host-driven game loop.
//!
//! The host loop owns scheduling. It holds a [`LifecycleHub`] and calls
//! [`initialize`](LifecycleHub::initialize), [`update`](LifecycleHub::update) and
//! [`draw`](LifecycleHub::draw) at the matching points of its loop, plus
//! [`resize`](LifecycleHub::resize) when the window changes size and
//! [`unload`](LifecycleHub::unload) once when the game stops. Each call fires the
//! subscribers of that phase synchronously and in subscription order, then hands
//! control back to the host's own base behavior through [`HostEngine`].
//!
//! # Dispatch rules
//!
//! - The subscriber list is snapshotted when a phase starts. A subscriber added
//!   while a phase is running first fires on the next occurrence. A subscriber
//!   removed by *another* subscriber still fires for the running occurrence.
//! - A subscriber that unsubscribes itself is not called again.
//! - The first `Err` returned by a subscriber stops the phase: the remaining
//!   subscribers and the base call are skipped and the error is returned.
//!   Panics unwind the same way.
//!
//! To unsubscribe from inside a callback, capture a [`Weak`](std::rc::Weak)
//! reference to the hub rather than an `Rc`, otherwise the hub keeps itself alive.
//!
//! ```
//! use flow_hooks::lifecycle::{HostEngine, LifecycleHub};
//! use flow_hooks::time::GameTime;
//!
//! struct Engine;
//! impl HostEngine for Engine {}
//!
//! let hub = LifecycleHub::new();
//! hub.on_update(|time| {
//!     assert_eq!(time.elapsed().as_millis(), 16);
//!     Ok(())
//! });
//! let time = GameTime::new(std::time::Duration::from_millis(16), Default::default());
//! hub.update(&time, &mut Engine).unwrap();
//! ```

use std::{
    cell::{Cell, RefCell},
    fmt::{self, Debug},
    rc::Rc,
};

use anyhow::{Context as _, Result, anyhow};

use crate::{data_structures::texture::Size, time::GameTime};

/// A point of the game loop the hub taps into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Initialize,
    Update,
    Draw,
    Resize,
    Unload,
}

/// Handle returned on subscription, consumed by unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId {
    phase: Phase,
    id: u64,
}

impl SubscriptionId {
    pub fn phase(&self) -> Phase {
        self.phase
    }
}

/// Base behavior of the host engine, run after the subscribers of each phase.
///
/// The defaults do nothing. A host overrides only the steps it has.
pub trait HostEngine {
    fn initialize(&mut self) -> Result<()> {
        Ok(())
    }

    fn update(&mut self, _time: &GameTime) -> Result<()> {
        Ok(())
    }

    fn draw(&mut self, _time: &GameTime) -> Result<()> {
        Ok(())
    }

    fn resize(&mut self, _size: Size) -> Result<()> {
        Ok(())
    }

    fn unload(&mut self) -> Result<()> {
        Ok(())
    }
}

type Handler<A> = Rc<RefCell<dyn FnMut(&A) -> Result<()>>>;

struct Subscriber<A> {
    id: u64,
    handler: Handler<A>,
}

impl<A> Clone for Subscriber<A> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            handler: Rc::clone(&self.handler),
        }
    }
}

/// Ordered multicast event for a single phase.
pub struct Event<A> {
    phase: Phase,
    next_id: Cell<u64>,
    subscribers: RefCell<Vec<Subscriber<A>>>,
}

impl<A> Event<A> {
    pub fn new(phase: Phase) -> Self {
        Self {
            phase,
            next_id: Cell::new(0),
            subscribers: RefCell::new(Vec::new()),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Append `handler` to the end of the invocation list.
    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: FnMut(&A) -> Result<()> + 'static,
    {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.subscribers.borrow_mut().push(Subscriber {
            id,
            handler: Rc::new(RefCell::new(handler)),
        });
        log::debug!("subscribed #{} to {:?}", id, self.phase);
        SubscriptionId {
            phase: self.phase,
            id,
        }
    }

    /// Remove a subscriber. Returns `false` if it was not subscribed here.
    pub fn unsubscribe(&self, subscription: SubscriptionId) -> bool {
        if subscription.phase != self.phase {
            return false;
        }
        let mut subscribers = self.subscribers.borrow_mut();
        let before = subscribers.len();
        subscribers.retain(|s| s.id != subscription.id);
        let removed = subscribers.len() != before;
        if removed {
            log::debug!("unsubscribed #{} from {:?}", subscription.id, self.phase);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.subscribers.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.borrow().is_empty()
    }

    /// Invoke every subscriber present when the call starts, in order.
    pub fn fire(&self, args: &A) -> Result<()> {
        // The borrow is released before any handler runs so handlers may
        // subscribe and unsubscribe freely.
        let snapshot: Vec<Subscriber<A>> = self.subscribers.borrow().clone();
        for subscriber in snapshot {
            let mut handler = subscriber.handler.try_borrow_mut().map_err(|_| {
                anyhow!(
                    "{:?} subscriber #{} was re-entered while still running",
                    self.phase,
                    subscriber.id
                )
            })?;
            (&mut *handler)(args)
                .with_context(|| format!("{:?} subscriber #{} failed", self.phase, subscriber.id))?;
        }
        Ok(())
    }
}

impl<A> Debug for Event<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("phase", &self.phase)
            .field("subscribers", &self.len())
            .finish()
    }
}

/// All lifecycle events in one place.
#[derive(Debug)]
pub struct LifecycleHub {
    initialize: Event<()>,
    update: Event<GameTime>,
    draw: Event<()>,
    resize: Event<Size>,
    unload: Event<()>,
}

impl LifecycleHub {
    pub fn new() -> Self {
        Self {
            initialize: Event::new(Phase::Initialize),
            update: Event::new(Phase::Update),
            draw: Event::new(Phase::Draw),
            resize: Event::new(Phase::Resize),
            unload: Event::new(Phase::Unload),
        }
    }

    pub fn on_initialize<F>(&self, mut handler: F) -> SubscriptionId
    where
        F: FnMut() -> Result<()> + 'static,
    {
        self.initialize.subscribe(move |_: &()| handler())
    }

    pub fn on_update<F>(&self, handler: F) -> SubscriptionId
    where
        F: FnMut(&GameTime) -> Result<()> + 'static,
    {
        self.update.subscribe(handler)
    }

    pub fn on_draw<F>(&self, mut handler: F) -> SubscriptionId
    where
        F: FnMut() -> Result<()> + 'static,
    {
        self.draw.subscribe(move |_: &()| handler())
    }

    /// Subscribe to window size changes. The handler gets the new inner size.
    pub fn on_resize<F>(&self, mut handler: F) -> SubscriptionId
    where
        F: FnMut(Size) -> Result<()> + 'static,
    {
        self.resize.subscribe(move |size: &Size| handler(*size))
    }

    pub fn on_unload<F>(&self, mut handler: F) -> SubscriptionId
    where
        F: FnMut() -> Result<()> + 'static,
    {
        self.unload.subscribe(move |_: &()| handler())
    }

    pub fn unsubscribe(&self, subscription: SubscriptionId) -> bool {
        match subscription.phase {
            Phase::Initialize => self.initialize.unsubscribe(subscription),
            Phase::Update => self.update.unsubscribe(subscription),
            Phase::Draw => self.draw.unsubscribe(subscription),
            Phase::Resize => self.resize.unsubscribe(subscription),
            Phase::Unload => self.unload.unsubscribe(subscription),
        }
    }

    pub fn subscriber_count(&self, phase: Phase) -> usize {
        match phase {
            Phase::Initialize => self.initialize.len(),
            Phase::Update => self.update.len(),
            Phase::Draw => self.draw.len(),
            Phase::Resize => self.resize.len(),
            Phase::Unload => self.unload.len(),
        }
    }

    /// Fire the initialize subscribers, then run the host's own initialization.
    ///
    /// The host is expected to call this once, before the first update.
    pub fn initialize<H: HostEngine + ?Sized>(&self, host: &mut H) -> Result<()> {
        self.initialize.fire(&())?;
        host.initialize()
    }

    /// Fire the update subscribers with `time`, then run the host's update.
    pub fn update<H: HostEngine + ?Sized>(&self, time: &GameTime, host: &mut H) -> Result<()> {
        self.update.fire(time)?;
        host.update(time)
    }

    /// Fire the draw subscribers, then run the host's draw.
    pub fn draw<H: HostEngine + ?Sized>(&self, time: &GameTime, host: &mut H) -> Result<()> {
        self.draw.fire(&())?;
        host.draw(time)
    }

    /// Fire the resize subscribers with the new size, then let the host adapt.
    pub fn resize<H: HostEngine + ?Sized>(&self, size: Size, host: &mut H) -> Result<()> {
        self.resize.fire(&size)?;
        host.resize(size)
    }

    /// Fire the unload subscribers, then run the host's teardown.
    ///
    /// Like initialize, the host calls this once, when the game stops.
    pub fn unload<H: HostEngine + ?Sized>(&self, host: &mut H) -> Result<()> {
        self.unload.fire(&())?;
        host.unload()
    }
}

impl Default for LifecycleHub {
    fn default() -> Self {
        Self::new()
    }
}
