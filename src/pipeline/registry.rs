//! Listener registrations for one event category.
//!
//! Listener identity is a shared handle: whoever owns a [`Listener`] keeps it
//! alive, registrations only hold a [`ListenerRef`]. Dropping the last
//! `Listener` invalidates every registration made with it, and the next
//! dispatch prunes them.

use super::types::EventDirection;
use smol_str::SmolStr;
use std::rc::{Rc, Weak};
use tracing::debug;

pub type Callback<C> = Box<dyn FnMut(&C)>;

/// Owning identity handle for something that listens to the pipeline.
#[derive(Clone, Debug)]
pub struct Listener(Rc<SmolStr>);

impl Listener {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self(Rc::new(name.into()))
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn downgrade(&self) -> ListenerRef {
        ListenerRef(Rc::downgrade(&self.0))
    }
}

/// Non-owning listener identity, compared by address.
#[derive(Clone, Debug, Default)]
pub struct ListenerRef(Weak<SmolStr>);

impl ListenerRef {
    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }

    pub fn same(&self, other: &ListenerRef) -> bool {
        Weak::ptr_eq(&self.0, &other.0)
    }
}

impl From<&Listener> for ListenerRef {
    fn from(listener: &Listener) -> Self {
        listener.downgrade()
    }
}

/// Returned by a dynamic registration; required to remove exactly that one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerToken(u64);

/// Returned by [`Multicast::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

// ============================================================================
// MULTICAST
// ============================================================================

/// Broadcast channel for anonymous subscribers. Subscriptions live until
/// they are removed, nothing here is pruned.
pub struct Multicast<C> {
    subscribers: Vec<(SubscriptionId, Callback<C>)>,
    next_id: u64,
}

impl<C> Default for Multicast<C> {
    fn default() -> Self {
        Self {
            subscribers: Vec::new(),
            next_id: 0,
        }
    }
}

impl<C> Multicast<C> {
    pub fn subscribe(&mut self, callback: impl FnMut(&C) + 'static) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub, _)| *sub != id);
        before != self.subscribers.len()
    }

    pub fn broadcast(&mut self, ctx: &C) {
        for (_, callback) in &mut self.subscribers {
            callback(ctx);
        }
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    pub fn clear(&mut self) {
        self.subscribers.clear();
    }
}

// ============================================================================
// REGISTRY
// ============================================================================

struct DynamicRegistration<C> {
    listener: ListenerRef,
    token: ListenerToken,
    callback: Callback<C>,
}

struct NativeRegistration<C> {
    listener: ListenerRef,
    applied: Option<Callback<C>>,
    received: Option<Callback<C>>,
}

/// Applied/received listeners for one category, plus its global channels.
pub struct ListenerRegistry<C> {
    applied: Vec<DynamicRegistration<C>>,
    received: Vec<DynamicRegistration<C>>,
    native: Vec<NativeRegistration<C>>,
    pub on_applied: Multicast<C>,
    pub on_received: Multicast<C>,
    next_token: u64,
}

impl<C> Default for ListenerRegistry<C> {
    fn default() -> Self {
        Self {
            applied: Vec::new(),
            received: Vec::new(),
            native: Vec::new(),
            on_applied: Multicast::default(),
            on_received: Multicast::default(),
            next_token: 0,
        }
    }
}

impl<C> ListenerRegistry<C> {
    /// Add a callback for `listener`. Duplicates are allowed; each gets its own
    /// token. A dead listener is ignored.
    pub fn register_dynamic(
        &mut self,
        direction: EventDirection,
        listener: impl Into<ListenerRef>,
        callback: impl FnMut(&C) + 'static,
    ) -> Option<ListenerToken> {
        let listener = listener.into();
        if !listener.is_alive() {
            return None;
        }
        self.next_token += 1;
        let token = ListenerToken(self.next_token);
        self.dynamic_mut(direction).push(DynamicRegistration {
            listener,
            token,
            callback: Box::new(callback),
        });
        Some(token)
    }

    /// Set the applied and/or received slot for `listener`, keeping whichever
    /// slot is not passed in. Returns false when nothing was registered.
    pub fn register_native(
        &mut self,
        listener: impl Into<ListenerRef>,
        applied: Option<Callback<C>>,
        received: Option<Callback<C>>,
    ) -> bool {
        let listener = listener.into();
        if !listener.is_alive() || (applied.is_none() && received.is_none()) {
            return false;
        }

        if let Some(record) = self.native.iter_mut().find(|r| r.listener.same(&listener)) {
            if applied.is_some() {
                record.applied = applied;
            }
            if received.is_some() {
                record.received = received;
            }
            return true;
        }

        self.native.push(NativeRegistration {
            listener,
            applied,
            received,
        });
        true
    }

    pub fn unregister_dynamic(
        &mut self,
        direction: EventDirection,
        listener: impl Into<ListenerRef>,
        token: ListenerToken,
    ) -> bool {
        let listener = listener.into();
        let list = self.dynamic_mut(direction);
        let Some(index) = list
            .iter()
            .position(|r| r.token == token && r.listener.same(&listener))
        else {
            return false;
        };
        list.remove(index);
        true
    }

    pub fn unregister_native(&mut self, listener: impl Into<ListenerRef>) -> bool {
        let listener = listener.into();
        let before = self.native.len();
        self.native.retain(|r| !r.listener.same(&listener));
        before != self.native.len()
    }

    /// Drop every registration `listener` holds here. Returns how many went.
    pub fn unregister_all(&mut self, listener: &ListenerRef) -> usize {
        let before = self.len();
        self.applied.retain(|r| !r.listener.same(listener));
        self.received.retain(|r| !r.listener.same(listener));
        self.native.retain(|r| !r.listener.same(listener));
        before - self.len()
    }

    /// Teardown. Also drops the global channel subscribers.
    pub fn clear(&mut self) {
        self.applied.clear();
        self.received.clear();
        self.native.clear();
        self.on_applied.clear();
        self.on_received.clear();
    }

    /// Registrations, dynamic and native, not counting global subscribers.
    pub fn len(&self) -> usize {
        self.applied.len() + self.received.len() + self.native.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dynamic_len(&self, direction: EventDirection) -> usize {
        match direction {
            EventDirection::Applied => self.applied.len(),
            EventDirection::Received => self.received.len(),
        }
    }

    pub fn native_len(&self) -> usize {
        self.native.len()
    }

    /// Deliver `ctx` to every live listener for `direction`, then to the
    /// global channel. Dead listeners are pruned on the way. Returns the
    /// number of registered callbacks invoked.
    pub fn dispatch(&mut self, direction: EventDirection, ctx: &C) -> usize {
        let mut delivered = 0;

        let list = self.dynamic_mut(direction);
        let mut i = list.len();
        while i > 0 {
            i -= 1;
            if list[i].listener.is_alive() {
                (list[i].callback)(ctx);
                delivered += 1;
            } else {
                debug!("pruning dead {direction:?} listener");
                list.swap_remove(i);
            }
        }

        let mut i = self.native.len();
        while i > 0 {
            i -= 1;
            let record = &mut self.native[i];
            if !record.listener.is_alive() {
                debug!("pruning dead native listener");
                self.native.swap_remove(i);
                continue;
            }
            let slot = match direction {
                EventDirection::Applied => &mut record.applied,
                EventDirection::Received => &mut record.received,
            };
            if let Some(callback) = slot {
                callback(ctx);
                delivered += 1;
            }
        }

        match direction {
            EventDirection::Applied => self.on_applied.broadcast(ctx),
            EventDirection::Received => self.on_received.broadcast(ctx),
        }
        delivered
    }

    fn dynamic_mut(&mut self, direction: EventDirection) -> &mut Vec<DynamicRegistration<C>> {
        match direction {
            EventDirection::Applied => &mut self.applied,
            EventDirection::Received => &mut self.received,
        }
    }
}
