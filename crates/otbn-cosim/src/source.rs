//! Boundary with whatever produces trace data.
//!
//! A simulation harness owns a [`TraceSource`] and registers listeners on
//! it; the source forwards each RTL record and each ISS step to every
//! listener. Nothing registers itself: the harness decides which listeners
//! exist and for how long.

use tracing::debug;

use crate::checker::TraceChecker;

/// Something that consumes RTL and ISS trace data.
///
/// All methods have no-op default bodies, so a listener only implements the
/// side it cares about.
pub trait TraceListener {
    /// Called with each RTL trace record.
    fn accept_rtl(&mut self, _record: &str, _cycle: u32) {}

    /// Called with the lines the ISS printed for one step.
    fn accept_iss(&mut self, _lines: &[String]) -> bool {
        true
    }

    /// Called once at the end of the session.
    fn finish(&mut self) -> bool {
        true
    }
}

impl TraceListener for TraceChecker {
    fn accept_rtl(&mut self, record: &str, cycle: u32) {
        Self::accept_rtl(self, record, cycle);
    }

    fn accept_iss(&mut self, lines: &[String]) -> bool {
        Self::accept_iss(self, lines)
    }

    fn finish(&mut self) -> bool {
        Self::finish(self)
    }
}

/// Handle returned by [`TraceSource::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(usize);

/// Fans trace data out to registered listeners.
#[derive(Default)]
pub struct TraceSource<'a> {
    listeners: Vec<(ListenerId, &'a mut dyn TraceListener)>,
    next_id: usize,
}

impl<'a> TraceSource<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(&mut self, listener: &'a mut dyn TraceListener) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, listener));
        id
    }

    /// Returns false if `id` was not registered.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn broadcast_rtl(&mut self, record: &str, cycle: u32) {
        for (_, listener) in &mut self.listeners {
            listener.accept_rtl(record, cycle);
        }
    }

    /// Deliver one ISS step. Every listener sees it; the result is false if
    /// any of them failed.
    pub fn broadcast_iss(&mut self, lines: &[String]) -> bool {
        let mut ok = true;
        for (_, listener) in &mut self.listeners {
            ok &= listener.accept_iss(lines);
        }
        ok
    }

    /// End the session on every listener.
    pub fn finish(&mut self) -> bool {
        debug!(listeners = self.listeners.len(), "finishing trace session");
        let mut ok = true;
        for (_, listener) in &mut self.listeners {
            ok &= listener.finish();
        }
        ok
    }
}
