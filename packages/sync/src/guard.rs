//! Guarded writes that do not echo back as edits

use crate::surface::{ElementHandle, SurfaceHost};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::trace;

#[derive(Debug, Clone, Copy)]
struct Suppression {
    until: Instant,
    /// Listener state before the first guarded write
    was_attached: bool,
}

/// Tracks elements whose listener is temporarily detached.
///
/// Guards are independent per element. A write to an element that is already
/// suppressed extends its window instead of stacking a second detach.
#[derive(Debug)]
pub struct EchoGuard {
    delay: Duration,
    suppressed: HashMap<ElementHandle, Suppression>,
}

impl EchoGuard {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            suppressed: HashMap::new(),
        }
    }

    /// Detach `element`'s listener, run `write`, and schedule reattachment
    /// `delay` after `now`.
    pub fn with_suppressed_echo<H, R>(
        &mut self,
        host: &mut H,
        element: ElementHandle,
        now: Instant,
        write: impl FnOnce(&mut H) -> R,
    ) -> R
    where
        H: SurfaceHost + ?Sized,
    {
        let until = now + self.delay;
        match self.suppressed.get_mut(&element) {
            Some(suppression) => suppression.until = until,
            None => {
                let was_attached = host.is_attached(element);
                if was_attached {
                    host.detach(element);
                }
                self.suppressed.insert(element, Suppression { until, was_attached });
            }
        }
        write(host)
    }

    /// Reattach listeners whose window has elapsed; returns how many
    pub fn release_due<H>(&mut self, host: &mut H, now: Instant) -> usize
    where
        H: SurfaceHost + ?Sized,
    {
        let due: Vec<(ElementHandle, Suppression)> = self
            .suppressed
            .iter()
            .filter(|(_, s)| s.until <= now)
            .map(|(h, s)| (*h, *s))
            .collect();

        for (element, suppression) in &due {
            self.suppressed.remove(element);
            if suppression.was_attached {
                trace!(%element, "reattaching listener");
                host.attach(*element);
            }
        }
        due.len()
    }

    /// Request a listener on an element that may be suppressed right now.
    /// Returns true when the attach was deferred to the end of the window.
    pub fn defer_attach(&mut self, element: ElementHandle) -> bool {
        match self.suppressed.get_mut(&element) {
            Some(suppression) => {
                suppression.was_attached = true;
                true
            }
            None => false,
        }
    }

    /// Forget elements without reattaching them
    pub fn forget(&mut self, elements: &[ElementHandle]) {
        for element in elements {
            self.suppressed.remove(element);
        }
    }

    pub fn is_suppressed(&self, element: ElementHandle) -> bool {
        self.suppressed.contains_key(&element)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.suppressed.values().map(|s| s.until).min()
    }

    pub fn len(&self) -> usize {
        self.suppressed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.suppressed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_surface::{ElementSpec, MemorySurface};
    use crate::surface::Surface;

    const DELAY: Duration = Duration::from_millis(50);

    #[test]
    fn test_guarded_write_does_not_echo() {
        let start = Instant::now();
        let mut host = MemorySurface::new();
        let el = host.insert(Surface::Preview, "c1", ElementSpec::property("title"));
        host.attach(el);

        let mut guard = EchoGuard::new(DELAY);
        guard
            .with_suppressed_echo(&mut host, el, start, |h| h.write(el, "Hello"))
            .unwrap();

        assert!(host.drain_events().is_empty());
        assert!(!host.is_attached(el));

        assert_eq!(guard.release_due(&mut host, start + Duration::from_millis(49)), 0);
        assert_eq!(guard.release_due(&mut host, start + DELAY), 1);
        assert!(host.is_attached(el));
    }

    #[test]
    fn test_second_write_extends_window() {
        let start = Instant::now();
        let mut host = MemorySurface::new();
        let el = host.insert(Surface::Editor, "c1", ElementSpec::property("title"));
        host.attach(el);

        let mut guard = EchoGuard::new(DELAY);
        guard.with_suppressed_echo(&mut host, el, start, |h| h.write(el, "a")).unwrap();
        let later = start + Duration::from_millis(40);
        guard.with_suppressed_echo(&mut host, el, later, |h| h.write(el, "b")).unwrap();

        assert_eq!(guard.release_due(&mut host, start + DELAY), 0);
        assert_eq!(guard.next_deadline(), Some(later + DELAY));
        assert_eq!(guard.release_due(&mut host, later + DELAY), 1);
        // Restores the original listener, not the suppressed state
        assert!(host.is_attached(el));
    }

    #[test]
    fn test_guards_are_independent() {
        let start = Instant::now();
        let mut host = MemorySurface::new();
        let a = host.insert(Surface::Preview, "c1", ElementSpec::property("title"));
        let b = host.insert(Surface::Preview, "c1", ElementSpec::property("subtitle"));
        host.attach(a);
        host.attach(b);

        let mut guard = EchoGuard::new(DELAY);
        guard.with_suppressed_echo(&mut host, a, start, |h| h.write(a, "x")).unwrap();

        assert!(guard.is_suppressed(a));
        assert!(!guard.is_suppressed(b));
        host.user_edit(b, "typed");
        assert_eq!(host.drain_events().len(), 1);
    }

    #[test]
    fn test_unattached_element_stays_detached() {
        let start = Instant::now();
        let mut host = MemorySurface::new();
        let el = host.insert(Surface::Preview, "c1", ElementSpec::property("title"));

        let mut guard = EchoGuard::new(DELAY);
        guard.with_suppressed_echo(&mut host, el, start, |h| h.write(el, "x")).unwrap();
        guard.release_due(&mut host, start + DELAY);

        assert!(!host.is_attached(el));
    }
}
