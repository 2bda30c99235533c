//! Key input dispatch.
//!
//! Interactive front ends steer the control loops with single-key commands ("stop", "recalibrate
//! now", "toggle the debug view"). [`KeyBindings`] maps keys to callbacks so the front end only
//! has to forward whatever key it read; what the keys mean stays configured in one place.

use std::{collections::BTreeMap, fmt};

/// An ordered registry of per-key callbacks.
///
/// Multiple callbacks may be bound to the same key; they run in the order they were bound.
#[derive(Default)]
pub struct KeyBindings {
    bindings: BTreeMap<char, Vec<Box<dyn FnMut(char)>>>,
}

impl KeyBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `callback` to the bindings for `key`.
    pub fn bind(&mut self, key: char, callback: impl FnMut(char) + 'static) {
        self.bindings.entry(key).or_default().push(Box::new(callback));
    }

    /// Removes all bindings for `key`, returning how many were dropped.
    pub fn unbind(&mut self, key: char) -> usize {
        self.bindings.remove(&key).map_or(0, |callbacks| callbacks.len())
    }

    /// Invokes the bindings for `key`, in the order they were bound.
    ///
    /// Returns `false` when `key` has no bindings.
    pub fn dispatch(&mut self, key: char) -> bool {
        match self.bindings.get_mut(&key) {
            Some(callbacks) => {
                for callback in callbacks {
                    callback(key);
                }
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for KeyBindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys = f.debug_map();
        for (key, callbacks) in &self.bindings {
            keys.entry(key, &callbacks.len());
        }
        keys.finish()
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;

    #[test]
    fn test_dispatch_runs_in_binding_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut bindings = KeyBindings::new();
        for tag in ["first", "second"] {
            let log = Rc::clone(&log);
            bindings.bind('a', move |key| log.borrow_mut().push((tag, key)));
        }

        assert!(bindings.dispatch('a'));
        assert!(!bindings.dispatch('b'));
        assert_eq!(*log.borrow(), [("first", 'a'), ("second", 'a')]);
    }

    #[test]
    fn test_unbind() {
        let mut bindings = KeyBindings::new();
        bindings.bind('a', |_| {});
        bindings.bind('a', |_| {});
        bindings.bind('b', |_| {});

        assert_eq!(bindings.unbind('a'), 2);
        assert_eq!(bindings.unbind('a'), 0);
        assert!(!bindings.dispatch('a'));
        assert!(bindings.dispatch('b'));
    }
}
