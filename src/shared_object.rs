//! Shared objects and the process-wide shared object registry.
//!
//! A shared object is a native object exposed to script as an opaque handle
//! rather than copied by value. The [`SharedObjectRegistry`] maps script-side
//! handles to native references and back, preserving identity: resolving a
//! handle always yields the same native object for as long as it stays
//! registered.
//!
//! Handles are generational. When an entry is removed its slot is reused but
//! the generation is bumped, so handles that outlive their object resolve to
//! `None` instead of aliasing a newer object.
//!
//! # Example
//!
//! ```
//! use std::any::Any;
//! use std::sync::Arc;
//! use nativemod::shared_object::{SharedObject, SharedObjectRegistry};
//!
//! struct Counter { count: u32 }
//!
//! impl SharedObject for Counter {
//!     fn as_any(&self) -> &dyn Any {
//!         self
//!     }
//!
//!     fn type_name(&self) -> &'static str {
//!         "Counter"
//!     }
//! }
//!
//! let registry = SharedObjectRegistry::new();
//! let counter: Arc<dyn SharedObject> = Arc::new(Counter { count: 0 });
//! let handle = registry.register(Arc::clone(&counter));
//!
//! let resolved = registry.resolve(handle).unwrap();
//! assert!(Arc::ptr_eq(&counter, &resolved));
//! ```

use std::any::Any;
use std::fmt;
use std::sync::{Arc, RwLock};

use rustc_hash::FxHashMap;

/// Trait for native objects that can cross the boundary by handle.
///
/// Implemented explicitly per type, one line each: `as_any` enables
/// downcasting on the native side, `type_name` is used in diagnostics only.
pub trait SharedObject: Send + Sync + 'static {
    /// Upcast to `&dyn Any` for downcasting back to the concrete type.
    fn as_any(&self) -> &dyn Any;

    /// Script-visible name of the concrete type, for diagnostics.
    fn type_name(&self) -> &'static str;
}

/// Opaque script-side handle to a registered shared object.
///
/// The generational index prevents a stale handle from resolving to an
/// unrelated object that later reused the same slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SharedObjectHandle {
    /// Index into the registry's slot table
    pub index: u32,
    /// Generation for stale-handle detection
    pub generation: u32,
}

impl SharedObjectHandle {
    /// Create a handle from raw parts. Mostly useful in tests; real handles
    /// come from [`SharedObjectRegistry::register`].
    pub fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

impl fmt::Display for SharedObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}@{}", self.index, self.generation)
    }
}

struct Slot {
    generation: u32,
    object: Option<Arc<dyn SharedObject>>,
}

#[derive(Default)]
struct RegistryInner {
    slots: Vec<Slot>,
    free_list: Vec<u32>,
    /// Native identity (data pointer address) -> live handle. Enforces the
    /// at-most-one-live-handle invariant and serves the inverse lookup.
    by_identity: FxHashMap<usize, SharedObjectHandle>,
}

/// Process-wide table mapping native object identity to script handles.
///
/// Readers (casting) and writers (registration, removal) go through an
/// interior `RwLock`: single writer at a time, consistent readers. Under the
/// single-execution-context model the lock is uncontended; it exists so
/// deployments with more than one context stay correct.
pub struct SharedObjectRegistry {
    inner: RwLock<RegistryInner>,
}

fn identity_of(object: &Arc<dyn SharedObject>) -> usize {
    Arc::as_ptr(object) as *const () as usize
}

impl SharedObjectRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(RegistryInner::default()),
        }
    }

    /// Register a native object and return its script-side handle.
    ///
    /// Idempotent: registering an object that already has a live handle
    /// returns that handle instead of minting a second one.
    pub fn register(&self, object: Arc<dyn SharedObject>) -> SharedObjectHandle {
        let mut inner = self.inner.write().expect("shared object registry poisoned");
        let identity = identity_of(&object);
        if let Some(existing) = inner.by_identity.get(&identity) {
            return *existing;
        }

        let handle = if let Some(index) = inner.free_list.pop() {
            let slot = &mut inner.slots[index as usize];
            slot.object = Some(object);
            SharedObjectHandle::new(index, slot.generation)
        } else {
            let index = inner.slots.len() as u32;
            inner.slots.push(Slot {
                generation: 0,
                object: Some(object),
            });
            SharedObjectHandle::new(index, 0)
        };
        inner.by_identity.insert(identity, handle);
        handle
    }

    /// Resolve a handle back to the registered native object.
    ///
    /// Returns `None` for handles that were never registered or whose entry
    /// has since been removed. The returned reference is the registered
    /// object itself, not a copy.
    pub fn resolve(&self, handle: SharedObjectHandle) -> Option<Arc<dyn SharedObject>> {
        let inner = self.inner.read().expect("shared object registry poisoned");
        let slot = inner.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.object.clone()
    }

    /// Inverse lookup: the live handle for a native object, if registered.
    pub fn handle_for(&self, object: &Arc<dyn SharedObject>) -> Option<SharedObjectHandle> {
        let inner = self.inner.read().expect("shared object registry poisoned");
        inner.by_identity.get(&identity_of(object)).copied()
    }

    /// Remove an entry, invalidating its handle.
    ///
    /// The slot's generation is bumped so the removed handle (and any copy
    /// of it) goes stale. Returns the object that was registered, or `None`
    /// if the handle was not live.
    pub fn unregister(&self, handle: SharedObjectHandle) -> Option<Arc<dyn SharedObject>> {
        let mut inner = self.inner.write().expect("shared object registry poisoned");
        let slot = inner.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let object = slot.object.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        inner.free_list.push(handle.index);
        inner.by_identity.remove(&identity_of(&object));
        Some(object)
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let inner = self.inner.read().expect("shared object registry poisoned");
        inner.by_identity.len()
    }

    /// Check if the registry has no live entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove all entries, invalidating every live handle.
    pub fn clear(&self) {
        let mut inner = self.inner.write().expect("shared object registry poisoned");
        let inner = &mut *inner;
        for (index, slot) in inner.slots.iter_mut().enumerate() {
            if slot.object.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                inner.free_list.push(index as u32);
            }
        }
        inner.by_identity.clear();
    }
}

impl Default for SharedObjectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SharedObjectRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.read().expect("shared object registry poisoned");
        f.debug_struct("SharedObjectRegistry")
            .field("live", &inner.by_identity.len())
            .field("slots", &inner.slots.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter {
        #[allow(dead_code)]
        count: u32,
    }

    impl SharedObject for Counter {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn type_name(&self) -> &'static str {
            "Counter"
        }
    }

    fn counter() -> Arc<dyn SharedObject> {
        Arc::new(Counter { count: 0 })
    }

    #[test]
    fn register_and_resolve_preserves_identity() {
        let registry = SharedObjectRegistry::new();
        let object = counter();
        let handle = registry.register(Arc::clone(&object));

        let resolved = registry.resolve(handle).unwrap();
        assert!(Arc::ptr_eq(&object, &resolved));
    }

    #[test]
    fn register_is_idempotent() {
        let registry = SharedObjectRegistry::new();
        let object = counter();

        let first = registry.register(Arc::clone(&object));
        let second = registry.register(Arc::clone(&object));
        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn distinct_objects_get_distinct_handles() {
        let registry = SharedObjectRegistry::new();
        let a = registry.register(counter());
        let b = registry.register(counter());
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn resolve_unregistered_handle_is_none() {
        let registry = SharedObjectRegistry::new();
        assert!(registry.resolve(SharedObjectHandle::new(5, 0)).is_none());
    }

    #[test]
    fn handle_for_inverse_lookup() {
        let registry = SharedObjectRegistry::new();
        let object = counter();
        let handle = registry.register(Arc::clone(&object));

        assert_eq!(registry.handle_for(&object), Some(handle));

        let unregistered = counter();
        assert_eq!(registry.handle_for(&unregistered), None);
    }

    #[test]
    fn unregister_invalidates_handle() {
        let registry = SharedObjectRegistry::new();
        let object = counter();
        let handle = registry.register(Arc::clone(&object));

        let removed = registry.unregister(handle).unwrap();
        assert!(Arc::ptr_eq(&object, &removed));
        assert!(registry.resolve(handle).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn stale_generation_does_not_alias_new_object() {
        let registry = SharedObjectRegistry::new();
        let old_handle = registry.register(counter());
        registry.unregister(old_handle);

        // New object reuses the slot with a bumped generation.
        let new_handle = registry.register(counter());
        assert_eq!(new_handle.index, old_handle.index);
        assert_ne!(new_handle.generation, old_handle.generation);

        assert!(registry.resolve(old_handle).is_none());
        assert!(registry.resolve(new_handle).is_some());
    }

    #[test]
    fn unregister_twice_is_none() {
        let registry = SharedObjectRegistry::new();
        let handle = registry.register(counter());
        assert!(registry.unregister(handle).is_some());
        assert!(registry.unregister(handle).is_none());
    }

    #[test]
    fn clear_removes_everything() {
        let registry = SharedObjectRegistry::new();
        let a = registry.register(counter());
        let b = registry.register(counter());

        registry.clear();
        assert!(registry.is_empty());
        assert!(registry.resolve(a).is_none());
        assert!(registry.resolve(b).is_none());
    }

    #[test]
    fn clear_then_register_reuses_slots_without_aliasing() {
        let registry = SharedObjectRegistry::new();
        let a = registry.register(counter());
        let b = registry.register(counter());
        registry.clear();

        // Freed slots come back with bumped generations.
        let c = registry.register(counter());
        let d = registry.register(counter());
        assert!(registry.resolve(a).is_none());
        assert!(registry.resolve(b).is_none());
        assert!(registry.resolve(c).is_some());
        assert!(registry.resolve(d).is_some());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn reregister_after_unregister_mints_fresh_handle() {
        let registry = SharedObjectRegistry::new();
        let object = counter();
        let first = registry.register(Arc::clone(&object));
        registry.unregister(first);

        let second = registry.register(Arc::clone(&object));
        assert_ne!(first, second);
        assert!(registry.resolve(first).is_none());
        assert!(Arc::ptr_eq(&object, &registry.resolve(second).unwrap()));
    }

    #[test]
    fn handle_display() {
        let handle = SharedObjectHandle::new(3, 1);
        assert_eq!(format!("{}", handle), "#3@1");
    }
}
