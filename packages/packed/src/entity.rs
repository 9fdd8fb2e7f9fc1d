//! Entity identifiers and their allocator.
//!
//! Entities carry no data of their own. They are plain keys into the
//! component stores, issued by an `EntityAllocator` from a monotonic counter
//! and never recycled.

use std::sync::atomic::{self, AtomicU32};

/// The ID of a single entity.
///
/// IDs are unique per allocator. `EntityID::INVALID` (zero) is never issued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityID(u32);

impl EntityID {
    /// The reserved ID which never refers to an entity.
    pub const INVALID: EntityID = EntityID(0);

    /// Create an `EntityID` from the inner value.
    ///
    /// Prefer `EntityAllocator::create`, which guarantees uniqueness.
    pub const fn from_raw(id: u32) -> EntityID {
        EntityID(id)
    }

    /// Return the inner unique ID.
    pub fn id(&self) -> u32 {
        self.0
    }

    /// Returns true unless this is `EntityID::INVALID`.
    pub fn is_valid(&self) -> bool {
        *self != EntityID::INVALID
    }
}

/// A source of unique entity IDs.
///
/// The allocator is an atomic counter and may be shared between threads,
/// usually behind an `Arc`.
#[derive(Debug)]
pub struct EntityAllocator {
    next_entity_id: AtomicU32,
}

impl EntityAllocator {
    /// Create a new allocator. The first ID it issues is 1.
    pub fn new() -> EntityAllocator {
        EntityAllocator {
            next_entity_id: AtomicU32::new(EntityID::INVALID.0 + 1),
        }
    }

    /// Allocate a new, never before issued, entity ID.
    ///
    /// # Panics
    /// Panics once all 2^32 - 1 valid IDs have been issued.
    pub fn create(&self) -> EntityID {
        let id = self.next_entity_id
            .fetch_update(atomic::Ordering::Relaxed, atomic::Ordering::Relaxed, |id| {
                if id == EntityID::INVALID.0 { None } else { Some(id.wrapping_add(1)) }
            })
            .unwrap_or_else(|_| panic!("entity ID space exhausted"));
        EntityID(id)
    }

    /// Return the number of IDs issued so far.
    pub fn issued(&self) -> u32 {
        match self.next_entity_id.load(atomic::Ordering::Relaxed) {
            // Wrapped: every valid ID is out.
            0 => u32::MAX,
            next => next - 1,
        }
    }
}

impl Default for EntityAllocator {
    fn default() -> Self {
        EntityAllocator::new()
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashSet;

    use rayon::prelude::*;

    use super::*;

    #[test]
    fn test_sequential_ids() {
        let allocator = EntityAllocator::new();
        let a = allocator.create();
        let b = allocator.create();

        assert!(a.is_valid());
        assert!(b.is_valid());
        assert_ne!(a, b);
        assert!(a < b);
        assert_eq!(allocator.issued(), 2);
    }

    #[test]
    fn test_invalid() {
        assert!(!EntityID::INVALID.is_valid());
        assert_eq!(EntityID::default(), EntityID::INVALID);
        assert_eq!(EntityID::from_raw(7).id(), 7);
    }

    #[test]
    fn test_concurrent_uniqueness() {
        let allocator = EntityAllocator::new();
        let ids = (0..10_000)
            .into_par_iter()
            .map(|_| allocator.create())
            .collect::<Vec<_>>();

        let unique = ids.iter().copied().collect::<HashSet<_>>();
        assert_eq!(unique.len(), ids.len());
        assert!(!unique.contains(&EntityID::INVALID));
        assert_eq!(allocator.issued(), 10_000);
    }

    #[test]
    #[should_panic(expected = "exhausted")]
    fn test_exhaustion() {
        let allocator = EntityAllocator {
            next_entity_id: AtomicU32::new(u32::MAX),
        };

        assert_eq!(allocator.create(), EntityID(u32::MAX));
        assert_eq!(allocator.issued(), u32::MAX);
        allocator.create();
    }
}
