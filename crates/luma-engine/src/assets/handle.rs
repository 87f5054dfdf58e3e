use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use slotmap::Key;

slotmap::new_key_type! {
    /// Generation-checked slot in the asset arena.
    pub struct AssetKey;
}

/// Non-owning, typed reference to a registered asset.
///
/// The registry owns every asset; a handle only names a slot. Once the asset
/// is unloaded the slot's generation moves on and lookups through the handle
/// return `None`, even if the slot is reused for another asset.
pub struct AssetHandle<T> {
    key: AssetKey,
    _marker: PhantomData<fn() -> T>,
}

impl<T> AssetHandle<T> {
    pub(crate) fn new(key: AssetKey) -> Self {
        Self {
            key,
            _marker: PhantomData,
        }
    }

    /// Handle that never resolves.
    pub fn empty() -> Self {
        Self::new(AssetKey::null())
    }

    /// True for [`AssetHandle::empty`]. A non-empty handle may still be expired.
    pub fn is_empty(&self) -> bool {
        self.key.is_null()
    }

    pub fn key(&self) -> AssetKey {
        self.key
    }
}

impl<T> Clone for AssetHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for AssetHandle<T> {}

impl<T> PartialEq for AssetHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<T> Eq for AssetHandle<T> {}

impl<T> Hash for AssetHandle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl<T> Default for AssetHandle<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> fmt::Debug for AssetHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AssetHandle").field(&self.key).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    struct Dummy;

    #[test]
    fn empty_handle() {
        let h = AssetHandle::<Dummy>::empty();
        assert!(h.is_empty());
        assert_eq!(h, AssetHandle::default());
    }

    #[test]
    fn reused_slot_gets_new_generation() {
        let mut arena: SlotMap<AssetKey, u32> = SlotMap::with_key();
        let first = AssetHandle::<Dummy>::new(arena.insert(1));
        arena.remove(first.key());
        let second = AssetHandle::<Dummy>::new(arena.insert(2));
        assert_ne!(first, second);
        assert!(arena.get(first.key()).is_none());
        assert_eq!(arena.get(second.key()), Some(&2));
    }
}
