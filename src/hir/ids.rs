//! Arena handles for scopes.

use std::fmt;

/// Index of a [`Scope`](super::Scope) inside the [`ScopeTree`](super::ScopeTree) that owns it.
///
/// Handles are only meaningful for the tree that issued them. Handles into the
/// working set's global tree stay valid while the caller holds its lock; a
/// slot freed by a file removal may be reused by a later merge.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScopeId(pub u32);

impl ScopeId {
    /// The root namespace of every tree.
    pub const ROOT: ScopeId = ScopeId(0);

    #[inline]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScopeId({})", self.0)
    }
}

impl From<u32> for ScopeId {
    #[inline]
    fn from(id: u32) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_id_size() {
        assert_eq!(std::mem::size_of::<ScopeId>(), 4);
        assert_eq!(std::mem::size_of::<Option<ScopeId>>(), 8);
    }

    #[test]
    fn test_scope_id_index() {
        assert_eq!(ScopeId::ROOT.index(), 0);
        assert_eq!(ScopeId::from(7).index(), 7);
        assert_eq!(format!("{:?}", ScopeId::new(3)), "ScopeId(3)");
    }
}
