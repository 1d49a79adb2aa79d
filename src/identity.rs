use std::{
    fmt,
    sync::atomic::{AtomicU32, Ordering},
};

static LAST_IDENTITY: AtomicU32 = AtomicU32::new(0);

/// Process-wide identity of a logical node.
///
/// Every version of a node produced through `with_*` keeps the identity of
/// the node it was derived from, so two green nodes with equal identities
/// are "the same node" in different versions of a tree. Identities are
/// never persisted and never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identity(u32);

impl Identity {
    /// Allocates a fresh identity, strictly greater than every identity
    /// allocated before it in this process.
    #[inline]
    pub fn new() -> Identity {
        let previous = LAST_IDENTITY.fetch_add(1, Ordering::Relaxed);
        match previous.checked_add(1) {
            Some(it) => Identity(it),
            None => std::process::abort(),
        }
    }

    #[inline]
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
