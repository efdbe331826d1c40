use std::fmt::{Display, Formatter};
use std::sync::{Arc, RwLock};

/// Opaque identifier of a host UI element
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub struct ElementHandle {
    id: u64,
}

impl ElementHandle {
    pub fn new(id: u64) -> Self {
        ElementHandle { id }
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Display for ElementHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "element#{}", self.id)
    }
}

/// Shared slot holding the element a resolver is attached to.
///
/// The slot is owned by the caller: it attaches the handle once the element
/// is mounted and detaches it on unmount. Resolvers only read it.
#[derive(Clone, Debug, Default)]
pub struct ElementRef {
    current: Arc<RwLock<Option<ElementHandle>>>,
}

impl ElementRef {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&self, element: ElementHandle) {
        *self.write() = Some(element);
    }

    pub fn detach(&self) {
        *self.write() = None;
    }

    pub fn current(&self) -> Option<ElementHandle> {
        *self
            .current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn is_present(&self) -> bool {
        self.current().is_some()
    }

    /// True if both refs share the same slot
    pub fn same_slot(&self, other: &ElementRef) -> bool {
        Arc::ptr_eq(&self.current, &other.current)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Option<ElementHandle>> {
        self.current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
