use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A node in the reactive property tree. The tree implementation provides
/// the concrete type; consumers only ever hold it behind a [`Prop`] handle
/// and act on it through the tree operations.
pub trait PropNode: Any + Send + Sync {}

/// Strong, cloneable handle to a property node. Cloning bumps the reference
/// count; a property stays alive for as long as any handle to it exists.
#[derive(Clone)]
pub struct Prop {
    node: Arc<dyn PropNode>,
}

impl Prop {
    #[inline]
    pub fn new(node: Arc<dyn PropNode>) -> Prop {
        Prop { node }
    }

    /// Identity of the underlying node. Two handles compare equal exactly
    /// when they point at the same node.
    #[inline]
    pub fn key(&self) -> PropKey {
        PropKey(Arc::as_ptr(&self.node) as *const () as usize)
    }

    #[inline]
    pub fn is_same(&self, other: &Prop) -> bool {
        self.key() == other.key()
    }

    /// Access for the tree implementation to recover its concrete node.
    #[inline]
    pub fn node(&self) -> &Arc<dyn PropNode> {
        &self.node
    }
}

impl fmt::Debug for Prop {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Prop({:#x})", self.key().0)
    }
}

/// Identity of a property node without ownership. Holding a key does not
/// keep the node alive; it is only valid as a map key while some `Prop`
/// handle to the same node is held elsewhere.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct PropKey(usize);

/// A value written down a dotted path. Carries only the shapes the JSON
/// write profile accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum SetValue {
    Int(i64),
    Float(f64),
    Str(String),
}
