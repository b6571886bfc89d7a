use crate::wire::PropRef;
use hashbrown::HashMap;
use proptree::logging;
use proptree::prop::{Prop, PropKey};
use proptree::sub::PropTree;

/// A property a subscription has issued to the client: the server-assigned
/// wire id, a strong reference keeping the node alive, and the owning
/// subscription.
pub struct Exported {
    pub id: u32,
    pub prop: Prop,
    pub sub: u32,
}

/// Per-session bidirectional map between wire ids and property handles.
///
/// Ids start at 1 and are never reused within a session; id 0 is reserved
/// for the tree root on inbound references. Alongside the id index, a
/// `(property, subscription)` tag index lets change callbacks recover the
/// id of an already-exported child without scanning.
pub struct Registry {
    entries: HashMap<u32, Exported>,
    tags: HashMap<(PropKey, u32), u32>,
    tally: u32,
    log: logging::Logger,
}

impl Registry {
    #[inline]
    pub fn new(log: logging::Logger) -> Registry {
        Registry {
            entries: HashMap::new(),
            tags: HashMap::new(),
            tally: 0,
            log,
        }
    }

    /// Export `prop` through subscription `sub`, allocating the next id.
    pub fn export(&mut self, sub: u32, prop: Prop) -> u32 {
        self.tally = self
            .tally
            .checked_add(1)
            .expect("Exported id space exhausted");
        let id = self.tally;

        self.tags.insert((prop.key(), sub), id);
        if self.entries.insert(id, Exported { id, prop, sub }).is_some() {
            panic!("Exported id {} already in use", id);
        }
        id
    }

    /// Drop the export, releasing the strong reference and the tag.
    pub fn unexport(&mut self, id: u32) -> Option<Exported> {
        let entry = self.entries.remove(&id)?;
        self.tags.remove(&(entry.prop.key(), entry.sub));
        Some(entry)
    }

    /// Resolve a wire id to a property. Id 0 is the tree root; an id that
    /// was never issued (or was unexported) is a soft failure.
    pub fn resolve(&self, tree: &dyn PropTree, id: u32) -> Option<Prop> {
        if id == 0 {
            return Some(tree.root());
        }
        match self.entries.get(&id) {
            Some(entry) => Some(entry.prop.clone()),
            None => {
                logging::error!(self.log, "Referring unknown propref";
                                "context" => "resolve", "propref" => id);
                None
            }
        }
    }

    /// Resolve a full propref: id, then descend the name path.
    pub fn resolve_ref(&self, tree: &dyn PropTree, propref: &PropRef) -> Option<Prop> {
        let base = self.resolve(tree, propref.id)?;
        if propref.names.is_empty() {
            Some(base)
        } else {
            tree.find(&base, &propref.names)
        }
    }

    /// Recover the id under which `prop` was exported through `sub`.
    #[inline]
    pub fn tag(&self, prop: &Prop, sub: u32) -> Option<u32> {
        self.tags.get(&(prop.key(), sub)).copied()
    }

    /// The entry behind an exported id, without the unknown-id logging.
    #[inline]
    pub fn resolve_entry(&self, id: u32) -> Option<&Exported> {
        self.entries.get(&id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
