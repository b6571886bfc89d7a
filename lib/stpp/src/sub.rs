use crate::registry::Registry;
use crate::wire::{Notify, Scalar};
use proptree::event::{PropEvent, ADD_SELECTED};
use proptree::logging;
use proptree::prop::Prop;
use proptree::sub::SubHandle;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Encoding {
    Json,
    Binary,
}

/// One client subscription. Exported entries live in the session registry;
/// the subscription tracks which ids it issued, split between directory
/// children and the single value property. An entry belongs to exactly one
/// of the two lists.
pub struct Subscription {
    pub id: u32,
    pub encoding: Encoding,
    pub handle: Box<dyn SubHandle>,
    pub dir_props: Vec<u32>,
    pub value_props: Vec<u32>,
}

impl Subscription {
    #[inline]
    pub fn new(id: u32, encoding: Encoding, handle: Box<dyn SubHandle>) -> Subscription {
        Subscription {
            id,
            encoding,
            handle,
            dir_props: Vec::new(),
            value_props: Vec::new(),
        }
    }

    /// Unexport everything the subscription issued. Run before releasing
    /// the tree handle.
    pub fn clear_all(&mut self, registry: &mut Registry) {
        clear_list(&mut self.dir_props, registry);
        clear_list(&mut self.value_props, registry);
    }
}

fn clear_list(list: &mut Vec<u32>, registry: &mut Registry) {
    for id in list.drain(..) {
        registry.unexport(id);
    }
}

fn export_dir(sub: &mut Subscription, registry: &mut Registry, prop: Prop) -> u32 {
    let id = registry.export(sub.id, prop);
    sub.dir_props.push(id);
    id
}

/// Translate a tree event into its encoding-neutral notification, applying
/// the export bookkeeping as a side effect. `None` means nothing goes out
/// on the wire for this event.
pub fn translate(
    sub: &mut Subscription,
    registry: &mut Registry,
    event: PropEvent,
    log: &logging::Logger,
) -> Option<Notify> {
    match event {
        PropEvent::SetInt(value) => scalar(sub, registry, Scalar::Int(value)),
        PropEvent::SetFloat(value) => scalar(sub, registry, Scalar::Float(value)),
        PropEvent::SetString { value, hint } => scalar(sub, registry, Scalar::Str { value, hint }),
        PropEvent::SetCString(value) => scalar(sub, registry, Scalar::Str { value, hint: 0 }),
        PropEvent::SetVoid => scalar(sub, registry, Scalar::Void),
        PropEvent::SetDir => scalar(sub, registry, Scalar::Dir),

        PropEvent::SetUri { title, uri } => {
            // Only the JSON encoding can carry a structured URI value.
            if sub.encoding == Encoding::Json {
                scalar(sub, registry, Scalar::Uri { title, uri })
            } else {
                unsupported(sub, "set_uri", log)
            }
        }

        PropEvent::AddChild { child, flags } => {
            let id = export_dir(sub, registry, child);
            Some(Notify::AddChilds {
                before: None,
                ids: vec![id],
                selected: flags & ADD_SELECTED != 0,
            })
        }

        PropEvent::AddChildBefore { child, before } => {
            let before = sibling(sub, registry, &before, log);
            let id = export_dir(sub, registry, child);
            Some(Notify::AddChilds {
                before,
                ids: vec![id],
                selected: false,
            })
        }

        PropEvent::AddChildVec { childs } => {
            let ids = childs
                .into_iter()
                .map(|child| export_dir(sub, registry, child))
                .collect();
            Some(Notify::AddChilds {
                before: None,
                ids,
                selected: false,
            })
        }

        PropEvent::AddChildVecBefore { childs, before } => {
            let before = sibling(sub, registry, &before, log);
            let ids = childs
                .into_iter()
                .map(|child| export_dir(sub, registry, child))
                .collect();
            Some(Notify::AddChilds {
                before,
                ids,
                selected: false,
            })
        }

        PropEvent::DelChild { child } => {
            let id = match registry.tag(&child, sub.id) {
                Some(id) => id,
                None => {
                    logging::error!(log, "del for unexported child";
                                    "context" => "translate", "sub_id" => sub.id);
                    return None;
                }
            };
            registry.unexport(id);
            sub.dir_props.retain(|&exported| exported != id);
            Some(Notify::DelChild(id))
        }

        PropEvent::MoveChild { child, before } => {
            let id = match registry.tag(&child, sub.id) {
                Some(id) => id,
                None => {
                    logging::error!(log, "move for unexported child";
                                    "context" => "translate", "sub_id" => sub.id);
                    return None;
                }
            };
            let before = before.and_then(|b| sibling(sub, registry, &b, log));
            Some(Notify::MoveChild { id, before })
        }

        PropEvent::SelectChild { child } => {
            if sub.encoding == Encoding::Json {
                return unsupported(sub, "select_child", log);
            }
            let id = match registry.tag(&child, sub.id) {
                Some(id) => id,
                None => {
                    logging::error!(log, "select for unexported child";
                                    "context" => "translate", "sub_id" => sub.id);
                    return None;
                }
            };
            Some(Notify::SelectChild(id))
        }

        PropEvent::ValueProp { prop } => {
            if sub.encoding == Encoding::Json {
                return unsupported(sub, "value_prop", log);
            }
            // The same value property twice in a row is suppressed.
            if let Some(&current) = sub.value_props.first() {
                if let Some(entry) = registry.resolve_entry(current) {
                    if entry.prop.is_same(&prop) {
                        return None;
                    }
                }
            }
            clear_list(&mut sub.value_props, registry);
            let id = registry.export(sub.id, prop);
            sub.value_props.push(id);
            Some(Notify::ValueProp(id))
        }

        PropEvent::WantMoreChilds => None,

        PropEvent::HaveMoreChilds(more) => {
            if sub.encoding == Encoding::Json {
                return unsupported(sub, "have_more_childs", log);
            }
            Some(Notify::HaveMoreChilds(more))
        }
    }
}

/// A scalar value replaces any directory contents: everything exported
/// through the directory list is forgotten on both sides, the wire message
/// itself superseding the children. The value list is left untouched.
fn scalar(sub: &mut Subscription, registry: &mut Registry, value: Scalar) -> Option<Notify> {
    clear_list(&mut sub.dir_props, registry);
    Some(Notify::Set(value))
}

/// Recover the exported id of an insertion anchor. A sibling the client
/// never saw degrades to "append at the end".
fn sibling(
    sub: &Subscription,
    registry: &Registry,
    before: &Prop,
    log: &logging::Logger,
) -> Option<u32> {
    let id = registry.tag(before, sub.id);
    if id.is_none() {
        logging::warn!(log, "insertion anchor never exported";
                       "context" => "translate", "sub_id" => sub.id);
    }
    id
}

fn unsupported(sub: &Subscription, event: &'static str, log: &logging::Logger) -> Option<Notify> {
    logging::error!(log, "subscription callback can't handle event";
                    "context" => "translate",
                    "sub_id" => sub.id,
                    "event" => event);
    None
}
