use crate::event::{PropEvent, UserEvent};
use crate::prop::{Prop, SetValue};
use std::sync::Arc;

/// A unit of deferred work.
pub type Task = Box<dyn FnOnce() + Send>;

/// Cooperative executor that serialises all callbacks belonging to one
/// consumer. Tasks dispatched on the same courier run one at a time, in
/// dispatch order.
pub trait Courier: Send + Sync {
    fn dispatch(&self, task: Task);
}

/// Background worker pool for blocking work.
pub trait TaskRunner: Send + Sync {
    fn run(&self, task: Task);
}

/// Resolve subscription paths against the alternative (localised) namespace
/// as well as the canonical one.
pub const SUB_ALT_PATH: u16 = 0x01;

pub type SubCallback = Box<dyn FnMut(PropEvent) + Send>;

/// Everything needed to install a tree subscription.
///
/// `root = None` stands for an unresolvable starting point; the tree accepts
/// it and the subscription simply never fires until re-rooted. `path` is the
/// dotted-string form, `names` the pre-split vector form; either or both may
/// be empty.
pub struct SubRequest {
    pub flags: u16,
    pub root: Option<Prop>,
    pub path: Option<String>,
    pub names: Vec<String>,
    pub callback: SubCallback,
    pub courier: Arc<dyn Courier>,
}

/// Live tree subscription. Dropping the handle releases it.
pub trait SubHandle: Send {
    /// Ask the tree to page in more children under the subscribed directory.
    fn want_more_childs(&self);
}

/// Operations the property tree exposes to protocol endpoints.
///
/// `subscribe` must never invoke the callback from inside the call itself;
/// deliveries are dispatched on the courier carried in the request.
pub trait PropTree: Send + Sync {
    fn root(&self) -> Prop;

    /// Descend `names` from `root`, returning the node found there.
    fn find(&self, root: &Prop, names: &[String]) -> Option<Prop>;

    fn subscribe(&self, req: SubRequest) -> Box<dyn SubHandle>;

    fn set_int(&self, p: &Prop, value: i32);
    fn set_float(&self, p: &Prop, value: f32);
    fn set_string(&self, p: &Prop, value: &str, hint: u8);
    fn set_void(&self, p: &Prop);
    fn toggle_int(&self, p: &Prop);

    /// Write a value at a dotted path below `root`, creating intermediate
    /// nodes as needed. A `None` root drops the write.
    fn set_down(&self, root: Option<&Prop>, path: &str, value: SetValue);

    /// Request that `p` be moved in front of `before` (to the end when
    /// `None`). The tree forwards this to whoever owns the ordering.
    fn req_move(&self, p: Option<&Prop>, before: Option<&Prop>);

    fn select(&self, p: &Prop);

    fn send_event(&self, p: &Prop, event: UserEvent);
}
