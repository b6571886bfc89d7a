use crate::prop::Prop;

/// Child added with this flag is the directory's current selection.
pub const ADD_SELECTED: u32 = 0x01;

/// Change notification delivered to a tree subscription callback.
///
/// `SetString` carries the string type hint byte alongside the value;
/// `SetCString` is the hint-less form. The `before` arms reference siblings
/// that the same subscription has already seen.
#[derive(Debug, Clone)]
pub enum PropEvent {
    SetInt(i32),
    SetFloat(f32),
    SetString { value: String, hint: u8 },
    SetCString(String),
    SetUri { title: String, uri: String },
    SetVoid,
    SetDir,
    AddChild { child: Prop, flags: u32 },
    AddChildBefore { child: Prop, before: Prop },
    AddChildVec { childs: Vec<Prop> },
    AddChildVecBefore { childs: Vec<Prop>, before: Prop },
    DelChild { child: Prop },
    MoveChild { child: Prop, before: Option<Prop> },
    SelectChild { child: Prop },
    ValueProp { prop: Prop },
    WantMoreChilds,
    HaveMoreChilds(bool),
}

/// Opaque action code as understood by the event bus.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(transparent)]
pub struct Action(pub u32);

/// Name → code lookup provided by the event bus.
pub trait ActionMap: Send + Sync {
    fn action_by_name(&self, name: &str) -> Option<Action>;
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TrackKind {
    Audio,
    Subtitle,
}

/// A user-originated event submitted to a property.
#[derive(Debug)]
pub enum UserEvent {
    Actions(Vec<Action>),
    OpenUrl {
        url: Option<String>,
        view: Option<String>,
        item_model: Option<Prop>,
        parent_model: Option<Prop>,
        how: Option<String>,
        parent_url: Option<String>,
    },
    PlayTrack {
        track: Prop,
        source_model: Option<Prop>,
        mode: u8,
    },
    DynamicAction(String),
    SelectTrack {
        kind: TrackKind,
        id: String,
        manual: bool,
    },
}
