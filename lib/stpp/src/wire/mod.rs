//! STPP wire formats. Two parallel encodings share one command-tag space:
//! text frames carry JSON arrays, binary frames are byte-packed with
//! little-endian integers. `bytes` holds the shared primitives, `binary`
//! and `json` the two codecs.

pub mod binary;
pub mod bytes;
pub mod json;

pub use self::bytes::{PropRef, Reader, Writer};

/// Protocol revision announced in the HELLO exchange.
pub const STPP_VERSION: u8 = 1;

/// Command tags. The JSON profile reuses `SET`/`ADD_CHILDS`/`DEL_CHILD`/
/// `MOVE_CHILD` as outbound notification tags; the binary profile sends all
/// notifications under `NOTIFY` with a sub-tag from [`tag`].
pub mod cmd {
    pub const SUBSCRIBE: u8 = 1;
    pub const HELLO: u8 = 2;
    pub const UNSUBSCRIBE: u8 = 3;
    pub const SET: u8 = 4;
    pub const ADD_CHILDS: u8 = 5;
    pub const DEL_CHILD: u8 = 6;
    pub const MOVE_CHILD: u8 = 7;
    pub const NOTIFY: u8 = 8;
    pub const EVENT: u8 = 9;
    pub const REQ_MOVE: u8 = 10;
    pub const WANT_MORE_CHILDS: u8 = 11;
    pub const SELECT: u8 = 12;
    pub const IMAGE_LOAD: u8 = 13;
    pub const IMAGE_REPLY: u8 = 14;
    pub const IMAGE_FAIL: u8 = 15;
    pub const IMAGE_CANCEL: u8 = 16;
}

/// Notification tags carried in byte 1 of a binary NOTIFY header. The
/// `SET_*` and `TOGGLE_INT` values double as the inner value tag of an
/// inbound SET.
pub mod tag {
    pub const SET_STRING: u8 = 1;
    pub const SET_INT: u8 = 2;
    pub const SET_FLOAT: u8 = 3;
    pub const SET_VOID: u8 = 4;
    pub const SET_DIR: u8 = 5;
    pub const ADD_CHILDS: u8 = 6;
    pub const ADD_CHILDS_BEFORE: u8 = 7;
    pub const ADD_CHILD_SELECTED: u8 = 8;
    pub const DEL_CHILD: u8 = 9;
    pub const MOVE_CHILD: u8 = 10;
    pub const SELECT_CHILD: u8 = 11;
    pub const VALUE_PROP: u8 = 12;
    pub const HAVE_MORE_CHILDS_YES: u8 = 13;
    pub const HAVE_MORE_CHILDS_NO: u8 = 14;
    pub const TOGGLE_INT: u8 = 15;
}

/// User-event types carried in an EVENT frame.
pub mod etype {
    pub const ACTION_VECTOR: u8 = 1;
    pub const OPENURL: u8 = 2;
    pub const PLAYTRACK: u8 = 3;
    pub const DYNAMIC_ACTION: u8 = 4;
    pub const SELECT_AUDIO_TRACK: u8 = 5;
    pub const SELECT_SUBTITLE_TRACK: u8 = 6;
}

pub type FrameResult<T> = Result<T, FrameError>;

/// Frame defects that oblige the transport to drop the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// Header or fixed-width field cut off.
    Short,
    /// String length prefix runs past the end of the frame.
    TruncatedString,
    /// String vector runs past the end of the frame.
    TruncatedVector,
    UnknownCommand(u8),
    /// Binary command received before the HELLO exchange.
    HelloRequired,
    /// An EVENT frame referenced a property that could not be resolved.
    BadReference,
}

/// A change notification in encoding-neutral form. The subscription
/// manager produces these; `binary::notify` and `json::notify` turn them
/// into frames.
#[derive(Debug, Clone, PartialEq)]
pub enum Notify {
    Set(Scalar),
    AddChilds {
        before: Option<u32>,
        ids: Vec<u32>,
        selected: bool,
    },
    DelChild(u32),
    MoveChild { id: u32, before: Option<u32> },
    SelectChild(u32),
    ValueProp(u32),
    HaveMoreChilds(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Int(i32),
    Float(f32),
    Str { value: String, hint: u8 },
    Uri { title: String, uri: String },
    Void,
    Dir,
}
