use crate::wire::bytes::{PropRef, Reader, Writer};
use crate::wire::{cmd, tag, FrameError, FrameResult, Notify, Scalar, STPP_VERSION};
use proptree::image::CodedImage;

/// Image failure strings are clamped to fit the original's reply buffer.
const MAX_ERRSTR: usize = 255;

/// An inbound binary frame, decoded.
///
/// SET and SELECT carry `Option`s where the original silently dropped the
/// command on an undecodable reference; EVENT keeps its payload raw because
/// decoding it needs the session's id registry.
#[derive(Debug, PartialEq)]
pub enum Command {
    Hello {
        version: u8,
        flags: u8,
    },
    Subscribe {
        id: u32,
        propref: u32,
        flags: u16,
        names: Vec<String>,
    },
    Unsubscribe {
        id: u32,
    },
    Set {
        target: Option<PropRef>,
        value: SetPayload,
    },
    Event {
        target: PropRef,
        event: u8,
        payload: Vec<u8>,
    },
    ReqMove {
        id: u32,
        before: Option<u32>,
    },
    WantMoreChilds {
        id: u32,
    },
    Select {
        target: Option<PropRef>,
    },
    ImageLoad {
        id: u32,
        flags: u32,
        req_width: u32,
        req_height: u32,
        url: String,
    },
    ImageCancel {
        id: u32,
    },
}

/// Inner value of a SET frame. `Ignored` stands for a value tag whose
/// payload had the wrong length, or an unknown tag; such writes are dropped
/// without closing the session.
#[derive(Debug, PartialEq)]
pub enum SetPayload {
    Str { hint: u8, value: String },
    Int(i32),
    Float(f32),
    Void,
    Toggle,
    Ignored,
}

pub fn decode(data: &[u8]) -> FrameResult<Command> {
    let mut r = Reader::new(data);
    let command = r.u8()?;

    match command {
        cmd::HELLO => {
            let version = r.u8()?;
            let flags = r.u8()?;
            // Instance id and trailing fields of the client hello are not
            // used on the server side.
            Ok(Command::Hello { version, flags })
        }
        cmd::SUBSCRIBE => {
            if r.remaining() < 10 {
                return Err(FrameError::Short);
            }
            let id = r.u32()?;
            let propref = r.u32()?;
            let flags = r.u16()?;
            let names = r.string_vector()?;
            Ok(Command::Subscribe {
                id,
                propref,
                flags,
                names,
            })
        }
        cmd::UNSUBSCRIBE => {
            if r.remaining() != 4 {
                return Err(FrameError::Short);
            }
            Ok(Command::Unsubscribe { id: r.u32()? })
        }
        cmd::SET => {
            let target = match PropRef::read(&mut r) {
                Ok(target) => Some(target),
                Err(_) => None,
            };
            let value = match target {
                Some(_) => decode_set_payload(&mut r),
                None => SetPayload::Ignored,
            };
            Ok(Command::Set { target, value })
        }
        cmd::EVENT => {
            let target = PropRef::read(&mut r)?;
            let event = match r.u8() {
                Ok(event) => event,
                Err(_) => 0,
            };
            Ok(Command::Event {
                target,
                event,
                payload: r.rest().to_vec(),
            })
        }
        cmd::REQ_MOVE => {
            if r.remaining() < 4 {
                return Err(FrameError::Short);
            }
            let with_before = r.remaining() == 8;
            let id = r.u32()?;
            let before = if with_before { Some(r.u32()?) } else { None };
            Ok(Command::ReqMove { id, before })
        }
        cmd::WANT_MORE_CHILDS => {
            if r.remaining() != 4 {
                return Err(FrameError::Short);
            }
            Ok(Command::WantMoreChilds { id: r.u32()? })
        }
        cmd::SELECT => {
            let target = match PropRef::read(&mut r) {
                Ok(target) => Some(target),
                Err(_) => None,
            };
            Ok(Command::Select { target })
        }
        cmd::IMAGE_LOAD => {
            if r.remaining() < 16 {
                return Err(FrameError::Short);
            }
            let id = r.u32()?;
            let flags = r.u32()?;
            let req_width = r.u32()?;
            let req_height = r.u32()?;
            let url = r.cstr();
            Ok(Command::ImageLoad {
                id,
                flags,
                req_width,
                req_height,
                url,
            })
        }
        cmd::IMAGE_CANCEL => {
            if r.remaining() < 4 {
                return Err(FrameError::Short);
            }
            Ok(Command::ImageCancel { id: r.u32()? })
        }
        other => Err(FrameError::UnknownCommand(other)),
    }
}

fn decode_set_payload(r: &mut Reader) -> SetPayload {
    let value_tag = match r.u8() {
        Ok(value_tag) => value_tag,
        Err(_) => return SetPayload::Ignored,
    };

    match value_tag {
        tag::SET_STRING => match r.u8() {
            Ok(hint) => SetPayload::Str {
                hint,
                value: r.cstr(),
            },
            Err(_) => SetPayload::Ignored,
        },
        tag::SET_INT => match r.remaining() {
            4 => r
                .u32()
                .map(|value| SetPayload::Int(value as i32))
                .unwrap_or(SetPayload::Ignored),
            _ => SetPayload::Ignored,
        },
        tag::SET_FLOAT => match r.remaining() {
            4 => r
                .u32()
                .map(|value| SetPayload::Float(f32::from_bits(value)))
                .unwrap_or(SetPayload::Ignored),
            _ => SetPayload::Ignored,
        },
        tag::SET_VOID => SetPayload::Void,
        tag::TOGGLE_INT => SetPayload::Toggle,
        _ => SetPayload::Ignored,
    }
}

/// The HELLO frame: version, 16-byte instance id, flags.
pub fn hello(instance: &[u8; 16]) -> Vec<u8> {
    let mut w = Writer::with_capacity(19);
    w.u8(cmd::HELLO);
    w.u8(STPP_VERSION);
    w.bytes(instance);
    w.u8(0); // Flags
    w.into_inner()
}

/// A NOTIFY frame: 6-byte header (command, notification tag, subscription
/// id) followed by the per-tag payload.
pub fn notify(sub_id: u32, notify: &Notify) -> Vec<u8> {
    let mut w = Writer::with_capacity(16);
    w.u8(cmd::NOTIFY);
    w.u8(notify_tag(notify));
    w.u32(sub_id);

    match notify {
        Notify::Set(Scalar::Int(value)) => w.u32(*value as u32),
        Notify::Set(Scalar::Float(value)) => w.u32(value.to_bits()),
        Notify::Set(Scalar::Str { value, hint }) => {
            w.u8(*hint);
            w.bytes(value.as_bytes());
        }
        Notify::Set(Scalar::Void) | Notify::Set(Scalar::Dir) => (),
        // URI values only exist on the JSON encoding.
        Notify::Set(Scalar::Uri { .. }) => unreachable!("uri is json-only"),
        Notify::AddChilds { before, ids, .. } => {
            if let Some(before) = before {
                w.u32(*before);
            }
            for id in ids {
                w.u32(*id);
            }
        }
        Notify::DelChild(id) => w.u32(*id),
        Notify::MoveChild { id, before } => {
            w.u32(*id);
            if let Some(before) = before {
                w.u32(*before);
            }
        }
        Notify::SelectChild(id) => w.u32(*id),
        Notify::ValueProp(id) => w.u32(*id),
        Notify::HaveMoreChilds(_) => (),
    }
    w.into_inner()
}

fn notify_tag(notify: &Notify) -> u8 {
    match notify {
        Notify::Set(Scalar::Int(_)) => tag::SET_INT,
        Notify::Set(Scalar::Float(_)) => tag::SET_FLOAT,
        Notify::Set(Scalar::Str { .. }) => tag::SET_STRING,
        Notify::Set(Scalar::Void) => tag::SET_VOID,
        Notify::Set(Scalar::Dir) => tag::SET_DIR,
        Notify::Set(Scalar::Uri { .. }) => unreachable!("uri is json-only"),
        Notify::AddChilds {
            before: None,
            ids,
            selected: true,
        } if ids.len() == 1 => tag::ADD_CHILD_SELECTED,
        Notify::AddChilds { before: None, .. } => tag::ADD_CHILDS,
        Notify::AddChilds { before: Some(_), .. } => tag::ADD_CHILDS_BEFORE,
        Notify::DelChild(_) => tag::DEL_CHILD,
        Notify::MoveChild { .. } => tag::MOVE_CHILD,
        Notify::SelectChild(_) => tag::SELECT_CHILD,
        Notify::ValueProp(_) => tag::VALUE_PROP,
        Notify::HaveMoreChilds(true) => tag::HAVE_MORE_CHILDS_YES,
        Notify::HaveMoreChilds(false) => tag::HAVE_MORE_CHILDS_NO,
    }
}

pub fn image_reply(req_id: u32, image: &CodedImage) -> Vec<u8> {
    let mut w = Writer::with_capacity(14 + image.data.len());
    w.u8(cmd::IMAGE_REPLY);
    w.u32(req_id);
    w.u16(image.width);
    w.u16(image.height);
    w.u16(image.flags);
    w.u8(image.color_planes);
    w.u8(image.coded_type);
    w.u8(image.orientation);
    w.bytes(&image.data);
    w.into_inner()
}

pub fn image_fail(req_id: u32, error: &str) -> Vec<u8> {
    let bytes = error.as_bytes();
    let mut end = bytes.len().min(MAX_ERRSTR);
    // Stay on a character boundary when the clamp lands mid-codepoint.
    while end > 0 && !error.is_char_boundary(end) {
        end -= 1;
    }

    let mut w = Writer::with_capacity(5 + end);
    w.u8(cmd::IMAGE_FAIL);
    w.u32(req_id);
    w.bytes(&bytes[..end]);
    w.into_inner()
}
