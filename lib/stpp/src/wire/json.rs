use crate::wire::{cmd, Notify, Scalar};
use proptree::prop::SetValue;
use serde_json::{json, Value};

/// An inbound text frame, decoded. The JSON profile only speaks the
/// reduced command set; everything else is ignored rather than fatal.
#[derive(Debug, PartialEq)]
pub enum Command {
    Subscribe {
        id: u32,
        propref: u32,
        path: Option<String>,
    },
    Unsubscribe {
        id: u32,
    },
    Set {
        propref: u32,
        path: Option<String>,
        value: Option<SetValue>,
    },
    Ignored,
}

pub fn decode(text: &str) -> Command {
    let value: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(_) => return Command::Ignored,
    };
    let frame = match value.as_array() {
        Some(frame) => frame,
        None => return Command::Ignored,
    };

    match element_u32(frame, 0) as u8 {
        cmd::SUBSCRIBE => Command::Subscribe {
            id: element_u32(frame, 1),
            propref: element_u32(frame, 2),
            path: element_str(frame, 3),
        },
        cmd::UNSUBSCRIBE => Command::Unsubscribe {
            id: element_u32(frame, 1),
        },
        cmd::SET => Command::Set {
            propref: element_u32(frame, 1),
            path: element_str(frame, 2),
            value: frame.get(3).and_then(set_value),
        },
        _ => Command::Ignored,
    }
}

#[inline]
fn element_u32(frame: &[Value], index: usize) -> u32 {
    frame
        .get(index)
        .and_then(Value::as_u64)
        .map(|v| v as u32)
        .unwrap_or(0)
}

#[inline]
fn element_str(frame: &[Value], index: usize) -> Option<String> {
    frame
        .get(index)
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Only numbers and strings are accepted as JSON write values; booleans
/// and null are dropped.
fn set_value(value: &Value) -> Option<SetValue> {
    match value {
        Value::Number(number) => match number.as_i64() {
            Some(int) => Some(SetValue::Int(int)),
            None => number.as_f64().map(SetValue::Float),
        },
        Value::String(string) => Some(SetValue::Str(string.clone())),
        _ => None,
    }
}

/// Encode a notification as a JSON array frame, or `None` when the JSON
/// profile has no representation for it.
pub fn notify(sub_id: u32, notify: &Notify) -> Option<String> {
    let frame = match notify {
        Notify::Set(scalar) => json!([cmd::SET, sub_id, scalar_value(scalar)]),
        Notify::AddChilds { before, ids, .. } => {
            json!([cmd::ADD_CHILDS, sub_id, before.unwrap_or(0), ids])
        }
        Notify::DelChild(id) => json!([cmd::DEL_CHILD, sub_id, [id]]),
        Notify::MoveChild { id, before } => {
            json!([cmd::MOVE_CHILD, sub_id, id, before.unwrap_or(0)])
        }
        Notify::SelectChild(_) | Notify::ValueProp(_) | Notify::HaveMoreChilds(_) => return None,
    };
    Some(frame.to_string())
}

fn scalar_value(scalar: &Scalar) -> Value {
    match scalar {
        Scalar::Int(value) => json!(value),
        Scalar::Float(value) => json!(value),
        Scalar::Str { value, .. } => json!(value),
        Scalar::Uri { title, uri } => json!(["uri", title, uri]),
        Scalar::Void => Value::Null,
        Scalar::Dir => json!(["dir"]),
    }
}
