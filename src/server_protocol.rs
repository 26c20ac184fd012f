use serde_json::{Map, Value};

use crate::types::MoveIntents;

#[derive(Debug, PartialEq)]
pub enum ParsedClientMessage {
    Start {
        level: Option<i64>,
        seed: Option<i64>,
    },
    Input {
        intents: MoveIntents,
    },
    Ping {
        t: f64,
    },
}

pub fn parse_client_message(raw: &str) -> Option<ParsedClientMessage> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object()?;
    let message_type = object.get("type")?.as_str()?;

    match message_type {
        "start" => {
            let level = parse_optional_i64(object.get("level"))?;
            let seed = parse_optional_i64(object.get("seed"))?;
            Some(ParsedClientMessage::Start { level, seed })
        }
        "input" => {
            let intents = MoveIntents {
                up: parse_flag(object, "up")?,
                down: parse_flag(object, "down")?,
                left: parse_flag(object, "left")?,
                right: parse_flag(object, "right")?,
            };
            Some(ParsedClientMessage::Input { intents })
        }
        "ping" => {
            let t = object.get("t")?.as_f64()?;
            if !t.is_finite() {
                return None;
            }
            Some(ParsedClientMessage::Ping { t })
        }
        _ => None,
    }
}

/// Absent flags read as released; present ones must be booleans.
fn parse_flag(object: &Map<String, Value>, key: &str) -> Option<bool> {
    match object.get(key) {
        None => Some(false),
        Some(value) => value.as_bool(),
    }
}

fn parse_optional_i64(value: Option<&Value>) -> Option<Option<i64>> {
    const MAX_SAFE_INTEGER_F64: f64 = 9_007_199_254_740_991.0;

    let Some(value) = value else {
        return Some(None);
    };
    if value.is_null() {
        return Some(None);
    }
    if let Some(number) = value.as_i64() {
        return Some(Some(number));
    }
    if let Some(number) = value.as_u64() {
        return i64::try_from(number).ok().map(Some);
    }
    let number = value.as_f64()?;
    if !number.is_finite() {
        return None;
    }
    let floored = number.floor();
    if floored.abs() > MAX_SAFE_INTEGER_F64 {
        return None;
    }
    Some(Some(floored as i64))
}
