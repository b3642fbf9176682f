use serde_json::Value;

use crate::drag::DropTarget;

#[derive(Debug, PartialEq)]
pub enum ParsedClientMessage {
    DragStart {
        item_id: String,
    },
    DragOver {
        target_id: Option<String>,
    },
    DragEnd {
        item_id: String,
        target: Option<DropTarget>,
    },
    DragCancel,
    BlankClick {
        index: usize,
    },
    Next,
    PlayAgain,
    Ping {
        t: f64,
    },
}

pub fn parse_client_message(raw: &str) -> Option<ParsedClientMessage> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object()?;
    let message_type = object.get("type")?.as_str()?;

    match message_type {
        "drag_start" => {
            let item_id = object.get("itemId")?.as_str()?.to_string();
            Some(ParsedClientMessage::DragStart { item_id })
        }
        "drag_over" => {
            let target_id = parse_optional_string(object.get("targetId"))?;
            Some(ParsedClientMessage::DragOver { target_id })
        }
        "drag_end" => {
            let item_id = object.get("itemId")?.as_str()?.to_string();
            let target = match object.get("target") {
                None | Some(Value::Null) => None,
                Some(value) => {
                    let target = value.as_object()?;
                    Some(DropTarget {
                        id: target.get("id")?.as_str()?.to_string(),
                        kind: target.get("type")?.as_str()?.to_string(),
                    })
                }
            };
            Some(ParsedClientMessage::DragEnd { item_id, target })
        }
        "drag_cancel" => Some(ParsedClientMessage::DragCancel),
        "blank_click" => {
            let index = usize::try_from(object.get("index")?.as_u64()?).ok()?;
            Some(ParsedClientMessage::BlankClick { index })
        }
        "next" => Some(ParsedClientMessage::Next),
        "play_again" => Some(ParsedClientMessage::PlayAgain),
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

fn parse_optional_string(value: Option<&Value>) -> Option<Option<String>> {
    match value {
        None | Some(Value::Null) => Some(None),
        Some(value) => Some(Some(value.as_str()?.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_drag_start_message() {
        let parsed = parse_client_message(r#"{"type":"drag_start","itemId":"option-quick"}"#);
        assert_eq!(
            parsed,
            Some(ParsedClientMessage::DragStart {
                item_id: "option-quick".to_string()
            })
        );
    }

    #[test]
    fn parse_drag_over_accepts_null_target() {
        let parsed = parse_client_message(r#"{"type":"drag_over","targetId":null}"#);
        assert_eq!(parsed, Some(ParsedClientMessage::DragOver { target_id: None }));

        let parsed = parse_client_message(r#"{"type":"drag_over","targetId":"blank-1"}"#);
        assert_eq!(
            parsed,
            Some(ParsedClientMessage::DragOver {
                target_id: Some("blank-1".to_string())
            })
        );
    }

    #[test]
    fn parse_drag_over_rejects_non_string_target() {
        assert!(parse_client_message(r#"{"type":"drag_over","targetId":3}"#).is_none());
    }

    #[test]
    fn parse_drag_end_with_typed_target() {
        let parsed = parse_client_message(
            r#"{"type":"drag_end","itemId":"option-quick","target":{"id":"blank-0","type":"blank"}}"#,
        )
        .expect("drag end should parse");
        match parsed {
            ParsedClientMessage::DragEnd { item_id, target } => {
                assert_eq!(item_id, "option-quick");
                assert_eq!(target, Some(DropTarget::blank(0)));
            }
            _ => panic!("expected drag_end message"),
        }
    }

    #[test]
    fn parse_drag_end_without_target() {
        let parsed = parse_client_message(r#"{"type":"drag_end","itemId":"option-quick"}"#);
        assert!(matches!(
            parsed,
            Some(ParsedClientMessage::DragEnd { target: None, .. })
        ));
    }

    #[test]
    fn parse_drag_end_rejects_partial_target() {
        let parsed = parse_client_message(
            r#"{"type":"drag_end","itemId":"option-quick","target":{"id":"blank-0"}}"#,
        );
        assert!(parsed.is_none());
    }

    #[test]
    fn parse_blank_click_requires_non_negative_index() {
        assert_eq!(
            parse_client_message(r#"{"type":"blank_click","index":2}"#),
            Some(ParsedClientMessage::BlankClick { index: 2 })
        );
        assert!(parse_client_message(r#"{"type":"blank_click","index":-1}"#).is_none());
        assert!(parse_client_message(r#"{"type":"blank_click","index":1.5}"#).is_none());
    }

    #[test]
    fn parse_simple_actions() {
        assert_eq!(
            parse_client_message(r#"{"type":"next"}"#),
            Some(ParsedClientMessage::Next)
        );
        assert_eq!(
            parse_client_message(r#"{"type":"play_again"}"#),
            Some(ParsedClientMessage::PlayAgain)
        );
        assert_eq!(
            parse_client_message(r#"{"type":"drag_cancel"}"#),
            Some(ParsedClientMessage::DragCancel)
        );
    }

    #[test]
    fn parse_ping_requires_finite_number() {
        let parsed = parse_client_message(r#"{"type":"ping","t":12.5}"#);
        assert!(matches!(parsed, Some(ParsedClientMessage::Ping { .. })));
        assert!(parse_client_message(r#"{"type":"ping","t":"x"}"#).is_none());
    }

    #[test]
    fn unknown_type_is_rejected() {
        assert!(parse_client_message(r#"{"type":"hello"}"#).is_none());
        assert!(parse_client_message("not json").is_none());
    }
}
