use serde::{Deserialize, Serialize};

use crate::answer_store::AnswerSlots;
use crate::constants::{BLANK_ID_PREFIX, BLANK_TARGET_KIND, OPTION_ID_PREFIX};
use crate::error::PlacementRejected;

pub fn option_item_id(word: &str) -> String {
    format!("{OPTION_ID_PREFIX}{word}")
}

pub fn blank_target_id(index: usize) -> String {
    format!("{BLANK_ID_PREFIX}{index}")
}

pub fn parse_option_item_id(item_id: &str) -> Option<&str> {
    item_id.strip_prefix(OPTION_ID_PREFIX)
}

pub fn parse_blank_target_id(target_id: &str) -> Option<usize> {
    let digits = target_id.strip_prefix(BLANK_ID_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse::<usize>().ok()
}

/// The droppable an engine reports at drag end, with its type tag.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropTarget {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl DropTarget {
    pub fn blank(index: usize) -> Self {
        Self {
            id: blank_target_id(index),
            kind: BLANK_TARGET_KIND.to_string(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.kind == BLANK_TARGET_KIND
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        item_id: String,
    },
    Hovering {
        item_id: String,
        target_id: String,
    },
}

impl DragState {
    pub fn start(&mut self, item_id: &str) {
        *self = Self::Dragging {
            item_id: item_id.to_string(),
        };
    }

    /// Hover tracking only. Ignored while idle.
    pub fn over(&mut self, target_id: Option<&str>) {
        let Some(item_id) = self.active_item().map(str::to_string) else {
            return;
        };
        *self = match target_id {
            Some(target_id) => Self::Hovering {
                item_id,
                target_id: target_id.to_string(),
            },
            None => Self::Dragging { item_id },
        };
    }

    /// Ends the session and returns the item that was being dragged.
    pub fn end(&mut self) -> Option<String> {
        match std::mem::take(self) {
            Self::Idle => None,
            Self::Dragging { item_id } | Self::Hovering { item_id, .. } => Some(item_id),
        }
    }

    pub fn cancel(&mut self) {
        *self = Self::Idle;
    }

    pub fn active_item(&self) -> Option<&str> {
        match self {
            Self::Idle => None,
            Self::Dragging { item_id } | Self::Hovering { item_id, .. } => Some(item_id),
        }
    }

    pub fn hover_target(&self) -> Option<&str> {
        match self {
            Self::Hovering { target_id, .. } => Some(target_id),
            _ => None,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

/// Checks a drop against the current slots. Returns the blank index and word to place.
pub fn resolve_drop(
    slots: &AnswerSlots,
    options: &[String],
    item_id: &str,
    target: Option<&DropTarget>,
) -> Result<(usize, String), PlacementRejected> {
    let target = target.ok_or(PlacementRejected::NoTarget)?;
    if !target.is_blank() {
        return Err(PlacementRejected::NotABlank(target.id.clone()));
    }
    let index = parse_blank_target_id(&target.id)
        .ok_or_else(|| PlacementRejected::UnknownTarget(target.id.clone()))?;
    if index >= slots.len() {
        return Err(PlacementRejected::BlankOutOfRange {
            index,
            len: slots.len(),
        });
    }

    let word = parse_option_item_id(item_id)
        .filter(|word| options.iter().any(|option| option == word))
        .ok_or_else(|| PlacementRejected::UnknownOption(item_id.to_string()))?;

    if slots.get(index).is_some() {
        return Err(PlacementRejected::BlankFilled(index));
    }
    if slots.is_used(word) {
        return Err(PlacementRejected::WordAlreadyPlaced(word.to_string()));
    }
    Ok((index, word.to_string()))
}
