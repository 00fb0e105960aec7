use serde::{Deserialize, Serialize};

use super::notification::ToastId;

/// Screen corner or edge notifications stack from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Anchor {
    TopLeft,
    TopCenter,
    #[default]
    TopRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl Anchor {
    /// Top anchors stack downward, bottom anchors upward.
    pub fn is_top(self) -> bool {
        matches!(self, Anchor::TopLeft | Anchor::TopCenter | Anchor::TopRight)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Anchor::TopLeft => "top-left",
            Anchor::TopCenter => "top-center",
            Anchor::TopRight => "top-right",
            Anchor::BottomLeft => "bottom-left",
            Anchor::BottomCenter => "bottom-center",
            Anchor::BottomRight => "bottom-right",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackDirection {
    Down,
    Up,
}

/// Where one active notification sits relative to its anchor edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToastPlacement {
    pub id: ToastId,
    pub anchor: Anchor,
    pub direction: StackDirection,
    /// Distance from the anchor edge to the near side of the toast.
    pub offset: u32,
    pub height: u32,
}

/// Stacks `items` (id, height) away from the anchor edge in the given order.
pub(super) fn stack(
    anchor: Anchor,
    gap: u32,
    items: impl IntoIterator<Item = (ToastId, u32)>,
) -> Vec<ToastPlacement> {
    let direction = if anchor.is_top() {
        StackDirection::Down
    } else {
        StackDirection::Up
    };
    let mut offset = 0u32;
    items
        .into_iter()
        .map(|(id, height)| {
            let placement = ToastPlacement {
                id,
                anchor,
                direction,
                offset,
                height,
            };
            offset = offset.saturating_add(height).saturating_add(gap);
            placement
        })
        .collect()
}
