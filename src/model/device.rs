//! Device handles as reported by the device directory.

use serde::{Deserialize, Serialize};

/// Identifiers longer than this are shortened for display.
const SHORT_ID_LIMIT: usize = 32;

/// Characters kept from each end of a shortened identifier.
const SHORT_ID_KEEP: usize = 14;

/// A scanner the device directory knows about.
///
/// The controller refers to devices by `id` only; the handle itself is
/// owned by whoever listed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceHandle {
    /// Backend identifier, e.g. `airscan:e0:Canon MF240`.
    pub id: String,

    /// Human-readable vendor/model string.
    pub display_name: String,
}

impl DeviceHandle {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }

    /// The identifier, shortened to `first…last` when it is too long to list.
    pub fn short_id(&self) -> String {
        let chars: Vec<char> = self.id.chars().collect();
        if chars.len() <= SHORT_ID_LIMIT {
            return self.id.clone();
        }
        let head: String = chars[..SHORT_ID_KEEP].iter().collect();
        let tail: String = chars[chars.len() - SHORT_ID_KEEP..].iter().collect();
        format!("{head}…{tail}")
    }

    /// List label: `Name [short-id]`.
    pub fn label(&self) -> String {
        format!("{} [{}]", self.display_name, self.short_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_ids_are_left_alone() {
        let device = DeviceHandle::new("test:0", "Test Scanner");
        assert_eq!(device.short_id(), "test:0");
        assert_eq!(device.label(), "Test Scanner [test:0]");
    }

    #[test]
    fn long_ids_keep_both_ends() {
        let device = DeviceHandle::new("airscan:e0:Canon MF240 Series (USB attached)", "Canon");
        let short = device.short_id();
        assert_eq!(short, "airscan:e0:Can…(USB attached)");
        assert_eq!(short.chars().count(), 29);
    }
}
