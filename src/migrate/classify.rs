//! Item type classification.

use crate::model::RawItem;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The item categories this migration supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ItemKind {
    Login,
    SecureNote,
    CreditCard,
    Identity,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ItemKind::Login => "login",
            ItemKind::SecureNote => "secure note",
            ItemKind::CreditCard => "credit card",
            ItemKind::Identity => "identity",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Supported(ItemKind),
    /// Carries the provider's tag for the report.
    Unsupported { tag: i64 },
}

/// Maps the source type tag to an [`ItemKind`]. Never fails.
pub fn classify(item: &RawItem) -> Classification {
    match item.type_tag {
        1 => Classification::Supported(ItemKind::Login),
        2 => Classification::Supported(ItemKind::SecureNote),
        3 => Classification::Supported(ItemKind::CreditCard),
        4 => Classification::Supported(ItemKind::Identity),
        tag => Classification::Unsupported { tag },
    }
}
