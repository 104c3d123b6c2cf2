use serde::{Deserialize, Serialize};

use super::{Entity, Searchable};

/// Generic list item with a title and a one-line description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Item {
    pub id: String,
    pub title: String,
    pub subtitle: String,
}

impl Item {
    /// Build the item at 1-based position `n` in the full list.
    pub fn numbered(n: u64) -> Self {
        Self {
            id: n.to_string(),
            title: format!("Item #{}", n),
            subtitle: format!("Description for item {}", n),
        }
    }
}

impl Entity for Item {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Searchable for Item {
    fn title(&self) -> &str {
        &self.title
    }
}
