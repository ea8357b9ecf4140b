//! Collection Item Module
//!
//! Owned items and the attribute snapshot taken when they were first added.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Price variants consulted, in order, when valuing an item.
const PRICE_VARIANTS: [&str; 5] = [
    "holofoil",
    "normal",
    "reverseHolofoil",
    "1stEditionHolofoil",
    "1stEditionNormal",
];

/// Keys owned by [`CollectionItem`] itself; never kept as snapshot attributes.
const RESERVED_KEYS: [&str; 4] = ["id", "itemId", "quantity", "addedDate"];

// == Item Snapshot ==
/// Denormalized catalog attributes captured at first add.
///
/// Only the display name is interpreted; everything else is kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemSnapshot {
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl ItemSnapshot {
    /// Creates a snapshot with only a display name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Map::new(),
        }
    }

    /// Drops attributes that would shadow the collection entry's own fields.
    fn without_reserved_keys(mut self) -> Self {
        self.attributes
            .retain(|key, _| !RESERVED_KEYS.contains(&key.as_str()));
        self
    }

    /// Market price of one copy, if the snapshot carries one.
    pub fn market_price(&self) -> Option<f64> {
        let prices = self.attributes.get("tcgplayer")?.get("prices")?;
        PRICE_VARIANTS.iter().find_map(|variant| {
            prices
                .get(variant)
                .and_then(|detail| detail.get("market"))
                .and_then(Value::as_f64)
                .filter(|price| *price > 0.0)
        })
    }
}

// == Catalog Item ==
/// An item as handed over by the catalog: its id plus its attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: String,
    #[serde(flatten)]
    pub snapshot: ItemSnapshot,
}

impl CatalogItem {
    pub fn new(id: impl Into<String>, snapshot: ItemSnapshot) -> Self {
        Self {
            id: id.into(),
            snapshot,
        }
    }
}

// == Collection Item ==
/// One owned item with its copy count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionItem {
    #[serde(rename = "itemId", alias = "id")]
    pub item_id: String,
    pub quantity: u32,
    #[serde(rename = "addedDate", default, skip_serializing_if = "Option::is_none")]
    pub added_date: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub snapshot: ItemSnapshot,
}

impl CollectionItem {
    /// A first copy of `item`, added at `now`.
    ///
    /// Attributes named like the entry's own fields are discarded; the
    /// entry's id, quantity and date always come from here.
    pub fn first_copy(item: CatalogItem, now: DateTime<Utc>) -> Self {
        Self {
            item_id: item.id,
            quantity: 1,
            added_date: Some(now),
            snapshot: item.snapshot.without_reserved_keys(),
        }
    }

    /// Display name used for ordering.
    pub fn name(&self) -> &str {
        &self.snapshot.name
    }

    /// Market value of all copies, zero when unpriced.
    pub fn value(&self) -> f64 {
        self.snapshot.market_price().unwrap_or(0.0) * f64::from(self.quantity)
    }
}

/// Primary sort key: decomposed, accents stripped, lowercased.
fn collation_key(name: &str) -> String {
    name.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Collection ordering: by name ignoring case and accents, then by the raw name.
pub fn by_display_name(a: &CollectionItem, b: &CollectionItem) -> Ordering {
    collation_key(a.name())
        .cmp(&collation_key(b.name()))
        .then_with(|| a.name().cmp(b.name()))
}
