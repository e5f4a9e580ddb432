use std::fmt;
use std::str::FromStr;

use log::info;

use crate::combine::CombineError;
use crate::data::model::Table;

// ---------------------------------------------------------------------------
// Standard slots
// ---------------------------------------------------------------------------

/// The four datasets of the marketing workflow. The registry takes any name;
/// these just give the usual ones a stable spelling and order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableSlot {
    Campaigns,
    AdSets,
    Ads,
    Sales,
}

impl TableSlot {
    /// Display order.
    pub const ALL: [TableSlot; 4] = [
        TableSlot::Campaigns,
        TableSlot::AdSets,
        TableSlot::Ads,
        TableSlot::Sales,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TableSlot::Campaigns => "campaigns",
            TableSlot::AdSets => "ad_sets",
            TableSlot::Ads => "ads",
            TableSlot::Sales => "sales",
        }
    }
}

impl fmt::Display for TableSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TableSlot {
    type Err = CombineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TableSlot::ALL
            .into_iter()
            .find(|slot| slot.as_str() == s)
            .ok_or_else(|| CombineError::UnknownTable(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Loaded tables, addressable by name, in the order they were first added.
/// Passed explicitly to every operation that needs it.
#[derive(Debug, Clone, Default)]
pub struct TableRegistry {
    tables: Vec<Table>,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `table` under its own name. A table already stored under that
    /// name is replaced in place and returned.
    pub fn put(&mut self, table: Table) -> Option<Table> {
        match self.tables.iter_mut().find(|t| t.name() == table.name()) {
            Some(slot) => {
                info!(
                    "replacing '{}' ({} rows) with {} rows, {} columns",
                    table.name(),
                    slot.len(),
                    table.len(),
                    table.width()
                );
                Some(std::mem::replace(slot, table))
            }
            None => {
                info!(
                    "registered '{}': {} rows, {} columns",
                    table.name(),
                    table.len(),
                    table.width()
                );
                self.tables.push(table);
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name() == name)
    }

    pub fn get_or_err(&self, name: &str) -> Result<&Table, CombineError> {
        self.get(name)
            .ok_or_else(|| CombineError::UnknownTable(name.to_string()))
    }

    pub fn slot(&self, slot: TableSlot) -> Option<&Table> {
        self.get(slot.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn remove(&mut self, name: &str) -> Option<Table> {
        let idx = self.tables.iter().position(|t| t.name() == name)?;
        Some(self.tables.remove(idx))
    }

    /// Names of the present tables.
    pub fn names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Table> {
        self.tables.iter()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// A combination needs at least two tables.
    pub fn can_combine(&self) -> bool {
        self.tables.len() >= 2
    }
}
