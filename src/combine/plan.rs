//! Join planning: validate a selection and lay it out as a left-to-right
//! chain of join steps.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use log::debug;

use crate::data::model::Table;
use crate::registry::TableRegistry;

use super::error::CombineError;

/// How unmatched rows are treated. One mode applies to every step of a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinMode {
    /// Only rows whose key exists on both sides.
    #[default]
    Inner,
    /// Every row of the accumulated table.
    Left,
    /// Every row of the incoming table.
    Right,
    /// Every row of both sides.
    Outer,
}

impl JoinMode {
    pub const ALL: [JoinMode; 4] = [
        JoinMode::Inner,
        JoinMode::Left,
        JoinMode::Right,
        JoinMode::Outer,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            JoinMode::Inner => "inner",
            JoinMode::Left => "left",
            JoinMode::Right => "right",
            JoinMode::Outer => "outer",
        }
    }

    /// Whether unmatched rows of the left side survive.
    pub(crate) fn keeps_left(self) -> bool {
        matches!(self, JoinMode::Left | JoinMode::Outer)
    }

    /// Whether unmatched rows of the right side survive.
    pub(crate) fn keeps_right(self) -> bool {
        matches!(self, JoinMode::Right | JoinMode::Outer)
    }
}

impl fmt::Display for JoinMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JoinMode {
    type Err = CombineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inner" => Ok(JoinMode::Inner),
            "left" => Ok(JoinMode::Left),
            "right" => Ok(JoinMode::Right),
            "outer" | "full" => Ok(JoinMode::Outer),
            _ => Err(CombineError::UnsupportedJoinMode(s.to_string())),
        }
    }
}

/// The two columns compared for equality between adjacent tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinKeyPair {
    pub left: String,
    pub right: String,
}

impl JoinKeyPair {
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        JoinKeyPair {
            left: left.into(),
            right: right.into(),
        }
    }
}

/// `(left table, right table)` → key columns.
pub type JoinKeys = BTreeMap<(String, String), JoinKeyPair>;

/// Table name → columns to keep, in order.
pub type ColumnSelection = BTreeMap<String, Vec<String>>;

/// A registry table plus the columns selected from it.
#[derive(Debug, Clone)]
pub struct ProjectedTable<'a> {
    pub source: &'a Table,
    pub columns: Vec<String>,
}

impl ProjectedTable<'_> {
    pub fn name(&self) -> &str {
        self.source.name()
    }

    pub fn materialize(&self) -> Result<Table, CombineError> {
        Ok(self.source.project(&self.columns)?)
    }
}

/// Join the accumulated table with `right`.
#[derive(Debug, Clone)]
pub struct JoinStep<'a> {
    /// Name of the previous table in the chain; its suffix tags the left
    /// copy of a colliding column.
    pub left_name: String,
    pub right: ProjectedTable<'a>,
    pub keys: JoinKeyPair,
    pub mode: JoinMode,
}

#[derive(Debug, Clone)]
pub struct JoinPlan<'a> {
    pub first: ProjectedTable<'a>,
    pub steps: Vec<JoinStep<'a>>,
    pub mode: JoinMode,
}

impl JoinPlan<'_> {
    /// Table names in chain order.
    pub fn table_names(&self) -> Vec<&str> {
        std::iter::once(self.first.name())
            .chain(self.steps.iter().map(|s| s.right.name()))
            .collect()
    }
}

/// Validate a combination request and lay it out as join steps.
///
/// A table missing from `per_table_columns` keeps all of its columns. Key
/// columns must exist in their source tables, but they do not have to be
/// part of the projection.
pub fn build_plan<'a, S: AsRef<str>>(
    registry: &'a TableRegistry,
    table_names: &[S],
    per_table_columns: &ColumnSelection,
    join_keys: &JoinKeys,
    mode: JoinMode,
) -> Result<JoinPlan<'a>, CombineError> {
    if table_names.len() < 2 {
        return Err(CombineError::InsufficientTables {
            selected: table_names.len(),
        });
    }

    let projected = table_names
        .iter()
        .map(|name| project(registry, name.as_ref(), per_table_columns))
        .collect::<Result<Vec<_>, _>>()?;

    let mut steps = Vec::with_capacity(projected.len() - 1);
    let mut tables = projected.into_iter();
    let first = tables.next().ok_or(CombineError::InsufficientTables { selected: 0 })?;
    let mut left = first.source;

    for right in tables {
        let pair_key = (left.name().to_string(), right.name().to_string());
        let keys = join_keys
            .get(&pair_key)
            .cloned()
            .ok_or_else(|| CombineError::MissingJoinKey {
                left: pair_key.0.clone(),
                right: pair_key.1.clone(),
            })?;

        ensure_column(left, &keys.left)?;
        ensure_column(right.source, &keys.right)?;

        debug!(
            "plan step: {} [{}] {} {} [{}]",
            left.name(),
            keys.left,
            mode,
            right.name(),
            keys.right
        );

        left = right.source;
        steps.push(JoinStep {
            left_name: pair_key.0,
            right,
            keys,
            mode,
        });
    }

    Ok(JoinPlan { first, steps, mode })
}

fn project<'a>(
    registry: &'a TableRegistry,
    name: &str,
    per_table_columns: &ColumnSelection,
) -> Result<ProjectedTable<'a>, CombineError> {
    let source = registry.get_or_err(name)?;
    let columns = match per_table_columns.get(name) {
        Some(cols) => {
            for col in cols {
                ensure_column(source, col)?;
            }
            cols.clone()
        }
        None => source.columns().to_vec(),
    };
    Ok(ProjectedTable { source, columns })
}

fn ensure_column(table: &Table, column: &str) -> Result<(), CombineError> {
    if table.has_column(column) {
        Ok(())
    } else {
        Err(CombineError::UnknownColumn {
            table: table.name().to_string(),
            column: column.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Value;

    fn table(name: &str, cols: &[&str]) -> Table {
        let row = cols.iter().map(|_| Value::Integer(1)).collect();
        Table::new(name, cols.iter().map(|c| c.to_string()).collect(), vec![row]).unwrap()
    }

    fn registry() -> TableRegistry {
        let mut reg = TableRegistry::new();
        reg.put(table("campaigns", &["id", "name"]));
        reg.put(table("ad_sets", &["id", "campaign_id"]));
        reg.put(table("ads", &["id", "ad_set_id"]));
        reg
    }

    fn key(l: &str, r: &str, lc: &str, rc: &str) -> ((String, String), JoinKeyPair) {
        ((l.to_string(), r.to_string()), JoinKeyPair::new(lc, rc))
    }

    #[test]
    fn test_rejects_single_table() {
        let reg = registry();
        let (all, no_keys) = (ColumnSelection::new(), JoinKeys::new());
        let err = build_plan(&reg, &["campaigns"], &all, &no_keys, JoinMode::Inner).unwrap_err();
        assert_eq!(err, CombineError::InsufficientTables { selected: 1 });
    }

    #[test]
    fn test_rejects_missing_second_pair() {
        let reg = registry();
        let keys: JoinKeys = [key("campaigns", "ad_sets", "id", "campaign_id")]
            .into_iter()
            .collect();

        let err = build_plan(
            &reg,
            &["campaigns", "ad_sets", "ads"],
            &ColumnSelection::new(),
            &keys,
            JoinMode::Inner,
        )
        .unwrap_err();
        assert_eq!(
            err,
            CombineError::MissingJoinKey {
                left: "ad_sets".into(),
                right: "ads".into()
            }
        );
    }

    #[test]
    fn test_builds_chain_in_order() {
        let reg = registry();
        let keys: JoinKeys = [
            key("campaigns", "ad_sets", "id", "campaign_id"),
            key("ad_sets", "ads", "id", "ad_set_id"),
        ]
        .into_iter()
        .collect();
        let mut columns = ColumnSelection::new();
        columns.insert("campaigns".into(), vec!["name".into()]);

        let names = ["campaigns", "ad_sets", "ads"];
        let plan = build_plan(&reg, &names, &columns, &keys, JoinMode::Left).unwrap();

        assert_eq!(plan.table_names(), vec!["campaigns", "ad_sets", "ads"]);
        assert_eq!(plan.first.columns, vec!["name".to_string()]);
        assert_eq!(plan.steps.len(), 2);
        assert_eq!(plan.steps[1].left_name, "ad_sets");
        assert_eq!(
            plan.steps[1].right.columns,
            vec!["id".to_string(), "ad_set_id".to_string()]
        );
        assert!(plan.steps.iter().all(|s| s.mode == JoinMode::Left));
    }

    #[test]
    fn test_rejects_unknown_table_and_columns() {
        let reg = registry();
        let all = ColumnSelection::new();
        let keys: JoinKeys = [key("campaigns", "sales", "id", "campaign_id")]
            .into_iter()
            .collect();
        let err =
            build_plan(&reg, &["campaigns", "sales"], &all, &keys, JoinMode::Inner).unwrap_err();
        assert_eq!(err, CombineError::UnknownTable("sales".into()));

        let keys: JoinKeys = [key("campaigns", "ad_sets", "id", "nope")].into_iter().collect();
        let err =
            build_plan(&reg, &["campaigns", "ad_sets"], &all, &keys, JoinMode::Inner).unwrap_err();
        assert!(matches!(err, CombineError::UnknownColumn { ref column, .. } if column == "nope"));
    }

    #[test]
    fn test_join_mode_parsing() {
        assert_eq!("LEFT".parse::<JoinMode>().unwrap(), JoinMode::Left);
        assert_eq!("full".parse::<JoinMode>().unwrap(), JoinMode::Outer);
        assert_eq!(
            "cross".parse::<JoinMode>().unwrap_err(),
            CombineError::UnsupportedJoinMode("cross".into())
        );
        for mode in JoinMode::ALL {
            assert_eq!(mode.to_string().parse::<JoinMode>().unwrap(), mode);
        }
    }
}
