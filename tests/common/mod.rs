//! Shared fixtures for integration tests

#![allow(dead_code)]

use sheetmix::{JoinKeyPair, JoinKeys, Table, TableRegistry, Value};

pub fn int(i: i64) -> Value {
    Value::Integer(i)
}

pub fn text(s: &str) -> Value {
    Value::from(s)
}

pub fn table(name: &str, columns: &[&str], rows: Vec<Vec<Value>>) -> Table {
    Table::new(name, columns.iter().map(|c| c.to_string()).collect(), rows).unwrap()
}

pub fn keys(pairs: &[(&str, &str, &str, &str)]) -> JoinKeys {
    pairs
        .iter()
        .map(|(l, r, lc, rc)| ((l.to_string(), r.to_string()), JoinKeyPair::new(*lc, *rc)))
        .collect()
}

/// Campaigns {id, name}: (1, "A"), (2, "B")
pub fn campaigns() -> Table {
    table(
        "campaigns",
        &["id", "name"],
        vec![vec![int(1), text("A")], vec![int(2), text("B")]],
    )
}

/// Sales {campaign_id, amount}: (1, 100), (1, 50), (3, 9)
pub fn sales() -> Table {
    table(
        "sales",
        &["campaign_id", "amount"],
        vec![
            vec![int(1), int(100)],
            vec![int(1), int(50)],
            vec![int(3), int(9)],
        ],
    )
}

pub fn registry(tables: Vec<Table>) -> TableRegistry {
    let mut reg = TableRegistry::new();
    for t in tables {
        reg.put(t);
    }
    reg
}
