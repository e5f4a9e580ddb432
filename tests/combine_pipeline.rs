//! Integration tests for the combination pipeline
//!
//! Registry → planner → executor, including the sharp edges that are kept
//! on purpose: one mode for the whole chain, and keys that were projected
//! out of an earlier table.

mod common;

use std::path::Path;

use common::*;
use sheetmix::data::loader::load_table;
use sheetmix::{ColumnSelection, CombineError, JoinExecutor, JoinMode, Value, build_plan, execute};

#[test]
fn test_campaigns_sales_inner_scenario() {
    let reg = registry(vec![campaigns(), sales()]);
    let plan = build_plan(
        &reg,
        &["campaigns", "sales"],
        &ColumnSelection::new(),
        &keys(&[("campaigns", "sales", "id", "campaign_id")]),
        JoinMode::Inner,
    )
    .unwrap();
    let result = execute(&plan).unwrap();

    assert_eq!(result.columns(), &["id", "name", "campaign_id", "amount"]);
    assert_eq!(
        result.rows(),
        &[
            vec![int(1), text("A"), int(1), int(100)],
            vec![int(1), text("A"), int(1), int(50)],
        ]
    );
}

#[test]
fn test_self_join_on_unique_key_keeps_cardinality() {
    let a = table(
        "a",
        &["id", "label", "spend"],
        vec![
            vec![int(1), text("x"), int(10)],
            vec![int(2), text("y"), int(20)],
            vec![int(3), text("z"), int(30)],
        ],
    );
    let reg = registry(vec![a.clone(), a.renamed("a_copy")]);

    let plan = build_plan(
        &reg,
        &["a", "a_copy"],
        &ColumnSelection::new(),
        &keys(&[("a", "a_copy", "id", "id")]),
        JoinMode::Inner,
    )
    .unwrap();
    let result = execute(&plan).unwrap();

    assert_eq!(result.len(), a.len());
    assert_eq!(
        result.columns(),
        &["id", "label_a", "spend_a", "label_a_copy", "spend_a_copy"]
    );
}

#[test]
fn test_fan_out_two_by_three() {
    let reg = registry(vec![
        table("a", &["key", "n"], vec![vec![text("x"), int(1)], vec![text("x"), int(2)]]),
        table(
            "b",
            &["key", "m"],
            vec![
                vec![text("x"), int(1)],
                vec![text("x"), int(2)],
                vec![text("x"), int(3)],
            ],
        ),
    ]);
    let plan = build_plan(
        &reg,
        &["a", "b"],
        &ColumnSelection::new(),
        &keys(&[("a", "b", "key", "key")]),
        JoinMode::Inner,
    )
    .unwrap();

    // A warning threshold of 1 still produces every row.
    let result = JoinExecutor::new().with_fan_out_warning(1).execute(&plan).unwrap();
    assert_eq!(result.len(), 6);
}

#[test]
fn test_left_join_preserves_left_cardinality() {
    let reg = registry(vec![
        table(
            "a",
            &["id", "v"],
            vec![
                vec![int(1), text("one")],
                vec![int(2), text("two")],
                vec![int(7), text("seven")],
            ],
        ),
        table("b", &["ref", "w"], vec![vec![int(1), text("b1")], vec![int(2), text("b2")]]),
    ]);
    let plan = build_plan(
        &reg,
        &["a", "b"],
        &ColumnSelection::new(),
        &keys(&[("a", "b", "id", "ref")]),
        JoinMode::Left,
    )
    .unwrap();
    let result = execute(&plan).unwrap();

    assert_eq!(result.len(), 3);
    assert_eq!(
        result.rows()[2],
        vec![int(7), text("seven"), Value::Null, Value::Null]
    );
}

#[test]
fn test_planner_errors() {
    let reg = registry(vec![
        campaigns(),
        table("ad_sets", &["id", "campaign_id"], vec![]),
        table("ads", &["id", "ad_set_id"], vec![]),
    ]);

    let err = build_plan(
        &reg,
        &["campaigns"],
        &ColumnSelection::new(),
        &keys(&[]),
        JoinMode::Inner,
    )
    .unwrap_err();
    assert_eq!(err, CombineError::InsufficientTables { selected: 1 });

    let err = build_plan(
        &reg,
        &["campaigns", "ad_sets", "ads"],
        &ColumnSelection::new(),
        &keys(&[("campaigns", "ad_sets", "id", "campaign_id")]),
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
    assert!(err.to_string().contains("'ad_sets' and 'ads'"));
}

#[test]
fn test_three_table_chain_uses_one_mode() {
    let reg = registry(vec![
        campaigns(),
        table(
            "ad_sets",
            &["set_id", "campaign_id"],
            vec![vec![int(10), int(1)], vec![int(20), int(2)]],
        ),
        table("ads", &["ad_id", "set_id"], vec![vec![int(100), int(10)]]),
    ]);
    let join_keys = keys(&[
        ("campaigns", "ad_sets", "id", "campaign_id"),
        ("ad_sets", "ads", "set_id", "set_id"),
    ]);

    let names = ["campaigns", "ad_sets", "ads"];
    let all = ColumnSelection::new();

    let left =
        execute(&build_plan(&reg, &names, &all, &join_keys, JoinMode::Left).unwrap()).unwrap();
    assert_eq!(left.name(), "campaigns+ad_sets+ads");
    assert_eq!(left.columns(), &["id", "name", "set_id", "campaign_id", "ad_id"]);
    assert_eq!(left.len(), 2);
    assert_eq!(left.value(1, "ad_id"), Some(&Value::Null));

    let inner =
        execute(&build_plan(&reg, &names, &all, &join_keys, JoinMode::Inner).unwrap()).unwrap();
    assert_eq!(inner.len(), 1);
}

#[test]
fn test_key_projected_out_of_earlier_table_fails() {
    let reg = registry(vec![
        campaigns(),
        table("ad_sets", &["set_id", "campaign_id"], vec![vec![int(10), int(1)]]),
        table("ads", &["ad_id", "set_id"], vec![vec![int(100), int(10)]]),
    ]);
    let mut columns = ColumnSelection::new();
    columns.insert("ad_sets".into(), vec!["campaign_id".into()]);

    let plan = build_plan(
        &reg,
        &["campaigns", "ad_sets", "ads"],
        &columns,
        &keys(&[
            ("campaigns", "ad_sets", "id", "campaign_id"),
            ("ad_sets", "ads", "set_id", "set_id"),
        ]),
        JoinMode::Inner,
    )
    .unwrap();

    assert_eq!(
        execute(&plan).unwrap_err(),
        CombineError::JoinKeyNotFound {
            table: "ad_sets".into(),
            column: "set_id".into()
        }
    );
}

#[test]
fn test_unsupported_mode_is_rejected() {
    let err = "cross".parse::<JoinMode>().unwrap_err();
    assert_eq!(err, CombineError::UnsupportedJoinMode("cross".into()));
}

#[test]
fn test_zero_row_table_is_valid_input() {
    let reg = registry(vec![
        campaigns(),
        table("empty", &["campaign_id"], vec![]),
    ]);
    let plan = build_plan(
        &reg,
        &["campaigns", "empty"],
        &ColumnSelection::new(),
        &keys(&[("campaigns", "empty", "id", "campaign_id")]),
        JoinMode::Outer,
    )
    .unwrap();
    let result = execute(&plan).unwrap();
    assert_eq!(result.len(), 2);
    assert_eq!(result.value(0, "campaign_id"), Some(&Value::Null));
}

#[test]
fn test_spreadsheet_ids_join_csv_ids() {
    let xlsx = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/campaigns.xlsx");
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("sales.csv");
    std::fs::write(&csv, "campaign_id,amount\n1,100\n1,50\n3,9\n").unwrap();

    let reg = registry(vec![
        load_table("campaigns", &xlsx).unwrap(),
        load_table("sales", &csv).unwrap(),
    ]);
    let plan = build_plan(
        &reg,
        &["campaigns", "sales"],
        &ColumnSelection::new(),
        &keys(&[("campaigns", "sales", "id", "campaign_id")]),
        JoinMode::Inner,
    )
    .unwrap();
    let out = execute(&plan).unwrap();

    assert_eq!(out.len(), 2);
    assert!(out.column_values("id").unwrap().all(|v| *v == Value::Integer(1)));
}
