//! Write a small, deterministic set of marketing tables for trying the shell:
//! `campaigns.csv`, `ad_sets.csv`, `ads.json` and `sales.parquet`.
//!
//! ```bash
//! cargo run --bin generate_sample -- sample_data
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};

use sheetmix::data::export::write_table;
use sheetmix::{Row, Table, TableSlot, Value};

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[self.below(items.len())]
    }
}

fn cents(v: f64) -> Value {
    Value::Float((v.max(0.0) * 100.0).round() / 100.0)
}

fn table(slot: TableSlot, columns: &[&str], rows: Vec<Row>) -> Result<Table> {
    Table::new(
        slot.as_str(),
        columns.iter().map(|c| c.to_string()).collect(),
        rows,
    )
    .with_context(|| format!("building {slot}"))
}

fn main() -> Result<()> {
    env_logger::init();

    let out_dir = PathBuf::from(
        std::env::args()
            .nth(1)
            .unwrap_or_else(|| "sample_data".to_string()),
    );
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let mut rng = SimpleRng::new(42);

    let themes = ["Summer Sale", "Black Friday", "Back to School", "Brand Awareness"];
    let objectives = ["conversions", "traffic", "reach"];
    let statuses = ["active", "paused", "archived"];
    let audiences = ["lookalike 1%", "retargeting", "interest: sports", "broad"];
    let formats = ["image", "video", "carousel"];

    let mut campaigns = Vec::new();
    for id in 1..=8i64 {
        let theme = themes[(id as usize - 1) % themes.len()];
        campaigns.push(vec![
            Value::Integer(id),
            Value::from(format!("{theme} #{id}")),
            Value::from(rng.pick(&objectives)),
            Value::from(rng.pick(&statuses)),
            cents(rng.gauss(2000.0, 600.0)),
        ]);
    }

    let mut ad_sets = Vec::new();
    let mut ad_set_id = 100i64;
    for campaign_id in 1..=8i64 {
        for _ in 0..3 {
            ad_set_id += 1;
            ad_sets.push(vec![
                Value::Integer(ad_set_id),
                Value::Integer(campaign_id),
                Value::from(rng.pick(&audiences)),
                cents(rng.gauss(600.0, 200.0)),
            ]);
        }
    }

    let mut ads = Vec::new();
    let mut ad_id = 1000i64;
    for set in 101..=ad_set_id {
        for _ in 0..2 {
            ad_id += 1;
            ads.push(vec![
                Value::Integer(ad_id),
                Value::Integer(set),
                Value::from(format!("Creative {ad_id}")),
                Value::from(rng.pick(&formats)),
            ]);
        }
    }

    // A few sales point at an ad that does not exist, so left and outer
    // joins have something to show.
    let mut sales = Vec::new();
    for order in 1..=200i64 {
        let ad = if rng.below(20) == 0 {
            Value::Integer(9999)
        } else {
            Value::Integer(1001 + rng.below((ad_id - 1000) as usize) as i64)
        };
        let channel = if rng.below(10) == 0 {
            Value::Null
        } else {
            Value::from(rng.pick(&["web", "app", "store"]))
        };
        sales.push(vec![Value::Integer(order), ad, cents(rng.gauss(80.0, 35.0)), channel]);
    }

    let campaign_cols = ["id", "name", "objective", "status", "budget"];
    let tables = [
        (table(TableSlot::Campaigns, &campaign_cols, campaigns)?, "csv"),
        (
            table(TableSlot::AdSets, &["id", "campaign_id", "audience", "budget"], ad_sets)?,
            "csv",
        ),
        (table(TableSlot::Ads, &["id", "ad_set_id", "name", "format"], ads)?, "json"),
        (
            table(TableSlot::Sales, &["order_id", "ad_id", "amount", "channel"], sales)?,
            "parquet",
        ),
    ];

    for (table, ext) in &tables {
        let path = out_dir.join(format!("{}.{ext}", table.name()));
        write_table(table, &path)?;
        println!("Wrote {} rows to {}", table.len(), path.display());
    }
    Ok(())
}
