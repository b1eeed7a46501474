// Property-based tests for cleaning, name normalization and rollup laws.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use proptest::prelude::*;

use ctrlboard_core::{normalize_match, ColumnNames, FieldSpec, RawTable, Table, Value};
use ctrlboard_recon::aggregate::round2;
use ctrlboard_recon::{aggregate, clean, resolve_scope, Number, Selection};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn config_256() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// Arbitrary cell: numbers, padded text, stray header labels, blanks.
fn arb_cell() -> impl Strategy<Value = Value> {
    prop_oneof![
        3 => (-5i64..3000).prop_map(Value::Int),
        1 => (-100.0..100.0f64).prop_map(Value::Float),
        2 => r" ?[A-Za-zÁÉÍÓÚáéíóúñ0-9]{0,8} ?".prop_map(Value::Text),
        1 => r" ?20[0-9]{2}(\.0)? ?".prop_map(Value::Text),
        1 => Just(Value::Text("Año".into())),
        1 => Just(Value::Missing),
    ]
}

fn arb_raw_table() -> impl Strategy<Value = RawTable> {
    prop::collection::vec(prop::collection::vec(arb_cell(), 4), 0..20).prop_map(|rows| {
        RawTable::new(
            "PTAR",
            vec![" Institución".into(), "Sector ".into(), "Año".into(), "AC_Total".into()],
            rows,
        )
    })
}

fn arb_name() -> impl Strategy<Value = String> {
    r"[a-z]{1,8}( [a-z]{1,8}){0,3}"
}

fn accent(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            'a' => 'á',
            'e' => 'é',
            'i' => 'í',
            'o' => 'ó',
            'u' => 'ú',
            other => other,
        })
        .collect()
}

fn sector_table(counts: &[Option<i64>], percents: &[Option<f64>]) -> Table {
    let rows = counts
        .iter()
        .zip(percents)
        .enumerate()
        .map(|(i, (count, pct))| {
            vec![
                Value::Text(format!("org{i}")),
                Value::Text("S1".into()),
                Value::Int(2025),
                count.map(Value::Int).unwrap_or(Value::Missing),
                pct.map(Value::Float).unwrap_or(Value::Missing),
            ]
        })
        .collect();
    Table::try_new(
        "PTAR",
        vec![
            "Institución".into(),
            "Sector".into(),
            "Año".into(),
            "AC_Total".into(),
            "1Cumplimiento".into(),
        ],
        rows,
    )
    .unwrap()
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn clean_is_idempotent(raw in arb_raw_table()) {
        let once = clean(raw).unwrap();
        let twice = clean(once.clone().into_raw()).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn cleaned_years_are_whole_or_missing(raw in arb_raw_table()) {
        let t = clean(raw).unwrap();
        for r in t.records() {
            prop_assert!(matches!(r.get("Año"), Value::Int(_) | Value::Missing));
        }
    }

    #[test]
    fn normalize_ignores_case_padding_and_accents(name in arb_name()) {
        let base = normalize_match(&name);
        prop_assert_eq!(&base, &normalize_match(&format!("  {}\t", name.to_uppercase())));
        prop_assert_eq!(&base, &normalize_match(&accent(&name)));
        prop_assert_eq!(&base, &normalize_match(&accent(&name).to_uppercase()));
    }

    #[test]
    fn rollup_sum_and_mean_laws(
        cells in prop::collection::vec(
            (prop::option::of(0i64..500), prop::option::of(0.0..100.0f64)),
            1..15,
        )
    ) {
        let (counts, percents): (Vec<_>, Vec<_>) = cells.into_iter().unzip();
        let table = sector_table(&counts, &percents);
        let scope = resolve_scope(&table, &Selection::sector("org0", "S1", 2025), &ColumnNames::default());
        let agg = aggregate(&scope, &[FieldSpec::sum("AC_Total"), FieldSpec::mean("1Cumplimiento")]);

        let expected_sum: i64 = counts.iter().flatten().sum();
        prop_assert_eq!(agg.get("AC_Total"), Number::Int(expected_sum));

        let present: Vec<f64> = percents.iter().flatten().copied().collect();
        let expected_mean = if present.is_empty() {
            Number::Int(0)
        } else {
            Number::Float(round2(present.iter().sum::<f64>() / present.len() as f64))
        };
        prop_assert_eq!(agg.get("1Cumplimiento"), expected_mean);
    }

    #[test]
    fn single_reads_source_record(count in 0i64..10_000, pct in 0.0..100.0f64) {
        let table = sector_table(&[Some(count)], &[Some(pct)]);
        let scope = resolve_scope(&table, &Selection::organization("org0", 2025), &ColumnNames::default());
        let agg = aggregate(&scope, &[FieldSpec::sum("AC_Total"), FieldSpec::mean("1Cumplimiento")]);
        prop_assert_eq!(agg.get("AC_Total"), Number::Int(count));
        prop_assert_eq!(agg.get("1Cumplimiento"), Number::Float(round2(pct)));
    }
}
