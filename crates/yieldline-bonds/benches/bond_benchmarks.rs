//! Benchmarks for bond valuation and curve building.
//!
//! Run with: cargo bench -p yieldline-bonds

use std::collections::BTreeMap;
use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use yieldline_bonds::curve_instruments::{bootstrap_spot_curve, ParCurve, ParQuote, Tenor};
use yieldline_bonds::prelude::*;
use yieldline_core::{Date, YieldConvention};
use yieldline_curves::FlatCurve;

// =============================================================================
// TEST DATA GENERATORS
// =============================================================================

fn date(y: i32, m: u32, d: u32) -> Date {
    Date::from_ymd(y, m, d).unwrap()
}

fn create_test_bond(years: i32, cpn_freq: u32) -> FixedRateBullet {
    FixedRateBullet::builder()
        .issue_date(date(2024, 1, 15))
        .maturity(date(2024 + years, 1, 15))
        .coupon_percent(4.5)
        .frequency(cpn_freq)
        .build()
        .unwrap()
}

fn create_curve_bonds(curve_date: Date, count: i32) -> Vec<FixedRateBullet> {
    (1..=count)
        .map(|years| {
            FixedRateBullet::builder()
                .issue_date(curve_date)
                .maturity(date(2025 + years, 1, 2))
                .coupon_percent(3.0 + 0.1 * f64::from(years))
                .frequency(2)
                .yield_convention(YieldConvention::Annual)
                .settlement_date(curve_date)
                .yield_to_maturity(0.03 + 0.0012 * f64::from(years))
                .build()
                .unwrap()
        })
        .collect()
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_yield_to_maturity(c: &mut Criterion) {
    let mut group = c.benchmark_group("yield_to_maturity");
    let request = ValuationRequest::at(date(2025, 6, 3)).with_price(97.25);

    for years in [2, 10, 30] {
        let bond = create_test_bond(years, 2);
        group.bench_with_input(BenchmarkId::new("semiannual", years), &bond, |b, bond| {
            b.iter(|| bond.yield_to_maturity(black_box(&request)).unwrap());
        });
    }
    group.finish();
}

fn bench_risk(c: &mut Criterion) {
    let bond = create_test_bond(10, 2);
    let request = ValuationRequest::at(date(2025, 6, 3)).with_yield(0.045);

    c.bench_function("analytic_risk", |b| {
        b.iter(|| bond.analytic_risk(black_box(&request)).unwrap());
    });
    c.bench_function("effective_duration", |b| {
        b.iter(|| bond.effective_duration(black_box(&request)).unwrap());
    });
    c.bench_function("dv01", |b| {
        b.iter(|| bond.dv01(black_box(&request)).unwrap());
    });
}

fn bench_spreads(c: &mut Criterion) {
    let bond = create_test_bond(10, 2);
    let curve = FlatCurve::aer(0.04, date(2025, 6, 3));
    let request = ValuationRequest::at(date(2025, 6, 3)).with_price(98.0);

    c.bench_function("z_spread", |b| {
        b.iter(|| bond.z_spread(&curve, black_box(&request)).unwrap());
    });
}

fn bench_bootstrap(c: &mut Criterion) {
    let curve_date = date(2025, 1, 2);
    let mut group = c.benchmark_group("bootstrap");

    for count in [5, 10, 20] {
        let bonds = create_curve_bonds(curve_date, count);
        group.bench_with_input(BenchmarkId::new("spot_curve", count), &bonds, |b, bonds| {
            b.iter(|| {
                bootstrap_spot_curve(curve_date, black_box(bonds), YieldConvention::Annual)
                    .unwrap()
            });
        });
    }

    let quotes: BTreeMap<Tenor, ParQuote> = (1..=10)
        .map(|years| (Tenor::Years(years), ParQuote::at_par(3.0 + 0.1 * f64::from(years), 2)))
        .collect();
    group.bench_function("par_curve_10y", |b| {
        b.iter(|| ParCurve::new(curve_date, black_box(quotes.clone())).unwrap());
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_yield_to_maturity,
    bench_risk,
    bench_spreads,
    bench_bootstrap
);
criterion_main!(benches);
