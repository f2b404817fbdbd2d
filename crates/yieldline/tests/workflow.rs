//! End-to-end valuation through the facade prelude.

use std::collections::BTreeMap;

use approx::assert_relative_eq;
use yieldline::prelude::*;

fn d(y: i32, m: u32, day: u32) -> Date {
    Date::from_ymd(y, m, day).unwrap()
}

#[test]
fn corporate_over_par_curve() {
    let curve_date = d(2025, 1, 2);
    let quotes = BTreeMap::from([
        (Tenor::Years(1), ParQuote::zero_yield(0.040)),
        (Tenor::Years(2), ParQuote::at_par(4.1, 2)),
        (Tenor::Years(5), ParQuote::at_par(4.3, 2)),
    ]);
    let treasuries = ParCurve::new(curve_date, quotes).unwrap();

    let corporate = FixedRateBullet::builder()
        .issue_date(d(2024, 3, 1))
        .maturity(d(2029, 3, 1))
        .coupon_percent(5.25)
        .frequency(2)
        .build()
        .unwrap();
    let request = ValuationRequest::at(curve_date).with_price(101.0);

    let ytm = corporate.yield_to_maturity(&request).unwrap();
    let z = corporate.z_spread(&treasuries, &request).unwrap();
    let g = corporate.g_spread(None, Some(&treasuries), &request).unwrap();
    assert!(z > 0.0);
    assert!(g > 0.0);
    assert!(ytm > 0.043);

    let valuation = corporate
        .value_with_curve(&treasuries, z, &request)
        .unwrap();
    assert_relative_eq!(valuation.value, 0.0, epsilon = 1e-6);
}

#[test]
fn rates_convert_between_conventions() {
    let annual = convert_yield(0.05, YieldConvention::Bey, YieldConvention::Annual).unwrap();
    assert_relative_eq!(annual, 1.025_f64.powi(2) - 1.0, epsilon = 1e-12);

    let cash_flows = [-100.0, 6.0, 106.0];
    let rate = irr(&cash_flows).unwrap();
    assert_relative_eq!(rate, 0.06, epsilon = 1e-9);
}

#[test]
fn loan_payments_discount_back_to_principal() {
    let loan = LevelPaymentLoan::monthly(250_000.0, 0.055, 300).with_payment_interval(3);
    let payment = loan.payment().unwrap();
    let pv = present_value_annuity(payment, loan.periodic_rate(), loan.payments());
    assert_relative_eq!(pv, 250_000.0, epsilon = 1e-6);

    let rows = loan.schedule().unwrap();
    let interest: f64 = rows.iter().map(|row| row.interest).sum();
    assert_relative_eq!(interest, payment * f64::from(loan.payments()) - 250_000.0, epsilon = 1e-6);
}
