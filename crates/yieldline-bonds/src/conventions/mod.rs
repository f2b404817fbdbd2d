//! Valuation conventions and their per-call resolution.
//!
//! Every instrument stores a default set of conventions. A valuation call
//! may override any of them through [`ValuationOverrides`]; the
//! [`ConventionResolver`] merges the two into [`ResolvedConventions`] and
//! checks the result against what the [`InstrumentFamily`] accepts.
//!
//! Annual and Continuous yields are always measured on actual/365, whatever
//! day counts are configured.
//!
//! # Example
//!
//! ```rust
//! use yieldline_bonds::conventions::{
//!     ConventionResolver, InstrumentFamily, ResolvedConventions, ValuationOverrides,
//! };
//! use yieldline_core::{DayCountConvention, YieldConvention};
//!
//! let resolver =
//!     ConventionResolver::new(InstrumentFamily::Bond, ResolvedConventions::bond_defaults())
//!         .unwrap();
//! let annual = resolver
//!     .resolve(&ValuationOverrides::new().with_yield_convention(YieldConvention::Annual))
//!     .unwrap();
//! assert_eq!(annual.day_count, DayCountConvention::Act365);
//! ```

use serde::{Deserialize, Serialize};
use yieldline_core::{DayCount, DayCountConvention, YieldConvention};

use crate::error::{BondError, BondResult};

/// Yield conventions accepted for bonds and floating-rate notes.
pub const BOND_YIELD_CONVENTIONS: [YieldConvention; 5] = [
    YieldConvention::Bey,
    YieldConvention::Annual,
    YieldConvention::Continuous,
    YieldConvention::BeyQ,
    YieldConvention::BeyM,
];

/// Yield conventions accepted for money-market instruments.
pub const MONEY_MARKET_YIELD_CONVENTIONS: [YieldConvention; 5] = [
    YieldConvention::Discount,
    YieldConvention::AddOn,
    YieldConvention::Annual,
    YieldConvention::Continuous,
    YieldConvention::Bey,
];

/// Day counts accepted for measuring time to later coupons.
pub const FOLLOWING_COUPON_DAY_COUNTS: [DayCountConvention; 5] = [
    DayCountConvention::Thirty360,
    DayCountConvention::Thirty360E,
    DayCountConvention::Act360,
    DayCountConvention::Act365,
    DayCountConvention::Thirty365,
];

/// Families of instruments that share a set of valid conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstrumentFamily {
    /// Coupon bonds, custom-flow bonds and floating-rate notes.
    Bond,
    /// Single-payment money-market instruments.
    MoneyMarket,
}

impl InstrumentFamily {
    /// Human readable family name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            InstrumentFamily::Bond => "bonds",
            InstrumentFamily::MoneyMarket => "money market instruments",
        }
    }

    /// Yield conventions valid for the family.
    #[must_use]
    pub fn yield_conventions(&self) -> &'static [YieldConvention] {
        match self {
            InstrumentFamily::Bond => &BOND_YIELD_CONVENTIONS,
            InstrumentFamily::MoneyMarket => &MONEY_MARKET_YIELD_CONVENTIONS,
        }
    }

    /// Day counts valid for following coupons, `None` when unrestricted.
    #[must_use]
    pub fn following_coupon_day_counts(&self) -> Option<&'static [DayCountConvention]> {
        match self {
            InstrumentFamily::Bond => Some(&FOLLOWING_COUPON_DAY_COUNTS),
            InstrumentFamily::MoneyMarket => None,
        }
    }

    /// Checks a yield convention against the family.
    pub fn check_yield_convention(&self, convention: YieldConvention) -> BondResult<()> {
        if self.yield_conventions().contains(&convention) {
            return Ok(());
        }
        Err(self.unsupported_yield_convention(convention))
    }

    pub(crate) fn unsupported_yield_convention(&self, convention: YieldConvention) -> BondError {
        BondError::UnsupportedConvention {
            kind: "yield",
            name: convention.name(),
            family: self.name(),
            supported: join_names(self.yield_conventions().iter().map(|yc| yc.name())),
        }
    }

    /// Checks a following-coupons day count against the family.
    pub fn check_following_day_count(&self, day_count: DayCountConvention) -> BondResult<()> {
        match self.following_coupon_day_counts() {
            Some(allowed) if !allowed.contains(&day_count) => {
                Err(BondError::UnsupportedConvention {
                    kind: "following coupons day count",
                    name: day_count.name(),
                    family: self.name(),
                    supported: join_names(allowed.iter().map(|dc| dc.name())),
                })
            }
            _ => Ok(()),
        }
    }
}

fn join_names<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.collect::<Vec<_>>().join(", ")
}

/// Conventions in force for one valuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedConventions {
    /// Roll weekend payment dates to the following Monday.
    pub adjust_to_business_days: bool,
    /// Day count for accrued interest and elapsed time.
    pub day_count: DayCountConvention,
    /// Day count for the time to each payment.
    pub following_coupons_day_count: DayCountConvention,
    /// Convention yields are quoted in.
    pub yield_convention: YieldConvention,
}

impl ResolvedConventions {
    /// Defaults for coupon bonds: actual/actual-Bond, 30/360, BEY.
    #[must_use]
    pub fn bond_defaults() -> Self {
        Self {
            adjust_to_business_days: false,
            day_count: DayCountConvention::ActActBond,
            following_coupons_day_count: DayCountConvention::Thirty360,
            yield_convention: YieldConvention::Bey,
        }
    }

    /// Defaults for money-market instruments: actual/365, Add-On.
    #[must_use]
    pub fn money_market_defaults() -> Self {
        Self {
            adjust_to_business_days: false,
            day_count: DayCountConvention::Act365,
            following_coupons_day_count: DayCountConvention::Act365,
            yield_convention: YieldConvention::AddOn,
        }
    }

    /// Sets the yield convention.
    #[must_use]
    pub fn with_yield_convention(mut self, yield_convention: YieldConvention) -> Self {
        self.yield_convention = yield_convention;
        self
    }

    /// Sets the accrual day count.
    #[must_use]
    pub fn with_day_count(mut self, day_count: DayCountConvention) -> Self {
        self.day_count = day_count;
        self
    }

    /// Sets the following-coupons day count.
    #[must_use]
    pub fn with_following_coupons_day_count(mut self, day_count: DayCountConvention) -> Self {
        self.following_coupons_day_count = day_count;
        self
    }

    /// Sets business-day adjustment.
    #[must_use]
    pub fn with_adjust_to_business_days(mut self, adjust: bool) -> Self {
        self.adjust_to_business_days = adjust;
        self
    }

    /// Compounding periods per year of the yield convention (1 if none).
    #[must_use]
    pub fn time_adjustment(&self) -> f64 {
        self.yield_convention.time_adjustment()
    }

    /// Annual and Continuous yields measure time on actual/365.
    fn normalized(mut self) -> Self {
        if matches!(
            self.yield_convention,
            YieldConvention::Annual | YieldConvention::Continuous
        ) {
            self.day_count = DayCountConvention::Act365;
            self.following_coupons_day_count = DayCountConvention::Act365;
        }
        self
    }
}

/// Per-call convention overrides. Unset fields use the instrument defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValuationOverrides {
    /// Business-day adjustment override.
    pub adjust_to_business_days: Option<bool>,
    /// Accrual day count override.
    pub day_count: Option<DayCountConvention>,
    /// Following-coupons day count override.
    pub following_coupons_day_count: Option<DayCountConvention>,
    /// Yield convention override.
    pub yield_convention: Option<YieldConvention>,
}

impl ValuationOverrides {
    /// No overrides.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides business-day adjustment.
    #[must_use]
    pub fn with_adjust_to_business_days(mut self, adjust: bool) -> Self {
        self.adjust_to_business_days = Some(adjust);
        self
    }

    /// Overrides the accrual day count.
    #[must_use]
    pub fn with_day_count(mut self, day_count: DayCountConvention) -> Self {
        self.day_count = Some(day_count);
        self
    }

    /// Overrides the following-coupons day count.
    #[must_use]
    pub fn with_following_coupons_day_count(mut self, day_count: DayCountConvention) -> Self {
        self.following_coupons_day_count = Some(day_count);
        self
    }

    /// Overrides the yield convention.
    #[must_use]
    pub fn with_yield_convention(mut self, yield_convention: YieldConvention) -> Self {
        self.yield_convention = Some(yield_convention);
        self
    }
}

/// Default conventions of an instrument plus the family rules they obey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConventionResolver {
    family: InstrumentFamily,
    defaults: ResolvedConventions,
}

impl ConventionResolver {
    /// Creates a resolver after checking the defaults against the family.
    pub fn new(family: InstrumentFamily, defaults: ResolvedConventions) -> BondResult<Self> {
        family.check_yield_convention(defaults.yield_convention)?;
        family.check_following_day_count(defaults.following_coupons_day_count)?;
        Ok(Self {
            family,
            defaults: defaults.normalized(),
        })
    }

    /// Instrument family.
    #[must_use]
    pub fn family(&self) -> InstrumentFamily {
        self.family
    }

    /// Stored defaults.
    #[must_use]
    pub fn defaults(&self) -> ResolvedConventions {
        self.defaults
    }

    /// Merges `overrides` into the defaults.
    ///
    /// # Errors
    ///
    /// Returns `BondError::UnsupportedConvention` if an override is not
    /// valid for the instrument family.
    pub fn resolve(&self, overrides: &ValuationOverrides) -> BondResult<ResolvedConventions> {
        let yield_convention = overrides
            .yield_convention
            .unwrap_or(self.defaults.yield_convention);
        self.family.check_yield_convention(yield_convention)?;

        let following = overrides
            .following_coupons_day_count
            .unwrap_or(self.defaults.following_coupons_day_count);
        if overrides.following_coupons_day_count.is_some() {
            self.family.check_following_day_count(following)?;
        }

        Ok(ResolvedConventions {
            adjust_to_business_days: overrides
                .adjust_to_business_days
                .unwrap_or(self.defaults.adjust_to_business_days),
            day_count: overrides.day_count.unwrap_or(self.defaults.day_count),
            following_coupons_day_count: following,
            yield_convention,
        }
        .normalized())
    }

    /// Whether `resolved` measures yields exactly like the defaults.
    #[must_use]
    pub fn is_default(&self, resolved: &ResolvedConventions) -> bool {
        *resolved == self.defaults
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bond_resolver() -> ConventionResolver {
        ConventionResolver::new(InstrumentFamily::Bond, ResolvedConventions::bond_defaults())
            .unwrap()
    }

    #[test]
    fn test_defaults_resolve_to_themselves() {
        let resolver = bond_resolver();
        let resolved = resolver.resolve(&ValuationOverrides::new()).unwrap();
        assert_eq!(resolved, ResolvedConventions::bond_defaults());
        assert!(resolver.is_default(&resolved));
    }

    #[test]
    fn test_annual_forces_actual_365() {
        let resolved = bond_resolver()
            .resolve(
                &ValuationOverrides::new()
                    .with_yield_convention(YieldConvention::Continuous)
                    .with_day_count(DayCountConvention::Thirty360),
            )
            .unwrap();
        assert_eq!(resolved.day_count, DayCountConvention::Act365);
        assert_eq!(resolved.following_coupons_day_count, DayCountConvention::Act365);
    }

    #[test]
    fn test_overrides_replace_defaults() {
        let resolver = bond_resolver();
        let resolved = resolver
            .resolve(
                &ValuationOverrides::new()
                    .with_day_count(DayCountConvention::Act360)
                    .with_adjust_to_business_days(true),
            )
            .unwrap();
        assert_eq!(resolved.day_count, DayCountConvention::Act360);
        assert!(resolved.adjust_to_business_days);
        assert!(!resolver.is_default(&resolved));
    }

    #[test]
    fn test_family_rules() {
        let resolver = bond_resolver();
        let result =
            resolver.resolve(&ValuationOverrides::new().with_yield_convention(YieldConvention::AddOn));
        assert!(matches!(
            result,
            Err(BondError::UnsupportedConvention { kind: "yield", .. })
        ));

        let result = resolver.resolve(
            &ValuationOverrides::new().with_following_coupons_day_count(DayCountConvention::ActActBond),
        );
        assert!(result.is_err());

        let money_market = ConventionResolver::new(
            InstrumentFamily::MoneyMarket,
            ResolvedConventions::money_market_defaults(),
        )
        .unwrap();
        assert!(money_market
            .resolve(&ValuationOverrides::new().with_yield_convention(YieldConvention::BeyQ))
            .is_err());
        assert!(money_market
            .resolve(&ValuationOverrides::new().with_yield_convention(YieldConvention::Discount))
            .is_ok());
    }

    #[test]
    fn test_invalid_defaults_rejected() {
        let defaults = ResolvedConventions::bond_defaults().with_yield_convention(YieldConvention::Discount);
        assert!(ConventionResolver::new(InstrumentFamily::Bond, defaults).is_err());
    }
}
