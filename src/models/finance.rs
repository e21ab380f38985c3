//! Annualization helpers shared by the financial models.

/// Effective tax rate used by the NETL fixed charge rate.
pub const NETL_EFFECTIVE_TAX_RATE: f64 = 0.2574;

/// After-tax weighted average cost of capital (NETL-PUB-22580, Exhibit 3-2).
pub const NETL_ATWACC: f64 = 0.0473;

/// Capital recovery factor for `rate` over `years`.
///
/// Falls back to straight `1 / years` when the rate is zero.
pub fn capital_recovery_factor(rate: f64, years: u32) -> f64 {
    let n = f64::from(years);
    if rate == 0.0 {
        return 1.0 / n;
    }
    let growth = (1.0 + rate).powf(n);
    rate * growth / (growth - 1.0)
}

/// Fixed charge rate with straight-line tax depreciation over `years`.
///
/// `fcr = crf / (1 - etr) - etr * dep / (1 - etr)` where `dep` is the
/// present value of the depreciation schedule annualized by the CRF.
pub fn fixed_charge_rate(rate: f64, tax_rate: f64, years: u32) -> f64 {
    let crf = capital_recovery_factor(rate, years);
    let share = 1.0 / f64::from(years);
    let pv: f64 = (1..=years)
        .map(|k| share / (1.0 + rate).powi(k as i32))
        .sum();
    let dep = crf * pv;
    crf / (1.0 - tax_rate) - tax_rate * dep / (1.0 - tax_rate)
}

/// [`fixed_charge_rate`] with the NETL tax rate and ATWACC.
pub fn netl_fixed_charge_rate(years: u32) -> f64 {
    fixed_charge_rate(NETL_ATWACC, NETL_EFFECTIVE_TAX_RATE, years)
}

/// Yearly cost of owning and running an asset: `capex * crf + opex`.
pub fn annualized_cost(capex: f64, opex: f64, rate: f64, years: u32) -> f64 {
    capex * capital_recovery_factor(rate, years) + opex
}
