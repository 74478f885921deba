//! Quote calculation.
//!
//! Every catalog price is multiplied by the manufacturer cost multiplier and
//! then by the buyer's group multiplier. Assembly fees are computed on the
//! multiplied unit price. Discount and tax are applied in that order to the
//! style total:
//!
//! ```text
//! unit        = base × manufacturer × group
//! fee         = flat amount | unit × pct / 100
//! style_total = cabinet_parts + assembly_fees + custom_items + modifications
//! discount    = style_total × d / 100
//! tax         = (style_total − discount) × t / 100
//! grand_total = style_total − discount + tax
//! ```
//!
//! Money is rounded to cents, half away from zero, for each line and each
//! aggregate. Every product and sum is checked; a quote whose totals leave the
//! range of [`Decimal`] is rejected with [`PricingValidationError::Overflow`].

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::domain::catalog::{AssemblyCost, AssemblyCostKind};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Round an amount to cents, half away from zero, with a fixed scale of two.
///
/// # Examples
/// ```
/// use cabinet_backend::domain::pricing::round_money;
/// use rust_decimal::Decimal;
///
/// assert_eq!(round_money(Decimal::new(1005, 3)).to_string(), "1.01");
/// assert_eq!(round_money(Decimal::new(-1005, 3)).to_string(), "-1.01");
/// assert_eq!(round_money(Decimal::from(25)).to_string(), "25.00");
/// ```
pub fn round_money(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

/// Validation errors for quote inputs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PricingValidationError {
    #[error("{field} must be between 0 and 100")]
    PercentOutOfRange { field: &'static str },
    #[error("{field} must not be negative")]
    NegativeAmount { field: &'static str },
    #[error("quantity must be at least 1")]
    ZeroQuantity,
    #[error("multiplier must be greater than zero")]
    NonPositiveMultiplier,
    #[error("quote amounts are too large to price")]
    Overflow,
}

fn mul(lhs: Decimal, rhs: Decimal) -> Result<Decimal, PricingValidationError> {
    lhs.checked_mul(rhs).ok_or(PricingValidationError::Overflow)
}

fn add(lhs: Decimal, rhs: Decimal) -> Result<Decimal, PricingValidationError> {
    lhs.checked_add(rhs).ok_or(PricingValidationError::Overflow)
}

fn sub(lhs: Decimal, rhs: Decimal) -> Result<Decimal, PricingValidationError> {
    lhs.checked_sub(rhs).ok_or(PricingValidationError::Overflow)
}

/// `amount × percent / 100`.
fn percent_of(amount: Decimal, percent: Decimal) -> Result<Decimal, PricingValidationError> {
    Ok(mul(amount, percent)? / HUNDRED)
}

fn sum<I>(amounts: I) -> Result<Decimal, PricingValidationError>
where
    I: IntoIterator<Item = Result<Decimal, PricingValidationError>>,
{
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |total, amount| add(total, amount?))
}

/// Multipliers in effect for a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Multipliers {
    pub manufacturer: Decimal,
    /// Already resolved: `1` when the group multiplier is disabled.
    pub group: Decimal,
}

impl Default for Multipliers {
    fn default() -> Self {
        Self {
            manufacturer: Decimal::ONE,
            group: Decimal::ONE,
        }
    }
}

impl Multipliers {
    /// Combined factor applied to base prices.
    pub fn factor(&self) -> Result<Decimal, PricingValidationError> {
        mul(self.manufacturer, self.group)
    }

    /// Multiply a base price and round to cents.
    pub fn apply(&self, base: Decimal) -> Result<Decimal, PricingValidationError> {
        Ok(round_money(mul(mul(base, self.manufacturer)?, self.group)?))
    }
}

/// A catalog line on a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuoteLine {
    pub base_price: Decimal,
    pub quantity: u32,
    pub assembly: Option<AssemblyCost>,
    pub include_assembly: bool,
}

/// Priced extra row: a custom item or a resolved modification template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedExtra {
    pub price: Decimal,
    pub quantity: u32,
}

/// Everything needed to price a quote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuoteInput {
    pub multipliers: Multipliers,
    pub lines: Vec<QuoteLine>,
    pub custom_items: Vec<PricedExtra>,
    pub modifications: Vec<PricedExtra>,
    pub discount_percent: Decimal,
    pub tax_percent: Decimal,
}

fn check_percent(value: Decimal, field: &'static str) -> Result<(), PricingValidationError> {
    if value < Decimal::ZERO || value > HUNDRED {
        return Err(PricingValidationError::PercentOutOfRange { field });
    }
    Ok(())
}

fn check_amount(value: Decimal, field: &'static str) -> Result<(), PricingValidationError> {
    if value < Decimal::ZERO {
        return Err(PricingValidationError::NegativeAmount { field });
    }
    Ok(())
}

impl QuoteInput {
    /// Reject out-of-range percentages, negative prices and zero quantities.
    pub fn validate(&self) -> Result<(), PricingValidationError> {
        if self.multipliers.manufacturer <= Decimal::ZERO || self.multipliers.group <= Decimal::ZERO
        {
            return Err(PricingValidationError::NonPositiveMultiplier);
        }
        check_percent(self.discount_percent, "discount")?;
        check_percent(self.tax_percent, "tax")?;
        for line in &self.lines {
            check_amount(line.base_price, "price")?;
            if line.quantity == 0 {
                return Err(PricingValidationError::ZeroQuantity);
            }
            if let Some(cost) = line.assembly {
                check_amount(cost.amount, "assembly cost")?;
                if cost.kind == AssemblyCostKind::Percentage {
                    check_percent(cost.amount, "assembly percentage")?;
                }
            }
        }
        for extra in self.custom_items.iter().chain(&self.modifications) {
            check_amount(extra.price, "price")?;
            if extra.quantity == 0 {
                return Err(PricingValidationError::ZeroQuantity);
            }
        }
        Ok(())
    }
}

/// Priced catalog line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineBreakdown {
    pub unit_price: Decimal,
    pub assembly_fee: Decimal,
    pub quantity: u32,
    pub total: Decimal,
}

/// Fee for one unit given the multiplied unit price.
pub fn assembly_fee(
    unit_price: Decimal,
    cost: AssemblyCost,
) -> Result<Decimal, PricingValidationError> {
    Ok(match cost.kind {
        AssemblyCostKind::Flat => round_money(cost.amount),
        AssemblyCostKind::Percentage => round_money(percent_of(unit_price, cost.amount)?),
    })
}

/// Price a single catalog line.
///
/// # Examples
/// ```
/// use cabinet_backend::domain::catalog::{AssemblyCost, AssemblyCostKind};
/// use cabinet_backend::domain::pricing::{price_line, Multipliers, QuoteLine};
/// use rust_decimal::Decimal;
///
/// let multipliers = Multipliers {
///     manufacturer: Decimal::new(15, 1),
///     group: Decimal::new(12, 1),
/// };
/// let line = QuoteLine {
///     base_price: Decimal::from(100),
///     quantity: 1,
///     assembly: Some(AssemblyCost { kind: AssemblyCostKind::Flat, amount: Decimal::from(25) }),
///     include_assembly: true,
/// };
/// let priced = price_line(&multipliers, &line).expect("in range");
/// assert_eq!(priced.total, Decimal::from(205));
/// ```
///
/// # Errors
/// [`PricingValidationError::Overflow`] when the line total leaves the
/// representable range.
pub fn price_line(
    multipliers: &Multipliers,
    line: &QuoteLine,
) -> Result<LineBreakdown, PricingValidationError> {
    let unit_price = multipliers.apply(line.base_price)?;
    let fee = match (line.include_assembly, line.assembly) {
        (true, Some(cost)) => assembly_fee(unit_price, cost)?,
        _ => round_money(Decimal::ZERO),
    };
    let quantity = Decimal::from(line.quantity);
    Ok(LineBreakdown {
        unit_price,
        assembly_fee: fee,
        quantity: line.quantity,
        total: round_money(mul(add(unit_price, fee)?, quantity)?),
    })
}

/// Computed quote totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub lines: Vec<LineBreakdown>,
    pub cabinet_parts: Decimal,
    pub assembly_fees: Decimal,
    pub custom_items: Decimal,
    pub modifications: Decimal,
    pub style_total: Decimal,
    pub discount: Decimal,
    pub after_discount: Decimal,
    pub tax: Decimal,
    pub grand_total: Decimal,
}

/// Discount and tax applied to a style total.
fn finish(
    style_total: Decimal,
    discount_percent: Decimal,
    tax_percent: Decimal,
) -> Result<[Decimal; 4], PricingValidationError> {
    let style_total = round_money(style_total);
    let discount = round_money(percent_of(style_total, discount_percent)?);
    let after_discount = round_money(sub(style_total, discount)?);
    let tax = round_money(percent_of(after_discount, tax_percent)?);
    Ok([discount, after_discount, tax, round_money(add(after_discount, tax)?)])
}

fn extras_total(
    multipliers: &Multipliers,
    extras: &[PricedExtra],
    multiply: bool,
) -> Result<Decimal, PricingValidationError> {
    sum(extras.iter().map(|extra| {
        let unit = if multiply {
            multipliers.apply(extra.price)?
        } else {
            round_money(extra.price)
        };
        Ok(round_money(mul(unit, Decimal::from(extra.quantity))?))
    }))
}

/// Price a full quote.
pub fn calculate(input: &QuoteInput) -> Result<Quote, PricingValidationError> {
    input.validate()?;
    let lines = input
        .lines
        .iter()
        .map(|line| price_line(&input.multipliers, line))
        .collect::<Result<Vec<_>, _>>()?;
    let cabinet_parts = round_money(sum(
        lines
            .iter()
            .map(|l| mul(l.unit_price, Decimal::from(l.quantity))),
    )?);
    let assembly_fees = round_money(sum(
        lines
            .iter()
            .map(|l| mul(l.assembly_fee, Decimal::from(l.quantity))),
    )?);
    let custom_items = round_money(extras_total(&input.multipliers, &input.custom_items, true)?);
    let modifications =
        round_money(extras_total(&input.multipliers, &input.modifications, false)?);
    let style_total = round_money(sum([
        Ok(cabinet_parts),
        Ok(assembly_fees),
        Ok(custom_items),
        Ok(modifications),
    ])?);
    let [discount, after_discount, tax, grand_total] =
        finish(style_total, input.discount_percent, input.tax_percent)?;
    Ok(Quote {
        lines,
        cabinet_parts,
        assembly_fees,
        custom_items,
        modifications,
        style_total,
        discount,
        after_discount,
        tax,
        grand_total,
    })
}

/// Totals for an alternative style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleComparison {
    /// Multiplied difference between the alternative and current base sums.
    pub delta: Decimal,
    pub style_total: Decimal,
    pub discount: Decimal,
    pub after_discount: Decimal,
    pub tax: Decimal,
    pub grand_total: Decimal,
}

/// Re-price a quote as if its cabinets came from another style.
///
/// `current_base` and `alternative_base` are the summed base prices (already
/// multiplied by quantity) of the current and alternative style items.
pub fn compare_style(
    quote: &Quote,
    input: &QuoteInput,
    current_base: Decimal,
    alternative_base: Decimal,
) -> Result<StyleComparison, PricingValidationError> {
    check_amount(current_base, "current base")?;
    check_amount(alternative_base, "alternative base")?;
    let delta = round_money(mul(
        sub(alternative_base, current_base)?,
        input.multipliers.factor()?,
    )?);
    let style_total = round_money(add(quote.style_total, delta)?);
    let [discount, after_discount, tax, grand_total] =
        finish(style_total, input.discount_percent, input.tax_percent)?;
    Ok(StyleComparison {
        delta,
        style_total,
        discount,
        after_discount,
        tax,
        grand_total,
    })
}

#[cfg(test)]
mod tests {
    //! Worked examples and rounding rules.
    use super::*;
    use rstest::{fixture, rstest};
    use rust_decimal_macros::dec;

    #[fixture]
    fn multipliers() -> Multipliers {
        Multipliers {
            manufacturer: dec!(1.5),
            group: dec!(1.2),
        }
    }

    fn line(assembly: Option<AssemblyCost>, include_assembly: bool) -> QuoteLine {
        QuoteLine {
            base_price: dec!(100),
            quantity: 1,
            assembly,
            include_assembly,
        }
    }

    #[rstest]
    #[case(None, true, dec!(180))]
    #[case(Some(AssemblyCost { kind: AssemblyCostKind::Percentage, amount: dec!(10) }), true, dec!(198))]
    #[case(Some(AssemblyCost { kind: AssemblyCostKind::Flat, amount: dec!(25) }), true, dec!(205))]
    #[case(Some(AssemblyCost { kind: AssemblyCostKind::Flat, amount: dec!(25) }), false, dec!(180))]
    fn worked_examples(
        multipliers: Multipliers,
        #[case] assembly: Option<AssemblyCost>,
        #[case] include: bool,
        #[case] expected: Decimal,
    ) {
        let priced = price_line(&multipliers, &line(assembly, include)).expect("priced");
        assert_eq!(priced.unit_price, dec!(180));
        assert_eq!(priced.total, expected);
    }

    #[rstest]
    fn quantity_multiplies_unit_and_fee(multipliers: Multipliers) {
        let mut l = line(
            Some(AssemblyCost {
                kind: AssemblyCostKind::Percentage,
                amount: dec!(10),
            }),
            true,
        );
        l.quantity = 3;
        let priced = price_line(&multipliers, &l).expect("priced");
        assert_eq!(priced.assembly_fee, dec!(18));
        assert_eq!(priced.total, dec!(594));
    }

    #[rstest]
    #[case(dec!(0.005), dec!(0.01))]
    #[case(dec!(0.004), dec!(0.00))]
    #[case(dec!(-0.005), dec!(-0.01))]
    #[case(dec!(2.675), dec!(2.68))]
    fn rounds_half_away_from_zero(#[case] raw: Decimal, #[case] expected: Decimal) {
        assert_eq!(round_money(raw), expected);
    }

    #[rstest]
    fn full_quote_applies_discount_then_tax(multipliers: Multipliers) {
        let input = QuoteInput {
            multipliers,
            lines: vec![line(
                Some(AssemblyCost {
                    kind: AssemblyCostKind::Flat,
                    amount: dec!(25),
                }),
                true,
            )],
            custom_items: vec![PricedExtra {
                price: dec!(10),
                quantity: 2,
            }],
            modifications: vec![PricedExtra {
                price: dec!(15),
                quantity: 1,
            }],
            discount_percent: dec!(10),
            tax_percent: dec!(8.25),
        };
        let quote = calculate(&input).expect("valid quote");
        assert_eq!(quote.cabinet_parts, dec!(180));
        assert_eq!(quote.assembly_fees, dec!(25));
        // custom items carry both multipliers: 10 × 1.8 × 2
        assert_eq!(quote.custom_items, dec!(36));
        assert_eq!(quote.modifications, dec!(15));
        assert_eq!(quote.style_total, dec!(256));
        assert_eq!(quote.discount, dec!(25.60));
        assert_eq!(quote.after_discount, dec!(230.40));
        assert_eq!(quote.tax, dec!(19.01));
        assert_eq!(quote.grand_total, dec!(249.41));
    }

    #[rstest]
    fn quote_serialises_with_cents() {
        let input = QuoteInput {
            lines: vec![QuoteLine {
                base_price: dec!(99.999),
                quantity: 1,
                assembly: None,
                include_assembly: false,
            }],
            ..QuoteInput::default()
        };
        let quote = calculate(&input).expect("valid quote");
        insta::assert_json_snapshot!(quote, @r#"
        {
          "lines": [
            {
              "unitPrice": "100.00",
              "assemblyFee": "0.00",
              "quantity": 1,
              "total": "100.00"
            }
          ],
          "cabinetParts": "100.00",
          "assemblyFees": "0.00",
          "customItems": "0.00",
          "modifications": "0.00",
          "styleTotal": "100.00",
          "discount": "0.00",
          "afterDiscount": "100.00",
          "tax": "0.00",
          "grandTotal": "100.00"
        }
        "#);
    }

    #[rstest]
    fn style_comparison_adds_multiplied_delta(multipliers: Multipliers) {
        let input = QuoteInput {
            multipliers,
            lines: vec![line(None, false)],
            discount_percent: dec!(0),
            tax_percent: dec!(10),
            ..QuoteInput::default()
        };
        let quote = calculate(&input).expect("valid quote");
        let comparison = compare_style(&quote, &input, dec!(100), dec!(120)).expect("valid");
        assert_eq!(comparison.delta, dec!(36));
        assert_eq!(comparison.style_total, dec!(216));
        assert_eq!(comparison.grand_total, dec!(237.60));
    }

    #[rstest]
    #[case(dec!(-1), dec!(0))]
    #[case(dec!(101), dec!(0))]
    #[case(dec!(0), dec!(100.01))]
    fn rejects_out_of_range_percentages(#[case] discount: Decimal, #[case] tax: Decimal) {
        let input = QuoteInput {
            discount_percent: discount,
            tax_percent: tax,
            ..QuoteInput::default()
        };
        assert!(matches!(
            calculate(&input),
            Err(PricingValidationError::PercentOutOfRange { .. })
        ));
    }

    #[rstest]
    fn rejects_zero_quantity() {
        let input = QuoteInput {
            lines: vec![QuoteLine {
                base_price: dec!(1),
                quantity: 0,
                assembly: None,
                include_assembly: false,
            }],
            ..QuoteInput::default()
        };
        assert_eq!(calculate(&input), Err(PricingValidationError::ZeroQuantity));
    }

    #[rstest]
    #[case::custom_item(vec![PricedExtra { price: dec!(10000000000000000000000000000), quantity: 10 }], vec![])]
    #[case::modification(vec![], vec![PricedExtra { price: dec!(79228162514264337593543950335), quantity: 2 }])]
    fn oversized_extras_are_rejected(
        #[case] custom_items: Vec<PricedExtra>,
        #[case] modifications: Vec<PricedExtra>,
    ) {
        let input = QuoteInput {
            custom_items,
            modifications,
            ..QuoteInput::default()
        };
        assert_eq!(calculate(&input), Err(PricingValidationError::Overflow));
    }

    #[rstest]
    fn oversized_catalog_line_is_rejected(multipliers: Multipliers) {
        let input = QuoteInput {
            multipliers,
            lines: vec![QuoteLine {
                base_price: dec!(70000000000000000000000000000),
                quantity: 1,
                assembly: None,
                include_assembly: false,
            }],
            ..QuoteInput::default()
        };
        assert_eq!(calculate(&input), Err(PricingValidationError::Overflow));
    }

    #[rstest]
    fn line_totals_that_overflow_in_aggregate_are_rejected() {
        let huge = PricedExtra {
            price: dec!(50000000000000000000000000000),
            quantity: 1,
        };
        let input = QuoteInput {
            modifications: vec![huge, huge],
            ..QuoteInput::default()
        };
        assert_eq!(calculate(&input), Err(PricingValidationError::Overflow));
    }
}
