use std::collections::HashSet;

use pos_store::PosReader;
use pos_types::{LineId, OrderLine, Product};
use tracing::warn;

use crate::error::{LedgerError, LedgerResult, ReturnViolation, ViolationKind};
use crate::quantity::max_returnable_quantity;

/// Options carried explicitly by every guarded line write.
///
/// The negative-quantity override can only be built inside this crate, by
/// refund orchestration. User-facing paths always get the default.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WriteOptions {
    skip_negative_qty_check: bool,
}

impl WriteOptions {
    /// Options for seeding the negated lines of a return order.
    pub(crate) fn refund_seeding() -> Self {
        Self {
            skip_negative_qty_check: true,
        }
    }

    pub fn skips_negative_qty_check(&self) -> bool {
        self.skip_negative_qty_check
    }
}

/// Return rules checked on every created or updated line.
pub struct ReturnValidator;

impl ReturnValidator {
    /// Check one stored line against the current graph.
    ///
    /// For a refund line the target's remaining quantity is computed with the
    /// line itself excluded. A bare negative line is refused unless its
    /// product allows it or `options` carries the refund-seeding override.
    pub fn validate_line<R: PosReader + ?Sized>(
        reader: &R,
        line: &OrderLine,
        options: WriteOptions,
    ) -> LedgerResult<()> {
        let product = reader.require_product(line.product)?;
        let Some(target_id) = line.returned_line else {
            if line.qty < 0 && !product.allow_negative_qty && !options.skip_negative_qty_check {
                return Err(violation(
                    line,
                    &product,
                    ViolationKind::UnauthorizedNegativeQuantity,
                    line.qty,
                    None,
                ));
            }
            return Ok(());
        };

        let target = reader.require_line(target_id)?;
        // `i64::MIN` has no positive counterpart; it exceeds any sold quantity.
        let requested = line.qty.checked_neg();
        if target.is_refund() {
            return Err(violation(
                line,
                &product,
                ViolationKind::NestedRefund,
                requested.unwrap_or(i64::MAX),
                None,
            ));
        }
        let Some(requested) = requested.filter(|q| *q <= target.qty) else {
            return Err(violation(
                line,
                &product,
                ViolationKind::ExceedsOriginalQuantity,
                requested.unwrap_or(i64::MAX),
                Some(target.qty),
            ));
        };

        let refunds = reader.refund_lines(target_id)?;
        let ceiling = max_returnable_quantity(&target, &refunds, &HashSet::from([line.id]));
        if requested > ceiling {
            return Err(violation(
                line,
                &product,
                ViolationKind::ExceedsRemainingReturnable,
                requested,
                Some(ceiling),
            ));
        }
        Ok(())
    }

    /// Re-check every stored line and collect the violations instead of
    /// stopping at the first one.
    ///
    /// Data loaded from a file never went through the guarded write path.
    /// Store errors still abort the audit.
    pub fn audit<R: PosReader + ?Sized>(reader: &R) -> LedgerResult<Vec<ReturnViolation>> {
        let mut found = Vec::new();
        for order in reader.orders()? {
            for line in reader.order_lines(order.id)? {
                match Self::validate_line(reader, &line, WriteOptions::default()) {
                    Ok(()) => {}
                    Err(LedgerError::Violation(v)) => found.push(v),
                    Err(err) => return Err(err),
                }
            }
        }
        if !found.is_empty() {
            warn!(violations = found.len(), "stored lines break the return rules");
        }
        Ok(found)
    }

    /// Check every line in `lines`; the first failure is returned.
    pub fn validate_lines<R: PosReader + ?Sized>(
        reader: &R,
        lines: &[LineId],
        options: WriteOptions,
    ) -> LedgerResult<()> {
        for id in lines {
            let line = reader.require_line(*id)?;
            Self::validate_line(reader, &line, options)?;
        }
        Ok(())
    }
}

fn violation(
    line: &OrderLine,
    product: &Product,
    kind: ViolationKind,
    quantity: i64,
    ceiling: Option<i64>,
) -> LedgerError {
    warn!(line = %line.id, %kind, quantity, ?ceiling, "return rule violated");
    ReturnViolation {
        line: line.id,
        kind,
        quantity,
        ceiling,
        product: product.name.clone(),
        uom: product.uom.clone(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use pos_store::{PosWriter, StoreError};
    use pos_types::{LineDraft, LineUpdate};

    use proptest::prelude::*;

    use super::*;
    use crate::fixtures::Fixture;
    use crate::quantity::LineLedger;

    fn kind(result: LedgerResult<LineId>) -> ViolationKind {
        result
            .unwrap_err()
            .violation()
            .map(|v| v.kind)
            .expect("expected a return violation")
    }

    #[test]
    fn default_options_do_not_skip() {
        assert!(!WriteOptions::default().skips_negative_qty_check());
        assert!(WriteOptions::refund_seeding().skips_negative_qty_check());
    }

    #[test]
    fn refund_beyond_original_quantity_fails() {
        let mut fx = Fixture::new();
        let (_, lines) = fx.sale(80.0, &[(fx.apple, 10)]);

        let err = fx.refund(lines[0], -11).unwrap_err();
        let v = err.violation().unwrap();
        assert_eq!(v.kind, ViolationKind::ExceedsOriginalQuantity);
        assert_eq!(v.quantity, 11);
        assert_eq!(v.ceiling, Some(10));
        assert_eq!(v.product, "Apple");
        assert_eq!(v.uom, "Units");
    }

    #[test]
    fn full_refund_then_one_more_fails_with_zero_ceiling() {
        let mut fx = Fixture::new();
        let (_, lines) = fx.sale(80.0, &[(fx.apple, 10)]);

        fx.refund(lines[0], -10).unwrap();
        let err = fx.refund(lines[0], -1).unwrap_err();
        let v = err.violation().unwrap();
        assert_eq!(v.kind, ViolationKind::ExceedsRemainingReturnable);
        assert_eq!(v.ceiling, Some(0));
    }

    #[test]
    fn refund_at_exact_ceiling_succeeds_and_one_more_fails() {
        let mut fx = Fixture::new();
        let (_, lines) = fx.sale(80.0, &[(fx.apple, 10)]);
        fx.refund(lines[0], -3).unwrap();

        assert_eq!(kind(fx.refund(lines[0], -8)), ViolationKind::ExceedsRemainingReturnable);
        fx.refund(lines[0], -7).unwrap();
    }

    #[test]
    fn editing_a_refund_line_excludes_itself() {
        let mut fx = Fixture::new();
        let (_, lines) = fx.sale(80.0, &[(fx.apple, 10)]);
        let refund = fx.refund(lines[0], -6).unwrap();

        // Without self-exclusion -10 would be checked against a ceiling of 4.
        fx.state.update_line(refund, &LineUpdate::qty(-10)).unwrap();
        let line = fx.state.require_line(refund).unwrap();
        ReturnValidator::validate_line(&fx.state, &line, WriteOptions::default()).unwrap();
    }

    #[test]
    fn bare_negative_line_needs_permission_or_override() {
        let mut fx = Fixture::new();
        let (order, _) = fx.sale(0.0, &[]);
        let id = fx
            .state
            .insert_line(LineDraft::sale(order, fx.apple, -2, 1.0))
            .unwrap();
        let line = fx.state.require_line(id).unwrap();

        let err = ReturnValidator::validate_line(&fx.state, &line, WriteOptions::default())
            .unwrap_err();
        let v = err.violation().unwrap();
        assert_eq!(v.kind, ViolationKind::UnauthorizedNegativeQuantity);
        assert_eq!(v.quantity, -2);
        assert_eq!(v.ceiling, None);

        ReturnValidator::validate_line(&fx.state, &line, WriteOptions::refund_seeding()).unwrap();
    }

    #[test]
    fn product_allowing_negative_quantity_passes() {
        let mut fx = Fixture::new();
        let (order, _) = fx.sale(0.0, &[]);
        let id = fx
            .state
            .insert_line(LineDraft::sale(order, fx.deposit, -2, 0.1))
            .unwrap();
        let line = fx.state.require_line(id).unwrap();
        ReturnValidator::validate_line(&fx.state, &line, WriteOptions::default()).unwrap();
    }

    #[test]
    fn refund_of_a_refund_is_rejected() {
        let mut fx = Fixture::new();
        let (_, lines) = fx.sale(80.0, &[(fx.apple, 10)]);
        let refund = fx.refund(lines[0], -4).unwrap();

        assert_eq!(kind(fx.refund(refund, 2)), ViolationKind::NestedRefund);
    }

    #[test]
    fn positive_original_lines_always_pass() {
        let mut fx = Fixture::new();
        let (_, lines) = fx.sale(10.0, &[(fx.apple, 3)]);
        ReturnValidator::validate_lines(&fx.state, &lines, WriteOptions::default()).unwrap();
    }

    #[test]
    fn missing_line_is_reported_as_store_error() {
        let fx = Fixture::new();
        let err = ReturnValidator::validate_lines(
            &fx.state,
            &[LineId::new(404)],
            WriteOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::Store(StoreError::LineNotFound(_))));
    }

    #[test]
    fn refund_of_i64_min_exceeds_the_original_line() {
        let mut fx = Fixture::new();
        let (_, lines) = fx.sale(80.0, &[(fx.apple, 10)]);

        let err = fx.refund(lines[0], i64::MIN).unwrap_err();
        let v = err.violation().unwrap();
        assert_eq!(v.kind, ViolationKind::ExceedsOriginalQuantity);
        assert_eq!(v.quantity, i64::MAX);
        assert_eq!(v.ceiling, Some(10));
        assert!(fx.state.refund_lines(lines[0]).unwrap().is_empty());
        assert_eq!(LineLedger::returnable_quantity(&fx.state, lines[0]).unwrap(), 10);
    }

    #[test]
    fn refund_of_i64_min_against_a_refund_is_still_nested() {
        let mut fx = Fixture::new();
        let (_, lines) = fx.sale(80.0, &[(fx.apple, 10)]);
        let refund = fx.refund(lines[0], -4).unwrap();

        assert_eq!(kind(fx.refund(refund, i64::MIN)), ViolationKind::NestedRefund);
    }

    #[test]
    fn line_sold_at_i64_max_can_be_fully_returned_once() {
        let mut fx = Fixture::new();
        let (_, lines) = fx.sale(80.0, &[(fx.apple, i64::MAX)]);

        fx.refund(lines[0], -i64::MAX).unwrap();
        assert_eq!(LineLedger::returnable_quantity(&fx.state, lines[0]).unwrap(), 0);

        let err = fx.refund(lines[0], -1).unwrap_err();
        let v = err.violation().unwrap();
        assert_eq!(v.kind, ViolationKind::ExceedsRemainingReturnable);
        assert_eq!(v.ceiling, Some(0));
        assert_eq!(kind(fx.refund(lines[0], i64::MIN)), ViolationKind::ExceedsOriginalQuantity);
    }

    #[test]
    fn audit_of_guarded_data_is_clean() {
        let mut fx = Fixture::new();
        let (_, lines) = fx.sale(80.0, &[(fx.apple, 10), (fx.pear, 2)]);
        fx.refund(lines[0], -4).unwrap();
        fx.refund(lines[1], -2).unwrap();

        assert!(ReturnValidator::audit(&fx.state).unwrap().is_empty());
    }

    #[test]
    fn audit_reports_lines_written_around_the_guard() {
        let mut fx = Fixture::new();
        let (_, lines) = fx.sale(80.0, &[(fx.apple, 10)]);
        let holder = fx.refund_holder();
        let original = fx.state.require_line(lines[0]).unwrap();
        // Raw store writes skip validation, like a hand-edited data file.
        let first = fx.state.insert_line(original.refund_draft(holder, -6)).unwrap();
        let second = fx.state.insert_line(original.refund_draft(holder, -6)).unwrap();
        let nested_target = fx.state.require_line(first).unwrap();
        let nested = fx.state.insert_line(nested_target.refund_draft(holder, 1)).unwrap();

        let found = ReturnValidator::audit(&fx.state).unwrap();
        let kinds: Vec<(LineId, ViolationKind)> = found.iter().map(|v| (v.line, v.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                (first, ViolationKind::ExceedsRemainingReturnable),
                (second, ViolationKind::ExceedsRemainingReturnable),
                (nested, ViolationKind::NestedRefund),
            ]
        );
    }

    proptest! {
        #[test]
        fn returnable_never_goes_negative(
            sold in 0i64..40,
            attempts in proptest::collection::vec(-15i64..=0, 1..20),
        ) {
            let mut fx = Fixture::new();
            let (_, lines) = fx.sale(100.0, &[(fx.apple, sold)]);
            let mut accepted = 0;
            for qty in attempts {
                if fx.refund(lines[0], qty).is_ok() {
                    accepted += qty;
                }
                let left = LineLedger::returnable_quantity(&fx.state, lines[0]).unwrap();
                prop_assert!(left >= 0);
                prop_assert_eq!(left, sold + accepted);
            }
        }
    }
}
