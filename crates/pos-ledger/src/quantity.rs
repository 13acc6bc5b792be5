use std::collections::HashSet;

use pos_store::PosReader;
use pos_types::{LineId, OrderLine};

use crate::error::LedgerResult;

/// Net quantity of `line` still open to be returned: its own quantity plus
/// the (negative) quantities of its direct refund lines.
///
/// Summed in `i128` and clamped to the `i64` range, so quantities near the
/// limits never wrap.
pub fn returnable_quantity(line: &OrderLine, refunds: &[OrderLine]) -> i64 {
    net_quantity(line, refunds.iter())
}

/// Like [`returnable_quantity`], ignoring the refund lines in `excluded`.
///
/// Re-validating a refund line excludes that line, so its previous value
/// does not count against its new one.
pub fn max_returnable_quantity(
    line: &OrderLine,
    refunds: &[OrderLine],
    excluded: &HashSet<LineId>,
) -> i64 {
    net_quantity(line, refunds.iter().filter(|r| !excluded.contains(&r.id)))
}

fn net_quantity<'a>(line: &OrderLine, refunds: impl Iterator<Item = &'a OrderLine>) -> i64 {
    let total = i128::from(line.qty) + refunds.map(|r| i128::from(r.qty)).sum::<i128>();
    i64::try_from(total).unwrap_or(if total < 0 { i64::MIN } else { i64::MAX })
}

/// Store-backed quantity accounting over original lines.
///
/// Only direct refund lines are inspected: refund lines always target an
/// original line, never another refund line.
pub struct LineLedger;

impl LineLedger {
    pub fn returnable_quantity<R: PosReader + ?Sized>(
        reader: &R,
        line: LineId,
    ) -> LedgerResult<i64> {
        let original = reader.require_line(line)?;
        let refunds = reader.refund_lines(line)?;
        Ok(returnable_quantity(&original, &refunds))
    }

    pub fn max_returnable_quantity<R: PosReader + ?Sized>(
        reader: &R,
        line: LineId,
        excluded: &HashSet<LineId>,
    ) -> LedgerResult<i64> {
        let original = reader.require_line(line)?;
        let refunds = reader.refund_lines(line)?;
        Ok(max_returnable_quantity(&original, &refunds, excluded))
    }
}

#[cfg(test)]
mod tests {
    use pos_store::StoreError;
    use pos_types::{OrderId, ProductId};
    use proptest::prelude::*;

    use super::*;
    use crate::error::LedgerError;
    use crate::fixtures::Fixture;

    fn line(id: u64, qty: i64, returned: Option<u64>) -> OrderLine {
        OrderLine {
            id: LineId::new(id),
            order: OrderId::new(1),
            product: ProductId::new(1),
            qty,
            price_unit: 1.0,
            discount: 0.0,
            returned_line: returned.map(LineId::new),
        }
    }

    #[test]
    fn no_refunds_returns_own_quantity() {
        let original = line(1, 7, None);
        assert_eq!(returnable_quantity(&original, &[]), 7);
        assert_eq!(max_returnable_quantity(&original, &[], &HashSet::new()), 7);
    }

    #[test]
    fn refunds_reduce_returnable_quantity() {
        let original = line(1, 10, None);
        let refunds = [line(2, -3, Some(1)), line(3, -4, Some(1))];
        assert_eq!(returnable_quantity(&original, &refunds), 3);
    }

    #[test]
    fn excluded_refund_does_not_count() {
        let original = line(1, 10, None);
        let refunds = [line(2, -3, Some(1)), line(3, -4, Some(1))];
        let excluded = HashSet::from([LineId::new(3)]);
        assert_eq!(max_returnable_quantity(&original, &refunds, &excluded), 7);
    }

    #[test]
    fn excluding_unknown_ids_changes_nothing() {
        let original = line(1, 10, None);
        let refunds = [line(2, -3, Some(1))];
        let excluded = HashSet::from([LineId::new(99)]);
        assert_eq!(
            max_returnable_quantity(&original, &refunds, &excluded),
            returnable_quantity(&original, &refunds)
        );
    }

    #[test]
    fn reader_backed_quantities_follow_the_store() {
        let mut fx = Fixture::new();
        let (_, lines) = fx.sale(80.0, &[(fx.apple, 10)]);
        let refund = fx.refund(lines[0], -4).unwrap();

        assert_eq!(LineLedger::returnable_quantity(&fx.state, lines[0]).unwrap(), 6);
        let excluded = HashSet::from([refund]);
        assert_eq!(
            LineLedger::max_returnable_quantity(&fx.state, lines[0], &excluded).unwrap(),
            10
        );
    }

    #[test]
    fn unknown_line_is_a_store_error() {
        let fx = Fixture::new();
        let err = LineLedger::returnable_quantity(&fx.state, LineId::new(404)).unwrap_err();
        assert!(matches!(err, LedgerError::Store(StoreError::LineNotFound(_))));
    }

    #[test]
    fn sums_near_the_limits_are_clamped() {
        let original = line(1, i64::MAX, None);
        assert_eq!(returnable_quantity(&original, &[]), i64::MAX);
        assert_eq!(
            returnable_quantity(&original, &[line(2, -i64::MAX, Some(1))]),
            0
        );

        let original = line(1, -5, None);
        let refunds = [line(2, i64::MIN, Some(1)), line(3, i64::MIN, Some(1))];
        assert_eq!(returnable_quantity(&original, &refunds), i64::MIN);

        let original = line(1, i64::MAX, None);
        let refunds = [line(2, i64::MAX, Some(1))];
        assert_eq!(returnable_quantity(&original, &refunds), i64::MAX);
        assert_eq!(
            max_returnable_quantity(&original, &refunds, &HashSet::from([LineId::new(2)])),
            i64::MAX
        );
    }

    proptest! {
        #[test]
        fn sum_of_refunds_is_subtracted(
            qty in 0i64..1_000,
            refunds in proptest::collection::vec(-50i64..=0, 0..12),
        ) {
            let original = line(1, qty, None);
            let refund_lines: Vec<OrderLine> = refunds
                .iter()
                .enumerate()
                .map(|(i, q)| line(i as u64 + 2, *q, Some(1)))
                .collect();
            let expected = qty + refunds.iter().sum::<i64>();
            prop_assert_eq!(returnable_quantity(&original, &refund_lines), expected);
        }

        #[test]
        fn excluding_one_refund_adds_it_back(
            qty in 0i64..1_000,
            refunds in proptest::collection::vec(-50i64..=0, 1..12),
            pick in any::<prop::sample::Index>(),
        ) {
            let original = line(1, qty, None);
            let refund_lines: Vec<OrderLine> = refunds
                .iter()
                .enumerate()
                .map(|(i, q)| line(i as u64 + 2, *q, Some(1)))
                .collect();
            let excluded = &refund_lines[pick.index(refund_lines.len())];
            prop_assert_eq!(
                max_returnable_quantity(&original, &refund_lines, &HashSet::from([excluded.id])),
                returnable_quantity(&original, &refund_lines) - excluded.qty
            );
        }
    }
}
