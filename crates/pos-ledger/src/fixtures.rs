//! Shared test fixture: one till, one session, a few products.

use pos_store::{PosReader, PosState, PosWriter};
use pos_types::{
    ConfigId, LineDraft, LineId, OrderDraft, OrderId, OrderState, Partner, PartnerId, PosConfig,
    PosSession, Product, ProductId, SessionId,
};

use crate::error::LedgerResult;
use crate::validation::WriteOptions;
use crate::writer::{LineWrite, LineWriter};

pub(crate) struct Fixture {
    pub state: PosState,
    pub config: ConfigId,
    pub session: SessionId,
    pub partner: PartnerId,
    pub apple: ProductId,
    pub pear: ProductId,
    /// Allows bare negative lines.
    pub deposit: ProductId,
    sequence: u32,
}

impl Fixture {
    pub fn new() -> Self {
        let mut state = PosState::new();
        let config = ConfigId::new(1);
        let session = SessionId::new(1);
        state.add_config(PosConfig::new(config, "Main"));
        state.add_session(PosSession { id: session, config });
        state.add_partner(Partner {
            id: PartnerId::new(1),
            display_name: "Azure Interior".into(),
        });
        state.add_product(Product::new(ProductId::new(1), "Apple"));
        state.add_product(Product::new(ProductId::new(2), "Pear"));
        state.add_product(Product::new(ProductId::new(3), "Deposit").allowing_negative_qty());
        Self {
            state,
            config,
            session,
            partner: PartnerId::new(1),
            apple: ProductId::new(1),
            pear: ProductId::new(2),
            deposit: ProductId::new(3),
            sequence: 0,
        }
    }

    /// Draft of the next paid order of the fixture session.
    pub fn paid_draft(&mut self, amount_total: f64) -> OrderDraft {
        self.sequence += 1;
        let mut draft = OrderDraft::paid(
            format!("Main/{:04}", self.sequence),
            self.config,
            amount_total,
        );
        draft.pos_reference = Some(format!("Order 00001-001-{:04}", self.sequence));
        draft.session = Some(self.session);
        draft
    }

    /// Insert `draft` with one line per `(product, qty)` at unit price 10.
    pub fn order(&mut self, draft: OrderDraft, lines: &[(ProductId, i64)]) -> (OrderId, Vec<LineId>) {
        let order = self.state.insert_order(draft).unwrap();
        let lines = lines
            .iter()
            .map(|(product, qty)| {
                self.state
                    .insert_line(LineDraft::sale(order, *product, *qty, 10.0))
                    .unwrap()
            })
            .collect();
        (order, lines)
    }

    pub fn sale(&mut self, amount_total: f64, lines: &[(ProductId, i64)]) -> (OrderId, Vec<LineId>) {
        let draft = self.paid_draft(amount_total);
        self.order(draft, lines)
    }

    /// A draft order that refund lines can be attached to.
    pub fn refund_holder(&mut self) -> OrderId {
        let mut draft = self.paid_draft(0.0);
        draft.state = OrderState::Draft;
        self.state.insert_order(draft).unwrap()
    }

    /// Refund `qty` of `line` through the guarded write path. A failed
    /// refund leaves the state untouched.
    pub fn refund(&mut self, line: LineId, qty: i64) -> LedgerResult<LineId> {
        let holder = self.refund_holder();
        let mut working = self.state.clone();
        let original = working.require_line(line)?;
        let written = LineWriter::write_batch(
            &mut working,
            vec![LineWrite::Create(original.refund_draft(holder, qty))],
            WriteOptions::default(),
        )?;
        self.state = working;
        Ok(written[0])
    }
}
