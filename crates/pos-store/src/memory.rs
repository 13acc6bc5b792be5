use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;

use chrono::Utc;
use tracing::debug;

use pos_types::{
    ConfigId, LineDraft, LineId, LineUpdate, Order, OrderDraft, OrderId, OrderLine, OrderState,
    Partner, PartnerId, PosConfig, PosSession, Product, ProductId, SessionId,
};

use crate::error::{StoreError, StoreResult};
use crate::snapshot::StoreSnapshot;
use crate::traits::{Duplication, OrderDuplicator, PosReader, PosStore, PosWriter};

/// Complete order/line state with its reverse-link indexes.
///
/// `PosState` is both the contents of an [`InMemoryPosStore`] and the working
/// copy a transaction mutates. Forward links live on the records; the
/// `*_by_*` maps are derived indexes kept in step on every write.
#[derive(Clone, Debug, Default)]
pub struct PosState {
    orders: BTreeMap<OrderId, Order>,
    lines: BTreeMap<LineId, OrderLine>,
    products: BTreeMap<ProductId, Product>,
    partners: BTreeMap<PartnerId, Partner>,
    sessions: BTreeMap<SessionId, PosSession>,
    configs: BTreeMap<ConfigId, PosConfig>,
    lines_by_order: BTreeMap<OrderId, BTreeSet<LineId>>,
    refund_lines_by_target: BTreeMap<LineId, BTreeSet<LineId>>,
    refund_orders_by_target: BTreeMap<OrderId, BTreeSet<OrderId>>,
    next_order: u64,
    next_line: u64,
}

impl PosState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_product(&mut self, product: Product) {
        self.products.insert(product.id, product);
    }

    pub fn add_partner(&mut self, partner: Partner) {
        self.partners.insert(partner.id, partner);
    }

    pub fn add_config(&mut self, config: PosConfig) {
        self.configs.insert(config.id, config);
    }

    pub fn add_session(&mut self, session: PosSession) {
        self.sessions.insert(session.id, session);
    }

    /// Rebuild a state, including its indexes, from a snapshot.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> StoreResult<Self> {
        let mut state = Self::new();
        for product in snapshot.products {
            state.add_product(product);
        }
        for partner in snapshot.partners {
            state.add_partner(partner);
        }
        for config in snapshot.configs {
            state.add_config(config);
        }
        for session in snapshot.sessions {
            state.add_session(session);
        }
        for order in snapshot.orders {
            state.check_order_references(&order.to_draft())?;
            state.next_order = state.next_order.max(order.id.get());
            state.orders.insert(order.id, order);
        }
        for line in snapshot.lines {
            state.next_line = state.next_line.max(line.id.get());
            state.lines.insert(line.id, line);
        }

        let orders: Vec<(OrderId, Option<OrderId>)> = state
            .orders
            .values()
            .map(|o| (o.id, o.returned_order))
            .collect();
        for (id, returned) in orders {
            if let Some(returned) = returned {
                if !state.orders.contains_key(&returned) {
                    return Err(StoreError::OrderNotFound(returned));
                }
                state
                    .refund_orders_by_target
                    .entry(returned)
                    .or_default()
                    .insert(id);
            }
        }

        let lines: Vec<OrderLine> = state.lines.values().cloned().collect();
        for line in lines {
            state.check_line_references(&line.to_draft())?;
            state.index_line(&line);
        }
        Ok(state)
    }

    /// Export every record. Indexes are not part of a snapshot.
    pub fn to_snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            products: self.products.values().cloned().collect(),
            partners: self.partners.values().cloned().collect(),
            configs: self.configs.values().cloned().collect(),
            sessions: self.sessions.values().cloned().collect(),
            orders: self.orders.values().cloned().collect(),
            lines: self.lines.values().cloned().collect(),
        }
    }

    fn check_order_references(&self, draft: &OrderDraft) -> StoreResult<()> {
        if !self.configs.contains_key(&draft.config) {
            return Err(StoreError::ConfigNotFound(draft.config));
        }
        if let Some(partner) = draft.partner {
            if !self.partners.contains_key(&partner) {
                return Err(StoreError::PartnerNotFound(partner));
            }
        }
        Ok(())
    }

    fn check_line_references(&self, draft: &LineDraft) -> StoreResult<()> {
        if !self.orders.contains_key(&draft.order) {
            return Err(StoreError::OrderNotFound(draft.order));
        }
        if !self.products.contains_key(&draft.product) {
            return Err(StoreError::ProductNotFound(draft.product));
        }
        if let Some(target) = draft.returned_line {
            if !self.lines.contains_key(&target) {
                return Err(StoreError::LineNotFound(target));
            }
        }
        Ok(())
    }

    fn index_line(&mut self, line: &OrderLine) {
        self.lines_by_order
            .entry(line.order)
            .or_default()
            .insert(line.id);
        if let Some(target) = line.returned_line {
            self.refund_lines_by_target
                .entry(target)
                .or_default()
                .insert(line.id);
        }
    }

    fn unindex_line(&mut self, line: &OrderLine) {
        if let Some(ids) = self.lines_by_order.get_mut(&line.order) {
            ids.remove(&line.id);
        }
        if let Some(target) = line.returned_line {
            if let Some(ids) = self.refund_lines_by_target.get_mut(&target) {
                ids.remove(&line.id);
                if ids.is_empty() {
                    self.refund_lines_by_target.remove(&target);
                }
            }
        }
    }

    fn collect_lines<'a>(&self, ids: impl IntoIterator<Item = &'a LineId>) -> Vec<OrderLine> {
        ids.into_iter()
            .filter_map(|id| self.lines.get(id).cloned())
            .collect()
    }

    fn order_mut(&mut self, id: OrderId) -> StoreResult<&mut Order> {
        self.orders.get_mut(&id).ok_or(StoreError::OrderNotFound(id))
    }
}

impl PosReader for PosState {
    fn order(&self, id: OrderId) -> StoreResult<Option<Order>> {
        Ok(self.orders.get(&id).cloned())
    }

    fn line(&self, id: LineId) -> StoreResult<Option<OrderLine>> {
        Ok(self.lines.get(&id).cloned())
    }

    fn order_lines(&self, order: OrderId) -> StoreResult<Vec<OrderLine>> {
        Ok(self
            .lines_by_order
            .get(&order)
            .map(|ids| self.collect_lines(ids))
            .unwrap_or_default())
    }

    fn refund_lines(&self, line: LineId) -> StoreResult<Vec<OrderLine>> {
        Ok(self
            .refund_lines_by_target
            .get(&line)
            .map(|ids| self.collect_lines(ids))
            .unwrap_or_default())
    }

    fn refund_orders(&self, order: OrderId) -> StoreResult<Vec<OrderId>> {
        Ok(self
            .refund_orders_by_target
            .get(&order)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default())
    }

    fn orders(&self) -> StoreResult<Vec<Order>> {
        Ok(self.orders.values().cloned().collect())
    }

    fn product(&self, id: ProductId) -> StoreResult<Option<Product>> {
        Ok(self.products.get(&id).cloned())
    }

    fn partner(&self, id: PartnerId) -> StoreResult<Option<Partner>> {
        Ok(self.partners.get(&id).cloned())
    }

    fn session(&self, id: SessionId) -> StoreResult<Option<PosSession>> {
        Ok(self.sessions.get(&id).cloned())
    }

    fn config(&self, id: ConfigId) -> StoreResult<Option<PosConfig>> {
        Ok(self.configs.get(&id).cloned())
    }
}

impl PosWriter for PosState {
    fn insert_order(&mut self, draft: OrderDraft) -> StoreResult<OrderId> {
        self.check_order_references(&draft)?;
        self.next_order += 1;
        let id = OrderId::new(self.next_order);
        self.orders.insert(id, draft.into_order(id));
        Ok(id)
    }

    fn insert_line(&mut self, draft: LineDraft) -> StoreResult<LineId> {
        self.check_line_references(&draft)?;
        self.next_line += 1;
        let line = draft.into_line(LineId::new(self.next_line));
        self.index_line(&line);
        let id = line.id;
        self.lines.insert(id, line);
        Ok(id)
    }

    fn update_line(&mut self, id: LineId, update: &LineUpdate) -> StoreResult<()> {
        let line = self.lines.get_mut(&id).ok_or(StoreError::LineNotFound(id))?;
        update.apply_to(line);
        Ok(())
    }

    fn set_returned_order(&mut self, order: OrderId, returned: OrderId) -> StoreResult<()> {
        if !self.orders.contains_key(&returned) {
            return Err(StoreError::OrderNotFound(returned));
        }
        let record = self.order_mut(order)?;
        if record.returned_order.is_some() {
            return Err(StoreError::OrderAlreadyLinked(order));
        }
        record.returned_order = Some(returned);
        self.refund_orders_by_target
            .entry(returned)
            .or_default()
            .insert(order);
        Ok(())
    }

    fn set_amount_total(&mut self, order: OrderId, amount_total: f64) -> StoreResult<()> {
        self.order_mut(order)?.amount_total = amount_total;
        Ok(())
    }

    fn delete_lines(&mut self, ids: &[LineId]) -> StoreResult<()> {
        let doomed: BTreeSet<LineId> = ids.iter().copied().collect();
        for id in &doomed {
            if !self.lines.contains_key(id) {
                return Err(StoreError::LineNotFound(*id));
            }
            let outside = self
                .refund_lines_by_target
                .get(id)
                .map(|refunds| refunds.iter().filter(|r| !doomed.contains(*r)).count())
                .unwrap_or(0);
            if outside > 0 {
                return Err(StoreError::LineReferenced {
                    line: *id,
                    refunds: outside,
                });
            }
        }
        for id in &doomed {
            if let Some(line) = self.lines.remove(id) {
                self.unindex_line(&line);
            }
        }
        Ok(())
    }
}

impl OrderDuplicator for PosState {
    fn duplicate_order(&mut self, order: OrderId) -> StoreResult<Duplication> {
        let source = self.require_order(order)?;
        let mut draft = source.to_draft();
        draft.name = format!("{} REFUND", source.name);
        draft.state = OrderState::Draft;
        draft.date_order = Utc::now();
        draft.invoice = None;
        draft.payments.clear();

        let name = draft.name.clone();
        let copy = self.insert_order(draft)?;
        let mut lines = Vec::new();
        for line in self.order_lines(order)? {
            let mut line_draft = line.to_draft();
            line_draft.order = copy;
            lines.push(self.insert_line(line_draft)?);
        }
        debug!(source = %order, copy = %copy, lines = lines.len(), "duplicated order");
        Ok(Duplication {
            order: copy,
            name,
            lines,
        })
    }
}

/// In-memory order store for tests, the CLI and embedding.
///
/// Transactions take the write lock for their whole duration and mutate a
/// clone of the state, which replaces the live state only on success. This
/// serializes concurrent refunds and gives all-or-nothing commits at the
/// cost of one state clone per transaction.
pub struct InMemoryPosStore {
    inner: RwLock<PosState>,
}

impl InMemoryPosStore {
    pub fn new(state: PosState) -> Self {
        Self {
            inner: RwLock::new(state),
        }
    }

    pub fn from_snapshot(snapshot: StoreSnapshot) -> StoreResult<Self> {
        Ok(Self::new(PosState::from_snapshot(snapshot)?))
    }

    pub fn snapshot(&self) -> StoreResult<StoreSnapshot> {
        let state = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(state.to_snapshot())
    }
}

impl Default for InMemoryPosStore {
    fn default() -> Self {
        Self::new(PosState::new())
    }
}

impl PosStore for InMemoryPosStore {
    type Tx = PosState;

    fn view<T, E, F>(&self, f: F) -> Result<T, E>
    where
        E: From<StoreError>,
        F: FnOnce(&Self::Tx) -> Result<T, E>,
    {
        let state = self
            .inner
            .read()
            .map_err(|_| E::from(StoreError::LockPoisoned))?;
        f(&state)
    }

    fn transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        E: From<StoreError>,
        F: FnOnce(&mut Self::Tx) -> Result<T, E>,
    {
        let mut state = self
            .inner
            .write()
            .map_err(|_| E::from(StoreError::LockPoisoned))?;
        let mut working = state.clone();
        match f(&mut working) {
            Ok(value) => {
                *state = working;
                debug!("transaction committed");
                Ok(value)
            }
            Err(err) => {
                debug!("transaction rolled back");
                Err(err)
            }
        }
    }
}

impl std::fmt::Debug for InMemoryPosStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (orders, lines) = self
            .inner
            .read()
            .map(|s| (s.orders.len(), s.lines.len()))
            .unwrap_or_default();
        f.debug_struct("InMemoryPosStore")
            .field("order_count", &orders)
            .field("line_count", &lines)
            .finish()
    }
}
