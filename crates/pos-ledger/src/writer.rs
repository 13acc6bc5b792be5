use std::collections::BTreeSet;

use pos_store::PosWriter;
use pos_types::{LineDraft, LineId, LineUpdate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::LedgerResult;
use crate::validation::{ReturnValidator, WriteOptions};

/// One entry of a batch line write.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum LineWrite {
    Create(LineDraft),
    Update { line: LineId, update: LineUpdate },
}

/// Applies line writes and validates the result.
///
/// Writes are applied first and every touched line is validated against the
/// resulting graph, so two refunds in one batch see each other. Run it
/// inside a store transaction: on error the caller's transaction discards
/// the partial writes.
pub struct LineWriter;

impl LineWriter {
    /// Apply `writes` to `tx`, then validate. Returns the written line ids in
    /// batch order.
    ///
    /// Updating an original line also re-validates its refund lines, so a
    /// sale cannot be shrunk below what was already refunded.
    pub fn write_batch<W: PosWriter + ?Sized>(
        tx: &mut W,
        writes: Vec<LineWrite>,
        options: WriteOptions,
    ) -> LedgerResult<Vec<LineId>> {
        let mut written = Vec::with_capacity(writes.len());
        let mut to_validate = BTreeSet::new();

        for write in writes {
            match write {
                LineWrite::Create(draft) => {
                    let id = tx.insert_line(draft)?;
                    written.push(id);
                    to_validate.insert(id);
                }
                LineWrite::Update { line, update } => {
                    tx.update_line(line, &update)?;
                    written.push(line);
                    to_validate.insert(line);
                    for refund in tx.refund_lines(line)? {
                        to_validate.insert(refund.id);
                    }
                }
            }
        }

        let to_validate: Vec<LineId> = to_validate.into_iter().collect();
        ReturnValidator::validate_lines(&*tx, &to_validate, options)?;
        debug!(
            written = written.len(),
            validated = to_validate.len(),
            "line batch accepted"
        );
        Ok(written)
    }
}
