//! The transfer engine: turns approved documents into ledger deltas.
//!
//! The engine is stateless. Each operation reads the current figures of
//! the lines involved, validates the movement, and returns the deltas
//! the caller applies atomically with the document's status change. The
//! engine never mutates a line itself; persistence owns the write path
//! and its optimistic retry loop.

use rust_decimal::Decimal;

use fiscus_shared::types::BudgetLineId;

use crate::document::{Document, DocumentPayload};
use crate::ledger::{BudgetLine, LedgerError, LineDelta};

/// Stateless engine producing validated ledger deltas.
pub struct TransferEngine;

impl TransferEngine {
    /// Supplement a line's appropriation.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` if the amount is not strictly positive.
    pub fn supplement(amount: Decimal) -> Result<LineDelta, LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(amount));
        }
        Ok(LineDelta::adjustment(amount))
    }

    /// Transfer appropriation between two lines as a zero-sum pair.
    ///
    /// The source must cover the amount from its appropriation balance
    /// unless `override_balance` is set, in which case the transfer
    /// proceeds and the source delta flags the line overdrawn for audit.
    ///
    /// # Errors
    ///
    /// * `InvalidAmount` if the amount is not strictly positive
    /// * `SameLine` if source and target are the same line
    /// * `InsufficientBalance` if the source balance cannot cover the
    ///   amount and no override is present
    pub fn transfer(
        source: &BudgetLine,
        target: &BudgetLine,
        amount: Decimal,
        override_balance: bool,
    ) -> Result<[(BudgetLineId, LineDelta); 2], LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(amount));
        }
        if source.id == target.id {
            return Err(LedgerError::SameLine);
        }

        let available = source.appropriation_balance();
        let mut source_delta = LineDelta::adjustment(-amount);
        if available < amount {
            if !override_balance {
                return Err(LedgerError::InsufficientBalance {
                    available,
                    requested: amount,
                });
            }
            source_delta.flag_overdrawn = true;
        }

        Ok([
            (source.id, source_delta),
            (target.id, LineDelta::adjustment(amount)),
        ])
    }

    /// Release allotment against a line's appropriation.
    ///
    /// # Errors
    ///
    /// * `InvalidAmount` if the amount is not strictly positive
    /// * `InsufficientBalance` if the appropriation balance cannot cover
    ///   the release and no override is present
    pub fn release(
        line: &BudgetLine,
        amount: Decimal,
        override_balance: bool,
    ) -> Result<LineDelta, LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(amount));
        }

        let available = line.appropriation_balance();
        let mut delta = LineDelta::release(amount);
        if available < amount {
            if !override_balance {
                return Err(LedgerError::InsufficientBalance {
                    available,
                    requested: amount,
                });
            }
            delta.flag_overdrawn = true;
        }

        Ok(delta)
    }

    /// Charge an obligation against a line's released allotment.
    ///
    /// # Errors
    ///
    /// * `InvalidAmount` if the amount is not strictly positive
    /// * `InsufficientAllotment` if the allotment balance cannot cover
    ///   the charge
    pub fn obligate(line: &BudgetLine, amount: Decimal) -> Result<LineDelta, LedgerError> {
        Self::allotment_hold(line, amount)?;
        Ok(LineDelta::charge(amount))
    }

    /// Place a pre-encumbrance hold against a line's released allotment.
    ///
    /// # Errors
    ///
    /// * `InvalidAmount` if the amount is not strictly positive
    /// * `InsufficientAllotment` if the allotment balance cannot cover
    ///   the hold
    pub fn pre_encumber(line: &BudgetLine, amount: Decimal) -> Result<LineDelta, LedgerError> {
        Self::allotment_hold(line, amount)?;
        Ok(LineDelta::pre_encumber(amount))
    }

    /// Place an encumbrance hold against a line's released allotment.
    ///
    /// # Errors
    ///
    /// * `InvalidAmount` if the amount is not strictly positive
    /// * `InsufficientAllotment` if the allotment balance cannot cover
    ///   the hold
    pub fn encumber(line: &BudgetLine, amount: Decimal) -> Result<LineDelta, LedgerError> {
        Self::allotment_hold(line, amount)?;
        Ok(LineDelta::encumber(amount))
    }

    fn allotment_hold(line: &BudgetLine, amount: Decimal) -> Result<(), LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(amount));
        }
        let available = line.allotment_balance();
        if available < amount {
            return Err(LedgerError::InsufficientAllotment {
                available,
                requested: amount,
            });
        }
        Ok(())
    }

    /// Produce the deltas an approved document applies to the ledger.
    ///
    /// `lookup` resolves a line id to its current figures; the caller
    /// loads the lines inside the approval transaction so validation
    /// sees the same state the write will touch. A cheque request maps
    /// to no deltas.
    ///
    /// # Errors
    ///
    /// * `LineNotFound` if a referenced line cannot be resolved
    /// * Any validation error from the operation the document authorizes
    pub fn document_deltas<'a, F>(
        document: &Document,
        lookup: F,
    ) -> Result<Vec<(BudgetLineId, LineDelta)>, LedgerError>
    where
        F: Fn(BudgetLineId) -> Option<&'a BudgetLine>,
    {
        let resolve =
            |id: BudgetLineId| lookup(id).ok_or(LedgerError::LineNotFound(id));

        match &document.payload {
            DocumentPayload::Supplemental { line_id } => {
                let delta = Self::supplement(document.amount)?;
                resolve(*line_id)?;
                Ok(vec![(*line_id, delta)])
            }
            DocumentPayload::AllotmentRelease {
                line_id,
                override_balance,
            } => {
                let line = resolve(*line_id)?;
                let delta = Self::release(line, document.amount, *override_balance)?;
                Ok(vec![(*line_id, delta)])
            }
            DocumentPayload::Transfer {
                source_line_id,
                target_line_id,
                override_balance,
            }
            | DocumentPayload::FundTransfer {
                source_line_id,
                target_line_id,
                override_balance,
                ..
            } => {
                let source = resolve(*source_line_id)?;
                let target = resolve(*target_line_id)?;
                let pair = Self::transfer(source, target, document.amount, *override_balance)?;
                Ok(pair.to_vec())
            }
            DocumentPayload::ObligationRequest { line_id, .. } => {
                let line = resolve(*line_id)?;
                let delta = Self::obligate(line, document.amount)?;
                Ok(vec![(*line_id, delta)])
            }
            DocumentPayload::ChequeRequest { .. } => Ok(Vec::new()),
        }
    }
}
