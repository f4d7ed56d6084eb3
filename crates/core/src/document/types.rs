//! Document domain types.
//!
//! A document is a request that, once approved, mutates one or more
//! budget lines. All variants share one set of common attributes and the
//! workflow state machine; variant-specific payloads carry the line
//! references the transfer engine needs.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use fiscus_shared::types::{BudgetLineId, DocumentId, FundId, UserId};

use super::error::DocumentError;
use crate::workflow::DocumentStatus;

/// The kind of financial document, tagging its ledger effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Releases allotment against a line's appropriation (BA).
    AllotmentRelease,
    /// Increases a line's appropriation (BS).
    Supplemental,
    /// Moves appropriation between two lines in the same fund (BT).
    Transfer,
    /// Moves appropriation between two funds' default lines (FT).
    FundTransfer,
    /// Consumes allotment through itemized charges (OBR).
    ObligationRequest,
    /// Requests payment against a posted obligation (CHQ); no ledger effect.
    ChequeRequest,
}

impl DocumentKind {
    /// Invoice number prefix for this kind.
    #[must_use]
    pub const fn prefix(&self) -> &'static str {
        match self {
            Self::AllotmentRelease => "BA",
            Self::Supplemental => "BS",
            Self::Transfer => "BT",
            Self::FundTransfer => "FT",
            Self::ObligationRequest => "OBR",
            Self::ChequeRequest => "CHQ",
        }
    }

    /// Parses a kind from its invoice prefix.
    #[must_use]
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "BA" => Some(Self::AllotmentRelease),
            "BS" => Some(Self::Supplemental),
            "BT" => Some(Self::Transfer),
            "FT" => Some(Self::FundTransfer),
            "OBR" => Some(Self::ObligationRequest),
            "CHQ" => Some(Self::ChequeRequest),
            _ => None,
        }
    }

    /// Returns the string representation of the kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AllotmentRelease => "allotment_release",
            Self::Supplemental => "supplemental",
            Self::Transfer => "transfer",
            Self::FundTransfer => "fund_transfer",
            Self::ObligationRequest => "obligation_request",
            Self::ChequeRequest => "cheque_request",
        }
    }

    /// Parses a kind from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "allotment_release" => Some(Self::AllotmentRelease),
            "supplemental" => Some(Self::Supplemental),
            "transfer" => Some(Self::Transfer),
            "fund_transfer" => Some(Self::FundTransfer),
            "obligation_request" => Some(Self::ObligationRequest),
            "cheque_request" => Some(Self::ChequeRequest),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Unique invoice number in the form `<PREFIX>-<seq>-<year>`,
/// e.g. `BT-0042-2026`. The sequence is zero-padded to four digits and
/// resets per kind and year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InvoiceNumber {
    kind: DocumentKind,
    sequence: u32,
    year: i32,
}

impl InvoiceNumber {
    /// Builds an invoice number from its parts.
    #[must_use]
    pub const fn new(kind: DocumentKind, sequence: u32, year: i32) -> Self {
        Self {
            kind,
            sequence,
            year,
        }
    }

    /// The document kind encoded in the prefix.
    #[must_use]
    pub const fn kind(&self) -> DocumentKind {
        self.kind
    }

    /// The per-kind, per-year sequence number.
    #[must_use]
    pub const fn sequence(&self) -> u32 {
        self.sequence
    }

    /// The calendar year of issuance.
    #[must_use]
    pub const fn year(&self) -> i32 {
        self.year
    }
}

impl fmt::Display for InvoiceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:04}-{}", self.kind.prefix(), self.sequence, self.year)
    }
}

impl FromStr for InvoiceNumber {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || DocumentError::MalformedInvoiceNumber(s.to_string());

        let mut parts = s.splitn(3, '-');
        let prefix = parts.next().ok_or_else(malformed)?;
        let seq = parts.next().ok_or_else(malformed)?;
        let year = parts.next().ok_or_else(malformed)?;

        let kind = DocumentKind::from_prefix(prefix).ok_or_else(malformed)?;
        if seq.len() < 4 || !seq.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        let sequence: u32 = seq.parse().map_err(|_| malformed())?;
        let year: i32 = year.parse().map_err(|_| malformed())?;

        Ok(Self::new(kind, sequence, year))
    }
}

impl Serialize for InvoiceNumber {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for InvoiceNumber {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// One itemized charge inside an obligation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Chart of accounts code for the item.
    pub account_code: String,
    /// Free-text description.
    pub description: String,
    /// Item amount, strictly positive.
    pub amount: Decimal,
}

/// Variant-specific payload carrying the line references a document
/// mutates when approved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DocumentPayload {
    /// Releases allotment on one line.
    AllotmentRelease {
        /// The line receiving the release.
        line_id: BudgetLineId,
        /// Admin override: release past the appropriation balance.
        override_balance: bool,
    },
    /// Supplements one line's appropriation.
    Supplemental {
        /// The line being supplemented.
        line_id: BudgetLineId,
    },
    /// Zero-sum move between two lines.
    Transfer {
        /// Line the appropriation leaves.
        source_line_id: BudgetLineId,
        /// Line the appropriation enters.
        target_line_id: BudgetLineId,
        /// Admin override: transfer past the source balance.
        override_balance: bool,
    },
    /// Zero-sum move between two funds, resolved to their default lines
    /// when the document is created.
    FundTransfer {
        /// Fund the appropriation leaves.
        source_fund_id: FundId,
        /// Fund the appropriation enters.
        target_fund_id: FundId,
        /// The source fund's default budget line.
        source_line_id: BudgetLineId,
        /// The target fund's default budget line.
        target_line_id: BudgetLineId,
        /// Admin override: transfer past the source balance.
        override_balance: bool,
    },
    /// Itemized charges against one line's allotment.
    ObligationRequest {
        /// The line being charged.
        line_id: BudgetLineId,
        /// Itemized charges; their sum equals the document amount.
        items: Vec<LineItem>,
    },
    /// Payment request against a posted obligation; no ledger effect.
    ChequeRequest {
        /// The obligation request being paid.
        obligation_id: DocumentId,
        /// Payee name printed on the cheque.
        payee: String,
    },
}

impl DocumentPayload {
    /// The document kind this payload belongs to.
    #[must_use]
    pub const fn kind(&self) -> DocumentKind {
        match self {
            Self::AllotmentRelease { .. } => DocumentKind::AllotmentRelease,
            Self::Supplemental { .. } => DocumentKind::Supplemental,
            Self::Transfer { .. } => DocumentKind::Transfer,
            Self::FundTransfer { .. } => DocumentKind::FundTransfer,
            Self::ObligationRequest { .. } => DocumentKind::ObligationRequest,
            Self::ChequeRequest { .. } => DocumentKind::ChequeRequest,
        }
    }

    /// The budget lines this payload touches when approved.
    #[must_use]
    pub fn line_ids(&self) -> Vec<BudgetLineId> {
        match self {
            Self::AllotmentRelease { line_id, .. }
            | Self::Supplemental { line_id }
            | Self::ObligationRequest { line_id, .. } => vec![*line_id],
            Self::Transfer {
                source_line_id,
                target_line_id,
                ..
            }
            | Self::FundTransfer {
                source_line_id,
                target_line_id,
                ..
            } => vec![*source_line_id, *target_line_id],
            Self::ChequeRequest { .. } => Vec::new(),
        }
    }
}

/// A financial document moving through the approval workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier.
    pub id: DocumentId,
    /// Unique human-facing invoice number.
    pub invoice_number: InvoiceNumber,
    /// Variant payload with line references.
    pub payload: DocumentPayload,
    /// Current workflow status.
    pub status: DocumentStatus,
    /// Document amount, strictly positive.
    pub amount: Decimal,
    /// The user who requested the document.
    pub requested_by: UserId,
    /// When the document was requested.
    pub request_date: DateTime<Utc>,
    /// Free-text remarks.
    pub remarks: Option<String>,
    /// The approver, set at approval time.
    pub approved_by: Option<UserId>,
    /// When the document was approved.
    pub approved_date: Option<DateTime<Utc>>,
    /// Reason attached at rejection time.
    pub rejection_reason: Option<String>,
    /// Set in the same transaction as the ledger mutation; guards
    /// against a retried approval applying the effect twice.
    pub applied: bool,
    /// Optimistic concurrency version.
    pub version: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Creates a new document in Pending status.
    ///
    /// # Errors
    ///
    /// Returns a `DocumentError` when the amount is non-positive, a
    /// transfer references the same line twice, or an obligation
    /// request's items are missing, non-positive, or do not sum to the
    /// document amount.
    pub fn new(
        invoice_number: InvoiceNumber,
        payload: DocumentPayload,
        amount: Decimal,
        requested_by: UserId,
        remarks: Option<String>,
    ) -> Result<Self, DocumentError> {
        Self::validate(&payload, amount)?;
        let now = Utc::now();
        Ok(Self {
            id: DocumentId::new(),
            invoice_number,
            payload,
            status: DocumentStatus::Pending,
            amount,
            requested_by,
            request_date: now,
            remarks,
            approved_by: None,
            approved_date: None,
            rejection_reason: None,
            applied: false,
            version: 1,
            created_at: now,
            updated_at: now,
        })
    }

    /// Validates a payload and amount against the variant rules.
    ///
    /// # Errors
    ///
    /// See [`Document::new`].
    pub fn validate(payload: &DocumentPayload, amount: Decimal) -> Result<(), DocumentError> {
        if amount <= Decimal::ZERO {
            return Err(DocumentError::InvalidAmount(amount));
        }

        match payload {
            DocumentPayload::Transfer {
                source_line_id,
                target_line_id,
                ..
            }
            | DocumentPayload::FundTransfer {
                source_line_id,
                target_line_id,
                ..
            } => {
                if source_line_id == target_line_id {
                    return Err(DocumentError::SameLine);
                }
            }
            DocumentPayload::ObligationRequest { items, .. } => {
                if items.is_empty() {
                    return Err(DocumentError::NoLineItems);
                }
                for item in items {
                    if item.amount <= Decimal::ZERO {
                        return Err(DocumentError::InvalidLineItem {
                            description: item.description.clone(),
                            amount: item.amount,
                        });
                    }
                }
                let items_total: Decimal = items.iter().map(|i| i.amount).sum();
                if items_total != amount {
                    return Err(DocumentError::LineItemMismatch {
                        items_total,
                        amount,
                    });
                }
            }
            DocumentPayload::AllotmentRelease { .. }
            | DocumentPayload::Supplemental { .. }
            | DocumentPayload::ChequeRequest { .. } => {}
        }

        Ok(())
    }

    /// The document's kind, derived from its payload.
    #[must_use]
    pub const fn kind(&self) -> DocumentKind {
        self.payload.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn transfer_payload() -> DocumentPayload {
        DocumentPayload::Transfer {
            source_line_id: BudgetLineId::new(),
            target_line_id: BudgetLineId::new(),
            override_balance: false,
        }
    }

    #[test]
    fn test_invoice_number_format() {
        let invoice = InvoiceNumber::new(DocumentKind::Transfer, 42, 2026);
        assert_eq!(invoice.to_string(), "BT-0042-2026");

        let invoice = InvoiceNumber::new(DocumentKind::ObligationRequest, 12345, 2026);
        assert_eq!(invoice.to_string(), "OBR-12345-2026");
    }

    #[test]
    fn test_invoice_number_roundtrip() {
        for kind in [
            DocumentKind::AllotmentRelease,
            DocumentKind::Supplemental,
            DocumentKind::Transfer,
            DocumentKind::FundTransfer,
            DocumentKind::ObligationRequest,
            DocumentKind::ChequeRequest,
        ] {
            let invoice = InvoiceNumber::new(kind, 7, 2026);
            let parsed: InvoiceNumber = invoice.to_string().parse().unwrap();
            assert_eq!(parsed, invoice);
        }
    }

    #[test]
    fn test_invoice_number_rejects_malformed() {
        for bad in ["BT-42-2026", "XX-0042-2026", "BT-0042", "BT--2026", "nonsense"] {
            assert!(
                bad.parse::<InvoiceNumber>().is_err(),
                "expected {bad} to be rejected"
            );
        }
    }

    #[test]
    fn test_new_document_starts_pending() {
        let doc = Document::new(
            InvoiceNumber::new(DocumentKind::Transfer, 1, 2026),
            transfer_payload(),
            dec!(250_000),
            UserId::new(),
            None,
        )
        .unwrap();
        assert_eq!(doc.status, DocumentStatus::Pending);
        assert!(!doc.applied);
        assert_eq!(doc.version, 1);
        assert_eq!(doc.kind(), DocumentKind::Transfer);
    }

    #[test]
    fn test_non_positive_amount_rejected() {
        for amount in [dec!(0), dec!(-100)] {
            let result = Document::new(
                InvoiceNumber::new(DocumentKind::Supplemental, 1, 2026),
                DocumentPayload::Supplemental {
                    line_id: BudgetLineId::new(),
                },
                amount,
                UserId::new(),
                None,
            );
            assert!(matches!(result, Err(DocumentError::InvalidAmount(_))));
        }
    }

    #[test]
    fn test_transfer_same_line_rejected() {
        let line = BudgetLineId::new();
        let payload = DocumentPayload::Transfer {
            source_line_id: line,
            target_line_id: line,
            override_balance: false,
        };
        let result = Document::validate(&payload, dec!(100));
        assert!(matches!(result, Err(DocumentError::SameLine)));
    }

    #[test]
    fn test_obligation_items_must_sum_to_amount() {
        let payload = DocumentPayload::ObligationRequest {
            line_id: BudgetLineId::new(),
            items: vec![
                LineItem {
                    account_code: "5-02-03-010".to_string(),
                    description: "Office supplies".to_string(),
                    amount: dec!(30_000),
                },
                LineItem {
                    account_code: "5-02-03-090".to_string(),
                    description: "Fuel".to_string(),
                    amount: dec!(20_000),
                },
            ],
        };
        assert!(Document::validate(&payload, dec!(50_000)).is_ok());
        assert!(matches!(
            Document::validate(&payload, dec!(60_000)),
            Err(DocumentError::LineItemMismatch { .. })
        ));
    }

    #[test]
    fn test_obligation_requires_items() {
        let payload = DocumentPayload::ObligationRequest {
            line_id: BudgetLineId::new(),
            items: vec![],
        };
        assert!(matches!(
            Document::validate(&payload, dec!(100)),
            Err(DocumentError::NoLineItems)
        ));
    }

    #[test]
    fn test_obligation_rejects_non_positive_item() {
        let payload = DocumentPayload::ObligationRequest {
            line_id: BudgetLineId::new(),
            items: vec![LineItem {
                account_code: "5-02-03-010".to_string(),
                description: "Office supplies".to_string(),
                amount: dec!(-10),
            }],
        };
        assert!(matches!(
            Document::validate(&payload, dec!(100)),
            Err(DocumentError::InvalidLineItem { .. })
        ));
    }

    #[test]
    fn test_payload_line_ids() {
        let payload = transfer_payload();
        assert_eq!(payload.line_ids().len(), 2);

        let cheque = DocumentPayload::ChequeRequest {
            obligation_id: DocumentId::new(),
            payee: "Acme Supplies".to_string(),
        };
        assert!(cheque.line_ids().is_empty());
    }
}
