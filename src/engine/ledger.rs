use crate::model::{TransactionLine, TransactionRecord, UserId};

/// A recorded transaction together with its line items. Lines are created
/// atomically with the record and never change afterwards.
#[derive(Debug, Clone)]
pub struct LedgerEntry {
    pub record: TransactionRecord,
    pub lines: Vec<TransactionLine>,
}

/// Append-only transaction history.
#[derive(Debug, Default)]
pub struct Ledger {
    entries: Vec<LedgerEntry>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: TransactionRecord, lines: Vec<TransactionLine>) {
        self.entries.push(LedgerEntry { record, lines });
    }

    /// A user's transactions, newest first.
    pub fn for_user(&self, user: UserId) -> impl Iterator<Item = &LedgerEntry> {
        self.entries
            .iter()
            .rev()
            .filter(move |entry| entry.record.user == user)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
