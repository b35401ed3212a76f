//! Ledger change notification port.

use crate::domain::events::LedgerEvent;

/// Receives a notification after every completed ledger mutation.
pub trait LedgerObserver {
    fn on_ledger_event(&self, event: &LedgerEvent);
}
