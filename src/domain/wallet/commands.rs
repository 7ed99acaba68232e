use uuid::Uuid;

use crate::domain::shared::Money;

// ============================================================================
// Wallet Commands
// ============================================================================

#[derive(Debug, Clone)]
pub enum WalletCommand {
    Open {
        alumni_id: Uuid,
    },
    TopUp {
        amount: Money,
        reference: String,
    },
    Debit {
        amount: Money,
        request_id: Uuid,
    },
    Refund {
        amount: Money,
        request_id: Uuid,
    },
}
