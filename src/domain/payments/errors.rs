use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::shared::BusinessRule;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PaymentError {
    #[error("Payment amount must be greater than zero")]
    InvalidAmount,

    #[error("Refund of {requested} exceeds the refundable {refundable} on transaction {transaction_id}")]
    RefundExceedsCharge {
        transaction_id: Uuid,
        requested: Decimal,
        refundable: Decimal,
    },

    #[error("Payment transaction not found: {0}")]
    TransactionNotFound(Uuid),

    #[error("Transaction {0} is a refund and cannot be refunded")]
    CannotRefundRefund(Uuid),
}

impl BusinessRule for PaymentError {
    fn code(&self) -> &'static str {
        match self {
            PaymentError::InvalidAmount => "Alumni:Payment:001",
            PaymentError::RefundExceedsCharge { .. } => "Alumni:Payment:002",
            PaymentError::TransactionNotFound(_) => "Alumni:Payment:003",
            PaymentError::CannotRefundRefund(_) => "Alumni:Payment:004",
        }
    }
}
