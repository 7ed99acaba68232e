use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

use crate::domain::shared::Money;
use crate::event_sourcing::Aggregate;
use super::commands::WalletCommand;
use super::errors::WalletError;
use super::events::*;

// ============================================================================
// Wallet Aggregate
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletAggregate {
    pub alumni_id: Uuid,
    pub version: i64,
    pub balance: Money,
    pub total_credited: Money,
    pub total_debited: Money,
    pub opened_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn require_positive(amount: Money) -> Result<(), WalletError> {
    if amount.is_zero() {
        return Err(WalletError::InvalidAmount);
    }
    Ok(())
}

impl Aggregate for WalletAggregate {
    type Event = WalletEvent;
    type Command = WalletCommand;
    type Error = WalletError;

    const AGGREGATE_TYPE: &'static str = "Wallet";

    fn create(command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            WalletCommand::Open { alumni_id } => Ok(vec![WalletEvent::Opened(WalletOpened {
                alumni_id: *alumni_id,
                opened_at: Utc::now(),
            })]),
            _ => Err(WalletError::NotInitialized),
        }
    }

    fn apply_first_event(event: &Self::Event) -> Result<Self, Self::Error> {
        match event {
            WalletEvent::Opened(e) => Ok(Self {
                alumni_id: e.alumni_id,
                version: 0,
                balance: Money::zero(),
                total_credited: Money::zero(),
                total_debited: Money::zero(),
                opened_at: e.opened_at,
                updated_at: e.opened_at,
            }),
            _ => Err(WalletError::NotInitialized),
        }
    }

    fn apply_event(&mut self, event: &Self::Event) -> Result<(), Self::Error> {
        match event {
            WalletEvent::Opened(_) => {}
            WalletEvent::Credited(e) => {
                self.balance = self.balance + e.amount;
                self.total_credited = self.total_credited + e.amount;
                self.updated_at = e.credited_at;
            }
            WalletEvent::Debited(e) => {
                self.balance = self.balance.checked_sub(e.amount).ok_or(
                    WalletError::InsufficientBalance {
                        requested: e.amount,
                        available: self.balance,
                    },
                )?;
                self.total_debited = self.total_debited + e.amount;
                self.updated_at = e.debited_at;
            }
            WalletEvent::Refunded(e) => {
                self.balance = self.balance + e.amount;
                self.total_debited = self.total_debited.saturating_sub(e.amount);
                self.updated_at = e.refunded_at;
            }
        }
        Ok(())
    }

    fn handle_command(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            WalletCommand::Open { .. } => Err(WalletError::AlreadyOpened),

            WalletCommand::TopUp { amount, reference } => {
                require_positive(*amount)?;
                Ok(vec![WalletEvent::Credited(WalletCredited {
                    amount: *amount,
                    reference: reference.clone(),
                    credited_at: Utc::now(),
                })])
            }

            WalletCommand::Debit { amount, request_id } => {
                require_positive(*amount)?;
                if *amount > self.balance {
                    return Err(WalletError::InsufficientBalance {
                        requested: *amount,
                        available: self.balance,
                    });
                }
                Ok(vec![WalletEvent::Debited(WalletDebited {
                    amount: *amount,
                    request_id: *request_id,
                    debited_at: Utc::now(),
                })])
            }

            WalletCommand::Refund { amount, request_id } => {
                require_positive(*amount)?;
                Ok(vec![WalletEvent::Refunded(WalletRefunded {
                    amount: *amount,
                    request_id: *request_id,
                    refunded_at: Utc::now(),
                })])
            }
        }
    }

    fn aggregate_id(&self) -> Uuid {
        self.alumni_id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn set_version(&mut self, version: i64) {
        self.version = version;
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn open_wallet() -> WalletAggregate {
        let events = WalletAggregate::create(&WalletCommand::Open { alumni_id: Uuid::new_v4() }).unwrap();
        WalletAggregate::from_events(&events).unwrap()
    }

    fn execute(wallet: &mut WalletAggregate, command: WalletCommand) -> Result<(), WalletError> {
        let events = wallet.handle_command(&command)?;
        wallet.apply_all(&events)
    }

    #[test]
    fn test_open_starts_empty() {
        let wallet = open_wallet();
        assert_eq!(wallet.balance, Money::zero());
        assert_eq!(wallet.version, 1);
    }

    #[test]
    fn test_create_requires_open_command() {
        let result = WalletAggregate::create(&WalletCommand::TopUp {
            amount: Money::from_major(1),
            reference: "x".to_string(),
        });
        assert!(matches!(result, Err(WalletError::NotInitialized)));
    }

    #[test]
    fn test_top_up_debit_refund_cycle() {
        let mut wallet = open_wallet();
        let request_id = Uuid::new_v4();

        execute(&mut wallet, WalletCommand::TopUp { amount: Money::from_major(300), reference: "card".into() }).unwrap();
        execute(&mut wallet, WalletCommand::Debit { amount: Money::from_major(120), request_id }).unwrap();
        assert_eq!(wallet.balance, Money::from_major(180));
        assert_eq!(wallet.total_debited, Money::from_major(120));

        execute(&mut wallet, WalletCommand::Refund { amount: Money::from_major(120), request_id }).unwrap();
        assert_eq!(wallet.balance, Money::from_major(300));
        assert_eq!(wallet.total_debited, Money::zero());
        assert_eq!(wallet.version, 4);
    }

    #[test]
    fn test_debit_cannot_exceed_balance() {
        let mut wallet = open_wallet();
        execute(&mut wallet, WalletCommand::TopUp { amount: Money::from_major(50), reference: "cash".into() }).unwrap();

        let result = wallet.handle_command(&WalletCommand::Debit {
            amount: Money::from_minor(5_001),
            request_id: Uuid::new_v4(),
        });

        assert!(matches!(result, Err(WalletError::InsufficientBalance { .. })));
        assert_eq!(wallet.balance, Money::from_major(50));
    }

    #[test]
    fn test_zero_amounts_rejected() {
        let wallet = open_wallet();
        let result = wallet.handle_command(&WalletCommand::TopUp { amount: Money::zero(), reference: "x".into() });
        assert!(matches!(result, Err(WalletError::InvalidAmount)));
    }

    #[test]
    fn test_cannot_open_twice() {
        let wallet = open_wallet();
        let result = wallet.handle_command(&WalletCommand::Open { alumni_id: wallet.alumni_id });
        assert!(matches!(result, Err(WalletError::AlreadyOpened)));
    }
}
