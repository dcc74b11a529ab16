//! Fee Calculator
//!
//! Protocol fee rate (bounded at 1%) and the account that receives it.

use serde::{Deserialize, Serialize};

use swapgate_core::constants::MAX_FEE_BPS;
use swapgate_core::{AccountId, Amount, EngineConfig, FeeError};

use crate::calculator;
use crate::governance::Governance;

/// Current fee configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeManager {
    rate_bps: u64,
    recipient: AccountId,
}

impl FeeManager {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            rate_bps: config.fee_rate_bps.min(MAX_FEE_BPS),
            recipient: config.fee_recipient.clone(),
        }
    }

    pub fn rate_bps(&self) -> u64 {
        self.rate_bps
    }

    pub fn recipient(&self) -> &AccountId {
        &self.recipient
    }

    pub fn set_fee(
        &mut self,
        gov: &Governance,
        caller: &AccountId,
        rate_bps: u64,
    ) -> Result<(), FeeError> {
        if !gov.is_admin(caller) {
            return Err(FeeError::Unauthorized {
                caller: caller.clone(),
            });
        }
        if rate_bps > MAX_FEE_BPS {
            return Err(FeeError::FeeLimitExceeded {
                rate_bps,
                max_bps: MAX_FEE_BPS,
            });
        }
        tracing::info!("Fee rate set to {} bps", rate_bps);
        self.rate_bps = rate_bps;
        Ok(())
    }

    pub fn set_fee_recipient(
        &mut self,
        gov: &Governance,
        caller: &AccountId,
        recipient: AccountId,
    ) -> Result<(), FeeError> {
        if !gov.is_admin(caller) {
            return Err(FeeError::Unauthorized {
                caller: caller.clone(),
            });
        }
        tracing::info!("Fee recipient set to {}", recipient);
        self.recipient = recipient;
        Ok(())
    }

    /// floor(amount * rate_bps / 10000)
    pub fn calculate_fee(&self, amount: Amount) -> Amount {
        calculator::calculate_fee(amount, self.rate_bps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_fixture() -> (Governance, FeeManager) {
        let config = EngineConfig::with_owner(AccountId::new("deployer"));
        (Governance::new(&config), FeeManager::new(&config))
    }

    #[test]
    fn test_small_amount_fee_is_zero() {
        let (_, fees) = make_fixture();
        assert_eq!(fees.rate_bps(), 30);
        assert_eq!(fees.calculate_fee(100), 0);
        assert_eq!(fees.calculate_fee(1_000_000), 3_000);
    }

    #[test]
    fn test_set_fee_limit() {
        let (gov, mut fees) = make_fixture();
        let owner = AccountId::new("deployer");

        let err = fees.set_fee(&gov, &owner, 101).unwrap_err();
        assert!(matches!(
            err,
            FeeError::FeeLimitExceeded {
                rate_bps: 101,
                max_bps: 100
            }
        ));
        assert_eq!(fees.rate_bps(), 30);

        fees.set_fee(&gov, &owner, 100).unwrap();
        assert_eq!(fees.calculate_fee(10_000), 100);
    }

    #[test]
    fn test_set_fee_unauthorized_checked_first() {
        let (gov, mut fees) = make_fixture();
        let err = fees
            .set_fee(&gov, &AccountId::new("wallet_1"), 500)
            .unwrap_err();
        assert!(matches!(err, FeeError::Unauthorized { .. }));
    }

    #[test]
    fn test_set_fee_recipient() {
        let (mut gov, mut fees) = make_fixture();
        let owner = AccountId::new("deployer");
        let admin = AccountId::new("wallet_1");
        gov.add_admin(&owner, admin.clone()).unwrap();

        fees.set_fee_recipient(&gov, &admin, AccountId::new("treasury"))
            .unwrap();
        assert_eq!(fees.recipient(), &AccountId::new("treasury"));

        assert!(fees
            .set_fee_recipient(&gov, &AccountId::new("wallet_2"), AccountId::new("x"))
            .is_err());
    }
}
