use serde::{Deserialize, Serialize};

use super::money::Money;

/// Configured fees for each chargeable request type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub membership_annual: Money,
    pub membership_lifetime: Money,
    pub syndicate: Money,
    pub certificate_graduation: Money,
    pub certificate_transcript: Money,
    pub certificate_enrollment: Money,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            membership_annual: Money::from_major(500),
            membership_lifetime: Money::from_major(5_000),
            syndicate: Money::from_major(750),
            certificate_graduation: Money::from_major(150),
            certificate_transcript: Money::from_major(100),
            certificate_enrollment: Money::from_major(50),
        }
    }
}
