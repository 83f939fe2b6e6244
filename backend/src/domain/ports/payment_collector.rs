//! Outbound port for collecting late fees.
//!
//! The collector only receives "charge this amount". Gateway integration,
//! currencies and receipts live behind the adapter.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::{RentalId, UserId};

use super::define_port_error;

/// A late fee owed for one returned rental.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LateFeeCharge {
    pub rental_id: RentalId,
    pub user_id: UserId,
    pub late_days: u32,
    pub amount: Decimal,
}

define_port_error! {
    /// Errors raised by payment collector adapters.
    pub enum PaymentCollectorError {
        /// The payment provider could not be reached.
        Unavailable { message: String } =>
            "payment collector unavailable: {message}",
        /// The payment provider refused the charge.
        Rejected { message: String } =>
            "payment collector rejected the charge: {message}",
    }
}

/// Port for submitting late fee charges.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentCollector: Send + Sync {
    /// Submit a charge for collection.
    async fn charge(&self, charge: &LateFeeCharge) -> Result<(), PaymentCollectorError>;
}

/// Fixture collector that accepts every charge.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixturePaymentCollector;

#[async_trait]
impl PaymentCollector for FixturePaymentCollector {
    async fn charge(&self, _charge: &LateFeeCharge) -> Result<(), PaymentCollectorError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[tokio::test]
    async fn fixture_accepts_charges() {
        let charge = LateFeeCharge {
            rental_id: RentalId::random(),
            user_id: UserId::random(),
            late_days: 2,
            amount: Decimal::new(400, 2),
        };
        FixturePaymentCollector
            .charge(&charge)
            .await
            .expect("fixture charge succeeds");
    }

    #[rstest]
    fn charge_serialises_in_camel_case() {
        let charge = LateFeeCharge {
            rental_id: RentalId::random(),
            user_id: UserId::random(),
            late_days: 1,
            amount: Decimal::ONE,
        };
        let value = serde_json::to_value(&charge).expect("serialise charge");
        assert_eq!(value["lateDays"], 1);
        assert!(value.get("rentalId").is_some());
    }
}
