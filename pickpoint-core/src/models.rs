use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;
use crate::packaging::PackageKind;

/// Hours a customer has to request a refund after collecting a parcel.
pub const REFUND_WINDOW_HOURS: i64 = 48;

/// Identifier of an order. Always positive; ids are never reused, even after
/// the row is deleted by a courier return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(i64);

impl OrderId {
    pub fn new(raw: i64) -> Result<Self, ValidationError> {
        if raw <= 0 {
            return Err(ValidationError::IncorrectId);
        }
        Ok(Self(raw))
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the customer owning an order. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(i64);

impl CustomerId {
    pub fn new(raw: i64) -> Result<Self, ValidationError> {
        if raw <= 0 {
            return Err(ValidationError::IncorrectId);
        }
        Ok(Self(raw))
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A parcel tracked by the pickup point, from drop-off to collection,
/// refund, or return to the courier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    pub expiration_time: DateTime<Utc>,
    pub received_time: Option<DateTime<Utc>>,
    pub received_by_customer: bool,
    pub refunded: bool,
    pub package: PackageKind,
    pub weight: f64,
    pub cost: i64,
    pub package_cost: i64,
}

impl Order {
    /// True while the parcel may still be collected by its customer.
    pub fn collectible_at(&self, now: DateTime<Utc>) -> bool {
        self.expiration_time > now
    }

    /// Last moment a refund may be requested, if the parcel was collected.
    pub fn refund_deadline(&self) -> Option<DateTime<Utc>> {
        self.received_time
            .map(|t| t + Duration::hours(REFUND_WINDOW_HOURS))
    }

    /// True while a collected parcel is still inside the refund window.
    pub fn within_refund_window(&self, now: DateTime<Utc>) -> bool {
        match self.refund_deadline() {
            Some(deadline) => deadline >= now,
            None => false,
        }
    }

    /// Gate for handing a parcel back to the courier (which deletes the row).
    ///
    /// Requires the order to be already collected AND already expired, which
    /// is nearly impossible to satisfy in one lifetime of a parcel.
    /// TODO: confirm with product whether this was meant to be "NOT collected
    /// and expired" (courier reclaims an uncollected parcel); until then the
    /// historical rule is kept as-is and pinned by tests.
    pub fn returnable_to_courier_at(&self, now: DateTime<Utc>) -> bool {
        self.received_by_customer && self.expiration_time < now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(received: bool, expiration: DateTime<Utc>) -> Order {
        Order {
            order_id: OrderId::new(1).unwrap(),
            customer_id: CustomerId::new(1).unwrap(),
            expiration_time: expiration,
            received_time: received.then(Utc::now),
            received_by_customer: received,
            refunded: false,
            package: PackageKind::Box,
            weight: 1.0,
            cost: 100,
            package_cost: 20,
        }
    }

    #[test]
    fn test_id_must_be_positive() {
        assert!(OrderId::new(1).is_ok());
        assert!(OrderId::new(0).is_err());
        assert!(OrderId::new(-5).is_err());
        assert!(CustomerId::new(42).is_ok());
        assert!(CustomerId::new(0).is_err());
    }

    #[test]
    fn test_refund_deadline() {
        let now = Utc::now();
        let mut o = order(true, now + Duration::days(2));
        o.received_time = Some(now - Duration::hours(REFUND_WINDOW_HOURS) + Duration::seconds(1));
        assert!(o.within_refund_window(now));

        o.received_time = Some(now - Duration::hours(REFUND_WINDOW_HOURS) - Duration::seconds(1));
        assert!(!o.within_refund_window(now));

        o.received_time = None;
        assert!(!o.within_refund_window(now));
    }

    #[test]
    fn test_courier_return_gate_truth_table() {
        let now = Utc::now();
        let expired = now - Duration::hours(1);
        let live = now + Duration::hours(1);

        // The historical conjunction: collected AND expired.
        assert!(order(true, expired).returnable_to_courier_at(now));
        assert!(!order(true, live).returnable_to_courier_at(now));
        assert!(!order(false, expired).returnable_to_courier_at(now));
        assert!(!order(false, live).returnable_to_courier_at(now));
    }

    #[test]
    fn test_collectible_until_expiration() {
        let now = Utc::now();
        assert!(order(false, now + Duration::minutes(1)).collectible_at(now));
        assert!(!order(false, now).collectible_at(now));
        assert!(!order(false, now - Duration::minutes(1)).collectible_at(now));
    }
}
