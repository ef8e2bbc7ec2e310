use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PackagingError {
    #[error("invalid package")]
    InvalidPackage,
    #[error("weight exceeded")]
    WeightExceeded,
}

/// Packaging offered at the counter. Each kind carries a wrapping cost and,
/// for all but wrap, a weight ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageKind {
    Bag,
    Box,
    Wrap,
}

impl PackageKind {
    pub fn parse(raw: &str) -> Result<Self, PackagingError> {
        match raw {
            "bag" => Ok(Self::Bag),
            "box" => Ok(Self::Box),
            "wrap" => Ok(Self::Wrap),
            _ => Err(PackagingError::InvalidPackage),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bag => "bag",
            Self::Box => "box",
            Self::Wrap => "wrap",
        }
    }

    /// Exclusive weight ceiling in kilograms; `None` means unrestricted.
    pub fn max_weight(self) -> Option<f64> {
        match self {
            Self::Bag => Some(10.0),
            Self::Box => Some(30.0),
            Self::Wrap => None,
        }
    }

    /// Wrapping cost added on top of the declared parcel cost.
    pub fn cost(self) -> i64 {
        match self {
            Self::Bag => 5,
            Self::Box => 20,
            Self::Wrap => 1,
        }
    }

    pub fn validate_weight(self, weight: f64) -> Result<(), PackagingError> {
        if let Some(limit) = self.max_weight() {
            if weight >= limit {
                return Err(PackagingError::WeightExceeded);
            }
        }
        Ok(())
    }
}

impl fmt::Display for PackageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
