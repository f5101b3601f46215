//! Operation weights for passive aliveness reports
//!
//! Heavier operations move the aliveness score further.

use std::fmt;

const MIB: u64 = 1024 * 1024;
const MAX_WEIGHT: u64 = 10_000;

/// Importance of a storage operation
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct OperationWeight(pub f64);

impl OperationWeight {
    pub const EXISTS: OperationWeight = OperationWeight(1000.0);
    pub const LIST: OperationWeight = OperationWeight(2000.0);
    pub const COPY: OperationWeight = OperationWeight(1000.0);

    /// Reading `bytes` of content
    pub fn read(bytes: u64) -> Self {
        Self::sized(bytes)
    }

    /// Writing `bytes` of content
    pub fn put(bytes: u64) -> Self {
        Self::sized(bytes)
    }

    /// Deleting `objects` objects
    pub fn delete(objects: usize) -> Self {
        let weight = 1000 + 10 * objects as u64;
        OperationWeight(weight.min(MAX_WEIGHT) as f64)
    }

    fn sized(bytes: u64) -> Self {
        let weight = 1000 + 100 * (bytes / MIB);
        OperationWeight(weight.min(MAX_WEIGHT) as f64)
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for OperationWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sized_weights() {
        assert_eq!(OperationWeight::read(0).value(), 1000.0);
        assert_eq!(OperationWeight::read(10 * MIB).value(), 2000.0);
        assert_eq!(OperationWeight::put(MIB - 1).value(), 1000.0);
        assert_eq!(OperationWeight::put(1024 * MIB).value(), 10_000.0);
    }

    #[test]
    fn test_delete_weight() {
        assert_eq!(OperationWeight::delete(1).value(), 1010.0);
        assert_eq!(OperationWeight::delete(100_000).value(), 10_000.0);
    }
}
