//! Branch features: anything anchored to a branch by an offset.

use std::cmp::Ordering;

use crate::{BranchId, Error, OFFSET_TOLERANCE};

/// A point on the network, `offset` distance from the source end of `branch`.
#[derive(Debug, Clone, Copy)]
pub struct NetworkLocation {
    pub branch: BranchId,
    pub offset: f64,
}

impl NetworkLocation {
    pub fn new(branch: BranchId, offset: f64) -> Self {
        Self { branch, offset }
    }

    /// Orders two locations along their shared branch.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Comparison`] when the locations sit on different
    /// branches; there is no ordering between them without a path.
    pub fn try_cmp(&self, other: &Self) -> Result<Ordering, Error> {
        if self.branch != other.branch {
            return Err(Error::Comparison);
        }
        if (self.offset - other.offset).abs() <= OFFSET_TOLERANCE {
            Ok(Ordering::Equal)
        } else {
            Ok(self.offset.total_cmp(&other.offset))
        }
    }
}

impl PartialEq for NetworkLocation {
    fn eq(&self, other: &Self) -> bool {
        self.branch == other.branch && (self.offset - other.offset).abs() <= OFFSET_TOLERANCE
    }
}

impl PartialOrd for NetworkLocation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.try_cmp(other).ok()
    }
}

/// A directed stretch `[offset, end_offset]` of a branch.
///
/// `offset` is where the walk along the segment starts and `end_offset`
/// where it stops; `direction_is_positive` tells whether that walk follows
/// the branch from its source towards its target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NetworkSegment {
    pub branch: BranchId,
    pub offset: f64,
    pub end_offset: f64,
    pub direction_is_positive: bool,
}

impl NetworkSegment {
    /// Segment walked from `offset` to `end_offset`, direction derived from
    /// their order.
    pub fn new(branch: BranchId, offset: f64, end_offset: f64) -> Self {
        Self {
            branch,
            offset,
            end_offset,
            direction_is_positive: end_offset >= offset,
        }
    }

    pub fn length(&self) -> f64 {
        (self.end_offset - self.offset).abs()
    }

    pub fn min_offset(&self) -> f64 {
        self.offset.min(self.end_offset)
    }

    pub fn max_offset(&self) -> f64 {
        self.offset.max(self.end_offset)
    }

    /// Offset at which a walk along this segment starts.
    pub fn start_offset(&self) -> f64 {
        if self.direction_is_positive {
            self.min_offset()
        } else {
            self.max_offset()
        }
    }

    /// Offset at which a walk along this segment stops.
    pub fn stop_offset(&self) -> f64 {
        if self.direction_is_positive {
            self.max_offset()
        } else {
            self.min_offset()
        }
    }

    pub fn start_location(&self) -> NetworkLocation {
        NetworkLocation::new(self.branch, self.start_offset())
    }

    pub fn stop_location(&self) -> NetworkLocation {
        NetworkLocation::new(self.branch, self.stop_offset())
    }

    /// `offset` lies in the closed range covered by the segment.
    pub fn contains(&self, offset: f64) -> bool {
        offset >= self.min_offset() - OFFSET_TOLERANCE
            && offset <= self.max_offset() + OFFSET_TOLERANCE
    }

    /// `offset` lies inside the segment and not at either end.
    pub fn strictly_contains(&self, offset: f64) -> bool {
        offset > self.min_offset() + OFFSET_TOLERANCE && offset < self.max_offset() - OFFSET_TOLERANCE
    }

    /// Distance walked from the segment start to reach `offset`.
    pub fn distance_to(&self, offset: f64) -> f64 {
        (offset - self.start_offset()).abs()
    }

    /// Cuts the segment at `offset` into the parts below and above it. Both
    /// parts keep the walking direction; an `offset` outside the segment
    /// leaves one part empty.
    pub fn cut_at(&self, offset: f64) -> (NetworkSegment, NetworkSegment) {
        let lower = NetworkSegment {
            offset: self.offset.min(offset),
            end_offset: self.end_offset.min(offset),
            ..*self
        };
        let upper = NetworkSegment {
            offset: self.offset.max(offset),
            end_offset: self.end_offset.max(offset),
            ..*self
        };
        (lower, upper)
    }
}

/// Entity attached to a branch at an offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BranchFeature {
    Location(NetworkLocation),
    Segment(NetworkSegment),
}

impl BranchFeature {
    pub fn branch(&self) -> BranchId {
        match self {
            BranchFeature::Location(location) => location.branch,
            BranchFeature::Segment(segment) => segment.branch,
        }
    }

    /// Anchor offset; for a segment that is the offset it was created with.
    pub fn offset(&self) -> f64 {
        match self {
            BranchFeature::Location(location) => location.offset,
            BranchFeature::Segment(segment) => segment.offset,
        }
    }

    /// Largest offset occupied on the branch.
    pub fn max_offset(&self) -> f64 {
        match self {
            BranchFeature::Location(location) => location.offset,
            BranchFeature::Segment(segment) => segment.max_offset(),
        }
    }

    /// Smallest offset occupied on the branch.
    pub fn min_offset(&self) -> f64 {
        match self {
            BranchFeature::Location(location) => location.offset,
            BranchFeature::Segment(segment) => segment.min_offset(),
        }
    }

    /// The point this feature is anchored at.
    pub fn anchor(&self) -> NetworkLocation {
        NetworkLocation::new(self.branch(), self.offset())
    }

    pub(crate) fn rebase(&mut self, branch: BranchId, shift: f64) {
        match self {
            BranchFeature::Location(location) => {
                location.branch = branch;
                location.offset -= shift;
            }
            BranchFeature::Segment(segment) => {
                segment.branch = branch;
                segment.offset -= shift;
                segment.end_offset -= shift;
            }
        }
    }
}

impl From<NetworkLocation> for BranchFeature {
    fn from(location: NetworkLocation) -> Self {
        BranchFeature::Location(location)
    }
}

impl From<NetworkSegment> for BranchFeature {
    fn from(segment: NetworkSegment) -> Self {
        BranchFeature::Segment(segment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_equality_uses_tolerance() {
        let b = BranchId::new(0);
        assert_eq!(NetworkLocation::new(b, 10.0), NetworkLocation::new(b, 10.0 + 1e-9));
        assert_ne!(NetworkLocation::new(b, 10.0), NetworkLocation::new(b, 10.1));
        assert_ne!(
            NetworkLocation::new(b, 10.0),
            NetworkLocation::new(BranchId::new(1), 10.0)
        );
    }

    #[test]
    fn test_location_ordering() {
        let b = BranchId::new(0);
        let near = NetworkLocation::new(b, 5.0);
        let far = NetworkLocation::new(b, 50.0);
        assert_eq!(near.try_cmp(&far).unwrap(), Ordering::Less);
        assert!(far > near);

        let other = NetworkLocation::new(BranchId::new(3), 5.0);
        assert!(matches!(near.try_cmp(&other), Err(Error::Comparison)));
        assert_eq!(near.partial_cmp(&other), None);
    }

    #[test]
    fn test_segment_walk_direction() {
        let b = BranchId::new(0);
        let backwards = NetworkSegment::new(b, 20.0, 10.0);
        assert!(!backwards.direction_is_positive);
        assert_eq!(backwards.length(), 10.0);
        assert_eq!(backwards.start_offset(), 20.0);
        assert_eq!(backwards.stop_offset(), 10.0);
        assert_eq!(backwards.distance_to(12.0), 8.0);

        // normalised storage with an explicit flag walks the same way
        let normalised = NetworkSegment {
            branch: b,
            offset: 10.0,
            end_offset: 20.0,
            direction_is_positive: false,
        };
        assert_eq!(normalised.start_offset(), 20.0);
    }

    #[test]
    fn test_segment_containment() {
        let segment = NetworkSegment::new(BranchId::new(0), 10.0, 20.0);
        assert!(segment.contains(10.0));
        assert!(segment.contains(20.0 + 1e-7));
        assert!(!segment.contains(21.0));
        assert!(segment.strictly_contains(15.0));
        assert!(!segment.strictly_contains(10.0));
        assert!(!segment.strictly_contains(20.0 - 1e-7));
    }

    #[test]
    fn test_segment_cut_keeps_direction() {
        let b = BranchId::new(0);
        let (lower, upper) = NetworkSegment::new(b, 30.0, 60.0).cut_at(40.0);
        assert_eq!(lower, NetworkSegment::new(b, 30.0, 40.0));
        assert_eq!(upper, NetworkSegment::new(b, 40.0, 60.0));

        let (lower, upper) = NetworkSegment::new(b, 60.0, 30.0).cut_at(40.0);
        assert_eq!(lower, NetworkSegment::new(b, 40.0, 30.0));
        assert_eq!(upper, NetworkSegment::new(b, 60.0, 40.0));
        assert!(!lower.direction_is_positive);
        assert_eq!(lower.length() + upper.length(), 30.0);
    }

    #[test]
    fn test_feature_rebase() {
        let mut feature = BranchFeature::from(NetworkSegment::new(BranchId::new(0), 70.0, 90.0));
        feature.rebase(BranchId::new(4), 60.0);
        assert_eq!(feature.branch(), BranchId::new(4));
        assert_eq!(feature.offset(), 10.0);
        assert_eq!(feature.max_offset(), 30.0);
    }
}
