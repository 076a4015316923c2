use std::fmt;

use error::BusError;
use types::Address;

/// A closed interval `[low, high]` of addresses owned by one piece of hardware.
///
/// Ordering is by `(low, high)`, which is what the bus uses to key its regions.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
pub struct AddressRange {
    low: Address,
    high: Address,
}

impl AddressRange {
    pub fn new(low: Address, high: Address) -> Result<Self, BusError> {
        if low > high {
            return Err(BusError::InvalidRange { low, high });
        }
        Ok(AddressRange { low, high })
    }

    pub fn low(&self) -> Address {
        self.low
    }

    pub fn high(&self) -> Address {
        self.high
    }

    /// Number of addresses covered, `1..=0x10000`.
    pub fn len(&self) -> usize {
        (self.high - self.low) as usize + 1
    }

    pub fn contains(&self, addr: Address) -> bool {
        self.low <= addr && addr <= self.high
    }

    pub fn overlaps(&self, other: &AddressRange) -> bool {
        !(other.low > self.high || other.high < self.low)
    }

    pub fn offset_of(&self, addr: Address) -> Option<usize> {
        if self.contains(addr) {
            Some((addr - self.low) as usize)
        } else {
            None
        }
    }
}

impl fmt::Display for AddressRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:#06x}-{:#06x}", self.low, self.high)
    }
}

#[test]
fn range_rejects_inverted_bounds() {
    assert_eq!(
        AddressRange::new(0x10, 0x0F),
        Err(BusError::InvalidRange { low: 0x10, high: 0x0F })
    );
}

#[test]
fn range_len() {
    assert_eq!(AddressRange::new(5, 5).unwrap().len(), 1);
    assert_eq!(AddressRange::new(100, 103).unwrap().len(), 4);
    assert_eq!(AddressRange::new(0, 0xFFFF).unwrap().len(), 0x10000);
}

#[test]
fn range_adjacent_does_not_overlap() {
    let a = AddressRange::new(0, 9).unwrap();
    let b = AddressRange::new(10, 19).unwrap();
    assert!(!a.overlaps(&b));
    assert!(!b.overlaps(&a));
}

#[test]
fn range_shared_boundary_overlaps() {
    let a = AddressRange::new(0, 10).unwrap();
    let b = AddressRange::new(10, 19).unwrap();
    assert!(a.overlaps(&b));
    assert!(b.overlaps(&a));
}

#[test]
fn range_single_address_overlaps_enclosing() {
    let a = AddressRange::new(5, 5).unwrap();
    let b = AddressRange::new(0, 10).unwrap();
    assert!(a.overlaps(&b));
    assert!(b.overlaps(&a));
    assert!(a.overlaps(&a));
}

#[test]
fn range_offset_of() {
    let r = AddressRange::new(100, 103).unwrap();
    assert_eq!(r.offset_of(100), Some(0));
    assert_eq!(r.offset_of(103), Some(3));
    assert_eq!(r.offset_of(99), None);
    assert_eq!(r.offset_of(104), None);
}
