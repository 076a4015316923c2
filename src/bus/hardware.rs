use super::range::AddressRange;
use error::BusError;
use types::{Address, Byte};

/// A device on the bus: the range it answers for and its backing storage.
#[derive(Debug, PartialEq, Clone)]
pub struct Hardware {
    range: AddressRange,
    bytes: Vec<Byte>,
}

impl Hardware {
    pub fn new(range: AddressRange, bytes: Vec<Byte>) -> Result<Self, BusError> {
        if bytes.len() != range.len() {
            return Err(BusError::SizeMismatch {
                range,
                len: bytes.len(),
            });
        }
        Ok(Hardware { range, bytes })
    }

    pub fn zeroed(range: AddressRange) -> Self {
        Hardware {
            range,
            bytes: vec![0; range.len()],
        }
    }

    /// Places `bytes` starting at `low`.
    pub fn at(low: Address, bytes: Vec<Byte>) -> Result<Self, BusError> {
        if bytes.is_empty() {
            return Err(BusError::EmptyHardware(low));
        }
        let end = low as usize + bytes.len();
        if end > 0x10000 {
            return Err(BusError::AddressOverflow {
                address: low,
                count: bytes.len(),
            });
        }
        let range = AddressRange::new(low, (end - 1) as Address)?;
        Ok(Hardware { range, bytes })
    }

    pub fn range(&self) -> AddressRange {
        self.range
    }

    pub fn bytes(&self) -> &[Byte] {
        &self.bytes
    }

    pub fn into_parts(self) -> (AddressRange, Vec<Byte>) {
        (self.range, self.bytes)
    }
}

#[test]
fn hardware_rejects_size_mismatch() {
    let range = AddressRange::new(0, 3).unwrap();
    assert_eq!(
        Hardware::new(range, vec![0x00, 0x01]),
        Err(BusError::SizeMismatch { range, len: 2 })
    );
}

#[test]
fn hardware_zeroed() {
    let hw = Hardware::zeroed(AddressRange::new(0x10, 0x13).unwrap());
    assert_eq!(hw.bytes(), &[0, 0, 0, 0]);
}

#[test]
fn hardware_at_derives_range() {
    let hw = Hardware::at(0x8000, vec![0xAA, 0xBB]).unwrap();
    assert_eq!(hw.range(), AddressRange::new(0x8000, 0x8001).unwrap());
}

#[test]
fn hardware_at_fills_top_of_address_space() {
    let hw = Hardware::at(0xFFFE, vec![0x01, 0x02]).unwrap();
    assert_eq!(hw.range().high(), 0xFFFF);
}

#[test]
fn hardware_at_rejects_span_past_end() {
    assert_eq!(
        Hardware::at(0xFFFF, vec![0x01, 0x02]),
        Err(BusError::AddressOverflow {
            address: 0xFFFF,
            count: 2,
        })
    );
}

#[test]
fn hardware_at_rejects_empty_storage() {
    assert_eq!(
        Hardware::at(0x0000, vec![]),
        Err(BusError::EmptyHardware(0x0000))
    );
}
