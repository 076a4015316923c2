use std::error;
use std::fmt;

use bus::range::AddressRange;
use types::Address;

#[derive(Debug, PartialEq, Clone)]
pub enum BusError {
    /// The added range intersects a range already attached to the bus.
    OverlappingHardware {
        existing: AddressRange,
        added: AddressRange,
    },
    /// A read hit an address no hardware answers for.
    UndefinedAddress(Address),
    /// A write hit an address no hardware answers for.
    WriteError(Address),
    InvalidRange { low: Address, high: Address },
    /// Hardware placed at the given address with no backing storage.
    EmptyHardware(Address),
    /// Backing storage length does not match the span of its range.
    SizeMismatch { range: AddressRange, len: usize },
    /// A span of `count` bytes at `address` runs past the top of the address space.
    AddressOverflow { address: Address, count: usize },
}

impl error::Error for BusError {
    fn description(&self) -> &str {
        match *self {
            BusError::OverlappingHardware { .. } => "Overlapping hardware",
            BusError::UndefinedAddress(_) => "Undefined address",
            BusError::WriteError(_) => "Write to unmapped address",
            BusError::InvalidRange { .. } => "Invalid address range",
            BusError::EmptyHardware(_) => "Empty hardware",
            BusError::SizeMismatch { .. } => "Hardware size mismatch",
            BusError::AddressOverflow { .. } => "Address overflow",
        }
    }
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            BusError::OverlappingHardware { existing, added } => write!(
                f,
                "Hardware at {} overlaps existing hardware at {}",
                added, existing
            ),
            BusError::UndefinedAddress(addr) => write!(f, "Undefined address {:#06x}", addr),
            BusError::WriteError(addr) => write!(f, "Write to unmapped address {:#06x}", addr),
            BusError::InvalidRange { low, high } => {
                write!(f, "Invalid address range {:#06x}-{:#06x}", low, high)
            }
            BusError::EmptyHardware(addr) => {
                write!(f, "Hardware at {:#06x} has no backing storage", addr)
            }
            BusError::SizeMismatch { range, len } => write!(
                f,
                "Hardware at {} needs {} bytes but got {}",
                range,
                range.len(),
                len
            ),
            BusError::AddressOverflow { address, count } => write!(
                f,
                "Access of {} bytes at {:#06x} runs past the end of the address space",
                count, address
            ),
        }
    }
}

#[test]
fn display_write_error() {
    let err = BusError::WriteError(0x0004);
    assert_eq!(format!("{}", err), "Write to unmapped address 0x0004");
}

#[test]
fn display_overlapping_hardware() {
    let err = BusError::OverlappingHardware {
        existing: AddressRange::new(0x0000, 0x0010).unwrap(),
        added: AddressRange::new(0x0010, 0x0013).unwrap(),
    };
    assert_eq!(
        format!("{}", err),
        "Hardware at 0x0010-0x0013 overlaps existing hardware at 0x0000-0x0010"
    );
}
