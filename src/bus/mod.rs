pub mod hardware;
pub mod range;

pub mod readable;
pub mod writable;

use std::collections::BTreeMap;
use std::ops;
use std::rc::Rc;

use self::hardware::Hardware;
use self::range::AddressRange;
use self::readable::*;
use self::writable::*;
use error::BusError;
use types::{Address, Byte};

const ADDRESS_SPACE_SIZE: usize = 0x1_0000;

pub trait Raw {
    fn raw(&self, addr: Address, count: usize) -> Result<Vec<Byte>, BusError>;
}

pub trait MutRaw: Sized {
    fn mut_raw(&self, addr: Address, data: &[Byte]) -> Result<Self, BusError>;
}

/// Routes byte accesses to the hardware owning the target address.
///
/// Attached ranges never overlap. Every mutating operation leaves `self`
/// untouched and returns a new bus; regions are shared between the two and
/// only the region actually written is copied.
#[derive(Debug, Clone, Default)]
pub struct AddressBus {
    regions: BTreeMap<AddressRange, Rc<Vec<Byte>>>,
}

impl AddressBus {
    pub fn empty() -> Self {
        AddressBus {
            regions: BTreeMap::new(),
        }
    }

    pub fn add(&self, hardware: Hardware) -> Result<Self, BusError> {
        let (range, bytes) = hardware.into_parts();
        if let Some(existing) = self.regions.keys().find(|r| r.overlaps(&range)) {
            debug!("rejected hardware at {}: overlaps {}", range, existing);
            return Err(BusError::OverlappingHardware {
                existing: *existing,
                added: range,
            });
        }
        let mut regions = self.regions.clone();
        regions.insert(range, Rc::new(bytes));
        debug!("attached hardware at {}", range);
        Ok(AddressBus { regions })
    }

    /// Detaches whatever is keyed by the hardware's exact range. Unknown ranges are ignored.
    pub fn remove(&self, hardware: &Hardware) -> Self {
        self.remove_range(hardware.range())
    }

    pub fn remove_range(&self, range: AddressRange) -> Self {
        let mut regions = self.regions.clone();
        if regions.remove(&range).is_some() {
            debug!("detached hardware at {}", range);
        }
        AddressBus { regions }
    }

    pub fn read(&self, addr: Address) -> Result<Byte, BusError> {
        let byte = self
            .resolve(addr)
            .and_then(|(range, bytes)| range.offset_of(addr).and_then(move |o| bytes.get(o)))
            .cloned();
        trace!("read {:#06x} -> {:?}", addr, byte);
        byte.ok_or(BusError::UndefinedAddress(addr))
    }

    /// Reads `count` consecutive bytes. Any unmapped address fails the whole read.
    pub fn read_bytes(&self, addr: Address, count: usize) -> Result<Vec<Byte>, BusError> {
        span(addr, count)?
            .map(|a| self.read(a as Address))
            .collect()
    }

    pub fn read_range(&self, range: AddressRange) -> Result<Vec<Byte>, BusError> {
        self.read_bytes(range.low(), range.len())
    }

    pub fn write(&self, addr: Address, data: Byte) -> Result<Self, BusError> {
        let target = self.locate(addr).ok_or_else(|| {
            debug!("write to unmapped address {:#06x}", addr);
            BusError::WriteError(addr)
        })?;
        trace!("write {:#06x} <- {:#04x}", addr, data);
        Ok(self.apply(vec![(target, data)]))
    }

    /// Writes `data` starting at `addr`.
    ///
    /// Every target address is resolved before anything is written, so on
    /// error no byte has been applied.
    pub fn write_bytes(&self, addr: Address, data: &[Byte]) -> Result<Self, BusError> {
        let targets = span(addr, data.len())?
            .map(|a| {
                let a = a as Address;
                self.locate(a).ok_or_else(|| {
                    debug!("write to unmapped address {:#06x}", a);
                    BusError::WriteError(a)
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        trace!("write {} bytes at {:#06x}", data.len(), addr);
        Ok(self.apply(targets.into_iter().zip(data.iter().cloned()).collect()))
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Attached ranges in address order.
    pub fn ranges<'a>(&'a self) -> impl Iterator<Item = AddressRange> + 'a {
        self.regions.keys().cloned()
    }

    pub fn get(&self, range: AddressRange) -> Option<&[Byte]> {
        self.regions.get(&range).map(|bytes| bytes.as_slice())
    }

    pub fn contains(&self, addr: Address) -> bool {
        self.resolve(addr).is_some()
    }

    fn resolve(&self, addr: Address) -> Option<(&AddressRange, &Rc<Vec<Byte>>)> {
        // With disjoint ranges the owner is the last range starting at or below `addr`.
        let probe = AddressRange::new(addr, Address::max_value()).ok()?;
        self.regions
            .range(..=probe)
            .next_back()
            .filter(|&(range, _)| range.contains(addr))
            .or_else(|| {
                self.regions
                    .iter()
                    .find(|&(range, _)| range.contains(addr))
            })
    }

    fn locate(&self, addr: Address) -> Option<(AddressRange, usize)> {
        self.resolve(addr).and_then(|(range, bytes)| {
            range
                .offset_of(addr)
                .filter(|&o| o < bytes.len())
                .map(|o| (*range, o))
        })
    }

    fn apply(&self, writes: Vec<((AddressRange, usize), Byte)>) -> Self {
        let mut regions = self.regions.clone();
        for ((range, offset), data) in writes {
            if let Some(bytes) = regions.get_mut(&range) {
                Rc::make_mut(bytes)[offset] = data;
            }
        }
        AddressBus { regions }
    }
}

fn span(addr: Address, count: usize) -> Result<ops::Range<usize>, BusError> {
    let start = addr as usize;
    match start.checked_add(count) {
        Some(end) if end <= ADDRESS_SPACE_SIZE => Ok(start..end),
        _ => Err(BusError::AddressOverflow {
            address: addr,
            count,
        }),
    }
}

impl Raw for AddressBus {
    fn raw(&self, addr: Address, count: usize) -> Result<Vec<Byte>, BusError> {
        self.read_bytes(addr, count)
    }
}

impl MutRaw for AddressBus {
    fn mut_raw(&self, addr: Address, data: &[Byte]) -> Result<Self, BusError> {
        self.write_bytes(addr, data)
    }
}

impl HalfWordReadable for AddressBus {}
impl WordReadable for AddressBus {}

impl HalfWordWritable for AddressBus {}
impl WordWritable for AddressBus {}

#[cfg(test)]
fn addr_range(low: Address, high: Address) -> AddressRange {
    AddressRange::new(low, high).unwrap()
}

#[cfg(test)]
fn device(low: Address, high: Address, bytes: Vec<Byte>) -> Hardware {
    Hardware::new(addr_range(low, high), bytes).unwrap()
}

#[test]
fn bus_empty_reads_nothing() {
    let bus = AddressBus::empty();
    assert!(bus.is_empty());
    assert_eq!(bus.read(0x0000), Err(BusError::UndefinedAddress(0x0000)));
}

#[test]
fn bus_read_mapped_region() {
    let bus = AddressBus::empty()
        .add(device(100, 103, vec![0xAA, 0xBB, 0xCC, 0xDD]))
        .unwrap();
    assert_eq!(bus.read(100), Ok(0xAA));
    assert_eq!(bus.read(101), Ok(0xBB));
    assert_eq!(bus.read(103), Ok(0xDD));
    assert_eq!(bus.read(99), Err(BusError::UndefinedAddress(99)));
    assert_eq!(bus.read(104), Err(BusError::UndefinedAddress(104)));
}

#[test]
fn bus_read_selects_owning_region() {
    let bus = AddressBus::empty()
        .add(device(0x10, 0x11, vec![0x01, 0x02]))
        .unwrap()
        .add(device(0x00, 0x01, vec![0x03, 0x04]))
        .unwrap()
        .add(device(0x20, 0x20, vec![0x05]))
        .unwrap();
    assert_eq!(bus.read(0x01), Ok(0x04));
    assert_eq!(bus.read(0x10), Ok(0x01));
    assert_eq!(bus.read(0x20), Ok(0x05));
    assert_eq!(bus.read(0x12), Err(BusError::UndefinedAddress(0x12)));
    assert_eq!(bus.read(0xFFFF), Err(BusError::UndefinedAddress(0xFFFF)));
}

#[test]
fn bus_add_rejects_overlap_and_keeps_bus() {
    let bus = AddressBus::empty()
        .add(device(0, 10, vec![0; 11]))
        .unwrap();
    let result = bus.add(device(10, 19, vec![0; 10]));
    assert_eq!(
        result.unwrap_err(),
        BusError::OverlappingHardware {
            existing: addr_range(0, 10),
            added: addr_range(10, 19),
        }
    );
    assert_eq!(bus.len(), 1);
    assert_eq!(bus.ranges().collect::<Vec<_>>(), vec![addr_range(0, 10)]);
}

#[test]
fn bus_add_rejects_duplicate_range() {
    let bus = AddressBus::empty()
        .add(device(0, 3, vec![0; 4]))
        .unwrap();
    assert!(bus.add(device(0, 3, vec![1; 4])).is_err());
    assert_eq!(bus.get(addr_range(0, 3)), Some(&[0u8, 0, 0, 0][..]));
}

#[test]
fn bus_add_rejects_enclosed_range() {
    let bus = AddressBus::empty()
        .add(device(0, 10, vec![0; 11]))
        .unwrap();
    assert!(bus.add(device(5, 5, vec![0])).is_err());
}

#[test]
fn bus_add_adjacent_ranges() {
    let bus = AddressBus::empty()
        .add(device(0, 9, vec![0; 10]))
        .unwrap()
        .add(device(10, 19, vec![1; 10]))
        .unwrap();
    assert_eq!(bus.len(), 2);
    assert_eq!(bus.read(9), Ok(0));
    assert_eq!(bus.read(10), Ok(1));
}

#[test]
fn bus_add_does_not_mutate_input() {
    let empty = AddressBus::empty();
    let bus = empty.add(device(0, 3, vec![0; 4])).unwrap();
    assert!(empty.is_empty());
    assert_eq!(bus.len(), 1);
}

#[test]
fn bus_remove_is_idempotent() {
    let hw = device(0, 3, vec![0; 4]);
    let bus = AddressBus::empty().add(hw.clone()).unwrap();
    let once = bus.remove(&hw);
    let twice = once.remove(&hw);
    assert!(once.is_empty());
    assert!(twice.is_empty());
    assert_eq!(bus.len(), 1);
}

#[test]
fn bus_remove_unknown_range_is_noop() {
    let bus = AddressBus::empty()
        .add(device(0, 3, vec![0; 4]))
        .unwrap();
    let removed = bus.remove(&device(0, 1, vec![0; 2]));
    assert_eq!(removed.ranges().collect::<Vec<_>>(), vec![addr_range(0, 3)]);
}

#[test]
fn bus_remove_ignores_backing_bytes() {
    let bus = AddressBus::empty()
        .add(device(0, 1, vec![0xAA, 0xBB]))
        .unwrap();
    let removed = bus.remove(&device(0, 1, vec![0x00, 0x00]));
    assert!(removed.is_empty());
}

#[test]
fn bus_add_after_remove() {
    let first = device(0, 10, vec![0; 11]);
    let second = device(5, 15, vec![0; 11]);
    let bus = AddressBus::empty().add(first.clone()).unwrap();
    assert!(bus.add(second.clone()).is_err());
    let bus = bus.remove(&first).add(second).unwrap();
    assert_eq!(bus.ranges().collect::<Vec<_>>(), vec![addr_range(5, 15)]);
}

#[test]
fn bus_write_then_read() {
    let bus = AddressBus::empty()
        .add(device(100, 103, vec![0xAA, 0xBB, 0xCC, 0xDD]))
        .unwrap();
    let written = bus.write(101, 0xFF).unwrap();
    assert_eq!(written.read(101), Ok(0xFF));
    assert_eq!(
        written.read_bytes(100, 4),
        Ok(vec![0xAA, 0xFF, 0xCC, 0xDD])
    );
    assert_eq!(bus.read(101), Ok(0xBB));
}

#[test]
fn bus_write_unmapped() {
    let bus = AddressBus::empty()
        .add(device(0, 3, vec![0; 4]))
        .unwrap();
    assert_eq!(bus.write(4, 0x01).unwrap_err(), BusError::WriteError(4));
}

#[test]
fn bus_write_shares_untouched_regions() {
    let bus = AddressBus::empty()
        .add(device(0, 3, vec![0; 4]))
        .unwrap()
        .add(device(4, 7, vec![0; 4]))
        .unwrap();
    let written = bus.write(0, 0x01).unwrap();
    assert!(Rc::ptr_eq(
        &bus.regions[&addr_range(4, 7)],
        &written.regions[&addr_range(4, 7)]
    ));
    assert!(!Rc::ptr_eq(
        &bus.regions[&addr_range(0, 3)],
        &written.regions[&addr_range(0, 3)]
    ));
}

#[test]
fn bus_read_bytes_all_or_nothing() {
    let bus = AddressBus::empty()
        .add(device(0, 3, vec![0x01, 0x02, 0x03, 0x04]))
        .unwrap();
    assert_eq!(bus.read_bytes(0, 4), Ok(vec![0x01, 0x02, 0x03, 0x04]));
    assert_eq!(bus.read_bytes(2, 4), Err(BusError::UndefinedAddress(4)));
    assert_eq!(bus.read_bytes(2, 0), Ok(vec![]));
}

#[test]
fn bus_read_bytes_across_adjacent_regions() {
    let bus = AddressBus::empty()
        .add(device(0, 1, vec![0x01, 0x02]))
        .unwrap()
        .add(device(2, 3, vec![0x03, 0x04]))
        .unwrap();
    assert_eq!(bus.read_bytes(1, 2), Ok(vec![0x02, 0x03]));
}

#[test]
fn bus_read_bytes_past_end_of_address_space() {
    let bus = AddressBus::empty()
        .add(Hardware::at(0xFFFE, vec![0x01, 0x02]).unwrap())
        .unwrap();
    assert_eq!(bus.read_bytes(0xFFFE, 2), Ok(vec![0x01, 0x02]));
    assert_eq!(
        bus.read_bytes(0xFFFF, 2),
        Err(BusError::AddressOverflow {
            address: 0xFFFF,
            count: 2,
        })
    );
}

#[test]
fn bus_read_range() {
    let bus = AddressBus::empty()
        .add(device(0, 3, vec![0x01, 0x02, 0x03, 0x04]))
        .unwrap();
    assert_eq!(bus.read_range(addr_range(1, 2)), Ok(vec![0x02, 0x03]));
    assert_eq!(
        bus.read_range(addr_range(3, 4)),
        Err(BusError::UndefinedAddress(4))
    );
}

#[test]
fn bus_write_bytes() {
    let bus = AddressBus::empty()
        .add(device(0, 3, vec![0; 4]))
        .unwrap();
    let written = bus.write_bytes(1, &[0x01, 0x02, 0x03]).unwrap();
    assert_eq!(written.read_bytes(0, 4), Ok(vec![0x00, 0x01, 0x02, 0x03]));
}

#[test]
fn bus_write_bytes_is_atomic() {
    let bus = AddressBus::empty()
        .add(device(0, 3, vec![0; 4]))
        .unwrap();
    assert_eq!(
        bus.write_bytes(2, &[0x01, 0x02, 0x03]).unwrap_err(),
        BusError::WriteError(4)
    );
    assert_eq!(bus.read_bytes(0, 4), Ok(vec![0, 0, 0, 0]));
}

#[test]
fn bus_write_bytes_empty_is_noop() {
    let bus = AddressBus::empty()
        .add(device(0, 1, vec![0xAA, 0xBB]))
        .unwrap();
    let written = bus.write_bytes(0x8000, &[]).unwrap();
    assert_eq!(written.read_bytes(0, 2), Ok(vec![0xAA, 0xBB]));
}

#[test]
fn bus_read_falls_back_to_first_enclosing_region() {
    let mut regions = BTreeMap::new();
    regions.insert(addr_range(0, 10), Rc::new((0..11).collect::<Vec<Byte>>()));
    regions.insert(addr_range(2, 3), Rc::new(vec![0xEE, 0xEE]));
    let bus = AddressBus { regions };
    assert_eq!(bus.read(5), Ok(5));
    assert_eq!(bus.read(10), Ok(10));
    assert_eq!(bus.read(11), Err(BusError::UndefinedAddress(11)));
    let written = bus.write(7, 0xFF).unwrap();
    assert_eq!(written.read(7), Ok(0xFF));
}

#[test]
fn bus_contains() {
    let bus = AddressBus::empty()
        .add(device(0x10, 0x1F, vec![0; 16]))
        .unwrap();
    assert!(bus.contains(0x10));
    assert!(bus.contains(0x1F));
    assert!(!bus.contains(0x20));
}
