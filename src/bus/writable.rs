use super::MutRaw;
use byteorder::{ByteOrder, LittleEndian};
use error::BusError;
use types::{Address, HalfWord, Word};

pub trait HalfWordWritable: MutRaw {
    fn write_halfword(&self, addr: Address, data: HalfWord) -> Result<Self, BusError> {
        let mut buf = [0; 2];
        LittleEndian::write_u16(&mut buf, data);
        self.mut_raw(addr, &buf)
    }
}

pub trait WordWritable: MutRaw {
    fn write_word(&self, addr: Address, data: Word) -> Result<Self, BusError> {
        let mut buf = [0; 4];
        LittleEndian::write_u32(&mut buf, data);
        self.mut_raw(addr, &buf)
    }
}

#[cfg(test)]
use super::hardware::Hardware;
#[cfg(test)]
use super::readable::*;
#[cfg(test)]
use super::AddressBus;

#[test]
fn bus_write_halfword() {
    let bus = AddressBus::empty()
        .add(Hardware::at(0x0000, vec![0x00, 0x00, 0x00, 0x00]).unwrap())
        .unwrap();
    let bus = bus.write_halfword(0, 0x1234).unwrap();
    assert_eq!(bus.read_halfword(0), Ok(0x1234));
    assert_eq!(bus.read_bytes(0, 2), Ok(vec![0x34, 0x12]));
}

#[test]
fn bus_write_word() {
    let bus = AddressBus::empty()
        .add(Hardware::at(0x0000, vec![0x00, 0x00, 0x00, 0x00]).unwrap())
        .unwrap();
    let bus = bus.write_word(0, 0x1234_5678).unwrap();
    assert_eq!(bus.read_word(0), Ok(0x1234_5678));
}

#[test]
fn bus_write_word_spanning_unmapped_leaves_bus() {
    let bus = AddressBus::empty()
        .add(Hardware::at(0x0000, vec![0x00, 0x00, 0x00, 0x00]).unwrap())
        .unwrap();
    assert_eq!(
        bus.write_word(2, 0x1234_5678).unwrap_err(),
        BusError::WriteError(4)
    );
    assert_eq!(bus.read_word(0), Ok(0));
}
