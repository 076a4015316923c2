use super::Raw;
use byteorder::{ByteOrder, LittleEndian};
use error::BusError;
use types::{Address, HalfWord, Word};

pub trait HalfWordReadable: Raw {
    fn read_halfword(&self, addr: Address) -> Result<HalfWord, BusError> {
        Ok(LittleEndian::read_u16(&self.raw(addr, 2)?))
    }
}

pub trait WordReadable: Raw {
    fn read_word(&self, addr: Address) -> Result<Word, BusError> {
        Ok(LittleEndian::read_u32(&self.raw(addr, 4)?))
    }
}

#[cfg(test)]
use super::hardware::Hardware;
#[cfg(test)]
use super::AddressBus;

#[test]
fn bus_read_halfword() {
    let bus = AddressBus::empty()
        .add(Hardware::at(0x0000, vec![0x01, 0x02, 0x00, 0x00]).unwrap())
        .unwrap();
    assert_eq!(bus.read_halfword(0), Ok(0x0201));
}

#[test]
fn bus_read_word() {
    let bus = AddressBus::empty()
        .add(Hardware::at(0x0000, vec![0x01, 0x02, 0x03, 0x04]).unwrap())
        .unwrap();
    assert_eq!(bus.read_word(0), Ok(0x0403_0201));
}

#[test]
fn bus_read_word_spanning_unmapped() {
    let bus = AddressBus::empty()
        .add(Hardware::at(0x0000, vec![0x01, 0x02, 0x03, 0x04]).unwrap())
        .unwrap();
    assert_eq!(bus.read_word(2), Err(BusError::UndefinedAddress(4)));
}
