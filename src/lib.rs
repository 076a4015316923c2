extern crate byteorder;
extern crate goblin;
#[macro_use]
extern crate log;

pub mod bus;
pub mod elf;
pub mod error;
pub mod types;

pub use bus::hardware::Hardware;
pub use bus::range::AddressRange;
pub use bus::readable::{HalfWordReadable, WordReadable};
pub use bus::writable::{HalfWordWritable, WordWritable};
pub use bus::AddressBus;
pub use error::BusError;
