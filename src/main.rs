extern crate addrbus;
extern crate env_logger;
#[macro_use]
extern crate log;

use std::env;
use std::process;

use addrbus::{elf, AddressBus, Hardware};

fn build_bus(hardware: Vec<Hardware>) -> AddressBus {
    hardware
        .into_iter()
        .fold(AddressBus::empty(), |bus, hw| match bus.add(hw) {
            Ok(next) => next,
            Err(e) => {
                warn!("{}", e);
                bus
            }
        })
}

fn dump_bus(bus: &AddressBus) {
    for range in bus.ranges() {
        println!("{}: {:#x} bytes", range, range.len());
    }
}

fn main() {
    env_logger::init();
    match env::args().nth(1) {
        None => println!("Specify an ELF image to map."),
        Some(arg) => match elf::load(&arg) {
            Ok(hardware) => dump_bus(&build_bus(hardware)),
            Err(e) => {
                error!("failed to load {}: {}", arg, e);
                process::exit(1);
            }
        },
    }
}
