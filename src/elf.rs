use std::fs::File;
use std::io::Read;
use std::path::Path;

use goblin::elf::section_header::{SHF_ALLOC, SHT_PROGBITS};
use goblin::error::{Error, Result};
use goblin::{elf, Object};

use bus::hardware::Hardware;
use types::Address;

pub fn load<P: AsRef<Path>>(path: P) -> Result<Vec<Hardware>> {
    let mut fd = File::open(path)?;
    let mut buffer = Vec::new();
    fd.read_to_end(&mut buffer)?;
    hardware_from_image(&buffer)
}

/// Turns every allocated `PROGBITS` section of an ELF image into hardware.
pub fn hardware_from_image(buffer: &[u8]) -> Result<Vec<Hardware>> {
    match Object::parse(buffer)? {
        Object::Elf(elf) => Ok(hardware_from_elf(&elf, buffer)),
        _ => Err(Error::Malformed("not an ELF image".to_owned())),
    }
}

fn hardware_from_elf(elf_obj: &elf::Elf, buffer: &[u8]) -> Vec<Hardware> {
    let shdr_strtab = &elf_obj.shdr_strtab;
    let mut hardware = Vec::new();
    for section in &elf_obj.section_headers {
        if section.sh_type != SHT_PROGBITS
            || section.sh_flags & u64::from(SHF_ALLOC) == 0
            || section.sh_size == 0
        {
            continue;
        }
        let name = shdr_strtab.get_at(section.sh_name).unwrap_or("<unnamed>");
        let start = section.sh_offset as usize;
        let data = start
            .checked_add(section.sh_size as usize)
            .and_then(|end| buffer.get(start..end));
        let data = match data {
            Some(data) => data,
            None => {
                warn!("section {} lies outside the image, skipped", name);
                continue;
            }
        };
        match section_to_hardware(section.sh_addr, data) {
            Some(hw) => {
                debug!("section {} mapped at {}", name, hw.range());
                hardware.push(hw);
            }
            None => warn!(
                "section {} at {:#x} does not fit in the address space, skipped",
                name, section.sh_addr
            ),
        }
    }
    hardware
}

fn section_to_hardware(addr: u64, data: &[u8]) -> Option<Hardware> {
    if addr > u64::from(Address::max_value()) {
        return None;
    }
    Hardware::at(addr as Address, data.to_vec()).ok()
}

#[test]
fn elf_section_to_hardware() {
    let hw = section_to_hardware(0x0100, &[0x01, 0x02, 0x03]).unwrap();
    assert_eq!(hw.range().low(), 0x0100);
    assert_eq!(hw.range().high(), 0x0102);
    assert_eq!(hw.bytes(), &[0x01, 0x02, 0x03]);
}

#[test]
fn elf_section_outside_address_space() {
    assert!(section_to_hardware(0x1_0000, &[0x01]).is_none());
    assert!(section_to_hardware(0xFFFF, &[0x01, 0x02]).is_none());
}

#[test]
fn elf_rejects_non_elf_image() {
    assert!(hardware_from_image(&[0x00; 64]).is_err());
}

#[cfg(test)]
use byteorder::{LittleEndian, WriteBytesExt};

// name, type, flags, addr, contents (`None` for NOBITS)
#[cfg(test)]
type TestSection<'a> = (&'a str, u32, u32, u32, Option<&'a [u8]>);

/// Builds a little-endian ELF32 executable with the given sections and no program headers.
#[cfg(test)]
fn elf32_image(sections: &[TestSection]) -> Vec<u8> {
    use goblin::elf::section_header::{SHT_NOBITS, SHT_STRTAB};

    const EHDR_SIZE: u32 = 52;
    const SHDR_SIZE: u16 = 40;

    let mut shstrtab = vec![0u8];
    let mut names = Vec::new();
    for name in sections.iter().map(|s| s.0).chain(Some(".shstrtab")) {
        names.push(shstrtab.len() as u32);
        shstrtab.extend_from_slice(name.as_bytes());
        shstrtab.push(0);
    }

    let mut body = Vec::new();
    let mut offsets = Vec::new();
    for &(_, _, _, _, data) in sections {
        offsets.push(EHDR_SIZE + body.len() as u32);
        if let Some(data) = data {
            body.extend_from_slice(data);
        }
    }
    let shstrtab_offset = EHDR_SIZE + body.len() as u32;
    body.extend_from_slice(&shstrtab);
    while body.len() % 4 != 0 {
        body.push(0);
    }
    let shoff = EHDR_SIZE + body.len() as u32;
    let shnum = sections.len() as u16 + 2;

    let mut image = vec![0x7F, b'E', b'L', b'F', 1, 1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0];
    image.write_u16::<LittleEndian>(2).unwrap(); // ET_EXEC
    image.write_u16::<LittleEndian>(0x28).unwrap(); // EM_ARM
    image.write_u32::<LittleEndian>(1).unwrap();
    image.write_u32::<LittleEndian>(0).unwrap(); // e_entry
    image.write_u32::<LittleEndian>(0).unwrap(); // e_phoff
    image.write_u32::<LittleEndian>(shoff).unwrap();
    image.write_u32::<LittleEndian>(0).unwrap(); // e_flags
    image.write_u16::<LittleEndian>(EHDR_SIZE as u16).unwrap();
    image.write_u16::<LittleEndian>(32).unwrap(); // e_phentsize
    image.write_u16::<LittleEndian>(0).unwrap(); // e_phnum
    image.write_u16::<LittleEndian>(SHDR_SIZE).unwrap();
    image.write_u16::<LittleEndian>(shnum).unwrap();
    image.write_u16::<LittleEndian>(shnum - 1).unwrap(); // e_shstrndx
    image.extend_from_slice(&body);

    let mut write_shdr = |name: u32, sh_type: u32, flags: u32, addr: u32, offset: u32, size: u32| {
        for field in &[name, sh_type, flags, addr, offset, size, 0, 0, 1, 0] {
            image.write_u32::<LittleEndian>(*field).unwrap();
        }
    };
    write_shdr(0, 0, 0, 0, 0, 0);
    for (i, &(_, sh_type, flags, addr, data)) in sections.iter().enumerate() {
        let size = match data {
            Some(data) => data.len() as u32,
            None if sh_type == SHT_NOBITS => 0x10,
            None => 0,
        };
        write_shdr(names[i], sh_type, flags, addr, offsets[i], size);
    }
    write_shdr(
        names[sections.len()],
        SHT_STRTAB,
        0,
        0,
        shstrtab_offset,
        shstrtab.len() as u32,
    );
    image
}

#[test]
fn elf_hardware_from_image_keeps_allocated_progbits() {
    use goblin::elf::section_header::{SHF_EXECINSTR, SHF_WRITE, SHT_NOBITS};

    let image = elf32_image(&[
        (".text", SHT_PROGBITS, SHF_ALLOC | SHF_EXECINSTR, 0x0100, Some(&[1u8, 2, 3, 4][..])),
        (".bss", SHT_NOBITS, SHF_ALLOC | SHF_WRITE, 0x0300, None),
        (".comment", SHT_PROGBITS, 0, 0x0000, Some(&[9u8, 9][..])),
        (".high", SHT_PROGBITS, SHF_ALLOC, 0x1_0000, Some(&[7u8, 7][..])),
        (".empty", SHT_PROGBITS, SHF_ALLOC, 0x0400, Some(&[0u8; 0][..])),
    ]);
    let hardware = hardware_from_image(&image).unwrap();
    assert_eq!(hardware.len(), 1);
    assert_eq!(hardware[0].range().low(), 0x0100);
    assert_eq!(hardware[0].range().high(), 0x0103);
    assert_eq!(hardware[0].bytes(), &[1, 2, 3, 4]);
}

#[test]
fn elf_hardware_from_image_keeps_every_allocated_section() {
    let image = elf32_image(&[
        (".text", SHT_PROGBITS, SHF_ALLOC, 0x0100, Some(&[1u8, 2, 3, 4][..])),
        (".data", SHT_PROGBITS, SHF_ALLOC, 0x0200, Some(&[9u8, 8][..])),
    ]);
    let hardware = hardware_from_image(&image).unwrap();
    let ranges = hardware
        .iter()
        .map(|hw| (hw.range().low(), hw.range().high()))
        .collect::<Vec<_>>();
    assert_eq!(ranges, vec![(0x0100, 0x0103), (0x0200, 0x0201)]);
    assert_eq!(hardware[1].bytes(), &[9, 8]);
}
