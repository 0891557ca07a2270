use std::fs::{self, File};
use std::io::{BufWriter, Write};

use mrvl_fwtools::elf::{ElfWriter, SectionRecord};
use mrvl_fwtools::firmware::{HEADER_SIZE, SEGMENT_HEADER_SIZE};
use mrvl_fwtools::{
    CapacityError, ElfImage, Error, Firmware, FirmwareBuilder, FormatError, LoadableSegment,
    PreconditionError, Profile, Report, SectionReconstructor,
};
use object::elf::{
    EM_ARM, PF_R, PF_W, PF_X, SHF_ALLOC, SHF_EXECINSTR, SHT_PROGBITS, SHT_STRTAB,
};
use object::{Object, ObjectSection};
use tempfile::{tempdir, NamedTempFile};

fn elf_with(blocks: &[(u32, Vec<u8>)]) -> Vec<u8> {
    let mut writer = ElfWriter::new(EM_ARM, 0);
    for (addr, data) in blocks {
        let index = writer.add_section(SectionRecord {
            name_offset: 0,
            sh_type: SHT_PROGBITS,
            flags: SHF_ALLOC | SHF_EXECINSTR,
            addr: *addr,
            align: 4,
            data: data.clone(),
        });
        writer.add_load_segment(index, PF_R | PF_W | PF_X);
    }
    let names = writer.add_section(SectionRecord {
        name_offset: 1,
        sh_type: SHT_STRTAB,
        flags: 0,
        addr: 0,
        align: 1,
        data: b"\0.shstrtab\0".to_vec(),
    });
    writer.set_shstrndx(names);
    writer.finish().unwrap()
}

fn write_firmware(builder: &FirmwareBuilder<'_>, file: &File) {
    let mut out = BufWriter::new(file);
    builder.write(&mut out).unwrap();
    out.flush().unwrap();
}

#[test]
fn two_segment_example_end_to_end() {
    let tmp = NamedTempFile::new().unwrap();
    let mut builder = FirmwareBuilder::new(1).with_ctime(1_500_000_000);
    builder.push(LoadableSegment::new(0x1F00_0000, &[0xA0, 0xA1, 0xA2, 0xA3]));
    builder.push(LoadableSegment::new(0x1F00_0100, &[0xB0, 0xB1, 0xB2, 0xB3, 0xB4, 0xB5]));
    write_firmware(&builder, tmp.as_file());

    assert_eq!(fs::metadata(tmp.path()).unwrap().len(), 72);

    let firmware = Firmware::open(tmp.path()).unwrap();
    assert_eq!(firmware.header().segment_count, 2);
    assert_eq!(firmware.header().elf_version, 1);
    assert!(Report::from_firmware(&firmware).is_intact());

    let headers = firmware.segment_headers();
    assert_eq!(headers[0].offset as usize, HEADER_SIZE + 2 * SEGMENT_HEADER_SIZE);
    assert_eq!(headers[0].size, 4);
    assert_eq!(headers[1].offset, headers[0].offset + headers[0].size);
    assert_eq!(headers[1].size, 8);

    let profile = Profile::builtin().unwrap();
    let elf = SectionReconstructor::new(&profile)
        .reconstruct(&firmware)
        .unwrap();
    let file = object::File::parse(&*elf).unwrap();
    assert_eq!(file.entry(), 0x1F00_0101);
    assert_eq!(
        file.section_by_name(".text").unwrap().data().unwrap(),
        &[0xB0, 0xB1, 0xB2, 0xB3, 0xB4, 0xB5, 0xFF, 0xFF]
    );
}

#[test]
fn elf_to_firmware_and_back() {
    let dir = tempdir().unwrap();
    let original = elf_with(&[
        (0x1F00_0000, vec![0x11; 5]),
        (0x1F00_0100, vec![0x22; 16]),
        (0x2000_0000, vec![0x33; 7]),
    ]);

    let elf = ElfImage::parse(&original).unwrap();
    let builder = FirmwareBuilder::try_from(&elf).unwrap().with_ctime(42);
    let firmware_path = dir.path().join("app.bin");
    write_firmware(&builder, &File::create(&firmware_path).unwrap());
    let first = fs::read(&firmware_path).unwrap();

    let firmware = Firmware::open(&firmware_path).unwrap();
    let profile = Profile::builtin().unwrap();
    let rebuilt = SectionReconstructor::new(&profile)
        .reconstruct(&firmware)
        .unwrap();
    let elf_path = dir.path().join("app.axf");
    fs::write(&elf_path, &rebuilt).unwrap();

    let rebuilt = fs::read(&elf_path).unwrap();
    let elf = ElfImage::parse(&rebuilt).unwrap();
    let second = FirmwareBuilder::try_from(&elf)
        .unwrap()
        .with_ctime(42)
        .to_bytes()
        .unwrap();

    assert_eq!(first, second);
}

#[test]
fn segment_capacity_is_enforced_from_elf() {
    let nine: Vec<_> = (0..9).map(|i| (0x1000 * i, vec![i as u8; 4])).collect();
    let bytes = elf_with(&nine);
    let elf = ElfImage::parse(&bytes).unwrap();
    assert_eq!(FirmwareBuilder::try_from(&elf).unwrap().segment_count(), 9);

    let ten: Vec<_> = (0..10).map(|i| (0x1000 * i, vec![i as u8; 4])).collect();
    let bytes = elf_with(&ten);
    let elf = ElfImage::parse(&bytes).unwrap();
    assert!(matches!(
        FirmwareBuilder::try_from(&elf),
        Err(Error::Capacity(CapacityError::TooManySegments(10)))
    ));

    let bytes = elf_with(&[(0x1000, Vec::new())]);
    let elf = ElfImage::parse(&bytes).unwrap();
    assert!(matches!(
        FirmwareBuilder::try_from(&elf),
        Err(Error::Capacity(CapacityError::NoSegments))
    ));
}

#[test]
fn firmware_is_not_an_elf_and_vice_versa() {
    let mut builder = FirmwareBuilder::new(1).with_ctime(0);
    builder.push(LoadableSegment::new(0, &[1, 2, 3, 4]));
    let firmware = builder.to_bytes().unwrap();
    assert!(matches!(
        ElfImage::parse(&firmware),
        Err(Error::Precondition(PreconditionError::NotElf))
    ));

    let tmp = NamedTempFile::new().unwrap();
    fs::write(tmp.path(), elf_with(&[(0, vec![1; 4])])).unwrap();
    assert!(matches!(
        Firmware::open(tmp.path()),
        Err(Error::Format(FormatError::BadMagic(tag))) if tag == *b"\x7fELF"
    ));
}

#[test]
fn missing_input_names_the_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing.bin");
    let err = Firmware::open(&path).unwrap_err();
    assert!(matches!(err, Error::Io { .. }));
    assert!(err.to_string().contains("missing.bin"));
}
