// SPDX-License-Identifier: MIT

mod common;

use common::*;
use fatvol::fat::*;

#[test]
fn test_mount_floppy_geometry() {
    let mut img = FatImage::fat12();
    let mut io = MemBlockIO::new(img.as_mut_slice());
    let fs = FatFilesystem::mount(&mut io, FatFormat::FAT12).unwrap();

    let geo = fs.geometry();
    assert_eq!(geo.fat_start, 1);
    assert_eq!(geo.root_dir_start, 19);
    assert_eq!(geo.root_dir_sectors, 14);
    assert_eq!(geo.data_start, 33);
    assert_eq!(fs.boot_sector().root_entries, 224);
    assert_eq!(fs.format().kind, FatKind::Fat12);
    assert!(fs.meta().table.is_cached());
}

#[test]
fn test_list_root_table() {
    let mut img = FatImage::fat12();
    img.add_file(b"TEST    TXT", b"hello");
    img.add_dir(b"DOCS       ");
    img.add_file(b"README     ", &pattern(1300));

    let mut io = MemBlockIO::new(img.as_mut_slice());
    let mut fs = FatFilesystem::mount(&mut io, FatFormat::FAT12).unwrap();

    let mut out = String::new();
    fs.list_root(&mut out).unwrap();
    let expected = "\
Root directory:
Name               Size
------------------------
TEST.TXT              5
DOCS              <DIR>
README             1300
";
    assert_eq!(out, expected);
}

#[test]
fn test_end_marker_stops_enumeration() {
    let mut img = FatImage::fat12();
    img.add_file(b"ONE     TXT", b"1");
    img.add_file(b"TWO     TXT", b"22");
    // Zeroed slot, then a stale entry that must never be reached
    img.push_raw([0u8; 32]);
    img.add_file(b"GHOST   TXT", b"boo");

    let mut io = MemBlockIO::new(img.as_mut_slice());
    let mut fs = FatFilesystem::mount(&mut io, FatFormat::FAT12).unwrap();

    let names: Vec<String> = fs
        .root_entries()
        .unwrap()
        .iter()
        .map(|f| f.name.to_string())
        .collect();
    assert_eq!(names, ["ONE.TXT", "TWO.TXT"]);
    assert!(fs.open("GHOST.TXT").unwrap_err().is_not_found());
}

#[test]
fn test_deleted_entry_is_skipped() {
    let mut img = FatImage::fat12();
    img.add_file(b"TEST    TXT", b"old contents");
    img.patch_slot(0, |e| e[0] = 0xE5);
    img.add_file(b"TEST    TXT", b"new");

    let mut io = MemBlockIO::new(img.as_mut_slice());
    let mut fs = FatFilesystem::mount(&mut io, FatFormat::FAT12).unwrap();

    let file = fs.open("TEST.TXT").unwrap();
    assert_eq!(file.size, 3);
    let mut buf = [0u8; 16];
    let n = fs.read(&file, &mut buf).unwrap();
    assert_eq!(&buf[..n], b"new");
    assert_eq!(fs.root_entries().unwrap().len(), 1);
}

#[test]
fn test_labels_and_long_names_are_hidden() {
    let mut img = FatImage::fat12();
    img.add_entry(b"FLOPPY     ", 0x08, 0, 0);
    img.add_entry(b"At\0e\0s\0t\0\0\0", 0x0F, 0, 0);
    img.add_file(b"TEST    TXT", b"x");

    let mut io = MemBlockIO::new(img.as_mut_slice());
    let mut fs = FatFilesystem::mount(&mut io, FatFormat::FAT12).unwrap();

    let entries = fs.root_entries().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(&*entries[0].name, "TEST.TXT");
    assert!(fs.open("FLOPPY").unwrap_err().is_not_found());
}

#[test]
fn test_open_uppercases_request() {
    let mut img = FatImage::fat12();
    let first = img.add_file(b"KERNEL  BIN", &pattern(700));

    let mut io = MemBlockIO::new(img.as_mut_slice());
    let mut fs = FatFilesystem::mount(&mut io, FatFormat::FAT12).unwrap();

    let file = fs.open("kernel.bin").unwrap();
    assert_eq!(&*file.name, "KERNEL.BIN");
    assert_eq!(file.size, 700);
    assert_eq!(file.first_cluster, first);
    assert!(!file.is_dir);
}

#[test]
fn test_read_single_cluster_and_clamp() {
    let data = pattern(300);
    let mut img = FatImage::fat12();
    img.add_file(b"TEST    TXT", &data);

    let mut io = MemBlockIO::new(img.as_mut_slice());
    let mut fs = FatFilesystem::mount(&mut io, FatFormat::FAT12).unwrap();
    let file = fs.open("TEST.TXT").unwrap();

    let mut exact = vec![0u8; 300];
    assert_eq!(fs.read(&file, &mut exact).unwrap(), 300);
    assert_eq!(exact, data);

    let mut large = vec![0u8; 4096];
    assert_eq!(fs.read(&file, &mut large).unwrap(), 300);
    assert_eq!(&large[..300], &data[..]);

    let mut small = [0u8; 10];
    assert_eq!(fs.read(&file, &mut small).unwrap(), 10);
    assert_eq!(&small, &data[..10]);
}

#[test]
fn test_read_follows_packed_chain() {
    // Out-of-order clusters exercise both odd and even 12-bit slots
    let data = pattern(512 * 3 + 17);
    let mut img = FatImage::fat12();
    let clusters = img.reserve(6);
    let chain = [clusters[5], clusters[0], clusters[3], clusters[2]];
    img.link(&chain);
    img.fill(&chain, &data);
    img.add_entry(b"SCATTER DAT", 0x20, chain[0], data.len() as u32);

    let mut io = MemBlockIO::new(img.as_mut_slice());
    let mut fs = FatFilesystem::mount(&mut io, FatFormat::FAT12).unwrap();
    let file = fs.open("scatter.dat").unwrap();

    let mut buf = vec![0u8; data.len()];
    assert_eq!(fs.read(&file, &mut buf).unwrap(), data.len());
    assert_eq!(buf, data);

    let mut seen = Vec::new();
    fs.for_each_cluster(&file, |c| seen.push(c)).unwrap();
    assert_eq!(seen, chain);
}

#[test]
fn test_empty_file_reads_nothing() {
    let mut img = FatImage::fat12();
    img.add_file(b"EMPTY      ", b"");

    let mut io = MemBlockIO::new(img.as_mut_slice());
    let mut fs = FatFilesystem::mount(&mut io, FatFormat::FAT12).unwrap();
    let file = fs.open("EMPTY").unwrap();
    assert_eq!(file.first_cluster, 0);

    let mut buf = [0u8; 32];
    assert_eq!(fs.read(&file, &mut buf).unwrap(), 0);
}

#[test]
fn test_short_chain_returns_what_was_read() {
    let data = pattern(512);
    let mut img = FatImage::fat12();
    let first = img.add_file(b"TRUNC   BIN", &data);
    // Directory claims two clusters, chain only has one
    img.patch_slot(0, |e| e[28..32].copy_from_slice(&1024u32.to_le_bytes()));

    let mut io = MemBlockIO::new(img.as_mut_slice());
    let mut fs = FatFilesystem::mount(&mut io, FatFormat::FAT12).unwrap();
    let file = fs.open("TRUNC.BIN").unwrap();
    assert_eq!(file.first_cluster, first);

    let mut buf = vec![0u8; 1024];
    assert_eq!(fs.read(&file, &mut buf).unwrap(), 512);
    assert_eq!(&buf[..512], &data[..]);
}

#[test]
fn test_failure_mid_chain_is_an_error() {
    let data = pattern(512 * 3);
    let mut img = FatImage::fat12();
    let first = img.add_file(b"BIG     BIN", &data);
    let bad = img.cluster_lba(first + 1);

    let mut mem = MemBlockIO::new(img.as_mut_slice());
    let mut io = FaultyIO::new(&mut mem).fail_at(bad);
    let mut fs = FatFilesystem::mount(&mut io, FatFormat::FAT12).unwrap();
    let file = fs.open("BIG.BIN").unwrap();

    let mut buf = vec![0u8; data.len()];
    let err = fs.read(&file, &mut buf).unwrap_err();
    assert_eq!(err, FsError::IO(BlockIOError::Device("injected read failure")));
}

#[test]
fn test_bad_cluster_in_chain() {
    let mut img = FatImage::fat12();
    let first = img.add_file(b"BAD     BIN", &pattern(1024));
    // 0xFF7 marks a bad cluster: not end-of-chain, past the last data cluster
    img.set_fat(first, 0xFF7);

    let mut io = MemBlockIO::new(img.as_mut_slice());
    let mut fs = FatFilesystem::mount(&mut io, FatFormat::FAT12).unwrap();
    let file = fs.open("BAD.BIN").unwrap();

    let mut buf = vec![0u8; 1024];
    assert_eq!(
        fs.read(&file, &mut buf).unwrap_err(),
        FsError::Cursor(FsCursorError::InvalidCluster(0xFF7))
    );
}

#[test]
fn test_invalid_boot_sector() {
    let mut img = FatImage::fat12();
    img.bytes[13] = 0;

    let mut io = MemBlockIO::new(img.as_mut_slice());
    let err = FatFilesystem::mount(&mut io, FatFormat::FAT12).err().unwrap();
    assert_eq!(
        err,
        FsError::Parsing(FsParsingError::Invalid("Invalid boot sector"))
    );
}

#[test]
fn test_unreadable_boot_sector() {
    let mut img = FatImage::fat12();
    let mut mem = MemBlockIO::new(img.as_mut_slice());
    let mut io = FaultyIO::new(&mut mem).fail_at(0);

    let err = FatFilesystem::mount(&mut io, FatFormat::FAT12).err().unwrap();
    assert!(matches!(err, FsError::Parsing(FsParsingError::IO(_))));
    assert!(matches!(err.io_error(), Some(BlockIOError::Device(_))));
}

#[test]
fn test_oversized_fat_is_unsupported() {
    let mut img = FatImage::fat12();
    img.bytes[22..24].copy_from_slice(&13u16.to_le_bytes());

    let mut io = MemBlockIO::new(img.as_mut_slice());
    let err = FatFilesystem::mount(&mut io, FatFormat::FAT12).err().unwrap();
    assert!(matches!(err, FsError::Parsing(FsParsingError::Unsupported(_))));
}

#[test]
fn test_write_is_unsupported() {
    let mut img = FatImage::fat12();
    img.add_file(b"TEST    TXT", b"ro");

    let mut io = MemBlockIO::new(img.as_mut_slice());
    let mut fs = FatFilesystem::mount(&mut io, FatFormat::FAT12).unwrap();
    let file = fs.open("TEST.TXT").unwrap();
    assert_eq!(fs.write(&file, b"rw"), Err(FsError::Unsupported));
}

#[test]
fn test_mount_auto_detects_fat12() {
    let mut img = FatImage::fat12();
    img.add_file(b"TEST    TXT", b"auto");

    let mut io = MemBlockIO::new(img.as_mut_slice());
    let mut fs = FatFilesystem::mount_auto(&mut io).unwrap();
    assert_eq!(fs.format().kind, FatKind::Fat12);

    let file = fs.open("test.txt").unwrap();
    let mut buf = [0u8; 8];
    let n = fs.read(&file, &mut buf).unwrap();
    assert_eq!(&buf[..n], b"auto");
}
