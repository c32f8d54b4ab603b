use pvmx::archive::{list, pack, unpack, PackOptions, UnpackOptions};
use pvmx::index::{parse_index, IndexError};
use pvmx::io_stream::PvmxReader;
use pvmx::{PvmxError, TextureEntry};
use std::fs::{self, File};
use std::io::{BufReader, Cursor};
use std::path::Path;
use tempfile::tempdir;

const REFERENCE_INDEX: &str = "101,a.png\n102,b.png,64x64\n103,a.png\n";

fn write_pack(dir: &Path, index: &str, files: &[(&str, &[u8])]) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join("index.txt"), index).unwrap();
    for (name, data) in files {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, data).unwrap();
    }
}

fn read_index(path: &Path) -> Vec<TextureEntry> {
    parse_index(BufReader::new(File::open(path).unwrap())).unwrap()
}

#[test]
fn test_reference_example_roundtrip() {
    let tmp = tempdir().unwrap();
    let pack_dir = tmp.path().join("mypack");
    write_pack(&pack_dir, REFERENCE_INDEX, &[("a.png", b"png-a"), ("b.png", b"png-b-bytes")]);

    let archive = tmp.path().join("out.pvmx");
    let summary = pack(&pack_dir, Some(&archive), &PackOptions::default()).unwrap();
    assert_eq!(summary.entries, 3);
    assert_eq!(summary.payloads, 2);
    assert_eq!(summary.data_bytes, 5 + 11);

    let records = list(&archive).unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].payload, records[2].payload);
    assert_ne!(records[0].payload, records[1].payload);

    let out = tmp.path().join("restored");
    let unpacked = unpack(&archive, Some(&out), &UnpackOptions::default()).unwrap();
    assert_eq!(unpacked.records, 3);
    assert_eq!(unpacked.files_written, 2);

    assert_eq!(fs::read_to_string(out.join("index.txt")).unwrap(), REFERENCE_INDEX);
    assert_eq!(fs::read(out.join("a.png")).unwrap(), b"png-a");
    assert_eq!(fs::read(out.join("b.png")).unwrap(), b"png-b-bytes");
}

#[test]
fn test_index_is_parse_equivalent_after_roundtrip() {
    let index = "# HD texture pack\n\n0,zero.dds\n7,sub/seven.png,128X32\n\n#trailing comment\n8,sub/seven.png\n";
    let tmp = tempdir().unwrap();
    let pack_dir = tmp.path().join("pack");
    write_pack(&pack_dir, index, &[("zero.dds", b""), ("sub/seven.png", &[7u8; 9000])]);

    let archive = tmp.path().join("pack.pvmx");
    pack(&pack_dir.join("index.txt"), Some(&archive), &PackOptions { chunk_size: 100 }).unwrap();

    let out = tmp.path().join("out");
    unpack(&archive, Some(&out), &UnpackOptions { chunk_size: 33 }).unwrap();

    assert_eq!(read_index(&out.join("index.txt")), read_index(&pack_dir.join("index.txt")));
    assert_eq!(fs::read(out.join("zero.dds")).unwrap(), b"");
    assert_eq!(fs::read(out.join("sub/seven.png")).unwrap(), vec![7u8; 9000]);
}

#[test]
fn test_duplicate_names_store_one_copy() {
    let tmp = tempdir().unwrap();
    let pack_dir = tmp.path().join("dup");
    let payload = b"0123456789abcdef0123456789abcdef";
    write_pack(&pack_dir, "1,same.png\n2,same.png\n3,same.png\n", &[("same.png", payload)]);

    let archive = tmp.path().join("dup.pvmx");
    pack(&pack_dir, Some(&archive), &PackOptions::default()).unwrap();

    let bytes = fs::read(&archive).unwrap();
    let occurrences = bytes.windows(payload.len()).filter(|w| w == payload).count();
    assert_eq!(occurrences, 1);

    let reader = PvmxReader::new(Cursor::new(bytes.clone())).unwrap();
    let first = reader.records[0].payload;
    assert!(reader.records.iter().all(|r| r.payload == first));
    assert_eq!(first.offset, reader.data_offset);
    assert_eq!(first.end(), bytes.len() as u64);
}

#[test]
fn test_default_output_locations() {
    let tmp = tempdir().unwrap();
    let pack_dir = tmp.path().join("hd_pack");
    write_pack(&pack_dir, "5,t.png\n", &[("t.png", b"t")]);

    let summary = pack(&pack_dir, None, &PackOptions::default()).unwrap();
    assert_eq!(
        fs::canonicalize(&summary.archive).unwrap(),
        fs::canonicalize(tmp.path()).unwrap().join("hd_pack.pvmx")
    );

    // Move the source out of the way; extraction recreates hd_pack/.
    fs::rename(&pack_dir, tmp.path().join("original")).unwrap();
    let unpacked = unpack(&summary.archive, None, &UnpackOptions::default()).unwrap();
    assert_eq!(
        fs::canonicalize(&unpacked.output_dir).unwrap(),
        fs::canonicalize(tmp.path()).unwrap().join("hd_pack")
    );
    assert_eq!(fs::read(unpacked.output_dir.join("t.png")).unwrap(), b"t");
    assert_eq!(fs::read_to_string(unpacked.index_path).unwrap(), "5,t.png\n");
}

#[test]
fn test_leading_comma_produces_no_archive() {
    let tmp = tempdir().unwrap();
    let pack_dir = tmp.path().join("bad");
    write_pack(&pack_dir, "1,ok.png\n,foo.png\n", &[("ok.png", b"ok"), ("foo.png", b"foo")]);

    let archive = tmp.path().join("bad.pvmx");
    let err = pack(&pack_dir, Some(&archive), &PackOptions::default()).unwrap_err();
    assert!(err.to_string().contains("line 2"), "{err}");
    assert!(matches!(err, PvmxError::Index(_)));
    assert!(!archive.exists());
}

#[test]
fn test_invalid_utf8_index_reports_its_line() {
    let tmp = tempdir().unwrap();
    let pack_dir = tmp.path().join("utf8");
    fs::create_dir_all(&pack_dir).unwrap();
    fs::write(pack_dir.join("index.txt"), b"1,a.png\n2,\xff.png\n").unwrap();
    fs::write(pack_dir.join("a.png"), b"a").unwrap();

    let archive = tmp.path().join("utf8.pvmx");
    let err = pack(&pack_dir, Some(&archive), &PackOptions::default()).unwrap_err();
    assert!(matches!(err, PvmxError::Index(IndexError::InvalidUtf8 { line: 2 })), "{err}");
    assert!(err.to_string().contains("line 2"), "{err}");
    assert!(!archive.exists());
}

#[test]
fn test_hand_edited_whitespace_in_numbers_is_accepted() {
    let tmp = tempdir().unwrap();
    let pack_dir = tmp.path().join("ws");
    write_pack(&pack_dir, "1,a.png,64x64 \r\n 2 ,b.png\n", &[("a.png", b"a"), ("b.png", b"b")]);

    let archive = tmp.path().join("ws.pvmx");
    pack(&pack_dir, Some(&archive), &PackOptions::default()).unwrap();

    let records = list(&archive).unwrap();
    assert_eq!(records[0].entry, TextureEntry::new(1, "a.png").with_dimensions(64, 64));
    assert_eq!(records[1].entry, TextureEntry::new(2, "b.png"));
}

#[test]
fn test_missing_index_is_not_found() {
    let tmp = tempdir().unwrap();
    let err = pack(tmp.path(), None, &PackOptions::default()).unwrap_err();
    assert!(matches!(err, PvmxError::NotFound(ref p) if p.ends_with("index.txt")));
}

#[test]
fn test_missing_texture_names_its_path() {
    let tmp = tempdir().unwrap();
    let pack_dir = tmp.path().join("p");
    write_pack(&pack_dir, "1,present.png\n2,absent.png\n", &[("present.png", b"x")]);

    let err = pack(&pack_dir, Some(&tmp.path().join("p.pvmx")), &PackOptions::default()).unwrap_err();
    match err {
        PvmxError::Path { path, .. } => assert!(path.ends_with("absent.png")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_bad_magic_writes_nothing() {
    let tmp = tempdir().unwrap();
    let archive = tmp.path().join("fake.pvmx");
    fs::write(&archive, b"NOPE\x01\x00").unwrap();

    let out = tmp.path().join("out");
    let err = unpack(&archive, Some(&out), &UnpackOptions::default()).unwrap_err();
    assert!(matches!(err, PvmxError::Header(_)));
    assert!(!out.exists());
}

#[test]
fn test_bad_version_writes_nothing() {
    let tmp = tempdir().unwrap();
    let archive = tmp.path().join("future.pvmx");
    fs::write(&archive, b"PVMX\x02\x00").unwrap();

    let out = tmp.path().join("out");
    let err = unpack(&archive, Some(&out), &UnpackOptions::default()).unwrap_err();
    assert!(err.to_string().contains("version"), "{err}");
    assert!(!out.exists());
}

#[test]
fn test_unsafe_names_are_refused() {
    let mut w = pvmx::PvmxWriter::new(Cursor::new(Vec::new())).unwrap();
    w.add_entry(&TextureEntry::new(1, "../escape.png")).unwrap();
    w.add_payload("../escape.png", &b"evil"[..]).unwrap();
    let bytes = w.finalize().unwrap().into_inner();

    let tmp = tempdir().unwrap();
    let archive = tmp.path().join("evil.pvmx");
    fs::write(&archive, bytes).unwrap();

    let out = tmp.path().join("out");
    let err = unpack(&archive, Some(&out), &UnpackOptions::default()).unwrap_err();
    assert!(matches!(err, PvmxError::UnsafeName(_)));
    assert!(!tmp.path().join("escape.png").exists());
}

#[test]
fn test_truncated_archive_reports_archive_path() {
    let tmp = tempdir().unwrap();
    let pack_dir = tmp.path().join("t");
    write_pack(&pack_dir, "1,big.bin\n", &[("big.bin", &[1u8; 5000])]);
    let archive = tmp.path().join("t.pvmx");
    pack(&pack_dir, Some(&archive), &PackOptions::default()).unwrap();

    let mut bytes = fs::read(&archive).unwrap();
    bytes.truncate(bytes.len() - 100);
    fs::write(&archive, bytes).unwrap();

    let err = unpack(&archive, Some(&tmp.path().join("out")), &UnpackOptions::default()).unwrap_err();
    match err {
        PvmxError::Path { path, source } => {
            assert_eq!(path, archive);
            assert_eq!(source.kind(), std::io::ErrorKind::UnexpectedEof);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_empty_index_makes_empty_archive() {
    let tmp = tempdir().unwrap();
    let pack_dir = tmp.path().join("empty");
    write_pack(&pack_dir, "# nothing here\n", &[]);
    let archive = tmp.path().join("empty.pvmx");
    pack(&pack_dir, Some(&archive), &PackOptions::default()).unwrap();
    assert_eq!(fs::read(&archive).unwrap(), b"PVMX\x01\x00");

    let out = tmp.path().join("out");
    let summary = unpack(&archive, Some(&out), &UnpackOptions::default()).unwrap();
    assert_eq!(summary.records, 0);
    assert_eq!(fs::read_to_string(out.join("index.txt")).unwrap(), "");
}
