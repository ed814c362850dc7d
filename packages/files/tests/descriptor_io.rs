use std::fs;
use std::io::{self, Cursor, Read};

use formstore_core::Error;
use formstore_files::{FileInfo, FileMeta};

/// Yields a few bytes, then fails.
struct BrokenReader {
    sent: bool,
}

impl Read for BrokenReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.sent {
            return Err(io::Error::new(io::ErrorKind::ConnectionReset, "upload aborted"));
        }
        self.sent = true;
        buf[..4].copy_from_slice(b"part");
        Ok(4)
    }
}

#[test]
fn write_then_read_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let info = FileInfo::new(dir.path(), FileMeta::new("report.pdf", "application/pdf"));

    let content = b"%PDF-1.7 pretend content".to_vec();
    let written = info.write(&mut Cursor::new(content.clone())).unwrap();
    assert_eq!(written, content.len() as u64);
    assert_eq!(info.size(), content.len() as u64);

    let mut out = Vec::new();
    let read = info.read_into(&mut out).unwrap();
    assert_eq!(read, info.size());
    assert_eq!(out, content);
}

#[test]
fn overwrite_keeps_path_and_replaces_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let info = FileInfo::new(dir.path(), FileMeta::new("a.txt", "text/plain"));
    info.write(&mut Cursor::new(b"a much longer first upload".to_vec()))
        .unwrap();
    let path = info.path();

    info.update("b.txt", "text/markdown");
    info.write(&mut Cursor::new(b"short".to_vec())).unwrap();

    assert_eq!(info.path(), path);
    assert_eq!(info.name(), "b.txt");
    assert_eq!(info.size(), 5);
    assert_eq!(fs::read(&path).unwrap(), b"short");
}

#[test]
fn failed_overwrite_records_what_is_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let info = FileInfo::new(dir.path(), FileMeta::new("a.pdf", "application/pdf"));
    info.write(&mut Cursor::new(b"first version".to_vec())).unwrap();
    assert_eq!(info.size(), 13);

    info.update("b.pdf", "application/pdf");
    assert!(info.write(&mut BrokenReader { sent: false }).is_err());

    assert_eq!(info.size(), 4);
    assert_eq!(fs::metadata(info.path()).unwrap().len(), info.size());
    let mut out = Vec::new();
    assert_eq!(info.read_into(&mut out).unwrap(), info.size());
    assert_eq!(out, b"part");
}

#[test]
fn read_missing_file_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let info = FileInfo::new(dir.path(), FileMeta::new("never.bin", "application/octet-stream"));

    let err = info.read_into(&mut Vec::new()).unwrap_err();
    assert!(err.is_not_found(), "unexpected error: {}", err);
}

#[test]
fn write_into_missing_directory_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let info = FileInfo::new(
        dir.path().join("does-not-exist"),
        FileMeta::new("a.txt", "text/plain"),
    );

    match info.write(&mut Cursor::new(b"data".to_vec())) {
        Err(Error::Io { path, .. }) => assert_eq!(path, info.path()),
        other => panic!("expected Io error, got {:?}", other),
    }
}

#[test]
fn failing_stream_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let info = FileInfo::new(dir.path(), FileMeta::new("a.txt", "text/plain"));

    let err = info.write(&mut BrokenReader { sent: false }).unwrap_err();
    assert!(err.to_string().contains("upload aborted"));
    assert!(matches!(err, Error::Io { .. }));
}

#[test]
fn rehydrated_descriptor_reads_existing_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let original = FileInfo::new(dir.path(), FileMeta::new("photo.jpg", "image/jpeg"));
    original
        .write(&mut Cursor::new(vec![0xFF, 0xD8, 0xFF, 0xE0]))
        .unwrap();

    let shape = original.to_map(formstore_files::PathForm::Compact);
    let rehydrated = FileInfo::from_map(dir.path(), &shape).unwrap();

    let mut out = Vec::new();
    rehydrated.read_into(&mut out).unwrap();
    assert_eq!(out, vec![0xFF, 0xD8, 0xFF, 0xE0]);
    assert_eq!(rehydrated.path(), original.path());
}
