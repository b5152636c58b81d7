mod common;

use common::init;
use elfchain::{Chunk, Error, Region};

#[test]
fn slices_are_views_with_checked_bounds() {
    let data = [0x90u8, 0x90, 0xc3, 0x00];
    let chunk = Chunk::new(&data);
    assert_eq!(chunk.len(), 4);

    let sub = chunk.slice(1, 2).unwrap();
    assert_eq!(sub.as_bytes(), &[0x90, 0xc3]);

    let err = chunk.slice(2, 3).unwrap_err();
    assert!(matches!(err, Error::OutOfRange { .. }), "{err}");
    assert!(matches!(
        chunk.slice(usize::MAX, 2),
        Err(Error::OutOfRange { .. })
    ));
}

#[test]
fn equality_is_byte_wise() {
    let a = [1u8, 2, 3];
    let b = vec![1u8, 2, 3];
    assert_eq!(Chunk::new(&a), Chunk::new(&b));
    assert_ne!(Chunk::new(&a), Chunk::new(&b[..2]));
    // zero-length chunks all compare equal
    assert_eq!(Chunk::empty(), Chunk::new(&a).slice(3, 0).unwrap());
}

#[test]
fn prints_hex_and_concatenates() {
    let chunk = Chunk::new(&[0x90, 0x90, 0xc3]);
    assert_eq!(format!("{chunk:x}"), "9090c3");

    let joined = chunk.slice(0, 2).unwrap().cat(chunk.slice(2, 1).unwrap());
    assert_eq!(joined, vec![0x90, 0x90, 0xc3]);
}

#[test]
fn splices_preserve_surrounding_bytes() {
    init();
    let mut region = Region::from(vec![1u8, 2, 3, 4]);
    assert_eq!(region.insert(2, &[9, 9]).unwrap(), 6);
    assert_eq!(region.as_chunk().as_bytes(), &[1, 2, 9, 9, 3, 4]);

    assert_eq!(region.remove(2, 2).unwrap(), 4);
    assert_eq!(region.as_chunk().as_bytes(), &[1, 2, 3, 4]);

    assert!(matches!(region.insert(5, &[0]), Err(Error::OutOfRange { .. })));
    assert!(matches!(region.remove(3, 2), Err(Error::OutOfRange { .. })));
}

#[test]
fn writes_in_place_without_resizing() {
    let mut region = Region::zeroed(4);
    region.write(1, &[7, 8]).unwrap();
    assert_eq!(region.len(), 4);
    assert_eq!(region.as_chunk().as_bytes(), &[0, 7, 8, 0]);
    assert!(matches!(region.write(3, &[1, 2]), Err(Error::OutOfRange { .. })));
}

#[test]
fn vends_chunks_at_offsets() {
    let region = Region::from(vec![0u8, 1, 2, 3, 4]);
    assert_eq!(region.chunk_at(2, 2).unwrap().as_bytes(), &[2, 3]);
    assert!(matches!(region.chunk_at(4, 2), Err(Error::OutOfRange { .. })));
}

#[test]
fn loads_regions_from_disk() {
    init();
    let path = std::env::temp_dir().join(format!("elfchain-region-{}", std::process::id()));
    std::fs::write(&path, [0x7f, b'E', b'L', b'F']).unwrap();
    let region = Region::from_file(&path).unwrap();
    assert_eq!(region.len(), 4);
    std::fs::remove_file(&path).unwrap();

    let err = Region::from_file(&path).unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }), "{err}");
}
