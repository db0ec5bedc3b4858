use bytes::{BufMut, BytesMut};
use pretty_assertions::assert_eq;
use rstest::{fixture, rstest};

use crate::snapshot::{DecodeError, TopologyRecord, TopologySnapshot};

#[fixture]
fn snapshot() -> TopologySnapshot {
    TopologySnapshot {
        records: vec![
            TopologyRecord {
                level: 1,
                link_speed: 100,
                name: "spine0".to_string(),
                nodes: "tux[0-3]".to_string(),
                switches: "leaf[0-1]".to_string(),
            },
            TopologyRecord {
                level: 0,
                link_speed: 40,
                name: "leaf0".to_string(),
                nodes: "tux[0-1]".to_string(),
                switches: String::new(),
            },
        ],
    }
}

fn packed(snapshot: &TopologySnapshot) -> BytesMut {
    let mut buf = BytesMut::new();
    snapshot.pack(&mut buf);
    buf
}

#[rstest]
fn round_trip(snapshot: TopologySnapshot) {
    let buf = packed(&snapshot);
    let decoded = TopologySnapshot::unpack(&buf).unwrap();
    assert_eq!(decoded, snapshot);
}

#[test]
fn empty_snapshot_round_trips() {
    let snapshot = TopologySnapshot::default();
    let buf = packed(&snapshot);
    assert_eq!(buf.len(), 4);
    assert_eq!(TopologySnapshot::unpack(&buf).unwrap(), snapshot);
}

#[rstest]
fn wire_layout_is_big_endian(snapshot: TopologySnapshot) {
    let buf = packed(&snapshot);
    // Record count.
    assert_eq!(&buf[0..4], &[0, 0, 0, 2]);
    // First record: level u16, link_speed u32, then the name length.
    assert_eq!(&buf[4..6], &[0, 1]);
    assert_eq!(&buf[6..10], &[0, 0, 0, 100]);
    assert_eq!(&buf[10..14], &[0, 0, 0, 6]);
    assert_eq!(&buf[14..20], b"spine0");
}

#[rstest]
fn truncated_buffer_is_rejected(snapshot: TopologySnapshot) {
    let buf = packed(&snapshot);
    for cut in [0, 3, 5, 9, 12, buf.len() - 1] {
        let err = TopologySnapshot::unpack(&buf[..cut]).unwrap_err();
        assert!(matches!(err, DecodeError::Truncated { .. }), "cut at {cut}: {err}");
    }
}

#[test]
fn overlong_record_count_is_rejected() {
    let mut buf = BytesMut::new();
    buf.put_u32(1_000_000);
    buf.put_u16(0);
    assert_eq!(
        TopologySnapshot::unpack(&buf).unwrap_err(),
        DecodeError::Truncated { field: "record_count" },
    );
}

#[rstest]
fn trailing_bytes_are_rejected(snapshot: TopologySnapshot) {
    let mut buf = packed(&snapshot);
    buf.put_u8(0xff);
    assert_eq!(TopologySnapshot::unpack(&buf).unwrap_err(), DecodeError::TrailingBytes {
        remaining: 1
    });
}

#[test]
fn invalid_utf8_is_rejected() {
    let mut buf = BytesMut::new();
    buf.put_u32(1);
    buf.put_u16(0);
    buf.put_u32(0);
    buf.put_u32(2);
    buf.put_slice(&[0xc3, 0x28]); // malformed two-byte sequence
    buf.put_u32(0);
    buf.put_u32(0);
    assert_eq!(
        TopologySnapshot::unpack(&buf).unwrap_err(),
        DecodeError::InvalidUtf8 { field: "name" },
    );
}
