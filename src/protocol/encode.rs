// src/protocol/encode.rs

//! Pure command-to-wire encoding.

use bytes::{BufMut, Bytes, BytesMut};

const CRLF: &[u8] = b"\r\n";

/// Encodes a verb and its arguments as a RESP array of bulk strings, the
/// request form every command takes on the wire.
pub fn encode_command(verb: &str, args: &[Bytes]) -> Bytes {
    let mut capacity = 16 + verb.len();
    for arg in args {
        capacity += arg.len() + 16;
    }
    let mut out = BytesMut::with_capacity(capacity);
    let mut lengths = itoa::Buffer::new();

    out.put_u8(b'*');
    out.extend_from_slice(lengths.format(args.len() + 1).as_bytes());
    out.extend_from_slice(CRLF);
    put_bulk(&mut out, &mut lengths, verb.as_bytes());
    for arg in args {
        put_bulk(&mut out, &mut lengths, arg);
    }
    out.freeze()
}

fn put_bulk(out: &mut BytesMut, lengths: &mut itoa::Buffer, payload: &[u8]) {
    out.put_u8(b'$');
    out.extend_from_slice(lengths.format(payload.len()).as_bytes());
    out.extend_from_slice(CRLF);
    out.extend_from_slice(payload);
    out.extend_from_slice(CRLF);
}
