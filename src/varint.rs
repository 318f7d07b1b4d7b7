//! Length of QUIC variable-length integers (RFC 9000, section 16)

pub const MAX_VALUE: u64 = (1 << 62) - 1;

/// Number of bytes needed to encode `value` as a variable-length integer.
///
/// NB: Values above [MAX_VALUE] can not be encoded at all - passing one is a bug in the caller
pub fn len(value: u64) -> usize {
    if value < 1 << 6 {
        1
    }
    else if value < 1 << 14 {
        2
    }
    else if value < 1 << 30 {
        4
    }
    else {
        assert!(value <= MAX_VALUE, "this is a bug: value {} exceeds the varint range", value);
        8
    }
}
