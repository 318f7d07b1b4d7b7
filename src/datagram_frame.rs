use bytes::Bytes;
use crate::protocol_version::ProtocolVersion;
use crate::varint;

/// Frame type byte of a DATAGRAM frame without an explicit length field
pub const FRAME_TYPE_DATAGRAM: u8 = 0x30;
/// Frame type byte of a DATAGRAM frame with an explicit length field
pub const FRAME_TYPE_DATAGRAM_WITH_LEN: u8 = 0x31;

/// A single unreliable application message. Encoding and decoding on the wire is done elsewhere,
///  this type only knows how many bytes its encoded form occupies.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DatagramFrame {
    pub data: Bytes,
    /// If `false`, the frame extends to the end of the packet so it must be the last frame in it
    pub data_len_present: bool,
}

impl DatagramFrame {
    pub fn new(data: impl Into<Bytes>, data_len_present: bool) -> DatagramFrame {
        DatagramFrame {
            data: data.into(),
            data_len_present,
        }
    }

    pub fn frame_type(&self) -> u8 {
        if self.data_len_present {
            FRAME_TYPE_DATAGRAM_WITH_LEN
        }
        else {
            FRAME_TYPE_DATAGRAM
        }
    }

    /// the number of bytes this frame occupies in a packet
    pub fn length(&self, _version: ProtocolVersion) -> usize {
        let mut result = 1 + self.data.len();
        if self.data_len_present {
            result += varint::len(self.data.len() as u64);
        }
        result
    }

    /// The biggest payload that fits into a frame of at most `max_size` bytes, taking the frame type
    ///  and (if present) the length prefix into account. Returns 0 if there is not even room for
    ///  an empty frame.
    pub fn max_data_len(&self, max_size: usize, _version: ProtocolVersion) -> usize {
        let header_len = if self.data_len_present { 2 } else { 1 };
        if max_size < header_len {
            return 0;
        }

        let mut data_len = max_size - 1;
        if self.data_len_present {
            // the length prefix grows with the data, so we may have to shrink the data by a
            //  few bytes to make both fit
            data_len -= 1;
            while Self::encoded_len(data_len, true) > max_size {
                data_len -= 1;
            }
        }

        debug_assert!(Self::encoded_len(data_len, self.data_len_present) <= max_size);
        data_len
    }

    fn encoded_len(data_len: usize, data_len_present: bool) -> usize {
        if data_len_present {
            1 + varint::len(data_len as u64) + data_len
        }
        else {
            1 + data_len
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::empty_no_len(0, false, 1)]
    #[case::empty_with_len(0, true, 2)]
    #[case::small_no_len(5, false, 6)]
    #[case::small_with_len(5, true, 7)]
    #[case::one_byte_len_max(63, true, 65)]
    #[case::two_byte_len(64, true, 67)]
    #[case::big_no_len(1200, false, 1201)]
    #[case::big_with_len(1200, true, 1203)]
    fn test_length(#[case] data_len: usize, #[case] data_len_present: bool, #[case] expected: usize) {
        let frame = DatagramFrame::new(vec![7u8; data_len], data_len_present);
        assert_eq!(frame.length(ProtocolVersion::VERSION_1), expected);
        assert_eq!(frame.length(ProtocolVersion::DRAFT_29), expected);
    }

    #[rstest]
    #[case::nothing_fits(0, false, 0)]
    #[case::nothing_fits_with_len(1, true, 0)]
    #[case::empty_no_len(1, false, 0)]
    #[case::empty_with_len(2, true, 0)]
    #[case::one_byte_with_len(3, true, 1)]
    #[case::small_no_len(10, false, 9)]
    #[case::one_byte_prefix_max(65, true, 63)]
    #[case::prefix_would_grow(66, true, 63)]
    #[case::two_byte_prefix(67, true, 64)]
    #[case::packet_sized(1200, true, 1197)]
    fn test_max_data_len(#[case] max_size: usize, #[case] data_len_present: bool, #[case] expected: usize) {
        let frame = DatagramFrame::new(Bytes::new(), data_len_present);
        assert_eq!(frame.max_data_len(max_size, ProtocolVersion::VERSION_1), expected);
    }

    #[rstest]
    #[case::no_len(false, FRAME_TYPE_DATAGRAM)]
    #[case::with_len(true, FRAME_TYPE_DATAGRAM_WITH_LEN)]
    fn test_frame_type(#[case] data_len_present: bool, #[case] expected: u8) {
        assert_eq!(DatagramFrame::new(vec![1, 2, 3], data_len_present).frame_type(), expected);
    }
}
