use std::fmt::{Display, Formatter};

/// The wire protocol version a connection negotiated. Frame sizes are computed relative to a
///  version, even if the encoding of a given frame type happens to be identical across versions.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct ProtocolVersion(u32);

impl Display for ProtocolVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

impl ProtocolVersion {
    pub const VERSION_1: ProtocolVersion = ProtocolVersion(0x0000_0001);
    pub const VERSION_2: ProtocolVersion = ProtocolVersion(0x6b33_43cf);
    pub const DRAFT_29: ProtocolVersion = ProtocolVersion(0xff00_001d);

    pub fn from_raw(value: u32) -> Self {
        Self(value)
    }

    pub fn to_raw(&self) -> u32 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::v1(ProtocolVersion::VERSION_1, "0x00000001")]
    #[case::v2(ProtocolVersion::VERSION_2, "0x6b3343cf")]
    #[case::draft_29(ProtocolVersion::DRAFT_29, "0xff00001d")]
    fn test_display(#[case] version: ProtocolVersion, #[case] expected: &str) {
        assert_eq!(version.to_string(), expected);
        assert_eq!(ProtocolVersion::from_raw(version.to_raw()), version);
    }
}
