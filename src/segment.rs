//! Wire format: an 8-byte header (sequence number, checksum, type) followed
//! by 0..MSS payload bytes. Byte order is big-endian throughout.

pub const HEADER_LEN: usize = 8;

pub const TYPE_DATA: u16 = 0x5555;
pub const TYPE_ACK: u16 = 0xAAAA;

/// A decoded segment, either a data frame carrying a payload or a cumulative ACK.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Data { seq: u32, checksum: u16, payload: Vec<u8> },
    Ack { seq: u32 },
}

impl Segment {
    /// Builds a DATA segment, computing its checksum from `payload`.
    pub fn data(seq: u32, payload: Vec<u8>) -> Self {
        let checksum = checksum(&payload);
        Segment::Data { seq, checksum, payload }
    }

    pub fn ack(seq: u32) -> Self {
        Segment::Ack { seq }
    }

    pub fn seq(&self) -> u32 {
        match self {
            Segment::Data { seq, .. } => *seq,
            Segment::Ack { seq } => *seq,
        }
    }

    /// Encodes this segment into its on-wire byte representation.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Segment::Data { seq, checksum, payload } => {
                let mut buf = Vec::with_capacity(HEADER_LEN + payload.len());
                buf.extend_from_slice(&seq.to_be_bytes());
                buf.extend_from_slice(&checksum.to_be_bytes());
                buf.extend_from_slice(&TYPE_DATA.to_be_bytes());
                buf.extend_from_slice(payload);
                buf
            }
            Segment::Ack { seq } => {
                let mut buf = Vec::with_capacity(HEADER_LEN);
                buf.extend_from_slice(&seq.to_be_bytes());
                buf.extend_from_slice(&0u16.to_be_bytes());
                buf.extend_from_slice(&TYPE_ACK.to_be_bytes());
                buf
            }
        }
    }

    /// Decodes a segment from wire bytes. Returns `None` for anything
    /// malformed (too short) or of an unrecognized type; per the protocol
    /// these are silently discarded by the caller, never an error.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < HEADER_LEN {
            return None;
        }

        let seq = u32::from_be_bytes(bytes[0..4].try_into().unwrap());
        let checksum = u16::from_be_bytes(bytes[4..6].try_into().unwrap());
        let kind = u16::from_be_bytes(bytes[6..8].try_into().unwrap());

        match kind {
            TYPE_DATA => Some(Segment::Data {
                seq,
                checksum,
                payload: bytes[HEADER_LEN..].to_vec(),
            }),
            TYPE_ACK => Some(Segment::Ack { seq }),
            _ => None,
        }
    }
}

/// 16-bit one's-complement checksum over `payload`, with an implicit
/// trailing zero byte if `payload` has odd length (the transmitted payload
/// itself is never altered).
pub fn checksum(payload: &[u8]) -> u16 {
    let mut acc: u32 = 0;
    let mut iter = payload.chunks_exact(2);

    for pair in &mut iter {
        let word = u16::from_be_bytes([pair[0], pair[1]]);
        acc += word as u32;
        acc = (acc & 0xFFFF) + (acc >> 16);
    }

    if let [last] = iter.remainder() {
        let word = u16::from_be_bytes([*last, 0]);
        acc += word as u32;
        acc = (acc & 0xFFFF) + (acc >> 16);
    }

    !(acc as u16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_payload_checksum_is_all_ones() {
        assert_eq!(checksum(&[]), 0xFFFF);
    }

    #[test]
    fn single_byte_checksum_matches_spec_example() {
        // payload {0x41}, padded to 0x4100; ~0x4100 & 0xFFFF == 0xBEFF
        assert_eq!(checksum(&[0x41]), 0xBEFF);
    }

    #[test]
    fn odd_length_padding_is_implicit() {
        let odd = vec![0x01, 0x02, 0x03];
        let padded = vec![0x01, 0x02, 0x03, 0x00];
        assert_eq!(checksum(&odd), checksum(&padded));
    }

    #[test]
    fn even_length_padding_changes_checksum() {
        let even = vec![0x01, 0x02];
        let padded = vec![0x01, 0x02, 0x00];
        assert_ne!(checksum(&even), checksum(&padded));
    }

    #[test]
    fn data_round_trip() {
        let seg = Segment::data(42, vec![1, 2, 3, 4, 5]);
        let bytes = seg.encode();
        let decoded = Segment::decode(&bytes).unwrap();
        assert_eq!(decoded, seg);
        if let Segment::Data { checksum: c, payload, .. } = &decoded {
            assert_eq!(*c, checksum(payload));
        } else {
            panic!("expected data segment");
        }
    }

    #[test]
    fn ack_round_trip() {
        let seg = Segment::ack(7);
        let bytes = seg.encode();
        assert_eq!(decode_ack_checksum_field(&bytes), 0);
        let decoded = Segment::decode(&bytes).unwrap();
        assert_eq!(decoded, Segment::Ack { seq: 7 });
    }

    fn decode_ack_checksum_field(bytes: &[u8]) -> u16 {
        u16::from_be_bytes(bytes[4..6].try_into().unwrap())
    }

    #[test]
    fn decode_rejects_short_frames() {
        assert!(Segment::decode(&[0u8; 7]).is_none());
    }

    #[test]
    fn decode_rejects_unknown_type() {
        let mut bytes = vec![0u8; 8];
        bytes[6..8].copy_from_slice(&0x1234u16.to_be_bytes());
        assert!(Segment::decode(&bytes).is_none());
    }

    proptest::proptest! {
        #[test]
        fn prop_codec_round_trip(seq: u32, payload in proptest::collection::vec(proptest::prelude::any::<u8>(), 0..2048)) {
            let seg = Segment::data(seq, payload.clone());
            let bytes = seg.encode();
            let decoded = Segment::decode(&bytes).unwrap();
            match decoded {
                Segment::Data { seq: s, checksum: c, payload: p } => {
                    proptest::prop_assert_eq!(s, seq);
                    proptest::prop_assert_eq!(p, payload.clone());
                    proptest::prop_assert_eq!(c, checksum(&payload));
                }
                _ => proptest::prop_assert!(false, "expected data segment"),
            }
        }
    }
}
