use serde::{Deserialize, Serialize};
use steward_protocol::{ChunkId, SessionId};

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// 32-bit FNV-1a hash.
pub fn fnv1a_32(input: &str) -> u32 {
    let mut hash = FNV_OFFSET_BASIS;
    for byte in input.as_bytes() {
        hash ^= u32::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Clear the sign bit of a hash, mapping it into `[0, 2^31)`.
///
/// A plain absolute value would leak `2^31` itself out of the range when
/// the hash lands exactly on the sign bit.
pub fn to_point_id(hash: u32) -> u64 {
    u64::from(hash & 0x7fff_ffff)
}

/// Numeric point id for a chunk, always in `[0, 2^31)`.
///
/// Deterministic by construction, so upserting the same chunk id always
/// lands on the same point. The 31-bit space risks collisions on very
/// large corpora; widening it would orphan every already-indexed point, so
/// it stays as is.
pub fn point_id(chunk_id: &ChunkId) -> u64 {
    to_point_id(fnv1a_32(chunk_id.as_str()))
}

/// JSON payload stored alongside each point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointPayload {
    pub chunk_id: ChunkId,
    pub session_id: SessionId,
    pub project_path: String,
    pub timestamp: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn fnv1a_matches_reference_vectors() {
        // Published FNV-1a test vectors.
        assert_eq!(fnv1a_32(""), 0x811c9dc5);
        assert_eq!(fnv1a_32("a"), 0xe40c292c);
        assert_eq!(fnv1a_32("foobar"), 0xbf9cf968);
    }

    #[test]
    fn point_id_is_deterministic_and_non_negative() {
        let a = ChunkId::new("abc-123");
        let b = ChunkId::new("xyz-789");
        assert_eq!(point_id(&a), point_id(&a));
        assert_ne!(point_id(&a), point_id(&b));
        assert!(point_id(&a) < 1 << 31);
        assert!(point_id(&b) < 1 << 31);
    }

    #[test]
    fn to_point_id_stays_below_the_sign_bit() {
        // The sign-bit hash is the one value an absolute-value mapping
        // would push to 2^31, one past the range.
        assert_eq!(to_point_id(0x8000_0000), 0);
        assert_eq!(to_point_id(0x8000_0001), 1);
        assert_eq!(to_point_id(0x7fff_ffff), (1 << 31) - 1);
        assert_eq!(to_point_id(0), 0);
        for hash in [0u32, 1, 0x7fff_ffff, 0x8000_0000, 0xffff_ffff] {
            assert!(to_point_id(hash) < 1 << 31, "{hash:#x}");
        }
    }

    #[test]
    fn point_id_differs_per_slice() {
        let turn = ChunkId::new("t");
        let slice = ChunkId::new("t:0");
        assert_ne!(point_id(&turn), point_id(&slice));
    }
}
