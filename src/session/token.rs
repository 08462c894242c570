//! Session Tokens
//!
//! Per SESSION_SEMANTICS.md:
//! - A session token is a per-partition vector clock: a version, a global
//!   log position, and per-region log positions
//! - Tokens prove "read your own writes": a replica may serve a session read
//!   only if its token is at least as recent as the client's
//! - Parse failure means "token absent", never a fatal error
//!
//! Wire form: `<pkRangeId>:<version>#<globalLsn>[,<region>=<lsn>]*`

use std::fmt;

/// Immutable per-partition session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken {
    pk_range_id: String,
    version: u64,
    global_log_position: u64,
    /// Region positions in wire order. Regions are unique.
    region_positions: Vec<(u32, u64)>,
}

impl SessionToken {
    /// Parse a wire-form token. Returns `None` on any malformed segment;
    /// callers treat that as "no token observed".
    pub fn try_parse(text: &str) -> Option<Self> {
        let (pk_range_id, rest) = text.split_once(':')?;
        if pk_range_id.is_empty() {
            return None;
        }
        let (version_text, positions_text) = rest.split_once('#')?;
        let version = parse_position(version_text)?;

        let mut segments = positions_text.split(',');
        let global_log_position = parse_position(segments.next()?)?;

        let mut region_positions: Vec<(u32, u64)> = Vec::new();
        for segment in segments {
            let (region_text, position_text) = segment.split_once('=')?;
            let region: u32 = region_text.parse().ok()?;
            let position = parse_position(position_text)?;
            if region_positions.iter().any(|(seen, _)| *seen == region) {
                return None; // duplicate region
            }
            region_positions.push((region, position));
        }

        Some(Self {
            pk_range_id: pk_range_id.to_string(),
            version,
            global_log_position,
            region_positions,
        })
    }

    /// Partition key range this token belongs to.
    pub fn pk_range_id(&self) -> &str {
        &self.pk_range_id
    }

    /// Token version.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Global log position.
    pub fn global_log_position(&self) -> u64 {
        self.global_log_position
    }

    /// Per-region log positions in wire order.
    pub fn region_positions(&self) -> &[(u32, u64)] {
        &self.region_positions
    }

    /// Position for one region, if tracked.
    pub fn position_for(&self, region: u32) -> Option<u64> {
        self.region_positions
            .iter()
            .find(|(r, _)| *r == region)
            .map(|(_, p)| *p)
    }

    /// Partial order: `self ⪰ other` iff the version and global position are
    /// at least `other`'s, and every region `other` tracks is tracked here
    /// with a position at least `other`'s. A region present in `other` but
    /// absent here makes the comparison false.
    pub fn is_at_least_as_recent_as(&self, other: &SessionToken) -> bool {
        self.version >= other.version
            && self.global_log_position >= other.global_log_position
            && other
                .region_positions
                .iter()
                .all(|(region, position)| match self.position_for(*region) {
                    Some(mine) => mine >= *position,
                    None => false,
                })
    }

    /// Component-wise maximum of two tokens: max version, max global
    /// position, per-region max over the union of regions. The merged token
    /// lists regions in ascending region order and keeps `self`'s partition
    /// key range id.
    pub fn merge(&self, other: &SessionToken) -> SessionToken {
        let mut merged: std::collections::BTreeMap<u32, u64> =
            self.region_positions.iter().copied().collect();
        for (region, position) in &other.region_positions {
            let entry = merged.entry(*region).or_insert(*position);
            if *position > *entry {
                *entry = *position;
            }
        }
        SessionToken {
            pk_range_id: self.pk_range_id.clone(),
            version: self.version.max(other.version),
            global_log_position: self.global_log_position.max(other.global_log_position),
            region_positions: merged.into_iter().collect(),
        }
    }
}

/// Positions and versions are plain decimal; anything else (signs, spaces,
/// empty segments) is malformed.
fn parse_position(text: &str) -> Option<u64> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}#{}",
            self.pk_range_id, self.version, self.global_log_position
        )?;
        for (region, position) in &self.region_positions {
            write!(f, ",{region}={position}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(text: &str) -> SessionToken {
        SessionToken::try_parse(text).unwrap()
    }

    /// Canonical wire strings round-trip through parse and Display.
    #[test]
    fn test_round_trip() {
        for text in [
            "range-7:1#651177",
            "0:42#100,1=95,2=88",
            "range_3:0#0",
            "9:18446744073709551615#3,0=1,5=2,31=3",
        ] {
            assert_eq!(token(text).to_string(), text);
        }
    }

    /// Malformed tokens parse to None.
    #[test]
    fn test_malformed_tokens_rejected() {
        for text in [
            "",
            "no-separator",
            ":1#5",         // empty range id
            "r:#5",         // empty version
            "r:1#",         // empty global position
            "r:x#5",        // non-numeric version
            "r:1#x",        // non-numeric position
            "r:1#5,1",      // region without position
            "r:1#5,a=3",    // non-numeric region
            "r:1#5,1=-3",   // signed position
            "r:1#5,1=+3",   // signed position
            "r:1#5,1=2,1=3", // duplicate region
            "r:1#5,1= 2",   // embedded space
        ] {
            assert!(SessionToken::try_parse(text).is_none(), "accepted {text:?}");
        }
    }

    /// The partial order checks version, global position, and every region
    /// the requested token tracks.
    #[test]
    fn test_partial_order() {
        let requested = token("r:1#100,1=90,2=80");

        assert!(token("r:1#100,1=90,2=80").is_at_least_as_recent_as(&requested));
        assert!(token("r:2#150,1=95,2=85,3=1").is_at_least_as_recent_as(&requested));

        // older version
        assert!(!token("r:0#100,1=90,2=80").is_at_least_as_recent_as(&requested));
        // older global position
        assert!(!token("r:1#99,1=90,2=80").is_at_least_as_recent_as(&requested));
        // one region behind
        assert!(!token("r:1#100,1=89,2=80").is_at_least_as_recent_as(&requested));
        // missing region
        assert!(!token("r:1#100,1=90").is_at_least_as_recent_as(&requested));
    }

    /// The order is reflexive.
    #[test]
    fn test_order_reflexive() {
        let t = token("r:3#500,1=400,7=300");
        assert!(t.is_at_least_as_recent_as(&t));
    }

    /// Merge takes component-wise maxima over the union of regions.
    #[test]
    fn test_merge() {
        let a = token("r:1#100,1=90,3=50");
        let b = token("r:2#80,1=95,2=10");
        let merged = a.merge(&b);

        assert_eq!(merged.to_string(), "r:2#100,1=95,2=10,3=50");
        assert!(merged.is_at_least_as_recent_as(&a));
        assert!(merged.is_at_least_as_recent_as(&b));
    }

    /// Merging with itself is the identity for a region-sorted token.
    #[test]
    fn test_merge_idempotent() {
        let t = token("r:4#20,1=10,2=15");
        assert_eq!(t.merge(&t), t);
    }
}
