//! Contig-qualified, 1-based genomic coordinates.

use smartstring::alias::String;
use std::cmp::Ordering;
use std::fmt;

/// A single 1-based position on a named contig.
///
/// Ordering is "natural" on contig names: contigs carrying a number compare by that number
/// first (`chr2` < `chr10`, `1` < `chrX`), then lexicographically, then by position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GenomicPosition {
    contig: String,
    position: u32,
}

impl GenomicPosition {
    pub fn new(contig: impl Into<String>, position: u32) -> Self {
        Self {
            contig: contig.into(),
            position,
        }
    }

    #[inline]
    pub fn contig(&self) -> &str {
        &self.contig
    }

    #[inline]
    pub fn position(&self) -> u32 {
        self.position
    }

    /// The same contig shifted by `delta` bases, or `None` when it would fall below 1.
    pub fn offset(&self, delta: i64) -> Option<Self> {
        let shifted = i64::from(self.position) + delta;
        if shifted < 1 || shifted > i64::from(u32::MAX) {
            return None;
        }
        Some(Self {
            contig: self.contig.clone(),
            position: shifted as u32,
        })
    }
}

/// Value of the first maximal run of ASCII digits in a contig name.
fn contig_number(name: &str) -> Option<u64> {
    let bytes = name.as_bytes();
    let start = bytes.iter().position(u8::is_ascii_digit)?;
    let len = bytes[start..]
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .count();
    name[start..start + len].parse().ok()
}

/// Natural contig ordering used for output sorting.
pub fn compare_contigs(left: &str, right: &str) -> Ordering {
    if left == right {
        return Ordering::Equal;
    }
    let by_number = match (contig_number(left), contig_number(right)) {
        (Some(l), Some(r)) => l.cmp(&r),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    // `chr1` and `1` share a number; fall back to the names so distinct contigs never tie.
    by_number.then_with(|| left.cmp(right))
}

impl Ord for GenomicPosition {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_contigs(&self.contig, &other.contig).then(self.position.cmp(&other.position))
    }
}

impl PartialOrd for GenomicPosition {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for GenomicPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.contig, self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn pos(contig: &str, position: u32) -> GenomicPosition {
        GenomicPosition::new(contig, position)
    }

    #[test]
    fn numbered_contigs_sort_numerically() {
        assert!(pos("chr2", 500) < pos("chr10", 1));
        assert!(pos("chr1", 100) < pos("chr1", 200));
        assert!(pos("chr22", 1) < pos("chrX", 1));
        assert!(pos("chrM", 1) > pos("chrX", 1));
        assert!(pos("1", 10) < pos("chrX", 1));
    }

    #[test]
    fn shared_numbers_fall_back_to_names() {
        assert_ne!(pos("1", 5).cmp(&pos("chr1", 5)), Ordering::Equal);
        assert_eq!(pos("1", 5).cmp(&pos("chr1", 5)), Ordering::Less);
    }

    #[test]
    fn offset_stays_on_contig() {
        let p = pos("chr3", 10);
        assert_eq!(p.offset(5), Some(pos("chr3", 15)));
        assert_eq!(p.offset(-9), Some(pos("chr3", 1)));
        assert_eq!(p.offset(-10), None);
    }

    #[test]
    fn displays_as_contig_colon_position() {
        assert_eq!(pos("chr7", 1234).to_string(), "chr7:1234");
    }

    fn arb_contig() -> impl Strategy<Value = std::string::String> {
        prop_oneof![
            (1u32..30).prop_map(|n| format!("chr{}", n)),
            (1u32..30).prop_map(|n| n.to_string()),
            Just("chrX".to_string()),
            Just("chrY".to_string()),
            Just("chrM".to_string()),
            Just("GL000220.1".to_string()),
        ]
    }

    proptest! {
        #[test]
        fn ordering_is_total_and_consistent(
            a in (arb_contig(), 1u32..1_000),
            b in (arb_contig(), 1u32..1_000),
            c in (arb_contig(), 1u32..1_000),
        ) {
            let (a, b, c) = (pos(&a.0, a.1), pos(&b.0, b.1), pos(&c.0, c.1));
            prop_assert_eq!(a.cmp(&b), b.cmp(&a).reverse());
            prop_assert_eq!(a.cmp(&b) == Ordering::Equal, a == b);
            if a <= b && b <= c {
                prop_assert!(a <= c);
            }
        }
    }
}
