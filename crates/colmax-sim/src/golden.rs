//! Golden results and line-by-line comparison.

use std::fmt;

use colmax_fabric::{RoutePolicy, SplitOperand, TopologyConfig};
use colmax_gemm::core::{naive_colmax, unpack_blocked, BlockShape};
use colmax_gemm::settings::{DefaultShape, PACKET_TYPE};
use colmax_gemm::stream::PacketHeader;

use crate::datagen::TestVectors;
use crate::error::{Result, SimError};

/// Expected output words per instance: for every invocation the result
/// header followed by the column maxima.
pub fn golden_words(config: &TopologyConfig, vectors: &TestVectors) -> Result<Vec<Vec<i64>>> {
    let n = config.instances;
    let d = config.dims;
    let mut lines = vec![Vec::new(); n];
    let mut invocation = vec![0usize; n];

    for (i, packet) in vectors.split.iter().enumerate() {
        let target = match config.route {
            RoutePolicy::RoundRobin => i % n,
            RoutePolicy::PacketId => PacketHeader::id_bits(packet.header) as usize,
        };
        if target >= n {
            return Err(SimError::Format(format!("packet {} targets missing instance {}", i, target)));
        }
        let shared = vectors.broadcast.get(invocation[target]).ok_or_else(|| {
            SimError::Format(format!(
                "instance {} has no broadcast operand for invocation {}",
                target, invocation[target]
            ))
        })?;
        invocation[target] += 1;

        let (a_blk, b_blk) = match config.split_operand {
            SplitOperand::Reference => (shared, &packet.payload),
            SplitOperand::Query => (&packet.payload, shared),
        };
        let a = as_f32(&unpack_blocked(a_blk, d.ra, d.ca, DefaultShape::M, DefaultShape::K));
        let b = as_f32(&unpack_blocked(b_blk, d.rb, d.cb, DefaultShape::K, DefaultShape::N));

        let out = &mut lines[target];
        out.push(PacketHeader::new(PACKET_TYPE, target as u8).encode() as i64);
        out.extend(naive_colmax(&a, d.ra, d.ca, &b, d.cb).iter().map(|&v| v as i32 as i64));
    }
    Ok(lines)
}

fn as_f32(v: &[i32]) -> Vec<f32> {
    v.iter().map(|&x| x as f32).collect()
}

/// Format golden words, one per line.
pub fn format_golden(words: &[i64]) -> String {
    words.iter().map(|w| format!("{}\n", w)).collect()
}

/// Outcome of comparing a produced file against golden.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    Match,
    /// Produced output ended before golden line `golden_line`.
    TooShort { golden_line: usize },
    /// Produced output has data past the end of golden.
    TooLong { produced_line: usize },
    /// Golden line `golden_line` differs from produced line `produced_line`.
    Mismatch {
        golden_line: usize,
        produced_line: usize,
        expected: String,
        got: String,
    },
}

impl Verdict {
    pub fn is_match(&self) -> bool {
        matches!(self, Verdict::Match)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Match => write!(f, "results match golden"),
            Verdict::TooShort { golden_line } => {
                write!(f, "results are too short to match golden (ended at golden line {})", golden_line)
            }
            Verdict::TooLong { produced_line } => {
                write!(f, "results are too long to match golden (extra data at line {})", produced_line)
            }
            Verdict::Mismatch {
                golden_line,
                produced_line,
                expected,
                got,
            } => write!(
                f,
                "results do not match golden: golden line {} is {:?}, produced line {} is {:?}",
                golden_line, expected, produced_line, got
            ),
        }
    }
}

/// Leading integer of `s`: optional sign then digits, anything after ignored.
fn leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let digits_start = usize::from(s.starts_with(['+', '-']));
    let digits_end = s[digits_start..]
        .find(|c: char| !c.is_ascii_digit())
        .map_or(s.len(), |p| p + digits_start);
    if digits_end == digits_start {
        return None;
    }
    s[..digits_end].parse().ok()
}

/// Compare a produced file against golden, line by line.
///
/// Produced lines starting with `T` (timestamps and `TLAST` markers) are
/// informational and skipped. Blank lines are ignored in both files.
pub fn compare(golden: &str, produced: &str) -> Verdict {
    let mut produced = produced
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l))
        .filter(|(_, l)| !l.trim().is_empty() && !l.starts_with('T'));

    for (gi, expected) in golden.lines().enumerate().filter(|(_, l)| !l.trim().is_empty()) {
        let golden_line = gi + 1;
        let Some((produced_line, got)) = produced.next() else {
            return Verdict::TooShort { golden_line };
        };
        let same = match (leading_int(expected), leading_int(got)) {
            (Some(e), Some(g)) => e == g,
            _ => false,
        };
        if !same {
            return Verdict::Mismatch {
                golden_line,
                produced_line,
                expected: expected.trim().to_string(),
                got: got.trim().to_string(),
            };
        }
    }

    match produced.next() {
        Some((produced_line, _)) => Verdict::TooLong { produced_line },
        None => Verdict::Match,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datagen::DataGen;
    use crate::seqfile::{format_output, Packet};
    use colmax_gemm::core::{pack_a, pack_b, Dims};
    use colmax_gemm::stream::Message;

    #[test]
    fn test_leading_int() {
        assert_eq!(leading_int("42"), Some(42));
        assert_eq!(leading_int(" -7 "), Some(-7));
        assert_eq!(leading_int("8.000e+00"), Some(8));
        assert_eq!(leading_int("2415853568"), Some(2415853568));
        assert_eq!(leading_int("TLAST"), None);
        assert_eq!(leading_int("-"), None);
    }

    #[test]
    fn test_compare_skips_markers() {
        let golden = "1\n2\n3\n";
        let produced = "1\nT 100 ps\n2\nT 200 ps\nTLAST\n3\nT 300 ps\n";
        assert_eq!(compare(golden, produced), Verdict::Match);
    }

    #[test]
    fn test_compare_too_short() {
        assert_eq!(compare("1\n2\n", "1\nT 5 ps\n"), Verdict::TooShort { golden_line: 2 });
    }

    #[test]
    fn test_compare_too_long() {
        assert_eq!(compare("1\n", "1\n9\n"), Verdict::TooLong { produced_line: 2 });
    }

    #[test]
    fn test_compare_mismatch() {
        let v = compare("1\n2\n", "1\nT 5 ps\n3\n");
        assert_eq!(
            v,
            Verdict::Mismatch {
                golden_line: 2,
                produced_line: 3,
                expected: "2".into(),
                got: "3".into(),
            }
        );
        assert!(v.to_string().contains("do not match"));
    }

    #[test]
    fn test_golden_single_instance() {
        // One 4x2 · 2x4 problem, A = ones, B rows [1 2 3 4] and [5 6 7 8]:
        // every C row is [6 8 10 12].
        let dims = Dims::product(4, 2, 4);
        let cfg = TopologyConfig::new().with_instances(1).with_dims(dims);
        let a = pack_a::<DefaultShape, _>(&[1; 8], 4, 2);
        let b = pack_b::<DefaultShape, _>(&[1, 2, 3, 4, 5, 6, 7, 8], 2, 4);
        let vectors = TestVectors {
            broadcast: vec![a],
            split: vec![Packet::new(PacketHeader::new(0, 0), b)],
        };

        let words = golden_words(&cfg, &vectors).unwrap();
        assert_eq!(words, vec![vec![2415853568, 6, 8, 10, 12]]);
    }

    #[test]
    fn test_golden_matches_formatted_output() {
        let cfg = TopologyConfig::new().with_instances(2).with_dims(Dims::product(8, 4, 8));
        let vectors = DataGen::new(7).generate(&cfg, 2);
        let words = golden_words(&cfg, &vectors).unwrap();
        assert_eq!(words.len(), 2);
        assert_eq!(words[0].len(), 2 * 9);

        // Rebuild instance 0's messages from its golden words and format them
        // the way the simulator would.
        let messages: Vec<Message<i32>> = words[0]
            .chunks(9)
            .map(|c| {
                let header = PacketHeader::decode(c[0] as u32).unwrap();
                Message::new(Some(header), c[1..].iter().map(|&v| v as i32).collect())
            })
            .collect();
        let produced = format_output(&messages, 0, 1);
        assert!(compare(&format_golden(&words[0]), &produced).is_match());
    }

    #[test]
    fn test_golden_missing_broadcast() {
        let cfg = TopologyConfig::new().with_instances(1).with_dims(Dims::product(4, 2, 4));
        let vectors = TestVectors {
            broadcast: Vec::new(),
            split: vec![Packet::new(PacketHeader::new(0, 0), vec![0; 8])],
        };
        assert!(matches!(golden_words(&cfg, &vectors), Err(SimError::Format(_))));
    }
}
