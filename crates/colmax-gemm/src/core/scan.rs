//! Dot-product scan: one resident query against a sequence of references.
//!
//! The single-vector sibling of the blocked kernel. The query stays in a
//! fixed-size array for the whole scan; each reference vector is reduced
//! to one dot product and compared against the running best.
//!
//! ```text
//! best = none
//! for i, ref in references:
//!     d = Σ query[k] * ref[k]
//!     if best is none or d > best.value:   // strict: earliest index wins ties
//!         best = (d, i)
//! emit best.value, best.index
//! ```
//!
//! [`scan_stream`] runs one invocation on streams with the deployed sizes:
//! a bare query message, the references in fixed-size chunks, and a
//! two-word result message.

use crate::error::{Error, Result};
use crate::settings::{SCAN_BLOCK, SCAN_QUERY_LEN, SCAN_REFERENCES};
use crate::stream::{emit_frame, ingest, HeaderMode, StreamSink, StreamSource};
use crate::types::{Element, WireCodec, WireWord};

/// Outcome of a scan: the largest dot product and where it first occurred.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScanResult<T> {
    pub value: T,
    /// Global reference index, or `-1` if no reference was scanned.
    pub index: i64,
}

impl<T: Element> ScanResult<T> {
    /// Result of scanning an empty sequence: `(-1, -1)`.
    pub fn empty() -> Self {
        Self {
            value: T::from_i64(-1),
            index: -1,
        }
    }

    /// The two output elements in emission order: value, then index.
    pub fn to_output(&self) -> [T; 2] {
        [self.value, T::from_i64(self.index)]
    }

    pub fn is_empty(&self) -> bool {
        self.index < 0
    }
}

/// Dot product accumulated left to right.
#[inline]
pub fn dot<T: Element>(a: &[T], b: &[T]) -> T {
    a.iter().zip(b).fold(T::ZERO, |acc, (&x, &y)| T::mac(acc, x, y))
}

/// Running maximum dot product of a resident `D`-element query.
///
/// References can arrive in several blocks; indices continue across
/// [`update`](Self::update) calls.
///
/// # Example
///
/// ```
/// use colmax_gemm::core::DotScan;
///
/// let mut scan = DotScan::new([1.0f32, 0.0]);
/// scan.update(&[3.0, 9.0, 5.0, 0.0]);  // refs 0, 1
/// scan.update(&[5.0, 1.0]);            // ref 2 ties ref 1
///
/// let result = scan.finish();
/// assert_eq!(result.value, 5.0);
/// assert_eq!(result.index, 1);
/// ```
#[derive(Clone, Debug)]
pub struct DotScan<T: Element, const D: usize> {
    query: [T; D],
    best: Option<(T, usize)>,
    seen: usize,
}

impl<T: Element, const D: usize> DotScan<T, D> {
    pub fn new(query: [T; D]) -> Self {
        Self {
            query,
            best: None,
            seen: 0,
        }
    }

    pub fn query(&self) -> &[T; D] {
        &self.query
    }

    /// References consumed so far.
    pub fn seen(&self) -> usize {
        self.seen
    }

    /// Scan a block of references laid out back to back, `D` elements each.
    ///
    /// # Panics
    /// If `references.len()` is not a multiple of `D`.
    pub fn update(&mut self, references: &[T]) {
        assert!(D > 0, "query length must be non-zero");
        assert_eq!(
            references.len() % D,
            0,
            "reference block of {} elements is not a whole number of {}-element vectors",
            references.len(),
            D
        );

        for reference in references.chunks_exact(D) {
            let d = dot(&self.query, reference);
            let replace = match self.best {
                None => true,
                Some((best, _)) => d > best,
            };
            if replace {
                self.best = Some((d, self.seen));
            }
            self.seen += 1;
        }
    }

    /// Current best without consuming the scan.
    pub fn current(&self) -> ScanResult<T> {
        match self.best {
            Some((value, index)) => ScanResult {
                value,
                index: index as i64,
            },
            None => ScanResult::empty(),
        }
    }

    pub fn finish(self) -> ScanResult<T> {
        self.current()
    }

    /// Start a scan whose query is the next bare `D`-word message on `src`.
    pub fn from_stream<W, S>(src: &mut S) -> Result<Self>
    where
        W: WireWord,
        T: WireCodec<W>,
        S: StreamSource<W> + ?Sized,
    {
        let mut query = [T::ZERO; D];
        ingest(src, HeaderMode::None, &mut query)?;
        Ok(Self::new(query))
    }

    /// Read `references` vectors from `src`, at most `block` at a time, and
    /// scan them.
    ///
    /// # Errors
    /// [`Error::UnexpectedEnd`] counting words of the whole reference run
    /// if `src` closes early.
    pub fn update_from_stream<W, S>(&mut self, src: &mut S, references: usize, block: usize) -> Result<()>
    where
        W: WireWord,
        T: WireCodec<W>,
        S: StreamSource<W> + ?Sized,
    {
        if block == 0 {
            return Err(Error::DimensionMismatch("scan block must hold at least one reference".into()));
        }
        let expected = references * D;
        let mut buf = vec![T::ZERO; block.min(references) * D];
        let mut done = 0;
        while done < references {
            let n = block.min(references - done);
            let chunk = &mut buf[..n * D];
            match ingest(src, HeaderMode::None, chunk) {
                Ok(_) => {}
                Err(Error::StreamClosed) => return Err(Error::UnexpectedEnd { expected, got: done * D }),
                Err(Error::UnexpectedEnd { got, .. }) => {
                    return Err(Error::UnexpectedEnd {
                        expected,
                        got: done * D + got,
                    })
                }
                Err(e) => return Err(e),
            }
            self.update(chunk);
            done += n;
        }
        Ok(())
    }
}

/// Scan all `references` against `query` in one call.
pub fn dot_scan<T: Element, const D: usize>(query: [T; D], references: &[T]) -> ScanResult<T> {
    let mut scan = DotScan::new(query);
    scan.update(references);
    scan.finish()
}

/// One scan invocation on streams.
///
/// Reads a [`SCAN_QUERY_LEN`]-element query from `query_src`, then
/// [`SCAN_REFERENCES`] references from `ref_src` in chunks of
/// [`SCAN_BLOCK`], and writes `[value, index]` to `sink` with
/// end-of-message on the index.
///
/// # Errors
/// [`Error::StreamClosed`] if `query_src` is closed on a message boundary,
/// which ends a run of invocations normally.
pub fn scan_stream<W, T, Q, R, O>(query_src: &mut Q, ref_src: &mut R, sink: &mut O) -> Result<ScanResult<T>>
where
    W: WireWord,
    T: WireCodec<W>,
    Q: StreamSource<W> + ?Sized,
    R: StreamSource<W> + ?Sized,
    O: StreamSink<W> + ?Sized,
{
    let mut scan = DotScan::<T, SCAN_QUERY_LEN>::from_stream(query_src)?;
    scan.update_from_stream(ref_src, SCAN_REFERENCES, SCAN_BLOCK)?;
    let result = scan.finish();
    emit_frame(sink, None, &result.to_output())?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::Word;
    use std::collections::VecDeque;

    fn message(values: &[i32]) -> VecDeque<Word<i32>> {
        let last = values.len().saturating_sub(1);
        values.iter().enumerate().map(|(i, &v)| Word::new(v, i == last)).collect()
    }

    #[test]
    fn test_dot() {
        assert_eq!(dot(&[1.0f32, 2.0, 3.0], &[4.0, 5.0, 6.0]), 32.0);
        assert_eq!(dot::<i32>(&[], &[]), 0);
    }

    #[test]
    fn test_scan_picks_max() {
        let query = [1.0f32, 2.0];
        // dots: 1*1+2*1 = 3, 0 + 2*4 = 8, 2*1 + 2*2 = 6
        let refs = [1.0, 1.0, 0.0, 4.0, 2.0, 2.0];
        let result = dot_scan(query, &refs);
        assert_eq!(result, ScanResult { value: 8.0, index: 1 });
        assert_eq!(result.to_output(), [8.0, 1.0]);
    }

    #[test]
    fn test_scan_tie_keeps_earliest() {
        let query = [1i32, 1];
        // dots: 2, 7, 7, 3
        let refs = [1, 1, 3, 4, 5, 2, 1, 2];
        let result = dot_scan(query, &refs);
        assert_eq!(result.index, 1);
        assert_eq!(result.value, 7);
    }

    #[test]
    fn test_scan_first_negative_replaces_sentinel() {
        let query = [1.0f32, 1.0];
        // dots: -10, -4, -7
        let refs = [-5.0, -5.0, -2.0, -2.0, -3.0, -4.0];
        let result = dot_scan(query, &refs);
        assert_eq!(result, ScanResult { value: -4.0, index: 1 });
    }

    #[test]
    fn test_scan_empty() {
        let result = dot_scan::<f32, 16>([0.0; 16], &[]);
        assert!(result.is_empty());
        assert_eq!(result.to_output(), [-1.0, -1.0]);
    }

    #[test]
    fn test_scan_blocks_continue_indices() {
        let query = [2.0f64];
        let mut scan = DotScan::new(query);
        scan.update(&[1.0, 4.0]);
        assert_eq!(scan.current().index, 1);
        scan.update(&[3.0, 9.0, 9.0]);
        assert_eq!(scan.seen(), 5);

        let result = scan.finish();
        assert_eq!(result, ScanResult { value: 18.0, index: 3 });
    }

    #[test]
    fn test_scan_256_by_16() {
        let query: [f32; 16] = std::array::from_fn(|k| (k % 4) as f32);
        let mut refs = vec![0.0f32; 256 * 16];
        // Reference 200 is the only one aligned with the query.
        for k in 0..16 {
            refs[200 * 16 + k] = (k % 4) as f32;
        }
        let result = dot_scan(query, &refs);
        // 4 * (0 + 1 + 4 + 9) = 56
        assert_eq!(result, ScanResult { value: 56.0, index: 200 });
    }

    #[test]
    #[should_panic(expected = "whole number")]
    fn test_scan_rejects_partial_vector() {
        dot_scan([1.0f32, 2.0], &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_scan_stream_emits_value_then_index() {
        let query: Vec<i32> = (0..16).map(|k| (k % 4) as i32).collect();
        let mut refs = vec![0i32; 256 * 16];
        // References 37 and 200 both align with the query; 37 comes first.
        for k in 0..16 {
            refs[37 * 16 + k] = (k % 4) as i32;
            refs[200 * 16 + k] = (k % 4) as i32;
        }
        let mut query_src = message(&query);
        let mut ref_src = message(&refs);
        let mut out: Vec<Word<i32>> = Vec::new();

        let result = scan_stream::<i32, f32, _, _, _>(&mut query_src, &mut ref_src, &mut out).unwrap();
        // 4 * (0 + 1 + 4 + 9) = 56
        assert_eq!(result, ScanResult { value: 56.0, index: 37 });
        assert_eq!(out, vec![Word::body(56), Word::last(37)]);
        assert!(query_src.is_empty());
        assert!(ref_src.is_empty());
    }

    #[test]
    fn test_scan_stream_max_in_second_block() {
        let query = [1i32; 16];
        let mut refs = vec![1i32; 256 * 16];
        // Reference 130 lives in the second 128-reference chunk.
        refs[130 * 16] = 5;
        let mut out: Vec<Word<u32>> = Vec::new();
        let words = |v: &[i32]| -> VecDeque<Word<u32>> {
            let last = v.len() - 1;
            v.iter().enumerate().map(|(i, &x)| Word::new(x as u32, i == last)).collect()
        };

        let result = scan_stream::<u32, i32, _, _, _>(&mut words(&query[..]), &mut words(&refs[..]), &mut out).unwrap();
        // 15 ones plus 5
        assert_eq!(result, ScanResult { value: 20, index: 130 });
        assert_eq!(out.len(), 2);
        assert!(!out[0].tlast);
        assert!(out[1].tlast);
    }

    #[test]
    fn test_scan_stream_query_closed() {
        let mut query_src: VecDeque<Word<i32>> = VecDeque::new();
        let mut ref_src = message(&[0; 16]);
        let mut out: Vec<Word<i32>> = Vec::new();
        assert_eq!(
            scan_stream::<i32, f32, _, _, _>(&mut query_src, &mut ref_src, &mut out),
            Err(Error::StreamClosed)
        );
        assert!(out.is_empty());
    }

    #[test]
    fn test_scan_stream_short_references() {
        // Two full chunks would be 256 * 16 words; stop 3 words into the second.
        let mut ref_src = message(&vec![0; 128 * 16 + 3]);
        let mut out: Vec<Word<i32>> = Vec::new();
        let err = scan_stream::<i32, i32, _, _, _>(&mut message(&[1; 16]), &mut ref_src, &mut out).unwrap_err();
        assert_eq!(
            err,
            Error::UnexpectedEnd {
                expected: 256 * 16,
                got: 128 * 16 + 3
            }
        );
        assert!(out.is_empty());
    }

    #[test]
    fn test_update_from_stream_partial_last_chunk() {
        let mut scan = DotScan::new([1i32, 1]);
        // dots: 2, 4, 9, 1, 9
        let mut src = message(&[1, 1, 2, 2, 4, 5, 0, 1, 5, 4]);
        scan.update_from_stream(&mut src, 5, 2).unwrap();
        assert_eq!(scan.seen(), 5);
        assert_eq!(scan.finish(), ScanResult { value: 9, index: 2 });
    }

    #[test]
    fn test_update_from_stream_rejects_empty_block() {
        let mut scan = DotScan::new([1i32]);
        let mut src = message(&[1]);
        assert!(matches!(
            scan.update_from_stream(&mut src, 1, 0),
            Err(Error::DimensionMismatch(_))
        ));
    }
}
