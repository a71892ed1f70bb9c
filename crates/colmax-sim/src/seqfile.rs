//! Text formats shared with the hardware simulator.
//!
//! | File | Layout |
//! |------|--------|
//! | plain | one integer per line |
//! | packet sequence | per packet: header line, payload lines, `TLAST`, final payload line |
//! | simulator output | value lines, each followed by `T <time> ps`; `TLAST` precedes the last value of a message |
//!
//! Blank lines are ignored everywhere.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use colmax_gemm::stream::{Message, PacketHeader, Word};

use crate::error::{Result, SimError};

/// End-of-message marker line.
pub const TLAST: &str = "TLAST";

/// Default time of the first output word, in picoseconds.
pub const DEFAULT_START_PS: u64 = 6_553_600;
/// Default spacing between output words, in picoseconds.
pub const DEFAULT_STEP_PS: u64 = 28_800;

/// One packet of a sequence file: a raw header word and its payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Packet {
    pub header: u32,
    pub payload: Vec<i32>,
}

impl Packet {
    pub fn new(header: PacketHeader, payload: Vec<i32>) -> Self {
        Self {
            header: header.encode(),
            payload,
        }
    }

    /// Wrap as a stream message. The header word travels unchanged as the
    /// first word, so the wire form matches [`words`](Self::words) and
    /// parity is left to whoever reads it.
    pub fn to_message(&self) -> Message<i32> {
        let mut words = Vec::with_capacity(self.payload.len() + 1);
        words.push(self.header as i32);
        words.extend_from_slice(&self.payload);
        Message::new(None, words)
    }

    /// Words as they go on the wire, header first.
    pub fn words(&self) -> Vec<Word<i32>> {
        let mut words = Vec::with_capacity(self.payload.len() + 1);
        words.push(Word::new(self.header as i32, self.payload.is_empty()));
        let last = self.payload.len().saturating_sub(1);
        words.extend(self.payload.iter().enumerate().map(|(i, &v)| Word::new(v, i == last)));
        words
    }
}

/// Read a file into a string.
pub fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| SimError::io(path, e))
}

/// Write a string to a file, creating parent directories.
pub fn write_text(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| SimError::io(parent, e))?;
    }
    fs::write(path, text).map_err(|e| SimError::io(path, e))
}

fn parse_int(line: usize, text: &str) -> Result<i64> {
    text.parse::<i64>().map_err(|_| SimError::Parse {
        line,
        text: text.to_string(),
    })
}

fn lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty())
}

/// Parse a plain file.
pub fn parse_plain(text: &str) -> Result<Vec<i32>> {
    lines(text)
        .map(|(n, l)| parse_int(n, l).map(|v| v as i32))
        .collect()
}

/// Format values as a plain file.
pub fn format_plain(values: &[i32]) -> String {
    let mut out = String::with_capacity(values.len() * 4);
    for v in values {
        let _ = writeln!(out, "{}", v);
    }
    out
}

/// Parse a packet sequence file.
///
/// The first number of each packet is its header. A packet ends with the
/// number that follows a `TLAST` line.
pub fn parse_packets(text: &str) -> Result<Vec<Packet>> {
    let mut packets = Vec::new();
    let mut current: Option<Packet> = None;
    let mut last_next = false;

    for (n, line) in lines(text) {
        if line.eq_ignore_ascii_case(TLAST) {
            last_next = true;
            continue;
        }
        let value = parse_int(n, line)?;
        match current.as_mut() {
            None => {
                current = Some(Packet {
                    header: value as u32,
                    payload: Vec::new(),
                });
            }
            Some(p) => p.payload.push(value as i32),
        }
        if last_next {
            packets.extend(current.take());
            last_next = false;
        }
    }

    if current.is_some() || last_next {
        return Err(SimError::Format("packet sequence ends without TLAST".into()));
    }
    Ok(packets)
}

/// Format packets as a sequence file.
pub fn format_packets(packets: &[Packet]) -> String {
    let mut out = String::new();
    for p in packets {
        if p.payload.is_empty() {
            let _ = writeln!(out, "{}", TLAST);
        }
        let _ = writeln!(out, "{}", p.header);
        let last = p.payload.len().saturating_sub(1);
        for (i, v) in p.payload.iter().enumerate() {
            if i == last {
                let _ = writeln!(out, "{}", TLAST);
            }
            let _ = writeln!(out, "{}", v);
        }
    }
    out
}

/// Format output words the way the simulator logs them.
///
/// Header words are written unsigned. Time advances by `step_ps` per word.
pub fn format_output(messages: &[Message<i32>], start_ps: u64, step_ps: u64) -> String {
    let mut out = String::new();
    let mut ts = start_ps;
    for msg in messages {
        let words = msg.to_words();
        for (i, word) in words.iter().enumerate() {
            if word.tlast {
                let _ = writeln!(out, "{}", TLAST);
            }
            if i == 0 && msg.header.is_some() {
                let _ = writeln!(out, "{}", word.data as u32);
            } else {
                let _ = writeln!(out, "{}", word.data);
            }
            let _ = writeln!(out, "T {} ps", ts);
            ts += step_ps;
        }
    }
    out
}
