//! File-level driver: load inputs, run the fabric, write results.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use colmax_fabric::{ShardResults, Topology, TopologyConfig};
use colmax_gemm::settings::DefaultShape;
use colmax_gemm::stream::{HeaderMode, Message};

use crate::datagen::TestVectors;
use crate::error::{Result, SimError};
use crate::golden::{compare, format_golden, Verdict};
use crate::seqfile::{
    format_output, format_packets, format_plain, parse_packets, parse_plain, read_text, write_text,
};

/// Broadcast operands, all invocations back to back.
pub const BROADCAST_FILE: &str = "broadcast.txt";
/// Split packets.
pub const SPLIT_FILE: &str = "split.seq";

pub fn output_file(instance: usize) -> String {
    format!("output{}.txt", instance)
}

pub fn golden_file(instance: usize) -> String {
    format!("golden{}.txt", instance)
}

/// Write test vectors into `dir`.
pub fn save_vectors(dir: &Path, vectors: &TestVectors) -> Result<()> {
    let flat: Vec<i32> = vectors.broadcast.iter().flatten().copied().collect();
    write_text(&dir.join(BROADCAST_FILE), &format_plain(&flat))?;
    write_text(&dir.join(SPLIT_FILE), &format_packets(&vectors.split))?;
    info!(
        dir = %dir.display(),
        invocations = vectors.broadcast.len(),
        packets = vectors.split.len(),
        "wrote test vectors"
    );
    Ok(())
}

/// Load test vectors from `dir`, checking sizes against `config`.
pub fn load_vectors(dir: &Path, config: &TopologyConfig) -> Result<TestVectors> {
    let flat = parse_plain(&read_text(&dir.join(BROADCAST_FILE))?)?;
    let len = config.broadcast_len();
    if len == 0 || flat.len() % len != 0 {
        return Err(SimError::Format(format!(
            "{} holds {} values, not a whole number of {}-value operands",
            BROADCAST_FILE,
            flat.len(),
            len
        )));
    }
    let broadcast = flat.chunks(len).map(<[i32]>::to_vec).collect();

    let split = parse_packets(&read_text(&dir.join(SPLIT_FILE))?)?;
    if let Some((i, p)) = split
        .iter()
        .enumerate()
        .find(|(_, p)| p.payload.len() != config.split_len())
    {
        return Err(SimError::Format(format!(
            "packet {} has {} payload values, expected {}",
            i,
            p.payload.len(),
            config.split_len()
        )));
    }

    Ok(TestVectors { broadcast, split })
}

/// Run every invocation through a fresh topology.
///
/// Split packets carry their raw header word, which units drop unread unless
/// `config` asks for [`HeaderMode::Keep`]. Broadcast operands travel bare.
pub fn run(config: &TopologyConfig, vectors: &TestVectors) -> Result<ShardResults<i32>> {
    let split_header = match config.split_header {
        HeaderMode::Keep => HeaderMode::Keep,
        HeaderMode::None | HeaderMode::Discard => HeaderMode::Discard,
    };
    let config = config.clone().with_headers(split_header, HeaderMode::None);

    let broadcast: Vec<Message<i32>> = vectors
        .broadcast
        .iter()
        .map(|b| Message::new(None, b.clone()))
        .collect();
    let split: Vec<Message<i32>> = vectors.split.iter().map(|p| p.to_message()).collect();
    debug!(broadcast = broadcast.len(), split = split.len(), "feeding topology");

    let topology = Topology::<i32>::spawn::<f32, DefaultShape>(config)?;
    Ok(topology.run_batch(&broadcast, &split)?)
}

/// Write one simulator-format output file per instance.
pub fn write_outputs(dir: &Path, results: &ShardResults<i32>, start_ps: u64, step_ps: u64) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::with_capacity(results.len());
    for (i, shard) in results.iter().enumerate() {
        let messages: Vec<Message<i32>> = shard
            .iter()
            .map(|r| Message::new(r.header, r.payload.clone()))
            .collect();
        let path = dir.join(output_file(i));
        write_text(&path, &format_output(&messages, start_ps, step_ps))?;
        paths.push(path);
    }
    info!(dir = %dir.display(), files = paths.len(), "wrote outputs");
    Ok(paths)
}

/// Write one golden file per instance.
pub fn write_golden(dir: &Path, words: &[Vec<i64>]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::with_capacity(words.len());
    for (i, w) in words.iter().enumerate() {
        let path = dir.join(golden_file(i));
        write_text(&path, &format_golden(w))?;
        paths.push(path);
    }
    Ok(paths)
}

/// Compare `golden<i>.txt` against `output<i>.txt` for each instance.
pub fn verify_dirs(golden_dir: &Path, output_dir: &Path, instances: usize) -> Result<Vec<Verdict>> {
    (0..instances)
        .map(|i| {
            let golden = read_text(&golden_dir.join(golden_file(i)))?;
            let produced = read_text(&output_dir.join(output_file(i)))?;
            Ok(compare(&golden, &produced))
        })
        .collect()
}
