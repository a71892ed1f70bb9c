//! colmax-sim CLI
//!
//! # Commands
//!
//! - `gen` - Generate seeded test vectors
//! - `golden` - Compute golden outputs from test vectors
//! - `run` - Run test vectors through the compute-unit fabric
//! - `verify` - Compare outputs against golden

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use colmax_fabric::{RoutePolicy, SplitOperand, TopologyConfig};
use colmax_gemm::core::{Dims, LoopOrder};
use colmax_gemm::settings::{DEFAULT_INSTANCES, F_CA, F_CB, F_RA};
use colmax_gemm::stream::HeaderMode;
use colmax_sim::runner;
use colmax_sim::seqfile::{DEFAULT_START_PS, DEFAULT_STEP_PS};
use colmax_sim::{golden_words, DataGen};

/// Column-max GEMM fabric simulator
#[derive(Parser)]
#[command(name = "colmax-sim")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    topology: TopologyArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Debug)]
struct TopologyArgs {
    /// Number of compute units
    #[arg(long, global = true, default_value_t = DEFAULT_INSTANCES)]
    instances: usize,

    /// Query rows per invocation (R_a)
    #[arg(long, global = true, default_value_t = F_RA)]
    ra: usize,

    /// Embedding width (C_a = R_b)
    #[arg(long, global = true, default_value_t = F_CA)]
    ca: usize,

    /// Reference columns per unit (C_b)
    #[arg(long, global = true, default_value_t = F_CB)]
    cb: usize,

    /// Operand partitioned across units
    #[arg(long, global = true, value_enum, default_value_t = SplitArg::Reference)]
    split: SplitArg,

    /// How split packets are assigned to units
    #[arg(long, global = true, value_enum, default_value_t = RouteArg::RoundRobin)]
    route: RouteArg,

    /// Outer block loop
    #[arg(long, global = true, value_enum, default_value_t = OrderArg::Rows)]
    loop_order: OrderArg,

    /// Words buffered per channel
    #[arg(long, global = true, default_value_t = 1024)]
    capacity: usize,

    /// Reject split headers with even parity instead of dropping them unread
    #[arg(long, global = true)]
    check_parity: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SplitArg {
    Reference,
    Query,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum RouteArg {
    RoundRobin,
    PacketId,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OrderArg {
    Rows,
    Cols,
}

impl TopologyArgs {
    fn to_config(&self) -> anyhow::Result<TopologyConfig> {
        let config = TopologyConfig::new()
            .with_instances(self.instances)
            .with_capacity(self.capacity)
            .with_dims(Dims::new(self.ra, self.ca, self.ca, self.cb)?)
            .with_split_operand(match self.split {
                SplitArg::Reference => SplitOperand::Reference,
                SplitArg::Query => SplitOperand::Query,
            })
            .with_route(match self.route {
                RouteArg::RoundRobin => RoutePolicy::RoundRobin,
                RouteArg::PacketId => RoutePolicy::PacketId,
            })
            .with_loop_order(match self.loop_order {
                OrderArg::Rows => LoopOrder::RowBlocksOuter,
                OrderArg::Cols => LoopOrder::ColBlocksOuter,
            })
            .with_headers(
                if self.check_parity { HeaderMode::Keep } else { HeaderMode::Discard },
                HeaderMode::None,
            );
        config.validate()?;
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Generate seeded test vectors
    Gen {
        /// Output directory
        #[arg(long, default_value = "data")]
        data: PathBuf,

        /// Broadcast operands (each unit runs this many invocations)
        #[arg(short = 'n', long, default_value_t = 1)]
        invocations: usize,

        /// RNG seed
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
    /// Compute golden outputs from test vectors
    Golden {
        /// Directory holding the test vectors
        #[arg(long, default_value = "data")]
        data: PathBuf,

        /// Directory for golden<i>.txt
        #[arg(long, default_value = "data")]
        out: PathBuf,
    },
    /// Run test vectors through the fabric
    Run {
        /// Directory holding the test vectors
        #[arg(long, default_value = "data")]
        data: PathBuf,

        /// Directory for output<i>.txt
        #[arg(long, default_value = "sim_output")]
        out: PathBuf,

        /// Time of the first output word (ps)
        #[arg(long, default_value_t = DEFAULT_START_PS)]
        start_ps: u64,

        /// Time between output words (ps)
        #[arg(long, default_value_t = DEFAULT_STEP_PS)]
        step_ps: u64,
    },
    /// Compare outputs against golden
    Verify {
        /// Directory holding golden<i>.txt
        #[arg(long, default_value = "data")]
        golden: PathBuf,

        /// Directory holding output<i>.txt
        #[arg(long, default_value = "sim_output")]
        produced: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = cli.topology.to_config()?;

    match cli.command {
        Commands::Gen {
            data,
            invocations,
            seed,
        } => {
            let vectors = DataGen::new(seed).generate(&config, invocations);
            runner::save_vectors(&data, &vectors)?;
        }
        Commands::Golden { data, out } => {
            let vectors = runner::load_vectors(&data, &config)
                .with_context(|| format!("loading test vectors from {}", data.display()))?;
            let words = golden_words(&config, &vectors)?;
            let paths = runner::write_golden(&out, &words)?;
            info!(files = paths.len(), dir = %out.display(), "wrote golden");
        }
        Commands::Run {
            data,
            out,
            start_ps,
            step_ps,
        } => {
            let vectors = runner::load_vectors(&data, &config)
                .with_context(|| format!("loading test vectors from {}", data.display()))?;
            let results = runner::run(&config, &vectors)?;
            runner::write_outputs(&out, &results, start_ps, step_ps)?;
        }
        Commands::Verify { golden, produced } => {
            let verdicts = runner::verify_dirs(&golden, &produced, config.instances)?;
            let mut failed = 0;
            for (i, verdict) in verdicts.iter().enumerate() {
                if verdict.is_match() {
                    info!(instance = i, "{}", verdict);
                } else {
                    error!(instance = i, "{}", verdict);
                    failed += 1;
                }
            }
            if failed > 0 {
                bail!("{} of {} outputs do not match golden", failed, verdicts.len());
            }
            println!("All {} outputs match golden", verdicts.len());
        }
    }

    Ok(())
}
