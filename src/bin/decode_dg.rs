use anyhow::{anyhow, bail, Context};
use input_dg::{AnomalyRecorder, DecodeConfig, DecodeContext, InputDgReader, MsgStateCounter, Pool};
use log::info;
use sloggers::terminal::{Destination, TerminalLoggerBuilder};
use sloggers::types::Severity;
use sloggers::Build;
use std::path::PathBuf;
use structopt::StructOpt;

/// Decodes a single producer datagram stored in a file.
#[derive(StructOpt)]
struct Config {
    /// File holding raw bytes of one datagram.
    #[structopt(parse(from_os_str))]
    input: PathBuf,

    /// Log decoded messages as well as discards.
    #[structopt(short = "v", long = "verbose")]
    verbose: bool,

    #[structopt(flatten)]
    decode_config: DecodeConfig,
}

fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
    let config = Config::from_args();

    let mut builder = TerminalLoggerBuilder::new();
    builder.level(if config.verbose { Severity::Debug } else { Severity::Info });
    builder.destination(Destination::Stderr);
    let logger = builder
        .build()
        .map_err(|e| anyhow!("Failed to build logger: {}", e))?;

    let datagram =
        std::fs::read(&config.input).with_context(|| format!("Failed to read {}", config.input.display()))?;
    info!("Read {} bytes from {}", datagram.len(), config.input.display());

    let reader = InputDgReader::new(&config.decode_config);
    let pool = Pool::new(config.decode_config.pool_size);
    let anomaly_tracker = AnomalyRecorder::new(config.decode_config.anomaly_sample_size);
    let msg_state_tracker = MsgStateCounter::new();
    let ctx = DecodeContext {
        pool: &pool,
        anomaly_tracker: &anomaly_tracker,
        msg_state_tracker: &msg_state_tracker,
        logger: &logger,
    };

    match reader.build_msg(&datagram, &ctx, false) {
        Some(msg) => {
            println!("topic: {}", msg.topic());
            println!("timestamp: {}", msg.timestamp());
            println!("key: {}", String::from_utf8_lossy(msg.key()));
            println!("value: {}", String::from_utf8_lossy(msg.value()));
            Ok(())
        }
        None => {
            for record in anomaly_tracker.samples() {
                println!("{:?}", record.kind);
            }
            bail!("Datagram from {} was discarded", config.input.display())
        }
    }
}
