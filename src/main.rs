use clap::{Parser, Subcommand};
use gsm_bts_core::bts::BtsContext;
use gsm_bts_core::channel::LogicalChannel;
use gsm_bts_core::config::BtsConfig;
use gsm_bts_core::l1::LoopbackL1;
use gsm_bts_core::l3::ie::Lai;
use gsm_bts_core::lapdm::ChannelKind;
use gsm_bts_core::{init_logger, instrumentation, log_info};

#[derive(Parser)]
#[command(name = "bts-ctl")]
#[command(about = "Control and inspect a GSM BTS protocol-stack core")]
struct Cli {
    #[arg(short, long, default_value = "bts.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the BTS core with the configured channel pool (this build uses
    /// loopback L1 collaborators; wiring in real radio hardware is outside
    /// this crate's scope).
    Start {
        #[arg(short, long, default_value_t = 4)]
        channels: usize,
    },
    /// Print current instrumentation counters as JSON.
    Stats,
    /// Inject a synthetic RACH burst for local testing, without real radio
    /// hardware. Requires the `sim` feature.
    #[cfg(feature = "sim")]
    InjectRach {
        #[arg(value_enum)]
        kind: FakeRachKind,
    },
}

#[cfg(feature = "sim")]
#[derive(Clone, clap::ValueEnum)]
enum FakeRachKind {
    Normal,
    Emergency,
    LocationUpdating,
}

fn build_context(config: BtsConfig, channel_count: usize) -> std::sync::Arc<BtsContext> {
    let channels: Vec<LogicalChannel> = (0..channel_count)
        .map(|_| LogicalChannel::new(ChannelKind::Sdcch, Box::new(LoopbackL1::default()), config.timers.radio_link_timeout))
        .collect();
    let lai = Lai {
        mcc: 1,
        mnc: 1,
        mnc_is_three_digit: false,
        lac: 1,
    };
    std::sync::Arc::new(BtsContext::new(config, lai, channels))
}

fn main() -> anyhow::Result<()> {
    init_logger();
    let cli = Cli::parse();
    let config = BtsConfig::load_from_file(&cli.config).unwrap_or_else(|_| {
        log_info(&format!("no config at {}, using defaults", cli.config));
        BtsConfig::default()
    });

    match cli.command {
        Commands::Start { channels } => {
            let ctx = build_context(config, channels);
            log_info(&format!("started with {} logical channels", ctx.channel_count()));
            let handles = ctx.clone().run();
            for handle in handles {
                let _ = handle.join();
            }
        }
        Commands::Stats => {
            let snap = instrumentation::snapshot();
            println!("{}", serde_json::to_string_pretty(&snap)?);
        }
        #[cfg(feature = "sim")]
        Commands::InjectRach { kind } => {
            use gsm_bts_core::rr_frontend::sim::{fake_rach_ra, FakeRachType};
            let fake_kind = match kind {
                FakeRachKind::Normal => FakeRachType::Normal,
                FakeRachKind::Emergency => FakeRachType::Emergency,
                FakeRachKind::LocationUpdating => FakeRachType::LocationUpdating,
            };
            let ra = fake_rach_ra(fake_kind);
            log_info(&format!("injected fake RACH RA=0x{ra:02x}"));
        }
    }

    Ok(())
}
