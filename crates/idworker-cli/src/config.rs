use anyhow::bail;
use clap::{Parser, Subcommand};
use idworker::{BitLayout, TWITTER_EPOCH_MS, WorkerConfig};

/// Runtime configuration for the `idworker` binary.
///
/// Worker and datacenter ids are normally injected by deployment tooling
/// through the environment (or a `.env` file). The epoch and bit widths must
/// match across every worker whose ids are compared or decoded together.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "idworker",
    version,
    about = "Issue and decode 64-bit Snowflake-style ids"
)]
pub struct CliArgs {
    /// Worker id encoded into every issued id.
    ///
    /// Environment variable: `WORKER_ID`
    #[arg(long, global = true, env = "WORKER_ID", default_value_t = 0, allow_negative_numbers = true)]
    pub worker_id: i64,

    /// Datacenter id encoded into every issued id.
    ///
    /// Environment variable: `DATACENTER_ID`
    #[arg(long, global = true, env = "DATACENTER_ID", default_value_t = 0, allow_negative_numbers = true)]
    pub datacenter_id: i64,

    /// Epoch in milliseconds since 1970-01-01 UTC. Defaults to the Twitter
    /// epoch.
    ///
    /// Environment variable: `EPOCH_MS`
    #[arg(long, global = true, env = "EPOCH_MS", default_value_t = TWITTER_EPOCH_MS)]
    pub epoch_ms: u64,

    /// Width of the datacenter id field. The timestamp takes whatever the
    /// datacenter id, worker id and sequence leave of the 63 usable bits.
    ///
    /// Environment variable: `DATACENTER_ID_BITS`
    #[arg(long, global = true, env = "DATACENTER_ID_BITS", default_value_t = BitLayout::TWITTER.datacenter_id_bits())]
    pub datacenter_id_bits: u32,

    /// Width of the worker id field.
    ///
    /// Environment variable: `WORKER_ID_BITS`
    #[arg(long, global = true, env = "WORKER_ID_BITS", default_value_t = BitLayout::TWITTER.worker_id_bits())]
    pub worker_id_bits: u32,

    /// Width of the per-millisecond sequence field.
    ///
    /// Environment variable: `SEQUENCE_BITS`
    #[arg(long, global = true, env = "SEQUENCE_BITS", default_value_t = BitLayout::TWITTER.sequence_bits())]
    pub sequence_bits: u32,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Issue new ids, one per line.
    Generate {
        /// Number of ids to issue.
        #[arg(short, long, default_value_t = 1)]
        count: usize,

        /// Print the decoded fields next to each id.
        #[arg(short, long, default_value_t = false)]
        decode: bool,
    },
    /// Decode ids into their timestamp, datacenter id, worker id and
    /// sequence.
    Decode {
        /// Raw ids as printed by `generate`.
        #[arg(required = true)]
        ids: Vec<i64>,
    },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub worker: WorkerConfig,
    pub command: Command,
}

impl TryFrom<CliArgs> for AppConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let layout = BitLayout::new(
            args.datacenter_id_bits,
            args.worker_id_bits,
            args.sequence_bits,
        );
        let worker = WorkerConfig::new(args.worker_id, args.datacenter_id)
            .with_epoch_ms(args.epoch_ms)
            .with_layout(layout);
        worker.validate()?;

        match &args.command {
            Command::Generate { count: 0, .. } => bail!("--count must be greater than 0"),
            Command::Decode { ids } => {
                if let Some(id) = ids.iter().find(|id| **id < 0) {
                    bail!("{id} is not a valid id: ids are never negative");
                }
            }
            Command::Generate { .. } => {}
        }

        Ok(Self {
            worker,
            command: args.command,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> anyhow::Result<AppConfig> {
        let args = CliArgs::try_parse_from(args)?;
        AppConfig::try_from(args)
    }

    #[test]
    fn defaults_to_twitter_layout_and_epoch() {
        let config = parse(&["idworker", "generate"]).unwrap();
        assert_eq!(config.worker, WorkerConfig::new(0, 0));
        assert_eq!(
            config.command,
            Command::Generate {
                count: 1,
                decode: false
            }
        );
    }

    #[test]
    fn global_flags_are_accepted_after_the_subcommand() {
        let config = parse(&[
            "idworker",
            "generate",
            "--count",
            "3",
            "--worker-id",
            "5",
            "--datacenter-id",
            "3",
        ])
        .unwrap();
        assert_eq!(config.worker.worker_id, 5);
        assert_eq!(config.worker.datacenter_id, 3);
    }

    #[test]
    fn out_of_range_ids_are_rejected() {
        let err = parse(&["idworker", "--worker-id", "32", "generate"]).unwrap_err();
        assert!(err.to_string().contains("worker id"));

        let err = parse(&["idworker", "--datacenter-id", "-1", "generate"]).unwrap_err();
        assert!(err.to_string().contains("datacenter id"));
    }

    #[test]
    fn custom_layout_widens_the_worker_field() {
        let config = parse(&[
            "idworker",
            "--worker-id-bits",
            "8",
            "--datacenter-id-bits",
            "2",
            "--worker-id",
            "200",
            "generate",
        ])
        .unwrap();
        assert_eq!(config.worker.layout, BitLayout::new(2, 8, 12));
    }

    #[test]
    fn layout_without_room_for_a_timestamp_is_rejected() {
        let err = parse(&["idworker", "--sequence-bits", "53", "generate"]).unwrap_err();
        assert!(err.to_string().contains("63"));
        assert!(parse(&["idworker", "--timestamp-bits", "1", "generate"]).is_err());
    }

    #[test]
    fn epoch_too_late_to_decode_is_rejected() {
        let err = parse(&[
            "idworker",
            "--epoch-ms",
            "18446744073709551615",
            "decode",
            "4194304",
        ])
        .unwrap_err();
        assert!(err.to_string().contains("epoch"));
    }

    #[test]
    fn zero_count_is_rejected() {
        assert!(parse(&["idworker", "generate", "--count", "0"]).is_err());
    }

    #[test]
    fn negative_ids_cannot_be_decoded() {
        assert!(parse(&["idworker", "decode", "--", "-5"]).is_err());
        assert!(parse(&["idworker", "decode", "12345"]).is_ok());
    }
}
