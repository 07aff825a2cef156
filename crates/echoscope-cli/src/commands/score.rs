use echoscope_core::{AssetAddress, BasketEntry, EchoConfig, EnvelopeError, Granularity, UnixTime};

use crate::cli::ScoreArgs;
use crate::error::CliError;

use super::{build_pipeline, CommandResult};

pub async fn run(
    args: &ScoreArgs,
    mut config: EchoConfig,
    offline: bool,
) -> Result<CommandResult, CliError> {
    let target = AssetAddress::parse(&args.address)?;

    if let Some(raw) = &args.granularity {
        config.granularity = raw.parse::<Granularity>()?;
    }
    if let Some(phase_shift) = args.phase_shift {
        config.analysis.phase_shift = phase_shift;
    }
    if !args.basket.is_empty() {
        config.basket = override_basket(&config.basket, &args.basket)?;
    }

    let pipeline = build_pipeline(&config, &target, offline)?;
    let sources = pipeline.providers();

    match pipeline.run(&target, UnixTime::now()).await {
        Ok(report) => {
            let warnings = report
                .exclusions
                .iter()
                .map(|exclusion| exclusion.describe())
                .collect();
            let data = serde_json::to_value(&report)?;
            Ok(CommandResult::ok(data, sources).with_warnings(warnings))
        }
        Err(error) => {
            tracing::error!(address = %target, code = error.code(), %error, "scoring failed");
            Ok(CommandResult::failed(EnvelopeError::from(&error), sources))
        }
    }
}

/// Replaces the basket, keeping configured labels for known addresses.
fn override_basket(
    configured: &[BasketEntry],
    raw: &[String],
) -> Result<Vec<BasketEntry>, CliError> {
    raw.iter()
        .map(|raw| {
            let address = AssetAddress::parse(raw)?;
            let entry = configured
                .iter()
                .find(|entry| entry.address == address)
                .cloned()
                .unwrap_or_else(|| BasketEntry::unlabeled(address));
            Ok(entry)
        })
        .collect()
}
