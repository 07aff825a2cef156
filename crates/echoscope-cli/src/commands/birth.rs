use echoscope_core::{AssetAddress, EchoConfig, EnvelopeError};

use crate::cli::BirthArgs;
use crate::error::CliError;

use super::{build_pipeline, CommandResult};

pub async fn run(
    args: &BirthArgs,
    config: EchoConfig,
    offline: bool,
) -> Result<CommandResult, CliError> {
    let address = AssetAddress::parse(&args.address)?;
    let pipeline = build_pipeline(&config, &address, offline)?;
    let sources = pipeline.providers().into_iter().take(1).collect::<Vec<_>>();

    match pipeline.resolve_birth(&address).await {
        Ok(birth) => Ok(CommandResult::ok(serde_json::to_value(&birth)?, sources)),
        Err(error) => Ok(CommandResult::failed(EnvelopeError::from(&error), sources)),
    }
}
