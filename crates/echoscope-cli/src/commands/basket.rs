use echoscope_core::EchoConfig;
use serde::Serialize;

use crate::error::CliError;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct BasketResponseData<'a> {
    granularity: &'static str,
    basket: &'a [echoscope_core::BasketEntry],
}

pub fn run(config: &EchoConfig) -> Result<CommandResult, CliError> {
    config.validate()?;
    let data = serde_json::to_value(BasketResponseData {
        granularity: config.granularity.as_str(),
        basket: &config.basket,
    })?;
    Ok(CommandResult::ok(data, Vec::new()))
}
