use serde_json::json;

use crate::commands::{load_advisor, CommandResult, LoadedConfig};

pub fn run(config: LoadedConfig) -> CommandResult {
    let (_, advisor) = match load_advisor(config) {
        Ok(loaded) => loaded,
        Err(error) => return CommandResult::startup_failure("domains", &error),
    };

    let domains = advisor.attribute_domains();
    let message = format!("{} selectable attributes", domains.len());
    CommandResult::success("domains", message, Some(json!({ "domains": domains })))
}
