use serde_json::json;

use crate::commands::{format_price, load_advisor, parse_selection, CommandResult, LoadedConfig};
use crate::session::{Session, SessionEvent};

pub fn run(
    loaded: LoadedConfig,
    specs: &[String],
    budget: Option<f64>,
) -> CommandResult {
    let selection = match parse_selection(specs) {
        Ok(selection) => selection,
        Err(message) => return CommandResult::failure("predict", "invalid_input", message, 6),
    };

    let (config, advisor) = match load_advisor(loaded) {
        Ok(loaded) => loaded,
        Err(error) => return CommandResult::startup_failure("predict", &error),
    };

    let assessment = advisor.assess(&selection, budget.unwrap_or(0.0));
    let mut session = Session::new();
    let transition = match session.apply(SessionEvent::PricePredicted(assessment.outcome)) {
        Ok(transition) => transition,
        Err(error) => {
            return CommandResult::failure("predict", "session_transition", error.to_string(), 1)
        }
    };

    let currency = config.pricing.currency.as_str();
    let formatted = format_price(currency, assessment.prediction.price);
    let data = json!({
        "price": assessment.prediction.price,
        "formatted_price": formatted,
        "currency": currency,
        "budget": assessment.budget,
        "outcome": assessment.outcome,
        "outcome_message": assessment.outcome.message(),
        "model_version": advisor.model().version,
        "session": transition,
        "suggestions_available": session.suggestions_available(),
    });

    let message = format!("Estimated price: {formatted}. {}", assessment.outcome.message());
    CommandResult::success("predict", message, Some(data))
}
