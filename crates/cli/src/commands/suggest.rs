use lapprice_core::NO_SUGGESTIONS_MESSAGE;
use serde_json::json;

use crate::commands::{format_price, load_advisor, parse_selection, CommandResult, LoadedConfig};
use crate::session::{Session, SessionEvent};

pub fn run(loaded: LoadedConfig, specs: &[String], budget: f64) -> CommandResult {
    let selection = match parse_selection(specs) {
        Ok(selection) => selection,
        Err(message) => return CommandResult::failure("suggest", "invalid_input", message, 6),
    };

    let (config, advisor) = match load_advisor(loaded) {
        Ok(loaded) => loaded,
        Err(error) => return CommandResult::startup_failure("suggest", &error),
    };

    let assessment = advisor.assess(&selection, budget);
    let formatted = format_price(&config.pricing.currency, assessment.prediction.price);

    let mut session = Session::new();
    if let Err(error) = session.apply(SessionEvent::PricePredicted(assessment.outcome)) {
        return CommandResult::failure("suggest", "session_transition", error.to_string(), 1);
    }

    let transition = match session.apply(SessionEvent::SuggestionsRequested) {
        Ok(transition) => transition,
        Err(error) => {
            let data = json!({
                "price": assessment.prediction.price,
                "formatted_price": formatted,
                "outcome": assessment.outcome,
                "suggestions_available": false,
                "reason": error.to_string(),
                "suggestions": [],
            });
            let message = format!("Estimated price: {formatted}. {}", assessment.outcome.message());
            return CommandResult::success("suggest", message, Some(data));
        }
    };

    let suggestions = advisor.suggest_downgrades(&selection);
    let message = if suggestions.is_empty() {
        NO_SUGGESTIONS_MESSAGE.to_string()
    } else {
        format!("{} downgrade suggestions for a {formatted} selection", suggestions.len())
    };

    let data = json!({
        "price": assessment.prediction.price,
        "formatted_price": formatted,
        "budget": assessment.budget,
        "outcome": assessment.outcome,
        "suggestions_available": true,
        "session": transition,
        "suggestions": suggestions,
    });
    CommandResult::success("suggest", message, Some(data))
}
