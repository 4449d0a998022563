//! Check command - run the reason validator on a piece of text.

use anyhow::Result;
use mindful_config::Config;
use mindful_reason::ReasonValidator;

use crate::theme::Theme;

/// Validate `text` with the configured thresholds and print the verdict.
/// Returns whether it was accepted.
pub(crate) fn run_check(config: &Config, text: &str) -> Result<bool> {
    let validator = ReasonValidator::new(mindful_cli::config_bridge::to_validator_config(
        &config.validator,
    ))?;
    let verdict = validator.validate(text);

    if verdict.valid {
        println!("{}", Theme::success("Reason accepted"));
    } else {
        for error in &verdict.errors {
            println!("{}", Theme::error(error));
        }
        if let Some(rejection) = verdict.rejection {
            println!("{}", Theme::dimmed(&format!("  rule: {rejection:?}")));
        }
    }
    Ok(verdict.valid)
}
