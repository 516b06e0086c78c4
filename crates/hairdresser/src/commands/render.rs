use tracing::debug;

use super::{Settings, Stack};
use crate::error::CliError;
use crate::output;

pub fn handle(stack: &Stack, settings: &Settings) -> Result<(), CliError> {
    let markup = stack.hairdresser.render_to_string()?;
    debug!(bytes = markup.len(), "head rendered");
    output::print_output(&markup, settings.quiet);
    Ok(())
}
