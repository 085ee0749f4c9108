//! Local invocation: `<binary> invoke [EVENT_JSON]` handles one event and
//! prints the response instead of starting the Lambda runtime loop.

use crate::error::AppError;
use crate::response::LambdaResponse;
use serde_json::Value;

pub const INVOKE_COMMAND: &str = "invoke";

/// Inspect the command-line arguments (program name excluded). Returns the
/// event to handle locally, or `None` to run under the Lambda runtime.
pub fn local_event<I, S>(args: I) -> Result<Option<Value>, AppError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut args = args.into_iter();

    match args.next() {
        None => Ok(None),
        Some(command) if command.as_ref() == INVOKE_COMMAND => {
            let event = match args.next() {
                Some(raw) => serde_json::from_str(raw.as_ref()).map_err(|e| {
                    AppError::ConfigError(anyhow::anyhow!("Invalid event JSON: {}", e))
                })?,
                None => Value::Object(Default::default()),
            };
            Ok(Some(event))
        }
        Some(other) => Err(AppError::ConfigError(anyhow::anyhow!(
            "Unknown command '{}', expected '{}'",
            other.as_ref(),
            INVOKE_COMMAND
        ))),
    }
}

pub fn print_response(response: &LambdaResponse) -> Result<(), AppError> {
    println!("{}", serde_json::to_string_pretty(response)?);
    Ok(())
}
