use crate::commands::{CmdMessage, CmdResult};
use crate::error::{PlaygroundError, Result};
use crate::pipeline::Render;
use crate::render::{RenderCoordinator, RenderOutcome};

/// Render `source` through the coordinator and return what it published.
pub async fn run<R: Render>(
    coordinator: &RenderCoordinator<R>,
    source: String,
) -> Result<CmdResult> {
    let (token, handle) = coordinator.submit(source);
    let outcome = handle
        .await
        .map_err(|e| PlaygroundError::Api(format!("Render task failed: {}", e)))?;

    let mut result = CmdResult::default();
    match (outcome, coordinator.latest()) {
        (RenderOutcome::Accepted, Some(rendered)) if rendered.token >= token => {
            Ok(result.with_rendered(rendered))
        }
        _ => {
            result.add_message(CmdMessage::warning(
                "Render was superseded by a newer edit.",
            ));
            Ok(result)
        }
    }
}
