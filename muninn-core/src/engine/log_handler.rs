//! Bridge from in-pipeline log events to the process logger.
//!
//! Components that want their messages interleaved with the event stream
//! emit `LogEvent` (or `Exception` / `RiskAlert`) events instead of
//! logging directly; this handler forwards them to `tracing` at the
//! matching level.

use super::EventHandler;
use crate::event::{keys, Event, EventType};
use tracing::{error, info, warn};

pub struct LogEventHandler;

impl LogEventHandler {
    /// Register one instance for the three loggable event kinds.
    pub fn install(engine: &crate::engine::EventEngine) {
        let handler: std::sync::Arc<dyn EventHandler> = std::sync::Arc::new(LogEventHandler);
        engine.register(EventType::LogEvent, handler.clone());
        engine.register(EventType::Exception, handler.clone());
        engine.register(EventType::RiskAlert, handler);
    }
}

impl EventHandler for LogEventHandler {
    fn name(&self) -> &str {
        "log_event_handler"
    }

    fn on_event(&self, event: &Event) -> anyhow::Result<()> {
        let module = event.payload().str_field(keys::MODULE).unwrap_or("unknown");
        let message = event.payload().str_field(keys::MESSAGE).unwrap_or("");
        let source = event.source().unwrap_or("unknown");

        match event.kind() {
            EventType::Exception => error!(module, source, "{message}"),
            EventType::RiskAlert => warn!(module, source, "{message}"),
            _ => info!(module, source, "{message}"),
        }
        Ok(())
    }
}
