// SSE event construction for the chat stream

use std::convert::Infallible;
use warp::sse::Event;

use crate::relay::RelayEvent;

pub const MESSAGE_EVENT: &str = "message";
pub const ERROR_EVENT: &str = "error";
pub const END_EVENT: &str = "end";

/// Payload of the terminal `end` event
pub const END_PAYLOAD: &str = "done";

/// Prefix every data line with one space
///
/// SSE decoders strip a single space after `data:`, so payloads that start
/// with whitespace survive decoding unchanged.
fn data_field(payload: &str) -> String {
    format!(" {}", payload.replace('\n', "\n "))
}

/// Create a message SSE event carrying one text delta verbatim
pub fn create_message_event(text: String) -> Result<Event, Infallible> {
    Ok(Event::default().event(MESSAGE_EVENT).data(data_field(&text)))
}

/// Create an error SSE event with the failure description
pub fn create_error_event(description: String) -> Result<Event, Infallible> {
    Ok(Event::default()
        .event(ERROR_EVENT)
        .data(data_field(&description)))
}

/// Create the end SSE event that closes every turn
pub fn create_end_event() -> Result<Event, Infallible> {
    Ok(Event::default().event(END_EVENT).data(data_field(END_PAYLOAD)))
}

impl RelayEvent {
    /// Render as a named SSE event
    pub fn into_sse_event(self) -> Result<Event, Infallible> {
        match self {
            RelayEvent::Message(text) => create_message_event(text),
            RelayEvent::Error(description) => create_error_event(description),
            RelayEvent::End => create_end_event(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Event has no accessors; its Display impl is the wire format.
    fn wire(event: Result<Event, Infallible>) -> String {
        event.unwrap().to_string()
    }

    #[test]
    fn test_create_message_event() {
        let rendered = wire(create_message_event("Hel".to_string()));
        assert!(rendered.contains("event:message\n"));
        assert!(rendered.contains("data: Hel\n"));
    }

    #[test]
    fn test_message_event_keeps_whitespace() {
        let rendered = wire(create_message_event(" world ".to_string()));
        assert!(rendered.contains("data:  world \n"));
    }

    #[test]
    fn test_multiline_message_prefixes_every_line() {
        let rendered = wire(create_message_event("a\n b".to_string()));
        assert!(rendered.contains("data: a\ndata:  b\n"));
    }

    #[test]
    fn test_create_error_event() {
        let rendered = wire(create_error_event("Upstream request timed out".to_string()));
        assert!(rendered.contains("event:error\n"));
        assert!(rendered.contains("data: Upstream request timed out\n"));
    }

    #[test]
    fn test_create_end_event() {
        let rendered = wire(create_end_event());
        assert!(rendered.contains("event:end\n"));
        assert!(rendered.contains("data: done\n"));
    }

    #[test]
    fn test_relay_event_conversion() {
        assert_eq!(
            wire(RelayEvent::End.into_sse_event()),
            wire(create_end_event())
        );
        assert_eq!(
            wire(RelayEvent::Message("x".to_string()).into_sse_event()),
            wire(create_message_event("x".to_string()))
        );
    }
}
