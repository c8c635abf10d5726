//! The messaging client: session handshake, bounded-retry sends, and the
//! inbound queue boundary.
//!
//! The thread/task boundary of live mode sits at the transport: inbound
//! frames are posted onto an in-process channel and drained on the engine's
//! thread via [`MessagingClient::poll_inbound`]. Handlers must not block.

use std::fmt;
use std::sync::mpsc::{channel, Receiver, Sender};

use chrono::Duration;
use tracing::warn;
use uuid::Uuid;

use super::compression::Compressor;
use super::frames::{MessageFrames, MessageType};
use super::messages::{Connect, Disconnect, Request, RequestSerializer, Response,
    ResponseSerializer};
use crate::clock::{Clock, TimeEventHandler};
use crate::error::TradingError;
use crate::events::Event;
use crate::identifiers::{ClientId, SessionId, UuidFactory};
use crate::serialization::EventSerializer;

const SEND_RETRIES: u32 = 3;
const CONNECTION_TIMEOUT_SECS: i64 = 2;

/// Transport over which frames travel. Implementations may block; the core
/// only calls them from the messaging boundary.
pub trait MessageTransport: fmt::Debug {
    fn send(&mut self, frames: &MessageFrames) -> Result<(), TradingError>;
}

/// A messaging client over a frame transport.
pub struct MessagingClient {
    client_id: ClientId,
    authentication: String,
    transport: Box<dyn MessageTransport>,
    compressor: Box<dyn Compressor>,
    requests: RequestSerializer,
    responses: ResponseSerializer,
    events: EventSerializer,
    session_id: Option<SessionId>,
    pending_connect: Option<Uuid>,
    uuids: UuidFactory,
    inbound_tx: Sender<MessageFrames>,
    inbound_rx: Receiver<MessageFrames>,
}

impl fmt::Debug for MessagingClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessagingClient")
            .field("client_id", &self.client_id)
            .field("session_id", &self.session_id)
            .finish()
    }
}

impl MessagingClient {
    pub fn new(
        client_id: ClientId,
        authentication: impl Into<String>,
        transport: Box<dyn MessageTransport>,
        compressor: Box<dyn Compressor>,
    ) -> Self {
        let (inbound_tx, inbound_rx) = channel();
        Self {
            client_id,
            authentication: authentication.into(),
            transport,
            compressor,
            requests: RequestSerializer::new(),
            responses: ResponseSerializer::new(),
            events: EventSerializer::new(),
            session_id: None,
            pending_connect: None,
            uuids: UuidFactory::random(),
            inbound_tx,
            inbound_rx,
        }
    }

    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    pub fn is_connected(&self) -> bool {
        self.session_id.is_some()
    }

    /// The sender half of the inbound queue, for the transport's reader
    /// thread.
    pub fn inbound_sender(&self) -> Sender<MessageFrames> {
        self.inbound_tx.clone()
    }

    /// Begin the session handshake, arming a timeout alert two seconds out
    /// on the given clock to detect a lost connection.
    pub fn connect(&mut self, clock: &mut dyn Clock) -> Result<(), TradingError> {
        let request = Connect {
            client_id: self.client_id.clone(),
            authentication: self.authentication.clone(),
            id: self.uuids.generate(),
            timestamp: clock.time_now(),
        };
        self.pending_connect = Some(request.id);
        clock.set_time_alert(
            &format!("connect-timeout-{}", request.id),
            request.timestamp + Duration::seconds(CONNECTION_TIMEOUT_SECS),
            Some(TimeEventHandler::OwnerEvent),
        )?;
        let body = self.requests.serialize(&Request::Connect(request));
        let frames = MessageFrames::pack(
            MessageType::Request,
            "Connect",
            &body,
            self.compressor.as_ref(),
        );
        self.send_with_retry(&frames)
    }

    /// Begin the symmetric disconnect handshake.
    pub fn disconnect(&mut self, clock: &dyn Clock) -> Result<(), TradingError> {
        let request = Disconnect {
            client_id: self.client_id.clone(),
            authentication: self.authentication.clone(),
            id: self.uuids.generate(),
            timestamp: clock.time_now(),
        };
        let body = self.requests.serialize(&Request::Disconnect(request));
        let frames = MessageFrames::pack(
            MessageType::Request,
            "Disconnect",
            &body,
            self.compressor.as_ref(),
        );
        self.send_with_retry(&frames)
    }

    /// Whether the connect handshake is still awaiting its reply.
    pub fn is_awaiting_connection(&self) -> bool {
        self.pending_connect.is_some()
    }

    /// Send frames, retrying up to three times before giving up.
    ///
    /// A bounded loop, deliberately not recursion.
    pub fn send_with_retry(&mut self, frames: &MessageFrames) -> Result<(), TradingError> {
        let mut last_error = None;
        for attempt in 1..=SEND_RETRIES {
            match self.transport.send(frames) {
                Ok(()) => return Ok(()),
                Err(e) => {
                    warn!(client = %self.client_id, attempt, error = %e, "send failed");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| {
            TradingError::Transport("send failed with no recorded error".to_string())
        }))
    }

    /// Drain the inbound queue, decoding events and handshake responses.
    ///
    /// Serialization failures propagate; they indicate a broken peer rather
    /// than a recoverable per-event condition.
    pub fn poll_inbound(&mut self) -> Result<Vec<Event>, TradingError> {
        let mut events = Vec::new();
        while let Ok(frames) = self.inbound_rx.try_recv() {
            let (message_type, type_name, body) = frames.unpack(self.compressor.as_ref())?;
            match message_type {
                MessageType::Response => match self.responses.deserialize(&body)? {
                    Response::Connected(connected) => {
                        if self.pending_connect == Some(connected.correlation_id) {
                            self.pending_connect = None;
                            self.session_id = Some(connected.session_id);
                        } else {
                            warn!(client = %self.client_id, "uncorrelated Connected response");
                        }
                    }
                    Response::Disconnected(_) => {
                        self.session_id = None;
                    }
                    Response::Data(_) => {
                        warn!(client = %self.client_id, "unsolicited data response dropped");
                    }
                },
                MessageType::String => {
                    events.push(self.events.deserialize(&body)?);
                }
                MessageType::Request => {
                    warn!(
                        client = %self.client_id,
                        type_name, "unexpected inbound request dropped"
                    );
                }
            }
        }
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::TestClock;
    use crate::identifiers::{AccountId, OrderId, ServerId};
    use crate::messaging::{BypassCompressor, Connected};
    use crate::orders::{OrderEventAny, OrderSubmitted};
    use chrono::{TimeZone, Utc};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Default)]
    struct RecordingTransport {
        sent: Rc<RefCell<Vec<MessageFrames>>>,
        failures_remaining: Rc<RefCell<u32>>,
    }

    impl MessageTransport for RecordingTransport {
        fn send(&mut self, frames: &MessageFrames) -> Result<(), TradingError> {
            let mut failures = self.failures_remaining.borrow_mut();
            if *failures > 0 {
                *failures -= 1;
                return Err(TradingError::Transport("socket closed".to_string()));
            }
            self.sent.borrow_mut().push(frames.clone());
            Ok(())
        }
    }

    fn client_with_failures(failures: u32) -> (MessagingClient, Rc<RefCell<Vec<MessageFrames>>>) {
        let sent = Rc::new(RefCell::new(Vec::new()));
        let transport = RecordingTransport {
            sent: sent.clone(),
            failures_remaining: Rc::new(RefCell::new(failures)),
        };
        let client = MessagingClient::new(
            ClientId::from("Trader-001"),
            "token",
            Box::new(transport),
            Box::new(BypassCompressor),
        );
        (client, sent)
    }

    #[test]
    fn connect_sends_and_arms_timeout() {
        let (mut client, sent) = client_with_failures(0);
        let mut clock = TestClock::new(Utc.timestamp_opt(0, 0).unwrap());
        client.connect(&mut clock).unwrap();

        assert_eq!(sent.borrow().len(), 1);
        assert!(client.is_awaiting_connection());
        assert!(!client.is_connected());
        // The timeout alert sits two seconds out.
        assert_eq!(
            clock.next_event_time(),
            Some(Utc.timestamp_opt(2, 0).unwrap())
        );
    }

    #[test]
    fn connected_response_establishes_the_session() {
        let (mut client, sent) = client_with_failures(0);
        let mut clock = TestClock::new(Utc.timestamp_opt(0, 0).unwrap());
        client.connect(&mut clock).unwrap();

        // Recover the connect id from the sent frame to correlate the reply.
        let sent_frames = sent.borrow()[0].clone();
        let (_, _, body) = sent_frames.unpack(&BypassCompressor).unwrap();
        let request = RequestSerializer::new().deserialize(&body).unwrap();

        let response = Response::Connected(Connected {
            message: "session established".to_string(),
            server_id: ServerId::from("Server-000"),
            session_id: SessionId::from("Session-7"),
            correlation_id: request.id(),
            id: Uuid::from_u128(9),
            timestamp: Utc.timestamp_opt(0, 0).unwrap(),
        });
        let frames = MessageFrames::pack(
            MessageType::Response,
            "Connected",
            &ResponseSerializer::new().serialize(&response),
            &BypassCompressor,
        );
        client.inbound_sender().send(frames).unwrap();

        let events = client.poll_inbound().unwrap();
        assert!(events.is_empty());
        assert!(client.is_connected());
        assert_eq!(client.session_id().unwrap().as_str(), "Session-7");
        assert!(!client.is_awaiting_connection());
    }

    #[test]
    fn send_retries_up_to_three_times() {
        // Two failures then success: succeeds on the third attempt.
        let (mut client, sent) = client_with_failures(2);
        let frames = MessageFrames::pack(
            MessageType::String,
            "OrderSubmitted",
            b"x",
            &BypassCompressor,
        );
        client.send_with_retry(&frames).unwrap();
        assert_eq!(sent.borrow().len(), 1);

        // Three failures: gives up with a transport error.
        let (mut client, _) = client_with_failures(3);
        assert!(matches!(
            client.send_with_retry(&frames),
            Err(TradingError::Transport(_))
        ));
    }

    #[test]
    fn inbound_events_are_decoded() {
        let (mut client, _) = client_with_failures(0);
        let event = Event::Order(OrderEventAny::Submitted(OrderSubmitted {
            order_id: OrderId::from("O-1"),
            account_id: AccountId::from("FXCM-123456"),
            submitted_time: Utc.timestamp_opt(0, 0).unwrap(),
            id: Uuid::from_u128(5),
            timestamp: Utc.timestamp_opt(0, 0).unwrap(),
        }));
        let body = EventSerializer::new().serialize(&event).unwrap();
        let frames = MessageFrames::pack(
            MessageType::String,
            "OrderSubmitted",
            &body,
            &BypassCompressor,
        );
        client.inbound_sender().send(frames).unwrap();

        let events = client.poll_inbound().unwrap();
        assert_eq!(events.len(), 1);
        match &events[0] {
            Event::Order(OrderEventAny::Submitted(e)) => {
                assert_eq!(e.order_id.as_str(), "O-1");
            }
            other => panic!("expected a submitted event, got {other:?}"),
        }
    }
}
