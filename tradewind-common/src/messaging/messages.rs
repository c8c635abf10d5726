//! Session and data request/response messages with their serializers.
//!
//! The handshake is symmetric: `Connect`/`Connected` to establish a
//! session, `Disconnect`/`Disconnected` to end it. Responses echo the
//! request id as their correlation id.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::TradingError;
use crate::identifiers::{ClientId, ServerId, SessionId};
use crate::serialization::{format_timestamp, keys, parse_timestamp, ObjectMap};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connect {
    pub client_id: ClientId,
    pub authentication: String,
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connected {
    pub message: String,
    pub server_id: ServerId,
    pub session_id: SessionId,
    pub correlation_id: Uuid,
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disconnect {
    pub client_id: ClientId,
    pub authentication: String,
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disconnected {
    pub message: String,
    pub server_id: ServerId,
    pub session_id: SessionId,
    pub correlation_id: Uuid,
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRequest {
    pub query: String,
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataResponse {
    pub data: Vec<u8>,
    pub data_type: String,
    pub data_encoding: String,
    pub correlation_id: Uuid,
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
}

/// Tagged union over requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Connect(Connect),
    Disconnect(Disconnect),
    Data(DataRequest),
}

impl Request {
    pub fn type_name(&self) -> &'static str {
        match self {
            Request::Connect(_) => "Connect",
            Request::Disconnect(_) => "Disconnect",
            Request::Data(_) => "DataRequest",
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Request::Connect(r) => r.id,
            Request::Disconnect(r) => r.id,
            Request::Data(r) => r.id,
        }
    }
}

/// Tagged union over responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Connected(Connected),
    Disconnected(Disconnected),
    Data(DataResponse),
}

impl Response {
    pub fn type_name(&self) -> &'static str {
        match self {
            Response::Connected(_) => "Connected",
            Response::Disconnected(_) => "Disconnected",
            Response::Data(_) => "DataResponse",
        }
    }

    pub fn correlation_id(&self) -> Uuid {
        match self {
            Response::Connected(r) => r.correlation_id,
            Response::Disconnected(r) => r.correlation_id,
            Response::Data(r) => r.correlation_id,
        }
    }
}

fn parse_uuid(value: &str) -> Result<Uuid, TradingError> {
    Uuid::parse_str(value)
        .map_err(|e| TradingError::Serialization(format!("cannot parse uuid '{value}': {e}")))
}

#[derive(Debug, Clone, Default)]
pub struct RequestSerializer;

impl RequestSerializer {
    pub fn new() -> Self {
        Self
    }

    pub fn serialize(&self, request: &Request) -> Vec<u8> {
        let mut map = ObjectMap::new();
        map.put(keys::TYPE, request.type_name());
        map.put(keys::ID, request.id().to_string());
        match request {
            Request::Connect(r) => {
                map.put(keys::CLIENT_ID, r.client_id.as_str());
                map.put(keys::AUTHENTICATION, r.authentication.as_str());
                map.put(keys::TIMESTAMP, format_timestamp(r.timestamp));
            }
            Request::Disconnect(r) => {
                map.put(keys::CLIENT_ID, r.client_id.as_str());
                map.put(keys::AUTHENTICATION, r.authentication.as_str());
                map.put(keys::TIMESTAMP, format_timestamp(r.timestamp));
            }
            Request::Data(r) => {
                map.put(keys::QUERY, r.query.as_str());
                map.put(keys::TIMESTAMP, format_timestamp(r.timestamp));
            }
        }
        map.encode()
    }

    pub fn deserialize(&self, bytes: &[u8]) -> Result<Request, TradingError> {
        let map = ObjectMap::decode(bytes)?;
        let id = parse_uuid(map.get_str(keys::ID)?)?;
        let timestamp = parse_timestamp(map.get_str(keys::TIMESTAMP)?)?;
        match map.get_str(keys::TYPE)? {
            "Connect" => Ok(Request::Connect(Connect {
                client_id: ClientId::from(map.get_str(keys::CLIENT_ID)?),
                authentication: map.get_str(keys::AUTHENTICATION)?.to_string(),
                id,
                timestamp,
            })),
            "Disconnect" => Ok(Request::Disconnect(Disconnect {
                client_id: ClientId::from(map.get_str(keys::CLIENT_ID)?),
                authentication: map.get_str(keys::AUTHENTICATION)?.to_string(),
                id,
                timestamp,
            })),
            "DataRequest" => Ok(Request::Data(DataRequest {
                query: map.get_str(keys::QUERY)?.to_string(),
                id,
                timestamp,
            })),
            other => Err(TradingError::Serialization(format!(
                "unknown request type '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResponseSerializer;

impl ResponseSerializer {
    pub fn new() -> Self {
        Self
    }

    pub fn serialize(&self, response: &Response) -> Vec<u8> {
        let mut map = ObjectMap::new();
        map.put(keys::TYPE, response.type_name());
        map.put(keys::CORRELATION_ID, response.correlation_id().to_string());
        match response {
            Response::Connected(r) => {
                map.put(keys::MESSAGE, r.message.as_str());
                map.put(keys::SERVER_ID, r.server_id.as_str());
                map.put(keys::SESSION_ID, r.session_id.as_str());
                map.put(keys::ID, r.id.to_string());
                map.put(keys::TIMESTAMP, format_timestamp(r.timestamp));
            }
            Response::Disconnected(r) => {
                map.put(keys::MESSAGE, r.message.as_str());
                map.put(keys::SERVER_ID, r.server_id.as_str());
                map.put(keys::SESSION_ID, r.session_id.as_str());
                map.put(keys::ID, r.id.to_string());
                map.put(keys::TIMESTAMP, format_timestamp(r.timestamp));
            }
            Response::Data(r) => {
                map.put_bytes(keys::DATA, r.data.clone());
                map.put(keys::DATA_TYPE, r.data_type.as_str());
                map.put(keys::DATA_ENCODING, r.data_encoding.as_str());
                map.put(keys::ID, r.id.to_string());
                map.put(keys::TIMESTAMP, format_timestamp(r.timestamp));
            }
        }
        map.encode()
    }

    pub fn deserialize(&self, bytes: &[u8]) -> Result<Response, TradingError> {
        let map = ObjectMap::decode(bytes)?;
        let id = parse_uuid(map.get_str(keys::ID)?)?;
        let correlation_id = parse_uuid(map.get_str(keys::CORRELATION_ID)?)?;
        let timestamp = parse_timestamp(map.get_str(keys::TIMESTAMP)?)?;
        match map.get_str(keys::TYPE)? {
            "Connected" => Ok(Response::Connected(Connected {
                message: map.get_str(keys::MESSAGE)?.to_string(),
                server_id: ServerId::from(map.get_str(keys::SERVER_ID)?),
                session_id: SessionId::from(map.get_str(keys::SESSION_ID)?),
                correlation_id,
                id,
                timestamp,
            })),
            "Disconnected" => Ok(Response::Disconnected(Disconnected {
                message: map.get_str(keys::MESSAGE)?.to_string(),
                server_id: ServerId::from(map.get_str(keys::SERVER_ID)?),
                session_id: SessionId::from(map.get_str(keys::SESSION_ID)?),
                correlation_id,
                id,
                timestamp,
            })),
            "DataResponse" => Ok(Response::Data(DataResponse {
                data: map.get_bytes(keys::DATA)?.to_vec(),
                data_type: map.get_str(keys::DATA_TYPE)?.to_string(),
                data_encoding: map.get_str(keys::DATA_ENCODING)?.to_string(),
                correlation_id,
                id,
                timestamp,
            })),
            other => Err(TradingError::Serialization(format!(
                "unknown response type '{other}'"
            ))),
        }
    }
}
