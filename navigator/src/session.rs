use obsnav_protocol::SessionId;
use uuid::Uuid;

/// Issue a token that asks the server for a fresh, mutually consistent view.
pub fn new_session() -> SessionId {
    SessionId::from_uuid(Uuid::new_v4())
}
