use consult_core::RoomId;

/// Checks the bearer credential a client presents when opening its socket.
/// Token issuance lives with the external auth provider.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, room: &RoomId, token: Option<&str>) -> bool;
}

pub struct AllowAnyToken;

impl TokenVerifier for AllowAnyToken {
    fn verify(&self, _room: &RoomId, _token: Option<&str>) -> bool {
        true
    }
}

/// Accepts exactly one shared token.
pub struct StaticToken(pub String);

impl TokenVerifier for StaticToken {
    fn verify(&self, _room: &RoomId, token: Option<&str>) -> bool {
        token == Some(self.0.as_str())
    }
}
