use crate::error::TransportError;
use async_trait::async_trait;

/// Supplies the bearer token sent as the `token` query parameter.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn token(&self) -> Result<Option<String>, TransportError>;
}

/// Connects without a token.
pub struct NoToken;

#[async_trait]
impl TokenProvider for NoToken {
    async fn token(&self) -> Result<Option<String>, TransportError> {
        Ok(None)
    }
}

pub struct FixedToken(pub String);

#[async_trait]
impl TokenProvider for FixedToken {
    async fn token(&self) -> Result<Option<String>, TransportError> {
        Ok(Some(self.0.clone()))
    }
}
