//! Request-scoped identity.

use uuid::Uuid;

use crate::token::{Claims, JwtError, TokenKind};

/// The authenticated identity bound to a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Uuid,
    pub email: String,
    pub role: String,
    pub kind: TokenKind,
}

impl Principal {
    #[must_use]
    pub fn is_refresh(&self) -> bool {
        self.kind == TokenKind::Refresh
    }
}

impl TryFrom<Claims> for Principal {
    type Error = JwtError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: claims.principal_id()?,
            email: claims.email,
            role: claims.role,
            kind: claims.kind,
        })
    }
}
