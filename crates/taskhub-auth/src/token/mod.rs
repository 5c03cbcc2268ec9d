//! Identity token issuance and validation.

pub mod jwt;

pub use jwt::{Claims, JwtError, JwtService, SigningAlgorithm, SigningKey, TokenKind};
