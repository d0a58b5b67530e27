//! Error types for the protocol layer.
//!
//! Each crate in Gameroom defines its own error enum. A `ProtocolError`
//! always means a key or payload could not be built; it never describes
//! roster or room state.

/// Errors that can occur while building protocol values.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The name contained no characters that survive key normalization
    /// (for example `"!!!"` or the empty string).
    #[error("name {0:?} does not produce a usable key")]
    EmptyKey(String),
}
