//! Protocol level types shared by both directions of a chunked body.
//!
//! - **Items** ([`message`]): [`PayloadItem`] is what the encoder consumes and the
//!   decoder produces, [`DecodePhase`] is the decoder progress as seen from outside.
//! - **Errors** ([`error`]): [`DecodeError`] for malformed or truncated input,
//!   [`ParseError`] for the reading direction, [`SendError`] for the writing direction.

mod message;
pub use message::DecodePhase;
pub use message::PayloadItem;

mod error;
pub use error::DecodeError;
pub use error::ParseError;
pub use error::SendError;
