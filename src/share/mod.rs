pub mod codec;
pub mod link;

pub use codec::{decode, decode_for, encode, try_decode, TOKEN_BYTES};
pub use link::ShareLink;
