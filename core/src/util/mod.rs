mod ring_bytes;
mod transcript;

pub use ring_bytes::RingBytes;
pub use transcript::append_bounded;
