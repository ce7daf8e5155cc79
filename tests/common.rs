use std::sync::Once;

use chatrelay::core::wire::{decode_frame, ServerFrame};
use tokio::io::{AsyncRead, AsyncReadExt};

#[allow(dead_code)]
pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        chatrelay::logging::init_logging();
    });
}

/// Reads one length-prefixed frame from `r` and decodes it.
#[allow(dead_code)]
pub async fn read_frame<R: AsyncRead + Unpin>(r: &mut R) -> ServerFrame {
    let mut len_buf = [0u8; 4];
    r.read_exact(&mut len_buf).await.expect("frame length");
    let len = u32::from_be_bytes(len_buf) as usize;
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf).await.expect("frame payload");
    decode_frame(&buf).expect("frame decode")
}
