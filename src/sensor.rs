/// Fake Pipsqueak sensor that emits one fixed sample per tick
use log::{error, info};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::time::{interval, Duration};

use crate::models::{SampleRecord, PIPSQUEAK_PHYSICAL_LAYER};
use crate::source::encode_sample_line;

const DEVICE_ID: [u8; 16] = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16];
const RECEIVER_ID: [u8; 16] = [16, 15, 14, 13, 12, 11, 10, 9, 8, 7, 6, 5, 4, 3, 2, 1];
const RSSI: f32 = -50.0;
const PAYLOAD: [u8; 2] = [0xAB, 0xBA];

pub const DEFAULT_SEND_INTERVAL_MS: u64 = 1000;

/// The sample the fake sensor reports on every tick
pub fn fake_sample() -> SampleRecord {
    SampleRecord {
        physical_layer: PIPSQUEAK_PHYSICAL_LAYER,
        device_id: DEVICE_ID,
        receiver_id: RECEIVER_ID,
        rssi: RSSI,
        payload: Some(PAYLOAD.to_vec()),
    }
}

/// Write the fake sample to `writer` once per `period`
///
/// Stops after `limit` samples when given, otherwise runs until a write
/// fails. Returns the number of samples sent.
pub async fn send_samples<W: AsyncWrite + Unpin>(
    writer: &mut W,
    period: Duration,
    limit: Option<u64>,
) -> Result<u64, Box<dyn std::error::Error>> {
    let mut line = encode_sample_line(&fake_sample())?;
    line.push('\n');

    let mut ticker = interval(period);
    let mut sent = 0u64;

    while limit.map_or(true, |max| sent < max) {
        ticker.tick().await;

        if let Err(e) = writer.write_all(line.as_bytes()).await {
            error!("Unable to send a sample! {}", e);
            return Err(e.into());
        }
        writer.flush().await?;

        sent += 1;
        info!("Sent {}", line.trim_end());
    }

    Ok(sent)
}
