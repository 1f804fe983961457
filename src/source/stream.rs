/// Newline-delimited JSON sample feed
use log::{debug, info, warn};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Split};
use tokio::net::TcpStream;
use tokio::time::{timeout, Duration};

use super::{SampleSource, SourceError};
use crate::models::SampleRecord;

/// One sample as it appears on the wire
///
/// Identifiers are 32 hex characters (16 bytes); the payload is an optional
/// hex string of any even length.
#[derive(Debug, Serialize, Deserialize)]
struct SampleLine {
    physical_layer: u8,
    #[serde(with = "hex::serde")]
    device_id: [u8; 16],
    #[serde(with = "hex::serde")]
    receiver_id: [u8; 16],
    #[serde(default)]
    rssi: f32,
    #[serde(
        default,
        deserialize_with = "deserialize_payload",
        serialize_with = "serialize_payload",
        skip_serializing_if = "Option::is_none"
    )]
    payload: Option<Vec<u8>>,
}

fn deserialize_payload<'de, D>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error>
where
    D: Deserializer<'de>,
{
    let text: Option<String> = Option::deserialize(deserializer)?;
    text.map(|t| hex::decode(t).map_err(serde::de::Error::custom))
        .transpose()
}

fn serialize_payload<S>(payload: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match payload {
        Some(bytes) => serializer.serialize_some(&hex::encode(bytes)),
        None => serializer.serialize_none(),
    }
}

/// Parse a single JSON line into a sample record
///
/// Takes raw bytes so that invalid UTF-8 is reported as a parse error of this
/// line only.
pub fn parse_sample_line(line: &[u8]) -> Result<SampleRecord, serde_json::Error> {
    let parsed: SampleLine = serde_json::from_slice(line)?;
    Ok(SampleRecord {
        physical_layer: parsed.physical_layer,
        device_id: parsed.device_id,
        receiver_id: parsed.receiver_id,
        rssi: parsed.rssi,
        payload: parsed.payload,
    })
}

/// Render a sample record as one JSON line, without the trailing newline
pub fn encode_sample_line(record: &SampleRecord) -> Result<String, serde_json::Error> {
    serde_json::to_string(&SampleLine {
        physical_layer: record.physical_layer,
        device_id: record.device_id,
        receiver_id: record.receiver_id,
        rssi: record.rssi,
        payload: record.payload.clone(),
    })
}

pub struct JsonLineSource<R> {
    lines: Split<R>,
    line_number: u64,
}

impl<R: AsyncBufRead + Unpin> JsonLineSource<R> {
    pub fn new(reader: R) -> Self {
        JsonLineSource {
            lines: reader.split(b'\n'),
            line_number: 0,
        }
    }
}

impl<R: AsyncBufRead + Unpin> SampleSource for JsonLineSource<R> {
    async fn next_sample(&mut self) -> Result<Option<SampleRecord>, SourceError> {
        while let Some(line) = self.lines.next_segment().await? {
            self.line_number += 1;
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            match parse_sample_line(&line) {
                Ok(record) => return Ok(Some(record)),
                Err(e) => {
                    // One bad record must not end the feed
                    warn!("Skipping malformed sample on line {}: {}", self.line_number, e);
                }
            }
        }

        debug!("Sample feed ended after {} lines", self.line_number);
        Ok(None)
    }
}

/// Open a TCP connection to the aggregator, giving up after `connect_timeout`
pub async fn open_stream(
    host: &str,
    port: u16,
    connect_timeout: Duration,
) -> Result<TcpStream, SourceError> {
    let address = format!("{}:{}", host, port);

    let stream = match timeout(connect_timeout, TcpStream::connect((host, port))).await {
        Ok(stream) => stream?,
        Err(_) => {
            return Err(SourceError::ConnectTimeout {
                address,
                seconds: connect_timeout.as_secs(),
            })
        }
    };

    info!("Connected to aggregator at {}", address);
    Ok(stream)
}

/// Connect to an aggregator feed and read samples from it
pub async fn connect(
    host: &str,
    port: u16,
    connect_timeout: Duration,
) -> Result<JsonLineSource<BufReader<TcpStream>>, SourceError> {
    let stream = open_stream(host, port, connect_timeout).await?;
    Ok(JsonLineSource::new(BufReader::new(stream)))
}
