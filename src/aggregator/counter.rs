/// Per-period receiver and transmitter counting
use log::debug;
use std::collections::HashMap;
use time::{Duration, OffsetDateTime};

use crate::aggregator::decoder::{decode_payload, extract_id};
use crate::models::{
    ReceiverCount, Report, SampleRecord, TemperatureState, TransmitterStatus,
    INVALID_TEMPERATURE, PIPSQUEAK_PHYSICAL_LAYER,
};

pub const DEFAULT_REPORT_INTERVAL_MS: i64 = 35_000;

/// Counts Pipsqueak samples per receiver and transmitter over a reporting period
///
/// Transmitters stay known across periods but are only reported when they were
/// heard during the current one. Receiver counts start from zero every period.
#[derive(Debug)]
pub struct SampleAggregator {
    period: Duration,
    last_flush: OffsetDateTime,
    transmitters: HashMap<i32, bool>,
    receivers: HashMap<i32, u32>,
    temperatures: HashMap<i32, TemperatureState>,
}

impl SampleAggregator {
    pub fn new(period: Duration) -> Self {
        Self::starting_at(period, OffsetDateTime::now_utc())
    }

    /// Create an aggregator whose first period begins at `start`
    pub fn starting_at(period: Duration, start: OffsetDateTime) -> Self {
        SampleAggregator {
            period,
            last_flush: start,
            transmitters: HashMap::new(),
            receivers: HashMap::new(),
            temperatures: HashMap::new(),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn ingest(&mut self, record: &SampleRecord) -> Option<Report> {
        self.ingest_at(record, OffsetDateTime::now_utc())
    }

    /// Account for one sample observed at `now`
    ///
    /// Samples from other physical layers are ignored. Returns a report when
    /// the reporting period has elapsed since the last flush.
    pub fn ingest_at(&mut self, record: &SampleRecord, now: OffsetDateTime) -> Option<Report> {
        if record.physical_layer != PIPSQUEAK_PHYSICAL_LAYER {
            debug!(
                "Ignoring sample with physical layer {}",
                record.physical_layer
            );
            return None;
        }

        let device = extract_id(&record.device_id);
        let receiver = extract_id(&record.receiver_id);

        self.transmitters.insert(device, true);
        *self.receivers.entry(receiver).or_insert(0) += 1;

        if let Some(decoded) = record.payload.as_deref().and_then(decode_payload) {
            let state = self
                .temperatures
                .entry(device)
                .or_insert(TemperatureState {
                    temperature: INVALID_TEMPERATURE,
                    on: false,
                });
            // Keep the previous temperature when the payload carries none
            if let Some(temperature) = decoded.temperature {
                state.temperature = temperature;
            }
            state.on = decoded.on;
        }

        debug!(
            "Sample {} -> {} (rssi {:.1}, payload {:?})",
            device, receiver, record.rssi, record.payload
        );

        if now - self.last_flush > self.period {
            Some(self.flush_at(now))
        } else {
            None
        }
    }

    pub fn flush(&mut self) -> Report {
        self.flush_at(OffsetDateTime::now_utc())
    }

    /// Close the current period and start a new one at `now`
    pub fn flush_at(&mut self, now: OffsetDateTime) -> Report {
        let mut active: Vec<i32> = Vec::new();
        for (id, heard) in self.transmitters.iter_mut() {
            if *heard {
                active.push(*id);
            }
            *heard = false;
        }

        let mut receivers: Vec<ReceiverCount> = self
            .receivers
            .drain()
            .filter(|(_, count)| *count > 1)
            .map(|(id, count)| ReceiverCount { id, count })
            .collect();

        active.sort_unstable();
        receivers.sort_unstable_by_key(|r| r.id);

        let transmitters = active
            .into_iter()
            .map(|id| match self.temperatures.remove(&id) {
                Some(state) => TransmitterStatus {
                    id,
                    temperature: state.temperature,
                    on: Some(state.on),
                },
                None => TransmitterStatus {
                    id,
                    temperature: INVALID_TEMPERATURE,
                    on: None,
                },
            })
            .collect();

        self.last_flush = now;

        Report {
            generated_at: now,
            receivers,
            transmitters,
        }
    }
}
