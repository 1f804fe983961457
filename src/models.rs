use time::OffsetDateTime;

/// Physical layer value carried by Pipsqueak tags
pub const PIPSQUEAK_PHYSICAL_LAYER: u8 = 1;

/// Temperature reported when nothing valid has been decoded (°C)
pub const INVALID_TEMPERATURE: f32 = -274.0;

#[derive(Debug, Clone, PartialEq)]
pub struct SampleRecord {
    pub physical_layer: u8,
    pub device_id: [u8; 16],
    pub receiver_id: [u8; 16],
    pub rssi: f32,
    pub payload: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureState {
    pub temperature: f32,
    pub on: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiverCount {
    pub id: i32,
    pub count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransmitterStatus {
    pub id: i32,
    pub temperature: f32,
    /// `None` when no payload was decoded for the device this period
    pub on: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub generated_at: OffsetDateTime,
    pub receivers: Vec<ReceiverCount>,
    pub transmitters: Vec<TransmitterStatus>,
}
