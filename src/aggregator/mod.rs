pub mod counter;
pub mod decoder;

pub use counter::SampleAggregator;
