#[cfg(feature = "sqs")]
pub mod sqs;
