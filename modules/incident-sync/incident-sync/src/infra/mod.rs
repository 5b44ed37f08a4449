pub mod secrets;
pub mod storage;
pub mod transport;
