pub mod connectivity;
pub mod observer;
pub mod storage;
