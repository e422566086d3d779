// Utils module - Utility functions

pub mod network;
pub mod retry;
