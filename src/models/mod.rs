pub mod job;
pub mod staging;
