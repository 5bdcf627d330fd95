pub mod process;
pub mod telemetry;
