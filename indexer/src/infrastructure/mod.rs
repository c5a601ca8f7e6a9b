pub mod persistence;
pub mod telemetry;
pub mod tzkt;
pub mod web;
