pub mod gelf;
pub mod logging;
pub mod shutdown;
