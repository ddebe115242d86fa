pub mod json;
pub mod line_protocol;

pub use json::JsonFormatter;
pub use line_protocol::LineProtocolFormatter;
