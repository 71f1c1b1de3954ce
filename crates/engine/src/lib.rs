pub mod formatter;
pub mod router;

pub use formatter::MessageFormatter;
pub use router::RouteTable;
