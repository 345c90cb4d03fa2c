mod case_handler;

pub use case_handler::*;
