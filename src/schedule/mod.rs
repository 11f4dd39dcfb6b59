pub mod allocator;
pub mod model;
pub mod parser;
pub mod resolver;
pub mod session;
