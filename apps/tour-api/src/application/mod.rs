// Declare sub-modules within the application layer
pub mod errors;
pub mod middleware;
pub mod tours;
