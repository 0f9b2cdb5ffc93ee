// HTTP routes
pub mod books;
pub mod health;

pub use books::*;
pub use health::*;
