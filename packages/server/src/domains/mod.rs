// Business domains
pub mod books;
pub mod inventory;
