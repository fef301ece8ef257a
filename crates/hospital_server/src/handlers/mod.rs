pub mod accounts;
pub mod departments;
pub mod health;
pub mod records;
pub mod staff;
