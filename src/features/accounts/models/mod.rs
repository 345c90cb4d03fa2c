mod account;

pub use account::{Account, AccountRow, StudentProfile};
