pub mod conversation;
pub mod extraction;
pub mod filter;
pub mod validation;
