pub mod action;
pub mod company;
pub mod conversation;
