pub mod accounts;
pub mod catalog;
pub mod commerce;
pub mod content;
pub mod notifications;
pub mod staff;
pub mod storage;
pub mod validation;
