//! Domain model: records, money, the specification engine and the ports the
//! application layer depends on.

pub mod account;
pub mod back_office;
pub mod order;
pub mod ports;
pub mod specification;
pub mod transfer;
