//! Application layer containing the core business logic orchestration.
//!
//! [`orders::OrderEngine`] drives the approval lifecycle of back-office
//! orders and hands accepted ones to their domain action through a
//! [`dispatch::DispatchTable`]. [`ledger::TransferLedger`] moves money and
//! keeps the double-entry transfer ledger.

pub mod actions;
pub mod dispatch;
pub mod ledger;
pub mod orders;
