//! Rules engine for live contract bridge tables.
//!
//! The crate turns a stream of bid and card bytes from four seats into the
//! state of one board: the auction, the resolved contract with its declarer,
//! dummy and opening leader, and the card play with follow-suit legality and
//! dummy's turns handed to declarer.  [`Table`] is the synchronous state
//! machine, and [`spawn`] runs one on its own task behind a command queue.
#![warn(missing_docs)]

mod bid;
mod contract;
mod deal;
mod ledger;
mod play;
mod resolver;
mod seat;
mod table;

pub use bid::*;
pub use contract::*;
pub use deal::*;
pub use ledger::*;
pub use play::*;
pub use resolver::*;
pub use seat::*;
pub use table::*;
