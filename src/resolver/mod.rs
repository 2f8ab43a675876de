
use crate::bid::strain_of;
use crate::contract::{Contract, Penalty, Strain};
use crate::ledger::{BidItem, BiddingHistory, Doubling};
use crate::seat::Seat;
use thiserror::Error;

/// Error raised when resolving a contract before the auction is over
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("resolution requested on an unsettled auction")]
pub struct UnsettledAuction;

/// Who plays what after the auction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Declaration {
    /// The final contract, including its penalty
    pub contract: Contract,
    /// The seat that made the final contract bid
    pub bidder: Seat,
    /// The partner who first named the trump strain
    pub declarer: Seat,
    /// Declarer's partner, whose hand declarer plays
    pub dummy: Seat,
    /// The opponent on declarer's left, who makes the opening lead
    pub lead: Seat,
    /// The other opponent
    pub defender: Seat,
}

impl Declaration {
    /// The trump strain
    #[must_use]
    pub const fn strain(&self) -> Strain {
        self.contract.bid.strain
    }

    /// The seat whose decisions play `seat`'s cards
    #[must_use]
    pub fn controller(&self, seat: Seat) -> Seat {
        if seat == self.dummy {
            self.declarer
        } else {
            seat
        }
    }
}

/// Work out declarer and contract from a completed auction
///
/// Declarer is whichever of the contract bidder and partner named the trump
/// strain first, which is not necessarily the seat that made the last bid.
///
/// # Errors
/// Fails when the auction is still open, ended in four passes, or never
/// produced a strain bid.
pub fn resolve(history: &BiddingHistory) -> Result<Declaration, UnsettledAuction> {
    let completion = history.completion();
    if !completion.complete || completion.reshuffle {
        return Err(UnsettledAuction);
    }

    let mut penalty = None;
    let mut crucial = history
        .items()
        .iter()
        .rev()
        .filter(|item| item.value().is_crucial());

    let item: &BidItem = loop {
        let item = crucial.next().ok_or(UnsettledAuction)?;
        match item.doubling {
            Doubling::None => break item,
            doubling => {
                penalty.get_or_insert(Penalty::from(doubling));
            }
        }
    };

    let Some(strain) = strain_of(item.raw) else {
        unreachable!("contract bid {} names no strain", item.value());
    };
    let contract = Contract::new(item.value().level(), strain, penalty.unwrap_or_default());

    let bidder = item.seat();
    let partner = bidder.partner();
    let declarer = match (
        history.first_bid(bidder, strain),
        history.first_bid(partner, strain),
    ) {
        (Some(ours), Some(theirs)) if theirs < ours => partner,
        (None, Some(_)) => partner,
        (Some(_), _) => bidder,
        (None, None) => {
            tracing::warn!(%bidder, %strain, "no first bid recorded for contract strain");
            bidder
        }
    };
    let lead = declarer.opening_lead();

    Ok(Declaration {
        contract,
        bidder,
        declarer,
        dummy: declarer.partner(),
        lead,
        defender: lead.partner(),
    })
}
