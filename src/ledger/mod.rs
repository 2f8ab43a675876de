
use crate::bid::{strain_of, BidSet, BidValue, RawBid};
use crate::contract::{Penalty, Strain};
use crate::seat::Seat;

/// Doubling classification of a bid value
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Doubling {
    /// A pass or a strain bid
    None,
    /// The double slot of a level
    Double,
    /// The redouble slot of a level
    Redouble,
}

impl Doubling {
    /// Classify a bid value by its slot in the level block
    #[must_use]
    pub const fn of(value: BidValue) -> Self {
        if value.is_redouble() {
            Self::Redouble
        } else if value.is_double() {
            Self::Double
        } else {
            Self::None
        }
    }
}

impl From<Doubling> for Penalty {
    fn from(doubling: Doubling) -> Self {
        match doubling {
            Doubling::None => Self::None,
            Doubling::Double => Self::Doubled,
            Doubling::Redouble => Self::Redoubled,
        }
    }
}

/// Order of receipt of a bid within one auction
///
/// Stamps strictly increase with every append, so comparing two stamps tells
/// which bid arrived first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Stamp(u32);

impl Stamp {
    /// The position of the stamped bid in the auction, from 0
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

/// One entry of the bidding history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BidItem {
    /// When the bid was received
    pub stamp: Stamp,
    /// The bidding seat and its bid
    pub raw: RawBid,
    /// Classification of `raw.value`, fixed at creation
    pub doubling: Doubling,
}

impl BidItem {
    /// The bidding seat
    #[must_use]
    pub const fn seat(&self) -> Seat {
        self.raw.seat
    }

    /// The bid value
    #[must_use]
    pub const fn value(&self) -> BidValue {
        self.raw.value
    }
}

/// Whether an auction is over, and whether it ended without a contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Completion {
    /// The last three entries are passes
    pub complete: bool,
    /// The last four entries are passes, so the board must be redealt
    pub reshuffle: bool,
}

/// Append-only record of one auction
///
/// Besides the entries in order of receipt, the history remembers for each
/// seat and strain the stamp of the first time that seat named that strain.
/// A recorded stamp is never overwritten until [`BiddingHistory::clear`].
#[derive(Debug, Clone, Default)]
pub struct BiddingHistory {
    items: Vec<BidItem>,
    first_bids: [[Option<Stamp>; 5]; 4],
}

impl BiddingHistory {
    /// An empty history
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a bid, returning the new entry
    pub fn append(&mut self, seat: Seat, value: BidValue) -> BidItem {
        #[allow(clippy::cast_possible_truncation)]
        let stamp = Stamp(self.items.len() as u32);
        let raw = RawBid::new(seat, value);
        let item = BidItem {
            stamp,
            raw,
            doubling: Doubling::of(value),
        };

        if let Some(strain) = strain_of(raw) {
            self.first_bids[seat as usize][strain as usize].get_or_insert(stamp);
        }

        self.items.push(item);
        item
    }

    /// Entries in order of receipt
    #[must_use]
    pub fn items(&self) -> &[BidItem] {
        &self.items
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nobody has bid yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The most recent entry
    #[must_use]
    pub fn last(&self) -> Option<&BidItem> {
        self.items.last()
    }

    /// When `seat` first named `strain` in this auction
    #[must_use]
    pub const fn first_bid(&self, seat: Seat, strain: Strain) -> Option<Stamp> {
        self.first_bids[seat as usize][strain as usize]
    }

    /// The most recent crucial entry, double or redouble included
    #[must_use]
    pub fn last_crucial(&self) -> Option<&BidItem> {
        self.items.iter().rev().find(|item| item.value().is_crucial())
    }

    /// The most recent strain bid, skipping passes, doubles and redoubles
    ///
    /// `None` means no contract has been proposed yet.
    #[must_use]
    pub fn last_crucial_non_double_bid(&self) -> Option<&BidItem> {
        self.items
            .iter()
            .rev()
            .find(|item| item.value().is_crucial() && !item.value().is_double())
    }

    /// Examine the last four entries for the end of the auction
    ///
    /// Fewer than four entries always report an open auction.
    #[must_use]
    pub fn completion(&self) -> Completion {
        let [.., fourth, third, second, last] = self.items.as_slice() else {
            return Completion::default();
        };
        let passed = |item: &BidItem| item.value().is_pass();
        let complete = passed(third) && passed(second) && passed(last);
        Completion {
            complete,
            reshuffle: complete && passed(fourth),
        }
    }

    /// Bid values `next` may not make at this point of the auction
    ///
    /// Strain bids must outrank the last strain bid.  A double is only
    /// allowed over an undoubled bid by the opponents, and a redouble only
    /// over a double by the opponents.  Passes are always allowed.
    #[must_use]
    pub fn forbidden_bids(&self, next: Seat) -> BidSet {
        let ceiling = self.last_crucial_non_double_bid().map(BidItem::value);
        let last = self.last_crucial();
        let by_opponent = last.is_some_and(|item| !item.seat().is_partner_of(next));
        let may_double = by_opponent && last.is_some_and(|item| item.doubling == Doubling::None);
        let may_redouble =
            by_opponent && last.is_some_and(|item| item.doubling == Doubling::Double);

        (1..=BidValue::MAX)
            .filter_map(BidValue::new)
            .filter(|&value| match Doubling::of(value) {
                _ if value.is_pass() => false,
                Doubling::None => ceiling.is_some_and(|ceiling| value <= ceiling),
                Doubling::Double => !may_double,
                Doubling::Redouble => !may_redouble,
            })
            .collect()
    }

    /// Forget every entry and every first-bid stamp
    pub fn clear(&mut self) {
        self.items.clear();
        self.first_bids = Default::default();
    }
}
