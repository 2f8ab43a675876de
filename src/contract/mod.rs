
use core::fmt;

/// Denomination of a bid
///
/// Discriminants are the order of the strain slots within a level of the
/// bidding box, so the derived ordering is the auction's ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Strain {
    /// ♣
    Clubs,
    /// ♦
    Diamonds,
    /// ♥
    Hearts,
    /// ♠
    Spades,
    /// No trump suit
    Notrump,
}

impl Strain {
    /// Strains from lowest to highest
    pub const ALL: [Self; 5] = [
        Self::Clubs,
        Self::Diamonds,
        Self::Hearts,
        Self::Spades,
        Self::Notrump,
    ];

    /// The strain at a position of a bidding-box level
    ///
    /// Position 0 is pass and positions 6 and 7 are double and redouble, so
    /// only 1..=5 name a strain.
    #[must_use]
    pub const fn from_slot(slot: u8) -> Option<Self> {
        match slot {
            1..=5 => Some(Self::ALL[slot as usize - 1]),
            _ => None,
        }
    }

    /// Position of this strain in a bidding-box level
    #[must_use]
    pub const fn slot(self) -> u8 {
        self as u8 + 1
    }

    /// Whether this strain sets a trump suit
    #[must_use]
    pub const fn is_suit(self) -> bool {
        !self.is_notrump()
    }

    /// Whether this is notrump
    #[must_use]
    pub const fn is_notrump(self) -> bool {
        matches!(self, Self::Notrump)
    }
}

impl fmt::Display for Strain {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let symbol = ["♣", "♦", "♥", "♠", "NT"][*self as usize];
        f.write_str(symbol)
    }
}

/// A level and strain, e.g. 3NT
///
/// Field order makes the derived ordering rank by level, then strain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Bid {
    /// Odd tricks promised, 1..=7
    pub level: u8,
    /// Proposed trumps
    pub strain: Strain,
}

impl Bid {
    /// Pair a level with a strain
    ///
    /// # Panics
    /// When `level` is outside 1..=7.
    #[must_use]
    pub const fn new(level: u8, strain: Strain) -> Self {
        assert!(1 <= level && level <= 7);
        Self { level, strain }
    }
}

impl fmt::Display for Bid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.level, self.strain)
    }
}

/// What a seat may announce on its turn to bid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Call {
    /// No change to the auction
    Pass,
    /// Doubles an opposing contract bid
    Double,
    /// Redoubles an opposing double
    Redouble,
    /// Proposes a contract
    Bid(Bid),
}

impl From<Bid> for Call {
    fn from(bid: Bid) -> Self {
        Self::Bid(bid)
    }
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Bid(bid) => write!(f, "{bid}"),
            Self::Pass => f.write_str("Pass"),
            Self::Double => f.write_str("X"),
            Self::Redouble => f.write_str("XX"),
        }
    }
}

/// Doubling status of the final contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum Penalty {
    /// Undoubled
    #[default]
    None,
    /// Doubled by an opponent
    Doubled,
    /// Redoubled after a double
    Redoubled,
}

impl Penalty {
    /// Suffix used after the bid, empty when undoubled
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Doubled => "X",
            Self::Redoubled => "XX",
        }
    }
}

/// The final bid of an auction with its doubling status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Contract {
    /// Level and strain
    pub bid: Bid,
    /// Double or redouble standing at the end of the auction
    pub penalty: Penalty,
}

impl Contract {
    /// Tricks in the book, taken before odd tricks count
    pub const BOOK: u8 = 6;

    /// Build a contract from its parts
    ///
    /// # Panics
    /// When `level` is outside 1..=7.
    #[must_use]
    pub const fn new(level: u8, strain: Strain, penalty: Penalty) -> Self {
        Self {
            bid: Bid::new(level, strain),
            penalty,
        }
    }

    /// Whether a double or redouble stands
    #[must_use]
    pub const fn is_doubled(self) -> bool {
        !matches!(self.penalty, Penalty::None)
    }

    /// Tricks declarer must take
    #[must_use]
    pub const fn target(self) -> u8 {
        self.bid.level + Self::BOOK
    }

    /// Overtricks when positive, undertricks when negative
    #[must_use]
    pub const fn result(self, declarer_tricks: u8) -> i8 {
        declarer_tricks as i8 - self.target() as i8
    }
}

impl fmt::Display for Contract {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.bid, self.penalty.suffix())
    }
}
