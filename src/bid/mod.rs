
use crate::contract::{Bid, Call, Strain};
use crate::seat::Seat;
use core::fmt;
use core::num::NonZeroU8;
use core::ops::{BitOr, Not};
use once_cell::sync::Lazy;
use thiserror::Error;

/// Number of codes in one bid level: pass, five strains, double, redouble
const LEVEL_WIDTH: u8 = 8;

/// Slot of double and redouble in a level block
const DOUBLE_SLOT: u8 = 6;
const REDOUBLE_SLOT: u8 = 7;

/// A bid value as it appears on the bidding box
///
/// Values run from 1 to 56 in seven blocks of eight, one block per level.
/// Each block holds pass, the five strains in ascending order, double, and
/// redouble.  The unset value 0 has no representation here; use
/// `Option<BidValue>` where "not yet bid" is meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BidValue(NonZeroU8);

impl BidValue {
    /// The largest valid bid value, the level-7 redouble
    pub const MAX: u8 = 7 * LEVEL_WIDTH;

    /// The canonical pass, the pass slot of level 1
    pub const PASS: Self = Self::from_slot(1, 0);

    /// Create a bid value, rejecting the unset value and anything past
    /// [`BidValue::MAX`]
    #[must_use]
    pub const fn new(value: u8) -> Option<Self> {
        match NonZeroU8::new(value) {
            Some(value) if value.get() <= Self::MAX => Some(Self(value)),
            _ => None,
        }
    }

    const fn from_slot(level: u8, slot: u8) -> Self {
        assert!(level >= 1 && level <= 7 && slot < LEVEL_WIDTH);
        match NonZeroU8::new((level - 1) * LEVEL_WIDTH + slot + 1) {
            Some(value) => Self(value),
            None => unreachable!(),
        }
    }

    /// Encode a call announced at the given level of the bidding box
    ///
    /// The level of a contract bid is taken from the bid itself.
    ///
    /// # Panics
    /// Panics if the level is not in 1..=7.
    #[must_use]
    pub const fn from_call(call: Call, level: u8) -> Self {
        match call {
            Call::Pass => Self::from_slot(level, 0),
            Call::Double => Self::from_slot(level, DOUBLE_SLOT),
            Call::Redouble => Self::from_slot(level, REDOUBLE_SLOT),
            Call::Bid(bid) => Self::from_slot(bid.level, bid.strain.slot()),
        }
    }

    /// The raw value in 1..=56
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0.get()
    }

    /// The level block this value lives in, 1..=7
    #[must_use]
    pub const fn level(self) -> u8 {
        (self.get() - 1) / LEVEL_WIDTH + 1
    }

    const fn slot(self) -> u8 {
        (self.get() - 1) % LEVEL_WIDTH
    }

    /// Whether this value is the pass slot of its level
    #[must_use]
    pub const fn is_pass(self) -> bool {
        self.slot() == 0
    }

    /// Whether this value is a double or a redouble
    #[must_use]
    pub const fn is_double(self) -> bool {
        self.slot() >= DOUBLE_SLOT
    }

    /// Whether this value is a redouble
    #[must_use]
    pub const fn is_redouble(self) -> bool {
        self.slot() == REDOUBLE_SLOT
    }

    /// Whether this value changes the auction: a strain bid, a double, or a
    /// redouble
    #[must_use]
    pub const fn is_crucial(self) -> bool {
        !self.is_pass()
    }

    /// The strain named by this value, if it is a strain bid
    #[must_use]
    pub const fn strain(self) -> Option<Strain> {
        Strain::from_slot(self.slot())
    }

    /// The call this value stands for
    #[must_use]
    pub const fn call(self) -> Call {
        match self.strain() {
            Some(strain) => Call::Bid(Bid::new(self.level(), strain)),
            None if self.is_pass() => Call::Pass,
            None if self.is_redouble() => Call::Redouble,
            None => Call::Double,
        }
    }
}

impl From<Bid> for BidValue {
    /// # Panics
    /// When the level was set outside 1..=7 after [`Bid::new`].
    fn from(bid: Bid) -> Self {
        Self::from_call(Call::Bid(bid), bid.level)
    }
}

impl fmt::Display for BidValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.call())
    }
}

/// Whether a possibly unset value counts as a pass
///
/// The unset value is a pass, as is the pass slot of every level.
#[must_use]
pub const fn is_pass(value: Option<BidValue>) -> bool {
    match value {
        Some(value) => value.is_pass(),
        None => true,
    }
}

/// Whether a possibly unset value is a double or a redouble
#[must_use]
pub const fn is_double(value: Option<BidValue>) -> bool {
    match value {
        Some(value) => value.is_double(),
        None => false,
    }
}

/// Whether a possibly unset value is crucial, i.e. neither unset nor a pass
#[must_use]
pub const fn is_crucial(value: Option<BidValue>) -> bool {
    !is_pass(value)
}

const SEAT_SHIFT: u8 = 6;
const SEAT_MASK: u8 = 0b1100_0000;
const VALUE_MASK: u8 = 0b0011_1111;

/// Error raised when a byte does not decode to a bid
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DecodeBidError {
    /// The value part is the unset value
    #[error("bid code {0:#04x} carries no bid")]
    Unset(u8),
    /// The value part is beyond the last redouble
    #[error("bid code {0:#04x} is out of range")]
    OutOfRange(u8),
}

/// A bid tagged with the seat that made it
///
/// On the wire this is a single byte, the seat in the top two bits and the
/// value in the bottom six.  [`RawBid::encode`] and [`RawBid::decode`] are the
/// only places that touch the packed form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawBid {
    /// The bidding seat
    pub seat: Seat,
    /// What the seat bid
    pub value: BidValue,
}

impl RawBid {
    /// Pair a seat with a value
    #[must_use]
    pub const fn new(seat: Seat, value: BidValue) -> Self {
        Self { seat, value }
    }

    /// Pack into the wire byte
    #[must_use]
    pub const fn encode(self) -> u8 {
        (self.seat as u8) << SEAT_SHIFT | self.value.get()
    }

    /// Unpack a wire byte
    ///
    /// # Errors
    /// Fails if the value part is unset or out of range.
    pub const fn decode(code: u8) -> Result<Self, DecodeBidError> {
        let seat = Seat::from_index((code & SEAT_MASK) >> SEAT_SHIFT);
        match code & VALUE_MASK {
            0 => Err(DecodeBidError::Unset(code)),
            value => match BidValue::new(value) {
                Some(value) => Ok(Self { seat, value }),
                None => Err(DecodeBidError::OutOfRange(code)),
            },
        }
    }
}

impl TryFrom<u8> for RawBid {
    type Error = DecodeBidError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::decode(code)
    }
}

impl From<RawBid> for u8 {
    fn from(raw: RawBid) -> Self {
        raw.encode()
    }
}

/// Strain of every wire byte, `None` for passes, doubles, and invalid bytes
static STRAIN_BY_CODE: Lazy<[Option<Strain>; 256]> = Lazy::new(|| {
    let mut table = [None; 256];
    for (code, entry) in (0..=u8::MAX).zip(table.iter_mut()) {
        *entry = RawBid::decode(code).ok().and_then(|raw| raw.value.strain());
    }
    table
});

/// Look up the strain a tagged bid names
#[must_use]
pub fn strain_of(raw: RawBid) -> Option<Strain> {
    STRAIN_BY_CODE[usize::from(raw.encode())]
}

/// A set of bid values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct BidSet(u64);

impl BidSet {
    /// The empty set
    pub const EMPTY: Self = Self(0);

    /// The set containing every bid value
    pub const ALL: Self = Self(((1 << BidValue::MAX) - 1) << 1);

    /// The number of values in the set
    #[must_use]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Whether the set is empty
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether the set contains a value
    #[must_use]
    pub const fn contains(self, value: BidValue) -> bool {
        self.0 & 1 << value.get() != 0
    }

    /// Insert a value into the set
    pub fn insert(&mut self, value: BidValue) -> bool {
        let inserted = !self.contains(value);
        self.0 |= 1 << value.get();
        inserted
    }

    /// Remove a value from the set
    pub fn remove(&mut self, value: BidValue) -> bool {
        let removed = self.contains(value);
        self.0 &= !(1 << value.get());
        removed
    }

    /// As a bitset indexed by bid value
    #[must_use]
    pub const fn to_bits(self) -> u64 {
        self.0
    }

    /// Iterate over the values in ascending order
    pub fn iter(self) -> impl Iterator<Item = BidValue> {
        (1..=BidValue::MAX)
            .filter_map(BidValue::new)
            .filter(move |&value| self.contains(value))
    }
}

impl FromIterator<BidValue> for BidSet {
    fn from_iter<I: IntoIterator<Item = BidValue>>(iter: I) -> Self {
        let mut set = Self::EMPTY;
        iter.into_iter().for_each(|value| {
            set.insert(value);
        });
        set
    }
}

impl BitOr for BidSet {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl Not for BidSet {
    type Output = Self;

    fn not(self) -> Self {
        Self(Self::ALL.0 & !self.0)
    }
}
