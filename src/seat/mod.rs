
use core::fmt;
use core::str::FromStr;
use thiserror::Error;

/// Compass position at a table of four
///
/// The discriminant is the seat field of a raw bid byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Seat {
    /// Seat 0, opposite South
    North,
    /// Seat 1, opposite West
    East,
    /// Seat 2, opposite North
    South,
    /// Seat 3, opposite East
    West,
}

/// Clockwise successor of each seat
const CLOCKWISE: [Seat; 4] = [Seat::East, Seat::South, Seat::West, Seat::North];

/// Opening leader for each declarer, the opponent on declarer's left
const OPENING_LEAD: [Seat; 4] = CLOCKWISE;

impl Seat {
    /// The ring in clockwise order from North
    pub const ALL: [Self; 4] = [Self::North, Self::East, Self::South, Self::West];

    /// Seat at a ring position, taken modulo 4
    #[must_use]
    pub const fn from_index(index: u8) -> Self {
        Self::ALL[(index & 3) as usize]
    }

    /// Ring position in 0..4
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Left-hand opponent, who acts after this seat
    #[must_use]
    pub const fn next(self) -> Self {
        CLOCKWISE[self.index()]
    }

    /// Right-hand opponent, who acts before this seat
    #[must_use]
    pub const fn prev(self) -> Self {
        self.rotate(3)
    }

    /// Seat `steps` places clockwise
    #[must_use]
    pub const fn rotate(self, steps: u8) -> Self {
        Self::from_index(self as u8 + (steps & 3))
    }

    /// Seat across the table
    #[must_use]
    pub const fn partner(self) -> Self {
        self.rotate(2)
    }

    /// Who leads to the first trick when this seat declares
    #[must_use]
    pub const fn opening_lead(self) -> Self {
        OPENING_LEAD[self.index()]
    }

    /// Whether both seats are on the same side, a seat being its own partner
    #[must_use]
    pub const fn is_partner_of(self, other: Self) -> bool {
        (self as u8 ^ other as u8) & 1 == 0
    }

    /// Both seats of this seat's side
    #[must_use]
    pub const fn pair(self) -> SeatFlags {
        match self {
            Self::North | Self::South => SeatFlags::NS,
            Self::East | Self::West => SeatFlags::EW,
        }
    }
}

impl From<Seat> for char {
    fn from(seat: Seat) -> Self {
        b"NESW"[seat.index()] as char
    }
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", char::from(*self))
    }
}

/// A seat name was none of N, E, S, W
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("invalid seat {0:?}")]
pub struct ParseSeatError(pub char);

impl TryFrom<char> for Seat {
    type Error = ParseSeatError;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c.to_ascii_uppercase() {
            'N' => Ok(Self::North),
            'E' => Ok(Self::East),
            'S' => Ok(Self::South),
            'W' => Ok(Self::West),
            _ => Err(ParseSeatError(c)),
        }
    }
}

impl FromStr for Seat {
    type Err = ParseSeatError;

    /// Accepts the initial or the full name, in any case
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let first = s.chars().next().ok_or(ParseSeatError(' '))?;
        let seat = Self::try_from(first)?;
        let name = ["north", "east", "south", "west"][seat.index()];

        if s.len() == 1 || s.eq_ignore_ascii_case(name) {
            Ok(seat)
        } else {
            Err(ParseSeatError(first))
        }
    }
}

bitflags::bitflags! {
    /// Seats as a bitset, one bit per ring position
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SeatFlags: u8 {
        /// No seat
        const EMPTY = 0;
        /// North
        const NORTH = 1 << Seat::North as u8;
        /// East
        const EAST = 1 << Seat::East as u8;
        /// South
        const SOUTH = 1 << Seat::South as u8;
        /// West
        const WEST = 1 << Seat::West as u8;
        /// North and South
        const NS = Self::NORTH.bits() | Self::SOUTH.bits();
        /// East and West
        const EW = Self::EAST.bits() | Self::WEST.bits();
        /// Every seat, the mark of a complete trick
        const ALL = Self::NS.bits() | Self::EW.bits();
    }
}

impl From<Seat> for SeatFlags {
    fn from(seat: Seat) -> Self {
        Self::from_bits_retain(1 << seat as u8)
    }
}

const _: () = assert!(SeatFlags::ALL.bits() == 0b1111);
const _: () = assert!(SeatFlags::NS.intersection(SeatFlags::EW).is_empty());
const _: () = assert!(matches!(Seat::West.next(), Seat::North));
const _: () = assert!(matches!(Seat::North.prev(), Seat::West));
const _: () = assert!(matches!(Seat::South.opening_lead(), Seat::West));
