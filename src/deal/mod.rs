#[cfg(test)]
mod test;

use crate::contract::Strain;
use crate::seat::Seat;
use core::fmt;
use core::num::NonZeroU8;
use core::ops::{Index, IndexMut};
use core::str::FromStr;
use rand::prelude::SliceRandom as _;
use thiserror::Error;

/// Suit of a card, numbered in card-code order
///
/// Discriminants agree with [`Strain`], so a suit is the strain of the same
/// number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Suit {
    /// ♣, codes 1..=13
    Clubs,
    /// ♦, codes 14..=26
    Diamonds,
    /// ♥, codes 27..=39
    Hearts,
    /// ♠, codes 40..=52
    Spades,
}

impl Suit {
    /// Clubs to spades, the order of card codes
    pub const ASC: [Self; 4] = [Self::Clubs, Self::Diamonds, Self::Hearts, Self::Spades];

    /// Spades to clubs, the order of PBN hands
    pub const DESC: [Self; 4] = [Self::Spades, Self::Hearts, Self::Diamonds, Self::Clubs];
}

impl From<Suit> for Strain {
    fn from(suit: Suit) -> Self {
        Self::ALL[suit as usize]
    }
}

/// The contract strain was notrump, which names no trump suit
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("notrump has no trump suit")]
pub struct SuitFromNotrumpError;

impl TryFrom<Strain> for Suit {
    type Error = SuitFromNotrumpError;

    fn try_from(strain: Strain) -> Result<Self, Self::Error> {
        Self::ASC
            .get(strain as usize)
            .copied()
            .ok_or(SuitFromNotrumpError)
    }
}

const _: () = assert!(Suit::Spades as u8 == Strain::Spades as u8);

const RANKS: &[u8; 13] = b"23456789TJQKA";

/// Error raised when a byte is not a card code
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DecodeCardError {
    /// The cover value marking an empty slot
    #[error("card code 0 is the cover value")]
    Cover,
    /// Past the ace of spades
    #[error("card code {0} is out of range")]
    OutOfRange(u8),
}

/// A card as sent over the wire
///
/// Codes run 1 to 52, deuce to ace within a suit, clubs first.  Each suit is
/// a contiguous block of codes, and code 0 is left for the cover value of a
/// played slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Card(NonZeroU8);

impl Card {
    /// Code of the ♠A
    pub const MAX_CODE: u8 = 52;

    /// The card of `suit` at `rank`, where 11 to 14 are J, Q, K, A
    ///
    /// # Panics
    /// When `rank` is outside 2..=14.
    #[must_use]
    pub const fn new(suit: Suit, rank: u8) -> Self {
        assert!(2 <= rank && rank <= 14);
        match NonZeroU8::new(suit as u8 * 13 + rank - 1) {
            Some(code) => Self(code),
            None => unreachable!(),
        }
    }

    /// The card with the given code, if any
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match NonZeroU8::new(code) {
            Some(code) if code.get() <= Self::MAX_CODE => Some(Self(code)),
            _ => None,
        }
    }

    /// The card code in 1..=52
    #[must_use]
    pub const fn code(self) -> u8 {
        self.0.get()
    }

    /// Suit block the code falls in
    #[must_use]
    pub const fn suit(self) -> Suit {
        Suit::ASC[((self.code() - 1) / 13) as usize]
    }

    /// Rank in 2..=14, ace high
    #[must_use]
    pub const fn rank(self) -> u8 {
        (self.code() - 1) % 13 + 2
    }
}

impl TryFrom<u8> for Card {
    type Error = DecodeCardError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Err(DecodeCardError::Cover),
            code => Self::from_code(code).ok_or(DecodeCardError::OutOfRange(code)),
        }
    }
}

const fn rank_char(rank: u8) -> char {
    RANKS[(rank - 2) as usize] as char
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", Strain::from(self.suit()), rank_char(self.rank()))
    }
}

/// Error raised when parsing a card or a hand
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ParseHandError {
    /// Unknown suit letter
    #[error("invalid suit")]
    InvalidSuit,
    /// Unknown rank character
    #[error("invalid rank")]
    InvalidRank,
    /// A hand must contain exactly four suits separated by dots
    #[error("a hand must contain exactly four suits")]
    NotFourSuits,
    /// The same card appears twice
    #[error("repeated card")]
    RepeatedCard,
    /// More than 13 cards
    #[error("too many cards for a hand")]
    TooManyCards,
}

const fn parse_rank(c: char) -> Option<u8> {
    match c {
        '2'..='9' => Some(c as u8 - b'0'),
        'T' | 't' => Some(10),
        'J' | 'j' => Some(11),
        'Q' | 'q' => Some(12),
        'K' | 'k' => Some(13),
        'A' | 'a' => Some(14),
        _ => None,
    }
}

impl FromStr for Card {
    type Err = ParseHandError;

    /// Parse suit then rank, e.g. `SA`, `♥T` or `C10`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let suit = match chars.next() {
            Some('C' | 'c' | '♣') => Suit::Clubs,
            Some('D' | 'd' | '♦') => Suit::Diamonds,
            Some('H' | 'h' | '♥') => Suit::Hearts,
            Some('S' | 's' | '♠') => Suit::Spades,
            _ => return Err(ParseHandError::InvalidSuit),
        };
        let rank = match chars.as_str() {
            "10" => 10,
            rest => {
                let mut rest = rest.chars();
                match (rest.next().and_then(parse_rank), rest.next()) {
                    (Some(rank), None) => rank,
                    _ => return Err(ParseHandError::InvalidRank),
                }
            }
        };
        Ok(Self::new(suit, rank))
    }
}

/// Number of cards dealt to each seat
pub const HAND_SIZE: usize = 13;

/// A hand of playing cards in dealt order
///
/// Played cards leave an empty slot behind, so the remaining cards keep the
/// positions clients have already laid out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Hand([Option<Card>; HAND_SIZE]);

impl Hand {
    /// The hand with every slot empty
    pub const EMPTY: Self = Self([None; HAND_SIZE]);

    /// Build a hand filling slots in the given order
    ///
    /// # Errors
    /// Fails on repeated cards and on more than 13 cards.
    pub fn from_cards(cards: impl IntoIterator<Item = Card>) -> Result<Self, ParseHandError> {
        let mut hand = Self::EMPTY;
        let mut cards = cards.into_iter();

        for (slot, card) in hand.0.iter_mut().zip(cards.by_ref()) {
            *slot = Some(card);
        }

        if cards.next().is_some() {
            return Err(ParseHandError::TooManyCards);
        }

        let mut seen = 0u64;
        for card in hand.iter() {
            if seen & 1 << card.code() != 0 {
                return Err(ParseHandError::RepeatedCard);
            }
            seen |= 1 << card.code();
        }

        Ok(hand)
    }

    /// All 13 slots, `None` for cards already played
    #[must_use]
    pub const fn slots(&self) -> &[Option<Card>; HAND_SIZE] {
        &self.0
    }

    /// Cards still held, in slot order
    pub fn iter(&self) -> impl Iterator<Item = Card> + '_ {
        self.0.iter().flatten().copied()
    }

    /// Cards still held, compacted into a list
    #[must_use]
    pub fn cards(&self) -> Vec<Card> {
        self.iter().collect()
    }

    /// Number of cards still held
    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Whether every card has been played
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(Option::is_none)
    }

    /// The slot holding `card`
    #[must_use]
    pub fn position(&self, card: Card) -> Option<usize> {
        self.0.iter().position(|&slot| slot == Some(card))
    }

    /// Whether `card` is still held
    #[must_use]
    pub fn contains(&self, card: Card) -> bool {
        self.position(card).is_some()
    }

    /// Empty the slot holding `card`, returning its index
    pub fn remove(&mut self, card: Card) -> Option<usize> {
        let index = self.position(card)?;
        self.0[index] = None;
        Some(index)
    }

    fn suit_holding(&self, suit: Suit) -> impl Iterator<Item = Card> + '_ {
        let mut cards: Vec<_> = self.iter().filter(|card| card.suit() == suit).collect();
        cards.sort_unstable_by(|a, b| b.cmp(a));
        cards.into_iter()
    }
}

impl Index<usize> for Hand {
    type Output = Option<Card>;

    fn index(&self, index: usize) -> &Option<Card> {
        &self.0[index]
    }
}

impl fmt::Display for Hand {
    /// PBN order: spades first, high cards first, suits split by dots
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let holdings = Suit::DESC.map(|suit| {
            self.suit_holding(suit)
                .map(|card| rank_char(card.rank()))
                .collect::<String>()
        });
        f.write_str(&holdings.join("."))
    }
}

impl FromStr for Hand {
    type Err = ParseHandError;

    /// Parse a PBN hand, e.g. `AT74.QJ9.32.AK64`, spades first
    ///
    /// Slots are filled in ascending card order.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "-" {
            return Ok(Self::EMPTY);
        }

        let holdings: Vec<&str> = s.split('.').collect();
        let [spades, hearts, diamonds, clubs] = holdings.as_slice() else {
            return Err(ParseHandError::NotFourSuits);
        };

        let mut cards = Vec::with_capacity(HAND_SIZE);
        for (suit, holding) in Suit::DESC.into_iter().zip([spades, hearts, diamonds, clubs]) {
            for c in holding.chars() {
                let rank = parse_rank(c).ok_or(ParseHandError::InvalidRank)?;
                cards.push(Card::new(suit, rank));
            }
        }
        cards.sort_unstable();
        Self::from_cards(cards)
    }
}

/// A deal of four hands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Deal(pub [Hand; 4]);

impl Index<Seat> for Deal {
    type Output = Hand;

    fn index(&self, seat: Seat) -> &Hand {
        &self.0[seat as usize]
    }
}

impl IndexMut<Seat> for Deal {
    fn index_mut(&mut self, seat: Seat) -> &mut Hand {
        &mut self.0[seat as usize]
    }
}

impl Deal {
    /// Shuffle a full pack and hand out 13 cards a seat
    ///
    /// Each hand is sorted by card code, so slots start out in suit order.
    pub fn new(rng: &mut (impl rand::Rng + ?Sized)) -> Self {
        let mut pack: Vec<Card> = (1..=Card::MAX_CODE).filter_map(Card::from_code).collect();
        pack.shuffle(rng);

        let mut deal = Self::default();
        for (hand, cards) in deal.0.iter_mut().zip(pack.chunks_exact_mut(HAND_SIZE)) {
            cards.sort_unstable();
            for (slot, &card) in hand.0.iter_mut().zip(cards.iter()) {
                *slot = Some(card);
            }
        }
        deal
    }

    /// Hands clockwise from `first`
    pub fn around(&self, first: Seat) -> impl Iterator<Item = (Seat, &Hand)> + '_ {
        (0..4).map(move |steps| {
            let seat = first.rotate(steps);
            (seat, &self[seat])
        })
    }

    /// PBN deal string, the hand of `first` after the colon and the rest clockwise
    #[must_use]
    pub fn display(self, first: Seat) -> impl fmt::Display {
        DealDisplay { deal: self, first }
    }
}

/// A deal that is not four full hands of distinct cards
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum InvalidDeal {
    /// A hand does not hold exactly 13 cards
    #[error("{seat} holds {len} cards instead of 13")]
    WrongHandSize {
        /// The offending seat
        seat: Seat,
        /// Cards found in its hand
        len: usize,
    },
    /// The same card sits in two slots
    #[error("{0} is dealt more than once")]
    RepeatedCard(Card),
}

impl Deal {
    /// Check that every seat holds 13 cards and no card is dealt twice
    ///
    /// # Errors
    /// Reports the first short or long hand, then the first repeated card.
    pub fn validate(&self) -> Result<(), InvalidDeal> {
        let short = self
            .around(Seat::North)
            .find(|(_, hand)| hand.len() != HAND_SIZE);

        if let Some((seat, hand)) = short {
            return Err(InvalidDeal::WrongHandSize {
                seat,
                len: hand.len(),
            });
        }

        let mut seen = 0u64;
        for card in self.0.iter().flat_map(Hand::iter) {
            if seen & 1 << card.code() != 0 {
                return Err(InvalidDeal::RepeatedCard(card));
            }
            seen |= 1 << card.code();
        }
        Ok(())
    }
}

struct DealDisplay {
    deal: Deal,
    first: Seat,
}

impl fmt::Display for DealDisplay {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:", self.first)?;
        for (steps, (_, hand)) in self.deal.around(self.first).enumerate() {
            if steps > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{hand}")?;
        }
        Ok(())
    }
}
