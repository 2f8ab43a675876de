
use crate::deal::{Card, Deal, Hand, Suit, HAND_SIZE};
use crate::resolver::Declaration;
use crate::seat::{Seat, SeatFlags};
use thiserror::Error;

/// Interval of card codes that count as following suit in a trick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RoundRange {
    /// The lowest card in the range
    pub min: Card,
    /// The highest card in the range
    pub max: Card,
}

const fn card(code: u8) -> Card {
    match Card::from_code(code) {
        Some(card) => card,
        None => panic!("not a card code"),
    }
}

const fn suit_range(suit: Suit) -> RoundRange {
    let base = suit as u8 * 13;
    RoundRange {
        min: card(base + 1),
        max: card(base + 13),
    }
}

/// Suit ranges indexed by [`Suit`]
static SUIT_RANGES: [RoundRange; 4] = [
    suit_range(Suit::Clubs),
    suit_range(Suit::Diamonds),
    suit_range(Suit::Hearts),
    suit_range(Suit::Spades),
];

impl RoundRange {
    /// No constraint, every card code
    pub const FULL: Self = Self {
        min: card(1),
        max: card(Card::MAX_CODE),
    };

    /// The range of the suit led by `card`
    #[must_use]
    pub fn led_by(card: Card) -> Self {
        SUIT_RANGES[card.suit() as usize]
    }

    /// Look up a raw code, falling back to [`RoundRange::FULL`] for codes
    /// outside every suit
    #[must_use]
    pub fn from_code(code: u8) -> Self {
        Card::from_code(code).map_or(Self::FULL, Self::led_by)
    }

    /// Whether `card` lies within the range
    #[must_use]
    pub fn contains(self, card: Card) -> bool {
        (self.min..=self.max).contains(&card)
    }
}

/// What a seat may play and what to play for it by default
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LegalPlay {
    /// Legal card codes, [`RoundRange::FULL`] when the seat may discard
    pub range: RoundRange,
    /// Card to play when the decision times out
    pub default: Card,
    /// Slot of `default` in the hand
    pub default_index: usize,
}

/// Compute the legal range of `hand` against the current round range
///
/// A hand holding cards in `round` must follow suit: the range narrows to the
/// held cards of that suit and the default is the lowest of them.  Otherwise
/// any card goes and the default is the first card in slot order.  Returns
/// `None` for an empty hand.
#[must_use]
pub fn legal_range(hand: &Hand, round: RoundRange) -> Option<LegalPlay> {
    let mut followers = hand
        .slots()
        .iter()
        .enumerate()
        .filter_map(|(index, slot)| slot.map(|card| (index, card)))
        .filter(|&(_, card)| round.contains(card));

    if let Some(first) = followers.next() {
        let (low, high) = followers.fold((first, first.1), |(low, high), (index, card)| {
            (
                if card < low.1 { (index, card) } else { low },
                high.max(card),
            )
        });
        return Some(LegalPlay {
            range: RoundRange {
                min: low.1,
                max: high,
            },
            default: low.1,
            default_index: low.0,
        });
    }

    let (default_index, default) = hand
        .slots()
        .iter()
        .enumerate()
        .find_map(|(index, slot)| slot.map(|card| (index, card)))?;

    Some(LegalPlay {
        range: RoundRange::FULL,
        default,
        default_index,
    })
}

/// A turn to play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Turn {
    /// The seat whose card is played
    pub seat: Seat,
    /// The seat that decides, declarer when `seat` is dummy
    pub actor: Seat,
}

impl Turn {
    /// The turn of `seat`, redirected to declarer for dummy
    #[must_use]
    pub fn of(seat: Seat, declaration: &Declaration) -> Self {
        Self {
            seat,
            actor: declaration.controller(seat),
        }
    }
}

/// The turn after `current` has played
#[must_use]
pub fn advance_turn(current: Seat, declaration: &Declaration) -> Turn {
    Turn::of(current.next(), declaration)
}

/// Errors raised by an illegal play
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PlayError {
    /// All thirteen tricks are over
    #[error("every trick has been played")]
    HandExhausted,
    /// Another seat is due to play
    #[error("{expected} is due to play, not {got}")]
    OutOfTurn {
        /// The seat due to play
        expected: Seat,
        /// The seat whose card was offered
        got: Seat,
    },
    /// The acting seat does not control the hand
    #[error("{actor} cannot play from the hand of {seat}")]
    NotController {
        /// The seat whose card was offered
        seat: Seat,
        /// The seat that sent the play
        actor: Seat,
    },
    /// The card is not held, or has already been played
    #[error("{seat} does not hold {card}")]
    CardNotInHand {
        /// The seat whose card was offered
        seat: Seat,
        /// The offered card
        card: Card,
    },
    /// The seat holds the led suit but played another
    #[error("{seat} must follow suit instead of playing {card}")]
    MustFollowSuit {
        /// The seat whose card was offered
        seat: Seat,
        /// The offered card
        card: Card,
    },
}

/// Cards played so far in the current trick
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Trick {
    leader: Seat,
    cards: Vec<(Seat, Card)>,
    played: SeatFlags,
}

impl Trick {
    /// An empty trick led by `leader`
    #[must_use]
    pub fn new(leader: Seat) -> Self {
        Self {
            leader,
            cards: Vec::with_capacity(4),
            played: SeatFlags::EMPTY,
        }
    }

    /// The seat that leads this trick
    #[must_use]
    pub const fn leader(&self) -> Seat {
        self.leader
    }

    /// Cards in order of play
    #[must_use]
    pub fn cards(&self) -> &[(Seat, Card)] {
        &self.cards
    }

    /// The led card
    #[must_use]
    pub fn led(&self) -> Option<Card> {
        self.cards.first().map(|&(_, card)| card)
    }

    /// Seats that have played to this trick
    #[must_use]
    pub const fn played(&self) -> SeatFlags {
        self.played
    }

    /// Whether all four seats have played
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.played == SeatFlags::ALL
    }

    fn push(&mut self, seat: Seat, card: Card) {
        self.cards.push((seat, card));
        self.played |= seat.into();
    }

    /// The seat winning the trick so far
    ///
    /// The highest trump wins if any was played, otherwise the highest card
    /// of the led suit.
    #[must_use]
    pub fn winner(&self, trump: Option<Suit>) -> Option<Seat> {
        let led = self.led()?.suit();
        let rank = |card: Card| match card.suit() {
            suit if Some(suit) == trump => 2,
            suit if suit == led => 1,
            _ => 0,
        };
        self.cards
            .iter()
            .max_by_key(|&&(_, card)| (rank(card), card))
            .map(|&(seat, _)| seat)
    }
}

/// Result of a completed trick
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrickResult {
    /// The four cards in order of play
    pub cards: Vec<(Seat, Card)>,
    /// The seat that won the trick and leads the next
    pub winner: Seat,
    /// Tricks completed so far, this one included
    pub tricks_played: u8,
}

/// Everything that changed after one card was played
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlayResult {
    /// The seat whose card was played
    pub seat: Seat,
    /// The played card
    pub card: Card,
    /// Cards left in that hand, compacted
    pub remaining: Vec<Card>,
    /// Slot the card was played from
    pub index: usize,
    /// Set when this card completed the trick
    pub trick: Option<TrickResult>,
    /// Who plays next and what they may play, `None` after the last trick
    pub next: Option<(Turn, LegalPlay)>,
}

/// Turn and legality state of the card play
///
/// The engine starts awaiting the opening lead.  The first card of each trick
/// fixes the round range, the fourth card scores the trick and hands the lead
/// to its winner, and after thirteen tricks the hands are exhausted.
#[derive(Debug, Clone)]
pub struct PlayEngine {
    deal: Deal,
    declaration: Declaration,
    trick: Trick,
    round: RoundRange,
    turn: Turn,
    tricks_played: u8,
    tricks_won: [u8; 2],
}

impl PlayEngine {
    /// Start play with the opening lead
    #[must_use]
    pub fn new(deal: Deal, declaration: Declaration) -> Self {
        Self {
            deal,
            trick: Trick::new(declaration.lead),
            round: RoundRange::FULL,
            turn: Turn::of(declaration.lead, &declaration),
            tricks_played: 0,
            tricks_won: [0; 2],
            declaration,
        }
    }

    /// The contract being played
    #[must_use]
    pub const fn declaration(&self) -> &Declaration {
        &self.declaration
    }

    /// Current state of the hands
    #[must_use]
    pub const fn deal(&self) -> &Deal {
        &self.deal
    }

    /// The trick in progress
    #[must_use]
    pub const fn trick(&self) -> &Trick {
        &self.trick
    }

    /// The round range of the trick in progress
    #[must_use]
    pub const fn round_range(&self) -> RoundRange {
        self.round
    }

    /// Who plays next, `None` once every trick is over
    #[must_use]
    pub fn turn(&self) -> Option<Turn> {
        (!self.is_exhausted()).then_some(self.turn)
    }

    /// Number of completed tricks
    #[must_use]
    pub const fn tricks_played(&self) -> u8 {
        self.tricks_played
    }

    /// Tricks won by the partnership of `seat`
    #[must_use]
    pub const fn tricks_won(&self, seat: Seat) -> u8 {
        self.tricks_won[seat as usize & 1]
    }

    /// Whether all thirteen tricks have been played
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.tricks_played as usize == HAND_SIZE
    }

    /// Fix the round range from the led card
    pub fn set_round_range(&mut self, led: Card) {
        self.round = RoundRange::led_by(led);
    }

    /// Legal range and default card of `seat` in the trick in progress
    #[must_use]
    pub fn legal_range(&self, seat: Seat) -> Option<LegalPlay> {
        legal_range(&self.deal[seat], self.round)
    }

    /// The turn after `current`, redirected from dummy to declarer
    #[must_use]
    pub fn advance_turn(&self, current: Seat) -> Turn {
        advance_turn(current, &self.declaration)
    }

    /// Take `card` out of the hand of `seat`
    ///
    /// Returns the remaining cards and the slot the card came from.
    ///
    /// # Errors
    /// Fails if the card is not in the hand or has been played already.
    pub fn play_card(&mut self, seat: Seat, card: Card) -> Result<(Vec<Card>, usize), PlayError> {
        let hand = &mut self.deal[seat];
        let index = hand
            .remove(card)
            .ok_or(PlayError::CardNotInHand { seat, card })?;
        Ok((hand.cards(), index))
    }

    /// Play a card sent by `actor` from the hand of `seat`
    ///
    /// Nothing changes when the play is rejected.
    ///
    /// # Errors
    /// Fails on plays out of turn, from a hand the actor does not control, of
    /// cards not held, and of cards that break the follow-suit rule.
    pub fn play(&mut self, actor: Seat, seat: Seat, card: Card) -> Result<PlayResult, PlayError> {
        let turn = self.turn().ok_or(PlayError::HandExhausted)?;

        if seat != turn.seat {
            return Err(PlayError::OutOfTurn {
                expected: turn.seat,
                got: seat,
            });
        }

        if actor != turn.actor {
            return Err(PlayError::NotController { seat, actor });
        }

        let legal = self
            .legal_range(seat)
            .ok_or(PlayError::CardNotInHand { seat, card })?;

        if !self.deal[seat].contains(card) {
            return Err(PlayError::CardNotInHand { seat, card });
        }

        if !legal.range.contains(card) {
            return Err(PlayError::MustFollowSuit { seat, card });
        }

        let (remaining, index) = self.play_card(seat, card)?;

        if self.trick.cards().is_empty() {
            self.set_round_range(card);
        }
        self.trick.push(seat, card);

        let trick = if self.trick.is_complete() {
            Some(self.finish_trick())
        } else {
            self.turn = self.advance_turn(seat);
            None
        };

        let next = self.turn().and_then(|turn| {
            self.legal_range(turn.seat).map(|legal| (turn, legal))
        });

        Ok(PlayResult {
            seat,
            card,
            remaining,
            index,
            trick,
            next,
        })
    }

    /// Score the complete trick and pass the lead to its winner
    fn finish_trick(&mut self) -> TrickResult {
        let trump = Suit::try_from(self.declaration.strain()).ok();

        let Some(winner) = self.trick.winner(trump) else {
            unreachable!("a complete trick has a winner");
        };
        let trick = core::mem::replace(&mut self.trick, Trick::new(winner));

        self.tricks_played += 1;
        self.tricks_won[winner as usize & 1] += 1;
        self.round = RoundRange::FULL;
        self.turn = Turn::of(winner, &self.declaration);

        TrickResult {
            cards: trick.cards,
            winner,
            tricks_played: self.tricks_played,
        }
    }
}
