#[cfg(test)]
mod test;

mod actor;

pub use actor::{spawn, spawn_table, TableCommand, TableError, TableEvent, TableHandle};

use crate::bid::{BidSet, BidValue, DecodeBidError, RawBid};
use crate::deal::{Card, Deal, DecodeCardError, InvalidDeal};
use crate::ledger::BiddingHistory;
use crate::play::{LegalPlay, PlayEngine, PlayError, PlayResult, Turn};
use crate::resolver::{resolve, Declaration};
use crate::seat::Seat;
use core::time::Duration;
use rand::rngs::StdRng;
use rand::SeedableRng as _;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Settings of one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableConfig {
    /// Identifier used in log spans
    pub id: u64,
    /// Dealer of the first board, who opens the bidding
    pub dealer: Seat,
    /// Seed for reproducible shuffles, entropy when `None`
    pub seed: Option<u64>,
    /// Decision time the session layer should allow per turn
    pub decision_timeout: Duration,
    /// Capacity of the inbound command queue
    pub channel_capacity: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            id: 0,
            dealer: Seat::North,
            seed: None,
            decision_timeout: Duration::from_secs(30),
            channel_capacity: 64,
        }
    }
}

/// Stage of the board in play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Seats are bidding
    Bidding,
    /// Cards are being played
    Playing,
    /// All thirteen tricks are over
    Finished,
}

/// Actions the table refuses without changing state
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    /// The bid byte does not decode
    #[error(transparent)]
    Bid(#[from] DecodeBidError),
    /// The card byte does not decode
    #[error(transparent)]
    Card(#[from] DecodeCardError),
    /// The action does not belong to the current phase
    #[error("action not allowed during {0:?}")]
    PhaseMismatch(Phase),
    /// The byte claims a different seat than the sender
    #[error("{seat} sent a bid tagged for {tagged}")]
    SeatMismatch {
        /// The sending seat
        seat: Seat,
        /// The seat encoded in the bid
        tagged: Seat,
    },
    /// Another seat is due to bid
    #[error("{expected} is due to bid, not {got}")]
    OutOfTurn {
        /// The seat due to bid
        expected: Seat,
        /// The sending seat
        got: Seat,
    },
    /// The bid is insufficient or the double is not available
    #[error("{seat} may not bid {value}")]
    ForbiddenBid {
        /// The sending seat
        seat: Seat,
        /// The rejected bid
        value: BidValue,
    },
    /// The card play is illegal
    #[error(transparent)]
    Play(#[from] PlayError),
}

/// What happened after an accepted bid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BidOutcome {
    /// The auction goes on
    Continue {
        /// The seat due to bid
        next: Seat,
        /// Bids the next seat may not make
        forbidden: BidSet,
    },
    /// The auction produced a contract and play begins
    Complete {
        /// Declarer, dummy, opening leader and contract
        declaration: Declaration,
        /// The opening lead
        turn: Turn,
        /// What the opening leader may play
        legal: LegalPlay,
    },
    /// Everyone passed, so the cards were redealt
    Reshuffle {
        /// The dealer, who opens the new auction
        dealer: Seat,
        /// Bids the dealer may not make
        forbidden: BidSet,
    },
}

enum State {
    Bidding { next: Seat },
    Playing(PlayEngine),
}

/// One table running one board at a time
///
/// All mutation goes through `&mut self`, so a single owner serializes every
/// action on the board.  Rejected actions return a [`ProtocolError`] and leave
/// the table as it was.
pub struct Table {
    config: TableConfig,
    rng: StdRng,
    dealer: Seat,
    deal: Deal,
    history: BiddingHistory,
    state: State,
}

impl Table {
    /// Open a table and shuffle the first board
    #[must_use]
    pub fn new(config: TableConfig) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let deal = Deal::new(&mut rng);
        Self::from_parts(config, rng, deal)
    }

    /// Open a table with a prearranged first board
    ///
    /// # Errors
    /// Rejects a deal without four full hands of distinct cards.
    pub fn with_deal(config: TableConfig, deal: Deal) -> Result<Self, InvalidDeal> {
        deal.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self::from_parts(config, rng, deal))
    }

    fn from_parts(config: TableConfig, rng: StdRng, deal: Deal) -> Self {
        let dealer = config.dealer;
        Self {
            config,
            rng,
            dealer,
            deal,
            history: BiddingHistory::new(),
            state: State::Bidding { next: dealer },
        }
    }

    /// Settings of this table
    #[must_use]
    pub const fn config(&self) -> &TableConfig {
        &self.config
    }

    /// Current phase
    #[must_use]
    pub const fn phase(&self) -> Phase {
        match &self.state {
            State::Bidding { .. } => Phase::Bidding,
            State::Playing(engine) if engine.is_exhausted() => Phase::Finished,
            State::Playing(_) => Phase::Playing,
        }
    }

    /// Dealer of the current board
    #[must_use]
    pub const fn dealer(&self) -> Seat {
        self.dealer
    }

    /// Bids of the current auction
    #[must_use]
    pub const fn history(&self) -> &BiddingHistory {
        &self.history
    }

    /// Hands as they stand, with played cards removed
    #[must_use]
    pub fn deal(&self) -> &Deal {
        self.engine().map_or(&self.deal, PlayEngine::deal)
    }

    /// Hands as dealt
    #[must_use]
    pub const fn dealt(&self) -> &Deal {
        &self.deal
    }

    /// Card play state, once the auction is over
    #[must_use]
    pub const fn engine(&self) -> Option<&PlayEngine> {
        match &self.state {
            State::Bidding { .. } => None,
            State::Playing(engine) => Some(engine),
        }
    }

    /// The resolved contract, once the auction is over
    #[must_use]
    pub fn declaration(&self) -> Option<&Declaration> {
        self.engine().map(PlayEngine::declaration)
    }

    /// The seat due to bid, during the auction
    #[must_use]
    pub const fn next_bidder(&self) -> Option<Seat> {
        match self.state {
            State::Bidding { next } => Some(next),
            _ => None,
        }
    }

    /// Bids the next bidder may not make, during the auction
    #[must_use]
    pub fn forbidden_bids(&self) -> Option<BidSet> {
        self.next_bidder()
            .map(|next| self.history.forbidden_bids(next))
    }

    /// The turn to play and its legal range, during card play
    #[must_use]
    pub fn turn(&self) -> Option<(Turn, LegalPlay)> {
        let engine = self.engine()?;
        let turn = engine.turn()?;
        engine.legal_range(turn.seat).map(|legal| (turn, legal))
    }

    /// Handle a bid byte sent by `seat`
    ///
    /// # Errors
    /// Rejects undecodable bytes, bids outside the auction, bids out of turn,
    /// and bids the auction does not allow at this point.
    pub fn bid(&mut self, seat: Seat, code: u8) -> Result<BidOutcome, ProtocolError> {
        self.try_bid(seat, code).inspect_err(|error| {
            warn!(table = self.config.id, %seat, code, %error, "bid dropped");
        })
    }

    fn try_bid(&mut self, seat: Seat, code: u8) -> Result<BidOutcome, ProtocolError> {
        let raw = RawBid::decode(code)?;
        if raw.seat != seat {
            return Err(ProtocolError::SeatMismatch {
                seat,
                tagged: raw.seat,
            });
        }
        self.call(seat, raw.value)
    }

    /// Handle a decoded bid by `seat`
    ///
    /// # Errors
    /// Same as [`Table::bid`], minus decoding.
    pub fn call(&mut self, seat: Seat, value: BidValue) -> Result<BidOutcome, ProtocolError> {
        let State::Bidding { next } = self.state else {
            return Err(ProtocolError::PhaseMismatch(self.phase()));
        };

        if seat != next {
            return Err(ProtocolError::OutOfTurn {
                expected: next,
                got: seat,
            });
        }

        if self.history.forbidden_bids(seat).contains(value) {
            return Err(ProtocolError::ForbiddenBid { seat, value });
        }

        let item = self.history.append(seat, value);
        debug!(table = self.config.id, %seat, bid = %value, stamp = item.stamp.get(), "bid accepted");

        let completion = self.history.completion();

        if completion.reshuffle {
            info!(table = self.config.id, dealer = %self.dealer, "passed out, redealing");
            self.redeal();
            return Ok(BidOutcome::Reshuffle {
                dealer: self.dealer,
                forbidden: self.history.forbidden_bids(self.dealer),
            });
        }

        if !completion.complete {
            let next = seat.next();
            self.state = State::Bidding { next };
            return Ok(BidOutcome::Continue {
                next,
                forbidden: self.history.forbidden_bids(next),
            });
        }

        // Doubles are forbidden until a strain bid is made, so a completed
        // auction that needs no reshuffle always resolves.
        let declaration = match resolve(&self.history) {
            Ok(declaration) => declaration,
            Err(error) => unreachable!("completed auction: {error}"),
        };
        info!(
            table = self.config.id,
            contract = %declaration.contract,
            declarer = %declaration.declarer,
            "auction complete"
        );

        // Every deal is validated on the way in, so the leader holds 13 cards
        let engine = PlayEngine::new(self.deal, declaration);
        let (Some(turn), Some(legal)) = (
            engine.turn(),
            engine.turn().and_then(|turn| engine.legal_range(turn.seat)),
        ) else {
            unreachable!("a full deal has an opening lead");
        };
        self.state = State::Playing(engine);

        Ok(BidOutcome::Complete {
            declaration,
            turn,
            legal,
        })
    }

    /// Handle a card byte sent by `actor` for the hand of `seat`
    ///
    /// # Errors
    /// Rejects undecodable bytes, plays outside card play, and illegal plays.
    pub fn play(&mut self, actor: Seat, seat: Seat, code: u8) -> Result<PlayResult, ProtocolError> {
        Card::try_from(code)
            .map_err(ProtocolError::from)
            .and_then(|card| self.play_card(actor, seat, card))
            .inspect_err(|error| {
                warn!(table = self.config.id, %actor, %seat, code, %error, "play dropped");
            })
    }

    /// Handle a decoded card sent by `actor` for the hand of `seat`
    ///
    /// # Errors
    /// Same as [`Table::play`], minus decoding.
    pub fn play_card(
        &mut self,
        actor: Seat,
        seat: Seat,
        card: Card,
    ) -> Result<PlayResult, ProtocolError> {
        let phase = self.phase();
        let State::Playing(engine) = &mut self.state else {
            return Err(ProtocolError::PhaseMismatch(phase));
        };
        if phase == Phase::Finished {
            return Err(ProtocolError::PhaseMismatch(phase));
        }

        let result = engine.play(actor, seat, card)?;
        debug!(table = self.config.id, %actor, %seat, %card, index = result.index, "card played");

        if let Some(trick) = &result.trick {
            info!(
                table = self.config.id,
                winner = %trick.winner,
                tricks = trick.tricks_played,
                "trick complete"
            );
        }

        if engine.is_exhausted() {
            let declaration = engine.declaration();
            let declarer_tricks = engine.tricks_won(declaration.declarer);
            info!(
                table = self.config.id,
                contract = %declaration.contract,
                declarer = %declaration.declarer,
                declarer_tricks,
                result = declaration.contract.result(declarer_tricks),
                "board finished"
            );
        }

        Ok(result)
    }

    /// Play the default card for whoever is due, as on a decision timeout
    ///
    /// # Errors
    /// Fails outside card play.
    pub fn auto_play(&mut self) -> Result<PlayResult, ProtocolError> {
        let (turn, legal) = self
            .turn()
            .ok_or_else(|| ProtocolError::PhaseMismatch(self.phase()))?;
        debug!(table = self.config.id, seat = %turn.seat, card = %legal.default, "auto play");
        self.play_card(turn.actor, turn.seat, legal.default)
    }

    /// Pass the deal to the next dealer and shuffle a new board
    ///
    /// # Errors
    /// Fails unless the current board is finished.
    pub fn next_deal(&mut self) -> Result<Seat, ProtocolError> {
        if self.phase() != Phase::Finished {
            return Err(ProtocolError::PhaseMismatch(self.phase()));
        }
        self.dealer = self.dealer.next();
        self.redeal();
        info!(table = self.config.id, dealer = %self.dealer, "new board");
        Ok(self.dealer)
    }

    fn redeal(&mut self) {
        self.history.clear();
        self.deal = Deal::new(&mut self.rng);
        self.state = State::Bidding { next: self.dealer };
    }
}
