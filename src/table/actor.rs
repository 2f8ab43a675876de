use super::{BidOutcome, ProtocolError, Table, TableConfig};
use crate::bid::{BidSet, BidValue, RawBid};
use crate::deal::Deal;
use crate::play::{LegalPlay, PlayResult, Turn};
use crate::resolver::Declaration;
use crate::seat::Seat;
use core::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info_span, Instrument as _};

/// Requests accepted by a running table
#[derive(Debug)]
pub enum TableCommand {
    /// A bid byte from a seat
    Bid {
        /// The sending seat
        seat: Seat,
        /// Raw bid byte, seat and value packed
        code: u8,
        /// Where to send the outcome
        reply: oneshot::Sender<Result<BidOutcome, ProtocolError>>,
    },
    /// A card byte from a seat, for its own hand or dummy's
    Play {
        /// The sending seat
        actor: Seat,
        /// The hand the card comes from
        seat: Seat,
        /// Raw card byte
        code: u8,
        /// Where to send the outcome
        reply: oneshot::Sender<Result<PlayResult, ProtocolError>>,
    },
    /// Play the default card for the seat on turn
    AutoPlay {
        /// Where to send the outcome
        reply: oneshot::Sender<Result<PlayResult, ProtocolError>>,
    },
    /// Start the next board after the current one is finished
    NextDeal {
        /// Where to send the new dealer
        reply: oneshot::Sender<Result<Seat, ProtocolError>>,
    },
}

/// State changes announced to the session layer
///
/// Every event describes state that is already committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableEvent {
    /// Fresh hands for a new board
    Dealt {
        /// The dealer, who opens the bidding
        dealer: Seat,
        /// All four hands
        deal: Deal,
    },
    /// A seat made a bid
    Called {
        /// The bidding seat
        seat: Seat,
        /// The bid
        value: BidValue,
    },
    /// A seat is due to bid
    BidTurn {
        /// The seat due to bid
        seat: Seat,
        /// Bids the seat may not make
        forbidden: BidSet,
        /// Decision time the session layer should allow
        timeout: Duration,
    },
    /// Everyone passed and the board was redealt
    Reshuffled,
    /// The auction produced a contract
    Declared(Declaration),
    /// A card left a hand
    Played(PlayResult),
    /// A seat is due to play
    PlayTurn {
        /// Whose card and who decides
        turn: Turn,
        /// The legal range and timeout default
        legal: LegalPlay,
        /// Decision time the session layer should allow
        timeout: Duration,
    },
    /// All thirteen tricks are over
    Finished {
        /// Tricks won by declarer's side
        declarer_tricks: u8,
    },
}

/// Errors seen by a caller of a running table
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TableError {
    /// The action was refused
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    /// The table task is gone
    #[error("table is closed")]
    Closed,
}

/// Cloneable sender side of a running table
#[derive(Debug, Clone)]
pub struct TableHandle {
    commands: mpsc::Sender<TableCommand>,
}

impl TableHandle {
    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<Result<T, ProtocolError>>) -> TableCommand,
    ) -> Result<T, TableError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| TableError::Closed)?;
        Ok(response.await.map_err(|_| TableError::Closed)??)
    }

    /// Send a bid byte for `seat`
    ///
    /// # Errors
    /// Fails if the bid is refused or the table is closed.
    pub async fn bid(&self, seat: Seat, code: u8) -> Result<BidOutcome, TableError> {
        self.request(|reply| TableCommand::Bid { seat, code, reply })
            .await
    }

    /// Send a card byte from `actor` for the hand of `seat`
    ///
    /// # Errors
    /// Fails if the play is refused or the table is closed.
    pub async fn play(&self, actor: Seat, seat: Seat, code: u8) -> Result<PlayResult, TableError> {
        self.request(|reply| TableCommand::Play {
            actor,
            seat,
            code,
            reply,
        })
        .await
    }

    /// Play the default card for the seat on turn
    ///
    /// # Errors
    /// Fails outside card play or if the table is closed.
    pub async fn auto_play(&self) -> Result<PlayResult, TableError> {
        self.request(|reply| TableCommand::AutoPlay { reply }).await
    }

    /// Start the next board
    ///
    /// # Errors
    /// Fails unless the board is finished, or if the table is closed.
    pub async fn next_deal(&self) -> Result<Seat, TableError> {
        self.request(|reply| TableCommand::NextDeal { reply }).await
    }
}

/// Run `table` on its own task
///
/// The task owns the table and handles commands one at a time in arrival
/// order.  It stops when every [`TableHandle`] has been dropped.
#[must_use]
pub fn spawn(table: Table) -> (TableHandle, mpsc::UnboundedReceiver<TableEvent>, JoinHandle<()>) {
    let (commands, inbox) = mpsc::channel(table.config().channel_capacity.max(1));
    let (events, outbox) = mpsc::unbounded_channel();
    let span = info_span!("table", id = table.config().id);
    let task = tokio::spawn(run(table, inbox, events).instrument(span));
    (TableHandle { commands }, outbox, task)
}

/// Shorthand for [`spawn`] on a freshly shuffled table
#[must_use]
pub fn spawn_table(
    config: TableConfig,
) -> (TableHandle, mpsc::UnboundedReceiver<TableEvent>, JoinHandle<()>) {
    spawn(Table::new(config))
}

async fn run(
    mut table: Table,
    mut inbox: mpsc::Receiver<TableCommand>,
    events: mpsc::UnboundedSender<TableEvent>,
) {
    let emitter = Emitter {
        events,
        timeout: table.config().decision_timeout,
    };
    emitter.dealt(&table);

    while let Some(command) = inbox.recv().await {
        match command {
            TableCommand::Bid { seat, code, reply } => {
                let outcome = table.bid(seat, code);
                if let (Ok(outcome), Ok(raw)) = (&outcome, RawBid::decode(code)) {
                    emitter.bid(&table, raw, outcome);
                }
                reply.send(outcome).ok();
            }
            TableCommand::Play {
                actor,
                seat,
                code,
                reply,
            } => {
                let result = table.play(actor, seat, code);
                if let Ok(result) = &result {
                    emitter.played(&table, result);
                }
                reply.send(result).ok();
            }
            TableCommand::AutoPlay { reply } => {
                let result = table.auto_play();
                if let Ok(result) = &result {
                    emitter.played(&table, result);
                }
                reply.send(result).ok();
            }
            TableCommand::NextDeal { reply } => {
                let dealer = table.next_deal();
                if dealer.is_ok() {
                    emitter.dealt(&table);
                }
                reply.send(dealer).ok();
            }
        }
    }

    debug!("all handles dropped, closing table");
}

struct Emitter {
    events: mpsc::UnboundedSender<TableEvent>,
    timeout: Duration,
}

impl Emitter {
    fn emit(&self, event: TableEvent) {
        // A session layer that stopped listening is not the table's concern
        self.events.send(event).ok();
    }

    fn dealt(&self, table: &Table) {
        self.emit(TableEvent::Dealt {
            dealer: table.dealer(),
            deal: *table.dealt(),
        });
        if let (Some(seat), Some(forbidden)) = (table.next_bidder(), table.forbidden_bids()) {
            self.bid_turn(seat, forbidden);
        }
    }

    fn bid_turn(&self, seat: Seat, forbidden: BidSet) {
        self.emit(TableEvent::BidTurn {
            seat,
            forbidden,
            timeout: self.timeout,
        });
    }

    fn bid(&self, table: &Table, raw: RawBid, outcome: &BidOutcome) {
        self.emit(TableEvent::Called {
            seat: raw.seat,
            value: raw.value,
        });
        match *outcome {
            BidOutcome::Continue { next, forbidden } => self.bid_turn(next, forbidden),
            BidOutcome::Complete {
                declaration,
                turn,
                legal,
            } => {
                self.emit(TableEvent::Declared(declaration));
                self.play_turn(turn, legal);
            }
            BidOutcome::Reshuffle { .. } => {
                self.emit(TableEvent::Reshuffled);
                self.dealt(table);
            }
        }
    }

    fn play_turn(&self, turn: Turn, legal: LegalPlay) {
        self.emit(TableEvent::PlayTurn {
            turn,
            legal,
            timeout: self.timeout,
        });
    }

    fn played(&self, table: &Table, result: &PlayResult) {
        self.emit(TableEvent::Played(result.clone()));
        match result.next {
            Some((turn, legal)) => self.play_turn(turn, legal),
            None => {
                let declarer_tricks = table
                    .engine()
                    .map_or(0, |engine| engine.tricks_won(engine.declaration().declarer));
                self.emit(TableEvent::Finished { declarer_tricks });
            }
        }
    }
}
