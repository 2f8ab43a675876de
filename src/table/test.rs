use super::*;
use crate::contract::{Bid, Call, Strain};
use crate::deal::{Card, Hand};
use core::str::FromStr as _;
use once_cell::sync::OnceCell;

static LOGGING: OnceCell<()> = OnceCell::new();

/// Send logs to the test writer, filtered by `RUST_LOG`, quiet by default
fn init_logging() {
    LOGGING.get_or_init(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .without_time()
            .try_init()
            .ok();
    });
}

const PASS: BidValue = BidValue::PASS;

fn bid(level: u8, strain: Strain) -> BidValue {
    BidValue::from(Bid::new(level, strain))
}

fn code(seat: Seat, value: BidValue) -> u8 {
    RawBid::new(seat, value).encode()
}

fn card(s: &str) -> Card {
    Card::from_str(s).unwrap()
}

fn fixed_deal() -> Deal {
    Deal(
        [
            "AKQJ.AKQ.AKQ.AKQ",
            "T987.JT9.JT9.JT9",
            "654.8765.876.876",
            "32.432.5432.5432",
        ]
        .map(|hand| Hand::from_str(hand).unwrap()),
    )
}

fn table(dealer: Seat) -> Table {
    init_logging();
    Table::with_deal(
        TableConfig {
            dealer,
            seed: Some(7),
            ..TableConfig::default()
        },
        fixed_deal(),
    )
    .unwrap()
}

/// Feed bids clockwise from the seat due to bid
fn auction(table: &mut Table, values: &[BidValue]) -> Vec<BidOutcome> {
    values
        .iter()
        .map(|&value| {
            let seat = table.next_bidder().unwrap();
            table.bid(seat, code(seat, value)).unwrap()
        })
        .collect()
}

#[test]
fn test_west_declares_one_spade() {
    let mut table = table(Seat::East);
    let outcomes = auction(
        &mut table,
        &[bid(1, Strain::Clubs), PASS, bid(1, Strain::Spades), PASS, PASS],
    );
    assert!(matches!(
        outcomes.last(),
        Some(BidOutcome::Continue {
            next: Seat::South,
            ..
        })
    ));

    let outcome = table.bid(Seat::South, code(Seat::South, PASS)).unwrap();
    let BidOutcome::Complete {
        declaration,
        turn,
        legal,
    } = outcome
    else {
        panic!("auction should be complete: {outcome:?}");
    };
    assert_eq!(declaration.contract.bid, Bid::new(1, Strain::Spades));
    assert_eq!(declaration.bidder, Seat::West);
    assert_eq!(declaration.declarer, Seat::West);
    assert_eq!(declaration.dummy, Seat::East);
    assert_eq!(turn, Turn { seat: Seat::North, actor: Seat::North });
    assert_eq!(legal.default, card("CQ"));
    assert_eq!(legal.default_index, 0);
    assert_eq!(legal.range.max, card("SA"));
    assert_eq!(table.phase(), Phase::Playing);
    assert_eq!(table.next_bidder(), None);
    assert_eq!(table.declaration(), Some(&declaration));
}

#[test]
fn test_forbidden_set_is_reported() {
    let mut table = table(Seat::North);
    assert_eq!(table.forbidden_bids().map(BidSet::len), Some(14));

    let outcome = table.bid(Seat::North, code(Seat::North, bid(1, Strain::Hearts))).unwrap();
    let BidOutcome::Continue { next, forbidden } = outcome else {
        panic!("auction should continue: {outcome:?}");
    };
    assert_eq!(next, Seat::East);
    assert!(forbidden.contains(bid(1, Strain::Diamonds)));
    assert!(!forbidden.contains(bid(1, Strain::Spades)));
    assert!(!forbidden.contains(BidValue::from_call(Call::Double, 1)));
}

#[test]
fn test_protocol_violations_are_dropped() {
    let mut table = table(Seat::North);

    assert_eq!(
        table.bid(Seat::East, code(Seat::East, PASS)),
        Err(ProtocolError::OutOfTurn {
            expected: Seat::North,
            got: Seat::East
        })
    );
    assert_eq!(
        table.bid(Seat::North, code(Seat::South, PASS)),
        Err(ProtocolError::SeatMismatch {
            seat: Seat::North,
            tagged: Seat::South
        })
    );
    assert_eq!(
        table.bid(Seat::North, 0x3F),
        Err(ProtocolError::Bid(DecodeBidError::OutOfRange(0x3F)))
    );
    let double = BidValue::from_call(Call::Double, 1);
    assert_eq!(
        table.bid(Seat::North, code(Seat::North, double)),
        Err(ProtocolError::ForbiddenBid {
            seat: Seat::North,
            value: double
        })
    );
    assert_eq!(
        table.play(Seat::North, Seat::North, card("SA").code()),
        Err(ProtocolError::PhaseMismatch(Phase::Bidding))
    );
    assert!(table.history().is_empty());
    assert_eq!(table.auto_play(), Err(ProtocolError::PhaseMismatch(Phase::Bidding)));

    auction(&mut table, &[bid(2, Strain::Clubs)]);
    let insufficient = bid(1, Strain::Notrump);
    assert_eq!(
        table.bid(Seat::East, code(Seat::East, insufficient)),
        Err(ProtocolError::ForbiddenBid {
            seat: Seat::East,
            value: insufficient
        })
    );
    assert_eq!(table.history().len(), 1);
    assert_eq!(table.next_bidder(), Some(Seat::East));
}

#[test]
fn test_four_passes_redeal() {
    let mut table = table(Seat::South);
    let before = *table.dealt();
    let outcomes = auction(&mut table, &[PASS, PASS, PASS, PASS]);
    assert_eq!(
        outcomes.last(),
        Some(&BidOutcome::Reshuffle {
            dealer: Seat::South,
            forbidden: table.forbidden_bids().unwrap(),
        })
    );
    assert!(table.history().is_empty());
    assert_eq!(table.phase(), Phase::Bidding);
    assert_eq!(table.next_bidder(), Some(Seat::South));
    assert_eq!(table.declaration(), None);
    assert_ne!(*table.dealt(), before);
    assert!(table.dealt().0.iter().all(|hand| hand.len() == 13));

    auction(&mut table, &[bid(1, Strain::Notrump)]);
    assert_eq!(
        table.history().first_bid(Seat::South, Strain::Notrump),
        table.history().items().first().map(|item| item.stamp)
    );
    assert_eq!(table.history().items()[0].stamp.get(), 0);
}

#[test]
fn test_board_plays_out_and_rotates_dealer() {
    let mut table = table(Seat::North);
    auction(&mut table, &[bid(3, Strain::Notrump), PASS, PASS, PASS]);
    let declaration = *table.declaration().unwrap();
    assert_eq!(declaration.declarer, Seat::North);
    assert_eq!(declaration.lead, Seat::East);

    let mut plays = 0;
    while table.phase() == Phase::Playing {
        let (turn, _) = table.turn().unwrap();
        if turn.seat == declaration.dummy {
            assert_eq!(turn.actor, declaration.declarer);
        }
        let result = table.auto_play().unwrap();
        assert_eq!(result.seat, turn.seat);
        plays += 1;
    }
    assert_eq!(plays, 52);
    assert_eq!(table.phase(), Phase::Finished);
    assert!(table.deal().0.iter().all(Hand::is_empty));
    assert_eq!(table.dealt().0[0].len(), 13);

    let engine = table.engine().unwrap();
    // North holds every top card and wins all thirteen tricks in notrump
    assert_eq!(engine.tricks_won(Seat::North), 13);

    assert_eq!(table.auto_play(), Err(ProtocolError::PhaseMismatch(Phase::Finished)));
    assert_eq!(
        table.bid(Seat::East, code(Seat::East, PASS)),
        Err(ProtocolError::PhaseMismatch(Phase::Finished))
    );

    assert_eq!(table.next_deal(), Ok(Seat::East));
    assert_eq!(table.phase(), Phase::Bidding);
    assert_eq!(table.next_bidder(), Some(Seat::East));
    assert!(table.history().is_empty());
    assert_eq!(table.next_deal(), Err(ProtocolError::PhaseMismatch(Phase::Bidding)));
}

#[test]
fn test_dummy_is_played_by_declarer() {
    let mut table = table(Seat::North);
    auction(&mut table, &[bid(1, Strain::Spades), PASS, PASS, PASS]);

    table.play(Seat::East, Seat::East, card("HJ").code()).unwrap();
    assert_eq!(
        table.play(Seat::South, Seat::South, card("H5").code()),
        Err(ProtocolError::Play(PlayError::NotController {
            seat: Seat::South,
            actor: Seat::South
        }))
    );
    assert_eq!(
        table.play(Seat::North, Seat::South, 0),
        Err(ProtocolError::Card(DecodeCardError::Cover))
    );

    let result = table.play(Seat::North, Seat::South, card("H8").code()).unwrap();
    assert_eq!(result.seat, Seat::South);
    assert_eq!(result.remaining.len(), 12);
    let (turn, legal) = result.next.unwrap();
    assert_eq!(turn, Turn { seat: Seat::West, actor: Seat::West });
    assert_eq!(legal.default, card("H2"));
}

#[tokio::test]
async fn test_actor_announces_committed_state() {
    init_logging();
    let table = Table::with_deal(
        TableConfig {
            id: 42,
            dealer: Seat::West,
            seed: Some(1),
            decision_timeout: Duration::from_secs(5),
            channel_capacity: 4,
        },
        fixed_deal(),
    )
    .unwrap();
    let (handle, mut events, task) = spawn(table);

    assert_eq!(
        events.recv().await,
        Some(TableEvent::Dealt {
            dealer: Seat::West,
            deal: fixed_deal()
        })
    );
    assert!(matches!(
        events.recv().await,
        Some(TableEvent::BidTurn {
            seat: Seat::West,
            ..
        })
    ));

    assert_eq!(
        handle.bid(Seat::North, code(Seat::North, PASS)).await,
        Err(TableError::Protocol(ProtocolError::OutOfTurn {
            expected: Seat::West,
            got: Seat::North
        }))
    );

    let values = [PASS, bid(1, Strain::Clubs), PASS, PASS, PASS];
    let mut seat = Seat::West;
    for (i, value) in values.into_iter().enumerate() {
        handle.bid(seat, code(seat, value)).await.unwrap();
        assert_eq!(events.recv().await, Some(TableEvent::Called { seat, value }));
        seat = seat.next();
        if i + 1 < values.len() {
            assert!(matches!(
                events.recv().await,
                Some(TableEvent::BidTurn { seat: next, .. }) if next == seat
            ));
        }
    }

    let Some(TableEvent::Declared(declaration)) = events.recv().await else {
        panic!("expected the contract");
    };
    assert_eq!(declaration.declarer, Seat::North);
    let Some(TableEvent::PlayTurn { turn, legal, timeout }) = events.recv().await else {
        panic!("expected the opening lead");
    };
    assert_eq!(turn.seat, Seat::East);
    assert_eq!(timeout, Duration::from_secs(5));

    let result = handle.auto_play().await.unwrap();
    assert_eq!(result.card, legal.default);
    assert_eq!(events.recv().await, Some(TableEvent::Played(result)));
    assert!(matches!(
        events.recv().await,
        Some(TableEvent::PlayTurn { turn, .. })
            if turn == (Turn { seat: Seat::South, actor: Seat::North })
    ));

    assert_eq!(
        handle.next_deal().await,
        Err(TableError::Protocol(ProtocolError::PhaseMismatch(Phase::Playing)))
    );

    drop(handle);
    task.await.unwrap();
    assert_eq!(events.recv().await, None);
}

#[test]
fn test_prearranged_deal_must_be_complete() {
    init_logging();
    assert_eq!(
        Table::with_deal(TableConfig::default(), Deal::default()).err(),
        Some(InvalidDeal::WrongHandSize {
            seat: Seat::North,
            len: 0
        })
    );

    let mut short = fixed_deal();
    short[Seat::South].remove(card("H8"));
    assert_eq!(
        Table::with_deal(TableConfig::default(), short).err(),
        Some(InvalidDeal::WrongHandSize {
            seat: Seat::South,
            len: 12
        })
    );

    let mut doubled = fixed_deal();
    doubled[Seat::West] = Hand::from_str("AKQJ.AKQ.AKQ.AKQ").unwrap();
    assert_eq!(
        Table::with_deal(TableConfig::default(), doubled).err(),
        Some(InvalidDeal::RepeatedCard(card("CQ")))
    );

    let mut table = Table::with_deal(TableConfig::default(), fixed_deal()).unwrap();
    let outcomes = auction(&mut table, &[bid(1, Strain::Clubs), PASS, PASS, PASS]);
    assert!(matches!(outcomes.last(), Some(BidOutcome::Complete { .. })));
}
