use super::*;

const _: () = {
    let mut code = 1;
    while code <= Card::MAX_CODE {
        let card = match Card::from_code(code) {
            Some(card) => card,
            None => panic!(),
        };
        assert!(Card::new(card.suit(), card.rank()).code() == code);
        code += 1;
    }
    assert!(Card::from_code(0).is_none());
    assert!(Card::from_code(53).is_none());
};

#[test]
fn test_suits_are_contiguous() {
    assert_eq!(Card::new(Suit::Clubs, 2).code(), 1);
    assert_eq!(Card::new(Suit::Clubs, 14).code(), 13);
    assert_eq!(Card::new(Suit::Diamonds, 2).code(), 14);
    assert_eq!(Card::new(Suit::Hearts, 2).code(), 27);
    assert_eq!(Card::new(Suit::Spades, 14).code(), 52);
    assert!(Card::new(Suit::Clubs, 14) < Card::new(Suit::Diamonds, 2));
}

#[test]
fn test_card_codec() {
    assert_eq!(Card::try_from(0), Err(DecodeCardError::Cover));
    assert_eq!(Card::try_from(53), Err(DecodeCardError::OutOfRange(53)));
    assert_eq!(Card::try_from(40), Ok(Card::new(Suit::Spades, 2)));
}

#[test]
fn test_card_parser() {
    assert_eq!("SA".parse(), Ok(Card::new(Suit::Spades, 14)));
    assert_eq!("♥T".parse(), Ok(Card::new(Suit::Hearts, 10)));
    assert_eq!("c10".parse(), Ok(Card::new(Suit::Clubs, 10)));
    assert_eq!("D2".parse(), Ok(Card::new(Suit::Diamonds, 2)));
    assert_eq!("X2".parse::<Card>(), Err(ParseHandError::InvalidSuit));
    assert_eq!("S1".parse::<Card>(), Err(ParseHandError::InvalidRank));
    assert_eq!("SAK".parse::<Card>(), Err(ParseHandError::InvalidRank));
    assert_eq!("S".parse::<Card>(), Err(ParseHandError::InvalidRank));
    assert_eq!(Card::new(Suit::Spades, 12).to_string(), "♠Q");
}

#[test]
fn test_hand_parser() -> Result<(), ParseHandError> {
    assert_eq!(Hand::from_str("-")?, Hand::EMPTY);
    assert_eq!(Hand::from_str("...")?, Hand::EMPTY);
    assert_eq!(Hand::from_str(""), Err(ParseHandError::NotFourSuits));
    assert_eq!(Hand::from_str(".."), Err(ParseHandError::NotFourSuits));
    assert_eq!(Hand::from_str("...."), Err(ParseHandError::NotFourSuits));
    assert_eq!(Hand::from_str("AA..."), Err(ParseHandError::RepeatedCard));
    assert_eq!(Hand::from_str("AX..."), Err(ParseHandError::InvalidRank));
    assert_eq!(
        Hand::from_str("AKQJT98765432.2.."),
        Err(ParseHandError::TooManyCards)
    );

    let hand = Hand::from_str("AT74.QJ9.32.AK64")?;
    assert_eq!(hand.len(), 13);
    assert_eq!(hand.to_string(), "AT74.QJ9.32.AK64");
    assert_eq!(hand[0], Some(Card::new(Suit::Clubs, 4)));
    assert_eq!(hand[12], Some(Card::new(Suit::Spades, 14)));
    Ok(())
}

#[test]
fn test_remove_leaves_empty_slot() -> Result<(), ParseHandError> {
    let mut hand = Hand::from_str("AT74.QJ9.32.AK64")?;
    let queen = Card::new(Suit::Hearts, 12);
    assert_eq!(hand.position(queen), Some(8));
    assert_eq!(hand.remove(queen), Some(8));
    assert_eq!(hand.remove(queen), None);
    assert_eq!(hand[8], None);
    assert_eq!(hand.len(), 12);
    assert!(!hand.contains(queen));
    assert_eq!(hand.to_string(), "AT74.J9.32.AK64");
    assert_eq!(hand.cards().len(), 12);
    Ok(())
}

#[test]
fn test_random_deals() {
    let mut rng = rand::thread_rng();
    (0..10_000).for_each(|_| {
        let deal = Deal::new(&mut rng);
        let mut seen = 0u64;
        for hand in deal.0 {
            assert_eq!(hand.len(), HAND_SIZE);
            let cards = hand.cards();
            assert!(cards.windows(2).all(|pair| pair[0] < pair[1]));
            for card in cards {
                assert_eq!(seen & 1 << card.code(), 0);
                seen |= 1 << card.code();
            }
        }
        assert_eq!(seen.count_ones(), 52);
    });
}

#[test]
fn test_deal_display() -> Result<(), ParseHandError> {
    let north = Hand::from_str("AKQJ.AKQ.AKQ.AKQ")?;
    let east = Hand::from_str("T987.JT9.JT9.JT9")?;
    let south = Hand::from_str("654.8765.876.876")?;
    let west = Hand::from_str("32.432.5432.5432")?;
    let deal = Deal([north, east, south, west]);
    assert_eq!(
        deal.display(Seat::East).to_string(),
        "E:T987.JT9.JT9.JT9 654.8765.876.876 32.432.5432.5432 AKQJ.AKQ.AKQ.AKQ"
    );
    Ok(())
}

#[test]
fn test_suits_and_strains() {
    for suit in Suit::ASC {
        assert_eq!(Suit::try_from(Strain::from(suit)), Ok(suit));
    }
    assert_eq!(Suit::try_from(Strain::Notrump), Err(SuitFromNotrumpError));
}

#[test]
fn test_hands_around_the_table() {
    let deal = Deal::new(&mut rand::thread_rng());
    let seats: Vec<Seat> = deal.around(Seat::South).map(|(seat, _)| seat).collect();
    assert_eq!(seats, [Seat::South, Seat::West, Seat::North, Seat::East]);

    for (seat, hand) in deal.around(Seat::West) {
        assert_eq!(hand, &deal[seat]);
    }
}

#[test]
fn test_shuffled_deals_are_valid() {
    let mut rng = rand::thread_rng();
    for _ in 0..100 {
        assert_eq!(Deal::new(&mut rng).validate(), Ok(()));
    }
    assert_eq!(
        Deal::default().validate(),
        Err(InvalidDeal::WrongHandSize {
            seat: Seat::North,
            len: 0
        })
    );
}
