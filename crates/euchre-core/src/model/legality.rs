use crate::model::card::Card;
use crate::model::hand::Hand;
use crate::model::suit::Suit;

/// Cards the holder may play into a trick.
///
/// With no lead every card is playable. Otherwise the holder must follow the
/// led suit by effective suit, so a left bower follows trump and never its
/// printed suit. A holder who cannot follow may play anything.
pub fn legal_cards(hand: &Hand, lead: Option<Suit>, trump: Suit) -> Vec<Card> {
    let Some(lead) = lead else {
        return hand.cards().to_vec();
    };

    let following: Vec<Card> = hand
        .iter()
        .copied()
        .filter(|card| card.effective_suit(trump) == lead)
        .collect();

    if following.is_empty() {
        hand.cards().to_vec()
    } else {
        following
    }
}

pub fn is_legal(hand: &Hand, card: Card, lead: Option<Suit>, trump: Suit) -> bool {
    hand.contains(card) && legal_cards(hand, lead, trump).contains(&card)
}

#[cfg(test)]
mod tests {
    use super::{is_legal, legal_cards};
    use crate::model::card::Card;
    use crate::model::deck::Deck;
    use crate::model::hand::Hand;
    use crate::model::player::PlayerPosition;
    use crate::model::rank::Rank;
    use crate::model::suit::Suit;

    fn hand(labels: &[&str]) -> Hand {
        Hand::with_cards(labels.iter().map(|l| Card::parse(l).unwrap()).collect())
    }

    #[test]
    fn leading_allows_everything() {
        let h = hand(&["9C", "JD", "AH", "KS", "10S"]);
        assert_eq!(legal_cards(&h, None, Suit::Hearts), h.cards().to_vec());
    }

    #[test]
    fn must_follow_led_suit() {
        let h = hand(&["9C", "QC", "AH", "KS", "10S"]);
        let legal = legal_cards(&h, Some(Suit::Clubs), Suit::Hearts);
        assert_eq!(
            legal,
            vec![
                Card::new(Rank::Nine, Suit::Clubs),
                Card::new(Rank::Queen, Suit::Clubs)
            ]
        );
    }

    #[test]
    fn left_bower_follows_trump_not_its_printed_suit() {
        let h = hand(&["JC", "AH", "KD", "9D", "10H"]);
        // Spades trump: the Jack of Clubs is a spade.
        let clubs_led = legal_cards(&h, Some(Suit::Clubs), Suit::Spades);
        assert_eq!(clubs_led, h.cards().to_vec(), "no real clubs, may discard");

        let spades_led = legal_cards(&h, Some(Suit::Spades), Suit::Spades);
        assert_eq!(spades_led, vec![Card::new(Rank::Jack, Suit::Clubs)]);
    }

    #[test]
    fn void_in_led_suit_allows_any_card() {
        let h = hand(&["9C", "QC", "AH", "KH", "10H"]);
        let legal = legal_cards(&h, Some(Suit::Diamonds), Suit::Spades);
        assert_eq!(legal.len(), 5);
    }

    #[test]
    fn legality_matches_effective_suit_for_every_deal() {
        for seed in 0..25u64 {
            let deal = Deck::shuffled_with_seed(seed)
                .deal(PlayerPosition::North)
                .unwrap();
            for trump in Suit::ALL {
                for lead in Suit::ALL {
                    for hand in &deal.hands {
                        let legal = legal_cards(hand, Some(lead), trump);
                        let matching: Vec<Card> = hand
                            .iter()
                            .copied()
                            .filter(|c| c.effective_suit(trump) == lead)
                            .collect();
                        if matching.is_empty() {
                            assert_eq!(legal, hand.cards().to_vec());
                        } else {
                            assert_eq!(legal, matching);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn is_legal_requires_ownership() {
        let h = hand(&["9C", "QC"]);
        assert!(is_legal(&h, Card::new(Rank::Nine, Suit::Clubs), None, Suit::Hearts));
        assert!(!is_legal(&h, Card::new(Rank::Ace, Suit::Clubs), None, Suit::Hearts));
    }
}
