//! Property-based tests over entry accounting, upkeep, and winner selection.

use proptest::prelude::*;

use fairdraw_core::adapters::{InMemoryBank, InMemoryOracle};
use fairdraw_core::config::RoundConfig;
use fairdraw_core::engine::DrawEngine;
use fairdraw_core::randomness::winner_index;
use fairdraw_core::round::Round;
use fairdraw_core::upkeep::check_upkeep;
use fairdraw_core::{Amount, DrawError, ParticipantId, RandomnessSource};

const FEE: Amount = 10;
const INTERVAL_MS: i64 = 100;

fn pbt_config() -> RoundConfig {
    RoundConfig::builder()
        .entrance_fee(FEE)
        .interval_ms(INTERVAL_MS)
        .build()
        .expect("valid config")
}

fn pbt_engine(seed: u64) -> (DrawEngine<InMemoryOracle, InMemoryBank>, InMemoryBank) {
    let bank = InMemoryBank::new();
    let engine = DrawEngine::new(pbt_config(), InMemoryOracle::new(seed), bank.clone(), 0)
        .expect("engine construction");
    (engine, bank)
}

fn pid(index: usize) -> ParticipantId {
    ParticipantId::from_label(&format!("player-{index}"))
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        .. ProptestConfig::default()
    })]

    #[test]
    fn paid_entries_grow_count_and_pool_in_lockstep(
        amounts in proptest::collection::vec(FEE..FEE + 1_000, 1..32),
    ) {
        let (mut engine, _bank) = pbt_engine(0);
        let mut expected_pool: Amount = 0;

        for (i, amount) in amounts.iter().enumerate() {
            let accepted = engine.enter(pid(i), *amount).expect("paid entry");
            expected_pool += amount;
            prop_assert_eq!(accepted.slot, i);
            prop_assert_eq!(engine.round().participant_count(), i + 1);
            prop_assert_eq!(engine.round().pool(), expected_pool);
        }
    }

    #[test]
    fn underpaid_entries_change_nothing(
        paid in 0usize..8,
        short_amounts in proptest::collection::vec(0..FEE, 1..16),
    ) {
        let (mut engine, _bank) = pbt_engine(0);
        for i in 0..paid {
            engine.enter(pid(i), FEE).expect("paid entry");
        }
        let count = engine.round().participant_count();
        let pool = engine.round().pool();

        for amount in short_amounts {
            let err = engine.enter(pid(999), amount).unwrap_err();
            prop_assert!(
                matches!(err, DrawError::InsufficientFee { .. }),
                "unexpected error: {:?}",
                err
            );
            prop_assert_eq!(engine.round().participant_count(), count);
            prop_assert_eq!(engine.round().pool(), pool);
        }
    }

    #[test]
    fn winner_index_is_always_in_range(
        random_value in any::<u64>(),
        count in 1usize..512,
    ) {
        let index = winner_index(random_value, count).expect("nonzero count");
        prop_assert!(index < count);
        prop_assert_eq!(index as u64, random_value % count as u64);
    }

    #[test]
    fn upkeep_check_is_pure_and_repeatable(
        entries in 0usize..8,
        elapsed in 0i64..10_000,
    ) {
        let mut round = Round::open(0);
        let config = pbt_config();
        for i in 0..entries {
            fairdraw_core::ledger::enter(&mut round, &config, pid(i), FEE).expect("entry");
        }
        let snapshot = round.clone();

        let first = check_upkeep(&round, &config, elapsed);
        let second = check_upkeep(&round, &config, elapsed);
        prop_assert_eq!(first, second);
        prop_assert_eq!(&round, &snapshot);
        prop_assert_eq!(first.interval_elapsed, elapsed >= INTERVAL_MS);
        prop_assert_eq!(first.has_participants, entries > 0);
        prop_assert_eq!(
            first.needed(),
            elapsed >= INTERVAL_MS && entries > 0
        );
    }

    #[test]
    fn calculating_round_rejects_any_amount(amount in any::<Amount>()) {
        let (mut engine, _bank) = pbt_engine(0);
        engine.enter(pid(0), FEE).expect("paid entry");
        engine.perform_upkeep(INTERVAL_MS).expect("upkeep");

        let err = engine.enter(pid(1), amount).unwrap_err();
        prop_assert!(matches!(err, DrawError::RoundNotOpen));
        prop_assert_eq!(engine.round().participant_count(), 1);
    }

    #[test]
    fn full_cycle_pays_the_modular_winner(
        entries in 1usize..32,
        random_value in any::<u64>(),
        seed in any::<u64>(),
    ) {
        let (mut engine, bank) = pbt_engine(seed);
        for i in 0..entries {
            engine.enter(pid(i), FEE).expect("paid entry");
        }
        let pool = engine.round().pool();
        let expected_winner = pid((random_value % entries as u64) as usize);

        let started = engine.perform_upkeep(INTERVAL_MS).expect("upkeep");
        let caller = engine.oracle().id();
        let completed = engine
            .complete_draw(caller, started.request_id, random_value, INTERVAL_MS)
            .expect("draw completes");

        prop_assert_eq!(completed.winner, expected_winner);
        prop_assert_eq!(completed.amount, pool);
        prop_assert_eq!(bank.balance(&expected_winner), pool);
        prop_assert_eq!(bank.total(), pool);
        prop_assert!(engine.round().is_open());
        prop_assert_eq!(engine.round().participant_count(), 0);
        prop_assert_eq!(engine.round().pool(), 0);
    }
}
