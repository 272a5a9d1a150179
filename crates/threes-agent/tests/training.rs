use std::{sync::Arc, thread};

use rand::SeedableRng as _;
use rand_pcg::Pcg32;
use tempfile::TempDir;
use threes_agent::{
    agent::{RandomPlacer, SliderKind, TdAgent, TupleVariant},
    config::AgentConfig,
    episode::play_episode,
    weights::WeightStore,
};
use threes_engine::Board;

fn nonzero_weights(weights: &WeightStore) -> usize {
    weights
        .tables()
        .iter()
        .map(|table| table.iter().filter(|&w| w != 0.0).count())
        .sum()
}

#[test]
fn test_four_tuple_learns_from_episodes() {
    let config = AgentConfig::default();
    let kind = SliderKind::from_config(&config).unwrap();
    let weights = kind.load_weights(&config).unwrap().unwrap();
    let mut rng = Pcg32::seed_from_u64(1);
    let mut slider = kind.build(&config, Some(&weights), &mut rng).unwrap();
    let mut placer = RandomPlacer::new("placer", Pcg32::seed_from_u64(2));

    for _ in 0..10 {
        let record = play_episode(slider.as_mut(), &mut placer, None).unwrap();
        assert!(record.slides > 0);
    }
    assert!(nonzero_weights(&weights) > 0);
}

#[test]
fn test_parallel_workers_share_weights() {
    let network = TupleVariant::FourTuple.network();
    let weights = Arc::new(WeightStore::with_sizes(&network.table_sizes()).unwrap());
    let config = AgentConfig::default();
    let learner =
        TdAgent::<Board>::from_config(TupleVariant::FourTuple, &config, Arc::clone(&weights))
            .unwrap();

    thread::scope(|s| {
        for seed in 0..4 {
            let mut slider = learner.worker();
            s.spawn(move || {
                let mut placer = RandomPlacer::new("placer", Pcg32::seed_from_u64(seed));
                for _ in 0..5 {
                    play_episode(&mut slider, &mut placer, None).unwrap();
                }
            });
        }
    });

    assert_eq!(Arc::strong_count(&weights), 2);
    assert!(nonzero_weights(&weights) > 0);
}

#[test]
fn test_trained_weights_survive_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("four-tuple.bin");

    let config = AgentConfig::default();
    let kind = SliderKind::from_config(&config).unwrap();
    let weights = kind.load_weights(&config).unwrap().unwrap();
    let mut slider = kind
        .build(&config, Some(&weights), &mut Pcg32::seed_from_u64(0))
        .unwrap();
    let mut placer = RandomPlacer::new("placer", Pcg32::seed_from_u64(7));
    play_episode(slider.as_mut(), &mut placer, None).unwrap();
    weights.save(&path).unwrap();

    let config: AgentConfig = format!("load={}", path.display()).parse().unwrap();
    let loaded = kind.load_weights(&config).unwrap().unwrap();
    assert_eq!(loaded.table_sizes(), weights.table_sizes());
    for (a, b) in loaded.tables().iter().zip(weights.tables()) {
        assert!(a.iter().eq(b.iter()));
    }
}

#[test]
fn test_mismatched_weight_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("small.bin");
    WeightStore::with_sizes(&[16, 16]).unwrap().save(&path).unwrap();

    let config: AgentConfig = format!("name=six-tuple load={}", path.display())
        .parse()
        .unwrap();
    let kind = SliderKind::from_config(&config).unwrap();
    assert_eq!(kind.to_string(), "six-tuple");
    assert!(kind.load_weights(&config).is_err());
}

#[test]
fn test_six_tuple_agent_plays() {
    let config: AgentConfig = "name=six-tuple".parse().unwrap();
    let kind = SliderKind::from_config(&config).unwrap();
    let weights = kind.load_weights(&config).unwrap().unwrap();
    assert_eq!(weights.table_count(), 32);
    let mut slider = kind
        .build(&config, Some(&weights), &mut Pcg32::seed_from_u64(0))
        .unwrap();
    assert_eq!(slider.name(), "six-tuple");
    let mut placer = RandomPlacer::new("placer", Pcg32::seed_from_u64(1));
    let record = play_episode(slider.as_mut(), &mut placer, Some(50)).unwrap();
    assert!(record.slides <= 50);
}
