//! Concurrent dispatch while health checks run.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;

use provider_balancer::entropy::ThreadRandom;
use provider_balancer::load_balancer::ProviderSettings;
use provider_balancer::{Balancer, QueryPolicy};

mod common;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_dispatch_during_health_checks() {
    let balancer = Arc::new(common::balancer_with(
        &[],
        QueryPolicy::RoundRobin,
        &common::fast_health(1),
        Arc::new(ThreadRandom),
    ));
    let ids: Vec<String> = (0..10).map(|i| format!("p{i}")).collect();
    for id in &ids {
        // Robustness 2: every probe fails half the time.
        let settings = ProviderSettings {
            robustness: 2,
            ..ProviderSettings::default()
        };
        balancer.register_with(id.as_str(), settings).unwrap();
    }
    assert!(balancer.start_health_checker());

    let workers: Vec<_> = (0..4)
        .map(|worker| {
            let balancer = balancer.clone();
            thread::spawn(move || {
                let mut served = 0u64;
                for i in 0..5_000 {
                    if worker % 2 == 1 && i % 100 == 0 {
                        balancer.set_policy(balancer.policy().toggled());
                    }
                    if let Some(id) = balancer.select_one() {
                        assert!(id.as_str().starts_with('p'));
                        served += 1;
                    }
                    if i % 50 == 0 {
                        let snapshot = balancer.snapshot();
                        assert_eq!(snapshot.eligible, snapshot.working_count());
                        assert!(snapshot.cursor < snapshot.providers.len());
                    }
                }
                served
            })
        })
        .collect();

    let prober = {
        let balancer = balancer.clone();
        thread::spawn(move || {
            for _ in 0..500 {
                balancer.run_health_check();
            }
        })
    };

    let mut served = 0;
    for worker in workers {
        served += worker.join().expect("worker panicked");
    }
    prober.join().expect("prober panicked");
    balancer.shutdown().await;

    let snapshot = balancer.snapshot();
    assert_eq!(snapshot.eligible, snapshot.working_count());
    assert!(served > 0);
}

#[test]
fn test_round_robin_fairness_under_contention() {
    let balancer = Arc::new(Balancer::new());
    for id in ["a", "b", "c", "d", "e"] {
        balancer.register_provider(id).unwrap();
    }

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let balancer = balancer.clone();
            thread::spawn(move || {
                let mut counts: HashMap<String, u32> = HashMap::new();
                for _ in 0..1_000 {
                    let id = balancer.select_one().expect("all providers healthy");
                    *counts.entry(id.to_string()).or_default() += 1;
                }
                counts
            })
        })
        .collect();

    let mut totals: HashMap<String, u32> = HashMap::new();
    for worker in workers {
        for (id, count) in worker.join().expect("worker panicked") {
            *totals.entry(id).or_default() += count;
        }
    }
    assert_eq!(totals.len(), 5);
    assert!(totals.values().all(|&count| count == 800), "{totals:?}");
}

#[test]
fn test_capacity_checks_do_not_reserve() {
    let balancer = Arc::new(Balancer::new());
    balancer.register_provider("a").unwrap();
    balancer.register_provider("b").unwrap();
    assert_eq!(balancer.set_provider_capacity("b", 15), Ok(true));

    let workers: Vec<_> = (0..8)
        .map(|_| {
            let balancer = balancer.clone();
            thread::spawn(move || balancer.check_capacity(25))
        })
        .collect();
    for worker in workers {
        assert_eq!(worker.join().expect("worker panicked"), 25);
    }
    assert_eq!(balancer.check_capacity(30), -5);
}

#[test]
fn test_random_dispatch_stays_within_registered() {
    let balancer = common::balancer_with(
        &["x", "y", "z"],
        QueryPolicy::Random,
        &common::fast_health(1),
        Arc::new(ThreadRandom),
    );

    let mut seen: HashMap<String, u32> = HashMap::new();
    for _ in 0..3_000 {
        let id = balancer.select_one().expect("all providers healthy");
        assert!(["x", "y", "z"].contains(&id.as_str()), "unexpected provider {id}");
        *seen.entry(id.to_string()).or_default() += 1;
    }
    assert_eq!(seen.len(), 3, "{seen:?}");
}
