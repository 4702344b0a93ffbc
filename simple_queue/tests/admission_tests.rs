// Admission behaviour of lines, selectors and the arrival generator,
// exercised through the public `des` API.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use des::{
    Admission, ArrivalGenerator, BoundedLine, Customer, LineSelector, MillisRange, RunState,
    ShortestLine, SimulationConfig, StatisticsRegister,
};

fn build_lines(config: &SimulationConfig) -> Arc<Vec<BoundedLine>> {
    Arc::new(
        (0..config.lines)
            .map(|i| BoundedLine::new(i, config.capacity))
            .collect(),
    )
}

fn fill(line: &BoundedLine, count: usize, first_id: usize) {
    for id in first_id..first_id + count {
        assert!(line.try_admit(Customer::new(id)));
    }
}

#[test]
fn given_capacity_one_line_when_two_arrive_back_to_back_then_second_waits_and_leaves() {
    // GIVEN: one line of capacity one, and nobody serving it
    let config = SimulationConfig {
        retry_wait_ms: 20,
        arrival_interval_ms: MillisRange::new(1, 1),
        ..SimulationConfig::bank()
    }
    .with_servers(1, 1)
    .with_capacity(1);
    let lines = build_lines(&config);
    let stats = Arc::new(StatisticsRegister::new());
    let generator = ArrivalGenerator::new(
        &config,
        Arc::clone(&lines),
        Arc::clone(&stats),
        Arc::new(RunState::new()),
    )
    .unwrap();
    let mut rng = rand::rng();

    // WHEN: two customers arrive before any removal
    let first = generator.arrive(&mut rng);
    let started = std::time::Instant::now();
    let second = generator.arrive(&mut rng);

    // THEN: the first is admitted, the second waits once and then leaves
    assert_eq!(first.line(), Some(0));
    assert_eq!(second, Admission::Left { customer: Customer::new(2) });
    assert!(started.elapsed() >= Duration::from_millis(20));

    // THEN: it is counted as left exactly once and never as served
    let snapshot = stats.snapshot();
    assert_eq!(snapshot.arrived, 2);
    assert_eq!(snapshot.left, 1);
    assert_eq!(snapshot.served, 0);
    assert_eq!(snapshot.in_flight(), 1);
}

#[test]
fn given_sizes_2_1_3_when_selecting_then_shortest_is_always_chosen() {
    let config = SimulationConfig::grocery();
    let lines = build_lines(&config);
    fill(&lines[0], 2, 1);
    fill(&lines[1], 1, 10);
    fill(&lines[2], 3, 20);

    let mut rng = rand::rng();
    for _ in 0..500 {
        assert_eq!(ShortestLine.select(&lines, &mut rng), Some(1));
    }
}

#[test]
fn given_tied_lines_when_selecting_many_times_then_both_are_picked_evenly() {
    let config = SimulationConfig::grocery();
    let lines = build_lines(&config);
    fill(&lines[0], 2, 1);
    fill(&lines[1], 2, 10);
    fill(&lines[2], 4, 20);

    let mut rng = rand::rng();
    let mut counts = [0usize; 3];
    for _ in 0..6000 {
        counts[ShortestLine.select(&lines, &mut rng).unwrap()] += 1;
    }

    assert_eq!(counts[2], 0, "a full line must never be selected");
    let ratio = counts[0] as f64 / counts[1] as f64;
    assert!((0.85..1.15).contains(&ratio), "counts {:?}", counts);
}

#[test]
fn given_concurrent_producer_and_consumer_when_streaming_then_order_is_fifo() {
    // GIVEN: a small line so the producer keeps hitting the capacity limit
    let line = Arc::new(BoundedLine::new(0, 3));
    let total = 500;

    let producer = {
        let line = Arc::clone(&line);
        thread::spawn(move || {
            for id in 1..=total {
                while !line.try_admit(Customer::new(id)) {
                    assert!(line.size() <= line.capacity());
                    thread::yield_now();
                }
            }
        })
    };

    // WHEN: a consumer removes everything
    let mut removed = Vec::with_capacity(total);
    while removed.len() < total {
        if let Some(customer) = line.try_remove(Duration::from_millis(50)) {
            removed.push(customer.id);
        }
    }
    producer.join().unwrap();

    // THEN: customers come out in the order they went in
    let expected: Vec<usize> = (1..=total).collect();
    assert_eq!(removed, expected);
    assert!(line.is_empty());
}

#[test]
fn given_many_admitters_when_racing_for_last_slot_then_exactly_one_wins() {
    for _ in 0..50 {
        let line = Arc::new(BoundedLine::new(0, 4));
        fill(&line, 3, 1);

        let winners: usize = (0..6)
            .map(|t| {
                let line = Arc::clone(&line);
                thread::spawn(move || line.try_admit(Customer::new(100 + t)) as usize)
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .sum();

        assert_eq!(winners, 1);
        assert_eq!(line.size(), 4);
    }
}
