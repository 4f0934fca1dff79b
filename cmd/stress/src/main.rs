//! Stress test - close racing send/receive
//!
//! Every round builds a fresh channel, starts senders and receivers, and
//! releases two closers at the same time. Each guarded call must come back
//! with a well-formed outcome:
//!
//! - exactly one closer wins; the other gets a double-close fault
//! - senders stop on a send-on-closed fault
//! - receivers stop on `ClosedChannel`, after the buffer drains
//! - every value a sender saw accepted is received exactly once
//!
//! Usage: `stress [rounds]`
//!
//! Environment:
//! - `SAFECHAN_STRESS_ROUNDS` - rounds when no CLI argument is given (1000)
//! - `SAFECHAN_STRESS_SENDERS` - sender threads per round (4)
//! - `SAFECHAN_STRESS_RECEIVERS` - receiver threads per round (2)
//! - `SAFECHAN_STRESS_CAPACITY` - largest buffer; rounds cycle 0..=N (2)

use safechan::{channel, Chan, ErrorKind, GuardError, GuardResultExt};
use safechan_core::{env_get, kinfo, kprint, kwarn, CLOSE_OF_CLOSED, SEND_ON_CLOSED};
use std::panic;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Barrier;
use std::thread;
use std::time::Instant;

/// Values each sender tries before giving up on its own
const SENDS_PER_SENDER: u64 = 16;

#[derive(Debug, Clone, Copy)]
struct StressConfig {
    rounds: usize,
    senders: usize,
    receivers: usize,
    capacity: usize,
}

impl StressConfig {
    fn from_env() -> Self {
        Self {
            rounds: env_get("SAFECHAN_STRESS_ROUNDS", 1000),
            senders: env_get("SAFECHAN_STRESS_SENDERS", 4),
            receivers: env_get("SAFECHAN_STRESS_RECEIVERS", 2),
            capacity: env_get("SAFECHAN_STRESS_CAPACITY", 2),
        }
    }

    fn rounds(mut self, rounds: usize) -> Self {
        self.rounds = rounds;
        self
    }
}

/// Outcome tallies across all rounds
#[derive(Default)]
struct Tally {
    by_kind: [AtomicU64; 4],
    sent: AtomicU64,
    received: AtomicU64,
    closes_won: AtomicU64,
    malformed: AtomicU64,
}

impl Tally {
    fn record(&self, err: &GuardError) {
        self.by_kind[err.kind().code() as usize - 1].fetch_add(1, Ordering::Relaxed);
    }

    fn flag(&self, what: &str, err: Option<&GuardError>) {
        self.malformed.fetch_add(1, Ordering::Relaxed);
        match err {
            Some(err) => kwarn!("malformed {} outcome: {}", what, err),
            None => kwarn!("malformed {} outcome: unexpected success", what),
        }
    }
}

fn main() {
    kprint::init();

    // Faults are provoked on purpose; keep the default hook for anything else.
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let text = info
            .payload()
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| info.payload().downcast_ref::<String>().map(String::as_str));
        if !matches!(text, Some(CLOSE_OF_CLOSED) | Some(SEND_ON_CLOSED)) {
            previous(info);
        }
    }));

    println!("=== safechan Stress Test ===\n");

    let mut config = StressConfig::from_env();
    if let Some(rounds) = std::env::args().nth(1).and_then(|s| s.parse().ok()) {
        config = config.rounds(rounds);
    }
    let config = StressConfig {
        senders: config.senders.max(1),
        receivers: config.receivers.max(1),
        ..config
    };

    kinfo!(
        "stress: {} rounds, {} senders, {} receivers, capacity 0..={}",
        config.rounds,
        config.senders,
        config.receivers,
        config.capacity
    );

    let tally = Tally::default();
    let start = Instant::now();

    check_nil_channel(&tally);

    for round in 0..config.rounds {
        run_round(&config, round % (config.capacity + 1), &tally);

        if (round + 1) % 100 == 0 {
            print!("\rRounds: {}/{}", round + 1, config.rounds);
        }
    }

    let elapsed = start.elapsed();
    let sent = tally.sent.load(Ordering::Relaxed);
    let received = tally.received.load(Ordering::Relaxed);
    let malformed = tally.malformed.load(Ordering::Relaxed);

    println!("\n\n=== Results ===");
    println!("Rounds:          {}", config.rounds);
    println!("Closes won:      {}", tally.closes_won.load(Ordering::Relaxed));
    println!("Values sent:     {}", sent);
    println!("Values received: {}", received);
    for kind in ErrorKind::ALL {
        println!(
            "{:<16} {}",
            format!("{}:", kind),
            tally.by_kind[kind.code() as usize - 1].load(Ordering::Relaxed)
        );
    }
    println!("Malformed:       {}", malformed);
    println!("Time:            {:?}", elapsed);
    println!(
        "Throughput:      {:.0} rounds/sec",
        config.rounds as f64 / elapsed.as_secs_f64()
    );

    kinfo!(
        "stress done: sent={} received={} malformed={}",
        sent,
        received,
        malformed
    );

    if malformed > 0 || sent != received {
        println!("\n=== Stress Test FAILED ===");
        std::process::exit(1);
    }
    println!("\n=== Stress Test Complete ===");
}

/// Nil handles fail fast on every operation
fn check_nil_channel(tally: &Tally) {
    let nil: Chan<u64> = Chan::nil();
    let outcomes = [
        channel::close(&nil).err(),
        channel::send(&nil, 1).err(),
        channel::receive(&nil).into_pair().1,
    ];
    for outcome in outcomes {
        match outcome {
            Some(err) if err.kind() == ErrorKind::NilChannel => tally.record(&err),
            other => tally.flag("nil channel", other.as_ref()),
        }
    }
}

fn run_round(config: &StressConfig, capacity: usize, tally: &Tally) {
    let ch: Chan<u64> = Chan::new(capacity);
    let go = Barrier::new(2);

    thread::scope(|s| {
        for sender in 0..config.senders {
            let ch = &ch;
            s.spawn(move || {
                for i in 0..SENDS_PER_SENDER {
                    match channel::send(ch, sender as u64 * SENDS_PER_SENDER + i) {
                        Ok(()) => {
                            tally.sent.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(err) if err.is_fault() && err.fault() == Some(SEND_ON_CLOSED) => {
                            tally.record(&err);
                            return;
                        }
                        Err(err) => {
                            tally.flag("send", Some(&err));
                            return;
                        }
                    }
                }
            });
        }

        for _ in 0..config.receivers {
            let ch = &ch;
            s.spawn(move || loop {
                match channel::receive(ch) {
                    Ok(_) => {
                        tally.received.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(err) if err.kind() == ErrorKind::ClosedChannel => {
                        tally.record(&err);
                        return;
                    }
                    Err(err) => {
                        tally.flag("receive", Some(&err));
                        return;
                    }
                }
            });
        }

        let closers: Vec<_> = (0..2)
            .map(|_| {
                let (ch, go) = (&ch, &go);
                s.spawn(move || {
                    go.wait();
                    channel::close(ch)
                })
            })
            .collect();

        let mut won = 0;
        for closer in closers {
            match closer.join() {
                Ok(Ok(())) => won += 1,
                Ok(Err(err)) if err.is_fault() && err.fault() == Some(CLOSE_OF_CLOSED) => {
                    tally.record(&err);
                }
                Ok(Err(err)) => tally.flag("close", Some(&err)),
                Err(_) => tally.flag("close", None),
            }
        }

        tally.closes_won.fetch_add(won, Ordering::Relaxed);
        if won != 1 {
            kwarn!("round with capacity {}: {} closers won", capacity, won);
            tally.malformed.fetch_add(1, Ordering::Relaxed);
        }
    });
}
