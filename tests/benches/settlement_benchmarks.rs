//! # Relay Settlement Benchmarks
//!
//! | Component | Operation |
//! |-----------|-----------|
//! | rs-01 Ticket codec | build + sign one ticket |
//! | rs-01 Win check | verdict over a signed ticket |
//! | rs-01 Secret chain | preimage lookup |
//! | rs-02 Ledger | next-nonce high-water mark over many records |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use primitive_types::U256;
use rs_01_proof_of_relay::{
    is_winning_ticket, win_probability_from_percent, HashedSecretChain, TicketBuilder,
    TicketParams,
};
use rs_02_account_agent::TransactionLedger;
use shared_crypto::Secp256k1KeyPair;
use shared_types::ManualTimeSource;
use std::sync::Arc;

fn bench_ticket_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("rs-01-ticket-codec");
    let signer = Secp256k1KeyPair::from_bytes([0x42; 32]).unwrap();
    let params = TicketParams::new([1; 20], b"s".to_vec(), U256::from(1000u64), 1, "50");

    group.bench_function("build_and_sign", |b| {
        b.iter(|| black_box(TicketBuilder::new(&signer).build(&params).unwrap()))
    });

    group.bench_function("win_probability_from_percent", |b| {
        b.iter(|| black_box(win_probability_from_percent("12.345").unwrap()))
    });

    let issued = TicketBuilder::new(&signer).build(&params).unwrap();
    group.bench_function("is_winning_ticket", |b| {
        b.iter(|| {
            black_box(is_winning_ticket(
                issued.signed.hash(),
                &[7; 32],
                &[9; 32],
                issued.signed.ticket().win_probability,
            ))
        })
    });

    group.finish();
}

fn bench_secret_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("rs-01-secret-chain");

    for length in [100u64, 1_000, 10_000] {
        let chain = HashedSecretChain::new([0x11; 32], length);
        let commitment = chain.initial_commitment();
        group.bench_with_input(BenchmarkId::new("find_pre_image", length), &chain, |b, chain| {
            b.iter(|| black_box(chain.find_pre_image(&commitment).unwrap()))
        });
    }

    group.finish();
}

fn bench_ledger(c: &mut Criterion) {
    let mut group = c.benchmark_group("rs-02-ledger");

    for records in [10u64, 100, 1_000] {
        let ledger = TransactionLedger::new(Arc::new(ManualTimeSource::new(0)));
        for nonce in 0..records {
            let mut hash = [0u8; 32];
            hash[..8].copy_from_slice(&nonce.to_be_bytes());
            ledger.add_pending(hash, nonce);
        }
        group.bench_with_input(
            BenchmarkId::new("max_fresh_pending_nonce", records),
            &ledger,
            |b, ledger| b.iter(|| black_box(ledger.max_fresh_pending_nonce(0, 900_000))),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_ticket_codec, bench_secret_chain, bench_ledger);
criterion_main!(benches);
