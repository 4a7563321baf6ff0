//! Performance benchmarks for reconciliation and vote ranking

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use spothouse::config::RoomSettings;
use spothouse::room::ranking;
use spothouse::room::reconcile;
use spothouse::{IncomingSong, RoomStore, Song, VoteDirection, VoteOrder};
use std::collections::HashSet;

fn playlist(prefix: &str, count: usize) -> Vec<IncomingSong> {
    (0..count)
        .map(|i| IncomingSong {
            name: format!("{} {}", prefix, i),
            artist: "Bench Artist".to_string(),
            artwork: String::new(),
            uri: format!("spotify:track:{}-{}", prefix, i),
        })
        .collect()
}

fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile_merge");

    for size in [10usize, 100, 500] {
        let current: Vec<Song> = playlist("held", size).iter().map(Song::admitted).collect();
        let known: HashSet<String> = current.iter().map(|s| s.track_uri.clone()).collect();

        // Half overlap with the held queue, half new
        let mut incoming = playlist("held", size / 2);
        incoming.extend(playlist("fresh", size / 2));

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                reconcile::merge(black_box(&current), black_box(&known), black_box(&incoming))
                    .unwrap()
            })
        });
    }

    group.finish();
}

fn bench_rank(c: &mut Criterion) {
    let mut group = c.benchmark_group("vote_rank");

    for size in [10usize, 100, 500] {
        let songs: Vec<Song> = playlist("rank", size)
            .iter()
            .enumerate()
            .map(|(i, incoming)| {
                let mut song = Song::admitted(incoming);
                song.vote_count = (i % 7) as i64;
                song
            })
            .collect();
        let target = format!("rank {}", size / 2);

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                let mut queue = songs.clone();
                ranking::apply_vote(&mut queue, black_box(&target), VoteDirection::Up);
                ranking::rank(&mut queue, VoteOrder::Descending);
                queue
            })
        });
    }

    group.finish();
}

fn bench_store_round_trip(c: &mut Criterion) {
    let store = RoomStore::new(RoomSettings::default());
    store.create_room(1, "Bench Host").unwrap();
    store.reconcile(1, &playlist("store", 100)).unwrap();
    let resubmission = playlist("store", 100);

    c.bench_function("store_reconcile_then_vote", |b| {
        b.iter(|| {
            store.reconcile(1, black_box(&resubmission)).unwrap();
            store.vote(1, black_box("store 42"), VoteDirection::Up).unwrap()
        })
    });
}

criterion_group!(benches, bench_merge, bench_rank, bench_store_round_trip);
criterion_main!(benches);
