//! Benchmarks for playlist rewriting
//!
//! Measures line classification and URI rewriting on typical live and VOD playlists.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use hlsrelay::playlist::{base_url, rewrite, RewriteOptions};
use url::Url;

const MASTER: &str = "#EXTM3U\n\
#EXT-X-STREAM-INF:BANDWIDTH=5000000,RESOLUTION=1920x1080\n\
1080p/index.m3u8\n\
#EXT-X-STREAM-INF:BANDWIDTH=2800000,RESOLUTION=1280x720\n\
720p/index.m3u8\n\
#EXT-X-STREAM-INF:BANDWIDTH=800000,RESOLUTION=640x360\n\
https://edge2.example.net/live/360p/index.m3u8\n";

/// Media playlist with `count` segments
fn media_playlist(count: usize) -> String {
    let mut out = String::from("#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-TARGETDURATION:6\n");
    out.push_str("#EXT-X-KEY:METHOD=AES-128,URI=\"../keys/k1.bin\"\n");
    for i in 0..count {
        out.push_str("#EXTINF:6.006,\n");
        out.push_str(&format!("seg-{:06}.ts?token=abc123&exp=1700000000\n", i));
    }
    out.push_str("#EXT-X-ENDLIST\n");
    out
}

fn playlist_base() -> Url {
    base_url(&Url::parse("https://cdn.example.com/live/channel-1/index.m3u8").unwrap())
}

fn bench_master(c: &mut Criterion) {
    let base = playlist_base();
    let options = RewriteOptions::default();

    c.bench_function("rewrite_master", |b| {
        b.iter(|| rewrite(black_box(MASTER), &base, &options))
    });
}

fn bench_media(c: &mut Criterion) {
    let mut group = c.benchmark_group("rewrite_media");
    let base = playlist_base();

    for count in [10usize, 100, 1000] {
        let playlist = media_playlist(count);
        group.throughput(Throughput::Bytes(playlist.len() as u64));

        group.bench_with_input(BenchmarkId::new("plain", count), &playlist, |b, p| {
            b.iter(|| rewrite(black_box(p), &base, &RewriteOptions::default()))
        });

        let options = RewriteOptions {
            relay_prefix: "https://relay.example.com",
            attribute_uris: true,
        };
        group.bench_with_input(BenchmarkId::new("attributes", count), &playlist, |b, p| {
            b.iter(|| rewrite(black_box(p), &base, &options))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_master, bench_media);
criterion_main!(benches);
