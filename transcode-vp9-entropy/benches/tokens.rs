//! Coefficient coding benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use transcode_vp9_entropy::adapt::adapt;
use transcode_vp9_entropy::block::{decode_block, encode_block};
use transcode_vp9_entropy::forward_update::search_updates;
use transcode_vp9_entropy::{
    BlockInfo, BoolDecoder, BoolEncoder, CoefCodingConfig, CoefCounts, CoefProbs, FrameKind,
    PlaneType, RefType, TokenCache, TxSize, TxType,
};

fn generate_coeffs(tx_size: TxSize) -> Vec<i32> {
    // Energy concentrated at low frequencies, like quantized residuals.
    let size = tx_size.size();
    let mut coeffs = vec![0i32; tx_size.num_coeffs()];
    for row in 0..size {
        for col in 0..size {
            let dist = row + col;
            if dist < size / 2 && (row * 7 + col * 3) % 4 != 0 {
                let magnitude = (96 >> dist.min(6)) as i32 + 1;
                coeffs[row * size + col] = if (row + col) % 2 == 0 { magnitude } else { -magnitude };
            }
        }
    }
    coeffs
}

const SIZES: [(TxSize, &str); 4] = [
    (TxSize::Tx4x4, "4x4"),
    (TxSize::Tx8x8, "8x8"),
    (TxSize::Tx16x16, "16x16"),
    (TxSize::Tx32x32, "32x32"),
];

fn bench_encode_block(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_block");
    let probs = CoefProbs::defaults();

    for (tx_size, name) in SIZES {
        let block = BlockInfo::new(tx_size, TxType::DctDct, PlaneType::Y, RefType::Inter);
        let coeffs = generate_coeffs(tx_size);
        group.throughput(Throughput::Elements(tx_size.num_coeffs() as u64));

        group.bench_with_input(BenchmarkId::from_parameter(name), &coeffs, |b, coeffs| {
            let mut cache = TokenCache::new();
            let mut counts = CoefCounts::new();
            b.iter(|| {
                let mut writer = BoolEncoder::with_capacity(4096);
                let eob = encode_block(&mut writer, &block, &probs, coeffs, 1, &mut cache, Some(&mut counts));
                black_box((eob, writer.finish()))
            });
        });
    }

    group.finish();
}

fn bench_decode_block(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_block");
    let probs = CoefProbs::defaults();

    for (tx_size, name) in SIZES {
        let block = BlockInfo::new(tx_size, TxType::DctDct, PlaneType::Y, RefType::Inter);
        let coeffs = generate_coeffs(tx_size);
        let mut writer = BoolEncoder::new();
        encode_block(&mut writer, &block, &probs, &coeffs, 1, &mut TokenCache::new(), None);
        let data = writer.finish();
        group.throughput(Throughput::Bytes(data.len() as u64));

        group.bench_with_input(BenchmarkId::from_parameter(name), &data, |b, data| {
            let mut cache = TokenCache::new();
            let mut out = vec![0i32; tx_size.num_coeffs()];
            b.iter(|| {
                let mut reader = BoolDecoder::new(data).unwrap();
                let eob = decode_block(&mut reader, &block, &probs, &mut out, 1, &mut cache, None).unwrap();
                black_box(eob)
            });
        });
    }

    group.finish();
}

fn frame_counts(probs: &CoefProbs) -> CoefCounts {
    let mut counts = CoefCounts::new();
    let mut cache = TokenCache::new();
    let mut writer = BoolEncoder::new();
    for (i, plane) in [PlaneType::Y, PlaneType::Uv].into_iter().enumerate() {
        for ref_type in RefType::ALL {
            let block = BlockInfo::new(TxSize::Tx8x8, TxType::DctDct, plane, ref_type);
            for ctx in 0..3 {
                let coeffs = generate_coeffs(TxSize::Tx8x8);
                encode_block(&mut writer, &block, probs, &coeffs, (ctx + i) % 3, &mut cache, Some(&mut counts));
            }
        }
    }
    counts
}

fn bench_probability_updates(c: &mut Criterion) {
    let mut group = c.benchmark_group("probability_updates");
    let probs = CoefProbs::defaults();
    let counts = frame_counts(&probs);
    let config = CoefCodingConfig::default();

    group.bench_function("search_updates", |b| {
        b.iter(|| black_box(search_updates(&probs, &counts, &config)))
    });

    group.bench_function("adapt", |b| {
        b.iter(|| {
            let mut adapted = probs.clone();
            adapt(&mut adapted, &probs, &counts, FrameKind::Inter, &config);
            black_box(adapted)
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_encode_block,
    bench_decode_block,
    bench_probability_updates,
);
criterion_main!(benches);
