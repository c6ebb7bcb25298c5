use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use roi_monitor_rs::roi_pipeline::camera::synthetic_device::pack_sample;
use roi_monitor_rs::roi_pipeline::export::{ExportConfig, TiffCompression};
use roi_monitor_rs::roi_pipeline::{
    Exporter, OverlayRenderer, PackedDecoder, Roi, RoiAnalyzer, RoiBounds,
};

const WIDTH: usize = 1280;
const HEIGHT: usize = 800;

fn generate_packed_frame(width: usize, height: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(width * height * 2);
    for y in 0..height {
        for x in 0..width {
            let value = ((x * 3 + y) % 4096) as u16;
            data.extend_from_slice(&pack_sample(value));
        }
    }
    data
}

fn benchmark_stages(c: &mut Criterion) {
    let mut group = c.benchmark_group("cycle_stages");
    let frame = generate_packed_frame(WIDTH, HEIGHT);
    let decoder = PackedDecoder::new(WIDTH, HEIGHT);
    let matrix = decoder.decode_bytes(&frame).unwrap();
    let roi = Roi::new(500, 10);

    group.bench_function("decode", |b| {
        b.iter(|| decoder.decode_bytes(black_box(&frame)).unwrap());
    });

    group.bench_function("analyze", |b| {
        let analyzer = RoiAnalyzer::new(RoiBounds::Clamp);
        b.iter(|| analyzer.analyze(black_box(&matrix), roi).unwrap());
    });

    group.bench_function("render", |b| {
        let renderer = OverlayRenderer::default();
        b.iter(|| renderer.render(black_box(&matrix), roi));
    });

    group.finish();
}

fn benchmark_roi_height(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyze_by_half_height");
    let decoder = PackedDecoder::new(WIDTH, HEIGHT);
    let matrix = decoder
        .decode_bytes(&generate_packed_frame(WIDTH, HEIGHT))
        .unwrap();
    let analyzer = RoiAnalyzer::new(RoiBounds::Clamp);

    for half_height in [1u32, 10, 30] {
        group.bench_with_input(
            BenchmarkId::from_parameter(half_height),
            &half_height,
            |b, &half_height| {
                b.iter(|| analyzer.analyze(&matrix, Roi::new(500, half_height)).unwrap());
            },
        );
    }

    group.finish();
}

fn benchmark_snapshot_compression(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot_compression");
    let matrix = PackedDecoder::new(WIDTH, HEIGHT)
        .decode_bytes(&generate_packed_frame(WIDTH, HEIGHT))
        .unwrap();
    let dir = tempfile::tempdir().unwrap();

    let compressions = vec![
        (TiffCompression::None, "none"),
        (TiffCompression::Lzw, "lzw"),
        (TiffCompression::DeflateFast, "deflate_fast"),
    ];

    for (compression, label) in compressions {
        let exporter = Exporter::new(ExportConfig::builder().compression(compression).build());
        let path = dir.path().join(format!("{label}.tiff"));
        group.bench_function(label, |b| {
            b.iter(|| exporter.save_matrix(&path, black_box(&matrix)).unwrap());
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_stages,
    benchmark_roi_height,
    benchmark_snapshot_compression
);
criterion_main!(benches);
