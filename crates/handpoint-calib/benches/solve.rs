use criterion::{black_box, criterion_group, criterion_main, Criterion};
use handpoint_calib::{
    solve, triple_intersect, CalibrationCell, CalibrationCorner, CalibrationParams,
    CalibrationSample, CornerSamples, RawCapture, Stance,
};
use handpoint_core::TrackedPoint;
use nalgebra::{Point3, Vector3};

fn target(corner: CalibrationCorner) -> Point3<f32> {
    match corner {
        CalibrationCorner::TopLeft => Point3::new(-0.8, 1.5, 0.0),
        CalibrationCorner::TopRight => Point3::new(0.8, 1.5, 0.0),
        CalibrationCorner::BottomLeft => Point3::new(-0.8, 0.6, 0.0),
        CalibrationCorner::BottomRight => Point3::new(0.8, 0.6, 0.0),
    }
}

fn head(stance: Stance) -> Point3<f32> {
    match stance {
        Stance::Centered => Point3::new(0.0, 1.6, 2.5),
        Stance::LeanLeft => Point3::new(-0.4, 1.55, 2.4),
        Stance::LeanRight => Point3::new(0.4, 1.55, 2.4),
    }
}

fn captures(cell: CalibrationCell, n: usize) -> Vec<RawCapture> {
    (0..n)
        .map(|k| {
            let h = head(cell.stance);
            let jitter = Vector3::new(
                0.004 * ((k * 7 % 11) as f32 / 10.0 - 0.5),
                0.004 * ((k * 5 % 13) as f32 / 12.0 - 0.5),
                0.0,
            );
            let tip = h + (target(cell.corner) - h) * 0.25 + jitter;
            RawCapture::new(TrackedPoint::tracked(h), TrackedPoint::tracked(tip))
        })
        .collect()
}

fn bench_solver(c: &mut Criterion) {
    let params = CalibrationParams::default();
    let mut samples = CornerSamples::default();
    for cell in CalibrationCell::all() {
        let raw = captures(cell, params.samples_per_cell);
        if let Some(sample) = CalibrationSample::from_captures(&raw, params.median_iterations) {
            samples.insert(cell, sample);
        }
    }

    let cell = CalibrationCell::new(CalibrationCorner::TopLeft, Stance::Centered);
    let raw = captures(cell, params.samples_per_cell);
    c.bench_function("collapse_cell_30", |b| {
        b.iter(|| CalibrationSample::from_captures(black_box(&raw), params.median_iterations))
    });

    if let Ok(corner) = samples.corner(CalibrationCorner::TopLeft) {
        c.bench_function("triple_intersect", |b| {
            b.iter(|| triple_intersect(CalibrationCorner::TopLeft, black_box(&corner), 5))
        });
    }

    c.bench_function("solve", |b| b.iter(|| solve(black_box(&samples), &params)));
}

criterion_group!(benches, bench_solver);
criterion_main!(benches);
