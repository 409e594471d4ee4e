#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use glam::{Quat, Vec3};
use molmorph::align::{resolve, KabschSolver};
use molmorph::animation::{EasingFunction, MorphController};
use molmorph::molecule::{Bond, Element, Molecule};
use molmorph::sequence::{Sequence, SequenceBuilder};

/// Zig-zag carbon chain with an oxygen every fifth atom.
fn chain(len: usize, twist: f32) -> Molecule {
    let rotation = Quat::from_rotation_z(twist);
    let atoms = (0..len)
        .map(|i| {
            let zig = if i % 2 == 0 { 0.0 } else { 0.8 };
            rotation * Vec3::new(i as f32 * 1.25, zig, (i as f32 * 0.3).sin())
        })
        .collect();
    let elements = (0..len)
        .map(|i| if i % 5 == 4 { Element::O } else { Element::C })
        .collect();
    let bonds = (1..len).map(|i| Bond::new(i - 1, i, 1)).collect();
    Molecule::new(atoms, elements, bonds).unwrap_or_default()
}

fn sequence(len: usize) -> Sequence {
    let builder = SequenceBuilder::default();
    let mut sequence = Sequence::new();
    let mut previous: Option<Molecule> = None;
    for k in 0..3 {
        let entry = builder.align_molecule(
            previous.as_ref(),
            format!("chain-{k}"),
            &chain(len - k, k as f32 * 0.7),
        );
        previous = Some(entry.molecule.as_ref().clone());
        let _ = sequence.push(entry);
    }
    sequence
}

fn easing_benchmark(c: &mut Criterion) {
    let f = EasingFunction::QuadraticInOut;
    c.bench_function("quadratic_in_out_easing", |b| {
        b.iter(|| black_box(f.evaluate(black_box(0.37))))
    });
}

fn kabsch_benchmark(c: &mut Criterion) {
    let a = chain(64, 0.0);
    let b = chain(64, 1.1);
    let pairs: Vec<(Vec3, Vec3)> =
        a.atoms().iter().copied().zip(b.atoms().iter().copied()).collect();
    let solver = KabschSolver::default();
    c.bench_function("kabsch_64_pairs", |bench| {
        bench.iter(|| black_box(solver.solve(black_box(&pairs))))
    });
    c.bench_function("correspondence_64_atoms", |bench| {
        bench.iter(|| black_box(resolve(black_box(&a), black_box(&b))))
    });
}

fn tick_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("morph_tick");

    for count in [16, 64, 256] {
        let seq = sequence(count);
        let mut controller = MorphController::default();
        let _ = controller.show(&seq, 0);

        group.bench_function(format!("{count}_atoms"), |b| {
            b.iter(|| {
                if !controller.tick() {
                    let next = (controller.current_index().unwrap_or(0) + 1)
                        % seq.len();
                    let _ = controller.begin_transition(&seq, next);
                }
                black_box(controller.scene().atoms.len())
            })
        });
    }
    group.finish();
}

criterion_group!(benches, easing_benchmark, kabsch_benchmark, tick_benchmark);
criterion_main!(benches);
