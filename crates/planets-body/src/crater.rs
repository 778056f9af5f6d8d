//! Crater placement: centre sampling, per-crater random values, and greedy
//! decal exclusion on the unit sphere.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use planets_cubesphere::CelestialVertex;
use rand::Rng;
use rand::seq::IteratorRandom;
use static_assertions::const_assert_eq;

/// One crater as laid out in the terrain shader's storage array.
///
/// WGSL rounds `struct { vec3<f32>, f32, u32 }` up to a 32-byte stride.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct CraterRecord {
    pub position: [f32; 3],
    pub random_value: f32,
    pub has_texture: u32,
    _padding: [u32; 3],
}

const_assert_eq!(std::mem::size_of::<CraterRecord>(), 32);
const_assert_eq!(std::mem::offset_of!(CraterRecord, has_texture), 16);

impl CraterRecord {
    pub fn new(position: Vec3, random_value: f32, has_texture: bool) -> Self {
        Self {
            position: position.to_array(),
            random_value,
            has_texture: u32::from(has_texture),
            _padding: [0; 3],
        }
    }

    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    pub fn has_texture(&self) -> bool {
        self.has_texture != 0
    }
}

/// Inputs to one placement run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CraterSettings {
    pub count: usize,
    pub wanted_textures: usize,
    /// Minimum angular distance (radians) between two textured craters.
    pub max_texture_radius: f32,
}

/// Uniformly sample `count` distinct vertices and return their positions.
///
/// # Panics
///
/// Panics if `count` exceeds the number of vertices.
pub fn sample_crater_positions<R: Rng + ?Sized>(
    vertices: &[CelestialVertex],
    count: usize,
    rng: &mut R,
) -> Vec<Vec3> {
    sample_crater_indices(vertices.len(), count, rng)
        .into_iter()
        .map(|i| Vec3::from_array(vertices[i].position))
        .collect()
}

/// Reservoir-sample `count` distinct indices from `0..len`.
///
/// The result is in random order, not mesh order, and texture eligibility
/// follows that order.
pub fn sample_crater_indices<R: Rng + ?Sized>(len: usize, count: usize, rng: &mut R) -> Vec<usize> {
    assert!(
        count <= len,
        "cannot place {count} craters on a mesh of {len} vertices"
    );
    (0..len).choose_multiple(rng, count)
}

/// `count` independent uniform values in `[0, 1)`.
pub fn random_crater_values<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Vec<f32> {
    (0..count).map(|_| rng.random::<f32>()).collect()
}

/// Decide which craters carry a decal.
///
/// Only the first `wanted` craters are candidates. They are visited in order
/// and accepted when their angular distance to every already accepted crater
/// is strictly greater than `max_radius`.
///
/// # Panics
///
/// Panics if `wanted` exceeds `positions.len()`.
pub fn crater_texture_flags(positions: &[Vec3], wanted: usize, max_radius: f32) -> Vec<bool> {
    assert!(
        wanted <= positions.len(),
        "{wanted} textured craters requested but only {} craters exist",
        positions.len()
    );

    let mut accepted: Vec<Vec3> = Vec::with_capacity(wanted);
    let mut flags = vec![false; positions.len()];
    for (flag, &candidate) in flags.iter_mut().zip(positions).take(wanted) {
        let clear = accepted
            .iter()
            .all(|&other| angular_distance(candidate, other) > max_radius);
        if clear {
            accepted.push(candidate);
            *flag = true;
        }
    }
    flags
}

/// Great-circle angle between two unit vectors.
pub fn angular_distance(a: Vec3, b: Vec3) -> f32 {
    a.dot(b).clamp(-1.0, 1.0).acos()
}

/// Run sampling, random values and exclusion, merged index-aligned.
pub fn generate_craters<R: Rng + ?Sized>(
    vertices: &[CelestialVertex],
    settings: &CraterSettings,
    rng: &mut R,
) -> Vec<CraterRecord> {
    let positions = sample_crater_positions(vertices, settings.count, rng);
    let random_values = random_crater_values(settings.count, rng);
    let flags = crater_texture_flags(
        &positions,
        settings.wanted_textures,
        settings.max_texture_radius,
    );

    positions
        .into_iter()
        .zip(random_values)
        .zip(flags)
        .map(|((position, value), textured)| CraterRecord::new(position, value, textured))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use planets_cubesphere::build_sphere_mesh;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;
    use std::f32::consts::FRAC_PI_2;

    fn rng(seed: u64) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(seed)
    }

    #[test]
    fn test_sampled_indices_are_distinct_and_in_range() {
        let picked = sample_crater_indices(500, 120, &mut rng(1));
        assert_eq!(picked.len(), 120);
        let unique: HashSet<_> = picked.iter().collect();
        assert_eq!(unique.len(), 120);
        assert!(picked.iter().all(|&i| i < 500));
    }

    #[test]
    fn test_sampling_everything_returns_every_index() {
        let mut picked = sample_crater_indices(36, 36, &mut rng(2));
        picked.sort_unstable();
        assert_eq!(picked, (0..36).collect::<Vec<_>>());
    }

    #[test]
    fn test_sampling_is_not_first_n() {
        let picked = sample_crater_indices(10_000, 10, &mut rng(3));
        assert!(picked.iter().any(|&i| i >= 10));
    }

    #[test]
    fn test_sampling_is_roughly_uniform() {
        let mut hits = [0u32; 10];
        let mut r = rng(4);
        for _ in 0..2000 {
            for i in sample_crater_indices(10, 3, &mut r) {
                hits[i] += 1;
            }
        }
        // Each index expects 600 hits.
        assert!(hits.iter().all(|&h| (480..720).contains(&h)), "{hits:?}");
    }

    #[test]
    fn test_sampled_positions_come_from_mesh() {
        let mesh = build_sphere_mesh(3);
        let positions = sample_crater_positions(&mesh, 40, &mut rng(5));
        assert_eq!(positions.len(), 40);
        for p in positions {
            assert!(mesh.iter().any(|v| v.position == p.to_array()));
        }
    }

    #[test]
    #[should_panic]
    fn test_more_craters_than_vertices_panics() {
        let _ = sample_crater_indices(5, 6, &mut rng(6));
    }

    #[test]
    fn test_random_values_in_unit_interval() {
        let values = random_crater_values(1000, &mut rng(7));
        assert_eq!(values.len(), 1000);
        assert!(values.iter().all(|v| (0.0..1.0).contains(v)));
    }

    #[test]
    fn test_strict_exclusion_order() {
        // Second candidate sits just beyond 90° of the first, third just inside.
        let eps = 1e-3;
        let first = Vec3::X;
        let second = Vec3::new((FRAC_PI_2 + eps).cos(), (FRAC_PI_2 + eps).sin(), 0.0);
        let third = Vec3::new((FRAC_PI_2 - eps).cos(), 0.0, (FRAC_PI_2 - eps).sin());
        let mut positions = vec![first, second, third];
        positions.extend((0..7).map(|i| Vec3::new(0.0, (i as f32).cos(), (i as f32).sin())));

        let flags = crater_texture_flags(&positions, 3, FRAC_PI_2);
        assert_eq!(flags.len(), 10);
        assert_eq!(&flags[..3], &[true, true, false]);
        assert!(flags[3..].iter().all(|f| !f));
    }

    #[test]
    fn test_exact_threshold_is_rejected() {
        let flags = crater_texture_flags(&[Vec3::X, Vec3::X], 2, 0.0);
        assert_eq!(flags, vec![true, false]);
    }

    #[test]
    fn test_nothing_beyond_wanted_is_textured() {
        let mesh = build_sphere_mesh(6);
        let positions = sample_crater_positions(&mesh, 200, &mut rng(8));
        let flags = crater_texture_flags(&positions, 20, 0.0);
        assert!(flags[20..].iter().all(|f| !f));
        assert!(flags[0]);
    }

    #[test]
    fn test_accepted_craters_are_mutually_far_apart() {
        let mesh = build_sphere_mesh(10);
        for seed in 0..10 {
            let max_radius = 0.4;
            let positions = sample_crater_positions(&mesh, 300, &mut rng(seed));
            let flags = crater_texture_flags(&positions, 150, max_radius);
            let textured: Vec<Vec3> = positions
                .iter()
                .zip(&flags)
                .filter_map(|(p, &f)| f.then_some(*p))
                .collect();
            for (i, a) in textured.iter().enumerate() {
                for b in &textured[i + 1..] {
                    assert!(angular_distance(*a, *b) > max_radius);
                }
            }
        }
    }

    #[test]
    #[should_panic]
    fn test_wanting_more_textures_than_craters_panics() {
        let _ = crater_texture_flags(&[Vec3::X], 2, 0.1);
    }

    #[test]
    fn test_generate_craters_merges_index_aligned() {
        let mesh = build_sphere_mesh(4);
        let settings = CraterSettings {
            count: 25,
            wanted_textures: 5,
            max_texture_radius: 0.2,
        };
        let craters = generate_craters(&mesh, &settings, &mut rng(9));
        assert_eq!(craters.len(), 25);
        assert!(craters[0].has_texture());
        assert!(craters[5..].iter().all(|c| !c.has_texture()));
        for c in &craters {
            assert!((c.position().length() - 1.0).abs() < 1e-5);
            assert!((0.0..1.0).contains(&c.random_value));
        }
    }

    #[test]
    fn test_records_follow_sampling_order() {
        let mesh = build_sphere_mesh(4);
        let settings = CraterSettings {
            count: 30,
            wanted_textures: 3,
            max_texture_radius: -1.0,
        };
        let sampled = sample_crater_positions(&mesh, 30, &mut rng(12));
        let craters = generate_craters(&mesh, &settings, &mut rng(12));
        let placed: Vec<Vec3> = craters.iter().map(CraterRecord::position).collect();
        assert_eq!(placed, sampled);
        assert!(craters[..3].iter().all(|c| c.has_texture()));
    }

    #[test]
    fn test_textured_count_is_stable_for_fixed_positions() {
        let mesh = build_sphere_mesh(5);
        let positions = sample_crater_positions(&mesh, 80, &mut rng(10));
        let a = crater_texture_flags(&positions, 30, 0.5);
        let b = crater_texture_flags(&positions, 30, 0.5);
        assert_eq!(a, b);
    }

    #[test]
    fn test_record_bytes_match_shader_layout() {
        let record = CraterRecord::new(Vec3::new(1.0, 2.0, 3.0), 0.5, true);
        let words: &[u32] = bytemuck::cast_slice(std::slice::from_ref(&record));
        assert_eq!(words.len(), 8);
        assert_eq!(f32::from_bits(words[2]), 3.0);
        assert_eq!(f32::from_bits(words[3]), 0.5);
        assert_eq!(words[4], 1);
        assert_eq!(&words[5..], &[0, 0, 0]);
    }
}
