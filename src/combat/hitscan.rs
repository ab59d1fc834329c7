//! Instant ray hit detection against enemy volumes

use bevy::prelude::*;
use rand::Rng;

use crate::enemies::EnemyId;

/// Bounding volume of a living enemy, as offered to the ray caster
#[derive(Clone, Copy, Debug)]
pub struct HitVolume {
    pub enemy: EnemyId,
    pub center: Vec3,
    pub radius: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    pub enemy: EnemyId,
    pub distance: f32,
    pub point: Vec3,
}

/// Nearest-hit query against a set of candidate volumes.
/// Implemented by whatever knows the enemy shapes; the game and tests use `SphereCaster`.
pub trait RayCaster {
    fn nearest_hit(&self, ray: Ray3d, max_distance: f32, candidates: &[HitVolume]) -> Option<RayHit>;
}

/// Treats every candidate as a sphere
#[derive(Clone, Copy, Debug, Default)]
pub struct SphereCaster;

impl RayCaster for SphereCaster {
    fn nearest_hit(&self, ray: Ray3d, max_distance: f32, candidates: &[HitVolume]) -> Option<RayHit> {
        let direction = *ray.direction;
        let mut closest: Option<RayHit> = None;

        for volume in candidates {
            let to_center = volume.center - ray.origin;
            let along = to_center.dot(direction);

            // Closest approach of the ray to the sphere centre
            let miss_sq = to_center.length_squared() - along * along;
            let radius_sq = volume.radius * volume.radius;
            if miss_sq > radius_sq {
                continue;
            }

            let half_chord = (radius_sq - miss_sq).sqrt();
            let entry = if along - half_chord >= 0.0 {
                along - half_chord
            } else if along + half_chord >= 0.0 {
                0.0 // Origin inside the volume
            } else {
                continue; // Behind the shooter
            };

            if entry > max_distance {
                continue;
            }

            if closest.is_none_or(|hit| entry < hit.distance) {
                closest = Some(RayHit {
                    enemy: volume.enemy,
                    distance: entry,
                    point: ray.get_point(entry),
                });
            }
        }

        closest
    }
}

/// Jitter a direction inside a cone of `spread` radians
pub fn apply_spread(direction: Vec3, spread: f32, rng: &mut impl Rng) -> Vec3 {
    let direction = direction.normalize_or_zero();
    if spread <= 0.0 || direction == Vec3::ZERO {
        return direction;
    }

    let angle = rng.gen_range(0.0..std::f32::consts::TAU);
    let radius = rng.gen_range(0.0f32..1.0).sqrt() * spread;

    let up = if direction.y.abs() < 0.9 { Vec3::Y } else { Vec3::X };
    let right = direction.cross(up).normalize();
    let actual_up = right.cross(direction).normalize();

    let offset = right * (radius * angle.cos()) + actual_up * (radius * angle.sin());
    (direction + offset).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const EPSILON: f32 = 0.0001;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn forward_ray() -> Ray3d {
        Ray3d { origin: Vec3::ZERO, direction: Dir3::NEG_Z }
    }

    fn volume(id: u32, center: Vec3) -> HitVolume {
        HitVolume { enemy: EnemyId(id), center, radius: 1.0 }
    }

    #[test]
    fn test_picks_nearest_of_several() {
        let candidates = [
            volume(1, Vec3::new(0.0, 0.0, -20.0)),
            volume(2, Vec3::new(0.2, 0.0, -8.0)),
            volume(3, Vec3::new(0.0, 0.0, -14.0)),
        ];

        let hit = SphereCaster.nearest_hit(forward_ray(), 100.0, &candidates).unwrap();
        assert_eq!(hit.enemy, EnemyId(2));
        assert!(hit.distance < 8.0 && hit.distance > 6.9);
    }

    #[test]
    fn test_entry_distance_on_axis() {
        let candidates = [volume(1, Vec3::new(0.0, 0.0, -10.0))];
        let hit = SphereCaster.nearest_hit(forward_ray(), 100.0, &candidates).unwrap();
        assert!(approx_eq(hit.distance, 9.0));
        assert!(approx_eq(hit.point.z, -9.0));
    }

    #[test]
    fn test_ignores_targets_behind_or_beside() {
        let candidates = [
            volume(1, Vec3::new(0.0, 0.0, 10.0)),
            volume(2, Vec3::new(3.0, 0.0, -10.0)),
        ];
        assert!(SphereCaster.nearest_hit(forward_ray(), 100.0, &candidates).is_none());
    }

    #[test]
    fn test_respects_max_distance() {
        let candidates = [volume(1, Vec3::new(0.0, 0.0, -50.0))];
        assert!(SphereCaster.nearest_hit(forward_ray(), 40.0, &candidates).is_none());
        assert!(SphereCaster.nearest_hit(forward_ray(), 60.0, &candidates).is_some());
    }

    #[test]
    fn test_no_candidates_no_hit() {
        assert!(SphereCaster.nearest_hit(forward_ray(), 100.0, &[]).is_none());
    }

    #[test]
    fn test_spread_stays_inside_cone() {
        let mut rng = StdRng::seed_from_u64(7);
        let forward = Vec3::NEG_Z;

        for _ in 0..200 {
            let jittered = apply_spread(forward, 0.15, &mut rng);
            assert!(approx_eq(jittered.length(), 1.0));
            // tan(angle) <= spread, so the cosine stays close to 1
            assert!(jittered.dot(forward) > 0.98);
        }
    }

    #[test]
    fn test_zero_spread_is_identity() {
        let mut rng = StdRng::seed_from_u64(1);
        let dir = Vec3::new(1.0, 0.0, -1.0);
        let result = apply_spread(dir, 0.0, &mut rng);
        assert!((result - dir.normalize()).length() < EPSILON);
    }
}
