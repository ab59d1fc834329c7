/// Health pool for the player and for enemies
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    /// Subtract `amount`, clamping at zero. Returns the damage actually taken.
    pub fn take_damage(&mut self, amount: f32) -> f32 {
        let before = self.current;
        self.current = (self.current - amount.max(0.0)).max(0.0);
        before - self.current
    }

    pub fn heal(&mut self, amount: f32) {
        self.current = (self.current + amount.max(0.0)).min(self.max);
    }

    pub fn is_dead(&self) -> bool {
        self.current <= 0.0
    }

    pub fn fraction(&self) -> f32 {
        if self.max <= 0.0 {
            return 0.0;
        }
        self.current / self.max
    }
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100.0)
    }
}

/// Result of hitting something
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum DamageOutcome {
    /// Target was already dead (or gone); nothing changed
    Ignored,
    Wounded { dealt: f32, remaining: f32 },
    Killed { dealt: f32 },
}

/// Enemy strike falloff: full damage point blank, never below 30% inside range
pub fn distance_falloff(distance: f32, range: f32) -> f32 {
    if range <= 0.0 {
        return 1.0;
    }
    (1.0 - distance / range).max(0.3)
}

/// Grenade blast falloff: linear drop per unit of distance with a floor
pub fn linear_falloff(max_damage: f32, min_damage: f32, distance: f32, per_unit: f32) -> f32 {
    (max_damage - distance * per_unit).max(min_damage)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 0.0001;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn test_take_damage_clamps_at_zero() {
        let mut health = Health::new(50.0);
        assert!(approx_eq(health.take_damage(20.0), 20.0));
        assert!(approx_eq(health.take_damage(80.0), 30.0));
        assert!(approx_eq(health.current, 0.0));
        assert!(health.is_dead());
    }

    #[test]
    fn test_negative_damage_never_heals() {
        let mut health = Health::new(50.0);
        health.take_damage(-10.0);
        assert!(approx_eq(health.current, 50.0));
    }

    #[test]
    fn test_heal_caps_at_max() {
        let mut health = Health::new(100.0);
        health.take_damage(10.0);
        health.heal(25.0);
        assert!(approx_eq(health.current, 100.0));
        assert!(approx_eq(health.fraction(), 1.0));
    }

    #[test]
    fn test_distance_falloff_floor() {
        assert!(approx_eq(distance_falloff(0.0, 25.0), 1.0));
        assert!(approx_eq(distance_falloff(12.5, 25.0), 0.5));
        assert!(approx_eq(distance_falloff(24.0, 25.0), 0.3));
        assert!(approx_eq(distance_falloff(2.0, 3.0), 1.0 / 3.0));
    }

    #[test]
    fn test_linear_falloff_floor() {
        assert!(approx_eq(linear_falloff(50.0, 10.0, 0.0, 8.0), 50.0));
        assert!(approx_eq(linear_falloff(50.0, 10.0, 2.0, 8.0), 34.0));
        assert!(approx_eq(linear_falloff(50.0, 10.0, 4.9, 8.0), 10.8));
        assert!(approx_eq(linear_falloff(50.0, 10.0, 6.0, 8.0), 10.0));
    }
}
