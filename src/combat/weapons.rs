use std::time::Duration;

/// Weapon slots, in keyboard order (1..5)
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub enum WeaponKey {
    Pistol,   // 1 - Sidearm
    #[default]
    Rifle,    // 2 - Automatic hitscan
    Shotgun,  // 3 - Pellet spread
    Sniper,   // 4 - Slow, heavy hitscan
    Grenade,  // 5 - Lobbed projectile
}

impl WeaponKey {
    pub const ALL: [WeaponKey; 5] = [
        WeaponKey::Pistol,
        WeaponKey::Rifle,
        WeaponKey::Shotgun,
        WeaponKey::Sniper,
        WeaponKey::Grenade,
    ];

    /// 1-based slot number shown on the HUD and bound to the digit keys
    pub fn slot(&self) -> usize {
        match self {
            WeaponKey::Pistol => 1,
            WeaponKey::Rifle => 2,
            WeaponKey::Shotgun => 3,
            WeaponKey::Sniper => 4,
            WeaponKey::Grenade => 5,
        }
    }

    pub fn from_slot(slot: usize) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.slot() == slot)
    }
}

/// How a weapon turns a trigger pull into damage
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum FireMode {
    /// Single instant ray
    Hitscan,
    /// Several rays inside a spread cone, damage split evenly between them
    Pellets { count: u32, spread: f32 },
    /// Ballistic grenade, damage applied on detonation
    Lobbed,
}

/// Static per-weapon stats
#[derive(Clone, Debug)]
pub struct WeaponStats {
    pub key: WeaponKey,
    pub name: &'static str,
    pub damage: f32,
    pub capacity: u32,
    pub starting_reserve: u32,
    pub fire_interval: Duration,
    pub reload_time: Duration,
    pub range: f32,
    pub fire_mode: FireMode,
}

impl WeaponStats {
    pub fn pistol() -> Self {
        Self {
            key: WeaponKey::Pistol,
            name: "Glock",
            damage: 25.0,
            capacity: 15,
            starting_reserve: 60,
            fire_interval: Duration::from_millis(200),
            reload_time: Duration::from_millis(1500),
            range: 120.0,
            fire_mode: FireMode::Hitscan,
        }
    }

    pub fn rifle() -> Self {
        Self {
            key: WeaponKey::Rifle,
            name: "AK-47",
            damage: 35.0,
            capacity: 30,
            starting_reserve: 120,
            fire_interval: Duration::from_millis(150),
            reload_time: Duration::from_millis(2500),
            range: 150.0,
            fire_mode: FireMode::Hitscan,
        }
    }

    pub fn shotgun() -> Self {
        Self {
            key: WeaponKey::Shotgun,
            name: "Shotgun",
            damage: 30.0,
            capacity: 8,
            starting_reserve: 32,
            fire_interval: Duration::from_millis(800),
            reload_time: Duration::from_millis(2000),
            range: 40.0,
            fire_mode: FireMode::Pellets { count: 5, spread: 0.15 },
        }
    }

    pub fn sniper() -> Self {
        Self {
            key: WeaponKey::Sniper,
            name: "AWP",
            damage: 90.0,
            capacity: 5,
            starting_reserve: 25,
            fire_interval: Duration::from_millis(1500),
            reload_time: Duration::from_millis(3000),
            range: 300.0,
            fire_mode: FireMode::Hitscan,
        }
    }

    pub fn grenade() -> Self {
        Self {
            key: WeaponKey::Grenade,
            name: "Grenade",
            damage: 50.0, // Blast damage at the centre
            capacity: 5,
            starting_reserve: 5,
            fire_interval: Duration::from_millis(1000),
            reload_time: Duration::from_millis(1000),
            range: 0.0,
            fire_mode: FireMode::Lobbed,
        }
    }

    pub fn for_key(key: WeaponKey) -> Self {
        match key {
            WeaponKey::Pistol => Self::pistol(),
            WeaponKey::Rifle => Self::rifle(),
            WeaponKey::Shotgun => Self::shotgun(),
            WeaponKey::Sniper => Self::sniper(),
            WeaponKey::Grenade => Self::grenade(),
        }
    }
}

/// A weapon with its ammunition and timing state
#[derive(Clone, Debug)]
pub struct Weapon {
    pub stats: WeaponStats,
    pub magazine: u32,
    pub reserve: u32,
    /// When the reload under way completes
    pub reload_done: Option<Duration>,
    pub last_fired: Option<Duration>,
}

impl Weapon {
    /// Fresh weapon with a full magazine and its starting reserve
    pub fn new(stats: WeaponStats) -> Self {
        Self {
            magazine: stats.capacity,
            reserve: stats.starting_reserve,
            reload_done: None,
            last_fired: None,
            stats,
        }
    }

    pub fn key(&self) -> WeaponKey {
        self.stats.key
    }

    pub fn can_fire(&self, now: Duration) -> bool {
        if self.is_reloading() || self.magazine == 0 {
            return false;
        }

        match self.last_fired {
            None => true,
            Some(last) => now.saturating_sub(last) >= self.stats.fire_interval,
        }
    }

    /// Spend one round. Returns false (and changes nothing) when the weapon can't fire.
    pub fn fire(&mut self, now: Duration) -> bool {
        if !self.can_fire(now) {
            return false;
        }

        self.magazine -= 1;
        self.last_fired = Some(now);
        true
    }

    /// Empty magazine with rounds left in reserve and no reload under way
    pub fn needs_auto_reload(&self) -> bool {
        self.magazine == 0 && self.reserve > 0 && !self.is_reloading()
    }

    pub fn is_reloading(&self) -> bool {
        self.reload_done.is_some()
    }

    /// A reload is under way and its completion time has arrived
    pub fn reload_due(&self, now: Duration) -> bool {
        self.reload_done.is_some_and(|done| done <= now)
    }

    pub fn is_full(&self) -> bool {
        self.magazine >= self.stats.capacity
    }

    /// Start a reload. Returns the time it completes, or None when there is nothing to do.
    pub fn begin_reload(&mut self, now: Duration) -> Option<Duration> {
        if self.is_reloading() || self.is_full() || self.reserve == 0 {
            return None;
        }

        let done = now + self.stats.reload_time;
        self.reload_done = Some(done);
        Some(done)
    }

    /// Move rounds from reserve into the magazine and clear the reloading flag.
    /// Returns how many rounds were transferred.
    pub fn finish_reload(&mut self) -> u32 {
        let needed = self.stats.capacity.saturating_sub(self.magazine);
        let transferred = needed.min(self.reserve);

        self.magazine += transferred;
        self.reserve -= transferred;
        self.reload_done = None;
        transferred
    }

    /// Top the magazine up to capacity (ammo pickup). Cancels a reload under way.
    pub fn refill_magazine(&mut self) {
        self.magazine = self.stats.capacity;
        self.reload_done = None;
    }
}

/// All weapons carried in a session plus the active one
#[derive(Clone, Debug)]
pub struct WeaponRegistry {
    weapons: Vec<Weapon>,
    active: WeaponKey,
}

impl Default for WeaponRegistry {
    fn default() -> Self {
        Self::new(
            WeaponKey::ALL.into_iter().map(|key| Weapon::new(WeaponStats::for_key(key))).collect(),
            WeaponKey::Rifle,
        )
    }
}

impl WeaponRegistry {
    /// Falls back to the first weapon when `active` isn't carried.
    pub fn new(weapons: Vec<Weapon>, active: WeaponKey) -> Self {
        let active = if weapons.iter().any(|w| w.key() == active) {
            active
        } else {
            weapons.first().map(Weapon::key).unwrap_or_default()
        };

        Self { weapons, active }
    }

    pub fn active_key(&self) -> WeaponKey {
        self.active
    }

    pub fn active(&self) -> Option<&Weapon> {
        self.get(self.active)
    }

    pub fn active_mut(&mut self) -> Option<&mut Weapon> {
        self.get_mut(self.active)
    }

    pub fn get(&self, key: WeaponKey) -> Option<&Weapon> {
        self.weapons.iter().find(|w| w.key() == key)
    }

    pub fn get_mut(&mut self, key: WeaponKey) -> Option<&mut Weapon> {
        self.weapons.iter_mut().find(|w| w.key() == key)
    }

    /// Make `key` the active weapon. Returns false when it already is, or isn't carried.
    pub fn switch_to(&mut self, key: WeaponKey) -> bool {
        if key == self.active || self.get(key).is_none() {
            return false;
        }

        self.active = key;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn test_slots_round_trip_through_digit_keys() {
        for key in WeaponKey::ALL {
            assert_eq!(WeaponKey::from_slot(key.slot()), Some(key));
        }
        assert_eq!(WeaponKey::from_slot(0), None);
        assert_eq!(WeaponKey::from_slot(6), None);
    }

    #[test]
    fn test_fresh_weapon_can_fire() {
        let weapon = Weapon::new(WeaponStats::rifle());
        assert!(weapon.can_fire(Duration::ZERO));
        assert_eq!(weapon.magazine, 30);
        assert_eq!(weapon.reserve, 120);
    }

    #[test]
    fn test_fire_decrements_and_stamps_time() {
        let mut weapon = Weapon::new(WeaponStats::pistol());
        assert!(weapon.fire(ms(500)));
        assert_eq!(weapon.magazine, 14);
        assert_eq!(weapon.last_fired, Some(ms(500)));
    }

    #[test]
    fn test_fire_respects_interval() {
        let mut weapon = Weapon::new(WeaponStats::rifle());
        assert!(weapon.fire(ms(0)));
        assert!(!weapon.fire(ms(149)));
        assert_eq!(weapon.magazine, 29);
        assert!(weapon.fire(ms(150)));
        assert_eq!(weapon.magazine, 28);
    }

    #[test]
    fn test_fire_rejected_while_reloading() {
        let mut weapon = Weapon::new(WeaponStats::rifle());
        weapon.fire(ms(0));
        assert!(weapon.begin_reload(ms(10)).is_some());

        assert!(!weapon.can_fire(ms(5000)));
        assert!(!weapon.fire(ms(5000)));
        assert_eq!(weapon.magazine, 29);
        assert_eq!(weapon.last_fired, Some(ms(0)));
    }

    #[test]
    fn test_fire_rejected_when_empty() {
        let mut weapon = Weapon::new(WeaponStats::sniper());
        weapon.magazine = 0;
        assert!(!weapon.fire(ms(0)));
        assert_eq!(weapon.magazine, 0);
        assert!(weapon.needs_auto_reload());
    }

    #[test]
    fn test_reload_noop_cases() {
        let mut full = Weapon::new(WeaponStats::pistol());
        assert_eq!(full.begin_reload(ms(0)), None);
        assert!(!full.is_reloading());

        let mut dry = Weapon::new(WeaponStats::pistol());
        dry.magazine = 3;
        dry.reserve = 0;
        assert_eq!(dry.begin_reload(ms(0)), None);

        let mut busy = Weapon::new(WeaponStats::pistol());
        busy.magazine = 3;
        assert_eq!(busy.begin_reload(ms(0)), Some(ms(1500)));
        assert_eq!(busy.begin_reload(ms(100)), None);
    }

    #[test]
    fn test_reload_transfers_only_what_fits() {
        let mut weapon = Weapon::new(WeaponStats::rifle());
        weapon.magazine = 12;
        weapon.reserve = 90;
        weapon.begin_reload(ms(0));

        assert_eq!(weapon.finish_reload(), 18);
        assert_eq!(weapon.magazine, 30);
        assert_eq!(weapon.reserve, 72);
        assert!(!weapon.is_reloading());
    }

    #[test]
    fn test_reload_limited_by_reserve() {
        let mut weapon = Weapon::new(WeaponStats::rifle());
        weapon.magazine = 2;
        weapon.reserve = 5;
        weapon.begin_reload(ms(0));

        assert_eq!(weapon.finish_reload(), 5);
        assert_eq!(weapon.magazine, 7);
        assert_eq!(weapon.reserve, 0);
    }

    #[test]
    fn test_refill_cancels_reload() {
        let mut weapon = Weapon::new(WeaponStats::rifle());
        weapon.magazine = 4;
        assert_eq!(weapon.begin_reload(ms(0)), Some(ms(2500)));
        assert!(weapon.reload_due(ms(2500)));

        weapon.refill_magazine();

        assert_eq!(weapon.magazine, 30);
        assert!(!weapon.is_reloading());
        assert!(!weapon.reload_due(ms(2500)));
        assert!(weapon.can_fire(ms(100)));
    }

    #[test]
    fn test_switch_to_active_is_noop() {
        let mut registry = WeaponRegistry::default();
        assert_eq!(registry.active_key(), WeaponKey::Rifle);
        assert!(!registry.switch_to(WeaponKey::Rifle));
        assert!(registry.switch_to(WeaponKey::Shotgun));
        assert_eq!(registry.active_key(), WeaponKey::Shotgun);
    }

    #[test]
    fn test_switch_to_missing_weapon_is_noop() {
        let mut registry = WeaponRegistry::new(vec![Weapon::new(WeaponStats::pistol())], WeaponKey::Rifle);
        assert_eq!(registry.active_key(), WeaponKey::Pistol);
        assert!(!registry.switch_to(WeaponKey::Sniper));
        assert_eq!(registry.active_key(), WeaponKey::Pistol);
    }
}
