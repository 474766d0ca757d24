//! Transport modes, socio-economic groups and dense per-key containers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};

/// One of the four commute alternatives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    Car,
    Bus,
    Train,
    BikeWalk,
}

impl TransportMode {
    /// All modes in declaration order (the order of every `PerMode` iteration).
    pub const ALL: [TransportMode; 4] = [
        TransportMode::Car,
        TransportMode::Bus,
        TransportMode::Train,
        TransportMode::BikeWalk,
    ];

    /// Zero-reference alternative for ASC calibration.
    pub const REFERENCE: TransportMode = TransportMode::BikeWalk;

    pub fn index(self) -> usize {
        match self {
            TransportMode::Car => 0,
            TransportMode::Bus => 1,
            TransportMode::Train => 2,
            TransportMode::BikeWalk => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TransportMode::Car => "car",
            TransportMode::Bus => "bus",
            TransportMode::Train => "train",
            TransportMode::BikeWalk => "bike_walk",
        }
    }

    /// Empirical average minutes per mile.
    pub fn minutes_per_mile(self) -> f64 {
        match self {
            TransportMode::Car => 4.5,
            TransportMode::Bus => 4.8,
            TransportMode::Train => 5.6,
            TransportMode::BikeWalk => 15.0,
        }
    }

    /// Whether travel time scales with road congestion.
    pub fn shares_road(self) -> bool {
        matches!(self, TransportMode::Car | TransportMode::Bus)
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Income-threshold bucket driving behavior and target shares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SocioGroup {
    Lower,
    Middle,
    Upper,
}

impl SocioGroup {
    pub const ALL: [SocioGroup; 3] = [SocioGroup::Lower, SocioGroup::Middle, SocioGroup::Upper];

    pub fn as_str(self) -> &'static str {
        match self {
            SocioGroup::Lower => "lower",
            SocioGroup::Middle => "middle",
            SocioGroup::Upper => "upper",
        }
    }

    /// Classify an income relative to the median.
    ///
    /// `lower` below `lower_ratio × median`, `upper` above
    /// `upper_ratio × median`, otherwise `middle`.
    ///
    /// # Example
    /// ```
    /// use commute_simulator_core_rs::SocioGroup;
    ///
    /// assert_eq!(SocioGroup::classify(30_000.0, 60_000.0, 0.75, 2.0), SocioGroup::Lower);
    /// assert_eq!(SocioGroup::classify(60_000.0, 60_000.0, 0.75, 2.0), SocioGroup::Middle);
    /// assert_eq!(SocioGroup::classify(150_000.0, 60_000.0, 0.75, 2.0), SocioGroup::Upper);
    /// ```
    pub fn classify(income: f64, median: f64, lower_ratio: f64, upper_ratio: f64) -> Self {
        if income < lower_ratio * median {
            SocioGroup::Lower
        } else if income > upper_ratio * median {
            SocioGroup::Upper
        } else {
            SocioGroup::Middle
        }
    }
}

impl fmt::Display for SocioGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One value per transport mode.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PerMode<T> {
    pub car: T,
    pub bus: T,
    pub train: T,
    pub bike_walk: T,
}

impl<T> PerMode<T> {
    pub fn from_fn(mut f: impl FnMut(TransportMode) -> T) -> Self {
        Self {
            car: f(TransportMode::Car),
            bus: f(TransportMode::Bus),
            train: f(TransportMode::Train),
            bike_walk: f(TransportMode::BikeWalk),
        }
    }

    pub fn get(&self, mode: TransportMode) -> &T {
        match mode {
            TransportMode::Car => &self.car,
            TransportMode::Bus => &self.bus,
            TransportMode::Train => &self.train,
            TransportMode::BikeWalk => &self.bike_walk,
        }
    }

    pub fn get_mut(&mut self, mode: TransportMode) -> &mut T {
        match mode {
            TransportMode::Car => &mut self.car,
            TransportMode::Bus => &mut self.bus,
            TransportMode::Train => &mut self.train,
            TransportMode::BikeWalk => &mut self.bike_walk,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (TransportMode, &T)> {
        TransportMode::ALL.into_iter().map(move |m| (m, self.get(m)))
    }

    pub fn map<U>(&self, mut f: impl FnMut(TransportMode, &T) -> U) -> PerMode<U> {
        PerMode::from_fn(|m| f(m, self.get(m)))
    }
}

impl<T: Copy> PerMode<T> {
    pub fn to_array(&self) -> [T; 4] {
        [self.car, self.bus, self.train, self.bike_walk]
    }
}

impl<T> Index<TransportMode> for PerMode<T> {
    type Output = T;

    fn index(&self, mode: TransportMode) -> &T {
        self.get(mode)
    }
}

impl<T> IndexMut<TransportMode> for PerMode<T> {
    fn index_mut(&mut self, mode: TransportMode) -> &mut T {
        self.get_mut(mode)
    }
}

/// One value per socio-economic group.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PerGroup<T> {
    pub lower: T,
    pub middle: T,
    pub upper: T,
}

impl<T> PerGroup<T> {
    pub fn from_fn(mut f: impl FnMut(SocioGroup) -> T) -> Self {
        Self {
            lower: f(SocioGroup::Lower),
            middle: f(SocioGroup::Middle),
            upper: f(SocioGroup::Upper),
        }
    }

    pub fn get(&self, group: SocioGroup) -> &T {
        match group {
            SocioGroup::Lower => &self.lower,
            SocioGroup::Middle => &self.middle,
            SocioGroup::Upper => &self.upper,
        }
    }

    pub fn get_mut(&mut self, group: SocioGroup) -> &mut T {
        match group {
            SocioGroup::Lower => &mut self.lower,
            SocioGroup::Middle => &mut self.middle,
            SocioGroup::Upper => &mut self.upper,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (SocioGroup, &T)> {
        SocioGroup::ALL.into_iter().map(move |g| (g, self.get(g)))
    }
}

impl<T> Index<SocioGroup> for PerGroup<T> {
    type Output = T;

    fn index(&self, group: SocioGroup) -> &T {
        self.get(group)
    }
}

impl<T> IndexMut<SocioGroup> for PerGroup<T> {
    fn index_mut(&mut self, group: SocioGroup) -> &mut T {
        self.get_mut(group)
    }
}
