//! Sigma band levels, per-day threshold sets, and band bucket classification.

use serde::{Serialize, Serializer};

/// One of the ten statistical thresholds carried by every snapshot.
///
/// Variants are ordered from furthest below the mean to furthest above it, so
/// `Ord` follows the sigma index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum BandLevel {
    Minus100,
    Minus075,
    Minus050,
    Minus025,
    Mean,
    Plus050,
    Plus100,
    Plus150,
    Plus200,
    Plus250,
}

impl BandLevel {
    /// All levels, lowest first.
    pub const ALL: [BandLevel; 10] = [
        BandLevel::Minus100,
        BandLevel::Minus075,
        BandLevel::Minus050,
        BandLevel::Minus025,
        BandLevel::Mean,
        BandLevel::Plus050,
        BandLevel::Plus100,
        BandLevel::Plus150,
        BandLevel::Plus200,
        BandLevel::Plus250,
    ];

    /// Human-readable label used in ledger output.
    pub fn label(self) -> &'static str {
        match self {
            Self::Minus100 => "-1.00σ",
            Self::Minus075 => "-0.75σ",
            Self::Minus050 => "-0.50σ",
            Self::Minus025 => "-0.25σ",
            Self::Mean => "mean",
            Self::Plus050 => "+0.50σ",
            Self::Plus100 => "+1.00σ",
            Self::Plus150 => "+1.50σ",
            Self::Plus200 => "+2.00σ",
            Self::Plus250 => "+2.50σ",
        }
    }

    /// Offset from the mean in standard deviations.
    pub fn sigma(self) -> f64 {
        match self {
            Self::Minus100 => -1.0,
            Self::Minus075 => -0.75,
            Self::Minus050 => -0.5,
            Self::Minus025 => -0.25,
            Self::Mean => 0.0,
            Self::Plus050 => 0.5,
            Self::Plus100 => 1.0,
            Self::Plus150 => 1.5,
            Self::Plus200 => 2.0,
            Self::Plus250 => 2.5,
        }
    }
}

/// Label reported when price sits below the lowest defined threshold.
pub const OUT_OF_RANGE_LABEL: &str = "<-1.00σ";

/// The ten thresholds of one day. `NaN` marks an undefined threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bands {
    pub m100: f64,
    pub m075: f64,
    pub m050: f64,
    pub m025: f64,
    pub mean: f64,
    pub p050: f64,
    pub p100: f64,
    pub p150: f64,
    pub p200: f64,
    pub p250: f64,
}

impl Bands {
    /// A threshold set with every level undefined.
    pub fn undefined() -> Self {
        Self {
            m100: f64::NAN,
            m075: f64::NAN,
            m050: f64::NAN,
            m025: f64::NAN,
            mean: f64::NAN,
            p050: f64::NAN,
            p100: f64::NAN,
            p150: f64::NAN,
            p200: f64::NAN,
            p250: f64::NAN,
        }
    }

    /// Threshold for `level`, or `None` when it is not a finite number.
    pub fn get(&self, level: BandLevel) -> Option<f64> {
        let v = self.raw(level);
        v.is_finite().then_some(v)
    }

    /// Raw stored value, possibly `NaN`.
    pub fn raw(&self, level: BandLevel) -> f64 {
        match level {
            BandLevel::Minus100 => self.m100,
            BandLevel::Minus075 => self.m075,
            BandLevel::Minus050 => self.m050,
            BandLevel::Minus025 => self.m025,
            BandLevel::Mean => self.mean,
            BandLevel::Plus050 => self.p050,
            BandLevel::Plus100 => self.p100,
            BandLevel::Plus150 => self.p150,
            BandLevel::Plus200 => self.p200,
            BandLevel::Plus250 => self.p250,
        }
    }

    pub fn set(&mut self, level: BandLevel, value: f64) {
        let slot = match level {
            BandLevel::Minus100 => &mut self.m100,
            BandLevel::Minus075 => &mut self.m075,
            BandLevel::Minus050 => &mut self.m050,
            BandLevel::Minus025 => &mut self.m025,
            BandLevel::Mean => &mut self.mean,
            BandLevel::Plus050 => &mut self.p050,
            BandLevel::Plus100 => &mut self.p100,
            BandLevel::Plus150 => &mut self.p150,
            BandLevel::Plus200 => &mut self.p200,
            BandLevel::Plus250 => &mut self.p250,
        };
        *slot = value;
    }

    /// True when the defined thresholds are non-decreasing in sigma order.
    pub fn is_ordered(&self) -> bool {
        let defined: Vec<f64> = BandLevel::ALL.iter().filter_map(|&l| self.get(l)).collect();
        defined.windows(2).all(|w| w[0] <= w[1])
    }

    /// Nearest defined band at or below `price`.
    ///
    /// Bands are scanned lowest to highest and the last match wins.
    pub fn bucket(&self, price: f64) -> BandBucket {
        let mut last = BandBucket::BelowRange;
        for level in BandLevel::ALL {
            if let Some(th) = self.get(level) {
                if price >= th {
                    last = BandBucket::Level(level);
                }
            }
        }
        last
    }
}

/// Classification of a price against the day's thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandBucket {
    /// Below every defined threshold (or no threshold defined).
    BelowRange,
    Level(BandLevel),
}

impl BandBucket {
    pub fn label(self) -> &'static str {
        match self {
            Self::BelowRange => OUT_OF_RANGE_LABEL,
            Self::Level(level) => level.label(),
        }
    }
}

impl Serialize for BandBucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}
