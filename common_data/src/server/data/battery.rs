use serde::{Deserialize, Serialize};

/// A raw battery notification: charge `level` out of `scale`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatteryStatus {
    pub level: i32,
    pub scale: i32,
}

impl BatteryStatus {
    pub fn new(level: i32, scale: i32) -> BatteryStatus {
        return BatteryStatus { level, scale };
    }

    /// Charge as a whole percentage, clamped to 0..=100.
    ///
    /// Returns `None` for readings that carry no information (unknown level
    /// or a non-positive scale).
    pub fn percent(&self) -> Option<u8> {
        if self.scale <= 0 || self.level < 0 {
            return None;
        }

        let ratio = self.level as f64 / self.scale as f64;
        let percent = (ratio * 100.0).round().clamp(0.0, 100.0);

        Some(percent as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_charge() {
        assert_eq!(BatteryStatus::new(50, 100).percent(), Some(50));
    }

    #[test]
    fn rounds_to_nearest() {
        // 2/3 = 66.67%
        assert_eq!(BatteryStatus::new(2, 3).percent(), Some(67));
        // 1/3 = 33.33%
        assert_eq!(BatteryStatus::new(1, 3).percent(), Some(33));
        assert_eq!(BatteryStatus::new(1, 200).percent(), Some(1));
    }

    #[test]
    fn clamps_overfull_readings() {
        assert_eq!(BatteryStatus::new(120, 100).percent(), Some(100));
    }

    #[test]
    fn full_and_empty() {
        assert_eq!(BatteryStatus::new(255, 255).percent(), Some(100));
        assert_eq!(BatteryStatus::new(0, 255).percent(), Some(0));
    }

    #[test]
    fn unknown_readings() {
        assert_eq!(BatteryStatus::new(-1, -1).percent(), None);
        assert_eq!(BatteryStatus::new(50, 0).percent(), None);
        assert_eq!(BatteryStatus::new(-1, 100).percent(), None);
    }

    #[test]
    fn matches_ratio_for_every_level() {
        for scale in [1, 3, 7, 100, 255] {
            for level in 0..=scale {
                let expected = ((level as f64 / scale as f64) * 100.0).round() as u8;
                assert_eq!(BatteryStatus::new(level, scale).percent(), Some(expected));
            }
        }
    }
}
