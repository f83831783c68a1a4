use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

pub fn format_amount(amount: f64) -> String {
    const UNITS: [&str; 5] = ["", "K", "M", "B", "T"];

    if !amount.is_finite() {
        return "n/a".to_owned();
    }

    let mut value = amount.abs();
    let mut unit = 0usize;
    while value >= 1000.0 && unit < UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }

    let sign = if amount < 0.0 { "-" } else { "" };
    if unit == 0 {
        format!("{sign}{value:.2}")
    } else {
        format!("{sign}{value:.1}{}", UNITS[unit])
    }
}

/// Long account ids are shortened for canvas labels.
pub fn short_id(id: &str) -> String {
    const MAX_CHARS: usize = 14;

    if id.chars().count() <= MAX_CHARS {
        return id.to_owned();
    }

    let head = id.chars().take(MAX_CHARS - 1).collect::<String>();
    format!("{head}…")
}

pub fn stable_pair(id: &str) -> (f32, f32) {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    let hash = hasher.finish();

    let x = ((hash & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    let y = (((hash >> 32) & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    ((x * 2.0) - 1.0, (y * 2.0) - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_amounts_with_suffixes() {
        assert_eq!(format_amount(12.5), "12.50");
        assert_eq!(format_amount(1_500.0), "1.5K");
        assert_eq!(format_amount(2_750_000.0), "2.8M");
        assert_eq!(format_amount(-4_200.0), "-4.2K");
        assert_eq!(format_amount(f64::NAN), "n/a");
    }

    #[test]
    fn short_id_keeps_short_ids_intact() {
        assert_eq!(short_id("ACC_001"), "ACC_001");
        let shortened = short_id("ACCOUNT_WITH_A_VERY_LONG_IDENTIFIER");
        assert_eq!(shortened.chars().count(), 14);
        assert!(shortened.ends_with('…'));
    }

    #[test]
    fn stable_pair_is_deterministic_and_bounded() {
        let first = stable_pair("ACC_42");
        assert_eq!(first, stable_pair("ACC_42"));
        assert!((-1.0..=1.0).contains(&first.0));
        assert!((-1.0..=1.0).contains(&first.1));
    }
}
