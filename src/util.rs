use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Process-independent hash; `DefaultHasher::new` uses fixed keys.
pub fn stable_hash(value: impl Hash) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Maps `id` onto `[-1, 1]`, the same value every run.
pub fn stable_unit(id: &str) -> f32 {
    let hash = stable_hash(id);
    let unit = ((hash >> 32) as f64 / u32::MAX as f64) as f32;
    (unit * 2.0) - 1.0
}

pub fn format_percent(value: f32) -> String {
    if value <= 0.0 {
        "0%".to_owned()
    } else if value < 10.0 {
        format!("{value:.1}%")
    } else {
        format!("{value:.0}%")
    }
}
