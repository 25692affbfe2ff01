use std::collections::HashMap;

/// Extract a parameter as usize with a default value
pub fn get_param_usize(params: &HashMap<String, f64>, key: &str, default: usize) -> usize {
    params
        .get(key)
        .copied()
        .filter(|v| v.is_finite())
        .map(|v| v.round().max(0.0) as usize)
        .unwrap_or(default)
}

/// Extract the first present key out of `keys` as usize, falling back to `default`
pub fn get_param_usize_any(params: &HashMap<String, f64>, keys: &[&str], default: usize) -> usize {
    keys.iter()
        .find(|key| params.contains_key(**key))
        .map(|key| get_param_usize(params, key, default))
        .unwrap_or(default)
}

/// Extract a parameter as u64 seed, if present and finite
pub fn get_param_seed(params: &HashMap<String, f64>, key: &str) -> Option<u64> {
    params
        .get(key)
        .copied()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| v as u64)
}
