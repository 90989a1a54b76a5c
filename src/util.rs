use alloc::{string::String, vec::Vec};

const LAYER_SEPARATOR: &str = " - ";

/// Reverses a layer stack and joins it, optionally keeping only the `limit`
/// most recent entries.
pub(crate) fn join_layers(layers: &[String], limit: Option<usize>) -> String {
    let reversed: Vec<&str> = layers.iter().rev().map(String::as_str).collect();
    match limit {
        Some(limit) => limit_slice(&reversed, limit).join(LAYER_SEPARATOR),
        None => reversed.join(LAYER_SEPARATOR),
    }
}

/// The first `limit` elements of `source`, or all of them if there are fewer.
pub(crate) fn limit_slice<T>(source: &[T], limit: usize) -> &[T] {
    &source[..limit.min(source.len())]
}
