//! Helpers for cyclic sequences.
//!
//! A tile's connector weights form a cycle: rotating the tile rotates the
//! sequence, mirroring it reverses the sequence. These functions treat
//! slices that way.

use rand::Rng;

/// A canonicalized cycle and how to reach it from the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canonical<T> {
    /// Lexicographically smallest rotation of the input or its reversal.
    pub cycle: Vec<T>,
    /// The minimum came from the reversed sequence.
    pub mirrored: bool,
    /// Left-rotation offset applied to reach the minimum.
    pub turns: usize,
}

/// Rotational and axial symmetry of a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Symmetries {
    /// The reversed cycle is one of the cycle's rotations, i.e. some
    /// reflection maps the tile onto itself.
    pub axial: bool,
    /// Every order `d` (a divisor of the length) under which the cycle
    /// maps onto itself. Always contains 1 for a non-empty cycle.
    pub rotational: Vec<usize>,
}

/// `s` rotated left by `k`.
pub fn rotate_left<T: Clone>(s: &[T], k: usize) -> Vec<T> {
    if s.is_empty() {
        return Vec::new();
    }
    let k = k % s.len();
    s[k..].iter().chain(&s[..k]).cloned().collect()
}

/// Smallest rotation of `s` or of `s` reversed.
///
/// The input's own rotations are tried first and a candidate replaces the
/// current best only when strictly smaller, so a sequence that is already
/// canonical comes back with `turns == 0` and `mirrored == false`.
pub fn canonical_form<T: Ord + Clone>(s: &[T]) -> Canonical<T> {
    let mut best = Canonical { cycle: s.to_vec(), mirrored: false, turns: 0 };
    let reversed: Vec<T> = s.iter().rev().cloned().collect();

    for (mirrored, seq) in [(false, s), (true, reversed.as_slice())] {
        for k in 0..seq.len() {
            let candidate = rotate_left(seq, k);
            if candidate < best.cycle {
                best = Canonical { cycle: candidate, mirrored, turns: k };
            }
        }
    }
    best
}

pub fn is_palindrome<T: PartialEq>(s: &[T]) -> bool {
    s.iter().eq(s.iter().rev())
}

/// Divisors of `n` in ascending order.
pub fn divisors(n: usize) -> Vec<usize> {
    (1..=n).filter(|d| n % d == 0).collect()
}

pub fn symmetries<T: PartialEq + Clone>(s: &[T]) -> Symmetries {
    let n = s.len();
    if n == 0 {
        return Symmetries::default();
    }
    let reversed: Vec<T> = s.iter().rev().cloned().collect();
    let axial = (0..n).any(|k| is_palindrome(&rotate_left(s, k)) || rotate_left(&reversed, k) == s);
    let rotational = divisors(n)
        .into_iter()
        .filter(|&d| {
            let period = n / d;
            (0..n).all(|i| s[i] == s[(i + period) % n])
        })
        .collect();
    Symmetries { axial, rotational }
}

/// Start offsets at which `needle` occurs in `haystack` read cyclically.
pub fn cyclic_matches<T: PartialEq>(haystack: &[T], needle: &[T]) -> Vec<usize> {
    let n = haystack.len();
    if needle.is_empty() || needle.len() > n {
        return Vec::new();
    }
    (0..n)
        .filter(|&start| needle.iter().enumerate().all(|(j, v)| haystack[(start + j) % n] == *v))
        .collect()
}

/// `needle` occurs in `haystack` read cyclically, in either direction.
pub fn cyclically_includes<T: PartialEq + Clone>(haystack: &[T], needle: &[T]) -> bool {
    if !cyclic_matches(haystack, needle).is_empty() {
        return true;
    }
    let reversed: Vec<T> = needle.iter().rev().cloned().collect();
    !cyclic_matches(haystack, &reversed).is_empty()
}

/// Pick one of `items` with probability proportional to `weights`.
///
/// Returns `None` when `items` is empty or the weights don't sum to a
/// positive number.
pub fn pick_weighted<'a, T, R: Rng + ?Sized>(
    rng: &mut R,
    items: &'a [T],
    weights: &[f64],
) -> Option<&'a T> {
    let total: f64 = weights.iter().take(items.len()).sum();
    if items.is_empty() || !(total > 0.0) {
        return None;
    }
    let r = rng.random::<f64>() * total;
    let mut cumulative = 0.0;
    for (item, w) in items.iter().zip(weights) {
        cumulative += w;
        if r <= cumulative {
            return Some(item);
        }
    }
    items.last()
}
