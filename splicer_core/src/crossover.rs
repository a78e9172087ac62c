//! Strategies that combine bytes from two sources.
//!
//! The "self" variants copy within one buffer; `insert_part_of_self` stages
//! the copied slice in a caller-owned scratch buffer because the source range
//! may move while the tail is shifted.

use crate::random::Random;

/// Interleaves runs of `first` and `second` into `out`.
///
/// The output length is drawn from `1..=out.len()`; runs alternate between the
/// two inputs until either the output budget or both inputs are exhausted.
/// Returns the number of bytes written.
pub fn cross_over(rand: &mut Random, first: &[u8], second: &[u8], out: &mut [u8]) -> usize {
    assert!(
        !first.is_empty() || !second.is_empty(),
        "cross_over needs at least one non-empty input"
    );
    assert!(!out.is_empty(), "cross_over needs a non-empty output buffer");

    let max_out = rand.below(out.len()) + 1;
    let sources = [first, second];
    let mut positions = [0usize; 2];
    let mut current = 0;
    let mut out_pos = 0;

    while out_pos < max_out && (positions[0] < first.len() || positions[1] < second.len()) {
        let source = sources[current];
        let pos = positions[current];
        if pos < source.len() {
            let extra = rand.below((max_out - out_pos).min(source.len() - pos)) + 1;
            out[out_pos..out_pos + extra].copy_from_slice(&source[pos..pos + extra]);
            out_pos += extra;
            positions[current] += extra;
        }
        current ^= 1;
    }
    out_pos
}

/// Overwrites part of `to[..to_size]` with a slice of `from`. Returns `to_size`.
pub fn copy_part_of(rand: &mut Random, from: &[u8], to: &mut [u8], to_size: usize) -> usize {
    assert!(!from.is_empty() && to_size > 0, "copy_part_of on empty input");
    let (from_begin, to_begin, count) = pick_copy(rand, from.len(), to_size);
    to[to_begin..to_begin + count].copy_from_slice(&from[from_begin..from_begin + count]);
    to_size
}

/// [`copy_part_of`] where source and destination are the same buffer.
pub fn copy_part_of_self(rand: &mut Random, data: &mut [u8], size: usize) -> usize {
    assert!(size > 0, "copy_part_of_self on empty input");
    let (from_begin, to_begin, count) = pick_copy(rand, size, size);
    data.copy_within(from_begin..from_begin + count, to_begin);
    size
}

fn pick_copy(rand: &mut Random, from_size: usize, to_size: usize) -> (usize, usize, usize) {
    let to_begin = rand.below(to_size);
    let count = (rand.below(to_size - to_begin) + 1).min(from_size);
    let from_begin = rand.below(from_size - count + 1);
    (from_begin, to_begin, count)
}

/// Inserts a slice of `from` into `to[..to_size]`, growing it up to `max_to_size`.
///
/// Returns the new size, or `0` when `to` is already full.
pub fn insert_part_of(
    rand: &mut Random,
    from: &[u8],
    to: &mut [u8],
    to_size: usize,
    max_to_size: usize,
) -> usize {
    assert!(!from.is_empty(), "insert_part_of on empty input");
    let Some((from_begin, insert_at, count)) = pick_insert(rand, from.len(), to_size, max_to_size)
    else {
        return 0;
    };
    to.copy_within(insert_at..to_size, insert_at + count);
    to[insert_at..insert_at + count].copy_from_slice(&from[from_begin..from_begin + count]);
    to_size + count
}

/// [`insert_part_of`] where source and destination are the same buffer.
pub fn insert_part_of_self(
    rand: &mut Random,
    scratch: &mut Vec<u8>,
    data: &mut [u8],
    size: usize,
    max_size: usize,
) -> usize {
    assert!(size > 0, "insert_part_of_self on empty input");
    let Some((from_begin, insert_at, count)) = pick_insert(rand, size, size, max_size) else {
        return 0;
    };
    scratch.clear();
    scratch.extend_from_slice(&data[from_begin..from_begin + count]);
    data.copy_within(insert_at..size, insert_at + count);
    data[insert_at..insert_at + count].copy_from_slice(&scratch[..]);
    size + count
}

fn pick_insert(
    rand: &mut Random,
    from_size: usize,
    to_size: usize,
    max_to_size: usize,
) -> Option<(usize, usize, usize)> {
    if to_size >= max_to_size {
        return None;
    }
    let count = rand.below((max_to_size - to_size).min(from_size)) + 1;
    let from_begin = rand.below(from_size - count + 1);
    let insert_at = rand.below(to_size + 1);
    Some((from_begin, insert_at, count))
}

/// Copies part of the buffer over itself or inserts a copy of part of it.
pub fn copy_part(
    rand: &mut Random,
    scratch: &mut Vec<u8>,
    data: &mut [u8],
    size: usize,
    max_size: usize,
) -> usize {
    assert!(size <= max_size && data.len() >= max_size);
    if rand.next_bool() {
        copy_part_of_self(rand, data, size)
    } else {
        insert_part_of_self(rand, scratch, data, size, max_size)
    }
}
