//! Stateless byte-level mutation strategies.
//!
//! Every strategy has the same shape: it receives the random source, the
//! caller's buffer, the current logical `size` and the `max_size` capacity,
//! and returns either the new logical size (`0 < new_size <= max_size`) or
//! `0` when it is not applicable to this buffer.
//!
//! The buffer slice must be at least `max_size` bytes long; only the first
//! `size` bytes are meaningful on entry.

use crate::random::Random;

/// Bytes that tend to matter to parsers, mixed into random byte choices.
pub const SPECIAL_BYTES: &[u8] = b"!*'();:@&=+$,/?%#[]012Az-`~.\xff\x00";

/// Fewest bytes `insert_repeated_bytes` inserts.
const MIN_REPEATED_BYTES: usize = 3;
/// Most bytes `insert_repeated_bytes` inserts.
const MAX_REPEATED_BYTES: usize = 128;
/// Longest run `shuffle_bytes` permutes.
const MAX_SHUFFLE_BYTES: usize = 8;

#[inline]
fn check_buffer(data: &[u8], size: usize, max_size: usize) {
    assert!(size <= max_size, "size {size} exceeds max_size {max_size}");
    assert!(
        data.len() >= max_size,
        "buffer of {} bytes is smaller than max_size {max_size}",
        data.len()
    );
}

/// Picks a byte: half the time uniformly, otherwise from [`SPECIAL_BYTES`].
pub fn random_char(rand: &mut Random) -> u8 {
    if rand.next_bool() {
        return rand.next_byte();
    }
    SPECIAL_BYTES[rand.below(SPECIAL_BYTES.len())]
}

/// C `isspace` in the "C" locale.
#[inline]
pub(crate) fn is_space(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | 0x0b | 0x0c | b'\r')
}

/// C `isprint` in the "C" locale.
#[inline]
pub(crate) fn is_print(byte: u8) -> bool {
    (0x20..0x7f).contains(&byte)
}

/// Folds every byte into printable ASCII or whitespace.
///
/// The high bit is dropped first; anything still unprintable becomes a
/// space. Returns `true` if any byte changed.
pub fn to_ascii(data: &mut [u8]) -> bool {
    let mut changed = false;
    for byte in data.iter_mut() {
        let mut folded = *byte & 0x7f;
        if !is_space(folded) && !is_print(folded) {
            folded = b' ';
        }
        changed |= folded != *byte;
        *byte = folded;
    }
    changed
}

/// Removes a random run of `1..=size/2` bytes.
pub fn erase_bytes(rand: &mut Random, data: &mut [u8], size: usize, max_size: usize) -> usize {
    check_buffer(data, size, max_size);
    assert!(size > 0, "erase_bytes requires a non-empty buffer");
    if size == 1 {
        return 0;
    }
    let count = rand.below(size / 2) + 1;
    let start = rand.below(size - count + 1);
    data.copy_within(start + count..size, start);
    size - count
}

/// Inserts one random byte at a random offset.
pub fn insert_byte(rand: &mut Random, data: &mut [u8], size: usize, max_size: usize) -> usize {
    check_buffer(data, size, max_size);
    if size == max_size {
        return 0;
    }
    let at = rand.below(size + 1);
    data.copy_within(at..size, at + 1);
    data[at] = random_char(rand);
    size + 1
}

/// Inserts a run of one repeated byte, preferring `0x00` and `0xff`.
pub fn insert_repeated_bytes(
    rand: &mut Random,
    data: &mut [u8],
    size: usize,
    max_size: usize,
) -> usize {
    check_buffer(data, size, max_size);
    if size + MIN_REPEATED_BYTES >= max_size {
        return 0;
    }
    let max_insert = (max_size - size).min(MAX_REPEATED_BYTES);
    let count = rand.below(max_insert - MIN_REPEATED_BYTES + 1) + MIN_REPEATED_BYTES;
    let at = rand.below(size + 1);
    data.copy_within(at..size, at + count);
    let byte = if rand.next_bool() {
        rand.next_byte()
    } else if rand.next_bool() {
        0x00
    } else {
        0xff
    };
    data[at..at + count].fill(byte);
    size + count
}

/// Overwrites one byte with [`random_char`].
pub fn change_byte(rand: &mut Random, data: &mut [u8], size: usize, max_size: usize) -> usize {
    check_buffer(data, size, max_size);
    assert!(size > 0, "change_byte requires a non-empty buffer");
    let at = rand.below(size);
    data[at] = random_char(rand);
    size
}

/// Flips a single bit.
pub fn change_bit(rand: &mut Random, data: &mut [u8], size: usize, max_size: usize) -> usize {
    check_buffer(data, size, max_size);
    assert!(size > 0, "change_bit requires a non-empty buffer");
    let at = rand.below(size);
    data[at] ^= 1 << rand.below(8);
    size
}

/// Permutes a run of up to eight bytes.
pub fn shuffle_bytes(rand: &mut Random, data: &mut [u8], size: usize, max_size: usize) -> usize {
    check_buffer(data, size, max_size);
    assert!(size > 0, "shuffle_bytes requires a non-empty buffer");
    let count = rand.below(size.min(MAX_SHUFFLE_BYTES)) + 1;
    let start = rand.below(size - count + 1);
    rand.shuffle(&mut data[start..start + count]);
    size
}

/// Rewrites the first run of ASCII digits found at or after a random offset.
///
/// The run is parsed as an unsigned decimal, one arithmetic tweak is applied
/// and the result is written back right-aligned into the same digits, so a
/// value wider than the run keeps only its low-order digits.
pub fn change_ascii_integer(
    rand: &mut Random,
    data: &mut [u8],
    size: usize,
    max_size: usize,
) -> usize {
    check_buffer(data, size, max_size);
    assert!(size > 0, "change_ascii_integer requires a non-empty buffer");
    let from = rand.below(size);
    let Some(begin) = data[from..size]
        .iter()
        .position(u8::is_ascii_digit)
        .map(|offset| from + offset)
    else {
        return 0;
    };
    let end = data[begin..size]
        .iter()
        .position(|byte| !byte.is_ascii_digit())
        .map_or(size, |offset| begin + offset);

    let op = rand.below(5);
    rewrite_ascii_integer(rand, &mut data[begin..end], op);
    size
}

/// Applies tweak `op` (0..5: +1, -1, /2, *2, random below the square) to the
/// decimal in `digits`, keeping only as many low-order digits as fit.
fn rewrite_ascii_integer(rand: &mut Random, digits: &mut [u8], op: usize) {
    let mut value = digits.iter().fold(0u64, |acc, digit| {
        acc.wrapping_mul(10).wrapping_add(u64::from(digit - b'0'))
    });

    value = match op {
        0 => value.wrapping_add(1),
        1 => value.wrapping_sub(1),
        2 => value / 2,
        3 => value.wrapping_mul(2),
        _ => {
            let square = value.wrapping_mul(value);
            if square == 0 { 0 } else { rand.below_u64(square) }
        }
    };

    for slot in digits.iter_mut().rev() {
        *slot = b'0' + (value % 10) as u8;
        value /= 10;
    }
}

/// Width of the integer `change_binary_integer` operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegerWidth {
    W1,
    W2,
    W4,
    W8,
}

impl IntegerWidth {
    pub const ALL: [IntegerWidth; 4] = [
        IntegerWidth::W1,
        IntegerWidth::W2,
        IntegerWidth::W4,
        IntegerWidth::W8,
    ];

    pub fn bytes(self) -> usize {
        match self {
            IntegerWidth::W1 => 1,
            IntegerWidth::W2 => 2,
            IntegerWidth::W4 => 4,
            IntegerWidth::W8 => 8,
        }
    }
}

/// Read-modify-write of one native-endian integer of type `$ty` in `$window`.
///
/// The delta is applied either directly or to the byte-swapped value, which
/// models an edit made by a program of the other endianness.
macro_rules! tweak_integer {
    ($ty:ty, $rand:expr, $window:expr, $delta:expr) => {{
        let mut raw = [0u8; std::mem::size_of::<$ty>()];
        raw.copy_from_slice($window);
        let mut value = <$ty>::from_ne_bytes(raw);
        let delta = $delta as $ty;
        value = if $rand.next_bool() {
            value.swap_bytes().wrapping_add(delta).swap_bytes()
        } else {
            value.wrapping_add(delta)
        };
        if $delta == 0 || $rand.next_bool() {
            value = value.wrapping_neg();
        }
        $window.copy_from_slice(&value.to_ne_bytes());
    }};
}

/// Adds a small delta to a binary integer of a randomly chosen width.
pub fn change_binary_integer(
    rand: &mut Random,
    data: &mut [u8],
    size: usize,
    max_size: usize,
) -> usize {
    check_buffer(data, size, max_size);
    let width = IntegerWidth::ALL[rand.below(IntegerWidth::ALL.len())];
    change_binary_integer_of_width(rand, width, data, size)
}

/// [`change_binary_integer`] with a fixed width.
pub fn change_binary_integer_of_width(
    rand: &mut Random,
    width: IntegerWidth,
    data: &mut [u8],
    size: usize,
) -> usize {
    let bytes = width.bytes();
    if size < bytes {
        return 0;
    }
    let offset = rand.below(size - bytes + 1);
    let delta = rand.below(21) as i64 - 10;
    let window = &mut data[offset..offset + bytes];
    match width {
        IntegerWidth::W1 => tweak_integer!(u8, rand, window, delta),
        IntegerWidth::W2 => tweak_integer!(u16, rand, window, delta),
        IntegerWidth::W4 => tweak_integer!(u32, rand, window, delta),
        IntegerWidth::W8 => tweak_integer!(u64, rand, window, delta),
    }
    size
}
