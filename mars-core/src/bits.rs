//! Bit-level conversions between VM argument words and floating point values.
//!
//! The interpreter moves every argument as a 32-bit word. A double travels as two
//! words, low word first. None of these go through numeric casts: the bits are kept
//! verbatim, NaN payloads included.

/// Join `(low, high)` into a 64-bit pattern and reinterpret it as a double.
#[inline]
pub fn double_from_words(low: i32, high: i32) -> f64 {
    let bits = (u64::from(high as u32) << 32) | u64::from(low as u32);
    f64::from_bits(bits)
}

/// Split a double into its `(low, high)` words.
#[inline]
pub fn words_from_double(value: f64) -> (i32, i32) {
    let bits = value.to_bits();
    (bits as u32 as i32, (bits >> 32) as u32 as i32)
}

#[inline]
pub fn float_from_word(word: i32) -> f32 {
    f32::from_bits(word as u32)
}

#[inline]
pub fn word_from_float(value: f32) -> i32 {
    value.to_bits() as i32
}
