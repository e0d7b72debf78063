//! Integer percentage math with checked narrowing.

use num_traits::cast::cast;

/// Floor of `value * pct / 100`, computed in `i128` so it cannot overflow.
#[must_use]
pub fn pct_of(value: i64, pct: u32) -> i64 {
    let scaled = i128::from(value) * i128::from(pct);
    let floored = scaled.div_euclid(100);
    i64::try_from(floored).unwrap_or(if floored < 0 { i64::MIN } else { i64::MAX })
}

/// Floor of `value * pct / 100` for unsigned point totals.
#[must_use]
pub fn pct_of_u32(value: u32, pct: u32) -> u32 {
    let scaled = u64::from(value) * u64::from(pct) / 100;
    cast::<u64, u32>(scaled).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pct_of_floors_toward_negative_infinity() {
        assert_eq!(pct_of(200, 50), 100);
        assert_eq!(pct_of(125, 50), 62);
        assert_eq!(pct_of(-3, 50), -2);
        assert_eq!(pct_of(i64::MAX, 200), i64::MAX);
    }

    #[test]
    fn pct_of_u32_matches_float_floor() {
        assert_eq!(pct_of_u32(150, 130), 195);
        assert_eq!(pct_of_u32(0, 150), 0);
    }
}
