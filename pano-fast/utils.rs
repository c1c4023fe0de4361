//! Utility functions for corner detection algorithms

/// Check if there are at least `min_count` consecutive set bits in a circular 16-bit mask.
pub fn has_consecutive_bits(mask: u16, min_count: usize) -> bool {
    if min_count > 16 || min_count == 0 {
        return false;
    }

    // A run of length n survives n-1 rotate-and-AND steps
    let mut test_mask = mask;
    for i in 1..min_count {
        test_mask &= mask.rotate_left(i as u32);
        if test_mask == 0 {
            return false;
        }
    }

    test_mask != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_consecutive_pixels(pixels: &[bool; 16], min_count: usize) -> bool {
        let mask = pixels
            .iter()
            .enumerate()
            .fold(0u16, |m, (i, &p)| if p { m | (1 << i) } else { m });
        has_consecutive_bits(mask, min_count)
    }

    fn longest_run(pixels: &[bool; 16]) -> usize {
        if pixels.iter().all(|&p| p) {
            return 16;
        }
        let mut best = 0;
        let mut current = 0;
        for i in 0..32 {
            if pixels[i % 16] {
                current += 1;
                best = best.max(current);
            } else {
                current = 0;
            }
        }
        best
    }

    #[test]
    fn test_consecutive_pixels_simple() {
        let mut pixels = [false; 16];
        for p in pixels.iter_mut().take(9) {
            *p = true;
        }
        assert!(has_consecutive_pixels(&pixels, 9));
        assert!(!has_consecutive_pixels(&pixels, 10));
    }

    #[test]
    fn test_consecutive_pixels_wrap_around() {
        let mut pixels = [false; 16];
        for i in 12..16 {
            pixels[i] = true;
        }
        for i in 0..5 {
            pixels[i] = true;
        }
        assert!(has_consecutive_pixels(&pixels, 9));
    }

    #[test]
    fn test_non_consecutive_pixels() {
        let mut pixels = [false; 16];
        for i in (0..16).step_by(2) {
            pixels[i] = true;
        }
        assert!(!has_consecutive_pixels(&pixels, 2));
        assert!(has_consecutive_pixels(&pixels, 1));
    }

    #[test]
    fn test_degenerate_counts() {
        assert!(!has_consecutive_bits(u16::MAX, 0));
        assert!(!has_consecutive_bits(u16::MAX, 17));
        assert!(has_consecutive_bits(u16::MAX, 16));
    }

    proptest::proptest! {
        #[test]
        fn bitmask_agrees_with_linear_scan(mask in proptest::prelude::any::<u16>(), n in 1usize..=16) {
            let mut pixels = [false; 16];
            for (i, p) in pixels.iter_mut().enumerate() {
                *p = mask & (1 << i) != 0;
            }
            proptest::prop_assert_eq!(has_consecutive_pixels(&pixels, n), longest_run(&pixels) >= n);
        }
    }
}
