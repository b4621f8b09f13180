//! Transform size selection.
//!
//! FFTs are fastest when their length factors into small primes. These
//! helpers split a length into the factors the transform implements directly
//! and search for the closest length that only uses them.

/// Factors handled natively by the transform, largest first.
pub const IMPLEMENTED_FACTORS: [usize; 6] = [13, 11, 7, 5, 3, 2];

/// Splits `n` into prime factors, extracting the implemented factors first.
///
/// Any remaining factors (primes larger than 13) follow in increasing order.
/// `factorize(0)` and `factorize(1)` return an empty list.
pub fn factorize(n: usize) -> Vec<usize> {
    let mut factors = Vec::new();
    if n < 2 {
        return factors;
    }
    let mut rest = n;
    for &factor in IMPLEMENTED_FACTORS.iter() {
        while rest % factor == 0 {
            factors.push(factor);
            rest /= factor;
        }
    }
    let mut factor = 17;
    while rest > 1 {
        if factor * factor > rest {
            factors.push(rest);
            break;
        }
        while rest % factor == 0 {
            factors.push(factor);
            rest /= factor;
        }
        factor += 2;
    }
    factors
}

/// Returns true if `n` only factors into implemented factors.
pub fn is_optimal(n: usize) -> bool {
    n > 0
        && factorize(n)
            .iter()
            .all(|f| IMPLEMENTED_FACTORS.contains(f))
}

/// Returns the smallest optimal size greater than or equal to `n`.
///
/// The next power of two is always optimal, so the search never inflates the
/// size by more than a factor of two.
pub fn find_closest_factor(n: usize) -> usize {
    if n <= 1 {
        return 1;
    }
    let bound = n.next_power_of_two();
    (n..bound).find(|&m| is_optimal(m)).unwrap_or(bound)
}
