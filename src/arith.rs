//! Integer arithmetic used by the genus engine.
//!
//! Valuations, Kronecker symbols, modular inverses and trial-division
//! factorization over arbitrary-precision integers.
//!
//! # Citations
//! - Cohen, "A Course in Computational Algebraic Number Theory" (1993), §1.4 – Kronecker symbol
//! - Ireland & Rosen, "A Classical Introduction to Modern Number Theory" (1990), Ch. 5 – Euler's criterion

use crate::error::{GenusError, Result};
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed, ToPrimitive, Zero};

/// Returns the `p`-adic valuation of `n`, or `None` for `n = 0`.
pub fn valuation(n: &BigInt, p: u64) -> Option<u32> {
    if n.is_zero() {
        return None;
    }
    let p = BigInt::from(p);
    let mut n = n.clone();
    let mut v = 0;
    loop {
        let (q, r) = n.div_rem(&p);
        if !r.is_zero() {
            return Some(v);
        }
        n = q;
        v += 1;
    }
}

/// Returns `p^e` as a big integer.
pub fn pow(p: u64, e: u32) -> BigInt {
    BigInt::from(p).pow(e)
}

/// Primality by trial division.
pub fn is_prime(p: u64) -> bool {
    if p < 2 {
        return false;
    }
    if p % 2 == 0 {
        return p == 2;
    }
    let mut d = 3u64;
    while d.saturating_mul(d) <= p {
        if p % d == 0 {
            return false;
        }
        d += 2;
    }
    true
}

/// Kronecker symbol `(a | p)` for a prime `p`.
///
/// For odd `p` this is the Legendre symbol (Euler's criterion). For `p = 2`
/// it is `0` on even `a`, `1` on `a ≡ ±1 (mod 8)` and `-1` on `a ≡ ±3 (mod 8)`.
pub fn kronecker(a: &BigInt, p: u64) -> i8 {
    if p == 2 {
        return match residue(a, 8) {
            1 | 7 => 1,
            3 | 5 => -1,
            _ => 0,
        };
    }
    let r = residue(a, p);
    if r == 0 {
        return 0;
    }
    if pow_mod(r, (p - 1) / 2, p) == 1 {
        1
    } else {
        -1
    }
}

/// Least non-negative residue of `a` modulo `m`.
pub fn residue(a: &BigInt, m: u64) -> u64 {
    a.mod_floor(&BigInt::from(m)).to_u64().unwrap_or(0)
}

/// Computes `base^exp mod m` in machine integers.
pub fn pow_mod(base: u64, mut exp: u64, m: u64) -> u64 {
    if m == 1 {
        return 0;
    }
    let m128 = m as u128;
    let mut result: u128 = 1;
    let mut b = (base % m) as u128;
    while exp > 0 {
        if exp & 1 == 1 {
            result = result * b % m128;
        }
        b = b * b % m128;
        exp >>= 1;
    }
    result as u64
}

/// Inverse of `a` modulo `m`, reduced into `[0, m)`, if `gcd(a, m) = 1`.
pub fn mod_inverse(a: &BigInt, m: &BigInt) -> Option<BigInt> {
    let (mut old_r, mut r) = (a.mod_floor(m), m.clone());
    let (mut old_s, mut s) = (BigInt::one(), BigInt::zero());
    while !r.is_zero() {
        let q = old_r.div_floor(&r);
        let next_r = &old_r - &q * &r;
        old_r = std::mem::replace(&mut r, next_r);
        let next_s = &old_s - &q * &s;
        old_s = std::mem::replace(&mut s, next_s);
    }
    if old_r.is_one() {
        Some(old_s.mod_floor(m))
    } else {
        None
    }
}

/// Smallest positive quadratic non-residue modulo an odd prime `p`.
pub fn min_nonsquare(p: u64) -> u64 {
    (2..p)
        .find(|&u| kronecker(&BigInt::from(u), p) == -1)
        .unwrap_or(p)
}

/// Distinct prime factors of `n` in increasing order.
///
/// Trial division; a remaining cofactor must fit in `u64`.
pub fn prime_factors(n: &BigInt) -> Result<Vec<u64>> {
    let mut n = n.abs();
    let mut primes = Vec::new();
    if n.is_zero() {
        return Err(GenusError::Singular);
    }
    let mut d = 2u64;
    loop {
        let big_d = BigInt::from(d);
        if &big_d * &big_d > n {
            break;
        }
        if (&n % &big_d).is_zero() {
            primes.push(d);
            while (&n % &big_d).is_zero() {
                n /= &big_d;
            }
        }
        d += if d == 2 { 1 } else { 2 };
    }
    if !n.is_one() {
        let last = n
            .to_u64()
            .ok_or_else(|| GenusError::FactorTooLarge(n.to_string()))?;
        primes.push(last);
    }
    Ok(primes)
}

/// `p^m mod 8`, for p-excess sums.
pub fn pow_mod8(p: u64, m: u32) -> i64 {
    pow_mod(p, m as u64, 8) as i64
}
