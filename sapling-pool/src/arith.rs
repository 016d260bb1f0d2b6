//! Shared 256-bit modular arithmetic used by [`crate::field::Field`] and
//! [`crate::scalar::Scalar`]. Both types are integers modulo a fixed prime
//! (the curve's base field and the Jubjub subgroup order respectively); the
//! limb-level add/sub/mul-reduce routines are identical for both moduli, so
//! they live here once instead of being copy-pasted into each type.
//!
//! Representation: little-endian `[u64; 4]`, i.e. `limbs[0]` holds the least
//! significant 64 bits. Values are always kept fully reduced (`< modulus`)
//! between calls. This is a schoolbook implementation, not constant-time or
//! Montgomery form; per the non-goals, only signature/tag comparisons and
//! scalar arithmetic used for secret-dependent branching need to avoid
//! timing leaks, and those are handled with `subtle` at the call site.

pub type Limbs = [u64; 4];

pub const ZERO: Limbs = [0, 0, 0, 0];
pub const ONE: Limbs = [1, 0, 0, 0];

#[inline]
fn adc(a: u64, b: u64, carry: u64) -> (u64, u64) {
    let sum = a as u128 + b as u128 + carry as u128;
    (sum as u64, (sum >> 64) as u64)
}

#[inline]
fn sbb(a: u64, b: u64, borrow: u64) -> (u64, u64) {
    let diff = (a as i128) - (b as i128) - (borrow as i128);
    if diff < 0 {
        ((diff + (1i128 << 64)) as u64, 1)
    } else {
        (diff as u64, 0)
    }
}

#[inline]
fn mac(acc: u64, a: u64, b: u64, carry: u64) -> (u64, u64) {
    let r = acc as u128 + (a as u128) * (b as u128) + carry as u128;
    (r as u64, (r >> 64) as u64)
}

pub fn is_zero(a: &Limbs) -> bool {
    a.iter().all(|&l| l == 0)
}

/// `a >= b`, comparing as 4-limb little-endian integers.
pub fn ge(a: &Limbs, b: &Limbs) -> bool {
    for i in (0..4).rev() {
        if a[i] != b[i] {
            return a[i] > b[i];
        }
    }
    true
}

pub fn lt(a: &Limbs, b: &Limbs) -> bool {
    !ge(a, b)
}

fn sub_inplace(a: &mut Limbs, b: &Limbs) {
    let mut borrow = 0u64;
    for i in 0..4 {
        let (d, bo) = sbb(a[i], b[i], borrow);
        a[i] = d;
        borrow = bo;
    }
}

pub fn add(a: &Limbs, b: &Limbs, modulus: &Limbs) -> Limbs {
    let mut sum = [0u64; 4];
    let mut carry = 0u64;
    for i in 0..4 {
        let (s, c) = adc(a[i], b[i], carry);
        sum[i] = s;
        carry = c;
    }
    if carry != 0 || ge(&sum, modulus) {
        sub_inplace(&mut sum, modulus);
    }
    sum
}

pub fn sub(a: &Limbs, b: &Limbs, modulus: &Limbs) -> Limbs {
    let mut diff = [0u64; 4];
    let mut borrow = 0u64;
    for i in 0..4 {
        let (d, bo) = sbb(a[i], b[i], borrow);
        diff[i] = d;
        borrow = bo;
    }
    if borrow != 0 {
        let mut carry = 0u64;
        for i in 0..4 {
            let (s, c) = adc(diff[i], modulus[i], carry);
            diff[i] = s;
            carry = c;
        }
    }
    diff
}

pub fn negate(a: &Limbs, modulus: &Limbs) -> Limbs {
    if is_zero(a) {
        ZERO
    } else {
        sub(modulus, a, modulus)
    }
}

fn mul_wide(a: &Limbs, b: &Limbs) -> [u64; 8] {
    let mut t = [0u64; 8];
    for i in 0..4 {
        let mut carry = 0u64;
        for j in 0..4 {
            let (lo, hi) = mac(t[i + j], a[i], b[j], carry);
            t[i + j] = lo;
            carry = hi;
        }
        let mut k = i + 4;
        while carry != 0 {
            let (lo, hi) = adc(t[k], 0, carry);
            t[k] = lo;
            carry = hi;
            k += 1;
        }
    }
    t
}

/// `t >= m`, where `t` is a 5-limb and `m` a 4-limb (zero-extended) integer.
fn ge5(t: &[u64; 5], m: &Limbs) -> bool {
    if t[4] != 0 {
        return true;
    }
    for i in (0..4).rev() {
        if t[i] != m[i] {
            return t[i] > m[i];
        }
    }
    true
}

fn sub5_inplace(t: &mut [u64; 5], m: &Limbs) {
    let mut borrow = 0u64;
    for i in 0..4 {
        let (d, bo) = sbb(t[i], m[i], borrow);
        t[i] = d;
        borrow = bo;
    }
    let (d, _bo) = sbb(t[4], 0, borrow);
    t[4] = d;
}

/// Reduce a 512-bit product modulo a ~256-bit modulus by simple
/// shift-and-subtract binary long division: process the dividend one bit at
/// a time from most to least significant, shifting it into a running
/// remainder and subtracting the modulus whenever the remainder exceeds it.
fn reduce_wide(t: &[u64; 8], modulus: &Limbs) -> Limbs {
    let mut rem = [0u64; 5];
    for bit_idx in (0..512).rev() {
        let mut carry = 0u64;
        for limb in rem.iter_mut() {
            let next_carry = *limb >> 63;
            *limb = (*limb << 1) | carry;
            carry = next_carry;
        }
        let word = bit_idx / 64;
        let off = bit_idx % 64;
        let bit = (t[word] >> off) & 1;
        rem[0] |= bit;
        if ge5(&rem, modulus) {
            sub5_inplace(&mut rem, modulus);
        }
    }
    [rem[0], rem[1], rem[2], rem[3]]
}

pub fn mul(a: &Limbs, b: &Limbs, modulus: &Limbs) -> Limbs {
    reduce_wide(&mul_wide(a, b), modulus)
}

pub fn square(a: &Limbs, modulus: &Limbs) -> Limbs {
    mul(a, a, modulus)
}

/// Right-to-left binary exponentiation, `base^exp mod modulus`.
pub fn pow(base: &Limbs, exp: &Limbs, modulus: &Limbs) -> Limbs {
    let mut result = ONE;
    let mut b = *base;
    for &limb in exp.iter() {
        let mut e = limb;
        for _ in 0..64 {
            if e & 1 == 1 {
                result = mul(&result, &b, modulus);
            }
            b = square(&b, modulus);
            e >>= 1;
        }
    }
    result
}

/// `a - 2`, used to build the Fermat-inverse exponent `modulus - 2`.
pub fn minus_two(modulus: &Limbs) -> Limbs {
    sub(modulus, &[2, 0, 0, 0], modulus)
}

pub fn from_bytes_le(bytes: &[u8; 32]) -> Limbs {
    let mut limbs = [0u64; 4];
    for (i, limb) in limbs.iter_mut().enumerate() {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&bytes[i * 8..i * 8 + 8]);
        *limb = u64::from_le_bytes(buf);
    }
    limbs
}

pub fn to_bytes_le(limbs: &Limbs) -> [u8; 32] {
    let mut out = [0u8; 32];
    for (i, limb) in limbs.iter().enumerate() {
        out[i * 8..i * 8 + 8].copy_from_slice(&limb.to_le_bytes());
    }
    out
}

/// Reduce a 64-byte little-endian integer (`bytes[0]` least significant)
/// modulo `modulus`. Used to bring 64-byte PRF output (`PRF_expand`) down to
/// a single field/scalar element.
pub fn reduce_wide_bytes(bytes: &[u8; 64]) -> [u64; 8] {
    let mut t = [0u64; 8];
    for (i, limb) in t.iter_mut().enumerate() {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&bytes[i * 8..i * 8 + 8]);
        *limb = u64::from_le_bytes(buf);
    }
    t
}

pub fn reduce_512(t: &[u64; 8], modulus: &Limbs) -> Limbs {
    reduce_wide(t, modulus)
}
