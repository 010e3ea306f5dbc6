use ethnum::U256;
use lazy_static::lazy_static;
use num_bigint::BigUint;
use num_traits::One;

lazy_static! {
    static ref U128_MASK: BigUint = (BigUint::one() << 128_u32) - BigUint::one();
    static ref U256_MASK: BigUint = (BigUint::one() << 256_u32) - BigUint::one();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastError {
    Overflow,
}

pub fn big_uint_to_u256(value: &BigUint) -> Result<U256, CastError> {
    let bytes = value.to_bytes_be();
    if bytes.len() > 32 {
        return Err(CastError::Overflow);
    }
    let mut buf = [0u8; 32];
    buf[32 - bytes.len()..].copy_from_slice(&bytes);
    Ok(U256::from_be_bytes(buf))
}

pub fn u256_to_big_uint(value: U256) -> BigUint {
    BigUint::from_bytes_be(&value.to_be_bytes())
}

/// Truncates to the low 256 bits, the unbounded-arithmetic analogue of a
/// wrapping uint256 assignment.
pub fn big_uint_low_u256(value: &BigUint) -> U256 {
    big_uint_to_u256(&(value & &*U256_MASK)).expect("masked to 256 bits")
}

/// Truncates to the low 128 bits.
pub fn big_uint_low_u128(value: &BigUint) -> u128 {
    u128::try_from(&(value & &*U128_MASK)).expect("masked to 128 bits")
}
