//! Permission bitfields: growable sets of capability bits.
//!
//! A [`Bitfield`] is conceptually an unbounded non-negative integer where
//! bit `n` set means capability `n` is present. It is backed by a roaring
//! bitmap so the registry can grow past any machine word without truncation.
//!
//! All operations are pure. Methods that "modify" a bitfield return a new
//! value and leave the receiver untouched.

use std::fmt;
use std::fmt::Write as _;
use std::str::FromStr;

use roaring::RoaringBitmap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{CoreError, Result};

/// Index of a single capability within a bitfield.
///
/// Indices are append-only: once assigned, a bit keeps its meaning forever.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionBit(pub u32);

impl PermissionBit {
    /// Create a bit from its index.
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// The raw index.
    pub const fn index(&self) -> u32 {
        self.0
    }
}

impl fmt::Debug for PermissionBit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PermissionBit({})", self.0)
    }
}

impl fmt::Display for PermissionBit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u32> for PermissionBit {
    fn from(index: u32) -> Self {
        Self(index)
    }
}

/// Outcome of checking one bit against an allow/deny pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BitStatus {
    /// The allow side has the bit and the deny side does not.
    Allow,
    /// The deny side has the bit (regardless of the allow side).
    Deny,
    /// Neither side expresses an opinion.
    Undefined,
}

impl BitStatus {
    /// Whether this status expresses an opinion.
    pub fn is_defined(&self) -> bool {
        !matches!(self, BitStatus::Undefined)
    }
}

/// Resolve one bit against an allow/deny pair.
///
/// Deny is checked first: a bit set on both sides is a deny.
pub fn status(allow: &Bitfield, deny: &Bitfield, bit: PermissionBit) -> BitStatus {
    if deny.is_set(bit) {
        BitStatus::Deny
    } else if allow.is_set(bit) {
        BitStatus::Allow
    } else {
        BitStatus::Undefined
    }
}

/// A set of permission bits.
#[derive(Clone, Default, PartialEq)]
pub struct Bitfield(RoaringBitmap);

/// Chunk base used by the decimal codec (largest power of ten below 2^32).
const DECIMAL_BASE: u64 = 1_000_000_000;

/// Highest bit index accepted by the decimal, byte and serde codecs.
pub const MAX_BIT_INDEX: u32 = 65_535;

/// Digits of the largest accepted value, `2^(MAX_BIT_INDEX + 1) - 1`.
pub const MAX_DECIMAL_DIGITS: usize = 19_729;

const MAX_LIMBS: usize = (MAX_BIT_INDEX as usize + 1) / 32;
const MAX_BYTES: usize = (MAX_BIT_INDEX as usize + 1) / 8;

/// 2^53. Parsed floats at or above this may already have been rounded.
const MAX_EXACT_FLOAT: f64 = 9_007_199_254_740_992.0;

fn out_of_range() -> CoreError {
    CoreError::InvalidBitfield(format!("value exceeds maximum bit index {MAX_BIT_INDEX}"))
}

impl Bitfield {
    /// The empty bitfield (numeric value zero).
    pub fn zero() -> Self {
        Self(RoaringBitmap::new())
    }

    /// Build a bitfield from individual bits.
    pub fn from_bits<I>(bits: I) -> Self
    where
        I: IntoIterator<Item = PermissionBit>,
    {
        Self(bits.into_iter().map(|b| b.0).collect())
    }

    /// Check whether a bit is present.
    pub fn is_set(&self, bit: PermissionBit) -> bool {
        self.0.contains(bit.0)
    }

    /// A copy of this bitfield with `bit` set.
    pub fn with_bit(&self, bit: PermissionBit) -> Self {
        let mut inner = self.0.clone();
        inner.insert(bit.0);
        Self(inner)
    }

    /// A copy of this bitfield with `bit` cleared.
    pub fn without_bit(&self, bit: PermissionBit) -> Self {
        let mut inner = self.0.clone();
        inner.remove(bit.0);
        Self(inner)
    }

    /// OR-fold any number of bitfields. The empty input yields zero.
    pub fn union_all<'a, I>(fields: I) -> Self
    where
        I: IntoIterator<Item = &'a Bitfield>,
    {
        fields.into_iter().fold(Self::zero(), |mut acc, bf| {
            acc.0 |= &bf.0;
            acc
        })
    }

    /// Bitwise OR.
    pub fn union(&self, other: &Bitfield) -> Self {
        Self(&self.0 | &other.0)
    }

    /// Bitwise AND.
    pub fn intersection(&self, other: &Bitfield) -> Self {
        Self(&self.0 & &other.0)
    }

    /// Bits in `self` that are not in `other`.
    pub fn difference(&self, other: &Bitfield) -> Self {
        Self(&self.0 - &other.0)
    }

    /// Whether every bit of `self` is also in `other`.
    pub fn is_subset(&self, other: &Bitfield) -> bool {
        self.0.is_subset(&other.0)
    }

    /// True when no bit is set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of bits set.
    pub fn len(&self) -> u64 {
        self.0.len()
    }

    /// Highest set bit, if any.
    pub fn highest_bit(&self) -> Option<PermissionBit> {
        self.0.max().map(PermissionBit)
    }

    /// Iterate set bits in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = PermissionBit> + '_ {
        self.0.iter().map(PermissionBit)
    }

    /// Parse a non-negative decimal integer of any width.
    pub fn from_decimal(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(CoreError::InvalidBitfield("empty value".into()));
        }
        if s.starts_with('-') {
            return Err(CoreError::InvalidBitfield(format!("negative value: {s}")));
        }
        if s.contains(['.', 'e', 'E']) {
            return Err(CoreError::InvalidBitfield(format!(
                "non-integral value: {s}"
            )));
        }
        let digits = s.strip_prefix('+').unwrap_or(s);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CoreError::InvalidBitfield(format!(
                "not a decimal integer: {s}"
            )));
        }
        let digits = digits.trim_start_matches('0');
        if digits.len() > MAX_DECIMAL_DIGITS {
            return Err(out_of_range());
        }

        // Little-endian base 2^32 limbs.
        let mut limbs: Vec<u32> = Vec::new();
        for digit in digits.bytes().map(|b| u64::from(b - b'0')) {
            let mut carry = digit;
            for limb in limbs.iter_mut() {
                let cur = u64::from(*limb) * 10 + carry;
                *limb = cur as u32;
                carry = cur >> 32;
            }
            if carry > 0 {
                limbs.push(carry as u32);
            }
        }
        Self::from_limbs(&limbs)
    }

    /// Render as a decimal integer.
    ///
    /// Cost grows with the square of the highest bit; values past
    /// [`MAX_BIT_INDEX`] are refused by `Serialize`.
    pub fn to_decimal(&self) -> String {
        let mut limbs = self.to_limbs();
        let mut chunks: Vec<u32> = Vec::new();
        while !limbs.is_empty() {
            let mut rem: u64 = 0;
            for limb in limbs.iter_mut().rev() {
                let cur = (rem << 32) | u64::from(*limb);
                *limb = (cur / DECIMAL_BASE) as u32;
                rem = cur % DECIMAL_BASE;
            }
            chunks.push(rem as u32);
            while limbs.last() == Some(&0) {
                limbs.pop();
            }
        }

        let Some(head) = chunks.pop() else {
            return "0".to_string();
        };
        let mut out = head.to_string();
        for chunk in chunks.iter().rev() {
            let _ = write!(out, "{chunk:09}");
        }
        out
    }

    /// Minimal big-endian byte encoding. Zero encodes as no bytes.
    pub fn to_bytes_be(&self) -> Vec<u8> {
        let mut bytes: Vec<u8> = Vec::new();
        for bit in self.0.iter() {
            let byte = (bit / 8) as usize;
            if bytes.len() <= byte {
                bytes.resize(byte + 1, 0);
            }
            bytes[byte] |= 1 << (bit % 8);
        }
        bytes.reverse();
        bytes
    }

    /// Decode a big-endian byte encoding. Leading zero bytes are accepted.
    pub fn from_bytes_be(bytes: &[u8]) -> Result<Self> {
        let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
        let bytes = &bytes[start..];
        if bytes.len() > MAX_BYTES {
            return Err(out_of_range());
        }

        let mut inner = RoaringBitmap::new();
        for (pos, byte) in (0u32..).zip(bytes.iter().rev()) {
            for j in 0..8u32 {
                if byte & (1 << j) != 0 {
                    inner.insert(pos * 8 + j);
                }
            }
        }
        Ok(Self(inner))
    }

    /// Hex of the big-endian encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes_be())
    }

    /// Parse the hex form produced by [`Bitfield::to_hex`].
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|e| CoreError::InvalidBitfield(e.to_string()))?;
        Self::from_bytes_be(&bytes)
    }

    fn to_limbs(&self) -> Vec<u32> {
        let mut limbs: Vec<u32> = Vec::new();
        for bit in self.0.iter() {
            let idx = (bit / 32) as usize;
            if limbs.len() <= idx {
                limbs.resize(idx + 1, 0);
            }
            limbs[idx] |= 1 << (bit % 32);
        }
        limbs
    }

    fn from_limbs(limbs: &[u32]) -> Result<Self> {
        if limbs.len() > MAX_LIMBS {
            return Err(out_of_range());
        }
        let mut inner = RoaringBitmap::new();
        for (i, limb) in (0u32..).zip(limbs) {
            if *limb == 0 {
                continue;
            }
            let base = i * 32;
            for j in 0..32u32 {
                if limb & (1 << j) != 0 {
                    inner.insert(base + j);
                }
            }
        }
        Ok(Self(inner))
    }
}

impl Eq for Bitfield {}

impl fmt::Debug for Bitfield {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Bitfield")
            .field(&self.0.iter().collect::<Vec<_>>())
            .finish()
    }
}

impl fmt::Display for Bitfield {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_decimal())
    }
}

impl FromStr for Bitfield {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_decimal(s)
    }
}

impl FromIterator<PermissionBit> for Bitfield {
    fn from_iter<I: IntoIterator<Item = PermissionBit>>(iter: I) -> Self {
        Self::from_bits(iter)
    }
}

impl From<u64> for Bitfield {
    fn from(value: u64) -> Self {
        Self((0..64u32).filter(|i| value & (1u64 << i) != 0).collect())
    }
}

impl From<u128> for Bitfield {
    fn from(value: u128) -> Self {
        Self((0..128u32).filter(|i| value & (1u128 << i) != 0).collect())
    }
}

impl TryFrom<i64> for Bitfield {
    type Error = CoreError;

    fn try_from(value: i64) -> Result<Self> {
        u64::try_from(value)
            .map(Self::from)
            .map_err(|_| CoreError::InvalidBitfield(format!("negative value: {value}")))
    }
}

impl TryFrom<i128> for Bitfield {
    type Error = CoreError;

    fn try_from(value: i128) -> Result<Self> {
        u128::try_from(value)
            .map(Self::from)
            .map_err(|_| CoreError::InvalidBitfield(format!("negative value: {value}")))
    }
}

impl TryFrom<f64> for Bitfield {
    type Error = CoreError;

    fn try_from(value: f64) -> Result<Self> {
        if !value.is_finite() {
            return Err(CoreError::InvalidBitfield(format!("non-finite value: {value}")));
        }
        if value < 0.0 {
            return Err(CoreError::InvalidBitfield(format!("negative value: {value}")));
        }
        if value.fract() != 0.0 {
            return Err(CoreError::InvalidBitfield(format!(
                "non-integral value: {value}"
            )));
        }
        if value >= MAX_EXACT_FLOAT {
            return Err(CoreError::InvalidBitfield(format!(
                "{value} is not exactly representable; use the decimal string form"
            )));
        }
        Ok(Self::from(value as u64))
    }
}

impl Serialize for Bitfield {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self.highest_bit() {
            Some(bit) if bit.0 > MAX_BIT_INDEX => Err(serde::ser::Error::custom(out_of_range())),
            _ => serializer.serialize_str(&self.to_decimal()),
        }
    }
}

impl<'de> Deserialize<'de> for Bitfield {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Unsigned(u64),
            Signed(i64),
            Float(f64),
        }

        let parsed = match Repr::deserialize(deserializer)? {
            Repr::Text(s) => Bitfield::from_decimal(&s),
            Repr::Unsigned(n) => Ok(Bitfield::from(n)),
            Repr::Signed(n) => Bitfield::try_from(n),
            Repr::Float(n) => Bitfield::try_from(n),
        };
        parsed.map_err(serde::de::Error::custom)
    }
}
