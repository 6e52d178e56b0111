/*!
Literals are atoms paired with a (boolean) polarity.

The canonical representation is [CLiteral], which packs the pair into a single unsigned integer:
the atom shifted left by one, with the low bit holding the polarity.
This gives every literal a distinct [index](CLiteral::index), used throughout the library to key
per-literal structures such as watch lists.

# Examples

```rust
# use stoat_sat::structures::literal::CLiteral;
let literal = CLiteral::new(79, true);

assert!(literal.polarity());
assert_eq!(literal.atom(), 79);
assert_eq!(literal.negate().polarity(), false);
assert_eq!(-literal, literal.negate());
```
*/

use crate::structures::atom::Atom;

/// The canonical representation of a literal.
///
/// Encoded as `2·atom + polarity`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CLiteral(u32);

impl CLiteral {
    /// A fresh literal, specified by pairing an atom with a polarity.
    pub fn new(atom: Atom, polarity: bool) -> Self {
        CLiteral((atom << 1) | (polarity as u32))
    }

    /// The atom of the literal.
    pub fn atom(self) -> Atom {
        self.0 >> 1
    }

    /// The polarity of the literal.
    pub fn polarity(self) -> bool {
        self.0 & 1 == 1
    }

    /// The negation of the literal.
    pub fn negate(self) -> Self {
        CLiteral(self.0 ^ 1)
    }

    /// The literal as an index, distinct for each atom-polarity pair.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::ops::Neg for CLiteral {
    type Output = Self;

    fn neg(self) -> Self {
        self.negate()
    }
}

impl std::fmt::Display for CLiteral {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.polarity() {
            true => write!(f, "{}", self.atom()),
            false => write!(f, "-{}", self.atom()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding() {
        let literal = CLiteral::new(14, false);
        assert_eq!(literal.atom(), 14);
        assert!(!literal.polarity());
        assert_eq!(literal.index(), 28);
        assert_eq!(literal.negate().index(), 29);
        assert_eq!(literal.negate().negate(), literal);
    }

    #[test]
    fn ordering() {
        // False is (strictly) less than true, per the default ordering of booleans.
        assert!(CLiteral::new(3, false) < CLiteral::new(3, true));
        assert!(CLiteral::new(3, true) < CLiteral::new(4, false));
    }
}
