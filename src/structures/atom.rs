/*!
(The internal representation of) an atom (aka. a 'variable').

Broadly, atoms are things to which assigning a (boolean) value is of interest.

Atoms are represented as unsigned integers, forming a contiguous range from 0 to some limit.
This allows atoms to be used as the indices of a structure, e.g. `values[atom]`, without taking
too much space.

# Notes
- In the SAT literature these are often called 'variables', while in the logic literature these
  are often called 'atoms'.
*/

/// An atom, aka. a 'variable'.
pub type Atom = u32;

/// The maximum instance of an atom.
///
/// Bounded to allow a literal — an atom paired with a polarity bit — to fit a u32.
pub const ATOM_MAX: Atom = u32::MAX >> 1;
