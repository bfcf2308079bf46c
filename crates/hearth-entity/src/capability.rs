//! Capability characters and the bitmask set they parse into.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Single right that can be granted on an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// See the entity and its cached state.
    Read,
    /// Change the entity's state (and refresh it from its state command).
    Write,
    /// Execute auxiliary actions on the entity.
    Execute,
}

impl Capability {
    const fn bit(self) -> u8 {
        match self {
            Self::Read => 0b001,
            Self::Write => 0b010,
            Self::Execute => 0b100,
        }
    }

    /// Character used for this capability in permission strings.
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::Read => 'r',
            Self::Write => 'w',
            Self::Execute => 'x',
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.as_char())
    }
}

/// Permission string rejected because of a character outside `rwx`.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid capability character '{character}' in permission string '{value}'")]
pub struct InvalidCapability {
    /// Offending character.
    pub character: char,
    /// Full permission string as configured.
    pub value: String,
}

/// Set of capabilities granted to one identity for one entity.
///
/// Parsed once from the configured permission string; order-insensitive, so
/// `"rwx"` and `"rxw"` grant the same rights. The empty set denies every
/// capability, including read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CapabilitySet(u8);

impl CapabilitySet {
    /// The empty grant: every check fails.
    pub const EMPTY: Self = Self(0);

    /// All capabilities; the implicit grant for entities without a
    /// permission table.
    pub const ALL: Self = Self(0b111);

    /// Whether the set contains the requested capability.
    #[must_use]
    pub const fn contains(self, capability: Capability) -> bool {
        self.0 & capability.bit() != 0
    }

    /// Whether no capability is granted at all.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl FromStr for CapabilitySet {
    type Err = InvalidCapability;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let mut bits = 0;
        for character in value.chars() {
            bits |= match character {
                'r' => Capability::Read.bit(),
                'w' => Capability::Write.bit(),
                'x' => Capability::Execute.bit(),
                other => {
                    return Err(InvalidCapability {
                        character: other,
                        value: value.to_string(),
                    });
                }
            };
        }
        Ok(Self(bits))
    }
}

impl fmt::Display for CapabilitySet {
    /// Canonical `rwx`-ordered rendering, regardless of the configured order.
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        for capability in [Capability::Read, Capability::Write, Capability::Execute] {
            if self.contains(capability) {
                write!(formatter, "{}", capability.as_char())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_order_insensitive() {
        let rwx: CapabilitySet = "rwx".parse().unwrap();
        let rxw: CapabilitySet = "rxw".parse().unwrap();
        assert_eq!(rwx, rxw);
        assert_eq!(rwx, CapabilitySet::ALL);
    }

    #[test]
    fn empty_string_grants_nothing() {
        let set: CapabilitySet = "".parse().unwrap();
        assert!(set.is_empty());
        assert!(!set.contains(Capability::Read));
        assert!(!set.contains(Capability::Write));
        assert!(!set.contains(Capability::Execute));
    }

    #[test]
    fn partial_grants_check_by_membership() {
        let set: CapabilitySet = "rw".parse().unwrap();
        assert!(set.contains(Capability::Read));
        assert!(set.contains(Capability::Write));
        assert!(!set.contains(Capability::Execute));
    }

    #[test]
    fn unknown_characters_are_rejected() {
        let err = "rq".parse::<CapabilitySet>().unwrap_err();
        assert_eq!(err.character, 'q');
        assert_eq!(err.value, "rq");
    }

    #[test]
    fn display_uses_canonical_order() {
        let set: CapabilitySet = "xwr".parse().unwrap();
        assert_eq!(set.to_string(), "rwx");
        assert_eq!(CapabilitySet::EMPTY.to_string(), "");
    }

    #[test]
    fn duplicate_characters_are_harmless() {
        let set: CapabilitySet = "rrr".parse().unwrap();
        assert!(set.contains(Capability::Read));
        assert!(!set.contains(Capability::Write));
    }
}
