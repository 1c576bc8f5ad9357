// UA Wire for Rust
// SPDX-License-Identifier: MPL-2.0

//! Flag enumerations packed into fixed-width unsigned integers.
//!
//! Packing is a bitwise OR of member values. Unpacking uses the
//! superset-membership rule: a member is present iff every bit of its value
//! is set in the mask, `(mask & value) == value`. A composite convenience
//! member whose value is the union of several simple members therefore
//! co-occurs with those members in a decoded set. That matches the source
//! protocol dictionaries and is kept deliberately; see DESIGN.md.

use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use crate::error::{CodecError, EncodingResult};

/// One member of a flag enumeration. Values are single bits or unions of
/// bits for composite convenience members.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct EnumMember {
    pub name: String,
    pub value: u32,
}

/// The schema of one flag enumeration: a name and its members.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct EnumDescriptor {
    pub name: String,
    pub members: Vec<EnumMember>,
}

impl EnumDescriptor {
    pub fn new(name: &str, members: &[(&str, u32)]) -> EnumDescriptor {
        EnumDescriptor {
            name: name.to_string(),
            members: members
                .iter()
                .map(|(name, value)| EnumMember {
                    name: name.to_string(),
                    value: *value,
                })
                .collect(),
        }
    }

    pub fn member(&self, name: &str) -> Option<&EnumMember> {
        self.members.iter().find(|m| m.name == name)
    }

    /// ORs the named members into a mask. Unknown names fail.
    pub fn pack<'a, I>(&self, names: I) -> EncodingResult<u32>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut mask = 0;
        for name in names {
            let member = self.member(name).ok_or_else(|| CodecError::UnknownEnumMember {
                enumeration: self.name.clone(),
                member: name.to_string(),
            })?;
            mask |= member.value;
        }
        Ok(mask)
    }

    /// The members present in a mask under the superset-membership rule.
    /// Bits matching no member are silently ignored; a mask of only such
    /// bits unpacks to the empty set.
    pub fn unpack(&self, mask: u32) -> Vec<&EnumMember> {
        self.members
            .iter()
            .filter(|m| m.value != 0 && mask & m.value == m.value)
            .collect()
    }
}

/// A decoded flag-enumeration value: the raw mask plus the descriptor that
/// gives its bits meaning. Equality and hashing use the enumeration name
/// and mask only.
#[derive(Debug, Clone)]
pub struct EnumSet {
    descriptor: Arc<EnumDescriptor>,
    mask: u32,
}

impl PartialEq for EnumSet {
    fn eq(&self, other: &Self) -> bool {
        self.descriptor.name == other.descriptor.name && self.mask == other.mask
    }
}

impl Eq for EnumSet {}

impl Hash for EnumSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.descriptor.name.hash(state);
        self.mask.hash(state);
    }
}

impl fmt::Display for EnumSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.members().iter().map(|m| m.name.as_str()).collect();
        write!(f, "{}[{}]", self.descriptor.name, names.join("|"))
    }
}

impl EnumSet {
    /// Wraps a raw mask. Bits the descriptor does not know about are kept
    /// so the value re-encodes unchanged.
    pub fn from_mask(descriptor: Arc<EnumDescriptor>, mask: u32) -> EnumSet {
        EnumSet { descriptor, mask }
    }

    /// Builds a set from member names.
    pub fn from_names<'a, I>(descriptor: Arc<EnumDescriptor>, names: I) -> EncodingResult<EnumSet>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mask = descriptor.pack(names)?;
        Ok(EnumSet { descriptor, mask })
    }

    pub fn descriptor(&self) -> &Arc<EnumDescriptor> {
        &self.descriptor
    }

    pub fn mask(&self) -> u32 {
        self.mask
    }

    /// The members present under the superset-membership rule.
    pub fn members(&self) -> Vec<&EnumMember> {
        self.descriptor.unpack(self.mask)
    }

    /// True iff every bit of the named member is set.
    pub fn contains(&self, name: &str) -> bool {
        self.descriptor
            .member(name)
            .map_or(false, |m| m.value != 0 && self.mask & m.value == m.value)
    }

    pub fn insert(&mut self, name: &str) -> EncodingResult<()> {
        self.mask |= self.descriptor.pack([name])?;
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> EncodingResult<()> {
        self.mask &= !self.descriptor.pack([name])?;
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.mask == 0
    }
}
