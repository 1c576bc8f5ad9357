// UA Wire for Rust
// SPDX-License-Identifier: MPL-2.0

//! The type registry: a strict single-writer-then-many-readers map from
//! type and encoding identifiers to descriptors.
//!
//! `TypeRegistryBuilder` is the single writer. `build` validates the whole
//! schema (base links, encoding id uniqueness, field references) and
//! flattens every base-type chain into a full ordered field list, base
//! fields first. The resulting `TypeRegistry` is immutable and safe to
//! share across threads without synchronization. A process-wide instance
//! can be installed exactly once via `set_global`.

use std::{collections::HashMap, sync::Arc};

use once_cell::sync::OnceCell;

use crate::{
    bitmask::EnumDescriptor,
    descriptor::{FieldDescriptor, FieldKind, TypeDescriptor},
    error::{CodecError, EncodingResult},
    node_id::NodeId,
    value::Structure,
};

static GLOBAL_REGISTRY: OnceCell<TypeRegistry> = OnceCell::new();

/// Accumulates descriptors before validation. Re-registering an identical
/// descriptor is a no-op; a conflicting one is a schema error.
#[derive(Debug, Default)]
pub struct TypeRegistryBuilder {
    types: HashMap<NodeId, Arc<TypeDescriptor>>,
    enums: HashMap<String, Arc<EnumDescriptor>>,
}

impl TypeRegistryBuilder {
    pub fn new() -> TypeRegistryBuilder {
        TypeRegistryBuilder::default()
    }

    pub fn register_type(&mut self, descriptor: TypeDescriptor) -> EncodingResult<&mut Self> {
        let type_id = descriptor.type_id.clone();
        if let Some(existing) = self.types.get(&type_id) {
            if **existing == descriptor {
                return Ok(self);
            }
            error!("Type {} registered twice with different descriptors", type_id);
            return Err(CodecError::DuplicateType(type_id));
        }
        self.types.insert(type_id, Arc::new(descriptor));
        Ok(self)
    }

    pub fn register_enum(&mut self, descriptor: EnumDescriptor) -> EncodingResult<&mut Self> {
        let name = descriptor.name.clone();
        if let Some(existing) = self.enums.get(&name) {
            if **existing == descriptor {
                return Ok(self);
            }
            error!("Enumeration {} registered twice with different members", name);
            return Err(CodecError::DuplicateEnum(name));
        }
        self.enums.insert(name, Arc::new(descriptor));
        Ok(self)
    }

    /// Validates the schema and freezes it. Any inconsistency aborts the
    /// build; a registry is never constructed half-valid.
    pub fn build(self) -> EncodingResult<TypeRegistry> {
        let mut by_binary = HashMap::new();
        let mut by_xml = HashMap::new();
        let mut flattened = HashMap::new();

        for (type_id, descriptor) in &self.types {
            if !descriptor.binary_encoding_id.is_null()
                && descriptor.binary_encoding_id == descriptor.xml_encoding_id
            {
                error!(
                    "Type {} uses {} as both its binary and xml encoding id",
                    type_id, descriptor.binary_encoding_id
                );
                return Err(CodecError::DuplicateEncodingId(
                    descriptor.binary_encoding_id.clone(),
                ));
            }
            for encoding_id in [&descriptor.binary_encoding_id, &descriptor.xml_encoding_id] {
                if encoding_id.is_null() {
                    continue;
                }
                if by_binary.contains_key(encoding_id) || by_xml.contains_key(encoding_id) {
                    error!("Encoding id {} is claimed twice", encoding_id);
                    return Err(CodecError::DuplicateEncodingId(encoding_id.clone()));
                }
            }
            if !descriptor.binary_encoding_id.is_null() {
                by_binary.insert(descriptor.binary_encoding_id.clone(), descriptor.clone());
            }
            if !descriptor.xml_encoding_id.is_null() {
                by_xml.insert(descriptor.xml_encoding_id.clone(), descriptor.clone());
            }
            let fields = self.flatten(descriptor)?;
            self.check_references(descriptor, &fields)?;
            // The presence mask is a single UInt32, one bit per optional
            // field across the whole flattened schema.
            let optional = fields.iter().filter(|f| f.optional).count();
            if optional > 32 {
                error!(
                    "Type {} has {} optional fields, more than the mask can carry",
                    type_id, optional
                );
                return Err(CodecError::TooManyOptionalFields {
                    type_id: type_id.clone(),
                    count: optional,
                });
            }
            flattened.insert(type_id.clone(), Arc::new(fields));
        }

        Ok(TypeRegistry {
            types: self.types,
            by_binary,
            by_xml,
            flattened,
            enums: self.enums,
        })
    }

    /// Produces the full field order for a type: the base chain's fields
    /// first, walked root-most first, then the type's own.
    fn flatten(&self, descriptor: &TypeDescriptor) -> EncodingResult<Vec<FieldDescriptor>> {
        let mut chain = vec![descriptor];
        let mut visited = vec![descriptor.type_id.clone()];
        let mut current = descriptor;
        while let Some(ref base_id) = current.base_type {
            if visited.contains(base_id) {
                error!("Base-type cycle detected at {}", descriptor.type_id);
                return Err(CodecError::CyclicBaseType(descriptor.type_id.clone()));
            }
            let base = self
                .types
                .get(base_id)
                .ok_or_else(|| CodecError::MissingBaseType {
                    derived: current.type_id.clone(),
                    base: base_id.clone(),
                })?;
            visited.push(base_id.clone());
            chain.push(base);
            current = base;
        }
        let mut fields = Vec::new();
        for descriptor in chain.iter().rev() {
            fields.extend(descriptor.fields.iter().cloned());
        }
        Ok(fields)
    }

    /// Every nested struct and enum a field names must itself be
    /// registered, so lookups can never fail mid-decode.
    fn check_references(
        &self,
        descriptor: &TypeDescriptor,
        fields: &[FieldDescriptor],
    ) -> EncodingResult<()> {
        for field in fields {
            match &field.kind {
                FieldKind::Struct(type_id) => {
                    if !self.types.contains_key(type_id) {
                        error!(
                            "Field {}.{} references unregistered type {}",
                            descriptor.name, field.name, type_id
                        );
                        return Err(CodecError::UnknownType(type_id.clone()));
                    }
                }
                FieldKind::EnumMask(name) => {
                    if !self.enums.contains_key(name) {
                        error!(
                            "Field {}.{} references unregistered enumeration {}",
                            descriptor.name, field.name, name
                        );
                        return Err(CodecError::UnknownEnum(name.clone()));
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// The immutable registry. All lookups are read-only; clone the `Arc`ed
/// descriptors freely.
#[derive(Debug)]
pub struct TypeRegistry {
    types: HashMap<NodeId, Arc<TypeDescriptor>>,
    by_binary: HashMap<NodeId, Arc<TypeDescriptor>>,
    by_xml: HashMap<NodeId, Arc<TypeDescriptor>>,
    flattened: HashMap<NodeId, Arc<Vec<FieldDescriptor>>>,
    enums: HashMap<String, Arc<EnumDescriptor>>,
}

impl TypeRegistry {
    /// Installs the process-wide registry. May be called exactly once.
    pub fn set_global(registry: TypeRegistry) -> EncodingResult<()> {
        GLOBAL_REGISTRY
            .set(registry)
            .map_err(|_| CodecError::RegistryAlreadyInstalled)
    }

    /// The process-wide registry, if one has been installed.
    pub fn global() -> Option<&'static TypeRegistry> {
        GLOBAL_REGISTRY.get()
    }

    pub fn lookup_by_type_id(&self, id: &NodeId) -> EncodingResult<&Arc<TypeDescriptor>> {
        self.types
            .get(id)
            .ok_or_else(|| CodecError::UnknownType(id.clone()))
    }

    pub fn lookup_by_binary_id(&self, id: &NodeId) -> EncodingResult<&Arc<TypeDescriptor>> {
        self.by_binary
            .get(id)
            .ok_or_else(|| CodecError::UnknownType(id.clone()))
    }

    pub fn lookup_by_xml_id(&self, id: &NodeId) -> EncodingResult<&Arc<TypeDescriptor>> {
        self.by_xml
            .get(id)
            .ok_or_else(|| CodecError::UnknownType(id.clone()))
    }

    /// Non-failing lookup for pass-through decoding of extension objects.
    pub fn try_lookup_by_binary_id(&self, id: &NodeId) -> Option<&Arc<TypeDescriptor>> {
        self.by_binary.get(id)
    }

    pub fn try_lookup_by_xml_id(&self, id: &NodeId) -> Option<&Arc<TypeDescriptor>> {
        self.by_xml.get(id)
    }

    /// The full ordered field list of a type, base fields first, as
    /// flattened at build time.
    pub fn resolve_field_order(&self, id: &NodeId) -> EncodingResult<&Arc<Vec<FieldDescriptor>>> {
        self.flattened
            .get(id)
            .ok_or_else(|| CodecError::UnknownType(id.clone()))
    }

    pub fn lookup_enum(&self, name: &str) -> EncodingResult<&Arc<EnumDescriptor>> {
        self.enums
            .get(name)
            .ok_or_else(|| CodecError::UnknownEnum(name.to_string()))
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Allocates a structure of the given type with every field set to its
    /// null/default value. Abstract types cannot be instantiated.
    pub fn new_structure(&self, id: &NodeId) -> EncodingResult<Structure> {
        let descriptor = self.lookup_by_type_id(id)?;
        if descriptor.is_abstract {
            return Err(CodecError::AbstractType(id.clone()));
        }
        let fields = self.resolve_field_order(id)?;
        Ok(Structure::with_default_fields(
            descriptor.clone(),
            fields.clone(),
        ))
    }
}
