//! In-memory representation of a parsed Haris schema: structs, enums, their
//! fields, and the one-shot finalization pass that assigns offsets and sizes
//! (spec §3, §4.1).
//!
//! Structs may reference each other cyclically (directly, or through a
//! list-of-structs child), so the schema does not use owning handles between
//! structs. Every struct and enum lives in the schema's own `Vec` and is
//! referenced elsewhere by a stable index (`StructRef` / `EnumRef`), an
//! arena-and-index pattern rather than mutually-referencing pointers.

use crate::error::{HarisError, Result};

/// A stable reference to a struct within a `ParsedSchema`, equal to its
/// declaration position. Also the `schema_index` baked into reflective
/// tables once the schema is finalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StructRef(pub usize);

/// A stable reference to an enum within a `ParsedSchema`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnumRef(pub usize);

/// A scalar's type tag. `Enum` carries the referenced enum rather than a
/// separate nullable pointer, so the type itself is exhaustive over its
/// cases (spec §9, "sum types over tagged records").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Uint8,
    Int8,
    Uint16,
    Int16,
    Uint32,
    Int32,
    Uint64,
    Int64,
    Float32,
    Float64,
    Bool,
    Enum(EnumRef),
}

/// Fixed tie-break order for scalar layout, descending by size. This exact
/// ordering is part of the wire contract (spec §4.1) and must not change.
const SCALAR_RANK_ORDER: [ScalarRank; 12] = [
    ScalarRank::Uint64,
    ScalarRank::Int64,
    ScalarRank::Float64,
    ScalarRank::Uint32,
    ScalarRank::Int32,
    ScalarRank::Float32,
    ScalarRank::Uint16,
    ScalarRank::Int16,
    ScalarRank::Bool,
    ScalarRank::Enum,
    ScalarRank::Uint8,
    ScalarRank::Int8,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScalarRank {
    Uint64,
    Int64,
    Float64,
    Uint32,
    Int32,
    Float32,
    Uint16,
    Int16,
    Bool,
    Enum,
    Uint8,
    Int8,
}

impl ScalarType {
    fn rank(self) -> ScalarRank {
        match self {
            ScalarType::Uint8 => ScalarRank::Uint8,
            ScalarType::Int8 => ScalarRank::Int8,
            ScalarType::Uint16 => ScalarRank::Uint16,
            ScalarType::Int16 => ScalarRank::Int16,
            ScalarType::Uint32 => ScalarRank::Uint32,
            ScalarType::Int32 => ScalarRank::Int32,
            ScalarType::Uint64 => ScalarRank::Uint64,
            ScalarType::Int64 => ScalarRank::Int64,
            ScalarType::Float32 => ScalarRank::Float32,
            ScalarType::Float64 => ScalarRank::Float64,
            ScalarType::Bool => ScalarRank::Bool,
            ScalarType::Enum(_) => ScalarRank::Enum,
        }
    }

    fn rank_index(self) -> usize {
        SCALAR_RANK_ORDER
            .iter()
            .position(|r| *r == self.rank())
            .expect("every ScalarRank appears in SCALAR_RANK_ORDER")
    }

    /// Size in bytes of the encoded (and in-memory generated) representation.
    pub fn size_of(self) -> usize {
        match self {
            ScalarType::Uint8 | ScalarType::Int8 => 1,
            ScalarType::Uint16 | ScalarType::Int16 => 2,
            ScalarType::Uint32 | ScalarType::Int32 | ScalarType::Float32 => 4,
            ScalarType::Uint64 | ScalarType::Int64 | ScalarType::Float64 => 8,
            ScalarType::Bool | ScalarType::Enum(_) => 1,
        }
    }

    /// The exact generated-C type name for this scalar tag (spec §4.3 table).
    pub fn c_type_name(self) -> &'static str {
        match self {
            ScalarType::Uint8 => "haris_uint8_t",
            ScalarType::Int8 => "haris_int8_t",
            ScalarType::Uint16 => "haris_uint16_t",
            ScalarType::Int16 => "haris_int16_t",
            ScalarType::Uint32 => "haris_uint32_t",
            ScalarType::Int32 => "haris_int32_t",
            ScalarType::Uint64 => "haris_uint64_t",
            ScalarType::Int64 => "haris_int64_t",
            ScalarType::Float32 => "haris_float32",
            ScalarType::Float64 => "haris_float64",
            ScalarType::Bool => "unsigned char",
            ScalarType::Enum(_) => "haris_uint8_t",
        }
    }

    /// The `HarisScalarType` reflective tag name emitted for this scalar
    /// (enums collapse to the blank/absent marker in the reflective table,
    /// since `HarisScalar` only describes raw scalar storage).
    pub fn reflective_tag(self) -> &'static str {
        match self {
            ScalarType::Uint8 => "HARIS_SCALAR_UINT8",
            ScalarType::Int8 => "HARIS_SCALAR_INT8",
            ScalarType::Uint16 => "HARIS_SCALAR_UINT16",
            ScalarType::Int16 => "HARIS_SCALAR_INT16",
            ScalarType::Uint32 => "HARIS_SCALAR_UINT32",
            ScalarType::Int32 => "HARIS_SCALAR_INT32",
            ScalarType::Uint64 => "HARIS_SCALAR_UINT64",
            ScalarType::Int64 => "HARIS_SCALAR_INT64",
            ScalarType::Float32 => "HARIS_SCALAR_FLOAT32",
            ScalarType::Float64 => "HARIS_SCALAR_FLOAT64",
            ScalarType::Bool | ScalarType::Enum(_) => "HARIS_SCALAR_BLANK",
        }
    }
}

/// A fixed-width field in a struct's encoded body.
#[derive(Debug, Clone)]
pub struct ScalarField {
    pub name: String,
    pub ty: ScalarType,
    /// Byte offset within the struct's encoded body. Zero until
    /// `finalize_schema` runs.
    pub offset: usize,
}

/// The non-scalar tag and payload of a `ChildField`.
#[derive(Debug, Clone)]
pub enum ChildKind {
    Text,
    Struct(StructRef),
    ScalarList(ScalarType),
    StructList(StructRef),
}

/// A child field: text, a nested struct, or a list of either scalars or
/// structs.
#[derive(Debug, Clone)]
pub struct ChildField {
    pub name: String,
    pub nullable: bool,
    pub kind: ChildKind,
    /// True iff inlining the referenced struct's representation inside the
    /// parent is valid (non-recursive, itself finalizable to a bounded
    /// size). Only meaningful when `kind` is `ChildKind::Struct`; `false`
    /// for every other kind. Computed at finalization (spec §4.1 step 4).
    pub embeddable: bool,
}

/// Computed size information for a struct, filled in by `finalize_schema`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructMetadata {
    /// Sum of scalar sizes plus one presence byte per child.
    pub body_size: usize,
    /// Maximum encoded size in bytes, or 0 if unbounded (the struct
    /// transitively contains a list, or a recursive child).
    pub max_size: usize,
}

#[derive(Debug, Clone)]
pub struct ParsedStruct {
    pub name: String,
    pub schema_index: usize,
    pub scalars: Vec<ScalarField>,
    pub children: Vec<ChildField>,
    pub meta: StructMetadata,
}

impl ParsedStruct {
    /// Scalar fields in descending-size order with the fixed tie-break from
    /// spec §4.1, stable on declaration order within the same rank. This is
    /// the order both offsets are assigned in and the order generated
    /// struct layouts declare fields in.
    pub fn scalars_by_size(&self) -> Vec<&ScalarField> {
        let mut indexed: Vec<(usize, &ScalarField)> = self.scalars.iter().enumerate().collect();
        indexed.sort_by_key(|(i, f)| (f.ty.rank_index(), *i));
        indexed.into_iter().map(|(_, f)| f).collect()
    }
}

#[derive(Debug, Clone)]
pub struct ParsedEnum {
    pub name: String,
    pub values: Vec<String>,
}

/// The root container: an ordered sequence of structs and an ordered
/// sequence of enums. Order is significant — each struct's `schema_index`
/// equals its position, and reflective metadata is indexed by it.
#[derive(Debug, Clone, Default)]
pub struct ParsedSchema {
    pub structs: Vec<ParsedStruct>,
    pub enums: Vec<ParsedEnum>,
    finalized: bool,
}

fn try_push<T>(v: &mut Vec<T>, item: T, what: &'static str) -> Result<()> {
    v.try_reserve(1).map_err(|_| HarisError::Mem(what))?;
    v.push(item);
    Ok(())
}

impl ParsedSchema {
    pub fn new() -> Self {
        ParsedSchema::default()
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    fn ensure_mutable(&self) -> Result<()> {
        if self.finalized {
            Err(HarisError::Job(
                "schema has already been finalized; builder operations are a program error after finalize_schema".into(),
            ))
        } else {
            Ok(())
        }
    }

    /// True if a struct with this name already exists in the schema.
    /// Builder operations do not call this automatically; a caller (such as
    /// a parser) is expected to check before `new_struct`.
    pub fn struct_name_collides(&self, name: &str) -> bool {
        self.structs.iter().any(|s| s.name == name)
    }

    /// True if an enum with this name already exists in the schema.
    pub fn enum_name_collides(&self, name: &str) -> bool {
        self.enums.iter().any(|e| e.name == name)
    }

    pub fn new_struct(&mut self, name: impl Into<String>) -> Result<StructRef> {
        self.ensure_mutable()?;
        let idx = self.structs.len();
        try_push(
            &mut self.structs,
            ParsedStruct {
                name: name.into(),
                schema_index: idx,
                scalars: Vec::new(),
                children: Vec::new(),
                meta: StructMetadata::default(),
            },
            "struct",
        )?;
        Ok(StructRef(idx))
    }

    pub fn new_enum(&mut self, name: impl Into<String>) -> Result<EnumRef> {
        self.ensure_mutable()?;
        let idx = self.enums.len();
        try_push(
            &mut self.enums,
            ParsedEnum {
                name: name.into(),
                values: Vec::new(),
            },
            "enum",
        )?;
        Ok(EnumRef(idx))
    }

    fn strct_mut(&mut self, r: StructRef) -> &mut ParsedStruct {
        &mut self.structs[r.0]
    }

    pub fn add_scalar_field(
        &mut self,
        s: StructRef,
        name: impl Into<String>,
        ty: ScalarType,
    ) -> Result<()> {
        self.ensure_mutable()?;
        let field = ScalarField {
            name: name.into(),
            ty,
            offset: 0,
        };
        try_push(&mut self.strct_mut(s).scalars, field, "scalar field")
    }

    pub fn add_enum_field(&mut self, s: StructRef, name: impl Into<String>, e: EnumRef) -> Result<()> {
        self.add_scalar_field(s, name, ScalarType::Enum(e))
    }

    fn add_child(&mut self, s: StructRef, name: impl Into<String>, nullable: bool, kind: ChildKind) -> Result<()> {
        self.ensure_mutable()?;
        let field = ChildField {
            name: name.into(),
            nullable,
            kind,
            embeddable: false,
        };
        try_push(&mut self.strct_mut(s).children, field, "child field")
    }

    pub fn add_struct_field(
        &mut self,
        s: StructRef,
        name: impl Into<String>,
        nullable: bool,
        child: StructRef,
    ) -> Result<()> {
        self.add_child(s, name, nullable, ChildKind::Struct(child))
    }

    pub fn add_text_field(&mut self, s: StructRef, name: impl Into<String>, nullable: bool) -> Result<()> {
        self.add_child(s, name, nullable, ChildKind::Text)
    }

    pub fn add_list_of_scalars_field(
        &mut self,
        s: StructRef,
        name: impl Into<String>,
        nullable: bool,
        ty: ScalarType,
    ) -> Result<()> {
        self.add_child(s, name, nullable, ChildKind::ScalarList(ty))
    }

    pub fn add_list_of_enums_field(
        &mut self,
        s: StructRef,
        name: impl Into<String>,
        nullable: bool,
        e: EnumRef,
    ) -> Result<()> {
        self.add_list_of_scalars_field(s, name, nullable, ScalarType::Enum(e))
    }

    pub fn add_list_of_structs_field(
        &mut self,
        s: StructRef,
        name: impl Into<String>,
        nullable: bool,
        child: StructRef,
    ) -> Result<()> {
        self.add_child(s, name, nullable, ChildKind::StructList(child))
    }

    pub fn add_enumerated_value(&mut self, e: EnumRef, value: impl Into<String>) -> Result<()> {
        self.ensure_mutable()?;
        try_push(&mut self.enums[e.0].values, value.into(), "enum value")
    }

    /// The one-shot analysis pass: assigns `schema_index`, checks for cycles
    /// in non-nullable struct embedding, computes scalar offsets, body
    /// sizes, `embeddable`, and `max_size` (spec §4.1). Must be called
    /// exactly once; the schema is read-only afterward.
    pub fn finalize_schema(&mut self) -> Result<()> {
        if self.finalized {
            return Err(HarisError::Job("finalize_schema called twice".into()));
        }
        self.assign_indices();
        if let Some(idx) = self.find_non_nullable_cycle() {
            return Err(HarisError::Schema(format!(
                "struct {:?} has a cycle in non-nullable struct embedding; \
                 no instance of it can ever have a finite layout",
                self.structs[idx].name
            )));
        }
        self.compute_scalar_offsets_and_body_sizes();
        self.compute_embeddable_and_max_size();
        self.finalized = true;
        Ok(())
    }

    fn assign_indices(&mut self) {
        for (i, s) in self.structs.iter_mut().enumerate() {
            s.schema_index = i;
        }
    }

    /// Detects a cycle formed entirely of non-nullable struct-kind children
    /// (spec §7's SchemaError example, "cycle in non-nullable embedding").
    /// A cycle that passes through at least one nullable child is not an
    /// error: it can always be broken by nulling that child, so it only
    /// forces `max_size == 0` (unbounded), handled separately in
    /// `compute_embeddable_and_max_size`. Returns the index of a struct on
    /// the offending cycle, if any.
    fn find_non_nullable_cycle(&self) -> Option<usize> {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Mark {
            Unvisited,
            InProgress,
            Done,
        }

        fn visit(schema: &ParsedSchema, idx: usize, mark: &mut [Mark]) -> Option<usize> {
            mark[idx] = Mark::InProgress;
            for child in &schema.structs[idx].children {
                if child.nullable {
                    continue;
                }
                if let ChildKind::Struct(target) = child.kind {
                    match mark[target.0] {
                        Mark::InProgress => return Some(target.0),
                        Mark::Unvisited => {
                            if let Some(found) = visit(schema, target.0, mark) {
                                return Some(found);
                            }
                        }
                        Mark::Done => {}
                    }
                }
            }
            mark[idx] = Mark::Done;
            None
        }

        let mut mark = vec![Mark::Unvisited; self.structs.len()];
        for start in 0..self.structs.len() {
            if mark[start] == Mark::Unvisited {
                if let Some(found) = visit(self, start, &mut mark) {
                    return Some(found);
                }
            }
        }
        None
    }

    fn compute_scalar_offsets_and_body_sizes(&mut self) {
        for strct in self.structs.iter_mut() {
            let order: Vec<usize> = {
                let mut indexed: Vec<(usize, ScalarType)> =
                    strct.scalars.iter().enumerate().map(|(i, f)| (i, f.ty)).collect();
                indexed.sort_by_key(|(i, ty)| (ty.rank_index(), *i));
                indexed.into_iter().map(|(i, _)| i).collect()
            };
            let mut offset = 0usize;
            for idx in order {
                strct.scalars[idx].offset = offset;
                offset += strct.scalars[idx].ty.size_of();
            }
            strct.meta.body_size = offset + strct.children.len();
        }
    }

    fn compute_embeddable_and_max_size(&mut self) {
        let n = self.structs.len();
        let mut memo: Vec<Option<usize>> = vec![None; n];
        for i in 0..n {
            let mut stack = Vec::new();
            let max_size = self.struct_max_size(i, &mut stack, &mut memo);
            self.structs[i].meta.max_size = max_size;
        }

        for parent_idx in 0..n {
            let child_count = self.structs[parent_idx].children.len();
            for child_idx in 0..child_count {
                if let ChildKind::Struct(target) = self.structs[parent_idx].children[child_idx].kind {
                    let target_max = self.structs[target.0].meta.max_size;
                    let embeddable = target_max != 0
                        && !self.struct_contains(target.0, parent_idx, &mut Vec::new());
                    self.structs[parent_idx].children[child_idx].embeddable = embeddable;
                }
            }
        }
    }

    /// Maximum encoded size of struct `idx`, or 0 if unbounded. Memoized,
    /// with a visitation stack to detect cycles (a struct on its own
    /// ancestor chain is unbounded).
    fn struct_max_size(&self, idx: usize, stack: &mut Vec<usize>, memo: &mut Vec<Option<usize>>) -> usize {
        if let Some(v) = memo[idx] {
            return v;
        }
        if stack.contains(&idx) {
            return 0;
        }
        stack.push(idx);

        let strct = &self.structs[idx];
        let mut total = strct.meta.body_size;
        let mut unbounded = false;
        for child in &strct.children {
            match &child.kind {
                ChildKind::Text | ChildKind::ScalarList(_) | ChildKind::StructList(_) => {
                    unbounded = true;
                    break;
                }
                ChildKind::Struct(r) => {
                    let child_max = self.struct_max_size(r.0, stack, memo);
                    if child_max == 0 {
                        unbounded = true;
                        break;
                    }
                    total += child_max;
                }
            }
        }

        stack.pop();
        let result = if unbounded { 0 } else { total };
        memo[idx] = Some(result);
        result
    }

    /// True if struct `start` transitively contains struct `target` via a
    /// chain of struct-kind children (used only to decide embeddability; a
    /// struct-list child never counts, since it can never be embedded).
    fn struct_contains(&self, start: usize, target: usize, stack: &mut Vec<usize>) -> bool {
        if start == target {
            return true;
        }
        if stack.contains(&start) {
            return false;
        }
        stack.push(start);
        let found = self.structs[start].children.iter().any(|child| match child.kind {
            ChildKind::Struct(r) => self.struct_contains(r.0, target, stack),
            _ => false,
        });
        stack.pop();
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uint64() -> ScalarType {
        ScalarType::Uint64
    }

    #[test]
    fn scalar_ordering_scenario_a() {
        let mut schema = ParsedSchema::new();
        let foo = schema.new_struct("Foo").unwrap();
        schema.add_scalar_field(foo, "a", ScalarType::Uint8).unwrap();
        schema.add_scalar_field(foo, "b", uint64()).unwrap();
        schema.add_scalar_field(foo, "c", ScalarType::Uint16).unwrap();
        schema.add_scalar_field(foo, "d", ScalarType::Int8).unwrap();
        schema.finalize_schema().unwrap();

        let strct = &schema.structs[foo.0];
        let ordered = strct.scalars_by_size();
        let names: Vec<&str> = ordered.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["b", "c", "a", "d"]);

        let offset = |name: &str| strct.scalars.iter().find(|f| f.name == name).unwrap().offset;
        assert_eq!(offset("b"), 0);
        assert_eq!(offset("c"), 8);
        assert_eq!(offset("a"), 10);
        assert_eq!(offset("d"), 11);
        assert_eq!(strct.meta.body_size, 12);
    }

    #[test]
    fn body_size_counts_one_byte_per_child() {
        let mut schema = ParsedSchema::new();
        let a = schema.new_struct("A").unwrap();
        schema.add_scalar_field(a, "x", ScalarType::Uint32).unwrap();
        let b = schema.new_struct("B").unwrap();
        schema.add_struct_field(b, "a", false, a).unwrap();
        schema.finalize_schema().unwrap();

        assert_eq!(schema.structs[a.0].meta.body_size, 4);
        assert_eq!(schema.structs[b.0].meta.body_size, 1);
    }

    #[test]
    fn non_nullable_self_reference_is_rejected_as_schema_error() {
        let mut schema = ParsedSchema::new();
        let node = schema.new_struct("Node").unwrap();
        schema.add_struct_field(node, "next", false, node).unwrap();
        let err = schema.finalize_schema().unwrap_err();
        assert!(matches!(err, HarisError::Schema(_)));
    }

    #[test]
    fn non_nullable_mutual_cycle_is_rejected_as_schema_error() {
        let mut schema = ParsedSchema::new();
        let a = schema.new_struct("A").unwrap();
        let b = schema.new_struct("B").unwrap();
        schema.add_struct_field(a, "b", false, b).unwrap();
        schema.add_struct_field(b, "a", false, a).unwrap();
        let err = schema.finalize_schema().unwrap_err();
        assert!(matches!(err, HarisError::Schema(_)));
    }

    #[test]
    fn recursive_child_forces_unbounded_scenario_e() {
        let mut schema = ParsedSchema::new();
        let node = schema.new_struct("Node").unwrap();
        schema.add_struct_field(node, "next", true, node).unwrap();
        schema.finalize_schema().unwrap();

        assert_eq!(schema.structs[node.0].meta.max_size, 0);
        assert!(!schema.structs[node.0].children[0].embeddable);
    }

    #[test]
    fn non_recursive_struct_child_is_embeddable() {
        let mut schema = ParsedSchema::new();
        let a = schema.new_struct("A").unwrap();
        schema.add_scalar_field(a, "x", ScalarType::Uint32).unwrap();
        let b = schema.new_struct("B").unwrap();
        schema.add_struct_field(b, "a", false, a).unwrap();
        schema.finalize_schema().unwrap();

        assert!(schema.structs[b.0].children[0].embeddable);
        assert_eq!(schema.structs[a.0].meta.max_size, 4);
    }

    #[test]
    fn list_field_forces_unbounded() {
        let mut schema = ParsedSchema::new();
        let s = schema.new_struct("S").unwrap();
        schema
            .add_list_of_scalars_field(s, "items", false, ScalarType::Uint8)
            .unwrap();
        schema.finalize_schema().unwrap();
        assert_eq!(schema.structs[s.0].meta.max_size, 0);
    }

    #[test]
    fn builder_rejected_after_finalize() {
        let mut schema = ParsedSchema::new();
        let s = schema.new_struct("S").unwrap();
        schema.finalize_schema().unwrap();
        assert!(schema.add_scalar_field(s, "x", ScalarType::Uint8).is_err());
    }

    #[test]
    fn name_collision_predicates_do_not_auto_reject() {
        let mut schema = ParsedSchema::new();
        schema.new_struct("Dup").unwrap();
        assert!(schema.struct_name_collides("Dup"));
        // Builder itself does not check; a second struct of the same name
        // is allowed to be created, mirroring the C schema library.
        assert!(schema.new_struct("Dup").is_ok());
    }
}
