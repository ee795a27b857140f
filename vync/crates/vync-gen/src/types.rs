//! Type mapping from Vyn source types to LLVM IR types.
//!
//! | Source type | IR type |
//! |---|---|
//! | `Int`, `i64` | `i64` |
//! | `i32` / `i8` / `bool` | `i32` / `i8` / `i1` |
//! | `Float`, `f64` / `f32` | `double` / `float` |
//! | `String` | pointer to bytes |
//! | `Tuple(T1,..,Tn)` | anonymous `{T1,..,Tn}` |
//! | `Array(T, n)` | `[n x T]` |
//! | `Array(T, none)` | pointer |
//! | `fn(A,..) -> R` | function pointer |
//! | `my<T>` / `our<T>` / `their<T>` / `ptr<T>` | pointer |
//! | named struct/class | named IR struct from the user-type registry |
//! | `T?` (pointer inner) | nullable pointer |
//! | `T?` (value inner) | `{T, i1}` |
//!
//! A cache keyed by AST node identity prevents repeated construction:
//! lowering the same `TypeNode` twice returns the same IR type.

use std::cell::RefCell;

use indexmap::IndexMap;
use inkwell::context::Context;
use inkwell::types::{BasicType, BasicTypeEnum, StructType};
use inkwell::AddressSpace;

use vync_par::ast::{Expr, TypeKind, TypeNode};
use vync_util::FxHashMap;

/// A registered user-defined aggregate.
#[derive(Clone)]
pub struct UserType<'ctx> {
    /// The named IR struct.
    pub struct_type: StructType<'ctx>,
    /// Field name to index, in declared order.
    pub field_indices: IndexMap<String, u32>,
    /// Classes additionally carry an RTTI descriptor.
    pub is_class: bool,
}

/// Maps source-level [`TypeNode`]s to LLVM types.
pub struct TypeMapper<'ctx> {
    context: &'ctx Context,
    /// Cache keyed by `TypeNode` address; one compilation owns one AST, so
    /// node addresses are stable for the mapper's lifetime.
    cache: RefCell<FxHashMap<usize, BasicTypeEnum<'ctx>>>,
    user_types: RefCell<FxHashMap<String, UserType<'ctx>>>,
    /// `type Name = T` aliases, resolved at lookup time.
    aliases: RefCell<FxHashMap<String, TypeNode>>,
}

impl<'ctx> TypeMapper<'ctx> {
    /// Create a mapper over `context`.
    pub fn new(context: &'ctx Context) -> Self {
        Self {
            context,
            cache: RefCell::new(FxHashMap::default()),
            user_types: RefCell::new(FxHashMap::default()),
            aliases: RefCell::new(FxHashMap::default()),
        }
    }

    /// Record a `type Name = T` alias.
    pub fn register_alias(&self, name: &str, ty: TypeNode) {
        self.aliases.borrow_mut().insert(name.to_string(), ty);
    }

    /// Record a struct or class layout.
    pub fn register_user_type(
        &self,
        name: &str,
        struct_type: StructType<'ctx>,
        field_indices: IndexMap<String, u32>,
        is_class: bool,
    ) {
        self.user_types.borrow_mut().insert(
            name.to_string(),
            UserType {
                struct_type,
                field_indices,
                is_class,
            },
        );
    }

    /// Look up a registered struct or class.
    pub fn user_type(&self, name: &str) -> Option<UserType<'ctx>> {
        self.user_types.borrow().get(name).cloned()
    }

    /// Look up a registered aggregate by its IR struct name.
    pub fn user_type_of_struct(&self, struct_type: StructType<'ctx>) -> Option<UserType<'ctx>> {
        let name = struct_type.get_name()?.to_str().ok()?;
        self.user_type(name)
    }

    /// Lower a type node to an LLVM value type.
    ///
    /// Results are cached per node, so repeated lowering of the same node
    /// is both cheap and stable.
    pub fn map(&self, ty: &TypeNode) -> Result<BasicTypeEnum<'ctx>, String> {
        let key = ty as *const TypeNode as usize;
        if let Some(cached) = self.cache.borrow().get(&key) {
            return Ok(*cached);
        }

        let mapped = self.map_uncached(ty)?;
        self.cache.borrow_mut().insert(key, mapped);
        Ok(mapped)
    }

    fn map_uncached(&self, ty: &TypeNode) -> Result<BasicTypeEnum<'ctx>, String> {
        let ptr = self.context.ptr_type(AddressSpace::default());
        let base: BasicTypeEnum<'ctx> = match &ty.kind {
            TypeKind::Identifier { name, .. } => self.map_named(name)?,
            TypeKind::Tuple(elements) => {
                let mut fields = Vec::with_capacity(elements.len());
                for element in elements {
                    fields.push(self.map(element)?);
                }
                self.context.struct_type(&fields, false).into()
            },
            TypeKind::Array { element, size } => match size {
                Some(size) => {
                    let element_ty = self.map(element)?;
                    let n = const_array_size(size)
                        .ok_or_else(|| "array size must be a constant integer".to_string())?;
                    element_ty.array_type(n).into()
                },
                None => ptr.into(),
            },
            TypeKind::FunctionSignature { .. } => ptr.into(),
            TypeKind::OwnershipWrapped { .. } => ptr.into(),
        };

        let mut mapped = base;
        if ty.is_pointer {
            mapped = ptr.into();
        }
        if ty.is_optional {
            if mapped.is_pointer_type() {
                // A nullable pointer stays a pointer.
            } else {
                // Optional of a value type carries an explicit present flag.
                mapped = self
                    .context
                    .struct_type(&[mapped, self.context.bool_type().into()], false)
                    .into();
            }
        }
        Ok(mapped)
    }

    fn map_named(&self, name: &str) -> Result<BasicTypeEnum<'ctx>, String> {
        let mapped: BasicTypeEnum<'ctx> = match name {
            "Int" | "i64" | "u64" => self.context.i64_type().into(),
            "i32" | "u32" => self.context.i32_type().into(),
            "i8" | "u8" | "Char" | "char" => self.context.i8_type().into(),
            "bool" | "Bool" => self.context.bool_type().into(),
            "Float" | "f64" => self.context.f64_type().into(),
            "f32" => self.context.f32_type().into(),
            "String" | "str" => self.context.ptr_type(AddressSpace::default()).into(),
            "Void" | "void" => return Err("'Void' is not a value type".to_string()),
            other => {
                if let Some(user) = self.user_type(other) {
                    user.struct_type.into()
                } else {
                    let aliased = self.aliases.borrow().get(other).cloned();
                    match aliased {
                        Some(target) => self.map_uncached(&target)?,
                        None => return Err(format!("unknown type '{}'", other)),
                    }
                }
            },
        };
        Ok(mapped)
    }

    /// Element type a pointer-like type points at, used when loading
    /// through opaque pointers.
    pub fn pointee(&self, ty: &TypeNode) -> Option<BasicTypeEnum<'ctx>> {
        if ty.is_pointer {
            // Strip the pointer modifier and map the underlying data type.
            let mut inner = ty.clone();
            inner.is_pointer = false;
            return self.map_uncached(&inner).ok();
        }
        match &ty.kind {
            TypeKind::OwnershipWrapped { inner, .. } => self.map(inner).ok(),
            TypeKind::Array { element, size: None } => self.map(element).ok(),
            TypeKind::Identifier { name, .. } if name == "String" || name == "str" => {
                Some(self.context.i8_type().into())
            },
            _ => None,
        }
    }

    /// Whether a type lowers to void in return position.
    pub fn is_void(ty: Option<&TypeNode>) -> bool {
        match ty {
            None => true,
            Some(ty) => {
                matches!(&ty.kind, TypeKind::Identifier { name, .. }
                    if (name == "Void" || name == "void")
                        && !ty.is_pointer
                        && !ty.is_optional)
            },
        }
    }
}

/// Evaluate an array-size expression; only integer literals are constant
/// enough for a type.
fn const_array_size(size: &Expr) -> Option<u32> {
    match size {
        Expr::Int(lit) if lit.value >= 0 => u32::try_from(lit.value).ok(),
        _ => None,
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use vync_lex::tokenize;
    use vync_par::Parser;
    use vync_util::FileId;

    fn parse_type(source: &str) -> TypeNode {
        let tokens = tokenize(source, FileId::DUMMY).unwrap();
        Parser::new(tokens).parse_type().unwrap()
    }

    #[test]
    fn test_primitive_mapping() {
        let context = Context::create();
        let mapper = TypeMapper::new(&context);

        let ty = parse_type("Int");
        assert_eq!(mapper.map(&ty).unwrap(), context.i64_type().into());

        let ty = parse_type("Float");
        assert_eq!(mapper.map(&ty).unwrap(), context.f64_type().into());

        let ty = parse_type("bool");
        assert_eq!(mapper.map(&ty).unwrap(), context.bool_type().into());
    }

    #[test]
    fn test_cache_idempotence() {
        let context = Context::create();
        let mapper = TypeMapper::new(&context);
        let ty = parse_type("(Int, Float)");

        let first = mapper.map(&ty).unwrap();
        let second = mapper.map(&ty).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_sized_array() {
        let context = Context::create();
        let mapper = TypeMapper::new(&context);
        let ty = parse_type("[Int; 4]");
        let mapped = mapper.map(&ty).unwrap();
        assert!(mapped.is_array_type());
        assert_eq!(mapped.into_array_type().len(), 4);
    }

    #[test]
    fn test_unsized_array_is_pointer() {
        let context = Context::create();
        let mapper = TypeMapper::new(&context);
        let ty = parse_type("[Int]");
        assert!(mapper.map(&ty).unwrap().is_pointer_type());
    }

    #[test]
    fn test_ownership_wrappers_are_pointers() {
        let context = Context::create();
        let mapper = TypeMapper::new(&context);
        for source in ["my<Int>", "our<Int>", "their<Int>", "ptr<Int>"] {
            let ty = parse_type(source);
            assert!(mapper.map(&ty).unwrap().is_pointer_type(), "{}", source);
        }
    }

    #[test]
    fn test_tuple_is_anonymous_struct() {
        let context = Context::create();
        let mapper = TypeMapper::new(&context);
        let ty = parse_type("(Int, bool)");
        let mapped = mapper.map(&ty).unwrap();
        assert!(mapped.is_struct_type());
        assert_eq!(mapped.into_struct_type().count_fields(), 2);
    }

    #[test]
    fn test_optional_value_is_tagged_struct() {
        let context = Context::create();
        let mapper = TypeMapper::new(&context);
        let ty = parse_type("Int?");
        let mapped = mapper.map(&ty).unwrap();
        assert!(mapped.is_struct_type());
        let st = mapped.into_struct_type();
        assert_eq!(st.count_fields(), 2);
        assert_eq!(st.get_field_type_at_index(1), Some(context.bool_type().into()));
    }

    #[test]
    fn test_optional_pointer_stays_pointer() {
        let context = Context::create();
        let mapper = TypeMapper::new(&context);
        let ty = parse_type("Int*?");
        assert!(mapper.map(&ty).unwrap().is_pointer_type());
    }

    #[test]
    fn test_unknown_named_type() {
        let context = Context::create();
        let mapper = TypeMapper::new(&context);
        let ty = parse_type("Mystery");
        assert!(mapper.map(&ty).is_err());
    }

    #[test]
    fn test_user_type_registry() {
        let context = Context::create();
        let mapper = TypeMapper::new(&context);

        let st = context.opaque_struct_type("Point");
        st.set_body(
            &[context.f64_type().into(), context.f64_type().into()],
            false,
        );
        let mut fields = IndexMap::new();
        fields.insert("x".to_string(), 0u32);
        fields.insert("y".to_string(), 1u32);
        mapper.register_user_type("Point", st, fields, false);

        let ty = parse_type("Point");
        assert_eq!(mapper.map(&ty).unwrap(), st.into());
        assert_eq!(
            mapper.user_type("Point").unwrap().field_indices.get_index_of("y"),
            Some(1)
        );
    }

    #[test]
    fn test_alias_resolution() {
        let context = Context::create();
        let mapper = TypeMapper::new(&context);
        mapper.register_alias("Id", parse_type("Int"));
        let ty = parse_type("Id");
        assert_eq!(mapper.map(&ty).unwrap(), context.i64_type().into());
    }

    #[test]
    fn test_pointee_of_ptr_wrapper() {
        let context = Context::create();
        let mapper = TypeMapper::new(&context);
        let ty = parse_type("ptr<Float>");
        assert_eq!(mapper.pointee(&ty), Some(context.f64_type().into()));
    }

    #[test]
    fn test_is_void() {
        assert!(TypeMapper::is_void(None));
        let void = parse_type("Void");
        assert!(TypeMapper::is_void(Some(&void)));
        let int = parse_type("Int");
        assert!(!TypeMapper::is_void(Some(&int)));
    }
}
