//! LLVM IR generation from the Vyn AST.
//!
//! The generator owns one LLVM context, module and builder per compilation
//! unit and lowers a parsed module in two passes: the first registers every
//! top-level aggregate layout and function signature, the second lowers
//! bodies, so declaration order never matters.
//!
//! L-value and r-value lowering are separate entry points: `lower_place`
//! produces an address plus the pointee type, `lower_expr` produces a
//! loaded value. Assignment targets, borrows and the address-taking
//! intrinsics go through `lower_place`.
//!
//! Failure semantics: structural problems are reported into the shared
//! diagnostic handler with their source location and the current value
//! becomes `None`, which callers propagate without emitting further
//! instructions. Lowering continues so one run surfaces as many errors as
//! possible.

use inkwell::basic_block::BasicBlock;
use inkwell::builder::{Builder, BuilderError};
use inkwell::context::Context;
use inkwell::module::{Linkage, Module};
use inkwell::types::{BasicType, BasicTypeEnum, FunctionType, StructType};
use inkwell::values::{
    BasicMetadataValueEnum, BasicValueEnum, FunctionValue, IntValue, PointerValue,
};
use inkwell::{AddressSpace, FloatPredicate, IntPredicate};

use std::cell::Cell;
use std::path::Path;

use vync_par::ast::{self, BinaryOp, Expr, Stmt, TypeKind, TypeNode, UnaryOp};
use vync_util::{FxHashMap, Handler, SourceLocation};

use crate::error::{CodeGenError, Result};
use crate::types::TypeMapper;

/// A named allocation site: a stack slot or a global.
#[derive(Clone)]
struct Binding<'ctx> {
    /// Address of the storage.
    ptr: PointerValue<'ctx>,
    /// Type of the stored value.
    ty: BasicTypeEnum<'ctx>,
    /// For pointer-typed bindings, the type behind the pointer.
    pointee: Option<BasicTypeEnum<'ctx>>,
    /// Declared source type, kept for indirect calls through
    /// function-typed bindings.
    decl_ty: Option<TypeNode>,
}

/// Branch targets of an active loop.
struct LoopContext<'ctx> {
    /// Where `continue` goes: the update block for `for`, the header for
    /// `while`.
    continue_target: BasicBlock<'ctx>,
    /// Where `break` goes.
    exit: BasicBlock<'ctx>,
}

/// AST to LLVM IR lowering for one compilation unit.
pub struct CodeGenerator<'a, 'ctx> {
    context: &'ctx Context,
    module: Module<'ctx>,
    builder: Builder<'ctx>,
    handler: &'a Handler,
    /// Source-to-IR type mapping with the user-type registry.
    pub types: TypeMapper<'ctx>,
    /// Per-function name map, swapped out on function entry.
    named_values: FxHashMap<String, Binding<'ctx>>,
    /// Module-level variables.
    globals: FxHashMap<String, Binding<'ctx>>,
    /// Innermost-last loop targets for `break`/`continue`.
    loop_stack: Vec<LoopContext<'ctx>>,
    current_fn: Option<FunctionValue<'ctx>>,
    /// Lazily created `{i32, ptr}` type descriptor.
    rtti_type: Cell<Option<StructType<'ctx>>>,
    next_type_id: Cell<u32>,
}

impl<'a, 'ctx> CodeGenerator<'a, 'ctx> {
    /// Create a generator emitting into a fresh module.
    pub fn new(context: &'ctx Context, module_name: &str, handler: &'a Handler) -> Self {
        Self {
            context,
            module: context.create_module(module_name),
            builder: context.create_builder(),
            handler,
            types: TypeMapper::new(context),
            named_values: FxHashMap::default(),
            globals: FxHashMap::default(),
            loop_stack: Vec::new(),
            current_fn: None,
            rtti_type: Cell::new(None),
            next_type_id: Cell::new(1),
        }
    }

    // =========================================================================
    // MODULE LOWERING - two passes over the top level
    // =========================================================================

    /// Lower a whole module.
    pub fn compile_module(&mut self, module: &ast::Module) {
        // Pass 1a: aggregate layouts and type aliases.
        for stmt in &module.body {
            if let Stmt::Decl(decl) = stmt {
                self.declare_types(decl);
            }
        }

        // Pass 1b: function signatures.
        for stmt in &module.body {
            if let Stmt::Decl(decl) = stmt {
                self.declare_functions(decl);
            }
        }

        // Pass 2: bodies, globals, and loose top-level statements.
        let mut loose: Vec<&Stmt> = Vec::new();
        for stmt in &module.body {
            match stmt {
                Stmt::Decl(decl) => self.define_decl(decl),
                other => loose.push(other),
            }
        }
        if !loose.is_empty() {
            self.define_module_init(&loose);
        }
    }

    fn declare_types(&mut self, decl: &ast::Decl) {
        match decl {
            ast::Decl::Struct(s) => self.declare_struct(s),
            ast::Decl::Class(c) => self.declare_class(c),
            ast::Decl::Enum(e) => self.declare_enum(e),
            ast::Decl::TypeAlias(a) => self.types.register_alias(&a.name.name, a.ty.clone()),
            _ => {},
        }
    }

    fn declare_functions(&mut self, decl: &ast::Decl) {
        match decl {
            ast::Decl::Function(f) => {
                self.declare_function(f, &f.name.name);
            },
            ast::Decl::Impl(i) => {
                if let Some(target) = type_name_of(&i.target) {
                    for method in &i.methods {
                        self.declare_function(method, &qualified_name(&target, &method.name.name));
                    }
                } else {
                    self.handler
                        .error("impl target must be a named type", i.loc);
                }
            },
            ast::Decl::Class(c) => {
                for member in &c.members {
                    if let ast::Decl::Function(method) = member {
                        self.declare_function(
                            method,
                            &qualified_name(&c.name.name, &method.name.name),
                        );
                    }
                }
            },
            _ => {},
        }
    }

    fn define_decl(&mut self, decl: &ast::Decl) {
        match decl {
            ast::Decl::Function(f) => self.define_function(f, &f.name.name),
            ast::Decl::Impl(i) => {
                if let Some(target) = type_name_of(&i.target) {
                    for method in &i.methods {
                        self.define_function(method, &qualified_name(&target, &method.name.name));
                    }
                }
            },
            ast::Decl::Class(c) => {
                for member in &c.members {
                    if let ast::Decl::Function(method) = member {
                        self.define_function(
                            method,
                            &qualified_name(&c.name.name, &method.name.name),
                        );
                    }
                }
            },
            ast::Decl::Variable(v) => self.define_global(v),
            // Imports resolve out of core; traits and templates have no
            // concrete lowering of their own.
            _ => {},
        }
    }

    /// Loose top-level statements run from a synthesized module
    /// initializer.
    fn define_module_init(&mut self, stmts: &[&Stmt]) {
        let fn_type = self.context.void_type().fn_type(&[], false);
        let function = self.module.add_function("__vyn_init", fn_type, None);
        let entry = self.context.append_basic_block(function, "entry");
        self.builder.position_at_end(entry);

        let saved = std::mem::take(&mut self.named_values);
        self.current_fn = Some(function);
        for stmt in stmts {
            if self.block_terminated() {
                break;
            }
            self.lower_stmt(stmt);
        }
        if !self.block_terminated() {
            let _ = self.builder.build_return(None);
        }
        self.named_values = saved;
        self.current_fn = None;

        if !function.verify(false) {
            self.handler.error(
                "function '__vyn_init' failed verification",
                SourceLocation::DUMMY,
            );
        }
    }

    // =========================================================================
    // AGGREGATES AND RTTI
    // =========================================================================

    fn declare_struct(&mut self, decl: &ast::StructDecl) {
        let fields: Vec<(&ast::FieldDecl, u32)> = decl.fields.iter().zip(0u32..).collect();
        self.register_aggregate(&decl.name.name, &fields, false);
    }

    fn declare_class(&mut self, decl: &ast::ClassDecl) {
        let fields: Vec<(&ast::FieldDecl, u32)> = decl
            .members
            .iter()
            .filter_map(|m| match m {
                ast::Decl::Field(f) => Some(f),
                _ => None,
            })
            .zip(0u32..)
            .collect();
        self.register_aggregate(&decl.name.name, &fields, true);
        self.emit_rtti_descriptor(&decl.name.name);
    }

    /// Enums lower to their discriminant; payload-carrying variants are not
    /// part of the lowering core.
    fn declare_enum(&mut self, decl: &ast::EnumDecl) {
        let tag = self.context.i32_type();
        let struct_type = self.context.opaque_struct_type(&decl.name.name);
        struct_type.set_body(&[tag.into()], false);
        let mut indices = indexmap::IndexMap::new();
        indices.insert("tag".to_string(), 0u32);
        self.types
            .register_user_type(&decl.name.name, struct_type, indices, false);
    }

    fn register_aggregate(&mut self, name: &str, fields: &[(&ast::FieldDecl, u32)], is_class: bool) {
        let struct_type = self.context.opaque_struct_type(name);
        let mut field_types = Vec::with_capacity(fields.len());
        let mut indices = indexmap::IndexMap::new();

        for (field, index) in fields {
            let ty = match &field.ty {
                Some(ty) => match self.types.map(ty) {
                    Ok(mapped) => mapped,
                    Err(message) => {
                        self.handler.error(message, ty.loc);
                        self.context.i64_type().into()
                    },
                },
                None => {
                    self.handler.error(
                        format!("field '{}' requires a type annotation", field.name.name),
                        field.loc,
                    );
                    self.context.i64_type().into()
                },
            };
            field_types.push(ty);
            indices.insert(field.name.name.clone(), *index);
        }

        struct_type.set_body(&field_types, false);
        self.types
            .register_user_type(name, struct_type, indices, is_class);
    }

    /// `{i32 type_id, i8* type_name}`, created on first use.
    fn rtti_descriptor_type(&self) -> StructType<'ctx> {
        if let Some(existing) = self.rtti_type.get() {
            return existing;
        }
        let descriptor = self.context.opaque_struct_type("vyn.typeinfo");
        descriptor.set_body(
            &[
                self.context.i32_type().into(),
                self.context.ptr_type(AddressSpace::default()).into(),
            ],
            false,
        );
        self.rtti_type.set(Some(descriptor));
        descriptor
    }

    /// A private constant `<Class>.typeinfo` descriptor for objects that
    /// carry RTTI.
    fn emit_rtti_descriptor(&mut self, class_name: &str) {
        let descriptor_ty = self.rtti_descriptor_type();

        let name_bytes = self.context.const_string(class_name.as_bytes(), true);
        let name_global = self.module.add_global(
            name_bytes.get_type(),
            None,
            &format!("{}.typename", class_name),
        );
        name_global.set_initializer(&name_bytes);
        name_global.set_linkage(Linkage::Private);
        name_global.set_constant(true);

        let id = self.next_type_id.get();
        self.next_type_id.set(id + 1);

        let init = descriptor_ty.const_named_struct(&[
            self.context.i32_type().const_int(id as u64, false).into(),
            name_global.as_pointer_value().into(),
        ]);
        let descriptor = self.module.add_global(
            descriptor_ty,
            None,
            &format!("{}.typeinfo", class_name),
        );
        descriptor.set_initializer(&init);
        descriptor.set_linkage(Linkage::Private);
        descriptor.set_constant(true);
    }

    // =========================================================================
    // FUNCTIONS
    // =========================================================================

    fn declare_function(
        &mut self,
        decl: &ast::FunctionDecl,
        llvm_name: &str,
    ) -> Option<FunctionValue<'ctx>> {
        if let Some(existing) = self.module.get_function(llvm_name) {
            return Some(existing);
        }

        let mut param_types = Vec::with_capacity(decl.params.len());
        for param in &decl.params {
            let ty = match self.types.map(&param.ty) {
                Ok(mapped) => mapped,
                Err(message) => {
                    self.handler.error(message, param.ty.loc);
                    self.context.i64_type().into()
                },
            };
            param_types.push(ty.into());
        }

        let fn_type = match &decl.ret_type {
            ret if TypeMapper::is_void(ret.as_ref()) => {
                self.context.void_type().fn_type(&param_types, false)
            },
            Some(ret) => match self.types.map(ret) {
                Ok(mapped) => mapped.fn_type(&param_types, false),
                Err(message) => {
                    self.handler.error(message, ret.loc);
                    self.context.i64_type().fn_type(&param_types, false)
                },
            },
            None => self.context.void_type().fn_type(&param_types, false),
        };

        let linkage = decl.is_extern.then_some(Linkage::External);
        Some(self.module.add_function(llvm_name, fn_type, linkage))
    }

    fn define_function(&mut self, decl: &ast::FunctionDecl, llvm_name: &str) {
        let Some(body) = &decl.body else {
            return; // extern/forward declaration
        };
        let Some(function) = self
            .module
            .get_function(llvm_name)
            .or_else(|| self.declare_function(decl, llvm_name))
        else {
            return;
        };

        let entry = self.context.append_basic_block(function, "entry");
        self.builder.position_at_end(entry);

        // Entering a function swaps the value map out and restores it on
        // exit; blocks do not introduce maps of their own.
        let saved_values = std::mem::take(&mut self.named_values);
        let saved_fn = self.current_fn.replace(function);

        for (index, param) in decl.params.iter().enumerate() {
            let Some(arg) = function.get_nth_param(index as u32) else {
                continue;
            };
            arg.set_name(&param.name.name);
            let ty = arg.get_type();
            let Some(slot) = self.entry_alloca(function, ty, &param.name.name, param.loc) else {
                continue;
            };
            if self.try_llvm(param.loc, self.builder.build_store(slot, arg)).is_none() {
                continue;
            }
            self.named_values.insert(
                param.name.name.clone(),
                Binding {
                    ptr: slot,
                    ty,
                    pointee: self.types.pointee(&param.ty),
                    decl_ty: Some(param.ty.clone()),
                },
            );
        }

        self.lower_block(body);

        if !self.block_terminated() {
            match function.get_type().get_return_type() {
                None => {
                    let _ = self.builder.build_return(None);
                },
                Some(ret_ty) => {
                    // Falling off the end of a value-returning function
                    // still needs a terminator for the IR to verify.
                    let zero = ret_ty.const_zero();
                    let _ = self.builder.build_return(Some(&zero));
                },
            }
        }

        self.named_values = saved_values;
        self.current_fn = saved_fn;

        if !function.verify(false) {
            self.handler.error(
                format!("function '{}' failed verification", llvm_name),
                decl.loc,
            );
        }
    }

    // =========================================================================
    // STATEMENTS
    // =========================================================================

    fn lower_block(&mut self, block: &ast::Block) {
        for stmt in &block.body {
            if self.block_terminated() {
                break; // unreachable code after return/break/continue
            }
            self.lower_stmt(stmt);
        }
    }

    fn lower_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expr(s) => {
                let _ = self.lower_expr(&s.expr);
            },
            Stmt::Block(b) => self.lower_block(b),
            Stmt::If(s) => self.lower_if(s),
            Stmt::While(s) => self.lower_while(s),
            Stmt::For(s) => self.lower_for(s),
            Stmt::Return(s) => self.lower_return(s),
            Stmt::Break(s) => match self.loop_stack.last() {
                Some(ctx) => {
                    let exit = ctx.exit;
                    let _ = self.builder.build_unconditional_branch(exit);
                },
                None => self.handler.error("'break' outside of a loop", s.loc),
            },
            Stmt::Continue(s) => match self.loop_stack.last() {
                Some(ctx) => {
                    let target = ctx.continue_target;
                    let _ = self.builder.build_unconditional_branch(target);
                },
                None => self.handler.error("'continue' outside of a loop", s.loc),
            },
            Stmt::Try(s) => self.lower_try(s),
            Stmt::Decl(ast::Decl::Variable(v)) => self.lower_local(v),
            Stmt::Decl(other) => {
                self.handler.error(
                    "declarations of this kind are only supported at module scope",
                    other.loc(),
                );
            },
        }
    }

    fn lower_local(&mut self, decl: &ast::VariableDecl) {
        let Some(function) = self.current_fn else {
            return;
        };
        let Some(name) = decl.pattern.as_identifier().map(str::to_string) else {
            self.handler.error(
                "destructuring declarations are not supported in code generation",
                decl.pattern.loc(),
            );
            return;
        };

        let declared = decl.ty.as_ref().and_then(|ty| match self.types.map(ty) {
            Ok(mapped) => Some(mapped),
            Err(message) => {
                self.handler.error(message, ty.loc);
                None
            },
        });

        let init = decl.init.as_ref().and_then(|init| {
            let value = self.lower_expr(init)?;
            match declared {
                Some(target) => self.cast_to(value, target, init.loc()),
                None => Some(value),
            }
        });

        let ty = match (declared, init) {
            (Some(ty), _) => ty,
            (None, Some(value)) => value.get_type(),
            (None, None) => {
                self.handler.error(
                    format!("cannot infer a type for '{}'", name),
                    decl.loc,
                );
                return;
            },
        };

        let Some(slot) = self.entry_alloca(function, ty, &name, decl.loc) else {
            return;
        };
        // Initializer, or a zero default when only a declared type exists.
        let stored = init.unwrap_or_else(|| ty.const_zero());
        let _ = self.try_llvm(decl.loc, self.builder.build_store(slot, stored));

        self.named_values.insert(
            name,
            Binding {
                ptr: slot,
                ty,
                pointee: decl.ty.as_ref().and_then(|t| self.types.pointee(t)),
                decl_ty: decl.ty.clone(),
            },
        );
    }

    fn lower_if(&mut self, stmt: &ast::IfStmt) {
        let Some(function) = self.current_fn else {
            return;
        };
        let Some(cond) = self.lower_expr(&stmt.cond) else {
            return;
        };
        let Some(cond) = self.to_bool(cond, stmt.cond.loc()) else {
            return;
        };

        let then_bb = self.context.append_basic_block(function, "then");
        let else_bb = stmt
            .else_branch
            .as_ref()
            .map(|_| self.context.append_basic_block(function, "else"));
        let merge_bb = self.context.append_basic_block(function, "ifcont");

        let _ = self.builder.build_conditional_branch(
            cond,
            then_bb,
            else_bb.unwrap_or(merge_bb),
        );

        self.builder.position_at_end(then_bb);
        self.lower_block(&stmt.then_branch);
        let then_terminated = self.block_terminated();
        if !then_terminated {
            let _ = self.builder.build_unconditional_branch(merge_bb);
        }

        let mut else_terminated = false;
        if let (Some(else_bb), Some(else_branch)) = (else_bb, &stmt.else_branch) {
            self.builder.position_at_end(else_bb);
            self.lower_stmt(else_branch);
            else_terminated = self.block_terminated();
            if !else_terminated {
                let _ = self.builder.build_unconditional_branch(merge_bb);
            }
        }

        if then_terminated && else_terminated && else_bb.is_some() {
            // Both arms leave the function; the merge block would be
            // unreachable, so it is elided.
            let _ = merge_bb.remove_from_function();
            self.builder.position_at_end(then_bb);
        } else {
            self.builder.position_at_end(merge_bb);
        }
    }

    fn lower_while(&mut self, stmt: &ast::WhileStmt) {
        let Some(function) = self.current_fn else {
            return;
        };
        let header = self.context.append_basic_block(function, "whilecond");
        let body_bb = self.context.append_basic_block(function, "whilebody");
        let exit = self.context.append_basic_block(function, "whileend");

        let _ = self.builder.build_unconditional_branch(header);
        self.builder.position_at_end(header);
        let Some(cond) = self
            .lower_expr(&stmt.cond)
            .and_then(|c| self.to_bool(c, stmt.cond.loc()))
        else {
            // Keep the header well-formed even when the condition failed.
            let _ = self.builder.build_unconditional_branch(exit);
            self.builder.position_at_end(exit);
            return;
        };
        let _ = self.builder.build_conditional_branch(cond, body_bb, exit);

        self.loop_stack.push(LoopContext {
            continue_target: header,
            exit,
        });
        self.builder.position_at_end(body_bb);
        self.lower_block(&stmt.body);
        if !self.block_terminated() {
            let _ = self.builder.build_unconditional_branch(header);
        }
        self.loop_stack.pop();

        self.builder.position_at_end(exit);
    }

    fn lower_for(&mut self, stmt: &ast::ForStmt) {
        let Some(function) = self.current_fn else {
            return;
        };

        if let Some(init) = &stmt.init {
            self.lower_stmt(init);
        }

        let header = self.context.append_basic_block(function, "forcond");
        let body_bb = self.context.append_basic_block(function, "forbody");
        let update_bb = self.context.append_basic_block(function, "forinc");
        let exit = self.context.append_basic_block(function, "forend");

        let _ = self.builder.build_unconditional_branch(header);
        self.builder.position_at_end(header);
        let cond = match &stmt.cond {
            Some(cond) => self
                .lower_expr(cond)
                .and_then(|c| self.to_bool(c, cond.loc())),
            None => Some(self.context.bool_type().const_int(1, false)),
        };
        let Some(cond) = cond else {
            let _ = self.builder.build_unconditional_branch(exit);
            self.builder.position_at_end(exit);
            return;
        };
        let _ = self.builder.build_conditional_branch(cond, body_bb, exit);

        self.loop_stack.push(LoopContext {
            continue_target: update_bb,
            exit,
        });
        self.builder.position_at_end(body_bb);
        self.lower_block(&stmt.body);
        if !self.block_terminated() {
            let _ = self.builder.build_unconditional_branch(update_bb);
        }
        self.loop_stack.pop();

        self.builder.position_at_end(update_bb);
        if let Some(update) = &stmt.update {
            let _ = self.lower_expr(update);
        }
        let _ = self.builder.build_unconditional_branch(header);

        self.builder.position_at_end(exit);
    }

    fn lower_return(&mut self, stmt: &ast::ReturnStmt) {
        let ret_ty = self
            .current_fn
            .and_then(|f| f.get_type().get_return_type());

        match (&stmt.value, ret_ty) {
            (Some(value), Some(target)) => {
                let Some(lowered) = self.lower_expr(value) else {
                    return;
                };
                let Some(casted) = self.cast_to(lowered, target, value.loc()) else {
                    return;
                };
                let _ = self.builder.build_return(Some(&casted));
            },
            (Some(value), None) => {
                // Value in a void function: evaluate for effects, drop it.
                let _ = self.lower_expr(value);
                let _ = self.builder.build_return(None);
            },
            (None, Some(target)) => {
                self.handler.error(
                    "'return' without a value in a function returning a value",
                    stmt.loc,
                );
                let zero = target.const_zero();
                let _ = self.builder.build_return(Some(&zero));
            },
            (None, None) => {
                let _ = self.builder.build_return(None);
            },
        }
    }

    /// Exceptions are not part of the lowering core: the try body runs,
    /// then the finally block, then control continues. Catch blocks are
    /// reported as unsupported.
    fn lower_try(&mut self, stmt: &ast::TryStmt) {
        if let Some(catch) = &stmt.catch {
            self.handler
                .error("catch blocks are not supported by code generation", catch.loc);
        }
        self.lower_block(&stmt.body);
        if let Some(finally) = &stmt.finally {
            if !self.block_terminated() {
                self.lower_block(finally);
            }
        }
    }

    // =========================================================================
    // GLOBALS
    // =========================================================================

    fn define_global(&mut self, decl: &ast::VariableDecl) {
        let Some(name) = decl.pattern.as_identifier().map(str::to_string) else {
            return; // the parser rejects non-identifier globals
        };

        let declared = decl.ty.as_ref().and_then(|ty| self.types.map(ty).ok());
        let init = match &decl.init {
            Some(expr) => match self.const_value(expr, declared) {
                Some(value) => Some(value),
                None => {
                    self.handler.error(
                        format!("global '{}' requires a constant initializer", name),
                        expr.loc(),
                    );
                    return;
                },
            },
            None => None,
        };

        let ty = match declared.or_else(|| init.map(|v| v.get_type())) {
            Some(ty) => ty,
            None => {
                self.handler.error(
                    format!("cannot infer a type for global '{}'", name),
                    decl.loc,
                );
                return;
            },
        };

        let global = self.module.add_global(ty, None, &name);
        global.set_initializer(&init.unwrap_or_else(|| ty.const_zero()));
        if decl.is_const {
            global.set_linkage(Linkage::Private);
            global.set_constant(true);
        }

        self.globals.insert(
            name,
            Binding {
                ptr: global.as_pointer_value(),
                ty,
                pointee: decl.ty.as_ref().and_then(|t| self.types.pointee(t)),
                decl_ty: decl.ty.clone(),
            },
        );
    }

    /// Constant-fold the initializers globals accept: literals only.
    fn const_value(
        &self,
        expr: &Expr,
        target: Option<BasicTypeEnum<'ctx>>,
    ) -> Option<BasicValueEnum<'ctx>> {
        let value: BasicValueEnum<'ctx> = match expr {
            Expr::Int(lit) => match target {
                Some(BasicTypeEnum::FloatType(ft)) => ft.const_float(lit.value as f64).into(),
                Some(BasicTypeEnum::IntType(it)) => it.const_int(lit.value as u64, true).into(),
                _ => self.context.i64_type().const_int(lit.value as u64, true).into(),
            },
            Expr::Float(lit) => self.context.f64_type().const_float(lit.value).into(),
            Expr::Bool(lit) => self
                .context
                .bool_type()
                .const_int(lit.value as u64, false)
                .into(),
            Expr::Char(lit) => self
                .context
                .i8_type()
                .const_int(lit.value as u64, false)
                .into(),
            Expr::Nil(_) => self
                .context
                .ptr_type(AddressSpace::default())
                .const_null()
                .into(),
            _ => return None,
        };
        Some(value)
    }

    // =========================================================================
    // EXPRESSIONS - r-values
    // =========================================================================

    /// Lower an expression to a value. `None` is the error sentinel: a
    /// diagnostic has been recorded and callers must not emit further
    /// instructions from this value.
    fn lower_expr(&mut self, expr: &Expr) -> Option<BasicValueEnum<'ctx>> {
        match expr {
            Expr::Int(lit) => Some(
                self.context
                    .i64_type()
                    .const_int(lit.value as u64, true)
                    .into(),
            ),
            Expr::Float(lit) => Some(self.context.f64_type().const_float(lit.value).into()),
            Expr::Bool(lit) => Some(
                self.context
                    .bool_type()
                    .const_int(lit.value as u64, false)
                    .into(),
            ),
            Expr::Char(lit) => Some(
                self.context
                    .i8_type()
                    .const_int(lit.value as u64, false)
                    .into(),
            ),
            Expr::Nil(_) => Some(
                self.context
                    .ptr_type(AddressSpace::default())
                    .const_null()
                    .into(),
            ),
            Expr::Str(lit) => {
                let global = self
                    .try_llvm(lit.loc, self.builder.build_global_string_ptr(&lit.value, ".str"))?;
                Some(global.as_pointer_value().into())
            },
            Expr::Array(lit) => self.lower_array_literal(lit),
            Expr::Object(lit) => self.lower_object_literal(lit),
            Expr::Ident(ident) => {
                if let Some(binding) = self.lookup(&ident.name) {
                    let loaded = self.try_llvm(
                        ident.loc,
                        self.builder.build_load(binding.ty, binding.ptr, &ident.name),
                    )?;
                    return Some(loaded);
                }
                if let Some(function) = self.module.get_function(&ident.name) {
                    return Some(function.as_global_value().as_pointer_value().into());
                }
                self.report(ident.loc, format!("undeclared identifier '{}'", ident.name))
            },
            Expr::Unary(unary) => self.lower_unary(unary),
            Expr::Binary(binary) => self.lower_binary(binary),
            Expr::Call(call) => self.lower_call(call),
            Expr::Member(_) | Expr::ArrayElement(_) => {
                let (ptr, pointee) = self.lower_place(expr)?;
                self.try_llvm(expr.loc(), self.builder.build_load(pointee, ptr, "loadtmp"))
            },
            Expr::Assign(assign) => {
                let (ptr, pointee) = self.lower_place(&assign.target)?;
                let value = self.lower_expr(&assign.value)?;
                let value = self.cast_to(value, pointee, assign.loc)?;
                self.try_llvm(assign.loc, self.builder.build_store(ptr, value))?;
                Some(value)
            },
            Expr::Borrow(borrow) => {
                // Both flavors produce the referent's address; the
                // exclusivity rules live in the semantic analyzer.
                let (ptr, _) = self.lower_place(&borrow.expr)?;
                Some(ptr.into())
            },
            Expr::AddrOf(addr) => {
                let (ptr, _) = self.lower_place(&addr.place)?;
                Some(ptr.into())
            },
            Expr::Location(location) => {
                // The raw location of an l-value; with opaque pointers the
                // generic location is the address itself.
                let (ptr, _) = self.lower_place(&location.place)?;
                Some(ptr.into())
            },
            Expr::FromIntToLoc(from) => {
                let value = self.lower_expr(&from.address)?;
                let BasicValueEnum::IntValue(int) = value else {
                    return self.report(from.loc, "from() expects an integer address");
                };
                let ptr_ty = self.context.ptr_type(AddressSpace::default());
                let ptr = self.try_llvm(
                    from.loc,
                    self.builder.build_int_to_ptr(int, ptr_ty, "inttoloc"),
                )?;
                Some(ptr.into())
            },
            Expr::PointerDeref(deref) => {
                let value = self.lower_expr(&deref.pointer)?;
                let BasicValueEnum::PointerValue(ptr) = value else {
                    return self.report(deref.loc, "at() expects a location value");
                };
                let pointee = self
                    .infer_pointee(&deref.pointer)
                    .unwrap_or_else(|| self.context.i64_type().into());
                self.try_llvm(deref.loc, self.builder.build_load(pointee, ptr, "deref"))
            },
            Expr::ListComprehension(comp) => self.report(
                comp.loc,
                "list comprehension lowering is not supported",
            ),
        }
    }

    fn lower_array_literal(&mut self, lit: &ast::ArrayLit) -> Option<BasicValueEnum<'ctx>> {
        let function = self.current_fn?;
        if lit.elements.is_empty() {
            return self.report(lit.loc, "cannot infer a type for an empty array literal");
        }

        let mut values = Vec::with_capacity(lit.elements.len());
        for element in &lit.elements {
            values.push(self.lower_expr(element)?);
        }
        let elem_ty = values[0].get_type();
        let array_ty = elem_ty.array_type(values.len() as u32);

        let slot = self.entry_alloca(function, array_ty.into(), "arraylit", lit.loc)?;
        let i64_ty = self.context.i64_type();
        for (index, value) in values.into_iter().enumerate() {
            let value = self.cast_to(value, elem_ty, lit.loc)?;
            let indices = [i64_ty.const_zero(), i64_ty.const_int(index as u64, false)];
            let gep = self.try_llvm(lit.loc, unsafe {
                self.builder.build_gep(array_ty, slot, &indices, "arrayinit")
            })?;
            self.try_llvm(lit.loc, self.builder.build_store(gep, value))?;
        }

        self.try_llvm(lit.loc, self.builder.build_load(array_ty, slot, "arrayval"))
    }

    fn lower_object_literal(&mut self, lit: &ast::ObjectLit) -> Option<BasicValueEnum<'ctx>> {
        let function = self.current_fn?;
        let mut values = Vec::with_capacity(lit.fields.len());
        for field in &lit.fields {
            values.push(self.lower_expr(&field.value)?);
        }
        let field_types: Vec<BasicTypeEnum> = values.iter().map(|v| v.get_type()).collect();
        let struct_ty = self.context.struct_type(&field_types, false);

        let slot = self.entry_alloca(function, struct_ty.into(), "objectlit", lit.loc)?;
        for (index, value) in values.into_iter().enumerate() {
            let gep = self.try_llvm(
                lit.loc,
                self.builder
                    .build_struct_gep(struct_ty, slot, index as u32, "objinit"),
            )?;
            self.try_llvm(lit.loc, self.builder.build_store(gep, value))?;
        }

        self.try_llvm(lit.loc, self.builder.build_load(struct_ty, slot, "objval"))
    }

    fn lower_unary(&mut self, unary: &ast::UnaryExpr) -> Option<BasicValueEnum<'ctx>> {
        let operand = self.lower_expr(&unary.operand)?;
        match unary.op {
            UnaryOp::Neg => match operand {
                BasicValueEnum::IntValue(v) => {
                    let r = self.try_llvm(unary.loc, self.builder.build_int_neg(v, "negtmp"))?;
                    Some(r.into())
                },
                BasicValueEnum::FloatValue(v) => {
                    let r = self.try_llvm(unary.loc, self.builder.build_float_neg(v, "fnegtmp"))?;
                    Some(r.into())
                },
                _ => self.report(unary.loc, "operand of '-' must be numeric"),
            },
            UnaryOp::Not => {
                let b = self.to_bool(operand, unary.loc)?;
                let r = self.try_llvm(unary.loc, self.builder.build_not(b, "nottmp"))?;
                Some(r.into())
            },
            UnaryOp::BitNot => match operand {
                BasicValueEnum::IntValue(v) => {
                    let r = self.try_llvm(unary.loc, self.builder.build_not(v, "bnottmp"))?;
                    Some(r.into())
                },
                _ => self.report(unary.loc, "operand of '~' must be an integer"),
            },
        }
    }

    // =========================================================================
    // EXPRESSIONS - binary operators
    // =========================================================================

    fn lower_binary(&mut self, binary: &ast::BinaryExpr) -> Option<BasicValueEnum<'ctx>> {
        if matches!(binary.op, BinaryOp::And | BinaryOp::Or) {
            return self.lower_short_circuit(binary);
        }

        let lhs = self.lower_expr(&binary.left)?;
        let rhs = self.lower_expr(&binary.right)?;
        let loc = binary.loc;

        match (lhs, rhs) {
            (BasicValueEnum::IntValue(l), BasicValueEnum::IntValue(r)) => {
                self.int_binary(binary.op, l, r, loc)
            },
            (BasicValueEnum::FloatValue(l), BasicValueEnum::FloatValue(r)) => {
                self.float_binary(binary.op, l, r, loc)
            },
            // Exactly one floating operand: convert the integer first.
            (BasicValueEnum::IntValue(l), BasicValueEnum::FloatValue(r)) => {
                let lf = self.try_llvm(
                    loc,
                    self.builder
                        .build_signed_int_to_float(l, r.get_type(), "sitofp"),
                )?;
                self.float_binary(binary.op, lf, r, loc)
            },
            (BasicValueEnum::FloatValue(l), BasicValueEnum::IntValue(r)) => {
                let rf = self.try_llvm(
                    loc,
                    self.builder
                        .build_signed_int_to_float(r, l.get_type(), "sitofp"),
                )?;
                self.float_binary(binary.op, l, rf, loc)
            },
            (BasicValueEnum::PointerValue(p), BasicValueEnum::IntValue(i))
                if binary.op == BinaryOp::Add || binary.op == BinaryOp::Sub =>
            {
                let offset = if binary.op == BinaryOp::Sub {
                    self.try_llvm(loc, self.builder.build_int_neg(i, "offneg"))?
                } else {
                    i
                };
                self.pointer_offset(p, offset, &binary.left, loc)
            },
            (BasicValueEnum::IntValue(i), BasicValueEnum::PointerValue(p))
                if binary.op == BinaryOp::Add =>
            {
                self.pointer_offset(p, i, &binary.right, loc)
            },
            (BasicValueEnum::PointerValue(l), BasicValueEnum::PointerValue(r)) => {
                self.pointer_binary(binary.op, l, r, &binary.left, loc)
            },
            _ => self.report(loc, "invalid operand types for binary operator"),
        }
    }

    fn int_binary(
        &mut self,
        op: BinaryOp,
        l: IntValue<'ctx>,
        r: IntValue<'ctx>,
        loc: SourceLocation,
    ) -> Option<BasicValueEnum<'ctx>> {
        // Reconcile widths before operating; i1 comparisons excepted below.
        let (l, r) = self.unify_int_widths(l, r, loc)?;
        let b = &self.builder;
        let value: BasicValueEnum = match op {
            BinaryOp::Add => self.try_llvm(loc, b.build_int_add(l, r, "addtmp"))?.into(),
            BinaryOp::Sub => self.try_llvm(loc, b.build_int_sub(l, r, "subtmp"))?.into(),
            BinaryOp::Mul => self.try_llvm(loc, b.build_int_mul(l, r, "multmp"))?.into(),
            BinaryOp::Div => self
                .try_llvm(loc, b.build_int_signed_div(l, r, "divtmp"))?
                .into(),
            BinaryOp::Rem => self
                .try_llvm(loc, b.build_int_signed_rem(l, r, "remtmp"))?
                .into(),
            BinaryOp::BitAnd => self.try_llvm(loc, b.build_and(l, r, "andtmp"))?.into(),
            BinaryOp::BitOr => self.try_llvm(loc, b.build_or(l, r, "ortmp"))?.into(),
            BinaryOp::BitXor => self.try_llvm(loc, b.build_xor(l, r, "xortmp"))?.into(),
            BinaryOp::Shl => self
                .try_llvm(loc, b.build_left_shift(l, r, "shltmp"))?
                .into(),
            BinaryOp::Shr => self
                .try_llvm(loc, b.build_right_shift(l, r, true, "shrtmp"))?
                .into(),
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt
            | BinaryOp::Ge => {
                let predicate = match op {
                    BinaryOp::Eq => IntPredicate::EQ,
                    BinaryOp::Ne => IntPredicate::NE,
                    BinaryOp::Lt => IntPredicate::SLT,
                    BinaryOp::Le => IntPredicate::SLE,
                    BinaryOp::Gt => IntPredicate::SGT,
                    _ => IntPredicate::SGE,
                };
                self.try_llvm(loc, b.build_int_compare(predicate, l, r, "cmptmp"))?
                    .into()
            },
            BinaryOp::And | BinaryOp::Or => unreachable!("short-circuit handled earlier"),
        };
        Some(value)
    }

    fn float_binary(
        &mut self,
        op: BinaryOp,
        l: inkwell::values::FloatValue<'ctx>,
        r: inkwell::values::FloatValue<'ctx>,
        loc: SourceLocation,
    ) -> Option<BasicValueEnum<'ctx>> {
        let b = &self.builder;
        let value: BasicValueEnum = match op {
            BinaryOp::Add => self.try_llvm(loc, b.build_float_add(l, r, "faddtmp"))?.into(),
            BinaryOp::Sub => self.try_llvm(loc, b.build_float_sub(l, r, "fsubtmp"))?.into(),
            BinaryOp::Mul => self.try_llvm(loc, b.build_float_mul(l, r, "fmultmp"))?.into(),
            BinaryOp::Div => self.try_llvm(loc, b.build_float_div(l, r, "fdivtmp"))?.into(),
            BinaryOp::Rem => self.try_llvm(loc, b.build_float_rem(l, r, "fremtmp"))?.into(),
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt
            | BinaryOp::Ge => {
                // Ordered comparisons: NaN compares false.
                let predicate = match op {
                    BinaryOp::Eq => FloatPredicate::OEQ,
                    BinaryOp::Ne => FloatPredicate::ONE,
                    BinaryOp::Lt => FloatPredicate::OLT,
                    BinaryOp::Le => FloatPredicate::OLE,
                    BinaryOp::Gt => FloatPredicate::OGT,
                    _ => FloatPredicate::OGE,
                };
                self.try_llvm(loc, b.build_float_compare(predicate, l, r, "fcmptmp"))?
                    .into()
            },
            _ => return self.report(loc, "invalid operator for floating-point operands"),
        };
        Some(value)
    }

    /// `ptr + int` / `ptr - int` shift the pointer by whole elements.
    fn pointer_offset(
        &mut self,
        ptr: PointerValue<'ctx>,
        offset: IntValue<'ctx>,
        pointer_expr: &Expr,
        loc: SourceLocation,
    ) -> Option<BasicValueEnum<'ctx>> {
        let element = self
            .infer_pointee(pointer_expr)
            .unwrap_or_else(|| self.context.i8_type().into());
        let gep = self.try_llvm(loc, unsafe {
            self.builder.build_gep(element, ptr, &[offset], "ptradd")
        })?;
        Some(gep.into())
    }

    fn pointer_binary(
        &mut self,
        op: BinaryOp,
        l: PointerValue<'ctx>,
        r: PointerValue<'ctx>,
        left_expr: &Expr,
        loc: SourceLocation,
    ) -> Option<BasicValueEnum<'ctx>> {
        let i64_ty = self.context.i64_type();
        let li = self.try_llvm(loc, self.builder.build_ptr_to_int(l, i64_ty, "ptrl"))?;
        let ri = self.try_llvm(loc, self.builder.build_ptr_to_int(r, i64_ty, "ptrr"))?;

        match op {
            BinaryOp::Sub => {
                // Element-count difference: byte difference over element
                // size.
                let diff = self.try_llvm(loc, self.builder.build_int_sub(li, ri, "ptrdiff"))?;
                let element = self
                    .infer_pointee(left_expr)
                    .unwrap_or_else(|| self.context.i8_type().into());
                let size = element
                    .size_of()
                    .unwrap_or_else(|| i64_ty.const_int(1, false));
                let scaled = self.try_llvm(
                    loc,
                    self.builder.build_int_signed_div(diff, size, "ptrdiffelems"),
                )?;
                Some(scaled.into())
            },
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt
            | BinaryOp::Ge => self.int_binary(op, li, ri, loc),
            _ => self.report(loc, "invalid operator for pointer operands"),
        }
    }

    /// `&&` / `||` lower to two basic blocks and a phi merge; the right
    /// operand only evaluates when it can still affect the result.
    fn lower_short_circuit(&mut self, binary: &ast::BinaryExpr) -> Option<BasicValueEnum<'ctx>> {
        let function = self.current_fn?;
        let is_and = binary.op == BinaryOp::And;
        let loc = binary.loc;

        let lhs = self.lower_expr(&binary.left)?;
        let lhs = self.to_bool(lhs, binary.left.loc())?;
        let lhs_block = self.builder.get_insert_block()?;

        let rhs_block = self
            .context
            .append_basic_block(function, if is_and { "andrhs" } else { "orrhs" });
        let merge_block = self
            .context
            .append_basic_block(function, if is_and { "andmerge" } else { "ormerge" });

        if is_and {
            let _ = self
                .builder
                .build_conditional_branch(lhs, rhs_block, merge_block);
        } else {
            let _ = self
                .builder
                .build_conditional_branch(lhs, merge_block, rhs_block);
        }

        self.builder.position_at_end(rhs_block);
        let rhs = self.lower_expr(&binary.right)?;
        let rhs = self.to_bool(rhs, binary.right.loc())?;
        let rhs_end = self.builder.get_insert_block()?;
        let _ = self.builder.build_unconditional_branch(merge_block);

        self.builder.position_at_end(merge_block);
        let phi = self.try_llvm(
            loc,
            self.builder.build_phi(self.context.bool_type(), "sctmp"),
        )?;
        let short_value = self
            .context
            .bool_type()
            .const_int(if is_and { 0 } else { 1 }, false);
        phi.add_incoming(&[(&short_value, lhs_block), (&rhs, rhs_end)]);
        Some(phi.as_basic_value())
    }

    // =========================================================================
    // EXPRESSIONS - calls
    // =========================================================================

    fn lower_call(&mut self, call: &ast::CallExpr) -> Option<BasicValueEnum<'ctx>> {
        // Direct call to a known function.
        if let Expr::Ident(ident) = call.callee.as_ref() {
            if let Some(function) = self.module.get_function(&ident.name) {
                return self.emit_call(function, call);
            }
            // Indirect call through a function-typed binding.
            if let Some(binding) = self.lookup(&ident.name) {
                if let Some(fn_type) = binding
                    .decl_ty
                    .as_ref()
                    .and_then(|ty| self.signature_fn_type(ty))
                {
                    let callee = self.try_llvm(
                        call.loc,
                        self.builder.build_load(binding.ty, binding.ptr, "fnload"),
                    )?;
                    let BasicValueEnum::PointerValue(fn_ptr) = callee else {
                        return self.report(call.loc, "callee is not a function");
                    };
                    let args = self.lower_args(call, fn_type.get_param_types().len())?;
                    let site = self.try_llvm(
                        call.loc,
                        self.builder
                            .build_indirect_call(fn_type, fn_ptr, &args, "calltmp"),
                    )?;
                    return site.try_as_basic_value().left();
                }
            }
            return self.report(
                call.loc,
                format!("call to undeclared function '{}'", ident.name),
            );
        }

        self.report(call.loc, "callee is not a function")
    }

    fn emit_call(
        &mut self,
        function: FunctionValue<'ctx>,
        call: &ast::CallExpr,
    ) -> Option<BasicValueEnum<'ctx>> {
        let fn_type = function.get_type();
        let expected = function.count_params() as usize;
        if call.args.len() != expected && !fn_type.is_var_arg() {
            return self.report(
                call.loc,
                format!(
                    "function expects {} argument(s), got {}",
                    expected,
                    call.args.len()
                ),
            );
        }

        let param_types = fn_type.get_param_types();
        let mut args: Vec<BasicMetadataValueEnum> = Vec::with_capacity(call.args.len());
        for (index, arg) in call.args.iter().enumerate() {
            let mut value = self.lower_expr(arg)?;
            if let Some(param_ty) = param_types.get(index) {
                if let Ok(target) = BasicTypeEnum::try_from(*param_ty) {
                    value = self.cast_to(value, target, arg.loc())?;
                }
            }
            args.push(value.into());
        }

        let site = self.try_llvm(
            call.loc,
            self.builder.build_call(function, &args, "calltmp"),
        )?;
        site.try_as_basic_value().left()
    }

    fn lower_args(
        &mut self,
        call: &ast::CallExpr,
        expected: usize,
    ) -> Option<Vec<BasicMetadataValueEnum<'ctx>>> {
        if call.args.len() != expected {
            return self.report(
                call.loc,
                format!(
                    "function expects {} argument(s), got {}",
                    expected,
                    call.args.len()
                ),
            );
        }
        let mut args = Vec::with_capacity(call.args.len());
        for arg in &call.args {
            args.push(self.lower_expr(arg)?.into());
        }
        Some(args)
    }

    /// Build an LLVM function type from a source `fn(..) -> R` node.
    fn signature_fn_type(&self, ty: &TypeNode) -> Option<FunctionType<'ctx>> {
        let TypeKind::FunctionSignature { params, ret } = &ty.kind else {
            return None;
        };
        let mut param_types = Vec::with_capacity(params.len());
        for param in params {
            param_types.push(self.types.map(param).ok()?.into());
        }
        if TypeMapper::is_void(Some(ret)) {
            Some(self.context.void_type().fn_type(&param_types, false))
        } else {
            Some(self.types.map(ret).ok()?.fn_type(&param_types, false))
        }
    }

    // =========================================================================
    // PLACES - l-values
    // =========================================================================

    /// Lower an expression in l-value context: produce the address and the
    /// type of the value stored there.
    fn lower_place(&mut self, expr: &Expr) -> Option<(PointerValue<'ctx>, BasicTypeEnum<'ctx>)> {
        match expr {
            Expr::Ident(ident) => match self.lookup(&ident.name) {
                Some(binding) => Some((binding.ptr, binding.ty)),
                None => self.report(
                    ident.loc,
                    format!("'{}' is not an addressable variable", ident.name),
                ),
            },
            Expr::Member(member) => self.lower_member_place(member),
            Expr::ArrayElement(element) => {
                self.lower_index_place(&element.object, &element.index, element.loc)
            },
            Expr::Borrow(borrow) => self.lower_place(&borrow.expr),
            Expr::PointerDeref(deref) => {
                let value = self.lower_expr(&deref.pointer)?;
                let BasicValueEnum::PointerValue(ptr) = value else {
                    return self.report(deref.loc, "at() expects a location value");
                };
                let pointee = self
                    .infer_pointee(&deref.pointer)
                    .unwrap_or_else(|| self.context.i64_type().into());
                Some((ptr, pointee))
            },
            _ => self.report(expr.loc(), "expression is not addressable"),
        }
    }

    /// Field access emits `StructGEP` by the registry's field index.
    fn lower_member_place(
        &mut self,
        member: &ast::MemberExpr,
    ) -> Option<(PointerValue<'ctx>, BasicTypeEnum<'ctx>)> {
        if member.computed {
            return self.lower_index_place(&member.object, &member.property, member.loc);
        }

        let (base_ptr, base_ty) = self.resolve_aggregate_base(&member.object)?;
        let BasicTypeEnum::StructType(struct_ty) = base_ty else {
            return self.report(member.loc, "member access on a non-struct value");
        };
        let Some(user) = self.types.user_type_of_struct(struct_ty) else {
            return self.report(member.loc, "member access on an unregistered struct type");
        };

        let Expr::Ident(property) = member.property.as_ref() else {
            return self.report(member.loc, "expected a field name");
        };
        let Some(&index) = user.field_indices.get(&property.name) else {
            return self.report(
                property.loc,
                format!("no field '{}' on this type", property.name),
            );
        };

        let field_ptr = self.try_llvm(
            member.loc,
            self.builder
                .build_struct_gep(struct_ty, base_ptr, index, "fieldptr"),
        )?;
        let field_ty = struct_ty.get_field_type_at_index(index)?;
        Some((field_ptr, field_ty))
    }

    /// The addressable aggregate behind a member expression: either the
    /// place itself, or - for pointer-typed bindings such as `my<T>` - one
    /// load away.
    fn resolve_aggregate_base(
        &mut self,
        object: &Expr,
    ) -> Option<(PointerValue<'ctx>, BasicTypeEnum<'ctx>)> {
        let (ptr, ty) = self.lower_place(object)?;
        if ty.is_pointer_type() {
            if let Some(pointee) = self.infer_pointee(object) {
                let loaded = self.try_llvm(
                    object.loc(),
                    self.builder.build_load(ty, ptr, "autoderef"),
                )?;
                let BasicValueEnum::PointerValue(inner) = loaded else {
                    return self.report(object.loc(), "member access on a non-struct value");
                };
                return Some((inner, pointee));
            }
        }
        Some((ptr, ty))
    }

    /// Array-element access: `GEP` zero-then-index for array values, a
    /// single index when the base is already a pointer.
    fn lower_index_place(
        &mut self,
        object: &Expr,
        index: &Expr,
        loc: SourceLocation,
    ) -> Option<(PointerValue<'ctx>, BasicTypeEnum<'ctx>)> {
        let index_value = self.lower_expr(index)?;
        let BasicValueEnum::IntValue(index_value) = index_value else {
            return self.report(index.loc(), "array index must be an integer");
        };

        let (obj_ptr, obj_ty) = self.lower_place(object)?;
        match obj_ty {
            BasicTypeEnum::ArrayType(array_ty) => {
                let zero = self.context.i64_type().const_zero();
                let gep = self.try_llvm(loc, unsafe {
                    self.builder
                        .build_gep(array_ty, obj_ptr, &[zero, index_value], "arrayelemptr")
                })?;
                Some((gep, array_ty.get_element_type()))
            },
            BasicTypeEnum::PointerType(_) => {
                let loaded = self.try_llvm(
                    loc,
                    self.builder.build_load(obj_ty, obj_ptr, "ptrload"),
                )?;
                let BasicValueEnum::PointerValue(base) = loaded else {
                    return self.report(loc, "array access on a non-array value");
                };
                let element = self
                    .infer_pointee(object)
                    .unwrap_or_else(|| self.context.i64_type().into());
                let gep = self.try_llvm(loc, unsafe {
                    self.builder
                        .build_gep(element, base, &[index_value], "ptrelemptr")
                })?;
                Some((gep, element))
            },
            _ => self.report(loc, "array access on a non-array value"),
        }
    }

    // =========================================================================
    // HELPERS
    // =========================================================================

    fn lookup(&self, name: &str) -> Option<Binding<'ctx>> {
        self.named_values
            .get(name)
            .or_else(|| self.globals.get(name))
            .cloned()
    }

    /// Best-effort pointee type of a pointer-valued expression, from the
    /// declared type of the underlying binding.
    fn infer_pointee(&self, expr: &Expr) -> Option<BasicTypeEnum<'ctx>> {
        match expr {
            Expr::Ident(ident) => self.lookup(&ident.name)?.pointee,
            Expr::Borrow(borrow) => self.infer_pointee(&borrow.expr),
            _ => None,
        }
    }

    /// Convert any value to `i1` for branching.
    fn to_bool(&mut self, value: BasicValueEnum<'ctx>, loc: SourceLocation) -> Option<IntValue<'ctx>> {
        match value {
            BasicValueEnum::IntValue(int) => {
                if int.get_type().get_bit_width() == 1 {
                    return Some(int);
                }
                let zero = int.get_type().const_zero();
                self.try_llvm(
                    loc,
                    self.builder
                        .build_int_compare(IntPredicate::NE, int, zero, "tobool"),
                )
            },
            BasicValueEnum::FloatValue(float) => {
                let zero = float.get_type().const_zero();
                self.try_llvm(
                    loc,
                    self.builder
                        .build_float_compare(FloatPredicate::ONE, float, zero, "tobool"),
                )
            },
            BasicValueEnum::PointerValue(ptr) => {
                self.try_llvm(loc, self.builder.build_is_not_null(ptr, "tobool"))
            },
            _ => self.report(loc, "value cannot be used as a condition"),
        }
    }

    /// Insert an implicit conversion between `value` and `target`.
    fn cast_to(
        &mut self,
        value: BasicValueEnum<'ctx>,
        target: BasicTypeEnum<'ctx>,
        loc: SourceLocation,
    ) -> Option<BasicValueEnum<'ctx>> {
        if value.get_type() == target {
            return Some(value);
        }
        match (value, target) {
            (BasicValueEnum::IntValue(v), BasicTypeEnum::IntType(t)) => {
                let r = self.try_llvm(loc, self.builder.build_int_cast(v, t, "intcast"))?;
                Some(r.into())
            },
            (BasicValueEnum::IntValue(v), BasicTypeEnum::FloatType(t)) => {
                let r = self.try_llvm(loc, self.builder.build_signed_int_to_float(v, t, "sitofp"))?;
                Some(r.into())
            },
            (BasicValueEnum::FloatValue(v), BasicTypeEnum::IntType(t)) => {
                let r = self.try_llvm(loc, self.builder.build_float_to_signed_int(v, t, "fptosi"))?;
                Some(r.into())
            },
            (BasicValueEnum::FloatValue(v), BasicTypeEnum::FloatType(t)) => {
                let r = self.try_llvm(loc, self.builder.build_float_cast(v, t, "fpcast"))?;
                Some(r.into())
            },
            (BasicValueEnum::IntValue(v), BasicTypeEnum::PointerType(t)) => {
                let r = self.try_llvm(loc, self.builder.build_int_to_ptr(v, t, "inttoptr"))?;
                Some(r.into())
            },
            (BasicValueEnum::PointerValue(v), BasicTypeEnum::IntType(t)) => {
                let r = self.try_llvm(loc, self.builder.build_ptr_to_int(v, t, "ptrtoint"))?;
                Some(r.into())
            },
            (BasicValueEnum::PointerValue(v), BasicTypeEnum::PointerType(_)) => {
                // Opaque pointers: every pointer type is the same type.
                Some(v.into())
            },
            _ => self.report(loc, "no implicit conversion between these types"),
        }
    }

    /// Stack slot in the function's entry block, keeping allocas out of
    /// loops.
    fn entry_alloca(
        &self,
        function: FunctionValue<'ctx>,
        ty: BasicTypeEnum<'ctx>,
        name: &str,
        loc: SourceLocation,
    ) -> Option<PointerValue<'ctx>> {
        let builder = self.context.create_builder();
        let entry = function.get_first_basic_block()?;
        match entry.get_first_instruction() {
            Some(first) => builder.position_before(&first),
            None => builder.position_at_end(entry),
        }
        self.try_llvm(loc, builder.build_alloca(ty, name))
    }

    /// Whether the block under the cursor already ends in a terminator.
    fn block_terminated(&self) -> bool {
        self.builder
            .get_insert_block()
            .and_then(|block| block.get_terminator())
            .is_some()
    }

    /// Record a diagnostic and return the `None` sentinel.
    fn report<T>(&self, loc: SourceLocation, message: impl Into<String>) -> Option<T> {
        self.handler.error(message, loc);
        None
    }

    /// Unwrap a builder result, recording failures as diagnostics.
    fn try_llvm<T>(&self, loc: SourceLocation, result: std::result::Result<T, BuilderError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => self.report(loc, format!("LLVM operation failed: {}", error)),
        }
    }

    /// Widen the narrower of two integers so both operands agree.
    fn unify_int_widths(
        &mut self,
        l: IntValue<'ctx>,
        r: IntValue<'ctx>,
        loc: SourceLocation,
    ) -> Option<(IntValue<'ctx>, IntValue<'ctx>)> {
        let lw = l.get_type().get_bit_width();
        let rw = r.get_type().get_bit_width();
        if lw == rw {
            return Some((l, r));
        }
        if lw < rw {
            let widened = self.try_llvm(loc, self.builder.build_int_cast(l, r.get_type(), "widen"))?;
            Some((widened, r))
        } else {
            let widened = self.try_llvm(loc, self.builder.build_int_cast(r, l.get_type(), "widen"))?;
            Some((l, widened))
        }
    }

    // =========================================================================
    // OUTPUT
    // =========================================================================

    /// Run `verifyModule` over the finished module.
    pub fn verify(&self) -> Result<()> {
        self.module
            .verify()
            .map_err(|message| CodeGenError::VerificationFailed(message.to_string()))
    }

    /// The textual IR, as printed by the standard printer.
    pub fn emit_ir(&self) -> String {
        self.module.print_to_string().to_string()
    }

    /// Write the textual IR to `path`.
    pub fn write_ir_to_file(&self, path: &Path) -> Result<()> {
        self.module
            .print_to_file(path)
            .map_err(|message| CodeGenError::WriteFailed(message.to_string()))
    }

    /// Borrow the underlying LLVM module.
    pub fn llvm_module(&self) -> &Module<'ctx> {
        &self.module
    }
}

/// The name a type node refers to, when it is a plain named type.
fn type_name_of(ty: &TypeNode) -> Option<String> {
    match &ty.kind {
        TypeKind::Identifier { name, .. } => Some(name.clone()),
        _ => None,
    }
}

fn qualified_name(type_name: &str, method: &str) -> String {
    format!("{}.{}", type_name, method)
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

    fn emit(source: &str) -> (String, Vec<String>) {
        let tokens = tokenize(source, FileId::DUMMY).unwrap();
        let module = Parser::new(tokens).parse_module().unwrap();

        let context = Context::create();
        let handler = Handler::new();
        let mut generator = CodeGenerator::new(&context, "test", &handler);
        generator.compile_module(&module);

        let messages = handler
            .diagnostics()
            .into_iter()
            .map(|d| d.message)
            .collect();
        (generator.emit_ir(), messages)
    }

    fn emit_verified(source: &str) -> String {
        let tokens = tokenize(source, FileId::DUMMY).unwrap();
        let module = Parser::new(tokens).parse_module().unwrap();

        let context = Context::create();
        let handler = Handler::new();
        let mut generator = CodeGenerator::new(&context, "test", &handler);
        generator.compile_module(&module);

        assert!(
            !handler.has_errors(),
            "diagnostics: {:?}",
            handler
                .diagnostics()
                .into_iter()
                .map(|d| d.message)
                .collect::<Vec<_>>()
        );
        generator.verify().expect("module verification");
        generator.emit_ir()
    }

    // =========================================================================
    // ARITHMETIC AND FUNCTIONS
    // =========================================================================

    #[test]
    fn test_arithmetic_lowering() {
        let ir = emit_verified("fn calc(a: Int, b: Int) -> Int { return a + b * 2 }");
        assert!(ir.contains("mul i64"), "{}", ir);
        assert!(ir.contains("add i64"), "{}", ir);
        assert!(ir.contains("define i64 @calc"), "{}", ir);
    }

    #[test]
    fn test_float_dispatch() {
        let ir = emit_verified("fn scale(x: Float) -> Float { return x * 2.5 }");
        assert!(ir.contains("fmul double"), "{}", ir);
    }

    #[test]
    fn test_mixed_int_float_promotes() {
        let ir = emit_verified("fn mix(x: Float, n: Int) -> Float { return x + n }");
        assert!(ir.contains("sitofp"), "{}", ir);
        assert!(ir.contains("fadd double"), "{}", ir);
    }

    #[test]
    fn test_params_become_allocas() {
        let ir = emit_verified("fn id(x: Int) -> Int { return x }");
        assert!(ir.contains("alloca i64"), "{}", ir);
        assert!(ir.contains("store i64"), "{}", ir);
    }

    #[test]
    fn test_extern_function_declared() {
        let ir = emit_verified("extern fn puts(s: String) -> Int\nfn main() -> Int { return puts(\"hi\") }");
        assert!(ir.contains("declare"), "{}", ir);
        assert!(ir.contains("call i64 @puts"), "{}", ir);
    }

    #[test]
    fn test_call_arity_mismatch_reported() {
        let (_, messages) = emit("fn f(a: Int) -> Int { return a }\nfn g() -> Int { return f(1, 2) }");
        assert!(
            messages.iter().any(|m| m.contains("argument")),
            "{:?}",
            messages
        );
    }

    #[test]
    fn test_implicit_argument_cast() {
        let ir = emit_verified("fn take(x: Float) -> Float { return x }\nfn give() -> Float { return take(3) }");
        assert!(ir.contains("sitofp"), "{}", ir);
    }

    // =========================================================================
    // CONTROL FLOW
    // =========================================================================

    #[test]
    fn test_if_else_blocks() {
        let ir = emit_verified(
            "fn pick(x: Int) -> Int {\n  var r = 0\n  if x { r = 1 } else { r = 2 }\n  return r\n}",
        );
        assert!(ir.contains("then:"), "{}", ir);
        assert!(ir.contains("else:"), "{}", ir);
        assert!(ir.contains("ifcont:"), "{}", ir);
        assert!(ir.contains("br i1"), "{}", ir);
    }

    #[test]
    fn test_merge_elided_when_both_branches_return() {
        let ir = emit_verified("fn pick(x: Int) -> Int { if x { return 1 } else { return 2 } }");
        assert!(!ir.contains("ifcont:"), "{}", ir);
    }

    #[test]
    fn test_while_loop_blocks() {
        let ir = emit_verified(
            "fn count(n: Int) -> Int {\n  var i = 0\n  while i < n { i = i + 1 }\n  return i\n}",
        );
        assert!(ir.contains("whilecond:"), "{}", ir);
        assert!(ir.contains("whilebody:"), "{}", ir);
        assert!(ir.contains("whileend:"), "{}", ir);
    }

    #[test]
    fn test_for_loop_with_break_continue() {
        let source = "fn scan(n: Int) -> Int {\n  var total = 0\n  for (var i = 0; i < n; i = i + 1) {\n    if i == 3 { continue }\n    if i == 7 { break }\n    total = total + i\n  }\n  return total\n}";
        let ir = emit_verified(source);
        assert!(ir.contains("forcond:"), "{}", ir);
        assert!(ir.contains("forinc:"), "{}", ir);
        assert!(ir.contains("forend:"), "{}", ir);
    }

    #[test]
    fn test_short_circuit_phi() {
        let ir = emit_verified(
            "fn both(a: Int, b: Int) -> Int {\n  var r = 0\n  if a && b { r = 1 }\n  return r\n}",
        );
        assert!(ir.contains("phi i1"), "{}", ir);
        assert!(ir.contains("andrhs:"), "{}", ir);
    }

    #[test]
    fn test_or_short_circuit() {
        let ir = emit_verified(
            "fn either(a: Int, b: Int) -> Int {\n  var r = 0\n  if a || b { r = 1 }\n  return r\n}",
        );
        assert!(ir.contains("orrhs:"), "{}", ir);
    }

    #[test]
    fn test_break_outside_loop_reported() {
        let (_, messages) = emit("fn f() { break }");
        assert!(
            messages.iter().any(|m| m.contains("outside of a loop")),
            "{:?}",
            messages
        );
    }

    // =========================================================================
    // STRUCTS, MEMBERS, ARRAYS
    // =========================================================================

    #[test]
    fn test_struct_layout_and_member_access() {
        let ir = emit_verified(
            "struct Point { x: Float, y: Float }\nfn getx(p: Point) -> Float { return p.x }",
        );
        assert!(ir.contains("%Point = type { double, double }"), "{}", ir);
        assert!(ir.contains("getelementptr"), "{}", ir);
    }

    #[test]
    fn test_member_store() {
        let ir = emit_verified(
            "struct Point { x: Float, y: Float }\nfn setx(p: Point) -> Float {\n  p.x = 1.0\n  return p.x\n}",
        );
        assert!(ir.contains("store double"), "{}", ir);
    }

    #[test]
    fn test_unknown_field_reported() {
        let (_, messages) = emit(
            "struct Point { x: Float }\nfn f(p: Point) -> Float { return p.z }",
        );
        assert!(
            messages.iter().any(|m| m.contains("no field 'z'")),
            "{:?}",
            messages
        );
    }

    #[test]
    fn test_local_array_indexing() {
        let ir = emit_verified(
            "fn third() -> Int {\n  var xs: [Int; 4]\n  xs[2] = 7\n  return xs[2]\n}",
        );
        assert!(ir.contains("[4 x i64]"), "{}", ir);
        assert!(ir.contains("getelementptr"), "{}", ir);
    }

    // =========================================================================
    // GLOBALS AND RTTI
    // =========================================================================

    #[test]
    fn test_const_global_is_private() {
        let ir = emit_verified("const limit: Int = 10\nfn get() -> Int { return limit }");
        assert!(ir.contains("private"), "{}", ir);
        assert!(ir.contains("constant i64 10"), "{}", ir);
    }

    #[test]
    fn test_mutable_global() {
        let ir = emit_verified("var counter: Int = 0\nfn bump() { counter = counter + 1 }");
        assert!(ir.contains("@counter = global i64 0"), "{}", ir);
    }

    #[test]
    fn test_non_constant_global_initializer_reported() {
        let (_, messages) = emit("fn f() -> Int { return 1 }\nlet g = f()\n");
        assert!(
            messages.iter().any(|m| m.contains("constant initializer")),
            "{:?}",
            messages
        );
    }

    #[test]
    fn test_class_emits_rtti() {
        let ir = emit_verified("class Widget { var width: Int = 0 }");
        assert!(ir.contains("vyn.typeinfo"), "{}", ir);
        assert!(ir.contains("Widget.typeinfo"), "{}", ir);
    }

    #[test]
    fn test_loose_statements_become_init() {
        let ir = emit_verified("var g: Int = 0\ng = 5\n");
        assert!(ir.contains("__vyn_init"), "{}", ir);
        assert!(ir.contains("store i64 5"), "{}", ir);
    }

    // =========================================================================
    // OWNERSHIP, BORROWS, RAW LOCATIONS
    // =========================================================================

    #[test]
    fn test_ownership_params_are_pointers() {
        let ir = emit_verified(
            "fn peek(p: ptr<Int>) -> Int {\n  scoped {\n    return at(p)\n  }\n}",
        );
        assert!(ir.contains("define i64 @peek(ptr"), "{}", ir);
        assert!(ir.contains("load i64, ptr"), "{}", ir);
    }

    #[test]
    fn test_borrow_produces_address() {
        let ir = emit_verified(
            "fn f() -> Int {\n  var x = 1\n  let b = borrow x\n  return x\n}",
        );
        // The borrow stores the alloca's address into b.
        assert!(ir.contains("store ptr"), "{}", ir);
    }

    #[test]
    fn test_from_int_to_loc() {
        let ir = emit_verified(
            "fn f(n: Int) -> Int {\n  scoped {\n    let p = from(n)\n    return at(p)\n  }\n}",
        );
        assert!(ir.contains("inttoptr"), "{}", ir);
    }

    #[test]
    fn test_try_catch_reported_unsupported() {
        let (_, messages) = emit("fn f() { try { } catch (e) { } finally { } }");
        assert!(
            messages.iter().any(|m| m.contains("catch")),
            "{:?}",
            messages
        );
    }

    #[test]
    fn test_return_without_value_reported() {
        let (_, messages) = emit("fn f() -> Int { return }");
        assert!(
            messages.iter().any(|m| m.contains("'return' without a value")),
            "{:?}",
            messages
        );
    }

    #[test]
    fn test_list_comprehension_reported() {
        let (_, messages) = emit("fn f() { let xs = [x for x in ys] }");
        assert!(
            messages.iter().any(|m| m.contains("comprehension")),
            "{:?}",
            messages
        );
    }
}
