//! Maps this language's types (§3, shared with `llpc-sem`) onto LLVM IR
//! types for the emitter in `llvm.rs`.

use inkwell::context::Context;
use inkwell::types::{BasicTypeEnum, PointerType};
use inkwell::AddressSpace;

use llpc_par::ast::Type;

pub struct TypeMapper<'ctx> {
    context: &'ctx Context,
}

impl<'ctx> TypeMapper<'ctx> {
    pub fn new(context: &'ctx Context) -> Self {
        Self { context }
    }

    /// `Int` and `Char` are the only scalar value types; everything else
    /// (arrays, `None`, function types) has no direct scalar representation.
    pub fn scalar_type(&self, ty: &Type) -> BasicTypeEnum<'ctx> {
        match ty {
            Type::Int => self.context.i64_type().into(),
            Type::Char => self.context.i8_type().into(),
            other => unreachable!("not a scalar type: {other:?}"),
        }
    }

    pub fn ptr_type(&self) -> PointerType<'ctx> {
        self.context.ptr_type(AddressSpace::default())
    }

    /// Unwraps every `Array` layer to find the element type ultimately
    /// stored in the flat backing buffer (`Int` or `Char`).
    pub fn base_scalar_type(&self, ty: &Type) -> BasicTypeEnum<'ctx> {
        self.scalar_type(base_element_type(ty))
    }
}

/// Walks `Array` layers from the outside in, returning the declared
/// dimensions in the same outermost-first order used by §4.4's linear-index
/// formula, plus the innermost non-array element type.
pub fn flatten_array_dims(ty: &Type) -> (Vec<i64>, &Type) {
    let mut dims = Vec::new();
    let mut cur = ty;
    while let Type::Array(elem, size) = cur {
        dims.push(*size);
        cur = elem;
    }
    (dims, cur)
}

pub fn base_element_type(ty: &Type) -> &Type {
    flatten_array_dims(ty).1
}

/// Total element count of a fixed-size array type, the product of every
/// dimension. Not meaningful for an open-array type (a `-1` dimension only
/// ever appears on a by-reference parameter, never on a local allocation).
pub fn total_element_count(ty: &Type) -> i64 {
    flatten_array_dims(ty).0.into_iter().product()
}
