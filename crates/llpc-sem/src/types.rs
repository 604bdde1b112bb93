//! Type comparison rules (§3, §8): structural equality, except that an
//! open-array dimension (`-1`) matches any dimension on the other side.

use llpc_par::ast::Type;

use crate::scope::Parameter;

/// Structural equality, with the open-array wildcard: `Array(t, -1)` equals
/// `Array(t', n)` for any `n` as long as `t` equals `t'`. This relation is
/// reflexive and symmetric but *not* transitive — `int[]` equals both
/// `int[3]` and `int[5]`, but `int[3]` does not equal `int[5]`.
pub fn equal_types(a: &Type, b: &Type) -> bool {
    match (a, b) {
        (Type::Array(elem_a, size_a), Type::Array(elem_b, size_b)) => {
            equal_types(elem_a, elem_b) && (*size_a == Type::OPEN_ARRAY || *size_b == Type::OPEN_ARRAY || size_a == size_b)
        },
        (Type::Func(ret_a), Type::Func(ret_b)) => equal_types(ret_a, ret_b),
        _ => a == b,
    }
}

/// A forward declaration's parameter list matches its definition's only if
/// every parameter's type *and* passing mode agree — never a mix where one
/// half compensates for the other.
pub fn fpar_lists_match(declared: &[Parameter], defined: &[Parameter]) -> bool {
    declared.len() == defined.len()
        && declared
            .iter()
            .zip(defined.iter())
            .all(|(d, f)| equal_types(&d.param_type, &f.param_type) && d.passing == f.passing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::PassMode;

    #[test]
    fn test_equal_types_reflexive() {
        assert!(equal_types(&Type::Int, &Type::Int));
        assert!(equal_types(&Type::Char, &Type::Char));
    }

    #[test]
    fn test_equal_types_open_array_wildcard() {
        let open = Type::Array(Box::new(Type::Char), Type::OPEN_ARRAY);
        let fixed4 = Type::Array(Box::new(Type::Char), 4);
        let fixed9 = Type::Array(Box::new(Type::Char), 9);
        assert!(equal_types(&open, &fixed4));
        assert!(equal_types(&fixed9, &open));
    }

    #[test]
    fn test_equal_types_fixed_dims_must_match() {
        let a = Type::Array(Box::new(Type::Int), 3);
        let b = Type::Array(Box::new(Type::Int), 5);
        assert!(!equal_types(&a, &b));
    }

    #[test]
    fn test_equal_types_elem_type_must_match() {
        let a = Type::Array(Box::new(Type::Int), Type::OPEN_ARRAY);
        let b = Type::Array(Box::new(Type::Char), Type::OPEN_ARRAY);
        assert!(!equal_types(&a, &b));
    }

    #[test]
    fn test_fpar_lists_match_requires_same_passing_mode() {
        let by_value = Parameter {
            name: llpc_util::Symbol::intern("x"),
            param_type: Type::Int,
            passing: PassMode::ByValue,
        };
        let by_ref = Parameter {
            name: llpc_util::Symbol::intern("x"),
            param_type: Type::Int,
            passing: PassMode::ByReference,
        };
        assert!(!fpar_lists_match(&[by_value.clone()], &[by_ref]));
        assert!(fpar_lists_match(&[by_value.clone()], &[by_value]));
    }
}
