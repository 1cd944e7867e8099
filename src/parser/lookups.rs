use std::collections::HashMap;

use lazy_static::lazy_static;

#[derive(PartialEq, PartialOrd, Clone, Copy, Debug)]
pub enum BindingPower {
    Default,
    Assignment,
    LogicalOr,
    LogicalAnd,
    Relational,
    Bitwise,
    /// User defined `@infix` functions without a built-in precedence.
    Infix,
    Additive,
    Multiplicative,
    Unary,
    Cast,
    Call,
    Primary,
}

lazy_static! {
    static ref BP_LOOKUP: HashMap<&'static str, BindingPower> = {
        let mut map = HashMap::new();
        map.insert("=", BindingPower::Assignment);

        // Logical
        map.insert("||", BindingPower::LogicalOr);
        map.insert("&&", BindingPower::LogicalAnd);

        // Relational
        map.insert("==", BindingPower::Relational);
        map.insert("!=", BindingPower::Relational);
        map.insert("<", BindingPower::Relational);
        map.insert("<=", BindingPower::Relational);
        map.insert(">", BindingPower::Relational);
        map.insert(">=", BindingPower::Relational);

        // Bitwise
        map.insert("|", BindingPower::Bitwise);
        map.insert("^", BindingPower::Bitwise);
        map.insert("&", BindingPower::Bitwise);
        map.insert("<<", BindingPower::Bitwise);
        map.insert(">>", BindingPower::Bitwise);

        // Additive and multiplicative
        map.insert("+", BindingPower::Additive);
        map.insert("-", BindingPower::Additive);
        map.insert("*", BindingPower::Multiplicative);
        map.insert("/", BindingPower::Multiplicative);
        map
    };
}

/// Binding power of an infix operator spelled `operator`.
pub fn binding_power(operator: &str) -> BindingPower {
    BP_LOOKUP
        .get(operator)
        .copied()
        .unwrap_or(BindingPower::Infix)
}

/// Whether `operator` is one of the built-in binary operators.
pub fn is_builtin_operator(operator: &str) -> bool {
    BP_LOOKUP.contains_key(operator)
}

/// Binding power to parse the right hand side with. Assignment is right associative.
pub fn right_binding_power(operator: &str) -> BindingPower {
    match binding_power(operator) {
        BindingPower::Assignment => BindingPower::Default,
        other => other,
    }
}
