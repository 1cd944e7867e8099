//! Type representations.
//!
//! Every [`Type`] has a deterministic byte size for a given pointer size. Two
//! types are equal exactly when they are structurally equal.

use std::{collections::HashMap, fmt::Display};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Integer {
        bits: u8,
        signed: bool,
    },
    Float {
        bits: u8,
    },
    Bool,
    Byte,
    /// Fixed size handle to string data.
    String,
    None,
    /// `T ptr` when `is_array` is false, `T[length]` otherwise.
    Pointer {
        pointee: Box<Type>,
        is_array: bool,
        length: Option<u64>,
    },
    FunctionPointer {
        arguments: Vec<Type>,
        return_type: Box<Type>,
    },
    /// Tagged union. Options are never themselves sums.
    Sum(Vec<Type>),
    /// Result of a failed resolution, accepted everywhere so one mistake reports once.
    Error,
}

impl Type {
    pub fn integer(bits: u8, signed: bool) -> Type {
        Type::Integer { bits, signed }
    }

    pub fn float(bits: u8) -> Type {
        Type::Float { bits }
    }

    pub fn pointer(pointee: Type) -> Type {
        Type::Pointer {
            pointee: Box::new(pointee),
            is_array: false,
            length: None,
        }
    }

    pub fn array(pointee: Type, length: u64) -> Type {
        Type::Pointer {
            pointee: Box::new(pointee),
            is_array: true,
            length: Some(length),
        }
    }

    pub fn function_pointer(arguments: Vec<Type>, return_type: Type) -> Type {
        Type::FunctionPointer {
            arguments,
            return_type: Box::new(return_type),
        }
    }

    /// Builds a sum from `options`, flattening nested sums and dropping repeats.
    /// A single remaining option is returned as is.
    pub fn sum(options: Vec<Type>) -> Type {
        let mut flat: Vec<Type> = Vec::new();
        for option in options {
            let nested = match option {
                Type::Sum(nested) => nested,
                other => vec![other],
            };
            for option in nested {
                if !flat.contains(&option) {
                    flat.push(option);
                }
            }
        }

        if flat.len() == 1 {
            flat.remove(0)
        } else {
            Type::Sum(flat)
        }
    }

    /// Size in bytes, or `None` when it does not fit in a `u64`.
    pub fn size(&self, pointer_size: u32) -> Option<u64> {
        match self {
            Type::Integer { bits, .. } | Type::Float { bits } => Some(u64::from(*bits) / 8),
            Type::Bool | Type::Byte => Some(1),
            Type::String | Type::FunctionPointer { .. } => Some(u64::from(pointer_size)),
            Type::None | Type::Error => Some(0),
            Type::Pointer {
                pointee,
                is_array: true,
                length,
            } => pointee
                .size(pointer_size)?
                .checked_mul(length.unwrap_or(0)),
            Type::Pointer { .. } => Some(u64::from(pointer_size)),
            Type::Sum(options) => {
                let mut largest = 0;
                for option in options {
                    largest = largest.max(option.size(pointer_size)?);
                }
                largest.checked_add(1)
            }
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Type::Integer { .. })
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Type::Float { .. })
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_float()
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Type::Bool)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Type::Error)
    }

    /// The type one level below a pointer or array.
    pub fn pointee(&self) -> Option<&Type> {
        match self {
            Type::Pointer { pointee, .. } => Some(pointee),
            _ => None,
        }
    }

    fn needs_parentheses_as_pointee(&self) -> bool {
        matches!(self, Type::Sum(_) | Type::FunctionPointer { .. })
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Integer { bits, signed: true } => write!(f, "i{}", bits),
            Type::Integer {
                bits,
                signed: false,
            } => write!(f, "u{}", bits),
            Type::Float { bits: 32 } => write!(f, "float"),
            Type::Float { bits: 64 } => write!(f, "double"),
            Type::Float { bits } => write!(f, "f{}", bits),
            Type::Bool => write!(f, "bool"),
            Type::Byte => write!(f, "byte"),
            Type::String => write!(f, "string"),
            Type::None => write!(f, "None"),
            Type::Error => write!(f, "<error>"),
            Type::Pointer {
                pointee,
                is_array,
                length,
            } => {
                if pointee.needs_parentheses_as_pointee() {
                    write!(f, "({})", pointee)?;
                } else {
                    write!(f, "{}", pointee)?;
                }
                if *is_array {
                    write!(f, "[{}]", length.unwrap_or(0))
                } else {
                    write!(f, " ptr")
                }
            }
            Type::FunctionPointer {
                arguments,
                return_type,
            } => {
                let arguments: Vec<String> = arguments.iter().map(Type::to_string).collect();
                write!(f, "({}) -> {}", arguments.join(", "), return_type)
            }
            Type::Sum(options) => {
                let options: Vec<String> = options
                    .iter()
                    .map(|option| match option {
                        Type::FunctionPointer { .. } => format!("({})", option),
                        _ => option.to_string(),
                    })
                    .collect();
                write!(f, "{}", options.join(" or "))
            }
        }
    }
}

/// Name to type mapping owned by a module. Only grows.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeTable {
    types: HashMap<String, Type>,
}

impl Default for TypeTable {
    fn default() -> Self {
        TypeTable::new()
    }
}

impl TypeTable {
    /// A table holding the built-in primitive types.
    pub fn new() -> Self {
        let mut types = HashMap::new();
        for bits in [8, 16, 32, 64] {
            types.insert(format!("i{}", bits), Type::integer(bits, true));
            types.insert(format!("u{}", bits), Type::integer(bits, false));
        }
        types.insert(String::from("float"), Type::float(32));
        types.insert(String::from("double"), Type::float(64));
        types.insert(String::from("bool"), Type::Bool);
        types.insert(String::from("byte"), Type::Byte);
        types.insert(String::from("string"), Type::String);
        types.insert(String::from("None"), Type::None);

        TypeTable { types }
    }

    pub fn get(&self, name: &str) -> Option<&Type> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Registers `name`. Returns false, leaving the table untouched, if it is already taken.
    pub fn define(&mut self, name: &str, ty: Type) -> bool {
        if self.types.contains_key(name) {
            return false;
        }
        self.types.insert(name.to_string(), ty);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Type)> {
        self.types.iter()
    }
}
