//! Declarative macro for newtype wrappers that behave like a C-style enum
//! but accept (and preserve) values outside the known variant set.
#![deny(unsafe_code)]

/// Defines a tuple struct wrapping an integer primitive with named, `const`
/// associated values standing in for enum variants.
///
/// Unlike a real `enum`, the wrapped primitive can hold any value, known or
/// not — useful for wire formats where unknown values must round-trip rather
/// than fail to parse.
#[macro_export]
macro_rules! nutype_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident($repr:ty) {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident = $value:expr
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        $vis struct $name(pub $repr);

        impl $name {
            $(
                $(#[$variant_meta])*
                pub const $variant: Self = Self($value);
            )*

            /// Returns the name of the matching known variant, if any.
            pub fn name(&self) -> Option<&'static str> {
                match *self {
                    $(Self::$variant => Some(stringify!($variant)),)*
                    _ => None,
                }
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self.name() {
                    Some(name) => write!(f, "{}::{}({:?})", stringify!($name), name, self.0),
                    None => write!(f, "{}({:?})", stringify!($name), self.0),
                }
            }
        }

        impl From<$repr> for $name {
            fn from(value: $repr) -> Self {
                Self(value)
            }
        }

        impl From<$name> for $repr {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

#[cfg(test)]
mod tests {
    nutype_enum! {
        pub enum Animal(u8) {
            Cat = 1,
            Dog = 2,
        }
    }

    #[test]
    fn known_variant_has_a_name() {
        assert_eq!(Animal::Cat.name(), Some("Cat"));
        assert_eq!(Animal::Dog, Animal(2));
    }

    #[test]
    fn unknown_value_round_trips() {
        let weasel = Animal(42);
        assert_eq!(weasel.name(), None);
        assert_eq!(weasel.0, 42);
    }
}
