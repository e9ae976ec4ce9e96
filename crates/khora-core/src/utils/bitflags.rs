// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A macro to define bitflags in a structured way.

/// Declares a transparent bitflag set with named constants and bitwise operators.
///
/// # Examples
///
/// ```
/// khora_core::khora_bitflags! {
///     /// Example flags.
///     pub struct Channels: u32 {
///         /// Colour channel.
///         const COLOUR = 1 << 0;
///         /// Normal channel.
///         const NORMAL = 1 << 1;
///     }
/// }
///
/// let both = Channels::COLOUR | Channels::NORMAL;
/// assert!(both.contains(Channels::NORMAL));
/// assert_eq!(both.iter_set().count(), 2);
/// ```
#[macro_export]
macro_rules! khora_bitflags {
    (
        $(#[$attr:meta])*
        $vis:vis struct $name:ident: $ty:ty {
            $(
                $(#[$flag_attr:meta])*
                const $flag_name:ident = $flag_value:expr;
            )*
        }
    ) => {
        $(#[$attr])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
        $vis struct $name {
            bits: $ty,
        }

        impl $name {
            /// An empty set of flags.
            pub const EMPTY: Self = Self { bits: 0 };

            $(
                $(#[$flag_attr])*
                pub const $flag_name: Self = Self { bits: $flag_value };
            )*

            /// Every named flag, in declaration order.
            pub const ALL_FLAGS: &'static [(&'static str, Self)] = &[
                $((stringify!($flag_name), Self::$flag_name)),*
            ];

            /// Creates a bitflag set from raw bits, keeping unknown bits.
            pub const fn from_bits_truncate(bits: $ty) -> Self {
                Self { bits }
            }

            /// Returns the raw value of the bitflag set.
            pub const fn bits(&self) -> $ty {
                self.bits
            }

            /// Returns `true` if no flag is set.
            pub const fn is_empty(&self) -> bool {
                self.bits == 0
            }

            /// Returns `true` if all flags in `other` are contained within `self`.
            pub const fn contains(&self, other: Self) -> bool {
                (self.bits & other.bits) == other.bits
            }

            /// Returns `true` if any flag in `other` is contained within `self`.
            pub const fn intersects(&self, other: Self) -> bool {
                (self.bits & other.bits) != 0
            }

            /// Inserts the flags in `other` into `self`.
            pub fn insert(&mut self, other: Self) {
                self.bits |= other.bits;
            }

            /// Removes the flags in `other` from `self`.
            pub fn remove(&mut self, other: Self) {
                self.bits &= !other.bits;
            }

            /// Iterates over the named, non-zero flags present in `self`.
            pub fn iter_set(self) -> impl Iterator<Item = Self> {
                Self::ALL_FLAGS
                    .iter()
                    .map(|(_, flag)| *flag)
                    .filter(move |flag| !flag.is_empty() && self.contains(*flag))
            }
        }

        impl core::ops::BitOr for $name {
            type Output = Self;
            fn bitor(self, other: Self) -> Self {
                Self { bits: self.bits | other.bits }
            }
        }

        impl core::ops::BitAnd for $name {
            type Output = Self;
            fn bitand(self, other: Self) -> Self {
                Self { bits: self.bits & other.bits }
            }
        }

        impl core::ops::BitOrAssign for $name {
            fn bitor_assign(&mut self, other: Self) {
                self.bits |= other.bits;
            }
        }

        impl core::fmt::Debug for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{} {{ ", stringify!($name))?;
                let mut first = true;
                for (label, flag) in Self::ALL_FLAGS {
                    if !flag.is_empty() && self.contains(*flag) {
                        if !first {
                            write!(f, " | ")?;
                        }
                        write!(f, "{}", label)?;
                        first = false;
                    }
                }
                if first {
                    write!(f, "EMPTY")?;
                }
                write!(f, " }}")
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::khora_bitflags;

    khora_bitflags! {
        /// TestFlags for macro verification
        pub struct TestFlags: u32 {
            const FLAG_A = 1 << 0;
            const FLAG_B = 1 << 1;
            const FLAG_C = 1 << 2;
        }
    }

    #[test]
    fn test_insert_remove_contains() {
        let mut flags = TestFlags::EMPTY;
        assert!(flags.is_empty());
        flags.insert(TestFlags::FLAG_A | TestFlags::FLAG_C);
        assert!(flags.contains(TestFlags::FLAG_A));
        assert!(!flags.contains(TestFlags::FLAG_B));
        assert!(flags.intersects(TestFlags::FLAG_B | TestFlags::FLAG_C));
        flags.remove(TestFlags::FLAG_A);
        assert_eq!(flags, TestFlags::FLAG_C);
    }

    #[test]
    fn test_iter_set_preserves_declaration_order() {
        let flags = TestFlags::FLAG_C | TestFlags::FLAG_A;
        let set: Vec<_> = flags.iter_set().collect();
        assert_eq!(set, vec![TestFlags::FLAG_A, TestFlags::FLAG_C]);
    }

    #[test]
    fn test_debug_output() {
        assert_eq!(format!("{:?}", TestFlags::EMPTY), "TestFlags { EMPTY }");
        assert_eq!(
            format!("{:?}", TestFlags::FLAG_A | TestFlags::FLAG_B),
            "TestFlags { FLAG_A | FLAG_B }"
        );
    }
}
