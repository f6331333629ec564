#![cfg_attr(not(test), no_std)]
//! Register layouts checked at compile time.
//!
//! [`bitregs!`] declares a `#[repr(transparent)]` integer wrapper plus one
//! value-level marker per field. While the declaring crate compiles, every
//! layout is checked:
//! - each range fits the register width,
//! - every bit is covered by a field or a reserved range,
//! - no two ranges overlap,
//! - enum encodings fit their field.
//!
//! Values are composed with `const fn` builders, so layout presets can be plain
//! `const` items and an invalid preset is a build error rather than a boot
//! failure.

use core::marker::PhantomData;

/// Value-level marker for the field of `Reg` at bit `OFF`, `SZ` bits wide.
pub struct Field<Reg, const OFF: u32, const SZ: u32>(PhantomData<Reg>);

impl<Reg, const OFF: u32, const SZ: u32> Field<Reg, OFF, SZ> {
    #[inline]
    pub const fn new() -> Self {
        Self(PhantomData)
    }

    /// Lowest bit of the field.
    #[inline]
    pub const fn offset(&self) -> u32 {
        OFF
    }

    /// Width of the field in bits.
    #[inline]
    pub const fn width(&self) -> u32 {
        SZ
    }
}

impl<Reg, const OFF: u32, const SZ: u32> Clone for Field<Reg, OFF, SZ> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Reg, const OFF: u32, const SZ: u32> Copy for Field<Reg, OFF, SZ> {}

/// bitregs macro
///
/// - Integer types: u8 / u16 / u32 / u64 / u128
/// - Bit ranges: `@[MSB:LSB]` (ARM-like) or `(offset, size)`
/// - Reserved: `reserved@[..] [res0|res1|ignore]` / `reserved(off, sz) [..]`
/// - Enums: `name@[..] as E { A = 0, .. }` declares `E` next to the register,
///   `name@[..] as path::E` reuses an enum shared by several fields
/// - `bits()` applies the res0/res1 policy, `new()`/`Default` start with res1
///   bits set and res0 bits cleared
/// - `get`/`set`/`union` are `const fn`
///
/// Usage:
/// `Foo::new().set(Foo::bar1, 0b1).set_enum(Foo::bar2, Bar2::baz1).bits()`
///
/// Example:
/// ```rust
/// use bitregs::bitregs;
/// bitregs! {
///     pub struct Foo: u32 {
///         pub bar1@[3:0],
///         reserved@[7:4] [res0],
///         pub bar2@[9:8] as Bar2 {
///             baz1 = 0b01,
///             baz2 = 0b10,
///             baz3 = 0b11,
///         },
///         reserved@[31:10] [ignore],
///     }
/// }
///
/// const FOO: Foo = Foo::new().set(Foo::bar1, 0x5);
/// assert_eq!(FOO.set_enum(Foo::bar2, Bar2::baz2).bits(), 0x205);
/// ```
#[macro_export]
macro_rules! bitregs {
    // Entry: `struct Name : ty { ... }`
    ( $(#[$m:meta])* $vis:vis struct $Name:ident : $ty:ident { $($body:tt)* } ) => {
        $crate::bitregs!{ @parse [$(#[$m])*] [$vis] $Name $ty; []; $($body)* }
    };

    // =========================
    // Normalization: every item becomes `{ kind ... (off) (sz) ... }`
    // =========================

    (@parse $attrs:tt $vis:tt $Name:ident $ty:ident; [$($items:tt)*]; ) => {
        $crate::bitregs!{ @emit $attrs $vis $Name $ty; $($items)* }
    };

    // ---- reserved @[MSB:LSB]
    (@parse $attrs:tt $vis:tt $Name:ident $ty:ident; [$($items:tt)*];
        reserved @ [ $msb:tt : $lsb:tt ] [ $attr:ident ] $(, $($rest:tt)*)?
    ) => {
        $crate::bitregs!{ @parse $attrs $vis $Name $ty;
            [$($items)* { reserved $attr (($lsb)) ((($msb) - ($lsb) + 1)) }];
            $($($rest)*)?
        }
    };

    // ---- reserved (off, sz)
    (@parse $attrs:tt $vis:tt $Name:ident $ty:ident; [$($items:tt)*];
        reserved ( $off:expr , $sz:expr ) [ $attr:ident ] $(, $($rest:tt)*)?
    ) => {
        $crate::bitregs!{ @parse $attrs $vis $Name $ty;
            [$($items)* { reserved $attr ($off) ($sz) }];
            $($($rest)*)?
        }
    };

    // ---- enum field @[MSB:LSB]
    (@parse $attrs:tt $vis:tt $Name:ident $ty:ident; [$($items:tt)*];
        $(#[$fm:meta])* $fvis:vis $Field:ident @ [ $msb:tt : $lsb:tt ] as $E:ident
        { $($V:ident = $val:expr),+ $(,)? } $(, $($rest:tt)*)?
    ) => {
        $crate::bitregs!{ @parse $attrs $vis $Name $ty;
            [$($items)* { enum [$(#[$fm])*] [$fvis] $Field (($lsb)) ((($msb) - ($lsb) + 1)) $E [$($V = $val),+] }];
            $($($rest)*)?
        }
    };

    // ---- field typed by an enum declared elsewhere @[MSB:LSB]
    (@parse $attrs:tt $vis:tt $Name:ident $ty:ident; [$($items:tt)*];
        $(#[$fm:meta])* $fvis:vis $Field:ident @ [ $msb:tt : $lsb:tt ] as $E:path $(, $($rest:tt)*)?
    ) => {
        $crate::bitregs!{ @parse $attrs $vis $Name $ty;
            [$($items)* { typed [$(#[$fm])*] [$fvis] $Field (($lsb)) ((($msb) - ($lsb) + 1)) $E }];
            $($($rest)*)?
        }
    };

    // ---- plain field @[MSB:LSB]
    (@parse $attrs:tt $vis:tt $Name:ident $ty:ident; [$($items:tt)*];
        $(#[$fm:meta])* $fvis:vis $Field:ident @ [ $msb:tt : $lsb:tt ] $(, $($rest:tt)*)?
    ) => {
        $crate::bitregs!{ @parse $attrs $vis $Name $ty;
            [$($items)* { field [$(#[$fm])*] [$fvis] $Field (($lsb)) ((($msb) - ($lsb) + 1)) }];
            $($($rest)*)?
        }
    };

    // ---- enum field (off, sz)
    (@parse $attrs:tt $vis:tt $Name:ident $ty:ident; [$($items:tt)*];
        $(#[$fm:meta])* $fvis:vis $Field:ident ( $off:expr , $sz:expr ) as $E:ident
        { $($V:ident = $val:expr),+ $(,)? } $(, $($rest:tt)*)?
    ) => {
        $crate::bitregs!{ @parse $attrs $vis $Name $ty;
            [$($items)* { enum [$(#[$fm])*] [$fvis] $Field ($off) ($sz) $E [$($V = $val),+] }];
            $($($rest)*)?
        }
    };

    // ---- field typed by an enum declared elsewhere (off, sz)
    (@parse $attrs:tt $vis:tt $Name:ident $ty:ident; [$($items:tt)*];
        $(#[$fm:meta])* $fvis:vis $Field:ident ( $off:expr , $sz:expr ) as $E:path $(, $($rest:tt)*)?
    ) => {
        $crate::bitregs!{ @parse $attrs $vis $Name $ty;
            [$($items)* { typed [$(#[$fm])*] [$fvis] $Field ($off) ($sz) $E }];
            $($($rest)*)?
        }
    };

    // ---- plain field (off, sz)
    (@parse $attrs:tt $vis:tt $Name:ident $ty:ident; [$($items:tt)*];
        $(#[$fm:meta])* $fvis:vis $Field:ident ( $off:expr , $sz:expr ) $(, $($rest:tt)*)?
    ) => {
        $crate::bitregs!{ @parse $attrs $vis $Name $ty;
            [$($items)* { field [$(#[$fm])*] [$fvis] $Field ($off) ($sz) }];
            $($($rest)*)?
        }
    };

    (@parse $attrs:tt $vis:tt $Name:ident $ty:ident; [$($items:tt)*]; $($bad:tt)+) => {
        compile_error!(concat!(
            "bitregs: cannot parse the layout of ", stringify!($Name),
            " near `", stringify!($($bad)+), "`"
        ));
    };

    // =========================
    // Emission
    // =========================

    (@emit [$($attrs:tt)*] [$vis:vis] $Name:ident $ty:ident; $($item:tt)*) => {
        $($attrs)*
        #[repr(transparent)]
        #[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
        $vis struct $Name($ty);

        impl $Name {
            // --- Construction -------------------------------------------------
            /// Construct from raw bits (unchecked).
            #[inline] pub const fn from_bits(bits: $ty) -> Self { Self(bits) }

            /// Default constructor obeying reserved rules:
            /// - [res1] bits are set to 1
            /// - [res0] bits are set to 0
            #[inline] pub const fn new() -> Self { Self(Self::__RES1_MASK) }

            // --- Raw I/O ------------------------------------------------------
            /// Returns bits **with res0/res1 policy applied**.
            #[inline] pub const fn bits(self) -> $ty {
                (self.0 & !Self::__RES0_MASK) | Self::__RES1_MASK
            }

            /// Replace raw bits (builder style).
            #[inline] pub const fn with_bits(mut self, bits: $ty) -> Self { self.0 = bits; self }

            // --- Field API ----------------------------------------------------
            /// Reads a field through its value-level marker.
            #[inline]
            pub const fn get<const OFF: u32, const SZ: u32>(
                &self,
                _f: $crate::Field<$Name, OFF, SZ>,
            ) -> $ty {
                (self.0 & $crate::bitregs!(@mask $ty; OFF; SZ)) >> OFF
            }

            /// Writes a field (builder style). Bits of `v` above the field width are dropped.
            #[inline]
            pub const fn set<const OFF: u32, const SZ: u32>(
                self,
                _f: $crate::Field<$Name, OFF, SZ>,
                v: $ty,
            ) -> Self {
                let mask = $crate::bitregs!(@mask $ty; OFF; SZ);
                Self((self.0 & !mask) | ((v << OFF) & mask))
            }

            /// Enum getter; `None` for encodings the layout does not name.
            pub fn get_enum<E, const OFF: u32, const SZ: u32>(
                &self,
                f: $crate::Field<$Name, OFF, SZ>,
            ) -> Option<E>
            where
                E: ::core::convert::TryFrom<$ty>,
            {
                ::core::convert::TryFrom::try_from(self.get(f)).ok()
            }

            /// Enum setter (builder style).
            pub fn set_enum<E, const OFF: u32, const SZ: u32>(
                self,
                f: $crate::Field<$Name, OFF, SZ>,
                e: E,
            ) -> Self
            where
                E: Into<$ty>,
            {
                self.set(f, e.into())
            }

            /// Bitwise-OR of two values built from disjoint fields.
            ///
            /// Reserved bits are exempt. Panics when any other bit is set in
            /// both, which is a build error inside `const` items.
            pub const fn union(self, other: Self) -> Self {
                let fixed = Self::__RES0_MASK | Self::__RES1_MASK;
                assert!(
                    (self.0 & other.0 & !fixed) == 0,
                    concat!("bitregs: overlapping composition of ", stringify!($Name))
                );
                Self(self.0 | other.0)
            }
        }

        impl ::core::default::Default for $Name {
            #[inline] fn default() -> Self { Self::new() }
        }

        $( $crate::bitregs!{ @item $Name $ty; $item } )*

        // --- Reserved masks / coverage / overlap checks ----------------------
        impl $Name {
            /// Mask of all [res0] bits (forced to 0 by `bits()`/`new()`).
            const __RES0_MASK: $ty = 0 $( | $crate::bitregs!(@res res0 $ty; $item) )*;
            /// Mask of all [res1] bits (forced to 1 by `bits()`/`new()`).
            const __RES1_MASK: $ty = 0 $( | $crate::bitregs!(@res res1 $ty; $item) )*;
            /// Union of all declared ranges (fields + reserved).
            const __DECLARED_MASK: $ty = 0 $( | $crate::bitregs!(@span $ty; $item) )*;
            /// Sum of the widths of all declared ranges.
            const __DECLARED_BITS: u32 = 0 $( + $crate::bitregs!(@span $ty; $item).count_ones() )*;
        }

        const _: () = assert!(
            $Name::__DECLARED_MASK == <$ty>::MAX,
            concat!("bitregs: ", stringify!($Name), " leaves bits undeclared")
        );
        // Disjoint ranges are exactly the case where the widths add up to the union.
        const _: () = assert!(
            $Name::__DECLARED_BITS == $Name::__DECLARED_MASK.count_ones(),
            concat!("bitregs: ", stringify!($Name), " declares overlapping ranges")
        );

        impl ::core::fmt::Debug for $Name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, concat!(stringify!($Name), "({:#x})"), self.0)
            }
        }
    };

    // ---- per-item expansion
    (@item $Name:ident $ty:ident; { reserved $attr:ident ($off:expr) ($sz:expr) }) => {
        $crate::bitregs!{ @assert_attr $attr }
        $crate::bitregs!{ @assert_range $Name $ty; $off; $sz }
    };
    (@item $Name:ident $ty:ident;
        { field [$($fattr:tt)*] [$fvis:vis] $Field:ident ($off:expr) ($sz:expr) }
    ) => {
        impl $Name {
            $($fattr)*
            #[allow(non_upper_case_globals)]
            $fvis const $Field: $crate::Field<$Name, { ($off) as u32 }, { ($sz) as u32 }> =
                $crate::Field::new();
        }
        $crate::bitregs!{ @assert_range $Name $ty; $off; $sz }
    };
    (@item $Name:ident $ty:ident;
        { typed [$($fattr:tt)*] [$fvis:vis] $Field:ident ($off:expr) ($sz:expr) $E:path }
    ) => {
        $crate::bitregs!{ @item $Name $ty; { field [$($fattr)*] [$fvis] $Field ($off) ($sz) } }

        // the shared enum must convert both ways through the register type
        const _: () = {
            const fn converts<T>()
            where
                T: ::core::convert::Into<$ty> + ::core::convert::TryFrom<$ty>,
            {
            }
            converts::<$E>();
        };
    };
    (@item $Name:ident $ty:ident;
        { enum [$($fattr:tt)*] [$fvis:vis] $Field:ident ($off:expr) ($sz:expr) $E:ident [$($V:ident = $val:expr),+] }
    ) => {
        #[repr($ty)]
        #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
        $fvis enum $E { $( $V = $val ),+ }

        impl From<$E> for $ty {
            #[inline] fn from(e: $E) -> $ty { e as $ty }
        }

        impl ::core::convert::TryFrom<$ty> for $E {
            type Error = ();
            fn try_from(x: $ty) -> Result<Self, ()> {
                $( if x == $E::$V as $ty { return Ok($E::$V); } )+
                Err(())
            }
        }

        const _: () = {
            let sz = ($sz) as u32;
            let max: $ty = if sz >= <$ty>::BITS { <$ty>::MAX } else { ((1 as $ty) << sz) - 1 };
            $(
                assert!(
                    ($E::$V as $ty) <= max,
                    concat!("bitregs: ", stringify!($E), "::", stringify!($V), " does not fit its field")
                );
            )+
        };

        impl $Name {
            $($fattr)*
            #[allow(non_upper_case_globals)]
            $fvis const $Field: $crate::Field<$Name, { ($off) as u32 }, { ($sz) as u32 }> =
                $crate::Field::new();
        }
        $crate::bitregs!{ @assert_range $Name $ty; $off; $sz }
    };

    (@assert_attr res0) => {};
    (@assert_attr res1) => {};
    (@assert_attr ignore) => {};
    (@assert_attr $other:ident) => {
        compile_error!(concat!(
            "bitregs: reserved attribute must be one of [res0|res1|ignore], found ",
            stringify!($other)
        ));
    };

    (@assert_range $Name:ident $ty:ident; $off:expr; $sz:expr) => {
        const _: () = {
            let off = ($off) as u32;
            let sz = ($sz) as u32;
            assert!(
                sz > 0 && off < <$ty>::BITS && off + sz <= <$ty>::BITS,
                concat!("bitregs: range does not fit ", stringify!($Name))
            );
        };
    };

    // =========================
    // Helpers: masks
    // =========================

    // Build a mask (typed) from (off, sz)
    (@mask $ty:ident; $off:expr; $sz:expr) => {{
        let off = ($off) as u32;
        let sz = ($sz) as u32;
        (if sz >= <$ty>::BITS { <$ty>::MAX } else { ((1 as $ty) << sz) - 1 }) << off
    }};

    (@span $ty:ident; { reserved $attr:ident ($off:expr) ($sz:expr) }) => {
        $crate::bitregs!(@mask $ty; $off; $sz)
    };
    (@span $ty:ident; { field $fattr:tt $fvis:tt $Field:ident ($off:expr) ($sz:expr) }) => {
        $crate::bitregs!(@mask $ty; $off; $sz)
    };
    (@span $ty:ident; { typed $fattr:tt $fvis:tt $Field:ident ($off:expr) ($sz:expr) $E:tt }) => {
        $crate::bitregs!(@mask $ty; $off; $sz)
    };
    (@span $ty:ident; { enum $fattr:tt $fvis:tt $Field:ident ($off:expr) ($sz:expr) $E:ident $vals:tt }) => {
        $crate::bitregs!(@mask $ty; $off; $sz)
    };

    (@res res0 $ty:ident; { reserved res0 ($off:expr) ($sz:expr) }) => {
        $crate::bitregs!(@mask $ty; $off; $sz)
    };
    (@res res1 $ty:ident; { reserved res1 ($off:expr) ($sz:expr) }) => {
        $crate::bitregs!(@mask $ty; $off; $sz)
    };
    (@res $want:ident $ty:ident; $other:tt) => { 0 };
}
