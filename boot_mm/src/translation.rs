//! Table walk attributes shared by every long-descriptor translation control
//! register (TCR_EL1, TCR_EL2, HTCR).

/// Cacheability of translation table walks (IRGNn / ORGNn).
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cacheability {
    NonCacheable = 0b00,
    /// Write-back, read-allocate, write-allocate
    WriteBackWriteAllocate = 0b01,
    /// Write-through, read-allocate, no write-allocate
    WriteThrough = 0b10,
    /// Write-back, read-allocate, no write-allocate
    WriteBackNoWriteAllocate = 0b11,
}

/// Shareability of translation table walks (SHn). `0b01` is reserved.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shareability {
    NonShareable = 0b00,
    OuterShareable = 0b10,
    InnerShareable = 0b11,
}

macro_rules! field_value {
    (@one $E:ident { $($V:ident),+ } $ty:ty) => {
            impl From<$E> for $ty {
                #[inline]
                fn from(e: $E) -> $ty {
                    e as $ty
                }
            }

            impl TryFrom<$ty> for $E {
                type Error = ();

                fn try_from(x: $ty) -> Result<Self, ()> {
                    $( if x == $E::$V as $ty { return Ok($E::$V); } )+
                    Err(())
                }
            }
    };
    ($E:ident $vs:tt for $($ty:ty),+) => {
        $( field_value!(@one $E $vs $ty); )+
    };
}

field_value!(Cacheability {
    NonCacheable,
    WriteBackWriteAllocate,
    WriteThrough,
    WriteBackNoWriteAllocate
} for u32, u64);

field_value!(Shareability {
    NonShareable,
    OuterShareable,
    InnerShareable
} for u32, u64);
