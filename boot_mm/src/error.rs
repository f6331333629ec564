use core::fmt;

/// Rejected translation-control parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationConfigErr {
    /// Input address size (in bits) the regime cannot be configured for.
    InputSizeOutOfRange(u8),
    /// Physical address range encoding the output size field cannot express.
    UnsupportedPaRange(u8),
}

impl fmt::Display for TranslationConfigErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranslationConfigErr::InputSizeOutOfRange(bits) => {
                write!(f, "unsupported input address size: {} bits", bits)
            }
            TranslationConfigErr::UnsupportedPaRange(code) => {
                write!(f, "unsupported physical address range encoding: {:#x}", code)
            }
        }
    }
}
