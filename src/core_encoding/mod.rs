pub mod translator;

pub use translator::{charset_for_label, EncodingTranslator};
