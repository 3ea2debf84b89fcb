// Codec module for jsonlayout: document trees to and from fixed-layout bytes

pub mod date;
pub mod decode;
pub mod encode;
pub mod export;
pub mod layout;

pub use self::decode::decode_leaf;
pub use self::encode::encode_leaf;
pub use self::export::{to_json_text, to_json_value};
pub use self::layout::LayoutCodec;
