// Leaf encoder: one typed value into exactly `byte_size` bytes

use byteorder::{BigEndian, LittleEndian, NativeEndian, WriteBytesExt};
use bytes::Bytes;

use crate::codec::date::pack_date;
use crate::config::FloatByteOrder;
use crate::internal::error::{Error, Result};
use crate::tree::{FieldType, LeafLayout, LeafValue};

/// Encodes a leaf value according to its layout.
///
/// Strings are truncated or NUL-padded on the right. Integers are narrowed by
/// dropping high-order bits and written big-endian. Floats copy their bit
/// pattern in `float_order`. Dates are packed and written as a big-endian u32.
pub fn encode_leaf(
    key: &str,
    value: &LeafValue,
    layout: &LeafLayout,
    float_order: FloatByteOrder,
) -> Result<Bytes> {
    let size = layout.byte_size as usize;
    let mut encoded = Vec::with_capacity(size);

    match layout.field_type {
        FieldType::String => {
            encoded.extend_from_slice(value.to_text().as_bytes());
            encoded.resize(size, 0);
        }
        FieldType::Int | FieldType::UInt => {
            // Signed and unsigned share the same low-order bits once narrowed
            let raw = value.to_i64_lossy();
            match size {
                1 => encoded.write_u8(raw as u8)?,
                2 => encoded.write_u16::<BigEndian>(raw as u16)?,
                4 => encoded.write_u32::<BigEndian>(raw as u32)?,
                8 => encoded.write_u64::<BigEndian>(raw as u64)?,
                _ => return Err(unsupported_width(key, layout)),
            }
        }
        FieldType::Float => {
            if size != 4 {
                return Err(unsupported_width(key, layout));
            }
            let v = value.to_f64_lossy() as f32;
            match float_order {
                FloatByteOrder::Native => encoded.write_f32::<NativeEndian>(v)?,
                FloatByteOrder::Big => encoded.write_f32::<BigEndian>(v)?,
                FloatByteOrder::Little => encoded.write_f32::<LittleEndian>(v)?,
            }
        }
        FieldType::Double => {
            if size != 8 {
                return Err(unsupported_width(key, layout));
            }
            let v = value.to_f64_lossy();
            match float_order {
                FloatByteOrder::Native => encoded.write_f64::<NativeEndian>(v)?,
                FloatByteOrder::Big => encoded.write_f64::<BigEndian>(v)?,
                FloatByteOrder::Little => encoded.write_f64::<LittleEndian>(v)?,
            }
        }
        FieldType::Date => {
            if size != 4 {
                return Err(unsupported_width(key, layout));
            }
            encoded.write_u32::<BigEndian>(pack_date(&value.to_date_lossy()))?;
        }
    }

    Ok(Bytes::from(encoded))
}

pub(crate) fn unsupported_width(key: &str, layout: &LeafLayout) -> Error {
    Error::UnsupportedWidth {
        key: key.to_string(),
        field_type: layout.field_type.to_string(),
        size: layout.byte_size,
    }
}
