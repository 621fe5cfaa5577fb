//! Typed attribute values.
//!
//! Raw attribute text is classified into one of the typed value forms by a
//! fixed, ordered set of patterns. The first pattern matching the whole text
//! wins; text matching none of them is stored as a string.

use std::io::Write;
use std::sync::LazyLock;

use regex::Regex;
use resxml_common::BinaryWriter;

use crate::chunk::{Chunk, Header};
use crate::context::BuildContext;
use crate::{Error, Result, StringPool};

/// Size of a value entry on the wire.
pub const VALUE_SIZE: u16 = 8;

/// Value type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ValueType {
    Null = 0x00,
    Reference = 0x01,
    Attribute = 0x02,
    String = 0x03,
    Float = 0x04,
    Dimension = 0x05,
    Fraction = 0x06,
    DynamicReference = 0x07,
    DynamicAttribute = 0x08,
    IntDec = 0x10,
    IntHex = 0x11,
    IntBoolean = 0x12,
    IntColorArgb8 = 0x1c,
    IntColorRgb8 = 0x1d,
    IntColorArgb4 = 0x1e,
    IntColorRgb4 = 0x1f,
}

impl ValueType {
    const ALL: [ValueType; 16] = [
        ValueType::Null,
        ValueType::Reference,
        ValueType::Attribute,
        ValueType::String,
        ValueType::Float,
        ValueType::Dimension,
        ValueType::Fraction,
        ValueType::DynamicReference,
        ValueType::DynamicAttribute,
        ValueType::IntDec,
        ValueType::IntHex,
        ValueType::IntBoolean,
        ValueType::IntColorArgb8,
        ValueType::IntColorRgb8,
        ValueType::IntColorArgb4,
        ValueType::IntColorRgb4,
    ];

    /// Wire tag.
    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Look up a type by its wire tag.
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.code() == code)
    }
}

/// Unit of a dimension value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DimensionUnit {
    Px = 0,
    Dip = 1,
    Sp = 2,
    Pt = 3,
    In = 4,
    Mm = 5,
}

impl DimensionUnit {
    /// Split a unit suffix off `text`.
    fn split(text: &str) -> Option<(&str, Self)> {
        const SUFFIXES: [(&str, DimensionUnit); 7] = [
            ("dip", DimensionUnit::Dip),
            ("dp", DimensionUnit::Dip),
            ("sp", DimensionUnit::Sp),
            ("px", DimensionUnit::Px),
            ("pt", DimensionUnit::Pt),
            ("in", DimensionUnit::In),
            ("mm", DimensionUnit::Mm),
        ];
        SUFFIXES
            .iter()
            .find_map(|&(suffix, unit)| text.strip_suffix(suffix).map(|num| (num, unit)))
    }
}

/// Unit of a plain fraction (`%`).
pub const FRACTION_UNIT: u8 = 0;

/// Pack a number into the fixed-point complex format.
///
/// The radix is picked by magnitude so that the 24-bit mantissa keeps as much
/// precision as possible: `|f| < 1` uses 0p23, `|f| < 256` 8p15,
/// `|f| < 65536` 16p7, everything else is truncated to an integer.
pub fn complex(value: f64, unit: u8) -> u32 {
    let (mantissa, radix) = if value > -1.0 && value < 1.0 {
        ((value * f64::from(1u32 << 23)) as i32, 3u32)
    } else if value > -256.0 && value < 256.0 {
        ((value * f64::from(1u32 << 15)) as i32, 2)
    } else if value > -65536.0 && value < 65536.0 {
        ((value * f64::from(1u32 << 7)) as i32, 1)
    } else {
        (value as i32, 0)
    };
    ((mantissa as u32) << 8) | (radix << 4) | u32::from(unit)
}

static EXPLICIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^!(?:([0-9A-Za-z_]+)!)?(.*)$").unwrap());

static TYPED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(?:",
        r"(?P<null>@null)",
        r"|@(?P<reference>[0-9a-zA-Z]+)",
        r"|\?(?P<attribute>[0-9a-zA-Z]+)",
        r"|(?P<boolean>true|false)",
        r"|(?P<dec>[-+]?[0-9]+)",
        r"|(?P<hex>0x[0-9a-zA-Z]+)",
        r"|(?P<float>[-+]?[0-9]+(?:\.[0-9]+)?)",
        r"|(?P<dimension>[-+]?[0-9]+(?:\.[0-9]+)?(?:dp|dip|in|px|sp|pt|mm))",
        r"|(?P<fraction>[-+]?[0-9]+(?:\.[0-9]+)?%)",
        r"|(?P<color>#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{4}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8}))",
        r"|(?P<named_reference>@\+?(?:[0-9A-Za-z_]+:)?[0-9A-Za-z_]+/[0-9A-Za-z_]+)",
        r"|(?P<named_attribute>\?\+?(?:[0-9A-Za-z_]+:)?[0-9A-Za-z_]+/[0-9A-Za-z_]+)",
        r")$"
    ))
    .unwrap()
});

/// A typed attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Reference(u32),
    Attribute(u32),
    Boolean(bool),
    Int(i32),
    Hex(u32),
    Float(f32),
    /// Packed complex dimension.
    Dimension(u32),
    /// Packed complex fraction.
    Fraction(u32),
    /// ARGB8 color.
    Color(u32),
    String(String),
}

impl Value {
    /// Classify raw attribute text.
    ///
    /// # Example
    ///
    /// ```
    /// use resxml_axml::Value;
    ///
    /// assert_eq!(Value::parse("true").unwrap(), Value::Boolean(true));
    /// assert_eq!(Value::parse("#FF0000").unwrap(), Value::Color(0xFFFF_0000));
    /// assert_eq!(Value::parse("!string!123").unwrap(), Value::String("123".into()));
    /// assert!(Value::parse("@string/app_name").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self> {
        if let Some(caps) = EXPLICIT.captures(raw) {
            let payload = caps.get(2).map_or("", |m| m.as_str());
            return match caps.get(1).map(|m| m.as_str()) {
                None | Some("string" | "str") => Ok(Value::String(payload.to_string())),
                Some(_) => Err(Error::UnsupportedValue {
                    raw: raw.to_string(),
                    reason: "explicit value types other than string",
                }),
            };
        }

        let Some(caps) = TYPED.captures(raw) else {
            return Ok(Value::String(raw.to_string()));
        };
        let group = |name: &str| caps.name(name).map(|m| m.as_str());

        if group("null").is_some() {
            Ok(Value::Null)
        } else if let Some(hex) = group("reference") {
            parse_hex(raw, hex).map(Value::Reference)
        } else if let Some(hex) = group("attribute") {
            parse_hex(raw, hex).map(Value::Attribute)
        } else if let Some(flag) = group("boolean") {
            Ok(Value::Boolean(flag == "true"))
        } else if let Some(dec) = group("dec") {
            dec.parse::<i32>()
                .map(Value::Int)
                .map_err(|e| invalid(raw, e))
        } else if let Some(hex) = group("hex") {
            parse_hex(raw, &hex[2..]).map(Value::Hex)
        } else if let Some(float) = group("float") {
            float
                .parse::<f32>()
                .map(Value::Float)
                .map_err(|e| invalid(raw, e))
        } else if let Some(dimension) = group("dimension") {
            let (number, unit) = DimensionUnit::split(dimension).ok_or_else(|| Error::InvalidValue {
                raw: raw.to_string(),
                reason: "missing dimension unit".to_string(),
            })?;
            let number: f64 = number.parse().map_err(|e| invalid(raw, e))?;
            Ok(Value::Dimension(complex(number, unit as u8)))
        } else if let Some(fraction) = group("fraction") {
            let number: f64 = fraction
                .trim_end_matches('%')
                .parse()
                .map_err(|e| invalid(raw, e))?;
            Ok(Value::Fraction(complex(number, FRACTION_UNIT)))
        } else if let Some(color) = group("color") {
            parse_color(raw, &color[1..]).map(Value::Color)
        } else if group("named_reference").is_some() {
            Err(Error::UnsupportedValue {
                raw: raw.to_string(),
                reason: "named resource references",
            })
        } else if group("named_attribute").is_some() {
            Err(Error::UnsupportedValue {
                raw: raw.to_string(),
                reason: "named attribute references",
            })
        } else {
            Ok(Value::String(raw.to_string()))
        }
    }

    /// The wire type tag.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Null => ValueType::Null,
            Value::Reference(_) => ValueType::Reference,
            Value::Attribute(_) => ValueType::Attribute,
            Value::Boolean(_) => ValueType::IntBoolean,
            Value::Int(_) => ValueType::IntDec,
            Value::Hex(_) => ValueType::IntHex,
            Value::Float(_) => ValueType::Float,
            Value::Dimension(_) => ValueType::Dimension,
            Value::Fraction(_) => ValueType::Fraction,
            Value::Color(_) => ValueType::IntColorArgb8,
            Value::String(_) => ValueType::String,
        }
    }

    /// The string form, for string values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// The 32-bit payload. String payloads are pool indices.
    pub fn data(&self, pool: &StringPool) -> Result<u32> {
        Ok(match *self {
            Value::Null => 0,
            Value::Reference(id) | Value::Attribute(id) => id,
            Value::Boolean(flag) => u32::from(flag),
            Value::Int(n) => n as u32,
            Value::Hex(n) | Value::Color(n) => n,
            Value::Float(f) => f.to_bits(),
            Value::Dimension(packed) | Value::Fraction(packed) => packed,
            Value::String(ref text) => pool.index(None, text)? as u32,
        })
    }
}

fn invalid(raw: &str, err: impl std::fmt::Display) -> Error {
    Error::InvalidValue {
        raw: raw.to_string(),
        reason: err.to_string(),
    }
}

fn parse_hex(raw: &str, digits: &str) -> Result<u32> {
    u32::from_str_radix(digits, 16).map_err(|e| invalid(raw, e))
}

/// Parse `RGB`, `ARGB`, `RRGGBB` or `AARRGGBB` into ARGB8.
fn parse_color(raw: &str, digits: &str) -> Result<u32> {
    let value = parse_hex(raw, digits)?;
    let nibble = |shift: u32| ((value >> shift) & 0xF) * 0x11;
    Ok(match digits.len() {
        3 => 0xFF00_0000 | nibble(8) << 16 | nibble(4) << 8 | nibble(0),
        4 => nibble(12) << 24 | nibble(8) << 16 | nibble(4) << 8 | nibble(0),
        6 => 0xFF00_0000 | value,
        _ => value,
    })
}

/// The 8-byte value entry at the end of an attribute.
#[derive(Debug, Clone)]
pub struct ValueChunk {
    header: Header,
    value: Value,
}

impl ValueChunk {
    /// Classify `raw` and register a resulting string in the pool.
    pub fn new(raw: &str, ctx: &mut BuildContext<'_>) -> Result<Self> {
        let value = Value::parse(raw)?;
        if let Value::String(text) = &value {
            ctx.register(None, text)?;
        }
        Ok(Self {
            header: Header::empty(),
            value,
        })
    }

    /// The classified value.
    pub fn value(&self) -> &Value {
        &self.value
    }
}

impl Chunk for ValueChunk {
    fn header(&self) -> &Header {
        &self.header
    }

    fn header_mut(&mut self) -> &mut Header {
        &mut self.header
    }

    fn compute_size(&mut self) -> u32 {
        u32::from(VALUE_SIZE)
    }

    fn write_body<W: Write>(&self, w: &mut BinaryWriter<W>, pool: &StringPool) -> Result<()> {
        w.write_u16(VALUE_SIZE)?;
        w.write_u8(0)?;
        w.write_u8(self.value.value_type().code())?;
        w.write_u32(self.value.data(pool)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::NoResolver;

    fn parse(raw: &str) -> Value {
        Value::parse(raw).unwrap()
    }

    #[test]
    fn test_simple_forms() {
        assert_eq!(parse("@null"), Value::Null);
        assert_eq!(parse("@7f040001"), Value::Reference(0x7f04_0001));
        assert_eq!(parse("?01010036"), Value::Attribute(0x0101_0036));
        assert_eq!(parse("true"), Value::Boolean(true));
        assert_eq!(parse("false"), Value::Boolean(false));
        assert_eq!(parse("-42"), Value::Int(-42));
        assert_eq!(parse("+7"), Value::Int(7));
        assert_eq!(parse("0x1F"), Value::Hex(0x1F));
        assert_eq!(parse("0xFFFFFFFF"), Value::Hex(0xFFFF_FFFF));
        assert_eq!(parse("1.5"), Value::Float(1.5));
    }

    #[test]
    fn test_strings() {
        assert_eq!(parse(""), Value::String(String::new()));
        assert_eq!(parse("hello world"), Value::String("hello world".into()));
        assert_eq!(parse("True"), Value::String("True".into()));
        assert_eq!(parse("!string!123"), Value::String("123".into()));
        assert_eq!(parse("!str!true"), Value::String("true".into()));
        assert_eq!(parse("!@null"), Value::String("@null".into()));
        assert_eq!(parse("a!b"), Value::String("a!b".into()));
    }

    #[test]
    fn test_unsupported_forms() {
        for raw in ["@string/app_name", "@+id/button", "@android:color/white", "?attr/colorAccent", "?android:attr/textColor", "!int!5"] {
            assert!(
                matches!(Value::parse(raw), Err(Error::UnsupportedValue { raw: r, .. }) if r == raw),
                "{raw}"
            );
        }
    }

    #[test]
    fn test_out_of_range_numbers() {
        assert!(matches!(Value::parse("2147483648"), Err(Error::InvalidValue { .. })));
        assert!(matches!(Value::parse("0x100000000"), Err(Error::InvalidValue { .. })));
        assert!(matches!(Value::parse("0xZZ"), Err(Error::InvalidValue { .. })));
        assert_eq!(parse("-2147483648"), Value::Int(i32::MIN));
    }

    #[test]
    fn test_colors() {
        assert_eq!(parse("#FF0000"), Value::Color(0xFFFF_0000));
        assert_eq!(parse("#80FF0000"), Value::Color(0x80FF_0000));
        assert_eq!(parse("#f00"), Value::Color(0xFFFF_0000));
        assert_eq!(parse("#8f0a"), Value::Color(0x88FF_00AA));
        assert_eq!(parse("#12345"), Value::String("#12345".into()));
    }

    #[test]
    fn test_dimensions_and_fractions() {
        assert_eq!(parse("10dp"), Value::Dimension((327_680 << 8) | (2 << 4) | 1));
        assert_eq!(parse("10dip"), parse("10dp"));
        assert_eq!(parse("12sp"), Value::Dimension(complex(12.0, DimensionUnit::Sp as u8)));
        assert_eq!(parse("1.5mm"), Value::Dimension(complex(1.5, DimensionUnit::Mm as u8)));
        assert_eq!(parse("50%"), Value::Fraction(complex(50.0, FRACTION_UNIT)));
        assert_eq!(parse("10em"), Value::String("10em".into()));
    }

    #[test]
    fn test_complex_bands() {
        assert_eq!(complex(0.5, 0), 0x4000_0030);
        assert_eq!(complex(1.0, 0), 0x0080_0020);
        assert_eq!(complex(-1.0, 0), 0xFF80_0020);
        assert_eq!(complex(255.5, 0), (8_372_224 << 8) | 0x20);
        assert_eq!(complex(256.0, 0), 0x0080_0010);
        assert_eq!(complex(65535.0, 0), ((65535 * 128) << 8) | 0x10);
        assert_eq!(complex(65536.0, 0), 0x0100_0000);
        assert_eq!(complex(0.0, 1), 0x31);
    }

    #[test]
    fn test_complex_bands_negative() {
        assert_eq!(complex(-0.5, 0), 0xC000_0030);
        assert_eq!(complex(-255.5, 0), 0x8040_0020);
        assert_eq!(complex(-256.0, 0), 0xFF80_0010);
        assert_eq!(complex(-65535.0, 0), 0x8000_8010);
        assert_eq!(complex(-65536.0, 0), 0xFF00_0000);
        assert_eq!(complex(-10.0, 1) & 0xF, 1);
    }

    #[test]
    fn test_complex_decodes_back() {
        use crate::parser::complex_to_float;

        for value in [
            0.5, -0.5, 1.0, -1.0, 255.5, -255.5, 256.0, -256.0, 65535.0, -65535.0, 65536.0, -65536.0,
        ] {
            assert_eq!(complex_to_float(complex(value, 0)), value as f32, "{value}");
        }
    }

    #[test]
    fn test_value_chunk_layout() {
        let mut pool = StringPool::default();
        let mut ctx = BuildContext::new(&mut pool, &NoResolver);
        let mut color = ValueChunk::new("#FF0000", &mut ctx).unwrap();
        let mut text = ValueChunk::new("hello", &mut ctx).unwrap();
        let mut empty = ValueChunk::new("", &mut ctx).unwrap();
        pool.calc();

        let mut w = BinaryWriter::new(Vec::new());
        color.write(&mut w, &pool).unwrap();
        text.write(&mut w, &pool).unwrap();
        empty.write(&mut w, &pool).unwrap();

        assert_eq!(
            w.into_inner(),
            [
                8, 0, 0, 0x1c, 0x00, 0x00, 0xFF, 0xFF, //
                8, 0, 0, 0x03, 0x00, 0x00, 0x00, 0x00, //
                8, 0, 0, 0x03, 0xFF, 0xFF, 0xFF, 0xFF,
            ]
        );
    }

    #[test]
    fn test_value_type_codes() {
        assert_eq!(ValueType::from_code(0x1c), Some(ValueType::IntColorArgb8));
        assert_eq!(ValueType::from_code(0x09), None);
        assert_eq!(parse("3").value_type().code(), 0x10);
    }
}
