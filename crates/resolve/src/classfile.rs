//! Reader for compiled module descriptors (`module-info.class`).
//!
//! Only the constant pool and the `Module` and `ModuleMainClass` attributes
//! are interpreted; everything else is skipped.

use modsmith_core::{ModuleDescriptor, ModuleRequires, RequiresModifier, Version};
use std::fmt;

const MAGIC: u32 = 0xCAFE_BABE;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassFormatError(String);

impl fmt::Display for ClassFormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

type ParseResult<T> = std::result::Result<T, ClassFormatError>;

fn malformed<T>(message: impl Into<String>) -> ParseResult<T> {
    Err(ClassFormatError(message.into()))
}

#[derive(Debug, Clone)]
enum Constant {
    Utf8(String),
    Class(u16),
    Module(u16),
    Package(u16),
    Other,
    /// Second slot of a long or double
    Unusable,
}

struct Reader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    fn take(&mut self, count: usize) -> ParseResult<&'a [u8]> {
        let end = self.position + count;
        if end > self.bytes.len() {
            return malformed(format!("truncated class file at offset {}", self.position));
        }
        let slice = &self.bytes[self.position..end];
        self.position = end;
        Ok(slice)
    }

    fn u8(&mut self) -> ParseResult<u8> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> ParseResult<u16> {
        let bytes = self.take(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    fn u32(&mut self) -> ParseResult<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn skip(&mut self, count: usize) -> ParseResult<()> {
        self.take(count).map(|_| ())
    }
}

struct ConstantPool(Vec<Constant>);

impl ConstantPool {
    fn read(reader: &mut Reader<'_>) -> ParseResult<Self> {
        let count = reader.u16()? as usize;
        let mut constants = vec![Constant::Unusable];
        while constants.len() < count {
            let tag = reader.u8()?;
            let constant = match tag {
                1 => {
                    let length = reader.u16()? as usize;
                    Constant::Utf8(String::from_utf8_lossy(reader.take(length)?).into_owned())
                }
                7 => Constant::Class(reader.u16()?),
                19 => Constant::Module(reader.u16()?),
                20 => Constant::Package(reader.u16()?),
                8 | 16 => {
                    reader.skip(2)?;
                    Constant::Other
                }
                15 => {
                    reader.skip(3)?;
                    Constant::Other
                }
                3 | 4 | 9 | 10 | 11 | 12 | 17 | 18 => {
                    reader.skip(4)?;
                    Constant::Other
                }
                5 | 6 => {
                    reader.skip(8)?;
                    constants.push(Constant::Other);
                    Constant::Unusable
                }
                other => return malformed(format!("unknown constant pool tag {other}")),
            };
            constants.push(constant);
        }
        Ok(Self(constants))
    }

    fn get(&self, index: u16) -> ParseResult<&Constant> {
        match self.0.get(index as usize) {
            Some(Constant::Unusable) | None => malformed(format!("invalid constant index {index}")),
            Some(constant) => Ok(constant),
        }
    }

    fn utf8(&self, index: u16) -> ParseResult<&str> {
        match self.get(index)? {
            Constant::Utf8(value) => Ok(value),
            _ => malformed(format!("constant {index} is not a UTF-8 entry")),
        }
    }

    fn optional_utf8(&self, index: u16) -> ParseResult<Option<&str>> {
        if index == 0 {
            return Ok(None);
        }
        self.utf8(index).map(Some)
    }

    fn module_name(&self, index: u16) -> ParseResult<&str> {
        match self.get(index)? {
            Constant::Module(name) => self.utf8(*name),
            _ => malformed(format!("constant {index} is not a module entry")),
        }
    }

    fn package_name(&self, index: u16) -> ParseResult<String> {
        match self.get(index)? {
            Constant::Package(name) => Ok(self.utf8(*name)?.replace('/', ".")),
            _ => malformed(format!("constant {index} is not a package entry")),
        }
    }

    fn class_name(&self, index: u16) -> ParseResult<String> {
        match self.get(index)? {
            Constant::Class(name) => Ok(self.utf8(*name)?.replace('/', ".")),
            _ => malformed(format!("constant {index} is not a class entry")),
        }
    }
}

fn skip_members(reader: &mut Reader<'_>) -> ParseResult<()> {
    let count = reader.u16()?;
    for _ in 0..count {
        reader.skip(6)?;
        skip_attributes(reader)?;
    }
    Ok(())
}

fn skip_attributes(reader: &mut Reader<'_>) -> ParseResult<()> {
    let count = reader.u16()?;
    for _ in 0..count {
        reader.skip(2)?;
        let length = reader.u32()? as usize;
        reader.skip(length)?;
    }
    Ok(())
}

fn parse_version(raw: Option<&str>) -> Option<Version> {
    raw.and_then(|raw| Version::parse(raw).ok())
}

fn read_module_attribute(
    reader: &mut Reader<'_>,
    pool: &ConstantPool,
) -> ParseResult<ModuleDescriptor> {
    let name = pool.module_name(reader.u16()?)?.to_string();
    let _flags = reader.u16()?;
    let version = parse_version(pool.optional_utf8(reader.u16()?)?);

    let mut descriptor = ModuleDescriptor::new(name);
    descriptor.version = version;

    let requires_count = reader.u16()?;
    for _ in 0..requires_count {
        let name = pool.module_name(reader.u16()?)?;
        let flags = reader.u16()?;
        let compiled = parse_version(pool.optional_utf8(reader.u16()?)?);
        descriptor.requires.push(ModuleRequires {
            name: name.to_string(),
            modifiers: RequiresModifier::from_flags(flags),
            compiled_version: compiled,
        });
    }

    let exports_count = reader.u16()?;
    for _ in 0..exports_count {
        let package = pool.package_name(reader.u16()?)?;
        let _flags = reader.u16()?;
        let targets = reader.u16()? as usize;
        reader.skip(targets * 2)?;
        descriptor.exports.push(package);
    }

    // opens, uses and provides
    let opens_count = reader.u16()?;
    for _ in 0..opens_count {
        reader.skip(4)?;
        let targets = reader.u16()? as usize;
        reader.skip(targets * 2)?;
    }
    let uses_count = reader.u16()? as usize;
    reader.skip(uses_count * 2)?;
    let provides_count = reader.u16()?;
    for _ in 0..provides_count {
        reader.skip(2)?;
        let with = reader.u16()? as usize;
        reader.skip(with * 2)?;
    }

    Ok(descriptor)
}

/// Parse the bytes of a `module-info.class` file
pub fn read_module_info(bytes: &[u8]) -> ParseResult<ModuleDescriptor> {
    let mut reader = Reader::new(bytes);
    if reader.u32()? != MAGIC {
        return malformed("not a class file");
    }
    reader.skip(4)?;
    let pool = ConstantPool::read(&mut reader)?;

    // access flags, this, super
    reader.skip(6)?;
    let interfaces = reader.u16()? as usize;
    reader.skip(interfaces * 2)?;
    skip_members(&mut reader)?;
    skip_members(&mut reader)?;

    let mut descriptor = None;
    let mut main_class = None;
    let attributes = reader.u16()?;
    for _ in 0..attributes {
        let name = pool.utf8(reader.u16()?)?.to_string();
        let length = reader.u32()? as usize;
        let body = reader.take(length)?;
        match name.as_str() {
            "Module" => {
                descriptor = Some(read_module_attribute(&mut Reader::new(body), &pool)?);
            }
            "ModuleMainClass" => {
                main_class = Some(pool.class_name(Reader::new(body).u16()?)?);
            }
            _ => {}
        }
    }

    match descriptor {
        Some(mut descriptor) => {
            descriptor.main_class = main_class;
            Ok(descriptor)
        }
        None => malformed("missing Module attribute"),
    }
}
