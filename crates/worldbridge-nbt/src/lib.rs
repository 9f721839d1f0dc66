use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::collections::HashMap;
use std::fmt;
use std::io::{self, Read, Write};

/// Nesting limit when reading binary trees.
pub const MAX_DEPTH: usize = 512;

/// Upper bound on capacity reserved from a declared length before the
/// elements have actually been read.
const PREALLOC_LIMIT: usize = 4096;

/// The stable tag tree. Compounds are unordered; lists keep element order and
/// hold a single element kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    End,
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<i8>),
    String(String),
    List(Vec<Tag>),
    Compound(HashMap<String, Tag>),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

/// Discriminant of a [`Tag`], numbered as in the binary format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    End = 0,
    Byte = 1,
    Short = 2,
    Int = 3,
    Long = 4,
    Float = 5,
    Double = 6,
    ByteArray = 7,
    String = 8,
    List = 9,
    Compound = 10,
    IntArray = 11,
    LongArray = 12,
}

impl TagKind {
    pub fn from_id(id: u8) -> Option<TagKind> {
        Some(match id {
            0 => TagKind::End,
            1 => TagKind::Byte,
            2 => TagKind::Short,
            3 => TagKind::Int,
            4 => TagKind::Long,
            5 => TagKind::Float,
            6 => TagKind::Double,
            7 => TagKind::ByteArray,
            8 => TagKind::String,
            9 => TagKind::List,
            10 => TagKind::Compound,
            11 => TagKind::IntArray,
            12 => TagKind::LongArray,
            _ => return None,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            TagKind::End => "TAG_End",
            TagKind::Byte => "TAG_Byte",
            TagKind::Short => "TAG_Short",
            TagKind::Int => "TAG_Int",
            TagKind::Long => "TAG_Long",
            TagKind::Float => "TAG_Float",
            TagKind::Double => "TAG_Double",
            TagKind::ByteArray => "TAG_Byte_Array",
            TagKind::String => "TAG_String",
            TagKind::List => "TAG_List",
            TagKind::Compound => "TAG_Compound",
            TagKind::IntArray => "TAG_Int_Array",
            TagKind::LongArray => "TAG_Long_Array",
        }
    }
}

impl fmt::Display for TagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn invalid_data(msg: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg)
}

fn read_len<R: Read>(reader: &mut R) -> io::Result<usize> {
    let length = reader.read_i32::<BigEndian>()?;
    usize::try_from(length).map_err(|_| invalid_data(format!("Negative length: {}", length)))
}

fn read_elements<R, T, F>(reader: &mut R, mut read_one: F) -> io::Result<Vec<T>>
where
    R: Read,
    F: FnMut(&mut R) -> io::Result<T>,
{
    let length = read_len(reader)?;
    let mut values = Vec::with_capacity(length.min(PREALLOC_LIMIT));
    for _ in 0..length {
        values.push(read_one(reader)?);
    }
    Ok(values)
}

fn write_str<W: Write>(writer: &mut W, value: &str) -> io::Result<()> {
    let length = u16::try_from(value.len())
        .map_err(|_| invalid_data(format!("String too long: {} bytes", value.len())))?;
    writer.write_u16::<BigEndian>(length)?;
    writer.write_all(value.as_bytes())
}

fn read_str<R: Read>(reader: &mut R) -> io::Result<String> {
    let length = reader.read_u16::<BigEndian>()?;
    let mut bytes = vec![0u8; length as usize];
    reader.read_exact(&mut bytes)?;
    String::from_utf8(bytes).map_err(|e| invalid_data(e.to_string()))
}

impl Tag {
    pub fn kind(&self) -> TagKind {
        match self {
            Tag::End => TagKind::End,
            Tag::Byte(_) => TagKind::Byte,
            Tag::Short(_) => TagKind::Short,
            Tag::Int(_) => TagKind::Int,
            Tag::Long(_) => TagKind::Long,
            Tag::Float(_) => TagKind::Float,
            Tag::Double(_) => TagKind::Double,
            Tag::ByteArray(_) => TagKind::ByteArray,
            Tag::String(_) => TagKind::String,
            Tag::List(_) => TagKind::List,
            Tag::Compound(_) => TagKind::Compound,
            Tag::IntArray(_) => TagKind::IntArray,
            Tag::LongArray(_) => TagKind::LongArray,
        }
    }

    pub fn get_type_id(&self) -> u8 {
        self.kind() as u8
    }

    /// Builds a list, refusing mixed element kinds.
    pub fn list(elements: Vec<Tag>) -> Option<Tag> {
        match elements.first() {
            Some(first) => {
                let kind = first.kind();
                elements
                    .iter()
                    .all(|e| e.kind() == kind)
                    .then_some(Tag::List(elements))
            }
            None => Some(Tag::List(elements)),
        }
    }

    pub fn compound<K, I>(entries: I) -> Tag
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Tag)>,
    {
        Tag::Compound(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Element kind of a list, `None` for empty lists and non-lists.
    pub fn element_kind(&self) -> Option<TagKind> {
        self.as_list().and_then(|l| l.first()).map(Tag::kind)
    }

    /// Checks list homogeneity through the whole tree.
    pub fn is_well_formed(&self) -> bool {
        match self {
            Tag::List(elements) => {
                let kind = elements.first().map(Tag::kind);
                elements
                    .iter()
                    .all(|e| Some(e.kind()) == kind && e.is_well_formed())
            }
            Tag::Compound(map) => map.values().all(Tag::is_well_formed),
            _ => true,
        }
    }

    pub fn read<R: Read>(reader: &mut R) -> io::Result<(String, Tag)> {
        Tag::read_named(reader, 0)
    }

    fn read_named<R: Read>(reader: &mut R, depth: usize) -> io::Result<(String, Tag)> {
        let type_id = reader.read_u8()?;
        if type_id == 0 {
            return Ok(("".to_owned(), Tag::End));
        }

        let name = read_str(reader)?;
        let tag = Tag::read_payload(reader, type_id, depth)?;
        Ok((name, tag))
    }

    fn read_payload<R: Read>(reader: &mut R, type_id: u8, depth: usize) -> io::Result<Tag> {
        if depth > MAX_DEPTH {
            return Err(invalid_data(format!("Tag nested deeper than {}", MAX_DEPTH)));
        }
        let kind = TagKind::from_id(type_id)
            .ok_or_else(|| invalid_data(format!("Invalid tag type: {}", type_id)))?;
        match kind {
            TagKind::End => Ok(Tag::End),
            TagKind::Byte => Ok(Tag::Byte(reader.read_i8()?)),
            TagKind::Short => Ok(Tag::Short(reader.read_i16::<BigEndian>()?)),
            TagKind::Int => Ok(Tag::Int(reader.read_i32::<BigEndian>()?)),
            TagKind::Long => Ok(Tag::Long(reader.read_i64::<BigEndian>()?)),
            TagKind::Float => Ok(Tag::Float(reader.read_f32::<BigEndian>()?)),
            TagKind::Double => Ok(Tag::Double(reader.read_f64::<BigEndian>()?)),
            TagKind::ByteArray => read_elements(reader, |r| r.read_i8()).map(Tag::ByteArray),
            TagKind::String => read_str(reader).map(Tag::String),
            TagKind::List => {
                let list_type = reader.read_u8()?;
                let length = read_len(reader)?;
                if list_type == 0 && length > 0 {
                    return Err(invalid_data(format!(
                        "List of {} elements declares TAG_End",
                        length
                    )));
                }
                let mut list = Vec::with_capacity(length.min(PREALLOC_LIMIT));
                for _ in 0..length {
                    list.push(Tag::read_payload(reader, list_type, depth + 1)?);
                }
                Ok(Tag::List(list))
            }
            TagKind::Compound => {
                let mut compound = HashMap::new();
                loop {
                    let (name, tag) = Tag::read_named(reader, depth + 1)?;
                    if let Tag::End = tag {
                        break;
                    }
                    compound.insert(name, tag);
                }
                Ok(Tag::Compound(compound))
            }
            TagKind::IntArray => {
                read_elements(reader, |r| r.read_i32::<BigEndian>()).map(Tag::IntArray)
            }
            TagKind::LongArray => {
                read_elements(reader, |r| r.read_i64::<BigEndian>()).map(Tag::LongArray)
            }
        }
    }

    pub fn write<W: Write>(&self, writer: &mut W, name: &str) -> io::Result<()> {
        writer.write_u8(self.get_type_id())?;

        if !matches!(self, Tag::End) {
            write_str(writer, name)?;
        }

        self.write_payload(writer)
    }

    fn write_payload<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        match self {
            Tag::End => Ok(()),
            Tag::Byte(v) => writer.write_i8(*v),
            Tag::Short(v) => writer.write_i16::<BigEndian>(*v),
            Tag::Int(v) => writer.write_i32::<BigEndian>(*v),
            Tag::Long(v) => writer.write_i64::<BigEndian>(*v),
            Tag::Float(v) => writer.write_f32::<BigEndian>(*v),
            Tag::Double(v) => writer.write_f64::<BigEndian>(*v),
            Tag::ByteArray(v) => {
                writer.write_i32::<BigEndian>(v.len() as i32)?;
                for &b in v {
                    writer.write_i8(b)?;
                }
                Ok(())
            }
            Tag::String(v) => write_str(writer, v),
            Tag::List(v) => {
                let element_type = v.first().map(Tag::get_type_id).unwrap_or(0); // TAG_End for empty lists
                if v.iter().any(|t| t.get_type_id() != element_type) {
                    return Err(invalid_data("List elements differ in kind".to_owned()));
                }
                writer.write_u8(element_type)?;
                writer.write_i32::<BigEndian>(v.len() as i32)?;
                for tag in v {
                    tag.write_payload(writer)?;
                }
                Ok(())
            }
            Tag::Compound(v) => {
                for (name, tag) in v {
                    tag.write(writer, name)?;
                }
                Tag::End.write(writer, "")?;
                Ok(())
            }
            Tag::IntArray(v) => {
                writer.write_i32::<BigEndian>(v.len() as i32)?;
                for &i in v {
                    writer.write_i32::<BigEndian>(i)?;
                }
                Ok(())
            }
            Tag::LongArray(v) => {
                writer.write_i32::<BigEndian>(v.len() as i32)?;
                for &l in v {
                    writer.write_i64::<BigEndian>(l)?;
                }
                Ok(())
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Tag> {
        self.as_compound().and_then(|map| map.get(key))
    }

    pub fn as_compound(&self) -> Option<&HashMap<String, Tag>> {
        match self {
            Tag::Compound(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_compound_mut(&mut self) -> Option<&mut HashMap<String, Tag>> {
        match self {
            Tag::Compound(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&Vec<Tag>> {
        match self {
            Tag::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&String> {
        match self {
            Tag::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Tag::Long(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Tag::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_i16(&self) -> Option<i16> {
        match self {
            Tag::Short(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_i8(&self) -> Option<i8> {
        match self {
            Tag::Byte(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Tag::Double(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Tag::Float(n) => Some(*n),
            _ => None,
        }
    }
}

// NBTFile is a named root tag as stored on disk, optionally gzip-compressed
pub struct NBTFile {
    pub root: Tag,
    pub name: String,
}

impl NBTFile {
    pub fn new(name: String, root: Tag) -> Self {
        NBTFile { root, name }
    }

    pub fn read<R: Read>(reader: &mut R) -> io::Result<Self> {
        let (name, root) = Tag::read(reader)?;
        Ok(NBTFile { root, name })
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        self.root.write(writer, &self.name)
    }

    pub fn read_gzip<R: Read>(reader: &mut R) -> io::Result<Self> {
        let mut decoder = GzDecoder::new(reader);
        Self::read(&mut decoder)
    }

    pub fn write_gzip<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let mut encoder = GzEncoder::new(writer, Compression::default());
        self.write(&mut encoder)?;
        encoder.finish()?;
        Ok(())
    }
}
