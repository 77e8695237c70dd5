use std::collections::{HashMap, HashSet};

use crate::{
    generator::{
        code_generator_trait::CodeGenOptions,
        types::{BinaryEncoding, Cardinality, DataType},
    },
    parser::types::{Occurs, QualifiedName, SimpleVariety},
    resolver::{DeclKey, DeclKind, Declaration, Primitive, ResolvedDescription},
};

/// Rust keywords that have to be escaped when a WSDL name mangles onto them.
const KEYWORDS: &[&str] = &[
    "as", "async", "await", "box", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "self", "static", "struct", "super", "trait", "true", "type",
    "union", "unsafe", "use", "where", "while", "yield",
];

pub(crate) fn is_keyword(name: &str) -> bool {
    KEYWORDS.contains(&name)
}

/// Splits a raw XML name into words at non-alphanumeric boundaries and at
/// lower-to-upper case changes.
fn split_words(raw: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut previous_lower = false;

    for c in raw.chars() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            previous_lower = false;
            continue;
        }

        if c.is_uppercase() && previous_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }

        previous_lower = c.is_lowercase() || c.is_numeric();
        current.push(c);
    }

    if !current.is_empty() {
        words.push(current);
    }

    words
}

/// UpperCamelCase identifier for a type name.
pub(crate) fn as_type_name(raw: &str) -> String {
    let mut name = String::new();

    for word in split_words(raw) {
        let mut chars = word.chars();

        if let Some(first) = chars.next() {
            name.extend(first.to_uppercase());
            name.push_str(chars.as_str());
        }
    }

    if name.is_empty() {
        name.push_str("Unnamed");
    }

    if name.starts_with(|c: char| c.is_numeric()) {
        name.insert(0, '_');
    }

    name
}

/// lowerCamelCase identifier for members and operations, keyword-escaped
/// with a leading underscore.
pub(crate) fn as_member_name(raw: &str) -> String {
    let mut name = String::new();

    for (index, word) in split_words(raw).into_iter().enumerate() {
        let mut chars = word.chars();

        if let Some(first) = chars.next() {
            if index == 0 {
                name.extend(first.to_lowercase());
            } else {
                name.extend(first.to_uppercase());
            }
            name.push_str(chars.as_str());
        }
    }

    if name.is_empty() {
        name.push_str("value");
    }

    if name.starts_with(|c: char| c.is_numeric()) || is_keyword(&name) {
        name.insert(0, '_');
    }

    name
}

/// FNV-1a over the namespace URI. A stable suffix source for collisions:
/// the standard library hasher is seeded per process, which would break
/// byte-identical output across runs.
pub(crate) fn namespace_hash(namespace: &str) -> String {
    let mut hash: u32 = 0x811c_9dc5;

    for byte in namespace.bytes() {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(0x0100_0193);
    }

    format!("{hash:08x}")
}

/// Assigns every declaration its mangled identifier. Collisions after
/// mangling take a suffix: the prefix the caller configured for the
/// namespace when there is one, the namespace hash otherwise.
pub(crate) struct NameTable {
    names: HashMap<DeclKey, String>,
    used: HashMap<String, DeclKey>,
}

impl NameTable {
    pub(crate) fn build(resolved: &ResolvedDescription, options: &CodeGenOptions) -> Self {
        let mut table = Self {
            names: HashMap::new(),
            used: HashMap::new(),
        };

        for component in &resolved.components {
            for member in &component.members {
                table.assign(member.key().clone(), options);
            }
        }

        table
    }

    fn assign(&mut self, key: DeclKey, options: &CodeGenOptions) {
        if self.names.contains_key(&key) {
            return;
        }

        let base = as_type_name(&key.1.local);

        let mut candidate = base.clone();

        if self.is_taken(&candidate, &key) {
            let suffix = options
                .namespace_prefixes
                .iter()
                .find(|(namespace, _)| *namespace == key.1.namespace)
                .map(|(_, prefix)| as_type_name(prefix))
                .unwrap_or_else(|| namespace_hash(&key.1.namespace));

            candidate = format!("{base}{suffix}");
        }

        let mut counter = 1;
        while self.is_taken(&candidate, &key) {
            counter += 1;
            candidate = format!("{base}{counter}");
        }

        self.used.insert(candidate.clone(), key.clone());
        self.names.insert(key, candidate);
    }

    fn is_taken(&self, candidate: &str, key: &DeclKey) -> bool {
        self.used.get(candidate).is_some_and(|owner| owner != key)
    }

    pub(crate) fn get(&self, key: &DeclKey) -> Option<&str> {
        self.names.get(key).map(String::as_str)
    }

    /// Reserves a name for a synthesized declaration (inline choice enums).
    /// Collisions take a monotonic counter.
    pub(crate) fn claim(&mut self, base: &str, key: DeclKey) -> String {
        let mut candidate = base.to_owned();
        let mut counter = 1;

        while self.used.contains_key(&candidate) {
            counter += 1;
            candidate = format!("{base}{counter}");
        }

        self.used.insert(candidate.clone(), key.clone());
        self.names.insert(key, candidate.clone());

        candidate
    }
}

pub(crate) fn primitive_data_type(primitive: Primitive) -> DataType {
    match primitive {
        Primitive::Boolean => DataType::Boolean,
        Primitive::DateTime => DataType::DateTime,
        Primitive::Date => DataType::Date,
        Primitive::Time => DataType::Time,
        Primitive::Decimal => DataType::Decimal,
        Primitive::Double => DataType::Double,
        Primitive::Float => DataType::Float,
        Primitive::HexBinary => DataType::Binary(BinaryEncoding::Hex),
        Primitive::Base64Binary => DataType::Binary(BinaryEncoding::Base64),
        Primitive::Byte => DataType::ShortInteger,
        Primitive::Short => DataType::SmallInteger,
        Primitive::Int => DataType::Integer,
        Primitive::Long => DataType::LongInteger,
        Primitive::UnsignedByte => DataType::UnsignedShortInteger,
        Primitive::UnsignedShort => DataType::UnsignedSmallInteger,
        Primitive::UnsignedInt => DataType::UnsignedInteger,
        Primitive::UnsignedLong => DataType::UnsignedLongInteger,
        Primitive::String => DataType::String,
        Primitive::Uri => DataType::Uri,
        Primitive::QName => DataType::QName,
        Primitive::Any => DataType::String,
    }
}

/// Follows restriction chains down to the built-in primitive, if any.
pub(crate) fn resolve_primitive(
    resolved: &ResolvedDescription,
    name: &QualifiedName,
) -> Option<Primitive> {
    let mut current = name.clone();
    let mut seen = HashSet::new();

    loop {
        if !seen.insert(current.clone()) {
            return None;
        }

        match resolved.declaration(DeclKind::Type, &current)? {
            Declaration::Builtin(primitive) => return Some(*primitive),
            Declaration::Simple(decl) => match &decl.variety {
                SimpleVariety::Restriction { base, .. } => current = base.clone(),
                _ => return None,
            },
            _ => return None,
        }
    }
}

/// The lowered data type of a reference to the given type declaration.
pub(crate) fn field_data_type(
    resolved: &ResolvedDescription,
    names: &NameTable,
    name: &QualifiedName,
) -> Option<DataType> {
    let key = (DeclKind::Type, name.clone());

    match resolved.declaration(DeclKind::Type, name)? {
        Declaration::Builtin(primitive) => Some(primitive_data_type(*primitive)),
        Declaration::Simple(decl) => {
            let mangled = names.get(&key)?.to_owned();

            match &decl.variety {
                SimpleVariety::Restriction { base, facets } => {
                    if !facets.enumerations.is_empty()
                        && resolve_primitive(resolved, base) == Some(Primitive::String)
                    {
                        Some(DataType::Enumeration(mangled))
                    } else {
                        Some(DataType::Alias(mangled))
                    }
                }
                SimpleVariety::List { item_type } => Some(DataType::InlineList(Box::new(
                    field_data_type(resolved, names, item_type)?,
                ))),
                SimpleVariety::Union { .. } => Some(DataType::Union(mangled)),
            }
        }
        Declaration::Complex(_) => Some(DataType::Custom(names.get(&key)?.to_owned())),
        _ => None,
    }
}

/// The cardinality table: lists beat optionality, minOccurs=0 and nillable
/// both lower to an optional.
pub(crate) fn lower_cardinality(min_occurs: u32, max_occurs: Occurs, nillable: bool) -> Cardinality {
    if max_occurs.is_multiple() {
        Cardinality::List
    } else if min_occurs == 0 || nillable {
        Cardinality::Optional
    } else {
        Cardinality::Required
    }
}
