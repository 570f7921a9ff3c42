//! Type resolution: from Rust type names to OpenAPI schemas.
//!
//! [`SchemaParser`] is the capability the operation assembler depends on.
//! [`SourceSchemaParser`] implements it over a [`PackageLoader`], looking type
//! definitions up in the parsed packages and recording every named type it
//! meets in a [`TypeRegistry`].

use crate::annotation::doc_lines;
use crate::error::{Error, Result};
use crate::loader::{PackageAst, PackageInfo, PackageLoader};
use crate::openapi::SchemaObject;
use crate::registry::{Registration, TypeKey, TypeRegistry};
use log::{debug, warn};
use std::rc::Rc;
use syn::punctuated::Punctuated;

/// Schema resolution capability consumed by the operation assembler.
#[cfg_attr(test, mockall::automock)]
pub trait SchemaParser {
    /// Parsed syntax trees of the package at `pkg_path`.
    fn get_pkg_ast(&mut self, pkg_path: &str) -> Result<Rc<PackageAst>>;

    /// Registers a named type once and returns its component name.
    fn register_type(&mut self, pkg_path: &str, pkg_name: &str, type_name: &str) -> Result<String>;

    /// Expands a type expression into a schema.
    fn parse_schema_object(
        &mut self,
        pkg_path: &str,
        pkg_name: &str,
        type_name: &str,
    ) -> Result<SchemaObject>;
}

/// Primitive types supported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveType {
    String,
    Char,
    I8,
    I16,
    I32,
    I64,
    I128,
    Isize,
    U8,
    U16,
    U32,
    U64,
    U128,
    Usize,
    F32,
    F64,
    Bool,
    /// Annotation alias `int` / `integer`
    Integer,
    /// Annotation alias `number`
    Number,
    /// Uploaded file in a form
    File,
}

impl PrimitiveType {
    /// Parse a primitive type name, Rust spelling or annotation alias
    pub fn parse(type_name: &str) -> Option<Self> {
        match type_name {
            "String" | "str" | "string" => Some(PrimitiveType::String),
            "char" => Some(PrimitiveType::Char),
            "i8" => Some(PrimitiveType::I8),
            "i16" => Some(PrimitiveType::I16),
            "i32" | "int32" => Some(PrimitiveType::I32),
            "i64" | "int64" | "long" => Some(PrimitiveType::I64),
            "i128" => Some(PrimitiveType::I128),
            "isize" => Some(PrimitiveType::Isize),
            "u8" => Some(PrimitiveType::U8),
            "u16" => Some(PrimitiveType::U16),
            "u32" => Some(PrimitiveType::U32),
            "u64" => Some(PrimitiveType::U64),
            "u128" => Some(PrimitiveType::U128),
            "usize" => Some(PrimitiveType::Usize),
            "f32" | "float" | "float32" => Some(PrimitiveType::F32),
            "f64" | "double" | "float64" => Some(PrimitiveType::F64),
            "bool" | "boolean" => Some(PrimitiveType::Bool),
            "int" | "integer" => Some(PrimitiveType::Integer),
            "number" => Some(PrimitiveType::Number),
            "file" => Some(PrimitiveType::File),
            _ => None,
        }
    }

    /// Convert a primitive type to an OpenAPI schema
    pub fn to_schema(self) -> SchemaObject {
        let (schema_type, format) = match self {
            PrimitiveType::String | PrimitiveType::Char => ("string", None),
            PrimitiveType::I8
            | PrimitiveType::I16
            | PrimitiveType::I32
            | PrimitiveType::U8
            | PrimitiveType::U16
            | PrimitiveType::U32 => ("integer", Some("int32")),
            PrimitiveType::I64
            | PrimitiveType::I128
            | PrimitiveType::Isize
            | PrimitiveType::U64
            | PrimitiveType::U128
            | PrimitiveType::Usize => ("integer", Some("int64")),
            PrimitiveType::F32 => ("number", Some("float")),
            PrimitiveType::F64 => ("number", Some("double")),
            PrimitiveType::Bool => ("boolean", None),
            PrimitiveType::Integer => ("integer", None),
            PrimitiveType::Number => ("number", None),
            PrimitiveType::File => ("string", Some("binary")),
        };
        SchemaObject::primitive(schema_type, format)
    }
}

/// Types from common crates that map onto a primitive schema
fn well_known_schema(ident: &str) -> Option<SchemaObject> {
    match ident {
        "Value" => Some(SchemaObject::object()),
        "Uuid" => Some(SchemaObject::primitive("string", Some("uuid"))),
        "DateTime" | "NaiveDateTime" | "OffsetDateTime" | "SystemTime" => {
            Some(SchemaObject::primitive("string", Some("date-time")))
        }
        "NaiveDate" => Some(SchemaObject::primitive("string", Some("date"))),
        "Decimal" => Some(SchemaObject::primitive("number", None)),
        "PathBuf" => Some(SchemaObject::primitive("string", None)),
        _ => None,
    }
}

/// A type definition found in a package
#[derive(Debug, Clone)]
enum TypeDef {
    Struct(syn::ItemStruct),
    Enum(syn::ItemEnum),
    Alias(syn::ItemType),
}

impl TypeDef {
    fn attrs(&self) -> &[syn::Attribute] {
        match self {
            TypeDef::Struct(item) => &item.attrs,
            TypeDef::Enum(item) => &item.attrs,
            TypeDef::Alias(item) => &item.attrs,
        }
    }

    fn generics(&self) -> Vec<String> {
        let generics = match self {
            TypeDef::Struct(item) => &item.generics,
            TypeDef::Enum(item) => &item.generics,
            TypeDef::Alias(item) => &item.generics,
        };
        generics
            .type_params()
            .map(|param| param.ident.to_string())
            .collect()
    }
}

/// Where a definition lives
#[derive(Debug, Clone)]
struct Located {
    package_path: String,
    package_name: String,
    name: String,
    def: TypeDef,
}

impl Located {
    fn key(&self) -> TypeKey {
        TypeKey::new(&self.package_path, &self.package_name, &self.name)
    }
}

/// Resolution context: the package a type expression appears in
#[derive(Debug, Clone, Copy)]
struct Scope<'a> {
    package_path: &'a str,
    package_name: &'a str,
    /// Type parameters of the enclosing definition
    generics: &'a [String],
    /// Definition that `Self` refers to
    current: Option<&'a Located>,
}

/// Serde attributes that shape a schema
#[derive(Debug, Clone, Default, PartialEq)]
struct SerdeAttributes {
    rename: Option<String>,
    rename_all: Option<RenameRule>,
    skip: bool,
    flatten: bool,
    /// `skip_serializing_if` or `default`: the field may be absent
    omit_empty: bool,
}

impl SerdeAttributes {
    fn parse(attrs: &[syn::Attribute]) -> Self {
        let mut parsed = SerdeAttributes::default();

        for attr in attrs.iter().filter(|a| a.path().is_ident("serde")) {
            let metas = match attr
                .parse_args_with(Punctuated::<syn::Meta, syn::Token![,]>::parse_terminated)
            {
                Ok(metas) => metas,
                Err(e) => {
                    warn!("Ignoring unparsable serde attribute: {}", e);
                    continue;
                }
            };

            for meta in metas {
                match &meta {
                    syn::Meta::Path(path) => {
                        if path.is_ident("skip") || path.is_ident("skip_serializing") {
                            parsed.skip = true;
                        } else if path.is_ident("flatten") {
                            parsed.flatten = true;
                        } else if path.is_ident("default") {
                            parsed.omit_empty = true;
                        }
                    }
                    syn::Meta::NameValue(nv) => {
                        let path = &nv.path;
                        if path.is_ident("rename") {
                            parsed.rename = Self::string_value(&nv.value);
                        } else if path.is_ident("rename_all") {
                            parsed.rename_all =
                                Self::string_value(&nv.value).and_then(|v| RenameRule::parse(&v));
                        } else if path.is_ident("skip_serializing_if") || path.is_ident("default") {
                            parsed.omit_empty = true;
                        }
                    }
                    syn::Meta::List(list) => {
                        // rename(serialize = "...") / rename_all(serialize = "...")
                        let serialized = list
                            .parse_args_with(
                                Punctuated::<syn::MetaNameValue, syn::Token![,]>::parse_terminated,
                            )
                            .ok()
                            .and_then(|pairs| {
                                pairs
                                    .iter()
                                    .find(|nv| nv.path.is_ident("serialize"))
                                    .and_then(|nv| Self::string_value(&nv.value))
                            });
                        if list.path.is_ident("rename") {
                            parsed.rename = serialized;
                        } else if list.path.is_ident("rename_all") {
                            parsed.rename_all = serialized.and_then(|v| RenameRule::parse(&v));
                        }
                    }
                }
            }
        }

        parsed
    }

    fn string_value(expr: &syn::Expr) -> Option<String> {
        match expr {
            syn::Expr::Lit(syn::ExprLit {
                lit: syn::Lit::Str(s),
                ..
            }) => Some(s.value()),
            _ => None,
        }
    }
}

/// Container-level `rename_all` rules, as serde applies them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RenameRule {
    Lower,
    Upper,
    Pascal,
    Camel,
    Snake,
    ScreamingSnake,
    Kebab,
    ScreamingKebab,
}

impl RenameRule {
    fn parse(rule: &str) -> Option<Self> {
        match rule {
            "lowercase" => Some(RenameRule::Lower),
            "UPPERCASE" => Some(RenameRule::Upper),
            "PascalCase" => Some(RenameRule::Pascal),
            "camelCase" => Some(RenameRule::Camel),
            "snake_case" => Some(RenameRule::Snake),
            "SCREAMING_SNAKE_CASE" => Some(RenameRule::ScreamingSnake),
            "kebab-case" => Some(RenameRule::Kebab),
            "SCREAMING-KEBAB-CASE" => Some(RenameRule::ScreamingKebab),
            _ => None,
        }
    }

    /// Field names start out in snake_case.
    fn apply_to_field(self, field: &str) -> String {
        match self {
            RenameRule::Lower | RenameRule::Snake => field.to_string(),
            RenameRule::Upper | RenameRule::ScreamingSnake => field.to_ascii_uppercase(),
            RenameRule::Pascal => {
                let mut pascal = String::new();
                let mut capitalize = true;
                for c in field.chars() {
                    if c == '_' {
                        capitalize = true;
                    } else if capitalize {
                        pascal.push(c.to_ascii_uppercase());
                        capitalize = false;
                    } else {
                        pascal.push(c);
                    }
                }
                pascal
            }
            RenameRule::Camel => {
                let pascal = RenameRule::Pascal.apply_to_field(field);
                let mut chars = pascal.chars();
                match chars.next() {
                    Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
                    None => pascal,
                }
            }
            RenameRule::Kebab => field.replace('_', "-"),
            RenameRule::ScreamingKebab => field.to_ascii_uppercase().replace('_', "-"),
        }
    }

    /// Variant names start out in PascalCase.
    fn apply_to_variant(self, variant: &str) -> String {
        match self {
            RenameRule::Pascal => variant.to_string(),
            RenameRule::Lower => variant.to_ascii_lowercase(),
            RenameRule::Upper => variant.to_ascii_uppercase(),
            RenameRule::Camel => {
                let mut chars = variant.chars();
                match chars.next() {
                    Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
                    None => String::new(),
                }
            }
            RenameRule::Snake => {
                let mut snake = String::new();
                for (i, c) in variant.char_indices() {
                    if i > 0 && c.is_uppercase() {
                        snake.push('_');
                    }
                    snake.push(c.to_ascii_lowercase());
                }
                snake
            }
            RenameRule::ScreamingSnake => RenameRule::Snake
                .apply_to_variant(variant)
                .to_ascii_uppercase(),
            RenameRule::Kebab => RenameRule::Snake.apply_to_variant(variant).replace('_', "-"),
            RenameRule::ScreamingKebab => RenameRule::ScreamingSnake
                .apply_to_variant(variant)
                .replace('_', "-"),
        }
    }
}

/// One imported name from a `use` declaration
#[derive(Debug, Clone)]
enum UseLeaf {
    Name(String),
    Rename { original: String, alias: String },
    Glob,
}

fn flatten_use(tree: &syn::UseTree, prefix: &mut Vec<String>, out: &mut Vec<(Vec<String>, UseLeaf)>) {
    match tree {
        syn::UseTree::Path(path) => {
            prefix.push(path.ident.to_string());
            flatten_use(&path.tree, prefix, out);
            prefix.pop();
        }
        syn::UseTree::Name(name) => {
            out.push((prefix.clone(), UseLeaf::Name(name.ident.to_string())));
        }
        syn::UseTree::Rename(rename) => out.push((
            prefix.clone(),
            UseLeaf::Rename {
                original: rename.ident.to_string(),
                alias: rename.rename.to_string(),
            },
        )),
        syn::UseTree::Glob(_) => out.push((prefix.clone(), UseLeaf::Glob)),
        syn::UseTree::Group(group) => {
            for item in &group.items {
                flatten_use(item, prefix, out);
            }
        }
    }
}

/// Finds a struct, enum or type alias named `name`, descending into inline modules.
fn find_in_items(items: &[syn::Item], name: &str) -> Option<TypeDef> {
    for item in items {
        match item {
            syn::Item::Struct(item) if item.ident == name => {
                return Some(TypeDef::Struct(item.clone()))
            }
            syn::Item::Enum(item) if item.ident == name => return Some(TypeDef::Enum(item.clone())),
            syn::Item::Type(item) if item.ident == name => return Some(TypeDef::Alias(item.clone())),
            _ => {}
        }
    }
    items.iter().find_map(|item| match item {
        syn::Item::Mod(module) => module
            .content
            .as_ref()
            .and_then(|(_, items)| find_in_items(items, name)),
        _ => None,
    })
}

fn owned(packages: Vec<&PackageInfo>) -> Vec<PackageInfo> {
    packages.into_iter().cloned().collect()
}

/// Finds the items of an inline `mod <name> { ... }`.
fn find_inline_module<'a>(items: &'a [syn::Item], name: &str) -> Option<&'a [syn::Item]> {
    items.iter().find_map(|item| match item {
        syn::Item::Mod(module) => {
            let (_, inner) = module.content.as_ref()?;
            if module.ident == name {
                Some(inner.as_slice())
            } else {
                find_inline_module(inner, name)
            }
        }
        _ => None,
    })
}

/// Single generic type argument of a path segment, e.g. `T` in `Vec<T>`.
fn first_type_argument(segment: &syn::PathSegment) -> Option<&syn::Type> {
    match &segment.arguments {
        syn::PathArguments::AngleBracketed(args) => args.args.iter().find_map(|arg| match arg {
            syn::GenericArgument::Type(ty) => Some(ty),
            _ => None,
        }),
        _ => None,
    }
}

fn is_option(ty: &syn::Type) -> bool {
    match ty {
        syn::Type::Path(type_path) => type_path
            .path
            .segments
            .last()
            .is_some_and(|segment| segment.ident == "Option"),
        _ => false,
    }
}

/// Module segments and final ident of a path, generics dropped.
fn path_parts(path: &syn::Path) -> (Vec<String>, String) {
    let mut segments: Vec<String> = path.segments.iter().map(|s| s.ident.to_string()).collect();
    let name = segments.pop().unwrap_or_default();
    (segments, name)
}

fn doc_text(attrs: &[syn::Attribute]) -> Option<String> {
    let text = doc_lines(attrs)
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty() && !line.starts_with('@'))
        .collect::<Vec<_>>()
        .join(" ");
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn field_name(ident: &syn::Ident) -> String {
    let name = ident.to_string();
    name.strip_prefix("r#").map(str::to_string).unwrap_or(name)
}

/// Schema parser backed by the project's source code.
///
/// One instance belongs to one document run: the registry it owns starts
/// empty and is handed over with [`SourceSchemaParser::into_registry`].
pub struct SourceSchemaParser {
    loader: PackageLoader,
    registry: TypeRegistry,
    /// Definitions whose expansion is in progress, outermost first
    expanding: Vec<TypeKey>,
}

impl SourceSchemaParser {
    pub fn new(loader: PackageLoader) -> Self {
        debug!("Initializing SourceSchemaParser");
        Self {
            loader,
            registry: TypeRegistry::new(),
            expanding: Vec::new(),
        }
    }

    pub fn loader(&self) -> &PackageLoader {
        &self.loader
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn into_registry(self) -> TypeRegistry {
        self.registry
    }

    /// Looks `path` up as seen from the given package.
    fn locate(&mut self, pkg_path: &str, pkg_name: &str, path: &syn::Path) -> Result<Option<Located>> {
        let (modules, name) = path_parts(path);
        if !modules.is_empty() {
            return self.locate_qualified(pkg_path, pkg_name, &modules, &name);
        }

        if let Some(found) = self.find_in_package(pkg_path, pkg_name, &name)? {
            return Ok(Some(found));
        }

        // Not declared locally: follow the package's imports
        let ast = self.loader.get_pkg_ast(pkg_path)?;
        let mut imports = Vec::new();
        for file in ast.files.values() {
            for item in &file.items {
                if let syn::Item::Use(item_use) = item {
                    flatten_use(&item_use.tree, &mut Vec::new(), &mut imports);
                }
            }
        }

        for (modules, leaf) in imports {
            let target = match leaf {
                UseLeaf::Name(imported) if imported == name => imported,
                UseLeaf::Rename { original, alias } if alias == name => original,
                UseLeaf::Glob => name.clone(),
                _ => continue,
            };
            if let Some(found) = self.locate_qualified(pkg_path, pkg_name, &modules, &target)? {
                debug!("Resolved {} through import of {}", name, modules.join("::"));
                return Ok(Some(found));
            }
        }

        Ok(None)
    }

    fn locate_qualified(
        &mut self,
        pkg_path: &str,
        pkg_name: &str,
        modules: &[String],
        name: &str,
    ) -> Result<Option<Located>> {
        let module = modules
            .iter()
            .rev()
            .find(|m| !matches!(m.as_str(), "crate" | "self" | "super"));

        let Some(module) = module else {
            // `crate::T` and friends: the current package, then crate roots
            if let Some(found) = self.find_in_package(pkg_path, pkg_name, name)? {
                return Ok(Some(found));
            }
            return self.find_in_packages(owned(self.loader.find_by_name("src")), name);
        };

        if let Some(found) =
            self.find_in_packages(owned(self.loader.find_by_name(module)), name)?
        {
            return Ok(Some(found));
        }

        for package in owned(self.loader.find_by_file_stem(module)) {
            let ast = self.loader.get_pkg_ast(&package.path_str())?;
            let file_name = format!("{}.rs", module);
            if let Some(def) = ast
                .files
                .get(&file_name)
                .and_then(|file| find_in_items(&file.items, name))
            {
                return Ok(Some(Located {
                    package_path: package.path_str(),
                    package_name: package.name.clone(),
                    name: name.to_string(),
                    def,
                }));
            }
        }

        // Inline `mod m { ... }`: the current package first, then the rest
        let mut candidates = vec![(pkg_path.to_string(), pkg_name.to_string())];
        candidates.extend(
            self.loader
                .packages()
                .iter()
                .filter(|p| p.path_str() != pkg_path)
                .map(|p| (p.path_str(), p.name.clone())),
        );
        for (path, package_name) in candidates {
            let ast = self.loader.get_pkg_ast(&path)?;
            let def = ast.files.values().find_map(|file| {
                find_inline_module(&file.items, module).and_then(|items| find_in_items(items, name))
            });
            if let Some(def) = def {
                return Ok(Some(Located {
                    package_path: path,
                    package_name,
                    name: name.to_string(),
                    def,
                }));
            }
        }

        Ok(None)
    }

    fn find_in_packages(&mut self, packages: Vec<PackageInfo>, name: &str) -> Result<Option<Located>> {
        for package in packages {
            if let Some(found) = self.find_in_package(&package.path_str(), &package.name, name)? {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    fn find_in_package(&mut self, pkg_path: &str, pkg_name: &str, name: &str) -> Result<Option<Located>> {
        let ast = self.loader.get_pkg_ast(pkg_path)?;
        for file in ast.files.values() {
            if let Some(def) = find_in_items(&file.items, name) {
                debug!("Found {} in {}", name, pkg_path);
                return Ok(Some(Located {
                    package_path: pkg_path.to_string(),
                    package_name: pkg_name.to_string(),
                    name: name.to_string(),
                    def,
                }));
            }
        }
        Ok(None)
    }

    /// Registers a located definition, expanding it on first sight.
    fn register_located(&mut self, requested: Option<TypeKey>, located: &Located) -> Result<String> {
        let key = located.key();

        let name = match self.registry.reserve(key.clone()) {
            Registration::Existing(name) => name,
            Registration::Reserved(name) => {
                match self.expand_definition(located) {
                    Ok(schema) => self.registry.complete(&name, schema),
                    Err(e) => {
                        self.registry.withdraw(&key);
                        return Err(e);
                    }
                }
                name
            }
        };

        if let Some(requested) = requested {
            if requested != key {
                self.registry.alias(requested, &name);
            }
        }
        Ok(name)
    }

    fn expand_definition(&mut self, located: &Located) -> Result<SchemaObject> {
        debug!("Expanding {} from {}", located.name, located.package_path);
        self.expanding.push(located.key());
        let expanded = self.expand_body(located);
        self.expanding.pop();
        let mut schema = expanded?;

        if !schema.is_ref() && schema.description.is_none() {
            schema.description = doc_text(located.def.attrs());
        }
        Ok(schema)
    }

    fn expand_body(&mut self, located: &Located) -> Result<SchemaObject> {
        let generics = located.def.generics();
        let scope = Scope {
            package_path: &located.package_path,
            package_name: &located.package_name,
            generics: &generics,
            current: Some(located),
        };

        match &located.def {
            TypeDef::Struct(item) => self.expand_struct(scope, item),
            TypeDef::Enum(item) => Ok(Self::expand_enum(item)),
            TypeDef::Alias(item) => self.type_schema(scope, &item.ty, true),
        }
    }

    fn expand_struct(&mut self, scope: Scope<'_>, item: &syn::ItemStruct) -> Result<SchemaObject> {
        let container = SerdeAttributes::parse(&item.attrs);

        match &item.fields {
            syn::Fields::Named(named) => {
                let mut schema = SchemaObject::object();

                for field in &named.named {
                    let Some(ident) = &field.ident else { continue };
                    let attrs = SerdeAttributes::parse(&field.attrs);
                    if attrs.skip {
                        continue;
                    }

                    if attrs.flatten {
                        let flattened = self.type_schema(scope, &field.ty, true)?;
                        for (name, property) in flattened.properties.clone().unwrap_or_default() {
                            let required = flattened.is_required(&name);
                            schema.insert_property(name, property, required);
                        }
                        continue;
                    }

                    let raw_name = field_name(ident);
                    let name = match (&attrs.rename, container.rename_all) {
                        (Some(rename), _) => rename.clone(),
                        (None, Some(rule)) => rule.apply_to_field(&raw_name),
                        (None, None) => raw_name,
                    };

                    let mut property = self.type_schema(scope, &field.ty, false)?;
                    if !property.is_ref() {
                        property.description = doc_text(&field.attrs);
                    }

                    let required = !attrs.omit_empty && !is_option(&field.ty);
                    schema.insert_property(name, property, required);
                }

                debug!(
                    "Expanded struct {} with {} properties",
                    item.ident,
                    schema.properties.as_ref().map_or(0, |p| p.len())
                );
                Ok(schema)
            }
            syn::Fields::Unnamed(unnamed) if unnamed.unnamed.len() == 1 => {
                // Newtype structs serialize as their inner value
                self.type_schema(scope, &unnamed.unnamed[0].ty, false)
            }
            _ => Ok(SchemaObject::object()),
        }
    }

    fn expand_enum(item: &syn::ItemEnum) -> SchemaObject {
        let all_unit = item
            .variants
            .iter()
            .all(|v| matches!(v.fields, syn::Fields::Unit));
        if !all_unit {
            debug!("Enum {} has data variants, using object schema", item.ident);
            return SchemaObject::object();
        }

        let container = SerdeAttributes::parse(&item.attrs);
        let values = item
            .variants
            .iter()
            .filter_map(|variant| {
                let attrs = SerdeAttributes::parse(&variant.attrs);
                if attrs.skip {
                    return None;
                }
                let name = variant.ident.to_string();
                Some(match (attrs.rename, container.rename_all) {
                    (Some(rename), _) => rename,
                    (None, Some(rule)) => rule.apply_to_variant(&name),
                    (None, None) => name,
                })
            })
            .collect();

        SchemaObject {
            enum_values: Some(values),
            ..SchemaObject::primitive("string", None)
        }
    }

    /// Schema for a type expression. `inline` expands a named type in place;
    /// otherwise named types are registered and referenced.
    fn type_schema(&mut self, scope: Scope<'_>, ty: &syn::Type, inline: bool) -> Result<SchemaObject> {
        match ty {
            syn::Type::Path(type_path) => self.path_schema(scope, &type_path.path, inline),
            syn::Type::Reference(reference) => self.type_schema(scope, &reference.elem, inline),
            syn::Type::Paren(paren) => self.type_schema(scope, &paren.elem, inline),
            syn::Type::Group(group) => self.type_schema(scope, &group.elem, inline),
            syn::Type::Slice(slice) => Ok(SchemaObject::array(self.type_schema(scope, &slice.elem, false)?)),
            syn::Type::Array(array) => Ok(SchemaObject::array(self.type_schema(scope, &array.elem, false)?)),
            _ => {
                debug!("Unsupported type shape, using object placeholder");
                Ok(SchemaObject::object())
            }
        }
    }

    fn path_schema(&mut self, scope: Scope<'_>, path: &syn::Path, inline: bool) -> Result<SchemaObject> {
        let Some(segment) = path.segments.last() else {
            return Ok(SchemaObject::object());
        };
        let ident = segment.ident.to_string();
        let argument = first_type_argument(segment);

        if argument.is_none() {
            if path.segments.len() == 1 && scope.generics.contains(&ident) {
                return Ok(SchemaObject::object());
            }
            if let Some(primitive) = PrimitiveType::parse(&ident) {
                return Ok(primitive.to_schema());
            }
        }

        match (ident.as_str(), argument) {
            ("Option" | "Box" | "Rc" | "Arc" | "Cow" | "RefCell" | "Cell", Some(inner)) => {
                return self.type_schema(scope, inner, inline);
            }
            ("Vec" | "VecDeque" | "LinkedList" | "HashSet" | "BTreeSet" | "IndexSet", Some(inner)) => {
                return Ok(SchemaObject::array(self.type_schema(scope, inner, false)?));
            }
            // Map value types are not described
            ("HashMap" | "BTreeMap" | "IndexMap", _) => return Ok(SchemaObject::object()),
            _ => {}
        }

        if let Some(schema) = well_known_schema(&ident) {
            return Ok(schema);
        }

        let located = match scope.current {
            Some(current) if path.segments.len() == 1 && ident == "Self" => current.clone(),
            _ => self
                .locate(scope.package_path, scope.package_name, path)?
                .ok_or_else(|| {
                    Error::TypeNotFound(format!(
                        "{} can not be found in package {} ({})",
                        ident, scope.package_name, scope.package_path
                    ))
                })?,
        };

        if inline {
            if !self.expanding.contains(&located.key()) {
                return self.expand_definition(&located);
            }
            // Flattened cycle: reference the type instead of merging it
            debug!("{} is already being expanded, referencing it", located.name);
        }

        if let TypeDef::Alias(alias) = &located.def {
            // Aliases are transparent in field position
            let generics = located.def.generics();
            let alias_scope = Scope {
                package_path: &located.package_path,
                package_name: &located.package_name,
                generics: &generics,
                current: None,
            };
            return self.type_schema(alias_scope, &alias.ty, false);
        }

        let name = self.register_located(None, &located)?;
        Ok(SchemaObject::reference(&name))
    }
}

impl SchemaParser for SourceSchemaParser {
    fn get_pkg_ast(&mut self, pkg_path: &str) -> Result<Rc<PackageAst>> {
        self.loader.get_pkg_ast(pkg_path)
    }

    fn register_type(&mut self, pkg_path: &str, pkg_name: &str, type_name: &str) -> Result<String> {
        let requested = TypeKey::new(pkg_path, pkg_name, type_name);
        if let Some(name) = self.registry.lookup(&requested) {
            debug!("Type {} already registered as {}", type_name, name);
            return Ok(name.to_string());
        }

        let not_found = || {
            Error::TypeNotFound(format!(
                "{} can not be found in package {} ({})",
                type_name, pkg_name, pkg_path
            ))
        };

        let path = match syn::parse_str::<syn::Type>(type_name) {
            Ok(syn::Type::Path(type_path)) => type_path.path,
            _ => return Err(not_found()),
        };
        let (_, ident) = path_parts(&path);
        if PrimitiveType::parse(&ident).is_some() {
            return Err(not_found());
        }

        let located = self.locate(pkg_path, pkg_name, &path)?.ok_or_else(not_found)?;
        self.register_located(Some(requested), &located)
    }

    fn parse_schema_object(
        &mut self,
        pkg_path: &str,
        pkg_name: &str,
        type_name: &str,
    ) -> Result<SchemaObject> {
        debug!("Parsing schema object for {}", type_name);
        let ty = syn::parse_str::<syn::Type>(type_name).map_err(|e| {
            Error::TypeNotFound(format!("{} is not a type expression: {}", type_name, e))
        })?;

        let scope = Scope {
            package_path: pkg_path,
            package_name: pkg_name,
            generics: &[],
            current: None,
        };
        self.type_schema(scope, &ty, true)
    }
}
