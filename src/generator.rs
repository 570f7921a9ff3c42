//! Whole-project document generation.
//!
//! The generator walks every package of a project, feeds the annotation lines
//! of each handler to an [`OperationParser`] and collects the resulting
//! operations, component schemas and header parameters into one
//! [`OpenApiDocument`].

use crate::annotation::{annotation_lines, tokenize};
use crate::error::Result;
use crate::loader::{PackageInfo, PackageLoader};
use crate::openapi::{Components, Info, OpenApiDocument, OperationObject, PathItem, Server};
use crate::operation::OperationParser;
use crate::schema::{SchemaParser, SourceSchemaParser};
use indexmap::IndexMap;
use log::{debug, error, info, warn};
use std::path::PathBuf;
use syn::visit::Visit;

pub const OPENAPI_VERSION: &str = "3.0.3";
const DEFAULT_TITLE: &str = "Generated API";
const DEFAULT_VERSION: &str = "1.0.0";

/// A function whose doc comments carry annotation lines
#[derive(Debug, Clone)]
struct Handler {
    name: String,
    lines: Vec<String>,
}

/// Visitor collecting annotated functions, including impl methods and
/// functions inside inline modules.
struct HandlerVisitor {
    handlers: Vec<Handler>,
}

impl HandlerVisitor {
    fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    fn collect(&mut self, ident: &syn::Ident, attrs: &[syn::Attribute]) {
        let lines = annotation_lines(attrs);
        if !lines.is_empty() {
            debug!("Found handler {} with {} annotations", ident, lines.len());
            self.handlers.push(Handler {
                name: ident.to_string(),
                lines,
            });
        }
    }
}

impl<'ast> Visit<'ast> for HandlerVisitor {
    fn visit_item_fn(&mut self, node: &'ast syn::ItemFn) {
        self.collect(&node.sig.ident, &node.attrs);
        syn::visit::visit_item_fn(self, node);
    }

    fn visit_impl_item_fn(&mut self, node: &'ast syn::ImplItemFn) {
        self.collect(&node.sig.ident, &node.attrs);
        syn::visit::visit_impl_item_fn(self, node);
    }
}

/// Document-level info collected from crate `//!` tags
#[derive(Debug, Default)]
struct DocumentInfo {
    title: Option<String>,
    version: Option<String>,
    description: Option<String>,
    servers: Vec<Server>,
}

impl DocumentInfo {
    /// `@Title`, `@Version`, `@Description` (first found wins) and `@Server`.
    fn absorb(&mut self, attrs: &[syn::Attribute]) -> Result<()> {
        for line in annotation_lines(attrs) {
            let tag = tokenize(&line)?;
            let text = tag.arguments.join(" ");
            match tag.name.to_lowercase().as_str() {
                "@title" if self.title.is_none() => self.title = Some(text),
                "@version" if self.version.is_none() => self.version = Some(text),
                "@description" if self.description.is_none() => self.description = Some(text),
                "@server" => {
                    if let Some((url, rest)) = tag.arguments.split_first() {
                        let description = rest.join(" ");
                        self.servers.push(Server {
                            url: url.clone(),
                            description: (!description.is_empty()).then_some(description),
                        });
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// Generates one OpenAPI document for a project.
///
/// Each generator owns its own loader and type registry; build a new one per
/// document.
///
/// # Example
///
/// ```no_run
/// use openapi_from_annotations::generator::DocumentGenerator;
/// use openapi_from_annotations::serializer::serialize_yaml;
/// use std::path::PathBuf;
///
/// let document = DocumentGenerator::new(PathBuf::from("./my-project"))
///     .build()
///     .unwrap();
/// println!("{}", serialize_yaml(&document).unwrap());
/// ```
pub struct DocumentGenerator {
    parser: OperationParser<SourceSchemaParser>,
    packages: Vec<PackageInfo>,
    title: Option<String>,
    version: Option<String>,
}

impl DocumentGenerator {
    pub fn new(root_path: PathBuf) -> Self {
        info!("Indexing packages under {}", root_path.display());
        let loader = PackageLoader::new(root_path);
        for warning in loader.warnings() {
            warn!("{}", warning);
        }
        let packages = loader.packages().to_vec();
        info!("Found {} packages", packages.len());

        Self {
            parser: OperationParser::new(SourceSchemaParser::new(loader)),
            packages,
            title: None,
            version: None,
        }
    }

    /// Overrides the title and version found in the sources.
    pub fn with_info(mut self, title: Option<String>, version: Option<String>) -> Self {
        self.title = title;
        self.version = version;
        self
    }

    pub fn packages(&self) -> &[PackageInfo] {
        &self.packages
    }

    /// Builds the document. The first failing handler aborts the build.
    pub fn build(mut self) -> Result<OpenApiDocument> {
        let mut document_info = DocumentInfo::default();
        let mut paths: IndexMap<String, PathItem> = IndexMap::new();
        let mut handler_count = 0;

        for package in std::mem::take(&mut self.packages) {
            let pkg_path = package.path_str();
            let ast = self.parser.schema_parser_mut().get_pkg_ast(&pkg_path)?;

            for (file_name, file) in &ast.files {
                document_info.absorb(&file.attrs)?;

                let mut visitor = HandlerVisitor::new();
                visitor.visit_file(file);

                for handler in visitor.handlers {
                    handler_count += 1;
                    let operation = match self.parse_handler(&pkg_path, &package.name, &handler) {
                        Ok(operation) => operation,
                        Err(e) => {
                            error!("Handler {} in {} failed: {}", handler.name, file_name, e);
                            return Err(e);
                        }
                    };
                    Self::place(&mut paths, &handler, operation);
                }
            }
        }

        let (schema_parser, header_parameters) = self.parser.into_parts();
        let schemas = schema_parser.into_registry().into_schemas();

        info!(
            "Processed {} handlers into {} paths with {} component schemas",
            handler_count,
            paths.len(),
            schemas.len()
        );

        let components = (!schemas.is_empty() || !header_parameters.is_empty()).then(|| Components {
            schemas: (!schemas.is_empty()).then_some(schemas),
            parameters: (!header_parameters.is_empty()).then_some(header_parameters),
        });

        Ok(OpenApiDocument {
            openapi: OPENAPI_VERSION.to_string(),
            info: Info {
                title: self
                    .title
                    .or(document_info.title)
                    .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
                version: self
                    .version
                    .or(document_info.version)
                    .unwrap_or_else(|| DEFAULT_VERSION.to_string()),
                description: document_info.description,
            },
            servers: document_info.servers,
            paths,
            components,
        })
    }

    fn parse_handler(&mut self, pkg_path: &str, pkg_name: &str, handler: &Handler) -> Result<OperationObject> {
        let mut operation = OperationObject::default();
        for line in &handler.lines {
            self.parser
                .parse_comment(pkg_path, pkg_name, &mut operation, line)?;
        }
        Ok(operation)
    }

    fn place(paths: &mut IndexMap<String, PathItem>, handler: &Handler, operation: OperationObject) {
        let Some(route) = operation.route.clone() else {
            warn!("Skipping handler {}: no @Router annotation", handler.name);
            return;
        };

        let slot = paths.entry(route.path.clone()).or_default().slot(route.method);
        if slot.is_some() {
            warn!(
                "Duplicate route {} {}, handler {} replaces the earlier one",
                route.method.as_str(),
                route.path,
                handler.name
            );
        }
        *slot = Some(operation);
    }
}
