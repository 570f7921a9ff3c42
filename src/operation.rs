//! Operation assembly: applies annotation tags to an [`OperationObject`].
//!
//! Each tokenized tag is dispatched by its [`TagKind`]. Tags that need type
//! information go through the injected [`SchemaParser`].

use crate::annotation::{tokenize, AnnotationTag};
use crate::error::{Error, Result};
use crate::openapi::{
    HttpMethod, MediaType, OperationObject, ParameterLocation, ParameterObject, RequestBody,
    ResponseObject, Route, SchemaObject,
};
use crate::schema::{PrimitiveType, SchemaParser};
use indexmap::IndexMap;
use log::debug;

const JSON_MEDIA_TYPE: &str = "application/json";
const FORM_MEDIA_TYPE: &str = "multipart/form-data";

/// Annotation tags understood by the assembler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Param,
    Header,
    Summary,
    Description,
    Id,
    /// `@Tags` and its synonym `@Resource`
    Tags,
    Deprecated,
    Router,
    Success,
    Failure,
}

impl TagKind {
    /// Tag kind for a name such as `@Param`; matching ignores case.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.strip_prefix('@').unwrap_or(name);
        match name.to_lowercase().as_str() {
            "param" => Some(TagKind::Param),
            "header" => Some(TagKind::Header),
            "summary" => Some(TagKind::Summary),
            "description" => Some(TagKind::Description),
            "id" => Some(TagKind::Id),
            "tags" | "resource" => Some(TagKind::Tags),
            "deprecated" => Some(TagKind::Deprecated),
            "router" => Some(TagKind::Router),
            "success" => Some(TagKind::Success),
            "failure" => Some(TagKind::Failure),
            _ => None,
        }
    }
}

/// Parses a boolean the way annotation authors write it.
fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

/// Element type of `Vec<T>`, `[T]` or `[]T`.
fn array_element(type_name: &str) -> Option<&str> {
    type_name
        .strip_prefix("Vec<")
        .and_then(|rest| rest.strip_suffix('>'))
        .or_else(|| {
            type_name
                .strip_prefix('[')
                .and_then(|rest| rest.strip_suffix(']'))
        })
        .or_else(|| type_name.strip_prefix("[]"))
        .map(str::trim)
        .filter(|inner| !inner.is_empty())
}

/// Schema for a path/query/header/form value. Unknown names pass as strings.
fn inline_schema(type_name: &str) -> SchemaObject {
    if let Some(inner) = array_element(type_name) {
        return SchemaObject::array(inline_schema(inner));
    }
    PrimitiveType::parse(type_name)
        .map(PrimitiveType::to_schema)
        .unwrap_or_else(|| SchemaObject::primitive("string", None))
}

/// Typed default value matching the schema it is attached to.
fn default_value(raw: &str, schema: &SchemaObject) -> serde_json::Value {
    let typed = match schema.schema_type.as_deref() {
        Some("integer") => raw.parse::<i64>().ok().map(serde_json::Value::from),
        Some("number") => raw.parse::<f64>().ok().map(serde_json::Value::from),
        Some("boolean") => parse_bool(raw).map(serde_json::Value::from),
        _ => None,
    };
    typed.unwrap_or_else(|| serde_json::Value::String(raw.to_string()))
}

fn non_empty(text: &str) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Convert path format from :param to OpenAPI {param} format
fn convert_path_format(path: &str) -> String {
    path.split('/')
        .map(|part| match part.strip_prefix(':') {
            Some(name) => format!("{{{}}}", name),
            None => part.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn is_valid_status(code: &str) -> bool {
    code == "default" || code.parse::<u16>().is_ok_and(|c| (100..=599).contains(&c))
}

/// Assembles operations from annotation tags.
///
/// The parser also collects the header parameters defined by `@Header` tags,
/// which end up under `components.parameters` in the document.
///
/// # Example
///
/// ```no_run
/// use openapi_from_annotations::loader::PackageLoader;
/// use openapi_from_annotations::openapi::OperationObject;
/// use openapi_from_annotations::operation::OperationParser;
/// use openapi_from_annotations::schema::SourceSchemaParser;
/// use std::path::PathBuf;
///
/// let loader = PackageLoader::new(PathBuf::from("./my-project"));
/// let mut parser = OperationParser::new(SourceSchemaParser::new(loader));
/// let mut operation = OperationObject::default();
/// parser
///     .parse_comment("./my-project/src", "src", &mut operation, "@Router /users [get]")
///     .unwrap();
/// ```
pub struct OperationParser<P: SchemaParser> {
    parser: P,
    header_parameters: IndexMap<String, ParameterObject>,
}

impl<P: SchemaParser> OperationParser<P> {
    pub fn new(parser: P) -> Self {
        debug!("Initializing OperationParser");
        Self {
            parser,
            header_parameters: IndexMap::new(),
        }
    }

    pub fn schema_parser(&self) -> &P {
        &self.parser
    }

    pub fn schema_parser_mut(&mut self) -> &mut P {
        &mut self.parser
    }

    /// Header parameters defined so far, by header name
    pub fn header_parameters(&self) -> &IndexMap<String, ParameterObject> {
        &self.header_parameters
    }

    pub fn into_parts(self) -> (P, IndexMap<String, ParameterObject>) {
        (self.parser, self.header_parameters)
    }

    /// Tokenizes one comment line and applies it.
    pub fn parse_comment(
        &mut self,
        pkg_path: &str,
        pkg_name: &str,
        operation: &mut OperationObject,
        line: &str,
    ) -> Result<()> {
        let tag = tokenize(line)?;
        self.process_tag(pkg_path, pkg_name, operation, &tag)
    }

    /// Applies one tag to `operation`. Unknown tags are ignored.
    pub fn process_tag(
        &mut self,
        pkg_path: &str,
        pkg_name: &str,
        operation: &mut OperationObject,
        tag: &AnnotationTag,
    ) -> Result<()> {
        let Some(kind) = TagKind::from_name(&tag.name) else {
            debug!("Ignoring unknown tag {}", tag.name);
            return Ok(());
        };
        let args = &tag.arguments;

        match kind {
            TagKind::Param => self.parse_param_comment(pkg_path, pkg_name, operation, args),
            TagKind::Header => self.parse_headers(pkg_path, pkg_name, operation, args),
            TagKind::Summary => {
                operation.summary = non_empty(&args.join(" "));
                Ok(())
            }
            TagKind::Description => {
                let line = args.join(" ");
                operation.description = match operation.description.take() {
                    Some(existing) => Some(format!("{}\n{}", existing, line)),
                    None => non_empty(&line),
                };
                Ok(())
            }
            TagKind::Id => {
                operation.operation_id = args.first().cloned();
                Ok(())
            }
            TagKind::Tags => {
                let names = args
                    .iter()
                    .flat_map(|arg| arg.split(','))
                    .map(str::trim)
                    .filter(|name| !name.is_empty());
                for name in names {
                    if !operation.tags.iter().any(|t| t == name) {
                        operation.tags.push(name.to_string());
                    }
                }
                Ok(())
            }
            TagKind::Deprecated => {
                operation.deprecated = true;
                Ok(())
            }
            TagKind::Router => Self::parse_router(operation, args),
            TagKind::Success | TagKind::Failure => {
                self.parse_response(pkg_path, pkg_name, operation, args)
            }
        }
    }

    /// `@Param name in typeName required description [default]`
    fn parse_param_comment(
        &mut self,
        pkg_path: &str,
        pkg_name: &str,
        operation: &mut OperationObject,
        args: &[String],
    ) -> Result<()> {
        if args.len() != 5 && args.len() != 6 {
            return Err(Error::MalformedParamComment(format!(
                "@Param needs 5 or 6 arguments, got {}: {:?}",
                args.len(),
                args
            )));
        }

        let name = &args[0];
        let type_name = &args[2];
        let description = &args[4];
        let default = args.get(5);
        let required = parse_bool(&args[3]).ok_or_else(|| {
            Error::MalformedParamComment(format!(
                "@Param {} has an invalid required flag {:?}",
                name, args[3]
            ))
        })?;
        let location = ParameterLocation::parse(&args[1]).ok_or_else(|| {
            Error::UnknownParameterLocation(format!(
                "@Param {} uses {:?}, expected path, query, header, form or body",
                name, args[1]
            ))
        })?;

        debug!("Parsing @Param {} in {:?}", name, location);

        match location {
            ParameterLocation::Path | ParameterLocation::Query | ParameterLocation::Header => {
                let mut schema = inline_schema(type_name);
                if let Some(default) = default {
                    schema.default = Some(default_value(default, &schema));
                }
                operation.parameters.push(ParameterObject {
                    name: name.clone(),
                    location: Some(location),
                    // Path parameters are always required
                    required: required || location == ParameterLocation::Path,
                    description: non_empty(description),
                    schema: Some(schema),
                    ..Default::default()
                });
            }
            ParameterLocation::Form => {
                let mut schema = inline_schema(type_name);
                schema.description = non_empty(description);
                if let Some(default) = default {
                    schema.default = Some(default_value(default, &schema));
                }

                let body = operation.request_body.get_or_insert_with(RequestBody::default);
                body.required |= required;
                body.content
                    .entry(FORM_MEDIA_TYPE.to_string())
                    .or_insert_with(|| MediaType {
                        schema: SchemaObject::object(),
                    })
                    .schema
                    .insert_property(name.clone(), schema, required);
            }
            ParameterLocation::Body => {
                let schema = self.type_schema(pkg_path, pkg_name, type_name)?;

                let body = operation.request_body.get_or_insert_with(RequestBody::default);
                body.description = non_empty(description);
                body.required = required;
                body.content
                    .insert(JSON_MEDIA_TYPE.to_string(), MediaType { schema });
            }
        }

        Ok(())
    }

    /// `@Header HeaderGroupType [headerName ...]`
    fn parse_headers(
        &mut self,
        pkg_path: &str,
        pkg_name: &str,
        operation: &mut OperationObject,
        args: &[String],
    ) -> Result<()> {
        let Some((group_type, names)) = args.split_first() else {
            return Err(Error::MalformedAnnotation(
                "@Header needs a header group type".to_string(),
            ));
        };

        let schema = self
            .parser
            .parse_schema_object(pkg_path, pkg_name, group_type)?;
        let properties = match &schema.properties {
            Some(properties) if !properties.is_empty() => properties,
            _ => {
                return Err(Error::NilSchemaProperties(
                    "parseHeaders can not parse Header schema comment".to_string(),
                ))
            }
        };

        // Repeated names collapse to their first occurrence
        let selected: IndexMap<&String, &SchemaObject> = if names.is_empty() {
            properties.iter().collect()
        } else {
            names
                .iter()
                .map(|name| {
                    properties.get_key_value(name).ok_or_else(|| {
                        Error::UnknownHeader(format!("{} is not a header of {}", name, group_type))
                    })
                })
                .collect::<Result<_>>()?
        };

        for (name, property) in selected {
            let reference = ParameterObject::reference(name);
            if operation
                .parameters
                .iter()
                .any(|p| p.reference == reference.reference)
            {
                debug!("Header parameter {} already present", name);
            } else {
                debug!("Adding header parameter {} from {}", name, group_type);
                operation.parameters.push(reference);
            }

            self.header_parameters
                .entry(name.clone())
                .or_insert_with(|| ParameterObject {
                    name: name.clone(),
                    location: Some(ParameterLocation::Header),
                    required: schema.is_required(name),
                    description: property.description.clone(),
                    schema: Some(SchemaObject {
                        description: None,
                        ..property.clone()
                    }),
                    ..Default::default()
                });
        }

        Ok(())
    }

    /// `@Router path [method]`
    fn parse_router(operation: &mut OperationObject, args: &[String]) -> Result<()> {
        let malformed = || {
            Error::MalformedRouterComment(format!(
                "expected `@Router path [method]`, got {:?}",
                args
            ))
        };

        let [path, method] = args else {
            return Err(malformed());
        };
        if !path.starts_with('/') {
            return Err(malformed());
        }
        let method = method
            .strip_prefix('[')
            .and_then(|m| m.strip_suffix(']'))
            .and_then(HttpMethod::parse)
            .ok_or_else(malformed)?;

        let path = convert_path_format(path);
        debug!("Route {} {}", method.as_str(), path);
        operation.route = Some(Route { path, method });
        Ok(())
    }

    /// `@Success code {kind} [Type] ["description"]` or `@Success code ["description"]`
    fn parse_response(
        &mut self,
        pkg_path: &str,
        pkg_name: &str,
        operation: &mut OperationObject,
        args: &[String],
    ) -> Result<()> {
        let malformed = |reason: &str| {
            Error::MalformedResponseComment(format!("{}: {:?}", reason, args))
        };

        let Some((code, rest)) = args.split_first() else {
            return Err(malformed("missing status code"));
        };
        if !is_valid_status(code) {
            return Err(malformed("invalid status code"));
        }

        let kind = rest
            .first()
            .and_then(|arg| arg.strip_prefix('{'))
            .and_then(|arg| arg.strip_suffix('}'));

        let (schema, description) = match kind {
            None => {
                if rest.len() > 1 {
                    return Err(malformed("too many arguments"));
                }
                (None, rest.first())
            }
            Some(kind @ ("object" | "array")) => {
                let (type_name, description) = match rest {
                    [_, type_name] => (type_name, None),
                    [_, type_name, description] => (type_name, Some(description)),
                    _ => return Err(malformed("expected a type after the kind")),
                };
                let schema = self.type_schema(pkg_path, pkg_name, type_name)?;
                let schema = if kind == "array" {
                    SchemaObject::array(schema)
                } else {
                    schema
                };
                (Some(schema), description)
            }
            Some(kind @ ("string" | "integer" | "number" | "boolean")) => {
                // A lone second argument naming a primitive of this kind is
                // a type, not a description
                let refines = |arg: &str| {
                    PrimitiveType::parse(arg)
                        .is_some_and(|p| p.to_schema().schema_type.as_deref() == Some(kind))
                };
                let (type_name, description) = match rest {
                    [_] => (None, None),
                    [_, type_name] if refines(type_name.as_str()) => (Some(type_name), None),
                    [_, description] => (None, Some(description)),
                    [_, type_name, description] => (Some(type_name), Some(description)),
                    _ => return Err(malformed("too many arguments")),
                };
                // A concrete primitive type refines the format
                let schema = type_name
                    .and_then(|t| PrimitiveType::parse(t))
                    .map(PrimitiveType::to_schema)
                    .filter(|s| s.schema_type.as_deref() == Some(kind))
                    .unwrap_or_else(|| SchemaObject::primitive(kind, None));
                (Some(schema), description)
            }
            Some(_) => return Err(malformed("unknown response kind")),
        };

        let description = description
            .and_then(|d| non_empty(d))
            .unwrap_or_else(|| "Successful response".to_string());
        let content = schema.map(|schema| {
            let mut content = IndexMap::new();
            content.insert(JSON_MEDIA_TYPE.to_string(), MediaType { schema });
            content
        });

        debug!("Response {} ({})", code, description);
        operation
            .responses
            .insert(code.clone(), ResponseObject { description, content });
        Ok(())
    }

    /// Schema for a body or response type: primitives inline, arrays of their
    /// element, anything else registered and referenced.
    fn type_schema(&mut self, pkg_path: &str, pkg_name: &str, type_name: &str) -> Result<SchemaObject> {
        if let Some(inner) = array_element(type_name) {
            return Ok(SchemaObject::array(self.type_schema(pkg_path, pkg_name, inner)?));
        }
        if let Some(primitive) = PrimitiveType::parse(type_name) {
            return Ok(primitive.to_schema());
        }
        let name = self.parser.register_type(pkg_path, pkg_name, type_name)?;
        Ok(SchemaObject::reference(&name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openapi::parameter_ref;
    use crate::schema::MockSchemaParser;
    use mockall::predicate;
    use pretty_assertions::assert_eq;

    const PKG_PATH: &str = "example/pkg";
    const PKG_NAME: &str = "pkg";

    fn apply<P: SchemaParser>(
        parser: &mut OperationParser<P>,
        operation: &mut OperationObject,
        line: &str,
    ) -> Result<()> {
        parser.parse_comment(PKG_PATH, PKG_NAME, operation, line)
    }

    fn header_group() -> SchemaObject {
        let mut schema = SchemaObject::object();
        schema.insert_property(
            "ContentType".to_string(),
            SchemaObject::primitive("string", None),
            true,
        );
        schema.insert_property("Version".to_string(), SchemaObject::primitive("string", None), false);
        schema.insert_property(
            "Authorization".to_string(),
            SchemaObject::primitive("string", None),
            true,
        );
        schema
    }

    fn refs(operation: &OperationObject) -> Vec<String> {
        operation
            .parameters
            .iter()
            .filter_map(|p| p.reference.clone())
            .collect()
    }

    #[test]
    fn test_tag_kind_from_name() {
        assert_eq!(TagKind::from_name("@Param"), Some(TagKind::Param));
        assert_eq!(TagKind::from_name("@param"), Some(TagKind::Param));
        assert_eq!(TagKind::from_name("@Resource"), Some(TagKind::Tags));
        assert_eq!(TagKind::from_name("@ID"), Some(TagKind::Id));
        assert_eq!(TagKind::from_name("@Unknown"), None);
    }

    #[test]
    fn test_parse_headers_appends_refs_in_order() {
        let mut mock = MockSchemaParser::new();
        mock.expect_parse_schema_object()
            .with(
                predicate::eq(PKG_PATH),
                predicate::eq(PKG_NAME),
                predicate::eq("Headers"),
            )
            .times(1)
            .returning(|_, _, _| Ok(header_group()));
        mock.expect_register_type().never();

        let mut parser = OperationParser::new(mock);
        let mut operation = OperationObject::default();
        apply(&mut parser, &mut operation, "@Header Headers").unwrap();

        assert_eq!(
            refs(&operation),
            vec![
                parameter_ref("ContentType"),
                parameter_ref("Version"),
                parameter_ref("Authorization"),
            ]
        );
        assert!(operation
            .parameters
            .iter()
            .all(|p| p.name.is_empty() && p.schema.is_none()));

        let headers = parser.header_parameters();
        assert_eq!(headers.len(), 3);
        assert_eq!(headers["ContentType"].location, Some(ParameterLocation::Header));
        assert!(headers["ContentType"].required);
        assert!(!headers["Version"].required);
    }

    #[test]
    fn test_parse_headers_selected_names() {
        let mut mock = MockSchemaParser::new();
        mock.expect_parse_schema_object()
            .returning(|_, _, _| Ok(header_group()));

        let mut parser = OperationParser::new(mock);
        let mut operation = OperationObject::default();
        apply(&mut parser, &mut operation, "@Header Headers Authorization Version").unwrap();

        assert_eq!(
            refs(&operation),
            vec![parameter_ref("Authorization"), parameter_ref("Version")]
        );
    }

    #[test]
    fn test_parse_headers_repeated_names_added_once() {
        let mut mock = MockSchemaParser::new();
        mock.expect_parse_schema_object()
            .times(2)
            .returning(|_, _, _| Ok(header_group()));

        let mut parser = OperationParser::new(mock);
        let mut operation = OperationObject::default();
        apply(&mut parser, &mut operation, "@Header Headers Version Version").unwrap();
        apply(&mut parser, &mut operation, "@Header Headers Authorization Version").unwrap();

        assert_eq!(
            refs(&operation),
            vec![parameter_ref("Version"), parameter_ref("Authorization")]
        );
        assert_eq!(parser.header_parameters().len(), 2);
    }

    #[test]
    fn test_parse_headers_unknown_name_appends_nothing() {
        let mut mock = MockSchemaParser::new();
        mock.expect_parse_schema_object()
            .returning(|_, _, _| Ok(header_group()));

        let mut parser = OperationParser::new(mock);
        let mut operation = OperationObject::default();
        let err = apply(&mut parser, &mut operation, "@Header Headers Version Cookie").unwrap_err();

        assert!(matches!(err, Error::UnknownHeader(_)));
        assert!(operation.parameters.is_empty());
        assert!(parser.header_parameters().is_empty());
    }

    #[test]
    fn test_parse_headers_nil_properties() {
        let mut mock = MockSchemaParser::new();
        mock.expect_parse_schema_object()
            .times(1)
            .returning(|_, _, _| Ok(SchemaObject::object()));

        let mut parser = OperationParser::new(mock);
        let mut operation = OperationObject::default();
        let err = apply(&mut parser, &mut operation, "@Header Headers").unwrap_err();

        assert_eq!(
            err.to_string(),
            "NilSchemaProperties : parseHeaders can not parse Header schema comment"
        );
        assert!(operation.parameters.is_empty());
    }

    #[test]
    fn test_parse_headers_empty_property_set() {
        let mut mock = MockSchemaParser::new();
        mock.expect_parse_schema_object().returning(|_, _, _| {
            Ok(SchemaObject {
                properties: Some(IndexMap::new()),
                ..SchemaObject::object()
            })
        });

        let mut parser = OperationParser::new(mock);
        let mut operation = OperationObject::default();
        let err = apply(&mut parser, &mut operation, "@Header Headers").unwrap_err();

        assert!(matches!(err, Error::NilSchemaProperties(_)));
    }

    #[test]
    fn test_parse_headers_resolver_error_verbatim() {
        let mut mock = MockSchemaParser::new();
        mock.expect_parse_schema_object()
            .times(1)
            .returning(|_, _, _| Err(Error::LoadError("someErr".to_string())));

        let mut parser = OperationParser::new(mock);
        let mut operation = OperationObject::default();
        let err = apply(&mut parser, &mut operation, "@Header Headers").unwrap_err();

        assert_eq!(err.to_string(), "someErr");
        assert!(operation.parameters.is_empty());
    }

    #[test]
    fn test_param_form_sets_request_body() {
        let mut mock = MockSchemaParser::new();
        mock.expect_register_type().never();
        mock.expect_parse_schema_object().never();

        let mut parser = OperationParser::new(mock);
        let mut operation = OperationObject::default();
        apply(
            &mut parser,
            &mut operation,
            r#"@Param file form file true "Upload file" "/path/to/file""#,
        )
        .unwrap();
        apply(&mut parser, &mut operation, r#"@Param note form string false "Note""#).unwrap();

        assert!(operation.parameters.is_empty());
        let body = operation.request_body.as_ref().unwrap();
        assert!(body.required);
        let schema = &body.content[FORM_MEDIA_TYPE].schema;
        let properties = schema.properties.as_ref().unwrap();
        assert_eq!(properties.keys().collect::<Vec<_>>(), vec!["file", "note"]);
        assert_eq!(properties["file"].format.as_deref(), Some("binary"));
        assert_eq!(properties["file"].description.as_deref(), Some("Upload file"));
        assert_eq!(
            properties["file"].default,
            Some(serde_json::Value::String("/path/to/file".to_string()))
        );
        assert_eq!(schema.required, Some(vec!["file".to_string()]));
    }

    #[test]
    fn test_param_body_registers_type_once() {
        let mut mock = MockSchemaParser::new();
        mock.expect_register_type()
            .with(
                predicate::eq("example/pkg"),
                predicate::eq("pkg"),
                predicate::eq("User"),
            )
            .times(1)
            .returning(|_, _, _| Ok("UserSchemaRef".to_string()));
        mock.expect_parse_schema_object().never();
        mock.expect_get_pkg_ast().never();

        let mut parser = OperationParser::new(mock);
        let mut operation = OperationObject::default();
        apply(&mut parser, &mut operation, r#"@Param user body User true "Info of a user.""#).unwrap();

        assert!(operation.parameters.is_empty());
        let body = operation.request_body.as_ref().unwrap();
        assert_eq!(body.description.as_deref(), Some("Info of a user."));
        assert!(body.required);
        assert_eq!(
            body.content[JSON_MEDIA_TYPE].schema.reference.as_deref(),
            Some("#/components/schemas/UserSchemaRef")
        );
    }

    #[test]
    fn test_param_body_replaces_reference_only() {
        let mut mock = MockSchemaParser::new();
        mock.expect_register_type()
            .times(2)
            .returning(|_, _, type_name| Ok(type_name.to_string()));

        let mut parser = OperationParser::new(mock);
        let mut operation = OperationObject::default();
        apply(&mut parser, &mut operation, r#"@Param f form string true "Field""#).unwrap();
        apply(&mut parser, &mut operation, r#"@Param a body First true "A""#).unwrap();
        apply(&mut parser, &mut operation, r#"@Param b body Second false "B""#).unwrap();

        let body = operation.request_body.as_ref().unwrap();
        assert_eq!(body.content.len(), 2);
        assert!(body.content.contains_key(FORM_MEDIA_TYPE));
        assert_eq!(
            body.content[JSON_MEDIA_TYPE].schema,
            SchemaObject::reference("Second")
        );
    }

    #[test]
    fn test_param_body_error_leaves_body_unset() {
        let mut mock = MockSchemaParser::new();
        mock.expect_register_type()
            .times(1)
            .returning(|_, _, _| Err(Error::LoadError("someErr".to_string())));

        let mut parser = OperationParser::new(mock);
        let mut operation = OperationObject::default();
        let err =
            apply(&mut parser, &mut operation, r#"@Param user body User true "Info of a user.""#)
                .unwrap_err();

        assert_eq!(err.to_string(), "someErr");
        assert!(operation.request_body.is_none());
    }

    #[test]
    fn test_param_query_appends_parameter() {
        let mut mock = MockSchemaParser::new();
        mock.expect_register_type().never();

        let mut parser = OperationParser::new(mock);
        let mut operation = OperationObject::default();
        apply(&mut parser, &mut operation, r#"@Param limit query int false "Page size" "20""#).unwrap();

        assert!(operation.request_body.is_none());
        assert_eq!(operation.parameters.len(), 1);

        let param = &operation.parameters[0];
        assert_eq!(param.name, "limit");
        assert_eq!(param.location, Some(ParameterLocation::Query));
        assert!(!param.required);
        assert_eq!(param.description.as_deref(), Some("Page size"));
        let schema = param.schema.as_ref().unwrap();
        assert_eq!(schema.schema_type.as_deref(), Some("integer"));
        assert_eq!(schema.default, Some(serde_json::json!(20)));
    }

    #[test]
    fn test_param_path_and_array_types() {
        let mut parser = OperationParser::new(MockSchemaParser::new());
        let mut operation = OperationObject::default();
        apply(&mut parser, &mut operation, r#"@Param id path u64 false "User ID""#).unwrap();
        apply(&mut parser, &mut operation, r#"@Param ids query Vec<i32> false "IDs""#).unwrap();
        apply(&mut parser, &mut operation, r#"@Param X-Trace header Trace true "Trace""#).unwrap();

        let id = &operation.parameters[0];
        assert!(id.required);
        assert_eq!(id.schema.as_ref().unwrap().format.as_deref(), Some("int64"));

        let ids = operation.parameters[1].schema.as_ref().unwrap();
        assert_eq!(ids.schema_type.as_deref(), Some("array"));
        assert_eq!(ids.items.as_ref().unwrap().format.as_deref(), Some("int32"));

        let trace = operation.parameters[2].schema.as_ref().unwrap();
        assert_eq!(trace.schema_type.as_deref(), Some("string"));
    }

    #[test]
    fn test_param_malformed_leaves_operation_unchanged() {
        let mut mock = MockSchemaParser::new();
        mock.expect_register_type().never();
        mock.expect_parse_schema_object().never();

        let mut parser = OperationParser::new(mock);
        let mut operation = OperationObject::default();

        let err = apply(&mut parser, &mut operation, "@Param invalid format only").unwrap_err();
        assert!(matches!(err, Error::MalformedParamComment(_)));

        let err = apply(&mut parser, &mut operation, r#"@Param id query int maybe "ID""#).unwrap_err();
        assert!(matches!(err, Error::MalformedParamComment(_)));

        let err = apply(&mut parser, &mut operation, r#"@Param id cookie int true "ID""#).unwrap_err();
        assert!(matches!(err, Error::UnknownParameterLocation(_)));

        let err = apply(&mut parser, &mut operation, r#"@Param id query int true "ID"#).unwrap_err();
        assert!(matches!(err, Error::MalformedAnnotation(_)));

        assert_eq!(operation, OperationObject::default());
    }

    #[test]
    fn test_parse_bool_spellings() {
        for value in ["1", "t", "T", "true", "TRUE", "True"] {
            assert_eq!(parse_bool(value), Some(true), "{}", value);
        }
        for value in ["0", "f", "F", "false", "FALSE", "False"] {
            assert_eq!(parse_bool(value), Some(false), "{}", value);
        }
        assert_eq!(parse_bool("yes"), None);
    }

    #[test]
    fn test_info_tags() {
        let mut parser = OperationParser::new(MockSchemaParser::new());
        let mut operation = OperationObject::default();
        for line in [
            "@Summary Get a user",
            "@Description Returns one user.",
            "@Description Admins see more fields.",
            "@ID getUser",
            "@Tags users,admin",
            "@Resource users",
            "@Deprecated",
            "@Accept json",
        ] {
            apply(&mut parser, &mut operation, line).unwrap();
        }

        assert_eq!(operation.summary.as_deref(), Some("Get a user"));
        assert_eq!(
            operation.description.as_deref(),
            Some("Returns one user.\nAdmins see more fields.")
        );
        assert_eq!(operation.operation_id.as_deref(), Some("getUser"));
        assert_eq!(operation.tags, vec!["users", "admin"]);
        assert!(operation.deprecated);
    }

    #[test]
    fn test_router() {
        let mut parser = OperationParser::new(MockSchemaParser::new());
        let mut operation = OperationObject::default();
        apply(&mut parser, &mut operation, "@Router /users/:id [GET]").unwrap();

        assert_eq!(
            operation.route,
            Some(Route {
                path: "/users/{id}".to_string(),
                method: HttpMethod::Get,
            })
        );

        for line in ["@Router /users", "@Router users [get]", "@Router /users [fetch]", "@Router /users get"] {
            let err = apply(&mut parser, &mut operation, line).unwrap_err();
            assert!(matches!(err, Error::MalformedRouterComment(_)), "{}", line);
        }
    }

    #[test]
    fn test_responses() {
        let mut mock = MockSchemaParser::new();
        mock.expect_register_type()
            .with(predicate::eq(PKG_PATH), predicate::eq(PKG_NAME), predicate::eq("User"))
            .times(2)
            .returning(|_, _, _| Ok("User".to_string()));

        let mut parser = OperationParser::new(mock);
        let mut operation = OperationObject::default();
        apply(&mut parser, &mut operation, r#"@Success 200 {object} User "The user""#).unwrap();
        apply(&mut parser, &mut operation, "@Success 206 {array} User").unwrap();
        apply(&mut parser, &mut operation, r#"@Success 202 {string} "Queued""#).unwrap();
        apply(&mut parser, &mut operation, r#"@Failure 404 "Not found""#).unwrap();
        apply(&mut parser, &mut operation, "@Success 204").unwrap();

        let ok = &operation.responses["200"];
        assert_eq!(ok.description, "The user");
        assert_eq!(
            ok.content.as_ref().unwrap()[JSON_MEDIA_TYPE].schema,
            SchemaObject::reference("User")
        );

        let partial = &operation.responses["206"].content.as_ref().unwrap()[JSON_MEDIA_TYPE];
        assert_eq!(partial.schema, SchemaObject::array(SchemaObject::reference("User")));

        let queued = &operation.responses["202"];
        assert_eq!(queued.description, "Queued");
        assert_eq!(
            queued.content.as_ref().unwrap()[JSON_MEDIA_TYPE].schema.schema_type.as_deref(),
            Some("string")
        );

        assert_eq!(operation.responses["404"].description, "Not found");
        assert!(operation.responses["404"].content.is_none());
        assert_eq!(operation.responses["204"].description, "Successful response");

        let codes: Vec<_> = operation.responses.keys().cloned().collect();
        assert_eq!(codes, vec!["200", "206", "202", "404", "204"]);
    }

    #[test]
    fn test_primitive_response_refined_by_lone_type() {
        let mut mock = MockSchemaParser::new();
        mock.expect_register_type().never();

        let mut parser = OperationParser::new(mock);
        let mut operation = OperationObject::default();
        apply(&mut parser, &mut operation, "@Success 200 {string} string").unwrap();
        apply(&mut parser, &mut operation, "@Success 201 {integer} i64").unwrap();
        apply(&mut parser, &mut operation, "@Success 202 {integer} accepted").unwrap();

        let schema = |code: &str| {
            operation.responses[code].content.as_ref().unwrap()[JSON_MEDIA_TYPE]
                .schema
                .clone()
        };
        assert_eq!(operation.responses["200"].description, "Successful response");
        assert_eq!(schema("200"), SchemaObject::primitive("string", None));
        assert_eq!(operation.responses["201"].description, "Successful response");
        assert_eq!(schema("201").format.as_deref(), Some("int64"));
        assert_eq!(operation.responses["202"].description, "accepted");
        assert_eq!(schema("202"), SchemaObject::primitive("integer", None));
    }

    #[test]
    fn test_malformed_responses() {
        let mut mock = MockSchemaParser::new();
        mock.expect_register_type().never();

        let mut parser = OperationParser::new(mock);
        let mut operation = OperationObject::default();
        for line in [
            "@Success",
            "@Success abc",
            "@Success 999",
            "@Success 200 {object}",
            "@Success 200 {thing} User",
            r#"@Failure 400 "Bad" "request""#,
        ] {
            let err = apply(&mut parser, &mut operation, line).unwrap_err();
            assert!(matches!(err, Error::MalformedResponseComment(_)), "{}", line);
        }
        assert!(operation.responses.is_empty());
    }
}
