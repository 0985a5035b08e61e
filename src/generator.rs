use std::path::{Path, PathBuf};

use anyhow::Result;
use indexmap::IndexMap;

use crate::analyzer::Analyzer;
use crate::annotations::{Annotation, Value};
use crate::fault::{E_ERROR, E_USER_NOTICE, E_USER_WARNING, FaultPolicy};
use crate::logger::Location;
use crate::processors::{self, Processor};
use crate::types::{Info, METHODS, OpenApi, Operation, Parameter, Response, Schema, Server, Tag};

pub const SUPPORTED_VERSIONS: &[&str] = &["3.0.0", "3.1.0"];

/// Turns analyzed sources into an OpenAPI document.
pub struct Generator<'a> {
    faults: &'a FaultPolicy<'a>,
    version: String,
    constants: IndexMap<String, String>,
    processors: Vec<Box<dyn Processor>>,
}

impl<'a> Generator<'a> {
    pub fn new(faults: &'a FaultPolicy<'a>) -> Self {
        Generator {
            faults,
            version: crate::cli::DEFAULT_VERSION.to_string(),
            constants: IndexMap::new(),
            processors: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }

    /// Values for bare identifiers in annotations.
    #[must_use]
    pub fn with_constants(mut self, constants: IndexMap<String, String>) -> Self {
        self.constants = constants;
        self
    }

    /// Registers a processor to run after the default ones.
    pub fn add_processor(&mut self, processor: Box<dyn Processor>) {
        tracing::debug!(processor = processor.name(), "processor registered");
        self.processors.push(processor);
    }

    /// # Errors
    /// Only when a reported fault is fatal.
    pub fn generate<I>(&self, files: I, analyzer: &Analyzer) -> Result<OpenApi>
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let mut merge = Merge {
            api: OpenApi::new(&self.version),
            faults: self.faults,
            constants: &self.constants,
            file: PathBuf::new(),
            last_operation: None,
            last_schema: None,
        };
        let mut count = 0usize;
        for file in files {
            let annotations = analyzer.analyze_file(&file, self.faults)?;
            merge.start_file(&file);
            for ann in &annotations {
                merge.annotation(ann, Parent::None)?;
            }
            count += 1;
        }
        tracing::debug!(files = count, "sources merged");

        let mut api = merge.api;
        for processor in processors::defaults().iter().chain(&self.processors) {
            tracing::debug!(processor = processor.name(), "running processor");
            processor.process(&mut api, self.faults)?;
        }
        self.validate(&api)?;
        Ok(api)
    }

    fn validate(&self, api: &OpenApi) -> Result<()> {
        if !SUPPORTED_VERSIONS.contains(&api.openapi.as_str()) {
            self.faults.raise(
                E_USER_WARNING,
                &format!(
                    "Unsupported OpenAPI version \"{}\". Allowed versions are: {}",
                    api.openapi,
                    SUPPORTED_VERSIONS.join(", ")
                ),
                None,
            )?;
        }
        if api.info.is_none() {
            self.faults
                .raise(E_USER_WARNING, "Required @OA\\Info() not found", None)?;
        }
        if api.paths.is_empty() {
            self.faults
                .raise(E_USER_WARNING, "Required @OA\\PathItem() not found", None)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum Parent<'p> {
    None,
    Operation(&'p str, &'p str),
    Schema(&'p str),
}

struct Merge<'m> {
    api: OpenApi,
    faults: &'m FaultPolicy<'m>,
    constants: &'m IndexMap<String, String>,
    file: PathBuf,
    /// Path and method of the latest operation in the current file.
    last_operation: Option<(String, String)>,
    last_schema: Option<String>,
}

impl Merge<'_> {
    fn start_file(&mut self, file: &Path) {
        self.file = file.to_path_buf();
        self.last_operation = None;
        self.last_schema = None;
    }

    fn location(&self, ann: &Annotation) -> Location {
        Location::new(&self.file, ann.line)
    }

    fn warn(&self, ann: &Annotation, message: &str) -> Result<()> {
        self.faults
            .raise(E_USER_WARNING, message, Some(&self.location(ann)))?;
        Ok(())
    }

    fn annotation(&mut self, ann: &Annotation, parent: Parent<'_>) -> Result<()> {
        let method = ann.name.to_ascii_lowercase();
        if METHODS.contains(&method.as_str()) {
            return self.operation(ann, &method);
        }
        match ann.name.as_str() {
            "Info" => {
                self.api.info = Some(Info {
                    title: self.text(ann, "title")?.unwrap_or_default(),
                    description: self.text(ann, "description")?,
                    version: self.text(ann, "version")?.unwrap_or_default(),
                });
            }
            "Server" => match self.text(ann, "url")? {
                Some(url) => {
                    let description = self.text(ann, "description")?;
                    self.api.servers.push(Server { url, description });
                }
                None => self.warn(ann, "@OA\\Server() requires \"url\"")?,
            },
            "Tag" => self.tag(ann)?,
            "Parameter" | "Response" => self.operation_part(ann, parent)?,
            "Schema" => self.schema(ann)?,
            "Property" => self.property(ann, parent)?,
            other => {
                self.faults.raise(
                    E_USER_NOTICE,
                    &format!("Unknown annotation @OA\\{other}()"),
                    Some(&self.location(ann)),
                )?;
            }
        }
        Ok(())
    }

    fn tag(&mut self, ann: &Annotation) -> Result<()> {
        let Some(name) = self.text(ann, "name")? else {
            return self.warn(ann, "@OA\\Tag() requires \"name\"");
        };
        let description = self.text(ann, "description")?;
        match self.api.tags.iter_mut().find(|t| t.name == name) {
            Some(existing) => {
                if description.is_some() {
                    existing.description = description;
                }
            }
            None => self.api.tags.push(Tag { name, description }),
        }
        Ok(())
    }

    fn operation(&mut self, ann: &Annotation, method: &str) -> Result<()> {
        let Some(path) = self.text(ann, "path")? else {
            return self.warn(ann, &format!("@OA\\{}() requires \"path\"", ann.name));
        };
        let op = Operation {
            tags: self.texts(ann, "tags")?,
            summary: self.text(ann, "summary")?,
            description: self.text(ann, "description")?,
            operation_id: self.text(ann, "operationId")?,
            deprecated: self.flag(ann, "deprecated")?.unwrap_or(false),
            ..Default::default()
        };
        let item = self.api.paths.entry(path.clone()).or_default();
        if item.insert(method.to_string(), op).is_some() {
            self.warn(
                ann,
                &format!("Multiple @OA\\{}() found for \"{path}\"", ann.name),
            )?;
        }
        self.last_operation = Some((path.clone(), method.to_string()));
        for child in &ann.children {
            self.annotation(child, Parent::Operation(&path, method))?;
        }
        Ok(())
    }

    fn operation_part(&mut self, ann: &Annotation, parent: Parent<'_>) -> Result<()> {
        let target = match parent {
            Parent::Operation(path, method) => Some((path.to_string(), method.to_string())),
            _ => self.last_operation.clone(),
        };
        let Some((path, method)) = target else {
            return self.warn(
                ann,
                &format!("Unexpected @OA\\{}(), expected to be inside an operation", ann.name),
            );
        };
        if ann.name == "Response" {
            let code = self.text(ann, "response")?.unwrap_or_else(|| "default".into());
            let response = Response {
                description: self.text(ann, "description")?.unwrap_or_default(),
            };
            if let Some(op) = self.find_operation(&path, &method) {
                op.responses.insert(code, response);
            }
            return Ok(());
        }

        let Some(name) = self.text(ann, "name")? else {
            return self.warn(ann, "@OA\\Parameter() requires \"name\"");
        };
        let location = self.text(ann, "in")?.unwrap_or_else(|| "query".into());
        let required = if location == "path" {
            Some(true)
        } else {
            self.flag(ann, "required")?
        };
        let parameter = Parameter {
            name,
            location,
            description: self.text(ann, "description")?,
            required,
            schema: self.text(ann, "type")?.map(|kind| Schema {
                kind: Some(kind),
                ..Default::default()
            }),
        };
        if let Some(op) = self.find_operation(&path, &method) {
            op.parameters.push(parameter);
        }
        Ok(())
    }

    fn find_operation(&mut self, path: &str, method: &str) -> Option<&mut Operation> {
        self.api.paths.get_mut(path)?.get_mut(method)
    }

    fn schema(&mut self, ann: &Annotation) -> Result<()> {
        let Some(name) = self.text(ann, "schema")? else {
            return self.warn(ann, "@OA\\Schema() requires \"schema\"");
        };
        let schema = Schema {
            kind: self.text(ann, "type")?,
            format: self.text(ann, "format")?,
            description: self.text(ann, "description")?,
            required: self.texts(ann, "required")?,
            properties: IndexMap::new(),
        };
        self.api.components.schemas.insert(name.clone(), schema);
        self.last_schema = Some(name.clone());
        for child in &ann.children {
            self.annotation(child, Parent::Schema(&name))?;
        }
        Ok(())
    }

    fn property(&mut self, ann: &Annotation, parent: Parent<'_>) -> Result<()> {
        let target = match parent {
            Parent::Schema(name) => Some(name.to_string()),
            _ => self.last_schema.clone(),
        };
        let Some(schema_name) = target else {
            return self.warn(
                ann,
                "Unexpected @OA\\Property(), expected to be inside a schema",
            );
        };
        let Some(name) = self.text(ann, "property")? else {
            return self.warn(ann, "@OA\\Property() requires \"property\"");
        };
        let property = Schema {
            kind: self.text(ann, "type")?,
            format: self.text(ann, "format")?,
            description: self.text(ann, "description")?,
            ..Default::default()
        };
        if let Some(schema) = self.api.components.schemas.get_mut(&schema_name) {
            schema.properties.insert(name, property);
        }
        Ok(())
    }

    fn resolve(&self, ann: &Annotation, value: &Value) -> Result<String> {
        match value {
            Value::Const(name) => match self.constants.get(name) {
                Some(v) => Ok(v.clone()),
                None => {
                    self.faults.raise(
                        E_ERROR,
                        &format!("Undefined constant \"{name}\""),
                        Some(&self.location(ann)),
                    )?;
                    Ok(name.clone())
                }
            },
            other => Ok(other.to_string()),
        }
    }

    fn text(&self, ann: &Annotation, key: &str) -> Result<Option<String>> {
        ann.get(key).map(|v| self.resolve(ann, v)).transpose()
    }

    fn texts(&self, ann: &Annotation, key: &str) -> Result<Vec<String>> {
        match ann.get(key) {
            None => Ok(Vec::new()),
            Some(Value::List(items)) => items.iter().map(|v| self.resolve(ann, v)).collect(),
            Some(single) => Ok(vec![self.resolve(ann, single)?]),
        }
    }

    fn flag(&self, ann: &Annotation, key: &str) -> Result<Option<bool>> {
        Ok(match ann.get(key) {
            None => None,
            Some(Value::Bool(b)) => Some(*b),
            Some(other) => Some(matches!(self.resolve(ann, other)?.as_str(), "true" | "1")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault::{E_ALL, Terminate};
    use crate::logger::Logger;
    use std::fs;

    const PETS: &str = r#"
/**
 * @OA\Info(title="Petstore", version=API_VERSION)
 * @OA\Tag(name="pets", description="Everything about pets")
 */
mod api {}

/// @OA\Get(
///     path="/pets/{id}",
///     tags={"pets", "store"},
///     summary="Find a pet",
///     @OA\Parameter(name="id", in="path", type="integer"),
///     @OA\Response(response=200, description="found")
/// )
fn get_pet() {}

#[oa::post(path = "/pets", operationId = "addPet")]
/// @OA\Response(response=201, description="created")
fn add_pet() {}

/// @OA\Schema(schema="Pet", type="object", required={"name"})
/// @OA\Property(property="name", type="string")
struct Pet;
"#;

    fn write_fixture(src: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pets.rs");
        fs::write(&path, src).unwrap();
        (dir, path)
    }

    fn constants() -> IndexMap<String, String> {
        let mut c = IndexMap::new();
        c.insert("API_VERSION".to_string(), "1.2.3".to_string());
        c
    }

    #[test]
    fn builds_document_from_annotations() {
        let (_dir, path) = write_fixture(PETS);
        let logger = Logger::new(false);
        let faults = FaultPolicy::install(&logger, E_ALL);
        let generator = Generator::new(&faults).with_constants(constants());
        let api = generator
            .generate(vec![path], &Analyzer::reflection())
            .unwrap();

        assert!(!logger.called());
        assert_eq!(api.openapi, "3.0.0");
        assert_eq!(api.info.as_ref().unwrap().version, "1.2.3");

        let get = &api.paths["/pets/{id}"]["get"];
        assert_eq!(get.operation_id.as_deref(), Some("getPetsId"));
        assert_eq!(get.parameters[0].required, Some(true));
        assert_eq!(get.responses["200"].description, "found");

        let post = &api.paths["/pets"]["post"];
        assert_eq!(post.operation_id.as_deref(), Some("addPet"));
        assert_eq!(post.responses["201"].description, "created");

        let tags: Vec<&str> = api.tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(tags, vec!["pets", "store"]);

        let pet = &api.components.schemas["Pet"];
        assert_eq!(pet.required, vec!["name"]);
        assert_eq!(pet.properties["name"].kind.as_deref(), Some("string"));
    }

    #[test]
    fn registered_processors_run_after_defaults() {
        let (_dir, path) = write_fixture(
            "/// @OA\\Info(title=\"t\", version=\"1\")\n/// @OA\\Get(path=\"/b\")\n/// @OA\\Get(path=\"/a\")\n",
        );
        let logger = Logger::new(false);
        let faults = FaultPolicy::install(&logger, E_ALL);
        let mut generator = Generator::new(&faults).with_version("3.1.0");
        generator.add_processor(processors::resolve("SortPaths").unwrap());
        let api = generator
            .generate(vec![path], &Analyzer::reflection())
            .unwrap();
        assert_eq!(api.openapi, "3.1.0");
        assert_eq!(api.paths.keys().collect::<Vec<_>>(), vec!["/a", "/b"]);
    }

    #[test]
    fn orphans_and_missing_info_are_warnings() {
        let (_dir, path) = write_fixture("/// @OA\\Response(response=200)\n/// @OA\\Bogus()\n");
        let logger = Logger::new(false);
        let faults = FaultPolicy::install(&logger, E_ALL);
        let api = Generator::new(&faults)
            .generate(vec![path], &Analyzer::reflection())
            .unwrap();
        assert!(api.paths.is_empty());
        assert!(logger.called());
    }

    #[test]
    fn undefined_constant_is_fatal() {
        let (_dir, path) = write_fixture("/// @OA\\Info(title=\"t\", version=MISSING)\n");
        let logger = Logger::new(false);
        let faults = FaultPolicy::install(&logger, E_ALL);
        let err = Generator::new(&faults)
            .generate(vec![path], &Analyzer::reflection())
            .unwrap_err();
        assert_eq!(err.downcast_ref::<Terminate>(), Some(&Terminate { code: 1 }));
    }

    #[test]
    fn unsupported_version_is_reported_but_not_fatal() {
        let (_dir, path) = write_fixture(
            "/// @OA\\Info(title=\"t\", version=\"1\")\n/// @OA\\Get(path=\"/a\")\n",
        );
        let logger = Logger::new(false);
        let faults = FaultPolicy::install(&logger, E_ALL);
        let api = Generator::new(&faults)
            .with_version("2.0")
            .generate(vec![path], &Analyzer::token())
            .unwrap();
        assert_eq!(api.openapi, "2.0");
        assert!(logger.called());
    }
}
