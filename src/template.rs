use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error(r#"The template "{0}" does not exist!"#)]
    NotFound(String),
    #[error(r#"The template "{name}" could not be parsed: {source}"#)]
    Parse {
        name: String,
        source: serde_json::Error,
    },
    #[error("Encountered IO error when reading the template directory")]
    Io(#[from] std::io::Error),
}

/// A creation preset loaded from a JSON file.
///
/// The contract is a single required top-level `value` string. Any other
/// keys are permitted and ignored; name, type and description are always
/// entered at the prompt.
#[derive(Debug, Deserialize)]
pub struct Template {
    pub value: String,
}

/// Directory of `.json` presets, read fresh on every invocation.
pub struct TemplateDir {
    dir: Option<PathBuf>,
}

impl TemplateDir {
    const TEMPLATE_EXTENSION: &'static str = "json";

    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    /// The fixed template location under the user's config directory.
    pub fn resolve() -> Self {
        Self {
            dir: dirs::config_dir().map(|dir| dir.join("pstore").join("templates")),
        }
    }

    /// Template names, sorted. A missing directory is an empty list, not an
    /// error.
    pub fn list(&self) -> Result<Vec<String>, TemplateError> {
        let dir = match &self.dir {
            Some(dir) if dir.is_dir() => dir,
            _ => return Ok(Vec::new()),
        };
        let mut names = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|extension| extension.to_str())
                == Some(Self::TEMPLATE_EXTENSION)
            {
                if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                    names.push(stem.to_owned());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn load(&self, name: &str) -> Result<Template, TemplateError> {
        let path = match &self.dir {
            Some(dir) => dir.join(format!("{name}.{}", Self::TEMPLATE_EXTENSION)),
            None => return Err(TemplateError::NotFound(name.to_owned())),
        };
        if !path.exists() {
            return Err(TemplateError::NotFound(name.to_owned()));
        }
        let reader = BufReader::new(File::open(&path)?);
        serde_json::from_reader(reader).map_err(|source| TemplateError::Parse {
            name: name.to_owned(),
            source,
        })
    }
}

#[cfg(test)]
mod test {
    use super::{TemplateDir, TemplateError};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn list_should_return_sorted_names_of_json_files_only() {
        let tmpdir = tempdir().unwrap();
        fs::write(tmpdir.path().join("redis-url.json"), r#"{"value": "a"}"#).unwrap();
        fs::write(tmpdir.path().join("api-key.json"), r#"{"value": "b"}"#).unwrap();
        fs::write(tmpdir.path().join("notes.txt"), "not a template").unwrap();
        let templates = TemplateDir::new(tmpdir.path());
        assert_eq!(templates.list().unwrap(), vec!["api-key", "redis-url"]);
    }

    #[test]
    fn list_of_missing_directory_should_be_empty() {
        let tmpdir = tempdir().unwrap();
        let templates = TemplateDir::new(tmpdir.path().join("nowhere"));
        assert!(templates.list().unwrap().is_empty());
    }

    #[test]
    fn load_should_extract_the_value_field() {
        let tmpdir = tempdir().unwrap();
        fs::write(
            tmpdir.path().join("database-connection.json"),
            r#"{"value": "postgresql://localhost:5432/mydb"}"#,
        )
        .unwrap();
        let templates = TemplateDir::new(tmpdir.path());
        let template = templates.load("database-connection").unwrap();
        assert_eq!(template.value, "postgresql://localhost:5432/mydb");
    }

    #[test]
    fn load_should_ignore_advisory_fields() {
        let tmpdir = tempdir().unwrap();
        fs::write(
            tmpdir.path().join("full.json"),
            r#"{"value": "v", "name": "/ignored", "type": "String", "description": "ignored"}"#,
        )
        .unwrap();
        let templates = TemplateDir::new(tmpdir.path());
        assert_eq!(templates.load("full").unwrap().value, "v");
    }

    #[test]
    fn load_without_a_value_field_should_be_a_parse_error() {
        let tmpdir = tempdir().unwrap();
        fs::write(tmpdir.path().join("broken.json"), r#"{"name": "/x"}"#).unwrap();
        let templates = TemplateDir::new(tmpdir.path());
        let result = templates.load("broken");
        assert!(matches!(result, Err(TemplateError::Parse { name, .. }) if name == "broken"));
    }

    #[test]
    fn load_of_invalid_json_should_be_a_parse_error() {
        let tmpdir = tempdir().unwrap();
        fs::write(tmpdir.path().join("garbage.json"), "{ not json").unwrap();
        let templates = TemplateDir::new(tmpdir.path());
        assert!(matches!(
            templates.load("garbage"),
            Err(TemplateError::Parse { .. })
        ));
    }

    #[test]
    fn load_of_missing_template_should_give_a_meaningful_error() {
        let tmpdir = tempdir().unwrap();
        let templates = TemplateDir::new(tmpdir.path());
        let result = templates.load("missing");
        assert!(result.is_err());
        assert_eq!(
            result.err().unwrap().to_string(),
            r#"The template "missing" does not exist!"#
        );
    }
}
