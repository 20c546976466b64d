use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_ssm::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_ssm::primitives::DateTimeFormat;
use aws_sdk_ssm::types::{ParameterMetadata, ParameterType};
use aws_sdk_ssm::Client;
use std::fmt;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error(r#"The parameter "{0}" does not exist!"#)]
    NotFound(String),
    #[error(r#"The parameter "{0}" already exists!"#)]
    AlreadyExists(String),
    #[error("Access to the parameter store was denied: {0}")]
    AccessDenied(String),
    #[error("The parameter store rejected the request: {0}")]
    Validation(String),
    #[error("The parameter store could not be reached: {0}")]
    Unavailable(String),
}

/// The type a parameter is stored as.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParameterKind {
    String,
    StringList,
    SecureString,
}

impl ParameterKind {
    pub const ALL: [ParameterKind; 3] = [
        ParameterKind::String,
        ParameterKind::StringList,
        ParameterKind::SecureString,
    ];

    fn from_remote(remote: &ParameterType) -> Self {
        match remote {
            ParameterType::StringList => ParameterKind::StringList,
            ParameterType::SecureString => ParameterKind::SecureString,
            _ => ParameterKind::String,
        }
    }
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParameterKind::String => "String",
            ParameterKind::StringList => "StringList",
            ParameterKind::SecureString => "SecureString",
        };
        write!(f, "{name}")
    }
}

impl From<ParameterKind> for ParameterType {
    fn from(kind: ParameterKind) -> Self {
        match kind {
            ParameterKind::String => ParameterType::String,
            ParameterKind::StringList => ParameterType::StringList,
            ParameterKind::SecureString => ParameterType::SecureString,
        }
    }
}

/// A single entry in the remote store. `value` is only populated by
/// [`ParameterStore::get_parameter`]; listings carry metadata alone.
#[derive(Clone, Debug)]
pub struct Parameter {
    pub name: String,
    pub kind: ParameterKind,
    pub value: Option<String>,
    pub description: Option<String>,
    pub last_modified: Option<String>,
}

impl Parameter {
    /// Menu label: name and kind, plus the description when one is set.
    pub fn label(&self) -> String {
        let mut label = format!("{} ({})", self.name, self.kind);
        if let Some(description) = &self.description {
            if !description.is_empty() {
                label.push_str(" - ");
                label.push_str(description);
            }
        }
        label
    }

    fn from_metadata(metadata: &ParameterMetadata) -> Self {
        Self {
            name: metadata.name().unwrap_or_default().to_owned(),
            kind: metadata
                .r#type()
                .map(ParameterKind::from_remote)
                .unwrap_or(ParameterKind::String),
            value: None,
            description: metadata.description().map(str::to_owned),
            last_modified: metadata
                .last_modified_date()
                .and_then(|date| date.fmt(DateTimeFormat::DateTime).ok()),
        }
    }
}

#[async_trait]
pub trait ParameterStore {
    /// Fetch metadata for every parameter, sorted by name. Values are not
    /// included.
    async fn list_parameters(&self) -> Result<Vec<Parameter>, StoreError>;

    /// Fetch a single parameter with its value. SecureString values are
    /// plaintext only when `decrypt` is passed.
    async fn get_parameter(&self, name: &str, decrypt: bool) -> Result<Parameter, StoreError>;

    /// Create a parameter, or replace an existing one when `overwrite` is
    /// passed.
    async fn put_parameter(
        &self,
        name: &str,
        value: &str,
        kind: ParameterKind,
        description: Option<&str>,
        overwrite: bool,
    ) -> Result<(), StoreError>;

    async fn delete_parameter(&self, name: &str) -> Result<(), StoreError>;
}

/// Region override for the store connection. Resolved once at startup and
/// never mutated afterwards; everything else (credentials, default region)
/// comes from the ambient AWS configuration chain.
pub struct StoreConfig {
    pub region: Option<String>,
}

pub struct SsmStore {
    client: Client,
}

impl SsmStore {
    pub async fn connect(config: StoreConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = config.region {
            loader = loader.region(Region::new(region));
        }
        let shared = loader.load().await;
        Self {
            client: Client::new(&shared),
        }
    }
}

#[async_trait]
impl ParameterStore for SsmStore {
    async fn list_parameters(&self) -> Result<Vec<Parameter>, StoreError> {
        debug!("fetching parameter metadata");
        let mut pages = self
            .client
            .describe_parameters()
            .into_paginator()
            .send();
        let mut parameters = Vec::new();
        while let Some(page) = pages.next().await {
            let output = page.map_err(from_sdk)?;
            for metadata in output.parameters() {
                parameters.push(Parameter::from_metadata(metadata));
            }
        }
        parameters.sort_by(|a, b| a.name.cmp(&b.name));
        debug!(count = parameters.len(), "fetched parameter metadata");
        Ok(parameters)
    }

    async fn get_parameter(&self, name: &str, decrypt: bool) -> Result<Parameter, StoreError> {
        debug!(name, decrypt, "fetching parameter");
        let output = self
            .client
            .get_parameter()
            .name(name)
            .with_decryption(decrypt)
            .send()
            .await
            .map_err(|err| match err.as_service_error() {
                Some(service) if service.is_parameter_not_found() => {
                    StoreError::NotFound(name.to_owned())
                }
                _ => from_sdk(err),
            })?;
        let remote = output
            .parameter()
            .ok_or_else(|| StoreError::NotFound(name.to_owned()))?;
        Ok(Parameter {
            name: remote.name().unwrap_or(name).to_owned(),
            kind: remote
                .r#type()
                .map(ParameterKind::from_remote)
                .unwrap_or(ParameterKind::String),
            value: remote.value().map(str::to_owned),
            description: None,
            last_modified: remote
                .last_modified_date()
                .and_then(|date| date.fmt(DateTimeFormat::DateTime).ok()),
        })
    }

    async fn put_parameter(
        &self,
        name: &str,
        value: &str,
        kind: ParameterKind,
        description: Option<&str>,
        overwrite: bool,
    ) -> Result<(), StoreError> {
        debug!(name, %kind, overwrite, "writing parameter");
        self.client
            .put_parameter()
            .name(name)
            .value(value)
            .r#type(kind.into())
            .set_description(description.map(str::to_owned))
            .overwrite(overwrite)
            .send()
            .await
            .map_err(|err| match err.as_service_error() {
                Some(service) if service.is_parameter_already_exists() => {
                    StoreError::AlreadyExists(name.to_owned())
                }
                _ => from_sdk(err),
            })?;
        Ok(())
    }

    async fn delete_parameter(&self, name: &str) -> Result<(), StoreError> {
        debug!(name, "deleting parameter");
        self.client
            .delete_parameter()
            .name(name)
            .send()
            .await
            .map_err(|err| match err.as_service_error() {
                Some(service) if service.is_parameter_not_found() => {
                    StoreError::NotFound(name.to_owned())
                }
                _ => from_sdk(err),
            })?;
        Ok(())
    }
}

/// Translate an SDK failure into the local taxonomy. Modeled variants are
/// handled at the call sites; everything else is classified by error code,
/// with transport failures surfacing as [`StoreError::Unavailable`].
fn from_sdk<E, R>(err: SdkError<E, R>) -> StoreError
where
    E: ProvideErrorMetadata,
{
    match err.as_service_error() {
        Some(service) => {
            let message = service
                .message()
                .map(str::to_owned)
                .unwrap_or_else(|| "the request was rejected".to_owned());
            classify(service.code(), &message)
        }
        None => StoreError::Unavailable(transport_message(&err)),
    }
}

fn classify(code: Option<&str>, message: &str) -> StoreError {
    match code {
        Some("AccessDeniedException") | Some("AccessDenied") | Some("UnauthorizedOperation") => {
            StoreError::AccessDenied(message.to_owned())
        }
        Some("ValidationException")
        | Some("ParameterPatternMismatchException")
        | Some("InvalidAllowedPatternException")
        | Some("HierarchyTypeMismatchException")
        | Some("UnsupportedParameterType") => StoreError::Validation(message.to_owned()),
        _ => StoreError::Unavailable(message.to_owned()),
    }
}

fn transport_message<E, R>(err: &SdkError<E, R>) -> String {
    match err {
        SdkError::TimeoutError(_) => "the request timed out".to_owned(),
        SdkError::DispatchFailure(_) => "the request could not be sent".to_owned(),
        _ => "the response could not be processed".to_owned(),
    }
}

#[cfg(test)]
pub(crate) mod memory {
    use super::{Parameter, ParameterKind, ParameterStore, StoreError};
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Clone)]
    struct Entry {
        kind: ParameterKind,
        value: String,
        description: Option<String>,
    }

    /// In-memory stand-in for the remote store, with call counters.
    #[derive(Default)]
    pub struct MemoryStore {
        entries: Mutex<BTreeMap<String, Entry>>,
        puts: AtomicUsize,
        deletes: AtomicUsize,
    }

    impl MemoryStore {
        pub fn with_parameter(name: &str, kind: ParameterKind, value: &str) -> Self {
            let store = Self::default();
            store.entries.lock().unwrap().insert(
                name.to_owned(),
                Entry {
                    kind,
                    value: value.to_owned(),
                    description: None,
                },
            );
            store
        }

        pub fn put_calls(&self) -> usize {
            self.puts.load(Ordering::SeqCst)
        }

        pub fn delete_calls(&self) -> usize {
            self.deletes.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ParameterStore for MemoryStore {
        async fn list_parameters(&self) -> Result<Vec<Parameter>, StoreError> {
            let entries = self.entries.lock().unwrap();
            Ok(entries
                .iter()
                .map(|(name, entry)| Parameter {
                    name: name.clone(),
                    kind: entry.kind,
                    value: None,
                    description: entry.description.clone(),
                    last_modified: None,
                })
                .collect())
        }

        async fn get_parameter(&self, name: &str, _decrypt: bool) -> Result<Parameter, StoreError> {
            let entries = self.entries.lock().unwrap();
            let entry = entries
                .get(name)
                .ok_or_else(|| StoreError::NotFound(name.to_owned()))?;
            Ok(Parameter {
                name: name.to_owned(),
                kind: entry.kind,
                value: Some(entry.value.clone()),
                description: entry.description.clone(),
                last_modified: None,
            })
        }

        async fn put_parameter(
            &self,
            name: &str,
            value: &str,
            kind: ParameterKind,
            description: Option<&str>,
            overwrite: bool,
        ) -> Result<(), StoreError> {
            self.puts.fetch_add(1, Ordering::SeqCst);
            let mut entries = self.entries.lock().unwrap();
            if entries.contains_key(name) && !overwrite {
                return Err(StoreError::AlreadyExists(name.to_owned()));
            }
            entries.insert(
                name.to_owned(),
                Entry {
                    kind,
                    value: value.to_owned(),
                    description: description.map(str::to_owned),
                },
            );
            Ok(())
        }

        async fn delete_parameter(&self, name: &str) -> Result<(), StoreError> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            self.entries
                .lock()
                .unwrap()
                .remove(name)
                .map(|_| ())
                .ok_or_else(|| StoreError::NotFound(name.to_owned()))
        }
    }
}
