use crate::cli::{Action, Args};
use crate::output::TerminalOutput;
use crate::prompt::{Prompt, PromptError};
use crate::secure::ZeroizedString;
use crate::store::{Parameter, ParameterKind, ParameterStore};
use crate::template::TemplateDir;
use anyhow::Context;
use std::io::Write;
use thiserror::Error;

const CREATE_NEW: &str = "[Create new parameter]";
const DELETE_PARAMETER: &str = "[Delete a parameter]";
const QUIT: &str = "[Quit]";

/// The user declined a confirmation in a single-shot command.
#[derive(Error, Debug)]
#[error("operation cancelled")]
pub struct UserCancelled;

pub async fn handle<P: Prompt, S: ParameterStore, W: Write>(
    handler: &mut Handler<P, S, W>,
    args: &Args,
) -> anyhow::Result<HandlerResult> {
    match &args.action {
        Action::List => handler.browse().await,
        Action::Create => handler.create().await,
        Action::Get { name } => handler.get(name).await,
        Action::Delete { name, force } => handler.delete(name, *force).await,
    }
}

pub enum HandlerResult {
    Browsed,
    Created(String),
    Fetched(ZeroizedString),
    Deleted(String),
}

/// States of the interactive `list` menu. Each turn of the loop consumes
/// one state and produces the next; `Quit` is the only exit.
enum BrowseState {
    Browsing,
    Viewing(String),
    Updating(String),
    Creating,
    Deleting,
    Quit,
}

pub struct Handler<P, S, W> {
    prompt: P,
    store: S,
    templates: TemplateDir,
    output: TerminalOutput<W>,
}

impl<P: Prompt, S: ParameterStore, W: Write> Handler<P, S, W> {
    pub fn new(prompt: P, store: S, templates: TemplateDir, output: TerminalOutput<W>) -> Self {
        Self {
            prompt,
            store,
            templates,
            output,
        }
    }

    /// The `list` command: browse the store and act on parameters until the
    /// user quits. Failures of a single action are reported and return to
    /// the menu; end of input aborts the whole invocation.
    pub async fn browse(&mut self) -> anyhow::Result<HandlerResult> {
        let mut state = BrowseState::Browsing;
        loop {
            state = match state {
                BrowseState::Browsing => self.browse_menu().await?,
                BrowseState::Viewing(name) => self.view(&name).await?,
                BrowseState::Updating(name) => self.update(&name).await?,
                BrowseState::Creating => {
                    match self.create_flow().await {
                        Ok(Some(name)) => self
                            .output
                            .write_line(&format!(r#"Created parameter "{name}"."#))?,
                        Ok(None) => self.output.write_line("Cancelled.")?,
                        Err(err) if err.downcast_ref::<PromptError>().is_some() => {
                            return Err(err)
                        }
                        Err(err) => self.output.write_line(&format!("Error: {err:#}"))?,
                    }
                    BrowseState::Browsing
                }
                BrowseState::Deleting => self.delete_menu().await?,
                BrowseState::Quit => {
                    self.output.write_line("Goodbye!")?;
                    return Ok(HandlerResult::Browsed);
                }
            };
        }
    }

    async fn browse_menu(&mut self) -> anyhow::Result<BrowseState> {
        self.output.write_line("Fetching parameters from the store...")?;
        let parameters = self.store.list_parameters().await?;
        if parameters.is_empty() {
            self.output.write_line("No parameters found.")?;
        }
        let mut options: Vec<String> = parameters.iter().map(Parameter::label).collect();
        options.push(CREATE_NEW.to_owned());
        if !parameters.is_empty() {
            options.push(DELETE_PARAMETER.to_owned());
        }
        options.push(QUIT.to_owned());
        let choice = self.prompt.select("Select a parameter:", &options)?;
        if choice >= parameters.len() {
            return Ok(match options[choice].as_str() {
                CREATE_NEW => BrowseState::Creating,
                DELETE_PARAMETER => BrowseState::Deleting,
                _ => BrowseState::Quit,
            });
        }
        let name = parameters[choice].name.clone();
        let action = self.prompt.select(
            &format!(r#"What do you want to do with "{name}"?"#),
            &["View".to_owned(), "Update".to_owned()],
        )?;
        Ok(match action {
            0 => BrowseState::Viewing(name),
            _ => BrowseState::Updating(name),
        })
    }

    async fn view(&mut self, name: &str) -> anyhow::Result<BrowseState> {
        match self.store.get_parameter(name, true).await {
            Ok(parameter) => {
                let value = ZeroizedString::new(parameter.value.unwrap_or_default());
                self.output
                    .write_line(&format!("{} ({})", parameter.name, parameter.kind))?;
                if let Some(modified) = &parameter.last_modified {
                    self.output.write_line(&format!("Last modified: {modified}"))?;
                }
                self.output.write_line(value.as_ref())?;
            }
            Err(err) => self.output.write_line(&format!("Error: {err}"))?,
        }
        Ok(BrowseState::Browsing)
    }

    async fn update(&mut self, name: &str) -> anyhow::Result<BrowseState> {
        let current = match self.store.get_parameter(name, true).await {
            Ok(parameter) => parameter,
            Err(err) => {
                self.output.write_line(&format!("Error: {err}"))?;
                return Ok(BrowseState::Browsing);
            }
        };
        let kind = current.kind;
        let current_value = ZeroizedString::new(current.value.unwrap_or_default());
        let new_value = self
            .prompt
            .text("Enter the new value", Some(current_value.as_ref()))?;
        if !self.prompt.confirm(&format!(r#"Update "{name}"?"#))? {
            self.output.write_line("Cancelled.")?;
            return Ok(BrowseState::Browsing);
        }
        match self.store.put_parameter(name, &new_value, kind, None, true).await {
            Ok(()) => self
                .output
                .write_line(&format!(r#"Updated parameter "{name}"."#))?,
            Err(err) => self.output.write_line(&format!("Error: {err}"))?,
        }
        Ok(BrowseState::Browsing)
    }

    async fn delete_menu(&mut self) -> anyhow::Result<BrowseState> {
        let parameters = self.store.list_parameters().await?;
        if parameters.is_empty() {
            self.output.write_line("No parameters found.")?;
            return Ok(BrowseState::Browsing);
        }
        let options: Vec<String> = parameters.iter().map(Parameter::label).collect();
        let choice = self.prompt.select("Select a parameter to delete:", &options)?;
        let name = parameters[choice].name.clone();
        if !self.prompt.confirm(&format!(r#"Delete "{name}"?"#))? {
            self.output.write_line("Cancelled.")?;
            return Ok(BrowseState::Browsing);
        }
        match self.store.delete_parameter(&name).await {
            Ok(()) => self
                .output
                .write_line(&format!(r#"Deleted parameter "{name}"."#))?,
            Err(err) => self.output.write_line(&format!("Error: {err}"))?,
        }
        Ok(BrowseState::Browsing)
    }

    /// The `create` command.
    pub async fn create(&mut self) -> anyhow::Result<HandlerResult> {
        match self.create_flow().await? {
            Some(name) => Ok(HandlerResult::Created(name)),
            None => Err(UserCancelled.into()),
        }
    }

    /// Collect name, value, kind and description, confirm, and create the
    /// parameter without overwrite. Returns `None` when the user declines
    /// the confirmation.
    async fn create_flow(&mut self) -> anyhow::Result<Option<String>> {
        let mode = self.prompt.select(
            "How do you want to create the parameter?",
            &[
                "Create new parameter".to_owned(),
                "Create from a template".to_owned(),
            ],
        )?;
        let prefill = if mode == 1 { self.template_value()? } else { None };
        let name = self
            .required_text("Parameter name (e.g. /app/config/database-url)", None)?;
        let value = self.required_text("Parameter value", prefill.as_deref())?;
        let kinds: Vec<String> = ParameterKind::ALL.iter().map(ToString::to_string).collect();
        let kind = ParameterKind::ALL[self.prompt.select("Parameter type:", &kinds)?];
        let description = self.prompt.text("Description (optional)", None)?;
        let description = if description.is_empty() {
            None
        } else {
            Some(description)
        };
        if !self
            .prompt
            .confirm(&format!(r#"Create parameter "{name}"?"#))?
        {
            return Ok(None);
        }
        self.store
            .put_parameter(&name, &value, kind, description.as_deref(), false)
            .await
            .with_context(|| format!(r#"could not create parameter "{name}""#))?;
        Ok(Some(name))
    }

    /// Value pre-fill from a chosen template. `None` means manual entry,
    /// either by choice of the directory being empty or because the chosen
    /// template failed to parse.
    fn template_value(&mut self) -> anyhow::Result<Option<String>> {
        let names = self.templates.list()?;
        if names.is_empty() {
            self.output
                .write_line("No templates found, falling back to manual entry.")?;
            return Ok(None);
        }
        let choice = self.prompt.select("Select a template:", &names)?;
        match self.templates.load(&names[choice]) {
            Ok(template) => Ok(Some(template.value)),
            Err(err) => {
                self.output.write_line(&format!("Error: {err}"))?;
                self.output.write_line("Falling back to manual entry.")?;
                Ok(None)
            }
        }
    }

    fn required_text(&mut self, prompt: &str, default: Option<&str>) -> anyhow::Result<String> {
        loop {
            let value = self.prompt.text(prompt, default)?;
            if !value.is_empty() {
                return Ok(value);
            }
            self.output.write_line("A value is required.")?;
        }
    }

    /// The `get` command: fetch with decryption and hand the raw value to
    /// the caller.
    pub async fn get(&mut self, name: &str) -> anyhow::Result<HandlerResult> {
        let parameter = self.store.get_parameter(name, true).await?;
        Ok(HandlerResult::Fetched(ZeroizedString::new(
            parameter.value.unwrap_or_default(),
        )))
    }

    /// The `delete` command. `force` skips the confirmation.
    pub async fn delete(&mut self, name: &str, force: bool) -> anyhow::Result<HandlerResult> {
        if !force
            && !self
                .prompt
                .confirm(&format!(r#"Delete parameter "{name}"?"#))?
        {
            return Err(UserCancelled.into());
        }
        self.store.delete_parameter(name).await?;
        Ok(HandlerResult::Deleted(name.to_owned()))
    }
}
