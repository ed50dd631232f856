//! # Edit Session Management
//!
//! One [`Editor`] per rich-text field. It owns the field's state and is the
//! single writer for it: every input goes through the plugin pipeline and the
//! command layer, and every change to the document is recorded for undo.
//!
//! Saving is gated: a blank required field or a document with schema
//! violations is refused before the store is called.

use crate::blank::is_blank;
use crate::commands::{Command, CommandContext};
use crate::config::EditorConfig;
use crate::document::{Document, Value};
use crate::errors::EditorError;
use crate::field::{check_field, FieldError, FieldKey};
use crate::plugins::{Input, KeyPress, PluginPipeline};
use crate::schema::{validate_with, RuleRegistry, Violation};
use crate::selection::{EditorState, Selection};
use crate::store::{DocumentStore, FileUploader};
use crate::undo_stack::UndoStack;
use tracing::{debug, info, warn};

/// Editor for a single field
#[derive(Debug)]
pub struct Editor {
    key: FieldKey,
    state: EditorState,
    required: bool,
    config: EditorConfig,
    context: CommandContext,
    pipeline: PluginPipeline,
    rules: RuleRegistry,
    history: UndoStack,
}

impl Editor {
    pub fn new(key: FieldKey, value: Value, config: EditorConfig) -> Self {
        let pipeline = PluginPipeline::new();
        let state = pipeline.settle(EditorState::new(value.document).focus_end());
        Self {
            key,
            state,
            required: false,
            context: config.command_context(),
            history: UndoStack::with_max_levels(config.undo_levels),
            config,
            pipeline,
            rules: RuleRegistry::new(),
        }
    }

    /// Editor over a persisted field; absent or malformed JSON starts blank
    pub fn from_json(key: FieldKey, json: Option<&str>, config: EditorConfig) -> Self {
        Self::new(key, Value::from_json_or_blank(json), config)
    }

    /// Editor over whatever `store` holds for `key`
    pub fn load(
        key: FieldKey,
        store: &dyn DocumentStore,
        config: EditorConfig,
    ) -> Result<Self, EditorError> {
        let value = store.load(&key)?.unwrap_or_else(Value::blank);
        Ok(Self::new(key, value, config))
    }

    /// Mark the field as required for [`Editor::save`]
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_rules(mut self, rules: RuleRegistry) -> Self {
        self.rules = rules;
        self
    }

    pub fn key(&self) -> &FieldKey {
        &self.key
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn document(&self) -> &Document {
        &self.state.document
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.state.selection.as_ref()
    }

    pub fn value(&self) -> Value {
        Value::new(self.state.document.clone())
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Run a command through the pipeline
    pub fn dispatch(&mut self, command: Command) -> Result<(), EditorError> {
        self.handle(Input::Command(command))
    }

    /// Run a key press through the pipeline
    pub fn handle_key(&mut self, key: KeyPress) -> Result<(), EditorError> {
        self.handle(Input::Key(key))
    }

    pub fn handle(&mut self, input: Input) -> Result<(), EditorError> {
        let description = match &input {
            Input::Command(command) => command.name(),
            Input::Key(_) => "key",
        };
        let next = self.pipeline.run(&self.state, input, &self.context)?;

        // selection-only changes are not undo steps
        if next.document != self.state.document {
            let before = std::mem::replace(&mut self.state, next);
            self.history.record(before, self.state.clone(), description);
        } else {
            self.state = next;
        }
        Ok(())
    }

    /// Insert a table with the configured dimensions
    pub fn insert_table(&mut self) -> Result<(), EditorError> {
        self.dispatch(Command::InsertTable {
            rows: self.config.table_rows,
            columns: self.config.table_columns,
        })
    }

    /// Upload `bytes` and insert the resulting image at the caret
    pub fn insert_uploaded_image(
        &mut self,
        uploader: &mut dyn FileUploader,
        name: &str,
        bytes: &[u8],
    ) -> Result<(), EditorError> {
        let src = uploader.upload(name, bytes)?;
        debug!(field = %self.key, name, src = %src, "Uploaded image");
        self.dispatch(Command::InsertImage { src })
    }

    /// Group the next edits into one undo step
    pub fn begin_batch(&mut self, description: &str) {
        self.history.begin_batch();
        self.history.set_batch_description(description);
    }

    pub fn end_batch(&mut self) {
        self.history.end_batch();
    }

    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(state) => {
                self.state = state;
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(state) => {
                self.state = state;
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn is_blank(&self) -> bool {
        is_blank(&self.state.document)
    }

    pub fn violations(&self) -> Vec<Violation> {
        validate_with(&self.state.document, &self.rules)
    }

    /// Whether the field may be submitted
    pub fn check(&self) -> Result<(), FieldError> {
        check_field(&self.key, &self.state.document, self.required, &self.rules)
    }

    /// Check, then hand a snapshot of the document to `store`
    pub fn save(&self, store: &mut dyn DocumentStore) -> Result<Value, EditorError> {
        if let Err(e) = self.check() {
            warn!(field = %self.key, error = %e, "Refusing to save field");
            return Err(e.into());
        }
        let snapshot = self.value();
        store.save(&self.key, &snapshot)?;
        info!(field = %self.key, blocks = snapshot.document.nodes.len(), "Saved field");
        Ok(snapshot)
    }
}
