// File: src/validator.rs
// Purpose: Validator instance owning registries, caches and the scratch pool

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::builtins;
use crate::cache::{CompiledField, CompiledStruct, StructCache, TagCache};
use crate::config::ValidatorConfig;
use crate::engine::{exclude_paths, include_paths, Filter, Walk};
use crate::errors::{InvalidValidationError, RegisterError, ValidateError, ValidationErrors};
use crate::extract::CustomTypes;
use crate::field_level::{FieldLevel, Predicate};
use crate::pool::ScratchPool;
use crate::reflect::{FieldDescriptor, Record, Reflect};
use crate::struct_level::{struct_hook, StructHook, StructLevel};
use crate::tag::{has_restricted_chars, is_restricted_tag, Chain, Rule, TagCompiler, SKIP_VALIDATION_TAG};
use crate::value::{FieldValue, Value};

/// Resolves a field's display name; `None` or empty falls back to the identifier
pub type TagNameFn = Arc<dyn Fn(&FieldDescriptor) -> Option<String> + Send + Sync>;

/// Owns every piece of validation state for a process
///
/// Registration takes `&mut self`; validation takes `&self` and may run from
/// many threads at once.
pub struct Validator {
    pub(crate) config: ValidatorConfig,
    pub(crate) custom_types: CustomTypes,
    pub(crate) pool: ScratchPool,
    rules: HashMap<String, Rule>,
    aliases: HashMap<String, String>,
    struct_hooks: HashMap<TypeId, StructHook>,
    tag_name_fn: Option<TagNameFn>,
    structs: StructCache,
    tags: TagCache,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator {
    /// Validator with every built-in rule and the default aliases
    pub fn new() -> Self {
        Self::with_config(ValidatorConfig::default())
    }

    pub fn with_config(config: ValidatorConfig) -> Self {
        let mut validator = Self {
            pool: ScratchPool::new(config.pool_capacity),
            custom_types: CustomTypes::default(),
            rules: HashMap::new(),
            aliases: HashMap::new(),
            struct_hooks: HashMap::new(),
            tag_name_fn: None,
            structs: StructCache::new(),
            tags: TagCache::new(),
            config,
        };

        for (name, func, run_on_nil) in builtins::all() {
            validator.rules.insert(name.to_string(), Rule { func, run_on_nil });
        }
        for (alias, tags) in builtins::ALIASES {
            validator.aliases.insert(alias.to_string(), tags.to_string());
        }

        let configured: Vec<(String, String)> =
            validator.config.aliases.iter().map(|(a, t)| (a.clone(), t.clone())).collect();
        for (alias, tags) in configured {
            if let Err(err) = validator.register_alias(&alias, &tags) {
                warn!(alias = %alias, error = %err, "skipping configured alias");
            }
        }

        debug!(
            rules = validator.rules.len(),
            aliases = validator.aliases.len(),
            tag_name = %validator.config.tag_name,
            "validator ready"
        );
        validator
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Tag key read from each field descriptor
    pub fn set_tag_name(&mut self, name: impl Into<String>) {
        self.config.tag_name = name.into();
        self.clear_caches();
    }

    /// Registers a display-name hook, e.g. to prefer serialization names
    pub fn register_tag_name_fn<F>(&mut self, f: F)
    where
        F: Fn(&FieldDescriptor) -> Option<String> + Send + Sync + 'static,
    {
        self.tag_name_fn = Some(Arc::new(f));
        self.clear_caches();
    }

    /// Registers a rule that is skipped (fails) on nil values
    ///
    /// # Panics
    ///
    /// When `name` is a control tag or contains a restricted character.
    pub fn register_validation<F>(&mut self, name: &str, f: F) -> Result<(), RegisterError>
    where
        F: Fn(&FieldLevel<'_>) -> bool + Send + Sync + 'static,
    {
        self.register_rule(name, Arc::new(f), false)
    }

    /// Registers a rule that is also evaluated when the value is nil
    pub fn register_validation_on_nil<F>(&mut self, name: &str, f: F) -> Result<(), RegisterError>
    where
        F: Fn(&FieldLevel<'_>) -> bool + Send + Sync + 'static,
    {
        self.register_rule(name, Arc::new(f), true)
    }

    fn register_rule(&mut self, name: &str, func: Predicate, run_on_nil: bool) -> Result<(), RegisterError> {
        if name.is_empty() {
            return Err(RegisterError::EmptyName);
        }
        if is_restricted_tag(name) || has_restricted_chars(name) {
            panic!(
                "Tag '{name}' either contains restricted characters or is the same as a restricted tag needed for normal operation"
            );
        }

        self.rules.insert(name.to_string(), Rule { func, run_on_nil });
        self.clear_caches();
        debug!(rule = name, run_on_nil, "registered validation");
        Ok(())
    }

    /// Registers `alias` as shorthand for `tags`
    ///
    /// # Panics
    ///
    /// When `alias` is a control tag or contains a restricted character.
    pub fn register_alias(&mut self, alias: &str, tags: &str) -> Result<(), RegisterError> {
        if alias.is_empty() {
            return Err(RegisterError::EmptyName);
        }
        if tags.is_empty() {
            return Err(RegisterError::EmptyAlias(alias.to_string()));
        }
        if is_restricted_tag(alias) || has_restricted_chars(alias) {
            panic!(
                "Alias '{alias}' either contains restricted characters or is the same as a restricted tag needed for normal operation"
            );
        }

        self.aliases.insert(alias.to_string(), tags.to_string());
        self.clear_caches();
        debug!(alias, tags, "registered alias");
        Ok(())
    }

    /// Registers a hook run after the fields of every `T` are validated
    pub fn register_struct_validation<T, F>(&mut self, f: F)
    where
        T: Record,
        F: Fn(&mut StructLevel<'_>, &T) + Send + Sync + 'static,
    {
        let hook = struct_hook(move |level: &mut StructLevel<'_>| {
            if let Some(current) = level.current::<T>() {
                f(level, current);
            }
        });

        self.struct_hooks.insert(TypeId::of::<T>(), hook);
        self.clear_caches();
        debug!(record = std::any::type_name::<T>(), "registered struct validation");
    }

    /// Registers a substitution for values of type `T`
    pub fn register_custom_type<T: Reflect>(&mut self, func: for<'a> fn(&'a T) -> Value<'a>) {
        self.custom_types.register::<T>(func);
        self.clear_caches();
        debug!(custom_type = std::any::type_name::<T>(), "registered custom type");
    }

    fn clear_caches(&mut self) {
        self.structs.clear();
        self.tags.clear();
    }

    /// Validates every field of a record
    pub fn validate(&self, value: &dyn Reflect) -> Result<(), ValidateError> {
        let record = self.top_record(value)?;
        trace!(record = record.descriptor().name, "validating record");
        self.finish(Walk::new(self, value, Filter::All, None).run_record(record))
    }

    /// Validates only `fields` (structural paths such as `Inner.Name`) and the
    /// records leading to them
    pub fn validate_partial(&self, value: &dyn Reflect, fields: &[&str]) -> Result<(), ValidateError> {
        let record = self.top_record(value)?;
        let paths = include_paths(record.descriptor().name, fields);
        trace!(record = record.descriptor().name, fields = paths.len(), "validating partial record");
        self.finish(Walk::new(self, value, Filter::Include(paths), None).run_record(record))
    }

    /// Validates every field except `fields`
    pub fn validate_except(&self, value: &dyn Reflect, fields: &[&str]) -> Result<(), ValidateError> {
        let record = self.top_record(value)?;
        let paths = exclude_paths(record.descriptor().name, fields);
        trace!(record = record.descriptor().name, fields = paths.len(), "validating record with exclusions");
        self.finish(Walk::new(self, value, Filter::Exclude(paths), None).run_record(record))
    }

    /// Validates fields for which `skip` returns `false`
    ///
    /// `skip` receives the structural namespace, e.g. `User.Inner.Name`.
    pub fn validate_filtered(&self, value: &dyn Reflect, skip: &dyn Fn(&str) -> bool) -> Result<(), ValidateError> {
        let record = self.top_record(value)?;
        trace!(record = record.descriptor().name, "validating filtered record");
        self.finish(Walk::new(self, value, Filter::Skip(skip), None).run_record(record))
    }

    /// Validates a record, checking `cancel` before entering each record
    pub fn validate_with_cancel(&self, value: &dyn Reflect, cancel: &AtomicBool) -> Result<(), ValidateError> {
        let record = self.top_record(value)?;
        trace!(record = record.descriptor().name, "validating record with cancellation");
        self.finish(Walk::new(self, value, Filter::All, Some(cancel)).run_record(record))
    }

    /// Validates a single value against `tag`
    pub fn var(&self, field: &dyn Reflect, tag: &str) -> Result<(), ValidationErrors> {
        self.var_with_value(field, field, tag)
    }

    /// Validates `field` against `tag`, with `other` as the parent and top
    /// value for cross-field rules
    pub fn var_with_value(&self, field: &dyn Reflect, other: &dyn Reflect, tag: &str) -> Result<(), ValidationErrors> {
        if tag.is_empty() || tag == SKIP_VALIDATION_TAG {
            return Ok(());
        }

        let chain = self.tag_chain(tag);
        let value = self.custom_types.extract(field);
        trace!(tag, "validating value");

        let errors = Walk::new(self, other, Filter::All, None).run_field(other, value, Option::as_deref(&*chain));
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors::from(errors))
        }
    }

    /// Compiled metadata for the record's type, compiling it on first use
    pub fn compiled_struct(&self, record: &dyn Record) -> Arc<CompiledStruct> {
        self.compiled(record)
    }

    pub fn cached_struct_count(&self) -> usize {
        self.structs.len()
    }

    /// Dereferences and custom-type-maps a value the way the engine does
    pub fn extract<'a>(&self, value: &'a dyn Reflect) -> FieldValue<'a> {
        self.custom_types.extract(value)
    }

    fn top_record<'a>(&self, value: &'a dyn Reflect) -> Result<&'a dyn Record, ValidateError> {
        let top = self.custom_types.extract(value);
        match top.value {
            Value::Struct(record) => Ok(record),
            _ => Err(InvalidValidationError { type_name: top.type_name.to_string() }.into()),
        }
    }

    fn finish(&self, (errors, cancelled): (Vec<crate::errors::FieldError>, bool)) -> Result<(), ValidateError> {
        if cancelled {
            return Err(ValidateError::Cancelled);
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidateError::Failed(ValidationErrors::from(errors)))
        }
    }

    fn compiler(&self) -> TagCompiler<'_> {
        TagCompiler { rules: &self.rules, aliases: &self.aliases }
    }

    fn tag_chain(&self, tag: &str) -> Arc<Chain> {
        if let Some(chain) = self.tags.get(tag) {
            return chain;
        }
        self.tags
            .get_or_insert_with(tag.to_string(), || Arc::new(self.compiler().compile(tag, "")))
    }

    pub(crate) fn compiled(&self, record: &dyn Record) -> Arc<CompiledStruct> {
        let id = Any::type_id(record.as_any());
        self.structs.get_or_insert_with(id, || Arc::new(self.compile_struct(record, id)))
    }

    fn compile_struct(&self, record: &dyn Record, id: TypeId) -> CompiledStruct {
        let descriptor = record.descriptor();
        let compiler = self.compiler();
        let mut fields = Vec::with_capacity(descriptor.fields.len());

        for field in descriptor.fields {
            let tag = field.tag(&self.config.tag_name).unwrap_or_default();
            if tag == SKIP_VALIDATION_TAG {
                continue;
            }

            let custom_name = self
                .tag_name_fn
                .as_ref()
                .and_then(|name_fn| name_fn(field))
                .filter(|name| !name.is_empty());
            if custom_name.as_deref() == Some(SKIP_VALIDATION_TAG) {
                continue;
            }

            let chain = if tag.is_empty() { None } else { compiler.compile(tag, field.name) };
            fields.push(CompiledField {
                name: field.name,
                alt_name: custom_name.unwrap_or_else(|| field.name.to_string()),
                index: field.index,
                chain,
                indirect: field.indirect,
            });
        }

        let hook = self.struct_hooks.get(&id).cloned();
        debug!(
            record = descriptor.name,
            fields = fields.len(),
            struct_level = hook.is_some(),
            "compiled record"
        );

        CompiledStruct { name: descriptor.name, fields, hook }
    }
}
