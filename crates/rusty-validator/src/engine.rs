// File: src/engine.rs
// Purpose: Recursive traversal applying compiled chains to a value graph

use std::any::{Any, TypeId};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::errors::FieldError;
use crate::field_level::FieldLevel;
use crate::pool::Scratch;
use crate::reflect::{Record, Reflect};
use crate::struct_level::StructLevel;
use crate::tag::{Tag, TagKind, REQUIRED_TAG};
use crate::validator::Validator;
use crate::value::{is_zero, render_key, FieldValue, Value};

/// Which record fields a call visits, keyed by structural namespace
pub(crate) enum Filter<'f> {
    All,
    Include(HashSet<String>),
    Exclude(HashSet<String>),
    /// Returns `true` for fields to skip
    Skip(&'f dyn Fn(&str) -> bool),
}

/// Per-call traversal state
pub(crate) struct Walk<'v, 'a> {
    validator: &'v Validator,
    top: &'a dyn Reflect,
    scratch: Scratch,
    filter: Filter<'v>,
    cancel: Option<&'v AtomicBool>,
    cancelled: bool,
    visiting: Vec<(usize, TypeId)>,
}

impl<'v, 'a> Walk<'v, 'a> {
    pub fn new(
        validator: &'v Validator,
        top: &'a dyn Reflect,
        filter: Filter<'v>,
        cancel: Option<&'v AtomicBool>,
    ) -> Self {
        Self {
            validator,
            top,
            scratch: validator.pool.checkout(),
            filter,
            cancel,
            cancelled: false,
            visiting: Vec::new(),
        }
    }

    /// Validates a top-level record; returns collected errors and whether the
    /// walk was cancelled
    pub fn run_record(mut self, record: &'a dyn Record) -> (Vec<FieldError>, bool) {
        let top = self.top;
        self.validate_record(top, record, None);
        self.finish()
    }

    /// Validates a single value against a chain with no enclosing record
    pub fn run_field(mut self, parent: &'a dyn Reflect, value: FieldValue<'a>, chain: Option<&Tag>) -> Vec<FieldError> {
        self.traverse_field(parent, value, "", "", chain);
        self.finish().0
    }

    fn finish(mut self) -> (Vec<FieldError>, bool) {
        let errors = std::mem::take(&mut self.scratch.errors);
        self.validator.pool.give_back(self.scratch);
        (errors, self.cancelled)
    }

    fn is_cancelled(&mut self) -> bool {
        if !self.cancelled {
            self.cancelled = self.cancel.is_some_and(|flag| flag.load(Ordering::Relaxed));
        }
        self.cancelled
    }

    fn validate_record(&mut self, parent: &'a dyn Reflect, record: &'a dyn Record, ct: Option<&Tag>) {
        if self.is_cancelled() {
            return;
        }

        let identity = (std::ptr::from_ref(record).cast::<()>() as usize, Any::type_id(record.as_any()));
        let detect_cycles = self.validator.config.detect_cycles;
        if detect_cycles {
            if self.visiting.contains(&identity) {
                return;
            }
            self.visiting.push(identity);
        }

        let compiled = self.validator.compiled(record);
        let (ns_len, struct_ns_len) = (self.scratch.ns.len(), self.scratch.struct_ns.len());

        if self.scratch.ns.is_empty() && !compiled.name.is_empty() {
            self.scratch.ns.push_str(compiled.name);
            self.scratch.ns.push('.');
            self.scratch.struct_ns.push_str(compiled.name);
            self.scratch.struct_ns.push('.');
        }

        if !matches!(ct, Some(t) if t.kind == TagKind::StructOnly) {
            for field in &compiled.fields {
                if self.cancelled {
                    break;
                }
                if self.skips(field.name) {
                    continue;
                }
                let Some(obj) = record.field(field.index) else {
                    continue;
                };
                let value = self.validator.custom_types.extract(obj);
                self.traverse_field(record.as_reflect(), value, field.name, &field.alt_name, field.chain.as_deref());
            }
        }

        if !matches!(ct, Some(t) if t.kind == TagKind::NoStructLevel) {
            if let Some(hook) = &compiled.hook {
                let mut level = StructLevel {
                    validator: self.validator,
                    top: self.top,
                    parent,
                    current: record,
                    namespace: &self.scratch.ns,
                    struct_namespace: &self.scratch.struct_ns,
                    errors: &mut self.scratch.errors,
                };
                hook(&mut level);
            }
        }

        self.scratch.ns.truncate(ns_len);
        self.scratch.struct_ns.truncate(struct_ns_len);
        if detect_cycles {
            self.visiting.pop();
        }
    }

    fn skips(&self, name: &str) -> bool {
        let path = || format!("{}{}", self.scratch.struct_ns, name);
        match &self.filter {
            Filter::All => false,
            Filter::Include(paths) => !paths.contains(&path()),
            Filter::Exclude(paths) => paths.contains(&path()),
            Filter::Skip(skip) => skip(&path()),
        }
    }

    fn traverse_field(
        &mut self,
        parent: &'a dyn Reflect,
        current: FieldValue<'a>,
        name: &str,
        alt: &str,
        chain: Option<&Tag>,
    ) {
        let mut ct = chain;

        if current.is_nil() {
            let Some(tag) = ct else {
                return;
            };
            if !matches!(tag.kind, TagKind::Default | TagKind::Or) {
                return;
            }
            if !tag.run_on_nil {
                let (nominal, actual) = failure_tags(tag);
                self.report(nominal, actual, &tag.param, &current, name, alt);
                return;
            }
        }

        if let (Value::Struct(_), Some(tag)) = (current.value, ct) {
            if !self.validator.config.required_struct_enabled
                && tag.kind == TagKind::Default
                && tag.name == REQUIRED_TAG
            {
                ct = tag.next.as_deref();
            }
        }

        loop {
            let Some(tag) = ct else {
                if let Value::Struct(record) = current.value {
                    self.descend(parent, record, name, alt, None);
                }
                return;
            };

            match tag.kind {
                TagKind::OmitEmpty => {
                    if !current.has_value() {
                        return;
                    }
                }
                TagKind::OmitNil => {
                    if current.is_nil() {
                        return;
                    }
                }
                TagKind::OmitZero => {
                    if current.is_nil() || is_zero(&current.value) {
                        return;
                    }
                }
                TagKind::Skip | TagKind::EndKeys => return,
                TagKind::Keys => panic!("'{}' tag on field '{name}' requires a map", tag.name),
                TagKind::StructOnly | TagKind::NoStructLevel => {
                    if let Value::Struct(record) = current.value {
                        self.descend(parent, record, name, alt, Some(tag));
                    }
                    return;
                }
                TagKind::Dive => {
                    self.dive(parent, current, name, alt, tag.next.as_deref());
                    return;
                }
                TagKind::Or => match self.eval_or(tag, parent, current, name, alt) {
                    Some(next) => {
                        ct = next;
                        continue;
                    }
                    None => return,
                },
                TagKind::Default | TagKind::IsDefault => {
                    let passed = (!current.is_nil() || tag.run_on_nil) && self.call(tag, parent, current, name, alt);
                    if !passed {
                        self.report(&tag.alias, &tag.name, &tag.param, &current, name, alt);
                        return;
                    }
                    if tag.kind == TagKind::IsDefault {
                        return;
                    }
                }
            }

            ct = tag.next.as_deref();
        }
    }

    /// Evaluates an OR-group starting at `first`; on success returns the
    /// chain after the group, on failure reports and returns `None`
    fn eval_or<'t>(
        &mut self,
        first: &'t Tag,
        parent: &'a dyn Reflect,
        current: FieldValue<'a>,
        name: &str,
        alt: &str,
    ) -> Option<Option<&'t Tag>> {
        let mut tag = first;

        loop {
            let passed = (!current.is_nil() || tag.run_on_nil) && self.call(tag, parent, current, name, alt);
            if passed {
                let mut end = tag;
                while !end.block_end {
                    match end.next.as_deref() {
                        Some(next) => end = next,
                        None => break,
                    }
                }
                return Some(end.next.as_deref());
            }

            match tag.next.as_deref() {
                Some(next) if !tag.block_end => tag = next,
                _ => {
                    let (nominal, actual) = failure_tags(tag);
                    self.report(nominal, actual, &tag.param, &current, name, alt);
                    return None;
                }
            }
        }
    }

    fn dive(&mut self, parent: &'a dyn Reflect, current: FieldValue<'a>, name: &str, alt: &str, next: Option<&Tag>) {
        match current.value {
            Value::Slice(seq) | Value::Array(seq) => {
                if let Some(keys) = next.filter(|t| t.kind == TagKind::Keys) {
                    panic!("'{}' tag on field '{name}' requires a map", keys.name);
                }
                for i in 0..seq.len() {
                    let Some(elem) = seq.get(i) else {
                        continue;
                    };
                    let elem_name = format!("{name}[{i}]");
                    let elem_alt = format!("{alt}[{i}]");
                    let value = self.validator.custom_types.extract(elem);
                    self.traverse_field(parent, value, &elem_name, &elem_alt, next);
                }
            }
            Value::Map(map) => {
                let keys = next.filter(|t| t.kind == TagKind::Keys);
                for (key, elem) in map.entries() {
                    let key_value = self.validator.custom_types.extract(key);
                    let rendered = render_key(&key_value.value);
                    let elem_name = format!("{name}[{rendered}]");
                    let elem_alt = format!("{alt}[{rendered}]");

                    match keys {
                        Some(keys_tag) => {
                            if keys_tag.keys.is_some() {
                                self.traverse_field(parent, key_value, &elem_name, &elem_alt, keys_tag.keys.as_deref());
                            }
                            if let Some(value_chain) = keys_tag.next.as_deref() {
                                let value = self.validator.custom_types.extract(elem);
                                self.traverse_field(parent, value, &elem_name, &elem_alt, Some(value_chain));
                            }
                        }
                        None => {
                            let value = self.validator.custom_types.extract(elem);
                            self.traverse_field(parent, value, &elem_name, &elem_alt, next);
                        }
                    }
                }
            }
            _ => panic!("dive error! can't dive on a non slice or map"),
        }
    }

    fn descend(&mut self, parent: &'a dyn Reflect, record: &'a dyn Record, name: &str, alt: &str, ct: Option<&Tag>) {
        let (ns_len, struct_ns_len) = (self.scratch.ns.len(), self.scratch.struct_ns.len());

        // Single values validated through `var` have no field name
        if !name.is_empty() {
            self.scratch.ns.push_str(alt);
            self.scratch.ns.push('.');
            self.scratch.struct_ns.push_str(name);
            self.scratch.struct_ns.push('.');
        }

        self.validate_record(parent, record, ct);

        self.scratch.ns.truncate(ns_len);
        self.scratch.struct_ns.truncate(struct_ns_len);
    }

    fn call(&self, tag: &Tag, parent: &'a dyn Reflect, current: FieldValue<'a>, name: &str, alt: &str) -> bool {
        let Some(func) = tag.func.as_ref() else {
            return true;
        };

        let level = FieldLevel {
            validator: self.validator,
            top: self.top,
            parent,
            field: current,
            tag,
            field_name: alt,
            struct_field_name: name,
        };
        func(&level)
    }

    fn report(&mut self, tag: &str, actual: &str, param: &str, current: &FieldValue<'_>, name: &str, alt: &str) {
        let namespace = format!("{}{}", self.scratch.ns, alt);
        let struct_namespace = format!("{}{}", self.scratch.struct_ns, name);
        self.scratch
            .errors
            .push(FieldError::new(namespace, struct_namespace, alt, name, tag, actual, param, current));
    }
}

/// Nominal and actual tag names reported when `tag` fails
fn failure_tags(tag: &Tag) -> (&str, &str) {
    match (tag.kind, tag.has_alias) {
        (TagKind::Or, true) => (tag.alias.as_str(), tag.group.as_str()),
        (TagKind::Or, false) => (tag.group.as_str(), tag.name.as_str()),
        _ => (tag.alias.as_str(), tag.name.as_str()),
    }
}

/// Include set for partial validation: every prefix of every listed path,
/// rooted at the record name
pub(crate) fn include_paths(record: &str, fields: &[&str]) -> HashSet<String> {
    let mut paths = HashSet::new();

    for field in fields {
        let mut path = String::new();
        if !record.is_empty() {
            path.push_str(record);
            path.push('.');
        }

        for segment in field.split('.') {
            match segment.find('[') {
                None => {
                    path.push_str(segment);
                    paths.insert(path.clone());
                }
                Some(_) => {
                    let mut rest = segment;
                    while let Some(open) = rest.find('[') {
                        path.push_str(&rest[..open]);
                        paths.insert(path.clone());
                        let close = rest[open..].find(']').map_or(rest.len(), |c| open + c + 1);
                        path.push_str(&rest[open..close]);
                        paths.insert(path.clone());
                        rest = &rest[close..];
                    }
                }
            }
            path.push('.');
        }
    }

    paths
}

/// Exclude set for partial validation: exactly the listed paths
pub(crate) fn exclude_paths(record: &str, fields: &[&str]) -> HashSet<String> {
    fields
        .iter()
        .map(|field| if record.is_empty() { field.to_string() } else { format!("{record}.{field}") })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_include_paths_adds_prefixes() {
        let paths = include_paths("User", &["Inner.Name", "Items[0].Sku"]);
        for expected in ["User.Inner", "User.Inner.Name", "User.Items", "User.Items[0]", "User.Items[0].Sku"] {
            assert!(paths.contains(expected), "missing {expected}");
        }
        assert_eq!(paths.len(), 5);
    }

    #[test]
    fn test_exclude_paths_are_exact() {
        let paths = exclude_paths("User", &["Inner.Name"]);
        assert!(paths.contains("User.Inner.Name"));
        assert!(!paths.contains("User.Inner"));
    }
}
