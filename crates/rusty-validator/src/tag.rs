// File: src/tag.rs
// Purpose: Tag string compiler producing linked rule chains

use std::collections::HashMap;
use std::fmt;

use crate::field_level::Predicate;

pub(crate) const TAG_SEPARATOR: char = ',';
pub(crate) const OR_SEPARATOR: char = '|';
pub(crate) const TAG_KEY_SEPARATOR: char = '=';

pub const SKIP_VALIDATION_TAG: &str = "-";
pub const DIVE_TAG: &str = "dive";
pub const KEYS_TAG: &str = "keys";
pub const END_KEYS_TAG: &str = "endkeys";
pub const OMITEMPTY_TAG: &str = "omitempty";
pub const OMITNIL_TAG: &str = "omitnil";
pub const OMITZERO_TAG: &str = "omitzero";
pub const STRUCT_ONLY_TAG: &str = "structonly";
pub const NO_STRUCT_LEVEL_TAG: &str = "nostructlevel";
pub const REQUIRED_TAG: &str = "required";
pub const IS_DEFAULT_TAG: &str = "isdefault";

pub(crate) const UTF8_HEX_COMMA: &str = "0x2C";
pub(crate) const UTF8_PIPE: &str = "0x7C";

/// Names reserved for control tags; rules and aliases cannot take them
pub(crate) const RESTRICTED_TAGS: &[&str] = &[
    DIVE_TAG,
    KEYS_TAG,
    END_KEYS_TAG,
    STRUCT_ONLY_TAG,
    NO_STRUCT_LEVEL_TAG,
    OMITEMPTY_TAG,
    OMITNIL_TAG,
    OMITZERO_TAG,
    SKIP_VALIDATION_TAG,
    UTF8_HEX_COMMA,
    UTF8_PIPE,
    REQUIRED_TAG,
    IS_DEFAULT_TAG,
];

/// Characters a rule or alias name must not contain
pub(crate) const RESTRICTED_TAG_CHARS: &str = ".[],|=+()`~!@#$%^&*\\\"/?<>{};:'";

pub(crate) fn is_restricted_tag(name: &str) -> bool {
    RESTRICTED_TAGS.contains(&name)
}

pub(crate) fn has_restricted_chars(name: &str) -> bool {
    name.chars().any(|c| RESTRICTED_TAG_CHARS.contains(c))
}

/// Decodes the escape codes a parameter uses for `,` and `|`
pub(crate) fn decode_param(raw: &str) -> std::borrow::Cow<'_, str> {
    if raw.contains(UTF8_HEX_COMMA) || raw.contains(UTF8_PIPE) {
        std::borrow::Cow::Owned(raw.replace(UTF8_HEX_COMMA, ",").replace(UTF8_PIPE, "|"))
    } else {
        std::borrow::Cow::Borrowed(raw)
    }
}

/// Role of a compiled node in its chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Default,
    Or,
    Dive,
    Keys,
    EndKeys,
    OmitEmpty,
    OmitNil,
    OmitZero,
    IsDefault,
    StructOnly,
    NoStructLevel,
    Skip,
}

/// A registered predicate together with its nil policy
#[derive(Clone)]
pub(crate) struct Rule {
    pub func: Predicate,
    pub run_on_nil: bool,
}

/// Compiled chain head; `None` means the field carries no rules
pub type Chain = Option<Box<Tag>>;

/// One compiled rule step
pub struct Tag {
    pub(crate) kind: TagKind,
    /// Rule identifier without parameter, e.g. `lte`
    pub(crate) name: String,
    /// Nominal name reported on failure (the outermost alias when expanded)
    pub(crate) alias: String,
    pub(crate) has_alias: bool,
    /// Full pipe-joined segment for OR alternatives
    pub(crate) group: String,
    pub(crate) param: String,
    pub(crate) has_param: bool,
    pub(crate) keys: Chain,
    pub(crate) next: Chain,
    pub(crate) func: Option<Predicate>,
    pub(crate) run_on_nil: bool,
    /// Last alternative of an OR-group
    pub(crate) block_end: bool,
}

impl Tag {
    fn control(kind: TagKind, name: &str, nominal: &str, has_alias: bool) -> Self {
        Self {
            kind,
            name: name.to_string(),
            alias: nominal.to_string(),
            has_alias,
            group: String::new(),
            param: String::new(),
            has_param: false,
            keys: None,
            next: None,
            func: None,
            run_on_nil: false,
            block_end: false,
        }
    }

    pub fn kind(&self) -> TagKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn param(&self) -> &str {
        &self.param
    }

    pub fn has_param(&self) -> bool {
        self.has_param
    }

    pub fn next(&self) -> Option<&Tag> {
        self.next.as_deref()
    }

    /// Sub-chain applied to map keys, only set on `keys` nodes
    pub fn keys(&self) -> Option<&Tag> {
        self.keys.as_deref()
    }

    /// Iterates this node and every node linked after it
    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        std::iter::successors(Some(self), |t| t.next())
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tag")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("alias", &self.alias)
            .field("param", &self.param)
            .field("keys", &self.keys)
            .field("next", &self.next)
            .finish()
    }
}

/// Parses tag strings against a rule registry and alias table
pub(crate) struct TagCompiler<'r> {
    pub rules: &'r HashMap<String, Rule>,
    pub aliases: &'r HashMap<String, String>,
}

impl<'r> TagCompiler<'r> {
    /// Compiles `tag` for the field named `field`
    ///
    /// # Panics
    ///
    /// On malformed tags and unregistered rule names. These are programming
    /// errors in the rule text, not validation failures.
    pub fn compile(&self, tag: &str, field: &str) -> Chain {
        let mut expanding = Vec::new();
        link(self.nodes(tag, field, None, false, &mut expanding))
    }

    fn nodes(
        &self,
        tag: &str,
        field: &str,
        alias: Option<&str>,
        in_keys: bool,
        expanding: &mut Vec<String>,
    ) -> Vec<Tag> {
        let parts: Vec<&str> = tag.split(TAG_SEPARATOR).collect();
        let mut out: Vec<Tag> = Vec::with_capacity(parts.len());
        let mut i = 0;

        while i < parts.len() {
            let part = parts[i];
            i += 1;

            if let Some(expansion) = self.aliases.get(part) {
                if expanding.iter().any(|a| a == part) {
                    panic!("Alias '{part}' expands to itself on field '{field}'");
                }
                expanding.push(part.to_string());
                let nominal = alias.unwrap_or(part).to_string();
                out.extend(self.nodes(expansion, field, Some(nominal.as_str()), false, expanding));
                expanding.pop();
                continue;
            }

            let (nominal, has_alias) = match alias {
                Some(a) => (a, true),
                None => (part, false),
            };

            let kind = match part {
                DIVE_TAG => TagKind::Dive,
                OMITEMPTY_TAG => TagKind::OmitEmpty,
                OMITNIL_TAG => TagKind::OmitNil,
                OMITZERO_TAG => TagKind::OmitZero,
                STRUCT_ONLY_TAG => TagKind::StructOnly,
                NO_STRUCT_LEVEL_TAG => TagKind::NoStructLevel,
                SKIP_VALIDATION_TAG => TagKind::Skip,
                KEYS_TAG => {
                    if !matches!(out.last(), Some(prev) if prev.kind == TagKind::Dive) {
                        panic!("'{KEYS_TAG}' tag must be immediately preceded by the '{DIVE_TAG}' tag");
                    }

                    let start = i;
                    let mut depth = 1;
                    let mut end = None;
                    while i < parts.len() {
                        match parts[i] {
                            KEYS_TAG => depth += 1,
                            END_KEYS_TAG => depth -= 1,
                            _ => {}
                        }
                        i += 1;
                        if depth == 0 {
                            end = Some(i);
                            break;
                        }
                    }
                    let Some(end) = end else {
                        panic!("'{KEYS_TAG}' tag on field '{field}' has no closing '{END_KEYS_TAG}' tag");
                    };

                    let inner = parts[start..end].join(",");
                    let mut node = Tag::control(TagKind::Keys, part, nominal, has_alias);
                    node.keys = link(self.nodes(&inner, field, alias, true, expanding));
                    out.push(node);
                    continue;
                }
                END_KEYS_TAG => {
                    if !in_keys || i != parts.len() {
                        panic!("'{END_KEYS_TAG}' tag encountered without a corresponding '{KEYS_TAG}' tag");
                    }
                    TagKind::EndKeys
                }
                _ => {
                    self.push_rules(&mut out, part, field, nominal, has_alias);
                    continue;
                }
            };

            out.push(Tag::control(kind, part, nominal, has_alias));
        }

        out
    }

    fn push_rules(&self, out: &mut Vec<Tag>, part: &str, field: &str, nominal: &str, has_alias: bool) {
        let alternatives: Vec<&str> = part.split(OR_SEPARATOR).collect();
        let is_or = alternatives.len() > 1;
        let last = alternatives.len() - 1;

        for (j, alternative) in alternatives.into_iter().enumerate() {
            let (name, param) = match alternative.split_once(TAG_KEY_SEPARATOR) {
                Some((name, param)) => (name, Some(param)),
                None => (alternative, None),
            };

            if name.is_empty() {
                panic!("Invalid validation tag on field '{field}'");
            }

            let Some(rule) = self.rules.get(name) else {
                panic!("Undefined validation function '{name}' on field '{field}'");
            };

            let kind = if is_or {
                TagKind::Or
            } else if name == IS_DEFAULT_TAG {
                TagKind::IsDefault
            } else {
                TagKind::Default
            };

            out.push(Tag {
                kind,
                name: name.to_string(),
                alias: if has_alias { nominal.to_string() } else { name.to_string() },
                has_alias,
                group: part.to_string(),
                param: param.unwrap_or_default().to_string(),
                has_param: param.is_some(),
                keys: None,
                next: None,
                func: Some(rule.func.clone()),
                run_on_nil: rule.run_on_nil,
                block_end: j == last,
            });
        }
    }
}

fn link(nodes: Vec<Tag>) -> Chain {
    nodes.into_iter().rev().fold(None, |next, mut node| {
        node.next = next;
        Some(Box::new(node))
    })
}
