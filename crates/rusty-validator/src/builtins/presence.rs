// File: src/builtins/presence.rs
// Purpose: Presence checks

use super::{rule, rule_on_nil, Builtin};
use crate::field_level::FieldLevel;
use crate::tag::{IS_DEFAULT_TAG, REQUIRED_TAG};

pub(super) fn rules() -> Vec<Builtin> {
    vec![rule(REQUIRED_TAG, has_value), rule_on_nil(IS_DEFAULT_TAG, is_default)]
}

/// Non-nil and, unless reached through an optional wrapper, non-zero
fn has_value(fl: &FieldLevel<'_>) -> bool {
    fl.has_value()
}

fn is_default(fl: &FieldLevel<'_>) -> bool {
    !fl.has_value()
}
