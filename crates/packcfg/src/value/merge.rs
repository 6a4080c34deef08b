//! Deep merge over the configuration tree.
//!
//! The rule is decided per value kind:
//! - object into object: keys are unioned, shared keys merge recursively
//! - array into array: the update is appended
//! - anything else: the update replaces the target

use super::Value;

/// Merge `update` into `target` in place.
pub fn merge_values(target: &mut Value, update: Value) {
    match (target, update) {
        (Value::Object(target_map), Value::Object(update_map)) => {
            for (key, value) in update_map {
                match target_map.get_mut(&key) {
                    Some(slot) => merge_values(slot, value),
                    None => {
                        target_map.insert(key, value);
                    }
                }
            }
        }
        (Value::Array(target_items), Value::Array(update_items)) => {
            target_items.extend(update_items);
        }
        (target_slot, update) => {
            *target_slot = update;
        }
    }
}

/// Merge every fragment into `target`, left to right.
pub fn merge_all<I>(target: &mut Value, fragments: I)
where
    I: IntoIterator<Item = Value>,
{
    for fragment in fragments {
        merge_values(target, fragment);
    }
}
