//! Hand-built tables shared by the unit tests.
//!
//! Token names: `num`, `+`, `;`, `error`, and `""` for end of input.

/// ```text
/// 0: $start -> S $end
/// 1: S -> E
/// 2: E -> E '+' E      (left associative)
/// 3: E -> num
/// ```
pub const SUM_TABLES: &str = r#"{
  "rules": [
    {"lhs": "$start", "len": 2},
    {"lhs": "S", "len": 1},
    {"lhs": "E", "len": 3},
    {"lhs": "E", "len": 1}
  ],
  "states": [
    {"actions": {"num": 3}, "gotos": {"S": 1, "E": 2}},
    {"actions": {"": 4}},
    {"default": -1, "actions": {"+": 5}},
    {"default": -3},
    {"default": 0},
    {"actions": {"num": 3}, "gotos": {"E": 6}},
    {"default": -2}
  ]
}"#;

/// [`SUM_TABLES`] plus `4: E -> error`.
pub const SUM_ERROR_TABLES: &str = r#"{
  "rules": [
    {"lhs": "$start", "len": 2},
    {"lhs": "S", "len": 1},
    {"lhs": "E", "len": 3},
    {"lhs": "E", "len": 1},
    {"lhs": "E", "len": 1}
  ],
  "states": [
    {"actions": {"num": 3, "error": 7}, "gotos": {"S": 1, "E": 2}},
    {"actions": {"": 4}},
    {"default": -1, "actions": {"+": 5}},
    {"default": -3},
    {"default": 0},
    {"actions": {"num": 3, "error": 7}, "gotos": {"E": 6}},
    {"default": -2},
    {"default": -4}
  ]
}"#;

/// ```text
/// 0: $start -> S $end
/// 1: S -> num ';'
/// 2: S -> error ';'
/// ```
pub const STMT_TABLES: &str = r#"{
  "rules": [
    {"lhs": "$start", "len": 2},
    {"lhs": "S", "len": 2},
    {"lhs": "S", "len": 2}
  ],
  "states": [
    {"actions": {"num": 2, "error": 3}, "gotos": {"S": 1}},
    {"actions": {"": 4}},
    {"actions": {";": 5}},
    {"actions": {";": 6}},
    {"default": 0},
    {"default": -1},
    {"default": -2}
  ]
}"#;

/// A mid-rule action after three symbols:
///
/// ```text
/// 0: $start -> S $end
/// 1: S -> num num num @2-3 ';'
/// 2: @2-3 -> /* empty */
/// ```
pub const INLINE_TABLES: &str = r#"{
  "rules": [
    {"lhs": "$start", "len": 2},
    {"lhs": "S", "len": 5},
    {"lhs": "@2-3", "len": 0}
  ],
  "states": [
    {"actions": {"num": 2}, "gotos": {"S": 1}},
    {"actions": {"": 3}},
    {"actions": {"num": 4}},
    {"default": 0},
    {"actions": {"num": 5}},
    {"default": -2, "gotos": {"@2-3": 6}},
    {"actions": {";": 7}},
    {"default": -1}
  ]
}"#;
