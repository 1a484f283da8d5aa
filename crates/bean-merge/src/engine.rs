//! The merge walk.

use serde_json::{Map, Value};

use crate::strategy::{MatchRule, Strategy, StrategyTable};

/// A path where the declared strategy did not fit the shapes found there.
///
/// The engine falls back to `replace` at such paths and records the
/// mismatch so the caller can report it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeMismatch {
    /// Dotted path of the offending value (`<root>` for the top level).
    pub path: String,
    /// Tag of the strategy that could not be applied.
    pub strategy: &'static str,
}

/// Merged tree plus any shape mismatches met along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub value: Value,
    pub mismatches: Vec<ShapeMismatch>,
}

/// Merge `right` over `left` using `table`.
///
/// Neither input is modified; the result is a fresh tree.
pub fn merge(left: &Value, right: &Value, table: &StrategyTable) -> Value {
    merge_with_report(left, right, table).value
}

/// Like [`merge`], also returning the shape mismatches that were resolved
/// by falling back to `replace`.
pub fn merge_with_report(left: &Value, right: &Value, table: &StrategyTable) -> MergeOutcome {
    let mut walker = Walker {
        table,
        path: Vec::new(),
        mismatches: Vec::new(),
    };
    let value = walker.combine(left, right);
    MergeOutcome {
        value,
        mismatches: walker.mismatches,
    }
}

struct Walker<'a> {
    table: &'a StrategyTable,
    path: Vec<String>,
    mismatches: Vec<ShapeMismatch>,
}

impl<'a> Walker<'a> {
    fn combine(&mut self, left: &Value, right: &Value) -> Value {
        let table = self.table;
        match table.resolve(&self.path) {
            Some(strategy) => self.apply(strategy, left, right),
            None => self.structural(left, right),
        }
    }

    /// Default for unmapped paths: merge two mappings, otherwise replace.
    fn structural(&mut self, left: &Value, right: &Value) -> Value {
        match (left, right) {
            (Value::Object(l), Value::Object(r)) => Value::Object(self.merge_maps(l, r)),
            _ => right.clone(),
        }
    }

    fn apply(&mut self, strategy: &Strategy, left: &Value, right: &Value) -> Value {
        match strategy {
            Strategy::Replace => right.clone(),
            Strategy::Append => match (left, right) {
                (Value::Array(l), Value::Array(r)) => {
                    Value::Array(l.iter().chain(r.iter()).cloned().collect())
                }
                _ => self.fallback(strategy, right),
            },
            Strategy::Merge => match (left, right) {
                (Value::Object(l), Value::Object(r)) => Value::Object(self.merge_maps(l, r)),
                _ => self.fallback(strategy, right),
            },
            Strategy::MatchReplace(rule) => match (left, right) {
                (Value::Array(l), Value::Array(r)) => self.match_records(rule, l, r),
                _ => self.fallback(strategy, right),
            },
        }
    }

    fn fallback(&mut self, strategy: &Strategy, right: &Value) -> Value {
        let path = if self.path.is_empty() {
            "<root>".to_string()
        } else {
            self.path.join(".")
        };
        self.mismatches.push(ShapeMismatch {
            path,
            strategy: strategy.tag(),
        });
        right.clone()
    }

    fn merge_maps(&mut self, left: &Map<String, Value>, right: &Map<String, Value>) -> Map<String, Value> {
        let mut out = Map::new();
        for (key, left_value) in left {
            let merged = match right.get(key) {
                Some(right_value) => {
                    self.path.push(key.clone());
                    let value = self.combine(left_value, right_value);
                    self.path.pop();
                    value
                }
                None => left_value.clone(),
            };
            out.insert(key.clone(), merged);
        }
        for (key, right_value) in right {
            if !left.contains_key(key) {
                out.insert(key.clone(), right_value.clone());
            }
        }
        out
    }

    fn match_records(&mut self, rule: &MatchRule, left: &[Value], right: &[Value]) -> Value {
        let mut out: Vec<Value> = left.to_vec();
        let left_len = left.len();

        for record in right {
            let found = match_value(record, rule).and_then(|wanted| {
                out[..left_len]
                    .iter()
                    .position(|candidate| match_value(candidate, rule) == Some(wanted))
            });

            match found {
                Some(index) => {
                    let merged = self.merge_record(rule, &out[index], record);
                    out[index] = merged;
                }
                None => out.push(record.clone()),
            }
        }

        Value::Array(out)
    }

    /// Merge a matched pair. Listed fields use their sub-strategy; the rest
    /// use the structural default. Fields resolve at `<sequence path>.<field>`.
    fn merge_record(&mut self, rule: &MatchRule, left: &Value, right: &Value) -> Value {
        let (Value::Object(l), Value::Object(r)) = (left, right) else {
            return right.clone();
        };

        let mut out = Map::new();
        for (key, left_value) in l {
            let merged = match r.get(key) {
                Some(right_value) => {
                    self.path.push(key.clone());
                    let value = match rule.field_strategy(key) {
                        Some(strategy) => self.apply(strategy, left_value, right_value),
                        None => self.structural(left_value, right_value),
                    };
                    self.path.pop();
                    value
                }
                None => left_value.clone(),
            };
            out.insert(key.clone(), merged);
        }
        for (key, right_value) in r {
            if !l.contains_key(key) {
                out.insert(key.clone(), right_value.clone());
            }
        }
        Value::Object(out)
    }
}

/// The match-key value of a record, if it is a mapping carrying the key.
fn match_value<'v>(record: &'v Value, rule: &MatchRule) -> Option<&'v Value> {
    record.as_object().and_then(|map| map.get(rule.key()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rules_table() -> StrategyTable {
        StrategyTable::new().with(
            "rules",
            Strategy::MatchReplace(
                MatchRule::on("test")
                    .field("use", Strategy::Replace)
                    .field("priority", Strategy::Replace),
            ),
        )
    }

    #[test]
    fn test_merge_with_empty_tree_is_identity() {
        let tree = json!({
            "entry": {"index": "./src/main.js"},
            "resolve": {"extensions": [".js", ".ts"]},
            "devtool": "source-map"
        });
        let result = merge(&tree, &json!({}), &StrategyTable::new());
        assert_eq!(result, tree);
    }

    #[test]
    fn test_merge_with_self_under_replace_is_identity() {
        let tree = json!({
            "plugins": [{"plugin": "A"}],
            "optimization": {"minimize": true, "minimizer": ["terser"]}
        });
        let table = StrategyTable::new()
            .with("plugins", Strategy::Replace)
            .with("optimization.minimizer", Strategy::Replace);
        assert_eq!(merge(&tree, &tree, &table), tree);
    }

    #[test]
    fn test_merge_is_deterministic() {
        let left = json!({"a": [1, 2], "b": {"c": 1}});
        let right = json!({"a": [3], "b": {"d": 2}});
        let table = StrategyTable::new().with("a", Strategy::Append);

        let first = merge(&left, &right, &table);
        let second = merge(&left, &right, &table);
        assert_eq!(first, second);
    }

    #[test]
    fn test_inputs_are_untouched() {
        let left = json!({"p": [1, 2]});
        let right = json!({"p": [3]});
        let table = StrategyTable::new().with("p", Strategy::Append);

        let _ = merge(&left, &right, &table);
        assert_eq!(left, json!({"p": [1, 2]}));
        assert_eq!(right, json!({"p": [3]}));
    }

    #[test]
    fn test_append_keeps_left_then_right() {
        let table = StrategyTable::new().with("p", Strategy::Append);
        let result = merge(&json!({"p": [1, 2]}), &json!({"p": [3]}), &table);
        assert_eq!(result, json!({"p": [1, 2, 3]}));
    }

    #[test]
    fn test_append_does_not_deduplicate() {
        let table = StrategyTable::new().with("p", Strategy::Append);
        let result = merge(&json!({"p": [1]}), &json!({"p": [1]}), &table);
        assert_eq!(result, json!({"p": [1, 1]}));
    }

    #[test]
    fn test_append_with_missing_side() {
        let table = StrategyTable::new().with("p", Strategy::Append);
        assert_eq!(merge(&json!({}), &json!({"p": [3]}), &table), json!({"p": [3]}));
        assert_eq!(merge(&json!({"p": [1]}), &json!({}), &table), json!({"p": [1]}));
    }

    #[test]
    fn test_unmapped_sequence_is_replaced() {
        let result = merge(
            &json!({"extensions": [".js"]}),
            &json!({"extensions": [".ts"]}),
            &StrategyTable::new(),
        );
        assert_eq!(result, json!({"extensions": [".ts"]}));
    }

    #[test]
    fn test_unmapped_mappings_are_merged() {
        let result = merge(
            &json!({"output": {"path": "dist", "clean": true}}),
            &json!({"output": {"path": "build"}}),
            &StrategyTable::new(),
        );
        assert_eq!(result, json!({"output": {"path": "build", "clean": true}}));
    }

    #[test]
    fn test_replace_supersedes_whole_mapping() {
        let table = StrategyTable::new().with("optimization.splitChunks", Strategy::Replace);
        let result = merge(
            &json!({"optimization": {"splitChunks": {"chunks": "all", "name": false}}}),
            &json!({"optimization": {"splitChunks": {"chunks": "async"}}}),
            &table,
        );
        assert_eq!(result, json!({"optimization": {"splitChunks": {"chunks": "async"}}}));
    }

    #[test]
    fn test_match_then_replace_scenario() {
        let left = json!({"rules": [
            {"test": "a", "priority": 1},
            {"test": "b", "priority": 2}
        ]});
        let right = json!({"rules": [{"test": "a", "priority": 9}]});

        let result = merge(&left, &right, &rules_table());
        assert_eq!(
            result,
            json!({"rules": [
                {"test": "a", "priority": 9},
                {"test": "b", "priority": 2}
            ]})
        );
    }

    #[test]
    fn test_match_then_replace_appends_unmatched() {
        let left = json!({"rules": [{"test": "a", "use": ["x"]}]});
        let right = json!({"rules": [
            {"test": "c", "use": ["z"]},
            {"test": "a", "use": ["y"]}
        ]});

        let result = merge(&left, &right, &rules_table());
        assert_eq!(
            result,
            json!({"rules": [
                {"test": "a", "use": ["y"]},
                {"test": "c", "use": ["z"]}
            ]})
        );
    }

    #[test]
    fn test_match_then_replace_unlisted_fields_use_structural_default() {
        let left = json!({"rules": [
            {"test": "a", "use": ["x"], "options": {"cache": true, "presets": ["env"]}}
        ]});
        let right = json!({"rules": [
            {"test": "a", "options": {"cache": false}, "exclude": "node_modules"}
        ]});

        let result = merge(&left, &right, &rules_table());
        assert_eq!(
            result,
            json!({"rules": [{
                "test": "a",
                "use": ["x"],
                "options": {"cache": false, "presets": ["env"]},
                "exclude": "node_modules"
            }]})
        );
    }

    #[test]
    fn test_match_then_replace_listed_merge_field() {
        let table = StrategyTable::new().with(
            "plugins",
            Strategy::MatchReplace(MatchRule::on("plugin").field("options", Strategy::Replace)),
        );
        let left = json!({"plugins": [
            {"plugin": "Html", "options": {"title": "a", "inject": true}}
        ]});
        let right = json!({"plugins": [{"plugin": "Html", "options": {"title": "b"}}]});

        let result = merge(&left, &right, &table);
        assert_eq!(
            result,
            json!({"plugins": [{"plugin": "Html", "options": {"title": "b"}}]})
        );
    }

    #[test]
    fn test_records_without_match_key_are_appended() {
        let left = json!({"rules": [{"test": "a"}]});
        let right = json!({"rules": [{"loader": "raw"}, "plain"]});

        let result = merge(&left, &right, &rules_table());
        assert_eq!(
            result,
            json!({"rules": [{"test": "a"}, {"loader": "raw"}, "plain"]})
        );
    }

    #[test]
    fn test_repeated_right_matches_apply_in_order() {
        let left = json!({"rules": [{"test": "a", "priority": 1}]});
        let right = json!({"rules": [
            {"test": "a", "priority": 5},
            {"test": "a", "priority": 7}
        ]});

        let result = merge(&left, &right, &rules_table());
        assert_eq!(result, json!({"rules": [{"test": "a", "priority": 7}]}));
    }

    #[test]
    fn test_wildcard_merge_strategy() {
        let table = StrategyTable::new()
            .with("groups", Strategy::Merge)
            .with("groups.*", Strategy::Merge);
        let left = json!({"groups": {"vendors": {"priority": -10, "name": "vendors"}}});
        let right = json!({"groups": {
            "vendors": {"priority": 1},
            "fixed": {"priority": 11}
        }});

        let result = merge(&left, &right, &table);
        assert_eq!(
            result,
            json!({"groups": {
                "vendors": {"priority": 1, "name": "vendors"},
                "fixed": {"priority": 11}
            }})
        );
    }

    #[test]
    fn test_shape_mismatch_falls_back_to_replace() {
        let table = StrategyTable::new().with("p", Strategy::Append);
        let outcome = merge_with_report(&json!({"p": [1, 2]}), &json!({"p": "x"}), &table);

        assert_eq!(outcome.value, json!({"p": "x"}));
        assert_eq!(
            outcome.mismatches,
            vec![ShapeMismatch {
                path: "p".to_string(),
                strategy: "append"
            }]
        );
    }

    #[test]
    fn test_merge_strategy_on_scalar_reports_mismatch() {
        let table = StrategyTable::new().with("resolve.alias", Strategy::Merge);
        let outcome = merge_with_report(
            &json!({"resolve": {"alias": {"@": "/src"}}}),
            &json!({"resolve": {"alias": false}}),
            &table,
        );

        assert_eq!(outcome.value, json!({"resolve": {"alias": false}}));
        assert_eq!(outcome.mismatches.len(), 1);
        assert_eq!(outcome.mismatches[0].path, "resolve.alias");
    }

    #[test]
    fn test_root_level_mismatch_path() {
        let table = StrategyTable::new().with("", Strategy::Append);
        let outcome = merge_with_report(&json!({}), &json!([]), &table);
        assert_eq!(outcome.mismatches[0].path, "<root>");
    }

    #[test]
    fn test_null_on_right_replaces() {
        let result = merge(&json!({"v": 1}), &json!({"v": null}), &StrategyTable::new());
        assert!(result["v"].is_null());
    }
}
